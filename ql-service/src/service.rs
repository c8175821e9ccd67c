//! Label service facade
//!
//! The operation surface an API layer calls into: render and print
//! operations, settings access, printer status, and keep-alive control.
//! Per-request parameters override stored settings for one call and are
//! never persisted.

use crate::error::{ServiceError, ServiceResult};
use crate::keepalive::{
    PortScanProbe, ProbeStrategy, ProbeTarget, StatusQuery, StatusQueryProbe, TransportProbe,
    Watchdog,
};
use crate::layout::{
    self, Composition, FontProvider, QrOptions, QrPosition, QrText, TextOptions, TextPosition,
};
use crate::layout::{EcLevel, LABEL_WIDTH, apply_rotation, fit_width};
use crate::settings::{
    Alignment, MIN_KEEP_ALIVE_INTERVAL, PrinterProfile, Settings, SettingsStore,
};
use image::RgbImage;
use ql_printer::{
    Backend, DeviceTransport, NetworkTransport, PrintResult, PrinterUri, RasterEncoder,
    RasterParams,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Builds a device transport for a printer address
pub type TransportFactory =
    Arc<dyn Fn(&PrinterUri) -> PrintResult<Arc<dyn DeviceTransport>> + Send + Sync>;

/// Text print/render request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextRequest {
    pub text: String,
    #[serde(default)]
    pub font_size: Option<u32>,
    #[serde(default)]
    pub alignment: Option<String>,
    #[serde(default)]
    pub rotate: Option<u16>,
}

/// Companion text parameters of a QR request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QrTextRequest {
    pub content: String,
    /// "top", "bottom", or "none" to suppress the text entirely
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub font_size: Option<u32>,
    #[serde(default)]
    pub alignment: Option<String>,
}

/// QR print/render request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QrRequest {
    pub data: String,
    #[serde(default)]
    pub version: Option<u8>,
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub box_size: Option<u32>,
    #[serde(default)]
    pub border: Option<u32>,
    #[serde(default)]
    pub error_correction: Option<String>,
    #[serde(default)]
    pub text: Option<QrTextRequest>,
    #[serde(default)]
    pub side_by_side: bool,
    #[serde(default)]
    pub qr_position: Option<String>,
    #[serde(default)]
    pub rotate: Option<u16>,
}

/// A rendered label ready for encoding or preview
#[derive(Debug)]
pub struct RenderedLabel {
    pub job_id: String,
    pub image: RgbImage,
}

/// Outcome of a completed print job
#[derive(Debug, Clone, Serialize)]
pub struct PrintReceipt {
    pub job_id: String,
    pub message: String,
}

/// Result of a printer reachability check
#[derive(Debug, Clone, Serialize)]
pub struct PrinterStatus {
    pub available: bool,
    pub status: String,
    pub details: Value,
}

/// Keep-alive state as reported to callers
#[derive(Debug, Clone, Serialize)]
pub struct KeepAliveStatus {
    pub enabled: bool,
    pub interval: u64,
    pub running: bool,
}

/// The service owning the core triad
pub struct LabelService {
    store: SettingsStore,
    font: Arc<dyn FontProvider>,
    encoder: Arc<dyn RasterEncoder>,
    transport_factory: TransportFactory,
    status_query: Option<Arc<dyn StatusQuery>>,
    watchdog: Watchdog,
}

impl LabelService {
    /// Create a service with the default network transport
    pub fn new(
        store: SettingsStore,
        font: Arc<dyn FontProvider>,
        encoder: Arc<dyn RasterEncoder>,
    ) -> Self {
        Self {
            store,
            font,
            encoder,
            transport_factory: Arc::new(|uri| {
                NetworkTransport::from_uri(uri).map(|t| Arc::new(t) as Arc<dyn DeviceTransport>)
            }),
            status_query: None,
            watchdog: Watchdog::new(),
        }
    }

    /// Replace the transport factory (tests, alternative transports)
    pub fn with_transport_factory(mut self, factory: TransportFactory) -> Self {
        self.transport_factory = factory;
        self
    }

    /// Provide a structured status-query capability for the watchdog
    pub fn with_status_query(mut self, query: Arc<dyn StatusQuery>) -> Self {
        self.status_query = Some(query);
        self
    }

    /// The underlying settings store
    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    // === Settings ===

    /// Current settings, always read from disk
    pub fn get_settings(&self) -> Settings {
        self.store.load()
    }

    /// Apply a partial settings update
    pub fn update_settings(&self, partial: &Map<String, Value>) -> ServiceResult<Settings> {
        self.store.update(partial)
    }

    /// Configured printer profiles
    pub fn list_printers(&self) -> Vec<PrinterProfile> {
        self.store.load().printers
    }

    // === Rendering ===

    /// Render a text label, merging request parameters over stored settings
    #[instrument(skip(self, request), fields(text_len = request.text.len()))]
    pub fn render_text(&self, request: &TextRequest) -> ServiceResult<RenderedLabel> {
        if request.text.is_empty() {
            return Err(ServiceError::validation("text is required", "text"));
        }

        let settings = self.store.load();
        let opts = TextOptions {
            font_size: request.font_size.unwrap_or(settings.font_size) as f32,
            alignment: request
                .alignment
                .as_deref()
                .map(Alignment::parse_or_default)
                .unwrap_or(settings.alignment),
        };

        let image = layout::render_text(self.font.as_ref(), &request.text, &opts)?;
        let image = apply_rotation(image, request.rotate.unwrap_or(settings.rotate))?;

        let job_id = job_id("text");
        info!(job_id = %job_id, "Text label rendered");
        Ok(RenderedLabel { job_id, image })
    }

    /// Render a QR label, merging request parameters over stored settings
    #[instrument(skip(self, request), fields(data_len = request.data.len()))]
    pub fn render_qr(&self, request: &QrRequest) -> ServiceResult<RenderedLabel> {
        if request.data.is_empty() {
            return Err(ServiceError::validation("qr.data is required", "qr.data"));
        }

        let settings = self.store.load();
        let opts = QrOptions {
            version: request.version,
            box_size: request.box_size.unwrap_or(10),
            border: request.border.unwrap_or(4),
            error_correction: request
                .error_correction
                .as_deref()
                .map(EcLevel::parse_or_default)
                .unwrap_or_default(),
            size: request.size.unwrap_or(400),
        };

        // position "none" suppresses the companion text entirely.
        let text = request
            .text
            .as_ref()
            .filter(|t| !t.content.is_empty())
            .filter(|t| t.position.as_deref() != Some("none"))
            .map(|t| QrText {
                content: t.content.clone(),
                font_size: t.font_size.unwrap_or(30) as f32,
                alignment: t
                    .alignment
                    .as_deref()
                    .map(Alignment::parse_or_default)
                    .unwrap_or(Alignment::Center),
                position: t
                    .position
                    .as_deref()
                    .map(TextPosition::parse_or_default)
                    .unwrap_or_default(),
            });

        let composition = if text.is_none() {
            Composition::QrOnly
        } else if request.side_by_side {
            Composition::SideBySide {
                qr_position: request
                    .qr_position
                    .as_deref()
                    .map(QrPosition::parse_or_default)
                    .unwrap_or_default(),
            }
        } else {
            Composition::Stacked
        };

        let image = layout::render_qr(
            self.font.as_ref(),
            &request.data,
            &opts,
            text.as_ref(),
            composition,
        )?;
        let image = apply_rotation(image, request.rotate.unwrap_or(settings.rotate))?;

        let job_id = job_id("qrcode");
        info!(job_id = %job_id, "QR label rendered");
        Ok(RenderedLabel { job_id, image })
    }

    // === Printing ===

    /// Render a text label and send it to the configured printer
    pub async fn print_text(&self, request: &TextRequest) -> ServiceResult<PrintReceipt> {
        let rendered = self.render_text(request)?;
        self.dispatch(&rendered.image).await?;
        info!(job_id = %rendered.job_id, "Print job completed successfully");
        Ok(PrintReceipt {
            job_id: rendered.job_id,
            message: "Text printed successfully".to_string(),
        })
    }

    /// Render a QR label and send it to the configured printer
    pub async fn print_qr(&self, request: &QrRequest) -> ServiceResult<PrintReceipt> {
        let rendered = self.render_qr(request)?;
        self.dispatch(&rendered.image).await?;
        info!(job_id = %rendered.job_id, "Print job completed successfully");
        Ok(PrintReceipt {
            job_id: rendered.job_id,
            message: "QR code printed successfully".to_string(),
        })
    }

    /// Fit an uploaded image to the label width and print it
    pub async fn print_image(
        &self,
        data: &[u8],
        rotate: Option<u16>,
    ) -> ServiceResult<PrintReceipt> {
        let settings = self.store.load();

        let image = image::load_from_memory(data)
            .map_err(|e| ServiceError::ImageProcessing(format!("failed to decode image: {e}")))?
            .to_rgb8();
        let image = fit_width(&image, LABEL_WIDTH);
        let image = apply_rotation(image, rotate.unwrap_or(settings.rotate))?;

        let job_id = job_id("image");
        self.dispatch(&image).await?;
        info!(job_id = %job_id, "Print job completed successfully");
        Ok(PrintReceipt {
            job_id,
            message: "Image printed successfully".to_string(),
        })
    }

    /// Encode an image and push it through the device transport
    async fn dispatch(&self, image: &RgbImage) -> ServiceResult<()> {
        let settings = self.store.load();
        let params = RasterParams {
            model: settings.printer_model.clone(),
            label_size: settings.label_size.clone(),
            rotate: settings.rotate,
            threshold: settings.threshold,
            dither: settings.dither,
            compress: settings.compress,
            red: settings.red,
        };
        params.validate()?;

        let instructions = self.encoder.encode(image, &params)?;

        let uri = PrinterUri::parse(&settings.printer_uri);
        let transport = (self.transport_factory)(&uri)?;
        transport.send(&instructions).await?;

        info!(
            printer_uri = %settings.printer_uri,
            printer_model = %settings.printer_model,
            label_size = %settings.label_size,
            "Print job sent to printer"
        );
        Ok(())
    }

    // === Printer status ===

    /// Check whether a printer is reachable
    pub async fn check_printer_status(
        &self,
        printer_uri: &str,
        printer_model: &str,
    ) -> PrinterStatus {
        let details = json!({
            "printer_uri": printer_uri,
            "printer_model": printer_model,
        });

        let uri = PrinterUri::parse(printer_uri);
        let transport = match (self.transport_factory)(&uri) {
            Ok(t) => t,
            Err(e) => {
                warn!(printer_uri, error = %e, "Error checking printer status");
                return PrinterStatus {
                    available: false,
                    status: format!("Printer error: {e}"),
                    details,
                };
            }
        };

        if transport.probe().await {
            PrinterStatus {
                available: true,
                status: "Printer is ready".to_string(),
                details,
            }
        } else {
            PrinterStatus {
                available: false,
                status: "Printer is not reachable".to_string(),
                details,
            }
        }
    }

    // === Keep-alive ===

    /// Start the keep-alive watchdog and persist its configuration
    ///
    /// Target falls back from the explicit arguments to the stored printer,
    /// then to the first configured profile. Starting while running replaces
    /// the previous loop.
    pub async fn start_keep_alive(
        &self,
        printer_uri: Option<String>,
        printer_model: Option<String>,
        interval: u64,
    ) -> ServiceResult<()> {
        if interval < MIN_KEEP_ALIVE_INTERVAL {
            return Err(ServiceError::validation(
                format!("interval must be at least {MIN_KEEP_ALIVE_INTERVAL} seconds"),
                "interval",
            ));
        }

        let settings = self.store.load();
        let (uri, model) = resolve_target(&settings, printer_uri, printer_model)?;

        if Backend::guess(&uri) != Backend::Network {
            return Err(ServiceError::configuration(
                "keep alive requires a network printer",
                "printer_uri",
            ));
        }

        // Persist before starting so a restart of the process resumes the
        // watchdog with the same parameters.
        let mut partial = Map::new();
        partial.insert("keep_alive_enabled".to_string(), json!(true));
        partial.insert("keep_alive_interval".to_string(), json!(interval));
        self.store.update(&partial)?;

        let target = ProbeTarget {
            uri: PrinterUri::parse(&uri),
            model,
        };

        let mut strategies: Vec<Box<dyn ProbeStrategy>> = vec![
            Box::new(StatusQueryProbe::new(self.status_query.clone())),
            Box::new(PortScanProbe::new()),
        ];
        match (self.transport_factory)(&target.uri) {
            Ok(transport) => strategies.push(Box::new(TransportProbe::new(transport))),
            Err(e) => warn!(error = %e, "No transport probe for keep alive target"),
        }

        self.watchdog
            .start(target, Duration::from_secs(interval), strategies)
            .await;
        Ok(())
    }

    /// Stop the watchdog; returns whether it was running
    pub async fn stop_keep_alive(&self) -> bool {
        self.watchdog.stop().await
    }

    /// Keep-alive state: persisted intent plus live loop status
    pub async fn keep_alive_status(&self) -> KeepAliveStatus {
        let settings = self.store.load();
        KeepAliveStatus {
            enabled: settings.keep_alive_enabled,
            interval: settings.keep_alive_interval,
            running: self.watchdog.is_running().await,
        }
    }
}

/// Resolve the keep-alive target from explicit arguments, stored settings,
/// or the first configured profile
fn resolve_target(
    settings: &Settings,
    printer_uri: Option<String>,
    printer_model: Option<String>,
) -> ServiceResult<(String, String)> {
    let first_profile = settings.printers.first();

    let uri = printer_uri
        .filter(|s| !s.trim().is_empty())
        .or_else(|| Some(settings.printer_uri.clone()).filter(|s| !s.trim().is_empty()))
        .or_else(|| first_profile.map(|p| p.printer_uri.clone()))
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| {
            ServiceError::validation(
                "printer URI not provided and not found in settings",
                "printer_uri",
            )
        })?;

    let model = printer_model
        .filter(|s| !s.trim().is_empty())
        .or_else(|| Some(settings.printer_model.clone()).filter(|s| !s.trim().is_empty()))
        .or_else(|| first_profile.map(|p| p.printer_model.clone()))
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| {
            ServiceError::validation(
                "printer model not provided and not found in settings",
                "printer_model",
            )
        })?;

    Ok((uri, model))
}

fn job_id(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{prefix}_{}", &id[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_shape() {
        let id = job_id("text");
        assert!(id.starts_with("text_"));
        assert_eq!(id.len(), "text_".len() + 8);
    }

    #[test]
    fn test_resolve_target_prefers_explicit() {
        let settings = Settings::default();
        let (uri, model) = resolve_target(
            &settings,
            Some("tcp://10.0.0.9".to_string()),
            Some("QL-820NWB".to_string()),
        )
        .unwrap();
        assert_eq!(uri, "tcp://10.0.0.9");
        assert_eq!(model, "QL-820NWB");
    }

    #[test]
    fn test_resolve_target_falls_back_to_settings_then_profile() {
        let mut settings = Settings::default();
        let (uri, _) = resolve_target(&settings, None, None).unwrap();
        assert_eq!(uri, settings.printer_uri);

        settings.printer_uri = String::new();
        settings.printer_model = String::new();
        let (uri, model) = resolve_target(&settings, None, None).unwrap();
        assert_eq!(uri, settings.printers[0].printer_uri);
        assert_eq!(model, settings.printers[0].printer_model);

        settings.printers.clear();
        assert!(resolve_target(&settings, None, None).is_err());
    }
}
