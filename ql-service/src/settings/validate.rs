//! Settings document validation
//!
//! All-or-nothing: a save is rejected as a whole if any rule fails, and the
//! on-disk document stays untouched. Rules mirror what the rest of the core
//! can actually act on (alignment and rotation sets, threshold range, the
//! keep-alive × backend compatibility rule, profile completeness).

use crate::error::{ServiceError, ServiceResult};
use crate::settings::model::{PrinterProfile, Settings};
use ql_printer::Backend;

/// Minimum keep-alive interval in seconds
pub const MIN_KEEP_ALIVE_INTERVAL: u64 = 10;

/// Validate that a required string is non-empty
fn require_non_empty(value: &str, field: &'static str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::configuration(
            format!("{field} must not be empty"),
            field,
        ));
    }
    Ok(())
}

fn validate_profile(profile: &PrinterProfile, index: usize) -> ServiceResult<()> {
    let check = |value: &str, field: &str| -> ServiceResult<()> {
        if value.trim().is_empty() {
            return Err(ServiceError::configuration(
                format!("printers[{index}].{field} must not be empty"),
                format!("printers[{index}].{field}"),
            ));
        }
        Ok(())
    };

    check(&profile.id, "id")?;
    check(&profile.printer_uri, "printer_uri")?;
    check(&profile.printer_model, "printer_model")?;
    check(&profile.label_size, "label_size")?;
    Ok(())
}

/// Validate a complete settings document
pub fn validate(settings: &Settings) -> ServiceResult<()> {
    require_non_empty(&settings.printer_uri, "printer_uri")?;
    require_non_empty(&settings.printer_model, "printer_model")?;
    require_non_empty(&settings.label_size, "label_size")?;

    if settings.font_size == 0 {
        return Err(ServiceError::configuration(
            "font_size must be greater than 0",
            "font_size",
        ));
    }

    if ![0, 90, 180, 270].contains(&settings.rotate) {
        return Err(ServiceError::configuration(
            format!(
                "invalid rotate value: {}. Must be 0, 90, 180, or 270",
                settings.rotate
            ),
            "rotate",
        ));
    }

    if !(0.0..=100.0).contains(&settings.threshold) {
        return Err(ServiceError::configuration(
            format!(
                "invalid threshold value: {}. Must be between 0 and 100",
                settings.threshold
            ),
            "threshold",
        ));
    }

    if settings.keep_alive_enabled {
        if settings.keep_alive_interval < MIN_KEEP_ALIVE_INTERVAL {
            return Err(ServiceError::configuration(
                format!(
                    "keep_alive_interval must be at least {MIN_KEEP_ALIVE_INTERVAL} seconds, got {}",
                    settings.keep_alive_interval
                ),
                "keep_alive_interval",
            ));
        }
        if Backend::guess(&settings.printer_uri) != Backend::Network {
            return Err(ServiceError::configuration(
                "keep alive requires a network printer",
                "keep_alive_enabled",
            ));
        }
    }

    if settings.printers.is_empty() {
        return Err(ServiceError::configuration(
            "the printers list must not be empty",
            "printers",
        ));
    }
    for (i, profile) in settings.printers.iter().enumerate() {
        validate_profile(profile, i)?;
    }

    Ok(())
}
