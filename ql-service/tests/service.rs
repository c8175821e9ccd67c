//! Service facade: render/print pipelines and keep-alive control

mod common;

use common::{FixedFont, MemoryEncoder, MemoryTransport};
use ql_printer::DeviceTransport;
use ql_service::service::{LabelService, QrRequest, QrTextRequest, TextRequest};
use ql_service::settings::SettingsStore;
use serde_json::{Map, json};
use std::sync::{Arc, Mutex};

type Sent = Arc<Mutex<Vec<Vec<u8>>>>;

fn service_with_transport(
    dir: &tempfile::TempDir,
    reachable: bool,
) -> (LabelService, Sent) {
    let store = SettingsStore::new(dir.path().join("settings.json"));
    let (transport, sent) = MemoryTransport::new(reachable);
    let service = LabelService::new(store, Arc::new(FixedFont), Arc::new(MemoryEncoder))
        .with_transport_factory(Arc::new(move |_uri| {
            Ok(transport.clone() as Arc<dyn DeviceTransport>)
        }));
    (service, sent)
}

#[tokio::test]
async fn print_text_renders_encodes_and_sends() {
    let dir = tempfile::tempdir().unwrap();
    let (service, sent) = service_with_transport(&dir, true);

    let receipt = service
        .print_text(&TextRequest {
            text: "Hello<br>World".to_string(),
            ..TextRequest::default()
        })
        .await
        .unwrap();

    assert!(receipt.job_id.starts_with("text_"));
    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    // The fake encoder stamps dimensions and media class.
    assert_eq!(sent[0], b"696x125:62");
}

#[tokio::test]
async fn print_text_requires_text() {
    let dir = tempfile::tempdir().unwrap();
    let (service, _) = service_with_transport(&dir, true);

    let err = service.print_text(&TextRequest::default()).await.unwrap_err();
    assert_eq!(err.code(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn print_qr_requires_data() {
    let dir = tempfile::tempdir().unwrap();
    let (service, _) = service_with_transport(&dir, true);

    let err = service.print_qr(&QrRequest::default()).await.unwrap_err();
    assert_eq!(err.code(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn unreachable_printer_surfaces_as_printer_error() {
    let dir = tempfile::tempdir().unwrap();
    let (service, _) = service_with_transport(&dir, false);

    let err = service
        .print_text(&TextRequest {
            text: "x".to_string(),
            ..TextRequest::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), "PRINTER_ERROR");
}

#[tokio::test]
async fn render_qr_side_by_side_spans_label_width() {
    let dir = tempfile::tempdir().unwrap();
    let (service, _) = service_with_transport(&dir, true);

    let rendered = service
        .render_qr(&QrRequest {
            data: "https://example.com".to_string(),
            side_by_side: true,
            text: Some(QrTextRequest {
                content: "Inventory".to_string(),
                ..QrTextRequest::default()
            }),
            ..QrRequest::default()
        })
        .unwrap();

    assert!(rendered.job_id.starts_with("qrcode_"));
    assert!(rendered.image.width() >= 696);
}

#[tokio::test]
async fn render_qr_text_position_none_suppresses_text() {
    let dir = tempfile::tempdir().unwrap();
    let (service, _) = service_with_transport(&dir, true);

    let rendered = service
        .render_qr(&QrRequest {
            data: "hello".to_string(),
            text: Some(QrTextRequest {
                content: "hidden".to_string(),
                position: Some("none".to_string()),
                ..QrTextRequest::default()
            }),
            ..QrRequest::default()
        })
        .unwrap();

    // No companion block: just the symbol at its target size.
    assert_eq!(rendered.image.dimensions(), (400, 400));
}

#[tokio::test]
async fn render_rotation_override_changes_orientation() {
    let dir = tempfile::tempdir().unwrap();
    let (service, _) = service_with_transport(&dir, true);

    let rendered = service
        .render_text(&TextRequest {
            text: "Hello".to_string(),
            rotate: Some(90),
            ..TextRequest::default()
        })
        .unwrap();
    // One 50 px line plus 10 px margins, turned on its side.
    assert_eq!(rendered.image.dimensions(), (70, 696));
}

#[tokio::test]
async fn print_image_fits_uploaded_image_to_label_width() {
    let dir = tempfile::tempdir().unwrap();
    let (service, sent) = service_with_transport(&dir, true);

    // A 2:1 PNG; fitting to 696 wide makes it 348 tall.
    let img = image::RgbImage::from_pixel(200, 100, image::Rgb([0, 0, 0]));
    let mut png = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();

    let receipt = service.print_image(&png, None).await.unwrap();
    assert!(receipt.job_id.starts_with("image_"));
    assert_eq!(sent.lock().unwrap()[0], b"696x348:62");
}

#[tokio::test]
async fn print_image_rejects_garbage_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let (service, _) = service_with_transport(&dir, true);

    let err = service.print_image(b"not an image", None).await.unwrap_err();
    assert_eq!(err.code(), "IMAGE_PROCESSING_ERROR");
}

#[tokio::test]
async fn check_printer_status_reports_reachability() {
    let dir = tempfile::tempdir().unwrap();

    let (service, _) = service_with_transport(&dir, true);
    let status = service
        .check_printer_status("tcp://192.168.1.100", "QL-800")
        .await;
    assert!(status.available);
    assert_eq!(status.details["printer_uri"], "tcp://192.168.1.100");

    let (service, _) = service_with_transport(&dir, false);
    let status = service
        .check_printer_status("tcp://192.168.1.100", "QL-800")
        .await;
    assert!(!status.available);
}

#[tokio::test]
async fn keep_alive_lifecycle_persists_intent_and_tracks_running() {
    let dir = tempfile::tempdir().unwrap();
    let (service, _) = service_with_transport(&dir, true);

    // Point at localhost so the port-scan fallback fails fast if reached.
    let mut partial = Map::new();
    partial.insert("printer_uri".to_string(), json!("tcp://127.0.0.1:1"));
    service.update_settings(&partial).unwrap();

    let before = service.keep_alive_status().await;
    assert!(!before.enabled);
    assert!(!before.running);

    service.start_keep_alive(None, None, 10).await.unwrap();

    let status = service.keep_alive_status().await;
    assert!(status.enabled);
    assert_eq!(status.interval, 10);
    assert!(status.running);

    assert!(service.stop_keep_alive().await);
    assert!(!service.keep_alive_status().await.running);
    // Stopping does not rewrite the stored intent.
    assert!(service.get_settings().keep_alive_enabled);

    // Stop is idempotent.
    assert!(!service.stop_keep_alive().await);
}

#[tokio::test]
async fn keep_alive_rejects_short_interval_and_non_network_uri() {
    let dir = tempfile::tempdir().unwrap();
    let (service, _) = service_with_transport(&dir, true);

    let err = service.start_keep_alive(None, None, 5).await.unwrap_err();
    assert_eq!(err.code(), "VALIDATION_ERROR");

    let err = service
        .start_keep_alive(Some("file:///tmp/x".to_string()), None, 60)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "CONFIGURATION_ERROR");
}
