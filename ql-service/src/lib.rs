//! # ql-service
//!
//! Core services for a QL label printer server:
//!
//! - **Layout engine** ([`layout`]): text and QR label rendering into
//!   fixed-width pixel images
//! - **Settings store** ([`settings`]): one validated JSON document,
//!   atomically replaced on every save
//! - **Keep-alive watchdog** ([`keepalive`]): a supervised background loop
//!   that keeps a networked printer awake
//!
//! [`LabelService`] ties the three together into the operation surface an
//! API layer calls; the device protocol and transport live in `ql-printer`.

pub mod error;
pub mod keepalive;
pub mod layout;
pub mod logging;
pub mod service;
pub mod settings;

// Re-exports
pub use error::{ErrorBody, ServiceError, ServiceResult};
pub use service::{
    KeepAliveStatus, LabelService, PrintReceipt, PrinterStatus, QrRequest, QrTextRequest,
    RenderedLabel, TextRequest, TransportFactory,
};
pub use settings::{Alignment, PrinterProfile, Settings, SettingsStore};
