//! # ql-printer
//!
//! QL-series label printer capabilities - device-facing plumbing only.
//!
//! ## Scope
//!
//! This crate handles HOW to reach a printer:
//! - Printer URI parsing and backend guessing
//! - Network transport (raw TCP, port 9100) with explicit timeouts
//! - Reachability probes (used by print jobs and the keep-alive loop)
//! - Raster job parameters and the encoder seam
//!
//! Business logic (WHAT to print) stays in application code:
//! - Label layout and settings → ql-service
//!
//! The model-specific raster line protocol is deliberately not implemented
//! here; [`RasterEncoder`] is the boundary where a protocol crate plugs in.
//!
//! ## Example
//!
//! ```ignore
//! use ql_printer::{DeviceTransport, NetworkTransport, PrinterUri};
//!
//! let uri = PrinterUri::parse("tcp://192.168.1.100");
//! let transport = NetworkTransport::from_uri(&uri)?;
//! if transport.probe().await {
//!     transport.send(&instructions).await?;
//! }
//! ```

mod error;
mod raster;
mod transport;
mod uri;

// Re-exports
pub use error::{PrintError, PrintResult};
pub use raster::{Media, MEDIA_TABLE, RasterEncoder, RasterParams};
pub use transport::{
    probe_port, DEFAULT_PORT, DeviceTransport, NetworkTransport, PROBE_TIMEOUT, WELL_KNOWN_PORTS,
};
pub use uri::{Backend, PrinterUri};
