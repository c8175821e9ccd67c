//! Printer keep-alive
//!
//! A supervised background loop that keeps a networked printer from idling
//! out, probing through an ordered list of fallback strategies with
//! exponential backoff between failures.

mod probe;
mod watchdog;

pub use probe::{PortScanProbe, ProbeStrategy, ProbeTarget, StatusQuery, StatusQueryProbe, TransportProbe};
pub use watchdog::{MAX_BACKOFF, Watchdog};
