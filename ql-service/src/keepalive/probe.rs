//! Reachability probe strategies
//!
//! Each watchdog tick walks an ordered list of strategies, most reliable
//! first, until one succeeds. Keeping them behind one trait keeps the set
//! open: a new probe is a new impl, not another branch in the loop.

use async_trait::async_trait;
use ql_printer::{DEFAULT_PORT, DeviceTransport, PROBE_TIMEOUT, PrinterUri, WELL_KNOWN_PORTS, probe_port};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// The printer a probe is aimed at
#[derive(Debug, Clone)]
pub struct ProbeTarget {
    pub uri: PrinterUri,
    pub model: String,
}

/// Structured printer status query capability
///
/// Provided by the embedding runtime when its environment supports one
/// (e.g. an SNMP stack); the core never assumes it exists.
#[async_trait]
pub trait StatusQuery: Send + Sync {
    /// Query the device identified by its bare host; true means alive
    async fn query(&self, host: &str) -> bool;
}

/// One way of checking printer reachability
#[async_trait]
pub trait ProbeStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this strategy can run in the current environment
    fn available(&self) -> bool {
        true
    }

    async fn probe(&self, target: &ProbeTarget) -> bool;
}

/// Structured status query, when the capability is present
pub struct StatusQueryProbe {
    query: Option<Arc<dyn StatusQuery>>,
}

impl StatusQueryProbe {
    pub fn new(query: Option<Arc<dyn StatusQuery>>) -> Self {
        Self { query }
    }
}

#[async_trait]
impl ProbeStrategy for StatusQueryProbe {
    fn name(&self) -> &'static str {
        "status-query"
    }

    fn available(&self) -> bool {
        self.query.is_some()
    }

    async fn probe(&self, target: &ProbeTarget) -> bool {
        match &self.query {
            Some(query) => query.query(target.uri.host()).await,
            None => false,
        }
    }
}

/// Bare TCP scan: the declared port first, then the well-known printer ports
pub struct PortScanProbe {
    timeout: Duration,
}

impl PortScanProbe {
    pub fn new() -> Self {
        Self {
            timeout: PROBE_TIMEOUT,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for PortScanProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProbeStrategy for PortScanProbe {
    fn name(&self) -> &'static str {
        "port-scan"
    }

    async fn probe(&self, target: &ProbeTarget) -> bool {
        let host = target.uri.host();
        let declared = target.uri.port().unwrap_or(DEFAULT_PORT);

        if probe_port(host, declared, self.timeout).await {
            debug!(host, port = declared, "Reachable on declared port");
            return true;
        }

        for port in WELL_KNOWN_PORTS {
            if port == declared {
                continue;
            }
            if probe_port(host, port, self.timeout).await {
                debug!(host, port, "Reachable on alternate port");
                return true;
            }
        }

        warn!(host, "Unreachable on all printer ports");
        false
    }
}

/// Full-address connection through the device transport
///
/// Covers addresses a bare host scan cannot reach, e.g. virtualized
/// hostnames that only resolve through the transport's own lookup.
pub struct TransportProbe {
    transport: Arc<dyn DeviceTransport>,
}

impl TransportProbe {
    pub fn new(transport: Arc<dyn DeviceTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl ProbeStrategy for TransportProbe {
    fn name(&self) -> &'static str {
        "transport"
    }

    async fn probe(&self, _target: &ProbeTarget) -> bool {
        self.transport.probe().await
    }
}
