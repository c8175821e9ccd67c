//! Device transport for network label printers
//!
//! QL-series printers accept pre-rasterized jobs over raw TCP (port 9100).
//! The transport doubles as a reachability check: opening and closing a
//! connection is enough to keep a printer's network interface awake.

use crate::error::{PrintError, PrintResult};
use crate::uri::PrinterUri;
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, info, instrument, warn};

/// Default raw printing port
pub const DEFAULT_PORT: u16 = 9100;

/// Well-known printer ports tried by reachability scans (RAW, LPR, IPP)
pub const WELL_KNOWN_PORTS: [u16; 3] = [9100, 515, 631];

/// Default timeout for a single reachability probe
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Trait for device transports
#[async_trait]
pub trait DeviceTransport: Send + Sync {
    /// Send pre-rasterized print instructions to the device
    async fn send(&self, data: &[u8]) -> PrintResult<()>;

    /// Open and close a connection to check reachability
    async fn probe(&self) -> bool;
}

/// Network transport (TCP, default port 9100)
///
/// The host may be a bare IP or a resolvable name (e.g. a container's
/// `host.docker.internal` alias), so connections resolve at call time
/// instead of holding a parsed socket address.
#[derive(Debug, Clone)]
pub struct NetworkTransport {
    host: String,
    port: u16,
    send_timeout: Duration,
    probe_timeout: Duration,
}

impl NetworkTransport {
    /// Create a transport from a parsed printer URI
    ///
    /// Fails for non-network URIs; the default port is 9100.
    pub fn from_uri(uri: &PrinterUri) -> PrintResult<Self> {
        if !uri.is_network() {
            return Err(PrintError::InvalidConfig(format!(
                "not a network printer: {}",
                uri.raw()
            )));
        }
        if uri.host().is_empty() {
            return Err(PrintError::InvalidConfig(format!(
                "missing host: {}",
                uri.raw()
            )));
        }

        Ok(Self {
            host: uri.host().to_string(),
            port: uri.port().unwrap_or(DEFAULT_PORT),
            send_timeout: Duration::from_secs(5),
            probe_timeout: PROBE_TIMEOUT,
        })
    }

    /// Create a transport from host and port
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            send_timeout: Duration::from_secs(5),
            probe_timeout: PROBE_TIMEOUT,
        }
    }

    /// Set the connection timeout for sends
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// The target host
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The target port
    pub fn port(&self) -> u16 {
        self.port
    }

    fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[async_trait]
impl DeviceTransport for NetworkTransport {
    #[instrument(skip(data), fields(addr = %self.addr(), data_len = data.len()))]
    async fn send(&self, data: &[u8]) -> PrintResult<()> {
        info!("Connecting to printer");

        let addr = self.addr();
        let mut stream = tokio::time::timeout(self.send_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| PrintError::Timeout(format!("Connection timeout: {}", addr)))?
            .map_err(|e| PrintError::Connection(format!("{}: {}", addr, e)))?;

        info!("Connected, sending {} bytes", data.len());

        stream.write_all(data).await.map_err(|e| {
            PrintError::Io(std::io::Error::new(
                e.kind(),
                format!("Write failed: {}", e),
            ))
        })?;

        stream.flush().await?;

        info!("Print job sent successfully");
        Ok(())
    }

    #[instrument(fields(addr = %self.addr()))]
    async fn probe(&self) -> bool {
        match tokio::time::timeout(self.probe_timeout, TcpStream::connect(self.addr())).await {
            Ok(Ok(_)) => {
                debug!("Printer reachable");
                true
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Printer unreachable");
                false
            }
            Err(_) => {
                warn!("Printer probe timeout");
                false
            }
        }
    }
}

/// One TCP connect-and-drop attempt against an arbitrary port
pub async fn probe_port(host: &str, port: u16, timeout: Duration) -> bool {
    let addr = format!("{}:{}", host, port);
    match tokio::time::timeout(timeout, TcpStream::connect(&addr)).await {
        Ok(Ok(_)) => {
            debug!(addr = %addr, "Port open");
            true
        }
        Ok(Err(e)) => {
            debug!(addr = %addr, error = %e, "Port closed");
            false
        }
        Err(_) => {
            debug!(addr = %addr, "Port probe timeout");
            false
        }
    }
}
