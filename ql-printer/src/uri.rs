//! Printer URI handling
//!
//! Printers are addressed by URI (`tcp://192.168.1.100:9100`). The scheme
//! selects the backend; only network printers can be probed or kept alive.

use std::fmt;

/// Transport backend implied by a printer URI scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Raw TCP printing (`tcp://host[:port]`)
    Network,
    /// USB-attached printer (`usb://vendor:product`)
    Usb,
    /// Spool to a file (`file:///path`)
    File,
    /// Unrecognized scheme, carried verbatim
    Unknown,
}

impl Backend {
    /// Guess the backend from a raw URI string
    pub fn guess(uri: &str) -> Backend {
        let trimmed = uri.trim();
        if has_scheme(trimmed, "tcp://") {
            Backend::Network
        } else if has_scheme(trimmed, "usb://") {
            Backend::Usb
        } else if has_scheme(trimmed, "file://") {
            Backend::File
        } else {
            Backend::Unknown
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Network => write!(f, "network"),
            Backend::Usb => write!(f, "usb"),
            Backend::File => write!(f, "file"),
            Backend::Unknown => write!(f, "unknown"),
        }
    }
}

fn has_scheme(uri: &str, scheme: &str) -> bool {
    uri.len() >= scheme.len() && uri[..scheme.len()].eq_ignore_ascii_case(scheme)
}

/// Parsed printer URI
///
/// Parsing never fails: an unrecognized address is kept verbatim with
/// [`Backend::Unknown`] so callers decide whether to reject it. Host and port
/// are only meaningful for network URIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrinterUri {
    raw: String,
    backend: Backend,
    host: String,
    port: Option<u16>,
}

impl PrinterUri {
    /// Parse a printer URI string
    pub fn parse(uri: &str) -> Self {
        let raw = uri.trim().to_string();
        let backend = Backend::guess(&raw);

        let (host, port) = match backend {
            Backend::Network => split_host_port(&raw[6..]),
            // Non-network addresses keep the whole string as "host" so the
            // original address is always recoverable.
            _ => (raw.clone(), None),
        };

        Self {
            raw,
            backend,
            host,
            port,
        }
    }

    /// The original address string, untouched
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Backend guessed from the scheme
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Bare host with scheme and port stripped
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Explicit port, if the address carried one
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Whether this address can be probed over the network
    pub fn is_network(&self) -> bool {
        self.backend == Backend::Network
    }
}

impl fmt::Display for PrinterUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Split `host[:port]`, ignoring an unparsable port rather than failing
fn split_host_port(rest: &str) -> (String, Option<u16>) {
    match rest.rsplit_once(':') {
        Some((host, port_str)) => match port_str.parse::<u16>() {
            Ok(port) => (host.to_string(), Some(port)),
            Err(_) => (rest.to_string(), None),
        },
        None => (rest.to_string(), None),
    }
}
