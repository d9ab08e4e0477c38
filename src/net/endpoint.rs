//! Endpoint descriptors.
//!
//! # Accepted forms
//! - `unix:///run/csi/plugin.sock` or `unix:/run/csi/plugin.sock`
//! - `/run/csi/plugin.sock` (bare absolute path, treated as unix)
//! - `tcp://127.0.0.1:10000`

use std::fmt;
use std::path::Path;

use super::listener::ListenerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Unix,
    Tcp,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Unix => f.write_str("unix"),
            Scheme::Tcp => f.write_str("tcp"),
        }
    }
}

/// Where clients connect: a scheme plus a scheme-specific address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDescriptor {
    scheme: Scheme,
    address: String,
}

impl EndpointDescriptor {
    pub fn new(scheme: Scheme, address: impl Into<String>) -> Self {
        Self {
            scheme,
            address: address.into(),
        }
    }

    pub fn parse(endpoint: &str) -> Result<Self, ListenerError> {
        let endpoint = endpoint.trim();
        let invalid = |reason: &str| ListenerError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        };

        let (scheme, address) = if let Some(rest) = endpoint.strip_prefix("unix://") {
            (Scheme::Unix, rest)
        } else if let Some(rest) = endpoint.strip_prefix("unix:") {
            (Scheme::Unix, rest)
        } else if let Some(rest) = endpoint.strip_prefix("tcp://") {
            (Scheme::Tcp, rest)
        } else if endpoint.starts_with('/') {
            (Scheme::Unix, endpoint)
        } else {
            return Err(invalid("expected unix://<path> or tcp://<host:port>"));
        };

        if address.is_empty() {
            return Err(invalid("missing address"));
        }
        if scheme == Scheme::Tcp && !address.contains(':') {
            return Err(invalid("tcp address must include a port"));
        }

        Ok(Self::new(scheme, address))
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Filesystem path backing the endpoint, for unix sockets only.
    pub fn socket_path(&self) -> Option<&Path> {
        match self.scheme {
            Scheme::Unix => Some(Path::new(&self.address)),
            Scheme::Tcp => None,
        }
    }
}

impl fmt::Display for EndpointDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.address)
    }
}
