//! Listener acquisition and the accept loop.
//!
//! # Responsibilities
//! - Bind the configured endpoint (TCP or unix socket)
//! - Clear a stale socket file left behind by a previous run
//! - Run the HTTP accept loop until the drain signal fires

use std::future::Future;
use std::io;
use std::path::Path;

use axum::Router;
use thiserror::Error;
use tokio::net::{TcpListener, UnixListener};

use super::endpoint::{EndpointDescriptor, Scheme};

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("failed to bind {endpoint}: {source}")]
    Bind {
        endpoint: String,
        #[source]
        source: io::Error,
    },
}

/// A bound transport listener.
#[derive(Debug)]
pub enum Listener {
    Tcp(TcpListener),
    Unix(UnixListener),
}

impl Listener {
    /// Bind the listener described by `endpoint`.
    pub async fn bind(endpoint: &EndpointDescriptor) -> Result<Self, ListenerError> {
        let bind_err = |source: io::Error| ListenerError::Bind {
            endpoint: endpoint.to_string(),
            source,
        };

        let listener = match endpoint.scheme() {
            Scheme::Tcp => Listener::Tcp(
                TcpListener::bind(endpoint.address())
                    .await
                    .map_err(bind_err)?,
            ),
            Scheme::Unix => {
                let path = Path::new(endpoint.address());
                prepare_socket_path(path).await.map_err(bind_err)?;
                Listener::Unix(UnixListener::bind(path).map_err(bind_err)?)
            }
        };

        tracing::info!(address = %listener.local_description(), "Listener bound");
        Ok(listener)
    }

    /// Human-readable local address for logging.
    pub fn local_description(&self) -> String {
        match self {
            Listener::Tcp(l) => l
                .local_addr()
                .map(|a| format!("tcp://{a}"))
                .unwrap_or_else(|_| "tcp://<unknown>".to_string()),
            Listener::Unix(l) => l
                .local_addr()
                .ok()
                .and_then(|a| a.as_pathname().map(|p| format!("unix://{}", p.display())))
                .unwrap_or_else(|| "unix://<unnamed>".to_string()),
        }
    }

    /// Serve `app` until `drain` resolves, then wait for open connections.
    pub(crate) async fn serve<F>(self, app: Router, drain: F) -> io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match self {
            Listener::Tcp(l) => axum::serve(l, app).with_graceful_shutdown(drain).await,
            Listener::Unix(l) => axum::serve(l, app).with_graceful_shutdown(drain).await,
        }
    }
}

impl From<TcpListener> for Listener {
    fn from(listener: TcpListener) -> Self {
        Listener::Tcp(listener)
    }
}

impl From<UnixListener> for Listener {
    fn from(listener: UnixListener) -> Self {
        Listener::Unix(listener)
    }
}

async fn prepare_socket_path(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Removed stale socket file");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
