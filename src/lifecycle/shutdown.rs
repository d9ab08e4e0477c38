//! Shutdown coordination for the plugin.
//!
//! # State Machine
//! ```text
//! Armed ──signal──▶ Triggered ──stop + socket cleanup──▶ Complete
//! ```
//! A trigger asks the lifecycle guard for a graceful stop, then removes the
//! unix socket file if one is still present. Triggering again is harmless:
//! the guard is already stopped and removing an absent file is not an error.
//!
//! A trigger that arrives before the server has started stays in
//! `Triggered` until the server has started and been stopped. The socket is
//! never removed from under a server that is about to serve on it.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::guard::{LifecycleGuard, ShutdownRequest};
use super::signals::ShutdownSignals;
use crate::net::EndpointDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownPhase {
    Armed,
    Triggered,
    Complete,
}

/// Socket file removal failed. Reported, never fatal.
#[derive(Debug, Error)]
#[error("unable to remove socket file {}: {source}", path.display())]
pub struct CleanupError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// What one trigger did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShutdownReport {
    /// A serving server was stopped by this trigger. `false` when the stop
    /// was deferred to startup.
    pub stopped_server: bool,
    /// The socket file was removed by this trigger.
    pub removed_socket: bool,
}

/// Remove a socket file. `Ok(false)` when it was already gone.
pub async fn remove_socket_file(path: &Path) -> Result<bool, CleanupError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(CleanupError {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Coordinator for graceful shutdown.
pub struct ShutdownCoordinator {
    guard: Arc<LifecycleGuard>,
    endpoint: EndpointDescriptor,
    phase: watch::Sender<ShutdownPhase>,
}

impl ShutdownCoordinator {
    pub fn new(guard: Arc<LifecycleGuard>, endpoint: EndpointDescriptor) -> Self {
        let (phase, _) = watch::channel(ShutdownPhase::Armed);
        Self {
            guard,
            endpoint,
            phase,
        }
    }

    pub fn phase(&self) -> ShutdownPhase {
        *self.phase.borrow()
    }

    /// Subscribe to phase changes.
    pub fn subscribe(&self) -> watch::Receiver<ShutdownPhase> {
        self.phase.subscribe()
    }

    /// Trigger on every signal delivered to `signals`.
    pub fn arm(self: Arc<Self>, mut signals: ShutdownSignals) -> JoinHandle<()> {
        tracing::debug!(endpoint = %self.endpoint, "Shutdown coordinator armed");

        tokio::spawn(async move {
            while let Some(signal) = signals.recv().await {
                tracing::info!(%signal, "Shutdown signal received");
                let coordinator = self.clone();
                // Deferred triggers wait for startup; keep receiving meanwhile.
                tokio::spawn(async move {
                    coordinator.trigger().await;
                });
            }
        })
    }

    /// Stop the server and clean up its socket file.
    pub async fn trigger(&self) -> ShutdownReport {
        self.phase.send_if_modified(|phase| {
            if *phase == ShutdownPhase::Armed {
                *phase = ShutdownPhase::Triggered;
                true
            } else {
                false
            }
        });

        let mut report = ShutdownReport::default();
        match self.guard.request_shutdown().await {
            ShutdownRequest::Stopped => report.stopped_server = true,
            ShutdownRequest::Deferred => self.guard.stopped().await,
            ShutdownRequest::Ignored => {}
        }

        if let Some(path) = self.endpoint.socket_path() {
            if tokio::fs::metadata(path).await.is_ok() {
                match remove_socket_file(path).await {
                    Ok(removed) => report.removed_socket = removed,
                    Err(e) => tracing::warn!(error = %e, "Unable to remove sock file"),
                }
            }
        }

        self.phase.send_replace(ShutdownPhase::Complete);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::{Listener, Scheme};
    use crate::rpc::interceptor::InterceptorChain;
    use crate::rpc::request::Version;
    use crate::services::{IdentityService, ServiceRegistry};
    use crate::lifecycle::guard::ServerState;
    use std::time::Duration;

    fn registry() -> ServiceRegistry {
        ServiceRegistry::new(Arc::new(IdentityService::new(vec![Version::new(0, 1, 0)])))
    }

    #[tokio::test]
    async fn removing_absent_socket_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.sock");
        assert_eq!(remove_socket_file(&path).await.unwrap(), false);

        std::fs::write(&path, b"").unwrap();
        assert!(remove_socket_file(&path).await.unwrap());
        assert!(!remove_socket_file(&path).await.unwrap());
    }

    #[tokio::test]
    async fn removal_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-a-file");
        std::fs::create_dir(&path).unwrap();

        let err = remove_socket_file(&path).await.unwrap_err();
        assert_eq!(err.path, path);
    }

    #[tokio::test]
    async fn double_trigger_stops_once_and_cleans_socket() {
        let dir = tempfile::tempdir().unwrap();
        let sock = dir.path().join("csi.sock");
        let endpoint = EndpointDescriptor::new(Scheme::Unix, sock.to_string_lossy());

        let guard = Arc::new(LifecycleGuard::new(Duration::from_secs(2)));
        let listener = Listener::bind(&endpoint).await.unwrap();
        let _accept = guard
            .start(listener, registry(), InterceptorChain::default())
            .await
            .unwrap();
        assert!(sock.exists());

        let coordinator = ShutdownCoordinator::new(guard.clone(), endpoint);
        assert_eq!(coordinator.phase(), ShutdownPhase::Armed);

        let first = coordinator.trigger().await;
        assert_eq!(
            first,
            ShutdownReport {
                stopped_server: true,
                removed_socket: true,
            }
        );
        assert_eq!(coordinator.phase(), ShutdownPhase::Complete);
        assert!(!sock.exists());

        let second = coordinator.trigger().await;
        assert_eq!(second, ShutdownReport::default());
        assert_eq!(guard.state().await, ServerState::Stopped);
        assert!(!sock.exists());
    }

    #[tokio::test]
    async fn concurrent_triggers_are_safe() {
        let dir = tempfile::tempdir().unwrap();
        let sock = dir.path().join("csi.sock");
        let endpoint = EndpointDescriptor::new(Scheme::Unix, sock.to_string_lossy());

        let guard = Arc::new(LifecycleGuard::new(Duration::from_secs(2)));
        let listener = Listener::bind(&endpoint).await.unwrap();
        guard
            .start(listener, registry(), InterceptorChain::default())
            .await
            .unwrap();

        let coordinator = Arc::new(ShutdownCoordinator::new(guard.clone(), endpoint));
        let (a, b) = tokio::join!(coordinator.trigger(), coordinator.trigger());

        assert_eq!(
            [a.stopped_server, b.stopped_server].iter().filter(|s| **s).count(),
            1
        );
        assert!(!(a.removed_socket && b.removed_socket));
        assert!(!sock.exists());
    }

    #[tokio::test]
    async fn trigger_before_start_waits_for_server() {
        let dir = tempfile::tempdir().unwrap();
        let sock = dir.path().join("csi.sock");
        let endpoint = EndpointDescriptor::new(Scheme::Unix, sock.to_string_lossy());
        let listener = Listener::bind(&endpoint).await.unwrap();

        let guard = Arc::new(LifecycleGuard::new(Duration::from_secs(2)));
        let coordinator = Arc::new(ShutdownCoordinator::new(guard.clone(), endpoint));
        let pending = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.trigger().await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(coordinator.phase(), ShutdownPhase::Triggered);
        assert!(sock.exists());
        assert!(!pending.is_finished());

        let accept = guard
            .start(listener, registry(), InterceptorChain::default())
            .await
            .unwrap();
        assert!(accept.stop_pending());
        assert!(guard.request_graceful_stop().await);

        let report = tokio::time::timeout(Duration::from_secs(2), pending)
            .await
            .unwrap()
            .unwrap();
        assert!(report.removed_socket);
        assert_eq!(coordinator.phase(), ShutdownPhase::Complete);
        assert!(!sock.exists());
    }

    #[tokio::test]
    async fn tcp_endpoint_has_nothing_to_clean() {
        let guard = Arc::new(LifecycleGuard::new(Duration::from_secs(1)));
        let endpoint = EndpointDescriptor::parse("tcp://127.0.0.1:0").unwrap();
        let listener = Listener::bind(&endpoint).await.unwrap();
        guard
            .start(listener, registry(), InterceptorChain::default())
            .await
            .unwrap();

        let coordinator = ShutdownCoordinator::new(guard, endpoint);
        let report = coordinator.trigger().await;

        assert!(report.stopped_server);
        assert!(!report.removed_socket);
    }
}
