//! Start-once/stop-once guard around the running server.
//!
//! # State Machine
//! ```text
//! NotStarted ──start──▶ Serving ──graceful/force stop──▶ Stopped
//! ```
//! Transitions are monotonic. Every transition happens while holding the
//! guard's lock, so `start` and either stop can never interleave and no caller
//! observes a half-built handle.
//!
//! # Design Decisions
//! - The service handle lives inside the `Serving` variant, so it cannot
//!   outlive that state
//! - Graceful drain is bounded by a grace period; when it elapses the server
//!   is aborted rather than waited on indefinitely
//! - Stop requests outside `Serving` are no-ops, which makes repeated shutdown
//!   signals harmless
//! - A shutdown requested before `start` is remembered, and the accept loop
//!   returned by `start` carries it so the shell stops right away

use std::io;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tokio::task::{AbortHandle, JoinHandle};

use crate::net::Listener;
use crate::rpc::interceptor::InterceptorChain;
use crate::rpc::server::router;
use crate::services::ServiceRegistry;

/// Observable lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    NotStarted,
    Serving,
    Stopped,
}

/// Lifecycle misuse, returned rather than panicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("csi-blockdevices: the server has been started")]
    AlreadyStarted,

    #[error("csi-blockdevices: the server has been stopped")]
    AlreadyStopped,
}

/// Control over the spawned accept loop. Exists only while serving.
struct ServiceHandle {
    drain: watch::Sender<bool>,
    finished: watch::Receiver<bool>,
    abort: AbortHandle,
}

impl ServiceHandle {
    /// Stop accepting, let in-flight calls finish. Returns `false` when the
    /// grace period ran out and the loop had to be aborted.
    async fn drain(mut self, grace: Duration) -> bool {
        let _ = self.drain.send(true);
        // A dropped sender means the loop already exited.
        let drained = tokio::time::timeout(grace, self.finished.wait_for(|done| *done))
            .await
            .is_ok();
        if !drained {
            self.abort.abort();
        }
        drained
    }

    fn abort(self) {
        self.abort.abort();
    }
}

enum Slot {
    NotStarted { stop_pending: bool },
    Serving(ServiceHandle),
    Stopped,
}

impl Slot {
    fn state(&self) -> ServerState {
        match self {
            Slot::NotStarted { .. } => ServerState::NotStarted,
            Slot::Serving(_) => ServerState::Serving,
            Slot::Stopped => ServerState::Stopped,
        }
    }
}

/// How the accept loop ended.
#[derive(Debug)]
pub enum AcceptOutcome {
    /// Drained after a graceful stop.
    Drained,
    /// Torn down by a forced stop.
    Aborted,
    /// The transport failed on its own.
    Failed(io::Error),
}

/// Result of a shutdown request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownRequest {
    /// A serving server was drained and stopped.
    Stopped,
    /// Not started yet; the stop happens as soon as it starts.
    Deferred,
    /// Already stopped.
    Ignored,
}

/// The running accept loop, awaited by the server shell.
#[derive(Debug)]
pub struct AcceptLoop {
    task: JoinHandle<io::Result<()>>,
    stop_pending: bool,
}

impl AcceptLoop {
    /// Whether a shutdown was requested before the loop started.
    pub fn stop_pending(&self) -> bool {
        self.stop_pending
    }

    /// Block until the accept loop exits.
    pub async fn wait(self) -> AcceptOutcome {
        match self.task.await {
            Ok(Ok(())) => AcceptOutcome::Drained,
            Ok(Err(e)) => AcceptOutcome::Failed(e),
            Err(e) if e.is_cancelled() => AcceptOutcome::Aborted,
            Err(e) => AcceptOutcome::Failed(io::Error::other(e)),
        }
    }
}

/// Sole owner of the server instance and its lifecycle state.
pub struct LifecycleGuard {
    slot: Mutex<Slot>,
    grace: Duration,
    state: watch::Sender<ServerState>,
}

impl LifecycleGuard {
    /// Create a guard whose graceful stops wait at most `grace`.
    pub fn new(grace: Duration) -> Self {
        let (state, _) = watch::channel(ServerState::NotStarted);
        Self {
            slot: Mutex::new(Slot::NotStarted {
                stop_pending: false,
            }),
            grace,
            state,
        }
    }

    pub async fn state(&self) -> ServerState {
        self.slot.lock().await.state()
    }

    /// Wait until the server has stopped.
    pub async fn stopped(&self) {
        let mut state = self.state.subscribe();
        // The sender lives as long as `self`, so this only ends on `Stopped`.
        let _ = state.wait_for(|s| *s == ServerState::Stopped).await;
    }

    /// Register the surfaces, start the accept loop and enter `Serving`.
    pub async fn start(
        &self,
        listener: Listener,
        registry: ServiceRegistry,
        chain: InterceptorChain,
    ) -> Result<AcceptLoop, LifecycleError> {
        let mut slot = self.slot.lock().await;
        let stop_pending = match *slot {
            Slot::Serving(_) => return Err(LifecycleError::AlreadyStarted),
            Slot::Stopped => return Err(LifecycleError::AlreadyStopped),
            Slot::NotStarted { stop_pending } => stop_pending,
        };

        for service in registry.service_names() {
            tracing::debug!(service, "Registered service");
        }
        tracing::debug!(interceptors = ?chain, "Interceptor chain");
        tracing::info!(address = %listener.local_description(), "Serving");

        let app = router(registry, chain);
        let (drain_tx, mut drain_rx) = watch::channel(false);
        let (finished_tx, finished_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let drain = async move {
                let _ = drain_rx.wait_for(|drain| *drain).await;
            };
            let result = listener.serve(app, drain).await;
            let _ = finished_tx.send(true);
            result
        });

        *slot = Slot::Serving(ServiceHandle {
            drain: drain_tx,
            finished: finished_rx,
            abort: task.abort_handle(),
        });
        self.state.send_replace(ServerState::Serving);
        Ok(AcceptLoop { task, stop_pending })
    }

    /// Drain and stop the server. Returns whether a running server was
    /// stopped; a no-op unless `Serving`.
    pub async fn request_graceful_stop(&self) -> bool {
        let mut slot = self.slot.lock().await;
        let handle = match std::mem::replace(&mut *slot, Slot::Stopped) {
            Slot::Serving(handle) => handle,
            other => {
                *slot = other;
                tracing::debug!(state = ?slot.state(), "Graceful stop ignored, server not serving");
                return false;
            }
        };
        self.drain(handle).await;
        true
    }

    /// Stop the server for process shutdown. Unlike a graceful stop, a
    /// request that arrives before `start` is kept and honoured once the
    /// server starts.
    pub async fn request_shutdown(&self) -> ShutdownRequest {
        let mut slot = self.slot.lock().await;
        match std::mem::replace(&mut *slot, Slot::Stopped) {
            Slot::Serving(handle) => {
                self.drain(handle).await;
                ShutdownRequest::Stopped
            }
            Slot::NotStarted { .. } => {
                *slot = Slot::NotStarted { stop_pending: true };
                tracing::info!("Shutdown requested before serving, deferred until start");
                ShutdownRequest::Deferred
            }
            Slot::Stopped => ShutdownRequest::Ignored,
        }
    }

    /// Drain `handle`. Called with the slot already set to `Stopped`.
    async fn drain(&self, handle: ServiceHandle) {
        tracing::info!("Shutting down server");
        if !handle.drain(self.grace).await {
            tracing::warn!(
                grace_secs = self.grace.as_secs_f64(),
                "Graceful drain timed out, server aborted"
            );
        }
        self.state.send_replace(ServerState::Stopped);
    }

    /// Tear the server down immediately. Returns whether a running server
    /// was stopped; a no-op unless `Serving`.
    pub async fn request_force_stop(&self) -> bool {
        let mut slot = self.slot.lock().await;
        match std::mem::replace(&mut *slot, Slot::Stopped) {
            Slot::Serving(handle) => {
                tracing::warn!("Forcing server stop");
                handle.abort();
                self.state.send_replace(ServerState::Stopped);
                true
            }
            other => {
                *slot = other;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::request::Version;
    use crate::services::IdentityService;
    use std::sync::Arc;
    use tokio::net::TcpListener;

    fn registry() -> ServiceRegistry {
        ServiceRegistry::new(Arc::new(IdentityService::new(vec![Version::new(0, 1, 0)])))
    }

    async fn listener() -> Listener {
        TcpListener::bind("127.0.0.1:0").await.unwrap().into()
    }

    #[tokio::test]
    async fn start_then_start_again_is_rejected() {
        let guard = LifecycleGuard::new(Duration::from_secs(1));
        let _accept = guard
            .start(listener().await, registry(), InterceptorChain::default())
            .await
            .unwrap();
        assert_eq!(guard.state().await, ServerState::Serving);

        let err = guard
            .start(listener().await, registry(), InterceptorChain::default())
            .await
            .unwrap_err();
        assert_eq!(err, LifecycleError::AlreadyStarted);

        assert!(guard.request_graceful_stop().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_starts_admit_exactly_one() {
        let guard = Arc::new(LifecycleGuard::new(Duration::from_secs(1)));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let guard = guard.clone();
            let listener = listener().await;
            tasks.push(tokio::spawn(async move {
                guard
                    .start(listener, registry(), InterceptorChain::default())
                    .await
                    .map(|_| ())
            }));
        }

        let mut ok = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(()) => ok += 1,
                Err(e) => assert_eq!(e, LifecycleError::AlreadyStarted),
            }
        }
        assert_eq!(ok, 1);

        guard.request_graceful_stop().await;
    }

    #[tokio::test]
    async fn stop_before_start_is_noop() {
        let guard = LifecycleGuard::new(Duration::from_secs(1));
        assert!(!guard.request_graceful_stop().await);
        assert!(!guard.request_force_stop().await);
        assert_eq!(guard.state().await, ServerState::NotStarted);

        // Still startable afterwards.
        let accept = guard
            .start(listener().await, registry(), InterceptorChain::default())
            .await;
        assert!(accept.is_ok());
        guard.request_graceful_stop().await;
    }

    #[tokio::test]
    async fn graceful_stop_drains_accept_loop_once() {
        let guard = LifecycleGuard::new(Duration::from_secs(5));
        let accept = guard
            .start(listener().await, registry(), InterceptorChain::default())
            .await
            .unwrap();

        assert!(guard.request_graceful_stop().await);
        assert!(matches!(accept.wait().await, AcceptOutcome::Drained));
        assert_eq!(guard.state().await, ServerState::Stopped);

        assert!(!guard.request_graceful_stop().await);
        assert!(!guard.request_force_stop().await);
    }

    #[tokio::test]
    async fn stopped_server_cannot_restart() {
        let guard = LifecycleGuard::new(Duration::from_secs(1));
        guard
            .start(listener().await, registry(), InterceptorChain::default())
            .await
            .unwrap();
        guard.request_graceful_stop().await;

        let err = guard
            .start(listener().await, registry(), InterceptorChain::default())
            .await
            .unwrap_err();
        assert_eq!(err, LifecycleError::AlreadyStopped);
    }

    #[tokio::test]
    async fn shutdown_before_start_is_deferred() {
        let guard = Arc::new(LifecycleGuard::new(Duration::from_secs(1)));
        assert_eq!(guard.request_shutdown().await, ShutdownRequest::Deferred);
        assert_eq!(guard.request_shutdown().await, ShutdownRequest::Deferred);
        assert_eq!(guard.state().await, ServerState::NotStarted);

        let waiter = {
            let guard = guard.clone();
            tokio::spawn(async move { guard.stopped().await })
        };

        let accept = guard
            .start(listener().await, registry(), InterceptorChain::default())
            .await
            .unwrap();
        assert!(accept.stop_pending());
        assert!(!waiter.is_finished());

        assert!(guard.request_graceful_stop().await);
        tokio::time::timeout(Duration::from_secs(2), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(guard.request_shutdown().await, ShutdownRequest::Ignored);
    }

    #[tokio::test]
    async fn shutdown_while_serving_stops() {
        let guard = LifecycleGuard::new(Duration::from_secs(1));
        let accept = guard
            .start(listener().await, registry(), InterceptorChain::default())
            .await
            .unwrap();
        assert!(!accept.stop_pending());

        assert_eq!(guard.request_shutdown().await, ShutdownRequest::Stopped);
        assert!(matches!(accept.wait().await, AcceptOutcome::Drained));
        guard.stopped().await;
    }

    #[tokio::test]
    async fn force_stop_aborts_accept_loop() {
        let guard = LifecycleGuard::new(Duration::from_secs(1));
        let accept = guard
            .start(listener().await, registry(), InterceptorChain::default())
            .await
            .unwrap();

        assert!(guard.request_force_stop().await);
        assert!(matches!(accept.wait().await, AcceptOutcome::Aborted));
        assert_eq!(guard.state().await, ServerState::Stopped);
    }
}
