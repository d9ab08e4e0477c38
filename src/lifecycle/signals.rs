//! OS signal handling.
//!
//! # Responsibilities
//! - Register SIGINT and SIGTERM handlers before the server starts
//! - Report each delivery, so repeated signals reach the coordinator too

use std::fmt;
use std::io;

use tokio::signal::unix::{signal, Signal, SignalKind};

/// A signal that requests shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownSignal::Interrupt => f.write_str("SIGINT"),
            ShutdownSignal::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Subscription to the shutdown signals.
pub struct ShutdownSignals {
    interrupt: Signal,
    terminate: Signal,
}

impl ShutdownSignals {
    pub fn register() -> io::Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    /// Wait for the next shutdown signal. `None` once no more can arrive.
    pub async fn recv(&mut self) -> Option<ShutdownSignal> {
        tokio::select! {
            received = self.interrupt.recv() => received.map(|_| ShutdownSignal::Interrupt),
            received = self.terminate.recv() => received.map(|_| ShutdownSignal::Terminate),
        }
    }
}
