//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

use csi_blockdevices::config::PluginConfig;
use csi_blockdevices::lifecycle::{LifecycleGuard, ServerState};
use csi_blockdevices::net::Listener;
use csi_blockdevices::rpc::ServerError;
use csi_blockdevices::{CapabilitySelection, PluginServer};

/// One log event as seen by the capture layer.
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: tracing::Level,
    pub message: String,
    pub fields: BTreeMap<String, String>,
}

impl CapturedEvent {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: BTreeMap<String, String>,
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.insert(field.name().to_string(), value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let value = format!("{value:?}");
        if field.name() == "message" {
            self.message = value;
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

/// Tracing layer that keeps every event in memory.
#[derive(Clone, Default)]
pub struct CapturedLogs {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl CapturedLogs {
    /// Capture events emitted on this thread until the guard is dropped.
    pub fn install() -> (Self, tracing::subscriber::DefaultGuard) {
        let logs = Self::default();
        let subscriber = tracing_subscriber::registry().with(logs.clone());
        let guard = tracing::subscriber::set_default(subscriber);
        (logs, guard)
    }

    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn with_message(&self, message: &str) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.message == message)
            .collect()
    }
}

impl<S: Subscriber> Layer<S> for CapturedLogs {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

/// A server running on a loopback TCP port.
pub struct RunningServer {
    pub addr: SocketAddr,
    pub guard: Arc<LifecycleGuard>,
    pub task: JoinHandle<Result<(), ServerError>>,
}

impl RunningServer {
    pub fn url(&self, service: &str, method: &str) -> String {
        format!("http://{}/{}/{}", self.addr, service, method)
    }
}

/// Start a server for `selection` on an ephemeral port and wait until it
/// is serving.
pub async fn start_tcp_server(config: &PluginConfig, selection: CapabilitySelection) -> RunningServer {
    let tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = tcp.local_addr().unwrap();

    let server = PluginServer::from_config(config, selection);
    let guard = server.guard();
    let task = tokio::spawn(async move { server.serve(Listener::from(tcp)).await });

    wait_for_state(&guard, ServerState::Serving).await;
    RunningServer { addr, guard, task }
}

pub async fn wait_for_state(guard: &LifecycleGuard, state: ServerState) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while guard.state().await != state {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("server did not reach expected state");
}

/// Request body declaring the default supported version.
pub fn versioned(mut body: Value) -> Value {
    body["version"] = json!({ "major": 0, "minor": 1, "patch": 0 });
    body
}
