//! Inbound call representation.
//!
//! # Responsibilities
//! - Carry the method path and JSON payload of one RPC call
//! - Hold per-call context (correlation ID, start time)
//! - Extract the caller's declared protocol version
//!
//! # Design Decisions
//! - Request ID lives on the context, not the payload, so interceptors can
//!   attach one without touching the message
//! - Payload stays an opaque `serde_json::Value`; only the interceptors that
//!   need fields look inside it

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Header used to carry the correlation ID over the wire.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Correlation identifier attached to every call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a fresh random (UUID v4) request ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Protocol version declared by a caller or supported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Fully qualified method, e.g. `/csi.v0.Identity/GetPluginInfo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodPath {
    service: String,
    method: String,
}

impl MethodPath {
    pub fn new(service: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            method: method.into(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn method(&self) -> &str {
        &self.method
    }
}

impl fmt::Display for MethodPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.service, self.method)
    }
}

/// A single inbound RPC call.
#[derive(Debug, Clone)]
pub struct RpcRequest {
    pub method: MethodPath,
    pub payload: Value,
}

impl RpcRequest {
    pub fn new(method: MethodPath, payload: Value) -> Self {
        Self { method, payload }
    }

    /// Look up a top-level field of the payload.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.payload.get(name)
    }

    /// The protocol version the caller declared, if any.
    ///
    /// A `version` field that does not decode as `{major, minor, patch}` is
    /// treated the same as a missing one.
    pub fn version(&self) -> Option<Version> {
        self.field("version")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Per-call state shared by the interceptor chain and the handler.
#[derive(Debug, Clone)]
pub struct CallContext {
    request_id: Option<RequestId>,
    started: Instant,
}

impl CallContext {
    pub fn new() -> Self {
        Self {
            request_id: None,
            started: Instant::now(),
        }
    }

    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id: Some(request_id),
            ..Self::new()
        }
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn set_request_id(&mut self, request_id: RequestId) {
        self.request_id = Some(request_id);
    }

    /// Time since the call entered the server.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Default for CallContext {
    fn default() -> Self {
        Self::new()
    }
}
