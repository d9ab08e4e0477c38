//! Required-field validation.
//!
//! Each storage method names the fields it cannot be served without. A field
//! counts as absent when it is missing, `null`, or an empty string/array.
//! Methods not listed here have no required fields.

use async_trait::async_trait;
use serde_json::Value;

use super::{Interceptor, Next};
use crate::rpc::request::{CallContext, RpcRequest};
use crate::rpc::response::{RpcError, RpcResult};

const REQUIRED_FIELDS: &[(&str, &[&str])] = &[
    ("CreateVolume", &["name"]),
    ("DeleteVolume", &["volume_id"]),
    (
        "ControllerPublishVolume",
        &["volume_id", "node_id", "volume_capability"],
    ),
    ("ControllerUnpublishVolume", &["volume_id"]),
    (
        "ValidateVolumeCapabilities",
        &["volume_id", "volume_capabilities"],
    ),
    (
        "NodePublishVolume",
        &["volume_id", "target_path", "volume_capability"],
    ),
    ("NodeUnpublishVolume", &["volume_id", "target_path"]),
];

/// Fields a method requires, empty when it has none.
pub fn required_fields(method: &str) -> &'static [&'static str] {
    REQUIRED_FIELDS
        .iter()
        .find(|(name, _)| *name == method)
        .map(|(_, fields)| *fields)
        .unwrap_or(&[])
}

fn is_absent(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(_) => false,
    }
}

/// Rejects calls that omit fields their method requires.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestValidator;

impl RequestValidator {
    fn check(&self, request: &RpcRequest) -> Result<(), RpcError> {
        let missing: Vec<&str> = required_fields(request.method.method())
            .iter()
            .copied()
            .filter(|field| is_absent(request.field(field)))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(RpcError::InvalidArgument(format!(
                "{} requires {}",
                request.method.method(),
                missing.join(", ")
            )))
        }
    }
}

#[async_trait]
impl Interceptor for RequestValidator {
    fn name(&self) -> &'static str {
        "request-validator"
    }

    async fn intercept(
        &self,
        ctx: &mut CallContext,
        request: RpcRequest,
        next: Next<'_>,
    ) -> RpcResult {
        self.check(&request)?;
        next.run(ctx, request).await
    }
}
