//! Protocol version validation.

use async_trait::async_trait;

use super::{Interceptor, Next};
use crate::rpc::request::{CallContext, RpcRequest, Version};
use crate::rpc::response::{RpcError, RpcResult};

/// Methods callers use to discover versions; they carry none themselves.
const VERSION_EXEMPT: &[&str] = &["GetSupportedVersions"];

/// Rejects calls whose declared version the server does not speak.
#[derive(Debug, Clone)]
pub struct VersionValidator {
    supported: Vec<Version>,
}

impl VersionValidator {
    pub fn new(supported: Vec<Version>) -> Self {
        Self { supported }
    }

    fn check(&self, request: &RpcRequest) -> Result<(), RpcError> {
        if VERSION_EXEMPT.contains(&request.method.method()) {
            return Ok(());
        }
        match request.version() {
            Some(v) if self.supported.contains(&v) => Ok(()),
            declared => Err(RpcError::UnsupportedVersion {
                requested: declared
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "none".to_string()),
                supported: self
                    .supported
                    .iter()
                    .map(Version::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }
}

#[async_trait]
impl Interceptor for VersionValidator {
    fn name(&self) -> &'static str {
        "version-validator"
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
