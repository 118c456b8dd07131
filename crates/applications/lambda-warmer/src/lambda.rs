//! AWS Lambda transport
//!
//! Invokes another instance of a function through the Lambda `Invoke` API.
//!
//! | Mode | Invocation type | Returns |
//! |------|-----------------|---------|
//! | Blocking | `RequestResponse` | after the instance finishes (200) |
//! | FireAndForget | `Event` | once the event is queued (202) |
//!
//! ## Prerequisites
//!
//! The function's execution role needs `lambda:InvokeFunction` on itself.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::retry::RetryConfig;
use aws_sdk_lambda::Client as LambdaClient;
use aws_sdk_lambda::error::DisplayErrorContext;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::{InvocationType, LogType};
use aws_types::region::Region;
use tracing::{debug, info};
use warmer_core::{FunctionIdentity, InvocationMode, InvokeResponse, Invoker, Result, WarmerError};

/// Attempts per invocation (one retry)
pub const MAX_INVOKE_ATTEMPTS: u32 = 2;

/// Create Lambda client from environment
pub async fn create_lambda_client(region: Option<String>) -> LambdaClient {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .retry_config(RetryConfig::standard().with_max_attempts(MAX_INVOKE_ATTEMPTS));

    if let Some(region) = region {
        debug!("Creating Lambda client for region: {}", region);
        loader = loader.region(Region::new(region));
    }

    let config = loader.load().await;
    LambdaClient::new(&config)
}

/// Map an invocation mode onto the Lambda invocation type
pub fn invocation_type(mode: InvocationMode) -> InvocationType {
    match mode {
        InvocationMode::Blocking => InvocationType::RequestResponse,
        InvocationMode::FireAndForget => InvocationType::Event,
    }
}

/// Transport that invokes functions through the Lambda API
pub struct LambdaInvoker {
    client: LambdaClient,
}

impl LambdaInvoker {
    /// Create a new Lambda invoker
    pub fn new(client: LambdaClient) -> Self {
        Self { client }
    }

    /// Create from the default AWS config chain
    pub async fn from_env(region: Option<String>) -> Self {
        Self::new(create_lambda_client(region).await)
    }
}

#[async_trait]
impl Invoker for LambdaInvoker {
    async fn invoke(
        &self,
        target: &FunctionIdentity,
        payload: Vec<u8>,
        mode: InvocationMode,
    ) -> Result<InvokeResponse> {
        let function = target.qualified();

        debug!(function = %function, mode = %mode, "Invoking function");

        let output = self
            .client
            .invoke()
            .function_name(&function)
            .invocation_type(invocation_type(mode))
            .log_type(LogType::None)
            .payload(Blob::new(payload))
            .send()
            .await
            .map_err(|e| {
                WarmerError::invoke(format!(
                    "Lambda invoke of {} failed: {}",
                    function,
                    DisplayErrorContext(&e)
                ))
            })?;

        if let Some(kind) = output.function_error() {
            return Err(WarmerError::FunctionError {
                function,
                kind: kind.to_string(),
            });
        }

        Ok(InvokeResponse {
            status_code: output.status_code(),
        })
    }
}

/// Transport that logs invocations instead of sending them
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunInvoker;

#[async_trait]
impl Invoker for DryRunInvoker {
    async fn invoke(
        &self,
        target: &FunctionIdentity,
        payload: Vec<u8>,
        mode: InvocationMode,
    ) -> Result<InvokeResponse> {
        info!(
            function = %target,
            mode = %mode,
            payload = %String::from_utf8_lossy(&payload),
            "Dry run: skipping invocation"
        );

        let status_code = match mode {
            InvocationMode::Blocking => 200,
            InvocationMode::FireAndForget => 202,
        };
        Ok(InvokeResponse { status_code })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_type_mapping() {
        assert_eq!(
            invocation_type(InvocationMode::Blocking),
            InvocationType::RequestResponse
        );
        assert_eq!(
            invocation_type(InvocationMode::FireAndForget),
            InvocationType::Event
        );
    }

    #[tokio::test]
    async fn test_dry_run_invoker() {
        let target = FunctionIdentity::new("orders", "7");

        let blocking = DryRunInvoker
            .invoke(&target, b"{}".to_vec(), InvocationMode::Blocking)
            .await
            .unwrap();
        assert_eq!(blocking.status_code, 200);

        let queued = DryRunInvoker
            .invoke(&target, b"{}".to_vec(), InvocationMode::FireAndForget)
            .await
            .unwrap();
        assert_eq!(queued.status_code, 202);
    }
}
