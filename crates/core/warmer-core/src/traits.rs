//! Collaborator interfaces
//!
//! The coordinator reaches the outside world only through these traits: the
//! transport that invokes another instance of the function, and the sink that
//! receives one log record per warming invocation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::types::{FunctionIdentity, InvocationMode, InvokeResponse};

/// Action tag carried by every warming log record
pub const LOG_ACTION_WARMER: &str = "warmer";

/// Structured record emitted once per warming invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub action: String,
    /// `name:version` of the function handling the ping
    pub function: String,
    pub correlation_id: Option<String>,
    /// Invocation index of this ping
    pub count: u32,
    /// Batch total
    pub concurrency: u32,
    /// Warm flag before this invocation
    pub warm: bool,
    /// Access time before this invocation
    pub last_accessed: Option<DateTime<Utc>>,
    /// Seconds since the previous access, 0 when never accessed
    pub last_accessed_in_seconds: f64,
}

/// Invokes another instance of a function
#[async_trait]
pub trait Invoker: Send + Sync {
    async fn invoke(
        &self,
        target: &FunctionIdentity,
        payload: Vec<u8>,
        mode: InvocationMode,
    ) -> Result<InvokeResponse>;
}

/// Accepts warming log records
///
/// A failing sink never aborts the invocation; the coordinator reports the
/// error and carries on.
pub trait LogSink: Send + Sync {
    fn emit(&self, record: &LogRecord) -> Result<()>;
}
