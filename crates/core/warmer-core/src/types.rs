//! Core types shared across warmer components

use serde::{Deserialize, Serialize};

/// Version used when the environment does not name one
pub const DEFAULT_FUNCTION_VERSION: &str = "$LATEST";

/// `arn:aws:lambda:<region>:<account>:function:<name>`
const UNQUALIFIED_ARN_COLONS: usize = 6;

/// Name and version of a function, addressed as `name:version`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionIdentity {
    pub name: String,
    pub version: String,
}

impl FunctionIdentity {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Parse `name` or `name:version`. A bare name targets `$LATEST`.
    ///
    /// Function ARNs are accepted; an unqualified ARN has six colons.
    pub fn parse(s: &str) -> Self {
        if s.starts_with("arn:") && s.matches(':').count() == UNQUALIFIED_ARN_COLONS {
            return Self::new(s, DEFAULT_FUNCTION_VERSION);
        }
        match s.rsplit_once(':') {
            Some((name, version)) if !name.is_empty() && !version.is_empty() => {
                Self::new(name, version)
            }
            _ => Self::new(s.trim_end_matches(':'), DEFAULT_FUNCTION_VERSION),
        }
    }

    /// Qualified identifier passed to the transport
    pub fn qualified(&self) -> String {
        format!("{}:{}", self.name, self.version)
    }
}

impl std::fmt::Display for FunctionIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.name, self.version)
    }
}

/// How a descendant invocation is issued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvocationMode {
    /// Caller waits for the invocation to complete
    Blocking,
    /// Caller does not wait for, or observe, completion
    FireAndForget,
}

impl InvocationMode {
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::Blocking)
    }
}

impl std::fmt::Display for InvocationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvocationMode::Blocking => write!(f, "blocking"),
            InvocationMode::FireAndForget => write!(f, "fire-and-forget"),
        }
    }
}

/// Transport response for a single invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokeResponse {
    /// Status code reported by the platform (200 sync, 202 async)
    pub status_code: i32,
}
