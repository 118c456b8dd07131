//! Warmer configuration
//!
//! Function identity is read once from the Lambda environment at startup:
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `AWS_LAMBDA_FUNCTION_NAME` | Function to invoke for fan-out | required |
//! | `AWS_LAMBDA_FUNCTION_VERSION` | Version to invoke | `$LATEST` |
//! | `WARMER_DELAY_MS` | Settle delay for leaf pings, nonzero | 125 |
//! | `WARMER_MAX_CONCURRENCY` | Largest batch a ping may request, nonzero | 100 |
//! | `AWS_REGION` | Region for the Lambda client | SDK default chain |
//!
//! When the function identity comes from elsewhere (the CLI's `--function`),
//! [`WarmerConfig::from_env_for`] still reads the remaining variables.

use std::str::FromStr;
use std::time::Duration;
use warmer_core::{
    DEFAULT_FUNCTION_VERSION, DEFAULT_MAX_CONCURRENCY, DEFAULT_SETTLE_DELAY_MS, FunctionIdentity,
    Result, WarmerError,
};

/// Function name variable set by the Lambda runtime
pub const ENV_FUNCTION_NAME: &str = "AWS_LAMBDA_FUNCTION_NAME";

/// Function version variable set by the Lambda runtime
pub const ENV_FUNCTION_VERSION: &str = "AWS_LAMBDA_FUNCTION_VERSION";

/// Settle delay override (milliseconds)
pub const ENV_DELAY_MS: &str = "WARMER_DELAY_MS";

/// Concurrency cap override
pub const ENV_MAX_CONCURRENCY: &str = "WARMER_MAX_CONCURRENCY";

/// Region variable set by the Lambda runtime
pub const ENV_REGION: &str = "AWS_REGION";

/// Process-lifetime warmer configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarmerConfig {
    /// Function fan-out invocations are addressed to (this function)
    pub function: FunctionIdentity,

    /// Sleep applied by a leaf ping that has nothing to invoke
    pub settle_delay: Duration,

    /// Requested concurrency above this is clamped
    pub max_concurrency: u32,

    /// AWS region for the Lambda client
    pub region: Option<String>,
}

impl WarmerConfig {
    /// Create config for a function with default settings
    pub fn new(function: FunctionIdentity) -> Self {
        Self {
            function,
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            region: None,
        }
    }

    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read everything but the function identity from the process environment
    pub fn from_env_for(function: FunctionIdentity) -> Result<Self> {
        Self::from_lookup_for(function, |key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let name = non_empty(&lookup, ENV_FUNCTION_NAME)
            .ok_or_else(|| WarmerError::config(format!("{} is not set", ENV_FUNCTION_NAME)))?;
        let version = non_empty(&lookup, ENV_FUNCTION_VERSION)
            .unwrap_or_else(|| DEFAULT_FUNCTION_VERSION.to_string());

        Self::from_lookup_for(FunctionIdentity::new(name, version), lookup)
    }

    /// Read settings for a known function through an arbitrary key lookup
    pub fn from_lookup_for<F>(function: FunctionIdentity, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new(function);

        if let Some(millis) = parse_var::<u64, _>(&lookup, ENV_DELAY_MS)? {
            config.settle_delay = Duration::from_millis(millis);
        }
        if let Some(max) = parse_var::<u32, _>(&lookup, ENV_MAX_CONCURRENCY)? {
            config.max_concurrency = max;
        }
        config.region = non_empty(&lookup, ENV_REGION);

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the warming protocol cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.settle_delay.is_zero() {
            return Err(WarmerError::config(format!(
                "Settle delay must be nonzero ({})",
                ENV_DELAY_MS
            )));
        }
        if self.max_concurrency == 0 {
            return Err(WarmerError::config(format!(
                "Max concurrency must be nonzero ({})",
                ENV_MAX_CONCURRENCY
            )));
        }
        Ok(())
    }

    /// Set settle delay
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Set concurrency cap
    pub fn with_max_concurrency(mut self, max_concurrency: u32) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Set AWS region
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|v| !v.trim().is_empty())
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = non_empty(lookup, key) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|e| WarmerError::config(format!("Invalid {} '{}': {}", key, raw, e)))
}

/// Per-invocation options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationOptions {
    /// Correlation id for this batch; overrides the one carried by the event
    pub correlation_id: Option<String>,
}

impl InvocationOptions {
    /// Set correlation id
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }
}
