//! Warming event classification
//!
//! Every invocation payload is classified into a [`WarmingEvent`], whether or
//! not it is a warming ping. Classification is best-effort: the invocation
//! framework may hand us anything, so malformed or partial input degrades to
//! defaults instead of failing.
//!
//! ## Wire format
//!
//! ```json
//! {
//!   "warmer": true,
//!   "concurrency": 3,
//!   "warmerInvocation": 2,
//!   "warmerConcurrency": 3,
//!   "correlationId": "b5d7..."
//! }
//! ```
//!
//! Keys are matched case-insensitively on input (an exact match wins).
//! Unknown keys are ignored.

use crate::error::Result;
use serde::Serialize;
use serde_json::{Map, Value};

const KEY_WARMER: &str = "warmer";
const KEY_CONCURRENCY: &str = "concurrency";
const KEY_INVOCATION: &str = "warmerInvocation";
const KEY_TOTAL: &str = "warmerConcurrency";
const KEY_CORRELATION_ID: &str = "correlationId";

/// A classified invocation payload
///
/// Counts are stored with defaults already applied, so a freshly classified
/// event never holds zero in `requested_concurrency` or `invocation_index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WarmingEvent {
    /// True if this invocation exists only to keep the instance warm
    #[serde(rename = "warmer")]
    pub is_warming_ping: bool,

    /// Total number of warm instances desired
    #[serde(rename = "concurrency")]
    pub requested_concurrency: u32,

    /// Position of this ping within its fan-out batch (1 is the originator)
    #[serde(rename = "warmerInvocation")]
    pub invocation_index: u32,

    /// Total pings expected in the current batch
    #[serde(rename = "warmerConcurrency")]
    pub total_invocations: u32,

    /// Opaque tracing token shared by a batch
    #[serde(rename = "correlationId", skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl Default for WarmingEvent {
    fn default() -> Self {
        Self {
            is_warming_ping: false,
            requested_concurrency: 1,
            invocation_index: 1,
            total_invocations: 1,
            correlation_id: None,
        }
    }
}

impl WarmingEvent {
    /// Originating warming ping requesting `concurrency` warm instances
    pub fn warming(concurrency: u32) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            is_warming_ping: true,
            requested_concurrency: concurrency,
            invocation_index: 1,
            total_invocations: concurrency,
            correlation_id: None,
        }
    }

    /// Set correlation id
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// Classify raw payload bytes. Bytes that are not JSON classify as ordinary traffic.
    pub fn from_slice(bytes: &[u8]) -> Self {
        serde_json::from_slice::<Value>(bytes)
            .map(|raw| classify(&raw))
            .unwrap_or_default()
    }

    /// Serialize for the wire
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Requested concurrency, never below 1
    pub fn effective_concurrency(&self) -> u32 {
        self.requested_concurrency.max(1)
    }

    /// Invocation index, never below 1
    pub fn effective_index(&self) -> u32 {
        self.invocation_index.max(1)
    }

    /// Batch total, falling back to the requested concurrency when unset
    pub fn effective_total(&self) -> u32 {
        match self.total_invocations {
            0 => self.effective_concurrency(),
            total => total,
        }
    }
}

/// Classify an arbitrary JSON value
///
/// Never fails. Non-object input, and objects without `warmer: true`, classify
/// as ordinary traffic.
pub fn classify(raw: &Value) -> WarmingEvent {
    let Some(fields) = raw.as_object() else {
        return WarmingEvent::default();
    };

    let is_warming_ping = matches!(lookup(fields, KEY_WARMER), Some(Value::Bool(true)));
    let requested_concurrency = count_field(lookup(fields, KEY_CONCURRENCY)).max(1);
    let invocation_index = count_field(lookup(fields, KEY_INVOCATION)).max(1);
    let total_invocations = match count_field(lookup(fields, KEY_TOTAL)) {
        0 => requested_concurrency,
        total => total,
    };
    let correlation_id = lookup(fields, KEY_CORRELATION_ID)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    WarmingEvent {
        is_warming_ping,
        requested_concurrency,
        invocation_index,
        total_invocations,
        correlation_id,
    }
}

fn lookup<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    fields.get(key).or_else(|| {
        fields
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

/// Non-negative integer, or 0 when absent or unusable
fn count_field(value: Option<&Value>) -> u32 {
    let Some(Value::Number(n)) = value else {
        return 0;
    };

    n.as_u64()
        .or_else(|| {
            n.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        })
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0)
}
