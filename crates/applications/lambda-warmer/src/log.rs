//! Warming log records
//!
//! One record per warming invocation, emitted through `tracing` so it lands in
//! the function's log stream alongside everything else.

use chrono::{DateTime, Utc};
use tracing::info;
use warmer_core::{AccessSnapshot, LOG_ACTION_WARMER, LogRecord, LogSink, Result, WarmingEvent};

/// Build the record for a warming invocation
///
/// `previous` is the warm state before this invocation recorded its access.
pub fn warming_record(
    function: &str,
    event: &WarmingEvent,
    previous: &AccessSnapshot,
    now: DateTime<Utc>,
) -> LogRecord {
    LogRecord {
        action: LOG_ACTION_WARMER.to_string(),
        function: function.to_string(),
        correlation_id: event.correlation_id.clone(),
        count: event.effective_index(),
        concurrency: event.effective_total(),
        warm: previous.was_warm,
        last_accessed: previous.last_accessed_at,
        last_accessed_in_seconds: previous.seconds_since_last_access(now),
    }
}

/// Log sink backed by `tracing`
///
/// Emits the record as structured fields plus its JSON encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn emit(&self, record: &LogRecord) -> Result<()> {
        let json = serde_json::to_string(record)?;

        info!(
            action = %record.action,
            function = %record.function,
            correlation_id = record.correlation_id.as_deref().unwrap_or(""),
            count = record.count,
            concurrency = record.concurrency,
            warm = record.warm,
            last_accessed_in_seconds = record.last_accessed_in_seconds,
            record = %json,
            "Warming invocation"
        );

        Ok(())
    }
}
