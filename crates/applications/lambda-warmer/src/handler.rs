//! Warming coordinator
//!
//! Runs once per invocation:
//!
//! ```text
//! raw event
//!     │
//!     ├── 1. Classify
//!     │
//!     ├── 2. Record access (always, real traffic proves liveness too)
//!     │
//!     ├── not a warming ping ──────────────────────→ Passthrough
//!     │
//!     ├── 3. Emit log record
//!     │
//!     ├── 4. Plan fan-out
//!     │
//!     └── 5. Invoke descendants, or settle delay ──→ Handled
//! ```
//!
//! Both outcomes are successes. Nothing in here retries.

use crate::config::{InvocationOptions, WarmerConfig};
use crate::invoker::{FanOutReport, SelfInvoker};
use crate::log::{TracingLogSink, warming_record};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use warmer_core::{
    FanOutPlanner, Invoker, LogSink, Result, WarmState, WarmerError, WarmingEvent, classify,
};

/// Result of handling one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarmOutcome {
    /// Warming ping, fully handled
    Handled,
    /// Ordinary traffic, the caller should process it
    Passthrough,
}

impl WarmOutcome {
    /// Boolean convention: was this a warming event
    pub fn is_warming(&self) -> bool {
        matches!(self, Self::Handled)
    }

    /// Error convention: `Passthrough` becomes [`WarmerError::NotWarmerEvent`]
    pub fn into_result(self) -> Result<()> {
        match self {
            Self::Handled => Ok(()),
            Self::Passthrough => Err(WarmerError::NotWarmerEvent),
        }
    }
}

/// Self-warming coordinator
///
/// Construct once per process and reuse for every invocation; the warm state
/// it holds must outlive individual invocations.
pub struct Warmer {
    config: WarmerConfig,
    state: Arc<WarmState>,
    planner: FanOutPlanner,
    invoker: SelfInvoker,
    log_sink: Arc<dyn LogSink>,
}

impl Warmer {
    /// Create a coordinator with fresh warm state, logging through `tracing`
    pub fn new(config: WarmerConfig, invoker: Arc<dyn Invoker>) -> Self {
        Self {
            planner: FanOutPlanner::with_settle_delay(config.settle_delay)
                .with_max_concurrency(config.max_concurrency),
            invoker: SelfInvoker::new(invoker, config.function.clone()),
            state: Arc::new(WarmState::new()),
            log_sink: Arc::new(TracingLogSink),
            config,
        }
    }

    /// Share an existing warm state
    pub fn with_state(mut self, state: Arc<WarmState>) -> Self {
        self.state = state;
        self
    }

    /// Set log sink
    pub fn with_log_sink(mut self, log_sink: Arc<dyn LogSink>) -> Self {
        self.log_sink = log_sink;
        self
    }

    /// Warm state of this instance
    pub fn state(&self) -> &Arc<WarmState> {
        &self.state
    }

    /// Configuration in use
    pub fn config(&self) -> &WarmerConfig {
        &self.config
    }

    /// Handle one invocation payload
    pub async fn handle(&self, raw: &Value, options: InvocationOptions) -> WarmOutcome {
        let mut event = classify(raw);

        if let Some(correlation_id) = options.correlation_id.filter(|id| !id.is_empty()) {
            event.correlation_id = Some(correlation_id);
        }

        self.handle_event(&event).await.0
    }

    /// Handle an already classified event, also returning the fan-out report
    pub async fn handle_event(&self, event: &WarmingEvent) -> (WarmOutcome, Option<FanOutReport>) {
        if !event.is_warming_ping {
            self.state.record_access();
            debug!("Not a warming event, passing through");
            return (WarmOutcome::Passthrough, None);
        }

        let now = Utc::now();
        let previous = self.state.record_access_at(now);

        let record = warming_record(&self.config.function.qualified(), event, &previous, now);
        if let Err(e) = self.log_sink.emit(&record) {
            warn!(error = %e, "Failed to emit warming log record");
        }

        let plan = self.planner.plan(event);

        if !plan.steps.is_empty() {
            let report = self.invoker.invoke_all(&plan, event).await;
            return (WarmOutcome::Handled, Some(report));
        }

        if let Some(delay) = plan.settle_delay {
            debug!(
                delay_ms = delay.as_millis() as u64,
                invocation_index = event.effective_index(),
                "Leaf warming ping, settling"
            );
            tokio::time::sleep(delay).await;
        }

        (WarmOutcome::Handled, None)
    }
}
