//! Self-invocation fan-out
//!
//! Issues the descendant invocations of a [`FanOutPlan`] against this same
//! function and version.
//!
//! ```text
//! originating ping (index 1)
//!     │
//!     ├── spawn  index 2      (fire-and-forget, detached)
//!     ├── spawn  index 3      (fire-and-forget, detached)
//!     │   ...
//!     └── await  index C      (blocking)
//! ```
//!
//! Fan-out is best-effort. A descendant that fails to serialize or to invoke
//! is logged and skipped; siblings still go out and the invocation as a whole
//! still succeeds. Detached tasks log their own failures since nothing joins
//! them.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use warmer_core::{FanOutPlan, FunctionIdentity, InvocationMode, Invoker, WarmingEvent};

/// Summary of a fan-out
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FanOutReport {
    /// Descendants handed to the transport
    pub dispatched: usize,

    /// Index of the descendant awaited in blocking mode
    pub awaited_index: Option<u32>,

    /// Whether the awaited descendant succeeded
    pub awaited_ok: bool,

    /// Indices skipped because their event could not be serialized
    pub skipped: Vec<u32>,
}

/// Invokes this function on behalf of a warming ping
#[derive(Clone)]
pub struct SelfInvoker {
    invoker: Arc<dyn Invoker>,
    target: FunctionIdentity,
}

impl SelfInvoker {
    /// Create a self-invoker addressing `target`
    pub fn new(invoker: Arc<dyn Invoker>, target: FunctionIdentity) -> Self {
        Self { invoker, target }
    }

    /// Function descendants are addressed to
    pub fn target(&self) -> &FunctionIdentity {
        &self.target
    }

    /// Dispatch every step of `plan`, awaiting only the blocking one
    pub async fn invoke_all(&self, plan: &FanOutPlan, base: &WarmingEvent) -> FanOutReport {
        let mut report = FanOutReport::default();
        let mut blocking = None;

        for step in &plan.steps {
            let event = plan.descendant_event(step, base);
            let payload = match event.to_vec() {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(
                        invocation_index = step.invocation_index,
                        error = %e,
                        "Failed to serialize warming event, skipping descendant"
                    );
                    report.skipped.push(step.invocation_index);
                    continue;
                }
            };

            match step.mode {
                InvocationMode::FireAndForget => {
                    self.spawn_detached(step.invocation_index, payload);
                    report.dispatched += 1;
                }
                InvocationMode::Blocking => blocking = Some((step.invocation_index, payload)),
            }
        }

        if let Some((index, payload)) = blocking {
            report.dispatched += 1;
            report.awaited_index = Some(index);

            debug!(
                invocation_index = index,
                target = %self.target,
                "Awaiting blocking warming invocation"
            );

            match self
                .invoker
                .invoke(&self.target, payload, InvocationMode::Blocking)
                .await
            {
                Ok(response) => {
                    debug!(
                        invocation_index = index,
                        status_code = response.status_code,
                        "Blocking warming invocation completed"
                    );
                    report.awaited_ok = true;
                }
                Err(e) => {
                    warn!(
                        invocation_index = index,
                        target = %self.target,
                        error = %e,
                        "Blocking warming invocation failed"
                    );
                }
            }
        }

        info!(
            target = %self.target,
            total = plan.total,
            dispatched = report.dispatched,
            awaited_ok = report.awaited_ok,
            "Fan-out complete"
        );

        report
    }

    fn spawn_detached(&self, index: u32, payload: Vec<u8>) {
        let invoker = Arc::clone(&self.invoker);
        let target = self.target.clone();

        debug!(
            invocation_index = index,
            target = %target,
            "Dispatching fire-and-forget warming invocation"
        );

        tokio::spawn(async move {
            match invoker
                .invoke(&target, payload, InvocationMode::FireAndForget)
                .await
            {
                Ok(response) => debug!(
                    invocation_index = index,
                    status_code = response.status_code,
                    "Fire-and-forget warming invocation accepted"
                ),
                Err(e) => warn!(
                    invocation_index = index,
                    target = %target,
                    error = %e,
                    "Fire-and-forget warming invocation failed"
                ),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;
    use warmer_core::{FanOutPlanner, InvokeResponse, Result, WarmerError};

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(WarmingEvent, InvocationMode)>>,
        fail_index: Option<u32>,
    }

    #[async_trait]
    impl Invoker for Recorder {
        async fn invoke(
            &self,
            _target: &FunctionIdentity,
            payload: Vec<u8>,
            mode: InvocationMode,
        ) -> Result<InvokeResponse> {
            let event = WarmingEvent::from_slice(&payload);
            let fail = self.fail_index == Some(event.invocation_index);
            self.calls.lock().unwrap().push((event, mode));
            if fail {
                return Err(WarmerError::invoke("simulated outage"));
            }
            Ok(InvokeResponse { status_code: 200 })
        }
    }

    async fn settle(recorder: &Recorder, expected: usize) {
        for _ in 0..100 {
            if recorder.calls.lock().unwrap().len() >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn test_invoke_all_dispatches_every_step() {
        let recorder = Arc::new(Recorder::default());
        let invoker = SelfInvoker::new(recorder.clone(), FunctionIdentity::new("orders", "7"));
        let base = WarmingEvent::warming(4).with_correlation_id("batch-9");
        let plan = FanOutPlanner::new().plan(&base);

        let report = invoker.invoke_all(&plan, &base).await;
        settle(&recorder, 3).await;

        assert_eq!(report.dispatched, 3);
        assert_eq!(report.awaited_index, Some(4));
        assert!(report.awaited_ok);
        assert!(report.skipped.is_empty());

        let mut calls = recorder.calls.lock().unwrap().clone();
        calls.sort_by_key(|(event, _)| event.invocation_index);
        let indices: Vec<u32> = calls.iter().map(|(e, _)| e.invocation_index).collect();
        assert_eq!(indices, vec![2, 3, 4]);
        for (event, mode) in &calls {
            assert_eq!(mode.is_blocking(), event.invocation_index == 4);
            assert_eq!(event.correlation_id.as_deref(), Some("batch-9"));
        }
    }

    #[tokio::test]
    async fn test_blocking_failure_is_contained() {
        let recorder = Arc::new(Recorder {
            fail_index: Some(3),
            ..Default::default()
        });
        let invoker = SelfInvoker::new(recorder.clone(), FunctionIdentity::new("orders", "7"));
        let base = WarmingEvent::warming(3);
        let plan = FanOutPlanner::new().plan(&base);

        let report = invoker.invoke_all(&plan, &base).await;
        settle(&recorder, 2).await;

        assert_eq!(report.dispatched, 2);
        assert_eq!(report.awaited_index, Some(3));
        assert!(!report.awaited_ok);
        assert_eq!(recorder.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_plan_dispatches_nothing() {
        let recorder = Arc::new(Recorder::default());
        let invoker = SelfInvoker::new(recorder.clone(), FunctionIdentity::new("orders", "7"));
        let base = WarmingEvent::warming(1);

        let report = invoker.invoke_all(&FanOutPlan::empty(), &base).await;

        assert_eq!(report, FanOutReport::default());
        assert!(recorder.calls.lock().unwrap().is_empty());
    }
}
