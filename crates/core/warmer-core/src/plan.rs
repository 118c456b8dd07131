//! Fan-out planning
//!
//! Decides what a warming ping does after it has been logged:
//!
//! ```text
//! warming ping
//!     │
//!     ├── C > 1          → invoke self for indices 2..=C
//!     │                    (index C blocking, the rest fire-and-forget)
//!     │
//!     ├── C == 1, I > 1  → leaf of another fan-out: settle delay
//!     │
//!     └── otherwise      → nothing
//! ```
//!
//! `C` is the requested concurrency and `I` the invocation index. Requested
//! concurrency is checked first, so a leaf that itself asks for concurrency
//! fans out again instead of settling.
//!
//! `C` is capped by the planner's maximum concurrency. A ping asking for more
//! is clamped to the cap, never expanded into an unbounded batch.

use crate::event::WarmingEvent;
use crate::types::InvocationMode;
use std::time::Duration;
use tracing::warn;

/// Settle delay applied by leaf pings unless configured otherwise
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 125;

/// Largest batch a single ping may request unless configured otherwise
pub const DEFAULT_MAX_CONCURRENCY: u32 = 100;

/// A single descendant invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanOutStep {
    /// Index carried by the descendant event
    pub invocation_index: u32,
    pub mode: InvocationMode,
}

/// What a warming invocation should do before returning
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanOutPlan {
    /// Batch size carried by descendant events
    pub total: u32,

    /// Descendant invocations, in dispatch order
    pub steps: Vec<FanOutStep>,

    /// Sleep to apply when there is nothing to invoke
    pub settle_delay: Option<Duration>,
}

impl FanOutPlan {
    /// Plan that does nothing
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty() && self.settle_delay.is_none()
    }

    /// The step whose completion is awaited, if any
    pub fn blocking_step(&self) -> Option<&FanOutStep> {
        self.steps.iter().find(|step| step.mode.is_blocking())
    }

    /// Derive the event sent to the descendant for `step`
    ///
    /// The descendant requests no concurrency of its own, so it settles
    /// instead of fanning out again.
    pub fn descendant_event(&self, step: &FanOutStep, base: &WarmingEvent) -> WarmingEvent {
        WarmingEvent {
            is_warming_ping: true,
            requested_concurrency: 1,
            invocation_index: step.invocation_index,
            total_invocations: self.total,
            correlation_id: base.correlation_id.clone(),
        }
    }
}

/// Computes fan-out plans
#[derive(Debug, Clone)]
pub struct FanOutPlanner {
    settle_delay: Duration,
    max_concurrency: u32,
}

impl FanOutPlanner {
    /// Create a planner with the default settle delay and concurrency cap
    pub fn new() -> Self {
        Self::with_settle_delay(Duration::from_millis(DEFAULT_SETTLE_DELAY_MS))
    }

    /// Create a planner with a custom settle delay
    pub fn with_settle_delay(settle_delay: Duration) -> Self {
        Self {
            settle_delay,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Set the concurrency cap (at least 1)
    pub fn with_max_concurrency(mut self, max_concurrency: u32) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    pub fn max_concurrency(&self) -> u32 {
        self.max_concurrency
    }

    /// Plan the fan-out for a classified event
    pub fn plan(&self, event: &WarmingEvent) -> FanOutPlan {
        if !event.is_warming_ping {
            return FanOutPlan::empty();
        }

        let requested = event.effective_concurrency();
        let concurrency = requested.min(self.max_concurrency);
        let index = event.effective_index();

        if concurrency < requested {
            warn!(
                requested,
                max_concurrency = self.max_concurrency,
                correlation_id = event.correlation_id.as_deref().unwrap_or(""),
                "Requested concurrency exceeds cap, clamping"
            );
        }

        if concurrency > 1 {
            let steps = (2..=concurrency)
                .map(|invocation_index| FanOutStep {
                    invocation_index,
                    mode: if invocation_index == concurrency {
                        InvocationMode::Blocking
                    } else {
                        InvocationMode::FireAndForget
                    },
                })
                .collect();

            FanOutPlan {
                total: concurrency,
                steps,
                settle_delay: None,
            }
        } else if index > 1 {
            FanOutPlan {
                total: event.effective_total(),
                steps: Vec::new(),
                settle_delay: Some(self.settle_delay),
            }
        } else {
            FanOutPlan {
                total: event.effective_total(),
                ..FanOutPlan::empty()
            }
        }
    }
}

impl Default for FanOutPlanner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::classify;
    use serde_json::json;

    #[test]
    fn test_default_settle_delay() {
        let planner = FanOutPlanner::new();
        assert_eq!(planner.settle_delay().as_millis(), 125);
    }

    #[test]
    fn test_ordinary_traffic_plans_nothing() {
        let planner = FanOutPlanner::new();
        let plan = planner.plan(&classify(&json!({ "concurrency": 5 })));
        assert!(plan.is_empty());
    }

    #[test]
    fn test_single_ping_plans_nothing() {
        let planner = FanOutPlanner::new();
        let plan = planner.plan(&classify(&json!({ "warmer": true, "concurrency": 1 })));
        assert!(plan.is_empty());
        assert_eq!(plan.total, 1);
    }

    #[test]
    fn test_fan_out_indices_and_modes() {
        let planner = FanOutPlanner::new();
        let plan = planner.plan(&classify(&json!({ "warmer": true, "concurrency": 4 })));

        assert_eq!(plan.total, 4);
        assert_eq!(plan.settle_delay, None);
        assert_eq!(
            plan.steps,
            vec![
                FanOutStep {
                    invocation_index: 2,
                    mode: InvocationMode::FireAndForget,
                },
                FanOutStep {
                    invocation_index: 3,
                    mode: InvocationMode::FireAndForget,
                },
                FanOutStep {
                    invocation_index: 4,
                    mode: InvocationMode::Blocking,
                },
            ]
        );
        assert_eq!(plan.blocking_step().map(|s| s.invocation_index), Some(4));
    }

    #[test]
    fn test_two_instances_is_one_blocking_call() {
        let planner = FanOutPlanner::new();
        let plan = planner.plan(&WarmingEvent::warming(2));
        assert_eq!(
            plan.steps,
            vec![FanOutStep {
                invocation_index: 2,
                mode: InvocationMode::Blocking,
            }]
        );
    }

    #[test]
    fn test_default_max_concurrency() {
        assert_eq!(FanOutPlanner::new().max_concurrency(), DEFAULT_MAX_CONCURRENCY);
        assert_eq!(FanOutPlanner::new().with_max_concurrency(0).max_concurrency(), 1);
    }

    #[test]
    fn test_huge_concurrency_is_clamped() {
        let planner = FanOutPlanner::new();
        let plan = planner.plan(&classify(&json!({
            "warmer": true,
            "concurrency": u32::MAX
        })));

        assert_eq!(plan.total, DEFAULT_MAX_CONCURRENCY);
        assert_eq!(plan.steps.len(), DEFAULT_MAX_CONCURRENCY as usize - 1);
        assert_eq!(
            plan.blocking_step().map(|s| s.invocation_index),
            Some(DEFAULT_MAX_CONCURRENCY)
        );
    }

    #[test]
    fn test_custom_cap_clamps_batch() {
        let planner = FanOutPlanner::new().with_max_concurrency(5);
        let plan = planner.plan(&WarmingEvent::warming(50));

        let indices: Vec<u32> = plan.steps.iter().map(|s| s.invocation_index).collect();
        assert_eq!(indices, vec![2, 3, 4, 5]);
        assert_eq!(plan.total, 5);
        assert_eq!(plan.blocking_step().map(|s| s.invocation_index), Some(5));
    }

    #[test]
    fn test_cap_of_one_disables_fan_out() {
        let planner = FanOutPlanner::new().with_max_concurrency(1);
        let plan = planner.plan(&WarmingEvent::warming(3));
        assert!(plan.is_empty());
    }

    #[test]
    fn test_leaf_settles() {
        let planner = FanOutPlanner::with_settle_delay(Duration::from_millis(75));
        let plan = planner.plan(&classify(&json!({
            "warmer": true,
            "warmerInvocation": 2,
            "warmerConcurrency": 3
        })));

        assert!(plan.steps.is_empty());
        assert_eq!(plan.settle_delay, Some(Duration::from_millis(75)));
        assert_eq!(plan.total, 3);
    }

    #[test]
    fn test_concurrency_takes_priority_over_index() {
        let planner = FanOutPlanner::new();
        let plan = planner.plan(&classify(&json!({
            "warmer": true,
            "concurrency": 2,
            "warmerInvocation": 3,
            "warmerConcurrency": 5
        })));

        assert_eq!(plan.settle_delay, None);
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.total, 2);
    }

    #[test]
    fn test_descendant_event() {
        let planner = FanOutPlanner::new();
        let base = WarmingEvent::warming(3).with_correlation_id("batch-7");
        let plan = planner.plan(&base);

        let descendants: Vec<_> = plan
            .steps
            .iter()
            .map(|step| plan.descendant_event(step, &base))
            .collect();

        for (step, event) in plan.steps.iter().zip(&descendants) {
            assert!(event.is_warming_ping);
            assert_eq!(event.requested_concurrency, 1);
            assert_eq!(event.invocation_index, step.invocation_index);
            assert_eq!(event.total_invocations, 3);
            assert!(event.invocation_index <= event.total_invocations);
            assert_eq!(event.correlation_id.as_deref(), Some("batch-7"));
        }
    }

    #[test]
    fn test_descendant_settles_when_received() {
        let planner = FanOutPlanner::new();
        let base = WarmingEvent::warming(3);
        let plan = planner.plan(&base);
        let descendant = plan.descendant_event(&plan.steps[0], &base);

        let received = WarmingEvent::from_slice(&descendant.to_vec().unwrap());
        let leaf_plan = planner.plan(&received);

        assert!(leaf_plan.steps.is_empty());
        assert!(leaf_plan.settle_delay.is_some());
    }
}
