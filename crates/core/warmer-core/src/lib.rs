//! Warmer Core - Shared types and traits
//!
//! This crate defines the warming protocol used by the coordinator:
//! - Warming event classification (event.rs)
//! - Warm-state tracking (state.rs)
//! - Fan-out planning (plan.rs)
//! - Invoker and LogSink traits (traits.rs)
//! - Error types

pub mod error;
pub mod event;
pub mod plan;
pub mod state;
pub mod traits;
pub mod types;

pub use error::*;
pub use event::{WarmingEvent, classify};
pub use plan::{
    DEFAULT_MAX_CONCURRENCY, DEFAULT_SETTLE_DELAY_MS, FanOutPlan, FanOutPlanner, FanOutStep,
};
pub use state::{AccessSnapshot, InstanceState, WarmState};
pub use traits::*;
pub use types::*;
