//! # Lambda Warmer
//!
//! Self-warming coordinator for AWS Lambda functions.
//!
//! ## Architecture
//!
//! ```text
//! Scheduled rule                 Function instance (this crate)
//! {"warmer":true,          ───→  Warmer::handle
//!  "concurrency":3}              ├── classify event
//!                                ├── record warm state
//!                                ├── emit log record
//!                                ├── plan fan-out
//!                                └── invoke self ──→ index 2 (Event)
//!                                                └─→ index 3 (RequestResponse, awaited)
//! ```
//!
//! Each descendant lands on a separate instance because its siblings are busy,
//! so a ping with `concurrency: N` leaves `N` warm instances behind. Descendants
//! do not fan out again; they sleep a short settle delay instead so the
//! platform cannot collapse them onto one instance.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lambda_warmer::{InvocationOptions, LambdaInvoker, Warmer, WarmerConfig};
//! use std::sync::Arc;
//!
//! // Once per process
//! let config = WarmerConfig::from_env()?;
//! let invoker = LambdaInvoker::from_env(config.region.clone()).await;
//! let warmer = Warmer::new(config, Arc::new(invoker));
//!
//! // Once per invocation
//! if warmer.handle(&event, InvocationOptions::default()).await.is_warming() {
//!     return Ok(json!({ "warmed": true }));
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod handler;
pub mod invoker;
pub mod lambda;
pub mod log;

// Coordinator
pub use handler::{WarmOutcome, Warmer};

// Configuration
pub use config::{InvocationOptions, WarmerConfig};

// Fan-out
pub use invoker::{FanOutReport, SelfInvoker};

// Transports
pub use lambda::{DryRunInvoker, LambdaInvoker, create_lambda_client};

// Logging
pub use log::TracingLogSink;

// Core protocol types
pub use warmer_core::{
    FanOutPlan, FanOutPlanner, FunctionIdentity, InvocationMode, Invoker, LogRecord, LogSink,
    WarmState, WarmerError, WarmingEvent, classify,
};
