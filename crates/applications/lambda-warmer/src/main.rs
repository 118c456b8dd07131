//! Lambda Warmer CLI
//!
//! ## Usage
//!
//! ```bash
//! # Run the coordinator once on a payload (function identity from the environment)
//! AWS_LAMBDA_FUNCTION_NAME=orders lambda-warmer handle --event '{"warmer":true,"concurrency":3}'
//!
//! # Same, without touching AWS
//! lambda-warmer handle --function orders:7 --event-file ping.json --dry-run
//!
//! # Send an originating ping, as a scheduled rule would
//! lambda-warmer ping --function orders:7 --concurrency 5
//! ```
//!
//! Settings resolve flag first, then environment, then default. Logs go to
//! stderr; stdout carries only the JSON result.

use clap::{Parser, Subcommand, ValueEnum};
use lambda_warmer::{
    DryRunInvoker, FunctionIdentity, InvocationMode, InvocationOptions, Invoker, LambdaInvoker,
    Warmer, WarmerConfig, WarmingEvent,
};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Lambda Warmer: keep-warm fan-out for AWS Lambda functions
#[derive(Parser)]
#[command(name = "lambda-warmer")]
#[command(about = "Self-warming coordinator for AWS Lambda functions", long_about = None)]
struct Cli {
    /// AWS region (default: SDK default chain)
    #[arg(long, global = true, env = "AWS_REGION")]
    region: Option<String>,

    /// Settle delay for leaf pings in milliseconds, nonzero (default: 125)
    #[arg(long, global = true, env = "WARMER_DELAY_MS")]
    delay_ms: Option<u64>,

    /// Largest batch a ping may request (default: 100)
    #[arg(long, global = true, env = "WARMER_MAX_CONCURRENCY")]
    max_concurrency: Option<u32>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the coordinator once on an invocation payload
    Handle {
        /// Payload as inline JSON
        #[arg(long, conflicts_with = "event_file", required_unless_present = "event_file")]
        event: Option<String>,

        /// Payload read from a file
        #[arg(long)]
        event_file: Option<PathBuf>,

        /// Function to fan out to, NAME[:VERSION] (default: AWS_LAMBDA_FUNCTION_NAME/VERSION)
        #[arg(long)]
        function: Option<String>,

        /// Correlation id for the batch (overrides the payload's)
        #[arg(long)]
        correlation_id: Option<String>,

        /// Log invocations instead of sending them
        #[arg(long)]
        dry_run: bool,
    },

    /// Send an originating warming ping to a function
    Ping {
        /// Target function, NAME[:VERSION]
        #[arg(long)]
        function: String,

        /// Number of warm instances to request
        #[arg(long, default_value = "1")]
        concurrency: u32,

        /// Correlation id for the batch (default: random UUID)
        #[arg(long)]
        correlation_id: Option<String>,

        /// Log the ping instead of sending it
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn init_logging(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "lambda_warmer=info,warmer_core=info,info".into());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

async fn create_invoker(dry_run: bool, region: Option<String>) -> Arc<dyn Invoker> {
    if dry_run {
        info!("Dry run: invocations will be logged, not sent");
        Arc::new(DryRunInvoker)
    } else {
        Arc::new(LambdaInvoker::from_env(region).await)
    }
}

async fn read_event(event: Option<String>, event_file: Option<PathBuf>) -> anyhow::Result<Value> {
    let text = match (event, event_file) {
        (Some(inline), _) => inline,
        (None, Some(path)) => tokio::fs::read_to_string(&path).await?,
        (None, None) => anyhow::bail!("either --event or --event-file is required"),
    };

    Ok(serde_json::from_str(&text).unwrap_or_else(|e| {
        warn!(error = %e, "Payload is not valid JSON, treating as ordinary traffic");
        Value::Null
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_format);

    match cli.command {
        Commands::Handle {
            event,
            event_file,
            function,
            correlation_id,
            dry_run,
        } => {
            let mut config = match function {
                Some(function) => WarmerConfig::from_env_for(FunctionIdentity::parse(&function))?,
                None => WarmerConfig::from_env()?,
            };
            if let Some(region) = cli.region {
                config = config.with_region(region);
            }
            if let Some(delay_ms) = cli.delay_ms {
                config = config.with_settle_delay(Duration::from_millis(delay_ms));
            }
            if let Some(max_concurrency) = cli.max_concurrency {
                config = config.with_max_concurrency(max_concurrency);
            }
            config.validate()?;

            info!(
                function = %config.function,
                settle_delay_ms = config.settle_delay.as_millis() as u64,
                max_concurrency = config.max_concurrency,
                "Lambda warmer starting"
            );

            let raw = read_event(event, event_file).await?;
            let invoker = create_invoker(dry_run, config.region.clone()).await;
            let warmer = Warmer::new(config, invoker);

            let options = InvocationOptions { correlation_id };
            let outcome = warmer.handle(&raw, options).await;

            println!(
                "{}",
                serde_json::to_string(&json!({
                    "outcome": outcome,
                    "warm": warmer.state().is_warm(),
                }))?
            );
        }

        Commands::Ping {
            function,
            concurrency,
            correlation_id,
            dry_run,
        } => {
            let target = FunctionIdentity::parse(&function);
            let correlation_id = correlation_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            let event =
                WarmingEvent::warming(concurrency).with_correlation_id(correlation_id.clone());

            info!(
                function = %target,
                concurrency = event.requested_concurrency,
                correlation_id = %correlation_id,
                "Sending warming ping"
            );

            let invoker = create_invoker(dry_run, cli.region).await;
            let response = invoker
                .invoke(&target, event.to_vec()?, InvocationMode::Blocking)
                .await?;

            println!(
                "{}",
                serde_json::to_string(&json!({
                    "function": target.qualified(),
                    "correlationId": correlation_id,
                    "statusCode": response.status_code,
                }))?
            );
        }
    }

    Ok(())
}
