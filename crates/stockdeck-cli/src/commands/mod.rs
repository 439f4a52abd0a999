mod export;
mod report;

pub use export::ExportSummary;

use std::time::Instant;

use stockdeck_core::{AggregationPipeline, AggregationResult, SectionError, TickerRequest};
use tracing::info;

use crate::cli::{Cli, Command, RequestArgs};
use crate::error::CliError;

/// What `main` needs to pick an exit code once output is written.
#[derive(Debug)]
pub struct CommandOutcome {
    pub fatal: Option<SectionError>,
    pub error_count: usize,
}

impl CommandOutcome {
    fn from_result(result: &AggregationResult) -> Self {
        Self {
            fatal: result.fatal_error().cloned(),
            error_count: result.errors().len(),
        }
    }
}

pub async fn run(cli: &Cli, pipeline: &AggregationPipeline) -> Result<CommandOutcome, CliError> {
    match &cli.command {
        Command::Report(args) => {
            let (result, latency_ms) = aggregate(args, pipeline).await?;
            report::run(&result, latency_ms, cli.format, cli.pretty)?;
            Ok(CommandOutcome::from_result(&result))
        }
        Command::Export(args) => {
            let (result, latency_ms) = aggregate(&args.request, pipeline).await?;
            export::run(&result, latency_ms, &args.out_dir, cli.format, cli.pretty)?;
            Ok(CommandOutcome::from_result(&result))
        }
    }
}

async fn aggregate(
    args: &RequestArgs,
    pipeline: &AggregationPipeline,
) -> Result<(AggregationResult, u64), CliError> {
    let request = TickerRequest::parse(&args.symbol, &args.start, &args.end, args.ma_window)?;

    let started = Instant::now();
    let result = pipeline.run(&request).await;
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    info!(
        symbol = %request.symbol(),
        latency_ms,
        failed_sections = result.errors().len(),
        "aggregation finished"
    );
    Ok((result, latency_ms))
}
