use std::io;

use stockdeck_core::{AggregationResult, Envelope};

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::output;

pub fn run(
    result: &AggregationResult,
    latency_ms: u64,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    let envelope = Envelope::from_result(result, latency_ms);
    let mut stdout = io::stdout().lock();

    match format {
        OutputFormat::Json => output::write_json(&mut stdout, &envelope, pretty),
        OutputFormat::Table => output::write_report_table(&mut stdout, &envelope),
    }
}
