//! Write the tables of an aggregation result to CSV files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use stockdeck_core::{
    export_result, AggregationResult, CsvExport, Envelope, EnvelopeError, EnvelopeMeta, Symbol,
};
use tracing::debug;

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub symbol: Symbol,
    pub out_dir: String,
    pub files: Vec<String>,
}

pub fn run(
    result: &AggregationResult,
    latency_ms: u64,
    out_dir: &Path,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    let written = if result.is_fatal() {
        Vec::new()
    } else {
        write_exports(out_dir, &export_result(result)?)?
    };

    let envelope = Envelope {
        meta: EnvelopeMeta::new(result.providers.clone(), latency_ms),
        data: ExportSummary {
            symbol: result.request.symbol().clone(),
            out_dir: out_dir.display().to_string(),
            files: written
                .iter()
                .map(|path| path.display().to_string())
                .collect(),
        },
        errors: result
            .errors()
            .into_iter()
            .map(|(section, error)| EnvelopeError::from_section(section, error))
            .collect(),
    };

    let mut stdout = io::stdout().lock();
    match format {
        OutputFormat::Json => output::write_json(&mut stdout, &envelope, pretty),
        OutputFormat::Table => output::write_export_table(&mut stdout, &envelope),
    }
}

/// Write every export into `out_dir`, creating it when missing.
pub fn write_exports(out_dir: &Path, exports: &[CsvExport]) -> Result<Vec<PathBuf>, CliError> {
    fs::create_dir_all(out_dir)?;

    exports
        .iter()
        .map(|export| -> Result<PathBuf, CliError> {
            let path = out_dir.join(&export.file_name);
            fs::write(&path, &export.contents)?;
            debug!(table = %export.table, path = %path.display(), "csv written");
            Ok(path)
        })
        .collect()
}
