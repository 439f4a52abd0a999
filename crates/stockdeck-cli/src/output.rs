//! Rendering of command results to a writer (stdout in production).

use std::io::Write;

use serde::Serialize;
use stockdeck_core::{
    CorporateAction, Envelope, EnvelopeError, EnvelopeMeta, NewsItem, PricePoint, ReportData,
    StatementKind, StatementTable,
};

use crate::commands::ExportSummary;
use crate::error::CliError;

/// Price rows shown in the table view.
pub const TAIL_ROWS: usize = 5;

pub fn write_json<T: Serialize>(
    out: &mut impl Write,
    value: &T,
    pretty: bool,
) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(&mut *out, value)?;
    } else {
        serde_json::to_writer(&mut *out, value)?;
    }
    writeln!(out)?;
    Ok(())
}

pub fn write_report_table(
    out: &mut impl Write,
    envelope: &Envelope<ReportData>,
) -> Result<(), CliError> {
    let data = &envelope.data;
    writeln!(out, "symbol      : {}", data.symbol)?;
    writeln!(out, "range       : {} .. {}", data.start, data.end)?;
    writeln!(out, "ma_window   : {}", data.ma_window)?;
    write_meta(out, &envelope.meta)?;

    writeln!(out)?;
    match &data.prices {
        Some(points) => write_price_tail(out, points)?,
        None => writeln!(out, "prices: unavailable")?,
    }

    writeln!(out)?;
    write_actions(out, "dividends", data.dividends.as_deref())?;
    write_actions(out, "splits", data.splits.as_deref())?;

    let statements = [
        (StatementKind::BalanceSheet, &data.statements.balance_sheet),
        (StatementKind::IncomeStatement, &data.statements.income_statement),
        (StatementKind::CashFlow, &data.statements.cash_flow),
    ];
    for (kind, table) in statements {
        writeln!(out)?;
        write_statement(out, kind, table.as_ref())?;
    }

    writeln!(out)?;
    write_news(out, data.news.as_deref())?;
    write_errors(out, &envelope.errors)
}

pub fn write_export_table(
    out: &mut impl Write,
    envelope: &Envelope<ExportSummary>,
) -> Result<(), CliError> {
    let summary = &envelope.data;
    writeln!(out, "symbol      : {}", summary.symbol)?;
    write_meta(out, &envelope.meta)?;

    writeln!(out)?;
    if summary.files.is_empty() {
        writeln!(out, "no files written to {}", summary.out_dir)?;
    } else {
        writeln!(out, "files written to {}:", summary.out_dir)?;
        for file in &summary.files {
            writeln!(out, "  - {file}")?;
        }
    }
    write_errors(out, &envelope.errors)
}

fn write_meta(out: &mut impl Write, meta: &EnvelopeMeta) -> Result<(), CliError> {
    writeln!(out, "request_id  : {}", meta.request_id)?;
    writeln!(out, "generated_at: {}", meta.generated_at)?;
    writeln!(
        out,
        "sources     : {}",
        meta.source_chain
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    )?;
    writeln!(out, "latency_ms  : {}", meta.latency_ms)?;
    Ok(())
}

fn write_price_tail(out: &mut impl Write, points: &[PricePoint]) -> Result<(), CliError> {
    let tail = &points[points.len().saturating_sub(TAIL_ROWS)..];
    writeln!(out, "prices (last {} of {}):", tail.len(), points.len())?;
    writeln!(
        out,
        "  {:<10} {:>10} {:>10} {:>10} {:>10} {:>12} {:>10} {:>9}",
        "Date", "Open", "High", "Low", "Close", "Volume", "MA", "% Change"
    )?;

    for point in tail {
        let bar = &point.bar;
        let moving_average = point
            .derived
            .moving_average
            .map(|ma| format!("{ma:.2}"))
            .unwrap_or_else(|| String::from("-"));
        writeln!(
            out,
            "  {:<10} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>12} {:>10} {:>9.2}",
            bar.date.to_string(),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            bar.volume,
            moving_average,
            point.derived.pct_change
        )?;
    }
    Ok(())
}

fn write_actions(
    out: &mut impl Write,
    label: &str,
    actions: Option<&[CorporateAction]>,
) -> Result<(), CliError> {
    match actions {
        None => writeln!(out, "{label}: unavailable")?,
        Some([]) => writeln!(out, "{label}: none in range")?,
        Some(actions) => {
            writeln!(out, "{label}:")?;
            for action in actions {
                writeln!(out, "  {}  {}", action.date, action.value)?;
            }
        }
    }
    Ok(())
}

fn write_statement(
    out: &mut impl Write,
    kind: StatementKind,
    table: Option<&StatementTable>,
) -> Result<(), CliError> {
    let Some(table) = table else {
        writeln!(out, "{}: unavailable", kind.title())?;
        return Ok(());
    };

    writeln!(out, "{}:", kind.title())?;
    let width = table
        .lines
        .iter()
        .map(|line| line.metric.len())
        .max()
        .unwrap_or(0)
        .max("metric".len());

    write!(out, "  {:<width$}", "metric")?;
    for period in &table.periods {
        write!(out, " {period:>14}")?;
    }
    writeln!(out)?;

    for line in &table.lines {
        write!(out, "  {:<width$}", line.metric)?;
        for period in &table.periods {
            let cell = line
                .values
                .get(period)
                .map(|value| value.to_label())
                .filter(|label| !label.is_empty())
                .unwrap_or_else(|| String::from("-"));
            write!(out, " {cell:>14}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_news(out: &mut impl Write, news: Option<&[NewsItem]>) -> Result<(), CliError> {
    let Some(items) = news else {
        writeln!(out, "news: unavailable")?;
        return Ok(());
    };

    if items.is_empty() {
        writeln!(out, "news: no articles found")?;
        return Ok(());
    }

    writeln!(out, "news:")?;
    for item in items {
        writeln!(out, "  - {}  {}", item.published_at, item.title)?;
        writeln!(out, "    {} | {}", item.source_name, item.sentiment)?;
        writeln!(out, "    {}", item.summary)?;
        if let Some(url) = &item.article_url {
            writeln!(out, "    {url}")?;
        }
    }
    Ok(())
}

fn write_errors(out: &mut impl Write, errors: &[EnvelopeError]) -> Result<(), CliError> {
    if errors.is_empty() {
        return Ok(());
    }

    writeln!(out)?;
    writeln!(out, "errors:")?;
    for error in errors {
        writeln!(out, "  - {} [{}]: {}", error.section, error.code, error.message)?;
    }
    Ok(())
}
