use std::collections::{BTreeMap, HashSet};

use crate::{
    RawStatement, SectionError, StatementFailure, StatementKind, StatementLine, StatementTable,
};

/// Number of header rows leading every transposed statement: period labels
/// followed by provider metadata.
pub const HEADER_ROWS: usize = 2;

/// Turn a transposed statement into a `metric -> period -> value` table.
///
/// Row 0 names the periods, row 1 is dropped, and every following row becomes
/// one metric line keyed by its label. Periods and metrics keep provider order.
///
/// # Errors
///
/// [`SectionError::StatementUnavailable`] when the header rows are missing,
/// no period or metric is present, a period label is blank or repeated, a
/// metric label repeats, or a row does not span every period.
pub fn reshape(kind: StatementKind, raw: RawStatement) -> Result<StatementTable, SectionError> {
    if raw.rows.len() < HEADER_ROWS {
        return Err(SectionError::statement_schema(
            kind,
            format!(
                "expected {HEADER_ROWS} header rows, found {}",
                raw.rows.len()
            ),
        ));
    }

    let mut rows = raw.rows.into_iter();
    let periods = rows
        .next()
        .map(|row| row.values.iter().map(|value| value.to_label()).collect::<Vec<_>>())
        .unwrap_or_default();
    let _metadata = rows.next();

    if periods.is_empty() {
        return Err(empty(kind, "statement reports no periods"));
    }
    let mut seen_periods = HashSet::with_capacity(periods.len());
    for period in &periods {
        if period.trim().is_empty() {
            return Err(SectionError::statement_schema(kind, "blank period label"));
        }
        if !seen_periods.insert(period.as_str()) {
            return Err(SectionError::statement_schema(
                kind,
                format!("period '{period}' appears more than once"),
            ));
        }
    }

    let mut seen_metrics = HashSet::new();
    let mut lines = Vec::new();
    for row in rows {
        if row.values.len() != periods.len() {
            return Err(SectionError::statement_schema(
                kind,
                format!(
                    "metric '{}' has {} values for {} periods",
                    row.label,
                    row.values.len(),
                    periods.len()
                ),
            ));
        }
        if !seen_metrics.insert(row.label.clone()) {
            return Err(SectionError::statement_schema(
                kind,
                format!("metric '{}' appears more than once", row.label),
            ));
        }

        let values = periods
            .iter()
            .cloned()
            .zip(row.values)
            .collect::<BTreeMap<_, _>>();
        lines.push(StatementLine {
            metric: row.label,
            values,
        });
    }

    if lines.is_empty() {
        return Err(empty(kind, "statement has no metric rows"));
    }

    Ok(StatementTable {
        kind,
        periods,
        lines,
    })
}

fn empty(kind: StatementKind, message: &str) -> SectionError {
    SectionError::StatementUnavailable {
        kind,
        reason: StatementFailure::Empty,
        message: message.to_owned(),
    }
}
