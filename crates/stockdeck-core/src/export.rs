//! CSV rendering of every table an [`AggregationResult`] can hold.
//!
//! | Table | Columns |
//! |-------|---------|
//! | prices | `Date,Open,High,Low,Close,Volume,MA,% Change` |
//! | dividends | `Date,Dividends` |
//! | splits | `Date,Stock Splits` |
//! | statements | `metric` then one column per period |

use std::fmt::{Display, Formatter};

use crate::pipeline::AggregationResult;
use crate::{
    CorporateAction, CorporateActionKind, ExportError, PricePoint, StatementKind, StatementTable,
    Symbol,
};

pub const PRICE_HEADERS: [&str; 8] = ["Date", "Open", "High", "Low", "Close", "Volume", "MA", "% Change"];

/// Every exportable table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportTable {
    Prices,
    Dividends,
    Splits,
    Statement(StatementKind),
}

impl ExportTable {
    /// File name suffix, e.g. `data` for `AAPL_data.csv`.
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Prices => "data",
            Self::Dividends => "dividends",
            Self::Splits => "splits",
            Self::Statement(kind) => kind.as_str(),
        }
    }

    pub fn file_name(self, symbol: &Symbol) -> String {
        format!("{symbol}_{}.csv", self.suffix())
    }
}

impl Display for ExportTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.suffix())
    }
}

/// One rendered CSV document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub table: ExportTable,
    pub file_name: String,
    pub contents: String,
}

/// Render every populated section of `result`; failed sections are left out.
pub fn export_result(result: &AggregationResult) -> Result<Vec<CsvExport>, ExportError> {
    let symbol = result.request.symbol();
    let mut exports = Vec::new();
    let mut push = |table: ExportTable, contents: String| {
        exports.push(CsvExport {
            table,
            file_name: table.file_name(symbol),
            contents,
        });
    };

    if let Ok(points) = &result.prices {
        push(ExportTable::Prices, prices_csv(points)?);
    }
    if let Ok(actions) = &result.actions {
        push(
            ExportTable::Dividends,
            actions_csv(&actions.dividends, CorporateActionKind::Dividend)?,
        );
        push(
            ExportTable::Splits,
            actions_csv(&actions.splits, CorporateActionKind::Split)?,
        );
    }
    for (kind, section) in result.statements.iter() {
        if let Ok(table) = section {
            push(ExportTable::Statement(kind), statement_csv(table)?);
        }
    }

    Ok(exports)
}

pub fn prices_csv(points: &[PricePoint]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(PRICE_HEADERS)?;

    for point in points {
        let bar = &point.bar;
        wtr.write_record([
            bar.date.to_string(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
            point
                .derived
                .moving_average
                .map(|ma| ma.to_string())
                .unwrap_or_default(),
            point.derived.pct_change.to_string(),
        ])?;
    }

    finish(wtr)
}

pub fn actions_csv(
    actions: &[CorporateAction],
    kind: CorporateActionKind,
) -> Result<String, ExportError> {
    let value_header = match kind {
        CorporateActionKind::Dividend => "Dividends",
        CorporateActionKind::Split => "Stock Splits",
    };

    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["Date", value_header])?;
    for action in actions {
        wtr.write_record([action.date.to_string(), action.value.to_string()])?;
    }

    finish(wtr)
}

pub fn statement_csv(table: &StatementTable) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = Vec::with_capacity(table.periods.len() + 1);
    header.push("metric");
    header.extend(table.periods.iter().map(String::as_str));
    wtr.write_record(&header)?;

    for line in &table.lines {
        let mut record = Vec::with_capacity(table.periods.len() + 1);
        record.push(line.metric.clone());
        record.extend(table.periods.iter().map(|period| {
            line.values
                .get(period)
                .map(|value| value.to_label())
                .unwrap_or_default()
        }));
        wtr.write_record(&record)?;
    }

    finish(wtr)
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let data = wtr
        .into_inner()
        .map_err(|e| ExportError::Flush(e.to_string()))?;
    Ok(String::from_utf8(data)?)
}
