use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// The three annual statements fetched per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    BalanceSheet,
    IncomeStatement,
    CashFlow,
}

impl StatementKind {
    pub const ALL: [Self; 3] = [Self::BalanceSheet, Self::IncomeStatement, Self::CashFlow];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BalanceSheet => "balance_sheet",
            Self::IncomeStatement => "income_statement",
            Self::CashFlow => "cash_flow",
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::BalanceSheet => "Balance Sheet",
            Self::IncomeStatement => "Income Statement",
            Self::CashFlow => "Cash Flow Statement",
        }
    }
}

impl Display for StatementKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provider-native statement cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatementValue {
    Number(f64),
    Text(String),
    Missing,
}

impl StatementValue {
    /// Text used for period labels and CSV cells.
    pub fn to_label(&self) -> String {
        match self {
            Self::Number(value) => value.to_string(),
            Self::Text(text) => text.clone(),
            Self::Missing => String::new(),
        }
    }
}

/// A labelled row of a transposed statement payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub label: String,
    pub values: Vec<StatementValue>,
}

impl RawRow {
    pub fn new(label: impl Into<String>, values: Vec<StatementValue>) -> Self {
        Self {
            label: label.into(),
            values,
        }
    }
}

/// Statement payload as metric rows by period columns.
///
/// Row 0 holds the period labels and row 1 provider metadata; both precede the
/// metric rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawStatement {
    pub rows: Vec<RawRow>,
}

/// One metric across every reported period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementLine {
    pub metric: String,
    pub values: BTreeMap<String, StatementValue>,
}

/// Canonical `metric -> period -> value` table for a single statement kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementTable {
    pub kind: StatementKind,
    /// Period labels in provider order.
    pub periods: Vec<String>,
    /// Metric lines in provider order.
    pub lines: Vec<StatementLine>,
}

impl StatementTable {
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn metric(&self, name: &str) -> Option<&BTreeMap<String, StatementValue>> {
        self.lines
            .iter()
            .find(|line| line.metric == name)
            .map(|line| &line.values)
    }

    pub fn get(&self, metric: &str, period: &str) -> Option<&StatementValue> {
        self.metric(metric)?.get(period)
    }
}
