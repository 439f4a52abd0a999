use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use time::Date;

use crate::ValidationError;

/// One trading day of OHLCV data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: Date,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PriceBar {
    pub fn new(
        date: Date,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
    ) -> Result<Self, ValidationError> {
        validate_price("open", open)?;
        validate_price("high", high)?;
        validate_price("low", low)?;
        validate_price("close", close)?;

        if high < low {
            return Err(ValidationError::InvalidBarRange);
        }

        Ok(Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

/// Analytic columns computed from the close series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedSeries {
    /// Trailing mean of the last `ma_window` closes; absent until enough bars were seen.
    pub moving_average: Option<f64>,
    /// Close-to-close change in percent, rounded to 2 decimals.
    pub pct_change: f64,
}

/// A price bar together with its derived columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    #[serde(flatten)]
    pub bar: PriceBar,
    #[serde(flatten)]
    pub derived: DerivedSeries,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorporateActionKind {
    Dividend,
    Split,
}

impl CorporateActionKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dividend => "dividend",
            Self::Split => "split",
        }
    }
}

impl Display for CorporateActionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dividend payment or a stock split on a timezone-naive date.
///
/// For dividends `value` is the cash amount per share, for splits it is the
/// share ratio (`4.0` for a 4:1 split).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorporateAction {
    pub date: Date,
    pub value: f64,
}

impl CorporateAction {
    pub fn new(date: Date, value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteValue { field: "value" });
        }
        Ok(Self { date, value })
    }
}

/// Dividend and split histories restricted to a request's date range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorporateActions {
    pub dividends: Vec<CorporateAction>,
    pub splits: Vec<CorporateAction>,
}

impl CorporateActions {
    /// Keep only events dated within `start..=end`, ordered by date.
    pub fn within(
        dividends: Vec<CorporateAction>,
        splits: Vec<CorporateAction>,
        start: Date,
        end: Date,
    ) -> Self {
        Self {
            dividends: filter_to_range(dividends, start, end),
            splits: filter_to_range(splits, start, end),
        }
    }
}

/// Retain actions dated within `start..=end` and sort them ascending.
pub fn filter_to_range(
    actions: Vec<CorporateAction>,
    start: Date,
    end: Date,
) -> Vec<CorporateAction> {
    let mut kept = actions
        .into_iter()
        .filter(|action| start <= action.date && action.date <= end)
        .collect::<Vec<_>>();
    kept.sort_by_key(|action| action.date);
    kept
}

/// Placeholder rendered for any news field the provider left out.
pub const NOT_AVAILABLE: &str = "N/A";

/// Normalized news article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub published_at: String,
    pub title: String,
    pub summary: String,
    pub sentiment: String,
    pub source_name: String,
    pub image_url: Option<String>,
    pub article_url: Option<String>,
}

fn validate_price(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}
