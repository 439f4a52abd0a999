use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::Date;

use crate::{Symbol, ValidationError};

/// Smallest accepted moving-average window.
pub const MIN_MA_WINDOW: usize = 5;
/// Largest accepted moving-average window.
pub const MAX_MA_WINDOW: usize = 50;

/// Validated input of a single pipeline run.
///
/// The date range is inclusive at both ends. Deserialization goes through
/// [`TickerRequest::new`], so a decoded request is always valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RequestFields")]
pub struct TickerRequest {
    symbol: Symbol,
    start: Date,
    end: Date,
    ma_window: usize,
}

impl TickerRequest {
    pub fn new(
        symbol: Symbol,
        start: Date,
        end: Date,
        ma_window: usize,
    ) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::InvertedDateRange { start, end });
        }

        if !(MIN_MA_WINDOW..=MAX_MA_WINDOW).contains(&ma_window) {
            return Err(ValidationError::WindowOutOfRange {
                value: ma_window,
                min: MIN_MA_WINDOW,
                max: MAX_MA_WINDOW,
            });
        }

        Ok(Self {
            symbol,
            start,
            end,
            ma_window,
        })
    }

    /// Build a request straight from user-entered strings.
    pub fn parse(
        symbol: &str,
        start: &str,
        end: &str,
        ma_window: usize,
    ) -> Result<Self, ValidationError> {
        Self::new(
            Symbol::parse(symbol)?,
            parse_date(start)?,
            parse_date(end)?,
            ma_window,
        )
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub const fn start(&self) -> Date {
        self.start
    }

    pub const fn end(&self) -> Date {
        self.end
    }

    pub const fn ma_window(&self) -> usize {
        self.ma_window
    }

    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Deserialize)]
struct RequestFields {
    symbol: Symbol,
    start: Date,
    end: Date,
    ma_window: usize,
}

impl TryFrom<RequestFields> for TickerRequest {
    type Error = ValidationError;

    fn try_from(fields: RequestFields) -> Result<Self, Self::Error> {
        Self::new(fields.symbol, fields.start, fields.end, fields.ma_window)
    }
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(input: &str) -> Result<Date, ValidationError> {
    Date::parse(input.trim(), format_description!("[year]-[month]-[day]")).map_err(|_| {
        ValidationError::InvalidDate {
            value: input.to_owned(),
        }
    })
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    #[test]
    fn builds_request_from_user_strings() {
        let request =
            TickerRequest::parse("aapl", "2023-01-01", "2024-12-31", 20).expect("valid request");

        assert_eq!(request.symbol().as_str(), "AAPL");
        assert_eq!(request.start(), date!(2023 - 01 - 01));
        assert_eq!(request.end(), date!(2024 - 12 - 31));
        assert_eq!(request.ma_window(), 20);
    }

    #[test]
    fn single_day_range_is_allowed() {
        let request = TickerRequest::parse("MSFT", "2024-03-01", "2024-03-01", 5);
        assert!(request.is_ok());
    }

    #[test]
    fn rejects_inverted_range() {
        let err = TickerRequest::parse("MSFT", "2024-03-02", "2024-03-01", 5).expect_err("must fail");
        assert!(matches!(err, ValidationError::InvertedDateRange { .. }));
    }

    #[test]
    fn rejects_window_outside_bounds() {
        for window in [0, 4, 51] {
            let err =
                TickerRequest::parse("MSFT", "2024-01-01", "2024-02-01", window).expect_err("must fail");
            assert!(matches!(err, ValidationError::WindowOutOfRange { .. }));
        }
        assert!(TickerRequest::parse("MSFT", "2024-01-01", "2024-02-01", 50).is_ok());
    }

    #[test]
    fn rejects_malformed_date() {
        let err = parse_date("01/02/2024").expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidDate { .. }));
    }

    #[test]
    fn decoding_applies_the_same_validation() {
        let valid: TickerRequest = serde_json::from_str(
            r#"{"symbol": "aapl", "start": "2024-01-01", "end": "2024-02-01", "ma_window": 20}"#,
        )
        .expect("valid request decodes");
        assert_eq!(valid.symbol().as_str(), "AAPL");

        for body in [
            r#"{"symbol": "AAPL", "start": "2024-01-01", "end": "2024-02-01", "ma_window": 99}"#,
            r#"{"symbol": "AAPL", "start": "2024-03-01", "end": "2024-02-01", "ma_window": 20}"#,
            r#"{"symbol": "$(id)", "start": "2024-01-01", "end": "2024-02-01", "ma_window": 20}"#,
        ] {
            let decoded = serde_json::from_str::<TickerRequest>(body);
            assert!(decoded.is_err(), "{body} should not decode");
        }
    }

    #[test]
    fn serialized_request_decodes_back() {
        let request = TickerRequest::parse("IBM", "2024-01-10", "2024-01-20", 5).expect("valid");

        let json = serde_json::to_string(&request).expect("serializes");
        let decoded: TickerRequest = serde_json::from_str(&json).expect("decodes");

        assert_eq!(decoded, request);
    }

    #[test]
    fn range_check_includes_boundaries() {
        let request = TickerRequest::parse("IBM", "2024-01-10", "2024-01-20", 5).expect("valid");
        assert!(request.contains(date!(2024 - 01 - 10)));
        assert!(request.contains(date!(2024 - 01 - 20)));
        assert!(!request.contains(date!(2024 - 01 - 09)));
        assert!(!request.contains(date!(2024 - 01 - 21)));
    }
}
