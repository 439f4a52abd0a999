//! # Domain Models
//!
//! Canonical in-memory shapes every provider payload is reconciled into.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated, uppercase ticker |
//! | [`TickerRequest`] | Symbol, inclusive date range and moving-average window |
//! | [`PriceBar`] | Daily OHLCV row |
//! | [`DerivedSeries`] | Moving average and percent change for one bar |
//! | [`PricePoint`] | A bar with its derived columns |
//! | [`CorporateAction`] | Dividend or split on a naive date |
//! | [`StatementTable`] | `metric -> period -> value` table |
//! | [`RawStatement`] | Transposed statement rows before reshaping |
//! | [`NewsItem`] | Normalized news article |
//!
//! Constructors validate their invariants and return [`ValidationError`](crate::ValidationError).

mod models;
mod request;
mod statement;
mod symbol;

pub use models::{
    filter_to_range, CorporateAction, CorporateActionKind, CorporateActions, DerivedSeries,
    NewsItem, PriceBar, PricePoint, NOT_AVAILABLE,
};
pub use request::{parse_date, TickerRequest, MAX_MA_WINDOW, MIN_MA_WINDOW};
pub use statement::{
    RawRow, RawStatement, StatementKind, StatementLine, StatementTable, StatementValue,
};
pub use symbol::Symbol;
