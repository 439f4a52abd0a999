//! Canonical price ordering and the derived moving-average and percent-change
//! columns.

use std::collections::VecDeque;

use crate::{DerivedSeries, PriceBar, PricePoint};

/// Sort bars ascending by date, keeping the last bar seen for a repeated date.
pub fn canonicalize(mut bars: Vec<PriceBar>) -> Vec<PriceBar> {
    // Stable, so input order decides among bars sharing a date.
    bars.sort_by_key(|bar| bar.date);

    let mut canonical: Vec<PriceBar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match canonical.last_mut() {
            Some(last) if last.date == bar.date => *last = bar,
            _ => canonical.push(bar),
        }
    }
    canonical
}

/// Attach the trailing moving average and close-to-close percent change to
/// each bar.
///
/// `bars` must already be canonical. The output has the same length and order.
/// A `ma_window` of zero behaves like one.
pub fn normalize(bars: Vec<PriceBar>, ma_window: usize) -> Vec<PricePoint> {
    let window = ma_window.max(1);
    let mut trailing = VecDeque::with_capacity(window);
    let mut running_sum = 0.0;
    let mut previous_close: Option<f64> = None;

    bars.into_iter()
        .map(|bar| {
            trailing.push_back(bar.close);
            running_sum += bar.close;
            if trailing.len() > window {
                if let Some(evicted) = trailing.pop_front() {
                    running_sum -= evicted;
                }
            }

            let moving_average = (trailing.len() == window).then(|| running_sum / window as f64);
            let pct_change =
                previous_close.map_or(0.0, |previous| percent_change(previous, bar.close));
            previous_close = Some(bar.close);

            PricePoint {
                bar,
                derived: DerivedSeries {
                    moving_average,
                    pct_change,
                },
            }
        })
        .collect()
}

fn percent_change(previous: f64, current: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    round2((current / previous - 1.0) * 100.0)
}

/// Two decimals, ties to even.
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
