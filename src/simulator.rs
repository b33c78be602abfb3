//! Maps one allocation, or a per-year clairvoyant weight source, to its
//! Statistics under a configurable year-range aggregator.
//!
//! Grounded in `modules/data_types.py::Portfolio.simulate` for the per-range
//! formulas. The closed set of year-range selectors aggregates by
//! arithmetic mean across every range a selector yields.

use crate::allocation::Allocation;
use crate::error::PortfolioError;
use crate::market::YearGainTable;
use crate::record::Statistics;

/// The fixed, closed set of year-range selectors. Represented as a sum
/// type rather than a name lookup, so an unknown selector string fails at
/// parse time rather than at first use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum YearRangeSelector {
    FirstToLast,
    FirstToAll,
    SlidingWindow(usize),
    AllToLast,
    AllToAll,
}

impl YearRangeSelector {
    pub fn parse(name: &str, window: Option<usize>) -> Result<Self, PortfolioError> {
        match name {
            "first-to-last" => Ok(Self::FirstToLast),
            "first-to-all" => Ok(Self::FirstToAll),
            "sliding-window-k" => {
                let k = window.ok_or_else(|| {
                    PortfolioError::Config(
                        "sliding-window-k selector requires a window size".into(),
                    )
                })?;
                Ok(Self::SlidingWindow(k))
            }
            "all-to-last" => Ok(Self::AllToLast),
            "all-to-all" => Ok(Self::AllToAll),
            other => Err(PortfolioError::Config(format!(
                "unknown year-range selector '{other}'"
            ))),
        }
    }

    /// Yields `(start, end)` inclusive-year ranges over the sorted years
    /// present in the table.
    pub fn ranges(&self, years: &[i32]) -> Vec<(i32, i32)> {
        if years.is_empty() {
            return Vec::new();
        }
        let first = years[0];
        let last = *years.last().unwrap();
        match self {
            Self::FirstToLast => vec![(first, last)],
            Self::FirstToAll => years[1..].iter().map(|&y| (first, y)).collect(),
            Self::AllToLast => years[..years.len() - 1].iter().map(|&y| (y, last)).collect(),
            Self::SlidingWindow(k) => {
                if *k < 2 || years.len() < *k {
                    return Vec::new();
                }
                years
                    .windows(*k)
                    .map(|w| (w[0], *w.last().unwrap()))
                    .collect()
            }
            Self::AllToAll => {
                let mut out = Vec::new();
                for i in 0..years.len() {
                    for j in (i + 1)..years.len() {
                        out.push((years[i], years[j]));
                    }
                }
                out
            }
        }
    }
}

/// A source of the weights applied in a single year. `Fixed` ignores the
/// year's gain row and always returns the same weights; `PerYear` is the
/// "theoretical best/worst-asset-per-year" dispatch — a callable that
/// inspects that year's gain row and picks the weights for it, giving a
/// clairvoyant one-hot allocation that can vary year to year.
pub enum WeightSource<'a> {
    Fixed(&'a Allocation),
    PerYear(fn(&[f32]) -> Vec<f64>),
}

impl<'a> WeightSource<'a> {
    fn weights_for(&self, gains: &[f32]) -> Vec<f64> {
        match self {
            WeightSource::Fixed(allocation) => {
                allocation.iter().map(|&w| w as f64 / 100.0).collect()
            }
            WeightSource::PerYear(picker) => picker(gains),
        }
    }
}

/// One-hot weights for the year's highest-gaining asset.
pub fn best_asset_per_year(gains: &[f32]) -> Vec<f64> {
    one_hot_extreme(gains, true)
}

/// One-hot weights for the year's lowest-gaining asset.
pub fn worst_asset_per_year(gains: &[f32]) -> Vec<f64> {
    one_hot_extreme(gains, false)
}

fn one_hot_extreme(gains: &[f32], want_max: bool) -> Vec<f64> {
    let mut extreme = 0usize;
    for i in 1..gains.len() {
        let better = if want_max {
            gains[i] > gains[extreme]
        } else {
            gains[i] < gains[extreme]
        };
        if better {
            extreme = i;
        }
    }
    let mut weights = vec![0.0; gains.len()];
    if !gains.is_empty() {
        weights[extreme] = 1.0;
    }
    weights
}

/// Tallies the average per-asset weight a [`WeightSource`] applies across
/// every year touched by `selector`, as a percentage allocation. For
/// `Fixed` this reproduces the fixed weights; for `PerYear` it's the
/// fraction of years each asset was picked, scaled to 0..=100 — a
/// representative mix for display, not a weight vector the source itself
/// ever actually holds in any single year.
pub fn representative_allocation(
    source: &WeightSource,
    table: &YearGainTable,
    selector: &YearRangeSelector,
) -> Allocation {
    let assets = table.assets();
    let mut sum = vec![0.0f64; assets];
    let mut count = 0usize;
    for (start, end) in selector.ranges(table.years()) {
        for year in start..=end {
            if let Some(row) = table.gains_for_year(year) {
                for (i, w) in source.weights_for(row).iter().enumerate() {
                    sum[i] += w;
                }
                count += 1;
            }
        }
    }
    if count == 0 {
        return Allocation(vec![0; assets]);
    }
    let pct = sum
        .iter()
        .map(|s| ((s / count as f64) * 100.0).round() as i32)
        .collect();
    Allocation(pct)
}

struct RangeResult {
    gain: f64,
    cagr: f64,
    variance: f64,
    stddev: f64,
}

fn simulate_range(
    source: &WeightSource,
    table: &YearGainTable,
    start: i32,
    end: i32,
) -> Result<RangeResult, PortfolioError> {
    let mut annual_gains = Vec::with_capacity((end - start + 1).max(0) as usize);
    for year in start..=end {
        let row = table
            .gains_for_year(year)
            .ok_or_else(|| PortfolioError::Config(format!("no market data for year {year}")))?;
        let weights = source.weights_for(row);
        let annual_gain: f64 = weights
            .iter()
            .zip(row.iter())
            .map(|(w, g)| w * *g as f64)
            .sum();
        annual_gains.push(annual_gain);
    }

    let n = annual_gains.len();
    if n < 2 {
        return Err(PortfolioError::DegenerateVariance { start, end });
    }

    let gain: f64 = annual_gains.iter().product();
    let cagr = gain.powf(1.0 / n as f64) - 1.0;
    let variance = annual_gains
        .iter()
        .map(|g| (g - cagr - 1.0).powi(2))
        .sum::<f64>()
        / (n as f64 - 1.0);
    let stddev = variance.sqrt();

    Ok(RangeResult {
        gain,
        cagr,
        variance,
        stddev,
    })
}

/// Simulates a fixed `allocation` across every range the selector yields,
/// then aggregates the per-range statistics by arithmetic mean.
pub fn simulate(
    allocation: &Allocation,
    table: &YearGainTable,
    selector: &YearRangeSelector,
) -> Result<Statistics, PortfolioError> {
    simulate_source(&WeightSource::Fixed(allocation), table, selector)
}

/// Simulates a [`WeightSource`] (fixed or per-year) across every range the
/// selector yields, then aggregates the per-range statistics by
/// arithmetic mean.
pub fn simulate_source(
    source: &WeightSource,
    table: &YearGainTable,
    selector: &YearRangeSelector,
) -> Result<Statistics, PortfolioError> {
    let ranges = selector.ranges(table.years());
    if ranges.is_empty() {
        return Err(PortfolioError::EmptyYearRange);
    }

    let mut sum_gain = 0.0;
    let mut sum_cagr = 0.0;
    let mut sum_variance = 0.0;
    let mut sum_stddev = 0.0;
    for (start, end) in &ranges {
        let r = simulate_range(source, table, *start, *end)?;
        sum_gain += r.gain;
        sum_cagr += r.cagr;
        sum_variance += r.variance;
        sum_stddev += r.stddev;
    }
    let n = ranges.len() as f64;
    let mean_gain = sum_gain / n;
    let mean_cagr = sum_cagr / n;
    let mean_variance = sum_variance / n;
    let mean_stddev = sum_stddev / n;

    if mean_stddev == 0.0 {
        return Err(PortfolioError::DegenerateVariance {
            start: table.years()[0],
            end: *table.years().last().unwrap(),
        });
    }
    let sharpe = mean_cagr / mean_stddev;

    Ok(Statistics {
        gain: mean_gain as f32,
        cagr_percent: (mean_cagr * 100.0) as f32,
        variance: mean_variance as f32,
        stddev: mean_stddev as f32,
        sharpe: sharpe as f32,
    })
}
