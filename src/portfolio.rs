//! Named portfolios: user-supplied fixed allocations plus the always-plot
//! auto-allocations (best/worst single asset), and the final assembly of
//! a frontier's surviving points into displayable portfolios.
//!
//! Grounded in `examples/original_source/modules/data_types.py`'s
//! `Portfolio` dataclass and its `asset_allocation_error` validation, and
//! in `portfolio.rs`'s style (as seen in the wider stock/portfolio-tool
//! corpus) of collecting named allocations into a display-ready list.

use crate::allocation::Allocation;
use crate::colors::ColorMap;
use crate::error::{IngestReport, PortfolioError};
use crate::hull::HullPoint;
use crate::market::{AssetUniverse, YearGainTable};
use crate::record::{decode, Record};
use crate::simulator::{
    best_asset_per_year, representative_allocation, simulate, simulate_source,
    worst_asset_per_year, WeightSource, YearRangeSelector,
};
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize)]
struct RawPortfolio {
    name: String,
    weights: std::collections::HashMap<String, i32>,
}

/// The closed set of ways a named portfolio's weights are determined: a
/// fixed allocation, or one of the two theoretical clairvoyant portfolios
/// that hold 100% of whichever asset wins (or loses) that year, resolved
/// year by year by the Simulator rather than fixed up front.
#[derive(Clone, Debug)]
pub enum StaticKind {
    Fixed(Allocation),
    BestAssetPerYear,
    WorstAssetPerYear,
}

/// A named portfolio, always plotted regardless of whether it lies on a
/// frontier hull.
#[derive(Clone, Debug)]
pub struct Portfolio {
    pub name: String,
    pub kind: StaticKind,
    pub always_plot: bool,
}

fn validate_one(
    universe: &AssetUniverse,
    colors: &ColorMap,
    raw: &RawPortfolio,
) -> (Option<Allocation>, Vec<PortfolioError>) {
    let mut errors = Vec::new();
    let mut weights = vec![0i32; universe.len()];
    for (asset, weight) in &raw.weights {
        match universe.index_of(asset) {
            Some(idx) => weights[idx] = *weight,
            None => errors.push(PortfolioError::UnknownAsset {
                portfolio: raw.name.clone(),
                asset: asset.clone(),
            }),
        }
    }
    let sum: i32 = weights.iter().sum();
    if sum != 100 {
        errors.push(PortfolioError::WeightSumNot100 {
            portfolio: raw.name.clone(),
            sum,
        });
    }
    for asset in universe.names() {
        if colors.get(asset).is_none() {
            errors.push(PortfolioError::ColorMissing {
                asset: asset.clone(),
            });
        }
    }
    if errors.is_empty() {
        (Some(Allocation(weights)), errors)
    } else {
        (None, errors)
    }
}

/// Reads and validates a static-portfolio config file against the market's
/// asset universe and the color map. Every invalid portfolio is collected
/// into the returned [`IngestReport`] rather than aborting on the first
/// one; callers decide whether any failures are fatal.
pub fn read_static_portfolios(
    path: &Path,
    universe: &AssetUniverse,
    colors: &ColorMap,
) -> Result<(Vec<Portfolio>, IngestReport), PortfolioError> {
    let text = std::fs::read_to_string(path)?;
    let raw: Vec<RawPortfolio> = serde_json::from_str(&text)
        .map_err(|e| PortfolioError::Config(format!("invalid portfolio config: {e}")))?;

    let mut portfolios = Vec::new();
    let mut all_errors = Vec::new();
    for r in &raw {
        let (allocation, mut errors) = validate_one(universe, colors, r);
        match allocation {
            Some(allocation) => portfolios.push(Portfolio {
                name: r.name.clone(),
                kind: StaticKind::Fixed(allocation),
                always_plot: true,
            }),
            None => all_errors.append(&mut errors),
        }
    }
    match IngestReport::ok_or_report(all_errors) {
        Ok(()) => Ok((portfolios, IngestReport { errors: Vec::new() })),
        Err(report) => Ok((portfolios, report)),
    }
}

/// The two theoretical auto-allocation portfolios: on `--max`, the
/// portfolio that holds 100% of whichever asset had the single best
/// annual gain *that year*, and on `--min`, the same for the worst
/// annual gain. Unlike a fixed one-hot, the held asset can change every
/// year; the Simulator resolves the actual weights year by year via
/// [`StaticKind::BestAssetPerYear`]/[`StaticKind::WorstAssetPerYear`].
pub fn resolve_auto_portfolios(universe: &AssetUniverse) -> Vec<Portfolio> {
    if universe.is_empty() {
        return Vec::new();
    }
    vec![
        Portfolio {
            name: "best-asset-per-year".into(),
            kind: StaticKind::BestAssetPerYear,
            always_plot: true,
        },
        Portfolio {
            name: "worst-asset-per-year".into(),
            kind: StaticKind::WorstAssetPerYear,
            always_plot: true,
        },
    ]
}

/// Simulates a named portfolio list against the market and wraps each in
/// a [`Record`] so it can be merged alongside hull survivors. Fixed
/// portfolios simulate directly against their allocation; the two
/// clairvoyant per-year portfolios dispatch through a [`WeightSource`]
/// and carry a tallied representative allocation for display.
pub fn simulate_named(
    portfolios: &[Portfolio],
    table: &YearGainTable,
    selector: &YearRangeSelector,
) -> Result<Vec<(Portfolio, Record)>, PortfolioError> {
    portfolios
        .iter()
        .map(|p| {
            let (statistics, allocation) = match &p.kind {
                StaticKind::Fixed(allocation) => {
                    (simulate(allocation, table, selector)?, allocation.clone())
                }
                StaticKind::BestAssetPerYear => {
                    let source = WeightSource::PerYear(best_asset_per_year);
                    let statistics = simulate_source(&source, table, selector)?;
                    let allocation = representative_allocation(&source, table, selector);
                    (statistics, allocation)
                }
                StaticKind::WorstAssetPerYear => {
                    let source = WeightSource::PerYear(worst_asset_per_year);
                    let statistics = simulate_source(&source, table, selector)?;
                    let allocation = representative_allocation(&source, table, selector);
                    (statistics, allocation)
                }
            };
            Ok((p.clone(), Record { allocation, statistics }))
        })
        .collect()
}

/// Assembles a frontier's drained hull points into decoded records, sorted
/// by number of nonzero weights descending (concentrated portfolios last),
/// matching the read order a reader would scan a legend in.
pub struct FrontierAssembler;

impl FrontierAssembler {
    pub fn assemble(points: Vec<HullPoint>, assets: usize) -> Result<Vec<Record>, PortfolioError> {
        let mut records: Vec<Record> = points
            .into_iter()
            .map(|p| decode(&p.record_bytes, assets))
            .collect::<Result<_, _>>()?;
        records.sort_by_key(|r| std::cmp::Reverse(r.allocation.number_of_nonzero_weights()));
        Ok(records)
    }
}
