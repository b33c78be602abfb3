//! Command-line argument parsing and validation into a [`RunConfig`].
//!
//! Derives a flat `clap::Parser` struct the way a CLI front end would;
//! here the parsed `Args` are additionally
//! cross-checked into a `RunConfig` so bad combinations (e.g. a missing
//! sliding-window size) surface before any simulation work starts.

use crate::error::PortfolioError;
use crate::plot::{AxisPair, StatKind};
use crate::simulator::YearRangeSelector;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "allocation-frontier", about = "Discrete portfolio allocation frontier explorer")]
pub struct Args {
    /// Weight precision: every allocation entry is a multiple of this and
    /// 100 must be divisible by it.
    #[arg(long, default_value_t = 10)]
    pub precision: u32,

    /// Number of convex hull layers to retain per axis pair. 0 disables
    /// the HullReducer and forwards every simulated allocation directly.
    #[arg(long, default_value_t = 2)]
    pub hull: usize,

    /// Force-plot any portfolio with at most this many nonzero weights.
    #[arg(long)]
    pub edge: Option<usize>,

    /// Force-plot the worst-asset-per-year portfolio.
    #[arg(long)]
    pub min: bool,

    /// Force-plot the best-asset-per-year portfolio.
    #[arg(long)]
    pub max: bool,

    /// Year-range aggregation strategy.
    #[arg(long, default_value = "first-to-last")]
    pub years: String,

    /// Window size for the sliding-window-k selector.
    #[arg(long)]
    pub window: Option<usize>,

    /// Batch size for the simulation pipeline and fan-out.
    #[arg(long, default_value_t = 65536)]
    pub chunk: usize,

    /// Path to the historical per-asset returns CSV.
    #[arg(long)]
    pub returns: PathBuf,

    /// Path to the asset color JSON config.
    #[arg(long)]
    pub colors: PathBuf,

    /// Path to the static named portfolios JSON config.
    #[arg(long)]
    pub portfolios: PathBuf,

    /// Repeatable `stat:stat` axis pairs, e.g. `stddev:cagr`.
    #[arg(long = "axes", value_delimiter = ',')]
    pub axes: Vec<String>,
}

/// A validated, ready-to-run configuration derived from [`Args`].
pub struct RunConfig {
    pub precision: u32,
    pub hull_layers: usize,
    pub edge_threshold: Option<usize>,
    pub force_min: bool,
    pub force_max: bool,
    pub selector: YearRangeSelector,
    pub chunk: usize,
    pub returns_path: PathBuf,
    pub colors_path: PathBuf,
    pub portfolios_path: PathBuf,
    pub axes: Vec<AxisPair>,
}

fn parse_axis_pair(spec: &str) -> Result<AxisPair, PortfolioError> {
    let (x_name, y_name) = spec.split_once(':').ok_or_else(|| {
        PortfolioError::Config(format!("axis pair '{spec}' must be 'stat:stat'"))
    })?;
    Ok(AxisPair {
        x: StatKind::parse(x_name)?,
        y: StatKind::parse(y_name)?,
    })
}

impl RunConfig {
    pub fn from_args(args: Args) -> Result<Self, PortfolioError> {
        if args.precision == 0 || 100 % args.precision != 0 {
            return Err(PortfolioError::InvalidStep { step: args.precision });
        }
        let selector = YearRangeSelector::parse(&args.years, args.window)?;

        let axes = if args.axes.is_empty() {
            vec![
                AxisPair {
                    x: StatKind::Gain,
                    y: StatKind::Stddev,
                },
                AxisPair {
                    x: StatKind::CagrPercent,
                    y: StatKind::Stddev,
                },
            ]
        } else {
            args.axes
                .iter()
                .map(|s| parse_axis_pair(s))
                .collect::<Result<Vec<_>, _>>()?
        };

        if args.chunk == 0 {
            return Err(PortfolioError::Config("--chunk must be nonzero".into()));
        }

        Ok(Self {
            precision: args.precision,
            hull_layers: args.hull,
            edge_threshold: args.edge,
            force_min: args.min,
            force_max: args.max,
            selector,
            chunk: args.chunk,
            returns_path: args.returns,
            colors_path: args.colors,
            portfolios_path: args.portfolios,
            axes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            precision: 10,
            hull: 2,
            edge: None,
            min: false,
            max: false,
            years: "first-to-last".into(),
            window: None,
            chunk: 65536,
            returns: PathBuf::from("returns.csv"),
            colors: PathBuf::from("colors.json"),
            portfolios: PathBuf::from("portfolios.json"),
            axes: Vec::new(),
        }
    }

    #[test]
    fn default_axes_are_gain_stddev_and_cagr_stddev() {
        let config = RunConfig::from_args(base_args()).unwrap();
        assert_eq!(config.axes.len(), 2);
        assert_eq!(config.axes[0].x, StatKind::Gain);
        assert_eq!(config.axes[0].y, StatKind::Stddev);
        assert_eq!(config.axes[1].x, StatKind::CagrPercent);
        assert_eq!(config.axes[1].y, StatKind::Stddev);
    }

    #[test]
    fn invalid_precision_is_rejected() {
        let mut args = base_args();
        args.precision = 30;
        assert!(matches!(
            RunConfig::from_args(args),
            Err(PortfolioError::InvalidStep { step: 30 })
        ));
    }

    #[test]
    fn sliding_window_without_size_is_rejected() {
        let mut args = base_args();
        args.years = "sliding-window-k".into();
        assert!(RunConfig::from_args(args).is_err());
    }

    #[test]
    fn axis_pairs_are_parsed() {
        let mut args = base_args();
        args.axes = vec!["gain:sharpe".into(), "variance:stddev".into()];
        let config = RunConfig::from_args(args).unwrap();
        assert_eq!(config.axes.len(), 2);
        assert_eq!(config.axes[0].x, StatKind::Gain);
        assert_eq!(config.axes[1].y, StatKind::Stddev);
    }
}
