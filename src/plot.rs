//! Plot descriptors: pure data describing what a frontier chart would
//! show, without rendering it. Grounded in
//! `examples/original_source/modules/data_types.py::plot_color` for the
//! color-blend step and in `ui.rs`'s legend-entry shape for the
//! label/legend metadata a renderer would eventually consume.

use crate::colors::ColorMap;
use crate::error::PortfolioError;
use crate::market::AssetUniverse;
use crate::portfolio::Portfolio;
use crate::record::{Record, Statistics};

/// The five statistics a frontier can be projected onto.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatKind {
    Gain,
    CagrPercent,
    Variance,
    Stddev,
    Sharpe,
}

impl StatKind {
    pub fn parse(name: &str) -> Result<Self, PortfolioError> {
        match name {
            "gain" => Ok(Self::Gain),
            "cagr" | "cagr-percent" | "cagr_percent" => Ok(Self::CagrPercent),
            "variance" => Ok(Self::Variance),
            "stddev" => Ok(Self::Stddev),
            "sharpe" => Ok(Self::Sharpe),
            other => Err(PortfolioError::Config(format!(
                "unknown statistic axis '{other}'"
            ))),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Gain => "gain",
            Self::CagrPercent => "cagr %",
            Self::Variance => "variance",
            Self::Stddev => "stddev",
            Self::Sharpe => "sharpe",
        }
    }

    pub fn project(&self, s: &Statistics) -> f64 {
        match self {
            Self::Gain => s.gain as f64,
            Self::CagrPercent => s.cagr_percent as f64,
            Self::Variance => s.variance as f64,
            Self::Stddev => s.stddev as f64,
            Self::Sharpe => s.sharpe as f64,
        }
    }
}

/// A pair of axes a frontier is reduced against, e.g. (stddev, cagr).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AxisPair {
    pub x: StatKind,
    pub y: StatKind,
}

impl AxisPair {
    pub fn project(&self, record: &Record) -> (f64, f64) {
        (self.x.project(&record.statistics), self.y.project(&record.statistics))
    }
}

/// One plotted point: its projected coordinates, display color, and
/// whether it's an always-plot named portfolio or a hull survivor.
#[derive(Clone, Debug)]
pub struct PlottedPortfolio {
    pub label: Option<String>,
    pub x: f64,
    pub y: f64,
    pub always_plot: bool,
    pub color: (f32, f32, f32),
}

/// A complete frontier plot descriptor for one axis pair.
#[derive(Clone, Debug)]
pub struct FrontierPlot {
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub portfolios: Vec<PlottedPortfolio>,
}

fn weight_pairs<'a>(universe: &'a AssetUniverse, record: &Record) -> Vec<(&'a str, i32)> {
    universe
        .names()
        .iter()
        .zip(record.allocation.iter())
        .filter(|(_, &w)| w != 0)
        .map(|(name, &w)| (name.as_str(), w))
        .collect()
}

/// Builds a [`FrontierPlot`] from a frontier's hull-survivor records plus
/// any always-plot named portfolios, coloring each by its weighted asset
/// blend.
pub fn build_plot(
    axes: AxisPair,
    universe: &AssetUniverse,
    colors: &ColorMap,
    hull_records: &[Record],
    named: &[(Portfolio, Record)],
) -> Result<FrontierPlot, PortfolioError> {
    let mut portfolios = Vec::with_capacity(hull_records.len() + named.len());

    for record in hull_records {
        let (x, y) = axes.project(record);
        let pairs = weight_pairs(universe, record);
        let color = colors.blend(&pairs)?;
        portfolios.push(PlottedPortfolio {
            label: None,
            x,
            y,
            always_plot: false,
            color,
        });
    }

    for (portfolio, record) in named {
        let (x, y) = axes.project(record);
        let pairs = weight_pairs(universe, record);
        let color = colors.blend(&pairs)?;
        portfolios.push(PlottedPortfolio {
            label: Some(portfolio.name.clone()),
            x,
            y,
            always_plot: portfolio.always_plot,
            color,
        });
    }

    Ok(FrontierPlot {
        x_label: axes.x.label(),
        y_label: axes.y.label(),
        portfolios,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::Allocation;
    use crate::market::parse_returns_csv_for_test;
    use std::collections::HashMap;

    fn fixture_universe() -> AssetUniverse {
        parse_returns_csv_for_test("year,A,B\n2020,0,0\n").unwrap().0
    }

    fn fixture_colors() -> ColorMap {
        let mut m = HashMap::new();
        m.insert("A".to_string(), [1.0, 0.0, 0.0]);
        m.insert("B".to_string(), [0.0, 1.0, 0.0]);
        ColorMap::from_map_for_test(m)
    }

    fn fixture_record(gain: f32, stddev: f32, weights: Vec<i32>) -> Record {
        Record {
            allocation: Allocation(weights),
            statistics: Statistics {
                gain,
                cagr_percent: 0.0,
                variance: 0.0,
                stddev,
                sharpe: 0.0,
            },
        }
    }

    #[test]
    fn stat_kind_parse_round_trips_known_names() {
        for name in ["gain", "cagr", "variance", "stddev", "sharpe"] {
            assert!(StatKind::parse(name).is_ok());
        }
        assert!(StatKind::parse("bogus").is_err());
    }

    #[test]
    fn build_plot_projects_onto_requested_axes() {
        let universe = fixture_universe();
        let colors = fixture_colors();
        let axes = AxisPair {
            x: StatKind::Stddev,
            y: StatKind::Gain,
        };
        let hull_records = vec![fixture_record(1.5, 0.2, vec![100, 0])];
        let plot = build_plot(axes, &universe, &colors, &hull_records, &[]).unwrap();
        assert_eq!(plot.portfolios.len(), 1);
        assert_eq!(plot.portfolios[0].x, 0.2_f64);
        assert_eq!(plot.portfolios[0].y, 1.5_f64);
        assert_eq!(plot.x_label, "stddev");
        assert_eq!(plot.y_label, "gain");
    }

    #[test]
    fn named_portfolios_carry_labels_and_always_plot_flag() {
        let universe = fixture_universe();
        let colors = fixture_colors();
        let axes = AxisPair {
            x: StatKind::Stddev,
            y: StatKind::Gain,
        };
        let portfolio = Portfolio {
            name: "all-A".into(),
            kind: crate::portfolio::StaticKind::Fixed(Allocation(vec![100, 0])),
            always_plot: true,
        };
        let record = fixture_record(1.2, 0.1, vec![100, 0]);
        let plot = build_plot(axes, &universe, &colors, &[], &[(portfolio, record)]).unwrap();
        assert_eq!(plot.portfolios[0].label.as_deref(), Some("all-A"));
        assert!(plot.portfolios[0].always_plot);
    }
}
