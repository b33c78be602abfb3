//! Returns-file ingest: asset universe and per-year gain table.
//!
//! Grounded in `examples/original_source/csv_reader.py`: the header names
//! the assets, each row is a year followed by per-asset percentage returns,
//! and a trailing `%` is stripped before converting to a gain multiplier
//! `1 + pct/100`.

use crate::error::PortfolioError;
use std::path::Path;

/// Ordered, unique asset names. Order matches the gain table's columns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetUniverse(Vec<String>);

impl AssetUniverse {
    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|n| n == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }
}

/// Year → per-asset gain multiplier table. Years form a contiguous range.
#[derive(Clone, Debug)]
pub struct YearGainTable {
    years: Vec<i32>,
    assets: usize,
    /// Row-major: `data[(year_idx) * assets + asset_idx]`.
    data: Vec<f32>,
}

impl YearGainTable {
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn assets(&self) -> usize {
        self.assets
    }

    pub fn gains_for_year(&self, year: i32) -> Option<&[f32]> {
        let idx = self.years.iter().position(|&y| y == year)?;
        let start = idx * self.assets;
        Some(&self.data[start..start + self.assets])
    }

    /// Builds a table directly from already-validated parts; used by tests
    /// and fixtures that don't go through CSV ingest.
    pub fn from_parts(years: Vec<i32>, assets: usize, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len(), years.len() * assets);
        Self {
            years,
            assets,
            data,
        }
    }
}

pub fn read_returns_csv(path: &Path) -> Result<(AssetUniverse, YearGainTable), PortfolioError> {
    let text = std::fs::read_to_string(path)?;
    parse_returns_csv(&text)
}

fn parse_returns_csv(text: &str) -> Result<(AssetUniverse, YearGainTable), PortfolioError> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let header = lines
        .next()
        .ok_or_else(|| PortfolioError::Config("returns file has no header row".into()))?;
    let columns: Vec<&str> = header.split(',').collect();
    if columns.len() < 2 {
        return Err(PortfolioError::Config(
            "returns file header has no asset columns".into(),
        ));
    }
    let asset_names: Vec<String> = columns[1..].iter().map(|s| s.trim().to_string()).collect();
    {
        let mut seen = std::collections::HashSet::new();
        for name in &asset_names {
            if !seen.insert(name.as_str()) {
                return Err(PortfolioError::Config(format!(
                    "duplicate asset column '{name}' in returns file"
                )));
            }
        }
    }
    let assets = asset_names.len();

    let mut rows: Vec<(i32, Vec<f32>)> = Vec::new();
    for line in lines {
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != assets + 1 {
            return Err(PortfolioError::Config(format!(
                "row '{line}' has {} fields, expected {}",
                fields.len(),
                assets + 1
            )));
        }
        let year: i32 = fields[0]
            .trim()
            .parse()
            .map_err(|_| PortfolioError::Config(format!("invalid year '{}'", fields[0])))?;
        let mut gains = Vec::with_capacity(assets);
        for raw in &fields[1..] {
            let trimmed = raw.trim().trim_end_matches('%');
            let pct: f64 = trimmed
                .parse()
                .map_err(|_| PortfolioError::Config(format!("invalid return value '{raw}'")))?;
            gains.push((1.0 + pct / 100.0) as f32);
        }
        rows.push((year, gains));
    }

    rows.sort_by_key(|(year, _)| *year);
    for w in rows.windows(2) {
        if w[0].0 == w[1].0 {
            return Err(PortfolioError::Config(format!(
                "duplicate year {} in returns file",
                w[0].0
            )));
        }
        if w[1].0 != w[0].0 + 1 {
            return Err(PortfolioError::Config(format!(
                "returns file years are not contiguous: {} then {}",
                w[0].0, w[1].0
            )));
        }
    }

    let years: Vec<i32> = rows.iter().map(|(y, _)| *y).collect();
    let mut data = Vec::with_capacity(rows.len() * assets);
    for (_, gains) in &rows {
        data.extend_from_slice(gains);
    }

    Ok((
        AssetUniverse(asset_names),
        YearGainTable {
            years,
            assets,
            data,
        },
    ))
}

#[cfg(test)]
pub(crate) fn parse_returns_csv_for_test(
    text: &str,
) -> Result<(AssetUniverse, YearGainTable), PortfolioError> {
    parse_returns_csv(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_percent_and_bare_returns() {
        let csv = "year,A,B\n2020,10%,5\n2021,-2,3%\n";
        let (universe, table) = parse_returns_csv(csv).unwrap();
        assert_eq!(universe.names(), &["A".to_string(), "B".to_string()]);
        assert_eq!(table.years(), &[2020, 2021]);
        let y2020 = table.gains_for_year(2020).unwrap();
        assert!((y2020[0] - 1.10).abs() < 1e-6);
        assert!((y2020[1] - 1.05).abs() < 1e-6);
        let y2021 = table.gains_for_year(2021).unwrap();
        assert!((y2021[0] - 0.98).abs() < 1e-6);
        assert!((y2021[1] - 1.03).abs() < 1e-6);
    }

    #[test]
    fn rejects_noncontiguous_years() {
        let csv = "year,A\n2020,1%\n2022,1%\n";
        assert!(parse_returns_csv(csv).is_err());
    }

    #[test]
    fn rejects_wrong_column_count() {
        let csv = "year,A,B\n2020,1%,2%,3%\n";
        assert!(parse_returns_csv(csv).is_err());
    }
}
