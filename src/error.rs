use std::fmt;

/// The error taxonomy for the allocation-frontier pipeline.
///
/// Ingest-time errors (`UnknownAsset`, `WeightSumNot100`, `ColorMissing`) are
/// collected rather than returned on first occurrence — see [`IngestReport`].
/// Runtime errors (`FramingError`, `IoError`, `DegenerateVariance`) abort the
/// whole run: they indicate bad input data or a bug, not a transient
/// condition.
#[derive(Debug, thiserror::Error)]
pub enum PortfolioError {
    #[error("precision {step} does not divide 100")]
    InvalidStep { step: u32 },

    #[error("portfolio '{portfolio}' references unknown asset '{asset}'")]
    UnknownAsset { portfolio: String, asset: String },

    #[error("portfolio '{portfolio}' weights sum to {sum}, not 100")]
    WeightSumNot100 { portfolio: String, sum: i32 },

    #[error("year-range selector produced zero ranges")]
    EmptyYearRange,

    #[error("fewer than two annual gains in range [{start}, {end}]")]
    DegenerateVariance { start: i32, end: i32 },

    #[error("record stream length {len} is not a multiple of frame size {frame_size}")]
    FramingError { len: usize, frame_size: usize },

    #[error("asset '{asset}' has no color entry")]
    ColorMissing { asset: String },

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("{0}")]
    Ingest(#[from] IngestReport),
}

/// An ingest-time report enumerating every invalid static portfolio, rather
/// than bailing on the first one.
#[derive(Debug)]
pub struct IngestReport {
    pub errors: Vec<PortfolioError>,
}

impl IngestReport {
    pub fn ok_or_report(errors: Vec<PortfolioError>) -> Result<(), IngestReport> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(IngestReport { errors })
        }
    }
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ingest error(s):", self.errors.len())?;
        for e in &self.errors {
            writeln!(f, "  - {e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for IngestReport {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingest_report_display_enumerates_every_error() {
        let report = IngestReport {
            errors: vec![
                PortfolioError::UnknownAsset {
                    portfolio: "p1".into(),
                    asset: "X".into(),
                },
                PortfolioError::WeightSumNot100 {
                    portfolio: "p2".into(),
                    sum: 90,
                },
            ],
        };
        let rendered = format!("{}", PortfolioError::Ingest(report));
        assert!(rendered.contains("2 ingest error(s)"));
        assert!(rendered.contains("p1"));
        assert!(rendered.contains("p2"));
    }
}
