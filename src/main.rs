use allocation_frontier::cli::{Args, RunConfig};
use allocation_frontier::error::PortfolioError;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> std::process::ExitCode {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("allocation_frontier=info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args = Args::parse();
    let config = match RunConfig::from_args(args) {
        Ok(config) => config,
        Err(e) => {
            error!("invalid configuration: {e}");
            return std::process::ExitCode::from(exit_code(&e));
        }
    };

    match allocation_frontier::run(config) {
        Ok(plots) => {
            for plot in &plots {
                info!(
                    x = plot.x_label,
                    y = plot.y_label,
                    portfolios = plot.portfolios.len(),
                    "frontier ready"
                );
            }
            std::process::ExitCode::SUCCESS
        }
        Err(e) => {
            error!("run failed: {e}");
            std::process::ExitCode::from(exit_code(&e))
        }
    }
}

fn exit_code(error: &PortfolioError) -> u8 {
    match error {
        PortfolioError::InvalidStep { .. } => 2,
        PortfolioError::FramingError { .. } => 3,
        PortfolioError::UnknownAsset { .. }
        | PortfolioError::WeightSumNot100 { .. }
        | PortfolioError::ColorMissing { .. }
        | PortfolioError::Ingest(_) => 4,
        PortfolioError::EmptyYearRange | PortfolioError::DegenerateVariance { .. } => 5,
        PortfolioError::IoError(_) => 6,
        PortfolioError::Config(_) => 7,
    }
}
