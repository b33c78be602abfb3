//! Discrete portfolio allocation frontier explorer.
//!
//! Enumerates every integer weight vector at a given precision, simulates
//! each against historical per-asset annual returns, and reduces the
//! result to a small set of Pareto-style frontiers via an incremental
//! multi-layer convex hull, one per requested statistic-pair axis.

pub mod allocation;
pub mod cli;
pub mod colors;
pub mod error;
pub mod fanout;
pub mod hull;
pub mod market;
pub mod pipeline;
pub mod plot;
pub mod portfolio;
pub mod record;
pub mod simulator;

use cli::RunConfig;
use crossbeam_channel::bounded;
use error::{IngestReport, PortfolioError};
use fanout::{run_fanout, Frame};
use hull::HullReducer;
use plot::{build_plot, FrontierPlot};
use portfolio::{resolve_auto_portfolios, simulate_named, FrontierAssembler};
use record::{decode, frame_size};
use std::sync::Arc;
use std::thread;
use tracing::{error, info};

/// Runs the full pipeline for a validated [`RunConfig`] and returns one
/// [`FrontierPlot`] per configured axis pair, in the same order as
/// `config.axes`.
pub fn run(config: RunConfig) -> Result<Vec<FrontierPlot>, PortfolioError> {
    info!(precision = config.precision, "reading market data");
    let (universe, table) = market::read_returns_csv(&config.returns_path)?;
    let colors = colors::read_color_config(&config.colors_path)?;

    let color_errors = colors.missing_for(&universe);
    if !color_errors.is_empty() {
        let report = IngestReport { errors: color_errors };
        error!("{report}");
        return Err(report.into());
    }

    let (static_portfolios, ingest_report) =
        portfolio::read_static_portfolios(&config.portfolios_path, &universe, &colors)?;
    if !ingest_report.errors.is_empty() {
        error!("{ingest_report}");
        return Err(ingest_report.into());
    }

    let mut named = static_portfolios;
    if config.force_min || config.force_max {
        let autos = resolve_auto_portfolios(&universe);
        if config.force_max {
            named.push(autos[0].clone());
        }
        if config.force_min {
            named.push(autos[1].clone());
        }
    }

    let named_records = simulate_named(&named, &table, &config.selector)?;

    let assets = universe.len();
    let hull_records_per_axis = run_frontiers(&config, &table, assets)?;

    let mut plots = Vec::with_capacity(config.axes.len());
    for (axes, hull_records) in config.axes.iter().zip(hull_records_per_axis.into_iter()) {
        info!(x = axes.x.label(), y = axes.y.label(), "building frontier");
        let plot = build_plot(*axes, &universe, &colors, &hull_records, &named_records)?;
        plots.push(plot);
    }

    Ok(plots)
}

/// Runs `SimulationPipeline` exactly once, fans its encoded-record stream
/// out to one consumer per configured axis, and reduces each axis's
/// stream through its own `HullReducer` in parallel. Returns one
/// assembled, decoded record list per axis, in `config.axes` order.
fn run_frontiers(
    config: &RunConfig,
    table: &market::YearGainTable,
    assets: usize,
) -> Result<Vec<Vec<record::Record>>, PortfolioError> {
    let (sim_tx, sim_rx) = bounded::<Frame>(8);
    let mut axis_senders = Vec::with_capacity(config.axes.len());
    let mut axis_receivers = Vec::with_capacity(config.axes.len());
    for _ in &config.axes {
        let (tx, rx) = bounded::<Frame>(8);
        axis_senders.push(tx);
        axis_receivers.push(rx);
    }

    let table = Arc::new(table.clone());

    let results = thread::scope(|scope| {
        let pipeline_config = pipeline::PipelineConfig {
            assets,
            step: config.precision,
            workers: num_cpus::get().max(1),
            batch_size: config.chunk,
        };
        let selector = config.selector;
        let pipeline_table = Arc::clone(&table);
        let pipeline_handle = scope
            .spawn(move || pipeline::run_pipeline(pipeline_config, pipeline_table, selector, sim_tx));

        let fanout_handle = scope.spawn(move || run_fanout(sim_rx, axis_senders));

        let hull_layers = config.hull_layers;
        let chunk = config.chunk;
        let edge_threshold = config.edge_threshold;
        let handles: Vec<_> = config
            .axes
            .iter()
            .zip(axis_receivers.into_iter())
            .map(|(axes, rx)| {
                let axes = *axes;
                scope.spawn(move || {
                    consume_axis(rx, assets, chunk, hull_layers, edge_threshold, axes)
                })
            })
            .collect();

        let axis_results: Vec<Result<Vec<record::Record>, PortfolioError>> = handles
            .into_iter()
            .map(|h| h.join().expect("axis consumer panicked"))
            .collect();

        pipeline_handle.join().expect("pipeline worker panicked")?;
        fanout_handle.join().expect("fan-out task panicked")?;

        axis_results.into_iter().collect::<Result<Vec<_>, _>>()
    });

    results
}

fn consume_axis(
    rx: crossbeam_channel::Receiver<Frame>,
    assets: usize,
    chunk: usize,
    hull_layers: usize,
    edge_threshold: Option<usize>,
    axes: plot::AxisPair,
) -> Result<Vec<record::Record>, PortfolioError> {
    let mut reducer = HullReducer::new(chunk, hull_layers.max(1), move |r| axes.project(r));
    let mut passthrough = Vec::new();
    let mut edge_records = Vec::new();
    let fs = frame_size(assets);

    loop {
        match rx.recv() {
            Ok(Frame::Data(bytes)) => {
                for raw in bytes.chunks_exact(fs) {
                    let record = decode(raw, assets)?;
                    if let Some(threshold) = edge_threshold {
                        if record.allocation.number_of_nonzero_weights() <= threshold {
                            edge_records.push(record.clone());
                        }
                    }
                    if hull_layers == 0 {
                        passthrough.push(record);
                    } else {
                        reducer.insert(&record, raw);
                    }
                }
            }
            Ok(Frame::Sentinel) => break,
            Err(_) => break,
        }
    }

    let points = if hull_layers == 0 {
        passthrough
            .into_iter()
            .map(|r| {
                let mut bytes = Vec::new();
                record::encode(&r, &mut bytes);
                hull::HullPoint::new(0.0, 0.0, bytes)
            })
            .collect()
    } else {
        reducer.drain()
    };

    let mut assembled = FrontierAssembler::assemble(points, assets)?;
    for edge_record in edge_records {
        if !assembled
            .iter()
            .any(|r| r.allocation.0 == edge_record.allocation.0)
        {
            assembled.push(edge_record);
        }
    }
    assembled.sort_by_key(|r| std::cmp::Reverse(r.allocation.number_of_nonzero_weights()));

    Ok(assembled)
}
