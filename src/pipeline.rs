//! Parallel simulate-and-encode pipeline: partitions the allocation space
//! across rayon worker tasks, each of which re-enumerates its own
//! contiguous slice (no random access into the enumerator), simulates,
//! encodes, and forwards batches to a single merger that is the sole
//! producer on the downstream pipe.
//!
//! Grounded in `examples/JimStein-diffstock-tui/src/config.rs`'s
//! `ComputeBackend`/rayon thread-pool setup for worker-count selection,
//! and in `src/portfolio.rs`'s batched Monte Carlo loop for the
//! simulate-then-collect shape.

use crate::allocation::{compositions_count, enumerate};
use crate::error::PortfolioError;
use crate::fanout::Frame;
use crate::market::YearGainTable;
use crate::record::{encode, Record};
use crate::simulator::{simulate, YearRangeSelector};
use crossbeam_channel::{bounded, Sender};
use std::sync::{Arc, Mutex};

pub struct PipelineConfig {
    pub assets: usize,
    pub step: u32,
    pub workers: usize,
    pub batch_size: usize,
}

impl PipelineConfig {
    pub fn new(assets: usize, step: u32) -> Self {
        Self {
            assets,
            step,
            workers: num_cpus::get().max(1),
            batch_size: 4096,
        }
    }
}

/// Splits `total` candidates into `workers` contiguous, near-equal slices
/// expressed as `[start, end)` half-open ranges over the enumeration's
/// linear index.
fn partition_slices(total: u64, workers: usize) -> Vec<(u64, u64)> {
    if workers == 0 || total == 0 {
        return Vec::new();
    }
    let base = total / workers as u64;
    let extra = total % workers as u64;
    let mut slices = Vec::with_capacity(workers);
    let mut start = 0u64;
    for w in 0..workers {
        let size = base + if (w as u64) < extra { 1 } else { 0 };
        if size == 0 {
            continue;
        }
        slices.push((start, start + size));
        start += size;
    }
    slices
}

/// Simulates every allocation in `[slice_start, slice_end)` of the full
/// enumeration, encoding each as a frame and sending batches of
/// `batch_size` frames to `out`. Re-enumerates from the beginning and
/// skips, since the enumerator itself offers no random access.
fn run_worker_slice(
    config: &PipelineConfig,
    table: &YearGainTable,
    selector: &YearRangeSelector,
    slice_start: u64,
    slice_end: u64,
    out: &Sender<Vec<u8>>,
) -> Result<(), PortfolioError> {
    let iter = enumerate(config.assets, config.step)?;
    let mut batch = Vec::with_capacity(config.batch_size);

    for (idx, allocation) in iter.enumerate() {
        let idx = idx as u64;
        if idx < slice_start {
            continue;
        }
        if idx >= slice_end {
            break;
        }
        let statistics = simulate(&allocation, table, selector)?;
        let record = Record { allocation, statistics };
        encode(&record, &mut batch);

        if batch.len() >= config.batch_size * crate::record::frame_size(config.assets) {
            if out.send(std::mem::take(&mut batch)).is_err() {
                return Ok(());
            }
        }
    }
    if !batch.is_empty() && out.send(batch).is_err() {
        return Ok(());
    }
    Ok(())
}

/// Runs the full parallel pipeline, sending the merged, ordered byte
/// stream (terminated by [`Frame::Sentinel`]) to `sink`.
///
/// Each worker owns a private bounded channel and runs inside a rayon
/// scope (one task per slice).
/// The merger runs on the scope's calling thread, draining the workers'
/// receivers in slice order (0..workers) — it is the only producer on
/// `sink`, satisfying the one-producer-per-pipe rule downstream. The
/// first worker error is captured in `error_slot` and the merge loop
/// exits early, which drops the remaining receivers and makes any
/// still-blocked worker `send` fail immediately instead of deadlocking.
pub fn run_pipeline(
    config: PipelineConfig,
    table: Arc<YearGainTable>,
    selector: YearRangeSelector,
    sink: Sender<Frame>,
) -> Result<(), PortfolioError> {
    let total = compositions_count(config.assets, config.step);
    let slices = partition_slices(total, config.workers);
    if slices.is_empty() {
        sink.send(Frame::Sentinel).ok();
        return Ok(());
    }

    let error_slot: Arc<Mutex<Option<PortfolioError>>> = Arc::new(Mutex::new(None));
    let mut worker_receivers = Vec::with_capacity(slices.len());
    let mut worker_senders = Vec::with_capacity(slices.len());
    for _ in &slices {
        let (tx, rx) = bounded::<Vec<u8>>(4);
        worker_senders.push(tx);
        worker_receivers.push(rx);
    }

    rayon::scope(|scope| {
        for ((start, end), tx) in slices.into_iter().zip(worker_senders.into_iter()) {
            let table = Arc::clone(&table);
            let error_slot = Arc::clone(&error_slot);
            let assets = config.assets;
            let step = config.step;
            let batch_size = config.batch_size;
            scope.spawn(move |_| {
                let worker_config = PipelineConfig {
                    assets,
                    step,
                    workers: 1,
                    batch_size,
                };
                if let Err(e) = run_worker_slice(&worker_config, &table, &selector, start, end, &tx)
                {
                    *error_slot.lock().unwrap() = Some(e);
                }
            });
        }

        for rx in worker_receivers {
            for bytes in rx.iter() {
                if sink.send(Frame::Data(bytes)).is_err() {
                    break;
                }
            }
            if error_slot.lock().unwrap().is_some() {
                break;
            }
        }
        sink.send(Frame::Sentinel).ok();
    });

    if let Some(e) = error_slot.lock().unwrap().take() {
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::decode_stream;
    use std::thread;

    fn fixture_table() -> YearGainTable {
        let assets = 3;
        let mut years = Vec::new();
        let mut data = Vec::new();
        for (i, y) in (2000..2010).enumerate() {
            years.push(y);
            data.push(1.02 + 0.001 * i as f32);
            data.push(1.05 - 0.0005 * i as f32);
            data.push(1.01 + 0.002 * i as f32);
        }
        YearGainTable::from_parts(years, assets, data)
    }

    #[test]
    fn partition_covers_every_index_exactly_once() {
        for (total, workers) in [(100u64, 4usize), (7, 3), (1, 5), (0, 4)] {
            let slices = partition_slices(total, workers);
            let mut covered = 0u64;
            let mut prev_end = 0u64;
            for (start, end) in &slices {
                assert_eq!(*start, prev_end);
                covered += end - start;
                prev_end = *end;
            }
            assert_eq!(covered, total);
        }
    }

    #[test]
    fn pipeline_emits_every_allocation_exactly_once() {
        let table = Arc::new(fixture_table());
        let config = PipelineConfig {
            assets: 3,
            step: 25,
            workers: 3,
            batch_size: 2,
        };
        let expected = compositions_count(3, 25);
        let (tx, rx) = bounded::<Frame>(8);

        let handle = thread::spawn(move || {
            run_pipeline(config, table, YearRangeSelector::FirstToLast, tx)
        });

        let mut bytes = Vec::new();
        loop {
            match rx.recv().unwrap() {
                Frame::Data(b) => bytes.extend_from_slice(&b),
                Frame::Sentinel => break,
            }
        }
        handle.join().unwrap().unwrap();

        let records = decode_stream(&bytes, 3).unwrap();
        assert_eq!(records.len() as u64, expected);

        let unique: std::collections::HashSet<Vec<i32>> =
            records.iter().map(|r| r.allocation.0.clone()).collect();
        assert_eq!(unique.len() as u64, expected);
    }
}
