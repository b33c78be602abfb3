//! One-to-many, order-preserving byte-stream multiplexer.
//!
//! Each encoded record leaving the simulation pipeline is needed by every
//! axis's hull reducer. Rather than cloning the whole stream per axis up
//! front, frames are copied to N sinks batch-by-batch so no sink can run
//! far ahead of another (bounded memory applies to fan-out too).
//! Grounded in the worker/channel plumbing style of
//! `examples/JimStein-diffstock-tui/src/data.rs`, adapted from its
//! websocket fan-out to a synchronous `crossbeam_channel` pipe model.

use crate::error::PortfolioError;
use crossbeam_channel::{Receiver, Sender};
use rayon::prelude::*;

/// One unit on a byte pipe: either a data frame or the end-of-stream
/// marker. Every pipe in the system ends with exactly one `Sentinel`.
#[derive(Clone, Debug)]
pub enum Frame {
    Data(Vec<u8>),
    Sentinel,
}

/// Copies every `Frame` from `source` to every sink in `sinks`, in the
/// order received. A batch of sink writes is dispatched in parallel, but
/// the next batch is not read from `source` until all sinks in this batch
/// have accepted it — the backpressure that keeps every sink roughly in
/// step with the slowest one.
pub fn run_fanout(source: Receiver<Frame>, sinks: Vec<Sender<Frame>>) -> Result<(), PortfolioError> {
    loop {
        let frame = match source.recv() {
            Ok(f) => f,
            Err(_) => return Ok(()),
        };
        let done = matches!(frame, Frame::Sentinel);

        let failures: usize = sinks
            .par_iter()
            .map(|sink| if sink.send(frame.clone()).is_err() { 1 } else { 0 })
            .sum();
        if failures == sinks.len() && !sinks.is_empty() {
            return Err(PortfolioError::Config(
                "all fan-out sinks disconnected".into(),
            ));
        }

        if done {
            return Ok(());
        }
    }
}
