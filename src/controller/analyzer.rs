//! The analysis stage: receive, dissect, count, trace.

use std::io::Read;
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::channel::FrameReceiver;
use crate::dissector::EthernetDissector;
use crate::domain::Frame;
use crate::reporter::TrafficReporter;
use crate::stats::{StatsAccumulator, StatsTotals};

/// Owns the statistics for a run. Nothing outside this stage touches them;
/// they leave only as the `StatsTotals` returned by `run`.
pub struct Analyzer {
    dissector: EthernetDissector,
    reporter: Arc<dyn TrafficReporter>,
    stats: StatsAccumulator,
    dropped: u64,
}

impl Analyzer {
    pub fn new(reporter: Arc<dyn TrafficReporter>) -> Self {
        Self {
            dissector: EthernetDissector::new(),
            reporter,
            stats: StatsAccumulator::new(),
            dropped: 0,
        }
    }

    /// Account for one frame.
    pub fn process(&mut self, frame: &Frame) {
        let header = self.dissector.dissect(frame);

        for diagnostic in &header.diagnostics {
            warn!(class = %header.class, len = frame.len(), "{}", diagnostic);
        }

        self.stats.record(header.class, frame.len());
        self.stats.record_payload(header.payload_len());
        self.reporter.trace(&header, frame);
    }

    /// Consume frames until the sending side closes, then hand back the
    /// totals.
    pub fn run<R: Read>(mut self, mut receiver: FrameReceiver<R>) -> StatsTotals {
        loop {
            match receiver.receive() {
                Ok(Some(frame)) => self.process(&frame),
                Ok(None) => break,
                Err(e) if e.is_recoverable() => {
                    self.dropped += 1;
                    warn!("Dropped frame from channel: {}", e);
                }
                Err(e) => {
                    error!("Frame channel failed: {}", e);
                    break;
                }
            }
        }

        let totals = self.stats.snapshot();
        debug!(
            frames = totals.frames(),
            dropped = self.dropped,
            "Analysis stage drained"
        );
        totals
    }

    #[cfg(test)]
    fn snapshot(&self) -> StatsTotals {
        self.stats.snapshot()
    }
}
