//! Per-protocol traffic counters.

use crate::domain::ProtocolClass;

/// A point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsTotals {
    per_class: [u64; ProtocolClass::COUNT],
    total: u64,
    frames: u64,
    payload: u64,
}

impl StatsTotals {
    /// Bytes attributed to one class.
    pub fn bytes(&self, class: ProtocolClass) -> u64 {
        self.per_class[class.index()]
    }

    /// Grand total of bytes across all classes.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of frames recorded.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// TCP/UDP payload bytes. Not part of the grand total.
    pub fn payload_bytes(&self) -> u64 {
        self.payload
    }

    /// Classes with a non-zero byte count, in report order.
    pub fn nonzero(&self) -> impl Iterator<Item = (ProtocolClass, u64)> + '_ {
        ProtocolClass::ALL
            .into_iter()
            .map(|class| (class, self.bytes(class)))
            .filter(|(_, bytes)| *bytes > 0)
    }
}

/// Traffic counters owned by the analysis stage.
///
/// Each frame is recorded once, with its full captured length.
#[derive(Debug, Default)]
pub struct StatsAccumulator {
    totals: StatsTotals,
}

impl StatsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attribute one frame of `bytes` captured bytes to `class`.
    pub fn record(&mut self, class: ProtocolClass, bytes: usize) {
        let bytes = bytes as u64;
        let totals = &mut self.totals;
        totals.per_class[class.index()] = totals.per_class[class.index()].saturating_add(bytes);
        totals.total = totals.total.saturating_add(bytes);
        totals.frames += 1;
    }

    /// Add transport payload bytes for the frame just recorded.
    pub fn record_payload(&mut self, bytes: usize) {
        self.totals.payload = self.totals.payload.saturating_add(bytes as u64);
    }

    pub fn snapshot(&self) -> StatsTotals {
        self.totals
    }
}
