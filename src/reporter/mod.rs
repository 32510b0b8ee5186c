//! Reporting module for captured traffic.
//!
//! This module defines the `TrafficReporter` trait and a console
//! implementation. Trace lines are produced on the analysis stage; the
//! summary is produced once, after the analysis stage has drained.

mod console_reporter;

pub use console_reporter::{
    format_start, format_summary, hex_dump, ConsoleReporter, DISPLAY_LINE,
};

use std::time::Duration;

use crate::domain::{DissectedHeader, Frame, ProtocolClass};
use crate::stats::StatsTotals;

/// Sink for per-frame traces and the end-of-run summary.
///
/// Shared between the capture and analysis stages, hence `Sync`. It holds no
/// counters of its own.
pub trait TrafficReporter: Send + Sync {
    /// Called for every dissected frame.
    fn trace(&self, header: &DissectedHeader, frame: &Frame);

    /// Called when capture starts.
    fn on_start(&self, interface: &str, max_duration: Option<Duration>);

    /// Called exactly once per run with the final totals.
    fn summary(&self, totals: &StatsTotals, elapsed: Duration);
}

/// Which protocol classes produce live trace output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraceFilter {
    enabled: [bool; ProtocolClass::COUNT],
}

impl TraceFilter {
    /// Trace nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// Trace every class.
    #[cfg(test)]
    pub fn all() -> Self {
        Self {
            enabled: [true; ProtocolClass::COUNT],
        }
    }

    pub fn with(mut self, class: ProtocolClass) -> Self {
        self.enabled[class.index()] = true;
        self
    }

    pub fn contains(&self, class: ProtocolClass) -> bool {
        self.enabled[class.index()]
    }

    pub fn is_empty(&self) -> bool {
        !self.enabled.iter().any(|e| *e)
    }
}
