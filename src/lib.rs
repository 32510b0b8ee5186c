//! Raw Ethernet frame sniffer.
//!
//! Frames are read from an interface by a capture stage, handed through a
//! length-delimited pipe to an analysis stage that dissects and counts them,
//! and summarized per protocol class when the run ends.

pub mod capture;
pub mod channel;
pub mod cli;
pub mod config;
pub mod controller;
pub mod dissector;
pub mod domain;
pub mod error;
pub mod reporter;
pub mod stats;

pub use capture::{FrameSource, PnetSource};
pub use config::RunConfig;
pub use controller::{RunController, RunOptions, RunReport, ShutdownSignal, StopReason};
pub use domain::{DissectedHeader, Frame, ProtocolClass};
pub use error::{CaptureError, ChannelError, ConfigError, RunError};
pub use reporter::{ConsoleReporter, TraceFilter, TrafficReporter};
pub use stats::{StatsAccumulator, StatsTotals};
