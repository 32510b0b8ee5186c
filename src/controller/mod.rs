//! Run controller.
//!
//! Drives one capture run through `Idle → Capturing → Draining →
//! Terminated`. The capture loop runs on the calling thread; the analysis
//! stage runs on its own thread behind a pipe. Every path out of
//! `Capturing` goes through `Draining`, so the summary is reported exactly
//! once.

mod analyzer;
mod window;

pub use analyzer::Analyzer;
pub use window::{Clock, RunWindow, SystemClock};

use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::capture::FrameSource;
use crate::channel::{self, FrameReceiver, FrameSender};
use crate::error::{ChannelError, RunError};
use crate::reporter::TrafficReporter;
use crate::stats::StatsTotals;

/// Pause between capture attempts.
pub const DEFAULT_CAPTURE_PAUSE: Duration = Duration::from_millis(1);

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Capturing,
    Draining,
    Terminated,
}

impl RunState {
    /// The only state this one may move to.
    pub fn successor(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::Capturing),
            Self::Capturing => Some(Self::Draining),
            Self::Draining => Some(Self::Terminated),
            Self::Terminated => None,
        }
    }
}

/// Why the capture loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The configured maximum duration elapsed.
    Deadline,
    /// An interrupt was received.
    Interrupted,
    /// The frame source failed.
    CaptureFailed(String),
    /// The analysis stage stopped reading.
    AnalysisGone,
}

impl StopReason {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::CaptureFailed(_) | Self::AnalysisGone)
    }

    /// Process exit status for a run that stopped this way.
    pub fn exit_code(&self) -> u8 {
        if self.is_failure() {
            1
        } else {
            0
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub totals: StatsTotals,
    pub elapsed: Duration,
    pub frames_sent: u64,
    pub stop_reason: StopReason,
}

/// Cloneable interrupt flag, safe to set from a signal handler.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal(Arc<AtomicBool>);

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Tunables for a run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Stop after this long; `None` runs until interrupted.
    pub max_duration: Option<Duration>,
    /// Sleep between capture attempts.
    pub capture_pause: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_duration: None,
            capture_pause: DEFAULT_CAPTURE_PAUSE,
        }
    }
}

/// Owns the frame source and coordinates both stages of a run.
pub struct RunController<S: FrameSource, C: Clock = SystemClock> {
    source: S,
    clock: C,
    options: RunOptions,
    shutdown: ShutdownSignal,
    state: RunState,
}

impl<S: FrameSource> RunController<S> {
    pub fn new(source: S, options: RunOptions) -> Self {
        Self::with_clock(source, options, SystemClock)
    }
}

impl<S: FrameSource, C: Clock> RunController<S, C> {
    pub fn with_clock(source: S, options: RunOptions, clock: C) -> Self {
        Self {
            source,
            clock,
            options,
            shutdown: ShutdownSignal::new(),
            state: RunState::Idle,
        }
    }

    /// Use an externally created interrupt flag.
    pub fn with_shutdown_signal(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Handle for requesting a graceful stop, e.g. from a Ctrl+C handler.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run until the deadline, an interrupt, or a capture failure, then
    /// drain the analysis stage and report.
    ///
    /// Errors are returned only when the run could not be set up or the
    /// analysis stage died; a failed capture still yields a report.
    pub fn run(self, reporter: Arc<dyn TrafficReporter>) -> Result<RunReport, RunError> {
        let (sender, receiver) = channel::pipe().map_err(RunError::ChannelSetup)?;
        self.run_with_channel(sender, receiver, reporter)
    }

    /// Same as `run`, over a channel the caller has already opened.
    pub fn run_with_channel<W, R>(
        mut self,
        mut sender: FrameSender<W>,
        receiver: FrameReceiver<R>,
        reporter: Arc<dyn TrafficReporter>,
    ) -> Result<RunReport, RunError>
    where
        W: Write,
        R: Read + Send + 'static,
    {
        let analyzer = Analyzer::new(Arc::clone(&reporter));
        let analysis = thread::Builder::new()
            .name("analysis".to_string())
            .spawn(move || analyzer.run(receiver))
            .map_err(RunError::Spawn)?;

        let window = RunWindow::new(self.clock.now(), self.options.max_duration);
        self.advance(RunState::Capturing);
        info!(
            interface = self.source.interface_name(),
            max_duration = ?window.max_duration(),
            "Capture started"
        );
        reporter.on_start(self.source.interface_name(), window.max_duration());

        let (stop_reason, frames_sent) = self.capture_loop(&mut sender, &window);

        self.advance(RunState::Draining);
        // Closing the write side is the analysis stage's cue to drain.
        drop(sender);

        let totals = match analysis.join() {
            Ok(totals) => totals,
            Err(_) => {
                error!("Analysis stage panicked; no statistics to report");
                return Err(RunError::AnalysisPanicked);
            }
        };
        let elapsed = window.elapsed(self.clock.now());

        reporter.summary(&totals, elapsed);
        self.advance(RunState::Terminated);
        info!(
            reason = ?stop_reason,
            frames_sent,
            frames_analyzed = totals.frames(),
            "Capture finished"
        );
        drop(self.source);

        Ok(RunReport {
            totals,
            elapsed,
            frames_sent,
            stop_reason,
        })
    }

    fn capture_loop<W: Write>(
        &mut self,
        sender: &mut FrameSender<W>,
        window: &RunWindow,
    ) -> (StopReason, u64) {
        let mut frames_sent = 0u64;

        let reason = loop {
            if self.shutdown.is_triggered() {
                info!("Received interrupt, stopping capture");
                break StopReason::Interrupted;
            }
            if window.is_expired(self.clock.now()) {
                debug!("Run window elapsed");
                break StopReason::Deadline;
            }

            match self.source.capture() {
                Ok(Some(frame)) => match sender.send(&frame) {
                    Ok(()) => frames_sent += 1,
                    Err(ChannelError::Disconnected) => {
                        error!("Analysis stage stopped reading frames");
                        break StopReason::AnalysisGone;
                    }
                    Err(e) => warn!("Failed to forward frame: {}", e),
                },
                Ok(None) => {}
                Err(e) => {
                    error!("{}", e);
                    break StopReason::CaptureFailed(e.to_string());
                }
            }

            if !self.options.capture_pause.is_zero() {
                thread::sleep(self.options.capture_pause);
            }
        };

        (reason, frames_sent)
    }

    fn advance(&mut self, next: RunState) {
        debug_assert_eq!(self.state.successor(), Some(next));
        debug!(from = ?self.state, to = ?next, "Run state change");
        self.state = next;
    }
}
