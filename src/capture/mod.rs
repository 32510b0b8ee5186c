//! Frame capture abstraction.
//!
//! This module defines the `FrameSource` trait and provides a pnet-based
//! implementation. The run controller only depends on the trait, so tests
//! can drive it with scripted frames.

mod pnet_capture;

pub use pnet_capture::PnetSource;

use crate::domain::Frame;
use crate::error::CaptureError;

/// A blocking source of raw link-layer frames.
pub trait FrameSource: Send {
    /// Wait for the next frame.
    ///
    /// Returns `Ok(None)` when the source's read timeout elapsed with no
    /// traffic, so the caller gets a chance to check for shutdown. Any
    /// error is fatal for the current run.
    fn capture(&mut self) -> Result<Option<Frame>, CaptureError>;

    /// Name of the interface being captured.
    fn interface_name(&self) -> &str;
}
