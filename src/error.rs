use thiserror::Error;

/// Errors raised by a frame source.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Interface not found: {0}")]
    InterfaceNotFound(String),

    #[error("Insufficient permissions: try running as root or with CAP_NET_RAW")]
    InsufficientPermissions,

    #[error("Failed to create capture channel: {0}")]
    ChannelCreation(String),

    #[error("Capture returned an empty frame")]
    EmptyRead,

    #[error("Error receiving frame: {0}")]
    Receive(#[source] std::io::Error),
}

/// Errors on the length-delimited frame channel.
#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("Short read: expected {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },

    #[error("Frame length {0} exceeds maximum frame size")]
    Oversized(usize),

    #[error("Zero-length frame on channel")]
    EmptyFrame,

    #[error("Receiving stage has gone away")]
    Disconnected,

    #[error("Channel IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChannelError {
    /// Whether the receiver can keep reading after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ShortRead { .. } | Self::Oversized(_) | Self::EmptyFrame
        )
    }
}

/// Errors that prevent a run from starting or finishing.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Failed to open frame channel: {0}")]
    ChannelSetup(#[source] std::io::Error),

    #[error("Failed to start analysis stage: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Analysis stage panicked")]
    AnalysisPanicked,
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}
