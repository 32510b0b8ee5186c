//! Domain models for frame capture and dissection.
//!
//! These types are independent of the capture backend and of how frames
//! travel between stages.

mod frame;
mod header;
mod protocol;

pub use frame::{Frame, MAX_FRAME_SIZE};
pub use header::{
    Diagnostic, DissectedHeader, Ipv4Endpoints, Layer, PayloadSpan, TransportInfo,
};
pub use protocol::{ip_protocols, ProtocolClass};
