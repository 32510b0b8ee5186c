//! Per-frame dissection results.
//!
//! A `DissectedHeader` never owns frame bytes. Payloads are described by a
//! `PayloadSpan` into the frame they were dissected from.

use std::net::Ipv4Addr;

use macaddr::MacAddr6;

use super::{Frame, ProtocolClass};

/// Header layer a diagnostic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Link,
    Network,
    Transport,
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Link => write!(f, "link"),
            Self::Network => write!(f, "network"),
            Self::Transport => write!(f, "transport"),
        }
    }
}

/// A non-fatal inconsistency found while dissecting a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnostic {
    /// The IP header's total length disagrees with what was captured.
    LengthMismatch { declared: i64, captured: i64 },
    /// A header length field is below the minimum or points past the
    /// captured bytes.
    HeaderOverrun {
        layer: Layer,
        header_len: usize,
        available: usize,
    },
    /// Not enough bytes for the fixed part of a header.
    Truncated {
        layer: Layer,
        needed: usize,
        available: usize,
    },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LengthMismatch { declared, captured } => write!(
                f,
                "packet lied about its size, {} != {} ... corrupt?",
                captured, declared
            ),
            Self::HeaderOverrun {
                layer,
                header_len,
                available,
            } => write!(
                f,
                "{} header length {} invalid for {} captured bytes",
                layer, header_len, available
            ),
            Self::Truncated {
                layer,
                needed,
                available,
            } => write!(
                f,
                "{} header truncated: need {} bytes, have {}",
                layer, needed, available
            ),
        }
    }
}

/// Offset and length of a payload inside its frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PayloadSpan {
    pub offset: usize,
    pub len: usize,
}

impl PayloadSpan {
    pub fn empty_at(offset: usize) -> Self {
        Self { offset, len: 0 }
    }
}

/// IPv4 addressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Endpoints {
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
}

/// TCP/UDP ports and payload location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportInfo {
    pub source_port: u16,
    pub destination_port: u16,
    pub payload: PayloadSpan,
}

/// Structural view of one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DissectedHeader {
    pub source_mac: MacAddr6,
    pub destination_mac: MacAddr6,
    /// Encapsulated protocol tag; zero when the link header was truncated.
    pub ethertype: u16,
    pub class: ProtocolClass,
    /// IP version nibble, when the ethertype is IPv4.
    pub ip_version: Option<u8>,
    pub ipv4: Option<Ipv4Endpoints>,
    pub transport: Option<TransportInfo>,
    pub diagnostics: Vec<Diagnostic>,
}

impl DissectedHeader {
    /// A header that only knows its link layer.
    pub fn link_only(
        source_mac: MacAddr6,
        destination_mac: MacAddr6,
        ethertype: u16,
        class: ProtocolClass,
    ) -> Self {
        Self {
            source_mac,
            destination_mac,
            ethertype,
            class,
            ip_version: None,
            ipv4: None,
            transport: None,
            diagnostics: Vec::new(),
        }
    }

    /// Length of the TCP/UDP payload, zero for everything else.
    pub fn payload_len(&self) -> usize {
        self.transport.map(|t| t.payload.len).unwrap_or(0)
    }

    /// Borrow the transport payload out of the frame this header came from.
    ///
    /// Returns an empty slice when there is no payload or the span does not
    /// fit the given frame.
    pub fn payload<'a>(&self, frame: &'a Frame) -> &'a [u8] {
        let Some(transport) = self.transport else {
            return &[];
        };
        let span = transport.payload;
        span.offset
            .checked_add(span.len)
            .and_then(|end| frame.as_bytes().get(span.offset..end))
            .unwrap_or(&[])
    }

    #[cfg(test)]
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}
