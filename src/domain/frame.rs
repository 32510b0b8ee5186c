//! Captured link-layer frames.

/// Largest frame we keep, in bytes (Ethernet MTU plus header and FCS).
pub const MAX_FRAME_SIZE: usize = 1518;

/// One link-layer frame as delivered by the capture transport.
///
/// The captured length is the length of the byte buffer. Anything past
/// `MAX_FRAME_SIZE` is dropped on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
}

impl Frame {
    /// Copy a captured frame, truncating it to `MAX_FRAME_SIZE`.
    pub fn from_bytes(data: &[u8]) -> Self {
        let len = data.len().min(MAX_FRAME_SIZE);
        Self {
            data: data[..len].to_vec(),
        }
    }

    /// Captured length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl From<Vec<u8>> for Frame {
    fn from(mut data: Vec<u8>) -> Self {
        data.truncate(MAX_FRAME_SIZE);
        Self { data }
    }
}
