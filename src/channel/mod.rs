//! Length-delimited frame channel between the capture and analysis stages.
//!
//! Each transfer unit is a 4-byte big-endian length followed by exactly that
//! many frame bytes. The live channel runs over an anonymous OS pipe, whose
//! kernel buffer bounds how far capture can run ahead of analysis: once it
//! is full, `send` blocks.

use std::io::{self, ErrorKind, PipeReader, PipeWriter, Read, Write};

use crate::domain::{Frame, MAX_FRAME_SIZE};
use crate::error::ChannelError;

/// Size of the length prefix in bytes.
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Open a pipe-backed channel.
pub fn pipe() -> io::Result<(FrameSender<PipeWriter>, FrameReceiver<PipeReader>)> {
    let (reader, writer) = io::pipe()?;
    Ok((FrameSender::new(writer), FrameReceiver::new(reader)))
}

/// Capture-side half of the channel.
pub struct FrameSender<W: Write> {
    inner: W,
    buf: Vec<u8>,
}

impl<W: Write> FrameSender<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            buf: Vec::with_capacity(LENGTH_PREFIX_LEN + MAX_FRAME_SIZE),
        }
    }

    /// Write one frame. Blocks while the channel is full.
    pub fn send(&mut self, frame: &Frame) -> Result<(), ChannelError> {
        if frame.is_empty() {
            return Err(ChannelError::EmptyFrame);
        }

        // A unit is at most LENGTH_PREFIX_LEN + MAX_FRAME_SIZE bytes, under
        // Linux's 4096-byte PIPE_BUF, so on a pipe it is written atomically.
        // Over any other writer an error other than BrokenPipe may leave a
        // partial unit.
        self.buf.clear();
        self.buf
            .extend_from_slice(&(frame.len() as u32).to_be_bytes());
        self.buf.extend_from_slice(frame.as_bytes());

        match self.inner.write_all(&self.buf) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::BrokenPipe => Err(ChannelError::Disconnected),
            Err(e) => Err(ChannelError::Io(e)),
        }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Analysis-side half of the channel.
pub struct FrameReceiver<R: Read> {
    inner: R,
}

impl<R: Read> FrameReceiver<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Read the next frame.
    ///
    /// Returns `Ok(None)` on a clean end of stream at a unit boundary. A
    /// recoverable error means the current unit was dropped and the caller
    /// may keep reading.
    pub fn receive(&mut self) -> Result<Option<Frame>, ChannelError> {
        let mut prefix = [0u8; LENGTH_PREFIX_LEN];
        let read = read_full(&mut self.inner, &mut prefix)?;
        if read == 0 {
            return Ok(None);
        }
        if read < LENGTH_PREFIX_LEN {
            return Err(ChannelError::ShortRead {
                expected: LENGTH_PREFIX_LEN,
                actual: read,
            });
        }

        let len = u32::from_be_bytes(prefix) as usize;
        if len == 0 {
            return Err(ChannelError::EmptyFrame);
        }
        if len > MAX_FRAME_SIZE {
            // Skip the declared bytes so the next prefix lines up again.
            io::copy(&mut (&mut self.inner).take(len as u64), &mut io::sink())?;
            return Err(ChannelError::Oversized(len));
        }

        let mut data = vec![0u8; len];
        let read = read_full(&mut self.inner, &mut data)?;
        if read < len {
            return Err(ChannelError::ShortRead {
                expected: len,
                actual: read,
            });
        }

        Ok(Some(Frame::from(data)))
    }
}

/// Fill `buf` as far as the reader allows, returning the number of bytes
/// read. Stops early only at end of stream.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
