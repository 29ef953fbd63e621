//! Unsigned varint length prefixes and the incremental frame cursor.
//!
//! Every frame on the wire is `uvarint(len) ++ len bytes of envelope`.
//! Frames arrive split across arbitrary TCP reads, so [`FrameBuffer`]
//! accumulates chunks and yields complete frames only; it never reads past
//! the bytes it has been given.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VarintError {
    #[error("length prefix exceeds 64 bits")]
    Overflow,
    #[error("frame length {0} exceeds the {MAX_FRAME_LEN} byte cap")]
    FrameTooLarge(u64),
}

/// Upper bound on a single frame. The protocol never ships anything close to
/// this; a larger prefix means the stream is corrupt.
pub const MAX_FRAME_LEN: u64 = 16 * 1024 * 1024;

/// Appends `value` to `out` in LEB128 form, low group first.
pub fn encode_uvarint(mut value: u64, out: &mut Vec<u8>) {
    while value >= 0x80 {
        out.push(value as u8 | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Decodes a uvarint from the front of `data`.
///
/// `Ok(Some((value, consumed)))` on success, `Ok(None)` when `data` ends in
/// the middle of the varint.
pub fn decode_uvarint(data: &[u8]) -> Result<Option<(u64, usize)>, VarintError> {
    let mut value = 0u64;
    let mut shift = 0u32;
    for (index, byte) in data.iter().enumerate() {
        if shift >= 64 {
            return Err(VarintError::Overflow);
        }
        value |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Ok(Some((value, index + 1)));
        }
        shift += 7;
    }
    Ok(None)
}

/// Wraps an envelope payload into a complete frame.
pub fn frame(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 4);
    encode_uvarint(payload.len() as u64, &mut out);
    out.extend_from_slice(payload);
    out
}

/// Receive-side frame cursor. Feed it raw chunks with [`FrameBuffer::extend`]
/// and drain complete frames with [`FrameBuffer::next_frame`]; partial frames
/// stay buffered until the missing bytes arrive.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    buf: Vec<u8>,
    cursor: usize,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Number of buffered bytes not yet consumed.
    pub fn pending(&self) -> usize {
        self.buf.len() - self.cursor
    }

    /// Returns the next complete envelope payload, or `None` when the buffer
    /// holds less than one full frame. Consumed bytes are compacted away so
    /// the buffer does not grow without bound.
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>, VarintError> {
        let remaining = &self.buf[self.cursor..];
        let (len, prefix_len) = match decode_uvarint(remaining)? {
            Some(decoded) => decoded,
            None => {
                self.compact();
                return Ok(None);
            }
        };
        if len > MAX_FRAME_LEN {
            return Err(VarintError::FrameTooLarge(len));
        }
        let len = len as usize;
        if remaining.len() < prefix_len + len {
            self.compact();
            return Ok(None);
        }
        let payload = remaining[prefix_len..prefix_len + len].to_vec();
        self.cursor += prefix_len + len;
        Ok(Some(payload))
    }

    fn compact(&mut self) {
        if self.cursor > 0 {
            self.buf.drain(..self.cursor);
            self.cursor = 0;
        }
    }
}
