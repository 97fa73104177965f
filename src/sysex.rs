//! Checksums and framing for Fractal Audio SysEx streams.

use std::ops::BitXor;

use num_traits::Zero;

use crate::error::{Result, SysExError};

/// SysEx start marker
pub const SYSEX_START: u8 = 0xF0;
/// SysEx end marker
pub const SYSEX_END: u8 = 0xF7;
/// Fractal Audio's extended manufacturer id
pub const FRACTAL_ID: [u8; 3] = [0x00, 0x01, 0x74];
/// Checksum + end marker
pub const TERMINATION_LEN: usize = 2;
/// Start marker, manufacturer id, model id and function id
pub const HEADER_LEN: usize = 1 + FRACTAL_ID.len() + 2;

/// XOR of every value in `values`. Used to checksum parameter, IR and
/// firmware data after decoding.
pub fn xor_checksum<T>(values: &[T]) -> T
where
    T: Copy + Zero + BitXor<Output = T>,
{
    values.iter().fold(T::zero(), |acc, &v| acc ^ v)
}

/// Checksum byte for a complete message: XOR of everything before the
/// checksum position, masked to 7 bits.
pub fn message_checksum(msg: &[u8]) -> u8 {
    let end = msg.len().saturating_sub(TERMINATION_LEN);
    xor_checksum(&msg[..end]) & 0x7F
}

/// True iff `msg` is framed by start/end markers and carries a correct
/// checksum in its second to last byte.
pub fn verify_checksum(msg: &[u8]) -> bool {
    msg.len() >= 3
        && msg[0] == SYSEX_START
        && msg[msg.len() - 1] == SYSEX_END
        && msg[msg.len() - 2] == message_checksum(msg)
}

/// True iff `msg` carries the Fractal manufacturer id. Does not look at the
/// checksum, which makes it the cheap check for filtering tempo heartbeats.
pub fn is_vendor_message(msg: &[u8]) -> bool {
    msg.len() >= FRACTAL_ID.len() + TERMINATION_LEN && msg[1..].starts_with(&FRACTAL_ID)
}

/// Vendor id and checksum both check out.
pub fn is_fractal_sysex(msg: &[u8]) -> bool {
    is_vendor_message(msg) && verify_checksum(msg)
}

/// Wraps `payload` into a complete message: start marker, manufacturer id,
/// model, function, payload, checksum, end marker.
pub fn build_message(model: u8, function: u8, payload: &[u8]) -> Vec<u8> {
    let mut msg = Vec::with_capacity(HEADER_LEN + payload.len() + TERMINATION_LEN);
    msg.push(SYSEX_START);
    msg.extend_from_slice(&FRACTAL_ID);
    msg.push(model);
    msg.push(function);
    msg.extend_from_slice(payload);
    seal(&mut msg);
    msg
}

/// Appends checksum and end marker to a message under construction.
pub fn seal(msg: &mut Vec<u8>) {
    let checksum = xor_checksum(&msg[..]) & 0x7F;
    msg.push(checksum);
    msg.push(SYSEX_END);
}

/// One start-to-end delimited message found in a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    /// Offset of the start marker in the scanned buffer
    pub offset: usize,
    /// The message, both markers included
    pub bytes: &'a [u8],
}

/// Splits a byte buffer into SysEx messages.
///
/// Bytes outside of a message are skipped. A start marker inside an open
/// message yields [`SysExError::NestedStart`] and the scan resynchronizes on
/// the new start marker. An open message at the end of the buffer yields
/// [`SysExError::Unterminated`] and ends the iteration.
pub struct Frames<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Frames<'a> {
    /// A scanner over `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl<'a> Iterator for Frames<'a> {
    type Item = Result<Frame<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        let data = self.data;

        // Find SYSEX start
        let start = self.pos + data.get(self.pos..)?.iter().position(|&b| b == SYSEX_START)?;

        // Find SYSEX end, watching out for a restart
        let mut pos = start + 1;
        while pos < data.len() {
            match data[pos] {
                SYSEX_END => {
                    self.pos = pos + 1;
                    return Some(Ok(Frame {
                        offset: start,
                        bytes: &data[start..=pos],
                    }));
                }
                SYSEX_START => {
                    self.pos = pos;
                    return Some(Err(SysExError::NestedStart {
                        open: start,
                        offset: pos,
                    }));
                }
                _ => pos += 1,
            }
        }

        self.pos = data.len();
        Some(Err(SysExError::Unterminated { offset: start }))
    }
}
