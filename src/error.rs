// Copyright 2025 axefx-syx Contributors.
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
// THE SOFTWARE.
//
// See http://creativecommons.org/licenses/MIT/ for more information.

//! Error types shared by every stage of the SysEx pipeline.

/// Local result type alias.
pub type Result<T> = std::result::Result<T, SysExError>;

/// Broad category of a [`SysExError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unterminated or nested start/end markers.
    Framing,
    /// Message checksum or blob checksum mismatch.
    Checksum,
    /// Unrecognized model, blob version, or encoding flag.
    UnsupportedFormat,
    /// Sizes and counts that disagree with the message length or with the
    /// expected message sequence.
    MalformedMessage,
    /// A function id this crate doesn't know about.
    UnknownFunction,
}

/// Everything that can go wrong while decoding or encoding Fractal SysEx.
///
/// None of these are fatal to a whole parse pass; the stream parser records
/// them and carries on with the next message.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SysExError {
    /// A start marker showed up before the open message ended.
    #[error("sysex start at offset {offset} while the message at offset {open} is still open")]
    NestedStart {
        /// Offset of the unfinished message
        open: usize,
        /// Offset of the new start marker
        offset: usize,
    },

    /// The buffer ended inside a message.
    #[error("unterminated sysex message starting at offset {offset}")]
    Unterminated {
        /// Offset of the start marker
        offset: usize,
    },

    /// The message carries another manufacturer's id.
    #[error("not a Fractal Audio sysex message")]
    NotFractal,

    /// The checksum byte of one message is wrong.
    #[error("message checksum mismatch: expected 0x{expected:02X}, found 0x{found:02X}")]
    MessageChecksum {
        /// Checksum of the received bytes
        expected: u8,
        /// Checksum byte in the message
        found: u8,
    },

    /// The XOR over a whole transfer doesn't match its closing message.
    #[error("{what} checksum mismatch: message says 0x{expected:X}, calculated 0x{calculated:X}")]
    DataChecksum {
        /// Kind of transfer
        what: &'static str,
        /// Value of the closing message
        expected: u32,
        /// XOR of the received data
        calculated: u32,
    },

    /// Model byte of another Fractal device.
    #[error("unsupported model id 0x{0:02X}, only the Axe-Fx II is supported")]
    UnsupportedModel(u8),

    /// Preset blob format this crate can't decode.
    #[error("unsupported preset format version 0x{0:04X}")]
    UnsupportedVersion(u16),

    /// Non-zero encoding flag in a preset blob.
    #[error("unsupported preset encoding flag 0x{0:04X}")]
    UnsupportedEncoding(u16),

    /// Function byte not in [`FunctionId`](crate::message::FunctionId).
    #[error("unknown function id 0x{0:02X}")]
    UnknownFunction(u8),

    /// Message size doesn't fit its function.
    #[error("malformed {message} message: expected {expected} bytes, got {actual}")]
    BadLength {
        /// Message kind
        message: &'static str,
        /// Required size, markers included
        expected: usize,
        /// Received size
        actual: usize,
    },

    /// Content that doesn't make sense for the message.
    #[error("malformed {message} message: {reason}")]
    Malformed {
        /// Message kind
        message: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// A message that needs an open transfer arrived without one.
    #[error("{0} message received out of sequence")]
    OutOfSequence(&'static str),

    /// Slot number at or past the last valid id.
    #[error("preset id {0} is out of range")]
    InvalidPresetId(u16),

    /// A transfer was cut short.
    #[error("incomplete {0} at end of buffer")]
    Incomplete(&'static str),

    /// A record doesn't fit in the space left.
    #[error("not enough room: need {needed} values, {available} available")]
    Capacity {
        /// Values the record needs
        needed: usize,
        /// Values left
        available: usize,
    },

    /// Preset name that can't be stored.
    #[error("invalid preset name: {0}")]
    InvalidName(String),
}

impl SysExError {
    /// Which part of the error taxonomy this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SysExError::NestedStart { .. } | SysExError::Unterminated { .. } => ErrorKind::Framing,
            SysExError::MessageChecksum { .. } | SysExError::DataChecksum { .. } => {
                ErrorKind::Checksum
            }
            SysExError::NotFractal
            | SysExError::UnsupportedModel(_)
            | SysExError::UnsupportedVersion(_)
            | SysExError::UnsupportedEncoding(_) => ErrorKind::UnsupportedFormat,
            SysExError::UnknownFunction(_) => ErrorKind::UnknownFunction,
            SysExError::BadLength { .. }
            | SysExError::Malformed { .. }
            | SysExError::OutOfSequence(_)
            | SysExError::InvalidPresetId(_)
            | SysExError::Incomplete(_)
            | SysExError::Capacity { .. }
            | SysExError::InvalidName(_) => ErrorKind::MalformedMessage,
        }
    }
}
