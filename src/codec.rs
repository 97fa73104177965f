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

//! Septet codecs
//!
//! MIDI data bytes carry 7 bits, so every wider value in the protocol is
//! spread over several septets. The Axe-Fx II stores its "Fractal" values
//! least significant septet first. The older [`SeptetPair`], still used for
//! preset numbers, stores the most significant septet first. The two must
//! never be mixed up: which one applies is decided by the message type.
//!
//! All decoders expect septets. A byte with its top bit set is a caller bug
//! and panics; the message layer rejects such bytes before they get here.

use std::fmt::Debug;
use std::ops::BitXor;

use num_traits::Zero;

#[inline]
fn septet(byte: u8) -> u8 {
    assert!(byte & 0x80 == 0, "0x{:02X} is not a septet", byte);
    byte
}

/// Two septets forming a 14 bit value, most significant first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeptetPair {
    /// Most significant septet
    pub ms: u8,
    /// Least significant septet
    pub ls: u8,
}

impl SeptetPair {
    /// Largest value a pair can hold.
    pub const MAX: u16 = 0x3FFF;

    /// Creates a pair from raw septets.
    pub fn new(ms: u8, ls: u8) -> Self {
        Self {
            ms: septet(ms),
            ls: septet(ls),
        }
    }

    /// Splits `value` into two septets. Panics if `value` needs more than 14 bits.
    pub fn from_u16(value: u16) -> Self {
        assert!(value <= Self::MAX, "{} does not fit in a septet pair", value);
        Self {
            ms: ((value >> 7) & 0x7F) as u8,
            ls: (value & 0x7F) as u8,
        }
    }

    /// `(ms << 7) | ls`
    pub fn as_u16(&self) -> u16 {
        (u16::from(septet(self.ms)) << 7) | u16::from(septet(self.ls))
    }

    /// Wire bytes, `[ms, ls]`.
    pub fn to_bytes(self) -> [u8; 2] {
        [self.ms, self.ls]
    }
}

/// Decodes one character stored in three septets, `b3 | b2 << 7 | b1 << 14`.
///
/// Returns `None` when the bits don't form a valid code point.
pub fn decode_septet_char(b1: u8, b2: u8, b3: u8) -> Option<char> {
    let code = u32::from(septet(b3)) | (u32::from(septet(b2)) << 7) | (u32::from(septet(b1)) << 14);
    char::from_u32(code)
}

/// Inverse of [`decode_septet_char`].
pub fn encode_septet_char(ch: char) -> [u8; 3] {
    let code = u32::from(ch);
    [
        ((code >> 14) & 0x7F) as u8,
        ((code >> 7) & 0x7F) as u8,
        (code & 0x7F) as u8,
    ]
}

/// Decodes a Fractal16bit triple.
pub fn decode16(b1: u8, b2: u8, b3: u8) -> u16 {
    let (b1, b2, b3) = (septet(b1), septet(b2), septet(b3));
    (u16::from(b3 & 0x03) << 14)
        | (u16::from((b2 & 0x7F) >> 1) << 8)
        | (u16::from(b2 & 0x01) << 7)
        | u16::from(b1 & 0x7F)
}

/// Encodes a 16 bit value as a Fractal16bit triple.
pub fn encode16(value: u16) -> [u8; 3] {
    [
        (value & 0x7F) as u8,
        ((value >> 7) & 0x7F) as u8,
        ((value >> 14) & 0x03) as u8,
    ]
}

/// Decodes a Fractal14bit pair.
pub fn decode14(b1: u8, b2: u8) -> u16 {
    u16::from(septet(b1)) | (u16::from(septet(b2)) << 7)
}

/// Encodes a 14 bit value. Panics if `value` needs more than 14 bits.
pub fn encode14(value: u16) -> [u8; 2] {
    assert!(value <= 0x3FFF, "{} does not fit in 14 bits", value);
    [(value & 0x7F) as u8, ((value >> 7) & 0x7F) as u8]
}

/// Decodes a Fractal28bit quad.
pub fn decode28(bytes: &[u8; 4]) -> u32 {
    bytes
        .iter()
        .enumerate()
        .fold(0, |acc, (i, &b)| acc | (u32::from(septet(b)) << (7 * i)))
}

/// Encodes a 28 bit value. Panics if `value` needs more than 28 bits.
pub fn encode28(value: u32) -> [u8; 4] {
    assert!(value < (1 << 28), "{} does not fit in 28 bits", value);
    let mut out = [0u8; 4];
    for (i, b) in out.iter_mut().enumerate() {
        *b = ((value >> (7 * i)) & 0x7F) as u8;
    }
    out
}

/// Decodes a Fractal32bit quintet.
///
/// Only the low nibble of the fifth septet carries data. The firmware
/// encoder sometimes leaves bits 4-6 set there, so they are ignored.
pub fn decode32(bytes: &[u8; 5]) -> u32 {
    let low = decode28(&[bytes[0], bytes[1], bytes[2], bytes[3]]);
    low | (u32::from(septet(bytes[4]) & 0x0F) << 28)
}

/// Encodes a 32 bit value as a Fractal32bit quintet.
pub fn encode32(value: u32) -> [u8; 5] {
    let low = encode28(value & 0x0FFF_FFFF);
    [low[0], low[1], low[2], low[3], ((value >> 28) & 0x0F) as u8]
}

/// A value type carried in the data blocks of parameter, IR and firmware
/// messages.
pub trait FractalWord: Copy + Default + PartialEq + Debug + Zero + BitXor<Output = Self> {
    /// Encoded size in septets.
    const WIDTH: usize;

    /// Decodes one value. `bytes` must be exactly [`Self::WIDTH`] long.
    fn decode(bytes: &[u8]) -> Self;

    /// Appends the encoded value to `out`.
    fn encode_into(self, out: &mut Vec<u8>);

    /// Widened value, for diagnostics.
    fn widen(self) -> u32;
}

impl FractalWord for u16 {
    const WIDTH: usize = 3;

    fn decode(bytes: &[u8]) -> Self {
        assert_eq!(bytes.len(), Self::WIDTH);
        decode16(bytes[0], bytes[1], bytes[2])
    }

    fn encode_into(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&encode16(self));
    }

    fn widen(self) -> u32 {
        u32::from(self)
    }
}

impl FractalWord for u32 {
    const WIDTH: usize = 5;

    fn decode(bytes: &[u8]) -> Self {
        assert_eq!(bytes.len(), Self::WIDTH);
        decode32(&[bytes[0], bytes[1], bytes[2], bytes[3], bytes[4]])
    }

    fn encode_into(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&encode32(self));
    }

    fn widen(self) -> u32 {
        self
    }
}
