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

//! Firmware images
//!
//! Decoding drops the stray bits the device's encoder leaves in the fifth
//! septet of each word, so a re-encoded image checks out but isn't byte for
//! byte identical to the original file.

use crate::data_block::{DataBlocks, FIRMWARE_LAYOUT};
use crate::error::{Result, SysExError};
use crate::message::{DataBlock, Message};

/// Largest word count a firmware begin message can announce.
pub const MAX_FIRMWARE_WORDS: usize = 1 << 28;

/// A firmware image, as 32 bit words.
#[derive(Debug, Clone, PartialEq)]
pub struct FirmwareData {
    expected_words: u32,
    data: DataBlocks<u32>,
}

impl FirmwareData {
    /// Starts a transfer announcing `expected_words` words.
    pub fn new(expected_words: u32) -> Self {
        Self {
            expected_words,
            data: DataBlocks::new(&FIRMWARE_LAYOUT),
        }
    }

    /// An image holding `words`, for serializing.
    pub fn from_words(words: Vec<u32>) -> Self {
        Self {
            expected_words: words.len() as u32,
            data: DataBlocks::from_values(&FIRMWARE_LAYOUT, words),
        }
    }

    /// Word count from the firmware begin message.
    pub fn expected_words(&self) -> u32 {
        self.expected_words
    }

    /// Words received so far.
    pub fn words(&self) -> &[u32] {
        self.data.values()
    }

    /// Number of words received.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether no words arrived yet.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Appends one firmware data message.
    pub fn append(&mut self, block: &DataBlock) -> Result<()> {
        self.data.append(block)
    }

    /// XOR over every word.
    pub fn checksum(&self) -> u32 {
        self.data.checksum()
    }

    /// Checks the word count announced up front and the checksum of the
    /// firmware end message.
    pub fn verify(&self, expected_checksum: u32) -> Result<()> {
        if self.data.len() != self.expected_words as usize {
            return Err(SysExError::Malformed {
                message: "firmware end",
                reason: format!(
                    "expected {} words, got {}",
                    self.expected_words,
                    self.data.len()
                ),
            });
        }
        let calculated = self.checksum();
        if calculated != expected_checksum {
            return Err(SysExError::DataChecksum {
                what: "firmware",
                expected: expected_checksum,
                calculated,
            });
        }
        Ok(())
    }

    /// Emits begin, data (32 words per message) and end messages.
    pub fn serialize<F: FnMut(&[u8])>(&self, sink: &mut F) -> Result<()> {
        if self.data.is_empty() {
            return Err(SysExError::Incomplete("firmware"));
        }
        if self.data.len() >= MAX_FIRMWARE_WORDS {
            return Err(SysExError::Capacity {
                needed: self.data.len(),
                available: MAX_FIRMWARE_WORDS - 1,
            });
        }
        sink(
            &Message::FirmwareBegin {
                word_count: self.data.len() as u32,
            }
            .to_bytes(),
        );
        self.data.serialize(sink);
        sink(&Message::FirmwareEnd(self.checksum()).to_bytes());
        Ok(())
    }
}
