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

//! User cab impulse responses

use crate::data_block::{DataBlocks, IR_LAYOUT};
use crate::error::{Result, SysExError};
use crate::message::{DataBlock, Message, PresetId};

/// Value the device sends in the IR begin message.
pub const IR_BEGIN_UNKNOWN: u8 = 0x10;

/// Data shorter than this holds no name.
const MIN_NAME_WORDS: usize = 8;

/// Name words read at most. Reading stops once the name passes 32
/// characters, so a ninth word still counts.
const MAX_NAME_WORDS: usize = 9;

/// One impulse response transfer: begin, data blocks of 32 words, end.
#[derive(Debug, Clone, PartialEq)]
pub struct IrData {
    id: PresetId,
    unknown: u8,
    data: DataBlocks<u32>,
}

impl IrData {
    /// Starts an empty IR, as announced by an IR begin message.
    pub fn new(id: PresetId, unknown: u8) -> Self {
        Self {
            id,
            unknown,
            data: DataBlocks::new(&IR_LAYOUT),
        }
    }

    /// An IR holding `words`, for serializing.
    pub fn from_words(id: PresetId, words: Vec<u32>) -> Self {
        Self {
            id,
            unknown: IR_BEGIN_UNKNOWN,
            data: DataBlocks::from_values(&IR_LAYOUT, words),
        }
    }

    /// Slot the IR is stored in.
    pub fn id(&self) -> PresetId {
        self.id
    }

    /// Moves the IR to another slot.
    pub fn set_id(&mut self, id: PresetId) {
        self.id = id;
    }

    /// Whether the IR targets the edit buffer.
    pub fn from_edit_buffer(&self) -> bool {
        self.id == PresetId::EditBuffer
    }

    /// IR data in 32 bit words, name included.
    pub fn words(&self) -> &[u32] {
        self.data.values()
    }

    /// The name stored big-endian, four characters per word, in up to nine
    /// leading words ending at a zero word. Empty if the data has fewer than
    /// eight words.
    pub fn name(&self) -> String {
        let words = self.data.values();
        if words.len() < MIN_NAME_WORDS {
            return String::new();
        }
        let name: String = words
            .iter()
            .take(MAX_NAME_WORDS)
            .take_while(|&&w| w != 0)
            .flat_map(|w| w.to_be_bytes())
            .map(char::from)
            .collect();
        name.trim_end_matches('\0').to_string()
    }

    /// Appends one IR data message.
    pub fn append(&mut self, block: &DataBlock) -> Result<()> {
        self.data.append(block)
    }

    /// XOR over every word.
    pub fn checksum(&self) -> u32 {
        self.data.checksum()
    }

    /// Compares the accumulated data with the checksum of the IR end message.
    pub fn verify(&self, expected: u32) -> Result<()> {
        let calculated = self.checksum();
        if calculated != expected {
            return Err(SysExError::DataChecksum {
                what: "IR",
                expected,
                calculated,
            });
        }
        Ok(())
    }

    /// Emits begin, data and end messages.
    pub fn serialize<F: FnMut(&[u8])>(&self, sink: &mut F) -> Result<()> {
        if self.data.is_empty() {
            return Err(SysExError::Incomplete("IR"));
        }
        sink(
            &Message::IrBegin {
                id: self.id,
                unknown: self.unknown,
            }
            .to_bytes(),
        );
        self.data.serialize(sink);
        sink(&Message::IrEnd(self.checksum()).to_bytes());
        Ok(())
    }
}
