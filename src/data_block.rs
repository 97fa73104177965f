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

//! Accumulation of values spread over consecutive data block messages.

use log::trace;

use crate::codec::FractalWord;
use crate::error::{Result, SysExError};
use crate::message::{encode_data_block, DataBlock, FunctionId};
use crate::sysex::{xor_checksum, SYSEX_END};

/// How one kind of data is chunked on the wire.
#[derive(Debug, PartialEq, Eq)]
pub struct DataLayout {
    /// Function id of the data block messages
    pub function: FunctionId,
    /// Values per message
    pub chunk: usize,
    /// Whether messages may carry fewer than `chunk` values
    pub partial_chunks: bool,
    /// Name used in diagnostics
    pub what: &'static str,
}

/// Preset parameters: 64 Fractal16bit values per message.
pub const PRESET_LAYOUT: DataLayout = DataLayout {
    function: FunctionId::PresetParameters,
    chunk: 0x40,
    partial_chunks: false,
    what: "preset",
};

/// IR data: 128 bytes, i.e. 32 Fractal32bit values, per message.
pub const IR_LAYOUT: DataLayout = DataLayout {
    function: FunctionId::IrData,
    chunk: 128 / std::mem::size_of::<u32>(),
    partial_chunks: false,
    what: "IR",
};

/// Firmware: up to 32 Fractal32bit words per message.
pub const FIRMWARE_LAYOUT: DataLayout = DataLayout {
    function: FunctionId::FirmwareData,
    chunk: 32,
    partial_chunks: true,
    what: "firmware",
};

/// Values collected from a sequence of data block messages.
///
/// The accumulator owns its buffer; dropping it abandons a transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct DataBlocks<W> {
    layout: &'static DataLayout,
    values: Vec<W>,
}

/// Decoded preset parameter blob.
pub type PresetParameters = DataBlocks<u16>;

impl<W: FractalWord> DataBlocks<W> {
    /// An empty accumulator for `layout`.
    pub fn new(layout: &'static DataLayout) -> Self {
        Self {
            layout,
            values: Vec::new(),
        }
    }

    /// An accumulator preloaded with `values`, for serializing.
    pub fn from_values(layout: &'static DataLayout, values: Vec<W>) -> Self {
        Self { layout, values }
    }

    /// How the values are chunked.
    pub fn layout(&self) -> &'static DataLayout {
        self.layout
    }

    /// Decodes the values of `block` and appends them.
    ///
    /// The block is checked first: its function id, its size against the
    /// declared value count, the value count against the chunk size, and the
    /// end marker. Nothing is appended if a check fails.
    pub fn append(&mut self, block: &DataBlock) -> Result<()> {
        let layout = self.layout;
        if block.function() != layout.function {
            return Err(SysExError::Malformed {
                message: layout.function.name(),
                reason: format!("got a {} message instead", block.function().name()),
            });
        }

        let count = block.value_count();
        let expected = DataBlock::expected_len::<W>(count);
        if block.message_len() != expected {
            return Err(SysExError::BadLength {
                message: layout.function.name(),
                expected,
                actual: block.message_len(),
            });
        }

        let count_ok = if layout.partial_chunks {
            count > 0 && count <= layout.chunk
        } else {
            count == layout.chunk
        };
        if !count_ok {
            return Err(SysExError::Malformed {
                message: layout.function.name(),
                reason: format!("{} values in one message, expected {}", count, layout.chunk),
            });
        }

        if block.end_byte() != SYSEX_END {
            return Err(SysExError::Malformed {
                message: layout.function.name(),
                reason: "end marker missing after the last value".to_string(),
            });
        }

        self.values.reserve(count);
        self.values.extend(
            block
                .encoded_values()
                .chunks_exact(W::WIDTH)
                .map(W::decode),
        );
        trace!(
            "{}: appended {} values, {} total",
            layout.what,
            count,
            self.values.len()
        );
        Ok(())
    }

    /// XOR over every accumulated value. This is what the device puts in
    /// the closing checksum message.
    pub fn checksum(&self) -> W {
        xor_checksum(&self.values)
    }

    /// The decoded values.
    pub fn values(&self) -> &[W] {
        &self.values
    }

    /// Mutable access to the decoded values.
    pub fn values_mut(&mut self) -> &mut Vec<W> {
        &mut self.values
    }

    /// Consumes the accumulator, returning its values.
    pub fn into_values(self) -> Vec<W> {
        self.values
    }

    /// Number of values collected.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing was collected yet.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Drops every collected value.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Emits the values as data block messages of `layout.chunk` values
    /// each. A trailing partial chunk goes out as a shorter message.
    pub fn serialize<F: FnMut(&[u8])>(&self, sink: &mut F) {
        for chunk in self.values.chunks(self.layout.chunk) {
            sink(&encode_data_block(self.layout.function, chunk));
        }
    }
}
