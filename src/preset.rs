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

//! Axe-Fx II presets
//!
//! A preset dump is a preset id message, 32 parameter messages of 64 values
//! each and a closing checksum message. The 2048 values form a blob:
//!
//! | offset | values | content                                  |
//! |--------|--------|------------------------------------------|
//! | 0      | 1      | format version, 0x204 (fw 9+) or 0x202   |
//! | 1      | 1      | encoding flag, always 0                  |
//! | 2      | 31     | name, one character per value            |
//! | 33     | 1      | zero                                     |
//! | 34     | 96     | matrix, (block, input mask) column-major |
//! | 130    | ...    | block records until a zero block id      |

use std::ops::Range;

use log::{debug, warn};

use crate::blocks::{BlockParameters, Matrix};
use crate::data_block::{PresetParameters, PRESET_LAYOUT};
use crate::error::{Result, SysExError};
use crate::message::{DataBlock, Message, PresetId};

/// Values in a preset blob
pub const PRESET_BLOB_LEN: usize = 2048;

/// Maximum name length
pub const NAME_LEN: usize = 31;

/// Slot ids below this are valid.
pub const PRESET_ID_LIMIT: u16 = 512;

/// The fourth bank of 128 ids holds global/system settings.
pub const GLOBAL_SETTINGS_IDS: Range<u16> = 384..PRESET_ID_LIMIT;

/// Name given to global settings, which aren't decoded.
pub const GLOBAL_SETTINGS_NAME: &str = "<global settings>";

/// Value the device puts in the second field of the preset id message.
pub const PRESET_ID_UNKNOWN: u16 = 0x10;

/// Blob version written by firmware 9 and later
pub const VERSION_FW9: u16 = 0x204;
/// Blob version of older firmware, with state in the block id high byte
pub const VERSION_LEGACY: u16 = 0x202;

const NAME_OFFSET: usize = 2;
const NAME_END_OFFSET: usize = NAME_OFFSET + NAME_LEN;
const MATRIX_OFFSET: usize = NAME_END_OFFSET + 1;
const BLOCKS_OFFSET: usize = MATRIX_OFFSET + Matrix::VALUE_COUNT;

/// Where a preset is in its parse lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PresetState {
    /// Nothing received
    #[default]
    Empty,
    /// Preset id received
    HasId,
    /// Parameter messages are arriving
    Accumulating,
    /// Complete, ready for use
    Finalized,
}

/// Knobs for [`Preset::finalize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalizeOptions {
    /// Compare the blob checksum with the one in the closing message.
    pub verify_checksum: bool,
    /// Decode name, matrix and blocks. When false the blob is kept as is.
    pub decode: bool,
}

impl Default for FinalizeOptions {
    fn default() -> Self {
        Self {
            verify_checksum: true,
            decode: true,
        }
    }
}

/// An Axe-Fx II preset: name, routing matrix and block parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    state: PresetState,
    id: Option<PresetId>,
    name: String,
    version: u16,
    matrix: Matrix,
    blocks: Vec<BlockParameters>,
    decoded: bool,
    // The blob while parsing. Dropped after decoding, kept for opaque presets.
    params: PresetParameters,
    // Raw name values, kept only when they differ from the space padded
    // encoding of `name`.
    raw_name: Option<Vec<u16>>,
    // Value after the name, normally zero.
    name_end: u16,
    // Everything from the terminating zero block id on, trailing zeros
    // trimmed. Written back after the records.
    tail: Vec<u16>,
    missing_blocks: Vec<u16>,
    unplaced_blocks: Vec<u16>,
}

impl Default for Preset {
    fn default() -> Self {
        Self {
            state: PresetState::Empty,
            id: None,
            name: String::new(),
            version: VERSION_FW9,
            matrix: Matrix::default(),
            blocks: Vec::new(),
            decoded: false,
            params: PresetParameters::new(&PRESET_LAYOUT),
            raw_name: None,
            name_end: 0,
            tail: Vec::new(),
            missing_blocks: Vec::new(),
            unplaced_blocks: Vec::new(),
        }
    }
}

impl Preset {
    /// An empty preset waiting for a preset id message.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty, decoded preset to be filled in programmatically.
    pub fn with_name(id: PresetId, name: &str) -> Result<Self> {
        check_id(id)?;
        let mut preset = Preset {
            state: PresetState::Finalized,
            id: Some(id),
            decoded: true,
            ..Default::default()
        };
        preset.set_name(name)?;
        Ok(preset)
    }

    /// Parse lifecycle state.
    pub fn state(&self) -> PresetState {
        self.state
    }

    /// Slot or edit buffer, `None` before the preset id arrived.
    pub fn id(&self) -> Option<PresetId> {
        self.id
    }

    /// Presets without an id are invalid and never end up in a collection.
    pub fn is_valid(&self) -> bool {
        self.id.is_some()
    }

    /// Whether the id falls in the global settings bank.
    pub fn is_global_setting(&self) -> bool {
        matches!(self.id, Some(PresetId::Slot(n)) if GLOBAL_SETTINGS_IDS.contains(&n))
    }

    /// Whether the preset targets the edit buffer.
    pub fn from_edit_buffer(&self) -> bool {
        self.id == Some(PresetId::EditBuffer)
    }

    /// Retargets the preset at the edit buffer.
    pub fn set_as_edit_buffer(&mut self) {
        assert!(self.is_valid(), "can't retarget an invalid preset");
        self.id = Some(PresetId::EditBuffer);
    }

    /// Moves the preset to another slot.
    pub fn set_id(&mut self, id: PresetId) -> Result<()> {
        check_id(id)?;
        self.id = Some(id);
        Ok(())
    }

    /// Name with trailing padding removed.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames a decoded preset. Names hold up to 31 Latin-1 characters;
    /// trailing spaces are dropped.
    pub fn set_name(&mut self, name: &str) -> Result<()> {
        if !self.decoded {
            return Err(SysExError::InvalidName(format!(
                "can't rename undecoded preset {:?}",
                self.name
            )));
        }
        if name.chars().count() > NAME_LEN {
            return Err(SysExError::InvalidName(format!(
                "{:?} is longer than {} characters",
                name, NAME_LEN
            )));
        }
        if let Some(c) = name.chars().find(|&c| u32::from(c) > 0xFF || c.is_control()) {
            return Err(SysExError::InvalidName(format!("{:?} contains {:?}", name, c)));
        }
        self.name = name.trim_end_matches(' ').to_string();
        self.raw_name = None;
        Ok(())
    }

    /// Blob format version.
    pub fn version(&self) -> u16 {
        self.version
    }

    /// Whether name, matrix and blocks were decoded. Global settings and
    /// presets parsed in verify-only mode stay opaque.
    pub fn is_decoded(&self) -> bool {
        self.decoded
    }

    /// The routing grid.
    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    /// Mutable access to the routing grid.
    pub fn matrix_mut(&mut self) -> &mut Matrix {
        &mut self.matrix
    }

    /// Block and modifier records in blob order.
    pub fn blocks(&self) -> &[BlockParameters] {
        &self.blocks
    }

    /// Mutable access to the block records.
    pub fn blocks_mut(&mut self) -> &mut Vec<BlockParameters> {
        &mut self.blocks
    }

    /// Parameters of effect block `block`, modifiers excluded.
    pub fn lookup_block(&self, block: u16) -> Option<&BlockParameters> {
        self.blocks
            .iter()
            .find(|b| !b.is_modifier() && b.block() == block)
    }

    /// Mutable counterpart of [`Self::lookup_block`].
    pub fn lookup_block_mut(&mut self, block: u16) -> Option<&mut BlockParameters> {
        self.blocks
            .iter_mut()
            .find(|b| !b.is_modifier() && b.block() == block)
    }

    /// Blocks placed in the matrix that have no parameter record.
    pub fn missing_blocks(&self) -> &[u16] {
        &self.missing_blocks
    }

    /// Parameter records for blocks that aren't placed in the matrix.
    pub fn unplaced_blocks(&self) -> &[u16] {
        &self.unplaced_blocks
    }

    /// Undecoded blob of an opaque preset.
    pub fn raw_parameters(&self) -> Option<&PresetParameters> {
        (!self.decoded && self.state == PresetState::Finalized).then_some(&self.params)
    }

    fn reset(&mut self) {
        *self = Preset::default();
    }

    /// Starts a dump. `unknown` is the second field of the id message.
    pub fn set_preset_id(&mut self, id: PresetId, unknown: u16) -> Result<()> {
        if self.state != PresetState::Empty {
            return Err(SysExError::OutOfSequence("preset id"));
        }
        if unknown != PRESET_ID_UNKNOWN {
            warn!("preset {}: unexpected id field 0x{:X}", id, unknown);
        }
        check_id(id)?;
        self.id = Some(id);
        self.state = PresetState::HasId;
        Ok(())
    }

    /// Appends one parameter message. On failure the preset is invalidated.
    pub fn add_parameter_data(&mut self, block: &DataBlock) -> Result<()> {
        if !matches!(self.state, PresetState::HasId | PresetState::Accumulating) {
            return Err(SysExError::OutOfSequence("preset parameters"));
        }
        if let Err(e) = self.params.append(block) {
            self.reset();
            return Err(e);
        }
        if self.params.len() > PRESET_BLOB_LEN {
            self.reset();
            return Err(SysExError::Malformed {
                message: "preset parameters",
                reason: format!("more than {} values", PRESET_BLOB_LEN),
            });
        }
        self.state = PresetState::Accumulating;
        Ok(())
    }

    /// Closes the dump. `checksum` is the value of the closing message, `None`
    /// if it never arrived. On failure the preset is invalidated.
    pub fn finalize(&mut self, checksum: Option<u16>, options: FinalizeOptions) -> Result<()> {
        if self.state != PresetState::Accumulating {
            return Err(SysExError::OutOfSequence("preset checksum"));
        }
        let result = self.try_finalize(checksum, options);
        if result.is_err() {
            self.reset();
        }
        result
    }

    fn try_finalize(&mut self, checksum: Option<u16>, options: FinalizeOptions) -> Result<()> {
        if let (Some(expected), true) = (checksum, options.verify_checksum) {
            let calculated = self.params.checksum();
            if expected != calculated {
                return Err(SysExError::DataChecksum {
                    what: "preset",
                    expected: u32::from(expected),
                    calculated: u32::from(calculated),
                });
            }
        }

        if self.is_global_setting() {
            self.name = GLOBAL_SETTINGS_NAME.to_string();
        } else if options.decode {
            self.decode()?;
        } else {
            let values = self.params.values();
            let end = values.len().min(NAME_OFFSET + NAME_LEN);
            self.name = decode_name(values.get(NAME_OFFSET..end).unwrap_or_default());
        }
        self.state = PresetState::Finalized;

        debug!(
            "preset {}: {:?}, {} blocks{}",
            self.id.map_or_else(|| "?".to_string(), |id| id.to_string()),
            self.name,
            self.blocks.len(),
            if self.decoded { "" } else { " (opaque)" }
        );
        Ok(())
    }

    fn decode(&mut self) -> Result<()> {
        let values = self.params.values();
        if values.len() < BLOCKS_OFFSET {
            return Err(SysExError::Malformed {
                message: "preset parameters",
                reason: format!("{} values, need at least {}", values.len(), BLOCKS_OFFSET),
            });
        }
        let version = values[0];
        if version != VERSION_FW9 && version != VERSION_LEGACY {
            return Err(SysExError::UnsupportedVersion(version));
        }
        if values[1] != 0 {
            return Err(SysExError::UnsupportedEncoding(values[1]));
        }

        let raw_name = &values[NAME_OFFSET..NAME_END_OFFSET];
        let name = decode_name(raw_name);
        let raw_name = (encode_name(&name)[..] != *raw_name).then(|| raw_name.to_vec());
        let name_end = values[NAME_END_OFFSET];
        let matrix = Matrix::decode(&values[MATRIX_OFFSET..]);

        // Records are not necessarily in matrix order.
        let mut blocks = Vec::new();
        let mut pos = BLOCKS_OFFSET;
        while pos < values.len() && values[pos] != 0 {
            let (block, used) = BlockParameters::from_values(&values[pos..])?;
            pos += used;
            blocks.push(block);
        }
        let mut tail = values[pos..].to_vec();
        while tail.last() == Some(&0) {
            tail.pop();
        }

        let mut missing: Vec<u16> = matrix.blocks().collect();
        let mut unplaced = Vec::new();
        for block in blocks.iter().filter(|b| !b.is_modifier()) {
            match missing.iter().position(|&id| id == block.block()) {
                Some(i) => {
                    missing.remove(i);
                }
                None => unplaced.push(block.block()),
            }
        }
        if !missing.is_empty() {
            warn!(
                "preset {:?}: blocks {:?} are in the matrix but have no parameters",
                name, missing
            );
        }
        if !unplaced.is_empty() {
            debug!("preset {:?}: blocks {:?} are not in the matrix", name, unplaced);
        }

        self.version = version;
        self.name = name;
        self.raw_name = raw_name;
        self.name_end = name_end;
        self.tail = tail;
        self.matrix = matrix;
        self.blocks = blocks;
        self.missing_blocks = missing;
        self.unplaced_blocks = unplaced;
        self.decoded = true;
        self.params.clear();
        Ok(())
    }

    /// The 2048 value blob. Opaque presets return their original blob.
    ///
    /// Values the decoder doesn't interpret are written back as read: the
    /// value after the name, and everything from the terminating zero block
    /// id on, which follows the records wherever they end.
    pub fn to_parameters(&self) -> Result<PresetParameters> {
        if !self.decoded {
            return Ok(self.params.clone());
        }

        let mut values = vec![0u16; PRESET_BLOB_LEN];
        values[0] = self.version;
        let name = match &self.raw_name {
            Some(raw) => raw.clone(),
            None => encode_name(&self.name),
        };
        values[NAME_OFFSET..NAME_END_OFFSET].copy_from_slice(&name);
        values[NAME_END_OFFSET] = self.name_end;

        let mut matrix = Vec::with_capacity(Matrix::VALUE_COUNT);
        self.matrix.encode_into(&mut matrix);
        values[MATRIX_OFFSET..BLOCKS_OFFSET].copy_from_slice(&matrix);

        let mut pos = BLOCKS_OFFSET;
        for block in &self.blocks {
            pos += block.write(&mut values[pos..])?;
        }
        if pos + self.tail.len() > PRESET_BLOB_LEN {
            return Err(SysExError::Capacity {
                needed: pos + self.tail.len(),
                available: PRESET_BLOB_LEN,
            });
        }
        values[pos..pos + self.tail.len()].copy_from_slice(&self.tail);
        Ok(PresetParameters::from_values(&PRESET_LAYOUT, values))
    }

    /// Emits the preset as wire messages: id, parameter chunks, checksum.
    pub fn serialize<F: FnMut(&[u8])>(&self, sink: &mut F) -> Result<()> {
        let id = match (self.state, self.id) {
            (PresetState::Finalized, Some(id)) => id,
            _ => return Err(SysExError::Incomplete("preset")),
        };
        let blob = self.to_parameters()?;

        sink(
            &Message::PresetId {
                id,
                unknown: PRESET_ID_UNKNOWN,
            }
            .to_bytes(),
        );
        blob.serialize(sink);
        sink(&Message::PresetChecksum(blob.checksum()).to_bytes());
        Ok(())
    }
}

fn check_id(id: PresetId) -> Result<()> {
    match id {
        PresetId::Slot(n) if n >= PRESET_ID_LIMIT => Err(SysExError::InvalidPresetId(n)),
        _ => Ok(()),
    }
}

fn encode_name(name: &str) -> Vec<u16> {
    let mut chars = name.chars().map(|c| u32::from(c) as u16);
    (0..NAME_LEN)
        .map(|_| chars.next().unwrap_or(u16::from(b' ')))
        .collect()
}

fn decode_name(values: &[u16]) -> String {
    let name: String = values
        .iter()
        .map(|&v| char::from((v & 0xFF) as u8))
        .collect();
    name.trim_end_matches([' ', '\0']).to_string()
}
