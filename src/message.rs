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

//! Axe-Fx II message types
//!
//! Every message starts with `F0 00 01 74 <model> <function>` and ends with
//! `<checksum> F7`. What sits in between depends on the function id.
//! [`Message::parse`] reads the common prefix and then hands the rest to a
//! decoder for that function.

use std::fmt;

use serde::Serialize;

use crate::codec::{self, FractalWord, SeptetPair};
use crate::error::{Result, SysExError};
use crate::sysex::{self, HEADER_LEN, TERMINATION_LEN};

/// Model id of the Axe-Fx II, the only model whose presets are decoded.
pub const AXE_FX_II: u8 = 0x03;

/// Size of the value count field that opens every data block payload.
pub const DATA_BLOCK_COUNT_LEN: usize = 2;

/// Known Fractal Audio devices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Model {
    /// The original Axe-Fx
    Standard = 0x01,
    /// Axe-Fx Ultra
    Ultra = 0x02,
    /// Axe-Fx II
    AxeFx2 = AXE_FX_II,
}

impl Model {
    /// Model for a model byte, `None` for unknown devices.
    pub fn from_u8(id: u8) -> Option<Self> {
        match id {
            0x01 => Some(Model::Standard),
            0x02 => Some(Model::Ultra),
            AXE_FX_II => Some(Model::AxeFx2),
            _ => None,
        }
    }
}

/// Function ids, found in the sixth byte of every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FunctionId {
    /// Ask for a preset dump. Send the edit buffer id to get the current preset.
    RequestPresetDump = 0x03,
    /// Tuner readout
    TunerData = 0x0D,
    /// Current preset name
    PresetName = 0x0F,
    /// Sent once per beat
    TempoHeartbeat = 0x10,
    /// Select a preset
    PresetChange = 0x14,
    /// Ask for a bank or the system settings
    BankDumpRequest = 0x1C,
    /// Notification only.
    ParameterChanged = 0x21,
    /// Switch the device to its firmware update page.
    FirmwareUpdate = 0x25,
    /// Answer to a request
    Reply = 0x64,
    /// Opens a preset dump
    PresetId = 0x77,
    /// Chunk of preset values
    PresetParameters = 0x78,
    /// Closes a preset dump
    PresetChecksum = 0x79,
    /// Opens an IR transfer
    IrBegin = 0x7A,
    /// Chunk of IR words
    IrData = 0x7B,
    /// Closes an IR transfer
    IrEnd = 0x7C,
    /// Opens a firmware transfer
    FirmwareBegin = 0x7D,
    /// Chunk of firmware words
    FirmwareData = 0x7E,
    /// Closes a firmware transfer
    FirmwareEnd = 0x7F,
}

impl FunctionId {
    /// Function for a function byte, `None` if unknown.
    pub fn from_u8(id: u8) -> Option<Self> {
        use FunctionId::*;
        let function = match id {
            0x03 => RequestPresetDump,
            0x0D => TunerData,
            0x0F => PresetName,
            0x10 => TempoHeartbeat,
            0x14 => PresetChange,
            0x1C => BankDumpRequest,
            0x21 => ParameterChanged,
            0x25 => FirmwareUpdate,
            0x64 => Reply,
            0x77 => PresetId,
            0x78 => PresetParameters,
            0x79 => PresetChecksum,
            0x7A => IrBegin,
            0x7B => IrData,
            0x7C => IrEnd,
            0x7D => FirmwareBegin,
            0x7E => FirmwareData,
            0x7F => FirmwareEnd,
            _ => return None,
        };
        Some(function)
    }

    /// Human readable name, used in diagnostics.
    pub fn name(self) -> &'static str {
        use FunctionId::*;
        match self {
            RequestPresetDump => "preset dump request",
            TunerData => "tuner data",
            PresetName => "preset name",
            TempoHeartbeat => "tempo heartbeat",
            PresetChange => "preset change",
            BankDumpRequest => "bank dump request",
            ParameterChanged => "parameter changed",
            FirmwareUpdate => "firmware update",
            Reply => "reply",
            PresetId => "preset id",
            PresetParameters => "preset parameters",
            PresetChecksum => "preset checksum",
            IrBegin => "IR begin",
            IrData => "IR data",
            IrEnd => "IR end",
            FirmwareBegin => "firmware begin",
            FirmwareData => "firmware data",
            FirmwareEnd => "firmware end",
        }
    }
}

/// Where a preset (or IR) lives: a numbered slot or the edit buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetId {
    /// Stored preset number
    Slot(u16),
    /// The preset being edited
    EditBuffer,
}

impl PresetId {
    /// Septets that address the edit buffer, `7F 00`.
    pub const EDIT_BUFFER_PAIR: SeptetPair = SeptetPair { ms: 0x7F, ls: 0x00 };

    /// Maps the wire pair to an id. `7F 00` is the edit buffer, not slot 16256.
    pub fn from_pair(pair: SeptetPair) -> Self {
        if pair == Self::EDIT_BUFFER_PAIR {
            PresetId::EditBuffer
        } else {
            PresetId::Slot(pair.as_u16())
        }
    }

    /// Wire form of the id.
    pub fn to_pair(self) -> SeptetPair {
        match self {
            PresetId::Slot(id) => SeptetPair::from_u16(id),
            PresetId::EditBuffer => Self::EDIT_BUFFER_PAIR,
        }
    }

    /// Slot number, `None` for the edit buffer.
    pub fn slot(self) -> Option<u16> {
        match self {
            PresetId::Slot(id) => Some(id),
            PresetId::EditBuffer => None,
        }
    }
}

impl fmt::Display for PresetId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PresetId::Slot(id) => write!(f, "{}", id),
            PresetId::EditBuffer => write!(f, "edit buffer"),
        }
    }
}

/// Banks addressable by a bank dump request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Bank {
    /// Bank A, presets 0-127
    A = 0,
    /// Bank B, presets 128-255
    B = 1,
    /// Bank C, presets 256-383
    C = 2,
    /// Global settings
    System = 3,
}

/// A parameter, IR or firmware data chunk, still encoded.
///
/// Payload layout: `<count field: 2 bytes> <count × encoded value>`.
/// Parameter and IR blocks use a count byte followed by a reserved zero
/// byte; firmware blocks use a Fractal14bit count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataBlock<'a> {
    function: FunctionId,
    value_count: usize,
    raw: &'a [u8],
}

impl<'a> DataBlock<'a> {
    /// Function id of the message the block came in.
    pub fn function(&self) -> FunctionId {
        self.function
    }

    /// Number of values the header claims to carry.
    pub fn value_count(&self) -> usize {
        self.value_count
    }

    /// Size of the whole message, markers included.
    pub fn message_len(&self) -> usize {
        self.raw.len()
    }

    /// Last byte of the message.
    pub fn end_byte(&self) -> u8 {
        self.raw[self.raw.len() - 1]
    }

    /// The encoded values, without count field and termination.
    pub fn encoded_values(&self) -> &'a [u8] {
        &self.raw[HEADER_LEN + DATA_BLOCK_COUNT_LEN..self.raw.len() - TERMINATION_LEN]
    }

    /// Message size a block declaring `value_count` values of `W` must have.
    pub fn expected_len<W: FractalWord>(value_count: usize) -> usize {
        HEADER_LEN + DATA_BLOCK_COUNT_LEN + value_count * W::WIDTH + TERMINATION_LEN
    }

    /// The whole message.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.raw
    }
}

/// Builds a complete data block message for `values`.
pub fn encode_data_block<W: FractalWord>(function: FunctionId, values: &[W]) -> Vec<u8> {
    let mut msg = Vec::with_capacity(DataBlock::expected_len::<W>(values.len()));
    msg.push(sysex::SYSEX_START);
    msg.extend_from_slice(&sysex::FRACTAL_ID);
    msg.push(AXE_FX_II);
    msg.push(function as u8);
    match function {
        FunctionId::FirmwareData => msg.extend_from_slice(&codec::encode14(values.len() as u16)),
        _ => {
            assert!(values.len() < 0x80, "{} values don't fit in a count byte", values.len());
            msg.push(values.len() as u8);
            msg.push(0);
        }
    }
    for &value in values {
        value.encode_into(&mut msg);
    }
    sysex::seal(&mut msg);
    msg
}

/// A decoded message. Variants hold the fields valid for their function id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message<'a> {
    /// Opens a preset dump. `unknown` is always 0x10 in the wild.
    PresetId {
        /// Target slot
        id: PresetId,
        /// Second field, see [`PRESET_ID_UNKNOWN`](crate::preset::PRESET_ID_UNKNOWN)
        unknown: u16,
    },
    /// Chunk of the preset blob
    PresetParameters(DataBlock<'a>),
    /// Closes a preset dump with the XOR of all parameter values.
    PresetChecksum(u16),
    /// Opens an IR transfer
    IrBegin {
        /// Target slot
        id: PresetId,
        /// Trailing byte, 0x10 from the device
        unknown: u8,
    },
    /// Chunk of IR data
    IrData(DataBlock<'a>),
    /// Closes an IR transfer with the XOR of all words
    IrEnd(u32),
    /// Opens a firmware transfer
    FirmwareBegin {
        /// Number of words to follow
        word_count: u32,
    },
    /// Chunk of firmware
    FirmwareData(DataBlock<'a>),
    /// Closes a firmware transfer with the XOR of all words
    FirmwareEnd(u32),
    /// Ask for a preset dump
    PresetDumpRequest(PresetId),
    /// Select a preset
    PresetChange(PresetId),
    /// Ask for a bank dump, see [`Bank`]
    BankDumpRequest(u8),
    /// `error_id` 0 means success.
    Reply {
        /// Function being answered
        reply_to: u8,
        /// Error code
        error_id: u8,
    },
    /// Control message without payload: tempo heartbeat, firmware update
    /// mode and the like.
    GenericNoData(FunctionId),
    /// Known function whose payload isn't interpreted.
    Other {
        /// Function id
        function: FunctionId,
        /// Bytes between header and checksum
        payload: &'a [u8],
    },
}

fn fixed<'a>(function: FunctionId, payload: &'a [u8], len: usize) -> Result<&'a [u8]> {
    if payload.len() != len {
        return Err(SysExError::BadLength {
            message: function.name(),
            expected: HEADER_LEN + len + TERMINATION_LEN,
            actual: HEADER_LEN + payload.len() + TERMINATION_LEN,
        });
    }
    Ok(payload)
}

impl<'a> Message<'a> {
    /// Classifies one framed message.
    ///
    /// Checks run in this order: framing markers, vendor id, checksum,
    /// septet cleanliness, model id, function id, payload size.
    pub fn parse(msg: &'a [u8]) -> Result<Self> {
        if msg.len() < 3 || msg[0] != sysex::SYSEX_START || msg[msg.len() - 1] != sysex::SYSEX_END {
            return Err(SysExError::Malformed {
                message: "sysex",
                reason: "missing start or end marker".to_string(),
            });
        }
        if !sysex::is_vendor_message(msg) {
            return Err(SysExError::NotFractal);
        }
        let expected = sysex::message_checksum(msg);
        let found = msg[msg.len() - TERMINATION_LEN];
        if expected != found {
            return Err(SysExError::MessageChecksum { expected, found });
        }
        if let Some(pos) = msg[1..msg.len() - 1].iter().position(|b| b & 0x80 != 0) {
            return Err(SysExError::Malformed {
                message: "sysex",
                reason: format!("data byte 0x{:02X} at offset {}", msg[pos + 1], pos + 1),
            });
        }
        if msg.len() < HEADER_LEN + TERMINATION_LEN {
            return Err(SysExError::BadLength {
                message: "sysex",
                expected: HEADER_LEN + TERMINATION_LEN,
                actual: msg.len(),
            });
        }

        let model = msg[4];
        if model != AXE_FX_II {
            return Err(SysExError::UnsupportedModel(model));
        }
        let function = FunctionId::from_u8(msg[5]).ok_or(SysExError::UnknownFunction(msg[5]))?;
        let payload = &msg[HEADER_LEN..msg.len() - TERMINATION_LEN];

        use FunctionId as F;
        let message = match function {
            F::PresetId => {
                let p = fixed(function, payload, 4)?;
                Message::PresetId {
                    id: PresetId::from_pair(SeptetPair::new(p[0], p[1])),
                    unknown: SeptetPair::new(p[2], p[3]).as_u16(),
                }
            }
            F::PresetChecksum => {
                let p = fixed(function, payload, 3)?;
                Message::PresetChecksum(codec::decode16(p[0], p[1], p[2]))
            }
            F::IrBegin => {
                let p = fixed(function, payload, 3)?;
                Message::IrBegin {
                    id: PresetId::from_pair(SeptetPair::new(p[0], p[1])),
                    unknown: p[2],
                }
            }
            F::IrEnd | F::FirmwareEnd => {
                let p = fixed(function, payload, 5)?;
                let sum = codec::decode32(&[p[0], p[1], p[2], p[3], p[4]]);
                if function == F::IrEnd {
                    Message::IrEnd(sum)
                } else {
                    Message::FirmwareEnd(sum)
                }
            }
            F::FirmwareBegin => {
                let p = fixed(function, payload, 4)?;
                Message::FirmwareBegin {
                    word_count: codec::decode28(&[p[0], p[1], p[2], p[3]]),
                }
            }
            F::PresetParameters | F::IrData | F::FirmwareData => {
                if payload.len() < DATA_BLOCK_COUNT_LEN {
                    return Err(SysExError::BadLength {
                        message: function.name(),
                        expected: HEADER_LEN + DATA_BLOCK_COUNT_LEN + TERMINATION_LEN,
                        actual: msg.len(),
                    });
                }
                let value_count = match function {
                    F::FirmwareData => usize::from(codec::decode14(payload[0], payload[1])),
                    _ => usize::from(payload[0]),
                };
                let block = DataBlock {
                    function,
                    value_count,
                    raw: msg,
                };
                match function {
                    F::PresetParameters => Message::PresetParameters(block),
                    F::IrData => Message::IrData(block),
                    _ => Message::FirmwareData(block),
                }
            }
            F::RequestPresetDump | F::PresetChange => {
                let p = fixed(function, payload, 2)?;
                let id = PresetId::from_pair(SeptetPair::new(p[0], p[1]));
                if function == F::PresetChange {
                    Message::PresetChange(id)
                } else {
                    Message::PresetDumpRequest(id)
                }
            }
            F::BankDumpRequest => Message::BankDumpRequest(fixed(function, payload, 1)?[0]),
            F::Reply => {
                let p = fixed(function, payload, 2)?;
                Message::Reply {
                    reply_to: p[0],
                    error_id: p[1],
                }
            }
            F::TunerData
            | F::PresetName
            | F::TempoHeartbeat
            | F::ParameterChanged
            | F::FirmwareUpdate => {
                if payload.is_empty() {
                    Message::GenericNoData(function)
                } else {
                    Message::Other { function, payload }
                }
            }
        };
        Ok(message)
    }

    /// Function id of this message.
    pub fn function(&self) -> FunctionId {
        match self {
            Message::PresetId { .. } => FunctionId::PresetId,
            Message::PresetParameters(_) => FunctionId::PresetParameters,
            Message::PresetChecksum(_) => FunctionId::PresetChecksum,
            Message::IrBegin { .. } => FunctionId::IrBegin,
            Message::IrData(_) => FunctionId::IrData,
            Message::IrEnd(_) => FunctionId::IrEnd,
            Message::FirmwareBegin { .. } => FunctionId::FirmwareBegin,
            Message::FirmwareData(_) => FunctionId::FirmwareData,
            Message::FirmwareEnd(_) => FunctionId::FirmwareEnd,
            Message::PresetDumpRequest(_) => FunctionId::RequestPresetDump,
            Message::PresetChange(_) => FunctionId::PresetChange,
            Message::BankDumpRequest(_) => FunctionId::BankDumpRequest,
            Message::Reply { .. } => FunctionId::Reply,
            Message::GenericNoData(function) => *function,
            Message::Other { function, .. } => *function,
        }
    }

    /// Re-encodes the message for the Axe-Fx II.
    pub fn to_bytes(&self) -> Vec<u8> {
        let payload: Vec<u8> = match *self {
            Message::PresetParameters(block)
            | Message::IrData(block)
            | Message::FirmwareData(block) => return block.raw.to_vec(),
            Message::PresetId { id, unknown } => {
                let mut p = id.to_pair().to_bytes().to_vec();
                p.extend_from_slice(&SeptetPair::from_u16(unknown).to_bytes());
                p
            }
            Message::PresetChecksum(sum) => codec::encode16(sum).to_vec(),
            Message::IrBegin { id, unknown } => {
                let mut p = id.to_pair().to_bytes().to_vec();
                p.push(unknown);
                p
            }
            Message::IrEnd(sum) | Message::FirmwareEnd(sum) => codec::encode32(sum).to_vec(),
            Message::FirmwareBegin { word_count } => codec::encode28(word_count).to_vec(),
            Message::PresetDumpRequest(id) | Message::PresetChange(id) => {
                id.to_pair().to_bytes().to_vec()
            }
            Message::BankDumpRequest(bank) => vec![bank],
            Message::Reply { reply_to, error_id } => vec![reply_to, error_id],
            Message::GenericNoData(_) => Vec::new(),
            Message::Other { payload, .. } => payload.to_vec(),
        };
        sysex::build_message(AXE_FX_II, self.function() as u8, &payload)
    }
}

/// Message asking the device to dump a preset.
pub fn preset_dump_request(id: PresetId) -> Vec<u8> {
    Message::PresetDumpRequest(id).to_bytes()
}

/// Message asking the device to dump a whole bank.
pub fn bank_dump_request(bank: Bank) -> Vec<u8> {
    Message::BankDumpRequest(bank as u8).to_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_buffer_sentinel() {
        let msg = Message::PresetId {
            id: PresetId::EditBuffer,
            unknown: 0x10,
        }
        .to_bytes();
        assert_eq!(&msg[6..8], &[0x7F, 0x00]);
        match Message::parse(&msg).unwrap() {
            Message::PresetId { id, unknown } => {
                assert_eq!(id, PresetId::EditBuffer);
                assert_ne!(id, PresetId::Slot(16256));
                assert_eq!(unknown, 0x10);
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn test_preset_id_slot() {
        let msg = Message::PresetId {
            id: PresetId::Slot(300),
            unknown: 0x10,
        }
        .to_bytes();
        assert_eq!(msg.len(), 12);
        assert_eq!(
            Message::parse(&msg).unwrap(),
            Message::PresetId {
                id: PresetId::Slot(300),
                unknown: 0x10
            }
        );
    }

    #[test]
    fn test_dump_requests() {
        let msg = preset_dump_request(PresetId::EditBuffer);
        assert_eq!(&msg[..8], &[0xF0, 0x00, 0x01, 0x74, 0x03, 0x03, 0x7F, 0x00]);
        assert!(sysex::verify_checksum(&msg));

        let msg = bank_dump_request(Bank::System);
        assert_eq!(Message::parse(&msg).unwrap(), Message::BankDumpRequest(3));
    }

    #[test]
    fn test_reject_other_models() {
        let msg = sysex::build_message(0x02, FunctionId::PresetId as u8, &[0, 1, 0, 0x10]);
        assert_eq!(Message::parse(&msg), Err(SysExError::UnsupportedModel(0x02)));
    }

    #[test]
    fn test_unknown_function() {
        let msg = sysex::build_message(AXE_FX_II, 0x42, &[]);
        assert_eq!(Message::parse(&msg), Err(SysExError::UnknownFunction(0x42)));
    }

    #[test]
    fn test_bad_checksum_is_reported() {
        let mut msg = sysex::build_message(AXE_FX_II, FunctionId::TempoHeartbeat as u8, &[]);
        msg[6] ^= 0x40;
        assert!(matches!(
            Message::parse(&msg),
            Err(SysExError::MessageChecksum { .. })
        ));
    }

    #[test]
    fn test_generic_no_data() {
        let msg = sysex::build_message(AXE_FX_II, FunctionId::TempoHeartbeat as u8, &[]);
        let parsed = Message::parse(&msg).unwrap();
        assert_eq!(parsed, Message::GenericNoData(FunctionId::TempoHeartbeat));
        assert_eq!(parsed.to_bytes(), msg);
    }

    #[test]
    fn test_wrong_fixed_length() {
        let msg = sysex::build_message(AXE_FX_II, FunctionId::PresetChecksum as u8, &[1, 2]);
        assert_eq!(
            Message::parse(&msg),
            Err(SysExError::BadLength {
                message: "preset checksum",
                expected: 11,
                actual: 10,
            })
        );
    }

    #[test]
    fn test_reply() {
        let msg = sysex::build_message(AXE_FX_II, FunctionId::Reply as u8, &[0x77, 0x00]);
        assert_eq!(
            Message::parse(&msg).unwrap(),
            Message::Reply {
                reply_to: 0x77,
                error_id: 0
            }
        );
    }

    #[test]
    fn test_data_block_encoding() {
        let values: Vec<u16> = (0..64).collect();
        let msg = encode_data_block(FunctionId::PresetParameters, &values);
        assert_eq!(msg.len(), DataBlock::expected_len::<u16>(64));
        assert!(sysex::verify_checksum(&msg));
        match Message::parse(&msg).unwrap() {
            Message::PresetParameters(block) => {
                assert_eq!(block.value_count(), 64);
                assert_eq!(block.encoded_values().len(), 64 * 3);
                assert_eq!(block.end_byte(), sysex::SYSEX_END);
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn test_firmware_block_uses_14bit_count() {
        let values = vec![1u32; 200];
        let msg = encode_data_block(FunctionId::FirmwareData, &values);
        match Message::parse(&msg).unwrap() {
            Message::FirmwareData(block) => assert_eq!(block.value_count(), 200),
            other => panic!("unexpected message {:?}", other),
        }
    }
}
