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

//! Stream parser
//!
//! Turns raw buffers (.syx files, concatenated MIDI input) into presets, IRs
//! and firmware. Nothing a single message does stops the parse: errors are
//! logged, collected in a [`ParseReport`] and the parser moves on.

use std::collections::BTreeMap;

use log::{debug, trace, warn};
use serde::Serialize;

use crate::error::{ErrorKind, Result, SysExError};
use crate::firmware::FirmwareData;
use crate::ir::IrData;
use crate::message::{Message, PresetId};
use crate::preset::{FinalizeOptions, Preset, PresetState};
use crate::sysex::Frames;

/// Presets by id, edit buffer last.
pub type PresetMap = BTreeMap<PresetId, Preset>;

/// Parser settings. The default does every check and decodes every preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Check preset, IR and firmware checksums.
    pub verify_checksums: bool,
    /// Decode presets. When false presets are only verified and kept opaque.
    pub decode_presets: bool,
    /// Some firmware (9.02 at least) doesn't send the preset checksum with
    /// a single preset dump. When set, a buffer that ends in the middle of a
    /// preset and produced no other preset finalizes it unverified.
    pub accept_missing_epilogue: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            verify_checksums: true,
            decode_presets: true,
            accept_missing_epilogue: true,
        }
    }
}

/// What a parser has collected so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Content {
    /// Nothing yet
    Empty,
    /// A single preset
    Preset,
    /// Several presets, e.g. a bank
    PresetArchive,
    /// User cab IRs
    ImpulseResponses,
    /// A firmware image
    Firmware,
    /// More than one kind of data. Not safe to send to a device.
    Mixed,
}

/// Outcome of one [`SysExParser::parse_buffer`] call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseReport {
    /// Messages that decoded cleanly
    pub messages: usize,
    /// Presets completed from this buffer
    pub presets: usize,
    /// IRs completed from this buffer
    pub irs: usize,
    /// Whether a firmware image was completed
    pub firmware: bool,
    /// Every error encountered, in stream order
    pub errors: Vec<SysExError>,
}

impl ParseReport {
    /// Whether no error was recorded.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    fn record(&mut self, offset: usize, err: SysExError) {
        warn!("offset {}: {}", offset, err);
        self.errors.push(err);
    }
}

/// Transfers in flight within one buffer.
#[derive(Default)]
struct Session {
    preset: Option<Preset>,
    ir: Option<IrData>,
    firmware: Option<FirmwareData>,
}

impl Session {
    fn abandon(&mut self, offset: usize) {
        if let Some(preset) = self.preset.take() {
            let id = preset.id().map_or_else(|| "?".to_string(), |id| id.to_string());
            warn!("offset {}: dropping preset {} after a corrupt message", offset, id);
        }
        if self.ir.take().is_some() {
            warn!("offset {}: dropping IR after a corrupt message", offset);
        }
        if self.firmware.take().is_some() {
            warn!("offset {}: dropping firmware after a corrupt message", offset);
        }
    }
}

/// Collects presets, IRs and firmware from one or more buffers.
#[derive(Debug, Clone, Default)]
pub struct SysExParser {
    options: ParseOptions,
    presets: PresetMap,
    irs: Vec<IrData>,
    firmware: Option<FirmwareData>,
}

impl SysExParser {
    /// A parser with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// A parser with `options`.
    pub fn with_options(options: ParseOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    /// Options in effect.
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parses one buffer into the collection. May be called repeatedly, e.g.
    /// once per bank file. Transfers don't carry over between buffers.
    pub fn parse_buffer(&mut self, data: &[u8]) -> ParseReport {
        let mut report = ParseReport::default();
        let mut session = Session::default();

        for frame in Frames::new(data) {
            let frame = match frame {
                Ok(frame) => frame,
                Err(err) => {
                    let offset = match err {
                        SysExError::NestedStart { open, .. } => open,
                        SysExError::Unterminated { offset } => offset,
                        _ => 0,
                    };
                    session.abandon(offset);
                    report.record(offset, err);
                    continue;
                }
            };

            match Message::parse(frame.bytes) {
                Ok(msg) => {
                    report.messages += 1;
                    trace!("offset {}: {}", frame.offset, msg.function().name());
                    if let Err(err) = self.dispatch(&mut session, msg, &mut report) {
                        report.record(frame.offset, err);
                    }
                }
                Err(err) => {
                    match err.kind() {
                        // Not ours, or not understood. Doesn't affect transfers.
                        ErrorKind::UnsupportedFormat | ErrorKind::UnknownFunction => {}
                        _ => session.abandon(frame.offset),
                    }
                    report.record(frame.offset, err);
                }
            }
        }

        self.finish(session, data.len(), &mut report);
        debug!(
            "parsed {} bytes: {} messages, {} presets, {} IRs, {} errors",
            data.len(),
            report.messages,
            report.presets,
            report.irs,
            report.errors.len()
        );
        report
    }

    fn finalize_options(&self) -> FinalizeOptions {
        FinalizeOptions {
            verify_checksum: self.options.verify_checksums,
            decode: self.options.decode_presets,
        }
    }

    fn insert_preset(&mut self, preset: Preset, report: &mut ParseReport) {
        if let Some(id) = preset.id() {
            if self.presets.insert(id, preset).is_some() {
                debug!("preset {} replaced", id);
            }
            report.presets += 1;
        }
    }

    fn dispatch(
        &mut self,
        session: &mut Session,
        msg: Message,
        report: &mut ParseReport,
    ) -> Result<()> {
        match msg {
            Message::PresetId { id, unknown } => {
                let interrupted = session.preset.take().is_some();
                let mut preset = Preset::new();
                preset.set_preset_id(id, unknown)?;
                session.preset = Some(preset);
                if interrupted {
                    // The new preset is kept, the old one is lost.
                    return Err(SysExError::Incomplete("preset"));
                }
            }
            Message::PresetParameters(block) => {
                let preset = session
                    .preset
                    .as_mut()
                    .ok_or(SysExError::OutOfSequence("preset parameters"))?;
                if let Err(err) = preset.add_parameter_data(&block) {
                    session.preset = None;
                    return Err(err);
                }
            }
            Message::PresetChecksum(sum) => {
                let mut preset = session
                    .preset
                    .take()
                    .ok_or(SysExError::OutOfSequence("preset checksum"))?;
                preset.finalize(Some(sum), self.finalize_options())?;
                self.insert_preset(preset, report);
            }
            Message::IrBegin { id, unknown } => {
                let previous = session.ir.replace(IrData::new(id, unknown));
                if previous.is_some() {
                    return Err(SysExError::Incomplete("IR"));
                }
            }
            Message::IrData(block) => {
                let ir = session
                    .ir
                    .as_mut()
                    .ok_or(SysExError::OutOfSequence("IR data"))?;
                if let Err(err) = ir.append(&block) {
                    session.ir = None;
                    return Err(err);
                }
            }
            Message::IrEnd(sum) => {
                let ir = session.ir.take().ok_or(SysExError::OutOfSequence("IR end"))?;
                if self.options.verify_checksums {
                    ir.verify(sum)?;
                }
                debug!("IR {}: {:?}, {} words", ir.id(), ir.name(), ir.words().len());
                self.irs.push(ir);
                report.irs += 1;
            }
            Message::FirmwareBegin { word_count } => {
                let previous = session.firmware.replace(FirmwareData::new(word_count));
                if previous.is_some() {
                    return Err(SysExError::Incomplete("firmware"));
                }
            }
            Message::FirmwareData(block) => {
                let firmware = session
                    .firmware
                    .as_mut()
                    .ok_or(SysExError::OutOfSequence("firmware data"))?;
                if let Err(err) = firmware.append(&block) {
                    session.firmware = None;
                    return Err(err);
                }
            }
            Message::FirmwareEnd(sum) => {
                let firmware = session
                    .firmware
                    .take()
                    .ok_or(SysExError::OutOfSequence("firmware end"))?;
                if self.options.verify_checksums {
                    firmware.verify(sum)?;
                }
                debug!("firmware: {} words", firmware.len());
                if self.firmware.replace(firmware).is_some() {
                    warn!("replacing previously parsed firmware");
                }
                report.firmware = true;
            }
            Message::Reply { reply_to, error_id } => {
                if error_id != 0 {
                    warn!("device replied to 0x{:02X} with error {}", reply_to, error_id);
                } else {
                    debug!("device acknowledged 0x{:02X}", reply_to);
                }
            }
            Message::PresetDumpRequest(_)
            | Message::PresetChange(_)
            | Message::BankDumpRequest(_)
            | Message::GenericNoData(_)
            | Message::Other { .. } => {}
        }
        Ok(())
    }

    fn finish(&mut self, mut session: Session, end: usize, report: &mut ParseReport) {
        if let Some(mut preset) = session.preset.take() {
            let workaround = self.options.accept_missing_epilogue
                && report.presets == 0
                && preset.state() == PresetState::Accumulating;
            if workaround {
                debug!("no preset checksum at end of buffer, finalizing unverified");
                match preset.finalize(None, self.finalize_options()) {
                    Ok(()) => self.insert_preset(preset, report),
                    Err(err) => report.record(end, err),
                }
            } else {
                report.record(end, SysExError::Incomplete("preset"));
            }
        }
        if session.ir.take().is_some() {
            report.record(end, SysExError::Incomplete("IR"));
        }
        if session.firmware.take().is_some() {
            report.record(end, SysExError::Incomplete("firmware"));
        }
    }

    /// Presets collected so far.
    pub fn presets(&self) -> &PresetMap {
        &self.presets
    }

    /// Mutable access to the collected presets.
    pub fn presets_mut(&mut self) -> &mut PresetMap {
        &mut self.presets
    }

    /// Consumes the parser, returning its presets.
    pub fn into_presets(self) -> PresetMap {
        self.presets
    }

    /// IRs in arrival order.
    pub fn irs(&self) -> &[IrData] {
        &self.irs
    }

    /// The last firmware image parsed, if any.
    pub fn firmware(&self) -> Option<&FirmwareData> {
        self.firmware.as_ref()
    }

    /// What the collection holds.
    pub fn content(&self) -> Content {
        let kinds = [
            !self.presets.is_empty(),
            !self.irs.is_empty(),
            self.firmware.is_some(),
        ];
        match kinds {
            [false, false, false] => Content::Empty,
            [true, false, false] if self.presets.len() == 1 => Content::Preset,
            [true, false, false] => Content::PresetArchive,
            [false, true, false] => Content::ImpulseResponses,
            [false, false, true] => Content::Firmware,
            _ => Content::Mixed,
        }
    }

    /// Emits everything collected: presets by id, then IRs, then firmware.
    pub fn serialize<F: FnMut(&[u8])>(&self, sink: &mut F) -> Result<()> {
        for preset in self.presets.values() {
            preset.serialize(sink)?;
        }
        for ir in &self.irs {
            ir.serialize(sink)?;
        }
        if let Some(firmware) = &self.firmware {
            firmware.serialize(sink)?;
        }
        Ok(())
    }
}

/// Parses `data` with default options, keeping only the presets.
pub fn parse(data: &[u8]) -> PresetMap {
    let mut parser = SysExParser::new();
    parser.parse_buffer(data);
    parser.into_presets()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::AXE_FX_II;
    use crate::sysex;

    fn preset_stream(id: PresetId, name: &str) -> Vec<u8> {
        let preset = Preset::with_name(id, name).unwrap();
        let mut out = Vec::new();
        preset
            .serialize(&mut |msg: &[u8]| out.extend_from_slice(msg))
            .unwrap();
        out
    }

    #[test]
    fn test_single_preset() {
        let mut parser = SysExParser::new();
        let report = parser.parse_buffer(&preset_stream(PresetId::Slot(3), "One"));
        assert!(report.is_clean());
        assert_eq!(report.presets, 1);
        assert_eq!(report.messages, 34);
        assert_eq!(parser.content(), Content::Preset);
        assert_eq!(parser.presets()[&PresetId::Slot(3)].name(), "One");
    }

    #[test]
    fn test_empty_buffer() {
        let mut parser = SysExParser::new();
        assert!(parser.parse_buffer(&[]).is_clean());
        assert_eq!(parser.content(), Content::Empty);
    }

    #[test]
    fn test_heartbeats_and_foreign_messages_are_skipped() {
        let mut data = sysex::build_message(AXE_FX_II, 0x10, &[]);
        data.extend_from_slice(&[0xF0, 0x43, 0x10, 0x4C, 0x00, 0xF7]);
        data.extend_from_slice(&preset_stream(PresetId::EditBuffer, "Live"));

        let mut parser = SysExParser::new();
        let report = parser.parse_buffer(&data);
        assert_eq!(report.errors, vec![SysExError::NotFractal]);
        assert!(parser.presets()[&PresetId::EditBuffer].from_edit_buffer());
    }

    #[test]
    fn test_missing_epilogue() {
        let mut data = preset_stream(PresetId::Slot(9), "No Sum");
        // Drop the checksum message.
        data.truncate(data.len() - 11);

        let mut parser = SysExParser::new();
        let report = parser.parse_buffer(&data);
        assert!(report.is_clean());
        assert_eq!(parser.presets()[&PresetId::Slot(9)].name(), "No Sum");

        let mut strict = SysExParser::with_options(ParseOptions {
            accept_missing_epilogue: false,
            ..Default::default()
        });
        let report = strict.parse_buffer(&data);
        assert_eq!(report.errors, vec![SysExError::Incomplete("preset")]);
        assert!(strict.presets().is_empty());
    }

    #[test]
    fn test_stray_parameters() {
        let data = preset_stream(PresetId::Slot(1), "x");
        // Skip the preset id message.
        let mut parser = SysExParser::new();
        let report = parser.parse_buffer(&data[12..]);
        assert_eq!(report.errors.len(), 33);
        assert!(report
            .errors
            .iter()
            .all(|e| matches!(e, SysExError::OutOfSequence(_))));
        assert!(parser.presets().is_empty());
    }

    #[test]
    fn test_parse_free_function() {
        let mut data = preset_stream(PresetId::Slot(0), "A");
        data.extend_from_slice(&preset_stream(PresetId::Slot(1), "B"));
        let presets = parse(&data);
        let names: Vec<_> = presets.values().map(|p| p.name().to_string()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }
}
