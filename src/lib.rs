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

//! Reading and writing Fractal Audio Axe-Fx II SysEx data.
//!
//! Presets, user cab IRs and firmware images travel as sequences of SysEx
//! messages. This crate splits byte buffers into messages, decodes them and
//! reassembles the transfers, and goes the other way for sending things back
//! to a device or writing `.syx` files.
//!
//! ```no_run
//! let bytes = std::fs::read("bank_a.syx").unwrap();
//! for (id, preset) in axefx::parse(&bytes) {
//!     println!("{}: {}", id, preset.name());
//! }
//! ```

#![warn(missing_docs)]

pub mod blocks;
pub mod codec;
pub mod data_block;
pub mod error;
pub mod firmware;
pub mod ir;
pub mod message;
pub mod parser;
pub mod preset;
pub mod projection;
pub mod sysex;

pub use blocks::{BlockConfig, BlockInMatrix, BlockParameters, BlockSceneState, BlockType, Matrix};
pub use error::{ErrorKind, Result, SysExError};
pub use firmware::FirmwareData;
pub use ir::IrData;
pub use message::{Bank, FunctionId, Message, PresetId};
pub use parser::{parse, Content, ParseOptions, ParseReport, PresetMap, SysExParser};
pub use preset::{FinalizeOptions, Preset, PresetState};
pub use projection::{BlockSummary, PresetSummary, SceneSummary};
