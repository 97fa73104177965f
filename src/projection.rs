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

//! Read-only views of presets for export, e.g. as JSON.

use serde::Serialize;

use crate::blocks::{
    amp_model_name, BlockConfig, BlockInMatrix, BlockParameters, BlockSceneState, BlockType,
    SCENE_COUNT,
};
use crate::message::PresetId;
use crate::preset::Preset;

/// Flat view of a [`Preset`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresetSummary {
    /// Slot or edit buffer
    pub id: PresetId,
    /// Trimmed name
    pub name: String,
    /// Blob format version
    pub version: u16,
    /// Global settings preset, not decoded
    pub global_setting: bool,
    /// Whether matrix and blocks were decoded
    pub decoded: bool,
    /// Occupied cells as `(column, row, cell)`
    pub matrix: Vec<(usize, usize, BlockInMatrix)>,
    /// Block and modifier records
    pub blocks: Vec<BlockSummary>,
    /// Blocks in the matrix without a parameter record
    pub missing_blocks: Vec<u16>,
}

/// Flat view of a [`BlockParameters`] record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockSummary {
    /// Block or modifier id
    pub id: u16,
    /// Display name of known blocks
    pub name: Option<&'static str>,
    /// Block category
    #[serde(rename = "type")]
    pub block_type: Option<BlockType>,
    /// Modifier record
    pub modifier: bool,
    /// Configuration in the legacy state byte
    pub active_config: BlockConfig,
    /// Global block index in the legacy state byte
    pub global_block_index: u8,
    /// Amp model names of the X and Y configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amp_models: Option<[Option<&'static str>; 2]>,
    /// Per-scene state, for blocks with a known bypass parameter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenes: Option<Vec<SceneSummary>>,
    /// X values, or all values for blocks without X/Y
    pub x: Vec<u16>,
    /// Y values
    pub y: Vec<u16>,
}

/// One scene's state of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SceneSummary {
    /// Scene number, 1 to 8
    pub scene: usize,
    /// Bypassed in this scene
    pub bypassed: bool,
    /// Active configuration
    pub config: BlockConfig,
}

impl PresetSummary {
    /// `None` for presets without an id.
    pub fn new(preset: &Preset) -> Option<Self> {
        Some(Self {
            id: preset.id()?,
            name: preset.name().to_string(),
            version: preset.version(),
            global_setting: preset.is_global_setting(),
            decoded: preset.is_decoded(),
            matrix: preset
                .matrix()
                .iter()
                .filter(|(_, _, cell)| !cell.is_empty())
                .map(|(x, y, cell)| (x, y, *cell))
                .collect(),
            blocks: preset.blocks().iter().map(BlockSummary::new).collect(),
            missing_blocks: preset.missing_blocks().to_vec(),
        })
    }
}

impl BlockSummary {
    /// Summarizes one record.
    pub fn new(block: &BlockParameters) -> Self {
        let params = block.params();
        let (x, y) = if block.supports_xy() {
            params.split_at(params.len() / 2)
        } else {
            (params, &params[params.len()..])
        };

        let amp_models = match block.block_type() {
            Some(BlockType::Amp) if !x.is_empty() => Some([
                amp_model_name(block.param(0, BlockConfig::X)),
                amp_model_name(block.param(0, BlockConfig::Y)),
            ]),
            _ => None,
        };

        Self {
            id: block.block(),
            name: block.name(),
            block_type: block.block_type(),
            modifier: block.is_modifier(),
            active_config: block.active_config(),
            global_block_index: block.global_block_index(),
            amp_models,
            scenes: block.bypass_state().map(scenes),
            x: x.to_vec(),
            y: y.to_vec(),
        }
    }
}

fn scenes(state: BlockSceneState) -> Vec<SceneSummary> {
    (0..SCENE_COUNT)
        .map(|scene| SceneSummary {
            scene: scene + 1,
            bypassed: state.is_bypassed_in_scene(scene),
            config: if state.is_config_y_in_scene(scene) {
                BlockConfig::Y
            } else {
                BlockConfig::X
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amp_summary() {
        let mut params = vec![0u16; 60];
        params[0] = 0;
        params[30] = 1;
        params[28] = 0x0100;
        let summary = BlockSummary::new(&BlockParameters::new(106, params));

        assert_eq!(summary.block_type, Some(BlockType::Amp));
        assert_eq!(
            summary.amp_models,
            Some([Some("59 Bassguy"), Some("65 Bassguy")])
        );
        let scenes = summary.scenes.unwrap();
        assert_eq!(scenes.len(), 8);
        assert_eq!(scenes[0].config, BlockConfig::Y);
        assert!(!scenes[0].bypassed);
        assert_eq!(summary.x.len(), 30);
        assert_eq!(summary.y.len(), 30);
    }

    #[test]
    fn test_flat_block_summary() {
        let summary = BlockSummary::new(&BlockParameters::new(114, vec![1, 2, 3]));
        assert_eq!(summary.x, vec![1, 2, 3]);
        assert!(summary.y.is_empty());
        assert!(summary.scenes.is_none());
        assert!(summary.amp_models.is_none());
    }

    #[test]
    fn test_preset_summary() {
        let mut preset = Preset::with_name(PresetId::Slot(1), "Sum").unwrap();
        preset
            .matrix_mut()
            .set(2, 1, BlockInMatrix::new(200, 2));
        let summary = PresetSummary::new(&preset).unwrap();
        assert_eq!(summary.matrix, vec![(2, 1, BlockInMatrix::new(200, 2))]);
        assert!(summary.decoded);
        assert!(PresetSummary::new(&Preset::new()).is_none());
    }
}
