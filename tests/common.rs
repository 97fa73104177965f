#![allow(dead_code)]

use axefx::blocks::{BlockInMatrix, BlockParameters};
use axefx::data_block::{PresetParameters, PRESET_LAYOUT};
use axefx::preset::{PRESET_BLOB_LEN, PRESET_ID_UNKNOWN};
use axefx::{Message, Preset, PresetId};

/// Amp into cab into reverb with a shunt, plus one modifier record.
pub fn sample_preset(id: PresetId, name: &str) -> Preset {
    let mut preset = Preset::with_name(id, name).expect("valid name");
    let matrix = preset.matrix_mut();
    matrix.set(0, 1, BlockInMatrix::new(106, 0b0010));
    matrix.set(1, 1, BlockInMatrix::new(108, 0b0010));
    matrix.set(2, 1, BlockInMatrix::new(200, 0b0010));
    matrix.set(3, 1, BlockInMatrix::new(110, 0b0010));

    let seed = match id {
        PresetId::Slot(n) => n,
        PresetId::EditBuffer => 0x3FFF,
    };
    let mut amp: Vec<u16> = (0..64).map(|i| i ^ seed).collect();
    amp[28] = 0x0301;
    let blocks = preset.blocks_mut();
    blocks.push(BlockParameters::new(106, amp));
    blocks.push(BlockParameters::new(108, vec![seed; 24]));
    blocks.push(BlockParameters::new(1, vec![0x8000, 7, seed]));
    blocks.push(BlockParameters::new(110, (0..40).map(|i| i * 1000).collect()));
    preset
}

pub fn messages(preset: &Preset) -> Vec<Vec<u8>> {
    let mut out = Vec::new();
    preset
        .serialize(&mut |msg: &[u8]| out.push(msg.to_vec()))
        .expect("serializable preset");
    out
}

pub fn wire(preset: &Preset) -> Vec<u8> {
    messages(preset).concat()
}

/// A bank file: 128 presets starting at `bank * 128`.
pub fn bank_file(bank: u16) -> Vec<u8> {
    (0..128)
        .map(|i| {
            let id = bank * 128 + i;
            wire(&sample_preset(PresetId::Slot(id), &format!("Bank {} #{}", bank, i)))
        })
        .collect::<Vec<_>>()
        .concat()
}

/// Blob with a valid header and `name` in the name field, padded with `pad`.
pub fn raw_blob(name: &[u8], pad: u16) -> Vec<u16> {
    let mut values = vec![0u16; PRESET_BLOB_LEN];
    values[0] = 0x204;
    for i in 0..31 {
        values[2 + i] = name.get(i).map_or(pad, |&c| u16::from(c));
    }
    values
}

/// Wire messages for an arbitrary blob.
pub fn raw_dump(id: PresetId, values: Vec<u16>) -> Vec<Vec<u8>> {
    let params = PresetParameters::from_values(&PRESET_LAYOUT, values);
    let mut out = vec![Message::PresetId {
        id,
        unknown: PRESET_ID_UNKNOWN,
    }
    .to_bytes()];
    params.serialize(&mut |msg: &[u8]| out.push(msg.to_vec()));
    out.push(Message::PresetChecksum(params.checksum()).to_bytes());
    out
}
