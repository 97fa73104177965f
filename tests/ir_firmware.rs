use axefx::codec::encode32;
use axefx::sysex::{seal, verify_checksum, FRACTAL_ID, SYSEX_START};
use axefx::{Content, ErrorKind, FirmwareData, IrData, PresetId, SysExParser};

mod common;
use common::{sample_preset, wire};

fn ir_words(name: &str, fill: u32) -> Vec<u32> {
    let mut bytes = name.as_bytes().to_vec();
    bytes.resize(32, 0);
    let mut words: Vec<u32> = bytes
        .chunks(4)
        .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    words.extend((0..1016).map(|i| i * fill));
    words
}

fn ir_wire(ir: &IrData) -> Vec<u8> {
    let mut out = Vec::new();
    ir.serialize(&mut |msg: &[u8]| out.extend_from_slice(msg))
        .unwrap();
    out
}

#[test]
fn impulse_responses_are_collected_in_order() {
    let first = IrData::from_words(PresetId::Slot(0), ir_words("4x12 Green", 3));
    let second = IrData::from_words(PresetId::EditBuffer, ir_words("Room", 11));
    let mut data = ir_wire(&first);
    data.extend_from_slice(&ir_wire(&second));

    let mut parser = SysExParser::new();
    let report = parser.parse_buffer(&data);
    assert!(report.is_clean());
    assert_eq!(report.irs, 2);
    assert_eq!(parser.content(), Content::ImpulseResponses);

    let names: Vec<_> = parser.irs().iter().map(|ir| ir.name()).collect();
    assert_eq!(names, vec!["4x12 Green", "Room"]);
    assert!(parser.irs()[1].from_edit_buffer());
    assert_eq!(parser.irs()[0], first);
}

#[test]
fn corrupt_ir_is_dropped() {
    let ir = IrData::from_words(PresetId::Slot(5), ir_words("Bad", 1));
    let mut data = ir_wire(&ir);
    // Replace the IR end message's checksum: its payload sits right before
    // the message checksum and end marker.
    let n = data.len();
    data.truncate(n - 7);
    data.extend_from_slice(&encode32(0x1234_5678));
    seal_last_message(&mut data);

    let mut parser = SysExParser::new();
    let report = parser.parse_buffer(&data);
    assert!(parser.irs().is_empty());
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].kind(), ErrorKind::Checksum);
}

fn seal_last_message(data: &mut Vec<u8>) {
    let start = data.iter().rposition(|&b| b == SYSEX_START).unwrap();
    let mut msg = data.split_off(start);
    seal(&mut msg);
    data.extend_from_slice(&msg);
}

#[test]
fn firmware_round_trip() {
    let words: Vec<u32> = (0..1000u32).map(|i| i.rotate_left(i % 32) ^ 0xA5A5_5A5A).collect();
    let firmware = FirmwareData::from_words(words.clone());

    let mut data = Vec::new();
    firmware
        .serialize(&mut |msg: &[u8]| {
            assert!(verify_checksum(msg));
            data.extend_from_slice(msg)
        })
        .unwrap();

    let mut parser = SysExParser::new();
    assert!(parser.parse_buffer(&data).is_clean());
    assert_eq!(parser.content(), Content::Firmware);
    assert_eq!(parser.firmware().unwrap().words(), &words[..]);
}

#[test]
fn firmware_stray_bits_are_ignored() {
    let words = vec![0xFFFF_FFFFu32, 0x0000_0001, 0x8000_0000];
    let checksum = words.iter().fold(0, |a, w| a ^ w);

    let mut data = axefx::Message::FirmwareBegin { word_count: 3 }.to_bytes();
    let mut block = vec![SYSEX_START];
    block.extend_from_slice(&FRACTAL_ID);
    block.extend_from_slice(&[0x03, 0x7E, 3, 0]);
    for &w in &words {
        let mut septets = encode32(w);
        // The device's encoder leaves these set.
        septets[4] |= 0x70;
        block.extend_from_slice(&septets);
    }
    seal(&mut block);
    data.extend_from_slice(&block);
    data.extend_from_slice(&axefx::Message::FirmwareEnd(checksum).to_bytes());

    let mut parser = SysExParser::new();
    let report = parser.parse_buffer(&data);
    assert!(report.is_clean(), "{:?}", report.errors);
    assert_eq!(parser.firmware().unwrap().words(), &words[..]);
}

#[test]
fn firmware_with_missing_words_is_rejected() {
    let firmware = FirmwareData::from_words(vec![7; 64]);
    let mut msgs = Vec::new();
    firmware
        .serialize(&mut |msg: &[u8]| msgs.push(msg.to_vec()))
        .unwrap();
    // begin, two data blocks, end. Lose one data block.
    msgs.remove(2);

    let mut parser = SysExParser::new();
    let report = parser.parse_buffer(&msgs.concat());
    assert!(parser.firmware().is_none());
    assert_eq!(report.errors[0].kind(), ErrorKind::MalformedMessage);
}

#[test]
fn presets_and_irs_together_are_mixed() {
    let mut data = wire(&sample_preset(PresetId::Slot(0), "Preset"));
    data.extend_from_slice(&ir_wire(&IrData::from_words(
        PresetId::Slot(1),
        ir_words("Cab", 2),
    )));

    let mut parser = SysExParser::new();
    assert!(parser.parse_buffer(&data).is_clean());
    assert_eq!(parser.content(), Content::Mixed);

    // Serialization order: presets first, then IRs.
    let mut out = Vec::new();
    parser
        .serialize(&mut |msg: &[u8]| out.extend_from_slice(msg))
        .unwrap();
    assert_eq!(out, data);
}
