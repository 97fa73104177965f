use axefx::preset::GLOBAL_SETTINGS_NAME;
use axefx::sysex::{build_message, seal};
use axefx::{parse, Content, ErrorKind, ParseOptions, PresetId, SysExError, SysExParser};

mod common;
use common::{bank_file, messages, raw_blob, raw_dump, sample_preset, wire};

#[test]
fn three_bank_files_make_384_presets() {
    let mut parser = SysExParser::new();
    for bank in 0..3 {
        let report = parser.parse_buffer(&bank_file(bank));
        assert!(report.is_clean(), "bank {}: {:?}", bank, report.errors);
        assert_eq!(report.presets, 128);
    }

    let presets = parser.presets();
    assert_eq!(presets.len(), 384);
    assert_eq!(parser.content(), Content::PresetArchive);
    assert_eq!(presets[&PresetId::Slot(0)].name(), "Bank 0 #0");
    assert_eq!(presets[&PresetId::Slot(383)].name(), "Bank 2 #127");
    assert!(presets.keys().all(|id| id.slot().unwrap() < 384));
}

#[test]
fn corrupt_preset_checksum_drops_only_that_preset() {
    let good = wire(&sample_preset(PresetId::Slot(1), "Good"));
    let mut bad = messages(&sample_preset(PresetId::Slot(2), "Bad"));
    let last = bad.len() - 1;
    bad[last] = axefx::Message::PresetChecksum(0x0BAD).to_bytes();

    let mut data = good;
    data.extend_from_slice(&bad.concat());

    let mut parser = SysExParser::new();
    let report = parser.parse_buffer(&data);
    assert_eq!(parser.presets().len(), 1);
    assert!(parser.presets().contains_key(&PresetId::Slot(1)));
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].kind(), ErrorKind::Checksum);
}

#[test]
fn corrupt_message_checksum_drops_only_that_preset() {
    let mut bad = messages(&sample_preset(PresetId::Slot(2), "Bad"));
    let n = bad[5].len();
    bad[5][n - 2] ^= 0x01;

    let mut data = bad.concat();
    data.extend_from_slice(&wire(&sample_preset(PresetId::Slot(3), "Good")));

    let mut parser = SysExParser::new();
    let report = parser.parse_buffer(&data);
    assert_eq!(parser.presets().len(), 1);
    assert!(parser.presets().contains_key(&PresetId::Slot(3)));
    assert!(matches!(report.errors[0], SysExError::MessageChecksum { .. }));
    // The rest of the broken dump arrives without a preset to go to.
    assert!(report.errors[1..]
        .iter()
        .all(|e| matches!(e, SysExError::OutOfSequence(_))));
}

#[test]
fn edit_buffer_id_is_a_sentinel() {
    let mut id_msg = vec![0xF0, 0x00, 0x01, 0x74, 0x03, 0x77, 0x7F, 0x00, 0x00, 0x10];
    seal(&mut id_msg);
    let mut dump = raw_dump(PresetId::Slot(0), raw_blob(b"Edit", u16::from(b' ')));
    dump[0] = id_msg;

    let presets = parse(&dump.concat());
    assert_eq!(presets.len(), 1);
    let preset = &presets[&PresetId::EditBuffer];
    assert!(preset.from_edit_buffer());
    assert!(!presets.contains_key(&PresetId::Slot(16256)));
}

#[test]
fn name_is_trimmed_of_spaces_and_nuls() {
    let mut values = raw_blob(b"BandTaps", u16::from(b' '));
    for v in &mut values[2 + 20..2 + 31] {
        *v = 0;
    }
    let presets = parse(&raw_dump(PresetId::Slot(10), values).concat());
    assert_eq!(presets[&PresetId::Slot(10)].name(), "BandTaps");
    assert_eq!(presets[&PresetId::Slot(10)].name().len(), 8);
}

#[test]
fn global_settings_are_opaque() {
    // Garbage that would not decode as a preset.
    let values: Vec<u16> = (0..2048).map(|i| 0xFFFF - i).collect();
    let presets = parse(&raw_dump(PresetId::Slot(511), values).concat());

    let global = &presets[&PresetId::Slot(511)];
    assert!(global.is_global_setting());
    assert!(!global.is_decoded());
    assert_eq!(global.name(), GLOBAL_SETTINGS_NAME);
    assert!(global.blocks().is_empty());
}

#[test]
fn unsupported_version_is_reported() {
    let mut values = raw_blob(b"Future", 0);
    values[0] = 0x300;
    let mut parser = SysExParser::new();
    let report = parser.parse_buffer(&raw_dump(PresetId::Slot(4), values).concat());
    assert!(parser.presets().is_empty());
    assert_eq!(report.errors, vec![SysExError::UnsupportedVersion(0x300)]);
    assert_eq!(report.errors[0].kind(), ErrorKind::UnsupportedFormat);
}

#[test]
fn verify_only_mode_keeps_presets_opaque() {
    let mut parser = SysExParser::with_options(ParseOptions {
        decode_presets: false,
        ..Default::default()
    });
    parser.parse_buffer(&wire(&sample_preset(PresetId::Slot(8), "Opaque")));
    let preset = &parser.presets()[&PresetId::Slot(8)];
    assert!(!preset.is_decoded());
    assert_eq!(preset.name(), "Opaque");
    assert!(preset.blocks().is_empty());
}

#[test]
fn framing_errors_resynchronize() {
    let good = wire(&sample_preset(PresetId::Slot(20), "After Noise"));

    let mut data = vec![0x12, 0x34, 0xF7];
    // Truncated message, cut short by the next start marker.
    data.extend_from_slice(&[0xF0, 0x00, 0x01, 0x74, 0x03]);
    data.extend_from_slice(&good);
    // Unterminated tail.
    data.extend_from_slice(&[0xF0, 0x00, 0x01]);

    let mut parser = SysExParser::new();
    let report = parser.parse_buffer(&data);
    assert_eq!(parser.presets().len(), 1);
    assert_eq!(parser.presets()[&PresetId::Slot(20)].name(), "After Noise");

    let kinds: Vec<_> = report.errors.iter().map(|e| e.kind()).collect();
    assert_eq!(kinds, vec![ErrorKind::Framing, ErrorKind::Framing]);
}

#[test]
fn unknown_and_foreign_messages_are_skipped() {
    let mut msgs = messages(&sample_preset(PresetId::Slot(30), "Mixed In"));
    msgs.insert(3, build_message(0x03, 0x42, &[1, 2, 3]));
    msgs.insert(5, build_message(0x03, 0x10, &[]));
    msgs.insert(7, build_message(0x06, 0x77, &[0, 0]));
    msgs.insert(9, vec![0xF0, 0x7E, 0x00, 0x06, 0x01, 0xF7]);

    let mut parser = SysExParser::new();
    let report = parser.parse_buffer(&msgs.concat());
    assert_eq!(parser.presets().len(), 1);
    assert_eq!(
        report.errors,
        vec![
            SysExError::UnknownFunction(0x42),
            SysExError::UnsupportedModel(0x06),
            SysExError::NotFractal,
        ]
    );
}

#[test]
fn interrupted_preset_is_reported() {
    let first = messages(&sample_preset(PresetId::Slot(40), "Cut Off"));
    let mut data = first[..10].concat();
    data.extend_from_slice(&wire(&sample_preset(PresetId::Slot(41), "Complete")));

    let mut parser = SysExParser::new();
    let report = parser.parse_buffer(&data);
    assert_eq!(report.errors, vec![SysExError::Incomplete("preset")]);
    assert_eq!(parser.presets().len(), 1);
    assert!(parser.presets().contains_key(&PresetId::Slot(41)));
}

#[test]
fn missing_epilogue_only_rescues_lone_presets() {
    let lone = messages(&sample_preset(PresetId::EditBuffer, "Lone"));
    let presets = parse(&lone[..lone.len() - 1].concat());
    assert_eq!(presets[&PresetId::EditBuffer].name(), "Lone");

    // After a complete preset in the same buffer the workaround is off.
    let mut data = wire(&sample_preset(PresetId::Slot(1), "Complete"));
    let tail = messages(&sample_preset(PresetId::Slot(2), "Tail"));
    data.extend_from_slice(&tail[..tail.len() - 1].concat());

    let mut parser = SysExParser::new();
    let report = parser.parse_buffer(&data);
    assert_eq!(parser.presets().len(), 1);
    assert_eq!(report.errors, vec![SysExError::Incomplete("preset")]);
}

#[test]
fn duplicate_ids_keep_the_last_preset() {
    let mut data = wire(&sample_preset(PresetId::Slot(7), "First"));
    data.extend_from_slice(&wire(&sample_preset(PresetId::Slot(7), "Second")));
    let presets = parse(&data);
    assert_eq!(presets.len(), 1);
    assert_eq!(presets[&PresetId::Slot(7)].name(), "Second");
}
