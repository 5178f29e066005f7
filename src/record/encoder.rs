// ConfigModel + template -> raw block

use super::decoder::decode_field;
use super::layout::{self, Encoding, FieldSpec, Pad, Segment};
use super::model::{ConfigModel, FieldId, FieldValue};
use super::raw::{RawRecord, MAGIC, RECORD_SIZE};
use super::{CodecError, CodecResult};

/// Encode `model` into a new block.
///
/// Bytes outside every field come from `template`, normally the block the
/// model was decoded from. A field whose value matches what the template
/// slot already decodes to keeps the template's bytes, as does a text field
/// left unset, so re-encoding an unedited model reproduces the template
/// exactly. The frequency command scaffolding is rewritten only when one of
/// the two frequencies changed.
pub fn build(model: &ConfigModel, template: &RawRecord) -> CodecResult<RawRecord> {
    template.validate()?;
    layout::verify()?;

    let source = template.as_bytes();
    let retune = frequency_changed(model, source);
    let mut out = Vec::with_capacity(RECORD_SIZE);
    out.extend_from_slice(MAGIC);

    for segment in layout::segments() {
        // Reserved gap before this segment
        let gap = source.get(out.len()..segment.offset()).ok_or_else(|| {
            CodecError::Size(format!(
                "segment at {} starts before position {}",
                segment.offset(),
                out.len()
            ))
        })?;
        out.extend_from_slice(gap);

        match segment {
            Segment::Literal(literal) if retune => out.extend_from_slice(literal.bytes),
            Segment::Literal(literal) => out.extend_from_slice(&source[literal.offset..literal.end()]),
            Segment::Field(spec) => {
                let current = &source[spec.offset..spec.end()];
                match model.get(spec.id) {
                    Some(value) if decode_field(spec, current).as_ref() != Some(&value) => {
                        out.extend_from_slice(&encode_field(spec, &value)?)
                    }
                    _ => out.extend_from_slice(current),
                }
            }
        }
    }

    out.extend_from_slice(source.get(out.len()..).unwrap_or(&[]));

    if out.len() != RECORD_SIZE {
        return Err(CodecError::Size(format!(
            "assembled {} bytes, expected {}",
            out.len(),
            RECORD_SIZE
        )));
    }

    tracing::debug!("Encoded {} fields into {} bytes", layout::FIELDS.len(), out.len());
    Ok(RawRecord::new(out))
}

/// The module tuning command embedded in the block for the model's two
/// frequencies, e.g. `1,144.3900,144.8000,0,3,0,0\r\n`
pub fn frequency_command(model: &ConfigModel) -> String {
    format!(
        "1,{},{},0,3,0,0\r\n",
        model.frequency_1.as_deref().unwrap_or_default(),
        model.frequency_2.as_deref().unwrap_or_default()
    )
}

fn encode_field(spec: &FieldSpec, value: &FieldValue) -> CodecResult<Vec<u8>> {
    match (spec.encoding, value) {
        (Encoding::Text(pad), FieldValue::Text(text)) => encode_text(spec, text, &pad),
        (Encoding::Number, FieldValue::Number(n)) => encode_number(spec, *n),
        (Encoding::Choice(_), FieldValue::Choice(index)) => Ok(vec![*index]),
        (_, value) => Err(CodecError::FieldKind {
            field: spec.name(),
            expected: spec.id.kind(),
            found: value.kind(),
        }),
    }
}

fn encode_text(spec: &FieldSpec, text: &str, pad: &Pad) -> CodecResult<Vec<u8>> {
    let bytes = text.as_bytes();

    if bytes.contains(&0x00) {
        return Err(encoding_error(spec, "text contains a NUL byte".to_string()));
    }
    if bytes.len() > spec.width {
        return Err(encoding_error(
            spec,
            format!("{} bytes exceed width {}", bytes.len(), spec.width),
        ));
    }
    if pad.exact && bytes.len() != spec.width {
        return Err(encoding_error(
            spec,
            format!("must be exactly {} characters, got {}", spec.width, bytes.len()),
        ));
    }

    let mut out = bytes.to_vec();
    if out.len() < spec.width {
        if let Some(terminator) = pad.terminator {
            out.push(terminator);
        }
    }
    out.resize(spec.width, pad.fill);
    Ok(out)
}

fn encode_number(spec: &FieldSpec, value: u16) -> CodecResult<Vec<u8>> {
    let bytes = value.to_be_bytes();
    let (high, low) = bytes.split_at(bytes.len() - spec.width.min(bytes.len()));

    if spec.width > bytes.len() || high.iter().any(|&b| b != 0) {
        return Err(encoding_error(
            spec,
            format!("{} does not fit in {} byte(s)", value, spec.width),
        ));
    }
    Ok(low.to_vec())
}

/// True when either frequency in the model differs from the template's
fn frequency_changed(model: &ConfigModel, source: &[u8]) -> bool {
    [FieldId::Frequency1, FieldId::Frequency2].into_iter().any(|id| {
        let Some(value) = model.get(id) else {
            return false;
        };
        let stored = layout::spec(id)
            .and_then(|spec| source.get(spec.offset..spec.end()).and_then(|b| decode_field(spec, b)));
        stored.as_ref() != Some(&value)
    })
}

fn encoding_error(spec: &FieldSpec, reason: String) -> CodecError {
    CodecError::Encoding {
        field: spec.name(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::decoder::parse;
    use crate::record::layout::spec;

    /// A model with every text field set to something that fits
    fn sample_model() -> ConfigModel {
        let mut model = ConfigModel::default();
        for spec in layout::FIELDS {
            let value = match spec.encoding {
                Encoding::Text(pad) if pad.exact => FieldValue::Text("144.3900".to_string()),
                Encoding::Text(_) => {
                    let text: String = "ABCDEFGHIJKLMNOPQRSTUVWXYZ".chars().cycle().take(spec.width.min(5)).collect();
                    FieldValue::Text(text)
                }
                Encoding::Number if spec.width == 2 => FieldValue::Number(300),
                Encoding::Number => FieldValue::Number(7),
                Encoding::Choice(_) => FieldValue::Choice(1),
            };
            model.set(spec.id, value).unwrap();
        }
        model.callsign = Some("KG7KMV".to_string());
        model.ssid = 3;
        model.frequency_2 = Some("144.8000".to_string());
        model
    }

    #[test]
    fn test_output_size_and_magic() {
        let raw = build(&sample_model(), &RawRecord::blank()).unwrap();
        assert_eq!(raw.len(), RECORD_SIZE);
        assert_eq!(&raw.as_bytes()[..5], b"HELLO");
    }

    #[test]
    fn test_round_trip() {
        let model = sample_model();
        let raw = build(&model, &RawRecord::blank()).unwrap();
        let decoded = parse(&raw).unwrap();
        assert!(!decoded.is_partial());
        assert_eq!(decoded.model, model);
    }

    #[test]
    fn test_round_trip_with_noisy_template() {
        let mut data: Vec<u8> = (0..RECORD_SIZE).map(|i| (i * 7 % 251) as u8).collect();
        data[..5].copy_from_slice(b"HELLO");
        let template = RawRecord::new(data);

        let model = sample_model();
        let raw = build(&model, &template).unwrap();
        assert_eq!(parse(&raw).unwrap().model, model);
    }

    #[test]
    fn test_unchanged_model_reproduces_record() {
        let mut data: Vec<u8> = (0..RECORD_SIZE).map(|i| (i % 256) as u8).collect();
        data[..5].copy_from_slice(b"HELLO");
        let first = build(&sample_model(), &RawRecord::new(data)).unwrap();

        let decoded = parse(&first).unwrap();
        let second = build(&decoded.model, &first).unwrap();
        assert_eq!(second.as_bytes(), first.as_bytes());
    }

    /// A block shaped like a device capture: NUL-padded text, zero-filled
    /// strings and an erased (0xFF) emergency message
    fn device_capture() -> RawRecord {
        let mut data = vec![0u8; RECORD_SIZE];
        data[..5].copy_from_slice(MAGIC);
        let patches: &[(usize, &[u8])] = &[
            (5, &[0x00, 0x3C, 0x01, 0x00, 0x02, 0x01, 0x1E, 0x05]),
            (13, b"KG7KMV\x00"),
            (20, &[0x09]),
            (23, b"/>"),
            (37, b"4736.25N\x00\x00"),
            (53, b"12219.88W\x00"),
            (69, b"Hello from the trail"),
            (133, b"1,144.3900,144.8000,0,3,0,0\r\n\x00"),
            (197, b"192.168.1.10"),
            (261, b"homenet"),
            (277, b"s3cret"),
            (437, &[0xFF; 32]),
            (477, b"1234"),
            (485, b"WIDE1\x00\x00"),
            (492, &[0x01]),
            (493, b"WIDE2\x00\x00"),
            (500, &[0x02]),
            (501, b"WIDE1\x00\x00"),
            (509, b"WIDE2\x00\x00"),
        ];
        for (offset, bytes) in patches {
            data[*offset..*offset + bytes.len()].copy_from_slice(bytes);
        }
        data[311..437].iter_mut().enumerate().for_each(|(i, b)| *b = i as u8);
        RawRecord::new(data)
    }

    fn differing_offsets(a: &RawRecord, b: &RawRecord) -> Vec<usize> {
        a.as_bytes()
            .iter()
            .zip(b.as_bytes())
            .enumerate()
            .filter(|(_, (x, y))| x != y)
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn test_unedited_blank_reproduced() {
        let blank = RawRecord::blank();
        let raw = build(&parse(&blank).unwrap().model, &blank).unwrap();
        assert_eq!(differing_offsets(&raw, &blank), Vec::<usize>::new());
    }

    #[test]
    fn test_unedited_capture_reproduced() {
        let capture = device_capture();
        let decoded = parse(&capture).unwrap();
        assert!(!decoded.is_partial());
        assert_eq!(decoded.model.path_1.as_deref(), Some("WIDE1"));

        let raw = build(&decoded.model, &capture).unwrap();
        assert_eq!(differing_offsets(&raw, &capture), Vec::<usize>::new());
    }

    #[test]
    fn test_edit_touches_only_its_slot() {
        let capture = device_capture();
        let mut model = parse(&capture).unwrap().model;
        model.path_1 = Some("WIDE3".to_string());
        model.ssid = 7;

        let raw = build(&model, &capture).unwrap();
        // An edited slot gets the standard padding
        assert_eq!(differing_offsets(&raw, &capture), vec![20, 489, 491]);
        assert_eq!(raw.get(485, 7), Some(&b"WIDE3\x00\xff"[..]));
    }

    #[test]
    fn test_erased_command_area_kept_until_retuned() {
        let mut data = RawRecord::blank().into_bytes();
        data[135..143].copy_from_slice(b"144.3900");
        data[144..152].copy_from_slice(b"144.8000");
        let template = RawRecord::new(data);

        let mut model = parse(&template).unwrap().model;
        let raw = build(&model, &template).unwrap();
        assert_eq!(raw, template);

        model.frequency_2 = Some("145.8250".to_string());
        let raw = build(&model, &template).unwrap();
        assert_eq!(
            raw.get(133, 30),
            Some(&b"1,144.3900,145.8250,0,3,0,0\r\n\x00"[..])
        );
    }

    #[test]
    fn test_undecodable_frequency_kept() {
        let mut data = RawRecord::blank().into_bytes();
        data[135..143].copy_from_slice(b"144.39\x00\x00");
        let template = RawRecord::new(data);

        let decoded = parse(&template).unwrap();
        assert!(decoded.skipped.contains(&FieldId::Frequency1));
        let raw = build(&decoded.model, &template).unwrap();
        assert_eq!(raw, template);
    }

    fn boundary_model(text: impl Fn(&FieldSpec) -> String, number: impl Fn(&FieldSpec) -> u16, choice: u8) -> ConfigModel {
        let mut model = ConfigModel::default();
        for spec in layout::FIELDS {
            let value = match spec.encoding {
                Encoding::Text(pad) if pad.exact => FieldValue::Text("144.3900".to_string()),
                Encoding::Text(_) => FieldValue::Text(text(spec)),
                Encoding::Number => FieldValue::Number(number(spec)),
                Encoding::Choice(_) => FieldValue::Choice(choice),
            };
            model.set(spec.id, value).unwrap();
        }
        model
    }

    /// Models pushing every field to an edge of its range
    fn boundary_models() -> Vec<(&'static str, ConfigModel)> {
        let max_number = |spec: &FieldSpec| {
            if spec.width == 2 {
                u16::MAX
            } else {
                u16::from(u8::MAX)
            }
        };
        let one_short = |spec: &FieldSpec| "a~".repeat(spec.width).chars().take(spec.width - 1).collect::<String>();

        vec![
            ("empty", boundary_model(|_| String::new(), |_| 0, 0)),
            ("full width", boundary_model(|spec| "Z".repeat(spec.width), max_number, u8::MAX)),
            ("one short", boundary_model(one_short, |_| 1, 0xFE)),
        ]
    }

    #[test]
    fn test_boundary_round_trips() {
        let mut noisy: Vec<u8> = (0..RECORD_SIZE).map(|i| (i * 13 % 256) as u8).collect();
        noisy[..5].copy_from_slice(MAGIC);
        let templates = [("blank", RawRecord::blank()), ("noisy", RawRecord::new(noisy))];

        for (case, model) in boundary_models() {
            for (name, template) in &templates {
                let raw = build(&model, template)
                    .unwrap_or_else(|e| panic!("{} on {}: {}", case, name, e));
                assert_eq!(raw.len(), RECORD_SIZE, "{} on {}", case, name);

                let decoded = parse(&raw).unwrap();
                assert!(!decoded.is_partial(), "{} on {}", case, name);
                assert_eq!(decoded.model, model, "{} on {}", case, name);
            }
        }
    }

    #[test]
    fn test_reserved_bytes_copied_from_template() {
        let mut data = RawRecord::blank().into_bytes();
        data[28..37].copy_from_slice(b"\x01\x00\x01\x01\x01\x01\x01\x01w");
        data[311] = 0xAB;
        data[469] = 0x5A;
        let raw = build(&sample_model(), &RawRecord::new(data)).unwrap();

        assert_eq!(&raw.as_bytes()[28..37], b"\x01\x00\x01\x01\x01\x01\x01\x01w");
        assert_eq!(raw.as_bytes()[311], 0xAB);
        assert_eq!(raw.as_bytes()[469], 0x5A);
    }

    #[test]
    fn test_callsign_padding() {
        let raw = build(&sample_model(), &RawRecord::blank()).unwrap();
        assert_eq!(raw.get(13, 7), Some(&b"KG7KMV\x00"[..]));
        assert_eq!(raw.as_bytes()[20], 0x03);
    }

    #[test]
    fn test_full_width_callsign_has_no_terminator() {
        let mut model = sample_model();
        model.callsign = Some("KG7KMVX".to_string());
        let raw = build(&model, &RawRecord::blank()).unwrap();
        assert_eq!(raw.get(13, 7), Some(&b"KG7KMVX"[..]));
        assert_eq!(parse(&raw).unwrap().model.callsign.as_deref(), Some("KG7KMVX"));
    }

    #[test]
    fn test_fill_bytes() {
        let mut model = sample_model();
        model.message = Some("HI".to_string());
        model.wifi_name = Some("net".to_string());
        let raw = build(&model, &RawRecord::blank()).unwrap();

        let message = raw.get(69, 62).unwrap();
        assert_eq!(&message[..3], b"HI\x00");
        assert!(message[3..].iter().all(|&b| b == 0xFF));

        let wifi = raw.get(261, 16).unwrap();
        assert_eq!(&wifi[..3], b"net");
        assert!(wifi[3..].iter().all(|&b| b == 0x00));
    }

    #[test]
    fn test_big_endian_number() {
        let mut model = sample_model();
        model.altitude = 300;
        let raw = build(&model, &RawRecord::blank()).unwrap();
        assert_eq!(raw.get(302, 2), Some(&[0x01, 0x2C][..]));
    }

    #[test]
    fn test_frequency_command_written() {
        let model = sample_model();
        let raw = build(&model, &RawRecord::blank()).unwrap();
        let command = frequency_command(&model);
        assert_eq!(command, "1,144.3900,144.8000,0,3,0,0\r\n");

        let start = layout::FREQUENCY_COMMAND_OFFSET;
        assert_eq!(raw.get(start, command.len()), Some(command.as_bytes()));
        assert_eq!(raw.as_bytes()[start + command.len()], 0x00);
    }

    #[test]
    fn test_text_too_long() {
        let mut model = sample_model();
        model.callsign = Some("KG7KMVXX".to_string());
        let err = build(&model, &RawRecord::blank()).unwrap_err();
        assert!(matches!(err, CodecError::Encoding { field: "CALLSIGN", .. }));
    }

    #[test]
    fn test_frequency_must_fill_slot() {
        let mut model = sample_model();
        model.frequency_1 = Some("144.39".to_string());
        let err = build(&model, &RawRecord::blank()).unwrap_err();
        assert!(matches!(err, CodecError::Encoding { field: "Frequency 1", .. }));
    }

    #[test]
    fn test_number_too_large() {
        let mut model = sample_model();
        model.queue_time = 256;
        let err = build(&model, &RawRecord::blank()).unwrap_err();
        assert!(matches!(err, CodecError::Encoding { field: "Queue Time", .. }));

        let spec = spec(FieldId::IpPort).unwrap();
        assert_eq!(encode_number(spec, u16::MAX).unwrap(), vec![0xFF, 0xFF]);
    }

    #[test]
    fn test_nul_in_text_rejected() {
        let mut model = sample_model();
        model.remote_code = Some("A\0B".to_string());
        assert!(matches!(
            build(&model, &RawRecord::blank()),
            Err(CodecError::Encoding { .. })
        ));
    }

    #[test]
    fn test_unset_text_keeps_template() {
        let mut template = RawRecord::blank().into_bytes();
        template[437..441].copy_from_slice(b"SOS\x00");
        let template = RawRecord::new(template);

        let mut model = sample_model();
        model.clear(FieldId::EmergencyMessage);
        let raw = build(&model, &template).unwrap();
        assert_eq!(raw.get(437, 32), template.get(437, 32));
    }

    #[test]
    fn test_invalid_template_rejected() {
        let template = RawRecord::new(vec![0u8; 100]);
        assert!(matches!(
            build(&sample_model(), &template),
            Err(CodecError::Format(_))
        ));
    }
}
