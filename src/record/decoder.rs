// Raw block -> ConfigModel

use super::layout::{self, Encoding, FieldSpec, Pad};
use super::model::{ConfigModel, FieldId, FieldValue};
use super::raw::RawRecord;
use super::{CodecError, CodecResult};

/// Result of decoding a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub model: ConfigModel,
    /// Text fields whose bytes were not valid text and were left unset
    pub skipped: Vec<FieldId>,
}

impl Decoded {
    /// True when at least one field could not be decoded
    pub fn is_partial(&self) -> bool {
        !self.skipped.is_empty()
    }
}

/// Decode a block.
///
/// Fails only when the block itself is malformed. A text field holding
/// invalid bytes is logged and skipped so the rest of the block still loads.
pub fn parse(raw: &RawRecord) -> CodecResult<Decoded> {
    raw.validate()?;

    let mut model = ConfigModel::default();
    let mut skipped = Vec::new();

    for spec in layout::FIELDS {
        let bytes = slot(raw, spec)?;

        match decode_field(spec, bytes) {
            Some(value) => model.set(spec.id, value)?,
            None => {
                tracing::warn!(
                    "{} at offset {} is not valid text: {:02X?}",
                    spec.name(),
                    spec.offset,
                    bytes
                );
                skipped.push(spec.id);
            }
        }
    }

    for literal in layout::LITERALS {
        if raw.get(literal.offset, literal.bytes.len()) != Some(literal.bytes) {
            tracing::warn!(
                "Unexpected bytes at offset {}, expected {:?}",
                literal.offset,
                String::from_utf8_lossy(literal.bytes)
            );
        }
    }

    Ok(Decoded { model, skipped })
}

fn slot<'a>(raw: &'a RawRecord, spec: &FieldSpec) -> CodecResult<&'a [u8]> {
    raw.get(spec.offset, spec.width).ok_or_else(|| {
        CodecError::Size(format!(
            "{} at {}+{} lies outside the block",
            spec.name(),
            spec.offset,
            spec.width
        ))
    })
}

/// Value held in one slot, or `None` when a text slot does not hold text.
///
/// The encoder uses this on the template to tell edited fields from
/// untouched ones.
pub(crate) fn decode_field(spec: &FieldSpec, bytes: &[u8]) -> Option<FieldValue> {
    match spec.encoding {
        Encoding::Text(pad) => decode_text(bytes, &pad).map(FieldValue::Text),
        Encoding::Number => Some(FieldValue::Number(decode_number(bytes))),
        Encoding::Choice(options) => {
            let index = bytes[0];
            if index as usize >= options.len() {
                tracing::debug!(
                    "{} holds index {} outside its {} options",
                    spec.name(),
                    index,
                    options.len()
                );
            }
            Some(FieldValue::Choice(index))
        }
    }
}

/// Strip trailing pad bytes and decode as UTF-8.
///
/// Unpadded slots must hold printable ASCII throughout.
fn decode_text(bytes: &[u8], pad: &Pad) -> Option<String> {
    if pad.exact && !bytes.iter().all(|b| (0x20..=0x7e).contains(b)) {
        return None;
    }
    let end = bytes
        .iter()
        .rposition(|b| !pad.strip.contains(b))
        .map_or(0, |i| i + 1);
    String::from_utf8(bytes[..end].to_vec()).ok()
}

/// Big-endian unsigned integer of one or two bytes
fn decode_number(bytes: &[u8]) -> u16 {
    bytes
        .iter()
        .fold(0u16, |acc, &b| (acc << 8) | u16::from(b))
}
