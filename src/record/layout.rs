// Field layout of the configuration block
//
// Offsets follow the device's write path, which is the only arrangement that
// assembles to exactly RECORD_SIZE bytes. Every byte not listed here is
// reserved firmware state and is carried over from the template on encode.

use super::model::{FieldId, FieldValue};
use super::raw::{MAGIC, RECORD_SIZE};
use super::{CodecError, CodecResult};
use lazy_static::lazy_static;
use std::collections::HashMap;

/// Padding rule for a fixed-width text slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pad {
    /// Written once after the text when it is shorter than the slot
    pub terminator: Option<u8>,
    /// Written after the terminator up to the slot width
    pub fill: u8,
    /// Trailing bytes removed on decode
    pub strip: &'static [u8],
    /// Text must fill the slot exactly
    pub exact: bool,
}

impl Pad {
    /// NUL terminator, 0xFF fill
    pub const TERMINATED: Pad = Pad {
        terminator: Some(0x00),
        fill: 0xFF,
        strip: &[0x00, 0xFF],
        exact: false,
    };

    /// NUL terminator, NUL fill. An uninitialised slot reads back as 0xFF, so
    /// both bytes are still stripped.
    pub const NUL_FILLED: Pad = Pad {
        terminator: Some(0x00),
        fill: 0x00,
        strip: &[0x00, 0xFF],
        exact: false,
    };

    /// No padding at all
    pub const EXACT: Pad = Pad {
        terminator: None,
        fill: 0x00,
        strip: &[],
        exact: true,
    };
}

/// How a field's bytes map to its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Text(Pad),
    /// Big-endian unsigned integer
    Number,
    /// Single-byte index into an advisory option list
    Choice(&'static [&'static str]),
}

/// Position and encoding of one named field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub id: FieldId,
    pub offset: usize,
    pub width: usize,
    pub encoding: Encoding,
}

impl FieldSpec {
    const fn text(id: FieldId, offset: usize, width: usize, pad: Pad) -> Self {
        Self {
            id,
            offset,
            width,
            encoding: Encoding::Text(pad),
        }
    }

    const fn number(id: FieldId, offset: usize, width: usize) -> Self {
        Self {
            id,
            offset,
            width,
            encoding: Encoding::Number,
        }
    }

    const fn choice(id: FieldId, offset: usize, options: &'static [&'static str]) -> Self {
        Self {
            id,
            offset,
            width: 1,
            encoding: Encoding::Choice(options),
        }
    }

    pub fn name(&self) -> &'static str {
        self.id.name()
    }

    pub fn end(&self) -> usize {
        self.offset + self.width
    }

    /// Option labels for choice fields, empty otherwise
    pub fn options(&self) -> &'static [&'static str] {
        match self.encoding {
            Encoding::Choice(options) => options,
            _ => &[],
        }
    }
}

/// Fixed bytes the device expects at a given position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiteralSpec {
    pub offset: usize,
    pub bytes: &'static [u8],
}

impl LiteralSpec {
    pub fn end(&self) -> usize {
        self.offset + self.bytes.len()
    }
}

pub const TOGGLE: &[&str] = &["Disable", "Enable"];
pub const SMART_BEACON: &[&str] = &["OFF", "1", "2", "3", "4", "5"];
pub const MIC_E_CODES: &[&str] = &[
    "Off Duty",
    "En Route",
    "In Service",
    "Returning",
    "Committed",
    "Special",
    "Priority",
    "Emergency",
];
pub const SITE_TYPES: &[&str] = &["Fixed", "Mobile", "Weather"];
pub const BT_OUT_1: &[&str] = &["Off", "KISS hex", "UI", "GPWPL", "KISS ascii"];
pub const BT_OUT_2: &[&str] = &["Off", "GPS", "Rotator"];
pub const MODULE_POWER: &[&str] = &["Off", "On", "Tx Only", "Rx Only"];
pub const IP_PROTOCOLS: &[&str] = &["UDP", "TCP"];
pub const BRIGHTNESS: &[&str] = &["Normal", "Auto", "High"];
pub const VOLUME_STEPS: &[&str] = &[
    "-10.5dB", "-9.0dB", "-7.5dB", "-6.0dB", "-4.5dB", "-3.0dB", "-1.5dB", "0dB",
];
pub const DIGI_DELAYS: &[&str] = &["0s", "1s", "2s", "3s", "4s", "5s"];
pub const CHANNELS: &[&str] = &["CH A", "CH B", "CH A+B", "Bluetooth"];

/// Start of the frequency command fragment `1,<f1>,<f2>,0,3,0,0\r\n`
pub const FREQUENCY_COMMAND_OFFSET: usize = 133;

/// Scaffolding around the two frequency slots. Together with Frequency 1 at
/// 135 and Frequency 2 at 144 it spells the module's tuning command.
pub const LITERALS: &[LiteralSpec] = &[
    LiteralSpec {
        offset: 133,
        bytes: b"1,",
    },
    LiteralSpec {
        offset: 143,
        bytes: b",",
    },
    LiteralSpec {
        offset: 152,
        bytes: b",0,3,0,0\r\n\x00",
    },
];

/// The field table, in offset order
pub const FIELDS: &[FieldSpec] = &[
    FieldSpec::number(FieldId::TimeValue, 5, 2),
    FieldSpec::choice(FieldId::TimeEnable, 7, TOGGLE),
    FieldSpec::choice(FieldId::ManualEnable, 8, TOGGLE),
    FieldSpec::choice(FieldId::Smart, 9, SMART_BEACON),
    FieldSpec::choice(FieldId::QueueEnable, 10, TOGGLE),
    FieldSpec::number(FieldId::QueueTime, 11, 1),
    FieldSpec::number(FieldId::PttDelay, 12, 1),
    FieldSpec::text(FieldId::Callsign, 13, 7, Pad::TERMINATED),
    FieldSpec::number(FieldId::Ssid, 20, 1),
    FieldSpec::choice(FieldId::MicEEnable, 21, TOGGLE),
    FieldSpec::choice(FieldId::MicECode, 22, MIC_E_CODES),
    FieldSpec::text(FieldId::IconType, 23, 1, Pad::TERMINATED),
    FieldSpec::text(FieldId::Icon1, 24, 2, Pad::TERMINATED),
    FieldSpec::choice(FieldId::BtOut2, 26, BT_OUT_2),
    FieldSpec::choice(FieldId::BtOut1, 27, BT_OUT_1),
    // 28..37 reserved
    FieldSpec::text(FieldId::Latitude, 37, 10, Pad::TERMINATED),
    FieldSpec::choice(FieldId::SiteType, 47, SITE_TYPES),
    FieldSpec::choice(FieldId::GpsEnable, 48, TOGGLE),
    FieldSpec::number(FieldId::TimezoneOffset, 49, 1),
    FieldSpec::choice(FieldId::GpsSave, 50, TOGGLE),
    FieldSpec::choice(FieldId::BeepRx, 51, TOGGLE),
    FieldSpec::choice(FieldId::BeepTx, 52, TOGGLE),
    FieldSpec::text(FieldId::Longitude, 53, 10, Pad::TERMINATED),
    FieldSpec::choice(FieldId::BtEnable, 63, TOGGLE),
    FieldSpec::choice(FieldId::PressureEnable, 64, TOGGLE),
    FieldSpec::choice(FieldId::VoltageEnable, 65, TOGGLE),
    FieldSpec::choice(FieldId::TemperatureEnable, 66, TOGGLE),
    FieldSpec::choice(FieldId::MileageEnable, 67, TOGGLE),
    FieldSpec::choice(FieldId::SatelliteEnable, 68, TOGGLE),
    FieldSpec::text(FieldId::Message, 69, 62, Pad::TERMINATED),
    // 131..133 reserved, 133..165 frequency command (see LITERALS)
    FieldSpec::text(FieldId::Frequency1, 135, 8, Pad::EXACT),
    FieldSpec::text(FieldId::Frequency2, 144, 8, Pad::EXACT),
    FieldSpec::choice(FieldId::ModulePower, 165, MODULE_POWER),
    FieldSpec::number(FieldId::ModuleVolume, 166, 1),
    FieldSpec::number(FieldId::ModuleMic, 167, 1),
    FieldSpec::number(FieldId::AutoPoweroff, 169, 1),
    FieldSpec::choice(FieldId::WifiEnable, 180, TOGGLE),
    FieldSpec::choice(FieldId::IpProtocol, 184, IP_PROTOCOLS),
    FieldSpec::number(FieldId::IpPort, 185, 2),
    FieldSpec::choice(FieldId::OdometerEnable, 192, TOGGLE),
    FieldSpec::text(FieldId::Icon2, 193, 2, Pad::TERMINATED),
    FieldSpec::number(FieldId::Icon2Time, 195, 2),
    FieldSpec::text(FieldId::IpAddress, 197, 33, Pad::TERMINATED),
    FieldSpec::text(FieldId::WifiName, 261, 16, Pad::NUL_FILLED),
    FieldSpec::text(FieldId::WifiCode, 277, 16, Pad::NUL_FILLED),
    // 293..302 reserved ("START1" block)
    FieldSpec::number(FieldId::Altitude, 302, 2),
    FieldSpec::choice(FieldId::LastPosition, 307, TOGGLE),
    FieldSpec::choice(FieldId::SixKnots, 308, TOGGLE),
    FieldSpec::choice(FieldId::Stop30mAlarm, 309, TOGGLE),
    FieldSpec::choice(FieldId::Stop60mEmergency, 310, TOGGLE),
    // 311..437 reserved
    FieldSpec::text(FieldId::EmergencyMessage, 437, 32, Pad::TERMINATED),
    FieldSpec::choice(FieldId::Brightness, 470, BRIGHTNESS),
    FieldSpec::choice(FieldId::AlertEnable, 471, TOGGLE),
    FieldSpec::choice(FieldId::VolumeTx, 472, VOLUME_STEPS),
    FieldSpec::choice(FieldId::VolumeRx, 473, VOLUME_STEPS),
    FieldSpec::choice(FieldId::DigiDelay, 474, DIGI_DELAYS),
    FieldSpec::choice(FieldId::DigiChannel, 475, CHANNELS),
    FieldSpec::number(FieldId::BeaconChannel, 476, 1),
    FieldSpec::text(FieldId::RemoteCode, 477, 7, Pad::TERMINATED),
    FieldSpec::number(FieldId::BacklightTimeout, 484, 1),
    FieldSpec::text(FieldId::Path1, 485, 7, Pad::TERMINATED),
    FieldSpec::number(FieldId::Path1Hops, 492, 1),
    FieldSpec::text(FieldId::Path2, 493, 7, Pad::TERMINATED),
    FieldSpec::number(FieldId::Path2Hops, 500, 1),
    FieldSpec::text(FieldId::Digi1, 501, 7, Pad::TERMINATED),
    FieldSpec::choice(FieldId::Digi1Enable, 508, TOGGLE),
    FieldSpec::text(FieldId::Digi2, 509, 7, Pad::TERMINATED),
    FieldSpec::choice(FieldId::Digi2Enable, 516, TOGGLE),
];

lazy_static! {
    static ref FIELD_INDEX: HashMap<FieldId, &'static FieldSpec> =
        FIELDS.iter().map(|spec| (spec.id, spec)).collect();
}

/// Layout entry for a field
pub fn spec(id: FieldId) -> Option<&'static FieldSpec> {
    FIELD_INDEX.get(&id).copied()
}

/// A span of the block the codec writes
#[derive(Debug, Clone, Copy)]
pub enum Segment {
    Field(&'static FieldSpec),
    Literal(&'static LiteralSpec),
}

impl Segment {
    pub fn offset(&self) -> usize {
        match self {
            Segment::Field(spec) => spec.offset,
            Segment::Literal(lit) => lit.offset,
        }
    }

    pub fn width(&self) -> usize {
        match self {
            Segment::Field(spec) => spec.width,
            Segment::Literal(lit) => lit.bytes.len(),
        }
    }

    fn label(&self) -> String {
        match self {
            Segment::Field(spec) => spec.name().to_string(),
            Segment::Literal(lit) => format!("literal @{}", lit.offset),
        }
    }
}

/// All fields and literals, sorted by offset
pub fn segments() -> Vec<Segment> {
    let mut segments: Vec<Segment> = FIELDS
        .iter()
        .map(Segment::Field)
        .chain(LITERALS.iter().map(Segment::Literal))
        .collect();
    segments.sort_by_key(|s| s.offset());
    segments
}

/// Check the structural invariants of the built-in table.
///
/// Any failure here is a defect in the table itself, reported as
/// [`CodecError::Size`].
pub fn verify() -> CodecResult<()> {
    verify_segments(&segments())
}

/// Check that `segments` stay clear of the magic and of each other, fit in
/// one block, and give numbers and choices a width the codec supports
pub fn verify_segments(segments: &[Segment]) -> CodecResult<()> {
    let mut sorted = segments.to_vec();
    sorted.sort_by_key(|s| s.offset());
    let mut cursor = MAGIC.len();

    for segment in sorted {
        let offset = segment.offset();
        let width = segment.width();

        if width == 0 {
            return Err(CodecError::Size(format!("{} has zero width", segment.label())));
        }
        if offset < cursor {
            return Err(CodecError::Size(format!(
                "{} at {} overlaps previous segment ending at {}",
                segment.label(),
                offset,
                cursor
            )));
        }
        if offset + width > RECORD_SIZE {
            return Err(CodecError::Size(format!(
                "{} ends at {}, past the {}-byte block",
                segment.label(),
                offset + width,
                RECORD_SIZE
            )));
        }
        if let Segment::Field(spec) = segment {
            let ok = match spec.encoding {
                Encoding::Number => (1..=2).contains(&spec.width),
                Encoding::Choice(_) => spec.width == 1,
                Encoding::Text(_) => true,
            };
            if !ok {
                return Err(CodecError::Size(format!(
                    "{} has unsupported width {}",
                    spec.name(),
                    spec.width
                )));
            }
        }
        cursor = offset + width;
    }

    Ok(())
}

/// Human-readable form of a value, using option labels for choices
pub fn describe(id: FieldId, value: &FieldValue) -> String {
    match (value, spec(id)) {
        (FieldValue::Choice(index), Some(spec)) => match spec.options().get(*index as usize) {
            Some(label) => (*label).to_string(),
            None => format!("Unknown ({})", index),
        },
        (value, _) => value.to_string(),
    }
}
