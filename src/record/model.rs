// Typed configuration model
//
// One attribute per device field. The `config_model!` invocation below is the
// only place field identifiers, attribute names and display names are tied
// together; offsets live in the layout table.

use super::{CodecError, CodecResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of value a field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Text,
    Number,
    Choice,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Text => write!(f, "text"),
            FieldKind::Number => write!(f, "number"),
            FieldKind::Choice => write!(f, "choice"),
        }
    }
}

/// A single field value, used for table-driven access to [`ConfigModel`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),
    Number(u16),
    /// Zero-based index into the field's option list; may lie outside it
    Choice(u8),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Number(_) => FieldKind::Number,
            FieldValue::Choice(_) => FieldKind::Choice,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Choice(i) => write!(f, "{}", i),
        }
    }
}

macro_rules! config_model {
    (
        text { $($t_id:ident => $t_field:ident, $t_name:literal;)* }
        number { $($n_id:ident => $n_field:ident, $n_name:literal;)* }
        choice { $($c_id:ident => $c_field:ident, $c_name:literal;)* }
    ) => {
        /// Identifier of a named configuration field
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum FieldId {
            $($t_id,)*
            $($n_id,)*
            $($c_id,)*
        }

        impl FieldId {
            /// Every field, text first, then numbers, then choices
            pub const ALL: &'static [FieldId] = &[
                $(FieldId::$t_id,)*
                $(FieldId::$n_id,)*
                $(FieldId::$c_id,)*
            ];

            /// Display name, as the device documentation spells it
            pub fn name(self) -> &'static str {
                match self {
                    $(FieldId::$t_id => $t_name,)*
                    $(FieldId::$n_id => $n_name,)*
                    $(FieldId::$c_id => $c_name,)*
                }
            }

            pub fn kind(self) -> FieldKind {
                match self {
                    $(FieldId::$t_id => FieldKind::Text,)*
                    $(FieldId::$n_id => FieldKind::Number,)*
                    $(FieldId::$c_id => FieldKind::Choice,)*
                }
            }
        }

        /// Decoded configuration block
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct ConfigModel {
            $(pub $t_field: Option<String>,)*
            $(pub $n_field: u16,)*
            $(pub $c_field: u8,)*
        }

        impl ConfigModel {
            /// Current value of a field; `None` for a text field that was not decoded
            pub fn get(&self, id: FieldId) -> Option<FieldValue> {
                match id {
                    $(FieldId::$t_id => self.$t_field.clone().map(FieldValue::Text),)*
                    $(FieldId::$n_id => Some(FieldValue::Number(self.$n_field)),)*
                    $(FieldId::$c_id => Some(FieldValue::Choice(self.$c_field)),)*
                }
            }

            /// Set a field, rejecting a value of the wrong kind
            pub fn set(&mut self, id: FieldId, value: FieldValue) -> CodecResult<()> {
                match (id, value) {
                    $((FieldId::$t_id, FieldValue::Text(v)) => self.$t_field = Some(v),)*
                    $((FieldId::$n_id, FieldValue::Number(v)) => self.$n_field = v,)*
                    $((FieldId::$c_id, FieldValue::Choice(v)) => self.$c_field = v,)*
                    (id, value) => {
                        return Err(CodecError::FieldKind {
                            field: id.name(),
                            expected: id.kind(),
                            found: value.kind(),
                        })
                    }
                }
                Ok(())
            }

            /// Mark a text field as absent so the encoder keeps the template bytes
            pub fn clear(&mut self, id: FieldId) {
                match id {
                    $(FieldId::$t_id => self.$t_field = None,)*
                    _ => {}
                }
            }
        }
    };
}

config_model! {
    text {
        Callsign => callsign, "CALLSIGN";
        IconType => icon_type, "Type";
        Icon1 => icon_1, "Icon 1";
        Latitude => latitude, "Latitude";
        Longitude => longitude, "Longitude";
        Message => message, "Message";
        Frequency1 => frequency_1, "Frequency 1";
        Frequency2 => frequency_2, "Frequency 2";
        Icon2 => icon_2, "Icon 2";
        IpAddress => ip_address, "IP Address";
        WifiName => wifi_name, "Wifi Name";
        WifiCode => wifi_code, "Wifi Code";
        EmergencyMessage => emergency_message, "Emergency Message";
        RemoteCode => remote_code, "Remote Code";
        Path1 => path_1, "PATH 1";
        Path2 => path_2, "PATH 2";
        Digi1 => digi_1, "DIGI 1";
        Digi2 => digi_2, "DIGI 2";
    }
    number {
        TimeValue => time_value, "Time Value";
        QueueTime => queue_time, "Queue Time";
        PttDelay => ptt_delay, "PTT Delay";
        Ssid => ssid, "SSID";
        TimezoneOffset => timezone_offset, "Timezone Offset";
        ModuleVolume => module_volume, "Module Volume";
        ModuleMic => module_mic, "Module Mic";
        AutoPoweroff => auto_poweroff, "Auto Poweroff";
        IpPort => ip_port, "IP Port";
        Icon2Time => icon_2_time, "Icon 2 Time";
        Altitude => altitude, "Altitude";
        BeaconChannel => beacon_channel, "Beacon Channel";
        BacklightTimeout => backlight_timeout, "Backlight Timeout";
        Path1Hops => path_1_hops, "PATH 1 Hops";
        Path2Hops => path_2_hops, "PATH 2 Hops";
    }
    choice {
        TimeEnable => time_enable, "Time Enable";
        ManualEnable => manual_enable, "Manual Enable";
        Smart => smart, "Smart";
        QueueEnable => queue_enable, "Queue Enable";
        MicEEnable => mic_e_enable, "MIC-E Enable";
        MicECode => mic_e_code, "MIC-E Code";
        BtOut2 => bt_out_2, "BT Out 2";
        BtOut1 => bt_out_1, "BT Out 1";
        SiteType => site_type, "Site Type";
        GpsEnable => gps_enable, "GPS Enable";
        GpsSave => gps_save, "GPS Save";
        BeepRx => beep_rx, "Beep RX";
        BeepTx => beep_tx, "Beep TX";
        BtEnable => bt_enable, "BT Enable";
        PressureEnable => pressure_enable, "Pressure Enable";
        VoltageEnable => voltage_enable, "Voltage Enable";
        TemperatureEnable => temperature_enable, "Temperature Enable";
        MileageEnable => mileage_enable, "Mileage Enable";
        SatelliteEnable => satellite_enable, "Satellite Enable";
        ModulePower => module_power, "Module Power";
        WifiEnable => wifi_enable, "Wifi Enable";
        IpProtocol => ip_protocol, "IP Protocol";
        OdometerEnable => odometer_enable, "Odometer Enable";
        LastPosition => last_position, "Last Position";
        SixKnots => six_knots, "Six Knots";
        Stop30mAlarm => stop_30m_alarm, "Stop 30m Alarm";
        Stop60mEmergency => stop_60m_emergency, "Stop 60m Emergency";
        Brightness => brightness, "Brightness";
        AlertEnable => alert_enable, "Alert Enable";
        VolumeTx => volume_tx, "Volume TX";
        VolumeRx => volume_rx, "Volume RX";
        DigiDelay => digi_delay, "DIGI Delay";
        DigiChannel => digi_channel, "DIGI Channel";
        Digi1Enable => digi_1_enable, "DIGI 1 Enable";
        Digi2Enable => digi_2_enable, "DIGI 2 Enable";
    }
}

impl FieldId {
    /// Look up a field by display name, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
