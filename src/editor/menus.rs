// Menu tables for the interactive editor

use super::prompt::{Constraint, Pattern, Prompt};
use crate::record::{ConfigModel, FieldId};

/// A titled group of prompts
#[derive(Debug, Clone, Copy)]
pub struct Menu {
    pub title: &'static str,
    pub items: &'static [Prompt],
}

impl Menu {
    /// One line per item: index, label and current value
    pub fn render(&self, model: &ConfigModel) -> Vec<String> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, prompt)| format!("{:>2} - {:<20}: {}", i + 1, prompt.label, prompt.display(model)))
            .collect()
    }

    /// Item by its 1-based menu number
    pub fn item(&self, number: usize) -> Option<&'static Prompt> {
        number.checked_sub(1).and_then(|i| self.items.get(i))
    }
}

const fn text(field: FieldId, label: &'static str, max: usize) -> Prompt {
    Prompt::new(field, label, Constraint::Text { max, upper: false })
}

const fn upper(field: FieldId, label: &'static str, max: usize) -> Prompt {
    Prompt::new(field, label, Constraint::Text { max, upper: true })
}

const fn number(field: FieldId, label: &'static str, max: u16) -> Prompt {
    Prompt::new(field, label, Constraint::Number { max })
}

const fn toggle(field: FieldId, label: &'static str) -> Prompt {
    Prompt::new(field, label, Constraint::Toggle)
}

const fn options(field: FieldId, label: &'static str) -> Prompt {
    Prompt::new(field, label, Constraint::Options)
}

const fn pattern(field: FieldId, label: &'static str, pattern: Pattern) -> Prompt {
    Prompt::new(field, label, Constraint::Pattern(pattern))
}

pub const SETUP: Menu = Menu {
    title: "Setup",
    items: &[
        upper(FieldId::Callsign, "Callsign", 7),
        number(FieldId::Ssid, "SSID", 15),
        options(FieldId::SiteType, "Site Type"),
        toggle(FieldId::GpsEnable, "GPS Enable"),
        text(FieldId::IconType, "Icon Table", 1),
        text(FieldId::Icon1, "Icon 1", 2),
        text(FieldId::Icon2, "Icon 2", 2),
        number(FieldId::Icon2Time, "Icon 2 Time", 9999),
        number(FieldId::TimezoneOffset, "Timezone Offset", 255),
        upper(FieldId::RemoteCode, "Remote Code", 7),
    ],
};

pub const BEACON: Menu = Menu {
    title: "Beacon",
    items: &[
        options(FieldId::Smart, "Smart Beacon"),
        toggle(FieldId::ManualEnable, "Manual Enable"),
        toggle(FieldId::GpsSave, "GPS Save"),
        toggle(FieldId::QueueEnable, "Queue Enable"),
        number(FieldId::QueueTime, "Queue Time", 255),
        toggle(FieldId::TimeEnable, "Time Enable"),
        number(FieldId::TimeValue, "Time Value", 9999),
        number(FieldId::PttDelay, "PTT Delay", 255),
        toggle(FieldId::MicEEnable, "MIC-E Enable"),
        options(FieldId::MicECode, "MIC-E Code"),
        text(FieldId::Message, "Message", 60),
        toggle(FieldId::PressureEnable, "Pressure"),
        toggle(FieldId::VoltageEnable, "Voltage"),
        toggle(FieldId::TemperatureEnable, "Temperature"),
        toggle(FieldId::MileageEnable, "Mileage"),
        toggle(FieldId::SatelliteEnable, "Satellites"),
        toggle(FieldId::OdometerEnable, "Odometer"),
    ],
};

pub const BLUETOOTH: Menu = Menu {
    title: "Bluetooth",
    items: &[
        toggle(FieldId::BtEnable, "BT Enable"),
        options(FieldId::BtOut1, "BT Out 1"),
        options(FieldId::BtOut2, "BT Out 2"),
    ],
};

pub const FIXED: Menu = Menu {
    title: "Fixed Position",
    items: &[
        pattern(FieldId::Latitude, "Latitude", Pattern::Latitude),
        pattern(FieldId::Longitude, "Longitude", Pattern::Longitude),
        number(FieldId::Altitude, "Altitude", 9999),
    ],
};

pub const WIFI: Menu = Menu {
    title: "WiFi",
    items: &[
        toggle(FieldId::WifiEnable, "Wifi Enable"),
        text(FieldId::WifiName, "Wifi Name", 16),
        text(FieldId::WifiCode, "Wifi Password", 16),
        text(FieldId::IpAddress, "IP Address", 31),
        number(FieldId::IpPort, "IP Port", u16::MAX),
        options(FieldId::IpProtocol, "IP Protocol"),
    ],
};

pub const DIGIPEATER: Menu = Menu {
    title: "Digipeater",
    items: &[
        toggle(FieldId::Digi1Enable, "DIGI 1 Enable"),
        upper(FieldId::Digi1, "DIGI 1", 7),
        toggle(FieldId::Digi2Enable, "DIGI 2 Enable"),
        upper(FieldId::Digi2, "DIGI 2", 7),
        options(FieldId::DigiDelay, "DIGI Delay"),
        options(FieldId::DigiChannel, "DIGI Channel"),
        upper(FieldId::Path1, "PATH 1", 7),
        number(FieldId::Path1Hops, "PATH 1 Hops", 7),
        upper(FieldId::Path2, "PATH 2", 7),
        number(FieldId::Path2Hops, "PATH 2 Hops", 7),
        number(FieldId::BeaconChannel, "Beacon Channel", 255),
    ],
};

pub const AUDIO: Menu = Menu {
    title: "Audio",
    items: &[
        options(FieldId::VolumeTx, "Volume TX"),
        options(FieldId::VolumeRx, "Volume RX"),
        toggle(FieldId::BeepTx, "Beep TX"),
        toggle(FieldId::BeepRx, "Beep RX"),
    ],
};

pub const RF_MODULE: Menu = Menu {
    title: "RF Module",
    items: &[
        options(FieldId::ModulePower, "Module Power"),
        pattern(FieldId::Frequency1, "Frequency 1", Pattern::Frequency),
        pattern(FieldId::Frequency2, "Frequency 2", Pattern::Frequency),
        number(FieldId::ModuleVolume, "Module Volume", 9),
        number(FieldId::ModuleMic, "Module Mic", 8),
    ],
};

pub const X1C5: Menu = Menu {
    title: "X1C5",
    items: &[
        options(FieldId::Brightness, "Brightness"),
        number(FieldId::BacklightTimeout, "Backlight Timeout", 255),
        toggle(FieldId::AlertEnable, "Alert Enable"),
        toggle(FieldId::LastPosition, "Last Position"),
        toggle(FieldId::SixKnots, "Six Knots"),
        toggle(FieldId::Stop30mAlarm, "Stop 30m Alarm"),
        toggle(FieldId::Stop60mEmergency, "Stop 60m Emergency"),
        text(FieldId::EmergencyMessage, "Emergency Message", 31),
        number(FieldId::AutoPoweroff, "Auto Poweroff", 255),
    ],
};

/// Top-level menu, in display order
pub const MENUS: &[Menu] = &[
    SETUP, BEACON, BLUETOOTH, FIXED, WIFI, DIGIPEATER, AUDIO, RF_MODULE, X1C5,
];

/// The prompt that edits `field`
pub fn prompt_for(field: FieldId) -> Option<&'static Prompt> {
    MENUS
        .iter()
        .flat_map(|menu| menu.items.iter())
        .find(|prompt| prompt.field == field)
}
