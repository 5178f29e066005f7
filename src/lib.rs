// X1C3-RS: configuration tool for X1C3 APRS trackers
// Copyright 2024 - Licensed under GPLv3

pub mod core;
pub mod editor;
pub mod formats;
pub mod record;
pub mod serial;

// Re-export commonly used types
pub use crate::core::{ConfigStore, StoreError};
pub use formats::{load_record, save_record, FileError};
pub use record::{build, parse, CodecError, ConfigModel, FieldId, FieldValue, RawRecord, RECORD_SIZE};
pub use serial::{DeviceInfo, DevicePort, SerialConfig, Transport, TransportError};

/// X1C3-RS version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
