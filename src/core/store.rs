// Editing session: the decoded model plus the block it came from

use crate::formats::record_file::{self, FileError};
use crate::record::{self, CodecError, ConfigModel, RawRecord};
use crate::serial::{DeviceInfo, PortOpener, Transport, TransportError};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("No configuration loaded")]
    Empty,

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    File(#[from] FileError),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// In-memory configuration owned by the application.
///
/// Holds the model being edited and the raw block it was decoded from. That
/// block is the template for the next encode, so reserved bytes survive an
/// edit untouched.
#[derive(Debug, Default)]
pub struct ConfigStore {
    model: Option<ConfigModel>,
    template: Option<RawRecord>,
    partially_parsed: bool,
    device: Option<DeviceInfo>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once a block has been loaded
    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    /// True when the last loaded block had fields that could not be decoded
    pub fn is_partial(&self) -> bool {
        self.partially_parsed
    }

    pub fn model(&self) -> Option<&ConfigModel> {
        self.model.as_ref()
    }

    pub fn model_mut(&mut self) -> Option<&mut ConfigModel> {
        self.model.as_mut()
    }

    /// The block the model was decoded from
    pub fn template(&self) -> Option<&RawRecord> {
        self.template.as_ref()
    }

    /// Last version information read from the device
    pub fn device(&self) -> Option<&DeviceInfo> {
        self.device.as_ref()
    }

    /// Decode a block and make it the current session, replacing any previous one
    pub fn load(&mut self, raw: RawRecord) -> StoreResult<()> {
        let decoded = record::parse(&raw)?;
        if decoded.is_partial() {
            tracing::warn!(
                "Configuration partially loaded, skipped: {}",
                decoded
                    .skipped
                    .iter()
                    .map(|id| id.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        self.partially_parsed = decoded.is_partial();
        self.model = Some(decoded.model);
        self.template = Some(raw);
        Ok(())
    }

    /// Encode the current model against the last loaded block
    pub fn encode(&self) -> StoreResult<RawRecord> {
        match (&self.model, &self.template) {
            (Some(model), Some(template)) => Ok(record::build(model, template)?),
            _ => Err(StoreError::Empty),
        }
    }

    /// Encode the model and adopt the result as the new template
    pub fn commit(&mut self) -> StoreResult<RawRecord> {
        let raw = self.encode()?;
        self.template = Some(raw.clone());
        Ok(raw)
    }

    pub fn load_file(&mut self, path: impl AsRef<Path>) -> StoreResult<()> {
        let raw = record_file::load_record(path)?;
        self.load(raw)
    }

    pub fn save_file(&mut self, path: impl AsRef<Path>) -> StoreResult<()> {
        let raw = self.commit()?;
        record_file::save_record(path, &raw)?;
        Ok(())
    }

    /// Write the block exactly as it was loaded, without re-encoding the model
    pub fn save_template(&self, path: impl AsRef<Path>) -> StoreResult<()> {
        let raw = self.template.as_ref().ok_or(StoreError::Empty)?;
        record_file::save_record(path, raw)?;
        Ok(())
    }

    /// Query the device's version, remembering it for display
    pub async fn identify<O: PortOpener>(&mut self, transport: &Transport<O>) -> StoreResult<&DeviceInfo> {
        let info = transport.version().await?;
        tracing::info!("Device firmware {}, battery {}", info.firmware, info.voltage);
        let info: &DeviceInfo = self.device.insert(info);
        Ok(info)
    }

    /// Read the block from the device and load it
    pub async fn fetch<O: PortOpener>(&mut self, transport: &Transport<O>) -> StoreResult<()> {
        let raw = transport.fetch_valid().await?;
        self.load(raw)
    }

    /// Encode the model and write it to the device
    pub async fn send<O: PortOpener>(&mut self, transport: &Transport<O>) -> StoreResult<u8> {
        let raw = self.commit()?;
        Ok(transport.send(&raw).await?)
    }
}
