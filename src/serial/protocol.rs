// Request/response exchanges with the tracker
//
// Every exchange opens the port, performs one command/response and drops the
// port before returning, whatever the outcome. Nothing is retried.

use super::comm::{PortOpener, SerialError, SerialLink};
use crate::record::{CodecError, RawRecord, RECORD_SIZE};
use std::time::Duration;
use thiserror::Error;

/// Version query
pub const VERSION_COMMAND: &[u8] = b"AT+VER=?\r\n";

/// Bulk read of the configuration block
pub const READ_COMMAND: &[u8] = b"AT+SET=READ\r\n\n";

/// Prefix of a bulk write; the block minus its first six bytes follows
pub const WRITE_COMMAND: &[u8] = b"AT+SET=WRITE";

/// Shortest version line accepted
const MIN_VERSION_LEN: usize = 10;

/// Longest version line read before giving up on the terminator
const MAX_VERSION_LEN: usize = 256;

#[derive(Error, Debug)]
pub enum TransportError {
    /// Port unavailable, I/O failure or timeout
    #[error(transparent)]
    Serial(#[from] SerialError),

    #[error("Short response: expected at least {expected} bytes, got {got}")]
    ShortResponse { expected: usize, got: usize },

    #[error("Invalid response from device: {0}")]
    InvalidResponse(String),

    /// The block handed over for writing, or returned by
    /// [`Transport::fetch_valid`], is malformed. [`Transport::fetch`] never
    /// produces this; it returns whatever arrived.
    #[error(transparent)]
    Record(#[from] CodecError),
}

pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Firmware version and battery voltage reported by the device
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    pub firmware: String,
    pub voltage: String,
}

impl DeviceInfo {
    /// Parse the `|`-delimited version line.
    ///
    /// The firmware version starts at character 6 of the first segment and the
    /// voltage at character 10 of the third.
    pub fn parse(line: &str) -> TransportResult<Self> {
        let segments: Vec<&str> = line.trim_end().split('|').collect();

        let firmware = segments
            .first()
            .and_then(|s| s.get(6..))
            .ok_or_else(|| TransportError::InvalidResponse(format!("no version in {:?}", line)))?;
        let voltage = segments
            .get(2)
            .and_then(|s| s.get(10..))
            .ok_or_else(|| TransportError::InvalidResponse(format!("no voltage in {:?}", line)))?;

        Ok(Self {
            firmware: firmware.trim().to_string(),
            voltage: voltage.trim().to_string(),
        })
    }
}

/// Stateless command/response exchanges over a port opener
pub struct Transport<O: PortOpener> {
    opener: O,
    version_timeout: Duration,
    transfer_timeout: Duration,
}

impl<O: PortOpener> Transport<O> {
    pub fn new(opener: O) -> Self {
        Self {
            opener,
            version_timeout: Duration::from_secs(1),
            transfer_timeout: Duration::from_secs(3),
        }
    }

    /// Override the per-open timeouts
    pub fn with_timeouts(mut self, version: Duration, transfer: Duration) -> Self {
        self.version_timeout = version;
        self.transfer_timeout = transfer;
        self
    }

    pub fn opener(&self) -> &O {
        &self.opener
    }

    /// Ask the device for its firmware version and battery voltage
    pub async fn version(&self) -> TransportResult<DeviceInfo> {
        tracing::info!("Reading version");
        let mut port = self.opener.open(self.version_timeout)?;

        port.write_all(VERSION_COMMAND).await?;
        port.flush().await?;

        let line = read_line(&mut port, MAX_VERSION_LEN).await?;
        tracing::debug!("Version response: {:?}", String::from_utf8_lossy(&line));

        if line.len() < MIN_VERSION_LEN {
            return Err(TransportError::ShortResponse {
                expected: MIN_VERSION_LEN,
                got: line.len(),
            });
        }

        DeviceInfo::parse(&String::from_utf8_lossy(&line))
    }

    /// Read the configuration block from the device without checking it.
    ///
    /// A malformed block (bad magic) is logged and still returned so it can be
    /// dumped. Use [`Transport::fetch_valid`] when the block will be decoded
    /// or written back.
    pub async fn fetch(&self) -> TransportResult<RawRecord> {
        tracing::info!("Reading configuration block");
        let mut port = self.opener.open(self.transfer_timeout)?;

        port.write_all(READ_COMMAND).await?;
        port.flush().await?;

        let mut data = vec![0u8; RECORD_SIZE];
        port.read_exact(&mut data).await?;

        let record = RawRecord::new(data);
        if let Err(e) = record.validate() {
            tracing::warn!("Device returned a malformed block: {}", e);
        }
        tracing::debug!("Received {} bytes", record.len());
        Ok(record)
    }

    /// Read the configuration block, failing with [`TransportError::Record`]
    /// unless it is a valid block
    pub async fn fetch_valid(&self) -> TransportResult<RawRecord> {
        let record = self.fetch().await?;
        record.validate()?;
        Ok(record)
    }

    /// Write a configuration block to the device, returning its acknowledgement byte
    pub async fn send(&self, record: &RawRecord) -> TransportResult<u8> {
        record.validate()?;

        tracing::info!("Writing configuration block");
        let mut port = self.opener.open(self.transfer_timeout)?;

        let mut command = Vec::with_capacity(WRITE_COMMAND.len() + RECORD_SIZE);
        command.extend_from_slice(WRITE_COMMAND);
        command.extend_from_slice(record.write_payload());
        tracing::debug!("Sending {} bytes", command.len());

        port.write_all(&command).await?;
        port.flush().await?;

        let mut ack = [0u8; 1];
        port.read_exact(&mut ack).await?;
        tracing::info!("Write acknowledged with {:#04x}", ack[0]);
        Ok(ack[0])
    }
}

/// Read up to a newline.
///
/// A timeout after some bytes arrived ends the line; a timeout before any
/// byte is an error.
pub async fn read_line<L: SerialLink>(port: &mut L, max_len: usize) -> TransportResult<Vec<u8>> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];

    while line.len() < max_len {
        match port.read_exact(&mut byte).await {
            Ok(()) => {
                line.push(byte[0]);
                if byte[0] == b'\n' {
                    break;
                }
            }
            Err(SerialError::Timeout(_)) if !line.is_empty() => break,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(line)
}
