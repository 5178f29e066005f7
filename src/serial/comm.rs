// Serial port abstraction with async timeouts
// Wraps the serialport crate; reads poll the blocking port under tokio timeouts

use std::io::{self, Read, Write};
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;

#[derive(Error, Debug)]
pub enum SerialError {
    #[error("Serial port error: {0}")]
    Port(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Port not open")]
    NotOpen,
}

pub type Result<T> = std::result::Result<T, SerialError>;

/// Serial port configuration
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Baud rate; the tracker talks at 9600
    pub baud_rate: u32,

    pub data_bits: serialport::DataBits,

    pub stop_bits: serialport::StopBits,

    pub parity: serialport::Parity,

    pub flow_control: serialport::FlowControl,

    /// Read/write timeout for one exchange
    pub timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            data_bits: serialport::DataBits::Eight,
            stop_bits: serialport::StopBits::One,
            parity: serialport::Parity::None,
            flow_control: serialport::FlowControl::None,
            timeout: Duration::from_secs(3),
        }
    }
}

impl SerialConfig {
    /// Create a new configuration with specified baud rate
    pub fn new(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            ..Default::default()
        }
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Byte-level operations a request/response exchange needs
pub trait SerialLink {
    /// Read exactly `buf.len()` bytes or fail with a timeout
    async fn read_exact(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Write all bytes
    async fn write_all(&mut self, buf: &[u8]) -> Result<()>;

    /// Flush the output buffer
    async fn flush(&mut self) -> Result<()>;
}

/// Something that can open a fresh link for one exchange.
///
/// The returned port is owned by the caller and closed when dropped, so an
/// exchange holds the device only for its own duration.
pub trait PortOpener {
    type Port: SerialLink;

    fn open(&self, timeout: Duration) -> Result<Self::Port>;
}

/// Async serial port wrapper
pub struct SerialPort {
    port: Option<Box<dyn serialport::SerialPort>>,
    config: SerialConfig,
    port_name: String,
}

impl SerialPort {
    /// Open a serial port with the given configuration
    pub fn open(port_name: &str, config: SerialConfig) -> Result<Self> {
        let mut port = serialport::new(port_name, config.baud_rate)
            .data_bits(config.data_bits)
            .stop_bits(config.stop_bits)
            .parity(config.parity)
            .flow_control(config.flow_control)
            .timeout(config.timeout)
            .open()
            .map_err(|e| SerialError::Port(format!("{}: {}", port_name, e)))?;

        // USB adapters on the tracker expect both lines asserted
        let _ = port.write_data_terminal_ready(true);
        let _ = port.write_request_to_send(true);

        tracing::debug!("Opened {} at {} baud", port_name, config.baud_rate);

        Ok(Self {
            port: Some(port),
            config,
            port_name: port_name.to_string(),
        })
    }

    /// Discard anything the device sent before this exchange
    pub fn clear_input(&mut self) -> Result<()> {
        let port = self.port.as_mut().ok_or(SerialError::NotOpen)?;
        port.clear(serialport::ClearBuffer::Input)
            .map_err(|e| SerialError::Port(e.to_string()))
    }
}

impl SerialLink for SerialPort {
    async fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let limit = self.config.timeout;
        let port = self.port.as_mut().ok_or(SerialError::NotOpen)?;

        timeout(limit, async {
            let mut total_read = 0;
            while total_read < buf.len() {
                match port.read(&mut buf[total_read..]) {
                    Ok(0) => {
                        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "Port closed"))
                    }
                    Ok(n) => total_read += n,
                    Err(ref e) if e.kind() == io::ErrorKind::TimedOut => {
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        continue;
                    }
                    Err(e) => return Err(e),
                }
            }
            Ok(())
        })
        .await
        .map_err(|_| SerialError::Timeout(limit))?
        .map_err(SerialError::Io)
    }

    async fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        let limit = self.config.timeout;
        let port = self.port.as_mut().ok_or(SerialError::NotOpen)?;

        timeout(limit, async { port.write_all(buf).map_err(SerialError::Io) })
            .await
            .map_err(|_| SerialError::Timeout(limit))?
    }

    async fn flush(&mut self) -> Result<()> {
        let port = self.port.as_mut().ok_or(SerialError::NotOpen)?;
        port.flush().map_err(SerialError::Io)
    }
}

impl Drop for SerialPort {
    fn drop(&mut self) {
        if self.port.take().is_some() {
            tracing::debug!("Closed {}", self.port_name);
        }
    }
}

/// A named device port, opened afresh for every exchange
#[derive(Debug, Clone)]
pub struct DevicePort {
    pub name: String,
    pub config: SerialConfig,
}

impl DevicePort {
    pub fn new(name: impl Into<String>, config: SerialConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }
}

impl PortOpener for DevicePort {
    type Port = SerialPort;

    fn open(&self, timeout: Duration) -> Result<SerialPort> {
        let mut port = SerialPort::open(&self.name, self.config.clone().with_timeout(timeout))?;
        port.clear_input()?;
        Ok(port)
    }
}

/// List available serial ports
pub fn list_ports() -> Result<Vec<String>> {
    serialport::available_ports()
        .map_err(|e| SerialError::Port(e.to_string()))?
        .into_iter()
        .map(|p| Ok(p.port_name))
        .collect()
}
