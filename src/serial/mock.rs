// Mock serial port for testing without hardware

use super::comm::{PortOpener, SerialError, SerialLink};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock serial port for testing.
///
/// Clones share their buffers, so a test can keep one handle while the code
/// under test reads and writes through another.
pub struct MockSerialPort {
    /// Data to be read (simulates device responses)
    read_buffer: Arc<Mutex<VecDeque<u8>>>,

    /// Data that was written (simulates commands sent to the device)
    write_buffer: Arc<Mutex<Vec<u8>>>,

    /// Count of handles currently held open through `MockOpener`
    open_handles: Arc<AtomicUsize>,

    /// Set on handles handed out by `MockOpener`
    leased: bool,

    timeout: Duration,
}

impl MockSerialPort {
    pub fn new() -> Self {
        Self {
            read_buffer: Arc::new(Mutex::new(VecDeque::new())),
            write_buffer: Arc::new(Mutex::new(Vec::new())),
            open_handles: Arc::new(AtomicUsize::new(0)),
            leased: false,
            timeout: Duration::from_millis(100),
        }
    }

    /// Push data to be read (simulates the device sending data)
    pub fn push_read_data(&self, data: &[u8]) {
        self.read_buffer.lock().unwrap().extend(data.iter().copied());
    }

    /// Get data that was written
    pub fn get_written_data(&self) -> Vec<u8> {
        self.write_buffer.lock().unwrap().clone()
    }

    /// Check if a specific command was written
    pub fn was_written(&self, expected: &[u8]) -> bool {
        let buffer = self.write_buffer.lock().unwrap();
        buffer
            .windows(expected.len())
            .any(|window| window == expected)
    }

    /// Bytes still waiting to be read
    pub fn bytes_available(&self) -> usize {
        self.read_buffer.lock().unwrap().len()
    }

    /// Handles currently open through a `MockOpener`
    pub fn open_handles(&self) -> usize {
        self.open_handles.load(Ordering::SeqCst)
    }

    fn lease(&self, timeout: Duration) -> Self {
        self.open_handles.fetch_add(1, Ordering::SeqCst);
        Self {
            read_buffer: Arc::clone(&self.read_buffer),
            write_buffer: Arc::clone(&self.write_buffer),
            open_handles: Arc::clone(&self.open_handles),
            leased: true,
            timeout,
        }
    }
}

impl Clone for MockSerialPort {
    fn clone(&self) -> Self {
        Self {
            read_buffer: Arc::clone(&self.read_buffer),
            write_buffer: Arc::clone(&self.write_buffer),
            open_handles: Arc::clone(&self.open_handles),
            leased: false,
            timeout: self.timeout,
        }
    }
}

impl Drop for MockSerialPort {
    fn drop(&mut self) {
        if self.leased {
            self.open_handles.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Default for MockSerialPort {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialLink for MockSerialPort {
    /// Fails with a timeout, consuming what was there, when too little data is queued
    async fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), SerialError> {
        let mut buffer = self.read_buffer.lock().unwrap();

        if buffer.len() < buf.len() {
            buffer.clear();
            return Err(SerialError::Timeout(self.timeout));
        }

        for item in buf.iter_mut() {
            *item = buffer.pop_front().unwrap();
        }

        Ok(())
    }

    async fn write_all(&mut self, buf: &[u8]) -> Result<(), SerialError> {
        self.write_buffer.lock().unwrap().extend_from_slice(buf);
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), SerialError> {
        Ok(())
    }
}

/// Opener handing out handles onto one shared mock port
pub struct MockOpener {
    pub port: MockSerialPort,
    /// When set, every open fails as if the device were unplugged
    pub unplugged: bool,
    opens: AtomicUsize,
}

impl MockOpener {
    pub fn new(port: MockSerialPort) -> Self {
        Self {
            port,
            unplugged: false,
            opens: AtomicUsize::new(0),
        }
    }

    pub fn unplugged() -> Self {
        Self {
            unplugged: true,
            ..Self::new(MockSerialPort::new())
        }
    }

    /// Number of times the port was opened
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl PortOpener for MockOpener {
    type Port = MockSerialPort;

    fn open(&self, timeout: Duration) -> Result<MockSerialPort, SerialError> {
        if self.unplugged {
            return Err(SerialError::Port("mock port unplugged".to_string()));
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(self.port.lease(timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_serial_basic() {
        let mut port = MockSerialPort::new();

        port.push_read_data(b"Hello");

        let mut buf = [0u8; 5];
        port.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"Hello");

        port.write_all(b"World").await.unwrap();
        assert_eq!(port.get_written_data(), b"World");
    }

    #[tokio::test]
    async fn test_mock_serial_timeout() {
        let mut port = MockSerialPort::new();
        port.push_read_data(b"Hi");

        let mut buf = [0u8; 5];
        let result = port.read_exact(&mut buf).await;
        assert!(matches!(result, Err(SerialError::Timeout(_))));
        assert_eq!(port.bytes_available(), 0);
    }

    #[tokio::test]
    async fn test_mock_was_written() {
        let mut port = MockSerialPort::new();

        port.write_all(b"AT+VER=?\r\n").await.unwrap();

        assert!(port.was_written(b"AT+VER"));
        assert!(!port.was_written(b"AT+SET"));
    }

    #[test]
    fn test_opener_tracks_handles() {
        let opener = MockOpener::new(MockSerialPort::new());
        let handle = opener.open(Duration::from_millis(10)).unwrap();
        assert_eq!(opener.port.open_handles(), 1);

        let unleased = handle.clone();
        drop(handle);
        assert_eq!(opener.port.open_handles(), 0);
        drop(unleased);
        assert_eq!(opener.port.open_handles(), 0);
        assert_eq!(opener.opens(), 1);
    }

    #[test]
    fn test_unplugged_opener() {
        let opener = MockOpener::unplugged();
        assert!(matches!(
            opener.open(Duration::from_millis(10)),
            Err(SerialError::Port(_))
        ));
    }
}
