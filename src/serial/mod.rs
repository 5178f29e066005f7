// Serial communication with the tracker
pub mod comm;
pub mod protocol;

#[cfg(test)]
pub mod mock;

pub use comm::{list_ports, DevicePort, PortOpener, SerialConfig, SerialError, SerialLink, SerialPort};
pub use protocol::{DeviceInfo, Transport, TransportError, TransportResult};
