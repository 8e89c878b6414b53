//! The serial I/O port abstraction: byte-granular blocking reads with a
//! short internal timeout that yields "no byte", and buffered writes.
//! `RealSerialPort` wraps the `serialport` crate; the test suite supplies
//! its own fault-injecting loopback implementation.

use std::io::{self, Read, Write};
use std::time::Duration;

/// A point-to-point byte-stream endpoint.
pub trait SerialPort {
    /// Read one byte, blocking for at most the port's configured read
    /// timeout. `Ok(None)` means the timeout elapsed with no byte available.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    /// Write every byte of `bytes`, in order.
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;
}

/// A real serial port opened via the `serialport` crate.
pub struct RealSerialPort {
    inner: Box<dyn serialport::SerialPort>,
}

impl RealSerialPort {
    /// Open `path` at `baud_rate`, 8N1, with a short read timeout so the
    /// caller's wait loop can poll an armed [`crate::timer::AlarmTimer`]
    /// between reads.
    pub fn open(path: &str, baud_rate: u32) -> io::Result<Self> {
        let inner = serialport::new(path, baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(Duration::from_millis(100))
            .open()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        Ok(RealSerialPort { inner })
    }
}

impl SerialPort for RealSerialPort {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        match self.inner.read(&mut buf) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(buf[0])),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        Write::write_all(&mut self.inner, bytes)
    }
}
