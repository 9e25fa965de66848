//! The byte link to the PSU.
//!
//! A [`Transport`] is any [`embedded_io::Read`] + [`embedded_io::Write`] interface that can
//! also be opened and closed. The PSU session opens it for each command and closes it
//! straight after, so it is never left open between operations.

use embedded_io::Error as _;

use crate::{
    config::TransportConfig,
    error::{Error, Result},
};

/// Input left over from one transaction is not kept for the next: [`read_line`] drops
/// anything after the line it returns, and closing a link discards whatever was pending.
pub trait Transport: embedded_io::Read + embedded_io::Write {
    /// Bring the link up using `config`.
    fn open(&mut self, config: &TransportConfig) -> core::result::Result<(), Self::Error>;

    /// Take the link down. Closing a closed link does nothing.
    fn close(&mut self);

    fn is_open(&self) -> bool;
}

/// Read a single response line, terminator included.
///
/// Returns whatever was received when the interface runs out of data, which may be an
/// empty line. A read timeout is an [`Error::Timeout`], a line longer than `L` bytes is an
/// [`Error::BufferOverflow`]. Bytes after the first `\n` are dropped.
pub fn read_line<T: Transport + ?Sized, const L: usize>(
    transport: &mut T,
) -> Result<heapless::Vec<u8, L>, T::Error> {
    let mut line: heapless::Vec<u8, L> = heapless::Vec::new();
    let mut temp_buf = [0u8; 8];
    loop {
        match transport.read(&mut temp_buf) {
            Ok(0) => return Ok(line),
            Ok(bytes_read) => {
                let chunk = &temp_buf[..bytes_read];
                let (chunk, complete) = match chunk.iter().position(|b| *b == b'\n') {
                    Some(end) => (&chunk[..=end], true),
                    None => (chunk, false),
                };
                line.extend_from_slice(chunk)
                    .map_err(|_| Error::BufferOverflow)?;
                if complete {
                    return Ok(line);
                }
            }
            Err(e) if matches!(e.kind(), embedded_io::ErrorKind::TimedOut) => {
                return Err(Error::Timeout);
            }
            Err(e) => return Err(Error::SerialError(e)),
        }
    }
}

#[cfg(feature = "std")]
pub mod serial {
    //! Real serial port backend.

    use std::io;
    use std::time::Duration;

    use serialport::SerialPort;

    use super::Transport;
    use crate::config::{DataBits, Parity, StopBits, TransportConfig};

    #[derive(Debug)]
    pub struct IoError(pub io::Error);

    impl core::fmt::Display for IoError {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    impl std::error::Error for IoError {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    impl From<serialport::Error> for IoError {
        fn from(err: serialport::Error) -> Self {
            IoError(io::Error::from(err))
        }
    }

    impl embedded_io::Error for IoError {
        fn kind(&self) -> embedded_io::ErrorKind {
            use embedded_io::ErrorKind as EK;
            match self.0.kind() {
                io::ErrorKind::NotFound => EK::NotFound,
                io::ErrorKind::PermissionDenied => EK::PermissionDenied,
                io::ErrorKind::NotConnected => EK::NotConnected,
                io::ErrorKind::BrokenPipe => EK::BrokenPipe,
                io::ErrorKind::AlreadyExists => EK::AlreadyExists,
                io::ErrorKind::InvalidInput => EK::InvalidInput,
                io::ErrorKind::InvalidData => EK::InvalidData,
                io::ErrorKind::TimedOut => EK::TimedOut,
                io::ErrorKind::Interrupted => EK::Interrupted,
                io::ErrorKind::Unsupported => EK::Unsupported,
                io::ErrorKind::OutOfMemory => EK::OutOfMemory,
                _ => EK::Other,
            }
        }
    }

    /// A serial port that is only held while the link is open.
    #[derive(Default)]
    pub struct SerialTransport {
        port: Option<Box<dyn SerialPort>>,
    }

    impl SerialTransport {
        pub fn new() -> Self {
            Self::default()
        }

        fn port(&mut self) -> Result<&mut Box<dyn SerialPort>, IoError> {
            self.port
                .as_mut()
                .ok_or_else(|| IoError(io::ErrorKind::NotConnected.into()))
        }
    }

    impl embedded_io::ErrorType for SerialTransport {
        type Error = IoError;
    }

    impl embedded_io::Read for SerialTransport {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            io::Read::read(self.port()?, buf).map_err(IoError)
        }
    }

    impl embedded_io::Write for SerialTransport {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            io::Write::write(self.port()?, buf).map_err(IoError)
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            io::Write::flush(self.port()?).map_err(IoError)
        }
    }

    impl Transport for SerialTransport {
        fn open(&mut self, config: &TransportConfig) -> Result<(), Self::Error> {
            let stop_bits = match config.stop_bits {
                StopBits::One => serialport::StopBits::One,
                StopBits::Two => serialport::StopBits::Two,
                StopBits::OnePointFive => {
                    return Err(IoError(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "1.5 stop bits not supported by serial backend",
                    )));
                }
            };
            let parity = match config.parity {
                Parity::None => serialport::Parity::None,
                Parity::Odd => serialport::Parity::Odd,
                Parity::Even => serialport::Parity::Even,
            };
            let data_bits = match config.data_bits {
                DataBits::Five => serialport::DataBits::Five,
                DataBits::Six => serialport::DataBits::Six,
                DataBits::Seven => serialport::DataBits::Seven,
                DataBits::Eight => serialport::DataBits::Eight,
            };

            let port = serialport::new(config.port.as_str(), config.baud_rate)
                .parity(parity)
                .data_bits(data_bits)
                .stop_bits(stop_bits)
                .flow_control(serialport::FlowControl::None)
                .timeout(Duration::from_millis(config.read_timeout.to_millis() as u64))
                .open()?;

            log::debug!("Opened serial port {config}");
            self.port = Some(port);
            Ok(())
        }

        fn close(&mut self) {
            // Dropping the handle releases the port.
            if self.port.take().is_some() {
                log::debug!("Closed serial port");
            }
        }

        fn is_open(&self) -> bool {
            self.port.is_some()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn closed_port_reports_not_connected() {
            let mut transport = SerialTransport::new();
            assert!(!transport.is_open());

            let result = embedded_io::Write::write(&mut transport, b"v1 0\n");
            let err = result.unwrap_err();
            assert!(matches!(
                embedded_io::Error::kind(&err),
                embedded_io::ErrorKind::NotConnected
            ));
        }

        #[test]
        fn close_is_idempotent() {
            let mut transport = SerialTransport::new();
            transport.close();
            transport.close();
            assert!(!transport.is_open());
        }

        #[test]
        fn one_and_a_half_stop_bits_rejected() {
            let mut transport = SerialTransport::new();
            let mut config = TransportConfig::default();
            config.stop_bits = StopBits::OnePointFive;

            let err = transport.open(&config).unwrap_err();
            assert_eq!(err.0.kind(), io::ErrorKind::InvalidInput);
            assert!(!transport.is_open());
        }

        #[test]
        fn timeouts_map_to_timed_out() {
            let err = IoError(io::ErrorKind::TimedOut.into());
            assert!(matches!(
                embedded_io::Error::kind(&err),
                embedded_io::ErrorKind::TimedOut
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_serial::MockSerial;

    fn open_mock() -> MockSerial {
        let mut mock_serial = MockSerial::new();
        mock_serial.open(&TransportConfig::default()).unwrap();
        mock_serial
    }

    #[test]
    fn read_line_returns_terminated_line() {
        let mut mock_serial = open_mock();
        mock_serial.set_read_data(b"1\r\n").unwrap();

        let line: heapless::Vec<u8, 16> = read_line(&mut mock_serial).unwrap();
        assert_eq!(line.as_slice(), b"1\r\n");
    }

    #[test]
    fn read_line_spanning_reads() {
        let mut mock_serial = open_mock();
        // Longer than a single 8 byte read.
        mock_serial.set_read_data(b"XPF 60-20DP v3.1\n").unwrap();

        let line: heapless::Vec<u8, 32> = read_line(&mut mock_serial).unwrap();
        assert_eq!(line.as_slice(), b"XPF 60-20DP v3.1\n");
    }

    #[test]
    fn read_line_stops_at_newline() {
        let mut mock_serial = open_mock();
        mock_serial.set_read_data(b"1\r\n0\r\n").unwrap();

        let line: heapless::Vec<u8, 16> = read_line(&mut mock_serial).unwrap();
        assert_eq!(line.as_slice(), b"1\r\n");
    }

    #[test]
    fn read_line_empty_when_nothing_pending() {
        let mut mock_serial = open_mock();

        let line: heapless::Vec<u8, 16> = read_line(&mut mock_serial).unwrap();
        assert!(line.is_empty());
    }

    #[test]
    fn read_line_timeout() {
        let mut mock_serial = open_mock();
        mock_serial.set_read_timeout(true);

        let result = read_line::<_, 16>(&mut mock_serial);
        assert!(matches!(result, Err(Error::Timeout)));
    }

    #[test]
    fn read_line_read_error() {
        let mut mock_serial = open_mock();
        mock_serial.set_read_data(b"1\r\n").unwrap();
        mock_serial.set_read_error(true);

        let result = read_line::<_, 16>(&mut mock_serial);
        assert!(matches!(result, Err(Error::SerialError(_))));
    }

    #[test]
    fn read_line_overflow() {
        let mut mock_serial = open_mock();
        mock_serial.set_read_data(b"0123456789\n").unwrap();

        let result = read_line::<_, 4>(&mut mock_serial);
        assert!(matches!(result, Err(Error::BufferOverflow)));
    }
}
