//! A simulated PSU link, used by unit tests and for running without hardware.
//!
//! Writing the identity query arms the configured identity response (the PSU's ack by
//! default), which is then returned by the following reads. Everything else written is
//! only recorded.

use thiserror::Error;

use crate::{
    command::{ACK, IDENTITY_QUERY},
    config::TransportConfig,
    transport::Transport,
};

const WRITE_CAPACITY: usize = 1024;
const RESPONSE_CAPACITY: usize = 64;

/// Our mock type used to emulate the PSU's serial port.
pub struct MockSerial {
    is_open: bool,
    /// Config passed to the last successful open.
    config: Option<TransportConfig>,
    /// Everything written to the mock serial port while open.
    write_buffer: heapless::Vec<u8, WRITE_CAPACITY>,
    /// Response data waiting to be read.
    read_buffer: heapless::Vec<u8, RESPONSE_CAPACITY>,
    /// Current position in the read buffer.
    read_position: usize,
    /// What the identity query arms, `None` for a PSU that stays silent.
    identity_response: Option<heapless::Vec<u8, RESPONSE_CAPACITY>>,
    open_count: usize,
    close_count: usize,
    /// Error returned by open, `None` for a port that opens.
    open_error: Option<MockSerialError>,
    should_error_on_write: bool,
    should_error_on_read: bool,
    should_time_out_on_read: bool,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockSerialError {
    /// Simulated read timeout.
    #[error("Simulated timeout")]
    Timeout,
    /// Simulated buffer overflow.
    #[error("Simulated buffer overflow")]
    BufferOverflow,
    /// Read or write while the link is closed.
    #[error("Port not open")]
    NotConnected,
    /// Generic simulated error for testing.
    #[error("Simulated error")]
    SimulatedError,
    /// Open of a port that isn't there, worded like the OS reports it.
    #[error("No such file or directory, the serial adapter may have been unplugged (os error 2)")]
    PortNotFound,
}

impl embedded_io::Error for MockSerialError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            MockSerialError::Timeout => embedded_io::ErrorKind::TimedOut,
            MockSerialError::BufferOverflow => embedded_io::ErrorKind::OutOfMemory,
            MockSerialError::NotConnected => embedded_io::ErrorKind::NotConnected,
            MockSerialError::SimulatedError => embedded_io::ErrorKind::Other,
            MockSerialError::PortNotFound => embedded_io::ErrorKind::NotFound,
        }
    }
}

impl embedded_io::ErrorType for MockSerial {
    type Error = MockSerialError;
}

impl embedded_io::Write for MockSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if !self.is_open {
            return Err(MockSerialError::NotConnected);
        }
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }

        self.write_buffer
            .extend_from_slice(buf)
            .map_err(|_| MockSerialError::BufferOverflow)?;

        if buf == IDENTITY_QUERY {
            if let Some(response) = &self.identity_response {
                self.read_buffer = response.clone();
                self.read_position = 0;
            }
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }
        Ok(())
    }
}

impl embedded_io::Read for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if !self.is_open {
            return Err(MockSerialError::NotConnected);
        }
        if self.should_error_on_read {
            return Err(MockSerialError::SimulatedError);
        }
        if self.should_time_out_on_read {
            return Err(MockSerialError::Timeout);
        }

        let pending = &self.read_buffer[self.read_position..];
        let bytes_to_read = core::cmp::min(buf.len(), pending.len());
        buf[..bytes_to_read].copy_from_slice(&pending[..bytes_to_read]);
        self.read_position += bytes_to_read;

        Ok(bytes_to_read)
    }
}

impl Transport for MockSerial {
    fn open(&mut self, config: &TransportConfig) -> Result<(), Self::Error> {
        if let Some(error) = self.open_error {
            return Err(error);
        }
        self.is_open = true;
        self.config = Some(config.clone());
        self.open_count += 1;
        log::trace!("Mock: serial port opened");
        Ok(())
    }

    fn close(&mut self) {
        if self.is_open {
            self.close_count += 1;
            log::trace!("Mock: serial port closed");
        }
        self.is_open = false;
    }

    fn is_open(&self) -> bool {
        self.is_open
    }
}

impl Default for MockSerial {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSerial {
    /// Create a closed MockSerial that acks the identity query.
    pub fn new() -> Self {
        let mut ack = heapless::Vec::new();
        // ACK is a few bytes, always fits.
        let _ = ack.extend_from_slice(ACK);
        Self {
            is_open: false,
            config: None,
            write_buffer: heapless::Vec::new(),
            read_buffer: heapless::Vec::new(),
            read_position: 0,
            identity_response: Some(ack),
            open_count: 0,
            close_count: 0,
            open_error: None,
            should_error_on_write: false,
            should_error_on_read: false,
            should_time_out_on_read: false,
        }
    }

    /// Set what the identity query arms, `None` to never answer it.
    pub fn set_identity_response(&mut self, response: Option<&[u8]>) -> Result<(), MockSerialError> {
        self.identity_response = match response {
            Some(data) => Some(
                heapless::Vec::from_slice(data).map_err(|_| MockSerialError::BufferOverflow)?,
            ),
            None => None,
        };
        Ok(())
    }

    /// Set the data that will be returned when read() is called.
    pub fn set_read_data(&mut self, data: &[u8]) -> Result<(), MockSerialError> {
        self.read_buffer =
            heapless::Vec::from_slice(data).map_err(|_| MockSerialError::BufferOverflow)?;
        self.read_position = 0;
        Ok(())
    }

    /// Get a reference to the data that was written to this mock serial port.
    pub fn written_data(&self) -> &[u8] {
        &self.write_buffer
    }

    /// Clear the write buffer.
    pub fn clear_written_data(&mut self) {
        self.write_buffer.clear();
    }

    /// Config passed to the most recent successful open.
    pub fn last_config(&self) -> Option<&TransportConfig> {
        self.config.as_ref()
    }

    pub fn open_count(&self) -> usize {
        self.open_count
    }

    pub fn close_count(&self) -> usize {
        self.close_count
    }

    /// Configure whether open should fail.
    pub fn set_open_error(&mut self, should_error: bool) {
        self.open_error = should_error.then_some(MockSerialError::SimulatedError);
    }

    /// Make open fail with a specific error.
    pub fn fail_open_with(&mut self, error: MockSerialError) {
        self.open_error = Some(error);
    }

    /// Configure whether write operations should fail with an error.
    pub fn set_write_error(&mut self, should_error: bool) {
        self.should_error_on_write = should_error;
    }

    /// Configure whether read operations should fail with an error.
    pub fn set_read_error(&mut self, should_error: bool) {
        self.should_error_on_read = should_error;
    }

    /// Configure whether reads should time out, like an unplugged PSU on a real port.
    pub fn set_read_timeout(&mut self, should_time_out: bool) {
        self.should_time_out_on_read = should_time_out;
    }
}
