//! Serial link configuration for the PSU.
//!
//! The configuration is a list of fields in a fixed order:
//!
//! `port, baud rate, parity, data bits, stop bits[, read timeout ms]`
//!
//! e.g. `COM1,9600,N,8,1`. Fields may be separated by commas or newlines.

use fugit::MillisDurationU32;
use strum_macros::{EnumString, IntoStaticStr};

use crate::error::ConfigError;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, EnumString, IntoStaticStr)]
#[strum(ascii_case_insensitive)]
pub enum Parity {
    #[default]
    #[strum(to_string = "N", serialize = "none")]
    None,
    #[strum(to_string = "O", serialize = "odd")]
    Odd,
    #[strum(to_string = "E", serialize = "even")]
    Even,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, EnumString)]
#[repr(u8)]
pub enum DataBits {
    #[strum(serialize = "5")]
    Five = 5,
    #[strum(serialize = "6")]
    Six = 6,
    #[strum(serialize = "7")]
    Seven = 7,
    #[default]
    #[strum(serialize = "8")]
    Eight = 8,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, EnumString, IntoStaticStr)]
pub enum StopBits {
    #[default]
    #[strum(serialize = "1")]
    One,
    #[strum(serialize = "1.5")]
    OnePointFive,
    #[strum(serialize = "2")]
    Two,
}

/// How to reach the PSU.
///
/// Loaded once at startup and left alone afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub port: heapless::String<64>,
    pub baud_rate: u32,
    pub parity: Parity,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    /// How long a read may wait for the PSU before giving up.
    pub read_timeout: MillisDurationU32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        let mut port = heapless::String::new();
        // "COM1" always fits.
        let _ = port.push_str("COM1");
        Self {
            port,
            baud_rate: 9600,
            parity: Parity::default(),
            data_bits: DataBits::default(),
            stop_bits: StopBits::default(),
            read_timeout: MillisDurationU32::millis(1000),
        }
    }
}

impl TransportConfig {
    /// Apply configuration fields in order.
    ///
    /// Fields are applied one at a time, so on error everything before the bad field
    /// has already been taken on.
    pub fn apply_fields<'a>(
        &mut self,
        fields: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), ConfigError> {
        let mut fields = fields.into_iter().map(str::trim);

        let port = fields.next().ok_or(ConfigError::Missing("port"))?;
        if port.is_empty() {
            return Err(ConfigError::Missing("port"));
        }
        self.port = heapless::String::try_from(port).map_err(|_| ConfigError::PortTooLong)?;

        let baud_rate = fields.next().ok_or(ConfigError::Missing("baud rate"))?;
        self.baud_rate = baud_rate
            .parse::<u32>()
            .ok()
            .filter(|baud| *baud > 0)
            .ok_or(ConfigError::InvalidBaudRate)?;

        let parity = fields.next().ok_or(ConfigError::Missing("parity"))?;
        self.parity = parity.parse().map_err(|_| ConfigError::InvalidParity)?;

        let data_bits = fields.next().ok_or(ConfigError::Missing("data bits"))?;
        self.data_bits = data_bits.parse().map_err(|_| ConfigError::InvalidDataBits)?;

        let stop_bits = fields.next().ok_or(ConfigError::Missing("stop bits"))?;
        self.stop_bits = stop_bits.parse().map_err(|_| ConfigError::InvalidStopBits)?;

        if let Some(timeout_ms) = fields.next() {
            let timeout_ms = timeout_ms
                .parse::<u32>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or(ConfigError::InvalidTimeout)?;
            self.read_timeout = MillisDurationU32::millis(timeout_ms);
        }

        Ok(())
    }

    /// Apply a comma or newline separated field list, see [`Self::apply_fields`].
    pub fn load_str(&mut self, text: &str) -> Result<(), ConfigError> {
        self.apply_fields(
            text.split([',', '\n'])
                .filter(|field| !field.trim().is_empty()),
        )
    }
}

impl core::fmt::Display for TransportConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let parity: &'static str = self.parity.into();
        let stop_bits: &'static str = self.stop_bits.into();
        write!(
            f,
            "{} @ {} baud {}{}{}",
            self.port, self.baud_rate, self.data_bits as u8, parity, stop_bits
        )
    }
}
