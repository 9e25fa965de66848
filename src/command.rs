//! ASCII command set of the XPF60-20DP.
//!
//! Every command is a single line terminated with `\n`. Apart from the identity query
//! the PSU does not answer commands.

use core::fmt::Write;

use crate::types::Channel;

/// Identity/operation-complete query. A present PSU answers with [`ACK`].
pub const IDENTITY_QUERY: &[u8] = b"*OPC?\n";

/// Answer to [`IDENTITY_QUERY`].
pub const ACK: &[u8] = b"1\r\n";

pub const FRAME_CAPACITY: usize = 32;

/// A single encoded command line.
pub type Frame = heapless::String<FRAME_CAPACITY>;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    IdentityQuery,
    /// Voltage setpoint, decimal volts.
    SetVoltage(Channel, &'a str),
    /// Current limit, decimal amps.
    SetCurrent(Channel, &'a str),
    /// Turn the channel output off.
    OutputDisable(Channel),
    /// Free form command text.
    Raw(&'a str),
}

impl Command<'_> {
    /// Encode into a newline terminated frame.
    ///
    /// Fails if the frame doesn't fit in [`FRAME_CAPACITY`] bytes.
    pub fn encode(&self) -> Result<Frame, core::fmt::Error> {
        let mut frame = Frame::new();
        writeln!(frame, "{self}")?;
        Ok(frame)
    }
}

impl core::fmt::Display for Command<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Command::IdentityQuery => f.write_str("*OPC?"),
            Command::SetVoltage(channel, volts) => write!(f, "v{channel} {volts}"),
            Command::SetCurrent(channel, amps) => write!(f, "i{channel} {amps}"),
            Command::OutputDisable(channel) => write!(f, "OP{channel} 0"),
            Command::Raw(text) => f.write_str(text),
        }
    }
}

pub fn build_identity_query() -> Result<Frame, core::fmt::Error> {
    Command::IdentityQuery.encode()
}

pub fn build_set_voltage(channel: Channel, volts: &str) -> Result<Frame, core::fmt::Error> {
    Command::SetVoltage(channel, volts).encode()
}

pub fn build_set_current(channel: Channel, amps: &str) -> Result<Frame, core::fmt::Error> {
    Command::SetCurrent(channel, amps).encode()
}

pub fn build_output_disable(channel: Channel) -> Result<Frame, core::fmt::Error> {
    Command::OutputDisable(channel).encode()
}

/// Zero the voltage setpoint, then the current limit.
pub fn build_clear_channel(channel: Channel) -> [Command<'static>; 2] {
    [
        Command::SetVoltage(channel, "0"),
        Command::SetCurrent(channel, "0"),
    ]
}

pub fn build_raw(text: &str) -> Result<Frame, core::fmt::Error> {
    Command::Raw(text).encode()
}

/// Whether `line` is exactly the acknowledgement, terminator included.
pub fn is_ack(line: &[u8]) -> bool {
    line == ACK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_query_frame() {
        let frame = build_identity_query().unwrap();
        assert_eq!(frame.as_bytes(), IDENTITY_QUERY);
    }

    #[test]
    fn setpoint_frames() {
        assert_eq!(build_set_voltage(Channel::One, "24").unwrap(), "v1 24\n");
        assert_eq!(build_set_voltage(Channel::Two, "220").unwrap(), "v2 220\n");
        assert_eq!(build_set_current(Channel::One, "0.5").unwrap(), "i1 0.5\n");
        assert_eq!(build_set_current(Channel::Two, "0").unwrap(), "i2 0\n");
    }

    #[test]
    fn output_disable_frame() {
        assert_eq!(build_output_disable(Channel::One).unwrap(), "OP1 0\n");
        assert_eq!(build_output_disable(Channel::Two).unwrap(), "OP2 0\n");
    }

    #[test]
    fn clear_channel_is_voltage_then_current() {
        let [first, second] = build_clear_channel(Channel::Two);
        assert_eq!(first.encode().unwrap(), "v2 0\n");
        assert_eq!(second.encode().unwrap(), "i2 0\n");
    }

    #[test]
    fn raw_frame_gets_newline() {
        assert_eq!(build_raw("OP1 1").unwrap(), "OP1 1\n");
    }

    #[test]
    fn oversized_frame_is_an_error() {
        let text = "v1 0.000000000000000000000000001";
        assert!(build_raw(text).is_err());
        // Exactly at capacity once the newline is added.
        let text = "v1 0.00000000000000000000000001";
        assert_eq!(text.len() + 1, FRAME_CAPACITY);
        assert!(build_raw(text).is_ok());
    }

    #[test]
    fn ack_recognition() {
        let frame = build_set_voltage(Channel::One, "24").unwrap();
        assert!(!is_ack(frame.as_bytes()));
        assert!(is_ack(b"1\r\n"));
        assert!(!is_ack(b"1\n"));
        assert!(!is_ack(b"1"));
        assert!(!is_ack(b"0\r\n"));
        assert!(!is_ack(b"v1 24\n"));
        assert!(!is_ack(b""));
    }
}
