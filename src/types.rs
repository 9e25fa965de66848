use strum_macros::{EnumCount, EnumIter, EnumString, IntoStaticStr};

use crate::error::InvalidArgument;

/// One of the two independently controlled outputs of the XPF60-20DP.
#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumString, EnumIter, EnumCount)]
#[repr(u8)]
pub enum Channel {
    #[strum(serialize = "1")]
    One = 1,
    #[strum(serialize = "2")]
    Two = 2,
}

impl Channel {
    /// Channel number as the PSU addresses it.
    pub const fn number(self) -> u8 {
        self as u8
    }

    /// Position of this channel within the session's state array.
    pub(crate) const fn index(self) -> usize {
        self as usize - 1
    }
}

impl TryFrom<u8> for Channel {
    type Error = InvalidArgument;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Channel::One),
            2 => Ok(Channel::Two),
            _ => Err(InvalidArgument::UnknownChannel),
        }
    }
}

impl core::fmt::Display for Channel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Which outputs a reset should shut down and clear.
///
/// The front panel labels (`V1 CONTROL` etc.) are accepted as aliases.
#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumString, IntoStaticStr)]
pub enum ResetTarget {
    #[strum(to_string = "channel1", serialize = "V1 CONTROL")]
    Channel1,
    #[strum(to_string = "channel2", serialize = "V2 CONTROL")]
    Channel2,
    #[strum(to_string = "both", serialize = "BOTH CONTROL")]
    Both,
}

impl ResetTarget {
    pub const fn channels(self) -> &'static [Channel] {
        match self {
            ResetTarget::Channel1 => &[Channel::One],
            ResetTarget::Channel2 => &[Channel::Two],
            ResetTarget::Both => &[Channel::One, Channel::Two],
        }
    }
}

/// Last commanded setpoints of a channel.
///
/// Values are what we told the PSU, never read back from it. They are kept as the
/// decimal text sent on the wire, e.g. `"0.5"`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ChannelState {
    pub voltage: &'static str,
    pub current: &'static str,
}

impl ChannelState {
    pub const ZERO: ChannelState = ChannelState {
        voltage: "0",
        current: "0",
    };
}

impl Default for ChannelState {
    fn default() -> Self {
        Self::ZERO
    }
}

/// Read only view of the session, as handed to whatever renders it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StateSnapshot {
    pub v1_voltage: &'static str,
    pub v1_current: &'static str,
    pub v2_voltage: &'static str,
    pub v2_current: &'static str,
    pub connected: bool,
}
