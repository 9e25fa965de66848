//! Setpoints for the DI-811x series of load modules.
//!
//! Each module is programmed with a fixed voltage at a common 0.5A current limit.

use strum_macros::{EnumCount, EnumIter, EnumString, IntoStaticStr};

/// A voltage/current pair, as decimal text ready to put on the wire.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Setpoint {
    pub voltage: &'static str,
    pub current: &'static str,
}

/// Supported load module models.
///
/// Parse one from its identifier with [`core::str::FromStr`]. Unknown identifiers are an
/// error and are never mapped to a default model.
#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumString, EnumIter, EnumCount, IntoStaticStr)]
pub enum LoadModel {
    #[strum(serialize = "DI-8110")]
    Di8110,
    #[strum(serialize = "DI-8111")]
    Di8111,
    #[strum(serialize = "DI-8112")]
    Di8112,
    #[strum(serialize = "DI-8113")]
    Di8113,
}

impl LoadModel {
    const CURRENT_LIMIT: &'static str = "0.5";

    pub const fn setpoint(self) -> Setpoint {
        let voltage = match self {
            LoadModel::Di8110 => "24",
            LoadModel::Di8111 => "48",
            LoadModel::Di8112 => "110",
            LoadModel::Di8113 => "220",
        };
        Setpoint {
            voltage,
            current: Self::CURRENT_LIMIT,
        }
    }

    /// The model identifier, e.g. `"DI-8111"`.
    pub fn id(self) -> &'static str {
        self.into()
    }
}
