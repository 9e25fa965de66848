//! This crate provides a control core for the Sorensen XPF60-20DP dual channel bench power supply.
//!
//! It supports `no-std` environments by disabling the default `std` feature, which only
//! gates the real serial port backend.
//!
//! The PSU speaks a line based ASCII protocol. Apart from the identity query used for the
//! connection handshake the command set is write only, so the channel state kept here is
//! what was last commanded, not what the PSU measured.
//!
//! Channels are programmed from a fixed table of load module models:
//!
//! | Model   | Voltage | Current |
//! |---------|---------|---------|
//! | DI-8110 | 24V     | 0.5A    |
//! | DI-8111 | 48V     | 0.5A    |
//! | DI-8112 | 110V    | 0.5A    |
//! | DI-8113 | 220V    | 0.5A    |
//!
//! The serial port used for PSU comms defaults to:
//! * Baud rate: 9600
//! * Data bits: 8
//! * Stop bits: 1
//! * Parity: None

#![cfg_attr(not(feature = "std"), no_std)]

pub mod command;
pub mod config;
pub mod error;
pub mod mock_serial;
pub mod profile;
pub mod psu;
pub mod transport;
pub mod types;

pub use psu::{ConnectOutcome, XpfPsu};
