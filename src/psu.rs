use core::fmt::Write as _;
use core::str::FromStr;

use strum::EnumCount;

use crate::{
    command::{self, Command},
    config::TransportConfig,
    error::{Error, InvalidArgument, Result},
    profile::LoadModel,
    transport::{self, Transport},
    types::{Channel, ChannelState, ResetTarget, StateSnapshot},
};

const MODEL_NAME: &str = "Sorensen XPF60-20DP";

pub type Message = heapless::String<256>;

const ELLIPSIS: &str = "...";

/// Result of a connection handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOutcome {
    pub success: bool,
    pub message: Message,
}

/// You can create a XpfPsu using any [`Transport`].
///
/// The session keeps the last commanded setpoints of both channels. These are updated as
/// soon as the commands have been sent, the PSU is never asked to confirm them.
///
/// Every command opens the transport, writes and closes it again. All operations take
/// `&mut self`, so a session shared between callers has to sit behind the caller's own
/// lock.
///
/// `L` is the capacity of the response line buffer.
pub struct XpfPsu<T: Transport, const L: usize = 64> {
    transport: T,
    config: TransportConfig,
    connected: bool,
    channels: [ChannelState; Channel::COUNT],
}

impl<T: Transport, const L: usize> XpfPsu<T, L> {
    /// Create a new session using the default serial settings.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, TransportConfig::default())
    }

    pub fn with_config(transport: T, config: TransportConfig) -> Self {
        Self {
            transport,
            config,
            connected: false,
            channels: [ChannelState::ZERO; Channel::COUNT],
        }
    }

    /// Load the serial settings from their text form.
    ///
    /// Meant for startup, before the first [`Self::connect`]. Later commands open the link
    /// with whatever config is current. A bad configuration is logged and otherwise ignored. Fields before the bad one
    /// stay applied.
    pub fn load_config(&mut self, text: &str) {
        match self.config.load_str(text) {
            Ok(()) => log::info!("Loaded serial config: {}", self.config),
            Err(e) => log::warn!(
                "Failed to load serial config: {e}, continuing with {}",
                self.config
            ),
        }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Check the PSU is there by sending the identity query and expecting an ack.
    ///
    /// Always runs the full handshake, whatever the current state.
    pub fn connect(&mut self) -> ConnectOutcome {
        let mut message = Message::new();
        let result = self.transaction(|link| {
            link.write_all(command::IDENTITY_QUERY)
                .map_err(Error::SerialError)?;
            link.flush().map_err(Error::SerialError)?;
            transport::read_line::<T, L>(link)
        });

        self.connected = match result {
            Ok(line) if command::is_ack(&line) => {
                write_message(&mut message, format_args!("Successfully connected to {MODEL_NAME}!"));
                log::info!("Connected to {MODEL_NAME} on {}", self.config.port);
                true
            }
            Ok(line) => {
                write_message(&mut message, format_args!("Failed to connect to {MODEL_NAME}."));
                log::info!("Unexpected identity response: {:?}", line.as_slice());
                false
            }
            Err(e) => {
                write_message(
                    &mut message,
                    format_args!("Failed to connect to {MODEL_NAME}: {e}"),
                );
                log::error!("Handshake with {MODEL_NAME} failed: {e}");
                false
            }
        };

        ConnectOutcome {
            success: self.connected,
            message,
        }
    }

    /// Send a single command line. The newline is added here.
    ///
    /// No response is expected. Returns false if the command couldn't be delivered.
    pub fn send_command(&mut self, text: &str) -> bool {
        self.issue(Command::Raw(text))
    }

    /// Program a channel with the setpoint of a load module model.
    ///
    /// Returns false, leaving all state alone, if either the channel or the model is not
    /// recognised.
    pub fn set_voltage(&mut self, channel: &str, model_id: &str) -> bool {
        let parsed = Channel::from_str(channel)
            .map_err(|_| InvalidArgument::UnknownChannel)
            .and_then(|channel| {
                LoadModel::from_str(model_id)
                    .map(|model| (channel, model))
                    .map_err(|_| InvalidArgument::UnknownModel)
            });

        match parsed {
            Ok((channel, model)) => {
                self.program_channel(channel, model);
                true
            }
            Err(e) => {
                log::warn!("Not setting voltage for channel {channel:?}, model {model_id:?}: {e}");
                false
            }
        }
    }

    /// Send a model's voltage then current setpoint to `channel`.
    ///
    /// The channel state takes the new setpoint even if sending failed. Returns whether
    /// both commands were delivered.
    pub fn program_channel(&mut self, channel: Channel, model: LoadModel) -> bool {
        let setpoint = model.setpoint();
        log::info!(
            "Programming channel {channel} for {}: {}V {}A",
            model.id(),
            setpoint.voltage,
            setpoint.current
        );

        let voltage_sent = self.issue(Command::SetVoltage(channel, setpoint.voltage));
        let current_sent = self.issue(Command::SetCurrent(channel, setpoint.current));

        self.channels[channel.index()] = ChannelState {
            voltage: setpoint.voltage,
            current: setpoint.current,
        };
        voltage_sent && current_sent
    }

    /// Turn off and zero the channels named by `target` (`channel1`, `channel2` or `both`).
    ///
    /// An unrecognised target sends nothing and returns false.
    pub fn reset_control(&mut self, target: &str) -> bool {
        match ResetTarget::from_str(target) {
            Ok(target) => {
                self.reset(target);
                true
            }
            Err(_) => {
                log::warn!(
                    "Not resetting {target:?}: {}",
                    InvalidArgument::UnknownResetTarget
                );
                false
            }
        }
    }

    /// Disable the outputs of every targeted channel, then zero their setpoints.
    ///
    /// The targeted channel states are zeroed even if sending failed. Returns whether
    /// every command was delivered.
    pub fn reset(&mut self, target: ResetTarget) -> bool {
        let target_name: &'static str = target.into();
        log::info!("Resetting {target_name}");

        let mut all_sent = true;
        for &channel in target.channels() {
            all_sent &= self.issue(Command::OutputDisable(channel));
        }
        for &channel in target.channels() {
            for clear in command::build_clear_channel(channel) {
                all_sent &= self.issue(clear);
            }
            self.channels[channel.index()] = ChannelState::ZERO;
        }
        all_sent
    }

    /// Result of the last handshake. Not rechecked until [`Self::connect`] is called again.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn channel(&self, channel: Channel) -> &ChannelState {
        &self.channels[channel.index()]
    }

    pub fn snapshot(&self) -> StateSnapshot {
        let [v1, v2] = self.channels;
        StateSnapshot {
            v1_voltage: v1.voltage,
            v1_current: v1.current,
            v2_voltage: v2.voltage,
            v2_current: v2.current,
            connected: self.connected,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Tear down the session, handing back the (closed) transport.
    pub fn release(mut self) -> T {
        self.transport.close();
        self.transport
    }

    /// Encode and send one command in its own transaction, logging any failure.
    fn issue(&mut self, command: Command<'_>) -> bool {
        let result: Result<(), T::Error> = command
            .encode()
            .map_err(Error::from)
            .and_then(|frame| {
                log::debug!("Sending command: {command}");
                self.transaction(|link| {
                    link.write_all(frame.as_bytes())
                        .map_err(Error::SerialError)?;
                    link.flush().map_err(Error::SerialError)
                })
            });

        match result {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to send command {command:?}: {e}");
                false
            }
        }
    }

    /// Open the transport, run `f`, then close it again whatever happened.
    fn transaction<R>(
        &mut self,
        f: impl FnOnce(&mut T) -> Result<R, T::Error>,
    ) -> Result<R, T::Error> {
        self.transport
            .open(&self.config)
            .map_err(Error::SerialError)?;
        let result = f(&mut self.transport);
        self.transport.close();
        result
    }
}

/// Fills `message` with `args`, cutting overlong text short on a char boundary and
/// marking the cut with an ellipsis.
fn write_message(message: &mut Message, args: core::fmt::Arguments<'_>) {
    struct Truncating<'a> {
        message: &'a mut Message,
        truncated: bool,
    }

    impl core::fmt::Write for Truncating<'_> {
        fn write_str(&mut self, s: &str) -> core::fmt::Result {
            for c in s.chars() {
                if self.message.push(c).is_err() {
                    self.truncated = true;
                    return Err(core::fmt::Error);
                }
            }
            Ok(())
        }
    }

    let mut writer = Truncating {
        message,
        truncated: false,
    };
    // The only error here is running out of room, which is recorded in `truncated`.
    let _ = writer.write_fmt(args);
    if writer.truncated {
        while writer.message.capacity() - writer.message.len() < ELLIPSIS.len() {
            writer.message.pop();
        }
        let _ = writer.message.push_str(ELLIPSIS);
    }
}
