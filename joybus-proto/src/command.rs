//! Console commands and the replies a controller sends back.

use crate::state::{ControllerState, STATE_BYTES};

/// Identity reply of a standard controller: device type `0x0500`, no
/// accessory inserted.
pub const CONTROLLER_IDENTITY: [u8; 3] = [0x05, 0x00, 0x02];

/// Largest reply payload in bytes.
pub const MAX_REPLY_BYTES: usize = STATE_BYTES;

/// A command byte sent by the console.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// `0x00`: report device type and status.
    Status,
    /// `0x01`: report buttons and stick.
    Poll,
    /// Any other byte; no reply is sent.
    Unknown(u8),
}

impl Command {
    pub const STATUS_BYTE: u8 = 0x00;
    pub const POLL_BYTE: u8 = 0x01;

    #[inline]
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            Self::STATUS_BYTE => Self::Status,
            Self::POLL_BYTE => Self::Poll,
            other => Self::Unknown(other),
        }
    }

    #[inline]
    #[must_use]
    pub const fn byte(self) -> u8 {
        match self {
            Self::Status => Self::STATUS_BYTE,
            Self::Poll => Self::POLL_BYTE,
            Self::Unknown(byte) => byte,
        }
    }
}

impl From<u8> for Command {
    fn from(byte: u8) -> Self {
        Self::from_byte(byte)
    }
}

/// Reply payload built by a controller for a recognized command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reply {
    /// Answer to [`Command::Status`].
    Identity([u8; 3]),
    /// Answer to [`Command::Poll`]: the raw state bytes.
    State([u8; STATE_BYTES]),
}

impl Reply {
    /// Select the reply for `command`, or `None` if the command is unknown.
    ///
    /// # Example
    ///
    /// ```
    /// use joybus_proto::{Command, ControllerState, Reply};
    ///
    /// let state = ControllerState::from_raw_word(0x8000_0000);
    /// let reply = Reply::for_command(Command::Poll, &state).unwrap();
    /// assert_eq!(reply.as_bytes(), &[0x80, 0, 0, 0]);
    /// assert!(Reply::for_command(Command::Unknown(0x7F), &state).is_none());
    /// ```
    #[must_use]
    pub fn for_command(command: Command, state: &ControllerState) -> Option<Self> {
        match command {
            Command::Status => Some(Self::Identity(CONTROLLER_IDENTITY)),
            Command::Poll => Some(Self::State(*state.as_bytes())),
            Command::Unknown(_) => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Identity(bytes) => &bytes[..],
            Self::State(bytes) => &bytes[..],
        }
    }
}
