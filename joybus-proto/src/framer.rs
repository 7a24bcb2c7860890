//! Packet framing: recover commands and controller state from captures.
//!
//! A capture is the list of [`PulseSymbol`]s recorded for one burst of line
//! activity. Framing here is purely by fixed width; captures that are too
//! short are rejected with [`FrameError::MalformedCapture`] and never touch
//! the caller's state.

use crate::command::Command;
use crate::pulse::{decode_bytes, PulseSymbol};
use crate::state::{ControllerState, STATE_BYTES};

/// Symbols in a command byte.
pub const COMMAND_SYMBOLS: usize = 8;

/// Symbols in a controller state report (16 buttons + 2 × 8 axis bits).
pub const STATE_SYMBOLS: usize = STATE_BYTES * 8;

/// Echoed poll command at the head of a host-side capture (8 bits + stop).
pub const ECHO_SYMBOLS: usize = COMMAND_SYMBOLS + 1;

/// Shortest host-side capture that holds a full poll response.
///
/// Echo and state plus the controller's stop bit.
pub const MIN_POLL_RESPONSE_SYMBOLS: usize = ECHO_SYMBOLS + STATE_SYMBOLS + 1;

/// Error type for framing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// The capture holds fewer symbols than the field requires.
    MalformedCapture { required: usize, received: usize },
}

impl core::fmt::Display for FrameError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::MalformedCapture { required, received } => {
                write!(f, "malformed capture: {received} symbols, need {required}")
            }
        }
    }
}

/// Outcome of decoding a state report into an existing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[must_use]
pub enum StateChange {
    /// At least one button or axis differs from the previous value.
    Changed,
    Unchanged,
}

impl StateChange {
    #[inline]
    #[must_use]
    pub const fn is_changed(self) -> bool {
        matches!(self, Self::Changed)
    }
}

#[inline]
fn require(symbols: &[PulseSymbol], required: usize) -> Result<(), FrameError> {
    if symbols.len() < required {
        return Err(FrameError::MalformedCapture {
            required,
            received: symbols.len(),
        });
    }
    Ok(())
}

/// Decode the command byte at the start of a capture.
///
/// Needs at least [`COMMAND_SYMBOLS`]; a trailing stop bit is not required.
pub fn parse_command(symbols: &[PulseSymbol]) -> Result<Command, FrameError> {
    require(symbols, COMMAND_SYMBOLS)?;

    let mut byte = [0u8; 1];
    decode_bytes(&symbols[..COMMAND_SYMBOLS], &mut byte);
    Ok(Command::from_byte(byte[0]))
}

/// Decode a state report at the start of `symbols` into `state`.
///
/// Buttons are decoded in wire order (A first), then the X and Y axis as
/// two's-complement bytes. Returns [`StateChange::Changed`] if any bit differs
/// from the previous contents of `state`. On error `state` is left untouched.
///
/// # Example
///
/// ```
/// use joybus_proto::pulse::{encode_buffer, PulseSymbol};
/// use joybus_proto::{parse_controller_state, ControllerState, StateChange};
///
/// let mut capture = [PulseSymbol::END; 34];
/// encode_buffer(&[0x80, 0x00, 0x05, 0xFB], &mut capture);
///
/// let mut state = ControllerState::neutral();
/// assert_eq!(parse_controller_state(&capture, &mut state), Ok(StateChange::Changed));
/// assert_eq!(state.stick_y(), -5);
/// ```
pub fn parse_controller_state(
    symbols: &[PulseSymbol],
    state: &mut ControllerState,
) -> Result<StateChange, FrameError> {
    require(symbols, STATE_SYMBOLS)?;

    let mut raw = [0u8; STATE_BYTES];
    decode_bytes(&symbols[..STATE_SYMBOLS], &mut raw);

    Ok(if state.replace_bytes(raw) {
        StateChange::Changed
    } else {
        StateChange::Unchanged
    })
}

/// Decode the controller's answer from a host-side poll capture.
///
/// The capture starts with the echo of our own poll command, which is skipped
/// before decoding. Captures shorter than [`MIN_POLL_RESPONSE_SYMBOLS`] usually
/// mean nothing is plugged in.
pub fn parse_poll_response(
    capture: &[PulseSymbol],
    state: &mut ControllerState,
) -> Result<StateChange, FrameError> {
    require(capture, MIN_POLL_RESPONSE_SYMBOLS)?;
    parse_controller_state(&capture[ECHO_SYMBOLS..], state)
}
