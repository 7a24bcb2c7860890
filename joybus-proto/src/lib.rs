//! Joybus wire protocol: pulse codec, controller state, and packet framing.
//!
//! This crate provides everything needed to turn pulse timings into protocol
//! values and back, without touching any hardware:
//!
//! - **Pulse codec**: bits ⇄ pulse-width symbols
//!   - [`PulseSymbol`] - One timed low/high pair as exchanged with the peripheral
//!   - [`pulse::encode_buffer`] - Encode bytes plus stop bit and end sentinel
//!   - [`pulse::classify`] - Decide a captured symbol's bit value
//!
//! - **State**: controller snapshot
//!   - [`Buttons`] - 16 digital buttons in wire order
//!   - [`ControllerState`] - Buttons and stick, viewable as one 32-bit word
//!
//! - **Framing**: recover protocol fields from a capture
//!   - [`parse_command`] - Command byte sent by a console
//!   - [`parse_controller_state`] - State report with change detection
//!   - [`parse_poll_response`] - State report after our own echoed poll
//!
//! - **Commands**: [`Command`] and the [`Reply`] a controller sends back
//!
//! # Wire Format
//!
//! ```text
//! console:    [cmd bit 7 .. bit 0][stop]
//! controller:                           [A B Z St Du Dd Dl Dr Rst - L R Cu Cd Cl Cr][X 7..0][Y 7..0][stop]
//! ```
//!
//! # Example
//!
//! ```
//! use joybus_proto::pulse::{encode_buffer, PulseSymbol};
//! use joybus_proto::{parse_command, Command, ControllerState, Reply};
//!
//! // What a console sends when it polls
//! let mut capture = [PulseSymbol::END; 10];
//! encode_buffer(&[0x01], &mut capture);
//!
//! let command = parse_command(&capture).unwrap();
//! assert_eq!(command, Command::Poll);
//!
//! let reply = Reply::for_command(command, &ControllerState::neutral()).unwrap();
//! assert_eq!(reply.as_bytes(), &[0, 0, 0, 0]);
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//! - **`heapless`**: Enable [`pulse::encode_to_vec`]
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations,
//! making it suitable for embedded systems with limited resources.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod command;
pub mod framer;
pub mod pulse;
pub mod state;

// Re-export types at crate root for convenience
pub use command::{Command, Reply, CONTROLLER_IDENTITY, MAX_REPLY_BYTES};
pub use framer::{
    parse_command, parse_controller_state, parse_poll_response, FrameError, StateChange,
    COMMAND_SYMBOLS, ECHO_SYMBOLS, MIN_POLL_RESPONSE_SYMBOLS, STATE_SYMBOLS,
};
pub use pulse::{HalfPulse, Level, PulseSymbol, StopBit};
pub use state::{Buttons, ControllerState, STATE_BYTES};
