//! Platform-agnostic Joybus host and device loops.
//!
//! This crate drives the protocol from [`joybus_proto`] over any pulse
//! peripheral that implements [`PulseLink`]. It has no hardware dependencies
//! and runs on embedded `no_std` targets as well as on the host for testing.
//!
//! # Overview
//!
//! - [`link`]: Peripheral boundary ([`PulseLink`]) and the bounded [`receive`] helper
//! - [`wait`]: Explicit wait bounds ([`Wait`])
//! - [`mailbox`]: Latest-value hand-off between tasks ([`Mailbox`], [`StatePacket`])
//! - [`poller`]: Host role, polls a controller at a fixed rate ([`Poller`])
//! - [`responder`]: Device role, answers console commands ([`Responder`])
//! - [`tasks`]: Task entry points ([`run_poll_scheduler`], [`run_command_responder`])
//! - [`config`]: Loop timing ([`PollerConfig`], [`ResponderConfig`])
//!
//! # Data Flow
//!
//! ```text
//! controller ──pulses──> Poller ──StatePacket──> Mailbox ──> Responder ──pulses──> console
//!                          │
//!                          └──> connection indicator
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Log through defmt and derive `defmt::Format` (for embedded logging)
//! - **`log`**: Log through the `log` facade instead
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod config;
pub mod link;
pub mod mailbox;
pub mod poller;
pub mod responder;
pub mod tasks;
pub mod wait;

#[cfg(test)]
mod test_utils;

// Re-export main types at crate root
pub use config::{PollerConfig, ResponderConfig};
pub use link::{receive, LinkError, PulseLink, CAPTURE_SYMBOLS};
pub use mailbox::{Mailbox, MailboxReader, MailboxTimeout, StatePacket};
pub use poller::{PollOutcome, PollPeriod, Poller};
pub use responder::{encode_reply, ReplyFrame, Responder, REPLY_FRAME_SYMBOLS};
pub use tasks::{run_command_responder, run_poll_scheduler, StartupError};
pub use wait::Wait;
