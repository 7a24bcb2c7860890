//! Joybus controller adapter for RP2040.
//!
//! This crate provides the embedded side of the Joybus loops from
//! [`joybus_core`]: a PIO-based pulse link and the glue to run the poll
//! scheduler and command responder as Embassy tasks.
//!
//! # Overview
//!
//! The firmware runs on a Raspberry Pi Pico (RP2040) and:
//! 1. Polls an attached controller ~60 times per second
//! 2. Lights the on-board LED while a controller answers
//! 3. Publishes every state change to a single-slot mailbox
//! 4. With `console-port`, answers a console's status and poll commands
//!    with the latest state, acting as a pass-through
//!
//! # Hardware Configuration
//!
//! | Function        | GPIO | Description |
//! |-----------------|------|-------------|
//! | Controller data | 0    | Joybus line to the controller (pull-up) |
//! | Console data    | 1    | Joybus line to the console (`console-port`) |
//! | LED             | 25   | On-board LED (controller connected) |
//!
//! # Architecture
//!
//! Both lines live on PIO0: state machines 0/1 drive and time the controller
//! line, 2/3 the console line. Tasks share state only through the
//! [`Mailbox`], which always holds the latest packet.
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent watchdog reset)
//! - **`console-port`** (default): Run the command responder on GPIO 1

#![no_std]

// Ensure mutually exclusive panic handlers
#[cfg(all(feature = "dev-panic", feature = "prod-panic"))]
compile_error!("Cannot enable both `dev-panic` and `prod-panic` features - they define conflicting panic handlers");

// Re-export core types for convenience
pub use joybus_core::{
    run_command_responder, run_poll_scheduler, LinkError, Mailbox, PollerConfig, PulseLink,
    ResponderConfig, StartupError, StatePacket,
};
pub use joybus_proto::{Buttons, ControllerState};

pub mod pio_link;

pub use pio_link::{JoybusPrograms, PioPulseLink};
