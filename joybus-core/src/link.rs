//! Pulse peripheral boundary and error types.

use core::future::Future;
use embassy_time::with_timeout;
use joybus_proto::PulseSymbol;

use crate::wait::Wait;

/// Capture buffer size used by both loops; comfortably holds the longest
/// burst either role expects (a polled echo plus a state report).
pub const CAPTURE_SYMBOLS: usize = 64;

/// Error type for pulse peripheral operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// The peripheral could not be configured or started.
    Config,
    /// A transfer failed.
    Io,
    /// The channel is in use by another transfer.
    Busy,
}

impl core::fmt::Display for LinkError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Config => write!(f, "peripheral configuration failed"),
            Self::Io => write!(f, "pulse transfer failed"),
            Self::Busy => write!(f, "pulse channel busy"),
        }
    }
}

/// Async trait for a pulse generation/capture peripheral on the data line.
///
/// Capture is idle-delimited: one call to [`receive`](PulseLink::receive)
/// yields the symbols of one burst of line activity, ending when the line
/// stays high past the peripheral's idle threshold.
///
/// # `no_std` Compatibility
///
/// All implementations must be `#![no_std]` compatible with no heap allocation.
pub trait PulseLink {
    /// Send `symbols` up to (not including) the first end sentinel.
    ///
    /// With `wait_for_completion` unset the call may return as soon as the
    /// transfer has been queued.
    fn transmit(
        &mut self,
        symbols: &[PulseSymbol],
        wait_for_completion: bool,
    ) -> impl Future<Output = Result<(), LinkError>>;

    /// Start (or resume) capturing line activity.
    fn start_capture(&mut self) -> Result<(), LinkError>;

    /// Stop capturing and drop anything captured but not yet received.
    fn stop_capture(&mut self) -> Result<(), LinkError>;

    /// Wait for the next captured burst and copy it into `buf`.
    ///
    /// Returns the number of symbols written. Symbols that do not fit in
    /// `buf` are discarded.
    fn receive(&mut self, buf: &mut [PulseSymbol]) -> impl Future<Output = Result<usize, LinkError>>;
}

/// Receive one burst, giving up after `wait`.
///
/// Returns `Ok(None)` when the wait elapsed without a capture.
pub async fn receive<L: PulseLink>(
    link: &mut L,
    buf: &mut [PulseSymbol],
    wait: Wait,
) -> Result<Option<usize>, LinkError> {
    let capacity = buf.len();
    let received = match wait.timeout() {
        None => Some(link.receive(buf).await?),
        Some(timeout) => match with_timeout(timeout, link.receive(buf)).await {
            Ok(result) => Some(result?),
            Err(_) => None,
        },
    };
    Ok(received.map(|len| len.min(capacity)))
}
