//! Host role: poll a controller at a fixed rate and publish its changes.

use core::convert::Infallible;
use core::future::Future;
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Instant, Timer};
use embedded_hal::digital::OutputPin;
use joybus_proto::pulse::{encode_buffer, encoded_len};
use joybus_proto::{parse_poll_response, Command, ControllerState, PulseSymbol};

use crate::config::PollerConfig;
use crate::link::{self, LinkError, PulseLink, CAPTURE_SYMBOLS};
use crate::mailbox::{Mailbox, StatePacket};
use crate::wait::Wait;

const POLL_FRAME_SYMBOLS: usize = encoded_len(1);

/// What a single poll cycle observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollOutcome {
    /// No answer, or too short to hold a state report.
    Disconnected,
    /// A valid report identical to the previous one.
    Unchanged,
    /// A valid report that differed; it has been published.
    Changed,
}

/// Fixed-rate schedule with an explicit anchor.
///
/// Deadlines advance by exactly one period per cycle. When a cycle overruns
/// its slot the anchor jumps to the current time instead of firing the
/// missed cycles back to back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPeriod {
    period: Duration,
    anchor: Instant,
    overruns: u32,
}

impl PollPeriod {
    #[must_use]
    pub const fn new(period: Duration, now: Instant) -> Self {
        Self {
            period,
            anchor: now,
            overruns: 0,
        }
    }

    /// Restart the schedule at `now`. The overrun count is kept.
    pub fn reset(&mut self, now: Instant) {
        self.anchor = now;
    }

    /// Deadline of the next cycle, given that the current one ends at `now`.
    pub fn next_deadline(&mut self, now: Instant) -> Instant {
        let elapsed = now.saturating_duration_since(self.anchor);
        if elapsed > self.period {
            self.overruns = self.overruns.saturating_add(1);
            warn!(
                "poll cycle took {} us, resynchronizing ({} overruns)",
                elapsed.as_micros(),
                self.overruns
            );
            self.anchor = now;
        }
        self.anchor += self.period;
        self.anchor
    }

    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }

    #[must_use]
    pub const fn overruns(&self) -> u32 {
        self.overruns
    }
}

/// Polls a controller over `L`, mirrors attachment on `P`, and publishes
/// every state change to a [`Mailbox`].
///
/// The controller state lives here and is only ever mutated by a
/// successful parse.
pub struct Poller<'a, L, P, M: RawMutex, const N: usize> {
    link: L,
    indicator: P,
    mailbox: &'a Mailbox<M, N>,
    config: PollerConfig,
    state: ControllerState,
    poll_frame: [PulseSymbol; POLL_FRAME_SYMBOLS],
    capture: [PulseSymbol; CAPTURE_SYMBOLS],
    connected: bool,
    period: PollPeriod,
}

impl<'a, L: PulseLink, P: OutputPin, M: RawMutex, const N: usize> Poller<'a, L, P, M, N> {
    pub fn new(link: L, indicator: P, mailbox: &'a Mailbox<M, N>, config: PollerConfig) -> Self {
        let mut poll_frame = [PulseSymbol::END; POLL_FRAME_SYMBOLS];
        let written = encode_buffer(&[Command::POLL_BYTE], &mut poll_frame);
        debug_assert_eq!(written, POLL_FRAME_SYMBOLS);

        Self {
            link,
            indicator,
            mailbox,
            config,
            state: ControllerState::neutral(),
            poll_frame,
            capture: [PulseSymbol::END; CAPTURE_SYMBOLS],
            connected: false,
            period: PollPeriod::new(config.period, Instant::from_ticks(0)),
        }
    }

    /// Start capturing and poll forever.
    ///
    /// Only returns if the capture cannot be started.
    pub async fn run(&mut self) -> Result<Infallible, LinkError> {
        self.start()?;
        loop {
            self.poll_once().await;
            let deadline = self.period.next_deadline(Instant::now());
            Timer::at(deadline).await;
        }
    }

    /// Like [`run`](Self::run), but returns `Ok(())` once `stop` completes.
    pub async fn run_until<S: Future>(&mut self, stop: S) -> Result<(), LinkError> {
        match select(self.run(), stop).await {
            Either::First(Ok(never)) => match never {},
            Either::First(Err(error)) => Err(error),
            Either::Second(_) => Ok(()),
        }
    }

    /// Run one poll cycle without waiting for the next period.
    pub async fn poll_once(&mut self) -> PollOutcome {
        if let Err(error) = self.link.transmit(&self.poll_frame, false).await {
            warn!("poll transmit failed: {:?}", error);
            self.set_connected(false);
            return PollOutcome::Disconnected;
        }

        let wait = Wait::Within(self.config.response_timeout);
        let received = match link::receive(&mut self.link, &mut self.capture, wait).await {
            Ok(Some(len)) => len,
            Ok(None) => 0,
            Err(error) => {
                warn!("poll capture failed: {:?}", error);
                0
            }
        };

        match parse_poll_response(&self.capture[..received], &mut self.state) {
            Ok(change) => {
                self.set_connected(true);
                if change.is_changed() {
                    trace!("controller state {:?}", self.state);
                    self.mailbox
                        .publish(StatePacket::new(self.state, Instant::now()));
                    PollOutcome::Changed
                } else {
                    PollOutcome::Unchanged
                }
            }
            Err(error) => {
                if received > 0 {
                    debug!("dropping poll capture: {:?}", error);
                }
                self.set_connected(false);
                PollOutcome::Disconnected
            }
        }
    }

    /// Last successfully decoded controller state.
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Whether the last poll got a usable answer.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Number of cycles that ran past their period.
    pub fn overruns(&self) -> u32 {
        self.period.overruns()
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn indicator(&self) -> &P {
        &self.indicator
    }

    /// Decompose the poller into its link and indicator.
    pub fn into_parts(self) -> (L, P) {
        (self.link, self.indicator)
    }

    fn start(&mut self) -> Result<(), LinkError> {
        if let Err(error) = self.link.start_capture() {
            error!("poller: cannot start capture: {:?}", error);
            return Err(error);
        }
        self.connected = false;
        self.drive_indicator(false);
        self.period.reset(Instant::now());
        info!("poller running every {} us", self.config.period.as_micros());
        Ok(())
    }

    fn set_connected(&mut self, connected: bool) {
        if connected == self.connected {
            return;
        }
        self.connected = connected;
        if connected {
            info!("controller connected");
            self.drive_indicator(true);
        } else {
            info!("controller disconnected");
            self.drive_indicator(false);
        }
    }

    fn drive_indicator(&mut self, on: bool) {
        let result = if on {
            self.indicator.set_high()
        } else {
            self.indicator.set_low()
        };
        if result.is_err() {
            warn!("indicator write failed (on = {})", on);
        }
    }
}
