//! Device role: answer console commands with the latest controller state.

use core::convert::Infallible;
use core::future::Future;
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::Timer;
use joybus_proto::pulse::{encode_to_vec, encoded_len, StopBit};
use joybus_proto::{parse_command, Command, ControllerState, PulseSymbol, Reply, MAX_REPLY_BYTES};

use crate::config::ResponderConfig;
use crate::link::{self, LinkError, PulseLink, CAPTURE_SYMBOLS};
use crate::mailbox::MailboxReader;
use crate::wait::Wait;

/// Symbols in the longest reply frame, stop bit and end sentinel included.
pub const REPLY_FRAME_SYMBOLS: usize = encoded_len(MAX_REPLY_BYTES);

/// Encoded reply, ready for [`PulseLink::transmit`].
pub type ReplyFrame = heapless::Vec<PulseSymbol, REPLY_FRAME_SYMBOLS>;

/// Encode the reply to `command`, ending in the controller stop bit.
///
/// Returns `None` for commands a controller does not answer.
pub fn encode_reply(command: Command, state: &ControllerState) -> Option<ReplyFrame> {
    let reply = Reply::for_command(command, state)?;
    let frame = encode_to_vec(reply.as_bytes(), StopBit::Device);
    debug_assert!(frame.is_some(), "reply frame too small");
    if frame.is_none() {
        error!("reply to {:?} does not fit a frame", command);
    }
    frame
}

/// Listens for console commands on `L` and answers them.
///
/// The reported state is whatever the mailbox last delivered, or neutral
/// until something has been published.
pub struct Responder<'a, L, M: RawMutex, const N: usize> {
    link: L,
    reader: MailboxReader<'a, M, N>,
    config: ResponderConfig,
    state: ControllerState,
    capture: [PulseSymbol; CAPTURE_SYMBOLS],
}

impl<'a, L: PulseLink, M: RawMutex, const N: usize> Responder<'a, L, M, N> {
    pub fn new(link: L, reader: MailboxReader<'a, M, N>, config: ResponderConfig) -> Self {
        Self {
            link,
            reader,
            config,
            state: ControllerState::neutral(),
            capture: [PulseSymbol::END; CAPTURE_SYMBOLS],
        }
    }

    /// Start capturing and answer commands forever.
    ///
    /// Returns if capture cannot be started or re-armed after a reply.
    pub async fn run(&mut self) -> Result<Infallible, LinkError> {
        if let Err(error) = self.link.start_capture() {
            error!("responder: cannot start capture: {:?}", error);
            return Err(error);
        }
        info!("responder listening");
        loop {
            self.respond_once().await?;
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

    /// Wait for one command and answer it.
    ///
    /// Returns the decoded command, or `None` if the capture was unusable.
    /// Capture must already be running.
    pub async fn respond_once(&mut self) -> Result<Option<Command>, LinkError> {
        let received = match link::receive(&mut self.link, &mut self.capture, Wait::Forever).await {
            Ok(Some(len)) => len,
            Ok(None) => return Ok(None),
            Err(error) => {
                warn!("command capture failed: {:?}", error);
                return Ok(None);
            }
        };

        let command = match parse_command(&self.capture[..received]) {
            Ok(command) => command,
            Err(error) => {
                debug!("dropping command capture: {:?}", error);
                return Ok(None);
            }
        };

        self.refresh_state();

        let Some(frame) = encode_reply(command, &self.state) else {
            debug!("ignoring command {:?}", command);
            return Ok(Some(command));
        };

        // The line is shared: stop listening while we drive it.
        self.link.stop_capture()?;
        if let Err(error) = self.link.transmit(&frame, true).await {
            warn!("reply to {:?} failed: {:?}", command, error);
        }
        Timer::after(self.config.echo_guard).await;
        self.link.start_capture()?;

        Ok(Some(command))
    }

    /// State that the next poll reply will report.
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn into_link(self) -> L {
        self.link
    }

    fn refresh_state(&mut self) {
        if let Ok(packet) = self.reader.try_take() {
            self.state = packet.state;
        }
    }
}
