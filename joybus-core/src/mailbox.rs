//! Single-slot, overwrite-on-publish hand-off of controller state.
//!
//! The poller publishes a [`StatePacket`] whenever the controller state
//! changes; consumers only ever care about the latest value, so a new packet
//! replaces the old one instead of queuing behind it. Reading never removes
//! the packet: once anything has been published, a blocking take always
//! returns the latest value, and a reader that falls behind simply skips the
//! intermediate packets. Only the non-blocking peek cares about what this
//! reader has already seen.
//!
//! # Example
//!
//! ```
//! use embassy_sync::blocking_mutex::raw::NoopRawMutex;
//! use embassy_time::Instant;
//! use joybus_core::{Mailbox, StatePacket};
//! use joybus_proto::ControllerState;
//!
//! let mailbox: Mailbox<NoopRawMutex, 1> = Mailbox::new();
//! let mut reader = mailbox.reader().unwrap();
//! assert!(reader.try_take().is_err());
//!
//! mailbox.publish(StatePacket::new(ControllerState::from_raw_word(1), Instant::from_ticks(0)));
//! assert_eq!(reader.try_take().unwrap().state.raw_word(), 1);
//! ```

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::watch::{Receiver, Watch};
use embassy_time::{with_timeout, Instant};
use joybus_proto::ControllerState;

use crate::wait::Wait;

/// Immutable snapshot of a controller state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatePacket {
    pub state: ControllerState,
    /// When the change was observed.
    pub timestamp: Instant,
}

impl StatePacket {
    #[must_use]
    pub const fn new(state: ControllerState, timestamp: Instant) -> Self {
        Self { state, timestamp }
    }
}

/// Returned by [`MailboxReader::take`] when nothing new arrived in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MailboxTimeout;

impl core::fmt::Display for MailboxTimeout {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "no new state packet")
    }
}

/// Holds at most one [`StatePacket`]; `N` is the maximum number of readers.
pub struct Mailbox<M: RawMutex, const N: usize> {
    slot: Watch<M, StatePacket, N>,
}

impl<M: RawMutex, const N: usize> Mailbox<M, N> {
    /// Create an empty mailbox.
    #[must_use]
    pub const fn new() -> Self {
        Self { slot: Watch::new() }
    }

    /// Replace the current packet. Never blocks.
    pub fn publish(&self, packet: StatePacket) {
        self.slot.sender().send(packet);
    }

    /// Register a new reader, or `None` if all `N` reader slots are taken.
    ///
    /// A new reader has not seen anything yet, so its first take returns
    /// the current packet if one was ever published.
    pub fn reader(&self) -> Option<MailboxReader<'_, M, N>> {
        self.slot.receiver().map(|rx| MailboxReader { rx })
    }
}

impl<M: RawMutex, const N: usize> Default for Mailbox<M, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// One consumer's view of a [`Mailbox`].
///
/// Tracks which packet this reader saw last; dropping it frees the slot.
pub struct MailboxReader<'a, M: RawMutex, const N: usize> {
    rx: Receiver<'a, M, StatePacket, N>,
}

impl<M: RawMutex, const N: usize> MailboxReader<'_, M, N> {
    /// Wait up to `wait` until a packet has ever been published, then return
    /// the most recent one.
    ///
    /// [`Wait::Immediate`] behaves like [`try_take`](Self::try_take).
    pub async fn take(&mut self, wait: Wait) -> Result<StatePacket, MailboxTimeout> {
        match wait {
            Wait::Immediate => self.try_take(),
            Wait::Within(timeout) => with_timeout(timeout, self.rx.get())
                .await
                .map_err(|_| MailboxTimeout),
            Wait::Forever => Ok(self.rx.get().await),
        }
    }

    /// Non-blocking peek for a packet this reader has not seen yet.
    pub fn try_take(&mut self) -> Result<StatePacket, MailboxTimeout> {
        self.rx.try_changed().ok_or(MailboxTimeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::block_on;
    use embassy_futures::join::join;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use embassy_time::{Duration, Timer};
    use joybus_proto::Buttons;

    type TestMailbox = Mailbox<CriticalSectionRawMutex, 2>;

    fn packet(word: u32, at_ms: u64) -> StatePacket {
        StatePacket::new(
            ControllerState::from_raw_word(word),
            Instant::from_millis(at_ms),
        )
    }

    #[test]
    fn test_empty_mailbox_times_out() {
        let mailbox = TestMailbox::new();
        let mut reader = mailbox.reader().unwrap();

        assert_eq!(reader.try_take(), Err(MailboxTimeout));
        assert_eq!(
            block_on(reader.take(Wait::Within(Duration::from_micros(100)))),
            Err(MailboxTimeout)
        );
    }

    #[test]
    fn test_overwrite_keeps_latest_only() {
        let mailbox = TestMailbox::new();
        let mut reader = mailbox.reader().unwrap();

        mailbox.publish(packet(1, 10));
        mailbox.publish(packet(2, 20));

        assert_eq!(block_on(reader.take(Wait::Immediate)), Ok(packet(2, 20)));
        assert_eq!(block_on(reader.take(Wait::Immediate)), Err(MailboxTimeout));
    }

    #[test]
    fn test_read_does_not_remove_for_other_readers() {
        let mailbox = TestMailbox::new();
        let mut first = mailbox.reader().unwrap();
        let mut second = mailbox.reader().unwrap();

        mailbox.publish(packet(7, 1));

        assert_eq!(first.try_take(), Ok(packet(7, 1)));
        assert_eq!(second.try_take(), Ok(packet(7, 1)));
    }

    #[test]
    fn test_late_reader_sees_current_packet() {
        let mailbox = TestMailbox::new();
        mailbox.publish(packet(3, 5));

        let mut reader = mailbox.reader().unwrap();
        assert_eq!(block_on(reader.take(Wait::Forever)), Ok(packet(3, 5)));
    }

    #[test]
    fn test_take_sees_newer_packet_after_previous_take() {
        let mailbox = TestMailbox::new();
        let mut reader = mailbox.reader().unwrap();

        mailbox.publish(packet(1, 1));
        assert_eq!(reader.try_take(), Ok(packet(1, 1)));

        let pressed = StatePacket::new(
            ControllerState::new(Buttons::START, 0, 0),
            Instant::from_millis(2),
        );
        mailbox.publish(pressed);
        assert_eq!(
            block_on(reader.take(Wait::Within(Duration::from_millis(1)))),
            Ok(pressed)
        );
    }

    #[test]
    fn test_blocking_take_returns_latest_after_it_was_read() {
        let mailbox = TestMailbox::new();
        let mut reader = mailbox.reader().unwrap();

        mailbox.publish(packet(9, 3));
        assert_eq!(reader.try_take(), Ok(packet(9, 3)));

        assert_eq!(
            block_on(reader.take(Wait::Within(Duration::from_millis(1)))),
            Ok(packet(9, 3))
        );
        assert_eq!(block_on(reader.take(Wait::Forever)), Ok(packet(9, 3)));
        assert_eq!(block_on(reader.take(Wait::Forever)), Ok(packet(9, 3)));
    }

    #[test]
    fn test_peek_only_reports_unseen_packets() {
        let mailbox = TestMailbox::new();
        let mut reader = mailbox.reader().unwrap();

        mailbox.publish(packet(4, 1));
        assert_eq!(block_on(reader.take(Wait::Forever)), Ok(packet(4, 1)));
        assert_eq!(reader.try_take(), Err(MailboxTimeout));

        mailbox.publish(packet(5, 2));
        assert_eq!(reader.try_take(), Ok(packet(5, 2)));
    }

    #[test]
    fn test_forever_take_completes_on_first_publish() {
        let mailbox = TestMailbox::new();
        let mut reader = mailbox.reader().unwrap();

        let (taken, ()) = block_on(join(reader.take(Wait::Forever), async {
            Timer::after(Duration::from_micros(100)).await;
            mailbox.publish(packet(6, 7));
        }));
        assert_eq!(taken, Ok(packet(6, 7)));
    }

    #[test]
    fn test_reader_slots_are_bounded() {
        let mailbox = TestMailbox::new();
        let _first = mailbox.reader().unwrap();
        let second = mailbox.reader();
        assert!(second.is_some());
        assert!(mailbox.reader().is_none());

        drop(second);
        assert!(mailbox.reader().is_some());
    }
}
