//! Mocks and a minimal executor shared by the unit tests.

extern crate std;

use core::future::Future;
use core::pin::pin;
use core::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};
use embassy_time::{Duration, MockDriver};
use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin};
use joybus_proto::PulseSymbol;
use std::collections::VecDeque;
use std::vec::Vec;

use crate::link::{LinkError, PulseLink};

/// Simulated time that passes each time the future under test is pending.
const TIME_STEP: Duration = Duration::from_micros(10);

/// Upper bound on polls before a test is considered hung (one simulated second).
const MAX_POLLS: usize = 100_000;

/// Run a future to completion, advancing the mock clock while it is pending.
pub fn block_on<F: Future>(f: F) -> F::Output {
    fn noop_raw_waker() -> RawWaker {
        fn noop(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            noop_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, noop, noop, noop);
        RawWaker::new(core::ptr::null(), &VTABLE)
    }

    // SAFETY: every vtable function is a no-op
    let waker = unsafe { Waker::from_raw(noop_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    let mut f = pin!(f);

    for _ in 0..MAX_POLLS {
        if let Poll::Ready(result) = f.as_mut().poll(&mut cx) {
            return result;
        }
        MockDriver::get().advance(TIME_STEP);
    }
    panic!("future still pending after {} polls", MAX_POLLS);
}

/// Everything the code under test asked the peripheral to do.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    Transmit {
        symbols: Vec<PulseSymbol>,
        wait_for_completion: bool,
    },
    StartCapture,
    StopCapture,
}

/// Scripted pulse peripheral.
///
/// Captures are handed out in the order they were pushed; once the queue is
/// empty `receive` never completes, like a line nobody drives.
#[derive(Default)]
pub struct MockLink {
    captures: VecDeque<Vec<PulseSymbol>>,
    events: Vec<LinkEvent>,
    receive_error: Option<LinkError>,
    start_error: Option<LinkError>,
}

impl MockLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_capture(&mut self, capture: Vec<PulseSymbol>) {
        self.captures.push_back(capture);
    }

    pub fn fail_next_receive(&mut self, error: LinkError) {
        self.receive_error = Some(error);
    }

    pub fn fail_start(&mut self, error: LinkError) {
        self.start_error = Some(error);
    }

    pub fn events(&self) -> &[LinkEvent] {
        &self.events
    }

    pub fn transmitted(&self) -> Vec<Vec<PulseSymbol>> {
        self.events
            .iter()
            .filter_map(|event| match event {
                LinkEvent::Transmit { symbols, .. } => Some(symbols.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn pending_captures(&self) -> usize {
        self.captures.len()
    }
}

impl PulseLink for MockLink {
    async fn transmit(
        &mut self,
        symbols: &[PulseSymbol],
        wait_for_completion: bool,
    ) -> Result<(), LinkError> {
        let end = symbols
            .iter()
            .position(PulseSymbol::is_end)
            .unwrap_or(symbols.len());
        self.events.push(LinkEvent::Transmit {
            symbols: symbols[..end].to_vec(),
            wait_for_completion,
        });
        Ok(())
    }

    fn start_capture(&mut self) -> Result<(), LinkError> {
        if let Some(error) = self.start_error {
            return Err(error);
        }
        self.events.push(LinkEvent::StartCapture);
        Ok(())
    }

    fn stop_capture(&mut self) -> Result<(), LinkError> {
        self.events.push(LinkEvent::StopCapture);
        Ok(())
    }

    async fn receive(&mut self, buf: &mut [PulseSymbol]) -> Result<usize, LinkError> {
        if let Some(error) = self.receive_error.take() {
            return Err(error);
        }
        match self.captures.pop_front() {
            Some(capture) => {
                let len = capture.len().min(buf.len());
                buf[..len].copy_from_slice(&capture[..len]);
                Ok(len)
            }
            None => core::future::pending().await,
        }
    }
}

/// Output pin that remembers its level, or rejects every write.
#[derive(Debug, Default)]
pub struct MockPin {
    high: bool,
    writes: usize,
    failing: bool,
}

impl MockPin {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn is_high(&self) -> bool {
        self.high
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl ErrorType for MockPin {
    type Error = ErrorKind;
}

impl MockPin {
    fn write(&mut self, high: bool) -> Result<(), ErrorKind> {
        self.writes += 1;
        if self.failing {
            return Err(ErrorKind::Other);
        }
        self.high = high;
        Ok(())
    }
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true)
    }
}
