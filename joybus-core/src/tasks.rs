//! Entry points that wire a link and a mailbox into a running loop.

use core::convert::Infallible;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal::digital::OutputPin;

use crate::config::{PollerConfig, ResponderConfig};
use crate::link::{LinkError, PulseLink};
use crate::mailbox::Mailbox;
use crate::poller::Poller;
use crate::responder::Responder;

/// Why a task loop could not start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StartupError {
    /// The pulse peripheral refused to start capturing.
    Link(LinkError),
    /// Every reader slot of the mailbox is already taken.
    NoReaderSlot,
}

impl From<LinkError> for StartupError {
    fn from(error: LinkError) -> Self {
        Self::Link(error)
    }
}

impl core::fmt::Display for StartupError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Link(error) => write!(f, "link startup failed: {}", error),
            Self::NoReaderSlot => write!(f, "no free mailbox reader slot"),
        }
    }
}

/// Poll the controller on `link` forever with the default timing.
pub async fn run_poll_scheduler<L, P, M, const N: usize>(
    link: L,
    indicator: P,
    mailbox: &Mailbox<M, N>,
) -> Result<Infallible, StartupError>
where
    L: PulseLink,
    P: OutputPin,
    M: RawMutex,
{
    let mut poller = Poller::new(link, indicator, mailbox, PollerConfig::DEFAULT);
    Ok(poller.run().await?)
}

/// Answer console commands on `link` forever, reporting what `mailbox` holds.
pub async fn run_command_responder<L, M, const N: usize>(
    link: L,
    mailbox: &Mailbox<M, N>,
) -> Result<Infallible, StartupError>
where
    L: PulseLink,
    M: RawMutex,
{
    let reader = mailbox.reader().ok_or(StartupError::NoReaderSlot)?;
    let mut responder = Responder::new(link, reader, ResponderConfig::DEFAULT);
    Ok(responder.run().await?)
}
