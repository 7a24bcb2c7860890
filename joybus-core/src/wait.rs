//! Explicit wait bounds shared by every blocking operation in this crate.

use embassy_time::Duration;

/// How long an operation may suspend the calling task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Wait {
    /// Do not suspend; report a timeout if nothing is ready.
    Immediate,
    /// Suspend for at most the given duration.
    Within(Duration),
    /// Suspend until the operation completes.
    Forever,
}

impl Wait {
    /// The timeout to apply, or `None` for an unbounded wait.
    #[inline]
    #[must_use]
    pub const fn timeout(self) -> Option<Duration> {
        match self {
            Self::Immediate => Some(Duration::from_ticks(0)),
            Self::Within(duration) => Some(duration),
            Self::Forever => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_values() {
        assert_eq!(Wait::Immediate.timeout(), Some(Duration::from_ticks(0)));
        assert_eq!(
            Wait::Within(Duration::from_millis(3)).timeout(),
            Some(Duration::from_millis(3))
        );
        assert_eq!(Wait::Forever.timeout(), None);
    }
}
