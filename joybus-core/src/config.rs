//! Runtime configuration for the poll scheduler and command responder.

use embassy_time::Duration;

/// Timing of the host-side poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollerConfig {
    /// Time between the starts of two consecutive polls.
    pub period: Duration,
    /// How long to wait for the controller's answer after each poll.
    pub response_timeout: Duration,
}

impl PollerConfig {
    /// One poll per video frame (~60 Hz), 1 ms answer window.
    pub const DEFAULT: Self = Self {
        period: Duration::from_micros(16_666),
        response_timeout: Duration::from_millis(1),
    };

    #[must_use]
    pub const fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    #[must_use]
    pub const fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Timing of the device-side command responder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResponderConfig {
    /// Pause between the end of a reply and re-arming capture, so the tail of
    /// our own transmission is not read back as a command.
    pub echo_guard: Duration,
}

impl ResponderConfig {
    pub const DEFAULT: Self = Self {
        echo_guard: Duration::from_micros(20),
    };

    #[must_use]
    pub const fn with_echo_guard(mut self, echo_guard: Duration) -> Self {
        self.echo_guard = echo_guard;
        self
    }
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poller_defaults() {
        let config = PollerConfig::default();
        assert_eq!(config.period.as_micros(), 16_666);
        assert_eq!(config.response_timeout.as_millis(), 1);
    }

    #[test]
    fn test_builders_override_single_field() {
        let config = PollerConfig::DEFAULT.with_period(Duration::from_millis(4));
        assert_eq!(config.period, Duration::from_millis(4));
        assert_eq!(config.response_timeout, PollerConfig::DEFAULT.response_timeout);

        let config = ResponderConfig::DEFAULT.with_echo_guard(Duration::from_micros(50));
        assert_eq!(config.echo_guard, Duration::from_micros(50));
    }
}
