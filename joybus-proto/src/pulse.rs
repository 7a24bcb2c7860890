//! Pulse codec: translation between bytes and pulse-width symbols.
//!
//! Every bit on the wire is one [`PulseSymbol`]: a low phase followed by a
//! high phase. The length of the low phase carries the bit value:
//!
//! ```text
//!        ┌───────────┐            ┌───┐
//! ONE  ──┘           └──   ZERO ──┘   └──
//!    1µs     3µs            3µs   1µs
//!   (low)   (high)         (low) (high)
//! ```
//!
//! A transmitted sequence is the data bits (MSB first), one stop symbol and
//! the zero-length [`PulseSymbol::END`] sentinel.
//!
//! # Time base
//!
//! Durations are expressed in peripheral ticks of 12.5 ns ([`TICKS_PER_US`]
//! ticks per microsecond). Encoding and classification share the time base,
//! so `decode(encode(bytes)) == bytes` holds for any buffer.
//!
//! # Example
//!
//! ```
//! use joybus_proto::pulse::{decode_bytes, encode_buffer, PulseSymbol};
//!
//! let mut symbols = [PulseSymbol::END; 10];
//! let written = encode_buffer(&[0x01], &mut symbols);
//! assert_eq!(written, 10);
//! assert_eq!(symbols[8], PulseSymbol::STOP);
//!
//! let mut byte = [0u8; 1];
//! decode_bytes(&symbols[..8], &mut byte);
//! assert_eq!(byte, [0x01]);
//! ```

/// Peripheral ticks per microsecond (12.5 ns resolution).
pub const TICKS_PER_US: u16 = 80;

/// Length of one protocol unit (1 µs) in ticks.
pub const UNIT: u16 = TICKS_PER_US;

/// Low-phase duration separating a one (short) from a zero (long).
///
/// Sits between the nominal 1 µs and 3 µs low phases, biased towards the
/// short side so that input filtering, which shortens pulses, does not turn
/// zeros into ones.
pub const CLASSIFY_THRESHOLD: u16 = 100;

/// Number of framing symbols appended to every encoded sequence (stop + end).
pub const FRAMING_SYMBOLS: usize = 2;

/// Logic level of one half of a pulse symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

/// One timed phase of a pulse symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HalfPulse {
    /// Duration in ticks (see [`TICKS_PER_US`]).
    pub duration: u16,
    pub level: Level,
}

impl HalfPulse {
    #[must_use]
    pub const fn new(duration: u16, level: Level) -> Self {
        Self { duration, level }
    }

    #[must_use]
    pub const fn low(duration: u16) -> Self {
        Self::new(duration, Level::Low)
    }

    #[must_use]
    pub const fn high(duration: u16) -> Self {
        Self::new(duration, Level::High)
    }
}

/// The unit exchanged with the pulse peripheral: two timed half-pulses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PulseSymbol {
    pub first: HalfPulse,
    pub second: HalfPulse,
}

impl PulseSymbol {
    /// Bit value 1: 1 µs low, 3 µs high.
    pub const ONE: Self = Self::new(HalfPulse::low(UNIT), HalfPulse::high(3 * UNIT));

    /// Bit value 0: 3 µs low, 1 µs high.
    pub const ZERO: Self = Self::new(HalfPulse::low(3 * UNIT), HalfPulse::high(UNIT));

    /// Console (host) stop bit: 1 µs low, 2 µs high.
    pub const STOP: Self = Self::new(HalfPulse::low(UNIT), HalfPulse::high(2 * UNIT));

    /// Controller (device) stop bit: the console timings swapped.
    pub const DEVICE_STOP: Self = Self::new(HalfPulse::low(2 * UNIT), HalfPulse::high(UNIT));

    /// Zero-duration sentinel terminating a transmit sequence.
    pub const END: Self = Self::new(HalfPulse::high(0), HalfPulse::low(0));

    #[must_use]
    pub const fn new(first: HalfPulse, second: HalfPulse) -> Self {
        Self { first, second }
    }

    /// Whether this is the end-of-sequence sentinel (zero-length first phase).
    #[inline]
    #[must_use]
    pub const fn is_end(&self) -> bool {
        self.first.duration == 0
    }
}

/// Which stop symbol terminates an encoded sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBit {
    /// Sent by the console when issuing commands.
    #[default]
    Host,
    /// Sent by a controller at the end of its reply.
    Device,
}

impl StopBit {
    #[must_use]
    pub const fn symbol(self) -> PulseSymbol {
        match self {
            Self::Host => PulseSymbol::STOP,
            Self::Device => PulseSymbol::DEVICE_STOP,
        }
    }
}

/// Number of symbols needed to encode `len` bytes, framing included.
#[inline]
#[must_use]
pub const fn encoded_len(len: usize) -> usize {
    len * 8 + FRAMING_SYMBOLS
}

/// Encode a single bit.
#[inline]
#[must_use]
pub const fn encode_bit(value: bool) -> PulseSymbol {
    if value {
        PulseSymbol::ONE
    } else {
        PulseSymbol::ZERO
    }
}

/// Encode `bytes` MSB first, followed by the host stop bit and the end sentinel.
///
/// Returns the number of symbols written, or 0 if `out` cannot hold
/// [`encoded_len`] symbols. Nothing is written in that case.
pub fn encode_buffer(bytes: &[u8], out: &mut [PulseSymbol]) -> usize {
    encode_buffer_with_stop(bytes, StopBit::Host, out)
}

/// Encode `bytes` like [`encode_buffer`] with an explicit stop bit.
pub fn encode_buffer_with_stop(bytes: &[u8], stop: StopBit, out: &mut [PulseSymbol]) -> usize {
    let needed = encoded_len(bytes.len());
    if out.len() < needed {
        return 0;
    }

    let bits = bytes
        .iter()
        .flat_map(|&byte| (0..8).rev().map(move |i| byte & (1 << i) != 0));
    for (slot, bit) in out.iter_mut().zip(bits) {
        *slot = encode_bit(bit);
    }

    out[needed - 2] = stop.symbol();
    out[needed - 1] = PulseSymbol::END;
    needed
}

/// Encode into a `heapless::Vec` sized by `N`.
///
/// Returns `None` if `N` is smaller than [`encoded_len`].
#[cfg(feature = "heapless")]
pub fn encode_to_vec<const N: usize>(
    bytes: &[u8],
    stop: StopBit,
) -> Option<heapless::Vec<PulseSymbol, N>> {
    let mut vec = heapless::Vec::new();
    vec.resize(N, PulseSymbol::END).ok()?;
    let len = encode_buffer_with_stop(bytes, stop, &mut vec);
    if len == 0 {
        return None;
    }
    vec.truncate(len);
    Some(vec)
}

/// Classify a captured symbol by the duration of its first (low) phase.
///
/// Anything shorter than [`CLASSIFY_THRESHOLD`] is a one, the rest are zeros.
#[inline]
#[must_use]
pub const fn classify(symbol: &PulseSymbol) -> bool {
    symbol.first.duration < CLASSIFY_THRESHOLD
}

/// Classify every symbol in order.
pub fn decode_bits(symbols: &[PulseSymbol]) -> impl Iterator<Item = bool> + '_ {
    symbols.iter().map(classify)
}

/// Decode whole bytes (MSB first) from `symbols` into `out`.
///
/// Decodes `min(symbols.len() / 8, out.len())` bytes and returns that count.
/// Trailing symbols that do not form a full byte are ignored.
pub fn decode_bytes(symbols: &[PulseSymbol], out: &mut [u8]) -> usize {
    let mut count = 0;
    for (byte, chunk) in out.iter_mut().zip(symbols.chunks_exact(8)) {
        *byte = decode_bits(chunk).fold(0u8, |acc, bit| (acc << 1) | u8::from(bit));
        count += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbol_with_low(duration: u16) -> PulseSymbol {
        PulseSymbol::new(HalfPulse::low(duration), HalfPulse::high(UNIT))
    }

    #[test]
    fn test_encode_bit_low_phase_carries_value() {
        let one = encode_bit(true);
        let zero = encode_bit(false);
        assert!(one.first.duration < one.second.duration);
        assert!(zero.first.duration > zero.second.duration);
        assert_eq!(one.first.level, Level::Low);
        assert_eq!(zero.second.level, Level::High);
    }

    #[test]
    fn test_encode_zero_state_scenario() {
        let mut out = [PulseSymbol::ONE; 34];
        let written = encode_buffer(&[0, 0, 0, 0], &mut out);

        assert_eq!(written, 34);
        assert!(out[..32].iter().all(|s| !classify(s)));
        assert_eq!(out[32], PulseSymbol::STOP);
        assert_eq!(out[33], PulseSymbol::END);
    }

    #[test]
    fn test_encode_msb_first() {
        let mut out = [PulseSymbol::END; 10];
        encode_buffer(&[0b1000_0001], &mut out);

        assert_eq!(out[0], PulseSymbol::ONE);
        assert!(out[1..7].iter().all(|&s| s == PulseSymbol::ZERO));
        assert_eq!(out[7], PulseSymbol::ONE);
    }

    #[test]
    fn test_encode_capacity_too_small_writes_nothing() {
        let mut out = [PulseSymbol::ONE; 9];
        assert_eq!(encode_buffer(&[0x00], &mut out), 0);
        assert!(out.iter().all(|&s| s == PulseSymbol::ONE));
    }

    #[test]
    fn test_encode_exact_capacity() {
        let mut out = [PulseSymbol::ONE; 18];
        assert_eq!(encode_buffer(&[0xAA, 0x55], &mut out), 18);
    }

    #[test]
    fn test_encode_empty_buffer_is_framing_only() {
        let mut out = [PulseSymbol::ONE; 2];
        assert_eq!(encode_buffer(&[], &mut out), 2);
        assert_eq!(out, [PulseSymbol::STOP, PulseSymbol::END]);
    }

    #[test]
    fn test_device_stop_bit() {
        let mut out = [PulseSymbol::END; 10];
        encode_buffer_with_stop(&[0xFF], StopBit::Device, &mut out);
        assert_eq!(out[8], PulseSymbol::DEVICE_STOP);
        assert_eq!(out[9], PulseSymbol::END);
    }

    fn round_trip(bytes: &[u8]) -> ([u8; 16], usize) {
        let mut symbols = [PulseSymbol::END; 64];
        let written = encode_buffer(bytes, &mut symbols);
        assert_eq!(written, encoded_len(bytes.len()));

        let mut decoded = [0u8; 16];
        let count = decode_bytes(&symbols[..written - FRAMING_SYMBOLS], &mut decoded);
        (decoded, count)
    }

    #[test]
    fn test_round_trip_every_byte() {
        for byte in 0..=u8::MAX {
            let (decoded, count) = round_trip(&[byte]);
            assert_eq!(count, 1);
            assert_eq!(decoded[0], byte, "byte {byte:#04x}");
        }
    }

    #[test]
    fn test_round_trip_up_to_capacity() {
        // 64 symbols hold seven bytes plus framing.
        const MAX_BYTES: usize = (64 - FRAMING_SYMBOLS) / 8;

        for len in 1..=MAX_BYTES {
            for seed in [0x00u8, 0x5A, 0xA5, 0xFF, 0x13] {
                let mut bytes = [0u8; MAX_BYTES];
                for (i, b) in bytes[..len].iter_mut().enumerate() {
                    *b = seed.wrapping_mul(i as u8 + 1).wrapping_add(i as u8 * 37);
                }
                let (decoded, count) = round_trip(&bytes[..len]);
                assert_eq!(count, len);
                assert_eq!(&decoded[..len], &bytes[..len], "len {len}, seed {seed:#04x}");
            }
        }
    }

    #[test]
    fn test_classify_threshold_band() {
        for duration in 1..CLASSIFY_THRESHOLD {
            assert!(classify(&symbol_with_low(duration)), "{duration} should be a one");
        }
        for duration in CLASSIFY_THRESHOLD..=(4 * UNIT) {
            assert!(!classify(&symbol_with_low(duration)), "{duration} should be a zero");
        }
    }

    #[test]
    fn test_classify_nominal_symbols() {
        assert!(classify(&PulseSymbol::ONE));
        assert!(!classify(&PulseSymbol::ZERO));
    }

    #[test]
    fn test_decode_bytes_ignores_partial_byte() {
        let mut symbols = [PulseSymbol::ONE; 12];
        symbols[0] = PulseSymbol::ZERO;
        let mut out = [0u8; 2];
        assert_eq!(decode_bytes(&symbols, &mut out), 1);
        assert_eq!(out[0], 0x7F);
        assert_eq!(out[1], 0);
    }

    #[test]
    fn test_end_sentinel() {
        assert!(PulseSymbol::END.is_end());
        assert!(!PulseSymbol::STOP.is_end());
        assert!(!PulseSymbol::DEVICE_STOP.is_end());
    }

    #[cfg(feature = "heapless")]
    #[test]
    fn test_encode_to_vec() {
        let vec = encode_to_vec::<34>(&[1, 2, 3, 4], StopBit::Device).unwrap();
        assert_eq!(vec.len(), 34);
        assert_eq!(vec[32], PulseSymbol::DEVICE_STOP);

        assert!(encode_to_vec::<8>(&[1], StopBit::Host).is_none());
    }
}
