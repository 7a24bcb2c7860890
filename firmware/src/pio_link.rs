//! PIO-backed pulse link for one Joybus data line.
//!
//! Each line uses two state machines of the same PIO block sharing one pin:
//!
//! - **TX** drives the open-drain line. Every FIFO word holds one symbol as
//!   `low_cycles | high_cycles << 16`; the pin is pulled low by switching it
//!   to output (its output latch stays 0) and released by switching it back.
//! - **RX** times every low and high phase with down-counters and pushes one
//!   word per symbol. When the line stays high longer than the idle limit the
//!   high counter wraps, which marks the last symbol of a burst.

use embassy_futures::yield_now;
use embassy_rp::gpio::Level;
use embassy_rp::pio::{
    Common, Config, Direction, FifoJoin, Instance, LoadedProgram, Pin, ShiftConfig,
    ShiftDirection, StateMachine,
};
use embassy_time::{Duration, Instant};
use fixed::types::U24F8;
use fixed_macro::fixed;
use joybus_core::{LinkError, PulseLink};
use joybus_proto::{HalfPulse, PulseSymbol};

// Dividers assume the default 125 MHz system clock.
const TX_CLOCK_DIVIDER: U24F8 = fixed!(6.25: U24F8); // 20 MHz
const RX_CLOCK_DIVIDER: U24F8 = fixed!(3.125: U24F8); // 40 MHz

/// Protocol ticks (12.5 ns) per TX cycle.
const TICKS_PER_TX_CYCLE: u32 = 4;
/// Cycles the TX program spends outside its low/high counting loops.
const TX_LOW_OVERHEAD: u32 = 3;
const TX_HIGH_OVERHEAD: u32 = 4;

/// Protocol ticks per iteration of the RX low loop (2 cycles).
const RX_LOW_TICKS_PER_LOOP: u32 = 4;
/// Protocol ticks per iteration of the RX high loop (9 cycles).
const RX_HIGH_TICKS_PER_LOOP: u32 = 18;
/// High loop iterations before the line counts as idle (~7 µs).
const RX_IDLE_LOOPS: u32 = 32;
/// High counter value pushed when the idle limit was hit.
const IDLE_MARKER: u32 = 0xFFFF;

/// Both Joybus programs, loaded once per PIO block.
pub struct JoybusPrograms<'d, PIO: Instance> {
    tx: LoadedProgram<'d, PIO>,
    rx: LoadedProgram<'d, PIO>,
}

impl<'d, PIO: Instance> JoybusPrograms<'d, PIO> {
    pub fn load(common: &mut Common<'d, PIO>) -> Self {
        let tx = pio::pio_asm!(
            ".wrap_target",
            "    pull block",
            "    out x, 16",
            "    set pindirs, 1",
            "low:",
            "    jmp x-- low",
            "    out y, 16",
            "    set pindirs, 0",
            "high:",
            "    jmp y-- high",
            ".wrap"
        );

        let rx = pio::pio_asm!(
            ".wrap_target",
            "    wait 0 pin 0",
            "    mov x, !null",
            "low:",
            "    jmp pin low_done",
            "    jmp x-- low",
            "low_done:",
            "    set y, 31",
            "high:",
            "    jmp pin still_high",
            "    jmp emit",
            "still_high:",
            "    jmp y-- high [7]",
            "emit:",
            "    in x, 16",
            "    in y, 16",
            "    push noblock",
            ".wrap"
        );

        Self {
            tx: common.load_program(&tx.program),
            rx: common.load_program(&rx.program),
        }
    }
}

/// FIFO word for the TX program.
fn tx_word(symbol: &PulseSymbol) -> u32 {
    let low = tx_cycles(symbol.first.duration, TX_LOW_OVERHEAD);
    let high = tx_cycles(symbol.second.duration, TX_HIGH_OVERHEAD);
    low | (high << 16)
}

fn tx_cycles(ticks: u16, overhead: u32) -> u32 {
    (u32::from(ticks) / TICKS_PER_TX_CYCLE)
        .saturating_sub(overhead)
        .min(0xFFFF)
}

/// Decode one RX word. The flag is set on the last symbol of a burst.
fn rx_symbol(word: u32) -> (PulseSymbol, bool) {
    let low_loops = 0xFFFF - (word & 0xFFFF);
    let high_counter = word >> 16;
    let idle = high_counter == IDLE_MARKER;
    let high_loops = if idle {
        RX_IDLE_LOOPS
    } else {
        RX_IDLE_LOOPS.saturating_sub(high_counter + 1)
    };

    let symbol = PulseSymbol::new(
        HalfPulse::low(saturate(low_loops * RX_LOW_TICKS_PER_LOOP)),
        HalfPulse::high(saturate(high_loops * RX_HIGH_TICKS_PER_LOOP)),
    );
    (symbol, idle)
}

fn saturate(ticks: u32) -> u16 {
    u16::try_from(ticks).unwrap_or(u16::MAX)
}

/// One Joybus data line driven by state machines `TX` and `RX` of `PIO`.
pub struct PioPulseLink<'d, PIO: Instance, const TX: usize, const RX: usize> {
    tx: StateMachine<'d, PIO, TX>,
    rx: StateMachine<'d, PIO, RX>,
    rx_origin: u8,
    capturing: bool,
    _pin: Pin<'d, PIO>,
}

impl<'d, PIO: Instance, const TX: usize, const RX: usize> PioPulseLink<'d, PIO, TX, RX> {
    /// Configure both state machines on `pin`. Capture starts stopped.
    ///
    /// The pin should already have its pull-up enabled.
    pub fn new(
        programs: &JoybusPrograms<'d, PIO>,
        mut tx: StateMachine<'d, PIO, TX>,
        mut rx: StateMachine<'d, PIO, RX>,
        pin: Pin<'d, PIO>,
    ) -> Self {
        let mut cfg = Config::default();
        cfg.use_program(&programs.tx, &[]);
        cfg.set_set_pins(&[&pin]);
        cfg.clock_divider = TX_CLOCK_DIVIDER;
        cfg.shift_out = ShiftConfig {
            threshold: 32,
            direction: ShiftDirection::Right,
            auto_fill: false,
        };
        cfg.fifo_join = FifoJoin::TxOnly;
        tx.set_config(&cfg);
        tx.set_pins(Level::Low, &[&pin]);
        tx.set_pin_dirs(Direction::In, &[&pin]);
        tx.set_enable(true);

        let mut cfg = Config::default();
        cfg.use_program(&programs.rx, &[]);
        cfg.set_in_pins(&[&pin]);
        cfg.set_jmp_pin(&pin);
        cfg.clock_divider = RX_CLOCK_DIVIDER;
        cfg.shift_in = ShiftConfig {
            threshold: 32,
            direction: ShiftDirection::Right,
            auto_fill: false,
        };
        cfg.fifo_join = FifoJoin::RxOnly;
        rx.set_config(&cfg);
        rx.set_pin_dirs(Direction::In, &[&pin]);

        Self {
            tx,
            rx,
            rx_origin: programs.rx.origin,
            capturing: false,
            _pin: pin,
        }
    }

    fn drain_capture(&mut self) {
        while self.rx.rx().try_pull().is_some() {}
    }
}

impl<PIO: Instance, const TX: usize, const RX: usize> PulseLink for PioPulseLink<'_, PIO, TX, RX> {
    async fn transmit(
        &mut self,
        symbols: &[PulseSymbol],
        wait_for_completion: bool,
    ) -> Result<(), LinkError> {
        // Leftovers of an abandoned burst would be read as the echo.
        self.drain_capture();
        let _ = self.tx.tx().stalled();

        let mut sent: u64 = 0;
        for symbol in symbols.iter().take_while(|s| !s.is_end()) {
            self.tx.tx().wait_push(tx_word(symbol)).await;
            sent += 1;
        }

        if wait_for_completion {
            let deadline = Instant::now() + Duration::from_micros(sent * 5 + 50);
            loop {
                if self.tx.tx().empty() && self.tx.tx().stalled() {
                    break;
                }
                if Instant::now() > deadline {
                    return Err(LinkError::Io);
                }
                yield_now().await;
            }
        }
        Ok(())
    }

    fn start_capture(&mut self) -> Result<(), LinkError> {
        self.rx.set_enable(false);
        self.rx.clear_fifos();
        self.rx.restart();
        // SAFETY: jumps to the first instruction of our own loaded program
        unsafe { self.rx.exec_jmp(self.rx_origin) };
        self.rx.set_enable(true);
        self.capturing = true;
        Ok(())
    }

    fn stop_capture(&mut self) -> Result<(), LinkError> {
        self.rx.set_enable(false);
        self.rx.clear_fifos();
        self.capturing = false;
        Ok(())
    }

    async fn receive(&mut self, buf: &mut [PulseSymbol]) -> Result<usize, LinkError> {
        if !self.capturing {
            return Err(LinkError::Busy);
        }

        let mut len = 0;
        loop {
            let (symbol, last) = rx_symbol(self.rx.rx().wait_pull().await);
            if let Some(slot) = buf.get_mut(len) {
                *slot = symbol;
                len += 1;
            }
            if last {
                return Ok(len);
            }
        }
    }
}
