//! Controller state: 16 digital buttons and a signed 8-bit stick.
//!
//! The state is stored exactly as it travels on the wire: four bytes, the
//! button word first (MSB = A) followed by the X and Y axis. Typed accessors
//! and [`ControllerState::raw_word`] are two views over the same storage, so
//! they can never disagree.

use core::ops::{BitOr, BitOrAssign};

/// Button state represented as a bitfield in wire order.
///
/// Bit 15 is the first bit a controller sends (A), bit 0 the last (C-right).
///
/// # Example
///
/// ```
/// use joybus_proto::Buttons;
///
/// let buttons = Buttons::A | Buttons::Z;
/// assert!(buttons.contains(Buttons::A));
/// assert!(!buttons.contains(Buttons::B));
/// ```
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Buttons(pub u16);

impl Buttons {
    pub const A: Self = Self(1 << 15);
    pub const B: Self = Self(1 << 14);
    pub const Z: Self = Self(1 << 13);
    pub const START: Self = Self(1 << 12);
    pub const DPAD_UP: Self = Self(1 << 11);
    pub const DPAD_DOWN: Self = Self(1 << 10);
    pub const DPAD_LEFT: Self = Self(1 << 9);
    pub const DPAD_RIGHT: Self = Self(1 << 8);
    /// Set by the controller while L+R+Start re-centre the stick.
    pub const RESET: Self = Self(1 << 7);
    pub const RESERVED: Self = Self(1 << 6);
    pub const L: Self = Self(1 << 5);
    pub const R: Self = Self(1 << 4);
    pub const C_UP: Self = Self(1 << 3);
    pub const C_DOWN: Self = Self(1 << 2);
    pub const C_LEFT: Self = Self(1 << 1);
    pub const C_RIGHT: Self = Self(1 << 0);

    /// No buttons pressed.
    pub const NONE: Self = Self(0);

    /// Check if the given button(s) are pressed.
    #[inline]
    #[must_use]
    pub const fn contains(self, button: Buttons) -> bool {
        (self.0 & button.0) == button.0
    }

    /// Check if the given button is pressed (alias for contains).
    #[inline]
    #[must_use]
    pub const fn is_pressed(self, button: Buttons) -> bool {
        self.contains(button)
    }

    /// Set or clear button(s).
    #[inline]
    pub fn set(&mut self, button: Buttons, pressed: bool) {
        if pressed {
            self.0 |= button.0;
        } else {
            self.0 &= !button.0;
        }
    }

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Buttons {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Buttons {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Number of bytes in a controller state report.
pub const STATE_BYTES: usize = 4;

/// Complete controller snapshot, stored in wire order.
///
/// Zero-initialized state means no buttons pressed and the stick centered.
///
/// # Example
///
/// ```
/// use joybus_proto::{Buttons, ControllerState};
///
/// let state = ControllerState::new(Buttons::START, -12, 100);
/// assert_eq!(state.raw_word(), 0x1000_F464);
/// assert_eq!(state.stick_x(), -12);
/// ```
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerState {
    raw: [u8; STATE_BYTES],
}

impl ControllerState {
    /// Create a zeroed/neutral state (no buttons pressed, stick centered).
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            raw: [0; STATE_BYTES],
        }
    }

    #[must_use]
    pub const fn new(buttons: Buttons, stick_x: i8, stick_y: i8) -> Self {
        let [hi, lo] = buttons.0.to_be_bytes();
        Self {
            raw: [hi, lo, stick_x as u8, stick_y as u8],
        }
    }

    /// Build a state from its wire bytes.
    #[must_use]
    pub const fn from_bytes(raw: [u8; STATE_BYTES]) -> Self {
        Self { raw }
    }

    /// Build a state from the 32-bit word (first wire byte in the top bits).
    #[must_use]
    pub const fn from_raw_word(word: u32) -> Self {
        Self {
            raw: word.to_be_bytes(),
        }
    }

    /// The state as a single 32-bit word, first wire byte in the top bits.
    #[inline]
    #[must_use]
    pub const fn raw_word(&self) -> u32 {
        u32::from_be_bytes(self.raw)
    }

    /// The state as the four bytes a controller sends.
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; STATE_BYTES] {
        &self.raw
    }

    #[inline]
    #[must_use]
    pub const fn buttons(&self) -> Buttons {
        Buttons(u16::from_be_bytes([self.raw[0], self.raw[1]]))
    }

    #[inline]
    pub fn set_buttons(&mut self, buttons: Buttons) {
        let [hi, lo] = buttons.0.to_be_bytes();
        self.raw[0] = hi;
        self.raw[1] = lo;
    }

    #[inline]
    #[must_use]
    pub const fn is_pressed(&self, button: Buttons) -> bool {
        self.buttons().is_pressed(button)
    }

    /// Press or release button(s) in place.
    pub fn set_button(&mut self, button: Buttons, pressed: bool) {
        let mut buttons = self.buttons();
        buttons.set(button, pressed);
        self.set_buttons(buttons);
    }

    #[inline]
    #[must_use]
    pub const fn stick_x(&self) -> i8 {
        self.raw[2] as i8
    }

    #[inline]
    #[must_use]
    pub const fn stick_y(&self) -> i8 {
        self.raw[3] as i8
    }

    #[inline]
    pub fn set_stick(&mut self, x: i8, y: i8) {
        self.raw[2] = x as u8;
        self.raw[3] = y as u8;
    }

    /// Replace the stored bytes, reporting whether anything differed.
    pub(crate) fn replace_bytes(&mut self, raw: [u8; STATE_BYTES]) -> bool {
        let changed = self.raw != raw;
        self.raw = raw;
        changed
    }
}
