//! What the driver last wrote to each digit.
//!
//! The controller's display memory is write-only, so the only way to put a digit back the way it
//! was after temporarily lighting extra segments (see [`crate::Tm1638::blink_bar`]) is to remember
//! what was written there.

/// The number of 7 segment digits on the board
pub const DIGITS: usize = 8;

/// The contents of one digit: its segment code (without the dot bit) and whether the dot is lit
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Digit {
    pub code: u8,
    pub dot: bool,
}

impl Digit {
    pub const BLANK: Digit = Digit {
        code: 0,
        dot: false,
    };

    pub const fn new(code: u8, dot: bool) -> Self {
        Self { code, dot }
    }
}

/// The last persisted contents of all 8 digits, left to right.
///
/// This only tracks writes made through [`crate::Tm1638::send_char`] with `persist` set.
/// [`crate::Tm1638::clear_display`] writes to the controller directly and leaves this stale.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayState {
    digits: [Digit; DIGITS],
}

impl DisplayState {
    /// A blank display, which is also what the controller holds after [`crate::Tm1638::init`]
    pub const fn new() -> Self {
        Self {
            digits: [Digit::BLANK; DIGITS],
        }
    }

    /// Panics if `pos` is 8 or more
    pub fn get(&self, pos: u8) -> Digit {
        self.digits[pos as usize]
    }

    pub(crate) fn set(&mut self, pos: u8, digit: Digit) {
        self.digits[pos as usize] = digit;
    }

    pub fn digits(&self) -> &[Digit; DIGITS] {
        &self.digits
    }
}

impl Default for DisplayState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_blank() {
        let state = DisplayState::default();
        assert!(state.digits().iter().all(|d| *d == Digit::BLANK));
    }

    #[test]
    fn set_only_touches_one_position() {
        let mut state = DisplayState::new();
        state.set(3, Digit::new(0x5b, true));

        for pos in 0..DIGITS as u8 {
            let expected = if pos == 3 {
                Digit::new(0x5b, true)
            } else {
                Digit::BLANK
            };
            assert_eq!(expected, state.get(pos), "position {pos}");
        }
    }

    #[test]
    #[should_panic]
    fn out_of_range_position_panics() {
        DisplayState::new().get(DIGITS as u8);
    }
}
