/// The state of the 8 buttons on the board, as returned by [`crate::Tm1638::read_buttons`].
///
/// Bit `i` is set if button `i` was pressed when the keys were scanned.  The struct implements
/// [`Iterator`], so it can be used in a `for` loop to visit the index of every pressed button,
/// lowest index first.  As buttons are yielded they are cleared from the struct.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Buttons(u8);

impl Buttons {
    pub fn new(bits: u8) -> Self {
        Self(bits)
    }

    /// The raw bitmask
    pub fn bits(&self) -> u8 {
        self.0
    }

    /// Quickly check if *any* button is pressed
    pub fn any_pressed(&self) -> bool {
        self.0 != 0
    }

    /// Test if button `index` (0 to 7) is pressed
    pub fn is_pressed(&self, index: u8) -> bool {
        index < 8 && self.0 & (1 << index) != 0
    }
}

impl Iterator for Buttons {
    type Item = u8;

    fn next(&mut self) -> Option<Self::Item> {
        if self.0 == 0 {
            return None;
        }

        let index = self.0.trailing_zeros() as u8;
        self.0 &= !(1 << index);

        Some(index)
    }
}

impl From<Buttons> for u8 {
    fn from(buttons: Buttons) -> u8 {
        buttons.0
    }
}
