/// Color of one of the bicolor LEDs above the digits.
///
/// The LED byte for each digit drives the SEG9 and SEG10 outputs; on boards with bicolor LEDs the
/// first is wired to the red die and the second to the green one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::VariantArray, strum::FromRepr)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum LedColor {
    Off = 0b00,
    Red = 0b01,
    Green = 0b10,
}

impl From<LedColor> for u8 {
    fn from(color: LedColor) -> u8 {
        color as u8
    }
}
