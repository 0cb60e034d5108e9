//! Segment fonts and the names of the individual bars of a 7 segment digit.
//!
//! A segment code is a byte where bits 0 to 6 light segments `a` to `g` and bit 7 lights the
//! decimal point:
//!
//! ```text
//!    -a-
//!   f   b
//!    -g-
//!   e   c
//!    -d-  .dp
//! ```

/// Segment codes for the hex digits `0` to `F`, indexed by the digit value
pub type NumberFont = [u8; 16];

/// Segment codes for printable ASCII, indexed by the character code minus 32 (so `' '` is entry 0
/// and `'~'` the last one)
pub type AsciiFont = [u8; ASCII_FONT_LEN];

/// Number of printable ASCII characters, space through `~`
pub const ASCII_FONT_LEN: usize = 95;

const FIRST_PRINTABLE: u32 = 32;

/// Look up the segment code for `c` in an ASCII font.
///
/// Anything that isn't printable ASCII renders as a blank digit.
pub fn glyph(font: &AsciiFont, c: char) -> u8 {
    (c as u32)
        .checked_sub(FIRST_PRINTABLE)
        .and_then(|index| font.get(index as usize))
        .copied()
        .unwrap_or(0)
}

/// One bar of a 7 segment digit
#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::VariantArray)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Bar {
    Upper,
    UpperRight,
    LowerRight,
    Lower,
    LowerLeft,
    UpperLeft,
    Middle,
}

impl Bar {
    /// The segment code with only this bar lit
    pub const fn mask(self) -> u8 {
        match self {
            Self::Upper => 0b0000_0001,
            Self::UpperRight => 0b0000_0010,
            Self::LowerRight => 0b0000_0100,
            Self::Lower => 0b0000_1000,
            Self::LowerLeft => 0b0001_0000,
            Self::UpperLeft => 0b0010_0000,
            Self::Middle => 0b0100_0000,
        }
    }
}

impl From<Bar> for u8 {
    fn from(bar: Bar) -> u8 {
        bar.mask()
    }
}

/// Hex digits, `0` to `9` then `A b C d E F`
#[cfg(feature = "default-fonts")]
pub const NUMBER_FONT: NumberFont = [
    0x3f, 0x06, 0x5b, 0x4f, 0x66, 0x6d, 0x7d, 0x07, // 0 1 2 3 4 5 6 7
    0x7f, 0x6f, 0x77, 0x7c, 0x39, 0x5e, 0x79, 0x71, // 8 9 A b C d E F
];

/// A very primitive rendering of printable ASCII on 7 segments.  Letters that can't be drawn are
/// approximated, so `M` and `W` in particular look nothing like themselves.
///
/// Same glyphs as <https://github.com/gavinlyonsrepo/TM1638plus_PICO/blob/main/src/tm1638plus_common.cpp>
#[cfg(feature = "default-fonts")]
pub const ASCII_FONT: AsciiFont = [
    0x00, 0x86, 0x22, 0x7e, 0x6d, 0xd2, 0x46, 0x20, // SP ! " # $ % & '
    0x29, 0x0b, 0x21, 0x70, 0x10, 0x40, 0x80, 0x52, // ( ) * + , - . /
    0x3f, 0x06, 0x5b, 0x4f, 0x66, 0x6d, 0x7d, 0x07, // 0 1 2 3 4 5 6 7
    0x7f, 0x6f, 0x09, 0x0d, 0x61, 0x48, 0x43, 0xd3, // 8 9 : ; < = > ?
    0x5f, 0x77, 0x7c, 0x39, 0x5e, 0x79, 0x71, 0x3d, // @ A B C D E F G
    0x76, 0x30, 0x1e, 0x75, 0x38, 0x15, 0x37, 0x3f, // H I J K L M N O
    0x73, 0x6b, 0x33, 0x6d, 0x78, 0x3e, 0x3e, 0x2a, // P Q R S T U V W
    0x76, 0x6e, 0x5b, 0x39, 0x64, 0x0f, 0x23, 0x08, // X Y Z [ \ ] ^ _
    0x02, 0x5f, 0x7c, 0x58, 0x5e, 0x7b, 0x71, 0x6f, // ` a b c d e f g
    0x74, 0x10, 0x0c, 0x75, 0x30, 0x14, 0x54, 0x5c, // h i j k l m n o
    0x73, 0x67, 0x50, 0x6d, 0x78, 0x1c, 0x1c, 0x14, // p q r s t u v w
    0x76, 0x6e, 0x5b, 0x46, 0x30, 0x70, 0x01, // x y z { | } ~
];
