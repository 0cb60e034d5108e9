//! A software model of the TM1638 used by the tests.
//!
//! [`SimChip`] implements [`Pins`] and decodes the bit-banged waveform the way the real chip does:
//! bits are latched on the rising clock edge while strobe is low, and each strobe-low period is one
//! frame.  Completed frames are logged and applied to a 16 byte display memory.  During a key scan
//! the chip drives DIO after each falling clock edge.

use crate::bus::Pins;
use core::convert::Infallible;
use embedded_hal_1::delay::DelayNs;
use embedded_hal_1::digital::PinState;
use std::vec::Vec;

pub(crate) struct SimChip {
    strobe: PinState,
    clock: PinState,
    dio_out: PinState,
    dio_input: bool,
    shift: u8,
    bit_count: u8,
    frame: Vec<u8>,
    read_bit: usize,
    presented: PinState,
    auto_increment: bool,

    /// Every transaction seen, one entry per strobe-low period
    pub frames: Vec<Vec<u8>>,

    /// Display memory: even addresses are digits, odd addresses are LEDs
    pub memory: [u8; 16],

    /// The last display control command
    pub display_control: Option<u8>,

    /// What the keypad reports on the next scan
    pub keys: [u8; 4],
}

impl SimChip {
    pub fn new() -> Self {
        Self {
            strobe: PinState::High,
            clock: PinState::High,
            dio_out: PinState::Low,
            dio_input: false,
            shift: 0,
            bit_count: 0,
            frame: Vec::new(),
            read_bit: 0,
            presented: PinState::High,
            auto_increment: true,
            frames: Vec::new(),
            // Power-on garbage, so tests can tell a clear from untouched memory
            memory: [0xAA; 16],
            display_control: None,
            keys: [0; 4],
        }
    }

    pub fn dio_is_output_low(&self) -> bool {
        !self.dio_input && self.dio_out == PinState::Low
    }

    /// Frames logged after the first `skip`
    pub fn frames_after(&self, skip: usize) -> &[Vec<u8>] {
        &self.frames[skip..]
    }

    fn end_frame(&mut self) {
        let frame = core::mem::take(&mut self.frame);
        assert_eq!(0, self.bit_count, "strobe went high mid-byte in frame {frame:x?}");

        if let Some((&command, data)) = frame.split_first() {
            match command & 0b1100_0000 {
                0b0100_0000 => {
                    self.auto_increment = command & 0b0000_0100 == 0;
                }
                0b1000_0000 => {
                    self.display_control = Some(command);
                }
                0b1100_0000 => {
                    let mut address = (command & 0x0f) as usize;
                    for b in data {
                        self.memory[address] = *b;
                        if self.auto_increment {
                            address = (address + 1) % self.memory.len();
                        }
                    }
                }
                _ => panic!("unknown command {command:#04x}"),
            }
        }

        self.frames.push(frame);
    }

    fn scanning_keys(&self) -> bool {
        self.frame.first() == Some(&0x42)
    }
}

impl Pins for SimChip {
    type Error = Infallible;

    fn set_strobe(&mut self, state: PinState) -> Result<(), Self::Error> {
        match (self.strobe, state) {
            (PinState::High, PinState::Low) => {
                self.frame.clear();
                self.shift = 0;
                self.bit_count = 0;
                self.read_bit = 0;
            }
            (PinState::Low, PinState::High) => self.end_frame(),
            _ => {}
        }
        self.strobe = state;
        Ok(())
    }

    fn set_clock(&mut self, state: PinState) -> Result<(), Self::Error> {
        let selected = self.strobe == PinState::Low;

        match (self.clock, state) {
            (PinState::Low, PinState::High) if selected && !self.dio_input => {
                if self.dio_out == PinState::High {
                    self.shift |= 1 << self.bit_count;
                }
                self.bit_count += 1;
                if self.bit_count == 8 {
                    self.frame.push(self.shift);
                    self.shift = 0;
                    self.bit_count = 0;
                }
            }
            (PinState::High, PinState::Low) if selected && self.dio_input => {
                self.presented = if self.scanning_keys() {
                    let byte = self.keys.get(self.read_bit / 8).copied().unwrap_or(0);
                    PinState::from(byte & (1 << (self.read_bit % 8)) != 0)
                } else {
                    PinState::High
                };
                self.read_bit += 1;
            }
            _ => {}
        }

        self.clock = state;
        Ok(())
    }

    fn set_dio(&mut self, state: PinState) -> Result<(), Self::Error> {
        assert!(!self.dio_input, "driving DIO while it is an input");
        self.dio_out = state;
        Ok(())
    }

    fn read_dio(&mut self) -> Result<PinState, Self::Error> {
        assert!(self.dio_input, "reading DIO while it is an output");
        Ok(self.presented)
    }

    fn set_dio_as_input(&mut self) -> Result<(), Self::Error> {
        self.dio_input = true;
        self.presented = PinState::High;
        Ok(())
    }

    fn set_dio_as_output(&mut self) -> Result<(), Self::Error> {
        self.dio_input = false;
        Ok(())
    }
}

/// Delay which returns immediately
#[derive(Clone, Copy, Default)]
pub(crate) struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

/// Delay which returns immediately but adds up how long it was asked to wait
#[derive(Clone, Default)]
pub(crate) struct RecordingDelay {
    pub total_ns: u64,
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}
