//! Module describing the [`Pins`] and [`BusDriver`] traits, the bit-banging implementation of the
//! TM1638 bus built on top of them, and the built-in [`Pins`] implementations.

use embedded_hal_1::delay::DelayNs;
use embedded_hal_1::digital::{ErrorType, InputPin, OutputPin, PinState};

/// Time to wait between pulling the clock low and sampling DIO while reading from the controller.
///
/// This is three CPU cycles at 50 MHz.  It's not derived from the datasheet; without a small
/// pause here the chip hasn't put the next bit on DIO yet and the read is garbage.
pub const RECEIVE_SETTLE_NS: u32 = 60;

/// This trait represents some low-level implementation of the TM1638 bus interface.
///
/// The TM1638 uses a three-wire bus similar to SPI, but not so similar that we can just use an SPI
/// implementation instead.  This trait exposes a byte-level interface where each method is one
/// complete transaction, from pulling strobe low to pulling it high again.
pub trait BusDriver {
    type Error;

    /// Send a single command, with no payload, and no response expected
    fn send_command(&mut self, b: u8) -> Result<(), Self::Error>;

    /// Send a command with a data payload, but no response expected.
    fn send_command_write_data(&mut self, b: u8, data: &[u8]) -> Result<(), Self::Error>;

    /// Send a command which is expected to generate a response.
    ///
    /// The expected size of the response (in bytes) is determined by the size of the `data` slice.
    /// This operation will return once enough bytes are received to fill `data`.
    fn send_command_read_data(&mut self, b: u8, data: &mut [u8]) -> Result<(), Self::Error>;
}

/// The three GPIO lines the TM1638 is wired to.
///
/// There is no abstraction in embedded-hal for a pin which switches between input and output at
/// runtime (see [this issue](https://github.com/rust-embedded/embedded-hal/issues/397)), so DIO
/// direction switching is part of this trait.  Implement it for your platform if none of the
/// built-in implementations fit.
pub trait Pins {
    type Error;

    fn set_strobe(&mut self, state: PinState) -> Result<(), Self::Error>;

    fn set_clock(&mut self, state: PinState) -> Result<(), Self::Error>;

    /// Drive DIO.  Only meaningful while DIO is an output.
    fn set_dio(&mut self, state: PinState) -> Result<(), Self::Error>;

    /// Sample DIO.  Only meaningful while DIO is an input.
    fn read_dio(&mut self) -> Result<PinState, Self::Error>;

    /// Stop driving DIO so the controller can drive it.  The line must idle high.
    fn set_dio_as_input(&mut self) -> Result<(), Self::Error>;

    fn set_dio_as_output(&mut self) -> Result<(), Self::Error>;
}

/// Implementation of [`BusDriver`] which toggles the pins in software.
///
/// Works with any [`Pins`] implementation and any [`DelayNs`] implementation.  The delay is only
/// used while reading from the controller.
pub struct BitBangingBusDriver<P, D> {
    pins: P,
    delay: D,
}

impl<P: Pins, D: DelayNs> BitBangingBusDriver<P, D> {
    /// Put the pins in their idle state: strobe and clock high, DIO an output driven low.
    pub fn new(mut pins: P, delay: D) -> Result<Self, P::Error> {
        pins.set_dio_as_output()?;
        pins.set_dio(PinState::Low)?;
        pins.set_clock(PinState::High)?;
        pins.set_strobe(PinState::High)?;

        Ok(Self { pins, delay })
    }

    pub fn pins(&self) -> &P {
        &self.pins
    }

    pub fn pins_mut(&mut self) -> &mut P {
        &mut self.pins
    }

    /// Give back the pins and the delay
    pub fn release(self) -> (P, D) {
        (self.pins, self.delay)
    }

    /// Shift the byte value out on the DIO pin, LSB first.
    ///
    /// The controller latches DIO on the rising edge of the clock.  Assumes DIO is an output and
    /// strobe is already low.
    pub fn send(&mut self, mut b: u8) -> Result<(), P::Error> {
        for _ in 0..8 {
            self.pins.set_clock(PinState::Low)?;
            self.pins.set_dio(PinState::from(b & 1 != 0))?;
            b >>= 1;
            self.pins.set_clock(PinState::High)?;
        }

        Ok(())
    }

    /// Shift a byte in from the DIO pin, using the clock to drive the controller.
    ///
    /// The controller sends LSB first; each sampled bit enters at the top and is shifted down, so
    /// the first bit read ends up in bit 0.  DIO is handed back as an output driven low.
    pub fn receive(&mut self) -> Result<u8, P::Error> {
        let mut value = 0u8;

        self.pins.set_dio_as_input()?;

        for _ in 0..8 {
            value >>= 1;

            self.pins.set_clock(PinState::Low)?;
            self.delay.delay_ns(RECEIVE_SETTLE_NS);

            if self.pins.read_dio()? == PinState::High {
                value |= 0b1000_0000;
            }

            self.pins.set_clock(PinState::High)?;
        }

        self.pins.set_dio_as_output()?;
        self.pins.set_dio(PinState::Low)?;

        Ok(value)
    }

    fn strobe_select(&mut self) -> Result<(), P::Error> {
        self.pins.set_strobe(PinState::Low)
    }

    fn strobe_deselect(&mut self) -> Result<(), P::Error> {
        self.pins.set_strobe(PinState::High)
    }
}

impl<P: Pins, D: DelayNs> BusDriver for BitBangingBusDriver<P, D> {
    type Error = P::Error;

    /// Send a single byte that represents a command, so strobe will be pulled low
    /// before the command's bits are sent, and then pulled high again after.
    fn send_command(&mut self, b: u8) -> Result<(), Self::Error> {
        self.strobe_select()?;
        self.send(b)?;
        self.strobe_deselect()
    }

    /// Send a single byte that represents a command followed by one or more data bytes, so strobe
    /// will be pulled low before the command's bits are sent, and not pulled high again
    /// until after the data bytes are sent.
    fn send_command_write_data(&mut self, b: u8, data: &[u8]) -> Result<(), Self::Error> {
        debug_assert!(!data.is_empty());
        self.strobe_select()?;
        self.send(b)?;
        for b in data {
            #[cfg(feature = "defmt")]
            defmt::trace!("data byte = {=u8:x}", *b);
            self.send(*b)?;
        }
        self.strobe_deselect()
    }

    /// Send a command byte and read the response, all while strobe is low.
    ///
    /// The datasheet asks for a tWAIT pause between the command and the first read.  It works
    /// without one, so none is inserted.
    fn send_command_read_data(&mut self, b: u8, data: &mut [u8]) -> Result<(), Self::Error> {
        self.strobe_select()?;
        self.send(b)?;

        #[cfg(feature = "defmt")]
        defmt::trace!("Expecting {0} bytes from controller", data.len());

        for byte in data.iter_mut() {
            *byte = self.receive()?;
        }

        self.strobe_deselect()
    }
}

/// [`Pins`] for any embedded-hal 1.0 pins, with DIO wired as an open-drain output with a pull-up.
///
/// Switching DIO to input just releases the line (drives it high), after which the controller can
/// pull it low.  All three pins must share an error type.
pub struct OpenDrainPins<STB, CLK, DIO> {
    strobe: STB,
    clock: CLK,
    dio: DIO,
}

impl<STB, CLK, DIO> OpenDrainPins<STB, CLK, DIO> {
    pub fn new(strobe: STB, clock: CLK, dio: DIO) -> Self {
        Self { strobe, clock, dio }
    }

    /// Give back the pins as `(strobe, clock, dio)`
    pub fn release(self) -> (STB, CLK, DIO) {
        (self.strobe, self.clock, self.dio)
    }
}

impl<STB, CLK, DIO> Pins for OpenDrainPins<STB, CLK, DIO>
where
    CLK: OutputPin,
    STB: OutputPin + ErrorType<Error = CLK::Error>,
    DIO: InputPin + OutputPin + ErrorType<Error = CLK::Error>,
{
    type Error = CLK::Error;

    fn set_strobe(&mut self, state: PinState) -> Result<(), Self::Error> {
        self.strobe.set_state(state)
    }

    fn set_clock(&mut self, state: PinState) -> Result<(), Self::Error> {
        self.clock.set_state(state)
    }

    fn set_dio(&mut self, state: PinState) -> Result<(), Self::Error> {
        self.dio.set_state(state)
    }

    fn read_dio(&mut self) -> Result<PinState, Self::Error> {
        Ok(PinState::from(self.dio.is_high()?))
    }

    fn set_dio_as_input(&mut self) -> Result<(), Self::Error> {
        self.dio.set_high()
    }

    fn set_dio_as_output(&mut self) -> Result<(), Self::Error> {
        // Open drain pins are always outputs
        Ok(())
    }
}

#[cfg(feature = "embassy-rp")]
mod embassy_rp_pins {
    use core::convert::Infallible;
    use embassy_rp::gpio;
    use embedded_hal_1::digital::PinState;

    fn level(state: PinState) -> gpio::Level {
        match state {
            PinState::Low => gpio::Level::Low,
            PinState::High => gpio::Level::High,
        }
    }

    /// Implementation of [`super::Pins`] that uses the Embassy RP HAL for the RP2040
    /// microcontroller.
    pub struct EmbassyRpPins<'a, StrobePin: gpio::Pin, ClockPin: gpio::Pin, DioPin: gpio::Pin> {
        strobe: gpio::Output<'a, StrobePin>,
        clock: gpio::Output<'a, ClockPin>,
        dio: gpio::Flex<'a, DioPin>,
    }

    impl<'a, StrobePin: gpio::Pin, ClockPin: gpio::Pin, DioPin: gpio::Pin>
        EmbassyRpPins<'a, StrobePin, ClockPin, DioPin>
    {
        pub fn new(strobe: StrobePin, clock: ClockPin, dio: DioPin) -> Self {
            let mut dio = gpio::Flex::new(dio);

            // When we stop driving DIO it has to float high, or key scans read all ones as zeros
            dio.set_pull(gpio::Pull::Up);
            dio.set_as_output();
            dio.set_low();

            Self {
                strobe: gpio::Output::new(strobe, gpio::Level::High),
                clock: gpio::Output::new(clock, gpio::Level::High),
                dio,
            }
        }
    }

    impl<'a, StrobePin: gpio::Pin, ClockPin: gpio::Pin, DioPin: gpio::Pin> super::Pins
        for EmbassyRpPins<'a, StrobePin, ClockPin, DioPin>
    {
        type Error = Infallible;

        fn set_strobe(&mut self, state: PinState) -> Result<(), Self::Error> {
            self.strobe.set_level(level(state));
            Ok(())
        }

        fn set_clock(&mut self, state: PinState) -> Result<(), Self::Error> {
            self.clock.set_level(level(state));
            Ok(())
        }

        fn set_dio(&mut self, state: PinState) -> Result<(), Self::Error> {
            self.dio.set_level(level(state));
            Ok(())
        }

        fn read_dio(&mut self) -> Result<PinState, Self::Error> {
            Ok(PinState::from(self.dio.is_high()))
        }

        fn set_dio_as_input(&mut self) -> Result<(), Self::Error> {
            self.dio.set_as_input();
            Ok(())
        }

        fn set_dio_as_output(&mut self) -> Result<(), Self::Error> {
            self.dio.set_as_output();
            Ok(())
        }
    }
}

#[cfg(feature = "embassy-rp")]
pub use embassy_rp_pins::EmbassyRpPins;
