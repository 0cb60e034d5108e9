#![cfg_attr(not(test), no_std)]

//! Blocking driver for TM1638 LED and key controller boards with 8 7-segment digits, 8 bicolor
//! LEDs and 8 buttons, talking to the chip by bit-banging its three wire bus.

mod bus;
mod buttons;
mod cache;
mod font;
mod led;
#[cfg(test)]
mod sim;

pub use bus::*;
pub use buttons::*;
pub use cache::*;
pub use embedded_hal_1::delay::DelayNs;
pub use font::*;
pub use led::*;

/// The number of bytes used to represent the state of the keys on the board
const KEY_BYTES: usize = 4;

/// The controller has 16 bytes of display memory; each digit uses two of them
const ADDRESS_SLOTS: usize = 16;

const INITIAL_DISPLAY_STATE: &[u8; ADDRESS_SLOTS] = &[0x00; ADDRESS_SLOTS];

/// Segment code bit for the decimal point
const DOT: u8 = 0b1000_0000;

/// Brightness can be 0x00 to 0x07, 0x00 is least bright
const MAX_INTENSITY: u8 = 0x07;

/// How long [`Tm1638::blink_bar`] waits per unit of its delay factor
pub const BLINK_DELAY_UNIT_US: u32 = 600;

/// Largest magnitude [`Tm1638::set_display_number`] can fit in 8 digits
pub const MAX_DISPLAYABLE: u32 = 99_999_999;

/// Shown by [`Tm1638::set_display_number`] when the number doesn't fit
pub const OVERFLOW_TEXT: &str = "N TOO BG";

pub struct Tm1638Builder;

impl Tm1638Builder {
    /// Use the same [`DelayNs`] implementation for the bus timing and for the pauses while
    /// blinking.
    pub fn with_delay<D: DelayNs + Clone>(self, delay: D) -> Tm1638Builder1<D> {
        self.with_delays(delay.clone(), delay)
    }

    /// Use one delay instance for the bus timing and another for the pauses while blinking.
    pub fn with_delays<D: DelayNs>(self, bus_delay: D, delay: D) -> Tm1638Builder1<D> {
        Tm1638Builder1 { bus_delay, delay }
    }

    #[cfg(feature = "embassy-time")]
    /// Use the [`DelayNs`] implementation from `embassy-time`
    pub fn with_embassy_delay(self) -> Tm1638Builder1<embassy_time::Delay> {
        self.with_delays(embassy_time::Delay, embassy_time::Delay)
    }
}

pub struct Tm1638Builder1<D: DelayNs> {
    bus_delay: D,
    delay: D,
}

impl<D: DelayNs> Tm1638Builder1<D> {
    /// Use an arbitrary [`BusDriver`] implementation.  The bus delay is not needed in that case
    /// and is dropped.
    pub fn with_bus_driver<Driver: BusDriver>(self, driver: Driver) -> Tm1638Builder2<Driver, D> {
        Tm1638Builder2 {
            driver,
            delay: self.delay,
        }
    }

    /// Use the bit-banging driver, with an arbitrary implementation of [`Pins`] specific to your
    /// target platform
    pub fn with_bit_banging_driver<P: Pins>(self, pins: P) -> Tm1638Builder3<P, D> {
        Tm1638Builder3 {
            pins,
            bus_delay: self.bus_delay,
            delay: self.delay,
        }
    }

    /// Use the bit-banging driver with plain embedded-hal pins, DIO being open drain
    pub fn with_open_drain_pins<STB, CLK, DIO>(
        self,
        strobe: STB,
        clock: CLK,
        dio: DIO,
    ) -> Tm1638Builder3<OpenDrainPins<STB, CLK, DIO>, D>
    where
        OpenDrainPins<STB, CLK, DIO>: Pins,
    {
        self.with_bit_banging_driver(OpenDrainPins::new(strobe, clock, dio))
    }

    /// Use a bit-banging driver talking to the specified Embassy RP HAL pins
    #[cfg(feature = "embassy-rp")]
    pub fn with_embassy_rp_pins<
        'a,
        StrobePin: embassy_rp::gpio::Pin,
        ClockPin: embassy_rp::gpio::Pin,
        DioPin: embassy_rp::gpio::Pin,
    >(
        self,
        strobe: StrobePin,
        clock: ClockPin,
        dio: DioPin,
    ) -> Tm1638Builder3<EmbassyRpPins<'a, StrobePin, ClockPin, DioPin>, D> {
        self.with_bit_banging_driver(EmbassyRpPins::new(strobe, clock, dio))
    }
}

pub struct Tm1638Builder2<Driver: BusDriver, D: DelayNs> {
    driver: Driver,
    delay: D,
}

impl<Driver: BusDriver, D: DelayNs> Tm1638Builder2<Driver, D> {
    /// Construct the [`Tm1638`] instance using the selected driver.
    pub fn build(self) -> Tm1638<Driver, D> {
        Tm1638::new(self.driver, self.delay)
    }
}

pub struct Tm1638Builder3<P: Pins, D: DelayNs> {
    pins: P,
    bus_delay: D,
    delay: D,
}

impl<P: Pins, D: DelayNs> Tm1638Builder3<P, D> {
    /// Construct the [`Tm1638`] instance using the bit-banging driver.
    ///
    /// This is fallible if the underlying I/O implementation is.
    pub fn build(self) -> Result<Tm1638<BitBangingBusDriver<P, D>, D>, P::Error> {
        let driver = BitBangingBusDriver::new(self.pins, self.bus_delay)?;
        Ok(Tm1638::new(driver, self.delay))
    }
}

/// Driver for a TM1638 board with 8 digits, 8 LEDs and 8 buttons.
///
/// The implementation is generalized over the bus protocol driver, behind the [`BusDriver`]
/// trait, and over the [`DelayNs`] used to pace the blinking effects.  Every operation blocks
/// until the controller has been told everything, and there is no way to abort one halfway.
///
/// Positions are numbered 0 (left-most digit) to 7.  Passing anything larger is a bug in the
/// caller and panics.
///
/// The most straightforward way to instantiate this driver is using [`Self::builder`]:
///
/// ```
/// # #[cfg(all(feature = "embassy-time", feature = "embassy-rp"))]
/// # {
/// let p = embassy_rp::init(Default::default());
/// let mut tm1638 = tm1638_bitbang::Tm1638::builder()
///     .with_embassy_delay()
///     .with_embassy_rp_pins(p.PIN_6, p.PIN_7, p.PIN_8)
///     .build()
///     .unwrap();
/// tm1638.init(true, 2).unwrap();
/// # }
/// ```
pub struct Tm1638<Driver, Delay> {
    driver: Driver,
    delay: Delay,
    state: DisplayState,
}

impl Tm1638<(), ()> {
    /// Return a builder pattern implementation to ease some of the type parameter complexity
    /// around creating the bus driver and delay.
    ///
    /// This is not required; you can always instantiate the driver with [`Tm1638::new`].
    pub fn builder() -> Tm1638Builder {
        Tm1638Builder
    }
}

impl<Driver: BusDriver, Delay: DelayNs> Tm1638<Driver, Delay> {
    /// Wrap a bus driver.  Nothing is sent to the controller until [`Self::init`].
    pub fn new(driver: Driver, delay: Delay) -> Self {
        Self {
            driver,
            delay,
            state: DisplayState::new(),
        }
    }

    /// Reset the controller: select auto-increment addressing, set up the display, and zero all
    /// 16 bytes of display memory (every digit and every LED) in a single transaction.
    pub fn init(&mut self, active: bool, intensity: u8) -> Result<(), Driver::Error> {
        self.apply_write_command(WriteCommand::SetIncrementalAddressing)?;
        self.setup_display(active, intensity)?;

        self.apply_write_command(WriteCommand::WriteMultiple {
            start_address: 0,
            data: INITIAL_DISPLAY_STATE,
        })
    }

    /// What was last persisted to each digit
    pub fn display_state(&self) -> &DisplayState {
        &self.state
    }

    pub fn driver(&self) -> &Driver {
        &self.driver
    }

    /// Give back the bus driver and the delay
    pub fn release(self) -> (Driver, Delay) {
        (self.driver, self.delay)
    }

    /// Send a raw command byte in a transaction of its own
    pub fn send_command(&mut self, cmd: u8) -> Result<(), Driver::Error> {
        #[cfg(feature = "defmt")]
        defmt::trace!("command byte = {=u8:x}", cmd);

        self.driver.send_command(cmd)
    }

    /// Write one byte of display memory.
    ///
    /// Even addresses are digits, odd addresses are LEDs.  This switches the controller to fixed
    /// addressing first, since it may still be in auto-increment mode from [`Self::init`] or a
    /// key scan.
    pub fn send_data(&mut self, address: u8, data: u8) -> Result<(), Driver::Error> {
        self.apply_write_command(WriteCommand::SetFixedAddressing)?;
        self.apply_write_command(WriteCommand::WriteSingle { address, data })
    }

    /// Write the segment code `code` to digit `pos`, with the dot lit if `dot` is set.
    ///
    /// If `persist` is set the digit is also recorded in [`Self::display_state`], so that
    /// [`Self::blink_bar`] can put it back later.
    pub fn send_char(
        &mut self,
        pos: u8,
        code: u8,
        dot: bool,
        persist: bool,
    ) -> Result<(), Driver::Error> {
        debug_assert!((pos as usize) < DIGITS);

        let data = if dot { code | DOT } else { code };
        self.send_data(pos << 1, data)?;

        if persist {
            self.state.set(pos, Digit::new(code, dot));
        }

        Ok(())
    }

    /// Scan the keys and return a bitmask where bit `i` is set if button `i` is pressed.
    ///
    /// The four bytes read from the controller are folded together, byte `n` shifted left by `n`.
    pub fn get_buttons(&mut self) -> Result<u8, Driver::Error> {
        let mut buffer = [0u8; KEY_BYTES];

        self.apply_read_command(ReadCommand::ReadKeys, &mut buffer)?;

        #[cfg(feature = "defmt")]
        defmt::trace!("keys = {:?}", buffer);

        Ok(buffer
            .iter()
            .enumerate()
            .fold(0u8, |buttons, (i, byte)| buttons | (*byte << i)))
    }

    /// Same as [`Self::get_buttons`], wrapped in [`Buttons`]
    pub fn read_buttons(&mut self) -> Result<Buttons, Driver::Error> {
        self.get_buttons().map(Buttons::new)
    }

    /// Turn the display on or off, and set its brightness.
    ///
    /// `intensity` ranges from 0 (dimmest) to 7 (brightest); anything above 7 is treated as 7.
    pub fn setup_display(&mut self, active: bool, intensity: u8) -> Result<(), Driver::Error> {
        self.apply_write_command(WriteCommand::SetupDisplay { active, intensity })
    }

    /// Show the hex digit `digit & 0xF` at `pos`
    pub fn set_display_digit(
        &mut self,
        digit: u8,
        pos: u8,
        dot: bool,
        font: &NumberFont,
    ) -> Result<(), Driver::Error> {
        self.send_char(pos, font[(digit & 0x0f) as usize], dot, true)
    }

    /// Blank the digit at `pos`, optionally leaving its dot lit
    pub fn clear_display_digit(&mut self, pos: u8, dot: bool) -> Result<(), Driver::Error> {
        self.send_char(pos, 0, dot, true)
    }

    /// Write `text` into consecutive digits starting at `pos`.
    ///
    /// Stops at the end of `text`, at a NUL character, or at the right edge of the display,
    /// whichever comes first.  Digits past the end of the text are left alone.
    ///
    /// `dots` is read from the most significant bit down: character `i` of `text` gets its dot
    /// lit if bit `7 - i` is set.  Note that this is relative to the text, not the display, so
    /// with `pos` 2 the first character's dot is still bit 7.
    pub fn set_display_text(
        &mut self,
        text: &str,
        dots: u8,
        pos: u8,
        font: &AsciiFont,
    ) -> Result<(), Driver::Error> {
        let room = DIGITS.saturating_sub(pos as usize);

        for (i, c) in text
            .chars()
            .take_while(|c| *c != '\0')
            .take(room)
            .enumerate()
        {
            let dot = dots & (1 << (DIGITS - i - 1)) != 0;
            self.send_char(pos + i as u8, glyph(font, c), dot, true)?;
        }

        Ok(())
    }

    /// Show `number` right-aligned across all 8 digits.
    ///
    /// Digits to the left of the number are blanked, except that a negative number gets a minus
    /// sign immediately to its left.  A negative number with 8 digits has no room for the sign,
    /// which is then dropped.  Numbers whose magnitude exceeds [`MAX_DISPLAYABLE`] show
    /// [`OVERFLOW_TEXT`] instead.
    ///
    /// Digits, the minus sign and the overflow text are all looked up in `font`.
    pub fn set_display_number(
        &mut self,
        number: i32,
        font: &AsciiFont,
    ) -> Result<(), Driver::Error> {
        let mut magnitude = number.unsigned_abs();

        if magnitude > MAX_DISPLAYABLE {
            return self.set_display_text(OVERFLOW_TEXT, 0, 0, font);
        }

        let mut minus = number < 0;
        let last = DIGITS as u8 - 1;

        for pos in (0..=last).rev() {
            if magnitude != 0 || pos == last {
                // A zero still needs its one digit
                let digit = (magnitude % 10) as u8;
                self.send_char(pos, glyph(font, char::from(b'0' + digit)), false, true)?;
                magnitude /= 10;
            } else if minus {
                self.send_char(pos, glyph(font, '-'), false, true)?;
                minus = false;
            } else {
                self.clear_display_digit(pos, false)?;
            }
        }

        Ok(())
    }

    /// Zero every digit's display memory, dots included.
    ///
    /// This writes to the controller directly and does *not* update [`Self::display_state`], so
    /// a later [`Self::blink_bar`] will restore whatever was persisted before the clear.
    pub fn clear_display(&mut self) -> Result<(), Driver::Error> {
        for pos in 0..DIGITS as u8 {
            self.send_data(pos << 1, 0x00)?;
        }

        Ok(())
    }

    /// Set the LED above digit `pos`
    pub fn set_led(&mut self, pos: u8, color: LedColor) -> Result<(), Driver::Error> {
        debug_assert!((pos as usize) < DIGITS);
        self.send_data((pos << 1) + 1, color.into())
    }

    /// Briefly light the segments in `bar` on top of whatever digit `pos` shows, then put the
    /// digit back.
    ///
    /// The pause lasts `delay_factor` times [`BLINK_DELAY_UNIT_US`].  Neither write is persisted;
    /// the digit is restored from [`Self::display_state`].
    pub fn blink_bar(&mut self, pos: u8, bar: u8, delay_factor: u8) -> Result<(), Driver::Error> {
        let Digit { code, dot } = self.state.get(pos);

        self.send_char(pos, code | bar, dot, false)?;
        self.delay
            .delay_us(BLINK_DELAY_UNIT_US * u32::from(delay_factor));
        self.send_char(pos, code, dot, false)
    }

    /// Run a single lit bar once around the outside of the display: down the left edge, along
    /// the bottom left to right, up the right edge and back along the top.
    ///
    /// The higher `speed`, the shorter each step; 255 doesn't pause at all.
    pub fn blink_around(&mut self, speed: u8) -> Result<(), Driver::Error> {
        let delay_factor = u8::MAX - speed;
        let last = DIGITS as u8 - 1;

        self.blink_bar(0, Bar::UpperLeft.mask(), delay_factor)?;
        self.blink_bar(0, Bar::LowerLeft.mask(), delay_factor)?;
        for pos in 0..=last {
            self.blink_bar(pos, Bar::Lower.mask(), delay_factor)?;
        }
        self.blink_bar(last, Bar::LowerRight.mask(), delay_factor)?;
        self.blink_bar(last, Bar::UpperRight.mask(), delay_factor)?;
        for pos in (0..=last).rev() {
            self.blink_bar(pos, Bar::Upper.mask(), delay_factor)?;
        }

        Ok(())
    }

    /// Apply the command to the controller
    fn apply_write_command(&mut self, command: WriteCommand<'_>) -> Result<(), Driver::Error> {
        let (command_byte, data_bytes) = command.encode();

        #[cfg(feature = "defmt")]
        defmt::trace!("command byte = {=u8:x}", command_byte);

        if let Some(data_bytes) = data_bytes {
            self.driver
                .send_command_write_data(command_byte, data_bytes)
        } else {
            self.driver.send_command(command_byte)
        }
    }

    fn apply_read_command(
        &mut self,
        command: ReadCommand,
        read_buffer: &mut [u8],
    ) -> Result<(), Driver::Error> {
        let (command_byte, read_bytes) = command.encode();

        #[cfg(feature = "defmt")]
        defmt::trace!("command byte = {=u8:x}", command_byte);

        debug_assert!(read_bytes <= read_buffer.len());

        // Limit the read buffer to just the range needed to store these results
        let read_buffer = &mut read_buffer[0..read_bytes];

        self.driver.send_command_read_data(command_byte, read_buffer)
    }
}

/// Represents possible write-only commands sent to the TM1638 as Rust enums for greater readability.
enum WriteCommand<'a> {
    /// Turn the display on or off and set its brightness
    SetupDisplay {
        active: bool,

        /// Brightness, in a range from 0 to 7.  Larger values are clamped to 7.
        intensity: u8,
    },

    /// Each data byte written goes to the next address
    SetIncrementalAddressing,

    /// Every data byte written goes to the address that was set
    SetFixedAddressing,

    /// Set the address and write one byte there
    WriteSingle { address: u8, data: u8 },

    /// Set the address and write several bytes from there on.  Only meaningful in incremental
    /// addressing mode.
    WriteMultiple { start_address: u8, data: &'a [u8] },
}

impl<'a> WriteCommand<'a> {
    /// Convert this command into the command byte and the (optional) data bytes sent with it
    /// while strobe is held low.
    fn encode<'me>(&'me self) -> (u8, Option<&'me [u8]>)
    where
        'a: 'me,
    {
        match self {
            WriteCommand::SetupDisplay { active, intensity } => {
                // Bit 3 switches the display on, the lowest three bits are the pulse width
                let active = if *active { 0b0000_1000 } else { 0 };

                (0b1000_0000 | active | (*intensity).min(MAX_INTENSITY), None)
            }
            WriteCommand::SetIncrementalAddressing => (0b0100_0000, None),
            WriteCommand::SetFixedAddressing => (0b0100_0100, None),
            WriteCommand::WriteSingle { address, data } => {
                debug_assert!((*address as usize) < ADDRESS_SLOTS);
                (0b1100_0000 | address, Some(core::slice::from_ref(data)))
            }
            WriteCommand::WriteMultiple {
                start_address,
                data,
            } => {
                debug_assert!(*start_address as usize + data.len() <= ADDRESS_SLOTS);
                (0b1100_0000 | start_address, Some(*data))
            }
        }
    }
}

/// Represents possible read commands sent to the TM1638 which read data from the controller
enum ReadCommand {
    /// Request the controller to send four bytes of key scanning data
    ReadKeys,
}

impl ReadCommand {
    /// The command byte, and how many bytes the controller answers with
    fn encode(&self) -> (u8, usize) {
        match self {
            ReadCommand::ReadKeys => (0b0100_0010, KEY_BYTES),
        }
    }
}
