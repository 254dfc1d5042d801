use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use lc_meter::{DisplaySink, Line};

use crate::delay::CycleDelay;

const CLEAR: u8 = 0x01;
const ENTRY_MODE_INCREMENT: u8 = 0x06;
const DISPLAY_ON: u8 = 0x0C;
const FUNCTION_SET_4BIT_2LINE: u8 = 0x28;
const SET_DDRAM_ADDRESS: u8 = 0x80;
const SECOND_LINE_OFFSET: u8 = 0x40;

/// HD44780 character display on a 4-bit parallel bus
///
/// The driver is write-only (R/W tied low) and times every command with a
/// fixed busy-wait instead of polling the busy flag.
pub struct Hd44780<P: OutputPin> {
    rs: P,
    en: P,
    data: [P; 4],
    delay: CycleDelay,
}

impl<P: OutputPin> Hd44780<P> {
    /// Runs the 4-bit initialization sequence and clears the screen.
    ///
    /// # Arguments
    /// * `rs` - Register select
    /// * `en` - Enable strobe
    /// * `data` - D4..D7, lowest bit first
    /// * `delay` - Busy-wait delay for command timing
    pub fn new(rs: P, en: P, data: [P; 4], delay: CycleDelay) -> Self {
        let mut lcd = Self {
            rs,
            en,
            data,
            delay,
        };

        lcd.delay.delay_ms(50);
        lcd.rs.set_low().ok();
        lcd.write_nibble(0x3);
        lcd.delay.delay_ms(5);
        lcd.write_nibble(0x3);
        lcd.delay.delay_us(150);
        lcd.write_nibble(0x3);
        lcd.write_nibble(0x2);

        lcd.command(FUNCTION_SET_4BIT_2LINE);
        lcd.command(DISPLAY_ON);
        lcd.command(ENTRY_MODE_INCREMENT);
        lcd.clear();
        lcd
    }

    fn write_nibble(&mut self, nibble: u8) {
        for (bit, pin) in self.data.iter_mut().enumerate() {
            if nibble & (1 << bit) != 0 {
                pin.set_high().ok();
            } else {
                pin.set_low().ok();
            }
        }
        self.en.set_high().ok();
        self.delay.delay_us(1);
        self.en.set_low().ok();
        self.delay.delay_us(50);
    }

    fn write_byte(&mut self, byte: u8) {
        self.write_nibble(byte >> 4);
        self.write_nibble(byte & 0x0F);
    }

    fn command(&mut self, command: u8) {
        self.rs.set_low().ok();
        self.write_byte(command);
    }
}

impl<P: OutputPin> DisplaySink for Hd44780<P> {
    fn clear(&mut self) {
        self.command(CLEAR);
        self.delay.delay_ms(2);
    }

    fn set_cursor(&mut self, line: Line, column: u8) {
        let offset = match line {
            Line::First => 0,
            Line::Second => SECOND_LINE_OFFSET,
        };
        self.command(SET_DDRAM_ADDRESS | (offset + column));
    }

    fn write_char(&mut self, c: char) {
        let byte = if c.is_ascii() { c as u8 } else { b'?' };
        self.rs.set_high().ok();
        self.write_byte(byte);
    }
}
