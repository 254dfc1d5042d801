//! Character display output.
//!
//! The core only decides what goes on the two-line display; rendering the
//! characters is left to the [`DisplaySink`] implementation.

use core::fmt::Write;

use heapless::String;

/// Label shown above an inductance value.
pub const INDUCTANCE_LABEL: &str = "Induct.";

/// Columns reserved for the right-justified value, excluding the unit.
const VALUE_FIELD: usize = 6;

/// Display line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Line {
    First,
    Second,
}

/// Trait for abstracting the character display.
///
/// Implement this for your display driver (HD44780, serial terminal, etc.).
/// Handle any driver errors internally - these methods cannot fail.
pub trait DisplaySink {
    /// Clears the screen and homes the cursor.
    fn clear(&mut self);

    /// Moves the cursor to `column` on `line`.
    fn set_cursor(&mut self, line: Line, column: u8);

    /// Writes one character at the cursor.
    fn write_char(&mut self, c: char);

    /// Writes a string at the cursor.
    fn write_str(&mut self, s: &str) {
        for c in s.chars() {
            self.write_char(c);
        }
    }

    /// Writes `value` with a fixed number of decimals.
    fn write_float(&mut self, value: f64, decimals: usize) {
        let mut text: String<24> = String::new();
        // Overflow only truncates; a partial number is still written
        let _ = write!(text, "{:.*}", decimals, value);
        self.write_str(&text);
    }
}

/// Shows an inductance reading given in µH.
///
/// Values above 1000 µH are shown in mH. The number is printed with one
/// decimal and right-justified so the unit stays in a fixed column.
pub fn show_inductance<D: DisplaySink>(sink: &mut D, micro_henries: f64) {
    let (value, prefix) = if micro_henries > 1000.0 {
        (micro_henries / 1000.0, 'm')
    } else {
        (micro_henries, 'u')
    };

    let width = if value >= 100.0 {
        5
    } else if value >= 10.0 {
        4
    } else {
        3
    };

    sink.set_cursor(Line::First, 0);
    sink.write_str(INDUCTANCE_LABEL);
    sink.set_cursor(Line::Second, 0);
    for _ in 0..(VALUE_FIELD - width) {
        sink.write_char(' ');
    }
    sink.write_float(value, 1);
    sink.write_char(prefix);
    sink.write_char('H');
}

/// Shows the open-circuit message.
pub fn show_no_component<D: DisplaySink>(sink: &mut D) {
    sink.clear();
    sink.write_str(" NO");
    sink.set_cursor(Line::Second, 0);
    sink.write_str("value");
}
