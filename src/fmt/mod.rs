/*!
Writing conversion results as text.

This module provides the two output formats of a conversion:

* [`ical`] writes [`VTimeZone`](crate::vtimezone::VTimeZone) components as
iCalendar text, either alone or wrapped in a `VCALENDAR`.
* [`properties`] reads and writes the `key=value` files that accompany the
calendars: the alias table and the build information.

Printers write to any implementation of this module's [`Write`] trait. It
is implemented for `String` and `Vec<u8>`, and [`StdIoWrite`] adapts
`std::io::Write` implementations.
*/

use crate::error::Error;

pub mod ical;
pub mod properties;

/// A trait for writing text produced by the printers in this module.
///
/// Unlike `core::fmt::Write`, failures carry an [`Error`], so that an I/O
/// error writing a file is reported with its cause.
pub trait Write {
    /// Write the given string to this writer.
    fn write_str(&mut self, string: &str) -> Result<(), Error>;

    /// Write the given character to this writer.
    #[inline]
    fn write_char(&mut self, char: char) -> Result<(), Error> {
        self.write_str(char.encode_utf8(&mut [0; 4]))
    }
}

impl Write for String {
    #[inline]
    fn write_str(&mut self, string: &str) -> Result<(), Error> {
        self.push_str(string);
        Ok(())
    }
}

impl Write for Vec<u8> {
    #[inline]
    fn write_str(&mut self, string: &str) -> Result<(), Error> {
        self.extend_from_slice(string.as_bytes());
        Ok(())
    }
}

impl<W: Write> Write for &mut W {
    fn write_str(&mut self, string: &str) -> Result<(), Error> {
        (**self).write_str(string)
    }

    #[inline]
    fn write_char(&mut self, char: char) -> Result<(), Error> {
        (**self).write_char(char)
    }
}

/// An adapter for using `std::io::Write` implementations with printers.
///
/// Writes are passed through as is, so wrapping a `std::fs::File` in a
/// `std::io::BufWriter` is usually a good idea.
#[derive(Clone, Debug)]
pub struct StdIoWrite<W>(pub W);

impl<W: std::io::Write> Write for StdIoWrite<W> {
    #[inline]
    fn write_str(&mut self, string: &str) -> Result<(), Error> {
        self.0.write_all(string.as_bytes()).map_err(Error::io)
    }
}
