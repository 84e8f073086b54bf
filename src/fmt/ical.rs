/*!
A printer for iCalendar (RFC 5545) time zone text.

Every content line ends with `CRLF`. Lines longer than 75 octets are folded
onto continuation lines starting with a single space, without splitting a
UTF-8 encoded character.

# Example

```
use tzconvert::{fmt::ical::Printer, tz, vtimezone, zic::Database};

let mut db = Database::new();
db.parse("europe", "\
Rule EU 1981 max - Mar lastSun 1:00u 1:00 S
Rule EU 1996 max - Oct lastSun 1:00u 0 -
Zone Europe/Paris 1:00 EU CE%sT
")?;
let zone = db.zone("Europe/Paris").unwrap();
let transitions = tz::expand(&db, zone, 2000, 2038)?;
let vtz = vtimezone::emit(zone.name(), &transitions);

let mut buf = String::new();
Printer::new().print_vtimezone(&vtz, &mut buf)?;
assert_eq!(buf.replace("\r\n", "\n"), "\
BEGIN:VTIMEZONE
TZID:Europe/Paris
X-LIC-LOCATION:Europe/Paris
BEGIN:DAYLIGHT
DTSTART:20000326T020000
RRULE:FREQ=YEARLY;BYMONTH=3;BYDAY=-1SU
TZNAME:CEST
TZOFFSETFROM:+0100
TZOFFSETTO:+0200
END:DAYLIGHT
BEGIN:STANDARD
DTSTART:20001029T030000
RRULE:FREQ=YEARLY;BYMONTH=10;BYDAY=-1SU
TZNAME:CET
TZOFFSETFROM:+0200
TZOFFSETTO:+0100
END:STANDARD
END:VTIMEZONE
");

# Ok::<(), tzconvert::Error>(())
```
*/

use crate::{
    error::Error,
    fmt::Write,
    vtimezone::{Observance, Recurrence, VTimeZone},
};

/// The maximum length of a content line, in octets, not counting `CRLF`.
const MAX_LINE_LEN: usize = 75;

/// A printer for `VTIMEZONE` and `VCALENDAR` components.
///
/// # Example
///
/// Folding can be disabled, which is convenient when comparing output:
///
/// ```
/// use tzconvert::{fmt::ical::Printer, tz, vtimezone, zic::Database};
///
/// let mut db = Database::new();
/// db.parse("etcetera", "Zone Etc/GMT+5 -5 - %z\n")?;
/// let zone = db.zone("Etc/GMT+5").unwrap();
/// let transitions = tz::expand(&db, zone, 1800, 2038)?;
/// let vtz = vtimezone::emit(zone.name(), &transitions);
///
/// let mut buf = String::new();
/// let printer = Printer::new().fold(false);
/// printer.print_vcalendar(&vtz, "-//Example//EN", &mut buf)?;
/// assert_eq!(buf.replace("\r\n", "\n"), "\
/// BEGIN:VCALENDAR
/// VERSION:2.0
/// PRODID:-//Example//EN
/// BEGIN:VTIMEZONE
/// TZID:Etc/GMT+5
/// X-LIC-LOCATION:Etc/GMT+5
/// BEGIN:STANDARD
/// DTSTART:17991231T190000
/// RDATE:17991231T190000
/// TZNAME:-05
/// TZOFFSETFROM:-0500
/// TZOFFSETTO:-0500
/// END:STANDARD
/// END:VTIMEZONE
/// END:VCALENDAR
/// ");
///
/// # Ok::<(), tzconvert::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct Printer {
    fold: bool,
    location: bool,
}

impl Printer {
    /// Creates a new printer that folds long lines and writes an
    /// `X-LIC-LOCATION` property.
    pub const fn new() -> Printer {
        Printer { fold: true, location: true }
    }

    /// Whether to fold lines longer than 75 octets. Enabled by default.
    pub const fn fold(self, yes: bool) -> Printer {
        Printer { fold: yes, ..self }
    }

    /// Whether to write the `X-LIC-LOCATION` property. Enabled by default.
    pub const fn location(self, yes: bool) -> Printer {
        Printer { location: yes, ..self }
    }

    /// Writes the given time zone wrapped in a `VCALENDAR` with the given
    /// product identifier.
    pub fn print_vcalendar<W: Write>(
        &self,
        vtz: &VTimeZone,
        prodid: &str,
        mut wtr: W,
    ) -> Result<(), Error> {
        self.print_line(&mut wtr, "BEGIN:VCALENDAR")?;
        self.print_line(&mut wtr, "VERSION:2.0")?;
        self.print_line(&mut wtr, &format!("PRODID:{}", escape_text(prodid)))?;
        self.print_vtimezone(vtz, &mut wtr)?;
        self.print_line(&mut wtr, "END:VCALENDAR")
    }

    /// Writes the given time zone as a `VTIMEZONE` component.
    pub fn print_vtimezone<W: Write>(
        &self,
        vtz: &VTimeZone,
        mut wtr: W,
    ) -> Result<(), Error> {
        self.print_line(&mut wtr, "BEGIN:VTIMEZONE")?;
        let tzid = escape_text(vtz.tzid());
        self.print_line(&mut wtr, &format!("TZID:{tzid}"))?;
        if self.location {
            let location = escape_text(vtz.location());
            self.print_line(&mut wtr, &format!("X-LIC-LOCATION:{location}"))?;
        }
        for obs in vtz.observances().iter() {
            self.print_observance(obs, &mut wtr)?;
        }
        self.print_line(&mut wtr, "END:VTIMEZONE")
    }

    fn print_observance<W: Write>(
        &self,
        obs: &Observance,
        mut wtr: W,
    ) -> Result<(), Error> {
        let kind = obs.kind().name();
        self.print_line(&mut wtr, &format!("BEGIN:{kind}"))?;
        self.print_line(&mut wtr, &format!("DTSTART:{}", obs.start()))?;
        match *obs.recurrence() {
            Recurrence::Dates(ref dates) => {
                for date in dates.iter() {
                    self.print_line(&mut wtr, &format!("RDATE:{date}"))?;
                }
            }
            Recurrence::Rule(ref rule) => {
                self.print_line(&mut wtr, &format!("RRULE:{rule}"))?;
            }
        }
        let name = escape_text(obs.name());
        self.print_line(&mut wtr, &format!("TZNAME:{name}"))?;
        let from = format_offset(obs.offset_from());
        self.print_line(&mut wtr, &format!("TZOFFSETFROM:{from}"))?;
        let to = format_offset(obs.offset_to());
        self.print_line(&mut wtr, &format!("TZOFFSETTO:{to}"))?;
        self.print_line(&mut wtr, &format!("END:{kind}"))
    }

    /// Writes one content line, folding it if needed, followed by `CRLF`.
    fn print_line<W: Write>(
        &self,
        mut wtr: W,
        line: &str,
    ) -> Result<(), Error> {
        let mut rest = line;
        let mut width = MAX_LINE_LEN;
        while self.fold && rest.len() > width {
            let mut end = width;
            while !rest.is_char_boundary(end) {
                end -= 1;
            }
            let (head, tail) = rest.split_at(end);
            wtr.write_str(head)?;
            wtr.write_str("\r\n ")?;
            rest = tail;
            // The leading space of a continuation line counts too.
            width = MAX_LINE_LEN - 1;
        }
        wtr.write_str(rest)?;
        wtr.write_str("\r\n")
    }
}

impl Default for Printer {
    fn default() -> Printer {
        Printer::new()
    }
}

/// Formats a UTC offset in seconds as `+HHMM`, or `+HHMMSS` when it has
/// seconds.
///
/// # Example
///
/// ```
/// use tzconvert::fmt::ical::format_offset;
///
/// assert_eq!(format_offset(-5 * 3600), "-0500");
/// assert_eq!(format_offset(0), "+0000");
/// assert_eq!(format_offset(-(4 * 3600 + 56 * 60 + 2)), "-045602");
/// ```
pub fn format_offset(seconds: i32) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    let abs = seconds.unsigned_abs();
    let (h, m, s) = (abs / 3600, abs / 60 % 60, abs % 60);
    if s == 0 {
        format!("{sign}{h:02}{m:02}")
    } else {
        format!("{sign}{h:02}{m:02}{s:02}")
    }
}

/// Escapes an iCalendar `TEXT` value.
fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' | ';' | ',' => {
                out.push('\\');
                out.push(ch);
            }
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use crate::{tz, vtimezone, zic::Database};

    use super::*;

    fn lines(printer: &Printer, line: &str) -> Vec<String> {
        let mut buf = String::new();
        printer.print_line(&mut buf, line).unwrap();
        assert!(buf.ends_with("\r\n"));
        buf.trim_end_matches("\r\n").split("\r\n").map(String::from).collect()
    }

    #[test]
    fn fold_long_lines() {
        let printer = Printer::new();
        let short = "X".repeat(75);
        assert_eq!(lines(&printer, &short), [short.clone()]);

        let long = "X".repeat(75 + 74 + 10);
        let got = lines(&printer, &long);
        assert_eq!(got.len(), 3);
        assert_eq!(got[0].len(), 75);
        assert_eq!(got[1].len(), 75);
        assert!(got[1].starts_with(' '));
        assert_eq!(got[2], format!(" {}", "X".repeat(10)));
        let unfolded: String =
            got.iter().map(|line| line.trim_start_matches(' ')).collect();
        assert_eq!(unfolded, long);

        let printer = Printer::new().fold(false);
        assert_eq!(lines(&printer, &long), [long.clone()]);
    }

    #[test]
    fn fold_never_splits_characters() {
        // Each `é` is two octets starting at an even offset, so the octet
        // at offset 75 is in the middle of one.
        let line = format!("XX{}", "é".repeat(60));
        let got = lines(&Printer::new(), &line);
        assert_eq!(got[0].len(), 74);
        assert!(got.iter().all(|l| l.len() <= 75));
        let unfolded: String =
            got.iter().map(|l| l.strip_prefix(' ').unwrap_or(l)).collect();
        assert_eq!(unfolded, line);
    }

    #[test]
    fn offsets() {
        assert_eq!(format_offset(3600), "+0100");
        assert_eq!(format_offset(5 * 3600 + 30 * 60), "+0530");
        assert_eq!(format_offset(-(3 * 3600 + 30 * 60)), "-0330");
        assert_eq!(format_offset(5 * 3600 + 53 * 60 + 28), "+055328");
    }

    #[test]
    fn escaped_text() {
        assert_eq!(escape_text("a,b;c\\d"), "a\\,b\\;c\\\\d");
    }

    #[test]
    fn new_york_calendar() {
        let mut db = Database::new();
        db.parse(
            "northamerica",
            "\
Rule US 2007 max - Mar Sun>=8 2:00 1:00 D
Rule US 2007 max - Nov Sun>=1 2:00 0 S
Zone America/New_York -4:56:02 - LMT 1883 Nov 18 12:03:58
\t\t\t-5:00 US E%sT
",
        )
        .unwrap();
        let zone = db.zone("America/New_York").unwrap();
        let transitions = tz::expand(&db, zone, 2007, 2010).unwrap();
        let vtz = vtimezone::emit(zone.name(), &transitions);
        let mut buf = String::new();
        let prodid = "-//tzconvert//NONSGML tzdata//EN";
        Printer::new().print_vcalendar(&vtz, prodid, &mut buf).unwrap();
        insta::assert_snapshot!(buf.replace("\r\n", "\n"), @r"
        BEGIN:VCALENDAR
        VERSION:2.0
        PRODID:-//tzconvert//NONSGML tzdata//EN
        BEGIN:VTIMEZONE
        TZID:America/New_York
        X-LIC-LOCATION:America/New_York
        BEGIN:DAYLIGHT
        DTSTART:20070311T020000
        RRULE:FREQ=YEARLY;BYMONTH=3;BYDAY=2SU
        TZNAME:EDT
        TZOFFSETFROM:-0500
        TZOFFSETTO:-0400
        END:DAYLIGHT
        BEGIN:STANDARD
        DTSTART:20071104T020000
        RRULE:FREQ=YEARLY;BYMONTH=11;BYDAY=1SU
        TZNAME:EST
        TZOFFSETFROM:-0400
        TZOFFSETTO:-0500
        END:STANDARD
        END:VTIMEZONE
        END:VCALENDAR
        ");
    }
}
