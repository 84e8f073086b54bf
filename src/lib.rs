/*!
Convert IANA tzdata source files into iCalendar `VTIMEZONE` components.

The tzdata source format (read by the `zic` compiler) describes the history
of each time zone as a list of segments, each with a standard offset and
optionally a named set of daylight saving rules. iCalendar (RFC 5545)
describes a time zone as a list of `STANDARD` and `DAYLIGHT` observances,
each listing its onsets explicitly or as a yearly recurrence rule. This
crate converts the former into the latter.

# Overview

Conversion happens in stages, each with its own module:

* [`zic`] parses tzdata text into a [`zic::Database`] of rules, zones and
links.
* [`tz`] expands a zone into its chronological list of
[`tz::Transition`]s, taking care of wall clock, standard and universal time
modes and of rules carried over from one zone segment to the next.
* [`vtimezone`] groups transitions into observances, expresses them as
recurrence rules where possible and merges the rest.
* [`fmt`] writes components as iCalendar text, and reads and writes the
`key=value` files that accompany them.

[`convert`] drives all of the above for every zone of a database, isolating
failures to the zone they happen in. [`compare`] compares the transitions of
two databases. [`civil`] provides the calendar arithmetic everything is
built on.

# Example

```
use tzconvert::{
    convert::{Config, Converter},
    fmt::ical::Printer,
    zic::Database,
};

let mut db = Database::new();
db.parse("northamerica", "\
Rule US 2007 max - Mar Sun>=8 2:00 1:00 D
Rule US 2007 max - Nov Sun>=1 2:00 0 S
Zone America/New_York -4:56:02 - LMT 1883 Nov 18 12:03:58
                      -5:00    US E%sT
")?;

let converter = Converter::new(&db, Config::new().min_year(2007));
let vtz = converter.convert_zone("America/New_York")?;
let mut ics = String::new();
Printer::new().print_vtimezone(&vtz, &mut ics)?;
assert!(ics.contains("RRULE:FREQ=YEARLY;BYMONTH=3;BYDAY=2SU\r\n"));
assert!(ics.contains("RRULE:FREQ=YEARLY;BYMONTH=11;BYDAY=1SU\r\n"));

# Ok::<(), tzconvert::Error>(())
```

# Crate features

* **logging** (enabled by default) - Emits log messages through the `log`
crate: a debug message per file read and zone converted, and a warning for
each skipped file, zone or alias.
*/

#![deny(rustdoc::broken_intra_doc_links)]
// We generally want all types to impl Debug.
#![warn(missing_debug_implementations)]

pub use crate::error::{Error, ErrorCategory};

#[macro_use]
mod logging;

pub mod civil;
pub mod compare;
pub mod convert;
mod error;
pub mod fmt;
pub mod tz;
pub mod vtimezone;
pub mod zic;
