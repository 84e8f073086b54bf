/*!
Comparing the transitions of two tzdata databases.

This is used to check a tzdata release (or a local modification of one)
against a reference: every zone present in either database is expanded in
both over the same years, and the resulting onsets are compared.

# Example

```
use tzconvert::{compare::compare, zic::Database};

let mut ours = Database::new();
ours.parse("asia", "Zone Asia/Test 5:30 - IST 2000\n\t\t5:45 - NPT\n")?;
let mut theirs = Database::new();
theirs.parse("asia", "Zone Asia/Test 5:30 - IST 2000\n\t\t6:00 - XT\n")?;

let mismatches = compare(&ours, &theirs, 1800, 2038);
assert_eq!(mismatches.len(), 1);
assert_eq!(
    mismatches[0].to_string(),
    "Asia/Test\toffset\t19991231T183000Z\t+0545 != +0600",
);

# Ok::<(), tzconvert::Error>(())
```
*/

use std::collections::BTreeSet;

use crate::{
    civil::DateTime,
    error::Error,
    fmt::ical::format_offset,
    tz::{self, Transition},
    zic::Database,
};

/// Which of the two compared databases something was found in.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Side {
    Ours,
    Theirs,
}

impl core::fmt::Display for Side {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(match *self {
            Side::Ours => "ours",
            Side::Theirs => "theirs",
        })
    }
}

/// A difference between two databases.
///
/// The `Display` implementation renders one tab separated line: the zone,
/// the kind of mismatch and its details.
#[derive(Clone, Debug)]
pub enum Mismatch {
    /// A zone exists in only one database.
    MissingZone { zone: String, only_in: Side },
    /// A zone could not be expanded in one of the databases.
    Failed { zone: String, side: Side, error: Error },
    /// An onset exists in only one database.
    Onset { zone: String, at: DateTime, only_in: Side },
    /// Both databases have an onset at the same instant, but to different
    /// offsets.
    Offset { zone: String, at: DateTime, ours: i32, theirs: i32 },
}

impl Mismatch {
    /// The zone this mismatch is about.
    pub fn zone(&self) -> &str {
        match *self {
            Mismatch::MissingZone { ref zone, .. }
            | Mismatch::Failed { ref zone, .. }
            | Mismatch::Onset { ref zone, .. }
            | Mismatch::Offset { ref zone, .. } => zone,
        }
    }
}

impl core::fmt::Display for Mismatch {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match *self {
            Mismatch::MissingZone { ref zone, only_in } => {
                write!(f, "{zone}\tzone\t\tonly in {only_in}")
            }
            Mismatch::Failed { ref zone, side, ref error } => {
                write!(f, "{zone}\tfailed\t\t{side}: {error}")
            }
            Mismatch::Onset { ref zone, at, only_in } => {
                write!(f, "{zone}\tonset\t{at}\tonly in {only_in}")
            }
            Mismatch::Offset { ref zone, at, ours, theirs } => write!(
                f,
                "{zone}\toffset\t{at}\t{} != {}",
                format_offset(ours),
                format_offset(theirs),
            ),
        }
    }
}

/// Compares the transitions of every zone of two databases between
/// `min_year` and `max_year`.
///
/// Links are not compared. Mismatches are returned ordered by zone name,
/// and by instant within a zone.
pub fn compare(
    ours: &Database,
    theirs: &Database,
    min_year: i32,
    max_year: i32,
) -> Vec<Mismatch> {
    let names: BTreeSet<&str> = ours
        .zones()
        .chain(theirs.zones())
        .map(|zone| zone.name())
        .collect();
    let mut mismatches = vec![];
    for name in names {
        let (our_zone, their_zone) = match (ours.zone(name), theirs.zone(name))
        {
            (Some(z1), Some(z2)) => (z1, z2),
            (Some(_), None) => {
                let zone = name.to_string();
                let only_in = Side::Ours;
                mismatches.push(Mismatch::MissingZone { zone, only_in });
                continue;
            }
            (None, _) => {
                let zone = name.to_string();
                let only_in = Side::Theirs;
                mismatches.push(Mismatch::MissingZone { zone, only_in });
                continue;
            }
        };
        let expanded = (
            tz::expand(ours, our_zone, min_year, max_year),
            tz::expand(theirs, their_zone, min_year, max_year),
        );
        match expanded {
            (Ok(ts1), Ok(ts2)) => {
                compare_transitions(name, &ts1, &ts2, &mut mismatches);
            }
            (Err(error), _) => {
                let (zone, side) = (name.to_string(), Side::Ours);
                mismatches.push(Mismatch::Failed { zone, side, error });
            }
            (_, Err(error)) => {
                let (zone, side) = (name.to_string(), Side::Theirs);
                mismatches.push(Mismatch::Failed { zone, side, error });
            }
        }
    }
    debug!("compared zones: {} mismatches", mismatches.len());
    mismatches
}

/// Walks two chronological lists of transitions in step.
fn compare_transitions(
    zone: &str,
    ours: &[Transition<'_>],
    theirs: &[Transition<'_>],
    mismatches: &mut Vec<Mismatch>,
) {
    let (mut i, mut j) = (0, 0);
    while i < ours.len() || j < theirs.len() {
        let zone = zone.to_string();
        match (ours.get(i), theirs.get(j)) {
            (Some(t1), Some(t2)) if t1.at() == t2.at() => {
                if t1.offset_after() != t2.offset_after() {
                    mismatches.push(Mismatch::Offset {
                        zone,
                        at: t1.at(),
                        ours: t1.offset_after(),
                        theirs: t2.offset_after(),
                    });
                }
                i += 1;
                j += 1;
            }
            (Some(t1), Some(t2)) if t1.at() < t2.at() => {
                mismatches.push(onset(zone, t1, Side::Ours));
                i += 1;
            }
            (Some(t1), None) => {
                mismatches.push(onset(zone, t1, Side::Ours));
                i += 1;
            }
            (_, Some(t2)) => {
                mismatches.push(onset(zone, t2, Side::Theirs));
                j += 1;
            }
            (None, None) => break,
        }
    }
}

fn onset(zone: String, t: &Transition<'_>, only_in: Side) -> Mismatch {
    Mismatch::Onset { zone, at: t.at(), only_in }
}
