/*!
Building iCalendar `VTIMEZONE` components from zone transitions.

A [`VTimeZone`] is a list of [`Observance`]s. Each observance is a
`STANDARD` or `DAYLIGHT` sub-component describing one or more transitions
that share a name and a pair of UTC offsets. The transitions are listed
either explicitly (`RDATE`) or as a yearly recurrence rule (`RRULE`).

[`emit`] chooses between the two forms. Transitions driven by the same
tzdata rule in consecutive years become one recurrence rule whenever the
dates can be expressed as one. Everything else is listed explicitly, and
explicit observances that only differ in their dates are merged.

This module only builds values. See [`crate::fmt::ical`] for writing them
out as iCalendar text.

# Example

```
use tzconvert::{tz, vtimezone, zic::Database};

let mut db = Database::new();
db.parse("northamerica", "\
Rule US 2007 max - Mar Sun>=8 2:00 1:00 D
Rule US 2007 max - Nov Sun>=1 2:00 0 S
Zone America/New_York -5:00 US E%sT
")?;
let zone = db.zone("America/New_York").unwrap();
let transitions = tz::expand(&db, zone, 2007, 2010)?;
let vtz = vtimezone::emit(zone.name(), &transitions);

let got: Vec<String> = vtz
    .observances()
    .iter()
    .map(|obs| format!("{} {} {}", obs.kind(), obs.name(), obs.recurrence()))
    .collect();
assert_eq!(got, [
    "DAYLIGHT EDT RRULE:FREQ=YEARLY;BYMONTH=3;BYDAY=2SU",
    "STANDARD EST RRULE:FREQ=YEARLY;BYMONTH=11;BYDAY=1SU",
]);

# Ok::<(), tzconvert::Error>(())
```
*/

use crate::{
    civil::{DateTime, Weekday},
    tz::Transition,
    zic::Rule,
};

use self::pattern::pattern;

mod pattern;

/// A time zone as an iCalendar `VTIMEZONE` component.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VTimeZone {
    tzid: String,
    location: String,
    observances: Vec<Observance>,
}

impl VTimeZone {
    /// The `TZID` of this component.
    pub fn tzid(&self) -> &str {
        &self.tzid
    }

    /// The `X-LIC-LOCATION` of this component.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// The sub-components of this time zone, ordered by their start.
    pub fn observances(&self) -> &[Observance] {
        &self.observances
    }

    /// Returns a copy of this component identified by another name.
    ///
    /// This is used to write out a link under its own name.
    pub fn renamed(&self, tzid: &str) -> VTimeZone {
        VTimeZone {
            tzid: tzid.to_string(),
            location: tzid.to_string(),
            observances: self.observances.clone(),
        }
    }
}

/// The kind of an [`Observance`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ObservanceKind {
    Standard,
    Daylight,
}

impl ObservanceKind {
    /// The iCalendar component name of this kind.
    pub fn name(self) -> &'static str {
        match self {
            ObservanceKind::Standard => "STANDARD",
            ObservanceKind::Daylight => "DAYLIGHT",
        }
    }
}

impl core::fmt::Display for ObservanceKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// One `STANDARD` or `DAYLIGHT` sub-component.
///
/// Every onset described by an observance goes from `offset_from` to
/// `offset_to` and is named `name`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Observance {
    kind: ObservanceKind,
    name: String,
    offset_from: i32,
    offset_to: i32,
    start: DateTime,
    recurrence: Recurrence,
}

impl Observance {
    pub fn kind(&self) -> ObservanceKind {
        self.kind
    }

    /// The `TZNAME` of this observance.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The UTC offset in effect before each onset, in seconds.
    pub fn offset_from(&self) -> i32 {
        self.offset_from
    }

    /// The UTC offset in effect after each onset, in seconds.
    pub fn offset_to(&self) -> i32 {
        self.offset_to
    }

    /// The first onset, in local time of the offset before it.
    pub fn start(&self) -> DateTime {
        self.start
    }

    pub fn recurrence(&self) -> &Recurrence {
        &self.recurrence
    }

    /// The key explicit observances are merged on.
    fn merge_key(&self) -> (ObservanceKind, &str, i32, i32) {
        (self.kind, &self.name, self.offset_from, self.offset_to)
    }
}

/// How the onsets of an [`Observance`] are listed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Recurrence {
    /// Explicit onsets (`RDATE`), in local time, sorted and distinct.
    Dates(Vec<DateTime>),
    /// A yearly recurrence rule (`RRULE`).
    Rule(RecurrenceRule),
}

/// Renders this recurrence as an iCalendar property, without folding.
impl core::fmt::Display for Recurrence {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match *self {
            Recurrence::Dates(ref dates) => {
                f.write_str("RDATE:")?;
                for (i, date) in dates.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{date}")?;
                }
                Ok(())
            }
            Recurrence::Rule(ref rule) => write!(f, "RRULE:{rule}"),
        }
    }
}

/// A yearly recurrence rule.
///
/// Its `Display` implementation renders the value of an `RRULE` property,
/// such as `FREQ=YEARLY;BYMONTH=3;BYDAY=2SU`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RecurrenceRule {
    pub(crate) by_month: Option<i8>,
    pub(crate) by_year_day: Vec<i16>,
    pub(crate) by_month_day: Vec<i8>,
    pub(crate) by_day: Option<ByDay>,
    pub(crate) until: Option<DateTime>,
}

impl RecurrenceRule {
    /// The last onset of this rule, in UTC. `None` means the rule
    /// continues indefinitely.
    pub fn until(&self) -> Option<DateTime> {
        self.until
    }
}

impl core::fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str("FREQ=YEARLY")?;
        if let Some(until) = self.until {
            write!(f, ";UNTIL={until}")?;
        }
        if let Some(month) = self.by_month {
            write!(f, ";BYMONTH={month}")?;
        }
        write_list(f, "BYYEARDAY", &self.by_year_day)?;
        write_list(f, "BYMONTHDAY", &self.by_month_day)?;
        if let Some(by_day) = self.by_day {
            write!(f, ";BYDAY={by_day}")?;
        }
        Ok(())
    }
}

fn write_list<T: core::fmt::Display>(
    f: &mut core::fmt::Formatter,
    name: &str,
    values: &[T],
) -> core::fmt::Result {
    for (i, value) in values.iter().enumerate() {
        if i == 0 {
            write!(f, ";{name}={value}")?;
        } else {
            write!(f, ",{value}")?;
        }
    }
    Ok(())
}

/// A `BYDAY` value: a weekday, optionally limited to its `nth` occurrence
/// in the month (negative values count from the end).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct ByDay {
    pub(crate) nth: Option<i8>,
    pub(crate) weekday: Weekday,
}

impl core::fmt::Display for ByDay {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if let Some(nth) = self.nth {
            write!(f, "{nth}")?;
        }
        f.write_str(self.weekday.ical_code())
    }
}

/// Builds the `VTIMEZONE` component named `tzid` from a zone's
/// transitions, as returned by [`crate::tz::expand`].
///
/// Transitions of segments formatted as `LMT` are ignored. The rest are
/// grouped into observances:
///
/// * Consecutive transitions of one zone segment form a run.
/// * Within a run, transitions are grouped by the rule that drives them.
/// Transitions synthesized at the start of a segment form a group of
/// their own.
/// * A group is split wherever the pair of offsets changes or a rule year
/// is skipped.
///
/// Each piece becomes one observance. It gets a recurrence rule when it
/// holds several transitions of a rule that spans several years and a
/// rule can express its dates. The recurrence rule ends at the last
/// transition, unless the piece is the open ended tail of the zone.
/// Otherwise the transitions are listed explicitly, and observances with
/// explicit dates that share their kind, name and offsets are merged.
pub fn emit(tzid: &str, transitions: &[Transition<'_>]) -> VTimeZone {
    let kept: Vec<&Transition<'_>> = transitions
        .iter()
        .filter(|t| !t.segment().format().is_lmt())
        .collect();
    let mut observances = vec![];
    for run in split(&kept, |a, b| a.segment_index() == b.segment_index()) {
        for (rule, group) in group_by_rule(run) {
            let pieces = split(&group, |a, b| {
                a.offset_before() == b.offset_before()
                    && a.offset_after() == b.offset_after()
                    && match (a.rule_year(), b.rule_year()) {
                        (Some(y1), Some(y2)) => y1 + 1 == y2,
                        _ => true,
                    }
            });
            let count = pieces.len();
            for (i, piece) in pieces.into_iter().enumerate() {
                let open = i + 1 == count
                    && rule.map_or(false, |rule| rule.to_year().is_none())
                    && piece[0].segment().until().is_none();
                observances.push(observance(rule, piece, open));
            }
        }
    }
    let observances = merge(observances);
    debug!(
        "{tzid}: {} transitions emitted as {} observances",
        kept.len(),
        observances.len(),
    );
    VTimeZone {
        tzid: tzid.to_string(),
        location: tzid.to_string(),
        observances,
    }
}

/// Builds one observance from a non-empty piece of a rule group.
fn observance(
    rule: Option<&Rule>,
    piece: &[&Transition<'_>],
    open: bool,
) -> Observance {
    let first = piece[0];
    let kind = if first.save() != 0 {
        ObservanceKind::Daylight
    } else {
        ObservanceKind::Standard
    };
    let recurrence = match recurrence_rule(rule, piece, open) {
        Some(rrule) => Recurrence::Rule(rrule),
        None => Recurrence::Dates(piece.iter().map(|t| t.local()).collect()),
    };
    Observance {
        kind,
        name: first.abbreviation(),
        offset_from: first.offset_before(),
        offset_to: first.offset_after(),
        start: first.local(),
        recurrence,
    }
}

/// Returns a recurrence rule generating exactly the onsets of `piece`, if
/// one is worth using.
fn recurrence_rule(
    rule: Option<&Rule>,
    piece: &[&Transition<'_>],
    open: bool,
) -> Option<RecurrenceRule> {
    let rule = rule?;
    // A single onset only generalizes when the rule keeps recurring past it.
    if rule.is_single_year() || (piece.len() < 2 && !open) {
        return None;
    }
    let shift = rule.day_shift(piece[0].local());
    if piece.iter().any(|t| rule.day_shift(t.local()) != shift) {
        return None;
    }
    let mut rrule = pattern(rule.day(), rule.month(), shift)?;
    if !open {
        rrule.until = piece.last().map(|t| t.at());
    }
    trace!(
        "rule `{}` ({}) from {} expressed as {rrule}",
        rule.name(),
        rule.from_year(),
        piece[0].local(),
    );
    Some(rrule)
}

/// Groups transitions by the rule driving them, in order of first
/// appearance.
fn group_by_rule<'r, 'z>(
    run: &[&'r Transition<'z>],
) -> Vec<(Option<&'z Rule>, Vec<&'r Transition<'z>>)> {
    let mut groups: Vec<(Option<&'z Rule>, Vec<&'r Transition<'z>>)> = vec![];
    for &t in run.iter() {
        let found =
            groups.iter_mut().find(|(rule, _)| match (*rule, t.rule()) {
                (None, None) => true,
                (Some(r1), Some(r2)) => core::ptr::eq(r1, r2),
                _ => false,
            });
        match found {
            Some((_, group)) => group.push(t),
            None => groups.push((t.rule(), vec![t])),
        }
    }
    groups
}

/// Splits `items` into maximal runs where `same` holds for every pair of
/// neighbors.
fn split<'a, T>(
    items: &'a [T],
    mut same: impl FnMut(&T, &T) -> bool,
) -> Vec<&'a [T]> {
    let mut runs = vec![];
    let mut start = 0;
    for i in 1..=items.len() {
        if i == items.len() || !same(&items[i - 1], &items[i]) {
            if start < i {
                runs.push(&items[start..i]);
            }
            start = i;
        }
    }
    runs
}

/// Merges observances with explicit dates sharing kind, name and offsets
/// into the first of them, then orders everything by start.
fn merge(observances: Vec<Observance>) -> Vec<Observance> {
    let mut merged: Vec<Observance> = vec![];
    for obs in observances {
        if let Recurrence::Dates(ref dates) = obs.recurrence {
            let target = merged.iter_mut().find(|o| {
                matches!(o.recurrence, Recurrence::Dates(_))
                    && o.merge_key() == obs.merge_key()
            });
            if let Some(target) = target {
                if let Recurrence::Dates(ref mut into) = target.recurrence {
                    into.extend_from_slice(dates);
                }
                continue;
            }
        }
        merged.push(obs);
    }
    for obs in merged.iter_mut() {
        if let Recurrence::Dates(ref mut dates) = obs.recurrence {
            dates.sort();
            dates.dedup();
            if let Some(&first) = dates.first() {
                obs.start = first;
            }
        }
    }
    merged.sort_by_key(|obs| obs.start);
    merged
}

#[cfg(test)]
mod tests {
    use crate::{civil::datetime, tz, zic::Database};

    use super::*;

    fn db(src: &str) -> Database {
        let mut db = Database::new();
        db.parse("test", src).unwrap();
        db
    }

    fn convert(db: &Database, name: &str, min: i32, max: i32) -> VTimeZone {
        let zone = db.zone(name).unwrap();
        let transitions = tz::expand(db, zone, min, max).unwrap();
        emit(name, &transitions)
    }

    fn render(vtz: &VTimeZone) -> String {
        vtz.observances()
            .iter()
            .map(|obs| {
                format!(
                    "{} {} {} {} {} {}",
                    obs.kind(),
                    obs.name(),
                    obs.offset_from(),
                    obs.offset_to(),
                    obs.start(),
                    obs.recurrence(),
                )
            })
            .collect::<Vec<String>>()
            .join("\n")
    }

    #[test]
    fn new_york_2007_to_2009() {
        let db = db("\
Rule US 1967 2006 - Oct lastSun 2:00 0 S
Rule US 1987 2006 - Apr Sun>=1 2:00 1:00 D
Rule US 2007 max - Mar Sun>=8 2:00 1:00 D
Rule US 2007 max - Nov Sun>=1 2:00 0 S
Zone America/New_York -4:56:02 - LMT 1883 Nov 18 12:03:58
\t\t\t-5:00 US E%sT
");
        let vtz = convert(&db, "America/New_York", 2007, 2010);
        assert_eq!(vtz.tzid(), "America/New_York");
        assert_eq!(vtz.location(), "America/New_York");
        insta::assert_snapshot!(render(&vtz), @r"
        DAYLIGHT EDT -18000 -14400 20070311T020000 RRULE:FREQ=YEARLY;BYMONTH=3;BYDAY=2SU
        STANDARD EST -14400 -18000 20071104T020000 RRULE:FREQ=YEARLY;BYMONTH=11;BYDAY=1SU
        ");
    }

    #[test]
    fn open_rules_reaching_one_year() {
        let db = db("\
Rule US 2007 max - Mar Sun>=8 2:00 1:00 D
Rule US 2007 max - Nov Sun>=1 2:00 0 S
Zone America/New_York -4:56:02 - LMT 1883 Nov 18 12:03:58
\t\t\t-5:00 US E%sT
");
        let vtz = convert(&db, "America/New_York", 2007, 2008);
        insta::assert_snapshot!(render(&vtz), @r"
        DAYLIGHT EDT -18000 -14400 20070311T020000 RRULE:FREQ=YEARLY;BYMONTH=3;BYDAY=2SU
        STANDARD EST -14400 -18000 20071104T020000 RRULE:FREQ=YEARLY;BYMONTH=11;BYDAY=1SU
        ");
    }

    #[test]
    fn pieces_split_on_offsets() {
        let db = db("\
Rule R 1990 1995 - Apr 1 2:00 1:00 S
Rule R 1990 1995 - Oct 1 2:00 0 -
Rule R 1993 only - Jun 1 2:00 2:00 M
Zone Test/Zone 0:00 - LMT 1980
\t\t1:00 R X%sT
");
        let vtz = convert(&db, "Test/Zone", 1800, 2000);
        insta::assert_snapshot!(render(&vtz), @r"
        STANDARD XT 0 3600 19800101T000000 RDATE:19800101T000000
        DAYLIGHT XST 3600 7200 19900401T020000 RRULE:FREQ=YEARLY;UNTIL=19950401T010000Z;BYMONTH=4
        STANDARD XT 7200 3600 19901001T020000 RRULE:FREQ=YEARLY;UNTIL=19921001T000000Z;BYMONTH=10
        DAYLIGHT XMT 7200 10800 19930601T020000 RDATE:19930601T020000
        STANDARD XT 10800 3600 19931001T020000 RDATE:19931001T020000
        STANDARD XT 7200 3600 19941001T020000 RRULE:FREQ=YEARLY;UNTIL=19951001T000000Z;BYMONTH=10
        ");
    }

    #[test]
    fn explicit_dates_are_merged() {
        let db = db("\
Zone Test/Zone 0:00 - LMT 1900
\t\t1:00 - CET 1940
\t\t2:00 - CEST 1942
\t\t1:00 - CET 1945
\t\t2:00 - CEST 1947
\t\t1:00 - CET
");
        let vtz = convert(&db, "Test/Zone", 1800, 2000);
        insta::assert_snapshot!(render(&vtz), @r"
        STANDARD CET 0 3600 19000101T000000 RDATE:19000101T000000
        STANDARD CEST 3600 7200 19400101T000000 RDATE:19400101T000000,19450101T000000
        STANDARD CET 7200 3600 19420101T000000 RDATE:19420101T000000,19470101T000000
        ");
    }

    #[test]
    fn merge_unions_dates_once() {
        let obs = |dates: Vec<DateTime>| Observance {
            kind: ObservanceKind::Daylight,
            name: "BST".to_string(),
            offset_from: 0,
            offset_to: 3600,
            start: dates[0],
            recurrence: Recurrence::Dates(dates),
        };
        let a = datetime(1941, 5, 4, 2, 0, 0);
        let b = datetime(1942, 4, 5, 2, 0, 0);
        let c = datetime(1943, 4, 4, 2, 0, 0);
        let merged = merge(vec![obs(vec![b, c]), obs(vec![a, b])]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].start(), a);
        assert_eq!(merged[0].recurrence(), &Recurrence::Dates(vec![a, b, c]));
    }

    #[test]
    fn lmt_only_zone_is_empty() {
        let db = db("Zone Test/Zone 0:01:15 - LMT\n");
        let vtz = convert(&db, "Test/Zone", 1800, 2000);
        assert!(vtz.observances().is_empty());
    }

    #[test]
    fn renamed_link() {
        let db = db("Zone Etc/UTC 0 - UTC\n");
        let vtz = convert(&db, "Etc/UTC", 1800, 2000);
        let link = vtz.renamed("UTC");
        assert_eq!(link.tzid(), "UTC");
        assert_eq!(link.location(), "UTC");
        assert_eq!(link.observances(), vtz.observances());
        insta::assert_snapshot!(render(&link), @"STANDARD UTC 0 0 18000101T000000 RDATE:18000101T000000");
    }
}
