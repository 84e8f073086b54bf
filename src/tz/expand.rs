use crate::{
    civil::DateTime,
    error::{tz::Error as TzError, Error, ErrorContext},
    tz::Transition,
    zic::{Database, Rule, RuleSet, Zone, ZoneRules, ZoneSegment},
};

/// The instant every zone's history starts at.
fn beginning() -> DateTime {
    DateTime::new(1800, 1, 1, 0, 0, 0).with_utc(true)
}

/// Computes the transitions of `zone`, in chronological order.
///
/// Rules are expanded for years before `max_year`. Transitions whose UTC
/// year is before `min_year` are computed (they determine the offsets in
/// effect later) but not returned.
///
/// The first segment of a zone describes local mean time before standard
/// time was adopted. Its transitions are dropped, unless it is the only
/// segment. Transitions at the same instant are collapsed into one, going
/// from the offset before the first to the offset after the last. A
/// transition that changes nothing (its offset, save and abbreviation are
/// those already in effect) is dropped.
///
/// # Errors
///
/// This returns an error when a segment of the zone refers to a rule set
/// that isn't in `db`.
///
/// # Example
///
/// ```
/// use tzconvert::{tz, zic::Database};
///
/// let mut db = Database::new();
/// db.parse("northamerica", "\
/// Rule US 2007 max - Mar Sun>=8 2:00 1:00 D
/// Rule US 2007 max - Nov Sun>=1 2:00 0 S
/// Zone America/New_York -5:00 US E%sT
/// ")?;
/// let zone = db.zone("America/New_York").unwrap();
/// let transitions = tz::expand(&db, zone, 2007, 2010)?;
/// let got: Vec<String> = transitions
///     .iter()
///     .map(|t| format!("{} {}", t.at(), t.abbreviation()))
///     .collect();
/// assert_eq!(got, [
///     "20070311T070000Z EDT",
///     "20071104T060000Z EST",
///     "20080309T070000Z EDT",
///     "20081102T060000Z EST",
///     "20090308T070000Z EDT",
///     "20091101T060000Z EST",
/// ]);
///
/// # Ok::<(), tzconvert::Error>(())
/// ```
pub fn expand<'z>(
    db: &'z Database,
    zone: &'z Zone,
    min_year: i32,
    max_year: i32,
) -> Result<Vec<Transition<'z>>, Error> {
    expand_impl(db, zone, min_year, max_year)
        .with_context(|| TzError::ExpandZone { name: zone.name().into() })
}

fn expand_impl<'z>(
    db: &'z Database,
    zone: &'z Zone,
    min_year: i32,
    max_year: i32,
) -> Result<Vec<Transition<'z>>, Error> {
    let segments = zone.segments();
    let Some(first) = segments.first() else { return Ok(vec![]) };
    let mut raw = vec![];
    let mut start = beginning();
    let (mut wall, mut std) = (first.std_offset(), first.std_offset());
    for (index, segment) in segments.iter().enumerate() {
        let mut expander =
            SegmentExpander { out: &mut raw, index, segment, start };
        (wall, std) = match *segment.rules() {
            ZoneRules::None => expander.fixed(0),
            ZoneRules::Save(save) => expander.fixed(save),
            ZoneRules::Named(ref name) => {
                let set = db.rule_set(name).ok_or_else(|| {
                    TzError::UnknownRule { name: name.as_str().into() }
                })?;
                expander.rules(set, wall, std, max_year)
            }
        };
        let Some(until) = segment.until() else { break };
        start = until.to_utc(wall, std);
        if index == 0 && segments.len() > 1 {
            raw.clear();
        }
    }
    raw.sort_by_key(|t: &Transition| t.at);

    let mut transitions: Vec<Transition<'z>> = vec![];
    let mut offset = first.std_offset();
    let mut last = None;
    for mut t in raw {
        t.offset_before = offset;
        offset = t.offset_after;
        let state = (t.offset_after, t.save, t.abbreviation());
        if last.as_ref() == Some(&state) {
            trace!("{}: dropping no-op transition at {}", zone.name(), t.at);
            continue;
        }
        last = Some(state);
        if t.at.year() < min_year {
            continue;
        }
        match transitions.last_mut() {
            Some(prev) if prev.at >= t.at => {
                trace!(
                    "{}: collapsing transitions at {}",
                    zone.name(),
                    t.at,
                );
                *prev = Transition { offset_before: prev.offset_before, ..t };
            }
            _ => transitions.push(t),
        }
    }
    Ok(transitions)
}

/// Expands one segment of a zone, starting at `start` (in UTC).
struct SegmentExpander<'a, 'z> {
    out: &'a mut Vec<Transition<'z>>,
    index: usize,
    segment: &'z ZoneSegment,
    start: DateTime,
}

impl<'a, 'z> SegmentExpander<'a, 'z> {
    /// A segment without rules has one transition, at its start. Returns the
    /// wall clock and standard offsets in effect at the end of the segment.
    fn fixed(&mut self, save: i32) -> (i32, i32) {
        let std = self.segment.std_offset();
        self.push_start(std + save, save, "");
        (std + save, std)
    }

    /// Expands the rules of `set` that fall within this segment.
    ///
    /// `wall` and `std` are the offsets in effect at the end of the previous
    /// segment. Returns the wall clock and standard offsets in effect at the
    /// end of this segment.
    fn rules(
        &mut self,
        set: &'z RuleSet,
        wall: i32,
        std: i32,
        max_year: i32,
    ) -> (i32, i32) {
        let seg_std = self.segment.std_offset();
        let (mut wall, mut std) = (wall, std);
        let mut latest: Option<&Rule> = None;
        let mut started = false;
        for instant in set.expand(seg_std, max_year) {
            let mut at = instant.to_utc(wall, std);
            if at >= self.start {
                if !started && at != self.start {
                    // No rule fired exactly at the start of this segment, so
                    // the rule in effect at its start is the latest one that
                    // fired before it, or standard time if none did.
                    match latest {
                        Some(rule) => {
                            self.push_start(
                                seg_std + rule.save(),
                                rule.save(),
                                rule.letters(),
                            );
                        }
                        None => {
                            let letters = set
                                .first_standard_rule()
                                .map_or("", |rule| rule.letters());
                            self.push_start(seg_std, 0, letters);
                            (wall, std) = (seg_std, seg_std);
                            at = instant.to_utc(wall, std);
                        }
                    }
                }
                started = true;
                if let Some(until) = self.segment.until() {
                    if at >= until.to_utc(wall, std) {
                        break;
                    }
                }
                self.out.push(Transition {
                    at,
                    offset_before: 0,
                    offset_after: instant.offset,
                    save: instant.rule.save(),
                    letters: instant.rule.letters(),
                    segment: self.segment,
                    segment_index: self.index,
                    rule: Some((instant.rule, instant.year)),
                });
            }
            wall = instant.offset;
            std = seg_std;
            latest = Some(instant.rule);
        }
        if !started {
            match latest {
                Some(rule) => {
                    wall = seg_std + rule.save();
                    self.push_start(wall, rule.save(), rule.letters());
                }
                None => {
                    wall = seg_std;
                    let letters = set
                        .first_standard_rule()
                        .map_or("", |rule| rule.letters());
                    self.push_start(wall, 0, letters);
                }
            }
        }
        (wall, seg_std)
    }

    fn push_start(&mut self, offset: i32, save: i32, letters: &'z str) {
        self.out.push(Transition {
            at: self.start,
            offset_before: 0,
            offset_after: offset,
            save,
            letters,
            segment: self.segment,
            segment_index: self.index,
            rule: None,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db(src: &str) -> Database {
        let mut db = Database::new();
        db.parse("test", src).unwrap();
        db
    }

    fn render(transitions: &[Transition]) -> String {
        transitions
            .iter()
            .map(|t| {
                format!(
                    "{} {:>6} -> {:>6} {:<5} {}",
                    t.at(),
                    t.offset_before(),
                    t.offset_after(),
                    t.abbreviation(),
                    if t.rule().is_some() { "rule" } else { "start" },
                )
            })
            .collect::<Vec<String>>()
            .join("\n")
    }

    const NEW_YORK: &str = "\
Rule US 1967 2006 - Oct lastSun 2:00 0 S
Rule US 1967 1973 - Apr lastSun 2:00 1:00 D
Rule US 1974 only - Jan 6 2:00 1:00 D
Rule US 1975 only - Feb lastSun 2:00 1:00 D
Rule US 1976 1986 - Apr lastSun 2:00 1:00 D
Rule US 1987 2006 - Apr Sun>=1 2:00 1:00 D
Rule US 2007 max - Mar Sun>=8 2:00 1:00 D
Rule US 2007 max - Nov Sun>=1 2:00 0 S
Zone America/New_York -4:56:02 - LMT 1883 Nov 18 12:03:58
\t\t\t-5:00 US E%sT
";

    #[test]
    fn new_york_2007_to_2009() {
        let db = db(NEW_YORK);
        let zone = db.zone("America/New_York").unwrap();
        let transitions = expand(&db, zone, 2007, 2010).unwrap();
        assert_eq!(transitions.len(), 6);
        insta::assert_snapshot!(render(&transitions), @r"
        20070311T070000Z -18000 -> -14400 EDT   rule
        20071104T060000Z -14400 -> -18000 EST   rule
        20080309T070000Z -18000 -> -14400 EDT   rule
        20081102T060000Z -14400 -> -18000 EST   rule
        20090308T070000Z -18000 -> -14400 EDT   rule
        20091101T060000Z -14400 -> -18000 EST   rule
        ");
    }

    #[test]
    fn lmt_segment_is_dropped() {
        let db = db(NEW_YORK);
        let zone = db.zone("America/New_York").unwrap();
        let transitions = expand(&db, zone, 1800, 1968).unwrap();
        insta::assert_snapshot!(render(&transitions), @r"
        18831118T170000Z -17762 -> -18000 EST   start
        19670430T070000Z -18000 -> -14400 EDT   rule
        19671029T060000Z -14400 -> -18000 EST   rule
        ");
    }

    #[test]
    fn segment_chronology() {
        let db = db("\
Rule EU 1981 max - Mar lastSun 1:00u 1:00 S
Rule EU 1996 max - Oct lastSun 1:00u 0 -
Rule C 1980 only - Apr 6 2:00s 1:00 S
Rule C 1980 only - Sep lastSun 2:00s 0 -
Zone Europe/X 0:30 - LMT 1900
\t\t1:00 C CE%sT 1981
\t\t1:00 EU CE%sT
");
        let zone = db.zone("Europe/X").unwrap();
        let transitions = expand(&db, zone, 1980, 1998).unwrap();
        let until = zone.segments()[1].until().unwrap().to_utc(3600, 3600);
        assert_eq!(until.to_string(), "19801231T230000Z");
        let last: Vec<&Transition> =
            transitions.iter().filter(|t| t.segment_index() == 2).collect();
        assert!(!last.is_empty());
        assert!(last.iter().all(|t| t.at() >= until));
        assert!(transitions.windows(2).all(|w| w[0].at() < w[1].at()));
        // Universal time rules ignore the local offset entirely.
        let march = last
            .iter()
            .find(|t| t.rule_year() == Some(1990) && t.save() != 0)
            .unwrap();
        assert_eq!(march.at().to_string(), "19900325T010000Z");
        // Standard time rules ignore daylight saving.
        let sept = transitions
            .iter()
            .find(|t| t.rule_year() == Some(1980) && t.save() == 0)
            .unwrap();
        assert_eq!(sept.segment_index(), 1);
        assert_eq!(sept.at().to_string(), "19800928T010000Z");
        assert_eq!(sept.abbreviation(), "CET");
    }

    // In both of the following, the segment ends at 01:00 UTC on the last
    // Sunday of March 1996, which is exactly when the March rule fires. The
    // next segment owns that instant.

    #[test]
    fn until_in_universal_time_on_rule_boundary() {
        let db = db("\
Rule EU 1981 max - Mar lastSun 1:00u 1:00 S
Rule EU 1981 max - Sep lastSun 1:00u 0 -
Zone Test/Zone 0:00 - LMT 1900
\t\t1:00 EU CE%sT 1996 Mar 31 1:00u
\t\t2:00 - EET
");
        let zone = db.zone("Test/Zone").unwrap();
        let transitions = expand(&db, zone, 1995, 2000).unwrap();
        insta::assert_snapshot!(render(&transitions), @r"
        19950326T010000Z   3600 ->   7200 CEST  rule
        19950924T010000Z   7200 ->   3600 CET   rule
        19960331T010000Z   3600 ->   7200 EET   start
        ");
        assert_eq!(transitions[2].segment_index(), 2);
        assert!(transitions.iter().all(|t| t.rule_year() != Some(1996)));
    }

    #[test]
    fn until_in_standard_time_on_rule_boundary() {
        let db = db("\
Rule EU 1981 max - Mar lastSun 2:00s 1:00 S
Rule EU 1981 max - Sep lastSun 2:00s 0 -
Zone Test/Zone 0:00 - LMT 1900
\t\t1:00 EU CE%sT 1996 Mar 31 2:00s
\t\t2:00 - EET
");
        let zone = db.zone("Test/Zone").unwrap();
        let until = zone.segments()[1].until().unwrap();
        // Daylight saving is ignored for standard time.
        assert_eq!(until.to_utc(7200, 3600).to_string(), "19960331T010000Z");
        let transitions = expand(&db, zone, 1995, 2000).unwrap();
        insta::assert_snapshot!(render(&transitions), @r"
        19950326T010000Z   3600 ->   7200 CEST  rule
        19950924T010000Z   7200 ->   3600 CET   rule
        19960331T010000Z   3600 ->   7200 EET   start
        ");
        assert_eq!(transitions[2].segment_index(), 2);
        assert!(transitions.iter().all(|t| t.rule_year() != Some(1996)));
    }

    #[test]
    fn unknown_rule_reference() {
        let db = db("Zone Asia/X 1:00 - LMT 1900\n\t2:00 Nope X%sT\n");
        let zone = db.zone("Asia/X").unwrap();
        let err = expand(&db, zone, 1800, 2000).unwrap_err();
        assert!(err.is_unknown_rule());
        insta::assert_snapshot!(
            err,
            @"failed to expand transitions for zone `Asia/X`: zone refers to unknown rule set `Nope`",
        );
    }

    #[test]
    fn segment_start_uses_rule_in_effect() {
        // Daylight saving is in effect when the second segment starts, and
        // no rule fires exactly then.
        let db = db("\
Rule R 1990 max - Apr 1 2:00 1:00 D
Rule R 1990 max - Oct 1 2:00 0 S
Zone Test/Zone 0:00 - LMT 1980
\t\t-5:00 - EST 1995 Jun 1
\t\t-5:00 R E%sT
");
        let zone = db.zone("Test/Zone").unwrap();
        let transitions = expand(&db, zone, 1995, 1997).unwrap();
        insta::assert_snapshot!(render(&transitions), @r"
        19950601T050000Z -18000 -> -14400 EDT   start
        19951001T060000Z -14400 -> -18000 EST   rule
        19960401T070000Z -18000 -> -14400 EDT   rule
        19961001T060000Z -14400 -> -18000 EST   rule
        ");
    }

    #[test]
    fn fixed_save() {
        let db = db("\
Rule R 1940 only - Jan 1 0:00 1:00 D
Rule R 1940 only - Jun 1 0:00u 0 S
Zone Test/Zone 0:00 - LMT 1930
\t\t1:00 R X%sT 1940 Jun 1 0:00u
\t\t2:00 - YST 1941
\t\t1:00 1:00 ZDT
");
        let zone = db.zone("Test/Zone").unwrap();
        let transitions = expand(&db, zone, 1800, 2000).unwrap();
        // The rule firing exactly at the end of its segment is dropped.
        insta::assert_snapshot!(render(&transitions), @r"
        19300101T000000Z      0 ->   3600 XST   start
        19391231T230000Z   3600 ->   7200 XDT   rule
        19400601T000000Z   7200 ->   7200 YST   start
        19401231T220000Z   7200 ->   7200 ZDT   start
        ");
    }

    #[test]
    fn unchanged_segment_start_is_dropped() {
        let db = db("\
Zone Test/Zone 0:00 - LMT 1900
\t\t1:00 - CET 1950
\t\t1:00 - CET 1960
\t\t2:00 - EET
");
        let zone = db.zone("Test/Zone").unwrap();
        let transitions = expand(&db, zone, 1800, 2000).unwrap();
        insta::assert_snapshot!(render(&transitions), @r"
        19000101T000000Z      0 ->   3600 CET   start
        19591231T230000Z   3600 ->   7200 EET   start
        ");
    }

    #[test]
    fn collapse_identical_instants() {
        let db = db("\
Rule R 1950 only - Apr 1 2:00u 1:00 D
Rule R 1950 only - Apr 1 2:00u 2:00 M
Rule R 1950 only - Oct 1 2:00u 0 S
Zone Test/Zone 0:00 - LMT 1900
\t\t1:00 R X%sT
");
        let zone = db.zone("Test/Zone").unwrap();
        let transitions = expand(&db, zone, 1950, 1951).unwrap();
        insta::assert_snapshot!(render(&transitions), @r"
        19500401T020000Z   3600 ->  10800 XMT   rule
        19501001T020000Z  10800 ->   3600 XST   rule
        ");
        assert_eq!(transitions[0].rule_year(), Some(1950));
        assert_eq!(transitions[0].save(), 7200);
    }
}
