use crate::{
    civil::DateTime,
    error::{zic::Error, ErrorContext},
    zic::field::{self, DaySelector, RuleTime},
};

/// A named time zone: an ordered list of segments, each of which applies up
/// to its `UNTIL` boundary.
///
/// Every segment but the last has an `UNTIL`, and the boundaries strictly
/// increase.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Zone {
    name: String,
    segments: Vec<ZoneSegment>,
}

impl Zone {
    pub(crate) fn new(name: &str, first: ZoneSegment) -> Zone {
        Zone { name: name.to_string(), segments: vec![first] }
    }

    /// Appends a continuation segment, checking that `UNTIL` boundaries
    /// increase.
    pub(crate) fn push(&mut self, segment: ZoneSegment) -> Result<(), Error> {
        if let (Some(prev), Some(next)) = (
            self.segments.last().and_then(|s| s.until.as_ref()),
            segment.until.as_ref(),
        ) {
            if next.local() <= prev.local() {
                return Err(Error::UntilNotIncreasing);
            }
        }
        self.segments.push(segment);
        Ok(())
    }

    /// Returns true when the last segment has an `UNTIL`, and thus a
    /// continuation line must follow.
    pub(crate) fn expects_continuation(&self) -> bool {
        self.segments.last().map_or(false, |s| s.until.is_some())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn segments(&self) -> &[ZoneSegment] {
        &self.segments
    }
}

/// One line of a zone: a standard offset, the daylight saving rules that
/// apply on top of it, an abbreviation format and an optional end.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ZoneSegment {
    std_offset: i32,
    rules: ZoneRules,
    format: Format,
    until: Option<Until>,
}

impl ZoneSegment {
    /// Parses `STDOFF RULES FORMAT [UNTIL]`.
    pub(crate) fn parse(fields: &[&str]) -> Result<ZoneSegment, crate::Error> {
        let std_offset = field::parse_duration(fields[0])
            .context(Error::FailedParseFieldStdOff)?;
        let rules =
            ZoneRules::parse(fields[1]).context(Error::FailedParseFieldRules)?;
        if fields[2].is_empty() {
            return Err(Error::ExpectedNonEmptyFormat.into());
        }
        let format = Format(fields[2].to_string());
        let until = if fields.len() > 3 {
            let (year, month, day, time) = field::parse_until(&fields[3..])
                .context(Error::FailedParseFieldUntil)?;
            Some(Until { year, month, day, time })
        } else {
            None
        };
        Ok(ZoneSegment { std_offset, rules, format, until })
    }

    /// The standard offset of this segment, in seconds east of UTC.
    pub fn std_offset(&self) -> i32 {
        self.std_offset
    }

    pub fn rules(&self) -> &ZoneRules {
        &self.rules
    }

    pub fn format(&self) -> &Format {
        &self.format
    }

    /// The end of this segment, or `None` for a zone's last segment.
    pub fn until(&self) -> Option<&Until> {
        self.until.as_ref()
    }
}

/// The `RULES` field of a zone line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ZoneRules {
    /// `-`: standard time always applies.
    None,
    /// A fixed amount of daylight saving, in seconds.
    Save(i32),
    /// The name of a rule set.
    Named(String),
}

impl ZoneRules {
    fn parse(field: &str) -> Result<ZoneRules, Error> {
        if field == "-" || field.is_empty() {
            return Ok(ZoneRules::None);
        }
        let numeric = field
            .trim_start_matches('-')
            .bytes()
            .next()
            .map_or(false, |b| b.is_ascii_digit());
        if numeric {
            return Ok(ZoneRules::Save(field::parse_save(field)?));
        }
        Ok(ZoneRules::Named(field.to_string()))
    }
}

/// The `FORMAT` field of a zone line, from which time zone abbreviations
/// are derived.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Format(String);

impl Format {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for the local mean time placeholder used before a
    /// location adopted standard time.
    pub fn is_lmt(&self) -> bool {
        self.0 == "LMT"
    }

    /// Returns the abbreviation for the given rule letters, daylight saving
    /// amount and total UTC offset.
    ///
    /// `%s` is replaced by the letters. A format of the form `STD/DST`
    /// picks one side depending on whether `save` is zero. `%z` is replaced
    /// by the numeric UTC offset.
    ///
    /// # Example
    ///
    /// ```
    /// use tzconvert::zic::Database;
    ///
    /// let mut db = Database::new();
    /// db.parse("test", "\
    /// Zone A -5:00 US E%sT
    /// Zone B 0:00 EU GMT/BST
    /// Zone C 5:30 - %z
    /// ")?;
    /// let fmt = |name: &str| {
    ///     db.zone(name).unwrap().segments()[0].format().clone()
    /// };
    /// assert_eq!(fmt("A").abbreviation("D", 3600, -4 * 3600), "EDT");
    /// assert_eq!(fmt("B").abbreviation("", 0, 0), "GMT");
    /// assert_eq!(fmt("B").abbreviation("", 3600, 3600), "BST");
    /// assert_eq!(fmt("C").abbreviation("", 0, 5 * 3600 + 1800), "+0530");
    ///
    /// # Ok::<(), tzconvert::Error>(())
    /// ```
    pub fn abbreviation(
        &self,
        letters: &str,
        save: i32,
        offset: i32,
    ) -> String {
        if let Some((std, dst)) = self.0.split_once('/') {
            let abbrev = if save == 0 { std } else { dst };
            return abbrev.to_string();
        }
        let mut out = String::with_capacity(self.0.len() + letters.len());
        let mut rest = self.0.as_str();
        while let Some(i) = rest.find('%') {
            out.push_str(&rest[..i]);
            let mut chars = rest[i + 1..].chars();
            match chars.next() {
                Some('s') => out.push_str(letters),
                Some('z') => out.push_str(&numeric_abbreviation(offset)),
                Some(c) => {
                    out.push('%');
                    if c != '%' {
                        out.push(c);
                    }
                }
                None => out.push('%'),
            }
            rest = chars.as_str();
        }
        out.push_str(rest);
        out
    }
}

/// Formats an offset the way `%z` does in tzdata: `+hh`, `+hhmm` or
/// `+hhmmss`, using the shortest form that is exact.
fn numeric_abbreviation(offset: i32) -> String {
    let sign = if offset < 0 { '-' } else { '+' };
    let offset = offset.unsigned_abs();
    let (h, m, s) = (offset / 3600, offset / 60 % 60, offset % 60);
    if s != 0 {
        format!("{sign}{h:02}{m:02}{s:02}")
    } else if m != 0 {
        format!("{sign}{h:02}{m:02}")
    } else {
        format!("{sign}{h:02}")
    }
}

/// The `UNTIL` boundary of a zone segment. Omitted trailing parts default to
/// the earliest value: January, the first day and midnight.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Until {
    year: i32,
    month: i8,
    day: DaySelector,
    time: RuleTime,
}

impl Until {
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The boundary as a local date-time, measured in this boundary's time
    /// mode.
    pub fn local(&self) -> DateTime {
        self.time.on(self.day.date_in(self.year, self.month))
    }

    /// Converts this boundary to UTC, given the wall clock and standard
    /// offsets in effect at the end of the segment.
    pub fn to_utc(&self, wall_offset: i32, std_offset: i32) -> DateTime {
        self.time.mode.to_utc(self.local(), wall_offset, std_offset)
    }
}
