use crate::{
    civil::{date, DateTime, Weekday},
    error::zic::Error,
};

/// Selects one day of a month, as written in the `ON` field of a `Rule`
/// line or the day part of a zone's `UNTIL`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum DaySelector {
    /// A fixed day of the month, like `5`.
    Day(i8),
    /// The last given weekday of the month, like `lastSun`.
    LastWeekday(Weekday),
    /// The first given weekday on or after a day, like `Sun>=8`.
    WeekdayOnOrAfter { weekday: Weekday, day: i8 },
    /// The last given weekday on or before a day, like `Sun<=25`.
    WeekdayOnOrBefore { weekday: Weekday, day: i8 },
}

impl DaySelector {
    /// Returns the date this selector picks in the given month of the given
    /// year.
    ///
    /// The result may fall in an adjacent month. For example, `Sun>=29` in a
    /// month whose last Sunday is before the 29th.
    ///
    /// # Example
    ///
    /// ```
    /// use tzconvert::{civil::Weekday, zic::DaySelector};
    ///
    /// let sel = DaySelector::LastWeekday(Weekday::Sunday);
    /// assert_eq!(sel.date_in(2024, 2).to_string(), "20240225");
    /// ```
    pub fn date_in(&self, year: i32, month: i8) -> DateTime {
        let first = date(year, i32::from(month), 1);
        match *self {
            DaySelector::Day(day) => {
                date(year, i32::from(month), i32::from(day))
            }
            DaySelector::LastWeekday(weekday) => {
                first.nth_weekday_of_month(-1, weekday)
            }
            DaySelector::WeekdayOnOrAfter { weekday, day } => {
                first.next_weekday_on_or_after(i32::from(day), weekday)
            }
            DaySelector::WeekdayOnOrBefore { weekday, day } => {
                first.last_weekday_on_or_before(i32::from(day), weekday)
            }
        }
    }

    /// Returns the weekday this selector is anchored to, if any.
    pub fn weekday(&self) -> Option<Weekday> {
        match *self {
            DaySelector::Day(_) => None,
            DaySelector::LastWeekday(weekday)
            | DaySelector::WeekdayOnOrAfter { weekday, .. }
            | DaySelector::WeekdayOnOrBefore { weekday, .. } => Some(weekday),
        }
    }

    pub(crate) fn parse(field: &str) -> Result<DaySelector, Error> {
        if field.bytes().all(|b| b.is_ascii_digit()) {
            let day = parse_number(field).ok_or(Error::FailedParseDay)?;
            if !(1..=31).contains(&day) {
                return Err(Error::InvalidDayOfMonth { day });
            }
            return Ok(DaySelector::Day(day as i8));
        }
        if let (Some(last), Some(weekday)) = (field.get(..4), field.get(4..)) {
            if last.eq_ignore_ascii_case("last") && !weekday.is_empty() {
                return Ok(DaySelector::LastWeekday(parse_weekday(weekday)?));
            }
        }
        let (weekday, day, after) = match field.split_once(">=") {
            Some((wd, day)) => (wd, day, true),
            None => match field.split_once("<=") {
                Some((wd, day)) => (wd, day, false),
                None => return Err(Error::UnrecognizedDayOfMonthFormat),
            },
        };
        let weekday = parse_weekday(weekday)?;
        let day = parse_number(day).ok_or(Error::FailedParseDay)?;
        if !(1..=31).contains(&day) {
            return Err(Error::InvalidDayOfMonth { day });
        }
        let day = day as i8;
        Ok(if after {
            DaySelector::WeekdayOnOrAfter { weekday, day }
        } else {
            DaySelector::WeekdayOnOrBefore { weekday, day }
        })
    }
}

/// How a time of day in a `Rule` `AT` field or zone `UNTIL` is measured.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TimeMode {
    /// Local wall clock time, including any daylight saving in effect.
    /// This is the default and may be written with a `w` suffix.
    Wall,
    /// Local standard time, written with an `s` suffix.
    Standard,
    /// Universal time, written with a `u`, `g` or `z` suffix.
    Universal,
}

impl TimeMode {
    /// Converts a local date-time measured in this mode to UTC, given the
    /// wall clock and standard offsets (in seconds east of UTC) in effect.
    ///
    /// # Example
    ///
    /// ```
    /// use tzconvert::{civil::datetime, zic::TimeMode};
    ///
    /// let local = datetime(2007, 11, 4, 2, 0, 0);
    /// let (wall, std) = (-4 * 3600, -5 * 3600);
    /// let utc = TimeMode::Wall.to_utc(local, wall, std);
    /// assert_eq!(utc.to_string(), "20071104T060000Z");
    /// let utc = TimeMode::Standard.to_utc(local, wall, std);
    /// assert_eq!(utc.to_string(), "20071104T070000Z");
    /// ```
    pub fn to_utc(
        self,
        local: DateTime,
        wall_offset: i32,
        std_offset: i32,
    ) -> DateTime {
        let offset = match self {
            TimeMode::Wall => wall_offset,
            TimeMode::Standard => std_offset,
            TimeMode::Universal => 0,
        };
        local.add_seconds(-i64::from(offset)).with_utc(true)
    }
}

/// A time of day along with the mode it is measured in.
///
/// The number of seconds may be negative or exceed a day (`25:00` is valid
/// tzdata). Such values carry into the adjacent days.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct RuleTime {
    pub seconds: i32,
    pub mode: TimeMode,
}

impl RuleTime {
    /// Midnight, wall clock time.
    pub const MIDNIGHT: RuleTime =
        RuleTime { seconds: 0, mode: TimeMode::Wall };

    /// Returns the given date at this time of day.
    pub fn on(&self, date: DateTime) -> DateTime {
        date.with_time(0, 0, self.seconds)
    }

    pub(crate) fn parse(field: &str) -> Result<RuleTime, Error> {
        if field == "-" {
            return Ok(RuleTime::MIDNIGHT);
        }
        let (duration, mode) = match field.as_bytes().last() {
            Some(&b) if b.is_ascii_alphabetic() => {
                let mode = match b.to_ascii_lowercase() {
                    b'w' => TimeMode::Wall,
                    b's' => TimeMode::Standard,
                    b'u' | b'g' | b'z' => TimeMode::Universal,
                    _ => return Err(Error::UnrecognizedAtTimeSuffix),
                };
                (&field[..field.len() - 1], mode)
            }
            _ => (field, TimeMode::Wall),
        };
        let seconds = parse_duration(duration)?;
        Ok(RuleTime { seconds, mode })
    }
}

/// Parses a `SAVE` field into seconds. A trailing `s` or `d` is accepted
/// and ignored.
pub(crate) fn parse_save(field: &str) -> Result<i32, Error> {
    if field == "-" {
        return Ok(0);
    }
    let duration = match field.as_bytes().last() {
        Some(&b) if b.is_ascii_alphabetic() => match b.to_ascii_lowercase() {
            b's' | b'd' => &field[..field.len() - 1],
            _ => return Err(Error::UnrecognizedSaveTimeSuffix),
        },
        _ => field,
    };
    parse_duration(duration)
}

/// Parses a signed duration of the form `[-]h[:mm[:ss[.fff]]]` into
/// seconds. Fractional seconds are truncated.
pub(crate) fn parse_duration(field: &str) -> Result<i32, Error> {
    let (negative, field) = match field.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, field),
    };
    let mut parts = field.split(':');
    let hours = parts
        .next()
        .and_then(parse_number)
        .filter(|&h| h <= 100_000)
        .ok_or(Error::FailedParseHour)?;
    let minutes = match parts.next() {
        None => 0,
        Some(part) => {
            let minute = parse_number(part).ok_or(Error::FailedParseMinute)?;
            if minute > 59 {
                return Err(Error::InvalidMinute { minute });
            }
            minute
        }
    };
    let seconds = match parts.next() {
        None => 0,
        Some(part) => {
            let (whole, fraction) = match part.split_once('.') {
                Some((whole, fraction)) => (whole, Some(fraction)),
                None => (part, None),
            };
            if let Some(fraction) = fraction {
                if fraction.is_empty()
                    || !fraction.bytes().all(|b| b.is_ascii_digit())
                {
                    return Err(Error::FailedParseSecond);
                }
            }
            let second = parse_number(whole).ok_or(Error::FailedParseSecond)?;
            if second > 59 {
                return Err(Error::InvalidSecond { second });
            }
            second
        }
    };
    if parts.next().is_some() {
        return Err(Error::TooManyTimeComponents);
    }
    let total = hours * 3600 + minutes * 60 + seconds;
    // Bounded by the hour limit above.
    let total = total as i32;
    Ok(if negative { -total } else { total })
}

/// Parses a year, as found in `FROM`, `TO` and `UNTIL` fields.
pub(crate) fn parse_year(field: &str) -> Result<i32, Error> {
    let (negative, digits) = match field.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, field),
    };
    let year = parse_number(digits)
        .filter(|&y| y <= 999_999)
        .ok_or(Error::FailedParseYear)?;
    // Bounded by the filter above.
    let year = year as i32;
    Ok(if negative { -year } else { year })
}

/// Parses the `TO` field of a rule. `None` means the rule has no end year.
pub(crate) fn parse_to_year(
    field: &str,
    from: i32,
) -> Result<Option<i32>, Error> {
    if is_keyword(field, "only") {
        Ok(Some(from))
    } else if is_keyword(field, "maximum") && field.len() >= 2 {
        Ok(None)
    } else {
        parse_year(field).map(Some)
    }
}

pub(crate) fn parse_month(field: &str) -> Result<i8, Error> {
    const MONTHS: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];
    let index = lookup(field, &MONTHS).ok_or(Error::UnrecognizedMonthName)?;
    // There are only 12 months.
    Ok(index as i8 + 1)
}

pub(crate) fn parse_weekday(field: &str) -> Result<Weekday, Error> {
    let names = Weekday::ALL.map(|wd| wd.name());
    let index = lookup(field, &names).ok_or(Error::UnrecognizedDayOfWeek)?;
    Ok(Weekday::ALL[index])
}

/// Returns true when `word` is a case insensitive, non-empty prefix of
/// `keyword`.
pub(crate) fn is_keyword(word: &str, keyword: &str) -> bool {
    let (word, keyword) = (word.as_bytes(), keyword.as_bytes());
    !word.is_empty()
        && word.len() <= keyword.len()
        && keyword[..word.len()].eq_ignore_ascii_case(word)
}

/// Returns the index of the one name in `names` that `word` abbreviates.
///
/// An exact match always wins. Otherwise, an abbreviation matching more
/// than one name is rejected.
fn lookup(word: &str, names: &[&str]) -> Option<usize> {
    if let Some(i) = names.iter().position(|n| n.eq_ignore_ascii_case(word)) {
        return Some(i);
    }
    let mut found = None;
    for (i, name) in names.iter().enumerate() {
        if is_keyword(word, name) {
            if found.is_some() {
                return None;
            }
            found = Some(i);
        }
    }
    found
}

fn parse_number(digits: &str) -> Option<i64> {
    if digits.is_empty() || digits.len() > 18 {
        return None;
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Parses the `UNTIL` fields (year, then optional month, day and time) of a
/// zone line.
pub(crate) fn parse_until(
    fields: &[&str],
) -> Result<(i32, i8, DaySelector, RuleTime), Error> {
    let Some(&year) = fields.first() else {
        return Err(Error::ExpectedUntilYear);
    };
    let year = parse_year(year)?;
    let month = match fields.get(1) {
        None => 1,
        Some(month) => parse_month(month)?,
    };
    let day = match fields.get(2) {
        None => DaySelector::Day(1),
        Some(day) => DaySelector::parse(day)?,
    };
    let time = match fields.get(3) {
        None => RuleTime::MIDNIGHT,
        Some(time) => RuleTime::parse(time)?,
    };
    if fields.len() > 4 {
        return Err(Error::TooManyTimeComponents);
    }
    Ok((year, month, day, time))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations() {
        assert_eq!(parse_duration("2").unwrap(), 7200);
        assert_eq!(parse_duration("2:00").unwrap(), 7200);
        assert_eq!(parse_duration("-0:25:21").unwrap(), -1521);
        assert_eq!(parse_duration("24:00").unwrap(), 86400);
        assert_eq!(parse_duration("0:19:32.13").unwrap(), 1172);
        assert!(parse_duration("").is_err());
        assert!(matches!(
            parse_duration("1:60"),
            Err(Error::InvalidMinute { minute: 60 }),
        ));
        assert!(parse_duration("1:00:00:00").is_err());
        assert!(parse_duration("a").is_err());
    }

    #[test]
    fn at_times() {
        let at = RuleTime::parse("2:00s").unwrap();
        assert_eq!(at, RuleTime { seconds: 7200, mode: TimeMode::Standard });
        let at = RuleTime::parse("1:00u").unwrap();
        assert_eq!(at.mode, TimeMode::Universal);
        let at = RuleTime::parse("0").unwrap();
        assert_eq!(at, RuleTime::MIDNIGHT);
        assert_eq!(RuleTime::parse("-").unwrap(), RuleTime::MIDNIGHT);
        assert!(RuleTime::parse("2:00x").is_err());
    }

    #[test]
    fn saves() {
        assert_eq!(parse_save("1:00").unwrap(), 3600);
        assert_eq!(parse_save("0:30").unwrap(), 1800);
        assert_eq!(parse_save("-1:00").unwrap(), -3600);
        assert_eq!(parse_save("1:00d").unwrap(), 3600);
        assert_eq!(parse_save("0").unwrap(), 0);
        assert!(parse_save("1:00w").is_err());
    }

    #[test]
    fn months_and_weekdays() {
        assert_eq!(parse_month("Jan").unwrap(), 1);
        assert_eq!(parse_month("mar").unwrap(), 3);
        assert_eq!(parse_month("Sept").unwrap(), 9);
        assert_eq!(parse_month("December").unwrap(), 12);
        assert!(parse_month("Ju").is_err());
        assert!(parse_month("Ma").is_err());
        assert_eq!(parse_weekday("Sun").unwrap(), Weekday::Sunday);
        assert_eq!(parse_weekday("Th").unwrap(), Weekday::Thursday);
        assert!(parse_weekday("S").is_err());
        assert!(parse_weekday("Sunday2").is_err());
    }

    #[test]
    fn day_selectors() {
        use self::DaySelector::*;

        assert_eq!(DaySelector::parse("5").unwrap(), Day(5));
        assert_eq!(
            DaySelector::parse("lastSun").unwrap(),
            LastWeekday(Weekday::Sunday),
        );
        assert_eq!(
            DaySelector::parse("Sun>=8").unwrap(),
            WeekdayOnOrAfter { weekday: Weekday::Sunday, day: 8 },
        );
        assert_eq!(
            DaySelector::parse("Fri<=1").unwrap(),
            WeekdayOnOrBefore { weekday: Weekday::Friday, day: 1 },
        );
        assert!(DaySelector::parse("32").is_err());
        assert!(DaySelector::parse("0").is_err());
        assert!(DaySelector::parse("Sun=8").is_err());
        assert!(DaySelector::parse("lastFoo").is_err());
    }

    #[test]
    fn years() {
        assert_eq!(parse_year("1967").unwrap(), 1967);
        assert_eq!(parse_to_year("only", 1967).unwrap(), Some(1967));
        assert_eq!(parse_to_year("o", 1967).unwrap(), Some(1967));
        assert_eq!(parse_to_year("max", 1967).unwrap(), None);
        assert_eq!(parse_to_year("2006", 1967).unwrap(), Some(2006));
        assert!(parse_to_year("m", 1967).is_err());
        assert!(parse_year("19x7").is_err());
    }

    #[test]
    fn until_defaults() {
        let (year, month, day, time) = parse_until(&["1883"]).unwrap();
        assert_eq!(year, 1883);
        assert_eq!(month, 1);
        assert_eq!(day, DaySelector::Day(1));
        assert_eq!(time, RuleTime::MIDNIGHT);
        let (_, month, day, time) =
            parse_until(&["1883", "Nov", "18", "12:03:58"]).unwrap();
        assert_eq!(month, 11);
        assert_eq!(day, DaySelector::Day(18));
        assert_eq!(time.seconds, 12 * 3600 + 3 * 60 + 58);
        assert!(parse_until(&[]).is_err());
    }
}
