use crate::{
    civil::{self, days_before_month, Weekday},
    vtimezone::{ByDay, RecurrenceRule},
    zic::DaySelector,
};

/// Returns the `BY` parts of a yearly recurrence rule matching the dates
/// selected by `day` in `month`, moved by `shift` days.
///
/// The shift is the number of days between the date a rule nominally fires
/// on and the local date of the transition, which differ when the rule's
/// time is measured in another time mode or is at or past `24:00`.
///
/// A weekday selector matches one date within a window of seven candidate
/// dates. The window moves with the shift, and so does the weekday. When
/// the moved window stays within one month it is expressed with `BYMONTH`,
/// a `BYDAY` position or a `BYMONTHDAY` list. When it crosses into the
/// adjacent month it is expressed with a `BYYEARDAY` list, counted from the
/// start of the year before March and from the end of the year afterwards,
/// so that it holds in both leap and common years.
///
/// `None` is returned when no rule can express the dates: the window
/// crosses a year boundary or contains a day that is only in February in
/// leap years.
pub(crate) fn pattern(
    day: DaySelector,
    month: i8,
    shift: i64,
) -> Option<RecurrenceRule> {
    // Rule times are at most a couple of days from midnight.
    if shift.abs() > 7 {
        return None;
    }
    let shift = shift as i32;
    let (weekday, window) = match day {
        DaySelector::Day(d) => {
            if shift == 0 {
                return Some(RecurrenceRule {
                    by_month: Some(month),
                    ..RecurrenceRule::default()
                });
            }
            let slot = Slot::start(month, i32::from(d)).shift(shift)?;
            let mut rule = RecurrenceRule {
                by_month: Some(slot.month()),
                ..RecurrenceRule::default()
            };
            rule.by_month_day.push(slot.month_day());
            return Some(rule);
        }
        DaySelector::LastWeekday(wd) => {
            let window: Vec<Slot> =
                (1..=7).map(|nth| Slot::end(month, nth)).collect();
            (wd, window)
        }
        DaySelector::WeekdayOnOrAfter { weekday, day } => {
            let first = i32::from(day);
            let window: Vec<Slot> =
                (first..first + 7).map(|d| Slot::start(month, d)).collect();
            (weekday, window)
        }
        DaySelector::WeekdayOnOrBefore { weekday, day } => {
            let last = i32::from(day);
            let window: Vec<Slot> =
                (last - 6..=last).map(|d| Slot::start(month, d)).collect();
            (weekday, window)
        }
    };
    let weekday = weekday.wrapping_add(i64::from(shift));
    let window = window
        .into_iter()
        .map(|slot| slot.shift(shift))
        .collect::<Option<Vec<Slot>>>()?;
    match window_month(&window) {
        Some(month) => Some(within_month(month, &window, weekday)),
        None => across_months(&window, weekday),
    }
}

/// Expresses a window of dates that all fall in `month`.
fn within_month(
    month: i8,
    window: &[Slot],
    weekday: Weekday,
) -> RecurrenceRule {
    let mut rule = RecurrenceRule {
        by_month: Some(month),
        ..RecurrenceRule::default()
    };
    let mut days: Vec<i8> =
        window.iter().map(|slot| slot.month_day()).collect();
    days.sort_by_key(|&d| (d < 0, d.abs()));
    let first = days[0];
    let last = days[days.len() - 1];
    // Seven consecutive days, all counted from the same end of the month.
    let contiguous = days.len() == 7
        && days.windows(2).all(|w| {
            w[1].signum() == w[0].signum() && w[1] - w[0] == w[0].signum()
        });
    let nth = if !contiguous {
        None
    } else if first > 0 && (first - 1) % 7 == 0 {
        Some((first - 1) / 7 + 1)
    } else if first < 0 && (-first - 1) % 7 == 0 {
        Some(-((-first - 1) / 7 + 1))
    } else if first > 0 && month != 2 {
        let dim = civil::days_in_month(2001, month);
        match dim - last {
            0 => Some(-1),
            7 => Some(-2),
            14 => Some(-3),
            _ => None,
        }
    } else {
        None
    };
    match nth {
        Some(nth) => rule.by_day = Some(ByDay { nth: Some(nth), weekday }),
        None => {
            rule.by_month_day = days;
            rule.by_day = Some(ByDay { nth: None, weekday });
        }
    }
    rule
}

/// Expresses a window of dates spanning two months by their day of the year.
fn across_months(
    window: &[Slot],
    weekday: Weekday,
) -> Option<RecurrenceRule> {
    let mut days = window
        .iter()
        .map(|slot| slot.year_day())
        .collect::<Option<Vec<i16>>>()?;
    days.sort_by_key(|&d| (d < 0, d));
    Some(RecurrenceRule {
        by_year_day: days,
        by_day: Some(ByDay { nth: None, weekday }),
        ..RecurrenceRule::default()
    })
}

/// Returns the month shared by every date of the window, if any.
fn window_month(window: &[Slot]) -> Option<i8> {
    let month = window.first()?.month();
    let same_kind =
        window.windows(2).all(|w| w[0].is_start() == w[1].is_start());
    if same_kind && window.iter().all(|slot| slot.month() == month) {
        Some(month)
    } else {
        None
    }
}

/// A date that falls on the same day every year.
///
/// Days in February are counted from the end of the month when they were
/// selected relative to its end, since its length varies. Every other
/// month has a fixed length, so its days are always counted from the start.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Slot {
    /// The given day of the month, counted from 1.
    Start { month: i8, day: i32 },
    /// The given day of the month, counted back from its last day at 1.
    End { month: i8, nth: i32 },
}

impl Slot {
    fn start(month: i8, day: i32) -> Slot {
        Slot::Start { month, day }
    }

    fn end(month: i8, nth: i32) -> Slot {
        if month == 2 {
            Slot::End { month, nth }
        } else {
            Slot::Start { month, day: fixed_days_in_month(month) + 1 - nth }
        }
    }

    fn month(&self) -> i8 {
        match *self {
            Slot::Start { month, .. } | Slot::End { month, .. } => month,
        }
    }

    fn is_start(&self) -> bool {
        matches!(*self, Slot::Start { .. })
    }

    /// The value of this date in a `BYMONTHDAY` list.
    fn month_day(&self) -> i8 {
        match *self {
            Slot::Start { day, .. } => day as i8,
            Slot::End { nth, .. } => -(nth as i8),
        }
    }

    /// The value of this date in a `BYYEARDAY` list. Days in leap-year-only
    /// positions have none.
    fn year_day(&self) -> Option<i16> {
        match *self {
            Slot::Start { month, day } if month <= 2 => {
                if month == 2 && day > 28 {
                    return None;
                }
                let yday = days_before_month(false, month) + i64::from(day);
                Some(yday as i16)
            }
            Slot::Start { month, day } => {
                let yday = days_before_month(false, month) + i64::from(day);
                Some((yday - 366) as i16)
            }
            // The last day of February is always 307 days from the end of
            // the year.
            Slot::End { nth, .. } => Some(-(306 + nth) as i16),
        }
    }

    /// Moves this date by the given number of days.
    ///
    /// Returns `None` when the result is in another year or when it can't
    /// be pinned to one date in both leap and common years.
    fn shift(self, days: i32) -> Option<Slot> {
        let slot = match self {
            Slot::Start { month, day } => {
                Slot::Start { month, day: day + days }
            }
            Slot::End { month, nth } => Slot::End { month, nth: nth - days },
        };
        slot.normalize()
    }

    fn normalize(self) -> Option<Slot> {
        match self {
            Slot::Start { month, day } if day < 1 => {
                let prev = previous_month(month)?;
                Slot::end(prev, 1 - day).normalize()
            }
            Slot::Start { month: 2, day } if day > 28 => None,
            Slot::Start { month, day } if day > fixed_days_in_month(month) => {
                let next = next_month(month)?;
                Slot::start(next, day - fixed_days_in_month(month)).normalize()
            }
            Slot::End { month: 2, nth } if nth < 1 => {
                Slot::start(3, 1 - nth).normalize()
            }
            Slot::End { month: 2, nth } if nth > 28 => None,
            slot => Some(slot),
        }
    }
}

/// The length of a month in a common year.
fn fixed_days_in_month(month: i8) -> i32 {
    i32::from(civil::days_in_month(2001, month))
}

fn previous_month(month: i8) -> Option<i8> {
    if month > 1 {
        Some(month - 1)
    } else {
        None
    }
}

fn next_month(month: i8) -> Option<i8> {
    if month < 12 {
        Some(month + 1)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use crate::civil::Weekday::*;

    use super::*;

    fn render(day: DaySelector, month: i8, shift: i64) -> String {
        match pattern(day, month, shift) {
            Some(rule) => rule.to_string(),
            None => "none".to_string(),
        }
    }

    #[test]
    fn unshifted() {
        use DaySelector::*;

        insta::assert_snapshot!(render(Day(15), 4, 0), @"FREQ=YEARLY;BYMONTH=4");
        insta::assert_snapshot!(
            render(WeekdayOnOrAfter { weekday: Sunday, day: 8 }, 3, 0),
            @"FREQ=YEARLY;BYMONTH=3;BYDAY=2SU",
        );
        insta::assert_snapshot!(
            render(WeekdayOnOrAfter { weekday: Sunday, day: 1 }, 11, 0),
            @"FREQ=YEARLY;BYMONTH=11;BYDAY=1SU",
        );
        insta::assert_snapshot!(
            render(LastWeekday(Sunday), 10, 0),
            @"FREQ=YEARLY;BYMONTH=10;BYDAY=-1SU",
        );
        insta::assert_snapshot!(
            render(LastWeekday(Friday), 2, 0),
            @"FREQ=YEARLY;BYMONTH=2;BYDAY=-1FR",
        );
        // Sun>=25 in a 31 day month is the last Sunday.
        insta::assert_snapshot!(
            render(WeekdayOnOrAfter { weekday: Sunday, day: 25 }, 3, 0),
            @"FREQ=YEARLY;BYMONTH=3;BYDAY=-1SU",
        );
        // Sun>=17 in a 30 day month is the second to last Sunday.
        insta::assert_snapshot!(
            render(WeekdayOnOrAfter { weekday: Sunday, day: 17 }, 9, 0),
            @"FREQ=YEARLY;BYMONTH=9;BYDAY=-2SU",
        );
        insta::assert_snapshot!(
            render(WeekdayOnOrAfter { weekday: Saturday, day: 2 }, 4, 0),
            @"FREQ=YEARLY;BYMONTH=4;BYMONTHDAY=2,3,4,5,6,7,8;BYDAY=SA",
        );
        // Sun<=25 is the window ending on the 25th.
        insta::assert_snapshot!(
            render(WeekdayOnOrBefore { weekday: Sunday, day: 25 }, 3, 0),
            @"FREQ=YEARLY;BYMONTH=3;BYMONTHDAY=19,20,21,22,23,24,25;BYDAY=SU",
        );
    }

    #[test]
    fn shifted_within_month() {
        use DaySelector::*;

        insta::assert_snapshot!(
            render(Day(15), 4, 1),
            @"FREQ=YEARLY;BYMONTH=4;BYMONTHDAY=16",
        );
        insta::assert_snapshot!(
            render(WeekdayOnOrAfter { weekday: Sunday, day: 8 }, 3, -1),
            @"FREQ=YEARLY;BYMONTH=3;BYMONTHDAY=7,8,9,10,11,12,13;BYDAY=SA",
        );
        // Saturday after the first Friday is the first Saturday on or
        // after the 2nd.
        insta::assert_snapshot!(
            render(WeekdayOnOrAfter { weekday: Friday, day: 1 }, 4, 1),
            @"FREQ=YEARLY;BYMONTH=4;BYMONTHDAY=2,3,4,5,6,7,8;BYDAY=SA",
        );
        // The day before the last Sunday of February.
        insta::assert_snapshot!(
            render(LastWeekday(Sunday), 2, -1),
            @"FREQ=YEARLY;BYMONTH=2;BYMONTHDAY=-2,-3,-4,-5,-6,-7,-8;BYDAY=SA",
        );
        insta::assert_snapshot!(
            render(LastWeekday(Sunday), 10, -1),
            @"FREQ=YEARLY;BYMONTH=10;BYMONTHDAY=24,25,26,27,28,29,30;BYDAY=SA",
        );
    }

    #[test]
    fn shifted_across_month_boundary() {
        use DaySelector::*;

        insta::assert_snapshot!(
            render(Day(1), 3, -1),
            @"FREQ=YEARLY;BYMONTH=2;BYMONTHDAY=-1",
        );
        insta::assert_snapshot!(
            render(Day(30), 4, 1),
            @"FREQ=YEARLY;BYMONTH=5;BYMONTHDAY=1",
        );
        // The Saturday before the first Sunday of April can be in March.
        insta::assert_snapshot!(
            render(WeekdayOnOrAfter { weekday: Sunday, day: 1 }, 4, -1),
            @"FREQ=YEARLY;BYYEARDAY=-276,-275,-274,-273,-272,-271,-270;BYDAY=SA",
        );
        // The Monday after the last Sunday of October can be in November.
        insta::assert_snapshot!(
            render(LastWeekday(Sunday), 10, 1),
            @"FREQ=YEARLY;BYYEARDAY=-67,-66,-65,-64,-63,-62,-61;BYDAY=MO",
        );
        // The Monday after the last Sunday of February can be on March 1st.
        insta::assert_snapshot!(
            render(LastWeekday(Sunday), 2, 1),
            @"FREQ=YEARLY;BYYEARDAY=-312,-311,-310,-309,-308,-307,-306;BYDAY=MO",
        );
        insta::assert_snapshot!(
            render(WeekdayOnOrAfter { weekday: Sunday, day: 1 }, 2, -1),
            @"FREQ=YEARLY;BYYEARDAY=31,32,33,34,35,36,37;BYDAY=SA",
        );
    }

    #[test]
    fn inexpressible() {
        use DaySelector::*;

        // Crosses into the previous year.
        let first_sunday = WeekdayOnOrAfter { weekday: Sunday, day: 1 };
        assert_eq!(render(first_sunday, 1, -1), "none");
        // Crosses into the next year.
        assert_eq!(render(LastWeekday(Sunday), 12, 1), "none");
        // February 29th only exists in leap years.
        let fourth_sunday = WeekdayOnOrAfter { weekday: Sunday, day: 22 };
        assert_eq!(render(fourth_sunday, 2, 1), "none");
        assert_eq!(render(Day(28), 2, 1), "none");
        assert_eq!(render(Day(1), 1, 30), "none");
    }
}
