use crate::civil::{calendar, Weekday};

/// A civil date and time of day, without any time zone.
///
/// A `DateTime` may be built from out-of-range fields (a day of `0`, an hour
/// of `24`, a month of `13` and so on) with [`DateTime::new`]. Calling
/// [`DateTime::normalize`] carries the excess into the next larger field,
/// with floor semantics for negative values. Every other operation on this
/// type returns normalized values.
///
/// Besides the fields, a `DateTime` carries two flags. A date-only value
/// has no time of day and renders as `YYYYMMDD`. A UTC value renders with a
/// trailing `Z`. Neither flag changes any arithmetic.
///
/// Values are compared field by field, so comparisons are only meaningful
/// between normalized values.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct DateTime {
    year: i32,
    month: i32,
    day: i32,
    hour: i32,
    minute: i32,
    second: i32,
    date_only: bool,
    utc: bool,
}

/// Creates a new normalized date-only value.
///
/// # Example
///
/// ```
/// use tzconvert::civil::{date, Weekday};
///
/// assert_eq!(date(1970, 1, 1).weekday(), Weekday::Thursday);
/// assert_eq!(date(2023, 2, 29).to_string(), "20230301");
/// ```
pub fn date(year: i32, month: i32, day: i32) -> DateTime {
    DateTime { date_only: true, ..DateTime::new(year, month, day, 0, 0, 0) }
        .normalize()
}

/// Creates a new normalized date-time value.
///
/// # Example
///
/// ```
/// use tzconvert::civil::datetime;
///
/// let dt = datetime(2024, 3, 10, 24, 0, 0);
/// assert_eq!(dt.to_string(), "20240311T000000");
/// ```
pub fn datetime(
    year: i32,
    month: i32,
    day: i32,
    hour: i32,
    minute: i32,
    second: i32,
) -> DateTime {
    DateTime::new(year, month, day, hour, minute, second).normalize()
}

impl DateTime {
    /// Creates a new date-time from the given fields without normalizing
    /// them.
    pub const fn new(
        year: i32,
        month: i32,
        day: i32,
        hour: i32,
        minute: i32,
        second: i32,
    ) -> DateTime {
        DateTime {
            year,
            month,
            day,
            hour,
            minute,
            second,
            date_only: false,
            utc: false,
        }
    }

    /// Creates a normalized UTC date-time from a number of seconds since
    /// `1970-01-01T00:00:00Z`.
    pub fn from_epoch_second(seconds: i64) -> DateTime {
        let (year, month, day) =
            calendar::from_epoch_day(seconds.div_euclid(86_400));
        let secs = seconds.rem_euclid(86_400);
        DateTime {
            // Years stay well within `i32` for any `i64` second count that
            // came from an `i32` year.
            year: year as i32,
            month: i32::from(month),
            day: i32::from(day),
            hour: (secs / 3600) as i32,
            minute: (secs % 3600 / 60) as i32,
            second: (secs % 60) as i32,
            date_only: false,
            utc: true,
        }
    }

    /// Carries out-of-range fields into larger ones.
    ///
    /// Seconds carry into minutes, minutes into hours, hours into days,
    /// days into months and months into years. Negative values borrow from
    /// the next larger field.
    ///
    /// # Example
    ///
    /// ```
    /// use tzconvert::civil::DateTime;
    ///
    /// let dt = DateTime::new(2023, 13, 0, -1, 60, 61).normalize();
    /// assert_eq!(dt.to_string(), "20231231T000101");
    /// ```
    pub fn normalize(self) -> DateTime {
        let second = i64::from(self.second);
        let minute = i64::from(self.minute) + second.div_euclid(60);
        let hour = i64::from(self.hour) + minute.div_euclid(60);
        let day = i64::from(self.day) + hour.div_euclid(24);
        let month0 = i64::from(self.month) - 1;
        let year = i64::from(self.year) + month0.div_euclid(12);
        let month = (month0.rem_euclid(12) + 1) as i8;
        let (year, month, day) = calendar::from_epoch_day(
            calendar::to_epoch_day(year, month, day),
        );
        DateTime {
            year: year as i32,
            month: i32::from(month),
            day: i32::from(day),
            hour: hour.rem_euclid(24) as i32,
            minute: minute.rem_euclid(60) as i32,
            second: second.rem_euclid(60) as i32,
            date_only: self.date_only,
            utc: self.utc,
        }
    }

    /// Returns true when every field of this value is in range.
    pub fn is_normalized(&self) -> bool {
        self.normalize() == *self
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> i32 {
        self.month
    }

    pub fn day(&self) -> i32 {
        self.day
    }

    pub fn hour(&self) -> i32 {
        self.hour
    }

    pub fn minute(&self) -> i32 {
        self.minute
    }

    pub fn second(&self) -> i32 {
        self.second
    }

    /// Returns true if this value has no time of day.
    pub fn is_date_only(&self) -> bool {
        self.date_only
    }

    /// Returns true if this value is marked as being in UTC.
    pub fn is_utc(&self) -> bool {
        self.utc
    }

    /// Returns this value with the UTC marker set or cleared.
    pub fn with_utc(self, utc: bool) -> DateTime {
        DateTime { utc, ..self }
    }

    /// Returns the date of this value, without a time of day.
    pub fn date(self) -> DateTime {
        DateTime {
            hour: 0,
            minute: 0,
            second: 0,
            date_only: true,
            ..self.normalize()
        }
    }

    /// Returns this value with its time of day replaced. Out-of-range times
    /// carry into the date.
    pub fn with_time(self, hour: i32, minute: i32, second: i32) -> DateTime {
        DateTime {
            hour,
            minute,
            second,
            date_only: false,
            ..self.normalize()
        }
        .normalize()
    }

    /// Returns the number of seconds from `1970-01-01T00:00:00` to this
    /// value.
    ///
    /// This is computed directly from the fields, so it is correct even for
    /// values that have not been normalized.
    pub fn epoch_second(&self) -> i64 {
        let month0 = i64::from(self.month) - 1;
        let year = i64::from(self.year) + month0.div_euclid(12);
        let month = (month0.rem_euclid(12) + 1) as i8;
        let day = calendar::to_epoch_day(year, month, i64::from(self.day));
        day * 86_400
            + i64::from(self.hour) * 3600
            + i64::from(self.minute) * 60
            + i64::from(self.second)
    }

    /// Returns the number of days from `1970-01-01` to the date of this
    /// value.
    pub fn epoch_day(&self) -> i64 {
        self.epoch_second().div_euclid(86_400)
    }

    /// Returns the day of the week of this value.
    ///
    /// # Example
    ///
    /// ```
    /// use tzconvert::civil::{date, Weekday};
    ///
    /// assert_eq!(date(2024, 2, 25).weekday(), Weekday::Sunday);
    /// ```
    pub fn weekday(&self) -> Weekday {
        // 1970-01-01 is a Thursday.
        Weekday::Thursday.wrapping_add(self.epoch_day())
    }

    /// Returns this value moved by the given number of seconds.
    pub fn add_seconds(self, seconds: i64) -> DateTime {
        let dt = DateTime::from_epoch_second(self.epoch_second() + seconds);
        DateTime { date_only: self.date_only, utc: self.utc, ..dt }
    }

    /// Returns this value moved by the given number of days.
    pub fn add_days(self, days: i64) -> DateTime {
        self.add_seconds(days * 86_400)
    }

    /// Returns the `nth` occurrence of `weekday` in the month of this value,
    /// keeping the time of day.
    ///
    /// A positive `nth` counts forward from the first day of the month and
    /// a negative `nth` counts backward from the last day, so `-1` is the
    /// last occurrence. An `nth` past the end of the month carries into the
    /// following month.
    ///
    /// # Panics
    ///
    /// When `nth` is zero.
    ///
    /// # Example
    ///
    /// ```
    /// use tzconvert::civil::{date, Weekday};
    ///
    /// let last = date(2024, 2, 1).nth_weekday_of_month(-1, Weekday::Sunday);
    /// assert_eq!(last.day(), 25);
    /// let second = date(2007, 3, 1).nth_weekday_of_month(2, Weekday::Sunday);
    /// assert_eq!(second.day(), 11);
    /// ```
    pub fn nth_weekday_of_month(self, nth: i32, weekday: Weekday) -> DateTime {
        assert_ne!(nth, 0, "nth weekday of month must be non-zero");
        let dt = self.normalize();
        let day = if nth > 0 {
            let first = DateTime { day: 1, ..dt }.weekday();
            1 + i32::from(weekday.since(first)) + 7 * (nth - 1)
        } else {
            let last_day = i32::from(calendar::days_in_month(
                i64::from(dt.year),
                dt.month as i8,
            ));
            let last = DateTime { day: last_day, ..dt }.weekday();
            last_day - i32::from(last.since(weekday)) - 7 * (-nth - 1)
        };
        DateTime { day, ..dt }.normalize()
    }

    /// Returns the earliest date on or after `day` of this value's month
    /// that falls on `weekday`, keeping the time of day. The result may be
    /// in the following month.
    ///
    /// # Example
    ///
    /// ```
    /// use tzconvert::civil::{date, Weekday};
    ///
    /// let dt = date(2007, 3, 1).next_weekday_on_or_after(8, Weekday::Sunday);
    /// assert_eq!(dt.to_string(), "20070311");
    /// ```
    pub fn next_weekday_on_or_after(
        self,
        day: i32,
        weekday: Weekday,
    ) -> DateTime {
        let start = DateTime { day, ..self.normalize() }.normalize();
        start.add_days(i64::from(weekday.since(start.weekday())))
    }

    /// Returns the latest date on or before `day` of this value's month
    /// that falls on `weekday`, keeping the time of day. The result may be
    /// in the preceding month.
    pub fn last_weekday_on_or_before(
        self,
        day: i32,
        weekday: Weekday,
    ) -> DateTime {
        let start = DateTime { day, ..self.normalize() }.normalize();
        start.add_days(-i64::from(start.weekday().since(weekday)))
    }
}

/// Renders this value in the iCalendar `DATE` or `DATE-TIME` form.
impl core::fmt::Display for DateTime {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{:04}{:02}{:02}", self.year, self.month, self.day)?;
        if !self.date_only {
            let (h, m, s) = (self.hour, self.minute, self.second);
            write!(f, "T{h:02}{m:02}{s:02}")?;
            if self.utc {
                f.write_str("Z")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
impl quickcheck::Arbitrary for DateTime {
    fn arbitrary(g: &mut quickcheck::Gen) -> DateTime {
        let mut field = |range: i32| i32::from(i16::arbitrary(g)) % range;
        DateTime::new(
            field(3000),
            field(40),
            field(400),
            field(100),
            field(200),
            field(5000),
        )
    }
}
