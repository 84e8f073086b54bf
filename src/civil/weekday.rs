/// A representation for the day of the week.
///
/// The default representation follows the tzdata and iCalendar conventions
/// of starting the week on Sunday, with offsets `0` (Sunday) through `6`
/// (Saturday).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    /// All weekdays, starting with Sunday.
    pub const ALL: [Weekday; 7] = [
        Weekday::Sunday,
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
    ];

    /// Convert an offset to a structured `Weekday`.
    ///
    /// The offset should be from a scheme where the first day of the week
    /// is Sunday and starts numbering at `0`. Any integer is accepted. It is
    /// reduced modulo `7` with floor semantics.
    ///
    /// # Example
    ///
    /// ```
    /// use tzconvert::civil::Weekday;
    ///
    /// assert_eq!(Weekday::from_sunday_zero_offset(0), Weekday::Sunday);
    /// assert_eq!(Weekday::from_sunday_zero_offset(4), Weekday::Thursday);
    /// assert_eq!(Weekday::from_sunday_zero_offset(-1), Weekday::Saturday);
    /// ```
    pub fn from_sunday_zero_offset(offset: i64) -> Weekday {
        // `rem_euclid(7)` is always in `0..7`.
        Weekday::ALL[offset.rem_euclid(7) as usize]
    }

    /// Returns this weekday as an offset in the range `0..=6`, where Sunday
    /// is `0`.
    pub fn to_sunday_zero_offset(self) -> i8 {
        self as i8
    }

    /// Adds the given number of days to this weekday, wrapping around.
    ///
    /// # Example
    ///
    /// ```
    /// use tzconvert::civil::Weekday;
    ///
    /// assert_eq!(Weekday::Saturday.wrapping_add(1), Weekday::Sunday);
    /// assert_eq!(Weekday::Sunday.wrapping_add(-1), Weekday::Saturday);
    /// assert_eq!(Weekday::Monday.wrapping_add(14), Weekday::Monday);
    /// ```
    pub fn wrapping_add(self, days: i64) -> Weekday {
        Weekday::from_sunday_zero_offset(
            i64::from(self.to_sunday_zero_offset()) + days,
        )
    }

    /// Returns the number of days from `other` forward to `self`, in the
    /// range `0..=6`.
    ///
    /// # Example
    ///
    /// ```
    /// use tzconvert::civil::Weekday;
    ///
    /// assert_eq!(Weekday::Monday.since(Weekday::Sunday), 1);
    /// assert_eq!(Weekday::Sunday.since(Weekday::Monday), 6);
    /// assert_eq!(Weekday::Friday.since(Weekday::Friday), 0);
    /// ```
    pub fn since(self, other: Weekday) -> i8 {
        (self.to_sunday_zero_offset() - other.to_sunday_zero_offset())
            .rem_euclid(7)
    }

    /// Returns the full English name of this weekday.
    pub fn name(self) -> &'static str {
        match self {
            Weekday::Sunday => "Sunday",
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
        }
    }

    /// Returns the two letter code used by iCalendar `BYDAY` rule parts.
    pub fn ical_code(self) -> &'static str {
        match self {
            Weekday::Sunday => "SU",
            Weekday::Monday => "MO",
            Weekday::Tuesday => "TU",
            Weekday::Wednesday => "WE",
            Weekday::Thursday => "TH",
            Weekday::Friday => "FR",
            Weekday::Saturday => "SA",
        }
    }
}

#[cfg(test)]
impl quickcheck::Arbitrary for Weekday {
    fn arbitrary(g: &mut quickcheck::Gen) -> Weekday {
        Weekday::from_sunday_zero_offset(i64::from(u8::arbitrary(g)))
    }
}
