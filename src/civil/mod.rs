/*!
Calendar arithmetic on civil (zone-less) date-times.

Everything in this module uses the calendar that tzdata-derived iCalendar
data has historically been generated with: a proleptic calendar whose leap
year rule changes at [`JULIAN_CUTOVER_YEAR`]. Years up to and including the
cutover year use the Julian rule (every fourth year is a leap year) and
later years use the Gregorian rule. The days dropped in September 1752 are
*not* modelled. The day count is consistent with the leap year rule, so
weekdays advance without a gap across the cutover.

Weekdays are computed from a count of days since 1970-01-01, which is a
Thursday. No platform calendar is consulted.
*/

pub use self::{
    datetime::{date, datetime, DateTime},
    weekday::Weekday,
};

mod calendar;
mod datetime;
mod weekday;

pub(crate) use self::calendar::days_before_month;

/// The last year that uses the Julian leap year rule.
pub const JULIAN_CUTOVER_YEAR: i32 = 1752;

/// Returns true if the given year is a leap year.
///
/// # Example
///
/// ```
/// use tzconvert::civil::is_leap_year;
///
/// assert!(is_leap_year(1700));
/// assert!(!is_leap_year(1800));
/// assert!(!is_leap_year(1900));
/// assert!(is_leap_year(2000));
/// assert!(is_leap_year(2024));
/// ```
pub fn is_leap_year(year: i32) -> bool {
    calendar::is_leap_year(i64::from(year))
}

/// Returns the number of days in the given month of the given year.
///
/// # Panics
///
/// When `month` is not in the range `1..=12`.
pub fn days_in_month(year: i32, month: i8) -> i8 {
    calendar::days_in_month(i64::from(year), month)
}
