use super::JULIAN_CUTOVER_YEAR;

const CUTOVER: i64 = JULIAN_CUTOVER_YEAR as i64;

pub(crate) fn is_leap_year(year: i64) -> bool {
    if year <= CUTOVER {
        year.rem_euclid(4) == 0
    } else {
        year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
    }
}

pub(crate) fn days_in_month(year: i64, month: i8) -> i8 {
    assert!((1..=12).contains(&month), "invalid month {month}");
    if month == 2 {
        if is_leap_year(year) {
            29
        } else {
            28
        }
    } else {
        30 | (month ^ (month >> 3))
    }
}

/// Returns the number of days in the months of the given year before the
/// given month.
pub(crate) fn days_before_month(leap: bool, month: i8) -> i64 {
    const CUMULATIVE: [i64; 12] =
        [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];
    let days = CUMULATIVE[usize::from(month.unsigned_abs() - 1)];
    if leap && month > 2 {
        days + 1
    } else {
        days
    }
}

/// Returns the number of leap years in the half open range `[1, year)`.
///
/// For years less than `1`, this is negative such that the difference
/// between any two calls is the number of leap years between them.
fn leap_years_before(year: i64) -> i64 {
    let y = year - 1;
    let julian = y.min(CUTOVER).div_euclid(4);
    if y <= CUTOVER {
        return julian;
    }
    let gregorian = (y.div_euclid(4) - CUTOVER.div_euclid(4))
        - (y.div_euclid(100) - CUTOVER.div_euclid(100))
        + (y.div_euclid(400) - CUTOVER.div_euclid(400));
    julian + gregorian
}

/// Returns the number of days from `0001-01-01` to the first day of the
/// given year. This is negative for years before `1`.
fn days_before_year(year: i64) -> i64 {
    365 * (year - 1) + leap_years_before(year)
}

/// Returns the number of days since `1970-01-01` for the given date.
///
/// The day given may be outside the range of days in the month, in which
/// case it carries into the adjacent months.
pub(crate) fn to_epoch_day(year: i64, month: i8, day: i64) -> i64 {
    days_before_year(year) - days_before_year(1970)
        + days_before_month(is_leap_year(year), month)
        + (day - 1)
}

/// Returns the `(year, month, day)` corresponding to the given number of
/// days since `1970-01-01`.
pub(crate) fn from_epoch_day(epoch_day: i64) -> (i64, i8, i8) {
    let target = epoch_day + days_before_year(1970);
    // An estimate using the mean Gregorian year, fixed up below. It is never
    // off by more than a couple of years, even far before the cutover.
    let mut year = 1 + (target * 400).div_euclid(146_097);
    while days_before_year(year) > target {
        year -= 1;
    }
    while days_before_year(year + 1) <= target {
        year += 1;
    }
    let mut remaining = target - days_before_year(year);
    let mut month = 1;
    loop {
        let len = i64::from(days_in_month(year, month));
        if remaining < len {
            break;
        }
        remaining -= len;
        month += 1;
    }
    // `remaining` is less than the length of a month here.
    (year, month, remaining as i8 + 1)
}
