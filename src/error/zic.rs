use crate::error::{self, ErrorCategory};

// `man zic` says that the max line length including the line terminator is
// 2048. `str::lines` doesn't include the terminator, so we subtract 1.
pub(crate) const MAX_LINE_LEN: usize = 2047;

#[derive(Clone, Debug)]
pub(crate) enum Error {
    DuplicateLink { name: Box<str> },
    DuplicateZone { name: Box<str> },
    ExpectedCloseQuote,
    ExpectedContinuationZoneLine { name: Box<str> },
    ExpectedContinuationZoneThreeFields,
    ExpectedFirstZoneFourFields,
    ExpectedLinkTwoFields,
    ExpectedNonEmptyFormat,
    ExpectedNonEmptyName,
    ExpectedRuleNineFields { got: usize },
    ExpectedUntilYear,
    ExpectedWhitespaceAfterQuotedField,
    FailedContinuationZone,
    FailedLinkLine,
    FailedParseDay,
    FailedParseFieldAt,
    FailedParseFieldFrom,
    FailedParseFieldIn,
    FailedParseFieldOn,
    FailedParseFieldRules,
    FailedParseFieldSave,
    FailedParseFieldStdOff,
    FailedParseFieldTo,
    FailedParseFieldUntil,
    FailedParseHour,
    FailedParseMinute,
    FailedParseSecond,
    FailedParseYear,
    FailedRuleLine,
    FailedZone { name: Box<str> },
    FailedZoneFirst,
    File { name: Box<str> },
    InvalidDayOfMonth { day: i64 },
    InvalidMinute { minute: i64 },
    InvalidRuleYear { start: i32, end: i32 },
    InvalidSecond { second: i64 },
    Line { number: usize },
    LineMaxLength,
    LineNul,
    TooManyTimeComponents,
    UnrecognizedAtTimeSuffix,
    UnrecognizedDayOfMonthFormat,
    UnrecognizedDayOfWeek,
    UnrecognizedMonthName,
    UnrecognizedSaveTimeSuffix,
    UnrecognizedZicLine,
    UntilNotIncreasing,
}

impl Error {
    /// Returns the category of this error when it is the root cause of a
    /// chain.
    ///
    /// Context-only variants (like `Line` or `FailedRuleLine`) never appear
    /// as a root cause. They are classified as `Other`.
    pub(crate) fn category(&self) -> ErrorCategory {
        use self::Error::*;

        match *self {
            DuplicateLink { .. }
            | DuplicateZone { .. }
            | ExpectedCloseQuote
            | ExpectedContinuationZoneLine { .. }
            | ExpectedContinuationZoneThreeFields
            | ExpectedFirstZoneFourFields
            | ExpectedLinkTwoFields
            | ExpectedRuleNineFields { .. }
            | ExpectedWhitespaceAfterQuotedField
            | LineMaxLength
            | LineNul
            | UnrecognizedZicLine => ErrorCategory::Grammar,
            ExpectedNonEmptyFormat
            | ExpectedNonEmptyName
            | ExpectedUntilYear
            | FailedParseDay
            | FailedParseHour
            | FailedParseMinute
            | FailedParseSecond
            | FailedParseYear
            | InvalidDayOfMonth { .. }
            | InvalidMinute { .. }
            | InvalidSecond { .. }
            | TooManyTimeComponents
            | UnrecognizedAtTimeSuffix
            | UnrecognizedDayOfMonthFormat
            | UnrecognizedDayOfWeek
            | UnrecognizedMonthName
            | UnrecognizedSaveTimeSuffix => ErrorCategory::MalformedField,
            InvalidRuleYear { .. } | UntilNotIncreasing => {
                ErrorCategory::RangeInvariantViolation
            }
            FailedContinuationZone
            | FailedLinkLine
            | FailedParseFieldAt
            | FailedParseFieldFrom
            | FailedParseFieldIn
            | FailedParseFieldOn
            | FailedParseFieldRules
            | FailedParseFieldSave
            | FailedParseFieldStdOff
            | FailedParseFieldTo
            | FailedParseFieldUntil
            | FailedRuleLine
            | FailedZone { .. }
            | FailedZoneFirst
            | File { .. }
            | Line { .. } => ErrorCategory::Other,
        }
    }
}

impl From<Error> for error::Error {
    #[cold]
    #[inline(never)]
    fn from(err: Error) -> error::Error {
        error::ErrorKind::Zic(err).into()
    }
}

impl error::IntoError for Error {
    fn into_error(self) -> error::Error {
        self.into()
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use self::Error::*;

        match *self {
            DuplicateLink { ref name } => {
                write!(f, "found duplicate link with name `{name}`")
            }
            DuplicateZone { ref name } => {
                write!(f, "found duplicate zone with name `{name}`")
            }
            ExpectedCloseQuote => {
                f.write_str("found unclosed quote for field")
            }
            ExpectedContinuationZoneLine { ref name } => write!(
                f,
                "expected continuation zone line for `{name}`, \
                 but found a new line kind or end of data instead",
            ),
            ExpectedContinuationZoneThreeFields => f.write_str(
                "expected continuation `Zone` line to have at least 3 fields",
            ),
            ExpectedFirstZoneFourFields => f.write_str(
                "expected first `Zone` line to have at least 4 fields \
                 after `Zone`",
            ),
            ExpectedLinkTwoFields => {
                f.write_str("expected exactly 2 fields after `Link`")
            }
            ExpectedNonEmptyFormat => {
                f.write_str("`FORMAT` field for zone cannot be empty")
            }
            ExpectedNonEmptyName => {
                f.write_str("`NAME` field cannot be empty")
            }
            ExpectedRuleNineFields { got } => write!(
                f,
                "expected exactly 9 fields for rule, but found {got} fields",
            ),
            ExpectedUntilYear => f.write_str("expected at least a year"),
            ExpectedWhitespaceAfterQuotedField => {
                f.write_str("expected whitespace after quoted field")
            }
            FailedContinuationZone => {
                f.write_str("failed to parse continuation `Zone` line")
            }
            FailedLinkLine => f.write_str("failed to parse `Link` line"),
            FailedParseDay => f.write_str("failed to parse day"),
            FailedParseFieldAt => f.write_str("failed to parse `AT` field"),
            FailedParseFieldFrom => {
                f.write_str("failed to parse `FROM` field")
            }
            FailedParseFieldIn => f.write_str("failed to parse `IN` field"),
            FailedParseFieldOn => f.write_str("failed to parse `ON` field"),
            FailedParseFieldRules => {
                f.write_str("failed to parse `RULES` field")
            }
            FailedParseFieldSave => {
                f.write_str("failed to parse `SAVE` field")
            }
            FailedParseFieldStdOff => {
                f.write_str("failed to parse `STDOFF` field")
            }
            FailedParseFieldTo => f.write_str("failed to parse `TO` field"),
            FailedParseFieldUntil => {
                f.write_str("failed to parse `UNTIL` field")
            }
            FailedParseHour => f.write_str("failed to parse hour"),
            FailedParseMinute => f.write_str("failed to parse minute"),
            FailedParseSecond => f.write_str("failed to parse second"),
            FailedParseYear => f.write_str("failed to parse year"),
            FailedRuleLine => f.write_str("failed to parse `Rule` line"),
            FailedZone { ref name } => write!(f, "invalid zone `{name}`"),
            FailedZoneFirst => {
                f.write_str("failed to parse first `Zone` line")
            }
            File { ref name } => write!(f, "{name}"),
            InvalidDayOfMonth { day } => write!(
                f,
                "day of month {day} is not in the required range of 1..=31",
            ),
            InvalidMinute { minute } => write!(
                f,
                "minute {minute} is not in the required range of 0..=59",
            ),
            InvalidRuleYear { start, end } => write!(
                f,
                "found start year={start} to be greater than end year={end}",
            ),
            InvalidSecond { second } => write!(
                f,
                "second {second} is not in the required range of 0..=59",
            ),
            Line { number } => write!(f, "line {number}"),
            LineMaxLength => write!(
                f,
                "found line with length that exceeds \
                 max length of {MAX_LINE_LEN}",
            ),
            LineNul => f.write_str(
                "found line with NUL byte, which isn't allowed",
            ),
            TooManyTimeComponents => f.write_str(
                "expected at most hours, minutes and seconds in time",
            ),
            UnrecognizedAtTimeSuffix => f.write_str(
                "unrecognized `AT` time suffix, \
                 expected one of `w`, `s`, `u`, `g` or `z`",
            ),
            UnrecognizedDayOfMonthFormat => f.write_str(
                "unrecognized format for day-of-month, \
                 expected a number, `lastDAY`, `DAY>=N` or `DAY<=N`",
            ),
            UnrecognizedDayOfWeek => {
                f.write_str("unrecognized day of the week")
            }
            UnrecognizedMonthName => f.write_str("unrecognized month name"),
            UnrecognizedSaveTimeSuffix => f.write_str(
                "unrecognized `SAVE` time suffix, expected `s` or `d`",
            ),
            UnrecognizedZicLine => f.write_str(
                "unrecognized zic line, expected `Rule`, `Zone` or `Link`",
            ),
            UntilNotIncreasing => f.write_str(
                "zone `UNTIL` boundaries must be strictly increasing",
            ),
        }
    }
}
