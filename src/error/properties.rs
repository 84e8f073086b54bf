use crate::error;

#[derive(Clone, Debug)]
pub(crate) enum Error {
    ExpectedUnicodeEscapeDigits,
    InvalidBuildTime { value: Box<str> },
    InvalidUnicodeEscape { code: u32 },
    Line { number: usize },
    MissingKey { key: &'static str },
}

impl From<Error> for error::Error {
    #[cold]
    #[inline(never)]
    fn from(err: Error) -> error::Error {
        error::ErrorKind::Properties(err).into()
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
            ExpectedUnicodeEscapeDigits => {
                f.write_str("expected 4 hexadecimal digits after `\\u`")
            }
            InvalidBuildTime { ref value } => write!(
                f,
                "invalid `buildTime` value `{value}`, \
                 expected an RFC 3339 timestamp",
            ),
            InvalidUnicodeEscape { code } => write!(
                f,
                "escape `\\u{code:04X}` does not form a valid codepoint",
            ),
            Line { number } => write!(f, "line {number}"),
            MissingKey { key } => write!(f, "missing required key `{key}`"),
        }
    }
}
