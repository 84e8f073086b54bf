use crate::error::{self, ErrorCategory};

#[derive(Clone, Debug)]
pub(crate) enum Error {
    ExpandZone { name: Box<str> },
    LinkTargetMissing { alias: Box<str>, target: Box<str> },
    NoObservances { name: Box<str> },
    UnknownRule { name: Box<str> },
    UnknownZone { name: Box<str> },
}

impl Error {
    pub(crate) fn category(&self) -> ErrorCategory {
        match *self {
            Error::UnknownRule { .. } => ErrorCategory::UnknownRuleReference,
            Error::ExpandZone { .. }
            | Error::LinkTargetMissing { .. }
            | Error::NoObservances { .. }
            | Error::UnknownZone { .. } => ErrorCategory::Other,
        }
    }
}

impl From<Error> for error::Error {
    #[cold]
    #[inline(never)]
    fn from(err: Error) -> error::Error {
        error::ErrorKind::Tz(err).into()
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
            ExpandZone { ref name } => {
                write!(f, "failed to expand transitions for zone `{name}`")
            }
            LinkTargetMissing { ref alias, ref target } => write!(
                f,
                "link `{alias}` points to `{target}`, \
                 which is not a known zone",
            ),
            NoObservances { ref name } => write!(
                f,
                "zone `{name}` has no transitions in the converted years, \
                 besides local mean time",
            ),
            UnknownRule { ref name } => {
                write!(f, "zone refers to unknown rule set `{name}`")
            }
            UnknownZone { ref name } => {
                write!(f, "no zone or link named `{name}`")
            }
        }
    }
}
