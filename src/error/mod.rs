use std::sync::Arc;

pub(crate) mod properties;
pub(crate) mod tz;
pub(crate) mod zic;

/// An error that can occur in this crate.
///
/// Errors form a chain. The outermost error is the most general context
/// (for example, the file being read) and the innermost is the root cause
/// (for example, an `AT` field that could not be parsed). The `Display`
/// implementation prints the whole chain, separated by `: `.
///
/// # Introspection
///
/// The root cause of every error belongs to one [`ErrorCategory`]. Callers
/// can use [`Error::category`] (or one of the `Error::is_*` predicates) to
/// distinguish a grammar problem from an unknown rule reference without
/// matching on error messages.
///
/// # Design
///
/// There is only one error type for all operations in this crate. Parsing,
/// expansion, emission and I/O compose freely (a conversion reads files,
/// parses them and expands zones) and a single type keeps that composition
/// simple.
#[derive(Clone)]
pub struct Error {
    /// The internal representation of an error.
    ///
    /// This is in an `Arc` to make an `Error` cloneable even though it may
    /// embed a `std::io::Error`. This also keeps `Error` one word in size.
    inner: Option<Arc<ErrorInner>>,
}

#[derive(Debug)]
struct ErrorInner {
    kind: ErrorKind,
    cause: Option<Error>,
}

/// The category of the root cause of an [`Error`].
///
/// This enum may grow new variants in the future.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum ErrorCategory {
    /// A malformed tzdata line: the wrong number of fields, an unknown
    /// keyword, an overlong line, a NUL byte or an unclosed quote.
    Grammar,
    /// A zone refers to a rule set name that was never defined.
    UnknownRuleReference,
    /// A single field could not be parsed (an `AT`, `ON`, `SAVE`, `STDOFF`,
    /// `IN`, `FROM`, `TO` or `UNTIL` field, for example).
    MalformedField,
    /// A structural invariant was violated, such as a rule whose `FROM` year
    /// is after its `TO` year, or zone `UNTIL` boundaries that do not
    /// strictly increase.
    RangeInvariantViolation,
    /// Reading or writing a file failed.
    Io,
    /// Malformed `key=value` properties text.
    Properties,
    /// Any other error.
    Other,
}

impl Error {
    /// Returns the category of the root cause of this error.
    ///
    /// The root cause is the innermost error raised by this crate. Errors
    /// from other crates (such as a timestamp that `jiff` could not parse)
    /// and file path context have no category of their own.
    ///
    /// # Example
    ///
    /// ```
    /// use tzconvert::{zic::Database, ErrorCategory};
    ///
    /// let mut db = Database::new();
    /// let err = db.parse("test", "Rule US 1967 2006 - Oct\n").unwrap_err();
    /// assert_eq!(err.category(), ErrorCategory::Grammar);
    /// ```
    pub fn category(&self) -> ErrorCategory {
        self.chain()
            .filter_map(|err| err.kind().category())
            .last()
            .unwrap_or(ErrorCategory::Other)
    }

    /// Returns true when the root cause is a malformed tzdata line.
    pub fn is_grammar(&self) -> bool {
        self.category() == ErrorCategory::Grammar
    }

    /// Returns true when the root cause is a reference to an undefined rule
    /// set.
    pub fn is_unknown_rule(&self) -> bool {
        self.category() == ErrorCategory::UnknownRuleReference
    }

    /// Returns true when the root cause is a field that could not be parsed.
    pub fn is_malformed_field(&self) -> bool {
        self.category() == ErrorCategory::MalformedField
    }

    /// Returns true when the root cause is a violated range invariant.
    pub fn is_range_invariant(&self) -> bool {
        self.category() == ErrorCategory::RangeInvariantViolation
    }

    /// Returns true when the root cause is an I/O error.
    pub fn is_io(&self) -> bool {
        self.category() == ErrorCategory::Io
    }
}

impl Error {
    /// A convenience constructor for building an I/O error.
    ///
    /// Callers should always attach some kind of context to this error (like
    /// a file path).
    #[inline(never)]
    #[cold]
    pub(crate) fn io(err: std::io::Error) -> Error {
        Error::from(ErrorKind::IO(IOError { err }))
    }

    /// Contextualizes this error by associating the given file path with it.
    #[inline(never)]
    #[cold]
    pub(crate) fn path(self, path: impl Into<std::path::PathBuf>) -> Error {
        let path = FilePathError { path: path.into() };
        self.context(Error::from(ErrorKind::FilePath(path)))
    }

    pub(crate) fn context(self, consequent: impl IntoError) -> Error {
        self.context_impl(consequent.into_error())
    }

    #[inline(never)]
    #[cold]
    fn context_impl(self, consequent: Error) -> Error {
        let mut err = consequent;
        if err.inner.is_none() {
            err = Error::from(ErrorKind::Unknown);
        }
        let Some(inner) = err.inner.as_mut() else { return self };
        assert!(inner.cause.is_none(), "cause of consequence must be `None`");
        // We just created this error, so the `Arc` has one reference.
        let Some(inner) = Arc::get_mut(inner) else { return self };
        inner.cause = Some(self);
        err
    }

    fn cause(&self) -> Option<&Error> {
        self.inner.as_ref().and_then(|inner| inner.cause.as_ref())
    }

    /// Returns a chain of error values.
    ///
    /// This starts with the highest level context. The last error in the
    /// chain is always the root cause. The iterator returned is guaranteed
    /// to yield at least one error.
    fn chain(&self) -> impl Iterator<Item = &Error> {
        let mut next = Some(self);
        core::iter::from_fn(move || {
            let err = next?;
            next = err.cause();
            Some(err)
        })
    }

    /// Returns the kind of this error.
    fn kind(&self) -> &ErrorKind {
        self.inner
            .as_ref()
            .map(|inner| &inner.kind)
            .unwrap_or(&ErrorKind::Unknown)
    }
}

impl std::error::Error for Error {}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let mut it = self.chain().peekable();
        while let Some(err) = it.next() {
            core::fmt::Display::fmt(err.kind(), f)?;
            if it.peek().is_some() {
                f.write_str(": ")?;
            }
        }
        Ok(())
    }
}

impl core::fmt::Debug for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if !f.alternate() {
            core::fmt::Display::fmt(self, f)
        } else {
            let Some(ref inner) = self.inner else {
                return f
                    .debug_struct("Error")
                    .field("kind", &"None")
                    .finish();
            };
            f.debug_struct("Error")
                .field("kind", &inner.kind)
                .field("cause", &inner.cause)
                .finish()
        }
    }
}

#[derive(Debug)]
enum ErrorKind {
    FilePath(FilePathError),
    IO(IOError),
    Jiff(jiff::Error),
    Properties(self::properties::Error),
    Tz(self::tz::Error),
    Unknown,
    Zic(self::zic::Error),
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use self::ErrorKind::*;

        match *self {
            FilePath(ref err) => err.fmt(f),
            IO(ref err) => err.fmt(f),
            Jiff(ref err) => err.fmt(f),
            Properties(ref err) => err.fmt(f),
            Tz(ref err) => err.fmt(f),
            Unknown => f.write_str("unknown tzconvert error"),
            Zic(ref err) => err.fmt(f),
        }
    }
}

impl ErrorKind {
    fn category(&self) -> Option<ErrorCategory> {
        match *self {
            ErrorKind::FilePath(_)
            | ErrorKind::Jiff(_)
            | ErrorKind::Unknown => None,
            ErrorKind::IO(_) => Some(ErrorCategory::Io),
            ErrorKind::Properties(_) => Some(ErrorCategory::Properties),
            ErrorKind::Tz(ref err) => Some(err.category()),
            ErrorKind::Zic(ref err) => Some(err.category()),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error { inner: Some(Arc::new(ErrorInner { kind, cause: None })) }
    }
}

#[derive(Debug)]
struct IOError {
    err: std::io::Error,
}

impl core::fmt::Display for IOError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{}", self.err)
    }
}

#[derive(Debug)]
struct FilePathError {
    path: std::path::PathBuf,
}

impl core::fmt::Display for FilePathError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// A simple trait to encapsulate automatic conversion to `Error`.
///
/// This trait exists to make `Error::context` work without public `From`
/// impls for each of the crate's internal error kinds.
pub(crate) trait IntoError {
    fn into_error(self) -> Error;
}

impl IntoError for Error {
    #[inline(always)]
    fn into_error(self) -> Error {
        self
    }
}

impl IntoError for jiff::Error {
    #[inline(never)]
    #[cold]
    fn into_error(self) -> Error {
        Error::from(ErrorKind::Jiff(self))
    }
}

/// A trait for contextualizing error values.
///
/// This makes it easy to contextualize either `Error` or `Result<T, Error>`
/// without calling `map_err` everywhere.
pub(crate) trait ErrorContext<T, E> {
    /// Contextualize the given consequent error with this (`self`) error as
    /// the cause.
    ///
    /// This is equivalent to saying that "consequent is caused by self."
    fn context(self, consequent: impl IntoError) -> Result<T, Error>;

    /// Like `context`, but hides error construction within a closure.
    fn with_context<C: IntoError>(
        self,
        consequent: impl FnOnce() -> C,
    ) -> Result<T, Error>;
}

impl<T, E> ErrorContext<T, E> for Result<T, E>
where
    E: IntoError,
{
    fn context(self, consequent: impl IntoError) -> Result<T, Error> {
        self.map_err(|err| {
            err.into_error().context_impl(consequent.into_error())
        })
    }

    fn with_context<C: IntoError>(
        self,
        consequent: impl FnOnce() -> C,
    ) -> Result<T, Error> {
        self.map_err(|err| {
            err.into_error().context_impl(consequent().into_error())
        })
    }
}
