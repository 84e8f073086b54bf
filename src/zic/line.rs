use crate::{
    error::zic::{Error, MAX_LINE_LEN},
    zic::field::is_keyword,
};

/// Splits one line of tzdata into its fields.
///
/// Fields are separated by runs of ASCII whitespace, including tabs. A `#`
/// starts a comment that runs to the end of the line. A field may be
/// wrapped in double quotes, in which case it may contain whitespace. A `#`
/// inside quotes still starts a comment, so quoting cannot be used to embed
/// one.
///
/// # Errors
///
/// This returns an error if the line is too long, contains a NUL byte or
/// has an unclosed quote.
///
/// # Example
///
/// ```
/// use tzconvert::zic::tokenize;
///
/// let fields = tokenize("Rule\tUS\t2007\tmax\t-\tMar Sun>=8 2:00 1 D #")?;
/// assert_eq!(
///     fields,
///     ["Rule", "US", "2007", "max", "-", "Mar", "Sun>=8", "2:00", "1", "D"],
/// );
/// assert!(tokenize("   # only a comment")?.is_empty());
///
/// # Ok::<(), tzconvert::Error>(())
/// ```
pub fn tokenize(line: &str) -> Result<Vec<&str>, crate::Error> {
    Ok(tokenize_impl(line)?)
}

pub(crate) fn tokenize_impl(line: &str) -> Result<Vec<&str>, Error> {
    if line.len() > MAX_LINE_LEN {
        return Err(Error::LineMaxLength);
    }
    if line.contains('\0') {
        return Err(Error::LineNul);
    }
    let line = match line.find('#') {
        Some(i) => &line[..i],
        None => line,
    };
    let is_space = |c: char| c.is_ascii_whitespace();
    let mut fields = vec![];
    let mut rest = line.trim_start_matches(is_space);
    while !rest.is_empty() {
        if let Some(quoted) = rest.strip_prefix('"') {
            let end = quoted.find('"').ok_or(Error::ExpectedCloseQuote)?;
            fields.push(&quoted[..end]);
            rest = &quoted[end + 1..];
            if !rest.is_empty() && !rest.starts_with(is_space) {
                return Err(Error::ExpectedWhitespaceAfterQuotedField);
            }
        } else {
            let end = rest.find(is_space).unwrap_or(rest.len());
            fields.push(&rest[..end]);
            rest = &rest[end..];
        }
        rest = rest.trim_start_matches(is_space);
    }
    Ok(fields)
}

/// The kind of a non-continuation tzdata line, determined by its first
/// field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum LineKind {
    Rule,
    Zone,
    Link,
}

impl LineKind {
    /// Recognizes a line keyword. Keywords may be abbreviated and are case
    /// insensitive, so `R`, `rule` and `Rule` are all `Rule` lines.
    pub(crate) fn from_keyword(word: &str) -> Option<LineKind> {
        if is_keyword(word, "Rule") {
            Some(LineKind::Rule)
        } else if is_keyword(word, "Zone") {
            Some(LineKind::Zone)
        } else if is_keyword(word, "Link") {
            Some(LineKind::Link)
        } else {
            None
        }
    }
}
