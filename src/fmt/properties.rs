/*!
Reading and writing `key=value` properties files.

The conversion writes two such files next to the calendars: an alias table
(`aliases.properties`, one `alias=target` pair per line) and build
information (`info.properties`). Both use the escaping rules of Java
properties files, which is what the consumers of these files expect:

* `\`, `=`, `:`, `#` and `!` are escaped with a backslash, as are spaces in
keys and a leading space in values;
* tabs, newlines, carriage returns and form feeds are written as `\t`,
`\n`, `\r` and `\f`;
* every other character outside printable ASCII is written as a `\uXXXX`
escape (a surrogate pair for characters outside the basic multilingual
plane).

When reading, `#` and `!` start comment lines, a line ending in an odd
number of backslashes continues on the next line, and a key is separated
from its value by `=`, `:` or whitespace.

# Example

```
use tzconvert::fmt::properties::Aliases;

let mut aliases = Aliases::new();
aliases.insert("US/Eastern", "America/New_York");
aliases.insert("Etc/GMT+5 alias", "Etc/GMT+5");

let mut buf = String::new();
aliases.print(&mut buf)?;
assert_eq!(buf, "\
Etc/GMT+5\\ alias=Etc/GMT+5
US/Eastern=America/New_York
");
assert_eq!(Aliases::parse(&buf)?, aliases);

# Ok::<(), tzconvert::Error>(())
```
*/

use std::collections::BTreeMap;

use crate::{
    error::{properties::Error as PropError, Error, ErrorContext},
    fmt::Write,
    zic::Database,
};

/// A table of time zone aliases, mapping an alias to its target zone.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Aliases {
    map: BTreeMap<String, String>,
}

impl Aliases {
    /// Returns an empty alias table.
    pub fn new() -> Aliases {
        Aliases::default()
    }

    /// Returns the links of the given database as an alias table.
    pub fn from_database(db: &Database) -> Aliases {
        let mut aliases = Aliases::new();
        for (alias, target) in db.links() {
            aliases.insert(alias, target);
        }
        aliases
    }

    /// Parses an alias table.
    ///
    /// # Errors
    ///
    /// This returns an error when the text has an invalid `\u` escape.
    pub fn parse(src: &str) -> Result<Aliases, Error> {
        let mut aliases = Aliases::new();
        for (key, value) in parse_pairs(src)? {
            aliases.map.insert(key, value);
        }
        Ok(aliases)
    }

    /// Adds an alias, replacing any previous target for it.
    pub fn insert(&mut self, alias: &str, target: &str) {
        self.map.insert(alias.to_string(), target.to_string());
    }

    /// Returns the target of the given alias.
    pub fn get(&self, alias: &str) -> Option<&str> {
        self.map.get(alias).map(|target| &**target)
    }

    /// Returns all `(alias, target)` pairs, ordered by alias.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(alias, target)| (&**alias, &**target))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Adds every alias of this table to the given database as a link.
    pub fn merge_into(&self, db: &mut Database) {
        for (alias, target) in self.iter() {
            db.add_link(alias, target);
        }
    }

    /// Writes this table, one escaped `alias=target` line per alias.
    pub fn print<W: Write>(&self, mut wtr: W) -> Result<(), Error> {
        for (alias, target) in self.iter() {
            print_pair(&mut wtr, alias, target)?;
        }
        Ok(())
    }
}

/// Information about how a set of calendars was built.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Info {
    build_time: jiff::Timestamp,
    prodid: String,
    source: String,
}

impl Info {
    const BUILD_TIME: &'static str = "buildTime";
    const PRODID: &'static str = "prodid";
    const SOURCE: &'static str = "source";

    /// Creates build information.
    ///
    /// `source` describes where the tzdata came from, such as the name of
    /// the release.
    pub fn new(
        build_time: jiff::Timestamp,
        prodid: &str,
        source: &str,
    ) -> Info {
        Info {
            build_time,
            prodid: prodid.to_string(),
            source: source.to_string(),
        }
    }

    pub fn build_time(&self) -> jiff::Timestamp {
        self.build_time
    }

    /// The product identifier written in each calendar.
    pub fn prodid(&self) -> &str {
        &self.prodid
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parses build information.
    ///
    /// Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// This returns an error when a key is missing, when the build time is
    /// not an RFC 3339 timestamp or when the text has an invalid `\u`
    /// escape.
    ///
    /// # Example
    ///
    /// ```
    /// use tzconvert::fmt::properties::Info;
    ///
    /// let info = Info::parse("\
    /// # written by tzconvert
    /// buildTime=2024-03-10T07:00:00Z
    /// prodid=-//tzconvert//NONSGML tzdata//EN
    /// source=tzdata2024a
    /// ")?;
    /// assert_eq!(info.build_time().to_string(), "2024-03-10T07:00:00Z");
    /// assert_eq!(info.source(), "tzdata2024a");
    ///
    /// # Ok::<(), tzconvert::Error>(())
    /// ```
    pub fn parse(src: &str) -> Result<Info, Error> {
        let pairs: BTreeMap<String, String> =
            parse_pairs(src)?.into_iter().collect();
        let get = |key: &'static str| {
            pairs
                .get(key)
                .map(|value| value.as_str())
                .ok_or(PropError::MissingKey { key })
        };
        let value = get(Info::BUILD_TIME)?;
        let build_time = value.parse::<jiff::Timestamp>().with_context(|| {
            PropError::InvalidBuildTime { value: value.into() }
        })?;
        Ok(Info::new(build_time, get(Info::PRODID)?, get(Info::SOURCE)?))
    }

    /// Writes this information as properties.
    pub fn print<W: Write>(&self, mut wtr: W) -> Result<(), Error> {
        let build_time = self.build_time.to_string();
        print_pair(&mut wtr, Info::BUILD_TIME, &build_time)?;
        print_pair(&mut wtr, Info::PRODID, &self.prodid)?;
        print_pair(&mut wtr, Info::SOURCE, &self.source)
    }
}

fn print_pair<W: Write>(
    mut wtr: W,
    key: &str,
    value: &str,
) -> Result<(), Error> {
    wtr.write_str(&escape(key, true))?;
    wtr.write_char('=')?;
    wtr.write_str(&escape(value, false))?;
    wtr.write_char('\n')
}

/// Escapes a key or a value.
///
/// Spaces are escaped everywhere in a key, but only at the start of a
/// value.
fn escape(s: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, ch) in s.chars().enumerate() {
        match ch {
            ' ' if is_key || i == 0 => out.push_str("\\ "),
            '\\' | '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(ch);
            }
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x0C' => out.push_str("\\f"),
            ' '..='~' => out.push(ch),
            _ => {
                for unit in ch.encode_utf16(&mut [0; 2]).iter() {
                    out.push_str(&format!("\\u{unit:04X}"));
                }
            }
        }
    }
    out
}

/// Parses properties text into its key/value pairs, in order.
fn parse_pairs(src: &str) -> Result<Vec<(String, String)>, Error> {
    let mut pairs = vec![];
    let mut lines = src.lines().enumerate();
    while let Some((index, line)) = lines.next() {
        let number = index + 1;
        let line = line.trim_start_matches(is_whitespace);
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        // Join continuation lines. A line continues when it ends with an odd
        // number of backslashes, the last of which is dropped.
        let mut logical = String::from(line);
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some((_, next)) => {
                    logical.push_str(next.trim_start_matches(is_whitespace));
                }
                None => break,
            }
        }
        let pair = parse_pair(&logical)
            .with_context(|| PropError::Line { number })?;
        pairs.push(pair);
    }
    Ok(pairs)
}

fn parse_pair(line: &str) -> Result<(String, String), PropError> {
    // Find the end of the key: the first unescaped separator.
    let mut key_end = line.len();
    let mut escaped = false;
    for (i, ch) in line.char_indices() {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == '=' || ch == ':' || is_whitespace(ch) {
            key_end = i;
            break;
        }
    }
    let (key, rest) = line.split_at(key_end);
    let mut rest = rest.trim_start_matches(is_whitespace);
    if let Some(stripped) =
        rest.strip_prefix('=').or_else(|| rest.strip_prefix(':'))
    {
        rest = stripped.trim_start_matches(is_whitespace);
    }
    Ok((unescape(key)?, unescape(rest)?))
}

fn unescape(s: &str) -> Result<String, PropError> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    let mut high_surrogate: Option<u32> = None;
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            if let Some(code) = high_surrogate.take() {
                return Err(PropError::InvalidUnicodeEscape { code });
            }
            out.push(ch);
            continue;
        }
        let Some(escaped) = chars.next() else { break };
        let code = match escaped {
            'u' => parse_hex4(&mut chars)?,
            _ => {
                if let Some(code) = high_surrogate.take() {
                    return Err(PropError::InvalidUnicodeEscape { code });
                }
                out.push(match escaped {
                    't' => '\t',
                    'n' => '\n',
                    'r' => '\r',
                    'f' => '\x0C',
                    other => other,
                });
                continue;
            }
        };
        match (high_surrogate.take(), code) {
            (None, 0xD800..=0xDBFF) => high_surrogate = Some(code),
            (Some(high), 0xDC00..=0xDFFF) => {
                let c = 0x10000 + ((high - 0xD800) << 10) + (code - 0xDC00);
                out.push(char::from_u32(c).ok_or(
                    PropError::InvalidUnicodeEscape { code: c },
                )?);
            }
            (Some(high), _) => {
                return Err(PropError::InvalidUnicodeEscape { code: high })
            }
            (None, _) => out.push(
                char::from_u32(code)
                    .ok_or(PropError::InvalidUnicodeEscape { code })?,
            ),
        }
    }
    if let Some(code) = high_surrogate {
        return Err(PropError::InvalidUnicodeEscape { code });
    }
    Ok(out)
}

fn parse_hex4(chars: &mut core::str::Chars<'_>) -> Result<u32, PropError> {
    let mut code = 0;
    for _ in 0..4 {
        let digit = chars
            .next()
            .and_then(|ch| ch.to_digit(16))
            .ok_or(PropError::ExpectedUnicodeEscapeDigits)?;
        code = code * 16 + digit;
    }
    Ok(code)
}

fn ends_with_continuation(line: &str) -> bool {
    let backslashes = line.bytes().rev().take_while(|&b| b == b'\\').count();
    backslashes % 2 == 1
}

fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\x0C')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_reserved_characters() {
        let mut aliases = Aliases::new();
        aliases.insert("a=b:c", "#x!");
        aliases.insert(" lead", " value with spaces");
        aliases.insert("tab\tnew\nline", "back\\slash");
        aliases.insert("Amérique/Zoné", "😀");
        let mut buf = String::new();
        aliases.print(&mut buf).unwrap();
        insta::assert_snapshot!(buf, @r"
        \ lead=\ value with spaces
        Am\u00E9rique/Zon\u00E9=\uD83D\uDE00
        a\=b\:c=\#x\!
        tab\tnew\nline=back\\slash
        ");
        assert_eq!(Aliases::parse(&buf).unwrap(), aliases);
    }

    #[test]
    fn parse_java_style() {
        let aliases = Aliases::parse(
            "\
# comment
! another comment

   US/Eastern = America/New_York
US/Central:America/Chicago
US/Mountain America/Denver
US/Pacific=America/\\
    Los_Angeles
Empty
",
        )
        .unwrap();
        let got: Vec<(&str, &str)> = aliases.iter().collect();
        assert_eq!(
            got,
            [
                ("Empty", ""),
                ("US/Central", "America/Chicago"),
                ("US/Eastern", "America/New_York"),
                ("US/Mountain", "America/Denver"),
                ("US/Pacific", "America/Los_Angeles"),
            ]
        );
    }

    #[test]
    fn parse_errors() {
        let err = Aliases::parse("a=b\nc=\\u12\n").unwrap_err();
        insta::assert_snapshot!(
            err,
            @r"line 2: expected 4 hexadecimal digits after `\u`",
        );
        let err = Aliases::parse("a=\\uD800x\n").unwrap_err();
        insta::assert_snapshot!(
            err,
            @r"line 1: escape `\uD800` does not form a valid codepoint",
        );
        assert_eq!(err.category(), crate::ErrorCategory::Properties);
    }

    #[test]
    fn info_round_trip() {
        let build_time: jiff::Timestamp =
            "2024-03-10T07:00:00Z".parse().unwrap();
        let info = Info::new(build_time, "-//tzconvert//EN", "tzdata 2024a");
        let mut buf = String::new();
        info.print(&mut buf).unwrap();
        insta::assert_snapshot!(buf, @r"
        buildTime=2024-03-10T07\:00\:00Z
        prodid=-//tzconvert//EN
        source=tzdata 2024a
        ");
        assert_eq!(Info::parse(&buf).unwrap(), info);
    }

    #[test]
    fn info_errors() {
        let err = Info::parse("prodid=x\nsource=y\n").unwrap_err();
        insta::assert_snapshot!(err, @"missing required key `buildTime`");
        let src = "buildTime=yesterday\nprodid=x\nsource=y\n";
        let err = Info::parse(src).unwrap_err();
        assert_eq!(err.category(), crate::ErrorCategory::Properties);
        // The timestamp parser's own error is kept as the cause.
        let cause = "yesterday".parse::<jiff::Timestamp>().unwrap_err();
        assert_eq!(
            err.to_string(),
            format!(
                "invalid `buildTime` value `yesterday`, \
                 expected an RFC 3339 timestamp: {cause}",
            ),
        );
    }

    quickcheck::quickcheck! {
        fn prop_alias_round_trip(pairs: Vec<(String, String)>) -> bool {
            let mut aliases = Aliases::new();
            for (alias, target) in pairs.iter() {
                aliases.insert(alias, target);
            }
            let mut buf = String::new();
            aliases.print(&mut buf).unwrap();
            Aliases::parse(&buf).unwrap() == aliases
        }
    }
}
