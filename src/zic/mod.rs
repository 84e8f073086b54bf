/*!
A parser for the tzdata source format read by `zic`.

The format is line oriented. `Rule` lines define named, yearly recurring
daylight saving patterns. `Zone` lines, together with the continuation lines
that follow them, define the history of one time zone as a list of segments.
`Link` lines define alternate names for zones. See `man zic` for the full
grammar.

A [`Database`] collects the rules, zones and links of any number of tzdata
files. Parsing comes in two flavors: [`Database::parse`] stops at the first
error, while [`Database::parse_lossy`] records each error as a
[`ParseFailure`], skips the offending rule line or zone, and keeps going.

# Example

```
use tzconvert::zic::{Database, ZoneRules};

let mut db = Database::new();
db.parse("northamerica", "\
## Rule  NAME FROM TO  -  IN  ON      AT   SAVE LETTER/S
Rule    US   2007 max -  Mar Sun>=8  2:00 1:00 D
Rule    US   2007 max -  Nov Sun>=1  2:00 0    S

## Zone  NAME             STDOFF   RULES FORMAT [UNTIL]
Zone    America/New_York -4:56:02 -     LMT    1883 Nov 18 12:03:58
                         -5:00    US    E%sT

Link    America/New_York US/Eastern
")?;

let zone = db.resolve("US/Eastern").unwrap();
assert_eq!(zone.name(), "America/New_York");
assert_eq!(zone.segments().len(), 2);
assert_eq!(zone.segments()[1].rules(), &ZoneRules::Named("US".to_string()));
assert_eq!(db.rule_set("US").unwrap().rules().len(), 2);

# Ok::<(), tzconvert::Error>(())
```
*/

use std::{collections::BTreeMap, path::Path};

use crate::error::{zic::Error as ZicError, Error, ErrorContext};

use self::line::LineKind;

pub use self::{
    field::{DaySelector, RuleTime, TimeMode},
    line::tokenize,
    rule::{Rule, RuleInstant, RuleSet},
    zone::{Format, Until, Zone, ZoneRules, ZoneSegment},
};

mod field;
mod line;
mod rule;
mod zone;

/// The tzdata files read by [`Database::from_dir`], in the order they are
/// read.
pub static TZDATA_FILES: &[&str] = &[
    "africa",
    "antarctica",
    "asia",
    "australasia",
    "europe",
    "northamerica",
    "southamerica",
    "etcetera",
    "backward",
];

/// How many links may be followed when resolving a name.
const MAX_LINK_DEPTH: usize = 8;

/// The rules, zones and links parsed from a set of tzdata files.
///
/// A database is immutable once built, and is `Send` and `Sync`, so it may
/// be shared between threads converting different zones.
#[derive(Clone, Debug, Default)]
pub struct Database {
    rules: BTreeMap<String, RuleSet>,
    zones: BTreeMap<String, Zone>,
    links: BTreeMap<String, String>,
    failures: Vec<ParseFailure>,
}

impl Database {
    /// Returns a new empty database.
    pub fn new() -> Database {
        Database::default()
    }

    /// Reads the standard set of tzdata files ([`TZDATA_FILES`]) from the
    /// given directory.
    ///
    /// Files that don't exist are skipped with a warning. Errors inside the
    /// files are recorded (see [`Database::failures`]) rather than returned.
    ///
    /// # Errors
    ///
    /// This returns an error if a file exists but could not be read, or if
    /// none of the files exist.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Database, Error> {
        Database::from_dir_files(dir, TZDATA_FILES)
    }

    /// Like [`Database::from_dir`], but reads the given file names instead
    /// of the standard set.
    pub fn from_dir_files(
        dir: impl AsRef<Path>,
        files: &[&str],
    ) -> Result<Database, Error> {
        let dir = dir.as_ref();
        let mut db = Database::new();
        let mut found = 0;
        for &name in files.iter() {
            let path = dir.join(name);
            let src = match std::fs::read_to_string(&path) {
                Ok(src) => src,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    warn!("skipping missing tzdata file {}", path.display());
                    continue;
                }
                Err(err) => return Err(Error::io(err).path(path)),
            };
            debug!("parsing tzdata file {}", path.display());
            db.parse_lossy(name, &src);
            found += 1;
        }
        if found == 0 {
            let err = std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no tzdata files found in directory",
            );
            return Err(Error::io(err).path(dir));
        }
        debug!(
            "read {found} tzdata files from {}: {} zones, {} rule sets, \
             {} links, {} failures",
            dir.display(),
            db.zones.len(),
            db.rules.len(),
            db.links.len(),
            db.failures.len(),
        );
        Ok(db)
    }

    /// Parses tzdata text and adds its rules, zones and links to this
    /// database. The `file` name is only used in error messages.
    ///
    /// # Errors
    ///
    /// This returns the first error found. Everything parsed before it has
    /// already been added.
    pub fn parse(&mut self, file: &str, src: &str) -> Result<(), Error> {
        Parser::new(self, file, true).run(src)
    }

    /// Parses tzdata text like [`Database::parse`], but records errors
    /// instead of returning them.
    ///
    /// A bad rule line is skipped. A zone with any bad line is skipped as a
    /// whole, including its remaining continuation lines.
    pub fn parse_lossy(&mut self, file: &str, src: &str) {
        // The lossy parser records every error instead of returning it.
        let _ = Parser::new(self, file, false).run(src);
    }

    /// Returns every error recorded by [`Database::parse_lossy`].
    pub fn failures(&self) -> &[ParseFailure] {
        &self.failures
    }

    /// Returns the zone with the given name. Links are not followed.
    pub fn zone(&self, name: &str) -> Option<&Zone> {
        self.zones.get(name)
    }

    /// Returns the zone with the given name, following links.
    pub fn resolve(&self, name: &str) -> Option<&Zone> {
        let mut name = name;
        for _ in 0..MAX_LINK_DEPTH {
            if let Some(zone) = self.zones.get(name) {
                return Some(zone);
            }
            name = self.links.get(name)?;
        }
        None
    }

    /// Returns all zones, ordered by name.
    pub fn zones(&self) -> impl Iterator<Item = &Zone> {
        self.zones.values()
    }

    /// Returns the rule set with the given name.
    pub fn rule_set(&self, name: &str) -> Option<&RuleSet> {
        self.rules.get(name)
    }

    /// Returns all `(alias, target)` pairs, ordered by alias.
    pub fn links(&self) -> impl Iterator<Item = (&str, &str)> {
        self.links.iter().map(|(alias, target)| (&**alias, &**target))
    }

    /// Returns the target of the given link.
    pub fn link_target(&self, alias: &str) -> Option<&str> {
        self.links.get(alias).map(|target| &**target)
    }

    /// Adds a link from `alias` to `target`, replacing any existing link
    /// with the same alias.
    ///
    /// This is used to merge an externally maintained alias table into the
    /// links found in tzdata. An alias that names an existing zone is
    /// ignored.
    pub fn add_link(&mut self, alias: &str, target: &str) {
        if self.zones.contains_key(alias) {
            warn!("ignoring alias `{alias}` since a zone has that name");
            return;
        }
        self.links.insert(alias.to_string(), target.to_string());
    }
}

/// An error recorded while parsing tzdata lossily.
#[derive(Clone, Debug)]
pub struct ParseFailure {
    file: String,
    line: usize,
    zone: Option<String>,
    error: Error,
}

impl ParseFailure {
    /// The name of the file the error was found in.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// The 1-based line number the error was found on.
    pub fn line(&self) -> usize {
        self.line
    }

    /// The name of the zone that was skipped because of this error, if the
    /// error was inside a zone.
    pub fn zone(&self) -> Option<&str> {
        self.zone.as_deref()
    }

    pub fn error(&self) -> &Error {
        &self.error
    }
}

struct Parser<'a> {
    db: &'a mut Database,
    file: &'a str,
    strict: bool,
    /// A zone whose last line had an `UNTIL`, so the next line continues it.
    zone: Option<Zone>,
    /// Set after a zone fails, to skip the rest of its continuation lines.
    skipping: bool,
}

impl<'a> Parser<'a> {
    fn new(db: &'a mut Database, file: &'a str, strict: bool) -> Parser<'a> {
        Parser { db, file, strict, zone: None, skipping: false }
    }

    fn run(mut self, src: &str) -> Result<(), Error> {
        let mut number = 0;
        for (i, line) in src.lines().enumerate() {
            number = i + 1;
            let fields = match line::tokenize_impl(line) {
                Ok(fields) => fields,
                Err(err) => {
                    let zone = self.zone.take().map(|z| z.name().to_string());
                    self.skipping = zone.is_some();
                    self.fail(err.into(), number, zone)?;
                    continue;
                }
            };
            if fields.is_empty() {
                continue;
            }
            let kind = LineKind::from_keyword(fields[0]);
            if kind.is_some() {
                if let Some(zone) = self.zone.take() {
                    let name = zone.name().to_string();
                    let err = ZicError::ExpectedContinuationZoneLine {
                        name: name.as_str().into(),
                    };
                    self.fail(err.into(), number, Some(name))?;
                }
                self.skipping = false;
            } else if self.skipping {
                continue;
            }
            let (result, zone) = match (kind, self.zone.take()) {
                (_, Some(zone)) => {
                    let name = zone.name().to_string();
                    (self.continuation(zone, &fields), Some(name))
                }
                (Some(LineKind::Zone), None) => {
                    let name = fields.get(1).map(|name| name.to_string());
                    (self.first_zone_line(&fields), name)
                }
                (Some(LineKind::Rule), None) => (self.rule(&fields), None),
                (Some(LineKind::Link), None) => (self.link(&fields), None),
                (None, None) => {
                    (Err(ZicError::UnrecognizedZicLine.into()), None)
                }
            };
            if let Err(err) = result {
                self.zone = None;
                self.skipping = zone.is_some();
                self.fail(err, number, zone)?;
            }
        }
        if let Some(zone) = self.zone.take() {
            let name = zone.name().to_string();
            let err = ZicError::ExpectedContinuationZoneLine {
                name: name.as_str().into(),
            };
            self.fail(err.into(), number, Some(name))?;
        }
        Ok(())
    }

    fn fail(
        &mut self,
        err: Error,
        number: usize,
        zone: Option<String>,
    ) -> Result<(), Error> {
        let mut err = err;
        if let Some(ref name) = zone {
            let name = name.as_str().into();
            err = err.context(ZicError::FailedZone { name });
        }
        let err = err
            .context(ZicError::Line { number })
            .context(ZicError::File { name: self.file.into() });
        if self.strict {
            return Err(err);
        }
        warn!("{err}");
        self.db.failures.push(ParseFailure {
            file: self.file.to_string(),
            line: number,
            zone,
            error: err,
        });
        Ok(())
    }

    fn rule(&mut self, fields: &[&str]) -> Result<(), Error> {
        let rule =
            Rule::parse(&fields[1..]).context(ZicError::FailedRuleLine)?;
        self.db
            .rules
            .entry(rule.name().to_string())
            .or_insert_with(|| RuleSet::new(rule.name()))
            .push(rule);
        Ok(())
    }

    fn first_zone_line(&mut self, fields: &[&str]) -> Result<(), Error> {
        if fields.len() < 5 {
            return Err(ZicError::ExpectedFirstZoneFourFields.into());
        }
        let name = fields[1];
        if name.is_empty() {
            return Err(ZicError::ExpectedNonEmptyName.into());
        }
        let segment = ZoneSegment::parse(&fields[2..])
            .context(ZicError::FailedZoneFirst)?;
        self.pending(Zone::new(name, segment))
    }

    fn continuation(
        &mut self,
        mut zone: Zone,
        fields: &[&str],
    ) -> Result<(), Error> {
        if fields.len() < 3 {
            return Err(ZicError::ExpectedContinuationZoneThreeFields.into());
        }
        let segment = ZoneSegment::parse(fields)
            .context(ZicError::FailedContinuationZone)?;
        zone.push(segment)?;
        self.pending(zone)
    }

    /// Either waits for the next continuation line of `zone`, or adds it to
    /// the database if it is complete.
    fn pending(&mut self, zone: Zone) -> Result<(), Error> {
        if zone.expects_continuation() {
            self.zone = Some(zone);
            return Ok(());
        }
        if self.db.zones.contains_key(zone.name()) {
            let name = zone.name().into();
            return Err(ZicError::DuplicateZone { name }.into());
        }
        trace!(
            "parsed zone {} with {} segments",
            zone.name(),
            zone.segments().len(),
        );
        self.db.links.remove(zone.name());
        self.db.zones.insert(zone.name().to_string(), zone);
        Ok(())
    }

    fn link(&mut self, fields: &[&str]) -> Result<(), Error> {
        let &[_, target, alias] = fields else {
            return Err(ZicError::ExpectedLinkTwoFields)
                .context(ZicError::FailedLinkLine);
        };
        if target.is_empty() || alias.is_empty() {
            return Err(ZicError::ExpectedNonEmptyName)
                .context(ZicError::FailedLinkLine);
        }
        if self.db.links.contains_key(alias) {
            return Err(ZicError::DuplicateLink { name: alias.into() }.into());
        }
        self.db.links.insert(alias.to_string(), target.to_string());
        Ok(())
    }
}
