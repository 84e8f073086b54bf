/*!
Converting every zone of a tzdata database to `VTIMEZONE` components.

A [`Converter`] runs each zone of a [`Database`] through two stages:
expansion into transitions ([`crate::tz::expand`]) and emission of a
component ([`crate::vtimezone::emit`], which groups the transitions, builds
the observances and merges them). Errors found while parsing the tzdata
text are reported as failures of a third, earlier stage. A failure only
affects the zone it happened in, and every other zone is still converted.

The result of converting all zones is a [`Conversion`], holding the
components, the failures and a [`Report`] with statistics. It can write
itself out as a directory of calendar files.

# Example

```
use tzconvert::{
    convert::{Config, Converter},
    zic::Database,
};

let mut db = Database::new();
db.parse("northamerica", "\
Rule US 2007 max - Mar Sun>=8 2:00 1:00 D
Rule US 2007 max - Nov Sun>=1 2:00 0 S
Zone America/New_York -5:00 US E%sT
Zone America/Nowhere -5:00 Missing E%sT
Link America/New_York US/Eastern
")?;

let config = Config::new().min_year(2007);
let conversion = Converter::new(&db, config).convert_all();
assert_eq!(conversion.report().succeeded(), 1);
assert_eq!(conversion.report().failed(), 1);

let failure = &conversion.failures()[0];
assert_eq!(failure.name(), "America/Nowhere");
assert!(failure.error().is_unknown_rule());

let link = conversion.link("US/Eastern", "America/New_York")?;
assert_eq!(link.tzid(), "US/Eastern");

# Ok::<(), tzconvert::Error>(())
```
*/

use std::{
    collections::BTreeMap,
    io::Write as _,
    path::{Component, Path},
    time::{Duration, Instant},
};

use crate::{
    error::{tz::Error as TzError, Error},
    fmt::{
        ical::Printer,
        properties::{Aliases, Info},
        StdIoWrite,
    },
    tz,
    vtimezone::{self, VTimeZone},
    zic::{Database, Zone},
};

/// The product identifier written to calendars by default.
pub const DEFAULT_PRODID: &str = "-//tzconvert//NONSGML tzdata//EN";

/// How many aliases may be followed to find the zone a link points to.
const MAX_ALIAS_DEPTH: usize = 8;

/// Configuration for a conversion.
///
/// # Example
///
/// ```
/// use tzconvert::convert::Config;
///
/// let config = Config::new().min_year(1970).prodid("-//Example//EN");
/// assert_eq!(config.get_min_year(), 1970);
/// assert_eq!(config.get_max_year(), 2038);
/// ```
#[derive(Clone, Debug)]
pub struct Config {
    min_year: i32,
    max_year: i32,
    prodid: String,
}

impl Config {
    /// Returns the default configuration: transitions from 1800 up to 2038
    /// and the [`DEFAULT_PRODID`] product identifier.
    pub fn new() -> Config {
        Config {
            min_year: 1800,
            max_year: 2038,
            prodid: DEFAULT_PRODID.to_string(),
        }
    }

    /// Transitions before this year are left out of the components. The
    /// offsets they establish are still taken into account.
    pub fn min_year(self, year: i32) -> Config {
        Config { min_year: year, ..self }
    }

    /// Rules are expanded up to, but not including, this year. Rules that
    /// continue indefinitely past it are written as open ended recurrence
    /// rules.
    pub fn max_year(self, year: i32) -> Config {
        Config { max_year: year, ..self }
    }

    /// The `PRODID` written to every calendar.
    pub fn prodid(self, prodid: &str) -> Config {
        Config { prodid: prodid.to_string(), ..self }
    }

    pub fn get_min_year(&self) -> i32 {
        self.min_year
    }

    pub fn get_max_year(&self) -> i32 {
        self.max_year
    }

    pub fn get_prodid(&self) -> &str {
        &self.prodid
    }
}

impl Default for Config {
    fn default() -> Config {
        Config::new()
    }
}

/// The stage of a zone's conversion that failed.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Stage {
    /// Reading the tzdata text.
    Parse,
    /// Expanding rules into transitions.
    Expand,
    /// Grouping transitions and building the component.
    Emit,
}

impl core::fmt::Display for Stage {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(match *self {
            Stage::Parse => "parse",
            Stage::Expand => "expand",
            Stage::Emit => "emit",
        })
    }
}

/// A zone that could not be converted.
#[derive(Clone, Debug)]
pub struct ZoneFailure {
    name: String,
    stage: Stage,
    error: Error,
}

impl ZoneFailure {
    /// The name of the zone. A parse failure outside of any zone is named
    /// by its location, as `file:line`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn error(&self) -> &Error {
        &self.error
    }
}

impl core::fmt::Display for ZoneFailure {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{} ({}): {}", self.name, self.stage, self.error)
    }
}

/// Statistics about a conversion.
#[derive(Clone, Copy, Debug, Default)]
pub struct Report {
    succeeded: usize,
    failed: usize,
    transitions: usize,
    elapsed: Duration,
}

impl Report {
    /// The number of zones converted.
    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    /// The number of failures, including parse failures.
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// The total number of transitions of the converted zones.
    pub fn transitions(&self) -> usize {
        self.transitions
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

impl core::fmt::Display for Report {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "converted {} zones ({} transitions) with {} failures in {:?}",
            self.succeeded, self.transitions, self.failed, self.elapsed,
        )
    }
}

/// Converts the zones of a database.
#[derive(Clone, Debug)]
pub struct Converter<'d> {
    db: &'d Database,
    config: Config,
}

impl<'d> Converter<'d> {
    pub fn new(db: &'d Database, config: Config) -> Converter<'d> {
        Converter { db, config }
    }

    /// Converts the zone or link with the given name.
    ///
    /// A link is converted as the zone it points to, identified by the
    /// link's name.
    ///
    /// # Errors
    ///
    /// This returns an error when there is no such zone, when the zone
    /// refers to an unknown rule set, or when it has no transitions besides
    /// local mean time.
    pub fn convert_zone(&self, name: &str) -> Result<VTimeZone, Error> {
        let zone = self
            .db
            .resolve(name)
            .ok_or_else(|| TzError::UnknownZone { name: name.into() })?;
        let (vtz, _) = self.convert_staged(zone).map_err(|(_, err)| err)?;
        if zone.name() == name {
            Ok(vtz)
        } else {
            Ok(vtz.renamed(name))
        }
    }

    /// Converts every zone of the database, in order of name.
    ///
    /// Failures recorded while parsing the database are included in the
    /// result.
    pub fn convert_all(&self) -> Conversion {
        let start = Instant::now();
        let mut report = Report::default();
        let mut failures = vec![];
        for failure in self.db.failures().iter() {
            let name = match failure.zone() {
                Some(zone) => zone.to_string(),
                None => format!("{}:{}", failure.file(), failure.line()),
            };
            failures.push(ZoneFailure {
                name,
                stage: Stage::Parse,
                error: failure.error().clone(),
            });
        }
        let mut zones = BTreeMap::new();
        for zone in self.db.zones() {
            match self.convert_staged(zone) {
                Ok((vtz, transitions)) => {
                    debug!(
                        "{}: converted {transitions} transitions into {} \
                         observances",
                        zone.name(),
                        vtz.observances().len(),
                    );
                    report.transitions += transitions;
                    zones.insert(zone.name().to_string(), vtz);
                }
                Err((stage, error)) => {
                    warn!("{}: {stage} failed: {error}", zone.name());
                    failures.push(ZoneFailure {
                        name: zone.name().to_string(),
                        stage,
                        error,
                    });
                }
            }
        }
        report.succeeded = zones.len();
        report.failed = failures.len();
        report.elapsed = start.elapsed();
        info!("{report}");
        let prodid = self.config.prodid.clone();
        Conversion { zones, failures, report, prodid }
    }

    fn convert_staged(
        &self,
        zone: &Zone,
    ) -> Result<(VTimeZone, usize), (Stage, Error)> {
        let transitions = tz::expand(
            self.db,
            zone,
            self.config.min_year,
            self.config.max_year,
        )
        .map_err(|err| (Stage::Expand, err))?;
        trace!("{}: {} transitions", zone.name(), transitions.len());
        let vtz = vtimezone::emit(zone.name(), &transitions);
        if vtz.observances().is_empty() {
            let err = TzError::NoObservances { name: zone.name().into() };
            return Err((Stage::Emit, err.into()));
        }
        Ok((vtz, transitions.len()))
    }
}

/// The result of converting every zone of a database.
#[derive(Clone, Debug)]
pub struct Conversion {
    zones: BTreeMap<String, VTimeZone>,
    failures: Vec<ZoneFailure>,
    report: Report,
    prodid: String,
}

impl Conversion {
    /// Returns the converted zones, ordered by name.
    pub fn zones(&self) -> impl Iterator<Item = &VTimeZone> {
        self.zones.values()
    }

    /// Returns the converted zone with the given name.
    pub fn zone(&self, name: &str) -> Option<&VTimeZone> {
        self.zones.get(name)
    }

    pub fn failures(&self) -> &[ZoneFailure] {
        &self.failures
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    /// Returns true when every zone was converted.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Returns the component for a link from `alias` to `target`.
    ///
    /// # Errors
    ///
    /// This returns an error when the target was not converted.
    pub fn link(&self, alias: &str, target: &str) -> Result<VTimeZone, Error> {
        match self.zones.get(target) {
            Some(vtz) => Ok(vtz.renamed(alias)),
            None => Err(TzError::LinkTargetMissing {
                alias: alias.into(),
                target: target.into(),
            }
            .into()),
        }
    }

    /// Writes the conversion to a directory.
    ///
    /// Each zone and each alias is written to `<name>.ics` as a calendar
    /// holding one component. Names containing `/` are written to
    /// subdirectories. The alias table is written to `aliases.properties`
    /// and the build information to `info.properties`.
    ///
    /// Aliases pointing to other aliases are followed. An alias whose
    /// target was not converted is skipped with a warning.
    ///
    /// Returns the number of calendar files written.
    ///
    /// # Errors
    ///
    /// This returns an error when a file or directory can't be written.
    pub fn write_dir(
        &self,
        dir: &Path,
        aliases: &Aliases,
        info: &Info,
    ) -> Result<usize, Error> {
        let printer = Printer::new();
        let mut written = 0;
        for vtz in self.zones() {
            if !is_relative_name(vtz.tzid()) {
                warn!("skipping zone `{}`: not a relative name", vtz.tzid());
                continue;
            }
            self.write_calendar(&printer, dir, vtz)?;
            written += 1;
        }
        for (alias, target) in aliases.iter() {
            if !is_relative_name(alias) {
                warn!("skipping alias `{alias}`: not a relative name");
                continue;
            }
            let target = resolve_alias(aliases, &self.zones, target);
            match self.link(alias, target) {
                Ok(vtz) => {
                    self.write_calendar(&printer, dir, &vtz)?;
                    written += 1;
                }
                Err(err) => {
                    warn!("skipping alias: {err}");
                }
            }
        }
        write_file(&dir.join("aliases.properties"), |wtr| aliases.print(wtr))?;
        write_file(&dir.join("info.properties"), |wtr| info.print(wtr))?;
        debug!("wrote {written} calendars to {}", dir.display());
        Ok(written)
    }

    fn write_calendar(
        &self,
        printer: &Printer,
        dir: &Path,
        vtz: &VTimeZone,
    ) -> Result<(), Error> {
        let path = dir.join(format!("{}.ics", vtz.tzid()));
        write_file(&path, |wtr| {
            printer.print_vcalendar(vtz, &self.prodid, wtr)
        })
    }
}

/// Returns true when `name` stays below the directory it is joined to.
///
/// Only plain components are allowed, so parent directories, a leading
/// `.` and absolute paths are rejected.
fn is_relative_name(name: &str) -> bool {
    !name.is_empty()
        && Path::new(name)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

/// Follows aliases from `target` until a converted zone is found, giving up
/// after a few steps.
fn resolve_alias<'a>(
    aliases: &'a Aliases,
    zones: &BTreeMap<String, VTimeZone>,
    target: &'a str,
) -> &'a str {
    let mut name = target;
    for _ in 0..MAX_ALIAS_DEPTH {
        if zones.contains_key(name) {
            break;
        }
        match aliases.get(name) {
            Some(next) => name = next,
            None => break,
        }
    }
    name
}

/// Creates the file at `path` (and its parent directories) and fills it
/// with `print`.
fn write_file(
    path: &Path,
    print: impl FnOnce(
        &mut StdIoWrite<std::io::BufWriter<std::fs::File>>,
    ) -> Result<(), Error>,
) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|err| Error::io(err).path(parent))?;
    }
    let file = std::fs::File::create(path)
        .map_err(|err| Error::io(err).path(path))?;
    let mut wtr = StdIoWrite(std::io::BufWriter::new(file));
    print(&mut wtr).map_err(|err| err.path(path))?;
    wtr.0.flush().map_err(|err| Error::io(err).path(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TZDATA: &str = "\
Rule US 1967 2006 - Oct lastSun 2:00 0 S
Rule US 1987 2006 - Apr Sun>=1 2:00 1:00 D
Rule US 2007 max - Mar Sun>=8 2:00 1:00 D
Rule US 2007 max - Nov Sun>=1 2:00 0 S
Zone America/New_York -4:56:02 - LMT 1883 Nov 18 12:03:58
\t\t\t-5:00 US E%sT
Zone America/Broken -5:00 Nope E%sT
Zone America/Ancient -5:00:01 - LMT
Link America/New_York US/Eastern
";

    fn db() -> Database {
        let mut db = Database::new();
        db.parse("northamerica", TZDATA).unwrap();
        db
    }

    #[test]
    fn failures_are_isolated() {
        let _ = env_logger::try_init();

        let db = db();
        let conversion = Converter::new(&db, Config::new()).convert_all();
        let names: Vec<&str> = conversion.zones().map(|z| z.tzid()).collect();
        assert_eq!(names, ["America/New_York"]);
        assert!(!conversion.is_success());
        let failures: Vec<String> =
            conversion.failures().iter().map(|f| f.to_string()).collect();
        insta::assert_snapshot!(failures.join("\n"), @r"
        America/Ancient (emit): zone `America/Ancient` has no transitions in the converted years, besides local mean time
        America/Broken (expand): failed to expand transitions for zone `America/Broken`: zone refers to unknown rule set `Nope`
        ");
        let report = conversion.report();
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 2);
        assert!(report.transitions() > 0);
    }

    #[test]
    fn parse_failures_are_reported() {
        let mut db = Database::new();
        db.parse_lossy(
            "europe",
            "Rule EU 1981 max - Mar lastSun 1:00u\nZone Europe/X 1:00 - CET\n",
        );
        let conversion = Converter::new(&db, Config::new()).convert_all();
        assert_eq!(conversion.report().succeeded(), 1);
        let failure = &conversion.failures()[0];
        assert_eq!(failure.name(), "europe:1");
        assert_eq!(failure.stage(), Stage::Parse);
        assert!(failure.error().is_grammar());
    }

    #[test]
    fn convert_zone_follows_links() {
        let db = db();
        let converter = Converter::new(&db, Config::new().min_year(2007));
        let vtz = converter.convert_zone("US/Eastern").unwrap();
        assert_eq!(vtz.tzid(), "US/Eastern");
        assert_eq!(vtz.observances().len(), 2);

        let err = converter.convert_zone("Mars/Olympus_Mons").unwrap_err();
        insta::assert_snapshot!(
            err,
            @"no zone or link named `Mars/Olympus_Mons`",
        );
        let err = converter.convert_zone("America/Broken").unwrap_err();
        assert!(err.is_unknown_rule());
    }

    #[test]
    fn write_dir() {
        let db = db();
        let config = Config::new().min_year(2007).prodid("-//Test//EN");
        let conversion = Converter::new(&db, config).convert_all();
        let mut aliases = Aliases::from_database(&db);
        aliases.insert("EST5EDT", "US/Eastern");
        aliases.insert("America/Gone", "America/Missing");
        let build_time: jiff::Timestamp =
            "2024-01-01T00:00:00Z".parse().unwrap();
        let info = Info::new(build_time, "-//Test//EN", "test");

        let dir = tempfile::TempDir::new().unwrap();
        let written =
            conversion.write_dir(dir.path(), &aliases, &info).unwrap();
        assert_eq!(written, 3);

        let read = |name: &str| {
            std::fs::read_to_string(dir.path().join(name)).unwrap()
        };
        let ny = read("America/New_York.ics");
        assert!(ny.starts_with("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n"));
        assert!(ny.contains("PRODID:-//Test//EN\r\n"));
        let link = read("EST5EDT.ics");
        assert!(link.contains("TZID:EST5EDT\r\n"));
        assert!(link.contains("RRULE:FREQ=YEARLY;BYMONTH=3;BYDAY=2SU\r\n"));
        assert!(read("US/Eastern.ics").contains("TZID:US/Eastern\r\n"));
        assert!(!dir.path().join("America/Gone.ics").exists());

        let back = Aliases::parse(&read("aliases.properties")).unwrap();
        assert_eq!(back, aliases);
        assert_eq!(Info::parse(&read("info.properties")).unwrap(), info);
    }

    #[test]
    fn write_dir_stays_inside_dir() {
        let _ = env_logger::try_init();

        let db = db();
        let conversion =
            Converter::new(&db, Config::new().min_year(2007)).convert_all();
        let mut aliases = Aliases::new();
        aliases.insert("../Escaped", "America/New_York");
        aliases.insert("/tmp/Absolute", "America/New_York");
        aliases.insert("US/Fine", "America/New_York");
        let build_time: jiff::Timestamp =
            "2024-01-01T00:00:00Z".parse().unwrap();
        let info = Info::new(build_time, DEFAULT_PRODID, "test");

        let root = tempfile::TempDir::new().unwrap();
        let out = root.path().join("out");
        let written = conversion.write_dir(&out, &aliases, &info).unwrap();
        assert_eq!(written, 2);
        assert!(out.join("US/Fine.ics").exists());
        assert!(!root.path().join("Escaped.ics").exists());
        assert!(!Path::new("/tmp/Absolute.ics").exists());
    }

    #[test]
    fn relative_names() {
        assert!(is_relative_name("America/New_York"));
        assert!(is_relative_name("EST5EDT"));
        assert!(!is_relative_name(""));
        assert!(!is_relative_name(".."));
        assert!(!is_relative_name("../x"));
        assert!(!is_relative_name("America/../../x"));
        assert!(!is_relative_name("/etc/passwd"));
        assert!(!is_relative_name("./x"));
    }
}
