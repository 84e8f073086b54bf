use std::path::{Path, PathBuf};

use anyhow::Context;
use lexopt::{Arg, Parser};
use tzconvert::{
    convert::{self, Converter},
    fmt::properties::{Aliases, Info},
    zic::Database,
};

use crate::args::{self, Usage};

use super::Years;

const USAGE: &'static str = r#"
Convert a tzdata directory into iCalendar files.

USAGE:
    tzconvert convert <tzdata-dir> <output-dir>
    tzconvert convert --no-generate <tzdata-dir>

Every zone in the tzdata source files (`africa`, `europe`, `northamerica` and
so on) found in <tzdata-dir> is converted to a VCALENDAR holding a single
VTIMEZONE, and written to `<output-dir>/<zone>.ics`. Every link (and every
alias given with --aliases) gets a copy of its target's calendar under its own
name. Finally, `aliases.properties` and `info.properties` are written next to
the calendars.

A zone that fails to convert doesn't stop the others. The failures are printed
to stderr once everything else has been written, and the exit status is
non-zero if there were any.

To fetch the latest tzdata release and convert it:

    mkdir tzdata
    cd tzdata
    curl -LO 'https://data.iana.org/time-zones/tzdata-latest.tar.gz'
    tar xf tzdata-latest.tar.gz
    cd ..
    tzconvert convert tzdata /tmp/zoneinfo-ics
"#;

pub fn run(p: &mut Parser) -> anyhow::Result<()> {
    let mut config = Config::default();
    let mut years = Years::default();
    args::configure(p, USAGE, &mut [&mut config, &mut years])?;
    years.check()?;
    crate::init_logging(config.verbose);

    let tzdata = config.tzdata()?;
    let mut db = Database::from_dir(tzdata).with_context(|| {
        format!("failed to read tzdata from {}", tzdata.display())
    })?;
    if let Some(ref path) = config.aliases {
        read_aliases(path)?.merge_into(&mut db);
    }
    let aliases = Aliases::from_database(&db);

    let prodid = config.prodid.as_deref().unwrap_or(convert::DEFAULT_PRODID);
    let converter = Converter::new(
        &db,
        convert::Config::new()
            .min_year(years.start)
            .max_year(years.end)
            .prodid(prodid),
    );
    let conversion = converter.convert_all();
    if config.generate {
        let outdir = config.outdir()?;
        let source = match config.source {
            Some(ref source) => source.clone(),
            None => default_source(tzdata),
        };
        let info = Info::new(jiff::Timestamp::now(), prodid, &source);
        let written =
            conversion.write_dir(outdir, &aliases, &info).with_context(|| {
                format!("failed to write calendars to {}", outdir.display())
            })?;
        log::info!("wrote {written} calendars to {}", outdir.display());
    }

    for failure in conversion.failures() {
        eprintln!("{failure}");
    }
    println!("{}", conversion.report());
    if !conversion.is_success() {
        anyhow::bail!(
            "conversion finished with {} failures",
            conversion.report().failed(),
        );
    }
    Ok(())
}

fn read_aliases(path: &Path) -> anyhow::Result<Aliases> {
    let src = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let aliases = Aliases::parse(&src)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(aliases)
}

/// Returns the release named in the `version` file of the tzdata directory,
/// falling back to the directory itself.
fn default_source(tzdata: &Path) -> String {
    match std::fs::read_to_string(tzdata.join("version")) {
        Ok(version) if !version.trim().is_empty() => {
            format!("tzdata{}", version.trim())
        }
        _ => tzdata.display().to_string(),
    }
}

#[derive(Debug)]
struct Config {
    tzdata: Option<PathBuf>,
    outdir: Option<PathBuf>,
    prodid: Option<String>,
    aliases: Option<PathBuf>,
    source: Option<String>,
    generate: bool,
    verbose: bool,
}

impl Config {
    fn tzdata(&self) -> anyhow::Result<&Path> {
        self.tzdata.as_deref().context("missing path to tzdata directory")
    }

    fn outdir(&self) -> anyhow::Result<&Path> {
        self.outdir.as_deref().context("missing path to output directory")
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            tzdata: None,
            outdir: None,
            prodid: None,
            aliases: None,
            source: None,
            generate: true,
            verbose: false,
        }
    }
}

impl args::Configurable for Config {
    fn configure(
        &mut self,
        p: &mut Parser,
        arg: &mut Arg,
    ) -> anyhow::Result<bool> {
        match *arg {
            Arg::Long("prodid") => {
                self.prodid = Some(args::parse(p, "--prodid")?);
            }
            Arg::Long("aliases") => {
                self.aliases =
                    Some(PathBuf::from(p.value().context("--aliases")?));
            }
            Arg::Long("source") => {
                self.source = Some(args::parse(p, "--source")?);
            }
            Arg::Long("no-generate") => {
                self.generate = false;
            }
            Arg::Short('v') | Arg::Long("verbose") => {
                self.verbose = true;
            }
            Arg::Value(ref mut value) => {
                if self.tzdata.is_none() {
                    let path = PathBuf::from(std::mem::take(value));
                    self.tzdata = Some(path);
                } else if self.outdir.is_none() {
                    let path = PathBuf::from(std::mem::take(value));
                    self.outdir = Some(path);
                } else {
                    return Ok(false);
                }
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn usage(&self) -> &[Usage] {
        const USAGES: &'static [Usage] = &[
            Usage::new(
                "--prodid <id>",
                "Set the PRODID of generated calendars.",
                r#"
Sets the PRODID property written at the top of every generated calendar, and
recorded in `info.properties`. Defaults to `-//tzconvert//NONSGML tzdata//EN`.
"#,
            ),
            Usage::new(
                "--aliases <file>",
                "Read additional aliases from a properties file.",
                r#"
Reads `alias=target` pairs from the given file, in the same format as the
`aliases.properties` file this command writes. A calendar is written for each
alias whose target (possibly through other aliases) was converted. Aliases
read this way take precedence over links of the same name, and an alias with
the name of a zone is ignored.
"#,
            ),
            Usage::new(
                "--source <label>",
                "Describe where the tzdata came from.",
                r#"
Sets the `source` recorded in `info.properties`. Defaults to the release named
in the `version` file of the tzdata directory, e.g., `tzdata2024a`, or to the
tzdata directory itself when there is no such file.
"#,
            ),
            Usage::new(
                "--no-generate",
                "Convert without writing anything.",
                r#"
Converts every zone and reports failures, but doesn't write any files. The
output directory isn't required when this is set.
"#,
            ),
            Usage::new(
                "-v, --verbose",
                "Add more output.",
                r#"
Shows debug log messages, such as each file read and each zone converted.
Setting `RUST_LOG` overrides this.
"#,
            ),
        ];
        USAGES
    }
}
