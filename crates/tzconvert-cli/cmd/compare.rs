use std::{
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::Context;
use lexopt::{Arg, Parser};
use tabwriter::TabWriter;
use tzconvert::{compare::compare, zic::Database};

use crate::args::{self, Usage};

use super::Years;

const USAGE: &'static str = r#"
Compare the transitions of two tzdata directories.

USAGE:
    tzconvert compare <tzdata-dir> <reference-tzdata-dir>

Every zone in either directory is expanded over the same range of years, and
one line is printed per difference: a zone present on only one side, a zone
that failed to expand on one side, an onset present on only one side or an
onset whose offset differs. Differences are not errors, so the exit status is
zero unless a directory couldn't be read.

This is useful to review what a new tzdata release changes:

    tzconvert compare tzdata2024b tzdata2024a --start-year 2020
"#;

pub fn run(p: &mut Parser) -> anyhow::Result<()> {
    let mut config = Config::default();
    let mut years = Years::default();
    args::configure(p, USAGE, &mut [&mut config, &mut years])?;
    years.check()?;
    crate::init_logging(config.verbose);

    let ours = read_database(config.tzdata()?)?;
    let theirs = read_database(config.reference()?)?;
    let mismatches = compare(&ours, &theirs, years.start, years.end);

    let mut wtr = TabWriter::new(std::io::stdout().lock());
    for mismatch in mismatches.iter() {
        writeln!(wtr, "{mismatch}")?;
    }
    wtr.flush()?;
    log::info!("found {} differences", mismatches.len());
    Ok(())
}

fn read_database(dir: &Path) -> anyhow::Result<Database> {
    let db = Database::from_dir(dir).with_context(|| {
        format!("failed to read tzdata from {}", dir.display())
    })?;
    for failure in db.failures() {
        log::warn!(
            "{}:{}: {}",
            dir.join(failure.file()).display(),
            failure.line(),
            failure.error(),
        );
    }
    Ok(db)
}

#[derive(Debug, Default)]
struct Config {
    tzdata: Option<PathBuf>,
    reference: Option<PathBuf>,
    verbose: bool,
}

impl Config {
    fn tzdata(&self) -> anyhow::Result<&Path> {
        self.tzdata.as_deref().context("missing path to tzdata directory")
    }

    fn reference(&self) -> anyhow::Result<&Path> {
        self.reference
            .as_deref()
            .context("missing path to reference tzdata directory")
    }
}

impl args::Configurable for Config {
    fn configure(
        &mut self,
        _: &mut Parser,
        arg: &mut Arg,
    ) -> anyhow::Result<bool> {
        match *arg {
            Arg::Short('v') | Arg::Long("verbose") => {
                self.verbose = true;
            }
            Arg::Value(ref mut value) => {
                if self.tzdata.is_none() {
                    let path = PathBuf::from(std::mem::take(value));
                    self.tzdata = Some(path);
                } else if self.reference.is_none() {
                    let path = PathBuf::from(std::mem::take(value));
                    self.reference = Some(path);
                } else {
                    return Ok(false);
                }
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn usage(&self) -> &[Usage] {
        const USAGES: &'static [Usage] = &[Usage::new(
            "-v, --verbose",
            "Add more output.",
            r#"
Shows debug log messages, such as each file read. Setting `RUST_LOG` overrides
this.
"#,
        )];
        USAGES
    }
}
