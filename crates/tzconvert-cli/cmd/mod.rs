use lexopt::{Arg, Parser};

use crate::args::{self, Usage};

mod compare;
mod convert;

const USAGE: &'static str = "\
Converts IANA tzdata source files into iCalendar VTIMEZONE components.

USAGE:
    tzconvert <command> ...

COMMANDS:
    convert       Convert a tzdata directory into .ics files
    compare       Compare the transitions of two tzdata directories
";

pub fn run(p: &mut Parser) -> anyhow::Result<()> {
    let cmd = args::next_as_command(USAGE, p)?;
    match &*cmd {
        "convert" => convert::run(p),
        "compare" => compare::run(p),
        unk => anyhow::bail!("unrecognized command '{}'", unk),
    }
}

/// The range of years to expand transitions for, shared by every command.
#[derive(Debug)]
struct Years {
    start: i32,
    end: i32,
}

impl Years {
    fn check(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.start <= self.end,
            "start year {} is after end year {}",
            self.start,
            self.end,
        );
        Ok(())
    }
}

impl Default for Years {
    fn default() -> Years {
        let config = tzconvert::convert::Config::new();
        Years { start: config.get_min_year(), end: config.get_max_year() }
    }
}

impl args::Configurable for Years {
    fn configure(
        &mut self,
        p: &mut Parser,
        arg: &mut Arg,
    ) -> anyhow::Result<bool> {
        match *arg {
            Arg::Long("start-year") => {
                self.start = args::parse(p, "--start-year")?;
            }
            Arg::Long("end-year") => {
                self.end = args::parse(p, "--end-year")?;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn usage(&self) -> &[Usage] {
        const USAGES: &'static [Usage] = &[
            Usage::new(
                "--start-year <year>",
                "The first year to emit transitions for.",
                r#"
The first year to emit transitions for. Transitions before January 1 of this
year are dropped, but the offsets in effect at that time are kept. Defaults to
1800.
"#,
            ),
            Usage::new(
                "--end-year <year>",
                "Expand rules up to this year.",
                r#"
Daylight saving rules are expanded up to, but not including, this year. Rules
that continue indefinitely are still expressed as open ended recurrence rules
where possible. Defaults to 2038.
"#,
            ),
        ];
        USAGES
    }
}
