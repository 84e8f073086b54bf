use std::{fmt::Debug, io::Write};

use anyhow::Context;
use lexopt::{Arg, Parser, ValueExt};
use tabwriter::TabWriter;

/// A type that can be configured from command line flags.
///
/// Commands usually combine a few of these, for example a set of flags
/// shared by several commands plus the flags specific to one of them.
pub trait Configurable: Debug {
    /// Tries to consume `arg`, reading its value from `p` if it needs one.
    ///
    /// Returns `false` when `arg` isn't recognized, so that the next target
    /// may try it.
    fn configure(
        &mut self,
        p: &mut Parser,
        arg: &mut Arg,
    ) -> anyhow::Result<bool>;

    /// Returns the documentation of every flag this target recognizes.
    fn usage(&self) -> &[Usage];
}

/// Documentation for a single flag.
#[derive(Clone, Copy, Debug)]
pub struct Usage {
    /// The flag as it appears in help output, e.g., `-v, --verbose`.
    pub flag: &'static str,
    /// A one line description, shown by `-h`.
    pub short: &'static str,
    /// A longer description, shown by `--help`.
    pub long: &'static str,
}

impl Usage {
    pub const fn new(
        flag: &'static str,
        short: &'static str,
        long: &'static str,
    ) -> Usage {
        Usage { flag, short, long }
    }
}

/// Feeds every remaining argument of `p` to `targets`.
///
/// `-h` and `--help` print `usage` followed by the documentation of every
/// flag, by way of returning it as an error.
pub fn configure(
    p: &mut Parser,
    usage: &str,
    targets: &mut [&mut dyn Configurable],
) -> anyhow::Result<()> {
    while let Some(arg) = p.next()? {
        if let Arg::Short('h') | Arg::Long("help") = arg {
            let long = matches!(arg, Arg::Long("help"));
            let usages: Vec<Usage> = targets
                .iter()
                .flat_map(|t| t.usage().iter().copied())
                .collect();
            anyhow::bail!("{}", render_help(usage, &usages, long)?);
        }
        // An `Arg` borrows from the parser for long flags, but targets need
        // the parser too, so long flag names get copied out first.
        let (long, arg) = match arg {
            Arg::Long(name) => (name.to_string(), None),
            Arg::Short(c) => (String::new(), Some(Arg::Short(c))),
            Arg::Value(value) => (String::new(), Some(Arg::Value(value))),
        };
        let mut arg = arg.unwrap_or(Arg::Long(&long));
        let mut recognized = false;
        for t in targets.iter_mut() {
            if t.configure(p, &mut arg)? {
                recognized = true;
                break;
            }
        }
        if !recognized {
            return Err(arg.unexpected().into());
        }
    }
    Ok(())
}

/// Returns the next argument as a command name.
///
/// When there is no next argument, or it asks for help, `usage` is returned
/// as an error.
pub fn next_as_command(
    usage: &str,
    p: &mut Parser,
) -> anyhow::Result<String> {
    let usage = usage.trim();
    let arg = match p.next()? {
        Some(arg) => arg,
        None => anyhow::bail!("{usage}"),
    };
    match arg {
        Arg::Value(cmd) => Ok(cmd.string()?),
        Arg::Short('h') | Arg::Long("help") => anyhow::bail!("{usage}"),
        arg => Err(arg.unexpected().into()),
    }
}

/// Parses the value of `flag` with `FromStr`.
pub fn parse<T>(p: &mut Parser, flag: &'static str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display + Send + Sync + 'static,
{
    let value = p.value().context(flag)?;
    let value = value.string().context(flag)?;
    value.parse().map_err(|err| anyhow::anyhow!("{flag}: {err}"))
}

fn render_help(
    usage: &str,
    usages: &[Usage],
    long: bool,
) -> anyhow::Result<String> {
    let mut out = String::from(usage.trim());
    if usages.is_empty() {
        return Ok(out);
    }
    out.push_str("\n\nOPTIONS:\n");
    if long {
        for u in usages.iter() {
            out.push_str("    ");
            out.push_str(u.flag);
            out.push('\n');
            for line in u.long.trim().lines() {
                if !line.is_empty() {
                    out.push_str("        ");
                    out.push_str(line);
                }
                out.push('\n');
            }
            out.push('\n');
        }
        return Ok(out.trim_end().to_string());
    }
    let mut wtr = TabWriter::new(vec![]).padding(4);
    for u in usages.iter() {
        writeln!(wtr, "    {}\t{}", u.flag, u.short)?;
    }
    let table = wtr
        .into_inner()
        .map_err(|err| anyhow::anyhow!("failed to align flags: {err}"))?;
    out.push_str(&String::from_utf8(table)?);
    Ok(out.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Flags {
        name: Option<String>,
        verbose: bool,
        values: Vec<String>,
    }

    impl Configurable for Flags {
        fn configure(
            &mut self,
            p: &mut Parser,
            arg: &mut Arg,
        ) -> anyhow::Result<bool> {
            match *arg {
                Arg::Long("name") => {
                    self.name = Some(parse(p, "--name")?);
                }
                Arg::Short('v') | Arg::Long("verbose") => {
                    self.verbose = true;
                }
                Arg::Value(ref mut value) => {
                    self.values.push(std::mem::take(value).string()?);
                }
                _ => return Ok(false),
            }
            Ok(true)
        }

        fn usage(&self) -> &[Usage] {
            &[]
        }
    }

    #[test]
    fn configure_every_kind_of_argument() {
        let mut p = Parser::from_args(["--name", "x", "-v", "a", "b"]);
        let mut flags = Flags::default();
        configure(&mut p, "usage", &mut [&mut flags]).unwrap();
        assert_eq!(flags.name.as_deref(), Some("x"));
        assert!(flags.verbose);
        assert_eq!(flags.values, ["a", "b"]);

        let mut p = Parser::from_args(["--verbose"]);
        let mut flags = Flags::default();
        configure(&mut p, "usage", &mut [&mut flags]).unwrap();
        assert!(flags.verbose);
    }

    #[test]
    fn configure_rejects_unknown_flags() {
        for unknown in ["--bogus", "-q"] {
            let mut p = Parser::from_args([unknown]);
            let mut flags = Flags::default();
            let err =
                configure(&mut p, "usage", &mut [&mut flags]).unwrap_err();
            assert!(err.to_string().contains(unknown), "{err}");
        }
    }

    #[test]
    fn configure_help() {
        let mut p = Parser::from_args(["--help"]);
        let mut flags = Flags::default();
        let err =
            configure(&mut p, "\nusage\n", &mut [&mut flags]).unwrap_err();
        assert_eq!(err.to_string(), "usage");
    }
}
