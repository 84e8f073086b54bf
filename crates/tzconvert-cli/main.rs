use std::io::Write;

mod args;
mod cmd;

fn main() {
    let mut p = lexopt::Parser::from_env();
    if let Err(err) = cmd::run(&mut p) {
        if is_broken_pipe(&err) {
            std::process::exit(0);
        }
        let _ = writeln!(std::io::stderr(), "{err:#}");
        std::process::exit(1);
    }
}

/// Installs `env_logger` as the logger.
///
/// `RUST_LOG` takes precedence. Without it, only warnings and errors are
/// shown, unless `verbose` is set, in which case debug messages are shown
/// too.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let env = env_logger::Env::default().default_filter_or(default);
    let _ = env_logger::Builder::from_env(env).try_init();
}

fn is_broken_pipe(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause.downcast_ref::<std::io::Error>().map_or(false, |err| {
            err.kind() == std::io::ErrorKind::BrokenPipe
        })
    })
}
