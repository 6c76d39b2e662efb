//! Logging setup for the binary.
//!
//! The library logs through the `log` facade; the binary installs an
//! `env_logger` backend. `RUST_LOG` wins when set, otherwise the level comes
//! from `-q` / `-v`. Warnings (skipped files) show by default since the
//! console summary already covers the normal case.

use env_logger::Builder;
use log::LevelFilter;
use std::env;
use std::io::Write;

/// Installs the global logger. Call once, before any logging.
pub fn init_logging(verbose: u8, quiet: bool) {
    let mut builder = Builder::new();

    if env::var_os("RUST_LOG").is_some() {
        builder.parse_default_env();
    } else {
        builder.filter_level(level_for(verbose, quiet));
    }

    builder.format(|buf, record| {
        writeln!(
            buf,
            "[{} {}] {}",
            record.level(),
            record.target(),
            record.args()
        )
    });

    // A second init (e.g. from a test harness) is harmless.
    if builder.try_init().is_err() {
        log::debug!("Logger already initialized");
    }
}

/// Maps the CLI flags to a level filter.
fn level_for(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}
