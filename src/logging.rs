//! Tracing subscriber setup.

use tracing_subscriber::{fmt, EnvFilter};

/// Pick the default level from `-v`/`-q`; `RUST_LOG` wins when set.
pub fn default_level(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

pub fn init(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbose, quiet)));

    // A subscriber may already be installed (tests); keep the existing one.
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
