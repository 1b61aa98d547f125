//! Helpers to parse CLI arguments in the accompanying
//! binary.
//!
//! APIs here shouldn't be considered stable / used as a
//! library.

pub use clap::{App, AppSettings, Arg, SubCommand};
pub use inflector::Inflector;
use tracing_subscriber::EnvFilter;

#[macro_export]
macro_rules! args_parser {
    ($name:expr) => {{
        $crate::cli::App::new($name)
            .version(clap::crate_version!())
            .author(clap::crate_authors!())
    }};
}

#[macro_export]
macro_rules! arg {
    ($name:expr) => {{
        use $crate::cli::Inflector;
        $crate::cli::Arg::with_name($name).value_name(&$name.to_screaming_snake_case())
    }};
}

#[macro_export]
macro_rules! opt {
    ($name:expr) => {{
        use $crate::cli::Inflector;
        $crate::cli::Arg::with_name($name)
            .long(&$name.to_kebab_case())
            .value_name(&$name.to_screaming_snake_case())
    }};
}

/// Level of the stderr subscriber when `RUST_LOG` is unset.
/// A verbose run log already prints warnings to stdout.
pub fn default_log_level(verbose: bool) -> &'static str {
    if verbose {
        "error"
    } else {
        "warn"
    }
}

/// Installs a stderr `tracing` subscriber filtered by
/// `RUST_LOG`, else by [`default_log_level`].
pub fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_level(verbose)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
