//! Tracing subscriber setup for the CLI.
//!
//! Application events under the `fxconv` target are off unless `--verbose`
//! is given; `RUST_LOG` overrides the default directive. Output goes to
//! stderr so rendered conversion state on stdout stays clean.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

const APP_TARGET: &str = "fxconv";

fn verbosity(verbose: bool) -> (LevelFilter, &'static str) {
    if verbose {
        (LevelFilter::DEBUG, "debug")
    } else {
        (LevelFilter::OFF, "off")
    }
}

pub fn init_logging(verbose: bool) {
    let (level_filter, directive) = verbosity(verbose);
    let app_filter = Targets::new().with_target(APP_TARGET, level_filter);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .pretty()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(app_filter)
        .with(env_filter)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(verbosity(true), (LevelFilter::DEBUG, "debug"));
        assert_eq!(verbosity(false), (LevelFilter::OFF, "off"));
    }
}
