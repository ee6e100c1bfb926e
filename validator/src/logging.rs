//! Log output for the validator binary.
//!
//! The library emits records through the `log` facade. The binary installs a
//! `tracing-subscriber` formatter on stderr and bridges `log` records into it,
//! filtered by `RUST_LOG` when set and by the verbosity flags otherwise.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

/// Maps the `-v`/`-q` flags to a level filter.
///
/// # Examples
///
/// ```
/// use bundle_validator::logging::level_for;
/// use tracing_subscriber::filter::LevelFilter;
///
/// assert_eq!(level_for(0, false), LevelFilter::INFO);
/// assert_eq!(level_for(2, false), LevelFilter::TRACE);
/// assert_eq!(level_for(0, true), LevelFilter::WARN);
/// ```
#[must_use]
pub const fn level_for(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::WARN;
    }
    match verbosity {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Builds the filter from optional `RUST_LOG`-style directives, falling back
/// to `level` for everything they do not name.
#[must_use]
pub fn build_filter(level: LevelFilter, directives: Option<&str>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.into())
        .parse_lossy(directives.unwrap_or_default())
}

/// Installs the stderr subscriber and the `log` bridge.
///
/// # Errors
///
/// Returns [`TryInitError`] when a global subscriber or logger is already set.
pub fn init(verbosity: u8, quiet: bool) -> Result<(), TryInitError> {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(level_for(verbosity, quiet), directives.as_deref());
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time(),
        )
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, false, LevelFilter::INFO)]
    #[case(1, false, LevelFilter::DEBUG)]
    #[case(3, false, LevelFilter::TRACE)]
    #[case(0, true, LevelFilter::WARN)]
    fn maps_flags_to_levels(#[case] verbosity: u8, #[case] quiet: bool, #[case] expected: LevelFilter) {
        assert_eq!(level_for(verbosity, quiet), expected);
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    fn flag_level_applies_without_directives(#[case] directives: Option<&str>) {
        let filter = build_filter(LevelFilter::WARN, directives);

        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn directives_can_raise_the_level() {
        let filter = build_filter(LevelFilter::INFO, Some("bundle_validator=trace"));

        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));
    }
}
