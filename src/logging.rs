//! Logger bootstrap for the binary and for tests that want log output.

use env_logger::{Builder, Env};
use log::LevelFilter;

/// Level applied to dependencies such as Bevy unless `RUST_LOG` says otherwise.
const DEPENDENCY_LEVEL: LevelFilter = LevelFilter::Warn;

/// Default `env_logger` directive: this crate at the chosen verbosity, every
/// other target at [`DEPENDENCY_LEVEL`].
#[must_use]
pub fn default_filter(verbose: bool) -> String {
    let own = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let crate_target = module_path!()
        .split("::")
        .next()
        .unwrap_or("trestle");
    format!("{DEPENDENCY_LEVEL},{crate_target}={own}").to_lowercase()
}

/// Initializes the global logger.
///
/// Session transitions and outcomes log at info; per-piece replacement and
/// spawn details need `verbose`. `RUST_LOG` replaces the default filter.
pub fn init(verbose: bool) {
    let env = Env::default().default_filter_or(default_filter(verbose));
    let mut builder = Builder::from_env(env);
    builder.format_timestamp_millis().format_target(verbose);

    if builder.try_init().is_err() {
        log::debug!("logger already installed; keeping it");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(false, "warn,trestle=info")]
    #[case(true, "warn,trestle=debug")]
    fn filter_quiets_dependencies(#[case] verbose: bool, #[case] expected: &str) {
        assert_eq!(default_filter(verbose), expected);
    }

    #[rstest]
    fn repeated_init_is_harmless() {
        init(true);
        init(false);
        log::info!("logger initialised twice");
    }
}
