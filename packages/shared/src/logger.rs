//! Logging setup for the Hiroba binaries.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose logs are enabled by default in addition to the binary itself.
const DEFAULT_TARGETS: [&str; 2] = ["hiroba_server", "hiroba_shared"];

/// Initialize the tracing subscriber with the specified default log level.
///
/// `RUST_LOG` takes precedence when set. Otherwise the Hiroba crates and the
/// binary named `binary_name` log at `default_log_level`, everything else is off.
///
/// # Examples
///
/// ```no_run
/// use hiroba_shared::logger::setup_logger;
///
/// setup_logger("hiroba-server", "info");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(binary_name, default_log_level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Build the `EnvFilter` directive used when `RUST_LOG` is absent.
///
/// Binary names use dashes, tracing targets use underscores.
pub fn default_filter(binary_name: &str, default_log_level: &str) -> String {
    let binary_target = binary_name.replace('-', "_");

    let mut targets: Vec<&str> = DEFAULT_TARGETS.to_vec();
    if !targets.contains(&binary_target.as_str()) {
        targets.push(&binary_target);
    }

    targets
        .into_iter()
        .map(|target| format!("{target}={default_log_level}"))
        .collect::<Vec<_>>()
        .join(",")
}
