//! Logging initialisation via tracing-subscriber.
//!
//! A plain level such as `"debug"` applies to the relay itself and to the
//! `tower_http` request spans; everything else (hyper, reqwest, rustls) is
//! held at `warn` so upstream chatter does not drown the exchange logs.
//! Full filter directives (`"info,hyper=debug"`) are used untouched.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Crates whose events follow the configured level.
const RELAY_TARGETS: &[&str] = &["chat_relay", "tower_http"];

/// Ceiling applied to all other targets when a plain level is given.
const DEPENDENCY_CEILING: LevelFilter = LevelFilter::WARN;

/// Initialise the global tracing subscriber, writing to stderr.
///
/// With `prefer_level` (a `-v` flag was given) `level` wins over `RUST_LOG`;
/// otherwise `RUST_LOG` wins and `level` is the fallback.
pub fn init(level: &str, prefer_level: bool) -> Result<(), AppError> {
    let from_level = || {
        EnvFilter::try_new(directives_for(level))
            .map_err(|e| AppError::Logger(format!("invalid log level '{level}': {e}")))
    };

    let filter = match EnvFilter::try_from_default_env() {
        Ok(env_filter) if !prefer_level => env_filter,
        Ok(env_filter) => from_level().unwrap_or(env_filter),
        Err(_) => from_level()?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| AppError::Logger(format!("failed to set subscriber: {e}")))?;

    Ok(())
}

/// Expand `level` into subscriber directives.
///
/// `"info"` becomes `"warn,chat_relay=info,tower_http=info"`. Levels quieter
/// than the dependency ceiling (`error`, `off`) apply everywhere.
pub fn directives_for(level: &str) -> String {
    if is_directive(level) {
        return level.to_string();
    }
    let Ok(relay) = parse_level(level) else {
        // Let EnvFilter produce the error message.
        return level.to_string();
    };

    let rest = relay.min(DEPENDENCY_CEILING);
    let mut out = rest.to_string();
    for target in RELAY_TARGETS {
        out.push_str(&format!(",{target}={relay}"));
    }
    out
}

/// `true` when `level` already carries per-target directives.
pub fn is_directive(level: &str) -> bool {
    level.contains(['=', ','])
}

/// Parse a single log level such as `"debug"` into a [`LevelFilter`].
pub fn parse_level(level: &str) -> Result<LevelFilter, AppError> {
    if level.is_empty() {
        return Err(AppError::Logger("log level must not be empty".into()));
    }
    level
        .parse::<LevelFilter>()
        .map_err(|_| AppError::Logger(format!("unrecognised log level: '{level}'")))
}

/// Map the number of `-v` flags to a level. `0` means "use config".
pub fn level_for_verbosity(verbosity: u8) -> Option<&'static str> {
    match verbosity {
        0 => None,
        1 => Some("warn"),
        2 => Some("info"),
        3 => Some("debug"),
        _ => Some("trace"),
    }
}
