use tracing_subscriber::{fmt, EnvFilter};

/// Install the process-wide tracing subscriber.
///
/// Called once by the embedding binary; library components only emit events.
/// `LOG_FORMAT=json` switches to structured JSON output.
pub fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    // try_init: a second call (e.g. from tests) is a no-op
    if json {
        let _ = fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(false)
            .try_init();
    } else {
        let _ = fmt().with_env_filter(env_filter).with_target(false).try_init();
    }
}
