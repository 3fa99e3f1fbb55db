use std::env;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter applied when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "info,snipbin=info";

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter; `LOG_JSON=true` switches the human-readable output to JSON lines
/// for log aggregation.
pub fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))?;

    let registry = tracing_subscriber::registry().with(filter);

    let json_output = env::var("LOG_JSON").is_ok_and(|value| value == "true");
    if json_output {
        registry.with(fmt::layer().json()).init();
    } else {
        registry
            .with(fmt::layer().pretty().with_file(true).with_line_number(true))
            .init();
    }

    Ok(())
}
