use std::io::IsTerminal;
use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

pub const LOG_ENV: &str = "MONTHBOOK_LOG";

/// Install the global subscriber. Logs go to stderr so stdout carries only
/// prompts and the report. `MONTHBOOK_LOG` wins over `verbosity`.
pub fn init(verbosity: u8) {
    INIT.call_once(|| {
        let fallback = match verbosity {
            0 => "monthbook=warn",
            1 => "monthbook=info",
            _ => "monthbook=debug",
        };
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));

        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_ansi(std::io::stderr().is_terminal())
            .init();
    });
}
