use std::sync::Once;

use tracing::Level;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Installs the global subscriber once. `RUST_LOG` wins when set; otherwise
/// `verbosity` picks the crate's level (0 = info, 1 = debug, 2+ = trace).
pub fn init(verbosity: u8) {
    INIT.call_once(|| {
        let level = match verbosity {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("info,preview_surface={level}")));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_names(true)
            .compact()
            .init();
    });
}
