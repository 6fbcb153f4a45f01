use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Mutex, Once};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

const LOG_FILE: &str = "drive_core.log";

/// Install the process-wide subscriber: stderr plus an append-only log file
/// in `data_dir`. `RUST_LOG` overrides the default `info` filter. Later calls
/// are no-ops, and an already installed global subscriber wins.
pub fn init_logging(data_dir: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

        let file_layer = OpenOptions::new()
            .create(true)
            .append(true)
            .open(Path::new(data_dir).join(LOG_FILE))
            .ok()
            .map(|file| {
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file))
            });

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(file_layer)
            .try_init();
    });
}
