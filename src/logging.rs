//! Tracing subscriber setup for the binaries

use anyhow::Result;
use std::path::Path;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "rust_trip_planner=info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber
///
/// With a `log_dir`, structured JSON logs go to a daily rolling file named
/// `<file_prefix>.YYYY-MM-DD` in that directory. Without one, human-readable
/// logs go to stderr so stdout stays free for command output.
pub fn init_logging(log_dir: Option<&Path>, file_prefix: &str) -> Result<()> {
    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = tracing_appender::rolling::daily(dir, file_prefix);

            tracing_subscriber::registry()
                .with(env_filter())
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(file_appender)
                        .with_ansi(false)
                        .with_target(true)
                        .with_thread_ids(true)
                        .with_file(true)
                        .with_line_number(true)
                        .json(),
                )
                .try_init()?;

            info!(dir = %dir.display(), file_prefix, "File logging initialized");
        }
        None => {
            tracing_subscriber::registry()
                .with(env_filter())
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(false),
                )
                .try_init()?;
        }
    }

    debug!("Logging ready");
    Ok(())
}
