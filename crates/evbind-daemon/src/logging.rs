//! Tracing setup
//!
//! The subscriber is installed before the configuration is read so parser
//! warnings are visible. It starts at `info` (or `RUST_LOG`) and switches to
//! the configured `log-level` once the file is loaded. `RUST_LOG` always wins.

use anyhow::{Context, Result};
use evbind_config::LogLevel;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

const STARTUP_LEVEL: &str = "info";

/// Handle for applying the configured log level after startup.
pub struct LogControl {
    handle: reload::Handle<EnvFilter, Registry>,
    env_override: bool,
}

impl LogControl {
    /// Switch to the configured level unless `RUST_LOG` was set.
    pub fn apply(&self, level: LogLevel) -> Result<()> {
        if self.env_override {
            return Ok(());
        }
        self.handle
            .reload(EnvFilter::new(level.as_filter()))
            .context("Failed to apply configured log level")
    }
}

/// Build the reloadable filter layer, preferring an environment filter.
fn filter_layer(env: Option<EnvFilter>) -> (reload::Layer<EnvFilter, Registry>, LogControl) {
    let env_override = env.is_some();
    let filter = env.unwrap_or_else(|| EnvFilter::new(STARTUP_LEVEL));
    let (layer, handle) = reload::Layer::new(filter);
    (
        layer,
        LogControl {
            handle,
            env_override,
        },
    )
}

/// Install the global subscriber.
pub fn init() -> LogControl {
    let (filter, control) = filter_layer(EnvFilter::try_from_default_env().ok());
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
    control
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Capture {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn capturing(
        env: Option<EnvFilter>,
    ) -> (impl tracing::Subscriber + Send + Sync, LogControl, Capture) {
        let capture = Capture::default();
        let writer = capture.clone();
        let (filter, control) = filter_layer(env);
        let subscriber = tracing_subscriber::registry().with(filter).with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(move || writer.clone()),
        );
        (subscriber, control, capture)
    }

    #[test]
    fn test_config_warnings_visible_before_level_applied() {
        let (subscriber, control, capture) = capturing(None);

        tracing::subscriber::with_default(subscriber, || {
            let config =
                evbind_config::parse_config_str("global {\n suppress_repeats true\n}").unwrap();
            assert!(!config.global.suppress_repeats);
            control.apply(config.global.log_level).unwrap();
        });

        assert!(capture.text().contains("suppress_repeats"));
    }

    #[test]
    fn test_configured_level_applied_after_load() {
        let (subscriber, control, capture) = capturing(None);

        tracing::subscriber::with_default(subscriber, || {
            control.apply(LogLevel::Error).unwrap();
            tracing::warn!("filtered out after reload");
            tracing::error!("kept after reload");
        });

        let text = capture.text();
        assert!(!text.contains("filtered out after reload"));
        assert!(text.contains("kept after reload"));
    }

    #[test]
    fn test_env_filter_overrides_configured_level() {
        let (subscriber, control, capture) = capturing(Some(EnvFilter::new("debug")));

        tracing::subscriber::with_default(subscriber, || {
            control.apply(LogLevel::Error).unwrap();
            tracing::debug!("still at debug");
        });

        assert!(capture.text().contains("still at debug"));
    }
}
