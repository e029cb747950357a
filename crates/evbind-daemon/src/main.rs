//! evbind daemon
//!
//! Listens on a keyboard and runs the configured action whenever a bound
//! key combination is pressed.

mod actions;
mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use evbind_core::{device, ComboEngine, TokioDispatch};

#[derive(Parser, Debug)]
#[command(name = "evbindd")]
#[command(about = "Keyboard hotkey daemon")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/evbind/config.kdl")]
    config: String,

    /// Device path or name to listen on (overrides config)
    #[arg(short, long)]
    device: Option<String>,

    /// Fire each combo once until its trigger key is released (overrides config)
    #[arg(short, long)]
    suppress_repeats: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing before the config so parser warnings are shown
    let log_control = logging::init();

    let args = Args::parse();

    // Expand tilde in config path
    let config_path: PathBuf = shellexpand::tilde(&args.config).into_owned().into();

    let config = evbind_config::parse_config(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

    log_control.apply(config.global.log_level)?;

    tracing::info!(
        "Loaded configuration from {} with {} binding(s)",
        config_path.display(),
        config.bindings.len()
    );

    let engine = Arc::new(ComboEngine::with_dispatcher(Arc::new(TokioDispatch::new(
        tokio::runtime::Handle::current(),
    ))));

    if args.suppress_repeats || config.global.suppress_repeats {
        engine.enable_repeat_suppression();
    }

    let registered = actions::register_all(&engine, &config.bindings);
    tracing::info!("Registered {} binding(s)", registered);

    let selector = args.device.as_deref().or(config.global.device.as_deref());
    let keyboard = device::find_keyboard(selector).context("Failed to find a keyboard")?;
    tracing::info!(
        "Using '{}' ({}) at {}",
        keyboard.name,
        keyboard.vendor_product(),
        keyboard.path.display()
    );

    let events = device::listen(&keyboard.path)
        .with_context(|| format!("Failed to listen on {}", keyboard.path.display()))?;

    tokio::select! {
        _ = engine.run(events) => {
            tracing::warn!("Keyboard at {} is no longer available", keyboard.path.display());
        }
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("Shutting down...");
        }
    }

    Ok(())
}
