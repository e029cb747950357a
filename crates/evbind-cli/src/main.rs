//! evbind CLI
//!
//! Configuration checks and keyboard inspection for evbind.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use evbind_config::{Action, Config};
use evbind_core::key::is_known_key_name;
use evbind_core::{device, Combo, ComboEngine, EventKind, Modifier};
use miette::IntoDiagnostic;

#[derive(Parser, Debug)]
#[command(name = "evbind")]
#[command(about = "Keyboard hotkey tool")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/evbind/config.kdl")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate the configuration file
    Validate,

    /// List available input devices
    Devices {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print key events and the combos they form, without running actions
    Watch {
        /// Device path or name to listen on (overrides config)
        #[arg(short, long)]
        device: Option<String>,
    },
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    // Expand tilde in config path
    let config_path: PathBuf = shellexpand::tilde(&cli.config).into_owned().into();

    match cli.command {
        Commands::Validate => cmd_validate(&config_path),
        Commands::Devices { json } => cmd_devices(json),
        Commands::Watch { device } => cmd_watch(&config_path, device.as_deref()).await,
    }
}

fn load_config(config_path: &Path) -> miette::Result<Config> {
    Ok(evbind_config::parse_config(config_path)?)
}

fn describe(action: &Action) -> String {
    match action {
        Action::Spawn(argv) => format!("spawn {}", argv.join(" ")),
        Action::Log(message) => format!("log \"{}\"", message),
    }
}

fn cmd_validate(config_path: &Path) -> miette::Result<()> {
    println!("Validating configuration: {}", config_path.display());

    let config = load_config(config_path)?;

    let mut seen: HashMap<Combo, &str> = HashMap::new();
    let mut invalid = 0;

    for binding in &config.bindings {
        let combo = match Combo::parse(&binding.combo) {
            Ok(combo) => combo,
            Err(e) => {
                println!("  ✗ {}: {}", binding.combo, e);
                invalid += 1;
                continue;
            }
        };

        println!("  ✓ {} -> {}", combo, describe(&binding.action));

        if !is_known_key_name(combo.key()) {
            println!(
                "    warning: '{}' is not an evdev key name, this binding will never fire",
                combo.key()
            );
        }
        if let Some(previous) = seen.insert(combo.clone(), &binding.combo) {
            println!("    warning: replaces earlier binding '{}'", previous);
        }
    }

    if invalid > 0 {
        return Err(miette::miette!("{} invalid binding(s)", invalid));
    }

    println!("Configuration is valid!");
    println!("  Bindings: {}", seen.len());
    println!("  Suppress repeats: {}", config.global.suppress_repeats);
    println!(
        "  Device: {}",
        config.global.device.as_deref().unwrap_or("<first keyboard>")
    );
    Ok(())
}

fn cmd_devices(json: bool) -> miette::Result<()> {
    let devices = device::enumerate_devices().into_diagnostic()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&devices).into_diagnostic()?);
        return Ok(());
    }

    println!("Available input devices:\n");

    for info in &devices {
        let device_type = if info.keyboard { "keyboard" } else { "other" };

        println!("  {} [{}]", info.name, device_type);
        println!("    Path: {}", info.path.display());
        println!("    ID: {}", info.vendor_product());
        println!();
    }

    Ok(())
}

async fn cmd_watch(config_path: &Path, device_override: Option<&str>) -> miette::Result<()> {
    let config = if config_path.exists() {
        load_config(config_path)?
    } else {
        Config::default()
    };

    // Bindings only print; watching never runs configured actions.
    let engine = ComboEngine::new();
    if config.global.suppress_repeats {
        engine.enable_repeat_suppression();
    }
    for binding in &config.bindings {
        let line = format!("    fires: {} -> {}", binding.combo, describe(&binding.action));
        if let Err(e) = engine.register_binding(&binding.combo, move || println!("{}", line)) {
            println!("Skipping binding '{}': {}", binding.combo, e);
        }
    }

    let selector = device_override.or(config.global.device.as_deref());
    let keyboard = device::find_keyboard(selector).into_diagnostic()?;
    let mut events = device::listen(&keyboard.path).into_diagnostic()?;

    println!(
        "Watching '{}' at {} (Ctrl-C to stop)\n",
        keyboard.name,
        keyboard.path.display()
    );

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    println!("Device closed");
                    break;
                };

                engine.handle_event(event);

                if event.kind == EventKind::Pressed && Modifier::from_key(event.key).is_none() {
                    let candidate = Combo::from_pressed(&engine.pressed_keys(), event.key);
                    println!("{:<28} combo: {}", event.to_string(), candidate);
                } else if event.kind != EventKind::Held {
                    println!("{}", event);
                }
            }
            result = tokio::signal::ctrl_c() => {
                result.into_diagnostic()?;
                break;
            }
        }
    }

    Ok(())
}
