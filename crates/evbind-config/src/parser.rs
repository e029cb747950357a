//! KDL configuration parser
//!
//! ```kdl
//! global {
//!     log-level "info"
//!     suppress-repeats true
//!     device "/dev/input/event3"
//! }
//!
//! bindings {
//!     Ctrl+Alt+T { spawn "alacritty"; }
//!     Meta+L { spawn "loginctl" "lock-session"; }
//!     "Ctrl+1" { log "workspace one"; }
//! }
//! ```

use std::path::Path;

use crate::error::ConfigError;
use crate::model::*;

/// Parse a configuration file from the given path
pub fn parse_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config_str(&content)
}

/// Parse configuration from a string
pub fn parse_config_str(content: &str) -> Result<Config, ConfigError> {
    let doc: kdl::KdlDocument = content.parse().map_err(|e: kdl::KdlError| {
        // kdl depends on an older miette, so rebuild the span from offset/len
        let offset = e.span.offset();
        let len = e.span.len();
        let span = miette::SourceSpan::from((offset, len));
        ConfigError::ParseError {
            src: content.to_string(),
            span,
            source: e,
        }
    })?;

    let mut config = Config::default();

    for node in doc.nodes() {
        match node.name().value() {
            "global" => {
                config.global = parse_global(node)?;
            }
            "bindings" => {
                config.bindings.extend(parse_bindings(node)?);
            }
            name => {
                tracing::warn!("Unknown top-level node: {}", name);
            }
        }
    }

    Ok(config)
}

fn parse_global(node: &kdl::KdlNode) -> Result<GlobalConfig, ConfigError> {
    let mut global = GlobalConfig::default();

    let Some(children) = node.children() else {
        return Ok(global);
    };

    for child in children.nodes() {
        match child.name().value() {
            "log-level" => {
                if let Some(val) = first_string(child) {
                    global.log_level = val
                        .parse()
                        .map_err(|e| ConfigError::Invalid { message: e })?;
                }
            }
            "suppress-repeats" => {
                // A bare `suppress-repeats` node turns it on
                global.suppress_repeats = match child.entries().first() {
                    None => true,
                    Some(entry) => entry.value().as_bool().ok_or_else(|| ConfigError::Invalid {
                        message: "suppress-repeats expects true or false".to_string(),
                    })?,
                };
            }
            "device" => {
                global.device = first_string(child).map(str::to_string);
            }
            name => {
                tracing::warn!("Unknown global config option: {}", name);
            }
        }
    }

    Ok(global)
}

fn parse_bindings(node: &kdl::KdlNode) -> Result<Vec<Binding>, ConfigError> {
    let mut bindings = Vec::new();

    let Some(children) = node.children() else {
        return Ok(bindings);
    };

    for child in children.nodes() {
        let combo = child.name().value().to_string();
        let action = parse_action(child, &combo)?;
        tracing::debug!("Parsed binding {} -> {:?}", combo, action);
        bindings.push(Binding { combo, action });
    }

    Ok(bindings)
}

fn parse_action(node: &kdl::KdlNode, combo: &str) -> Result<Action, ConfigError> {
    let mut action = None;

    let children = node.children().map(|c| c.nodes()).unwrap_or_default();
    for child in children {
        let parsed = match child.name().value() {
            "spawn" => {
                let argv: Vec<String> = child
                    .entries()
                    .iter()
                    .filter(|entry| entry.name().is_none())
                    .filter_map(|entry| entry.value().as_string())
                    .map(str::to_string)
                    .collect();
                if argv.is_empty() {
                    return Err(ConfigError::Invalid {
                        message: format!("spawn for '{}' needs a command", combo),
                    });
                }
                Action::Spawn(argv)
            }
            "log" => {
                let message = first_string(child).unwrap_or(combo).to_string();
                Action::Log(message)
            }
            name => {
                tracing::warn!("Unknown action '{}' for binding {}", name, combo);
                continue;
            }
        };

        if action.is_some() {
            return Err(ConfigError::Invalid {
                message: format!("binding '{}' has more than one action", combo),
            });
        }
        action = Some(parsed);
    }

    action.ok_or_else(|| ConfigError::MissingAction {
        combo: combo.to_string(),
    })
}

fn first_string(node: &kdl::KdlNode) -> Option<&str> {
    node.entries()
        .first()
        .and_then(|entry| entry.value().as_string())
}
