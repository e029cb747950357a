use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while normalizing a combo specifier such as `"Ctrl+Alt+T"`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComboError {
    #[error("empty combo specifier")]
    Empty,

    #[error("empty component in combo '{input}'")]
    EmptyToken { input: String },

    #[error("no trigger key in combo '{input}' (only modifiers specified)")]
    MissingKey { input: String },

    #[error("multiple non-modifier keys in combo '{input}': '{first}' and '{second}'")]
    MultipleKeys {
        input: String,
        first: String,
        second: String,
    },
}

/// Errors produced by keyboard discovery and the event source.
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("no keyboard found under /dev/input")]
    NoKeyboard,

    #[error("no input device matches '{selector}'")]
    NotFound { selector: String },

    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
