//! Configuration data model

/// Root configuration structure
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub global: GlobalConfig,
    pub bindings: Vec<Binding>,
}

/// Global settings
#[derive(Debug, Clone, Default)]
pub struct GlobalConfig {
    pub log_level: LogLevel,
    /// Fire each combo once per press of its trigger key, ignoring re-presses
    pub suppress_repeats: bool,
    /// Device path or name to listen on; the first keyboard when unset
    pub device: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`
    pub fn as_filter(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(format!("Unknown log level: {}", s)),
        }
    }
}

/// A combo bound to an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Combo specifier as written (e.g., "Ctrl+Alt+T")
    pub combo: String,
    pub action: Action,
}

/// What to do when a binding fires
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Run a program; the first element is the executable
    Spawn(Vec<String>),
    /// Emit a log line at info level
    Log(String),
}
