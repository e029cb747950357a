//! Configuration parsing for evbind
//!
//! This crate parses the KDL configuration file that lists global daemon
//! settings and the combo bindings to register.

mod error;
mod model;
mod parser;

pub use error::ConfigError;
pub use model::*;
pub use parser::{parse_config, parse_config_str};
