use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("Failed to parse KDL")]
    #[diagnostic(code(evbind::config::parse_error))]
    ParseError {
        #[source_code]
        src: String,
        #[label("here")]
        span: miette::SourceSpan,
        #[source]
        source: kdl::KdlError,
    },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(evbind::config::invalid))]
    Invalid { message: String },

    #[error("Binding '{combo}' has no action")]
    #[diagnostic(
        code(evbind::config::missing_action),
        help("add a child node such as `spawn \"alacritty\"` or `log \"message\"`")
    )]
    MissingAction { combo: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
