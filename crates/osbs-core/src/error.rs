use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    // ── User parameter validation ──
    #[error("required parameter '{param}' is not set")]
    MissingParam { param: &'static str },

    #[error("invalid value for '{param}': {reason}")]
    InvalidParam { param: &'static str, reason: String },

    #[error("one of {} must be set", params.join(", "))]
    MissingOneOf { params: Vec<&'static str> },
}
