//! Errors raised while loading client settings and preparing the runtime
//! directory.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// The tracing subscriber could not be installed.
    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// `config.json` is malformed or could not be written.
    #[error("Config file error: {0}")]
    Json(#[from] serde_json::Error),

    /// No `--base-dir` was given and the home directory is unknown.
    #[error("Cannot locate the home directory for runtime files")]
    NoHomeDir,

    /// The configured API base URL and version do not form a URL.
    #[error("Invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources_convert() {
        let err: CoreError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, CoreError::Json(_)));
        assert!(err.to_string().starts_with("Config file error"));

        let err: CoreError = url::Url::parse("::").unwrap_err().into();
        assert!(matches!(err, CoreError::InvalidUrl(_)));
    }
}
