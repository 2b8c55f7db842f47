use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid start parameters: {0}")]
    Validation(String),
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("{url} returned HTTP {status}: {body}")]
    Http {
        url: String,
        status: u16,
        body: String,
    },
    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
    #[error("simulation failed: {0}")]
    JobFailed(String),
    #[error("invalid base url '{0}'")]
    InvalidBaseUrl(String),
    #[error("poll interval must be > 0 (got {0}ms)")]
    InvalidPollInterval(u64),
    #[error("backoff factor must be >= 1 (got {0})")]
    InvalidBackoffFactor(f64),
    #[error("{0}")]
    ConfigIo(String),
    #[error("{0}")]
    ConfigParse(String),
    #[error("unsupported config format '{0}'")]
    UnsupportedConfigFormat(String),
    #[error("{0}")]
    Io(String),
    #[error("{0}")]
    Cli(String),
}

impl Error {
    pub(crate) fn transport(url: &str, err: impl std::fmt::Display) -> Self {
        Error::Transport {
            url: url.to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn decode(url: &str, err: impl std::fmt::Display) -> Self {
        Error::Decode {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
