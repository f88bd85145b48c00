use std::time::Duration;

use thiserror::Error;

/// All of these are `config-invalid` per the error taxonomy: surfaced to the
/// caller, and the scan never opens a socket.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid target url: {0}")]
    InvalidUrl(String),

    #[error("unsupported proxy scheme: {0}")]
    InvalidProxy(String),

    #[error("blind threshold ({blind:?}) must be less than the request timeout ({request:?})")]
    ThresholdInverted { blind: Duration, request: Duration },

    #[error("thread count must be at least 1")]
    ZeroThreads,

    #[error("unknown report format {0:?}, expected \"json\" or \"text\"")]
    UnknownFormat(String),

    #[error("failed to read config file {path}: {source}")]
    FileRead { path: String, source: std::io::Error },

    #[error("failed to parse config file {path}: {source}")]
    FileParse { path: String, source: serde_yaml::Error },
}
