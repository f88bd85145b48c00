use thiserror::Error;

/// Top-level error wrapping every layer the CLI drives. The exit code (§6 of
/// the design) is derived from which variant fires, not from the message.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Config(#[from] desynctrace_config::ConfigError),

    #[error("target unreachable for the baseline probe: {0}")]
    Unreachable(#[from] desynctrace_protocol::ProbeError),

    #[error(transparent)]
    Report(#[from] desynctrace_report::ReportError),
}

impl ScanError {
    pub fn exit_code(&self) -> i32 {
        match self {
            ScanError::Config(_) => 2,
            ScanError::Unreachable(_) => 3,
            ScanError::Report(_) => 1,
        }
    }
}
