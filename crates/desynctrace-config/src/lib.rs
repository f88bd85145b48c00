mod error;
mod partial;

use std::path::{Path, PathBuf};
use std::time::Duration;

pub use error::ConfigError;
pub use partial::PartialScanConfig;

use desynctrace_transport::ProxyConfig;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Text,
}

impl ReportFormat {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw {
            "json" => Ok(ReportFormat::Json),
            "text" => Ok(ReportFormat::Text),
            other => Err(ConfigError::UnknownFormat(other.to_string())),
        }
    }
}

/// Fully resolved, validated configuration for a single scan. Everything
/// downstream (transport, detect, report) takes this, never a partial.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub target: Url,
    pub threads: usize,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub blind_threshold: Duration,
    pub poison_gap: Duration,
    pub verbose: bool,
    pub proxy: Option<ProxyConfig>,
    pub cookie: Option<String>,
    pub user_agent: String,
    pub insecure_tls: bool,
    pub output_file: PathBuf,
    pub output_format: ReportFormat,
}

impl ScanConfig {
    /// Loads an optional YAML config file, layers `DESYNC_*` environment
    /// variables on top, then layers `cli` (already-parsed flags, with
    /// `None` for anything the user didn't pass) on top of that, and
    /// validates the result.
    pub fn resolve(file_path: Option<&Path>, cli: PartialScanConfig) -> Result<Self, ConfigError> {
        let mut merged = PartialScanConfig::defaults();

        if let Some(path) = file_path {
            merged = merged.merge(Self::load_file(path)?);
        }

        merged = merged.merge(PartialScanConfig::from_env());
        merged = merged.merge(cli);

        Self::finish(merged)
    }

    fn load_file(path: &Path) -> Result<PartialScanConfig, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::FileParse {
            path: path.display().to_string(),
            source,
        })
    }

    fn finish(merged: PartialScanConfig) -> Result<Self, ConfigError> {
        let target_raw = merged.target.ok_or_else(|| ConfigError::InvalidUrl("<missing>".to_string()))?;
        let target = Url::parse(&target_raw).map_err(|_| ConfigError::InvalidUrl(target_raw))?;

        let threads = merged.threads.unwrap_or(10);
        if threads == 0 {
            return Err(ConfigError::ZeroThreads);
        }

        let request_timeout = Duration::from_secs(merged.timeout_secs.unwrap_or(5));
        let blind_threshold = Duration::from_secs(merged.blind_threshold_secs.unwrap_or(4));
        if blind_threshold >= request_timeout {
            return Err(ConfigError::ThresholdInverted {
                blind: blind_threshold,
                request: request_timeout,
            });
        }

        let proxy = merged
            .proxy
            .map(|raw| ProxyConfig::parse(&raw).map_err(|_| ConfigError::InvalidProxy(raw)))
            .transpose()?;

        let output_format = ReportFormat::parse(&merged.format.unwrap_or_else(|| "json".to_string()))?;

        Ok(ScanConfig {
            target,
            threads,
            connect_timeout: Duration::from_secs(5),
            request_timeout,
            blind_threshold,
            poison_gap: Duration::from_millis(200),
            verbose: merged.verbose.unwrap_or(false),
            proxy,
            cookie: merged.cookie,
            user_agent: merged.user_agent.unwrap_or_else(|| "DesyncTrace/1.0".to_string()),
            insecure_tls: merged.insecure.unwrap_or(true),
            output_file: merged.output.map(PathBuf::from).unwrap_or_else(|| PathBuf::from("desynctrace_report.json")),
            output_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(target: &str) -> PartialScanConfig {
        PartialScanConfig {
            target: Some(target.to_string()),
            ..PartialScanConfig::default()
        }
    }

    #[test]
    fn resolves_defaults_for_a_bare_target() {
        let cfg = ScanConfig::resolve(None, cli("https://example.test")).unwrap();
        assert_eq!(cfg.threads, 10);
        assert_eq!(cfg.output_format, ReportFormat::Json);
        assert!(cfg.blind_threshold < cfg.request_timeout);
    }

    #[test]
    fn rejects_an_inverted_threshold() {
        let mut c = cli("https://example.test");
        c.timeout_secs = Some(2);
        c.blind_threshold_secs = Some(3);
        let err = ScanConfig::resolve(None, c).unwrap_err();
        assert!(matches!(err, ConfigError::ThresholdInverted { .. }));
    }

    #[test]
    fn rejects_zero_threads() {
        let mut c = cli("https://example.test");
        c.threads = Some(0);
        let err = ScanConfig::resolve(None, c).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroThreads));
    }

    #[test]
    fn rejects_an_unparseable_target() {
        let err = ScanConfig::resolve(None, cli("not a url")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl(_)));
    }

    #[test]
    fn file_values_are_overridden_by_cli_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("desync.yaml");
        std::fs::write(&path, "threads: 3\ntarget: https://from-file.test\n").unwrap();

        let mut c = PartialScanConfig::default();
        c.target = Some("https://from-cli.test".to_string());
        let cfg = ScanConfig::resolve(Some(&path), c).unwrap();

        assert_eq!(cfg.threads, 3);
        assert_eq!(cfg.target.host_str(), Some("from-cli.test"));
    }

    #[test]
    fn rejects_an_unknown_report_format() {
        let mut c = cli("https://example.test");
        c.format = Some("xml".to_string());
        let err = ScanConfig::resolve(None, c).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownFormat(_)));
    }
}
