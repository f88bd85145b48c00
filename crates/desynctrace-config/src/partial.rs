use serde::Deserialize;

/// Every field a config source might contribute, all optional: a source that
/// doesn't mention a key simply contributes `None` and is a no-op in
/// [`PartialScanConfig::merge`].
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PartialScanConfig {
    pub target: Option<String>,
    pub threads: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub blind_threshold_secs: Option<u64>,
    pub verbose: Option<bool>,
    pub proxy: Option<String>,
    pub cookie: Option<String>,
    pub user_agent: Option<String>,
    pub insecure: Option<bool>,
    pub output: Option<String>,
    pub format: Option<String>,
}

impl PartialScanConfig {
    /// Merges `other` on top of `self`: any field `other` sets wins. Used in
    /// increasing priority order: defaults, then config file, then
    /// environment, then explicit CLI flags.
    pub fn merge(self, other: PartialScanConfig) -> PartialScanConfig {
        PartialScanConfig {
            target: other.target.or(self.target),
            threads: other.threads.or(self.threads),
            timeout_secs: other.timeout_secs.or(self.timeout_secs),
            blind_threshold_secs: other.blind_threshold_secs.or(self.blind_threshold_secs),
            verbose: other.verbose.or(self.verbose),
            proxy: other.proxy.or(self.proxy),
            cookie: other.cookie.or(self.cookie),
            user_agent: other.user_agent.or(self.user_agent),
            insecure: other.insecure.or(self.insecure),
            output: other.output.or(self.output),
            format: other.format.or(self.format),
        }
    }

    /// Reads `DESYNC_*` environment variables, one per field, using the
    /// field's own name upper-cased (`DESYNC_THREADS`, `DESYNC_TIMEOUT_SECS`,
    /// ...) as the original's viper-based loader does with its `DESYNC`
    /// prefix.
    pub fn from_env() -> Self {
        fn var(name: &str) -> Option<String> {
            std::env::var(format!("DESYNC_{name}")).ok()
        }

        Self {
            target: var("TARGET"),
            threads: var("THREADS").and_then(|v| v.parse().ok()),
            timeout_secs: var("TIMEOUT_SECS").and_then(|v| v.parse().ok()),
            blind_threshold_secs: var("BLIND_THRESHOLD_SECS").and_then(|v| v.parse().ok()),
            verbose: var("VERBOSE").and_then(|v| v.parse().ok()),
            proxy: var("PROXY"),
            cookie: var("COOKIE"),
            user_agent: var("USER_AGENT"),
            insecure: var("INSECURE").and_then(|v| v.parse().ok()),
            output: var("OUTPUT"),
            format: var("FORMAT"),
        }
    }

    pub fn defaults() -> Self {
        Self {
            threads: Some(10),
            timeout_secs: Some(5),
            blind_threshold_secs: Some(4),
            verbose: Some(false),
            user_agent: Some("DesyncTrace/1.0".to_string()),
            insecure: Some(true),
            output: Some("desynctrace_report.json".to_string()),
            format: Some("json".to_string()),
            ..Self::default()
        }
    }
}
