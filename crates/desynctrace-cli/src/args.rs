use std::path::PathBuf;

use clap::{Parser, Subcommand};
use desynctrace_config::PartialScanConfig;

#[derive(Parser, Debug)]
#[command(name = "desynctrace")]
#[command(about = "Active HTTP request-smuggling / desync scanner")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Probe a target for request-smuggling desync vectors.
    Scan(ScanArgs),
    /// Re-render a previously saved JSON report's terminal summary.
    Report {
        /// Path to a report written by a previous `scan --output`.
        file: PathBuf,
    },
    /// Emit Markdown CLI reference documentation.
    Docs,
}

#[derive(Parser, Debug)]
pub struct ScanArgs {
    /// Target URL to scan.
    pub url: String,

    /// Upstream proxy URL (http://, https://, or socks5://).
    #[arg(long)]
    pub proxy: Option<String>,

    /// Cookie header value sent with every probe.
    #[arg(long)]
    pub cookie: Option<String>,

    /// Number of vectors probed concurrently.
    #[arg(long)]
    pub threads: Option<usize>,

    /// Enable debug-level logging.
    #[arg(long)]
    pub verbose: bool,

    /// YAML config file layered beneath environment variables and flags.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Per-request timeout, in seconds.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Skip TLS certificate verification (default).
    #[arg(long, conflicts_with = "no_insecure")]
    pub insecure: bool,

    /// Verify TLS certificates against the platform trust store.
    #[arg(long)]
    pub no_insecure: bool,

    /// Report output file.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Report format: json or text.
    #[arg(long)]
    pub format: Option<String>,
}

impl ScanArgs {
    pub fn into_partial(self) -> PartialScanConfig {
        PartialScanConfig {
            target: Some(self.url),
            threads: self.threads,
            timeout_secs: self.timeout,
            blind_threshold_secs: None,
            verbose: if self.verbose { Some(true) } else { None },
            proxy: self.proxy,
            cookie: self.cookie,
            user_agent: None,
            insecure: if self.no_insecure {
                Some(false)
            } else if self.insecure {
                Some(true)
            } else {
                None
            },
            output: self.output.map(|p| p.display().to_string()),
            format: self.format,
        }
    }
}
