use std::sync::Arc;
use std::time::{Duration, Instant};

use desynctrace_config::ScanConfig;
use desynctrace_detect::{run_vector, FindingCollector, Fingerprinter, Timeouts};
use desynctrace_protocol::{HttpVersion, ProbeError, Request, Vector};
use desynctrace_report::ScanReport;
use desynctrace_transport::Transport;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::ScanError;

/// Runs a full scan against `config.target`: fingerprint, then every vector
/// bounded by `config.threads` concurrent workers, each owning its own
/// [`Transport`] (and therefore its own connections). `cancel` is checked
/// before every spawned worker starts and raced inside every probe it
/// issues; a scan that is cancelled mid-flight still returns whatever
/// findings were collected before the signal fired.
pub async fn run(config: &ScanConfig, cancel: &CancellationToken) -> Result<ScanReport, ScanError> {
    let start = Instant::now();
    let start_time = chrono::Utc::now().to_rfc3339();

    let timeouts = Timeouts {
        connect: config.connect_timeout,
        request: config.request_timeout,
        blind_threshold: config.blind_threshold,
        poison_gap: config.poison_gap,
    };

    let transport = Transport::new(
        config.proxy.clone(),
        config.insecure_tls,
        config.connect_timeout,
        config.request_timeout,
    );

    let (fingerprint, baseline_duration) =
        Fingerprinter::new(&transport).probe(&config.target, &config.user_agent, cancel).await;

    info!(found = fingerprint.is_some(), "fingerprint probe complete");

    let base = base_request(config);
    let collector = FindingCollector::new();
    let semaphore = Arc::new(Semaphore::new(config.threads));

    let vectors = desynctrace_vectors::all();
    let mut tasks = Vec::with_capacity(vectors.len());

    for vector in vectors {
        if cancel.is_cancelled() {
            break;
        }
        let semaphore = Arc::clone(&semaphore);
        let collector = collector.clone();
        let transport = per_worker_transport(config);
        let base = base.clone();
        let target = config.target.clone();
        let timeouts = timeouts;
        let baseline_duration = Some(baseline_duration);
        let cancel = cancel.clone();

        tasks.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("collector semaphore closed");
            let outcome =
                run_vector(&transport, &vector, &base, &target, &timeouts, baseline_duration, &cancel).await;
            collector.append_all(outcome.findings).await;
        }));
    }

    for task in tasks {
        let _ = task.await;
    }

    let findings = collector.snapshot().await;
    let duration = humanize(start.elapsed());

    Ok(ScanReport::new(
        config.target.to_string(),
        start_time,
        duration,
        fingerprint.as_ref(),
        &findings,
    ))
}

/// One `Transport` per spawned worker: connection affinity must never be
/// shared across concurrent vector probes (§5's resource model).
fn per_worker_transport(config: &ScanConfig) -> Transport {
    Transport::new(
        config.proxy.clone(),
        config.insecure_tls,
        config.connect_timeout,
        config.request_timeout,
    )
}

fn base_request(config: &ScanConfig) -> Request {
    let mut req = Request::new("GET", config.target.to_string(), HttpVersion::Http1);
    if let Some(cookie) = &config.cookie {
        req = req.with_header("Cookie", cookie.clone());
    }
    req
}

fn humanize(d: Duration) -> String {
    format!("{:.1}s", d.as_secs_f64())
}

/// Verifies the target answers a plain GET before committing to a full scan;
/// surfaced as the `baseline-failure` error category (§7), which maps to
/// exit code 3.
pub async fn check_reachable(config: &ScanConfig, cancel: &CancellationToken) -> Result<(), ScanError> {
    let transport = Transport::new(
        config.proxy.clone(),
        config.insecure_tls,
        config.connect_timeout,
        config.request_timeout,
    );
    let request = Request::new("GET", config.target.to_string(), HttpVersion::Http1);
    let (result, _) = transport.send(&request, &config.target, cancel).await;
    result
        .map(|_| ())
        .map_err(|err| ScanError::Unreachable(err.into_probe_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use desynctrace_config::ReportFormat;
    use std::path::PathBuf;
    use std::time::Duration;
    use url::Url;

    fn config_for(target: Url) -> ScanConfig {
        ScanConfig {
            target,
            threads: 4,
            connect_timeout: Duration::from_millis(200),
            request_timeout: Duration::from_millis(200),
            blind_threshold: Duration::from_millis(150),
            poison_gap: Duration::from_millis(50),
            verbose: false,
            proxy: None,
            cookie: None,
            user_agent: "desynctrace-test".to_string(),
            insecure_tls: false,
            output_file: PathBuf::from("report.json"),
            output_format: ReportFormat::Json,
        }
    }

    #[tokio::test]
    async fn s6_unreachable_target_maps_to_exit_code_three() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let target = Url::parse(&format!("http://127.0.0.1:{}/", addr.port())).unwrap();
        let config = config_for(target);
        let cancel = CancellationToken::new();

        let err = check_reachable(&config, &cancel).await.expect_err("closed port must be unreachable");
        assert!(matches!(err, ScanError::Unreachable(_)));
        assert_eq!(err.exit_code(), 3);
    }
}
