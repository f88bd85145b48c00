/// Static Markdown CLI reference. Hand-written rather than generated from
/// clap's `Command` tree: the three subcommands are stable enough that
/// keeping this in sync by hand is less churn than a codegen dependency.
pub fn render() -> String {
    r#"# desynctrace CLI reference

## scan <url>

Probes a target for request-smuggling desync vectors.

| flag | description |
|---|---|
| `--proxy <url>` | upstream proxy (`http://`, `https://`, `socks5://`) |
| `--cookie <value>` | cookie header sent with every probe |
| `--threads <n>` | concurrent vector workers (default 10) |
| `--verbose` | debug-level logging |
| `--config <path>` | YAML config file |
| `--timeout <secs>` | per-request timeout |
| `--insecure` / `--no-insecure` | TLS certificate verification toggle |
| `--output <path>` | report output file |
| `--format <json\|text>` | report format |

## report <file>

Re-renders a previously saved JSON report's terminal summary without
re-scanning.

## docs

Emits this document.

## Environment variables

Every flag above also has a `DESYNC_`-prefixed environment variable
equivalent, e.g. `DESYNC_THREADS`, `DESYNC_TIMEOUT_SECS`.

## Exit codes

| code | meaning |
|---|---|
| 0 | scan completed, regardless of findings |
| 1 | unexpected internal error |
| 2 | configuration error |
| 3 | target unreachable for the baseline |
"#
    .to_string()
}
