use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};

use crate::model::ScanReport;

/// Renders the scan summary the way the original's `fatih/color` +
/// `go-pretty` combination did: a headline, then one table row per finding.
pub fn print_summary(report: &ScanReport) {
    println!("{}", format!("desync scan: {}", report.target).bold());
    println!("  started {}  ·  took {}", report.start_time, report.duration);

    if let Some(fp) = &report.fingerprint {
        let stack = [
            (!fp.server.is_empty()).then(|| fp.server.clone()),
            fp.is_nginx.then(|| "nginx".to_string()),
            fp.is_apache.then(|| "apache".to_string()),
            fp.is_gunicorn.then(|| "gunicorn".to_string()),
        ];
        let stack: Vec<String> = stack.into_iter().flatten().collect();
        if !stack.is_empty() {
            println!("  fingerprint: {}", stack.join(", ").dimmed());
        }
    }

    if report.findings.is_empty() {
        println!("{}", "  no vectors probed".dimmed());
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["vector", "result", "confidence", "evidence"]);

    for finding in &report.findings {
        let (result_text, color) = if finding.vulnerable {
            ("VULNERABLE", Color::Red)
        } else {
            ("clear", Color::Green)
        };
        table.add_row(vec![
            Cell::new(&finding.vector),
            Cell::new(result_text).fg(color),
            Cell::new(format!("{}%", finding.confidence)),
            Cell::new(&finding.evidence),
        ]);
    }

    println!("{table}");

    let vulnerable = report.vulnerable_findings().count();
    if vulnerable > 0 {
        println!("{}", format!("  {vulnerable} vector(s) flagged vulnerable").red().bold());
    } else {
        println!("{}", "  no desync behavior detected".green());
    }
}

/// Plain-text rendering of the same summary, with no ANSI color codes —
/// used for the `text` report format, where the output is a file rather
/// than a terminal.
pub fn render_text(report: &ScanReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("desync scan: {}\n", report.target));
    out.push_str(&format!("  started {}  \u{b7}  took {}\n", report.start_time, report.duration));

    if let Some(fp) = &report.fingerprint {
        let stack = [
            (!fp.server.is_empty()).then(|| fp.server.clone()),
            fp.is_nginx.then(|| "nginx".to_string()),
            fp.is_apache.then(|| "apache".to_string()),
            fp.is_gunicorn.then(|| "gunicorn".to_string()),
        ];
        let stack: Vec<String> = stack.into_iter().flatten().collect();
        if !stack.is_empty() {
            out.push_str(&format!("  fingerprint: {}\n", stack.join(", ")));
        }
    }

    if report.findings.is_empty() {
        out.push_str("  no vectors probed\n");
        return out;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["vector", "result", "confidence", "evidence"]);

    for finding in &report.findings {
        let result_text = if finding.vulnerable { "VULNERABLE" } else { "clear" };
        table.add_row(vec![
            finding.vector.clone(),
            result_text.to_string(),
            format!("{}%", finding.confidence),
            finding.evidence.clone(),
        ]);
    }

    out.push_str(&table.to_string());
    out.push('\n');

    let vulnerable = report.vulnerable_findings().count();
    if vulnerable > 0 {
        out.push_str(&format!("  {vulnerable} vector(s) flagged vulnerable\n"));
    } else {
        out.push_str("  no desync behavior detected\n");
    }

    out
}
