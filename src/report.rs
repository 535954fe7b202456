use std::path::Path;

use owo_colors::{OwoColorize, Stream};
use serde::Serialize;

use crate::errors::BenchError;
use crate::types::{AggregateReport, BenchmarkConfiguration, MetricEntry, MetricValue};

pub const TIME_METRIC: &str = "Average Execution Time";
pub const RSS_METRIC: &str = "Maximum Resident Set Size";

const LINE_SEPARATOR_WIDTH: usize = 70;

/// The two persisted metrics, in file order.
pub fn metric_entries(report: &AggregateReport) -> [MetricEntry; 2] {
    [
        MetricEntry {
            name: TIME_METRIC,
            unit: "second",
            value: MetricValue::Float(report.average_elapsed_seconds),
            runs: report.run_count,
            config: report.configuration_label.clone(),
        },
        MetricEntry {
            name: RSS_METRIC,
            unit: "KBytes",
            value: MetricValue::Integer(report.max_peak_resident_kb),
            runs: report.run_count,
            config: report.configuration_label.clone(),
        },
    ]
}

/// Render the report document: four-space indented JSON plus a trailing newline.
pub fn to_json(report: &AggregateReport) -> Result<String, BenchError> {
    let entries = metric_entries(report);
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    entries.serialize(&mut ser)?;
    buf.push(b'\n');
    // serde_json only emits valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write the report document to `path`, replacing any existing file.
///
/// Parent directories are not created.
pub fn write_report(report: &AggregateReport, path: &Path) -> Result<(), BenchError> {
    let json = to_json(report)?;
    std::fs::write(path, json).map_err(|source| BenchError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn separator() -> String {
    "=".repeat(LINE_SEPARATOR_WIDTH)
}

/// Lines printed before the first trial.
pub fn format_header(config: &BenchmarkConfiguration) -> String {
    let arrow = "==>"
        .if_supports_color(Stream::Stdout, |s| s.cyan())
        .to_string();
    format!(
        "{} config: {}\n{} runs: {}\n{} output_json: {}\n",
        arrow,
        config.label(),
        arrow,
        config.run_count,
        arrow,
        config.output_path.display()
    )
}

/// Progress line for trial `index` of `runs`.
pub fn format_progress(index: usize, runs: usize) -> String {
    format!("Running ({}/{})...", index, runs)
}

/// Bordered human-readable summary of a finished run.
pub fn format_summary(report: &AggregateReport, output_path: &Path) -> String {
    let rule = separator()
        .if_supports_color(Stream::Stdout, |s| s.dimmed())
        .to_string();
    let title = "Benchmark results"
        .if_supports_color(Stream::Stdout, |s| s.bold())
        .to_string();

    let mut out = String::new();
    out.push('\n');
    out.push_str(&rule);
    out.push('\n');
    out.push_str(&title);
    out.push('\n');
    out.push_str(&format!("Config     : {}\n", report.configuration_label));
    out.push_str(&format!("Output file: {}\n", output_path.display()));
    out.push_str(&rule);
    out.push('\n');

    for entry in metric_entries(report) {
        let value = entry
            .value
            .if_supports_color(Stream::Stdout, |s| s.green())
            .to_string();
        out.push_str(&format!(
            "    {:<30}: {} {} ({} runs)\n",
            entry.name, value, entry.unit, entry.runs
        ));
    }

    out.push_str(&rule);
    out.push('\n');
    out
}
