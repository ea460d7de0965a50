//! Console output formatter for research cycles and the keyword catalog

use colored::Colorize;
use scout_application::CycleReport;
use scout_domain::{CycleStatus, KeywordRecord, PlatformSpec, ResearchCycleResult};
use serde_json::{Value, json};
use std::path::Path;

/// Formats results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format a completed cycle
    pub fn format(report: &CycleReport) -> String {
        let result = &report.result;
        let mut output = String::new();

        output.push_str(&Self::header("Trend Research Cycle"));
        output.push('\n');

        output.push_str(&format!(
            "{} {} ({})\n",
            "Cycle:".cyan().bold(),
            result.cycle_id,
            Self::status(result.status())
        ));
        let elapsed = (result.finished_at - result.started_at).num_seconds();
        output.push_str(&format!("{} {}s\n", "Duration:".cyan().bold(), elapsed));
        output.push_str(&format!(
            "{} {}\n",
            "Keywords:".cyan().bold(),
            result.keywords.join(", ")
        ));
        output.push_str(&format!(
            "{} {}\n",
            "Platforms:".cyan().bold(),
            result
                .platforms
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ));

        if !result.excluded_platforms.is_empty() {
            output.push_str(&Self::section_header("Excluded Platforms"));
            for (platform, reason) in &result.excluded_platforms {
                output.push_str(&format!("  {} {}: {}\n", "x".red(), platform, reason));
            }
        }

        output.push_str(&Self::section_header("Results"));
        let summary = &result.summary;
        output.push_str(&format!(
            "  {} of {} tasks succeeded, {} items\n",
            summary.successful_tasks, summary.total_tasks, summary.total_items
        ));
        for (platform, items) in &summary.platform_breakdown {
            output.push_str(&format!("  {:<14} {}\n", platform.to_string(), items));
        }

        output.push_str(&Self::failures(result));

        if !result.discovered.is_empty() {
            output.push_str(&format!("\n{}\n", "New Keywords:".green().bold()));
            for record in &result.discovered {
                match record.score {
                    Some(score) => output.push_str(&format!("  * {} ({})\n", record.text, score)),
                    None => output.push_str(&format!("  * {}\n", record.text)),
                }
            }
        }

        if !result.recommendations.is_empty() {
            output.push_str(&format!("\n{}\n", "Recommendations:".cyan().bold()));
            for rec in &result.recommendations {
                output.push_str(&format!("  * {}\n", rec));
            }
        }

        if !result.warnings.is_empty() {
            output.push_str(&format!("\n{}\n", "Warnings:".yellow().bold()));
            for warning in &result.warnings {
                output.push_str(&format!("  ! {}\n", warning));
            }
        }

        if !report.sinks.is_empty() {
            output.push_str(&Self::section_header("Reports"));
            for sink in &report.sinks {
                let line = match &sink.result {
                    Ok(ack) => format!(
                        "  {} {} {}",
                        "v".green(),
                        sink.sink,
                        ack.location.as_deref().unwrap_or("")
                    ),
                    Err(e) => format!("  {} {} {}", "x".red(), sink.sink, e),
                };
                output.push_str(line.trim_end());
                output.push('\n');
            }
        }

        output.push_str(&Self::footer());
        output
    }

    /// Failure breakdown by platform and status.
    fn failures(result: &ResearchCycleResult) -> String {
        let failures = &result.failures;
        if failures.is_empty() {
            return String::new();
        }
        let mut output = format!("\n{}\n", "Failures:".yellow().bold());
        for (platform, counts) in &failures.by_platform {
            let kinds = counts
                .iter()
                .map(|(status, n)| format!("{} {}", n, status))
                .collect::<Vec<_>>()
                .join(", ");
            output.push_str(&format!("  {:<14} {}\n", platform.to_string(), kinds));
        }
        if !failures.keywords_without_content.is_empty() {
            output.push_str(&format!(
                "  no content for: {}\n",
                failures.keywords_without_content.join(", ")
            ));
        }
        output
    }

    /// Format a cycle as JSON
    pub fn format_json(report: &CycleReport) -> String {
        let sinks: Vec<Value> = report
            .sinks
            .iter()
            .map(|s| match &s.result {
                Ok(ack) => json!({ "sink": s.sink, "ok": true, "location": ack.location }),
                Err(e) => json!({ "sink": s.sink, "ok": false, "error": e.to_string() }),
            })
            .collect();
        let value = json!({ "result": report.result, "sinks": sinks });
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
    }

    /// Keyword catalog table
    pub fn format_keywords(records: &[KeywordRecord]) -> String {
        if records.is_empty() {
            return format!("{}\n", "No keywords.".dimmed());
        }
        let mut output = format!(
            "{}\n",
            format!(
                "{:<36} {:<10} {:<10} {:>5} {:>5}  {}",
                "KEYWORD", "STATE", "SOURCE", "SCORE", "USED", "LAST USED"
            )
            .bold()
        );
        for record in records {
            let score = record.score.map(|s| s.to_string()).unwrap_or_default();
            let last_used = record
                .last_used_at
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string());
            output.push_str(&format!(
                "{:<36} {:<10} {:<10} {:>5} {:>5}  {}\n",
                record.text,
                record.state.as_str(),
                record.source.as_str(),
                score,
                record.times_used,
                last_used
            ));
        }
        output
    }

    pub fn format_keywords_json(records: &[KeywordRecord]) -> String {
        serde_json::to_string_pretty(records).unwrap_or_else(|_| "[]".to_string())
    }

    /// Configured platforms with their command or the reason they are off.
    pub fn format_platforms(specs: &[PlatformSpec]) -> String {
        let mut output = String::new();
        for spec in specs {
            let command = std::iter::once(spec.command.as_str())
                .chain(spec.args.iter().map(String::as_str))
                .collect::<Vec<_>>()
                .join(" ");
            if spec.enabled {
                output.push_str(&format!(
                    "  {} {:<14} {} (init {}s)\n",
                    "v".green(),
                    spec.name.to_string(),
                    command,
                    spec.init_timeout.as_secs()
                ));
            } else {
                output.push_str(&format!(
                    "  {} {:<14} {}\n",
                    "-".dimmed(),
                    spec.name.to_string(),
                    spec.disabled_reason.as_deref().unwrap_or("disabled").dimmed()
                ));
            }
        }
        output
    }

    pub fn format_platforms_json(specs: &[PlatformSpec]) -> String {
        let value: Vec<Value> = specs
            .iter()
            .map(|spec| {
                json!({
                    "name": spec.name,
                    "enabled": spec.enabled,
                    "command": spec.command,
                    "args": spec.args,
                    "tool": spec.tool,
                    "init_timeout_secs": spec.init_timeout.as_secs(),
                    "disabled_reason": spec.disabled_reason,
                })
            })
            .collect();
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| "[]".to_string())
    }

    /// Configuration sources, highest priority first.
    pub fn format_sources<'a>(
        sources: impl IntoIterator<Item = (&'a str, Option<&'a Path>, bool)>,
    ) -> String {
        let mut output = format!("{}\n", "Configuration sources (highest priority first):".bold());
        for (label, path, found) in sources {
            let mark = if found { "v".green() } else { "-".dimmed() };
            let location = path
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "built-in".to_string());
            output.push_str(&format!("  {} {:<9} {}\n", mark, label, location));
        }
        output
    }

    fn status(status: CycleStatus) -> String {
        match status {
            CycleStatus::Completed => status.as_str().green().to_string(),
            CycleStatus::Partial => status.as_str().yellow().to_string(),
            CycleStatus::Failed => status.as_str().red().to_string(),
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}
