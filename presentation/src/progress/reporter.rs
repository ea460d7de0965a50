//! Progress reporting for research cycles

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use scout_application::ports::progress::{CyclePhase, CycleProgressNotifier};
use scout_domain::{OutcomeStatus, PlatformName};
use std::sync::Mutex;

/// Reports progress during a research cycle with progress bars
pub struct ProgressReporter {
    multi: MultiProgress,
    phase_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            phase_bar: Mutex::new(None),
        }
    }

    fn phase_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn phase_display_name(phase: CyclePhase) -> &'static str {
        match phase {
            CyclePhase::Connect => "Phase 1: Connect",
            CyclePhase::Research => "Phase 2: Research",
            CyclePhase::Extract => "Phase 3: Extract",
            CyclePhase::Report => "Phase 4: Report",
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.phase_bar.lock()
            && let Some(pb) = guard.as_ref()
        {
            f(pb);
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// "v"/"x" mark for a task outcome.
fn outcome_mark(status: OutcomeStatus) -> String {
    match status {
        OutcomeStatus::Success => "v".green().to_string(),
        OutcomeStatus::Timeout => "t".yellow().to_string(),
        _ => "x".red().to_string(),
    }
}

impl CycleProgressNotifier for ProgressReporter {
    fn on_phase_start(&self, phase: CyclePhase, total: usize) {
        let pb = self.multi.add(ProgressBar::new(total as u64));
        pb.set_style(Self::phase_style());
        pb.set_prefix(Self::phase_display_name(phase));
        pb.set_message("Starting...");

        if let Ok(mut guard) = self.phase_bar.lock() {
            *guard = Some(pb);
        }
    }

    fn on_platform_ready(&self, platform: &PlatformName, ready: bool, detail: Option<&str>) {
        self.with_bar(|pb| {
            let message = if ready {
                format!("{} {}", "v".green(), platform)
            } else {
                format!("{} {} ({})", "x".red(), platform, detail.unwrap_or("failed"))
            };
            pb.set_message(message);
            pb.inc(1);
        });
    }

    fn on_task_complete(&self, keyword: &str, platform: &PlatformName, status: OutcomeStatus) {
        self.with_bar(|pb| {
            pb.set_message(format!("{} {} / {}", outcome_mark(status), platform, keyword));
            pb.inc(1);
        });
    }

    fn on_phase_complete(&self, phase: CyclePhase) {
        let bar = self.phase_bar.lock().ok().and_then(|mut guard| guard.take());
        if let Some(pb) = bar {
            pb.finish_with_message(format!("{} complete!", phase.as_str().green()));
        }
    }
}

/// Simple text-based progress (no progress bars)
pub struct SimpleProgress;

impl CycleProgressNotifier for SimpleProgress {
    fn on_phase_start(&self, phase: CyclePhase, total: usize) {
        eprintln!(
            "{} {} ({})",
            "->".cyan(),
            ProgressReporter::phase_display_name(phase).bold(),
            total
        );
    }

    fn on_platform_ready(&self, platform: &PlatformName, ready: bool, detail: Option<&str>) {
        if ready {
            eprintln!("  {} {}", "v".green(), platform);
        } else {
            eprintln!("  {} {} ({})", "x".red(), platform, detail.unwrap_or("failed"));
        }
    }

    fn on_task_complete(&self, keyword: &str, platform: &PlatformName, status: OutcomeStatus) {
        eprintln!("  {} {} / {} ({})", outcome_mark(status), platform, keyword, status);
    }

    fn on_phase_complete(&self, _phase: CyclePhase) {
        eprintln!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_names() {
        assert_eq!(
            ProgressReporter::phase_display_name(CyclePhase::Research),
            "Phase 2: Research"
        );
    }

    #[test]
    fn test_reporter_lifecycle() {
        let reporter = ProgressReporter::new();
        let platform = PlatformName::parse("github").unwrap();
        reporter.on_phase_start(CyclePhase::Research, 2);
        reporter.on_task_complete("rag", &platform, OutcomeStatus::Success);
        reporter.on_task_complete("mcp", &platform, OutcomeStatus::Timeout);
        let position = reporter
            .phase_bar
            .lock()
            .unwrap()
            .as_ref()
            .map(|pb| pb.position());
        assert_eq!(position, Some(2));
        reporter.on_phase_complete(CyclePhase::Research);
        assert!(reporter.phase_bar.lock().unwrap().is_none());
    }

    #[test]
    fn test_events_without_phase_are_ignored() {
        let reporter = ProgressReporter::new();
        let platform = PlatformName::parse("arxiv").unwrap();
        reporter.on_platform_ready(&platform, false, Some("spawn failed"));
        reporter.on_phase_complete(CyclePhase::Connect);
    }
}
