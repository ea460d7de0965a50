//! Progress notification port
//!
//! Defines the interface for reporting progress during a research cycle.

use scout_domain::{OutcomeStatus, PlatformName};

/// Phases of a research cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Connect,
    Research,
    Extract,
    Report,
}

impl CyclePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            CyclePhase::Connect => "connect",
            CyclePhase::Research => "research",
            CyclePhase::Extract => "extract",
            CyclePhase::Report => "report",
        }
    }
}

/// Callback for progress updates during a research cycle
///
/// Implementations live in the presentation layer.
pub trait CycleProgressNotifier: Send + Sync {
    /// Called when a phase starts. `total` is the number of units in it
    /// (platforms to connect, tasks to run...).
    fn on_phase_start(&self, phase: CyclePhase, total: usize);

    /// Called once per platform when its connection attempt settles.
    fn on_platform_ready(&self, _platform: &PlatformName, _ready: bool, _detail: Option<&str>) {}

    /// Called when a research task completes.
    fn on_task_complete(&self, keyword: &str, platform: &PlatformName, status: OutcomeStatus);

    /// Called when a phase completes
    fn on_phase_complete(&self, phase: CyclePhase);
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl CycleProgressNotifier for NoProgress {
    fn on_phase_start(&self, _phase: CyclePhase, _total: usize) {}
    fn on_task_complete(&self, _keyword: &str, _platform: &PlatformName, _status: OutcomeStatus) {
    }
    fn on_phase_complete(&self, _phase: CyclePhase) {}
}
