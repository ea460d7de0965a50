//! Run Research Cycle use case
//!
//! Orchestrates one full cycle:
//!
//! ```text
//! load catalog -> select keywords -> connect -> fan-out -> close
//!   -> aggregate -> extract -> update keywords -> recommend -> report
//! ```
//!
//! Only two failures abort a cycle: the keyword store cannot be loaded, or
//! no platform could be connected. Everything else is recorded in the
//! result's failure breakdown or warnings.

use crate::config::CycleParams;
use crate::ports::event_logger::{EventLogger, NoEventLogger, ResearchEvent};
use crate::ports::extraction::{KeywordExtractor, Recommender};
use crate::ports::keyword_store::StoreError;
use crate::ports::progress::{CycleProgressNotifier, CyclePhase, NoProgress};
use crate::use_cases::connection_manager::ConnectionManager;
use crate::use_cases::fan_out::FanOutEngine;
use crate::use_cases::keyword_lifecycle::{CycleUpdate, KeywordLifecycleUpdater};
use crate::use_cases::report_assembler::{ReportAssembler, SinkReport};
use chrono::Utc;
use scout_domain::{
    CycleId, CycleSummary, FailureSummary, PlatformName, PlatformSpec, ResearchCycleResult,
    ResultAggregator, score_candidates,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Errors that abort a research cycle
#[derive(Error, Debug)]
pub enum CycleError {
    #[error("Failed to load keyword store: {0}")]
    StoreLoad(#[source] StoreError),

    #[error("No platform could be connected ({})", describe(.failures))]
    NoPlatformsAvailable {
        failures: BTreeMap<PlatformName, String>,
    },
}

fn describe(failures: &BTreeMap<PlatformName, String>) -> String {
    if failures.is_empty() {
        return "no platforms configured".to_string();
    }
    failures
        .iter()
        .map(|(platform, error)| format!("{}: {}", platform, error))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Input for the RunResearchCycle use case
#[derive(Debug, Clone)]
pub struct RunCycleInput {
    /// Platforms to connect, enabled or not.
    pub platforms: Vec<PlatformSpec>,
    /// Cancels the fan-out (e.g. Ctrl-C); connections are still closed
    /// and reports still published.
    pub cancel: CancellationToken,
}

impl RunCycleInput {
    pub fn new(platforms: Vec<PlatformSpec>) -> Self {
        Self {
            platforms,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Output of a completed cycle
#[derive(Debug)]
pub struct CycleReport {
    pub result: ResearchCycleResult,
    pub sinks: Vec<SinkReport>,
}

/// Use case for running one research cycle
pub struct RunResearchCycleUseCase {
    connections: ConnectionManager,
    fan_out: FanOutEngine,
    lifecycle: KeywordLifecycleUpdater,
    extractor: Arc<dyn KeywordExtractor>,
    recommender: Arc<dyn Recommender>,
    reports: ReportAssembler,
    logger: Arc<dyn EventLogger>,
}

impl RunResearchCycleUseCase {
    pub fn new(
        connections: ConnectionManager,
        fan_out: FanOutEngine,
        lifecycle: KeywordLifecycleUpdater,
        extractor: Arc<dyn KeywordExtractor>,
        recommender: Arc<dyn Recommender>,
        reports: ReportAssembler,
    ) -> Self {
        Self {
            connections,
            fan_out,
            lifecycle,
            extractor,
            recommender,
            reports,
            logger: Arc::new(NoEventLogger),
        }
    }

    /// Wire every component from one set of parameters.
    pub fn from_params(
        params: &CycleParams,
        connections: ConnectionManager,
        lifecycle: KeywordLifecycleUpdater,
        extractor: Arc<dyn KeywordExtractor>,
        recommender: Arc<dyn Recommender>,
        reports: ReportAssembler,
        logger: Arc<dyn EventLogger>,
    ) -> Self {
        let connections = connections
            .with_attempts(params.connect_attempts)
            .with_retry_delay(params.connect_retry_delay)
            .with_close_timeout(params.close_timeout)
            .with_event_logger(logger.clone());
        let fan_out = FanOutEngine::from_params(params).with_event_logger(logger.clone());
        Self::new(
            connections,
            fan_out,
            lifecycle.with_event_logger(logger.clone()),
            extractor,
            recommender,
            reports.with_event_logger(logger.clone()),
        )
        .with_event_logger(logger)
    }

    pub fn with_event_logger(mut self, logger: Arc<dyn EventLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Execute the use case with default (no-op) progress
    pub async fn execute(&mut self, input: RunCycleInput) -> Result<CycleReport, CycleError> {
        self.execute_with_progress(input, &NoProgress).await
    }

    /// Execute the use case with progress callbacks
    pub async fn execute_with_progress(
        &mut self,
        input: RunCycleInput,
        progress: &dyn CycleProgressNotifier,
    ) -> Result<CycleReport, CycleError> {
        let started_at = Utc::now();
        let cycle_id = CycleId::from_time(started_at);
        let mut warnings = Vec::new();
        info!("Starting research cycle {}", cycle_id);

        // Phase 0: keywords
        let mut catalog = self
            .lifecycle
            .load_catalog()
            .await
            .map_err(CycleError::StoreLoad)?;
        let selection = self.lifecycle.select_for_cycle(&mut catalog, started_at);
        if let Err(e) = self.lifecycle.persist_selection(&selection).await {
            warn!("Could not persist keyword selection: {}", e);
            warnings.push(format!("keyword selection not persisted: {}", e));
        }
        let keywords = selection.keywords();
        self.logger.log(ResearchEvent::new(
            "cycle_started",
            serde_json::json!({
                "cycle_id": cycle_id.as_str(),
                "keywords": keywords,
            }),
        ));

        if keywords.is_empty() {
            warn!("No keywords available; add some with `keywords add` or configure seeds");
            warnings.push("no keywords available for research".to_string());
            let result = self.build_result(ResultParts {
                cycle_id,
                started_at,
                keywords,
                platforms: Vec::new(),
                excluded: BTreeMap::new(),
                outcomes: Vec::new(),
                discovered: Vec::new(),
                recommendations: Vec::new(),
                failures: FailureSummary::default(),
                warnings,
            });
            return Ok(CycleReport {
                result,
                sinks: Vec::new(),
            });
        }

        // Phase 1: connect
        let started = self.connections.start_all(&input.platforms, progress).await;
        let excluded: BTreeMap<PlatformName, String> = started
            .iter()
            .filter_map(|(platform, result)| {
                result
                    .as_ref()
                    .err()
                    .map(|e| (platform.clone(), e.to_string()))
            })
            .collect();
        let ready = self.connections.ready_connections();
        if ready.is_empty() {
            if let Err(e) = self.connections.stop_all().await {
                warn!("{}", e);
            }
            return Err(CycleError::NoPlatformsAvailable { failures: excluded });
        }
        let platforms: Vec<PlatformName> = ready.keys().cloned().collect();

        // Phase 2: fan-out, then close every connection
        let outcomes = self
            .fan_out
            .run(&keywords, &ready, &input.cancel, progress)
            .await;
        drop(ready);
        if let Err(e) = self.connections.stop_all().await {
            warnings.push(e.to_string());
        }

        // Phase 3: aggregate and extract
        progress.on_phase_start(CyclePhase::Extract, 1);
        let (bundle, failures) = ResultAggregator::aggregate(&outcomes);
        let candidates = if bundle.is_empty() {
            info!("No content gathered; skipping keyword extraction");
            Vec::new()
        } else {
            let known: Vec<String> = catalog.records().iter().map(|r| r.text.clone()).collect();
            match self.extractor.extract(&bundle, &known).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn!("Keyword extraction failed: {}", e);
                    warnings.push(format!("keyword extraction failed: {}", e));
                    Vec::new()
                }
            }
        };
        let scored = score_candidates(&candidates, &bundle.corpus());

        // Phase 4: keyword lifecycle
        let used: Vec<String> = outcomes
            .iter()
            .map(|o| o.keyword().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let cycle_time = Utc::now();
        let update = CycleUpdate {
            cycle_id: &cycle_id,
            cycle_time,
            used_keywords: &used,
            candidates: &scored,
        };
        let changes = self.lifecycle.apply_cycle(&mut catalog, &update);
        if let Err(e) = self.lifecycle.persist_cycle(&update, &changes).await {
            warn!("Could not persist keyword changes: {}", e);
            warnings.push(format!("keyword changes not persisted: {}", e));
        }

        // Phase 5: recommendations
        let recommendations = match self
            .recommender
            .recommend(&outcomes, catalog.records(), &changes.discovered)
            .await
        {
            Ok(recommendations) => recommendations,
            Err(e) => {
                warn!("Recommendation generation failed: {}", e);
                warnings.push(format!("recommendations unavailable: {}", e));
                Vec::new()
            }
        };
        progress.on_phase_complete(CyclePhase::Extract);

        let mut result = self.build_result(ResultParts {
            cycle_id,
            started_at,
            keywords,
            platforms,
            excluded,
            outcomes,
            discovered: changes.discovered,
            recommendations,
            failures,
            warnings,
        });

        if let Err(e) = self.lifecycle.record_cycle(&result.history_entry()).await {
            warn!("Could not record cycle history: {}", e);
            result.warnings.push(format!("cycle history not recorded: {}", e));
        }

        // Phase 6: reports
        progress.on_phase_start(CyclePhase::Report, self.reports.sink_names().len());
        let sinks = self.reports.publish(&result).await;
        progress.on_phase_complete(CyclePhase::Report);

        Ok(CycleReport { result, sinks })
    }

    fn build_result(&self, parts: ResultParts) -> ResearchCycleResult {
        let summary = CycleSummary::from_outcomes(&parts.outcomes, parts.discovered.len());
        let result = ResearchCycleResult {
            cycle_id: parts.cycle_id,
            started_at: parts.started_at,
            finished_at: Utc::now(),
            keywords: parts.keywords,
            platforms: parts.platforms,
            excluded_platforms: parts.excluded,
            outcomes: parts.outcomes,
            discovered: parts.discovered,
            recommendations: parts.recommendations,
            failures: parts.failures,
            summary,
            warnings: parts.warnings,
        };
        info!(
            "Cycle {} finished: {}/{} task(s) succeeded, {} item(s), {} new keyword(s)",
            result.cycle_id,
            result.summary.successful_tasks,
            result.summary.total_tasks,
            result.summary.total_items,
            result.discovered.len()
        );
        self.logger.log(ResearchEvent::new(
            "cycle_finished",
            serde_json::json!({
                "cycle_id": result.cycle_id.as_str(),
                "summary": result.summary,
                "warnings": result.warnings,
            }),
        ));
        result
    }
}

struct ResultParts {
    cycle_id: CycleId,
    started_at: chrono::DateTime<Utc>,
    keywords: Vec<String>,
    platforms: Vec<PlatformName>,
    excluded: BTreeMap<PlatformName, String>,
    outcomes: Vec<scout_domain::TaskOutcome>,
    discovered: Vec<scout_domain::KeywordRecord>,
    recommendations: Vec<String>,
    failures: FailureSummary,
    warnings: Vec<String>,
}
