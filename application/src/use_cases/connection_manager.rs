//! Connection Manager
//!
//! Owns the connection table for a cycle. Every enabled platform is started
//! concurrently, each bounded by its own handshake timeout and retried once.
//! A platform whose handshake ultimately fails is marked
//! [`ConnectionState::Degraded`] and left out of the fan-out; the others are
//! unaffected.

use crate::ports::event_logger::{EventLogger, NoEventLogger, ResearchEvent};
use crate::ports::platform_adapter::{AdapterError, PlatformAdapter, PlatformConnection};
use crate::ports::progress::{CycleProgressNotifier, CyclePhase};
use scout_domain::{ConnectionState, PlatformName, PlatformSpec};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Connection results keyed by platform.
pub type StartResults = BTreeMap<PlatformName, Result<Arc<dyn PlatformConnection>, AdapterError>>;

/// Errors collected while closing connections
#[derive(Error, Debug)]
#[error("failed to close {} connection(s): {}", .failures.len(), describe(.failures))]
pub struct StopError {
    pub failures: Vec<(PlatformName, AdapterError)>,
}

fn describe(failures: &[(PlatformName, AdapterError)]) -> String {
    failures
        .iter()
        .map(|(platform, error)| format!("{}: {}", platform, error))
        .collect::<Vec<_>>()
        .join("; ")
}

struct ConnectionSlot {
    state: ConnectionState,
    connection: Option<Arc<dyn PlatformConnection>>,
    last_error: Option<String>,
}

pub struct ConnectionManager {
    adapters: HashMap<PlatformName, Arc<dyn PlatformAdapter>>,
    slots: BTreeMap<PlatformName, ConnectionSlot>,
    attempts: u32,
    retry_delay: Duration,
    close_timeout: Duration,
    logger: Arc<dyn EventLogger>,
}

impl ConnectionManager {
    pub fn new(adapters: Vec<Arc<dyn PlatformAdapter>>) -> Self {
        let adapters = adapters
            .into_iter()
            .map(|adapter| (adapter.platform().clone(), adapter))
            .collect();
        Self {
            adapters,
            slots: BTreeMap::new(),
            attempts: 2,
            retry_delay: Duration::from_secs(2),
            close_timeout: Duration::from_secs(10),
            logger: Arc::new(NoEventLogger),
        }
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    pub fn with_event_logger(mut self, logger: Arc<dyn EventLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Start every enabled platform concurrently.
    ///
    /// Disabled platforms are reported as [`AdapterError::Disabled`] without
    /// being started. The returned map has one entry per spec.
    pub async fn start_all(
        &mut self,
        specs: &[PlatformSpec],
        progress: &dyn CycleProgressNotifier,
    ) -> StartResults {
        let mut results = StartResults::new();
        let mut join_set = JoinSet::new();
        let mut starting = Vec::new();

        for spec in specs {
            if !spec.enabled {
                let reason = spec
                    .disabled_reason
                    .clone()
                    .unwrap_or_else(|| "disabled in configuration".to_string());
                info!("Skipping platform {}: {}", spec.name, reason);
                results.insert(spec.name.clone(), Err(AdapterError::Disabled(reason)));
                continue;
            }

            let Some(adapter) = self.adapters.get(&spec.name).cloned() else {
                warn!("No adapter for platform {}", spec.name);
                let error = AdapterError::NoAdapter(spec.name.to_string());
                self.set_slot(&spec.name, ConnectionState::Degraded, None, Some(&error));
                results.insert(spec.name.clone(), Err(error));
                continue;
            };

            self.set_slot(&spec.name, ConnectionState::Starting, None, None);
            starting.push(spec.name.clone());

            let spec = spec.clone();
            let attempts = self.attempts;
            let retry_delay = self.retry_delay;
            join_set.spawn(async move {
                let result = connect_with_retry(adapter.as_ref(), &spec, attempts, retry_delay).await;
                (spec.name, result)
            });
        }

        progress.on_phase_start(CyclePhase::Connect, starting.len());

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((platform, result)) => {
                    self.settle(&platform, &result, progress);
                    results.insert(platform, result);
                }
                Err(e) => warn!("Connect task terminated abnormally: {}", e),
            }
        }

        // A connect task that panicked never reported back.
        for platform in starting {
            if !results.contains_key(&platform) {
                let result = Err(AdapterError::Handshake("connect task aborted".to_string()));
                self.settle(&platform, &result, progress);
                results.insert(platform, result);
            }
        }

        progress.on_phase_complete(CyclePhase::Connect);
        results
    }

    fn settle(
        &mut self,
        platform: &PlatformName,
        result: &Result<Arc<dyn PlatformConnection>, AdapterError>,
        progress: &dyn CycleProgressNotifier,
    ) {
        match result {
            Ok(connection) => {
                info!("Platform {} ready", platform);
                self.set_slot(platform, ConnectionState::Ready, Some(connection.clone()), None);
                self.logger.log(ResearchEvent::new(
                    "platform_connected",
                    serde_json::json!({ "platform": platform.as_str() }),
                ));
                progress.on_platform_ready(platform, true, None);
            }
            Err(error) => {
                warn!("Platform {} degraded: {}", platform, error);
                self.set_slot(platform, ConnectionState::Degraded, None, Some(error));
                self.logger.log(ResearchEvent::new(
                    "platform_degraded",
                    serde_json::json!({
                        "platform": platform.as_str(),
                        "error": error.to_string(),
                    }),
                ));
                progress.on_platform_ready(platform, false, Some(&error.to_string()));
            }
        }
    }

    fn set_slot(
        &mut self,
        platform: &PlatformName,
        state: ConnectionState,
        connection: Option<Arc<dyn PlatformConnection>>,
        error: Option<&AdapterError>,
    ) {
        self.slots.insert(
            platform.clone(),
            ConnectionSlot {
                state,
                connection,
                last_error: error.map(|e| e.to_string()),
            },
        );
    }

    /// Connections currently `Ready`.
    pub fn ready_connections(&self) -> BTreeMap<PlatformName, Arc<dyn PlatformConnection>> {
        self.slots
            .iter()
            .filter(|(_, slot)| slot.state.is_ready())
            .filter_map(|(platform, slot)| {
                slot.connection
                    .as_ref()
                    .map(|conn| (platform.clone(), conn.clone()))
            })
            .collect()
    }

    pub fn state(&self, platform: &PlatformName) -> Option<ConnectionState> {
        self.slots.get(platform).map(|slot| slot.state)
    }

    pub fn states(&self) -> BTreeMap<PlatformName, ConnectionState> {
        self.slots
            .iter()
            .map(|(platform, slot)| (platform.clone(), slot.state))
            .collect()
    }

    /// Degraded platforms with their last error.
    pub fn degraded(&self) -> BTreeMap<PlatformName, String> {
        self.slots
            .iter()
            .filter(|(_, slot)| slot.state == ConnectionState::Degraded)
            .map(|(platform, slot)| {
                (
                    platform.clone(),
                    slot.last_error.clone().unwrap_or_default(),
                )
            })
            .collect()
    }

    /// Close every open connection.
    ///
    /// All closes run to completion (each bounded by the close timeout) and
    /// every failure is collected. Afterwards every slot is `Closed`.
    pub async fn stop_all(&mut self) -> Result<(), StopError> {
        let open: Vec<(PlatformName, Arc<dyn PlatformConnection>)> = self
            .slots
            .iter_mut()
            .filter_map(|(platform, slot)| {
                slot.state = ConnectionState::Closed;
                slot.connection.take().map(|conn| (platform.clone(), conn))
            })
            .collect();

        if open.is_empty() {
            return Ok(());
        }
        info!("Closing {} platform connection(s)", open.len());

        let close_timeout = self.close_timeout;
        let closes = open.into_iter().map(|(platform, connection)| async move {
            let result = match tokio::time::timeout(close_timeout, connection.close()).await {
                Ok(result) => result,
                Err(_) => Err(AdapterError::Timeout(format!(
                    "close exceeded {:?}",
                    close_timeout
                ))),
            };
            (platform, result)
        });

        let failures: Vec<(PlatformName, AdapterError)> = futures::future::join_all(closes)
            .await
            .into_iter()
            .filter_map(|(platform, result)| match result {
                Ok(()) => None,
                Err(error) => {
                    warn!("Failed to close {}: {}", platform, error);
                    Some((platform, error))
                }
            })
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(StopError { failures })
        }
    }
}

async fn connect_with_retry(
    adapter: &dyn PlatformAdapter,
    spec: &PlatformSpec,
    attempts: u32,
    retry_delay: Duration,
) -> Result<Arc<dyn PlatformConnection>, AdapterError> {
    let mut last_error = AdapterError::Handshake("no attempt made".to_string());

    for attempt in 1..=attempts {
        debug!(
            "Connecting to {} (attempt {}/{}, timeout {:?})",
            spec.name, attempt, attempts, spec.init_timeout
        );
        match tokio::time::timeout(spec.init_timeout, adapter.connect(spec)).await {
            Ok(Ok(connection)) => return Ok(connection),
            Ok(Err(error)) => last_error = error,
            Err(_) => {
                last_error = AdapterError::Timeout(format!(
                    "handshake exceeded {:?}",
                    spec.init_timeout
                ))
            }
        }

        if attempt < attempts {
            warn!(
                "Connecting to {} failed ({}), retrying in {:?}",
                spec.name, last_error, retry_delay
            );
            tokio::time::sleep(retry_delay).await;
        }
    }

    Err(last_error)
}
