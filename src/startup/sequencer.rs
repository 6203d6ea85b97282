//! Ordered session bootstrap.
//!
//! ```text
//! api.initialize()          // awaited, fatal on failure
//! settings.initialize()     // sync
//! connectivity.check()      // awaited, failure logged
//! realtime.open()           // background; initiation failure logged
//! recent.load()             // background; initiation failure logged
//! ```
//!
//! Only the API step can abort the sequence. Every later step is attempted
//! even when an earlier non-fatal one fails.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::steps::{
    ApiInitializer, BootstrapStep, ConnectivityCheck, RealtimeOpener, RecentLoader,
    SettingsInitializer,
};
use crate::connectivity::NetworkStatus;

/// Fatal bootstrap failure. The session cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("API initialization failed")]
    ApiInit(#[source] anyhow::Error),
}

/// Non-fatal failure of one step, recorded in the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    pub step: BootstrapStep,
    pub message: String,
}

/// State of each bootstrap step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StepStatus {
    #[default]
    NotStarted,
    Success,
    Failed(String),
}

impl StepStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, StepStatus::Success)
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepStatus::NotStarted => write!(f, "not started"),
            StepStatus::Success => write!(f, "ok"),
            StepStatus::Failed(message) => write!(f, "failed: {}", message),
        }
    }
}

/// Result of a completed (non-aborted) bootstrap run.
#[derive(Debug, Clone)]
pub struct BootstrapReport {
    pub network: NetworkStatus,
    pub failures: Vec<StepFailure>,
}

impl BootstrapReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs the fixed startup sequence over the session's subsystems.
pub struct BootstrapSequencer {
    api: Arc<dyn ApiInitializer>,
    settings: Arc<dyn SettingsInitializer>,
    connectivity: Arc<dyn ConnectivityCheck>,
    realtime: Arc<dyn RealtimeOpener>,
    recent: Arc<dyn RecentLoader>,
    statuses: HashMap<BootstrapStep, StepStatus>,
    runs: u32,
}

impl BootstrapSequencer {
    pub fn new(
        api: Arc<dyn ApiInitializer>,
        settings: Arc<dyn SettingsInitializer>,
        connectivity: Arc<dyn ConnectivityCheck>,
        realtime: Arc<dyn RealtimeOpener>,
        recent: Arc<dyn RecentLoader>,
    ) -> Self {
        Self {
            api,
            settings,
            connectivity,
            realtime,
            recent,
            statuses: HashMap::new(),
            runs: 0,
        }
    }

    pub fn status(&self, step: BootstrapStep) -> StepStatus {
        self.statuses.get(&step).cloned().unwrap_or_default()
    }

    fn set_status(&mut self, step: BootstrapStep, status: StepStatus) {
        self.statuses.insert(step, status);
    }

    /// Run every step in `BootstrapStep::ORDER`.
    ///
    /// Not idempotent: a second call re-runs every step. Callers run this
    /// once per session.
    pub async fn run(&mut self) -> Result<BootstrapReport, BootstrapError> {
        self.runs += 1;
        if self.runs > 1 {
            warn!(
                "Bootstrap already ran {} time(s) this session; re-running every step",
                self.runs - 1
            );
        }
        self.statuses.clear();

        let mut report = BootstrapReport {
            network: NetworkStatus::Unknown,
            failures: Vec::new(),
        };

        for step in BootstrapStep::ORDER {
            debug!("Bootstrap step '{}' starting", step);

            match self.run_step(step, &mut report).await {
                Ok(()) => {
                    if !step.is_awaited() {
                        debug!("Bootstrap step '{}' continues in the background", step);
                    }
                    self.set_status(step, StepStatus::Success);
                }
                Err(e) if step.is_fatal() => {
                    error!("❌ Bootstrap step '{}' failed: {:#}", step, e);
                    self.set_status(step, StepStatus::Failed(format!("{:#}", e)));
                    return Err(BootstrapError::ApiInit(e));
                }
                Err(e) => {
                    let message = format!("{:#}", e);
                    warn!("⚠️  Bootstrap step '{}' failed, continuing: {}", step, message);
                    self.set_status(step, StepStatus::Failed(message.clone()));
                    report.failures.push(StepFailure { step, message });
                }
            }
        }

        info!(
            "✅ Bootstrap complete ({} recoverable failure(s))",
            report.failures.len()
        );
        Ok(report)
    }

    async fn run_step(
        &self,
        step: BootstrapStep,
        report: &mut BootstrapReport,
    ) -> anyhow::Result<()> {
        match step {
            BootstrapStep::ApiInit => {
                info!("🔗 Initializing API layer...");
                self.api.initialize().await
            }
            BootstrapStep::Settings => {
                self.settings.initialize_settings();
                Ok(())
            }
            BootstrapStep::Connectivity => {
                let status = self.connectivity.check_status().await?;
                info!("🌐 Network status: {}", status);
                report.network = status;
                Ok(())
            }
            BootstrapStep::Realtime => self.realtime.open(),
            BootstrapStep::RecentItems => self.recent.load_recent(),
        }
    }
}
