//! Bootstrap steps and the contracts of the subsystems they initialize.

use anyhow::Result;
use async_trait::async_trait;

use crate::connectivity::NetworkStatus;

/// One stage of the startup sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BootstrapStep {
    ApiInit,
    Settings,
    Connectivity,
    Realtime,
    RecentItems,
}

impl BootstrapStep {
    /// Execution order. Each step starts only after the previous one returned.
    pub const ORDER: [BootstrapStep; 5] = [
        BootstrapStep::ApiInit,
        BootstrapStep::Settings,
        BootstrapStep::Connectivity,
        BootstrapStep::Realtime,
        BootstrapStep::RecentItems,
    ];

    /// A failed fatal step aborts the sequence.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BootstrapStep::ApiInit)
    }

    /// Whether the step's work has finished when it returns. Realtime and
    /// recent items only start background work.
    pub fn is_awaited(&self) -> bool {
        !matches!(self, BootstrapStep::Realtime | BootstrapStep::RecentItems)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BootstrapStep::ApiInit => "api",
            BootstrapStep::Settings => "settings",
            BootstrapStep::Connectivity => "connectivity",
            BootstrapStep::Realtime => "realtime",
            BootstrapStep::RecentItems => "recent-items",
        }
    }
}

impl std::fmt::Display for BootstrapStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Makes the API layer ready to serve requests.
#[async_trait]
pub trait ApiInitializer: Send + Sync {
    async fn initialize(&self) -> Result<()>;
}

pub trait SettingsInitializer: Send + Sync {
    /// Load persisted settings, falling back to defaults. Never fails.
    fn initialize_settings(&self);
}

#[async_trait]
pub trait ConnectivityCheck: Send + Sync {
    async fn check_status(&self) -> Result<NetworkStatus>;
}

pub trait RealtimeOpener: Send + Sync {
    /// Start connecting in the background. Errors only if the connection
    /// cannot even be started.
    fn open(&self) -> Result<()>;
}

pub trait RecentLoader: Send + Sync {
    /// Start loading the recent list in the background.
    fn load_recent(&self) -> Result<()>;
}
