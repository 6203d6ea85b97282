//! Session bootstrap.
//!
//! Brings the client's subsystems to a ready state in a fixed order before
//! anything else touches them. The API layer is the only hard dependency:
//! if it cannot be initialized the session is unusable and the sequence
//! stops. Everything after it degrades gracefully.

mod sequencer;
mod steps;

pub use sequencer::{BootstrapReport, BootstrapSequencer};
pub use steps::{
    ApiInitializer, BootstrapStep, ConnectivityCheck, RealtimeOpener, RecentLoader,
    SettingsInitializer,
};
