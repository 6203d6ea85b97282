//! Realtime channel to the backend.
//!
//! The backend pushes newline-delimited JSON messages on `GET api/events`.
//! `open()` only starts a background task; that task connects, fans every
//! message out to subscribers, and reconnects with backoff for as long as
//! the session lives.

use anyhow::{Context, Result};
use futures_util::StreamExt;
use serde::Deserialize;
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::api::{add_jitter, backoff_delay, ApiClient, ApiStore};
use crate::startup::RealtimeOpener;

/// Buffered messages per subscriber before the slowest one starts lagging
const EVENT_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Idle,
    Connecting,
    Connected,
    /// Waiting before reconnect attempt `attempt` (1-based)
    Reconnecting { attempt: usize },
    Closed,
}

impl std::fmt::Display for ChannelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelState::Idle => write!(f, "idle"),
            ChannelState::Connecting => write!(f, "connecting"),
            ChannelState::Connected => write!(f, "connected"),
            ChannelState::Reconnecting { attempt } => {
                write!(f, "reconnecting (attempt {})", attempt)
            }
            ChannelState::Closed => write!(f, "closed"),
        }
    }
}

/// One message pushed by the backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

/// Splits a byte stream into complete lines.
#[derive(Default)]
struct LineBuffer {
    buffer: String,
}

impl LineBuffer {
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));

        let mut lines = Vec::new();
        while let Some(newline_pos) = self.buffer.find('\n') {
            let line = self.buffer[..newline_pos].trim().to_string();
            self.buffer.drain(..=newline_pos);
            if !line.is_empty() {
                lines.push(line);
            }
        }
        lines
    }

    /// Whatever is left after the stream ends.
    fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        let rest = rest.trim();
        (!rest.is_empty()).then(|| rest.to_string())
    }
}

pub struct RealtimeChannel {
    api: Arc<ApiStore>,
    events: broadcast::Sender<ServerMessage>,
    state_tx: Arc<watch::Sender<ChannelState>>,
    state_rx: watch::Receiver<ChannelState>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl RealtimeChannel {
    pub fn new(api: Arc<ApiStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let (state_tx, state_rx) = watch::channel(ChannelState::Idle);
        Self {
            api,
            events,
            state_tx: Arc::new(state_tx),
            state_rx,
            task: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ChannelState {
        *self.state_rx.borrow()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.events.subscribe()
    }

    /// Stop the background task. The channel can be opened again.
    pub fn close(&self) {
        let handle = match self.task.lock() {
            Ok(mut task) => task.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            handle.abort();
            info!("Realtime channel closed");
        }
        let _ = self.state_tx.send(ChannelState::Closed);
    }
}

impl Drop for RealtimeChannel {
    fn drop(&mut self) {
        if let Ok(mut task) = self.task.lock() {
            if let Some(handle) = task.take() {
                handle.abort();
            }
        }
    }
}

impl RealtimeOpener for RealtimeChannel {
    fn open(&self) -> Result<()> {
        let runtime = tokio::runtime::Handle::try_current()
            .context("Realtime channel needs a running tokio runtime")?;

        let mut task = match self.task.lock() {
            Ok(task) => task,
            Err(poisoned) => poisoned.into_inner(),
        };
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            debug!("Realtime channel already open");
            return Ok(());
        }

        let api = self.api.clone();
        let events = self.events.clone();
        let state = self.state_tx.clone();
        *task = Some(runtime.spawn(run_channel(api, events, state)));

        info!("📡 Realtime channel opening in background");
        Ok(())
    }
}

async fn run_channel(
    api: Arc<ApiStore>,
    events: broadcast::Sender<ServerMessage>,
    state: Arc<watch::Sender<ChannelState>>,
) {
    let mut attempt = 0usize;

    loop {
        let _ = state.send(ChannelState::Connecting);

        match connect_and_consume(&api, &events, &state, &mut attempt).await {
            Ok(()) => debug!("Realtime stream ended by server"),
            Err(e) => warn!("Realtime channel error: {:#}", e),
        }

        let delay = add_jitter(backoff_delay(attempt));
        attempt += 1;
        let _ = state.send(ChannelState::Reconnecting { attempt });
        debug!("Reconnecting realtime channel in {:?} (attempt {})", delay, attempt);
        sleep(delay).await;
    }
}

async fn connect_and_consume(
    api: &ApiStore,
    events: &broadcast::Sender<ServerMessage>,
    state: &watch::Sender<ChannelState>,
    attempt: &mut usize,
) -> Result<()> {
    let base = api.base_url().await?;
    let url = ApiClient::endpoint(&base, &["api", "events"])?;
    let response = api.client().open_stream(&url).await?;

    *attempt = 0;
    let _ = state.send(ChannelState::Connected);
    info!("📡 Realtime channel connected");

    let mut stream = response.bytes_stream();
    let mut lines = LineBuffer::default();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("Failed to read realtime stream")?;
        for line in lines.push(&chunk) {
            dispatch(events, &line);
        }
    }
    if let Some(line) = lines.finish() {
        dispatch(events, &line);
    }

    Ok(())
}

fn dispatch(events: &broadcast::Sender<ServerMessage>, line: &str) {
    match serde_json::from_str::<ServerMessage>(line) {
        Ok(message) => {
            debug!("Realtime message: {}", message.kind);
            // No subscribers is fine
            let _ = events.send(message);
        }
        Err(e) => warn!("Ignoring malformed realtime message: {}", e),
    }
}
