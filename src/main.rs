use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

mod api;
mod assets;
mod cli;
mod config;
mod connectivity;
mod notifications;
mod realtime;
mod recent;
mod runtime;
mod settings;
mod startup;

use assets::{AssetType, DeleteError, DeleteOutcome, SharedAssetStore};
use cli::{Cli, Commands};
use config::AppConfig;
use notifications::NotificationLevel;
use runtime::Runtime;
use startup::{
    BootstrapReport, BootstrapSequencer, BootstrapStep, RecentLoader, SettingsInitializer,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::new(cli.api_url, cli.probe_url, cli.cache_dir)?;

    match cli.command {
        Some(Commands::Start { project }) => {
            run_start(&config, project).await?;
        }
        Some(Commands::Delete {
            asset_type,
            id,
            select,
        }) => {
            run_delete(&config, &asset_type, &id, select).await?;
        }
        Some(Commands::Recent) => {
            run_recent(&config).await?;
        }
        Some(Commands::Enable { id }) => {
            run_set_enabled(&config, &id, true)?;
        }
        Some(Commands::Disable { id }) => {
            run_set_enabled(&config, &id, false)?;
        }
        None => {
            eprintln!("No command specified. Use --help for usage information.");
            eprintln!("Use 'assetdesk start' to bootstrap a session.");
        }
    }

    Ok(())
}

/// Bootstrap a fresh session; a failed API init aborts the command.
async fn bootstrap(config: &AppConfig) -> Result<Runtime> {
    let runtime = Runtime::new(config)?;
    let mut sequencer = runtime.sequencer();
    let report = sequencer.run().await?;
    print_report(&sequencer, &report);
    Ok(runtime)
}

fn print_report(sequencer: &BootstrapSequencer, report: &BootstrapReport) {
    for step in BootstrapStep::ORDER {
        match report.failures.iter().find(|f| f.step == step) {
            Some(failure) => println!("⚠️  {}: unavailable ({})", step, failure.message),
            None => {
                let status = sequencer.status(step);
                let icon = if status.is_success() { "✅" } else { "⏸️ " };
                println!("{} {}: {}", icon, step, status);
            }
        }
    }
    println!("🌐 Network: {}", report.network);
    if !report.is_clean() {
        println!("   Continuing with {} degraded subsystem(s)", report.failures.len());
    }
}

async fn print_selection(store: &SharedAssetStore) {
    let store = store.read().await;
    match store.selected_id() {
        Some(id) => println!(
            "📝 Selection: '{}' (unsaved changes: {})",
            id,
            if store.selection().is_dirty() { "yes" } else { "no" }
        ),
        None => println!("📝 Selection: none"),
    }
}

async fn run_start(config: &AppConfig, project: Option<String>) -> Result<()> {
    let runtime = bootstrap(config).await?;

    if let Some(project) = project {
        let path = PathBuf::from(&project)
            .canonicalize()
            .with_context(|| format!("Failed to canonicalize project directory: {}", project))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| project.clone());
        runtime.recent.record(&name, &path).await?;
        println!("📂 Opened project {} ({})", name, path.display());
    }

    let service = runtime.asset_service();
    for asset_type in [AssetType::Agent, AssetType::Material] {
        match service.refresh(asset_type).await {
            Ok(_) => {
                let store = runtime.assets.read().await;
                let assets = store.list(asset_type);
                let enabled = assets
                    .iter()
                    .filter(|a| runtime.settings.is_asset_enabled(&a.id, a.enabled))
                    .count();
                println!(
                    "   {}: {} loaded, {} enabled",
                    asset_type.collection(),
                    assets.len(),
                    enabled
                );
            }
            Err(e) => warn!("Failed to load {}: {:#}", asset_type.collection(), e),
        }
    }
    {
        let store = runtime.assets.read().await;
        if store.is_empty() {
            println!("   No assets available");
        } else {
            println!("   {} asset(s) in total", store.len());
        }
    }

    let mut events = runtime.realtime.subscribe();
    println!("📡 Listening for backend events. Press Ctrl-C to stop.");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(message) => println!(
                    "   event: {} {}",
                    message.kind,
                    serde_json::Value::Object(message.payload)
                ),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Dropped {} realtime event(s)", skipped);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    println!(
        "🌐 Network: {}  📡 Realtime: {}",
        runtime.connectivity.status().await,
        runtime.realtime.state()
    );
    runtime.realtime.close();
    Ok(())
}

async fn run_delete(config: &AppConfig, asset_type: &str, id: &str, select: bool) -> Result<()> {
    let asset_type: AssetType = asset_type.parse().map_err(anyhow::Error::msg)?;
    let runtime = bootstrap(config).await?;

    if select {
        let asset = runtime.asset_service().select(asset_type, id).await?;
        println!("📝 Selected {} '{}'", asset_type, asset.id);
    }

    let handler = runtime.delete_handler(asset_type);
    let outcome = handler.handle_delete(id).await;
    let mut failure = None;

    match outcome {
        Ok(DeleteOutcome::NotSelected) => {
            println!("🗑️  Deleted {} '{}'", handler.asset_type(), id);
        }
        Ok(DeleteOutcome::Reloaded(asset)) => {
            println!("🗑️  Deleted override of {} '{}'", handler.asset_type(), id);
            runtime
                .notifications
                .push_info(
                    "Override removed",
                    format!("Reloaded default definition of '{}'", asset.id),
                )
                .await;
        }
        Ok(DeleteOutcome::SelectionStale { id }) => {
            runtime.assets.write().await.clear_selection();
            println!(
                "🗑️  Deleted {} '{}'; cleared the selection",
                handler.asset_type(),
                id
            );
        }
        // Already queued as a notification; report it after the queue
        Err(e @ DeleteError::ReplacementFetch { .. }) => failure = Some(e),
        Err(e) => {
            runtime.realtime.close();
            return Err(e.into());
        }
    }

    print_selection(&runtime.assets).await;

    let pending = runtime.notifications.pending_count().await;
    if pending > 0 {
        println!("🔔 {} notification(s)", pending);
    }
    for notification in runtime.notifications.drain().await {
        let icon = match notification.level {
            NotificationLevel::Info => "ℹ️ ",
            NotificationLevel::Error => "❌",
        };
        println!(
            "{} [{}] {}: {}",
            icon,
            notification.created_at.format("%H:%M:%S"),
            notification.title,
            notification.message
        );
    }

    runtime.realtime.close();
    match failure {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

async fn run_recent(config: &AppConfig) -> Result<()> {
    let runtime = Runtime::new(config)?;
    runtime.recent.load_recent()?;
    runtime.recent.wait_loaded().await;

    let projects = runtime.recent.projects().await;
    if projects.is_empty() {
        println!("No recent projects.");
        return Ok(());
    }

    for project in projects {
        println!(
            "📂 {}  {}  (last opened {})",
            project.name,
            project.path.display(),
            project.last_opened.format("%Y-%m-%d %H:%M")
        );
    }

    Ok(())
}

fn run_set_enabled(config: &AppConfig, id: &str, enabled: bool) -> Result<()> {
    let runtime = Runtime::new(config)?;
    runtime.settings.initialize_settings();
    runtime.settings.set_asset_enabled(id, enabled)?;

    println!(
        "✅ {} '{}' (saved to {})",
        if enabled { "Enabled" } else { "Disabled" },
        id,
        runtime.settings.settings_path().display()
    );
    Ok(())
}
