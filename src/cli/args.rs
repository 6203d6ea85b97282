use clap::{Parser, Subcommand};

/// assetdesk - asset console client host
#[derive(Parser)]
#[command(name = "assetdesk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Backend base URL (defaults to http://localhost:8000)
    #[arg(long, env = "ASSETDESK_API_URL", global = true)]
    pub api_url: Option<String>,

    /// URL probed to decide whether the internet is reachable
    #[arg(long, env = "ASSETDESK_PROBE_URL", global = true)]
    pub probe_url: Option<String>,

    /// Directory for settings and recent projects. Defaults to ~/.assetdesk
    #[arg(long, env = "ASSETDESK_CACHE_DIR", global = true)]
    pub cache_dir: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Bootstrap the session and keep the realtime channel open until Ctrl-C
    Start {
        /// Project directory to open (recorded in recent projects)
        #[arg(short, long)]
        project: Option<String>,
    },
    /// Delete an asset and reconcile the current selection
    Delete {
        /// Asset type: agent, material or chat
        asset_type: String,

        /// Asset id
        id: String,

        /// Select the asset before deleting it
        #[arg(long)]
        select: bool,
    },
    /// Show recently opened projects
    Recent,
    /// Enable an asset in the user settings
    Enable {
        /// Asset id
        id: String,
    },
    /// Disable an asset in the user settings
    Disable {
        /// Asset id
        id: String,
    },
}
