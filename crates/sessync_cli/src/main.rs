//! SessSync CLI
//!
//! Command-line runner for incremental session sync jobs.
//!
//! # Commands
//!
//! - `run` - Sync sessions from the remote platform, once or on an interval
//! - `cursor show` / `cursor reset` - Inspect or rewind a job cursor
//! - `sessions list` / `sessions show` - Inspect mirrored sessions

mod client;
mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Default collection path of the event sessions job.
const DEFAULT_ENDPOINT: &str = "events/-/sessions/";

/// Incremental event session sync.
#[derive(Parser)]
#[command(name = "sessync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Data directory holding sessions, cursors and locks
    #[arg(global = true, short, long, env = "SESSYNC_DATA_DIR", default_value = "sessync-data")]
    data_dir: PathBuf,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync sessions from the remote platform
    Run {
        /// Remote platform host
        #[arg(long, env = "SESSYNC_PLATFORM")]
        platform: String,

        /// API username
        #[arg(long, env = "SESSYNC_USERNAME")]
        username: String,

        /// API password
        #[arg(long, env = "SESSYNC_PASSWORD", hide_env_values = true)]
        password: String,

        /// Collection endpoint
        #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
        endpoint: String,

        /// Records per page (1-250)
        #[arg(long, default_value = "250")]
        page_size: u32,

        /// Per-page fetch timeout in seconds
        #[arg(long, default_value = "30")]
        timeout: u64,

        /// Repeat the run every N seconds
        #[arg(short, long)]
        interval: Option<u64>,

        /// Give up after this many consecutive pages without progress
        #[arg(long, default_value = "10")]
        max_stalled_pages: u32,
    },

    /// Inspect or rewind a job cursor
    Cursor {
        /// Collection endpoint
        #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
        endpoint: String,

        #[command(subcommand)]
        action: CursorAction,
    },

    /// Inspect mirrored sessions
    Sessions {
        #[command(subcommand)]
        action: SessionsAction,
    },
}

#[derive(Subcommand)]
enum CursorAction {
    /// Print the saved cursor
    Show {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Rewind the cursor so the next run starts from the beginning
    Reset,
}

#[derive(Subcommand)]
enum SessionsAction {
    /// List mirrored sessions
    List {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Show one session by external id
    Show {
        /// External session id
        source_id: u64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let default = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Run {
            platform,
            username,
            password,
            endpoint,
            page_size,
            timeout,
            interval,
            max_stalled_pages,
        } => {
            let args = commands::run::RunArgs {
                platform,
                username,
                password,
                endpoint,
                page_size,
                timeout_secs: timeout,
                interval_secs: interval,
                max_stalled_pages,
            };
            commands::run::run(&cli.data_dir, args)?;
        }
        Commands::Cursor { endpoint, action } => match action {
            CursorAction::Show { format } => {
                commands::cursor::show(&cli.data_dir, &endpoint, &format)?
            }
            CursorAction::Reset => commands::cursor::reset(&cli.data_dir, &endpoint)?,
        },
        Commands::Sessions { action } => match action {
            SessionsAction::List { format } => commands::sessions::list(&cli.data_dir, &format)?,
            SessionsAction::Show { source_id } => {
                commands::sessions::show(&cli.data_dir, source_id)?
            }
        },
    }

    Ok(())
}
