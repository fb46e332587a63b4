use clap::{ArgAction, Parser, Subcommand};
use focusflow_config::PathManager;
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "focusflow")]
#[command(about = "FocusFlow - distraction-reduced video sessions with a durable watch history")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a video link and start an interactive focus session
    #[command(long_about = "Resolve a pasted video link against the watch history, activate the \
matching session (creating one for never-seen videos), and enter the interactive focus session: \
edit notes, track progress, and generate AI study aids. Without a URL, pick a session from the \
history instead.")]
    Load {
        /// Video link (watch/short/embed URL or a bare 11-character id)
        url: Option<String>,
    },
    /// Inspect and manage the watch history
    History {
        #[command(subcommand)]
        cmd: Option<HistoryCommands>,
    },
    /// Show or change configuration
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// List all history records, most recent first
    List,
    /// Delete one record by id
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long, action = ArgAction::SetTrue)]
        yes: bool,
    },
    /// Export the history to a JSON file
    Export { file: PathBuf },
    /// Replace the history with the records from a JSON file (all-or-nothing)
    Import {
        file: PathBuf,
        /// Skip the confirmation prompt
        #[arg(long, action = ArgAction::SetTrue)]
        yes: bool,
    },
    /// Delete all history records
    Clear {
        /// Skip the confirmation prompt
        #[arg(long, action = ArgAction::SetTrue)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration (masks the API key)
    Show,
    /// Configure the Gemini study-aid generator
    #[command(long_about = "Configure the Gemini model and API key used for study aid generation. \
The key is prompted for without echo unless --api-key is given, and is stored in the credentials \
file; the GEMINI_API_KEY environment variable takes precedence at runtime.")]
    Gemini {
        /// Model name (e.g. gemini-2.0-flash)
        #[arg(long)]
        model: Option<String>,

        /// API key (if not provided, will prompt)
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Configure the embedded player parameters
    Player {
        /// Start playback automatically
        #[arg(long)]
        autoplay: Option<bool>,

        /// Show the native player controls
        #[arg(long)]
        controls: Option<bool>,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    // The interactive session logs to a file so tracing output does not fight
    // with the terminal UI; everything else logs to stderr.
    let log_file = match cli.command {
        Commands::Load { .. } => Some(PathManager::default().log_file()),
        _ => None,
    };
    logging::init_logging(cli.verbose, cli.quiet, log_file)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Load { url } => commands::load::run_load(url, &output).await,
        Commands::History { cmd } => {
            commands::history::run_history(cmd.unwrap_or(HistoryCommands::List), &output)
        }
        Commands::Config { cmd } => {
            commands::config::run_config(cmd.unwrap_or(ConfigCommands::Show), &output)
        }
    }
}
