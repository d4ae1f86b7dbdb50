use clap::{ArgAction, Parser, Subcommand};
use commands::{backup, config, inspect, restore, users, GlobalArgs};
use playstate_config::{Config, PathManager};
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "playstate")]
#[command(about = "Back up and restore Jellyfin playback state by IMDB/TMDB/TVDB ID")]
#[command(version)]
struct Cli {
    /// Raise log file verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Jellyfin server URL, e.g. http://192.168.1.14:8096
    #[arg(long, global = true)]
    server_url: Option<String>,

    /// Jellyfin API key (Dashboard > API Keys)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Append the verbose log to this file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Fail instead of prompting for missing values
    #[arg(long, action = ArgAction::SetTrue, global = true)]
    non_interactive: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Back up a user's playback state to a JSON file
    #[command(long_about = "Read played status, playback position and favorite flag of every movie and episode a user can see, and write them to a backup file keyed by IMDB/TMDB/TVDB IDs.")]
    Backup {
        /// User name or ID to back up (prompts when omitted)
        #[arg(long, conflicts_with = "all_users")]
        user: Option<String>,

        /// Back up every server user into one file
        #[arg(long, action = ArgAction::SetTrue)]
        all_users: bool,

        /// Backup file to write
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,

        /// Only back up items the user has marked played
        #[arg(long, action = ArgAction::SetTrue)]
        played_only: bool,
    },
    /// Restore a backup onto a user, on this or another server
    #[command(long_about = "Load a backup file, index every item on the target server by external ID, and apply each record's playback state to the target user. Records whose IDs are not found on the target are skipped and reported. Files holding several users, including flat exports of the older backup scripts, ask which backed-up user to restore from.")]
    Restore {
        /// Target user name or ID (prompts when omitted)
        #[arg(long)]
        user: Option<String>,

        /// Backed-up user to restore from, when the file holds several
        #[arg(long)]
        source_user: Option<String>,

        /// Backup file to read
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,

        /// Resolve every record and report, without changing anything
        #[arg(long, action = ArgAction::SetTrue)]
        dry_run: bool,
    },
    /// List the users of the server
    Users,
    /// Summarize a backup file without contacting a server
    Inspect {
        /// Backup file (defaults to the configured one)
        file: Option<PathBuf>,
    },
    /// Show or change stored settings
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration (API key masked)
    Show,

    /// Store the server URL and API key
    #[command(long_about = "Save the Jellyfin server URL to the config file and the API key to the credentials file. Values not given as flags are prompted for.")]
    Server {
        /// Server URL
        #[arg(long)]
        url: Option<String>,

        /// API key
        #[arg(long)]
        api_key: Option<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let paths = PathManager::default();
    let config_file = paths.config_file();
    let config = Config::load_or_default(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    config
        .validate()
        .map_err(|e| color_eyre::eyre::eyre!("Invalid config in {}: {}", config_file.display(), e))?;

    let log_file = cli
        .log_file
        .clone()
        .or_else(|| config.logging.file.clone())
        .unwrap_or_else(|| paths.log_file());
    logging::init_logging(cli.verbose, cli.quiet, &log_file).map_err(|e| color_eyre::eyre::eyre!("{}", e))?;
    tracing::debug!(log_file = %log_file.display(), config_file = %config_file.display(), "Starting playstate");

    let output = output::Output::new(cli.output, cli.quiet);
    let global = GlobalArgs {
        server_url: cli.server_url,
        api_key: cli.api_key,
        non_interactive: cli.non_interactive,
    };

    match cli.command {
        Commands::Backup { user, all_users, file, played_only } => {
            let selection = if all_users {
                backup::UserSelection::All
            } else {
                backup::UserSelection::One(user)
            };
            backup::run_backup(&global, &config, &paths, selection, file, played_only, &output).await
        }
        Commands::Restore { user, source_user, file, dry_run } => {
            let args = restore::RestoreArgs { user, source_user, file, dry_run };
            restore::run_restore(&global, &config, &paths, args, &output).await
        }
        Commands::Users => users::run_users(&global, &config, &paths, &output).await,
        Commands::Inspect { file } => inspect::run_inspect(&config, file, &output),
        Commands::Config { cmd } => config::run_config(cmd, &global, &config, &paths, &output),
    }
}
