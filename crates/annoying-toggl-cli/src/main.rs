use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod prompt;

#[derive(Parser)]
#[command(
    name = "annoying-toggl",
    version,
    about = "Nags you until a Toggl timer is running"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the reminder loop in this terminal
    Run {
        /// Override the configured check interval (minutes)
        #[arg(long)]
        interval: Option<u32>,
        /// Override the configured mute duration (minutes)
        #[arg(long)]
        mute: Option<u32>,
    },
    /// Show the running entry and reminder settings
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Stop the running entry and start a new one with this description
    Switch {
        /// New entry description
        description: String,
    },
    /// Toggl credential management
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::Run { interval, mute } => commands::run::run(interval, mute),
        Commands::Status { json } => commands::status::run(json),
        Commands::Switch { description } => commands::switch::run(&description),
        Commands::Auth { action } => commands::auth::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
