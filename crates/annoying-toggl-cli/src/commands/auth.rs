use std::io::BufRead;

use annoying_toggl_core::{Config, TimeTracker};
use clap::Subcommand;

use super::{block_on, require_client, CliResult};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Store a Toggl API token after checking it against the service
    Login {
        /// API token (read from stdin when omitted)
        #[arg(long)]
        token: Option<String>,
    },
    /// Remove the stored token
    Logout,
    /// Check authentication status
    Status,
}

pub fn run(action: AuthAction) -> CliResult {
    match action {
        AuthAction::Login { token } => {
            let token = match token {
                Some(t) => t,
                None => read_token()?,
            };
            let mut config = Config::load()?;
            config.set_value("api_token", token.trim())?;

            let client = require_client(&config)?;
            let workspaces = block_on(async move { client.workspaces().await })??;
            config.save()?;
            match workspaces.first() {
                Some(ws) => println!("Toggl authenticated (workspace: {})", ws.name),
                None => println!("Toggl authenticated (no workspaces)"),
            }
        }
        AuthAction::Logout => {
            let mut config = Config::load()?;
            config.api_token.clear();
            config.save()?;
            println!("Toggl disconnected");
        }
        AuthAction::Status => {
            let config = Config::load()?;
            if config.has_credential() {
                println!("authenticated ({})", config.masked_token());
            } else {
                println!("not authenticated");
            }
        }
    }
    Ok(())
}

fn read_token() -> CliResult<String> {
    eprint!("Toggl API token: ");
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let token = line.trim().to_string();
    if token.is_empty() {
        return Err("no token given".into());
    }
    Ok(token)
}
