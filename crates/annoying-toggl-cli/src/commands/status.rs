use annoying_toggl_core::error::Result;
use annoying_toggl_core::{Config, TimeEntry, TimeTracker, TogglClient, Workspace};
use serde::Serialize;

use super::{block_on, CliResult};

#[derive(Serialize)]
struct StatusReport {
    authenticated: bool,
    workspace: Option<Workspace>,
    running: Option<TimeEntry>,
    check_interval_minutes: u32,
    mute_duration_minutes: u32,
}

pub fn run(json: bool) -> CliResult {
    let config = Config::load()?;
    let report = match config.toggl_client()? {
        Some(client) => block_on(fetch(client, &config))??,
        None => StatusReport {
            authenticated: false,
            workspace: None,
            running: None,
            check_interval_minutes: config.check_interval_minutes,
            mute_duration_minutes: config.mute_duration_minutes,
        },
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if !report.authenticated {
        println!("not authenticated");
    } else {
        match &report.workspace {
            Some(ws) => println!("workspace: {} ({})", ws.name, ws.id),
            None => println!("workspace: none"),
        }
        match &report.running {
            Some(entry) if entry.description.is_empty() => println!("running: (no description)"),
            Some(entry) => println!("running: {}", entry.description),
            None => println!("running: nothing"),
        }
    }
    println!("check every {} min", report.check_interval_minutes);
    println!("mute for {} min", report.mute_duration_minutes);
    Ok(())
}

async fn fetch(client: TogglClient, config: &Config) -> Result<StatusReport> {
    let workspace = client.workspaces().await?.into_iter().next();
    let running = client.current_entry().await?;
    Ok(StatusReport {
        authenticated: true,
        workspace,
        running,
        check_interval_minutes: config.check_interval_minutes,
        mute_duration_minutes: config.mute_duration_minutes,
    })
}
