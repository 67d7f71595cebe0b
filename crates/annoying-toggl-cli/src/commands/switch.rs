use std::sync::Arc;

use annoying_toggl_core::{
    Config, Prompt, PromptOutcome, PromptRequest, ReminderController, TogglClient,
};
use async_trait::async_trait;

use super::{block_on, require_client, CliResult};

/// `switch` never runs a check cycle, so this is never asked.
struct NoPrompt;

#[async_trait]
impl Prompt for NoPrompt {
    async fn ask(&self, _request: PromptRequest) -> PromptOutcome {
        PromptOutcome::Dismiss
    }
}

pub fn run(description: &str) -> CliResult {
    if description.trim().is_empty() {
        return Err("description must not be empty".into());
    }
    let config = Config::load()?;
    let client = require_client(&config)?;
    block_on(switch(client, description))?
}

async fn switch(client: TogglClient, description: &str) -> CliResult {
    let controller = ReminderController::new(Arc::new(NoPrompt));
    if controller.configure(client).await?.is_none() {
        return Err("account has no workspaces".into());
    }

    let previous = match controller.refresh_current().await? {
        Some(entry) => entry.description,
        None => return Err("no timer is running; nothing to switch".into()),
    };

    if controller.change_task(description).await? {
        println!("switched: {previous} -> {}", description.trim());
    }
    Ok(())
}
