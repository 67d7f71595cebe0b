pub mod auth;
pub mod config;
pub mod run;
pub mod status;
pub mod switch;

use std::future::Future;
use std::time::Duration;

use annoying_toggl_core::{Config, TogglClient};

pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Drive one async command to completion on a fresh runtime.
pub fn block_on<F: Future>(future: F) -> CliResult<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let output = runtime.block_on(future);
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    Ok(output)
}

/// The configured client, or an error telling the user how to add one.
pub fn require_client(config: &Config) -> CliResult<TogglClient> {
    config
        .toggl_client()?
        .ok_or_else(|| "not authenticated; run `annoying-toggl auth login --token <TOKEN>`".into())
}
