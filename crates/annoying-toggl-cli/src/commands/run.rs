use std::sync::Arc;

use annoying_toggl_core::{
    Config, Event, ProgressInfo, ReminderController, ReminderService, StatusSnapshot, TogglClient,
};
use chrono::{DateTime, Local, Utc};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tracing::{info, warn};

use super::{block_on, require_client, CliResult, SHUTDOWN_GRACE};
use crate::prompt::{spawn_stdin_reader, AnswerSlot, TerminalPrompt};

const HELP: &str = "commands: mute [minutes] | interval <minutes> | status | logout | help";

pub fn run(interval: Option<u32>, mute: Option<u32>) -> CliResult {
    let mut config = Config::load()?;
    if let Some(minutes) = interval {
        config.check_interval_minutes = minutes;
    }
    if let Some(minutes) = mute {
        config.mute_duration_minutes = minutes;
    }
    config.validate()?;
    let client = require_client(&config)?;

    block_on(serve(config, client))?
}

async fn serve(config: Config, client: TogglClient) -> CliResult {
    let answers = AnswerSlot::new();
    let prompt = TerminalPrompt::new(Arc::clone(&answers));
    let controller = Arc::new(ReminderController::new(Arc::new(prompt)));
    controller.set_mute_minutes(config.mute_duration_minutes);
    let events = controller.subscribe();

    match controller.configure(client).await? {
        Some(ws) => info!(workspace = %ws.name, "using workspace"),
        None => warn!("account has no workspaces; checks will be skipped"),
    }

    let mut service =
        ReminderService::start(Arc::clone(&controller), config.check_interval_minutes);
    let printer = tokio::spawn(print_events(events));
    let progress = tokio::spawn(print_progress(Arc::clone(&controller), service.progress()));
    println!("{HELP}");

    let mut lines = spawn_stdin_reader();
    let mut input_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            res = &mut ctrl_c => {
                res?;
                break;
            }
            line = lines.recv(), if input_open => {
                let Some(line) = line else {
                    input_open = false;
                    answers.close();
                    continue;
                };
                // An open reminder takes the line as its answer.
                let Err(line) = answers.offer(line) else {
                    continue;
                };
                let command = match LineCommand::parse(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(message) => {
                        eprintln!("{message}");
                        continue;
                    }
                };
                match apply(&command, &mut service, Utc::now()) {
                    Flow::Continue => {}
                    Flow::Persist { key, value } => persist(key, &value),
                    Flow::LoggedOut => {
                        persist("api_token", "");
                        break;
                    }
                }
            }
        }
    }

    // An open prompt holds the check loop until stdin answers.
    if tokio::time::timeout(SHUTDOWN_GRACE, service.shutdown())
        .await
        .is_err()
    {
        warn!("reminder loop still busy; exiting anyway");
    }
    printer.abort();
    progress.abort();
    Ok(())
}

/// A line typed while no reminder is open.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LineCommand {
    /// `None` uses the configured mute duration.
    Mute(Option<u32>),
    Interval(u32),
    Status,
    Logout,
    Help,
}

impl LineCommand {
    fn parse(line: &str) -> Result<Option<Self>, String> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let arg = words.next();
        let minutes = |arg: Option<&str>| -> Result<u32, String> {
            arg.ok_or("missing minutes")?
                .parse::<u32>()
                .ok()
                .filter(|m| *m >= 1)
                .ok_or_else(|| "minutes must be a whole number of at least 1".to_string())
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "mute" | "m" => Self::Mute(arg.map(|a| minutes(Some(a))).transpose()?),
            "interval" => Self::Interval(minutes(arg)?),
            "status" => Self::Status,
            "logout" => Self::Logout,
            "help" | "?" => Self::Help,
            other => return Err(format!("unknown command: {other} ({HELP})")),
        };
        Ok(Some(command))
    }
}

/// What the session loop does after a command.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    /// Applied live; also write it to the config file.
    Persist { key: &'static str, value: String },
    LoggedOut,
}

fn apply(command: &LineCommand, service: &mut ReminderService, now: DateTime<Utc>) -> Flow {
    let controller = Arc::clone(service.controller());
    match command {
        LineCommand::Mute(minutes) => {
            let minutes = minutes.unwrap_or_else(|| controller.mute_minutes());
            controller.mute_for(minutes, now);
            println!("muted for {minutes} min");
            Flow::Continue
        }
        LineCommand::Interval(minutes) => {
            service.set_interval(*minutes);
            println!("checking every {minutes} min");
            Flow::Persist {
                key: "check_interval_minutes",
                value: minutes.to_string(),
            }
        }
        LineCommand::Status => {
            for line in status_lines(&controller.snapshot(now)) {
                println!("{line}");
            }
            Flow::Continue
        }
        LineCommand::Logout => {
            service.logout();
            println!("logged out");
            Flow::LoggedOut
        }
        LineCommand::Help => {
            println!("{HELP}");
            Flow::Continue
        }
    }
}

fn persist(key: &str, value: &str) {
    let saved = Config::load().and_then(|mut config| config.set(key, value));
    if let Err(e) = saved {
        warn!(error = %e, key, "could not save setting");
    }
}

fn status_lines(snapshot: &StatusSnapshot) -> Vec<String> {
    let mut lines = Vec::new();
    if !snapshot.configured {
        lines.push("not configured".to_string());
    } else if snapshot.current.description.is_empty() && snapshot.current.id.is_none() {
        lines.push("tracking: nothing".to_string());
    } else {
        lines.push(format!("tracking: {}", snapshot.current.description));
    }
    if let Some(until) = snapshot.muted_until {
        lines.push(format!(
            "muted until {}",
            until.with_timezone(&Local).format("%H:%M")
        ));
    }
    lines.push(usage_label(snapshot));
    lines
}

fn usage_label(snapshot: &StatusSnapshot) -> String {
    if snapshot.near_limit {
        format!("{} (near limit)", snapshot.usage_label)
    } else {
        snapshot.usage_label.clone()
    }
}

/// Fires once each time usage crosses into the warning zone.
#[derive(Debug, Default)]
struct NearLimitLatch {
    warned: bool,
}

impl NearLimitLatch {
    fn update(&mut self, near_limit: bool) -> bool {
        let fire = near_limit && !self.warned;
        self.warned = near_limit;
        fire
    }
}

async fn print_events(mut events: broadcast::Receiver<Event>) {
    loop {
        match events.recv().await {
            Ok(event) => {
                if let Some(line) = describe(&event) {
                    println!("{line}");
                }
            }
            Err(RecvError::Lagged(n)) => warn!(skipped = n, "event printer lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}

async fn print_progress(
    controller: Arc<ReminderController>,
    mut progress: watch::Receiver<Option<ProgressInfo>>,
) {
    let mut last_line = String::new();
    let mut latch = NearLimitLatch::default();
    while progress.changed().await.is_ok() {
        let current = progress.borrow_and_update().clone();
        let Some(info) = current else {
            continue;
        };
        let snapshot = controller.snapshot(Utc::now());
        if latch.update(snapshot.near_limit) {
            warn!(calls = snapshot.api_calls, "close to the hourly Toggl API budget");
        }
        let line = progress_line(&info, &snapshot);
        if line != last_line {
            eprintln!("[{:>3.0}%] {line}", info.value * 100.0);
            last_line = line;
        }
    }
}

fn progress_line(info: &ProgressInfo, snapshot: &StatusSnapshot) -> String {
    format!("{} | {}", info.label, usage_label(snapshot))
}

fn describe(event: &Event) -> Option<String> {
    match event {
        Event::TimerRunning { description, .. } => Some(format!("tracking: {description}")),
        Event::EntryStarted { description, .. } => Some(format!("started: {description}")),
        Event::Muted { until, .. } => Some(format!(
            "muted until {}",
            until.with_timezone(&Local).format("%H:%M")
        )),
        Event::CheckFailed { message, .. } => Some(format!("check failed: {message}")),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use annoying_toggl_core::CurrentEntry;

    fn snapshot(api_calls: u32) -> StatusSnapshot {
        StatusSnapshot {
            configured: true,
            workspace_id: Some(7),
            current: CurrentEntry {
                id: Some(42),
                description: "Writing docs".into(),
            },
            muted_until: None,
            api_calls,
            near_limit: api_calls > 25,
            usage_label: format!("API calls this hour: {api_calls}/30"),
        }
    }

    fn idle_service() -> ReminderService {
        let prompt = TerminalPrompt::new(AnswerSlot::new());
        let controller = Arc::new(ReminderController::new(Arc::new(prompt)));
        ReminderService::start(controller, 5)
    }

    #[test]
    fn describes_user_visible_events() {
        let started = Event::EntryStarted {
            entry_id: 1,
            description: "Review".into(),
            at: Utc::now(),
        };
        assert_eq!(describe(&started).as_deref(), Some("started: Review"));

        let failed = Event::CheckFailed {
            message: "HTTP 500".into(),
            at: Utc::now(),
        };
        assert_eq!(describe(&failed).as_deref(), Some("check failed: HTTP 500"));
    }

    #[test]
    fn skips_internal_events() {
        assert!(describe(&Event::LoggedOut { at: Utc::now() }).is_none());
    }

    #[test]
    fn parses_session_commands() {
        assert_eq!(LineCommand::parse("  "), Ok(None));
        assert_eq!(LineCommand::parse("mute"), Ok(Some(LineCommand::Mute(None))));
        assert_eq!(
            LineCommand::parse("mute 45"),
            Ok(Some(LineCommand::Mute(Some(45))))
        );
        assert_eq!(
            LineCommand::parse("Interval 10"),
            Ok(Some(LineCommand::Interval(10)))
        );
        assert_eq!(LineCommand::parse("logout"), Ok(Some(LineCommand::Logout)));
        assert_eq!(LineCommand::parse("status"), Ok(Some(LineCommand::Status)));
    }

    #[test]
    fn rejects_bad_commands() {
        assert!(LineCommand::parse("interval").is_err());
        assert!(LineCommand::parse("interval 0").is_err());
        assert!(LineCommand::parse("mute soon").is_err());
        assert!(LineCommand::parse("dance").is_err());
    }

    #[test]
    fn progress_line_carries_usage() {
        let info = ProgressInfo {
            value: 0.4,
            label: "Next check: 3 min".into(),
        };
        assert_eq!(
            progress_line(&info, &snapshot(4)),
            "Next check: 3 min | API calls this hour: 4/30"
        );
        assert_eq!(
            progress_line(&info, &snapshot(26)),
            "Next check: 3 min | API calls this hour: 26/30 (near limit)"
        );
    }

    #[test]
    fn near_limit_warns_once_per_crossing() {
        let mut latch = NearLimitLatch::default();
        assert!(!latch.update(false));
        assert!(latch.update(true));
        assert!(!latch.update(true));
        assert!(!latch.update(false));
        assert!(latch.update(true));
    }

    #[test]
    fn status_lines_show_entry_and_usage() {
        let lines = status_lines(&snapshot(26));
        assert_eq!(lines[0], "tracking: Writing docs");
        assert_eq!(lines[1], "API calls this hour: 26/30 (near limit)");
    }

    #[tokio::test]
    async fn interval_command_changes_live_cadence() {
        let mut service = idle_service();
        let flow = apply(&LineCommand::Interval(10), &mut service, Utc::now());
        assert_eq!(service.interval(), chrono::Duration::minutes(10));
        assert_eq!(
            flow,
            Flow::Persist {
                key: "check_interval_minutes",
                value: "10".into()
            }
        );
        service.shutdown().await;
    }

    #[tokio::test]
    async fn mute_command_uses_given_or_configured_minutes() {
        let mut service = idle_service();
        let controller = Arc::clone(service.controller());
        controller.set_mute_minutes(90);
        let now = Utc::now();

        apply(&LineCommand::Mute(Some(30)), &mut service, now);
        assert!(controller.is_muted(now + chrono::Duration::minutes(29)));
        assert!(!controller.is_muted(now + chrono::Duration::minutes(30)));

        apply(&LineCommand::Mute(None), &mut service, now);
        assert!(controller.is_muted(now + chrono::Duration::minutes(89)));
        service.shutdown().await;
    }

    #[tokio::test]
    async fn logout_command_resets_session() {
        let mut service = idle_service();
        let now = Utc::now();
        apply(&LineCommand::Mute(None), &mut service, now);

        assert_eq!(apply(&LineCommand::Logout, &mut service, now), Flow::LoggedOut);
        assert!(!service.controller().is_muted(now));
        assert!(service.progress().borrow().is_none());
        service.shutdown().await;
    }
}
