//! Terminal implementation of the reminder prompt.
//!
//! A single reader thread owns stdin. While a reminder is open its next line
//! is the answer; otherwise lines are session commands (see `commands::run`).
//!
//! Answer rules: a number picks that suggestion, `m` mutes, an empty line
//! (or end of input) dismisses, anything else is taken as a description.

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use annoying_toggl_core::{Prompt, PromptOutcome, PromptRequest};
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

/// Hand-off point between the stdin reader and an open prompt.
#[derive(Default)]
pub struct AnswerSlot {
    pending: Mutex<Option<oneshot::Sender<String>>>,
    closed: AtomicBool,
}

impl AnswerSlot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// `None` once input has ended.
    fn wait(&self) -> Option<oneshot::Receiver<String>> {
        if self.closed.load(Ordering::SeqCst) {
            return None;
        }
        let (tx, rx) = oneshot::channel();
        *self.lock() = Some(tx);
        Some(rx)
    }

    pub fn is_waiting(&self) -> bool {
        self.lock().is_some()
    }

    /// Give `line` to the open prompt. The line comes back when nobody is
    /// waiting for an answer.
    pub fn offer(&self, line: String) -> Result<(), String> {
        match self.lock().take() {
            Some(tx) => tx.send(line),
            None => Err(line),
        }
    }

    /// End of input: the open prompt and every later one dismiss.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.lock().take();
    }

    fn lock(&self) -> MutexGuard<'_, Option<oneshot::Sender<String>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct TerminalPrompt {
    answers: Arc<AnswerSlot>,
}

impl TerminalPrompt {
    pub fn new(answers: Arc<AnswerSlot>) -> Self {
        Self { answers }
    }
}

#[async_trait]
impl Prompt for TerminalPrompt {
    async fn ask(&self, request: PromptRequest) -> PromptOutcome {
        let Some(answer) = self.answers.wait() else {
            return PromptOutcome::Dismiss;
        };
        println!("{}", render(&request));
        match answer.await {
            Ok(line) => parse_answer(&line, &request.suggestions),
            Err(_) => PromptOutcome::Dismiss,
        }
    }
}

/// Read stdin line by line on a dedicated thread. The channel closes at end
/// of input.
pub fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "stopped reading stdin");
                    break;
                }
            }
        }
    });
    rx
}

fn render(request: &PromptRequest) -> String {
    let mut out = format!("\n{}\n{}\n", request.title, request.message);
    for (i, suggestion) in request.suggestions.iter().enumerate() {
        out.push_str(&format!("  [{}] {suggestion}\n", i + 1));
    }
    out.push_str("(number, text, m = mute, enter = dismiss) >");
    out
}

pub fn parse_answer(input: &str, suggestions: &[String]) -> PromptOutcome {
    let input = input.trim();
    if input.is_empty() {
        return PromptOutcome::Dismiss;
    }
    if input.eq_ignore_ascii_case("m") {
        return PromptOutcome::Mute;
    }
    if let Ok(n) = input.parse::<usize>() {
        if let Some(choice) = n.checked_sub(1).and_then(|i| suggestions.get(i)) {
            return PromptOutcome::Start(choice.clone());
        }
    }
    PromptOutcome::Start(input.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recent() -> Vec<String> {
        vec!["Writing docs".into(), "Code review".into()]
    }

    fn request() -> PromptRequest {
        PromptRequest {
            title: "No Timer Running!".into(),
            message: "Please enter what you're working on:".into(),
            suggestions: recent(),
        }
    }

    #[test]
    fn number_picks_suggestion() {
        assert_eq!(
            parse_answer("2\n", &recent()),
            PromptOutcome::Start("Code review".into())
        );
    }

    #[test]
    fn out_of_range_number_is_free_text() {
        assert_eq!(parse_answer("7", &recent()), PromptOutcome::Start("7".into()));
        assert_eq!(parse_answer("0", &recent()), PromptOutcome::Start("0".into()));
    }

    #[test]
    fn m_mutes_and_empty_dismisses() {
        assert_eq!(parse_answer(" M ", &recent()), PromptOutcome::Mute);
        assert_eq!(parse_answer("   \n", &recent()), PromptOutcome::Dismiss);
    }

    #[test]
    fn free_text_is_trimmed() {
        assert_eq!(
            parse_answer("  Planning sprint \n", &[]),
            PromptOutcome::Start("Planning sprint".into())
        );
    }

    #[test]
    fn render_numbers_suggestions() {
        let text = render(&request());
        assert!(text.contains("No Timer Running!"));
        assert!(text.contains("  [2] Code review"));
    }

    #[test]
    fn offer_without_open_prompt_returns_line() {
        let slot = AnswerSlot::new();
        assert_eq!(slot.offer("interval 10".into()), Err("interval 10".into()));
    }

    #[tokio::test]
    async fn open_prompt_takes_next_line() {
        let slot = AnswerSlot::new();
        let prompt = TerminalPrompt::new(Arc::clone(&slot));
        let ask = tokio::spawn(async move { prompt.ask(request()).await });
        while !slot.is_waiting() {
            tokio::task::yield_now().await;
        }

        assert!(slot.offer("2".into()).is_ok());
        assert_eq!(
            ask.await.unwrap(),
            PromptOutcome::Start("Code review".into())
        );
        assert!(!slot.is_waiting());
    }

    #[tokio::test]
    async fn closed_input_dismisses() {
        let slot = AnswerSlot::new();
        let prompt = TerminalPrompt::new(Arc::clone(&slot));
        let ask = tokio::spawn(async move { prompt.ask(request()).await });
        while !slot.is_waiting() {
            tokio::task::yield_now().await;
        }

        slot.close();
        assert_eq!(ask.await.unwrap(), PromptOutcome::Dismiss);
        assert_eq!(
            TerminalPrompt::new(slot).ask(request()).await,
            PromptOutcome::Dismiss
        );
    }
}
