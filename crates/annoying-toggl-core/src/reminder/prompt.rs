use async_trait::async_trait;

/// What the user is asked when no timer is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub title: String,
    pub message: String,
    /// Recent descriptions to pick from. Free text is always allowed too.
    pub suggestions: Vec<String>,
}

/// The three ways a reminder prompt can resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    Start(String),
    Mute,
    Dismiss,
}

/// UI-owned collaborator that interrupts the user.
///
/// The controller awaits the outcome; a native dialog, a terminal prompt or
/// a web form all satisfy the same contract.
#[async_trait]
pub trait Prompt: Send + Sync {
    async fn ask(&self, request: PromptRequest) -> PromptOutcome;
}
