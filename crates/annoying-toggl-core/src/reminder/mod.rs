mod controller;
mod prompt;

pub use controller::{
    CheckOutcome, CurrentEntry, ReminderController, StatusSnapshot, DEFAULT_MUTE_MINUTES,
};
pub use prompt::{Prompt, PromptOutcome, PromptRequest};
