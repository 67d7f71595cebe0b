mod poll;
mod repeating;

pub use poll::{PollScheduler, ProgressInfo, DEFAULT_CHECK_INTERVAL_MIN};
pub use repeating::RepeatingTask;
