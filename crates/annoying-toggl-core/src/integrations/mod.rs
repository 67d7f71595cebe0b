pub mod models;
pub mod toggl;
pub mod traits;

pub use models::{suggestions, TimeEntry, Workspace, MAX_SUGGESTIONS, RUNNING_DURATION};
pub use toggl::TogglClient;
pub use traits::{CallObserver, TimeTracker};
