pub mod detect;
pub mod logs;

pub use detect::{DetectRequest, DetectResponse};
pub use logs::{ListLogsQuery, ListLogsResponse, LogEntryResponse};
