mod logs;

pub use logs::{LogRepository, CITATION_SEPARATOR};
