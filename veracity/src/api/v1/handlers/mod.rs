pub mod detect;
pub(crate) mod health;
pub mod logs;

pub use detect::detect_hallucination;
pub use health::health_check;
pub use logs::list_logs;
