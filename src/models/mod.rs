// Record types and derived analytics reports

pub mod analytics;
pub mod workout_log;

pub use analytics::*;
pub use workout_log::*;
