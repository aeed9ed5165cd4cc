pub mod app;
pub mod thresholds;

pub use app::AppConfig;
pub use thresholds::*;
