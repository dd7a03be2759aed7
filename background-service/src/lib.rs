pub mod engine;
pub mod reporter;

pub use engine::FetchEngine;
pub use reporter::{PeriodicReporter, RateWindow, ReporterState, ReporterStatus};
