// Library surface for the binary and for headless/integration tests.
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod difficulty;
pub mod engine;
pub mod error;
pub mod generator;
pub mod history;
pub mod logging;
pub mod report;
pub mod runtime;
pub mod session;
pub mod stats;
pub mod ui;

pub use error::{Result, TrainerError};
pub use stats::{CharacterRecord, Mode, StatisticsStore};
