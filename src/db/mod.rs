mod connection;
mod helpers;
mod migrations;
pub mod models;
mod repositories;

pub use connection::Database;
pub use helpers::validate_day;
pub use models::{DayGroup, ImportSummary, LogEntry, StoreChange};
pub use repositories::ENV_LOGS_ROOT;
