pub mod queue;

pub use queue::{derive_alerts, AlertEvent, AlertQueue, ALERT_THRESHOLD};
