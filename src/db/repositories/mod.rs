pub mod env_logs;

pub use env_logs::ENV_LOGS_ROOT;
