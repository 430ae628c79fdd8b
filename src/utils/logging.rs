//! Logging macros gated on a module-level `ENABLE_LOGS` flag.
//!
//! Chatty modules (the ingest loop, the dispatcher) define the flag and route
//! their per-cycle logs through these macros so they can be silenced without
//! touching `RUST_LOG` for the rest of the crate:
//!
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//!
//! use crate::{log_debug, log_info};
//!
//! log_info!("snapshot applied: {} readings", count);
//! ```

#[doc(hidden)]
#[macro_export]
macro_rules! __gated_log {
    ($level:ident, $($arg:tt)*) => {
        if ENABLE_LOGS {
            log::$level!($($arg)*);
        }
    };
}

/// `log::debug!` when the calling module's `ENABLE_LOGS` is set.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::__gated_log!(debug, $($arg)*)
    };
}

/// `log::info!` when the calling module's `ENABLE_LOGS` is set.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::__gated_log!(info, $($arg)*)
    };
}

/// `log::warn!` when the calling module's `ENABLE_LOGS` is set.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::__gated_log!(warn, $($arg)*)
    };
}

/// `log::error!` when the calling module's `ENABLE_LOGS` is set.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::__gated_log!(error, $($arg)*)
    };
}
