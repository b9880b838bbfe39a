//! Logging layer for the router
//!
//! The macros below write to the browser console on WASM targets and emit
//! `tracing` events (target `waymark`) everywhere else, so navigation
//! diagnostics land on the natural log channel of each platform.
//!
//! ## Macro Overview
//!
//! | Macro | Feature Required | WASM | Non-WASM |
//! |-------|------------------|------|----------|
//! | `debug_log!` | `debug-hooks` + `debug_assertions` | `console.debug` | `tracing::debug!` |
//! | `info_log!` | None | `console.info` | `tracing::info!` |
//! | `warn_log!` | None | `console.warn` | `tracing::warn!` |
//! | `error_log!` | None | `console.error` | `tracing::error!` |
//!
//! ## Example
//!
//! ```ignore
//! use waymark_router::{error_log, info_log};
//!
//! info_log!("Router ready at {}", path);
//! error_log!("Navigation to {} failed: {}", to, error);
//! ```

/// Logs a debug message (requires `debug-hooks` feature + `debug_assertions`)
#[macro_export]
#[cfg(all(debug_assertions, feature = "debug-hooks", target_arch = "wasm32"))]
macro_rules! debug_log {
	($($arg:tt)*) => {{
		$crate::__private::web_sys::console::debug_1(&format!($($arg)*).into());
	}};
}

/// Logs a debug message (requires `debug-hooks` feature + `debug_assertions`)
#[macro_export]
#[cfg(all(debug_assertions, feature = "debug-hooks", not(target_arch = "wasm32")))]
macro_rules! debug_log {
	($($arg:tt)*) => {{
		$crate::__private::tracing::debug!(target: "waymark", "{}", format!($($arg)*));
	}};
}

/// No-op debug_log when conditions are not met
#[macro_export]
#[cfg(not(all(debug_assertions, feature = "debug-hooks")))]
macro_rules! debug_log {
	($($arg:tt)*) => {{}};
}

/// Logs an info message
#[macro_export]
#[cfg(target_arch = "wasm32")]
macro_rules! info_log {
	($($arg:tt)*) => {{
		$crate::__private::web_sys::console::info_1(&format!($($arg)*).into());
	}};
}

/// Logs an info message
#[macro_export]
#[cfg(not(target_arch = "wasm32"))]
macro_rules! info_log {
	($($arg:tt)*) => {{
		$crate::__private::tracing::info!(target: "waymark", "{}", format!($($arg)*));
	}};
}

/// Logs a warning message
#[macro_export]
#[cfg(target_arch = "wasm32")]
macro_rules! warn_log {
	($($arg:tt)*) => {{
		$crate::__private::web_sys::console::warn_1(&format!($($arg)*).into());
	}};
}

/// Logs a warning message
#[macro_export]
#[cfg(not(target_arch = "wasm32"))]
macro_rules! warn_log {
	($($arg:tt)*) => {{
		$crate::__private::tracing::warn!(target: "waymark", "{}", format!($($arg)*));
	}};
}

/// Logs an error message
///
/// Navigation errors that are not recovered are always reported through this
/// macro.
#[macro_export]
#[cfg(target_arch = "wasm32")]
macro_rules! error_log {
	($($arg:tt)*) => {{
		$crate::__private::web_sys::console::error_1(&format!($($arg)*).into());
	}};
}

/// Logs an error message
#[macro_export]
#[cfg(not(target_arch = "wasm32"))]
macro_rules! error_log {
	($($arg:tt)*) => {{
		$crate::__private::tracing::error!(target: "waymark", "{}", format!($($arg)*));
	}};
}
