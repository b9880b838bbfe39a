//! Client-side navigation core.
//!
//! This crate provides the navigation layer of a single-page application:
//!
//! - **Router**: route table, base path, layout composition, guards and a
//!   history backend ([`router`])
//! - **Canonical paths**: [`TrailingSlashGuard`] redirects `/devices` to
//!   `/devices/`
//! - **Stale-module recovery**: [`ErrorRecovery`] hard-reloads once when a
//!   redeploy removed the chunks the running build still refers to
//!   ([`recovery`])
//! - **Readiness**: [`ReadinessHook`] resets the recovery flag after the
//!   first successful navigation ([`readiness`])
//! - **Bootstrap**: [`app::bootstrap`] wires all of the above into the
//!   process-wide router
//!
//! ## Platform Support
//!
//! On `wasm32` the router writes to `window.history`, the recovery flag lives
//! in `localStorage` and reloads go through `location.assign`. Native builds
//! use in-memory history and a memory or file-backed flag, which is what the
//! tests run against.
//!
//! ## Example
//!
//! ```ignore
//! use waymark_router::app::{bootstrap, store_from_settings};
//! use waymark_router::recovery::BrowserReloader;
//! use waymark_router::router::MetaLayouts;
//!
//! let settings = NavigationSettings::from_env()?;
//! let store = store_from_settings(&settings.recovery_store, &settings.recovery_key)?;
//! let router = bootstrap(&settings, routes(), MetaLayouts::default(), store, BrowserReloader)?;
//! router.start().await?;
//! ```

pub mod app;
pub mod logging;
pub mod readiness;
pub mod recovery;
pub mod router;

pub use app::{
	RouterInstallError, bootstrap, install_router, store_from_settings, try_with_router, with_router,
};
pub use readiness::ReadinessHook;
pub use recovery::{
	ErrorRecovery, MemoryRecoveryStore, RecordingReloader, RecoveryAction, RecoveryOutcome,
	RecoveryStore, Reloader, StoreError,
};
pub use router::{
	ComponentRef, GuardDecision, ModuleHandle, ModuleLoadError, ModuleLoadErrorKind,
	NavigationError, NavigationFailure, NavigationRequest, NavigationTarget, RouteDefinition,
	RouteLocation, RouteTable, Router, TrailingSlashGuard,
};

/// Re-exports for the logging macros. Not public API.
#[doc(hidden)]
pub mod __private {
	#[cfg(not(target_arch = "wasm32"))]
	pub use tracing;
	pub use web_sys;
}
