//! # Waymark
//!
//! Client-side navigation core for single-page applications.
//!
//! Waymark owns route resolution, URL canonicalization and recovery from
//! stale deployed assets after a redeploy:
//!
//! - every non-root path is canonicalized to end in `/` before it is resolved
//! - a "Failed to fetch dynamically imported module" error triggers one hard
//!   reload, guarded by a durable fuse so it cannot loop
//! - the fuse is reset once the router has completed its first navigation
//!
//! ## Feature Flags
//!
//! - `conf` (default) - settings loading through [`conf`]
//! - `debug-hooks` - verbose router tracing in debug builds
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use waymark::prelude::*;
//!
//! waymark::init_logging("info")?;
//!
//! let settings = NavigationSettings::load(None)?;
//! let store = store_from_settings(&settings.recovery_store, &settings.recovery_key)?;
//! let routes = RouteTable::default()
//!     .route(RouteDefinition::named("home", "/", ComponentRef::eager(HomePage)))
//!     .route(RouteDefinition::named("devices", "/devices/", ComponentRef::lazy(DevicesChunk)));
//!
//! let router = bootstrap(&settings, routes, MetaLayouts::default(), store, reloader)?;
//! router.start().await?;
//! ```

pub use waymark_router::*;

#[cfg(feature = "conf")]
pub use waymark_conf as conf;

/// Commonly used items.
pub mod prelude {
	pub use waymark_router::app::{bootstrap, store_from_settings, try_with_router, with_router};
	pub use waymark_router::recovery::{
		CallbackReloader, ErrorRecovery, MemoryRecoveryStore, RecordingReloader, RecoveryStore,
		Reloader,
	};
	pub use waymark_router::router::{
		ComponentRef, GuardDecision, MetaLayouts, NavigationError, NavigationFailure,
		NavigationRequest, NavigationTarget, RouteDefinition, RouteLocation, RouteTable, Router,
		TrailingSlashGuard,
	};

	#[cfg(feature = "conf")]
	pub use waymark_conf::{NavigationSettings, RecoveryStoreKind};
}

/// Failure installing the native log subscriber.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
	/// The fallback filter directive does not parse.
	#[error("Invalid log filter: {0}")]
	Filter(#[from] tracing_subscriber::filter::ParseError),
	/// A global subscriber is already installed.
	#[error(transparent)]
	Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Installs a `fmt` subscriber for the router's `tracing` events.
///
/// `RUST_LOG` wins when it is set and valid; otherwise `default_level`
/// (typically [`conf::NavigationSettings::log_level`]) is used.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging(default_level: &str) -> Result<(), LoggingError> {
	use tracing_subscriber::{EnvFilter, fmt, prelude::*};

	let filter = match EnvFilter::try_from_default_env() {
		Ok(filter) => filter,
		Err(_) => EnvFilter::try_new(default_level)?,
	};

	tracing_subscriber::registry()
		.with(filter)
		.with(fmt::layer().with_target(true))
		.try_init()?;
	Ok(())
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_init_logging_installs_once() {
		let _ = init_logging("info");
		assert!(matches!(init_logging("info"), Err(LoggingError::Init(_))));
	}
}
