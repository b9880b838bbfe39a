//! Application wiring and the process-wide router.
//!
//! An application builds exactly one router at startup. [`bootstrap`] builds
//! it from [`NavigationSettings`], registers the trailing-slash guard, the
//! stale-module recovery handler and the readiness hook, and installs it as
//! the global instance.

use crate::readiness::ReadinessHook;
use crate::recovery::{ErrorRecovery, MemoryRecoveryStore, RecoveryStore, Reloader, StoreError};
use crate::router::{LayoutComposer, NavigationError, RouteTable, Router, TrailingSlashGuard};
use crate::info_log;
use std::cell::RefCell;
use std::rc::Rc;
use waymark_conf::{NavigationSettings, RecoveryStoreKind};

// Global Router instance
// Set by install_router() and accessed via router() / with_router()
thread_local! {
	static ROUTER: RefCell<Option<Rc<Router>>> = const { RefCell::new(None) };
}

/// Failure setting up the process-wide router.
#[derive(Debug, thiserror::Error)]
pub enum RouterInstallError {
	/// A router is already installed on this thread.
	#[error("A router is already installed")]
	AlreadyInstalled,
	/// The router could not be built.
	#[error(transparent)]
	Build(#[from] NavigationError),
	/// The configured recovery store is not available on this target.
	#[error(transparent)]
	Store(#[from] StoreError),
}

/// Installs `router` as the process-wide instance.
pub fn install_router(router: Router) -> Result<Rc<Router>, RouterInstallError> {
	ROUTER.with(|slot| {
		let mut slot = slot.borrow_mut();
		if slot.is_some() {
			return Err(RouterInstallError::AlreadyInstalled);
		}
		let router = Rc::new(router);
		*slot = Some(Rc::clone(&router));
		Ok(router)
	})
}

/// Returns the process-wide router, if installed.
pub fn router() -> Option<Rc<Router>> {
	ROUTER.with(|slot| slot.borrow().clone())
}

/// Removes the process-wide router, returning it.
pub fn take_router() -> Option<Rc<Router>> {
	ROUTER.with(|slot| slot.borrow_mut().take())
}

/// Provides access to the global router instance
///
/// Returns `None` if no router has been installed.
///
/// # Example
///
/// ```ignore
/// use waymark_router::app::try_with_router;
///
/// if let Some(count) = try_with_router(|router| router.route_count()) {
///     println!("Routes: {}", count);
/// }
/// ```
pub fn try_with_router<F, R>(f: F) -> Option<R>
where
	F: FnOnce(&Router) -> R,
{
	router().map(|router| f(&router))
}

/// Provides access to the global router instance
///
/// # Panics
///
/// Panics if no router has been installed via [`install_router`] or
/// [`bootstrap`]. Prefer [`try_with_router`] for non-panicking access.
pub fn with_router<F, R>(f: F) -> R
where
	F: FnOnce(&Router) -> R,
{
	try_with_router(f).expect("Router not installed. Call bootstrap() or install_router() first.")
}

/// Builds the recovery store selected by `kind`.
///
/// `key` names the flag for storages that are keyed (`localStorage`).
pub fn store_from_settings(kind: &RecoveryStoreKind, key: &str) -> Result<Rc<dyn RecoveryStore>, StoreError> {
	match kind {
		RecoveryStoreKind::Memory => Ok(Rc::new(MemoryRecoveryStore::new())),
		#[cfg(not(target_arch = "wasm32"))]
		RecoveryStoreKind::File { path } => Ok(Rc::new(crate::recovery::FileRecoveryStore::new(path))),
		#[cfg(target_arch = "wasm32")]
		RecoveryStoreKind::File { .. } => Err(StoreError::Unavailable(
			"file recovery store is not available in the browser".to_string(),
		)),
		#[cfg(target_arch = "wasm32")]
		RecoveryStoreKind::LocalStorage => Ok(Rc::new(crate::recovery::LocalStorageRecoveryStore::new(key))),
		#[cfg(not(target_arch = "wasm32"))]
		RecoveryStoreKind::LocalStorage => {
			let _ = key;
			Err(StoreError::Unavailable(
				"localStorage recovery store needs a browser".to_string(),
			))
		}
	}
}

/// Builds, wires and installs the application router.
///
/// The caller then performs the initial navigation with [`Router::start`].
pub fn bootstrap(
	settings: &NavigationSettings,
	routes: RouteTable,
	composer: impl LayoutComposer + 'static,
	store: Rc<dyn RecoveryStore>,
	reloader: impl Reloader + 'static,
) -> Result<Rc<Router>, RouterInstallError> {
	let router = Router::from_settings(settings)
		.routes(routes)
		.layouts(composer)
		.build()?;

	router.before_each(TrailingSlashGuard);
	ErrorRecovery::new(Rc::clone(&store), reloader).install(&router);
	ReadinessHook::new(store).install(&router);

	let router = install_router(router)?;
	info_log!(
		"Router installed with {} routes at base '{}'",
		router.route_count(),
		router.base()
	);
	Ok(router)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::router::{ComponentRef, NoLayouts, RouteDefinition};
	use rstest::rstest;
	use serial_test::serial;

	fn table() -> RouteTable {
		RouteTable::default().route(RouteDefinition::named("home", "/", ComponentRef::eager(())))
	}

	#[rstest]
	#[serial(router)]
	fn test_install_twice_fails() {
		take_router();
		let built = Router::builder().routes(table()).build().unwrap();
		install_router(built).unwrap();

		let again = Router::builder().routes(table()).build().unwrap();
		assert!(matches!(
			install_router(again),
			Err(RouterInstallError::AlreadyInstalled)
		));
		assert_eq!(try_with_router(|r| r.route_count()), Some(1));

		assert!(take_router().is_some());
		assert!(router().is_none());
	}

	#[rstest]
	#[serial(router)]
	fn test_try_with_router_without_install() {
		take_router();
		assert_eq!(try_with_router(|r| r.route_count()), None);
	}

	#[rstest]
	fn test_store_from_settings() {
		assert!(store_from_settings(&RecoveryStoreKind::Memory, "k").is_ok());
		#[cfg(not(target_arch = "wasm32"))]
		assert!(matches!(
			store_from_settings(&RecoveryStoreKind::LocalStorage, "k"),
			Err(StoreError::Unavailable(_))
		));
	}

	#[rstest]
	#[serial(router)]
	fn test_bootstrap_rejects_bad_table() {
		take_router();
		let routes = RouteTable::default().route(RouteDefinition::new("no-slash", ComponentRef::eager(())));
		let result = bootstrap(
			&NavigationSettings::default(),
			routes,
			NoLayouts,
			Rc::new(MemoryRecoveryStore::new()),
			crate::recovery::RecordingReloader::new(),
		);
		assert!(matches!(result, Err(RouterInstallError::Build(_))));
		assert!(router().is_none());
	}
}
