//! Readiness hook that resets the recovery flag.
//!
//! Once the router's first navigation completes, the running build has
//! proven it can load its modules, so a flag left behind by an earlier
//! recovery reload is cleared.

use crate::recovery::RecoveryStore;
use crate::router::{ReadyResult, Router};
use crate::{info_log, warn_log};

/// Clears the recovery flag once the router reports it is ready.
///
/// Installed next to [`ErrorRecovery`](crate::recovery::ErrorRecovery) on the
/// same store, so the fuse is re-armed after every successful page load.
pub struct ReadinessHook {
	store: Box<dyn RecoveryStore>,
}

impl std::fmt::Debug for ReadinessHook {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ReadinessHook").finish_non_exhaustive()
	}
}

impl ReadinessHook {
	/// Creates a hook that clears the flag held by `store`.
	pub fn new(store: impl RecoveryStore + 'static) -> Self {
		Self {
			store: Box::new(store),
		}
	}

	/// Registers the hook on `router`. It fires once.
	pub fn install(self, router: &Router) {
		router.on_ready(move |result| {
			self.on_ready(result);
		});
	}

	/// Clears the flag if the first navigation succeeded.
	///
	/// Returns whether the flag was cleared. A failed first navigation leaves
	/// the flag alone.
	pub fn on_ready(&self, result: &ReadyResult) -> bool {
		if let Err(err) = result {
			info_log!("Router not ready ({}), keeping recovery flag", err);
			return false;
		}
		match self.store.clear() {
			Ok(()) => true,
			Err(err) => {
				warn_log!("Recovery flag could not be cleared: {}", err);
				false
			}
		}
	}
}
