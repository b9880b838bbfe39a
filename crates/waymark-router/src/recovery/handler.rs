//! Stale-module recovery.
//!
//! After a redeploy, a client still running the previous build asks for
//! module chunks that no longer exist. The first such failure sets the
//! recovery flag and hard-reloads the target so the new build is fetched.
//! If the failure comes back while the flag is still set, the reload did not
//! help: the error is reported and no further reload is attempted until the
//! flag is cleared by a successful start.

use super::action::{RecoveryAction, Reloader};
use super::store::RecoveryStore;
use crate::router::{ModuleLoadErrorKind, NavigationError, NavigationRequest, Router};
use crate::{error_log, info_log, warn_log};

/// Message fragment browsers use when a dynamic import cannot be fetched.
pub const STALE_MODULE_SIGNATURE: &str = "Failed to fetch dynamically imported module";

/// How a navigation error is treated by [`ErrorRecovery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
	/// A module chunk of an older build could not be fetched.
	StaleModule,
	/// Anything else.
	Generic,
}

/// Classifies `error`.
///
/// A module load error with kind [`ModuleLoadErrorKind::StaleChunk`] is stale,
/// as is any error whose message contains [`STALE_MODULE_SIGNATURE`].
pub fn classify(error: &NavigationError) -> ErrorClass {
	if let NavigationError::ModuleLoad(load) = error
		&& load.kind == ModuleLoadErrorKind::StaleChunk
	{
		return ErrorClass::StaleModule;
	}
	if error.to_string().contains(STALE_MODULE_SIGNATURE) {
		ErrorClass::StaleModule
	} else {
		ErrorClass::Generic
	}
}

/// What [`ErrorRecovery::handle`] did with an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryOutcome {
	/// Stale module with the flag absent: flag set, reload issued.
	Reloaded(RecoveryAction),
	/// Stale module with the flag already present: reported, no reload.
	FuseBlown,
	/// Generic error, or the flag could not be read or set: reported only.
	Reported,
	/// The flag was set but the reloader failed.
	ReloadFailed(RecoveryAction),
}

/// Navigation error handler that heals stale-module failures.
pub struct ErrorRecovery {
	store: Box<dyn RecoveryStore>,
	reloader: Box<dyn Reloader>,
	base: String,
}

impl std::fmt::Debug for ErrorRecovery {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ErrorRecovery")
			.field("base", &self.base)
			.finish_non_exhaustive()
	}
}

impl ErrorRecovery {
	/// Creates a handler with an empty base path.
	pub fn new(store: impl RecoveryStore + 'static, reloader: impl Reloader + 'static) -> Self {
		Self {
			store: Box::new(store),
			reloader: Box::new(reloader),
			base: String::new(),
		}
	}

	/// Base path prefixed to reload targets.
	pub fn with_base(mut self, base: &str) -> Self {
		self.base = waymark_conf::normalize_base(base);
		self
	}

	/// Registers the handler on `router`, taking the router's base path.
	pub fn install(self, router: &Router) {
		let recovery = self.with_base(router.base());
		router.on_error(move |error, to| {
			recovery.handle(error, to);
		});
	}

	/// Runs the recovery state machine for one error.
	pub fn handle(&self, error: &NavigationError, to: &NavigationRequest) -> RecoveryOutcome {
		if classify(error) == ErrorClass::Generic {
			error_log!("Navigation to {} failed: {}", to, error);
			return RecoveryOutcome::Reported;
		}

		let present = match self.store.get() {
			Ok(present) => present,
			Err(err) => {
				warn_log!("Recovery flag unreadable, not reloading: {}", err);
				error_log!("Navigation to {} failed: {}", to, error);
				return RecoveryOutcome::Reported;
			}
		};
		if present {
			error_log!(
				"Stale module still failing after reload, navigation to {} failed: {}",
				to,
				error
			);
			return RecoveryOutcome::FuseBlown;
		}

		if let Err(err) = self.store.set() {
			warn_log!("Recovery flag could not be set, not reloading: {}", err);
			error_log!("Navigation to {} failed: {}", to, error);
			return RecoveryOutcome::Reported;
		}

		let action = RecoveryAction::hard_reload(format!("{}{}", self.base, to.full_path()));
		info_log!("Stale module detected ({}), issuing {}", error, action);
		match self.reloader.execute(&action) {
			Ok(()) => RecoveryOutcome::Reloaded(action),
			Err(err) => {
				error_log!("Recovery {} failed: {}", action, err);
				RecoveryOutcome::ReloadFailed(action)
			}
		}
	}
}
