//! Recovery actions and the reloaders that carry them out.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Something the recovery handler asks the host to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryAction {
	/// Full reload of the application at `target` (an absolute href, base
	/// included), bypassing client-side navigation.
	HardReload {
		/// Absolute href to load.
		target: String,
	},
}

impl RecoveryAction {
	pub fn hard_reload(target: impl Into<String>) -> Self {
		Self::HardReload {
			target: target.into(),
		}
	}

	/// The href the action loads.
	pub fn target(&self) -> &str {
		match self {
			Self::HardReload { target } => target,
		}
	}
}

impl fmt::Display for RecoveryAction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::HardReload { target } => write!(f, "hard reload of {}", target),
		}
	}
}

/// Failure executing a [`RecoveryAction`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReloadError {
	/// There is no window to navigate.
	#[error("No browser window available")]
	NoWindow,
	/// The host refused the reload.
	#[error("Reload to {target} failed: {reason}")]
	Failed {
		/// Requested href.
		target: String,
		/// Reported reason.
		reason: String,
	},
}

/// Executes recovery actions. Execution is fire-and-forget: the router does
/// not wait for the reload to happen.
pub trait Reloader {
	fn execute(&self, action: &RecoveryAction) -> Result<(), ReloadError>;
}

impl<R: Reloader + ?Sized> Reloader for Rc<R> {
	fn execute(&self, action: &RecoveryAction) -> Result<(), ReloadError> {
		(**self).execute(action)
	}
}

/// Reloads the page through `window.location.assign`.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserReloader;

#[cfg(target_arch = "wasm32")]
impl Reloader for BrowserReloader {
	fn execute(&self, action: &RecoveryAction) -> Result<(), ReloadError> {
		let window = web_sys::window().ok_or(ReloadError::NoWindow)?;
		window
			.location()
			.assign(action.target())
			.map_err(|e| ReloadError::Failed {
				target: action.target().to_string(),
				reason: format!("{:?}", e),
			})
	}
}

/// Delegates to a closure, e.g. a supervisor that restarts the process.
pub struct CallbackReloader<F> {
	callback: F,
}

impl<F> CallbackReloader<F>
where
	F: Fn(&RecoveryAction) -> Result<(), ReloadError>,
{
	pub fn new(callback: F) -> Self {
		Self { callback }
	}
}

impl<F> Reloader for CallbackReloader<F>
where
	F: Fn(&RecoveryAction) -> Result<(), ReloadError>,
{
	fn execute(&self, action: &RecoveryAction) -> Result<(), ReloadError> {
		(self.callback)(action)
	}
}

impl<F> fmt::Debug for CallbackReloader<F> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("CallbackReloader")
	}
}

/// Records every action instead of executing it. Clones share the record.
#[derive(Debug, Clone, Default)]
pub struct RecordingReloader {
	actions: Rc<RefCell<Vec<RecoveryAction>>>,
}

impl RecordingReloader {
	pub fn new() -> Self {
		Self::default()
	}

	/// Actions executed so far, oldest first.
	pub fn actions(&self) -> Vec<RecoveryAction> {
		self.actions.borrow().clone()
	}

	/// Targets of the actions executed so far.
	pub fn targets(&self) -> Vec<String> {
		self.actions
			.borrow()
			.iter()
			.map(|a| a.target().to_string())
			.collect()
	}

	pub fn count(&self) -> usize {
		self.actions.borrow().len()
	}
}

impl Reloader for RecordingReloader {
	fn execute(&self, action: &RecoveryAction) -> Result<(), ReloadError> {
		self.actions.borrow_mut().push(action.clone());
		Ok(())
	}
}
