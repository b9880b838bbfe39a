//! Router error types.

/// Structured cause of a module load failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleLoadErrorKind {
	/// The module's chunk no longer exists on the server (stale build).
	StaleChunk,
	/// The fetch failed for a transport reason.
	Network,
	/// The module was fetched but failed to evaluate.
	Evaluation,
	/// Anything else reported by the loader.
	Other,
}

/// Failure reported by a route's module loader.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ModuleLoadError {
	/// Structured cause.
	pub kind: ModuleLoadErrorKind,
	/// Diagnostic message from the loading mechanism.
	pub message: String,
}

impl ModuleLoadError {
	/// Creates a load error with an explicit kind and message.
	pub fn new(kind: ModuleLoadErrorKind, message: impl Into<String>) -> Self {
		Self {
			kind,
			message: message.into(),
		}
	}

	/// Load error for a chunk that disappeared after a redeploy.
	///
	/// The message carries the same wording browsers use for failed dynamic
	/// imports.
	pub fn stale_chunk(module: impl AsRef<str>) -> Self {
		Self::new(
			ModuleLoadErrorKind::StaleChunk,
			format!(
				"Failed to fetch dynamically imported module: {}",
				module.as_ref()
			),
		)
	}
}

/// Error raised while resolving or committing a navigation.
///
/// Everything except [`NavigationError::ModuleLoad`] is a resolution error:
/// it is reported and the navigation does not complete.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
	/// No route matches the path.
	#[error("Route not found: {0}")]
	NotFound(String),
	/// A navigation guard failed.
	#[error("Navigation guard failed: {0}")]
	Guard(String),
	/// Guards kept redirecting.
	#[error("Too many redirects ({limit}) while navigating to {path}")]
	RedirectLoop {
		/// Last redirect target.
		path: String,
		/// Configured bound.
		limit: u32,
	},
	/// The matched route's module failed to load.
	#[error(transparent)]
	ModuleLoad(#[from] ModuleLoadError),
	/// The history backend rejected the update.
	#[error("History update failed: {0}")]
	History(String),
	/// A route pattern could not be compiled.
	#[error("Invalid route pattern '{pattern}': {reason}")]
	InvalidPattern {
		/// Offending pattern.
		pattern: String,
		/// What is wrong with it.
		reason: String,
	},
	/// Unknown route name.
	#[error("Invalid route name: {0}")]
	InvalidRouteName(String),
	/// Two routes share a name.
	#[error("Duplicate route name: {0}")]
	DuplicateRouteName(String),
	/// Reverse lookup without a required parameter.
	#[error("Missing parameter '{param}' for route {route}")]
	MissingParameter {
		/// Route name.
		route: String,
		/// Parameter name.
		param: String,
	},
	/// The router went away before the initial navigation settled.
	#[error("Router was dropped before the initial navigation settled")]
	Shutdown,
}

impl NavigationError {
	/// Whether this is a resolution error rather than a module load failure.
	pub fn is_resolution_error(&self) -> bool {
		!matches!(self, Self::ModuleLoad(_))
	}
}

/// Outcome of a navigation that did not complete.
///
/// Only [`NavigationFailure::Error`] is dispatched to error handlers; the
/// other variants are ordinary, expected results.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationFailure {
	/// A guard aborted the navigation.
	#[error("Navigation aborted by a guard: {0}")]
	Aborted(String),
	/// A newer navigation superseded this one.
	#[error("Navigation cancelled by a newer navigation: {0}")]
	Cancelled(String),
	/// The target is already the current location.
	#[error("Avoided redundant navigation to current location: {0}")]
	Duplicated(String),
	/// The navigation failed with an error.
	#[error(transparent)]
	Error(#[from] NavigationError),
}

impl NavigationFailure {
	/// Returns the underlying error, if any.
	pub fn error(&self) -> Option<&NavigationError> {
		match self {
			Self::Error(err) => Some(err),
			_ => None,
		}
	}
}
