//! Pre-navigation guards.
//!
//! Guards run synchronously, in registration order, before a request is
//! matched. The first guard that does not return [`GuardDecision::Proceed`]
//! decides the outcome; a redirect restarts the guard chain with the new
//! request.

use super::error::NavigationError;
use super::location::{NavigationRequest, RouteLocation};

/// What a guard decided for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
	/// Continue with the request unchanged.
	Proceed,
	/// Replace the request; the original target is discarded.
	Redirect(NavigationRequest),
	/// Stop the navigation without an error.
	Abort,
}

/// A pre-navigation interceptor.
pub trait NavigationGuard {
	/// Decides on `to`, given the currently active location `from`.
	///
	/// An `Err` fails the navigation with a resolution error.
	fn check(&self, to: &NavigationRequest, from: &RouteLocation) -> Result<GuardDecision, NavigationError>;
}

impl<F> NavigationGuard for F
where
	F: Fn(&NavigationRequest, &RouteLocation) -> Result<GuardDecision, NavigationError>,
{
	fn check(&self, to: &NavigationRequest, from: &RouteLocation) -> Result<GuardDecision, NavigationError> {
		self(to, from)
	}
}

/// Whether `path` is in canonical form: the root, or ending in `/`.
pub fn is_canonical_path(path: &str) -> bool {
	path.ends_with('/') || path.chars().count() <= 1
}

/// Redirects every non-root path that lacks a trailing slash to the same
/// path with one, keeping hash, params and query as they were.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrailingSlashGuard;

impl TrailingSlashGuard {
	/// The guard's decision for `to`.
	pub fn decide(to: &NavigationRequest) -> GuardDecision {
		if is_canonical_path(&to.path) {
			return GuardDecision::Proceed;
		}
		GuardDecision::Redirect(NavigationRequest {
			path: format!("{}/", to.path),
			hash: to.hash.clone(),
			params: to.params.clone(),
			query: to.query.clone(),
		})
	}
}

impl NavigationGuard for TrailingSlashGuard {
	fn check(&self, to: &NavigationRequest, _from: &RouteLocation) -> Result<GuardDecision, NavigationError> {
		Ok(Self::decide(to))
	}
}
