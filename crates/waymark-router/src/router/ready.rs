//! One-shot readiness signal.
//!
//! Settles once, when the router's first navigation settles. Hooks run
//! exactly once; async waiters registered before or after settling all see
//! the same result.

use super::error::NavigationError;
use futures::channel::oneshot;
use std::cell::RefCell;

/// Result the readiness signal settles with.
pub type ReadyResult = Result<(), NavigationError>;

type ReadyHook = Box<dyn FnOnce(&ReadyResult)>;

enum ReadyState {
	Pending {
		waiters: Vec<oneshot::Sender<ReadyResult>>,
		hooks: Vec<ReadyHook>,
	},
	Settled(ReadyResult),
}

pub(crate) struct ReadySignal {
	state: RefCell<ReadyState>,
}

impl ReadySignal {
	pub(crate) fn new() -> Self {
		Self {
			state: RefCell::new(ReadyState::Pending {
				waiters: Vec::new(),
				hooks: Vec::new(),
			}),
		}
	}

	pub(crate) fn is_settled(&self) -> bool {
		matches!(*self.state.borrow(), ReadyState::Settled(_))
	}

	/// Settles the signal. Returns `false` if it was already settled.
	pub(crate) fn settle(&self, result: ReadyResult) -> bool {
		let previous = {
			let mut state = self.state.borrow_mut();
			if matches!(*state, ReadyState::Settled(_)) {
				return false;
			}
			std::mem::replace(&mut *state, ReadyState::Settled(result.clone()))
		};

		// Hooks may call back into the router, so no borrow is held here.
		if let ReadyState::Pending { waiters, hooks } = previous {
			for hook in hooks {
				hook(&result);
			}
			for waiter in waiters {
				let _ = waiter.send(result.clone());
			}
		}
		true
	}

	/// Runs `hook` once the signal settles, immediately if it already has.
	pub(crate) fn on_ready(&self, hook: impl FnOnce(&ReadyResult) + 'static) {
		let settled = {
			let mut state = self.state.borrow_mut();
			match &mut *state {
				ReadyState::Pending { hooks, .. } => {
					hooks.push(Box::new(hook));
					return;
				}
				ReadyState::Settled(result) => result.clone(),
			}
		};
		hook(&settled);
	}

	/// Waits for the signal to settle.
	pub(crate) async fn wait(&self) -> ReadyResult {
		let receiver = {
			let mut state = self.state.borrow_mut();
			match &mut *state {
				ReadyState::Settled(result) => return result.clone(),
				ReadyState::Pending { waiters, .. } => {
					let (sender, receiver) = oneshot::channel();
					waiters.push(sender);
					receiver
				}
			}
		};
		receiver.await.unwrap_or(Err(NavigationError::Shutdown))
	}
}
