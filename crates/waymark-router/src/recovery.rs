//! Recovery from stale deployed modules.
//!
//! - [`store`]: where the one-shot recovery flag lives
//! - [`action`]: the hard reload and who executes it
//! - [`handler`]: the error handler that ties them together

pub mod action;
pub mod handler;
pub mod store;

#[cfg(target_arch = "wasm32")]
pub use action::BrowserReloader;
pub use action::{CallbackReloader, RecordingReloader, RecoveryAction, ReloadError, Reloader};
pub use handler::{ErrorClass, ErrorRecovery, RecoveryOutcome, STALE_MODULE_SIGNATURE, classify};
#[cfg(not(target_arch = "wasm32"))]
pub use store::FileRecoveryStore;
#[cfg(target_arch = "wasm32")]
pub use store::LocalStorageRecoveryStore;
pub use store::{MemoryRecoveryStore, RecoveryStore, StoreError};
