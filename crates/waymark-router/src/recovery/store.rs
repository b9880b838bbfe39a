//! Durable storage for the recovery flag.

use std::cell::Cell;
#[cfg(not(target_arch = "wasm32"))]
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Failure reading or writing the recovery flag.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	/// Marker file I/O failed.
	#[error("Recovery flag I/O failed at {path}: {source}")]
	Io {
		/// Marker file path.
		path: String,
		/// Underlying error.
		#[source]
		source: std::io::Error,
	},
	/// The backing storage cannot be reached.
	#[error("Recovery store unavailable: {0}")]
	Unavailable(String),
}

/// Holds the single boolean recovery flag.
///
/// Every context sharing the same backing storage sees the same flag. Writes
/// are not synchronized between contexts.
pub trait RecoveryStore {
	/// Whether the flag is present.
	fn get(&self) -> Result<bool, StoreError>;

	/// Marks the flag present.
	fn set(&self) -> Result<(), StoreError>;

	/// Removes the flag. Clearing an absent flag succeeds.
	fn clear(&self) -> Result<(), StoreError>;
}

impl<S: RecoveryStore + ?Sized> RecoveryStore for Rc<S> {
	fn get(&self) -> Result<bool, StoreError> {
		(**self).get()
	}

	fn set(&self) -> Result<(), StoreError> {
		(**self).set()
	}

	fn clear(&self) -> Result<(), StoreError> {
		(**self).clear()
	}
}

/// In-process flag. Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecoveryStore {
	flag: Rc<Cell<bool>>,
}

impl MemoryRecoveryStore {
	/// Creates a store with the flag absent.
	pub fn new() -> Self {
		Self::default()
	}

	/// Starts with the flag already present.
	pub fn present() -> Self {
		let store = Self::new();
		store.flag.set(true);
		store
	}

	/// Reads the flag directly. Memory reads cannot fail.
	pub fn is_set(&self) -> bool {
		self.flag.get()
	}
}

impl RecoveryStore for MemoryRecoveryStore {
	fn get(&self) -> Result<bool, StoreError> {
		Ok(self.flag.get())
	}

	fn set(&self) -> Result<(), StoreError> {
		self.flag.set(true);
		Ok(())
	}

	fn clear(&self) -> Result<(), StoreError> {
		self.flag.set(false);
		Ok(())
	}
}

/// Flag kept as a marker file, so it survives a process restart.
///
/// The flag is present exactly when the file exists.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct FileRecoveryStore {
	path: PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileRecoveryStore {
	/// Creates a store backed by the marker file at `path`.
	///
	/// Nothing is touched on disk until the flag is set; missing parent
	/// directories are created then.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// Marker file location.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn io_error(&self, source: std::io::Error) -> StoreError {
		StoreError::Io {
			path: self.path.display().to_string(),
			source,
		}
	}
}

#[cfg(not(target_arch = "wasm32"))]
impl RecoveryStore for FileRecoveryStore {
	fn get(&self) -> Result<bool, StoreError> {
		self.path.try_exists().map_err(|e| self.io_error(e))
	}

	fn set(&self) -> Result<(), StoreError> {
		if let Some(parent) = self.path.parent()
			&& !parent.as_os_str().is_empty()
		{
			std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
		}
		std::fs::write(&self.path, b"true").map_err(|e| self.io_error(e))
	}

	fn clear(&self) -> Result<(), StoreError> {
		match std::fs::remove_file(&self.path) {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(self.io_error(e)),
		}
	}
}

/// Flag kept in the origin's `localStorage` under a fixed key.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone)]
pub struct LocalStorageRecoveryStore {
	key: String,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorageRecoveryStore {
	/// Creates a store for the flag under `key`.
	pub fn new(key: impl Into<String>) -> Self {
		Self { key: key.into() }
	}

	/// The `localStorage` key holding the flag.
	pub fn key(&self) -> &str {
		&self.key
	}

	fn storage() -> Result<web_sys::Storage, StoreError> {
		let window =
			web_sys::window().ok_or_else(|| StoreError::Unavailable("window is unavailable".to_string()))?;
		window
			.local_storage()
			.map_err(|e| StoreError::Unavailable(format!("{:?}", e)))?
			.ok_or_else(|| StoreError::Unavailable("localStorage is disabled".to_string()))
	}
}

#[cfg(target_arch = "wasm32")]
impl RecoveryStore for LocalStorageRecoveryStore {
	fn get(&self) -> Result<bool, StoreError> {
		let value = Self::storage()?
			.get_item(&self.key)
			.map_err(|e| StoreError::Unavailable(format!("{:?}", e)))?;
		Ok(value.is_some_and(|v| !v.is_empty()))
	}

	fn set(&self) -> Result<(), StoreError> {
		Self::storage()?
			.set_item(&self.key, "true")
			.map_err(|e| StoreError::Unavailable(format!("{:?}", e)))
	}

	fn clear(&self) -> Result<(), StoreError> {
		Self::storage()?
			.remove_item(&self.key)
			.map_err(|e| StoreError::Unavailable(format!("{:?}", e)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_memory_store_clones_share_flag() {
		let store = MemoryRecoveryStore::new();
		let other = store.clone();
		assert!(!store.get().unwrap());

		other.set().unwrap();
		assert!(store.get().unwrap());

		store.clear().unwrap();
		assert!(!other.is_set());
	}

	#[rstest]
	fn test_rc_dyn_store_delegates() {
		let inner = MemoryRecoveryStore::present();
		let store: Rc<dyn RecoveryStore> = Rc::new(inner.clone());
		assert!(store.get().unwrap());
		store.clear().unwrap();
		assert!(!inner.is_set());
	}

	#[cfg(not(target_arch = "wasm32"))]
	#[rstest]
	fn test_file_store_round_trip() {
		let dir = tempfile::tempdir().unwrap();
		let store = FileRecoveryStore::new(dir.path().join("nested").join("reload.flag"));

		assert!(!store.get().unwrap());
		store.set().unwrap();
		assert!(store.get().unwrap());
		assert!(store.path().exists());

		store.clear().unwrap();
		assert!(!store.get().unwrap());
		// Clearing again is fine.
		store.clear().unwrap();
	}

	#[cfg(not(target_arch = "wasm32"))]
	#[rstest]
	fn test_file_store_set_fails_under_a_file() {
		let dir = tempfile::tempdir().unwrap();
		let blocker = dir.path().join("blocker");
		std::fs::write(&blocker, b"").unwrap();

		let store = FileRecoveryStore::new(blocker.join("reload.flag"));
		assert!(matches!(store.set(), Err(StoreError::Io { .. })));
	}
}
