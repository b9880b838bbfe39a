//! History backends.
//!
//! Locations handed to and returned from a [`History`] are relative to the
//! router base (`/devices/?id=1#top`); the backend adds and strips the base
//! prefix itself.

use super::error::NavigationError;
use std::cell::{Cell, RefCell};

/// How a navigation is written to history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryMode {
	/// Add a new entry.
	Push,
	/// Overwrite the current entry.
	Replace,
	/// The entry already changed (back/forward); write nothing.
	Pop,
}

/// A session history the router can read and write.
pub trait History {
	/// Normalized base path (`""` or `/prefix`).
	fn base(&self) -> &str;

	/// Current location relative to the base.
	fn location(&self) -> Result<String, NavigationError>;

	/// Adds an entry.
	fn push(&self, location: &str) -> Result<(), NavigationError>;

	/// Overwrites the current entry.
	fn replace(&self, location: &str) -> Result<(), NavigationError>;

	/// Moves through the entries.
	fn go(&self, delta: i32) -> Result<(), NavigationError>;

	/// Whether [`History::go`] has updated [`History::location`] by the time
	/// it returns. Browser traversal is asynchronous and reported through
	/// `popstate` instead.
	fn traverses_synchronously(&self) -> bool {
		true
	}

	/// Absolute href for a location relative to the base.
	fn href(&self, location: &str) -> String {
		format!("{}{}", self.base(), location)
	}
}

/// Removes `base` from the front of an absolute location.
pub fn strip_base<'a>(base: &str, location: &'a str) -> &'a str {
	if base.is_empty() {
		return location;
	}
	match location.strip_prefix(base) {
		Some("") => "/",
		Some(rest) if rest.starts_with(['/', '?', '#']) => rest,
		_ => location,
	}
}

/// In-memory history for native targets and tests.
#[derive(Debug)]
pub struct MemoryHistory {
	base: String,
	entries: RefCell<Vec<String>>,
	cursor: Cell<usize>,
}

impl MemoryHistory {
	/// Starts with a single entry at `/`.
	pub fn new(base: &str) -> Self {
		Self::with_initial(base, "/")
	}

	/// Starts with a single entry at `initial` (relative to the base).
	pub fn with_initial(base: &str, initial: &str) -> Self {
		let base = waymark_conf::normalize_base(base);
		let entry = format!("{}{}", base, initial);
		Self {
			base,
			entries: RefCell::new(vec![entry]),
			cursor: Cell::new(0),
		}
	}

	/// Every entry, as absolute hrefs.
	pub fn entries(&self) -> Vec<String> {
		self.entries.borrow().clone()
	}

	/// Index of the current entry.
	pub fn position(&self) -> usize {
		self.cursor.get()
	}
}

impl History for MemoryHistory {
	fn base(&self) -> &str {
		&self.base
	}

	fn location(&self) -> Result<String, NavigationError> {
		let entries = self.entries.borrow();
		let current = entries
			.get(self.cursor.get())
			.ok_or_else(|| NavigationError::History("history cursor out of range".to_string()))?;
		Ok(strip_base(&self.base, current).to_string())
	}

	fn push(&self, location: &str) -> Result<(), NavigationError> {
		let href = self.href(location);
		let mut entries = self.entries.borrow_mut();
		entries.truncate(self.cursor.get() + 1);
		entries.push(href);
		self.cursor.set(entries.len() - 1);
		Ok(())
	}

	fn replace(&self, location: &str) -> Result<(), NavigationError> {
		let href = self.href(location);
		let mut entries = self.entries.borrow_mut();
		match entries.get_mut(self.cursor.get()) {
			Some(entry) => *entry = href,
			None => return Err(NavigationError::History("history cursor out of range".to_string())),
		}
		Ok(())
	}

	fn go(&self, delta: i32) -> Result<(), NavigationError> {
		let len = self.entries.borrow().len() as i64;
		let target = self.cursor.get() as i64 + i64::from(delta);
		// Out-of-range traversal is ignored, like the browser does.
		if (0..len).contains(&target) {
			self.cursor.set(target as usize);
		}
		Ok(())
	}
}

/// The browser's session history (`window.history`).
#[cfg(target_arch = "wasm32")]
#[derive(Debug)]
pub struct BrowserHistory {
	base: String,
}

#[cfg(target_arch = "wasm32")]
impl BrowserHistory {
	/// Binds to `window.history` under `base`.
	pub fn new(base: &str) -> Self {
		Self {
			base: waymark_conf::normalize_base(base),
		}
	}

	fn window() -> Result<web_sys::Window, NavigationError> {
		web_sys::window().ok_or_else(|| NavigationError::History("window is unavailable".to_string()))
	}

	fn history() -> Result<web_sys::History, NavigationError> {
		Self::window()?.history().map_err(js_error)
	}
}

#[cfg(target_arch = "wasm32")]
fn js_error(value: wasm_bindgen::JsValue) -> NavigationError {
	NavigationError::History(format!("{:?}", value))
}

#[cfg(target_arch = "wasm32")]
impl History for BrowserHistory {
	fn base(&self) -> &str {
		&self.base
	}

	fn location(&self) -> Result<String, NavigationError> {
		let location = Self::window()?.location();
		let path = location.pathname().map_err(js_error)?;
		let search = location.search().map_err(js_error)?;
		let hash = location.hash().map_err(js_error)?;
		let relative = strip_base(&self.base, &path);
		Ok(format!("{}{}{}", relative, search, hash))
	}

	fn push(&self, location: &str) -> Result<(), NavigationError> {
		Self::history()?
			.push_state_with_url(&wasm_bindgen::JsValue::NULL, "", Some(&self.href(location)))
			.map_err(js_error)
	}

	fn replace(&self, location: &str) -> Result<(), NavigationError> {
		Self::history()?
			.replace_state_with_url(&wasm_bindgen::JsValue::NULL, "", Some(&self.href(location)))
			.map_err(js_error)
	}

	fn go(&self, delta: i32) -> Result<(), NavigationError> {
		Self::history()?.go_with_delta(delta).map_err(js_error)
	}

	fn traverses_synchronously(&self) -> bool {
		false
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("", "/devices/", "/devices/")]
	#[case("/viewer", "/viewer/devices/", "/devices/")]
	#[case("/viewer", "/viewer", "/")]
	#[case("/viewer", "/viewer?x=1", "?x=1")]
	#[case("/viewer", "/viewerx/", "/viewerx/")]
	#[case("/viewer", "/other/", "/other/")]
	fn test_strip_base(#[case] base: &str, #[case] location: &str, #[case] expected: &str) {
		assert_eq!(strip_base(base, location), expected);
	}

	#[rstest]
	fn test_memory_history_push_and_go() {
		let history = MemoryHistory::new("/viewer/");
		history.push("/devices/").unwrap();
		history.push("/settings/").unwrap();
		assert_eq!(history.location().unwrap(), "/settings/");
		assert_eq!(
			history.entries(),
			vec!["/viewer/", "/viewer/devices/", "/viewer/settings/"]
		);

		history.go(-1).unwrap();
		assert_eq!(history.location().unwrap(), "/devices/");

		// Pushing drops the forward entries.
		history.push("/about/").unwrap();
		assert_eq!(history.entries().len(), 3);
		assert_eq!(history.location().unwrap(), "/about/");
	}

	#[rstest]
	fn test_memory_history_replace() {
		let history = MemoryHistory::with_initial("/", "/devices");
		history.replace("/devices/").unwrap();
		assert_eq!(history.entries(), vec!["/devices/"]);
		assert_eq!(history.position(), 0);
	}

	#[rstest]
	fn test_memory_history_go_out_of_range_is_ignored() {
		let history = MemoryHistory::new("/");
		history.go(-5).unwrap();
		history.go(3).unwrap();
		assert_eq!(history.location().unwrap(), "/");
	}

	#[rstest]
	fn test_href_includes_base() {
		let history = MemoryHistory::new("/viewer");
		assert_eq!(history.href("/devices/?id=1"), "/viewer/devices/?id=1");
	}
}
