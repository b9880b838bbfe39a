//! Navigation settings
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `WAYMARK_*` environment variables.
//!
//! ```toml
//! base_path = "/viewer/"
//! max_redirects = 10
//! log_level = "info"
//!
//! [recovery_store]
//! kind = "file"
//! path = "/var/lib/viewer/dynamic-reload"
//! ```

use crate::env::{DEFAULT_PREFIX, Env, EnvError};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Storage key of the recovery flag.
///
/// The value matches the key already written by deployed browser clients, so
/// a flag left behind by an older build is still honoured.
pub const DEFAULT_RECOVERY_KEY: &str = "vuetify:dynamic-reload";

/// Default bound on consecutive guard redirects within one navigation.
pub const DEFAULT_MAX_REDIRECTS: u32 = 10;

/// Where the recovery flag is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RecoveryStoreKind {
	/// In-process only; lost when the process exits.
	Memory,
	/// Marker file on disk; survives a process restart.
	File {
		/// Location of the marker file.
		path: PathBuf,
	},
	/// Browser `localStorage`, scoped to the origin.
	LocalStorage,
}

impl Default for RecoveryStoreKind {
	fn default() -> Self {
		if cfg!(target_arch = "wasm32") {
			Self::LocalStorage
		} else {
			Self::Memory
		}
	}
}

/// Settings consumed when bootstrapping the router.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NavigationSettings {
	/// Root prefix for every navigation, e.g. `/` or `/viewer/`.
	pub base_path: String,
	/// Storage key of the recovery flag.
	pub recovery_key: String,
	/// Maximum number of consecutive guard redirects.
	pub max_redirects: u32,
	/// Backend holding the recovery flag.
	pub recovery_store: RecoveryStoreKind,
	/// Default log filter for native binaries.
	pub log_level: String,
}

impl Default for NavigationSettings {
	fn default() -> Self {
		Self {
			base_path: "/".to_string(),
			recovery_key: DEFAULT_RECOVERY_KEY.to_string(),
			max_redirects: DEFAULT_MAX_REDIRECTS,
			recovery_store: RecoveryStoreKind::default(),
			log_level: "info".to_string(),
		}
	}
}

impl NavigationSettings {
	/// Parses settings from a TOML document. Missing keys keep their defaults.
	pub fn from_toml_str(source: &str) -> Result<Self, SettingsError> {
		let settings: Self = toml::from_str(source)?;
		settings.validate()?;
		Ok(settings)
	}

	/// Reads settings from a TOML file.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
		let path = path.as_ref();
		let source = fs::read_to_string(path).map_err(|source| SettingsError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		Self::from_toml_str(&source)
	}

	/// Defaults overridden by `WAYMARK_*` environment variables.
	pub fn from_env() -> Result<Self, SettingsError> {
		Self::default().merge_env(&Env::new().with_prefix(DEFAULT_PREFIX))
	}

	/// Optional file, then environment overrides.
	pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
		let base = match path {
			Some(path) => Self::from_file(path)?,
			None => Self::default(),
		};
		base.merge_env(&Env::new().with_prefix(DEFAULT_PREFIX))
	}

	/// Applies the variables present in `env` on top of `self`.
	///
	/// Recognised keys: `BASE_URL`, `RECOVERY_KEY`, `MAX_REDIRECTS`,
	/// `RECOVERY_STORE` (`memory`, `file`, `local-storage`), `RECOVERY_FILE`
	/// and `LOG_LEVEL`.
	pub fn merge_env(mut self, env: &Env) -> Result<Self, SettingsError> {
		if let Some(base) = env.optional_str("BASE_URL")? {
			self.base_path = base;
		}
		if let Some(key) = env.optional_str("RECOVERY_KEY")? {
			self.recovery_key = key;
		}
		if env.optional_str("MAX_REDIRECTS")?.is_some() {
			let raw = env.int("MAX_REDIRECTS")?;
			self.max_redirects = u32::try_from(raw).map_err(|_| SettingsError::Invalid {
				field: "max_redirects",
				reason: format!("{} is out of range", raw),
			})?;
		}
		if let Some(level) = env.optional_str("LOG_LEVEL")? {
			self.log_level = level;
		}

		let file = env.optional_str("RECOVERY_FILE")?;
		match env.optional_str("RECOVERY_STORE")?.as_deref() {
			Some("memory") => self.recovery_store = RecoveryStoreKind::Memory,
			Some("local-storage") => self.recovery_store = RecoveryStoreKind::LocalStorage,
			Some("file") => {
				let path = file.ok_or_else(|| SettingsError::Invalid {
					field: "recovery_store",
					reason: format!(
						"file store requires {}",
						env.key_name("RECOVERY_FILE")
					),
				})?;
				self.recovery_store = RecoveryStoreKind::File {
					path: PathBuf::from(path),
				};
			}
			Some(other) => {
				return Err(SettingsError::Invalid {
					field: "recovery_store",
					reason: format!("unknown store kind '{}'", other),
				});
			}
			None => {
				if let (Some(path), RecoveryStoreKind::File { .. }) = (file, &self.recovery_store) {
					self.recovery_store = RecoveryStoreKind::File {
						path: PathBuf::from(path),
					};
				}
			}
		}

		self.validate()?;
		Ok(self)
	}

	/// Checks the invariants the router relies on.
	pub fn validate(&self) -> Result<(), SettingsError> {
		if !self.base_path.starts_with('/') {
			return Err(SettingsError::Invalid {
				field: "base_path",
				reason: format!("'{}' must start with '/'", self.base_path),
			});
		}
		if self.base_path.contains(['?', '#']) {
			return Err(SettingsError::Invalid {
				field: "base_path",
				reason: "must not contain a query or fragment".to_string(),
			});
		}
		if self.recovery_key.trim().is_empty() {
			return Err(SettingsError::Invalid {
				field: "recovery_key",
				reason: "must not be empty".to_string(),
			});
		}
		if self.max_redirects == 0 {
			return Err(SettingsError::Invalid {
				field: "max_redirects",
				reason: "must be at least 1".to_string(),
			});
		}
		Ok(())
	}

	/// Base path with a leading slash and no trailing slash; the root base
	/// normalizes to the empty string.
	pub fn normalized_base(&self) -> String {
		normalize_base(&self.base_path)
	}
}

/// Normalizes a base path: leading `/`, no trailing `/`, root becomes `""`.
pub fn normalize_base(base: &str) -> String {
	let trimmed = base.trim().trim_end_matches('/');
	if trimmed.is_empty() {
		return String::new();
	}
	if trimmed.starts_with('/') {
		trimmed.to_string()
	} else {
		format!("/{}", trimmed)
	}
}

/// Settings loading errors
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	#[error("Failed to read settings file {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("Environment error: {0}")]
	Env(#[from] EnvError),

	#[error("Invalid setting '{field}': {reason}")]
	Invalid { field: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_defaults_are_valid() {
		let settings = NavigationSettings::default();
		assert!(settings.validate().is_ok());
		assert_eq!(settings.recovery_key, DEFAULT_RECOVERY_KEY);
		assert_eq!(settings.max_redirects, DEFAULT_MAX_REDIRECTS);
		assert_eq!(settings.recovery_store, RecoveryStoreKind::Memory);
	}

	#[rstest]
	#[case("/", "")]
	#[case("", "")]
	#[case("/viewer/", "/viewer")]
	#[case("/viewer", "/viewer")]
	#[case("viewer/", "/viewer")]
	#[case("/a/b//", "/a/b")]
	fn test_normalize_base(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(normalize_base(input), expected);
	}

	#[rstest]
	fn test_from_toml_partial_keeps_defaults() {
		let settings = NavigationSettings::from_toml_str("base_path = \"/viewer/\"").unwrap();
		assert_eq!(settings.base_path, "/viewer/");
		assert_eq!(settings.recovery_key, DEFAULT_RECOVERY_KEY);
	}

	#[rstest]
	fn test_from_toml_file_store() {
		let settings = NavigationSettings::from_toml_str(
			"[recovery_store]\nkind = \"file\"\npath = \"/tmp/flag\"\n",
		)
		.unwrap();
		assert_eq!(
			settings.recovery_store,
			RecoveryStoreKind::File {
				path: PathBuf::from("/tmp/flag")
			}
		);
	}

	#[rstest]
	fn test_from_toml_rejects_unknown_field() {
		let err = NavigationSettings::from_toml_str("strict = true").unwrap_err();
		assert!(matches!(err, SettingsError::Toml(_)));
	}

	#[rstest]
	#[case("base_path = \"viewer\"", "base_path")]
	#[case("base_path = \"/v?x=1\"", "base_path")]
	#[case("recovery_key = \"  \"", "recovery_key")]
	#[case("max_redirects = 0", "max_redirects")]
	fn test_validate_rejects(#[case] source: &str, #[case] expected_field: &str) {
		let err = NavigationSettings::from_toml_str(source).unwrap_err();
		match err {
			SettingsError::Invalid { field, .. } => assert_eq!(field, expected_field),
			other => panic!("unexpected error: {other}"),
		}
	}
}
