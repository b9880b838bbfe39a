//! Environment variable access
//!
//! Reads typed values from the process environment, optionally scoped by a
//! prefix such as `WAYMARK_`.

use std::env;

/// Default prefix for every waymark environment variable.
pub const DEFAULT_PREFIX: &str = "WAYMARK_";

/// Environment variable reader with prefix support
#[derive(Debug, Clone, Default)]
pub struct Env {
	/// Optional prefix for environment variables (e.g., "WAYMARK_")
	pub prefix: Option<String>,
}

impl Env {
	/// Create a new Env instance without a prefix
	pub fn new() -> Self {
		Self { prefix: None }
	}

	/// Set a prefix for all environment variable lookups
	pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = Some(prefix.into());
		self
	}

	/// Get the full key name with prefix
	pub fn key_name(&self, key: &str) -> String {
		match &self.prefix {
			Some(prefix) => format!("{}{}", prefix, key),
			None => key.to_string(),
		}
	}

	/// Read a value if it is set, `None` otherwise.
	pub fn optional_str(&self, key: &str) -> Result<Option<String>, EnvError> {
		let full_key = self.key_name(key);
		validate_env_var_name(&full_key)?;

		match env::var(&full_key) {
			Ok(val) => Ok(Some(val)),
			Err(env::VarError::NotPresent) => Ok(None),
			Err(env::VarError::NotUnicode(_)) => Err(EnvError::ParseError {
				key: full_key,
				value_len: 0,
				error: "value is not valid unicode".to_string(),
			}),
		}
	}

	/// Read a string value from environment
	pub fn str(&self, key: &str) -> Result<String, EnvError> {
		self.str_with_default(key, None)
	}

	/// Read a string value with a default
	pub fn str_with_default(&self, key: &str, default: Option<&str>) -> Result<String, EnvError> {
		match self.optional_str(key)? {
			Some(val) => Ok(val),
			None => match default {
				Some(d) => Ok(d.to_string()),
				None => Err(EnvError::MissingVariable(self.key_name(key))),
			},
		}
	}

	/// Read a boolean value from environment
	pub fn bool(&self, key: &str) -> Result<bool, EnvError> {
		self.bool_with_default(key, None)
	}

	/// Read a boolean value with a default
	pub fn bool_with_default(&self, key: &str, default: Option<bool>) -> Result<bool, EnvError> {
		match self.optional_str(key)? {
			Some(val) => parse_bool(&val).map_err(|e| EnvError::ParseError {
				key: self.key_name(key),
				value_len: val.len(),
				error: e,
			}),
			None => default.ok_or_else(|| EnvError::MissingVariable(self.key_name(key))),
		}
	}

	/// Read an integer value from environment
	pub fn int(&self, key: &str) -> Result<i64, EnvError> {
		self.int_with_default(key, None)
	}

	/// Read an integer value with a default
	pub fn int_with_default(&self, key: &str, default: Option<i64>) -> Result<i64, EnvError> {
		match self.optional_str(key)? {
			Some(val) => val.trim().parse::<i64>().map_err(|e| EnvError::ParseError {
				key: self.key_name(key),
				value_len: val.len(),
				error: e.to_string(),
			}),
			None => default.ok_or_else(|| EnvError::MissingVariable(self.key_name(key))),
		}
	}
}

/// Parses the usual spellings of a boolean flag.
pub fn parse_bool(value: &str) -> Result<bool, String> {
	match value.trim().to_ascii_lowercase().as_str() {
		"true" | "1" | "yes" | "on" => Ok(true),
		"false" | "0" | "no" | "off" | "" => Ok(false),
		other => Err(format!("'{}' is not a boolean", other)),
	}
}

/// Validates an environment variable name.
///
/// Rejects names that are empty, contain control characters, or contain
/// the `=` character (which is used as the key-value separator).
pub fn validate_env_var_name(name: &str) -> Result<(), EnvError> {
	if name.is_empty() {
		return Err(EnvError::InvalidVariableName {
			name: name.to_string(),
			reason: "environment variable name must not be empty".to_string(),
		});
	}

	if let Some(pos) = name.find(|c: char| c.is_control()) {
		return Err(EnvError::InvalidVariableName {
			name: name.to_string(),
			reason: format!(
				"environment variable name contains control character at position {}",
				pos
			),
		});
	}

	if name.contains('=') {
		return Err(EnvError::InvalidVariableName {
			name: name.to_string(),
			reason: "environment variable name must not contain '='".to_string(),
		});
	}

	Ok(())
}

/// Environment variable errors
#[derive(Debug, thiserror::Error)]
pub enum EnvError {
	#[error("Missing environment variable: {0}")]
	MissingVariable(String),

	#[error("Failed to parse environment variable '{key}' (value length: {value_len}): {error}")]
	ParseError {
		key: String,
		/// Length of the original value, the raw value is never echoed
		value_len: usize,
		error: String,
	},

	#[error("Invalid environment variable name '{name}': {reason}")]
	InvalidVariableName { name: String, reason: String },
}
