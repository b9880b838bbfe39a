//! Path patterns.
//!
//! Patterns are made of `/`-separated segments. A segment is either literal
//! text, a `{name}` parameter matching one segment, or (last position only)
//! a `{*name}` catch-all matching the rest of the path.
//!
//! Matching is non-strict: `/devices` and `/devices/` both match the pattern
//! `/devices/`. Canonical form is enforced by the navigation guard, not here.

use super::error::NavigationError;
use super::location::Params;
use regex::Regex;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
	Static(String),
	Param(String),
	CatchAll(String),
}

/// A compiled route path pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
	raw: String,
	segments: Vec<Segment>,
	regex: Regex,
}

impl PathPattern {
	/// Compiles a pattern such as `/devices/{id}/`.
	pub fn parse(pattern: &str) -> Result<Self, NavigationError> {
		let invalid = |reason: String| NavigationError::InvalidPattern {
			pattern: pattern.to_string(),
			reason,
		};

		let trimmed = pattern.trim();
		if !trimmed.starts_with('/') {
			return Err(invalid("pattern must start with '/'".to_string()));
		}

		let pieces: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();
		let mut segments = Vec::with_capacity(pieces.len());
		let mut seen = HashSet::new();

		for (index, piece) in pieces.iter().enumerate() {
			let segment = if let Some(inner) = piece.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
				let (name, catch_all) = match inner.strip_prefix('*') {
					Some(name) => (name, true),
					None => (inner, false),
				};
				validate_param_name(name).map_err(invalid)?;
				if !seen.insert(name.to_string()) {
					return Err(invalid(format!("parameter '{}' appears twice", name)));
				}
				if catch_all {
					if index + 1 != pieces.len() {
						return Err(invalid(format!(
							"catch-all '{}' must be the last segment",
							name
						)));
					}
					Segment::CatchAll(name.to_string())
				} else {
					Segment::Param(name.to_string())
				}
			} else if piece.contains(['{', '}']) {
				return Err(invalid(format!(
					"segment '{}' mixes literal text and a parameter",
					piece
				)));
			} else {
				Segment::Static((*piece).to_string())
			};
			segments.push(segment);
		}

		let mut source = String::from("^");
		for segment in &segments {
			match segment {
				Segment::Static(text) => {
					source.push('/');
					source.push_str(&regex::escape(text));
				}
				Segment::Param(name) => {
					source.push_str(&format!("/(?P<{}>[^/]+)", name));
				}
				Segment::CatchAll(name) => {
					source.push_str(&format!("(?:/(?P<{}>.*?))?", name));
				}
			}
		}
		source.push_str("/?$");

		let regex = Regex::new(&source).map_err(|e| invalid(e.to_string()))?;

		Ok(Self {
			raw: trimmed.to_string(),
			segments,
			regex,
		})
	}

	/// The pattern as written.
	pub fn as_str(&self) -> &str {
		&self.raw
	}

	/// Parameter names in pattern order.
	pub fn param_names(&self) -> impl Iterator<Item = &str> {
		self.segments.iter().filter_map(|s| match s {
			Segment::Param(name) | Segment::CatchAll(name) => Some(name.as_str()),
			Segment::Static(_) => None,
		})
	}

	/// Matches `path` and extracts decoded parameters.
	pub fn matches(&self, path: &str) -> Option<Params> {
		let captures = self.regex.captures(path)?;
		let mut params = Params::new();
		for name in self.param_names() {
			let raw = captures.name(name).map(|m| m.as_str()).unwrap_or("");
			let value = urlencoding::decode(raw)
				.map(|v| v.into_owned())
				.unwrap_or_else(|_| raw.to_string());
			params.insert(name.to_string(), value);
		}
		Some(params)
	}

	/// Builds the canonical path for `params`, or `None` when a parameter is
	/// missing.
	pub fn reverse(&self, params: &Params) -> Option<String> {
		let mut path = String::new();
		for segment in &self.segments {
			match segment {
				Segment::Static(text) => {
					path.push('/');
					path.push_str(text);
				}
				Segment::Param(name) => {
					let value = params.get(name)?;
					path.push('/');
					path.push_str(&urlencoding::encode(value));
				}
				Segment::CatchAll(name) => {
					let value = params.get(name).map(|v| v.trim_matches('/')).unwrap_or("");
					if !value.is_empty() {
						path.push('/');
						path.push_str(value);
					}
				}
			}
		}
		path.push('/');
		Some(path)
	}

	/// First parameter that `params` does not provide.
	pub fn missing_param<'a>(&'a self, params: &Params) -> Option<&'a str> {
		self.segments.iter().find_map(|s| match s {
			Segment::Param(name) if !params.contains_key(name) => Some(name.as_str()),
			_ => None,
		})
	}
}

fn validate_param_name(name: &str) -> Result<(), String> {
	let mut chars = name.chars();
	match chars.next() {
		None => Err("parameter name must not be empty".to_string()),
		Some(first) if !(first.is_ascii_alphabetic() || first == '_') => Err(format!(
			"parameter '{}' must start with a letter or '_'",
			name
		)),
		Some(_) if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') => Err(format!(
			"parameter '{}' may only contain letters, digits and '_'",
			name
		)),
		Some(_) => Ok(()),
	}
}
