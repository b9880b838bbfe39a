//! Navigation requests and resolved locations.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Route parameters, name to value.
pub type Params = HashMap<String, String>;

/// Arbitrary route metadata.
pub type RouteMeta = serde_json::Map<String, serde_json::Value>;

/// Ordered query string that may repeat a name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
	pairs: Vec<(String, String)>,
}

impl Query {
	/// Creates an empty query.
	pub fn new() -> Self {
		Self::default()
	}

	/// Parses `a=1&a=2&b=x`, with or without a leading `?`.
	///
	/// Malformed percent escapes are decoded lossily rather than rejected.
	pub fn parse(raw: &str) -> Self {
		let raw = raw.strip_prefix('?').unwrap_or(raw);
		if raw.is_empty() {
			return Self::new();
		}
		let pairs = serde_urlencoded::from_str::<Vec<(String, String)>>(raw).unwrap_or_default();
		Self { pairs }
	}

	/// Appends a value, keeping any existing values for `name`.
	pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
		self.pairs.push((name.into(), value.into()));
	}

	/// Replaces every value for `name` with a single value.
	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
		let name = name.into();
		self.pairs.retain(|(k, _)| *k != name);
		self.pairs.push((name, value.into()));
	}

	/// Builder form of [`Query::append`].
	pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.append(name, value);
		self
	}

	/// First value for `name`.
	pub fn get(&self, name: &str) -> Option<&str> {
		self.pairs
			.iter()
			.find(|(k, _)| k == name)
			.map(|(_, v)| v.as_str())
	}

	/// Every value for `name`, in order.
	pub fn get_all(&self, name: &str) -> Vec<&str> {
		self.pairs
			.iter()
			.filter(|(k, _)| k == name)
			.map(|(_, v)| v.as_str())
			.collect()
	}

	/// Iterates over `(name, value)` pairs in order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	/// Number of pairs.
	pub fn len(&self) -> usize {
		self.pairs.len()
	}

	/// Whether there are no pairs.
	pub fn is_empty(&self) -> bool {
		self.pairs.is_empty()
	}

	/// Encodes the query without the leading `?`.
	pub fn to_query_string(&self) -> String {
		serde_urlencoded::to_string(&self.pairs).unwrap_or_default()
	}
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Query {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self {
			pairs: iter
				.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.collect(),
		}
	}
}

/// A navigation attempt: the path plus everything carried along with it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationRequest {
	/// Path relative to the router base, always starting with `/`.
	pub path: String,
	/// Fragment including the leading `#`, or empty.
	pub hash: String,
	/// Route parameters supplied by the caller.
	pub params: Params,
	/// Query string.
	pub query: Query,
}

impl NavigationRequest {
	/// Creates a request for `path` with no hash, params or query.
	pub fn new(path: impl Into<String>) -> Self {
		Self {
			path: normalize_path(path.into()),
			..Self::default()
		}
	}

	/// Parses a location string of the form `/path?query#hash`.
	pub fn parse(location: &str) -> Self {
		let (rest, hash) = match location.find('#') {
			Some(idx) => (&location[..idx], location[idx..].to_string()),
			None => (location, String::new()),
		};
		let (path, query) = match rest.find('?') {
			Some(idx) => (&rest[..idx], Query::parse(&rest[idx + 1..])),
			None => (rest, Query::new()),
		};
		Self {
			path: normalize_path(path.to_string()),
			hash: if hash == "#" { String::new() } else { hash },
			params: Params::new(),
			query,
		}
	}

	/// Sets the fragment; a missing `#` is added.
	pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
		let hash = hash.into();
		self.hash = if hash.is_empty() || hash.starts_with('#') {
			hash
		} else {
			format!("#{}", hash)
		};
		self
	}

	/// Sets the query.
	pub fn with_query(mut self, query: Query) -> Self {
		self.query = query;
		self
	}

	/// Adds a route parameter.
	pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.params.insert(name.into(), value.into());
		self
	}

	/// `path?query#hash`, relative to the router base.
	pub fn full_path(&self) -> String {
		format_full_path(&self.path, &self.query, &self.hash)
	}
}

impl From<&str> for NavigationRequest {
	fn from(location: &str) -> Self {
		Self::parse(location)
	}
}

impl From<String> for NavigationRequest {
	fn from(location: String) -> Self {
		Self::parse(&location)
	}
}

impl fmt::Display for NavigationRequest {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.full_path())
	}
}

/// What a caller asks the router to navigate to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationTarget {
	/// A concrete request.
	Request(NavigationRequest),
	/// A named route plus the parameters needed to build its path.
	Named {
		/// Route name.
		name: String,
		/// Path parameters.
		params: Params,
		/// Query string.
		query: Query,
		/// Fragment.
		hash: String,
	},
}

impl NavigationTarget {
	/// Target for a named route.
	pub fn named<I, K, V>(name: impl Into<String>, params: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self::Named {
			name: name.into(),
			params: params
				.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.collect(),
			query: Query::new(),
			hash: String::new(),
		}
	}
}

impl From<&str> for NavigationTarget {
	fn from(location: &str) -> Self {
		Self::Request(NavigationRequest::parse(location))
	}
}

impl From<String> for NavigationTarget {
	fn from(location: String) -> Self {
		Self::Request(NavigationRequest::parse(&location))
	}
}

impl From<NavigationRequest> for NavigationTarget {
	fn from(request: NavigationRequest) -> Self {
		Self::Request(request)
	}
}

/// A request after it has been matched against the route table.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteLocation {
	/// Canonical path.
	pub path: String,
	/// Fragment including `#`, or empty.
	pub hash: String,
	/// Query string.
	pub query: Query,
	/// Parameters extracted from the path.
	pub params: Params,
	/// `path?query#hash`.
	pub full_path: String,
	/// Name of the matched route.
	pub name: Option<String>,
	/// Layout attached by the layout composer.
	pub layout: Option<String>,
	/// Metadata of the matched route.
	pub meta: RouteMeta,
	/// Pattern of the matched route; `None` only for the start location.
	pub matched: Option<String>,
}

impl RouteLocation {
	/// The location a router reports before its first navigation.
	pub fn start() -> Self {
		Self {
			path: "/".to_string(),
			hash: String::new(),
			query: Query::new(),
			params: Params::new(),
			full_path: "/".to_string(),
			name: None,
			layout: None,
			meta: RouteMeta::new(),
			matched: None,
		}
	}

	/// Whether this is the start location.
	pub fn is_start(&self) -> bool {
		self.matched.is_none()
	}

	/// Converts back into a request for the same location.
	pub fn to_request(&self) -> NavigationRequest {
		NavigationRequest {
			path: self.path.clone(),
			hash: self.hash.clone(),
			params: self.params.clone(),
			query: self.query.clone(),
		}
	}
}

pub(crate) fn format_full_path(path: &str, query: &Query, hash: &str) -> String {
	let mut full = path.to_string();
	if !query.is_empty() {
		full.push('?');
		full.push_str(&query.to_query_string());
	}
	full.push_str(hash);
	full
}

fn normalize_path(path: String) -> String {
	if path.is_empty() {
		"/".to_string()
	} else if path.starts_with('/') {
		path
	} else {
		format!("/{}", path)
	}
}
