//! Layout composition.
//!
//! A [`LayoutComposer`] maps the raw route table to the table the router
//! actually uses, attaching a layout identifier to each route. Composers
//! must keep every route's path and name.

use super::route::RouteTable;

/// Name of the layout used when a route does not pick one.
pub const DEFAULT_LAYOUT: &str = "default";

/// Metadata key a route uses to choose its layout.
pub const LAYOUT_META_KEY: &str = "layout";

/// Attaches layout metadata to a route table.
pub trait LayoutComposer {
	/// Returns the augmented table.
	fn compose(&self, routes: RouteTable) -> RouteTable;
}

impl<F> LayoutComposer for F
where
	F: Fn(RouteTable) -> RouteTable,
{
	fn compose(&self, routes: RouteTable) -> RouteTable {
		self(routes)
	}
}

/// Leaves the table untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLayouts;

impl LayoutComposer for NoLayouts {
	fn compose(&self, routes: RouteTable) -> RouteTable {
		routes
	}
}

/// Picks each route's layout from its metadata.
///
/// - an explicit layout already on the route is kept;
/// - `meta.layout = "<name>"` selects that layout;
/// - `meta.layout = false` opts the route out of layouts;
/// - anything else gets the default layout.
#[derive(Debug, Clone)]
pub struct MetaLayouts {
	default_layout: String,
}

impl MetaLayouts {
	/// Uses `default_layout` for routes that do not choose one.
	pub fn new(default_layout: impl Into<String>) -> Self {
		Self {
			default_layout: default_layout.into(),
		}
	}
}

impl Default for MetaLayouts {
	fn default() -> Self {
		Self::new(DEFAULT_LAYOUT)
	}
}

impl LayoutComposer for MetaLayouts {
	fn compose(&self, routes: RouteTable) -> RouteTable {
		routes
			.into_iter()
			.map(|mut route| {
				if route.layout().is_some() {
					return route;
				}
				let layout = match route.meta().get(LAYOUT_META_KEY) {
					Some(serde_json::Value::Bool(false)) => None,
					Some(serde_json::Value::String(name)) if !name.is_empty() => Some(name.clone()),
					_ => Some(self.default_layout.clone()),
				};
				route.set_layout(layout);
				route
			})
			.collect()
	}
}
