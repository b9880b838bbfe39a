//! Route definitions and the route table.
//!
//! The table is plain data handed to the router at startup. Each route
//! points at a component module that is either already available or loaded
//! on first use through a [`ModuleLoader`].

use super::error::ModuleLoadError;
use super::location::RouteMeta;
use async_trait::async_trait;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

/// A loaded component module, opaque to the router.
#[derive(Clone)]
pub struct ModuleHandle(Rc<dyn Any>);

impl ModuleHandle {
	/// Wraps a module value.
	pub fn new<T: Any>(module: T) -> Self {
		Self(Rc::new(module))
	}

	/// Borrows the module as `T`.
	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		self.0.downcast_ref::<T>()
	}
}

impl fmt::Debug for ModuleHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("ModuleHandle(..)")
	}
}

/// Loads a route's component module on demand.
#[async_trait(?Send)]
pub trait ModuleLoader {
	/// Fetches and evaluates the module.
	async fn load(&self) -> Result<ModuleHandle, ModuleLoadError>;
}

/// [`ModuleLoader`] backed by an async closure.
pub struct FnLoader<F>(F);

#[async_trait(?Send)]
impl<F, Fut> ModuleLoader for FnLoader<F>
where
	F: Fn() -> Fut + 'static,
	Fut: Future<Output = Result<ModuleHandle, ModuleLoadError>> + 'static,
{
	async fn load(&self) -> Result<ModuleHandle, ModuleLoadError> {
		(self.0)().await
	}
}

/// How a route reaches its component.
#[derive(Clone)]
pub enum ComponentRef {
	/// Module bundled with the application.
	Eager(ModuleHandle),
	/// Module fetched the first time the route is visited.
	Lazy(Rc<dyn ModuleLoader>),
}

impl ComponentRef {
	/// A component that needs no loading.
	pub fn eager<T: Any>(module: T) -> Self {
		Self::Eager(ModuleHandle::new(module))
	}

	/// A component loaded through `loader`.
	pub fn lazy(loader: impl ModuleLoader + 'static) -> Self {
		Self::Lazy(Rc::new(loader))
	}

	/// A component loaded by an async closure.
	pub fn lazy_fn<F, Fut>(load: F) -> Self
	where
		F: Fn() -> Fut + 'static,
		Fut: Future<Output = Result<ModuleHandle, ModuleLoadError>> + 'static,
	{
		Self::lazy(FnLoader(load))
	}
}

impl fmt::Debug for ComponentRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Eager(_) => f.write_str("Eager"),
			Self::Lazy(_) => f.write_str("Lazy"),
		}
	}
}

/// A single route definition.
#[derive(Debug, Clone)]
pub struct RouteDefinition {
	path: String,
	name: Option<String>,
	component: ComponentRef,
	layout: Option<String>,
	meta: RouteMeta,
}

impl RouteDefinition {
	/// Creates a route.
	pub fn new(path: impl Into<String>, component: ComponentRef) -> Self {
		Self {
			path: path.into(),
			name: None,
			component,
			layout: None,
			meta: RouteMeta::new(),
		}
	}

	/// Creates a named route.
	pub fn named(name: impl Into<String>, path: impl Into<String>, component: ComponentRef) -> Self {
		Self {
			name: Some(name.into()),
			..Self::new(path, component)
		}
	}

	/// Sets the layout identifier.
	pub fn with_layout(mut self, layout: impl Into<String>) -> Self {
		self.layout = Some(layout.into());
		self
	}

	/// Adds a metadata entry.
	pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
		self.meta.insert(key.into(), value.into());
		self
	}

	/// Path pattern.
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Route name.
	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	/// Component reference.
	pub fn component(&self) -> &ComponentRef {
		&self.component
	}

	/// Layout identifier, set by the layout composer.
	pub fn layout(&self) -> Option<&str> {
		self.layout.as_deref()
	}

	/// Metadata.
	pub fn meta(&self) -> &RouteMeta {
		&self.meta
	}

	pub(crate) fn set_layout(&mut self, layout: Option<String>) {
		self.layout = layout;
	}
}

/// Ordered sequence of route definitions. First match wins.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
	routes: Vec<RouteDefinition>,
}

impl RouteTable {
	/// Creates a table from definitions.
	pub fn new(routes: Vec<RouteDefinition>) -> Self {
		Self { routes }
	}

	/// Appends a route.
	pub fn route(mut self, route: RouteDefinition) -> Self {
		self.routes.push(route);
		self
	}

	/// Iterates in table order.
	pub fn iter(&self) -> impl Iterator<Item = &RouteDefinition> {
		self.routes.iter()
	}

	/// Number of routes.
	pub fn len(&self) -> usize {
		self.routes.len()
	}

	/// Whether the table is empty.
	pub fn is_empty(&self) -> bool {
		self.routes.is_empty()
	}

	/// Consumes the table.
	pub fn into_routes(self) -> Vec<RouteDefinition> {
		self.routes
	}
}

impl FromIterator<RouteDefinition> for RouteTable {
	fn from_iter<I: IntoIterator<Item = RouteDefinition>>(iter: I) -> Self {
		Self::new(iter.into_iter().collect())
	}
}

impl IntoIterator for RouteTable {
	type Item = RouteDefinition;
	type IntoIter = std::vec::IntoIter<RouteDefinition>;

	fn into_iter(self) -> Self::IntoIter {
		self.routes.into_iter()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_route_named() {
		let route = RouteDefinition::named("home", "/", ComponentRef::eager("Home"));
		assert_eq!(route.name(), Some("home"));
		assert_eq!(route.path(), "/");
		assert!(route.layout().is_none());
	}

	#[rstest]
	fn test_route_meta_and_layout() {
		let route = RouteDefinition::new("/devices/", ComponentRef::eager(()))
			.with_layout("default")
			.with_meta("title", "Devices")
			.with_meta("requires_device", true);
		assert_eq!(route.layout(), Some("default"));
		assert_eq!(route.meta()["title"], "Devices");
		assert_eq!(route.meta()["requires_device"], true);
	}

	#[rstest]
	fn test_module_handle_downcast() {
		let handle = ModuleHandle::new(String::from("DevicesPage"));
		assert_eq!(handle.downcast_ref::<String>().map(String::as_str), Some("DevicesPage"));
		assert!(handle.downcast_ref::<u32>().is_none());
	}

	#[rstest]
	#[tokio::test]
	async fn test_fn_loader() {
		let component = ComponentRef::lazy_fn(|| async { Ok(ModuleHandle::new(7_u32)) });
		let ComponentRef::Lazy(loader) = component else {
			panic!("expected a lazy component");
		};
		let handle = loader.load().await.unwrap();
		assert_eq!(handle.downcast_ref::<u32>(), Some(&7));
	}

	#[rstest]
	fn test_table_order() {
		let table: RouteTable = ["/", "/devices/", "/settings/"]
			.into_iter()
			.map(|p| RouteDefinition::new(p, ComponentRef::eager(())))
			.collect();
		let paths: Vec<&str> = table.iter().map(RouteDefinition::path).collect();
		assert_eq!(paths, vec!["/", "/devices/", "/settings/"]);
	}
}
