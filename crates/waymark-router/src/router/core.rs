//! Core Router Implementation.
//!
//! This module provides the main Router struct and the navigation pipeline:
//! guards, matching, module loading, history commit and readiness.

use super::error::{ModuleLoadError, NavigationError, NavigationFailure};
use super::guard::{GuardDecision, NavigationGuard};
use super::history::{History, HistoryMode};
use super::layout::{LayoutComposer, NoLayouts};
use super::location::{NavigationRequest, NavigationTarget, Params, RouteLocation};
use super::pattern::PathPattern;
use super::ready::{ReadyResult, ReadySignal};
use super::route::{ComponentRef, ModuleHandle, RouteDefinition, RouteTable};
use crate::{debug_log, error_log};
use std::cell::{Cell, OnceCell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use waymark_conf::{DEFAULT_MAX_REDIRECTS, NavigationSettings};

type ErrorHandler = Rc<dyn Fn(&NavigationError, &NavigationRequest)>;
type AfterHook = Rc<dyn Fn(&RouteLocation, &RouteLocation)>;

/// A route definition with its compiled pattern and loaded module.
struct RouteRecord {
	definition: RouteDefinition,
	pattern: PathPattern,
	module: OnceCell<ModuleHandle>,
}

impl RouteRecord {
	async fn load(&self) -> Result<ModuleHandle, ModuleLoadError> {
		if let Some(module) = self.module.get() {
			return Ok(module.clone());
		}
		let module = match self.definition.component() {
			ComponentRef::Eager(module) => module.clone(),
			ComponentRef::Lazy(loader) => loader.load().await?,
		};
		Ok(self.module.get_or_init(|| module).clone())
	}
}

/// Builder for [`Router`].
pub struct RouterBuilder {
	base: String,
	routes: RouteTable,
	composer: Box<dyn LayoutComposer>,
	history: Option<Box<dyn History>>,
	max_redirects: u32,
}

impl RouterBuilder {
	fn new() -> Self {
		Self {
			base: String::new(),
			routes: RouteTable::default(),
			composer: Box::new(NoLayouts),
			history: None,
			max_redirects: DEFAULT_MAX_REDIRECTS,
		}
	}

	/// Base path of the default history. Ignored when [`RouterBuilder::history`]
	/// supplies a backend, which carries its own base.
	pub fn base(mut self, base: &str) -> Self {
		self.base = base.to_string();
		self
	}

	/// Route table, before layout composition.
	pub fn routes(mut self, routes: RouteTable) -> Self {
		self.routes = routes;
		self
	}

	/// Layout composer applied to the table at build time.
	pub fn layouts(mut self, composer: impl LayoutComposer + 'static) -> Self {
		self.composer = Box::new(composer);
		self
	}

	/// History backend.
	pub fn history(mut self, history: impl History + 'static) -> Self {
		self.history = Some(Box::new(history));
		self
	}

	/// Bound on consecutive guard redirects.
	pub fn max_redirects(mut self, max_redirects: u32) -> Self {
		self.max_redirects = max_redirects;
		self
	}

	/// Composes the table, compiles every pattern and builds the router.
	pub fn build(self) -> Result<Router, NavigationError> {
		let composed = self.composer.compose(self.routes);

		let mut routes = Vec::with_capacity(composed.len());
		let mut named_routes = HashMap::new();
		for definition in composed {
			let pattern = PathPattern::parse(definition.path())?;
			if let Some(name) = definition.name()
				&& named_routes.insert(name.to_string(), routes.len()).is_some()
			{
				return Err(NavigationError::DuplicateRouteName(name.to_string()));
			}
			routes.push(RouteRecord {
				definition,
				pattern,
				module: OnceCell::new(),
			});
		}

		let history = match self.history {
			Some(history) => history,
			None => default_history(&self.base),
		};

		Ok(Router {
			routes,
			named_routes,
			history,
			max_redirects: self.max_redirects.max(1),
			guards: RefCell::new(Vec::new()),
			error_handlers: RefCell::new(Vec::new()),
			after_hooks: RefCell::new(Vec::new()),
			current: RefCell::new(RouteLocation::start()),
			current_module: RefCell::new(None),
			navigation_id: Cell::new(0),
			ready: ReadySignal::new(),
		})
	}
}

#[cfg(target_arch = "wasm32")]
fn default_history(base: &str) -> Box<dyn History> {
	Box::new(super::history::BrowserHistory::new(base))
}

#[cfg(not(target_arch = "wasm32"))]
fn default_history(base: &str) -> Box<dyn History> {
	Box::new(super::history::MemoryHistory::new(base))
}

/// The main router.
///
/// Single-threaded: hooks and guards are plain closures and the router is
/// shared through `Rc`.
pub struct Router {
	routes: Vec<RouteRecord>,
	named_routes: HashMap<String, usize>,
	history: Box<dyn History>,
	max_redirects: u32,
	guards: RefCell<Vec<Rc<dyn NavigationGuard>>>,
	error_handlers: RefCell<Vec<ErrorHandler>>,
	after_hooks: RefCell<Vec<AfterHook>>,
	current: RefCell<RouteLocation>,
	current_module: RefCell<Option<ModuleHandle>>,
	/// Id of the most recently started navigation.
	navigation_id: Cell<u64>,
	ready: ReadySignal,
}

impl std::fmt::Debug for Router {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Router")
			.field("base", &self.history.base())
			.field("routes_count", &self.routes.len())
			.field(
				"named_routes",
				&self.named_routes.keys().collect::<Vec<_>>(),
			)
			.field("current", &self.current.borrow().full_path)
			.finish()
	}
}

impl Router {
	/// Starts building a router.
	pub fn builder() -> RouterBuilder {
		RouterBuilder::new()
	}

	/// Builder preloaded with base path and redirect bound from settings.
	pub fn from_settings(settings: &NavigationSettings) -> RouterBuilder {
		RouterBuilder::new()
			.base(&settings.base_path)
			.max_redirects(settings.max_redirects)
	}

	/// Normalized base path (`""` for the root).
	pub fn base(&self) -> &str {
		self.history.base()
	}

	/// Returns the number of registered routes.
	pub fn route_count(&self) -> usize {
		self.routes.len()
	}

	/// Checks if a route name exists.
	pub fn has_route(&self, name: &str) -> bool {
		self.named_routes.contains_key(name)
	}

	/// Layout-composed definitions, in table order.
	pub fn routes(&self) -> impl Iterator<Item = &RouteDefinition> {
		self.routes.iter().map(|r| &r.definition)
	}

	/// The active location; [`RouteLocation::start`] before the first navigation.
	pub fn current_route(&self) -> RouteLocation {
		self.current.borrow().clone()
	}

	/// Module of the active route.
	pub fn current_module(&self) -> Option<ModuleHandle> {
		self.current_module.borrow().clone()
	}

	/// Registers a guard run before every navigation.
	pub fn before_each(&self, guard: impl NavigationGuard + 'static) {
		self.guards.borrow_mut().push(Rc::new(guard));
	}

	/// Registers a handler for navigation errors.
	pub fn on_error<F>(&self, handler: F)
	where
		F: Fn(&NavigationError, &NavigationRequest) + 'static,
	{
		self.error_handlers.borrow_mut().push(Rc::new(handler));
	}

	/// Registers a hook run after every completed navigation with `(to, from)`.
	pub fn after_each<F>(&self, hook: F)
	where
		F: Fn(&RouteLocation, &RouteLocation) + 'static,
	{
		self.after_hooks.borrow_mut().push(Rc::new(hook));
	}

	/// Runs `hook` once the first navigation settles.
	pub fn on_ready(&self, hook: impl FnOnce(&ReadyResult) + 'static) {
		self.ready.on_ready(hook);
	}

	/// Resolves once the first navigation settles.
	pub async fn is_ready(&self) -> ReadyResult {
		self.ready.wait().await
	}

	/// Whether the first navigation has settled.
	pub fn has_settled(&self) -> bool {
		self.ready.is_settled()
	}

	/// Absolute href (base included) for a location relative to the base.
	pub fn href(&self, location: &str) -> String {
		self.history.href(location)
	}

	/// Generates a path by route name with parameters.
	pub fn reverse(&self, name: &str, params: &[(&str, &str)]) -> Result<String, NavigationError> {
		let params: Params = params
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		self.reverse_params(name, &params)
	}

	fn reverse_params(&self, name: &str, params: &Params) -> Result<String, NavigationError> {
		let index = self
			.named_routes
			.get(name)
			.ok_or_else(|| NavigationError::InvalidRouteName(name.to_string()))?;
		let pattern = &self.routes[*index].pattern;
		pattern
			.reverse(params)
			.ok_or_else(|| NavigationError::MissingParameter {
				route: name.to_string(),
				param: pattern.missing_param(params).unwrap_or_default().to_string(),
			})
	}

	/// Matches a target without running guards or loading modules.
	pub fn resolve(&self, target: impl Into<NavigationTarget>) -> Result<RouteLocation, NavigationError> {
		let request = self.to_request(target.into())?;
		let (index, params) = self
			.match_request(&request)
			.ok_or_else(|| NavigationError::NotFound(request.path.clone()))?;
		Ok(self.location_for(index, &request, params))
	}

	/// Navigates, adding a history entry.
	pub async fn push(&self, target: impl Into<NavigationTarget>) -> Result<RouteLocation, NavigationFailure> {
		self.navigate(target.into(), HistoryMode::Push).await
	}

	/// Navigates, replacing the current history entry.
	pub async fn replace(&self, target: impl Into<NavigationTarget>) -> Result<RouteLocation, NavigationFailure> {
		self.navigate(target.into(), HistoryMode::Replace).await
	}

	/// Performs the initial navigation to the history's current location.
	pub async fn start(&self) -> Result<RouteLocation, NavigationFailure> {
		match self.history.location() {
			Ok(location) => self.navigate(location.into(), HistoryMode::Replace).await,
			Err(err) => {
				let result = Err(self.fail(err, Some(&self.current_route().to_request())));
				self.settle_ready(&result);
				result
			}
		}
	}

	/// Moves through history by `delta` entries.
	///
	/// Returns `Ok(None)` when the backend traverses asynchronously; the
	/// application then calls [`Router::handle_popstate`] from its
	/// `popstate` listener.
	pub async fn go(&self, delta: i32) -> Result<Option<RouteLocation>, NavigationFailure> {
		if let Err(err) = self.history.go(delta) {
			return Err(self.fail(err, Some(&self.current_route().to_request())));
		}
		if !self.history.traverses_synchronously() {
			return Ok(None);
		}
		self.handle_popstate().await.map(Some)
	}

	/// Goes one entry back.
	pub async fn back(&self) -> Result<Option<RouteLocation>, NavigationFailure> {
		self.go(-1).await
	}

	/// Goes one entry forward.
	pub async fn forward(&self) -> Result<Option<RouteLocation>, NavigationFailure> {
		self.go(1).await
	}

	/// Navigates to the location the history moved to, without writing a
	/// new entry.
	pub async fn handle_popstate(&self) -> Result<RouteLocation, NavigationFailure> {
		match self.history.location() {
			Ok(location) => self.navigate(location.into(), HistoryMode::Pop).await,
			Err(err) => Err(self.fail(err, Some(&self.current_route().to_request()))),
		}
	}

	async fn navigate(&self, target: NavigationTarget, mode: HistoryMode) -> Result<RouteLocation, NavigationFailure> {
		let id = self.navigation_id.get() + 1;
		self.navigation_id.set(id);

		let result = self.run_navigation(id, target, mode).await;
		self.settle_ready(&result);
		result
	}

	/// The first navigation to settle, other than a cancelled one, settles
	/// readiness.
	fn settle_ready(&self, result: &Result<RouteLocation, NavigationFailure>) {
		if self.ready.is_settled() {
			return;
		}
		match result {
			Err(NavigationFailure::Cancelled(_)) => {}
			Ok(_) | Err(NavigationFailure::Aborted(_)) | Err(NavigationFailure::Duplicated(_)) => {
				self.ready.settle(Ok(()));
			}
			Err(NavigationFailure::Error(err)) => {
				self.ready.settle(Err(err.clone()));
			}
		}
	}

	async fn run_navigation(
		&self,
		id: u64,
		target: NavigationTarget,
		mode: HistoryMode,
	) -> Result<RouteLocation, NavigationFailure> {
		let from = self.current_route();
		// A named target that cannot be built has no location to report.
		let mut request = match self.to_request(target) {
			Ok(request) => request,
			Err(err) => return Err(self.fail(err, None)),
		};

		let mut redirects = 0_u32;
		loop {
			match self.run_guards(&request, &from) {
				Ok(GuardDecision::Proceed) => break,
				Ok(GuardDecision::Abort) => {
					debug_log!("Navigation to {} aborted by guard", request);
					return Err(NavigationFailure::Aborted(request.full_path()));
				}
				Ok(GuardDecision::Redirect(next)) => {
					redirects += 1;
					if redirects > self.max_redirects {
						let err = NavigationError::RedirectLoop {
							path: next.full_path(),
							limit: self.max_redirects,
						};
						return Err(self.fail(err, Some(&next)));
					}
					debug_log!("Guard redirected {} to {}", request, next);
					request = next;
				}
				Err(err) => return Err(self.fail(err, Some(&request))),
			}
		}
		// A redirected traversal still has to fix up the entry it landed on.
		let mode = if mode == HistoryMode::Pop && redirects > 0 {
			HistoryMode::Replace
		} else {
			mode
		};

		let full_path = request.full_path();
		if !from.is_start() && from.full_path == full_path {
			return Err(NavigationFailure::Duplicated(full_path));
		}

		let Some((index, params)) = self.match_request(&request) else {
			let err = NavigationError::NotFound(request.path.clone());
			return Err(self.fail(err, Some(&request)));
		};

		// Load failures are reported even when the navigation was superseded,
		// so stale chunks still reach recovery.
		let module = match self.routes[index].load().await {
			Ok(module) => module,
			Err(err) => return Err(self.fail(NavigationError::ModuleLoad(err), Some(&request))),
		};
		if self.navigation_id.get() != id {
			debug_log!("Navigation to {} superseded", full_path);
			return Err(NavigationFailure::Cancelled(full_path));
		}

		let written = match mode {
			HistoryMode::Push => self.history.push(&full_path),
			HistoryMode::Replace => self.history.replace(&full_path),
			HistoryMode::Pop => Ok(()),
		};
		if let Err(err) = written {
			return Err(self.fail(err, Some(&request)));
		}

		let to = self.location_for(index, &request, params);
		*self.current.borrow_mut() = to.clone();
		*self.current_module.borrow_mut() = Some(module);

		let hooks = self.after_hooks.borrow().clone();
		for hook in hooks {
			hook(&to, &from);
		}
		debug_log!("Navigated from {} to {}", from.full_path, to.full_path);

		Ok(to)
	}

	fn run_guards(&self, to: &NavigationRequest, from: &RouteLocation) -> Result<GuardDecision, NavigationError> {
		// Guards may register further guards; iterate over a snapshot.
		let guards = self.guards.borrow().clone();
		for guard in guards {
			match guard.check(to, from)? {
				GuardDecision::Proceed => continue,
				decision => return Ok(decision),
			}
		}
		Ok(GuardDecision::Proceed)
	}

	/// Dispatches `err` to the error handlers and wraps it as a failure.
	fn fail(&self, err: NavigationError, to: Option<&NavigationRequest>) -> NavigationFailure {
		let handlers = self.error_handlers.borrow().clone();
		match to {
			Some(to) if !handlers.is_empty() => {
				for handler in handlers {
					handler(&err, to);
				}
			}
			Some(to) => error_log!("Unhandled error during navigation to {}: {}", to, err),
			None => error_log!("Unhandled navigation error: {}", err),
		}
		NavigationFailure::Error(err)
	}

	fn to_request(&self, target: NavigationTarget) -> Result<NavigationRequest, NavigationError> {
		match target {
			NavigationTarget::Request(request) => Ok(request),
			NavigationTarget::Named {
				name,
				params,
				query,
				hash,
			} => {
				let path = self.reverse_params(&name, &params)?;
				Ok(NavigationRequest {
					path,
					hash,
					params,
					query,
				})
			}
		}
	}

	fn match_request(&self, request: &NavigationRequest) -> Option<(usize, Params)> {
		self.routes
			.iter()
			.enumerate()
			.find_map(|(index, route)| route.pattern.matches(&request.path).map(|params| (index, params)))
	}

	fn location_for(&self, index: usize, request: &NavigationRequest, extracted: Params) -> RouteLocation {
		let route = &self.routes[index];
		let mut params = request.params.clone();
		params.extend(extracted);
		RouteLocation {
			path: request.path.clone(),
			hash: request.hash.clone(),
			query: request.query.clone(),
			params,
			full_path: request.full_path(),
			name: route.definition.name().map(str::to_string),
			layout: route.definition.layout().map(str::to_string),
			meta: route.definition.meta().clone(),
			matched: Some(route.pattern.as_str().to_string()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::router::error::ModuleLoadErrorKind;
	use crate::router::guard::TrailingSlashGuard;
	use crate::router::history::MemoryHistory;
	use crate::router::layout::MetaLayouts;
	use rstest::{fixture, rstest};

	fn page(name: &'static str) -> ComponentRef {
		ComponentRef::eager(name)
	}

	#[fixture]
	fn table() -> RouteTable {
		RouteTable::default()
			.route(RouteDefinition::named("home", "/", page("Home")))
			.route(RouteDefinition::named("devices", "/devices/", page("Devices")))
			.route(RouteDefinition::named("device", "/devices/{id}/", page("Device")))
	}

	fn router(table: RouteTable) -> Router {
		Router::builder()
			.routes(table)
			.history(MemoryHistory::new("/"))
			.build()
			.unwrap()
	}

	#[rstest]
	fn test_router_new(table: RouteTable) {
		let router = router(table);
		assert_eq!(router.route_count(), 3);
		assert!(router.has_route("device"));
		assert!(!router.has_route("nonexistent"));
		assert!(router.current_route().is_start());
	}

	#[rstest]
	fn test_duplicate_route_name_is_rejected() {
		let result = Router::builder()
			.routes(
				RouteTable::default()
					.route(RouteDefinition::named("a", "/a/", page("A")))
					.route(RouteDefinition::named("a", "/b/", page("B"))),
			)
			.build();
		assert!(matches!(result, Err(NavigationError::DuplicateRouteName(name)) if name == "a"));
	}

	#[rstest]
	fn test_invalid_pattern_is_rejected() {
		let result = Router::builder()
			.routes(RouteTable::default().route(RouteDefinition::new("devices", page("D"))))
			.build();
		assert!(matches!(result, Err(NavigationError::InvalidPattern { .. })));
	}

	#[rstest]
	fn test_resolve_is_non_strict(table: RouteTable) {
		let router = router(table);
		let location = router.resolve("/devices/42?tab=sonar").unwrap();
		assert_eq!(location.name.as_deref(), Some("device"));
		assert_eq!(location.params.get("id").map(String::as_str), Some("42"));
		assert_eq!(location.path, "/devices/42");
		assert_eq!(location.full_path, "/devices/42?tab=sonar");
	}

	#[rstest]
	fn test_resolve_not_found(table: RouteTable) {
		let router = router(table);
		assert_eq!(
			router.resolve("/nope/"),
			Err(NavigationError::NotFound("/nope/".to_string()))
		);
	}

	#[rstest]
	fn test_router_reverse(table: RouteTable) {
		let router = router(table);
		assert_eq!(router.reverse("home", &[]).unwrap(), "/");
		assert_eq!(router.reverse("device", &[("id", "42")]).unwrap(), "/devices/42/");
		assert!(matches!(
			router.reverse("nonexistent", &[]),
			Err(NavigationError::InvalidRouteName(_))
		));
		assert_eq!(
			router.reverse("device", &[]),
			Err(NavigationError::MissingParameter {
				route: "device".to_string(),
				param: "id".to_string()
			})
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_push_commits_history_and_current(table: RouteTable) {
		let history = Rc::new(MemoryHistory::new("/viewer"));
		let router = Router::builder()
			.routes(table)
			.history(SharedHistory(Rc::clone(&history)))
			.build()
			.unwrap();

		let location = router.push("/devices/7/#top").await.unwrap();
		assert_eq!(location.full_path, "/devices/7/#top");
		assert_eq!(router.current_route(), location);
		assert_eq!(
			router.current_module().and_then(|m| m.downcast_ref::<&str>().copied()),
			Some("Device")
		);
		assert_eq!(history.entries(), vec!["/viewer/", "/viewer/devices/7/#top"]);
	}

	#[rstest]
	#[tokio::test]
	async fn test_named_push(table: RouteTable) {
		let router = router(table);
		let location = router
			.push(NavigationTarget::named("device", [("id", "9")]))
			.await
			.unwrap();
		assert_eq!(location.path, "/devices/9/");
		assert_eq!(location.name.as_deref(), Some("device"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_guard_redirect_is_followed(table: RouteTable) {
		let router = router(table);
		router.before_each(TrailingSlashGuard);

		let location = router.push("/devices?id=1#x").await.unwrap();
		assert_eq!(location.full_path, "/devices/?id=1#x");
	}

	#[rstest]
	#[tokio::test]
	async fn test_guard_abort(table: RouteTable) {
		let router = router(table);
		router.before_each(
			|_: &NavigationRequest, _: &RouteLocation| -> Result<GuardDecision, NavigationError> {
				Ok(GuardDecision::Abort)
			},
		);

		let failure = router.push("/devices/").await.unwrap_err();
		assert_eq!(failure, NavigationFailure::Aborted("/devices/".to_string()));
		assert!(router.current_route().is_start());
	}

	#[rstest]
	#[tokio::test]
	async fn test_guard_error_is_dispatched(table: RouteTable) {
		let router = router(table);
		let seen = Rc::new(RefCell::new(Vec::new()));
		let sink = Rc::clone(&seen);
		router.on_error(move |err, to| sink.borrow_mut().push((err.clone(), to.path.clone())));
		router.before_each(
			|_: &NavigationRequest, _: &RouteLocation| -> Result<GuardDecision, NavigationError> {
				Err(NavigationError::Guard("boom".to_string()))
			},
		);

		let failure = router.push("/devices/").await.unwrap_err();
		assert_eq!(failure.error(), Some(&NavigationError::Guard("boom".to_string())));
		assert_eq!(
			*seen.borrow(),
			vec![(NavigationError::Guard("boom".to_string()), "/devices/".to_string())]
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_redirect_loop_is_bounded(table: RouteTable) {
		let router = Router::builder()
			.routes(table)
			.history(MemoryHistory::new("/"))
			.max_redirects(3)
			.build()
			.unwrap();
		router.before_each(|to: &NavigationRequest, _: &RouteLocation| -> Result<GuardDecision, NavigationError> {
			Ok(GuardDecision::Redirect(NavigationRequest::new(format!("{}x/", to.path))))
		});

		let failure = router.push("/").await.unwrap_err();
		assert!(matches!(
			failure.error(),
			Some(NavigationError::RedirectLoop { limit: 3, .. })
		));
	}

	#[rstest]
	#[tokio::test]
	async fn test_duplicated_navigation(table: RouteTable) {
		let router = router(table);
		router.push("/devices/").await.unwrap();
		assert_eq!(
			router.push("/devices/").await,
			Err(NavigationFailure::Duplicated("/devices/".to_string()))
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_after_each_receives_to_and_from(table: RouteTable) {
		let router = router(table);
		let seen = Rc::new(RefCell::new(Vec::new()));
		let sink = Rc::clone(&seen);
		router.after_each(move |to, from| {
			sink.borrow_mut()
				.push((to.full_path.clone(), from.full_path.clone()))
		});

		router.push("/devices/").await.unwrap();
		router.push("/devices/1/").await.unwrap();
		assert_eq!(
			*seen.borrow(),
			vec![
				("/devices/".to_string(), "/".to_string()),
				("/devices/1/".to_string(), "/devices/".to_string()),
			]
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_back_and_forward(table: RouteTable) {
		let router = router(table);
		router.start().await.unwrap();
		router.push("/devices/").await.unwrap();
		router.push("/devices/3/").await.unwrap();

		let back = router.back().await.unwrap().unwrap();
		assert_eq!(back.full_path, "/devices/");
		let forward = router.forward().await.unwrap().unwrap();
		assert_eq!(forward.full_path, "/devices/3/");
	}

	#[rstest]
	#[tokio::test]
	async fn test_layouts_are_composed(table: RouteTable) {
		let router = Router::builder()
			.routes(table)
			.layouts(MetaLayouts::default())
			.history(MemoryHistory::new("/"))
			.build()
			.unwrap();
		let location = router.push("/devices/").await.unwrap();
		assert_eq!(location.layout.as_deref(), Some("default"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_lazy_module_is_loaded_once() {
		let loads = Rc::new(Cell::new(0));
		let counter = Rc::clone(&loads);
		let table = RouteTable::default()
			.route(RouteDefinition::new("/", page("Home")))
			.route(RouteDefinition::new(
				"/lazy/",
				ComponentRef::lazy_fn(move || {
					counter.set(counter.get() + 1);
					async { Ok(ModuleHandle::new("Lazy")) }
				}),
			));
		let router = router(table);

		router.push("/lazy/").await.unwrap();
		router.push("/").await.unwrap();
		router.push("/lazy/").await.unwrap();
		assert_eq!(loads.get(), 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_failed_module_load_is_not_cached() {
		let attempts = Rc::new(Cell::new(0));
		let counter = Rc::clone(&attempts);
		let table = RouteTable::default().route(RouteDefinition::new(
			"/flaky/",
			ComponentRef::lazy_fn(move || {
				counter.set(counter.get() + 1);
				let attempt = counter.get();
				async move {
					if attempt == 1 {
						Err(ModuleLoadError::new(ModuleLoadErrorKind::Network, "offline"))
					} else {
						Ok(ModuleHandle::new("Flaky"))
					}
				}
			}),
		));
		let router = router(table);

		let failure = router.push("/flaky/").await.unwrap_err();
		assert!(matches!(failure.error(), Some(NavigationError::ModuleLoad(_))));
		assert!(router.push("/flaky/").await.is_ok());
		assert_eq!(attempts.get(), 2);
	}

	#[rstest]
	#[tokio::test]
	async fn test_superseded_navigation_is_cancelled() {
		let (release, gate) = futures::channel::oneshot::channel::<()>();
		let gate = RefCell::new(Some(gate));
		let table = RouteTable::default()
			.route(RouteDefinition::new("/", page("Home")))
			.route(RouteDefinition::new(
				"/slow/",
				ComponentRef::lazy_fn(move || {
					let gate = gate.borrow_mut().take();
					async move {
						if let Some(gate) = gate {
							let _ = gate.await;
						}
						Ok(ModuleHandle::new("Slow"))
					}
				}),
			));
		let router = router(table);

		let mut slow = Box::pin(router.push("/slow/"));
		assert!(futures::poll!(slow.as_mut()).is_pending());

		let fast = router.push("/").await.unwrap();
		assert_eq!(fast.full_path, "/");

		release.send(()).unwrap();
		assert_eq!(
			slow.await,
			Err(NavigationFailure::Cancelled("/slow/".to_string()))
		);
		assert_eq!(router.current_route().full_path, "/");
	}

	#[rstest]
	#[tokio::test]
	async fn test_superseded_stale_load_still_reaches_recovery() {
		use crate::recovery::{ErrorRecovery, MemoryRecoveryStore, RecordingReloader, RecoveryAction};

		let (release, gate) = futures::channel::oneshot::channel::<()>();
		let gate = RefCell::new(Some(gate));
		let table = RouteTable::default()
			.route(RouteDefinition::new("/", page("Home")))
			.route(RouteDefinition::new(
				"/devices/",
				ComponentRef::lazy_fn(move || {
					let gate = gate.borrow_mut().take();
					async move {
						if let Some(gate) = gate {
							let _ = gate.await;
						}
						Err(ModuleLoadError::stale_chunk("/assets/devices-9c1e.js"))
					}
				}),
			));
		let router = router(table);
		let store = MemoryRecoveryStore::new();
		let reloader = RecordingReloader::new();
		ErrorRecovery::new(store.clone(), reloader.clone()).install(&router);

		let mut slow = Box::pin(router.push("/devices/"));
		assert!(futures::poll!(slow.as_mut()).is_pending());
		router.push("/?x=1").await.unwrap();

		release.send(()).unwrap();
		let failure = slow.await.unwrap_err();

		assert!(matches!(failure.error(), Some(NavigationError::ModuleLoad(_))));
		assert!(store.is_set());
		assert_eq!(
			reloader.actions(),
			vec![RecoveryAction::hard_reload("/devices/")]
		);
		assert_eq!(router.current_route().full_path, "/?x=1");
	}

	#[rstest]
	#[tokio::test]
	async fn test_history_read_failure_is_dispatched(table: RouteTable) {
		let router = Router::builder()
			.routes(table)
			.history(UnreadableHistory)
			.build()
			.unwrap();
		let seen = Rc::new(RefCell::new(Vec::new()));
		let sink = Rc::clone(&seen);
		router.on_error(move |err, to| sink.borrow_mut().push((err.clone(), to.full_path())));

		let failure = router.start().await.unwrap_err();
		let expected = NavigationError::History("location unavailable".to_string());

		assert_eq!(failure.error(), Some(&expected));
		assert_eq!(*seen.borrow(), vec![(expected.clone(), "/".to_string())]);
		assert_eq!(router.is_ready().await, Err(expected));
	}

	#[rstest]
	#[tokio::test]
	async fn test_aborted_first_navigation_settles_ready(table: RouteTable) {
		let router = router(table);
		router.before_each(
			|_: &NavigationRequest, _: &RouteLocation| -> Result<GuardDecision, NavigationError> {
				Ok(GuardDecision::Abort)
			},
		);

		router.start().await.unwrap_err();
		assert_eq!(router.is_ready().await, Ok(()));
	}

	#[rstest]
	#[tokio::test]
	async fn test_ready_settles_with_first_navigation(table: RouteTable) {
		let router = router(table);
		assert!(!router.has_settled());
		router.push("/missing/").await.unwrap_err();
		assert_eq!(
			router.is_ready().await,
			Err(NavigationError::NotFound("/missing/".to_string()))
		);

		// Later navigations do not change the settled result.
		router.push("/").await.unwrap();
		assert!(router.is_ready().await.is_err());
	}

	/// Lets a test keep a handle on the history the router owns.
	struct SharedHistory(Rc<MemoryHistory>);

	impl History for SharedHistory {
		fn base(&self) -> &str {
			self.0.base()
		}
		fn location(&self) -> Result<String, NavigationError> {
			self.0.location()
		}
		fn push(&self, location: &str) -> Result<(), NavigationError> {
			self.0.push(location)
		}
		fn replace(&self, location: &str) -> Result<(), NavigationError> {
			self.0.replace(location)
		}
		fn go(&self, delta: i32) -> Result<(), NavigationError> {
			self.0.go(delta)
		}
	}

	struct UnreadableHistory;

	impl History for UnreadableHistory {
		fn base(&self) -> &str {
			""
		}
		fn location(&self) -> Result<String, NavigationError> {
			Err(NavigationError::History("location unavailable".to_string()))
		}
		fn push(&self, _location: &str) -> Result<(), NavigationError> {
			Ok(())
		}
		fn replace(&self, _location: &str) -> Result<(), NavigationError> {
			Ok(())
		}
		fn go(&self, _delta: i32) -> Result<(), NavigationError> {
			Ok(())
		}
	}
}
