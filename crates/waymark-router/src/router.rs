//! Client-side router.
//!
//! The router maps locations to route definitions, runs guards before every
//! navigation, loads route modules on demand and writes the result to a
//! history backend.
//!
//! ## Example
//!
//! ```ignore
//! use waymark_router::router::{ComponentRef, RouteDefinition, RouteTable, Router, TrailingSlashGuard};
//!
//! let routes = RouteTable::default()
//!     .route(RouteDefinition::named("home", "/", ComponentRef::eager(HomePage)))
//!     .route(RouteDefinition::named("device", "/devices/{id}/", ComponentRef::eager(DevicePage)));
//!
//! let router = Router::builder().base("/viewer/").routes(routes).build()?;
//! router.before_each(TrailingSlashGuard);
//! router.start().await?;
//! ```

mod core;
mod error;
mod guard;
mod history;
mod layout;
mod location;
mod pattern;
mod ready;
mod route;

pub use self::core::{Router, RouterBuilder};
pub use error::{ModuleLoadError, ModuleLoadErrorKind, NavigationError, NavigationFailure};
pub use guard::{GuardDecision, NavigationGuard, TrailingSlashGuard, is_canonical_path};
#[cfg(target_arch = "wasm32")]
pub use history::BrowserHistory;
pub use history::{History, HistoryMode, MemoryHistory, strip_base};
pub use layout::{DEFAULT_LAYOUT, LAYOUT_META_KEY, LayoutComposer, MetaLayouts, NoLayouts};
pub use location::{NavigationRequest, NavigationTarget, Params, Query, RouteLocation, RouteMeta};
pub use pattern::PathPattern;
pub use ready::ReadyResult;
pub use route::{ComponentRef, FnLoader, ModuleHandle, ModuleLoader, RouteDefinition, RouteTable};
