//! Vantage Routing
//!
//! Turns the server-supplied permission menu into live router entries:
//! 1. Each routable menu leaf resolves to a lazily loaded view module
//! 2. Routes register under the `main` layout route, keeping a deregistration handle
//! 3. A guard runs before every transition and installs routes on demand
//!
//! Navigation flow:
//! ```text
//! no token ──▶ login
//! token + routes missing ──▶ reconcile ──▶ redispatch
//! token + unknown path ──▶ not-found
//! ```

mod error;
mod guard;
mod reconciler;
mod route;
mod router;
mod target;
mod view;

pub use error::{RouterError, ViewError};
pub use guard::{GuardDecision, NavigationContext, NavigationGuard};
pub use reconciler::{flatten_menu, ReconcileOutcome, ReconcileReport, RouteReconciler};
pub use route::{Location, RouteInfo, RouteNames, RouteRecord};
pub use router::{base_routes, MemoryRouter, Router};
pub use target::{normalize_path, NavigationTarget};
pub use view::{
    StaticViewRegistry, ViewComponent, ViewLayout, ViewLoader, ViewModule, ViewRegistry,
    ViewResolver, ViewSource,
};

pub type Result<T> = std::result::Result<T, RouterError>;
