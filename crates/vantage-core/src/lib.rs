//! Vantage Core
//!
//! Composition root of the admin dashboard client. Owns the session store,
//! the router and the navigation guard, and wires them together at startup.

pub mod api;
mod config;
mod dashboard;
mod error;

pub use api::{ApiEnvelope, MenuResponse};
pub use config::{ApiEndpoints, Config, Environment};
pub use dashboard::Dashboard;
pub use error::CoreError;

// Re-export core components
pub use vantage_router::{
    GuardDecision, Location, MemoryRouter, NavigationGuard, NavigationTarget, ReconcileOutcome,
    RouteNames, RouteReconciler, Router, RouterError, StaticViewRegistry, ViewLayout, ViewModule,
    ViewRegistry,
};
pub use vantage_session::{MenuEntry, RestoreOutcome, SessionError, SessionState, SessionStore, Tag};
pub use vantage_storage::{DurableStorage, MemoryStorage, SqliteStorage, StorageError};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
