//! Dashboard composition root
//!
//! Startup order matters: the session is restored and menu routes are
//! rebuilt before the first navigation, so a reload lands on the page it
//! left instead of bouncing through login.

use std::sync::Arc;

use vantage_router::{
    GuardDecision, Location, MemoryRouter, NavigationContext, NavigationGuard, NavigationTarget,
    RouteReconciler, Router, RouterError, ViewRegistry, ViewResolver,
};
use vantage_session::{MenuEntry, RestoreOutcome, SessionStore, Tag};
use vantage_storage::{DurableStorage, SqliteStorage};

use crate::api::MenuResponse;
use crate::config::Config;
use crate::Result;

// Guard decisions allowed per navigation before giving up.
const MAX_GUARD_HOPS: usize = 8;

pub struct Dashboard {
    config: Config,
    store: SessionStore,
    router: Arc<dyn Router>,
    reconciler: RouteReconciler,
    guard: NavigationGuard,
}

impl Dashboard {
    /// Build a dashboard with an in-memory router preloaded with the base routes
    pub fn new(
        config: Config,
        storage: Arc<dyn DurableStorage>,
        registry: Arc<dyn ViewRegistry>,
    ) -> Result<Self> {
        let views = ViewResolver::new(registry, config.views.clone());
        let router = Arc::new(MemoryRouter::standard(&config.routes, &views)?);
        Ok(Self::with_router(config, storage, views, router))
    }

    /// Build a dashboard with durable storage at `config.storage_path`
    pub fn open(config: Config, registry: Arc<dyn ViewRegistry>) -> Result<Self> {
        let storage = SqliteStorage::open(&config.storage_path)?;
        Self::new(config, Arc::new(storage), registry)
    }

    pub fn with_router(
        config: Config,
        storage: Arc<dyn DurableStorage>,
        views: ViewResolver,
        router: Arc<dyn Router>,
    ) -> Self {
        let reconciler = RouteReconciler::new(views, config.routes.main.clone());
        let guard = NavigationGuard::new(config.routes.clone());

        Self {
            config,
            store: SessionStore::new(storage),
            router,
            reconciler,
            guard,
        }
    }

    /// Restore the previous session and rebuild its menu routes
    pub fn initialize(&self) -> RestoreOutcome {
        let outcome = self.store.restore();

        let menu_list = self.store.menu_list();
        if let Err(e) = self
            .reconciler
            .reconcile(self.router.as_ref(), &self.store, &menu_list)
        {
            tracing::error!(error = %e, "Failed to rebuild menu routes on startup");
        }

        tracing::info!(
            environment = %self.config.environment,
            authenticated = self.store.is_authenticated(),
            routes = self.store.handle_count(),
            "Dashboard initialized"
        );

        outcome
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn router(&self) -> &dyn Router {
        self.router.as_ref()
    }

    pub fn guard(&self) -> &NavigationGuard {
        &self.guard
    }

    fn context(&self) -> NavigationContext<'_> {
        NavigationContext {
            store: &self.store,
            router: self.router.as_ref(),
            reconciler: &self.reconciler,
        }
    }

    // === Navigation ===

    pub fn navigate(&self, path: &str) -> Result<Location> {
        self.navigate_to(NavigationTarget::parse(path)?)
    }

    /// Run the guard, follow its redirects and complete the transition
    pub fn navigate_to(&self, target: NavigationTarget) -> Result<Location> {
        let ctx = self.context();
        let requested = target.full_path();
        let mut target = target;

        for _ in 0..MAX_GUARD_HOPS {
            match self.guard.before_each(&ctx, &target) {
                GuardDecision::Proceed => match self.router.navigate(&target) {
                    Ok(location) => return Ok(location),
                    Err(RouterError::NavigationDuplicated(path)) => {
                        tracing::debug!(path = %path, "Already at target");
                        return self
                            .router
                            .current()
                            .ok_or_else(|| RouterError::NavigationDuplicated(path).into());
                    }
                    Err(e) => match self.guard.on_error(&ctx, &e) {
                        Some(recovery) => target = recovery,
                        None => return Err(e.into()),
                    },
                },
                GuardDecision::Redirect(next) | GuardDecision::Redispatch(next) => target = next,
            }
        }

        Err(RouterError::TooManyRedirects(requested).into())
    }

    // === Session flow ===

    /// Install a successful permission-menu response and go home
    pub fn login(&self, response: MenuResponse) -> Result<Location> {
        self.store.set_token(response.token)?;
        self.store.update_menu_list(response.menu_list)?;

        let menu_list = self.store.menu_list();
        let outcome = self
            .reconciler
            .reconcile(self.router.as_ref(), &self.store, &menu_list)?;
        tracing::info!(routes = outcome.registered_count(), "Logged in");

        self.navigate_to(self.guard.home_target())
    }

    /// Drop the session and every menu route, then show login
    pub fn logout(&self) -> Result<Location> {
        self.store.reset()?;
        tracing::info!("Logged out");
        self.navigate_to(self.guard.login_target())
    }

    /// Open a menu entry: record its tag and navigate to its route
    pub fn open_menu(&self, entry: &MenuEntry) -> Result<Location> {
        self.store.select_menu(entry.to_tag())?;
        self.navigate(&entry.route_path())
    }

    /// Close an open tag. Returns whether it was open.
    pub fn close_tag(&self, tag: &Tag) -> Result<bool> {
        Ok(self.store.update_tags(tag)?)
    }

    pub fn toggle_collapse(&self) -> Result<bool> {
        Ok(self.store.toggle_collapse()?)
    }
}
