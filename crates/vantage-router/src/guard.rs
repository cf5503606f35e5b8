//! Navigation guard
//!
//! Evaluated before every transition:
//!
//! | token | target          | routes installed | decision                     |
//! |-------|-----------------|------------------|------------------------------|
//! | no    | login           | -                | proceed                      |
//! | no    | other           | -                | redirect to login            |
//! | yes   | login           | -                | redirect to home             |
//! | yes   | not-found       | -                | proceed                      |
//! | yes   | other           | no               | reconcile, then redispatch   |
//! | yes   | unresolvable    | yes              | redirect to not-found        |
//! | yes   | other           | yes              | proceed                      |

use vantage_session::SessionStore;

use crate::error::RouterError;
use crate::reconciler::RouteReconciler;
use crate::route::RouteNames;
use crate::router::Router;
use crate::target::NavigationTarget;

/// Collaborators the guard reads and drives, owned by the composition root
pub struct NavigationContext<'a> {
    pub store: &'a SessionStore,
    pub router: &'a dyn Router,
    pub reconciler: &'a RouteReconciler,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    Redirect(NavigationTarget),
    /// Routes were just installed; dispatch the same target again
    Redispatch(NavigationTarget),
}

pub struct NavigationGuard {
    routes: RouteNames,
}

impl NavigationGuard {
    pub fn new(routes: RouteNames) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &RouteNames {
        &self.routes
    }

    pub fn login_target(&self) -> NavigationTarget {
        NavigationTarget::named(self.routes.login.clone(), self.routes.login_path.clone())
    }

    pub fn home_target(&self) -> NavigationTarget {
        NavigationTarget::path(self.routes.home_path.clone())
    }

    pub fn not_found_target(&self) -> NavigationTarget {
        NavigationTarget::named(
            self.routes.not_found.clone(),
            self.routes.not_found_path.clone(),
        )
    }

    fn is_login(&self, target: &NavigationTarget) -> bool {
        target.name.as_deref() == Some(self.routes.login.as_str())
            || target.path == self.routes.login_path
    }

    fn is_not_found(&self, target: &NavigationTarget) -> bool {
        target.name.as_deref() == Some(self.routes.not_found.as_str())
            || target.path == self.routes.not_found_path
    }

    /// Dynamic routes count as installed while the store holds handles for them
    pub fn dynamic_routes_installed(&self, ctx: &NavigationContext<'_>) -> bool {
        ctx.store.handle_count() > 0
    }

    fn is_resolvable(&self, ctx: &NavigationContext<'_>, target: &NavigationTarget) -> bool {
        if let Some(name) = &target.name {
            if ctx.router.has_route(name) {
                return true;
            }
        }
        ctx.router
            .get_routes()
            .iter()
            .any(|route| route.path == target.path)
    }

    pub fn before_each(
        &self,
        ctx: &NavigationContext<'_>,
        target: &NavigationTarget,
    ) -> GuardDecision {
        if !ctx.store.is_authenticated() {
            if let Err(e) = ctx.store.clear_durable() {
                tracing::error!(error = %e, "Failed to clear stored credentials");
            }

            return if self.is_login(target) {
                GuardDecision::Proceed
            } else {
                tracing::debug!(path = %target.path, "Not logged in, redirecting to login");
                GuardDecision::Redirect(self.login_target())
            };
        }

        if self.is_login(target) {
            return GuardDecision::Redirect(self.home_target());
        }

        if self.is_not_found(target) {
            return GuardDecision::Proceed;
        }

        match ctx.store.recover_menu_list() {
            Ok(true) => tracing::info!("Recovered menu list from durable storage"),
            Ok(false) => {}
            Err(e) => tracing::warn!(error = %e, "Failed to recover menu list"),
        }

        // A redispatched target never reconciles twice.
        if !self.dynamic_routes_installed(ctx) && !target.redispatched {
            let menu_list = ctx.store.menu_list();
            return match ctx.reconciler.reconcile(ctx.router, ctx.store, &menu_list) {
                Ok(_) => GuardDecision::Redispatch(target.redispatch()),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install menu routes");
                    GuardDecision::Redirect(self.not_found_target())
                }
            };
        }

        if !self.is_resolvable(ctx, target) {
            tracing::warn!(path = %target.path, "Route does not exist");
            return GuardDecision::Redirect(self.not_found_target());
        }

        GuardDecision::Proceed
    }

    /// Recovery for a failed navigation. A view module that cannot be
    /// resolved ends the session and sends the user to login; other errors
    /// have no recovery.
    pub fn on_error(
        &self,
        ctx: &NavigationContext<'_>,
        error: &RouterError,
    ) -> Option<NavigationTarget> {
        match error {
            RouterError::ComponentResolution { path, source } => {
                tracing::error!(path = %path, error = %source, "Route component failed to resolve, logging out");

                if let Err(e) = ctx.store.set_token("") {
                    tracing::error!(error = %e, "Failed to clear token");
                }
                if let Err(e) = ctx.store.update_menu_list(Vec::new()) {
                    tracing::error!(error = %e, "Failed to clear menu list");
                }
                if let Err(e) = ctx.store.clear_durable() {
                    tracing::error!(error = %e, "Failed to clear stored credentials");
                }

                Some(self.login_target())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciler::ReconcileOutcome;
    use crate::router::MemoryRouter;
    use crate::view::{StaticViewRegistry, ViewLayout, ViewResolver};
    use std::sync::Arc;
    use vantage_session::{MenuEntry, MENU_LIST_KEY, STORE_KEY, TOKEN_KEY};
    use vantage_storage::{DurableStorage, JsonStorage, MemoryStorage};

    struct Fixture {
        storage: MemoryStorage,
        router: MemoryRouter,
        store: SessionStore,
        reconciler: RouteReconciler,
        guard: NavigationGuard,
    }

    impl Fixture {
        fn ctx(&self) -> NavigationContext<'_> {
            NavigationContext {
                store: &self.store,
                router: &self.router,
                reconciler: &self.reconciler,
            }
        }

        fn check(&self, path: &str) -> GuardDecision {
            self.guard
                .before_each(&self.ctx(), &NavigationTarget::parse(path).unwrap())
        }
    }

    fn fixture() -> Fixture {
        let registry =
            StaticViewRegistry::with_views(["views/login.vue", "views/404.vue", "views/mall.vue"]);
        let views = ViewResolver::new(Arc::new(registry), ViewLayout::default());
        let names = RouteNames::default();
        let storage = MemoryStorage::new();

        Fixture {
            router: MemoryRouter::standard(&names, &views).unwrap(),
            store: SessionStore::new(Arc::new(storage.clone())),
            reconciler: RouteReconciler::new(views, names.main.clone()),
            guard: NavigationGuard::new(names),
            storage,
        }
    }

    fn redirect_path(decision: GuardDecision) -> String {
        match decision {
            GuardDecision::Redirect(target) => target.path,
            other => panic!("Expected Redirect, got {:?}", other),
        }
    }

    #[test]
    fn test_no_token_redirects_to_login_and_clears_storage() {
        let f = fixture();
        f.storage.set(STORE_KEY, "{}").unwrap();
        f.storage.set(TOKEN_KEY, "stale").unwrap();
        f.storage.set(MENU_LIST_KEY, "[]").unwrap();

        assert_eq!(redirect_path(f.check("/home")), "/login");
        assert!(f.storage.is_empty());
    }

    #[test]
    fn test_no_token_login_proceeds() {
        let f = fixture();
        assert_eq!(f.check("/login"), GuardDecision::Proceed);
    }

    #[test]
    fn test_token_login_redirects_home() {
        let f = fixture();
        f.store.set_token("fake-token-admin").unwrap();
        assert_eq!(redirect_path(f.check("/login")), "/home");
    }

    #[test]
    fn test_token_not_found_proceeds() {
        let f = fixture();
        f.store.set_token("fake-token-admin").unwrap();
        assert_eq!(f.check("/404"), GuardDecision::Proceed);
        assert_eq!(f.store.handle_count(), 0);
    }

    #[test]
    fn test_missing_routes_trigger_reconcile_and_redispatch() {
        let f = fixture();
        f.store.set_token("fake-token-admin").unwrap();
        f.store
            .update_menu_list(vec![MenuEntry::leaf("mall", "product/list")])
            .unwrap();

        let target = match f.check("/mall") {
            GuardDecision::Redispatch(target) => target,
            other => panic!("Expected Redispatch, got {:?}", other),
        };
        assert!(target.replace);
        assert!(target.redispatched);
        assert!(f.router.has_route("mall"));

        assert_eq!(f.guard.before_each(&f.ctx(), &target), GuardDecision::Proceed);
    }

    #[test]
    fn test_menu_recovered_from_separate_key() {
        let f = fixture();
        f.store.set_token("fake-token-admin").unwrap();
        f.storage
            .set_json(MENU_LIST_KEY, &vec![MenuEntry::leaf("mall", "product/list")])
            .unwrap();

        assert!(matches!(f.check("/mall"), GuardDecision::Redispatch(_)));
        assert_eq!(f.store.menu_list().len(), 1);
    }

    #[test]
    fn test_redispatch_without_menu_goes_to_not_found() {
        let f = fixture();
        f.store.set_token("fake-token-admin").unwrap();

        let GuardDecision::Redispatch(target) = f.check("/home") else {
            panic!("Expected Redispatch");
        };
        assert_eq!(
            redirect_path(f.guard.before_each(&f.ctx(), &target)),
            "/404"
        );
    }

    #[test]
    fn test_unknown_path_with_routes_installed() {
        let f = fixture();
        f.store.set_token("fake-token-admin").unwrap();
        let menu = vec![MenuEntry::leaf("mall", "product/list")];
        let outcome = f.reconciler.reconcile(&f.router, &f.store, &menu).unwrap();
        assert_eq!(outcome.registered_count(), 1);

        assert_eq!(redirect_path(f.check("/reports")), "/404");
        assert_eq!(f.check("/mall"), GuardDecision::Proceed);
    }

    #[test]
    fn test_non_ascii_and_trailing_slash_paths_resolve() {
        let f = fixture();
        f.store.set_token("fake-token-admin").unwrap();
        let menu = vec![
            MenuEntry::leaf("user", "mall").with_path("/用户"),
            MenuEntry::leaf("mall", "product/list"),
        ];
        f.reconciler.reconcile(&f.router, &f.store, &menu).unwrap();

        assert_eq!(f.check(&menu[0].route_path()), GuardDecision::Proceed);
        assert_eq!(f.check("/mall/"), GuardDecision::Proceed);
        assert_eq!(redirect_path(f.check("/login/")), "/home");
    }

    #[test]
    fn test_reconcile_failure_redirects_to_not_found() {
        let f = fixture();
        f.store.set_token("fake-token-admin").unwrap();
        f.store
            .update_menu_list(vec![MenuEntry::leaf("mall", "product/list")])
            .unwrap();
        f.router.remove_route("main").unwrap();

        assert_eq!(redirect_path(f.check("/mall")), "/404");
        assert!(!matches!(
            f.reconciler.reconcile(&f.router, &f.store, &f.store.menu_list()),
            Ok(ReconcileOutcome::Applied(_))
        ));
    }

    #[test]
    fn test_component_error_logs_out() {
        let f = fixture();
        f.store.set_token("fake-token-admin").unwrap();
        f.store
            .update_menu_list(vec![MenuEntry::leaf("mall", "product/list")])
            .unwrap();

        let error = RouterError::ComponentResolution {
            path: "/mall".to_string(),
            source: crate::error::ViewError::NotFound("views/mall.vue".to_string()),
        };
        let target = f.guard.on_error(&f.ctx(), &error).unwrap();

        assert_eq!(target.path, "/login");
        assert!(!f.store.is_authenticated());
        assert!(f.store.menu_list().is_empty());
        assert!(!f.storage.contains(TOKEN_KEY));
        assert!(!f.storage.contains(MENU_LIST_KEY));

        let duplicate = RouterError::NavigationDuplicated("/login".to_string());
        assert!(f.guard.on_error(&f.ctx(), &duplicate).is_none());
    }
}
