//! Menu-to-route reconciliation
//!
//! Each run fully supersedes the previous one: old handles are released
//! before new routes are added, so repeated runs never leak routes.

use vantage_session::{MenuEntry, SessionStore};

use crate::error::RouterError;
use crate::route::RouteRecord;
use crate::router::Router;
use crate::target::normalize_path;
use crate::view::ViewResolver;
use crate::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Names of routes now registered
    pub registered: Vec<String>,
    /// Entries skipped for a missing name or url
    pub skipped: usize,
    /// Names of entries whose registration failed
    pub failed: Vec<String>,
    /// Handles from the previous run released cleanly
    pub released: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The menu list was empty; routes were left untouched
    NoMenu,
    Applied(ReconcileReport),
}

impl ReconcileOutcome {
    pub fn registered_count(&self) -> usize {
        match self {
            ReconcileOutcome::NoMenu => 0,
            ReconcileOutcome::Applied(report) => report.registered.len(),
        }
    }
}

/// Entries that map to routes: the children of top-level groups, and
/// childless top-level entries themselves.
pub fn flatten_menu(menu: &[MenuEntry]) -> Vec<&MenuEntry> {
    menu.iter()
        .flat_map(|entry| match &entry.children {
            Some(children) => children.iter().collect::<Vec<_>>(),
            None => vec![entry],
        })
        .collect()
}

pub struct RouteReconciler {
    views: ViewResolver,
    /// Route every menu route registers under
    parent: String,
}

impl RouteReconciler {
    pub fn new(views: ViewResolver, parent: impl Into<String>) -> Self {
        Self {
            views,
            parent: parent.into(),
        }
    }

    pub fn views(&self) -> &ViewResolver {
        &self.views
    }

    /// Replace the dynamic routes with one route per routable entry of
    /// `menu_list`, storing the new handles in `store`.
    ///
    /// An empty menu list or a missing parent route leaves the router untouched.
    pub fn reconcile(
        &self,
        router: &dyn Router,
        store: &SessionStore,
        menu_list: &[MenuEntry],
    ) -> Result<ReconcileOutcome> {
        if menu_list.is_empty() {
            tracing::warn!("Menu list is empty, no routes added");
            return Ok(ReconcileOutcome::NoMenu);
        }
        if !router.has_route(&self.parent) {
            return Err(RouterError::ParentNotFound(self.parent.clone()));
        }

        let mut report = ReconcileReport {
            released: store.release_handles(),
            ..ReconcileReport::default()
        };

        let mut handles = Vec::new();
        for entry in flatten_menu(menu_list) {
            if !entry.is_routable() {
                tracing::debug!(name = %entry.name, url = %entry.url, "Skipping menu entry without name or url");
                report.skipped += 1;
                continue;
            }

            let raw_path = entry.route_path();
            let path = normalize_path(&raw_path).unwrap_or(raw_path);
            let component = self.views.resolve(entry);
            self.remove_same_path(router, &path);

            let record = RouteRecord::new(entry.name.clone(), path.clone(), component);
            match router.add_child_route(&self.parent, record) {
                Ok(handle) => {
                    handles.push(handle);
                    report.registered.push(entry.name.clone());
                }
                Err(e) => {
                    tracing::error!(route = %entry.name, path = %path, error = %e, "Failed to add route");
                    report.failed.push(entry.name.clone());
                }
            }
        }

        store.install_handles(handles);

        tracing::info!(
            registered = report.registered.len(),
            skipped = report.skipped,
            failed = report.failed.len(),
            released = report.released,
            "Reconciled menu routes"
        );

        Ok(ReconcileOutcome::Applied(report))
    }

    fn remove_same_path(&self, router: &dyn Router, path: &str) {
        let existing: Vec<String> = router
            .get_routes()
            .into_iter()
            .filter(|r| r.path == path && r.name != self.parent)
            .map(|r| r.name)
            .collect();

        for name in existing {
            if let Err(e) = router.remove_route(&name) {
                tracing::warn!(route = %name, path = %path, error = %e, "Failed to remove route at same path");
            }
        }
    }
}
