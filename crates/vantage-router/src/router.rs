//! Router contract and in-memory router

use parking_lot::RwLock;
use std::sync::{Arc, Weak};
use uuid::Uuid;

use vantage_session::DeregistrationHandle;

use crate::error::RouterError;
use crate::route::{Location, RouteInfo, RouteNames, RouteRecord};
use crate::target::{normalize_path, NavigationTarget};
use crate::view::ViewResolver;
use crate::Result;

const MAX_REDIRECTS: usize = 8;

pub trait Router: Send + Sync {
    /// Register a top-level route
    fn add_route(&self, route: RouteRecord) -> Result<DeregistrationHandle>;

    /// Register `route` under the route named `parent`. A route with the
    /// same name is replaced.
    fn add_child_route(&self, parent: &str, route: RouteRecord) -> Result<DeregistrationHandle>;

    /// Remove the named route and its children
    fn remove_route(&self, name: &str) -> Result<()>;

    fn get_routes(&self) -> Vec<RouteInfo>;

    fn has_route(&self, name: &str) -> bool;

    /// Match `target`, follow redirects, load the view and record history
    fn navigate(&self, target: &NavigationTarget) -> Result<Location>;

    fn current(&self) -> Option<Location>;
}

/// Routes that exist before any menu is installed: the `main` layout
/// (redirecting to home), login and not-found.
pub fn base_routes(names: &RouteNames, views: &ViewResolver) -> Vec<RouteRecord> {
    let main = RouteRecord {
        name: names.main.clone(),
        path: names.main_path.clone(),
        component: None,
        redirect: Some(names.home_path.clone()),
    };

    vec![
        main,
        RouteRecord::new(
            names.login.clone(),
            names.login_path.clone(),
            views.named(&views.layout().login_view),
        ),
        RouteRecord::new(
            names.not_found.clone(),
            names.not_found_path.clone(),
            views.named(&views.layout().not_found_view),
        ),
    ]
}

#[derive(Debug, Clone)]
struct RegisteredRoute {
    id: Uuid,
    parent: Option<String>,
    record: RouteRecord,
}

impl RegisteredRoute {
    fn info(&self) -> RouteInfo {
        RouteInfo {
            id: self.id,
            name: self.record.name.clone(),
            path: self.record.path.clone(),
            parent: self.parent.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct RouteTable {
    routes: Vec<RegisteredRoute>,
}

impl RouteTable {
    fn remove_named(&mut self, name: &str) -> bool {
        let before = self.routes.len();
        self.routes
            .retain(|r| r.record.name != name && r.parent.as_deref() != Some(name));
        self.routes.len() != before
    }
}

/// Router keeping its route table and history in memory
pub struct MemoryRouter {
    table: Arc<RwLock<RouteTable>>,
    history: Arc<RwLock<Vec<Location>>>,
    /// Path unmatched targets redirect to
    fallback: Option<String>,
}

impl MemoryRouter {
    pub fn new() -> Self {
        Self {
            table: Arc::new(RwLock::new(RouteTable::default())),
            history: Arc::new(RwLock::new(Vec::new())),
            fallback: None,
        }
    }

    /// Router preloaded with [`base_routes`], sending unmatched paths to not-found
    pub fn standard(names: &RouteNames, views: &ViewResolver) -> Result<Self> {
        let router = Self::new().with_fallback(names.not_found_path.clone());
        for route in base_routes(names, views) {
            router.add_route(route)?;
        }
        Ok(router)
    }

    pub fn with_fallback(mut self, path: impl Into<String>) -> Self {
        self.fallback = Some(path.into());
        self
    }

    pub fn history_len(&self) -> usize {
        self.history.read().len()
    }

    fn insert(&self, parent: Option<&str>, route: RouteRecord) -> Result<DeregistrationHandle> {
        if route.name.trim().is_empty() {
            return Err(RouterError::EmptyName);
        }
        if !route.path.starts_with('/') {
            return Err(RouterError::InvalidPath(route.path));
        }
        let path = normalize_path(&route.path)
            .map_err(|_| RouterError::InvalidPath(route.path.clone()))?;
        let route = RouteRecord { path, ..route };

        let id = Uuid::new_v4();
        let name = route.name.clone();
        {
            let mut table = self.table.write();
            if let Some(parent) = parent {
                if !table.routes.iter().any(|r| r.record.name == parent) {
                    return Err(RouterError::ParentNotFound(parent.to_string()));
                }
            }

            if table.remove_named(&name) {
                tracing::debug!(route = %name, "Replacing existing route");
            }

            table.routes.push(RegisteredRoute {
                id,
                parent: parent.map(str::to_string),
                record: route,
            });
        }

        tracing::debug!(route = %name, route_id = %id, parent = ?parent, "Added route");

        let table: Weak<RwLock<RouteTable>> = Arc::downgrade(&self.table);
        let handle_name = name.clone();
        Ok(DeregistrationHandle::new(name, move || {
            let table = table
                .upgrade()
                .ok_or_else(|| format!("router dropped before removing {}", handle_name))?;
            let mut table = table.write();
            let before = table.routes.len();
            table.routes.retain(|r| r.id != id);
            if table.routes.len() == before {
                tracing::debug!(route = %handle_name, "Route already removed");
            }
            Ok(())
        }))
    }

    fn match_route(&self, name: Option<&str>, path: &str) -> Option<RegisteredRoute> {
        let path = normalize_path(path).unwrap_or_else(|_| path.to_string());
        let table = self.table.read();
        let found = match name {
            Some(name) => table.routes.iter().find(|r| r.record.name == name),
            None => table.routes.iter().find(|r| r.record.path == path),
        };
        found.cloned()
    }
}

impl Default for MemoryRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl Router for MemoryRouter {
    fn add_route(&self, route: RouteRecord) -> Result<DeregistrationHandle> {
        self.insert(None, route)
    }

    fn add_child_route(&self, parent: &str, route: RouteRecord) -> Result<DeregistrationHandle> {
        self.insert(Some(parent), route)
    }

    fn remove_route(&self, name: &str) -> Result<()> {
        if self.table.write().remove_named(name) {
            tracing::debug!(route = %name, "Removed route");
            Ok(())
        } else {
            Err(RouterError::RouteNotFound(name.to_string()))
        }
    }

    fn get_routes(&self) -> Vec<RouteInfo> {
        self.table
            .read()
            .routes
            .iter()
            .map(RegisteredRoute::info)
            .collect()
    }

    fn has_route(&self, name: &str) -> bool {
        self.table
            .read()
            .routes
            .iter()
            .any(|r| r.record.name == name)
    }

    fn navigate(&self, target: &NavigationTarget) -> Result<Location> {
        let mut name = target.name.clone();
        let mut path = target.path.clone();

        for _ in 0..MAX_REDIRECTS {
            let matched = match self.match_route(name.as_deref(), &path) {
                Some(matched) => matched,
                None => match &self.fallback {
                    Some(fallback) if *fallback != path => {
                        tracing::debug!(path = %path, fallback = %fallback, "No route matched, using fallback");
                        path = fallback.clone();
                        name = None;
                        continue;
                    }
                    _ => return Err(RouterError::NoMatch(path)),
                },
            };

            if let Some(redirect) = &matched.record.redirect {
                path = redirect.clone();
                name = None;
                continue;
            }

            let route_path = matched.record.path.clone();
            let full_path = if route_path == target.path {
                target.full_path()
            } else {
                route_path.clone()
            };

            if let Some(current) = self.current() {
                if current.full_path == full_path {
                    return Err(RouterError::NavigationDuplicated(full_path));
                }
            }

            let view = match &matched.record.component {
                Some(component) => Some(component.load().map_err(|source| {
                    RouterError::ComponentResolution {
                        path: route_path.clone(),
                        source,
                    }
                })?),
                None => None,
            };

            let location = Location {
                name: matched.record.name.clone(),
                path: route_path,
                full_path,
                view,
            };

            let mut history = self.history.write();
            if target.replace {
                history.pop();
            }
            history.push(location.clone());

            tracing::debug!(path = %location.full_path, replace = target.replace, "Navigated");
            return Ok(location);
        }

        Err(RouterError::TooManyRedirects(target.full_path()))
    }

    fn current(&self) -> Option<Location> {
        self.history.read().last().cloned()
    }
}
