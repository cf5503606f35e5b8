//! Route records and well-known routes

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::view::{ViewComponent, ViewModule};

/// A route to be registered with the router
#[derive(Debug, Clone)]
pub struct RouteRecord {
    pub name: String,
    /// Absolute path, e.g. `/user`
    pub path: String,
    pub component: Option<ViewComponent>,
    /// Path to redirect to when this route is matched
    pub redirect: Option<String>,
}

impl RouteRecord {
    pub fn new(name: impl Into<String>, path: impl Into<String>, component: ViewComponent) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            component: Some(component),
            redirect: None,
        }
    }

    pub fn with_redirect(mut self, to: impl Into<String>) -> Self {
        self.redirect = Some(to.into());
        self
    }
}

/// Snapshot of a registered route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    /// Registration id, unique per `add`
    pub id: Uuid,
    pub name: String,
    pub path: String,
    pub parent: Option<String>,
}

/// Where a completed navigation landed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub name: String,
    pub path: String,
    pub full_path: String,
    /// Loaded view, absent for routes without a component
    pub view: Option<ViewModule>,
}

/// Names and paths of the routes that exist before any menu is installed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteNames {
    /// Layout route every menu route registers under
    pub main: String,
    pub main_path: String,
    pub login: String,
    pub login_path: String,
    pub not_found: String,
    pub not_found_path: String,
    /// Landing path after login
    pub home_path: String,
}

impl Default for RouteNames {
    fn default() -> Self {
        Self {
            main: "main".to_string(),
            main_path: "/".to_string(),
            login: "login".to_string(),
            login_path: "/login".to_string(),
            not_found: "404".to_string(),
            not_found_path: "/404".to_string(),
            home_path: "/home".to_string(),
        }
    }
}
