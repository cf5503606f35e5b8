//! Routing error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    #[error("View module not found: {0}")]
    NotFound(String),

    #[error("Failed to load view module {path}: {reason}")]
    LoadFailed { path: String, reason: String },
}

#[derive(Error, Debug)]
pub enum RouterError {
    #[error("Parent route not found: {0}")]
    ParentNotFound(String),

    #[error("Route not found: {0}")]
    RouteNotFound(String),

    #[error("Route name cannot be empty")]
    EmptyName,

    #[error("Invalid route path: {0}")]
    InvalidPath(String),

    #[error("Invalid navigation target: {0}")]
    InvalidTarget(String),

    #[error("No route matches {0}")]
    NoMatch(String),

    #[error("Avoided redundant navigation to current location: {0}")]
    NavigationDuplicated(String),

    #[error("Too many redirects while navigating to {0}")]
    TooManyRedirects(String),

    #[error("Failed to resolve component for {path}: {source}")]
    ComponentResolution {
        path: String,
        #[source]
        source: ViewError,
    },
}
