//! Navigation targets

use url::Url;

use crate::error::RouterError;
use crate::Result;

// Hash-history paths are resolved against a fixed origin; only the path,
// query and fragment survive.
const BASE: &str = "http://vantage.local/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationTarget {
    pub path: String,
    pub query: Option<String>,
    pub fragment: Option<String>,
    /// Route name, when navigating by name
    pub name: Option<String>,
    /// Replace the current history entry instead of pushing
    pub replace: bool,
    /// Set when the guard re-dispatches after installing routes
    pub redispatched: bool,
}

/// Canonical form of a route path: dot segments resolved, non-ASCII and
/// reserved characters percent-encoded, no trailing `/` except on the root.
/// Registered routes and navigation targets both go through this, so they
/// compare as plain strings.
pub fn normalize_path(path: &str) -> Result<String> {
    Ok(NavigationTarget::parse(path)?.path)
}

fn trim_trailing_slash(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

impl NavigationTarget {
    /// Parse a path like `/user?page=2#top`. Relative paths resolve from `/`.
    /// The path is normalised with [`normalize_path`].
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(RouterError::InvalidTarget(input.to_string()));
        }

        let base = Url::parse(BASE).map_err(|e| RouterError::InvalidTarget(e.to_string()))?;
        let url = base
            .join(input)
            .map_err(|_| RouterError::InvalidTarget(input.to_string()))?;

        if url.origin() != base.origin() {
            return Err(RouterError::InvalidTarget(input.to_string()));
        }

        Ok(Self {
            path: trim_trailing_slash(url.path()),
            query: url.query().map(str::to_string),
            fragment: url.fragment().map(str::to_string),
            name: None,
            replace: false,
            redispatched: false,
        })
    }

    /// Target an already normalised path
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: None,
            fragment: None,
            name: None,
            replace: false,
            redispatched: false,
        }
    }

    /// Target a route by name and path
    pub fn named(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::path(path)
        }
    }

    pub fn replacing(mut self) -> Self {
        self.replace = true;
        self
    }

    /// Same target, replacing history, marked as already re-dispatched
    pub fn redispatch(&self) -> Self {
        Self {
            replace: true,
            redispatched: true,
            ..self.clone()
        }
    }

    pub fn full_path(&self) -> String {
        let mut full = self.path.clone();
        if let Some(query) = &self.query {
            full.push('?');
            full.push_str(query);
        }
        if let Some(fragment) = &self.fragment {
            full.push('#');
            full.push_str(fragment);
        }
        full
    }
}
