//! View modules and their resolution
//!
//! The registry is a declarative table built once at startup. Menu entries
//! come from the server, so resolution keeps a finite fallback policy:
//!
//! 1. Candidate paths derived from `url` and `name`, first registered wins
//! 2. Otherwise a deferred chain, run when the route is first visited:
//!    - urls mentioning `product` load the mall view
//!    - else the url module, then the name module, then the not-found view

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use vantage_session::MenuEntry;

use crate::error::ViewError;

/// A loaded view module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewModule {
    pub path: String,
}

impl ViewModule {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Lookup of view modules by path
pub trait ViewRegistry: Send + Sync {
    fn has(&self, path: &str) -> bool;

    fn load(&self, path: &str) -> Result<ViewModule, ViewError>;
}

pub type ViewLoader = Arc<dyn Fn() -> Result<ViewModule, ViewError> + Send + Sync>;

/// Registry backed by a fixed path → loader table
#[derive(Clone, Default)]
pub struct StaticViewRegistry {
    loaders: Arc<RwLock<HashMap<String, ViewLoader>>>,
}

impl StaticViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry whose modules always load
    pub fn with_views<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let registry = Self::new();
        for path in paths {
            registry.register_view(path);
        }
        registry
    }

    pub fn register_view(&self, path: impl Into<String>) {
        let path = path.into();
        let module = ViewModule::new(path.clone());
        self.register(path, Arc::new(move || Ok(module.clone())));
    }

    pub fn register(&self, path: impl Into<String>, loader: ViewLoader) {
        self.loaders.write().insert(path.into(), loader);
    }
}

impl ViewRegistry for StaticViewRegistry {
    fn has(&self, path: &str) -> bool {
        self.loaders.read().contains_key(path)
    }

    fn load(&self, path: &str) -> Result<ViewModule, ViewError> {
        let loader = self
            .loaders
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| ViewError::NotFound(path.to_string()))?;
        loader()
    }
}

/// Where view modules live and which ones back the fallback chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewLayout {
    /// Directory prefix of every module path
    pub root: String,
    /// File extension of every module path, without the dot
    pub extension: String,
    /// Urls containing this marker resolve to `mall_view`
    pub product_marker: String,
    pub mall_view: String,
    pub not_found_view: String,
    pub login_view: String,
}

impl Default for ViewLayout {
    fn default() -> Self {
        Self {
            root: "views".to_string(),
            extension: "vue".to_string(),
            product_marker: "product".to_string(),
            mall_view: "mall".to_string(),
            not_found_view: "404".to_string(),
            login_view: "login".to_string(),
        }
    }
}

impl ViewLayout {
    /// Normalise `stem` into a module path under `root` with `extension`
    pub fn module_path(&self, stem: &str) -> String {
        let stem = stem.trim().trim_start_matches('/');
        let suffix = format!(".{}", self.extension);
        let prefix = format!("{}/", self.root);

        let with_ext = if stem.ends_with(&suffix) {
            stem.to_string()
        } else {
            format!("{}{}", stem, suffix)
        };

        if with_ext.starts_with(&prefix) {
            with_ext
        } else {
            format!("{}{}", prefix, with_ext)
        }
    }

    /// Candidate module paths for an entry, most specific first, deduplicated
    pub fn candidates(&self, entry: &MenuEntry) -> Vec<String> {
        let url = entry.url.trim().trim_start_matches('/');
        let name = entry.name.trim();
        let basename = url.rsplit('/').next().unwrap_or(url);

        let exact = self.module_path(url);
        let raw = format!("{}/{}", self.root, url);
        let by_basename = self.module_path(basename);

        let variants = [
            exact.clone(),
            exact.to_lowercase(),
            raw.clone(),
            raw.to_lowercase(),
            self.module_path(name),
            self.module_path(&capitalize(name)),
            by_basename.clone(),
            by_basename.to_lowercase(),
        ];

        let mut candidates: Vec<String> = Vec::with_capacity(variants.len());
        for variant in variants {
            if !candidates.contains(&variant) {
                candidates.push(variant);
            }
        }
        candidates
    }

    /// Deferred chain for an entry no candidate matched
    pub fn fallback_chain(&self, entry: &MenuEntry) -> Vec<String> {
        if entry.url.contains(&self.product_marker) {
            return vec![self.module_path(&self.mall_view)];
        }

        vec![
            self.module_path(&entry.url),
            self.module_path(&entry.name),
            self.module_path(&self.not_found_view),
        ]
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewSource {
    /// A registered module path
    Module(String),
    /// Paths tried in order when the route is first visited
    Fallback(Vec<String>),
}

/// A route's view, loaded when the route is actually visited
#[derive(Clone)]
pub struct ViewComponent {
    registry: Arc<dyn ViewRegistry>,
    source: ViewSource,
}

impl ViewComponent {
    pub fn new(registry: Arc<dyn ViewRegistry>, source: ViewSource) -> Self {
        Self { registry, source }
    }

    pub fn source(&self) -> &ViewSource {
        &self.source
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self.source, ViewSource::Fallback(_))
    }

    /// Load the module. Fallback steps run only when the previous one fails.
    pub fn load(&self) -> Result<ViewModule, ViewError> {
        match &self.source {
            ViewSource::Module(path) => self.registry.load(path),
            ViewSource::Fallback(chain) => {
                let mut last_error = ViewError::NotFound(String::new());
                for path in chain {
                    match self.registry.load(path) {
                        Ok(module) => return Ok(module),
                        Err(e) => {
                            tracing::error!(path = %path, error = %e, "Failed to import view module");
                            last_error = e;
                        }
                    }
                }
                Err(last_error)
            }
        }
    }
}

impl fmt::Debug for ViewComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewComponent")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Resolves menu entries to view components against one registry
#[derive(Clone)]
pub struct ViewResolver {
    registry: Arc<dyn ViewRegistry>,
    layout: ViewLayout,
}

impl ViewResolver {
    pub fn new(registry: Arc<dyn ViewRegistry>, layout: ViewLayout) -> Self {
        Self { registry, layout }
    }

    pub fn layout(&self) -> &ViewLayout {
        &self.layout
    }

    pub fn resolve(&self, entry: &MenuEntry) -> ViewComponent {
        let found = self
            .layout
            .candidates(entry)
            .into_iter()
            .find(|path| self.registry.has(path));

        let source = match found {
            Some(path) => ViewSource::Module(path),
            None => {
                tracing::warn!(url = %entry.url, name = %entry.name, "View module not found, deferring resolution");
                ViewSource::Fallback(self.layout.fallback_chain(entry))
            }
        };

        ViewComponent::new(Arc::clone(&self.registry), source)
    }

    /// Component for a fixed view such as login or not-found
    pub fn named(&self, stem: &str) -> ViewComponent {
        ViewComponent::new(
            Arc::clone(&self.registry),
            ViewSource::Module(self.layout.module_path(stem)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(paths: &[&str]) -> ViewResolver {
        let registry = StaticViewRegistry::with_views(paths.iter().copied());
        ViewResolver::new(Arc::new(registry), ViewLayout::default())
    }

    #[test]
    fn test_module_path() {
        let layout = ViewLayout::default();
        assert_eq!(layout.module_path("Home"), "views/Home.vue");
        assert_eq!(layout.module_path("other/PageOne.vue"), "views/other/PageOne.vue");
        assert_eq!(layout.module_path("views/user"), "views/user.vue");
        assert_eq!(layout.module_path("/mall"), "views/mall.vue");
    }

    #[test]
    fn test_candidate_order() {
        let layout = ViewLayout::default();
        let entry = MenuEntry::leaf("pageOne", "Other/PageOne");
        assert_eq!(
            layout.candidates(&entry),
            vec![
                "views/Other/PageOne.vue",
                "views/other/pageone.vue",
                "views/Other/PageOne",
                "views/other/pageone",
                "views/pageOne.vue",
                "views/PageOne.vue",
                "views/pageone.vue",
            ]
        );
    }

    #[test]
    fn test_resolve_exact_and_lowercase() {
        let resolver = resolver(&["views/user.vue"]);

        let component = resolver.resolve(&MenuEntry::leaf("user", "User"));
        assert_eq!(
            component.source(),
            &ViewSource::Module("views/user.vue".to_string())
        );
        assert_eq!(component.load().unwrap().path, "views/user.vue");
    }

    #[test]
    fn test_resolve_by_basename() {
        let resolver = resolver(&["views/pageone.vue"]);
        let component = resolver.resolve(&MenuEntry::leaf("page1", "Other/PageOne"));
        assert_eq!(
            component.source(),
            &ViewSource::Module("views/pageone.vue".to_string())
        );
    }

    #[test]
    fn test_product_urls_defer_to_mall() {
        let resolver = resolver(&["views/mall.vue", "views/404.vue"]);
        let component = resolver.resolve(&MenuEntry::leaf("goods", "product/list"));

        assert!(component.is_deferred());
        assert_eq!(component.load().unwrap().path, "views/mall.vue");
    }

    #[test]
    fn test_deferred_chain_ends_at_not_found() {
        let resolver = resolver(&["views/404.vue"]);
        let component = resolver.resolve(&MenuEntry::leaf("reports", "Reports"));

        assert_eq!(
            component.source(),
            &ViewSource::Fallback(vec![
                "views/Reports.vue".to_string(),
                "views/reports.vue".to_string(),
                "views/404.vue".to_string(),
            ])
        );
        assert_eq!(component.load().unwrap().path, "views/404.vue");
    }

    #[test]
    fn test_deferred_steps_run_only_after_failure() {
        let registry = StaticViewRegistry::new();
        registry.register(
            "views/Reports.vue",
            Arc::new(|| {
                Err(ViewError::LoadFailed {
                    path: "views/Reports.vue".to_string(),
                    reason: "chunk failed".to_string(),
                })
            }),
        );
        registry.register_view("views/reports.vue");

        let component = ViewComponent::new(
            Arc::new(registry),
            ViewSource::Fallback(
                ViewLayout::default().fallback_chain(&MenuEntry::leaf("reports", "Reports")),
            ),
        );
        assert_eq!(component.load().unwrap().path, "views/reports.vue");
    }

    #[test]
    fn test_deferred_chain_exhausted() {
        let resolver = resolver(&[]);
        let component = resolver.resolve(&MenuEntry::leaf("mall", "product/list"));
        assert_eq!(
            component.load(),
            Err(ViewError::NotFound("views/mall.vue".to_string()))
        );
    }
}
