//! Menu and tag data structures
//!
//! The permission endpoint returns a tree of menu entries. Top-level entries
//! either map to a route directly or group child entries that do.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Path the backend assigns to group entries that own children.
pub const GROUP_PATH: &str = "#";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<MenuEntry>>,
}

impl MenuEntry {
    /// Create a childless entry
    pub fn leaf(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    /// Create a group entry owning `children`
    pub fn group(name: impl Into<String>, children: Vec<MenuEntry>) -> Self {
        Self {
            name: name.into(),
            path: Some(GROUP_PATH.to_string()),
            children: Some(children),
            ..Self::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// An entry is routable only when both `name` and `url` are non-empty.
    pub fn is_routable(&self) -> bool {
        !self.name.trim().is_empty() && !self.url.trim().is_empty()
    }

    /// Router path for this entry: the declared path, or `/{name}` when the
    /// path is missing or is the group placeholder.
    pub fn route_path(&self) -> String {
        match self.path.as_deref().map(str::trim) {
            Some(path) if !path.is_empty() && path != GROUP_PATH => {
                if path.starts_with('/') {
                    path.to_string()
                } else {
                    format!("/{}", path)
                }
            }
            _ => format!("/{}", self.name.trim()),
        }
    }

    /// Build the navigation tag shown when this entry is opened
    pub fn to_tag(&self) -> Tag {
        Tag {
            path: self.route_path(),
            name: self.name.clone(),
            label: self.label.clone().unwrap_or_else(|| self.name.clone()),
            icon: self.icon.clone().unwrap_or_default(),
        }
    }
}

/// An open navigation tab. Unique by `name` within the session's tag list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(default)]
    pub path: String,
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub icon: String,
}

impl Tag {
    pub const HOME: &'static str = "home";

    pub fn new(
        path: impl Into<String>,
        name: impl Into<String>,
        label: impl Into<String>,
        icon: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            label: label.into(),
            icon: icon.into(),
        }
    }

    /// The pinned home tag every fresh session starts with
    pub fn home() -> Self {
        Self::new("/home", Self::HOME, "Home", "home")
    }

    pub fn is_home(&self) -> bool {
        self.name == Self::HOME
    }
}

/// A flat permission row as stored by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuRow {
    pub id: i64,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

/// Assemble flat permission rows into the menu tree the session consumes.
///
/// Row order is preserved at every level. Rows naming an unknown parent are
/// dropped. Roots that end up with children get the group path `#`.
pub fn build_menu_tree(rows: &[MenuRow]) -> Vec<MenuEntry> {
    let known: HashMap<i64, &MenuRow> = rows.iter().map(|row| (row.id, row)).collect();
    let mut children_of: HashMap<i64, Vec<&MenuRow>> = HashMap::new();
    let mut roots = Vec::new();

    for row in rows {
        match row.parent_id {
            None => roots.push(row),
            Some(parent) if known.contains_key(&parent) => {
                children_of.entry(parent).or_default().push(row)
            }
            Some(parent) => {
                tracing::warn!(menu_id = row.id, parent_id = parent, "Dropping orphan menu row");
            }
        }
    }

    roots
        .into_iter()
        .map(|row| {
            let mut entry = assemble(row, &children_of, 0);
            if entry.children.is_some() {
                entry.path = Some(GROUP_PATH.to_string());
            }
            entry
        })
        .collect()
}

// Depth cap guards against parent cycles in malformed rows.
const MAX_MENU_DEPTH: usize = 16;

fn assemble(row: &MenuRow, children_of: &HashMap<i64, Vec<&MenuRow>>, depth: usize) -> MenuEntry {
    let children: Vec<MenuEntry> = if depth < MAX_MENU_DEPTH {
        children_of
            .get(&row.id)
            .map(|rows| {
                rows.iter()
                    .map(|child| assemble(child, children_of, depth + 1))
                    .collect()
            })
            .unwrap_or_default()
    } else {
        Vec::new()
    };

    MenuEntry {
        id: Some(row.id),
        name: row.name.clone(),
        url: row.url.clone().unwrap_or_default(),
        path: row.path.clone(),
        label: row.label.clone(),
        icon: row.icon.clone(),
        children: if children.is_empty() {
            None
        } else {
            Some(children)
        },
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
