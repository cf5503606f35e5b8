//! Session state
//!
//! Serialized in camelCase so stored blobs stay readable by older clients.
//! Fields missing from a stored blob take their default values.

use serde::{Deserialize, Serialize};

use crate::menu::{MenuEntry, Tag};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionState {
    /// Auth token, empty when logged out
    pub token: String,
    /// Server-supplied menu tree
    pub menu_list: Vec<MenuEntry>,
    /// Open navigation tags, in opening order
    pub tags: Vec<Tag>,
    pub current_menu: Option<MenuEntry>,
    /// Whether the sidebar is collapsed
    pub is_collapse: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            token: String::new(),
            menu_list: Vec::new(),
            tags: vec![Tag::home()],
            current_menu: None,
            is_collapse: false,
        }
    }
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let state = SessionState::default();
        assert!(!state.is_authenticated());
        assert_eq!(state.tags, vec![Tag::home()]);
        assert!(state.current_menu.is_none());
    }

    #[test]
    fn test_partial_blob_merges_over_defaults() {
        let state: SessionState =
            serde_json::from_str(r#"{"token":"t","isCollapse":true,"routerList":[]}"#).unwrap();
        assert_eq!(state.token, "t");
        assert!(state.is_collapse);
        assert_eq!(state.tags, vec![Tag::home()]);
    }

    #[test]
    fn test_non_object_blob_rejected() {
        assert!(serde_json::from_str::<SessionState>("null").is_err());
        assert!(serde_json::from_str::<SessionState>("42").is_err());
    }
}
