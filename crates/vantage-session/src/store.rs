//! Persisted session store
//!
//! Every mutator applies its change and then writes the full state under
//! [`STORE_KEY`]. While a token is present the token and menu list are also
//! written under their own keys so a partial restore stays possible when the
//! full blob is unreadable. The two writes are not transactional.

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

use vantage_storage::{DurableStorage, JsonStorage};

use crate::handle::{release_all, DeregistrationHandle};
use crate::menu::{MenuEntry, Tag};
use crate::state::SessionState;
use crate::Result;

/// Key of the full serialized session state
pub const STORE_KEY: &str = "store";
/// Key of the standalone auth token
pub const TOKEN_KEY: &str = "token";
/// Key of the standalone menu list blob
pub const MENU_LIST_KEY: &str = "menuList";

/// How [`SessionStore::restore`] recovered its state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// The full state blob was decoded
    Full,
    /// The full blob was unreadable; token and menu list came from their own keys
    Partial,
    /// Nothing was stored
    Defaults,
    /// Nothing was readable; durable entries were cleared
    Cleared,
}

pub struct SessionStore {
    state: Arc<RwLock<SessionState>>,
    /// Handles for currently registered dynamic routes
    handles: Arc<Mutex<Vec<DeregistrationHandle>>>,
    storage: Arc<dyn DurableStorage>,
}

impl SessionStore {
    /// Create a store with default state. Call [`restore`](Self::restore) to
    /// load what a previous process left behind.
    pub fn new(storage: Arc<dyn DurableStorage>) -> Self {
        Self {
            state: Arc::new(RwLock::new(SessionState::default())),
            handles: Arc::new(Mutex::new(Vec::new())),
            storage,
        }
    }

    /// Load state written by a previous process. Never fails: unreadable data
    /// degrades to a partial restore, then to defaults.
    pub fn restore(&self) -> RestoreOutcome {
        // Handles belong to the previous process and are never carried over.
        self.handles.lock().clear();

        let outcome = match self.storage.get_json::<SessionState>(STORE_KEY) {
            Ok(Some(stored)) => {
                *self.state.write() = stored;
                RestoreOutcome::Full
            }
            Ok(None) => RestoreOutcome::Defaults,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read stored session");
                match self.restore_partial() {
                    Ok(()) => RestoreOutcome::Partial,
                    Err(inner) => {
                        tracing::error!(error = %inner, "Failed to read stored token and menu list");
                        *self.state.write() = SessionState::default();
                        if let Err(e) = self.clear_durable() {
                            tracing::error!(error = %e, "Failed to clear durable session entries");
                        }
                        RestoreOutcome::Cleared
                    }
                }
            }
        };

        let state = self.state.read();
        tracing::info!(
            outcome = ?outcome,
            authenticated = state.is_authenticated(),
            menu_count = state.menu_list.len(),
            tag_count = state.tags.len(),
            "Restored session"
        );

        outcome
    }

    /// Read both standalone keys before touching memory, so a failure on
    /// either leaves the in-memory state at its defaults.
    fn restore_partial(&self) -> Result<()> {
        let token = self.storage.get(TOKEN_KEY)?;
        let menu_list = self.storage.get_json::<Vec<MenuEntry>>(MENU_LIST_KEY)?;

        let mut state = self.state.write();
        if let Some(token) = token {
            state.token = token;
        }
        if let Some(menu_list) = menu_list {
            state.menu_list = menu_list;
        }
        Ok(())
    }

    // === Reads ===

    pub fn snapshot(&self) -> SessionState {
        self.state.read().clone()
    }

    pub fn token(&self) -> String {
        self.state.read().token.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().is_authenticated()
    }

    pub fn menu_list(&self) -> Vec<MenuEntry> {
        self.state.read().menu_list.clone()
    }

    pub fn tags(&self) -> Vec<Tag> {
        self.state.read().tags.clone()
    }

    pub fn current_menu(&self) -> Option<MenuEntry> {
        self.state.read().current_menu.clone()
    }

    pub fn is_collapse(&self) -> bool {
        self.state.read().is_collapse
    }

    // === Mutations (each persists) ===

    pub fn set_token(&self, token: impl Into<String>) -> Result<()> {
        let token = token.into();
        self.mutate(|state| state.token = token)
    }

    pub fn update_menu_list(&self, menu_list: Vec<MenuEntry>) -> Result<()> {
        self.mutate(|state| state.menu_list = menu_list)
    }

    /// Selecting home clears the current menu; any other tag is appended
    /// unless a tag with the same name is already open.
    pub fn select_menu(&self, tag: Tag) -> Result<()> {
        self.mutate(|state| {
            if tag.is_home() {
                state.current_menu = None;
            } else if !state.tags.iter().any(|t| t.name == tag.name) {
                state.tags.push(tag);
            }
        })
    }

    /// Close the first tag named like `tag`. Returns whether one was removed.
    pub fn update_tags(&self, tag: &Tag) -> Result<bool> {
        self.mutate(|state| match state.tags.iter().position(|t| t.name == tag.name) {
            Some(index) => {
                state.tags.remove(index);
                true
            }
            None => {
                tracing::debug!(tag = %tag.name, "Tag not open, nothing to close");
                false
            }
        })
    }

    /// Flip the sidebar collapse flag, returning the new value
    pub fn toggle_collapse(&self) -> Result<bool> {
        self.mutate(|state| {
            state.is_collapse = !state.is_collapse;
            state.is_collapse
        })
    }

    /// Log out: release every registered route, drop durable entries and
    /// return to the default state.
    pub fn reset(&self) -> Result<()> {
        let released = self.release_handles();
        *self.state.write() = SessionState::default();
        self.clear_durable()?;

        tracing::info!(released_routes = released, "Session reset");
        Ok(())
    }

    /// Remove every durable entry the store writes
    pub fn clear_durable(&self) -> Result<()> {
        for key in [STORE_KEY, TOKEN_KEY, MENU_LIST_KEY] {
            self.storage.remove(key)?;
        }
        Ok(())
    }

    /// Reload the menu list from its standalone key when memory has none.
    /// Returns whether a non-empty list was loaded.
    pub fn recover_menu_list(&self) -> Result<bool> {
        if !self.state.read().menu_list.is_empty() {
            return Ok(false);
        }

        match self.storage.get_json::<Vec<MenuEntry>>(MENU_LIST_KEY) {
            Ok(Some(menu_list)) if !menu_list.is_empty() => {
                self.update_menu_list(menu_list)?;
                Ok(true)
            }
            Ok(_) => Ok(false),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable stored menu list");
                Ok(false)
            }
        }
    }

    // === Route handles ===

    pub fn install_handles(&self, handles: Vec<DeregistrationHandle>) {
        self.handles.lock().extend(handles);
    }

    pub fn handle_count(&self) -> usize {
        self.handles.lock().len()
    }

    /// Invoke and drop every stored handle. Failures are logged and do not
    /// stop the remaining handles. Returns how many released cleanly.
    pub fn release_handles(&self) -> usize {
        let handles = std::mem::take(&mut *self.handles.lock());
        release_all(handles)
    }

    fn mutate<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut SessionState) -> T,
    {
        let (value, snapshot) = {
            let mut state = self.state.write();
            let value = f(&mut state);
            (value, state.clone())
        };

        self.persist(&snapshot)?;
        Ok(value)
    }

    fn persist(&self, state: &SessionState) -> Result<()> {
        self.storage.set_json(STORE_KEY, state)?;

        if state.is_authenticated() {
            self.storage.set(TOKEN_KEY, &state.token)?;
            self.storage.set_json(MENU_LIST_KEY, &state.menu_list)?;
        }

        Ok(())
    }
}

impl Clone for SessionStore {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            handles: Arc::clone(&self.handles),
            storage: Arc::clone(&self.storage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vantage_storage::MemoryStorage;

    fn store_with(storage: &MemoryStorage) -> SessionStore {
        SessionStore::new(Arc::new(storage.clone()))
    }

    fn tag(name: &str) -> Tag {
        Tag::new(format!("/{}", name), name, name, "")
    }

    #[test]
    fn test_select_menu_is_idempotent() {
        let store = store_with(&MemoryStorage::new());

        store.select_menu(tag("user")).unwrap();
        store.select_menu(tag("mall")).unwrap();
        store.select_menu(tag("user")).unwrap();

        let names: Vec<String> = store.tags().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["home", "user", "mall"]);
    }

    #[test]
    fn test_select_home_clears_current_menu() {
        let storage = MemoryStorage::new();
        storage
            .set_json(
                STORE_KEY,
                &SessionState {
                    current_menu: Some(MenuEntry::leaf("user", "User")),
                    ..SessionState::default()
                },
            )
            .unwrap();
        let store = store_with(&storage);
        store.restore();
        assert!(store.current_menu().is_some());

        store.select_menu(Tag::home()).unwrap();
        assert!(store.current_menu().is_none());
        assert_eq!(store.tags(), vec![Tag::home()]);

        store.select_menu(Tag::home()).unwrap();
        assert!(store.current_menu().is_none());
    }

    #[test]
    fn test_update_tags_missing_is_noop() {
        let store = store_with(&MemoryStorage::new());
        store.select_menu(tag("user")).unwrap();
        let before = store.tags();

        assert!(!store.update_tags(&tag("absent")).unwrap());
        assert_eq!(store.tags(), before);

        assert!(store.update_tags(&tag("user")).unwrap());
        assert_eq!(store.tags(), vec![Tag::home()]);
    }

    #[test]
    fn test_toggle_collapse() {
        let store = store_with(&MemoryStorage::new());
        assert!(store.toggle_collapse().unwrap());
        assert!(!store.toggle_collapse().unwrap());
    }

    #[test]
    fn test_persist_writes_separate_keys_only_with_token() {
        let storage = MemoryStorage::new();
        let store = store_with(&storage);

        store
            .update_menu_list(vec![MenuEntry::leaf("user", "User")])
            .unwrap();
        assert!(storage.contains(STORE_KEY));
        assert!(!storage.contains(TOKEN_KEY));
        assert!(!storage.contains(MENU_LIST_KEY));

        store.set_token("fake-token-admin").unwrap();
        assert_eq!(
            storage.get(TOKEN_KEY).unwrap(),
            Some("fake-token-admin".to_string())
        );
        assert!(storage.contains(MENU_LIST_KEY));
    }

    #[test]
    fn test_restore_round_trip() {
        let storage = MemoryStorage::new();
        let menu = vec![
            MenuEntry::leaf("home", "Home").with_path("/home"),
            MenuEntry::group("other", vec![MenuEntry::leaf("page1", "Other/PageOne")]),
        ];

        {
            let store = store_with(&storage);
            store.set_token("fake-token-admin").unwrap();
            store.update_menu_list(menu.clone()).unwrap();
            store.select_menu(tag("user")).unwrap();
            store.install_handles(vec![DeregistrationHandle::new("user", || Ok(()))]);
        }

        let fresh = store_with(&storage);
        assert_eq!(fresh.restore(), RestoreOutcome::Full);
        assert_eq!(fresh.token(), "fake-token-admin");
        assert_eq!(fresh.menu_list(), menu);
        assert_eq!(fresh.tags().len(), 2);
        assert_eq!(fresh.handle_count(), 0);
    }

    #[test]
    fn test_restore_falls_back_to_separate_keys() {
        let storage = MemoryStorage::new();
        storage.set(STORE_KEY, "{corrupt").unwrap();
        storage.set(TOKEN_KEY, "fake-token-admin").unwrap();
        storage
            .set_json(MENU_LIST_KEY, &vec![MenuEntry::leaf("user", "User")])
            .unwrap();

        let store = store_with(&storage);
        assert_eq!(store.restore(), RestoreOutcome::Partial);
        assert_eq!(store.token(), "fake-token-admin");
        assert_eq!(store.menu_list().len(), 1);
        assert_eq!(store.tags(), vec![Tag::home()]);
    }

    #[test]
    fn test_restore_total_failure_clears_storage() {
        let storage = MemoryStorage::new();
        storage.set(STORE_KEY, "{corrupt").unwrap();
        storage.set(TOKEN_KEY, "fake-token-admin").unwrap();
        storage.set(MENU_LIST_KEY, "[{broken").unwrap();

        let store = store_with(&storage);
        assert_eq!(store.restore(), RestoreOutcome::Cleared);
        assert!(storage.is_empty());
        assert_eq!(store.snapshot(), SessionState::default());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_restore_with_nothing_stored() {
        let store = store_with(&MemoryStorage::new());
        assert_eq!(store.restore(), RestoreOutcome::Defaults);
        assert_eq!(store.snapshot(), SessionState::default());
    }

    #[test]
    fn test_reset_releases_handles_and_clears() {
        let storage = MemoryStorage::new();
        let store = store_with(&storage);
        store.set_token("fake-token-admin").unwrap();
        store.select_menu(tag("user")).unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let handles = ["user", "mall"]
            .into_iter()
            .map(|name| {
                let calls = Arc::clone(&calls);
                DeregistrationHandle::new(name, move || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
            })
            .collect();
        store.install_handles(handles);

        store.reset().unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.handle_count(), 0);
        assert_eq!(store.snapshot(), SessionState::default());
        assert!(!storage.contains(STORE_KEY));
        assert!(!storage.contains(TOKEN_KEY));
        assert!(!storage.contains(MENU_LIST_KEY));
    }

    #[test]
    fn test_recover_menu_list() {
        let storage = MemoryStorage::new();
        storage
            .set_json(MENU_LIST_KEY, &vec![MenuEntry::leaf("user", "User")])
            .unwrap();

        let store = store_with(&storage);
        assert!(store.recover_menu_list().unwrap());
        assert_eq!(store.menu_list().len(), 1);
        assert!(!store.recover_menu_list().unwrap());
    }
}
