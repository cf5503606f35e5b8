//! Vantage Session Management
//!
//! - The session holds the auth token, the server-supplied menu tree,
//!   open navigation tags and the sidebar collapse flag
//! - Every mutation writes the full state to durable storage
//! - Route deregistration handles live only in-process and are never persisted

mod error;
mod handle;
pub mod menu;
mod state;
mod store;

pub use error::SessionError;
pub use handle::{DeregistrationHandle, DeregistrationResult};
pub use menu::{build_menu_tree, MenuEntry, MenuRow, Tag};
pub use state::SessionState;
pub use store::{RestoreOutcome, SessionStore, MENU_LIST_KEY, STORE_KEY, TOKEN_KEY};

pub type Result<T> = std::result::Result<T, SessionError>;
