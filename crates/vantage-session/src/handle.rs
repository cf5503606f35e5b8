//! Route deregistration handles

use std::fmt;

pub type DeregistrationResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Capability that removes one previously registered route when invoked.
///
/// Handles are consumed on use, so a registration can be released at most once.
pub struct DeregistrationHandle {
    route_name: String,
    remove: Box<dyn FnOnce() -> DeregistrationResult + Send>,
}

impl DeregistrationHandle {
    pub fn new<F>(route_name: impl Into<String>, remove: F) -> Self
    where
        F: FnOnce() -> DeregistrationResult + Send + 'static,
    {
        Self {
            route_name: route_name.into(),
            remove: Box::new(remove),
        }
    }

    /// Name of the route this handle was issued for
    pub fn route_name(&self) -> &str {
        &self.route_name
    }

    pub fn invoke(self) -> DeregistrationResult {
        (self.remove)()
    }
}

impl fmt::Debug for DeregistrationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeregistrationHandle")
            .field("route_name", &self.route_name)
            .finish_non_exhaustive()
    }
}

/// Invoke every handle, logging failures without stopping.
/// Returns the number of handles that released cleanly.
pub(crate) fn release_all(handles: Vec<DeregistrationHandle>) -> usize {
    let mut released = 0;
    for handle in handles {
        let route = handle.route_name.clone();
        match handle.invoke() {
            Ok(()) => released += 1,
            Err(e) => tracing::error!(route = %route, error = %e, "Failed to remove route"),
        }
    }
    released
}
