//! Lifecycle gate: decides when destruction-triggered clearing is safe.
//!
//! A top-level container being torn down without finishing (a configuration
//! change, for example) is about to be recreated and still needs its saved
//! state, so the destruction that follows must not clear. Only a genuine
//! finish re-enables clearing. Separately, the very first container creation
//! of a process run wipes the durable store when the host reports no prior
//! saved state, so records from an unrelated earlier process generation
//! cannot leak into this one.

/// Pure state machine over host container lifecycle events.
#[derive(Debug, Default)]
pub struct LifecycleGate {
    clearing_allowed: bool,
    first_creation_seen: bool,
}

impl LifecycleGate {
    /// Create a gate in its initial state: clearing disallowed, first
    /// creation not yet observed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a top-level container creation.
    ///
    /// Returns `true` when the durable store should be wiped: only on the
    /// first creation of the process run, and only when the host reports no
    /// prior saved state for the container. During state restoration the
    /// first container always carries prior state.
    #[must_use]
    pub fn on_container_created(&mut self, has_prior_state: bool) -> bool {
        self.clearing_allowed = true;
        if self.first_creation_seen {
            return false;
        }
        self.first_creation_seen = true;
        !has_prior_state
    }

    /// Record a top-level container destruction. `is_finishing` is true when
    /// the container is being genuinely dismissed rather than torn down for
    /// recreation.
    pub fn on_container_destroyed(&mut self, is_finishing: bool) {
        self.clearing_allowed = is_finishing;
    }

    /// Whether destruction-triggered clearing is currently permitted.
    pub fn clearing_allowed(&self) -> bool {
        self.clearing_allowed
    }
}
