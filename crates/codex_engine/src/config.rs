//! Engine configuration.

/// Behaviour switches for graph mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Strip dangling identifiers and carry on instead of failing.
    pub heal_dangling: bool,
    /// Queue a scope-tagged notice for every write the engine issues.
    pub queue_notifications: bool,
    /// Read every write back and fail if the store did not keep it.
    pub verify_writes: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            heal_dangling: true,
            queue_notifications: false,
            verify_writes: false,
        }
    }
}

impl EngineConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails on dangling references and verifies every write.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            heal_dangling: false,
            queue_notifications: false,
            verify_writes: true,
        }
    }

    /// Self-heals and queues notices, for sessions that share the
    /// notification path with external editors.
    #[must_use]
    pub fn interactive() -> Self {
        Self {
            heal_dangling: true,
            queue_notifications: true,
            verify_writes: false,
        }
    }

    /// Sets dangling-reference healing.
    #[must_use]
    pub fn with_heal_dangling(mut self, heal: bool) -> Self {
        self.heal_dangling = heal;
        self
    }

    /// Sets notice queueing.
    #[must_use]
    pub fn with_queue_notifications(mut self, queue: bool) -> Self {
        self.queue_notifications = queue;
        self
    }

    /// Sets write verification.
    #[must_use]
    pub fn with_verify_writes(mut self, verify: bool) -> Self {
        self.verify_writes = verify;
        self
    }
}
