//! Identifier generation.
//!
//! Every entity id in a project comes from an `IdGenerator` owned by the
//! store that creates it. Production code uses random UUIDs; tests inject
//! `SequentialIds` to get predictable ids.

/// Source of unique entity identifiers.
pub trait IdGenerator: Send {
    /// Produce a new id. `prefix` names the entity kind ("clip", "track", ...).
    fn next_id(&mut self, prefix: &str) -> String;
}

/// Random UUID v4 ids, prefixed with the entity kind.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_id(&mut self, prefix: &str) -> String {
        format!("{prefix}-{}", uuid::Uuid::new_v4().simple())
    }
}

/// Deterministic ids: `prefix-1`, `prefix-2`, ... with one counter shared
/// across all prefixes.
#[derive(Debug, Default, Clone)]
pub struct SequentialIds {
    counter: u64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting after `counter` (used when reopening a project).
    pub fn starting_after(counter: u64) -> Self {
        Self { counter }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self, prefix: &str) -> String {
        self.counter += 1;
        format!("{prefix}-{}", self.counter)
    }
}
