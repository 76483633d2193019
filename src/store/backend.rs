//! Key/value backend seam underneath [`super::ValueStore`].
//!
//! The primitives mirror a Redis-style server: plain string keys plus
//! string sets. Backends report every failure; deciding what to swallow is
//! the store's job.

/// Transport-level failure from a backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("backend connection lock poisoned")]
    Poisoned,
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Redis-like primitives used by the value store.
pub trait KvBackend: Send + Sync {
    /// Read a plain key.
    fn get(&self, key: &str) -> BackendResult<Option<String>>;

    /// Write a plain key, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> BackendResult<()>;

    /// Delete a key of either kind. Returns whether anything was removed.
    fn delete(&self, key: &str) -> BackendResult<bool>;

    /// Whether a plain key or a non-empty set exists under `key`.
    fn exists(&self, key: &str) -> BackendResult<bool>;

    /// Add a member to a set, creating the set if needed.
    fn set_add(&self, key: &str, member: &str) -> BackendResult<()>;

    /// Remove a member. Removing the last member removes the set.
    fn set_remove(&self, key: &str, member: &str) -> BackendResult<()>;

    /// Members of a set, sorted. Missing sets are empty.
    fn set_members(&self, key: &str) -> BackendResult<Vec<String>>;

    /// All keys (plain and set) starting with `prefix`, sorted.
    fn keys_with_prefix(&self, prefix: &str) -> BackendResult<Vec<String>>;
}
