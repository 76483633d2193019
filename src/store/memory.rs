//! Process-local backend with failure injection.

use super::backend::{BackendError, BackendResult, KvBackend};
use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
struct MemoryState {
    values: HashMap<String, String>,
    sets: HashMap<String, BTreeSet<String>>,
}

/// In-memory backend.
///
/// `set_unavailable(true)` makes every primitive fail, emulating a transport
/// outage. `set_read_only(true)` only fails mutations.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
    unavailable: AtomicBool,
    read_only: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    fn read<F, T>(&self, f: F) -> BackendResult<T>
    where
        F: FnOnce(&MemoryState) -> T,
    {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("memory backend offline".into()));
        }
        let state = self.state.lock().map_err(|_| BackendError::Poisoned)?;
        Ok(f(&state))
    }

    fn write<F, T>(&self, f: F) -> BackendResult<T>
    where
        F: FnOnce(&mut MemoryState) -> T,
    {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("memory backend offline".into()));
        }
        if self.read_only.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("memory backend is read-only".into()));
        }
        let mut state = self.state.lock().map_err(|_| BackendError::Poisoned)?;
        Ok(f(&mut state))
    }
}

impl KvBackend for MemoryBackend {
    fn get(&self, key: &str) -> BackendResult<Option<String>> {
        self.read(|state| state.values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> BackendResult<()> {
        self.write(|state| {
            state.values.insert(key.to_string(), value.to_string());
        })
    }

    fn delete(&self, key: &str) -> BackendResult<bool> {
        self.write(|state| {
            let value = state.values.remove(key).is_some();
            let set = state.sets.remove(key).is_some();
            value || set
        })
    }

    fn exists(&self, key: &str) -> BackendResult<bool> {
        self.read(|state| state.values.contains_key(key) || state.sets.contains_key(key))
    }

    fn set_add(&self, key: &str, member: &str) -> BackendResult<()> {
        self.write(|state| {
            state
                .sets
                .entry(key.to_string())
                .or_default()
                .insert(member.to_string());
        })
    }

    fn set_remove(&self, key: &str, member: &str) -> BackendResult<()> {
        self.write(|state| {
            if let Some(members) = state.sets.get_mut(key) {
                members.remove(member);
                if members.is_empty() {
                    state.sets.remove(key);
                }
            }
        })
    }

    fn set_members(&self, key: &str) -> BackendResult<Vec<String>> {
        self.read(|state| {
            state
                .sets
                .get(key)
                .map(|members| members.iter().cloned().collect())
                .unwrap_or_default()
        })
    }

    fn keys_with_prefix(&self, prefix: &str) -> BackendResult<Vec<String>> {
        self.read(|state| {
            let keys: BTreeSet<&String> = state
                .values
                .keys()
                .chain(state.sets.keys())
                .filter(|key| key.starts_with(prefix))
                .collect();
            keys.into_iter().cloned().collect()
        })
    }
}
