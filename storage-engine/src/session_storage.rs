use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use folio::ports::SessionStorage;
use shared::{Error, Result};
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-process [`SessionStorage`] that lives as long as the value does.
///
/// With a quota set, a write that would push the stored key and value bytes
/// past it fails with [`Error::QuotaExceeded`] and leaves the storage untouched,
/// the way a full browser `sessionStorage` rejects `setItem`.
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    items: DashMap<String, String>,
    used: AtomicUsize,
    quota: Option<usize>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            quota: Some(quota),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn used_bytes(&self) -> usize {
        self.used.load(Ordering::Relaxed)
    }
}

impl SessionStorage for MemorySessionStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).map(|v| v.value().clone()))
    }

    fn set_item(&self, key: &str, value: String) -> Result<()> {
        let entry = self.items.entry(key.to_string());
        let previous = match &entry {
            Entry::Occupied(e) => key.len() + e.get().len(),
            Entry::Vacant(_) => 0,
        };
        let needed = key.len() + value.len();

        if let Some(quota) = self.quota {
            let after = self.used_bytes() - previous + needed;
            if after > quota {
                return Err(Error::QuotaExceeded { needed, quota });
            }
        }

        self.used.fetch_add(needed, Ordering::Relaxed);
        self.used.fetch_sub(previous, Ordering::Relaxed);
        entry.insert(value);
        Ok(())
    }
}
