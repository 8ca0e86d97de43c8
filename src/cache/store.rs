//! Thread-safe page cache.
//!
//! A single mutex guards the entry table. It is never held across an
//! `.await`, and page slicing happens on a cloned `Arc` after the lock is
//! released.

use super::entry::{CacheEntry, CacheKey, EntrySummary, Page, Units};
use crate::config::CacheConfig;
use crate::error::ToolError;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Named single-entry positions, outside the keyed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheSlot {
    /// The most recently fetched method source.
    LastMethodSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreResult {
    pub cached: bool,
    pub total_units: usize,
}

/// Outcome of [`PageCache::store_if_large`]. Units that were not cached
/// are handed back so the caller can return them inline.
#[derive(Debug)]
pub enum Stored {
    Cached(Arc<CacheEntry>),
    Inline(Units),
}

impl Stored {
    pub fn result(&self) -> StoreResult {
        match self {
            Stored::Cached(entry) => StoreResult {
                cached: true,
                total_units: entry.total_units(),
            },
            Stored::Inline(units) => StoreResult {
                cached: false,
                total_units: units.len(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub threshold: usize,
    pub default_page_size: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub invalidations: u64,
    pub live: Vec<EntrySummary>,
    pub slots: HashMap<CacheSlot, EntrySummary>,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Arc<CacheEntry>>,
    /// created_at -> key, oldest first.
    order: BTreeMap<u64, String>,
    slots: HashMap<CacheSlot, Arc<CacheEntry>>,
    next_seq: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
    invalidations: u64,
}

impl Inner {
    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn remove(&mut self, key: &str) -> Option<Arc<CacheEntry>> {
        let entry = self.entries.remove(key)?;
        self.order.remove(&entry.created_at);
        Some(entry)
    }
}

#[derive(Clone)]
pub struct PageCache {
    config: CacheConfig,
    inner: Arc<Mutex<Inner>>,
}

impl PageCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Store `units` under `key` when there are at least `threshold` of
    /// them. Replaces any previous entry for the key.
    pub fn store_if_large(&self, key: CacheKey, units: Units, threshold: usize) -> Stored {
        let total_units = units.len();
        if total_units < threshold {
            debug!(key = %key, total_units, threshold, "Below threshold, not cached");
            return Stored::Inline(units);
        }

        let mut inner = self.lock();
        let id = key.as_str().to_string();
        inner.remove(&id);
        let seq = inner.next_seq();
        let entry = Arc::new(CacheEntry::new(key, units, seq));
        inner.entries.insert(id.clone(), Arc::clone(&entry));
        inner.order.insert(seq, id.clone());

        while inner.entries.len() > self.config.max_entries {
            let Some((_, oldest)) = inner.order.pop_first() else {
                break;
            };
            inner.entries.remove(&oldest);
            inner.evictions += 1;
            debug!(key = %oldest, "Evicted cache entry");
        }
        debug!(key = %id, total_units, "Cached payload");

        Stored::Cached(entry)
    }

    /// Current entry for `key`, if any.
    pub fn lookup(&self, key: &str) -> Option<Arc<CacheEntry>> {
        let mut inner = self.lock();
        let entry = inner.entries.get(key).cloned();
        match entry {
            Some(_) => inner.hits += 1,
            None => inner.misses += 1,
        }
        entry
    }

    pub fn get_page(
        &self,
        key: &str,
        page_index: usize,
        page_size: usize,
    ) -> Result<Page, ToolError> {
        validate_page(page_index, page_size)?;
        let entry = self
            .lookup(key)
            .ok_or_else(|| ToolError::NotFound(format!("no cached entry for key '{key}'")))?;
        Ok(entry.page(page_index, page_size))
    }

    /// Remove the entry for `key`. Returns whether one existed.
    pub fn invalidate(&self, key: &str) -> bool {
        let mut inner = self.lock();
        let removed = inner.remove(key).is_some();
        if removed {
            inner.invalidations += 1;
            debug!(key, "Invalidated cache entry");
        }
        removed
    }

    /// Drop every entry and slot. Returns the number removed.
    pub fn clear(&self) -> usize {
        let mut inner = self.lock();
        let removed = inner.entries.len() + inner.slots.len();
        inner.entries.clear();
        inner.order.clear();
        inner.slots.clear();
        inner.invalidations += removed as u64;
        removed
    }

    /// Replace the contents of a slot, regardless of size.
    pub fn remember(&self, slot: CacheSlot, key: CacheKey, units: Units) -> usize {
        let mut inner = self.lock();
        let seq = inner.next_seq();
        let entry = Arc::new(CacheEntry::new(key, units, seq));
        let total = entry.total_units();
        inner.slots.insert(slot, entry);
        total
    }

    /// Empty a slot. Returns whether it held an entry.
    pub fn forget(&self, slot: CacheSlot) -> bool {
        self.lock().slots.remove(&slot).is_some()
    }

    pub fn slot_page(
        &self,
        slot: CacheSlot,
        page_index: usize,
        page_size: usize,
    ) -> Result<Page, ToolError> {
        validate_page(page_index, page_size)?;
        let entry = {
            let mut inner = self.lock();
            let entry = inner.slots.get(&slot).cloned();
            match entry {
                Some(_) => inner.hits += 1,
                None => inner.misses += 1,
            }
            entry
        };
        let entry = entry.ok_or_else(|| match slot {
            CacheSlot::LastMethodSource => {
                ToolError::NotFound("no method source has been fetched yet".to_string())
            }
        })?;
        Ok(entry.page(page_index, page_size))
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        let mut live: Vec<&Arc<CacheEntry>> = inner.entries.values().collect();
        live.sort_by_key(|e| e.created_at);
        CacheStats {
            entries: inner.entries.len(),
            capacity: self.config.max_entries,
            threshold: self.config.threshold,
            default_page_size: self.config.default_page_size,
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            invalidations: inner.invalidations,
            live: live.into_iter().map(|e| e.summary()).collect(),
            slots: inner
                .slots
                .iter()
                .map(|(slot, e)| (*slot, e.summary()))
                .collect(),
        }
    }
}

fn validate_page(page_index: usize, page_size: usize) -> Result<(), ToolError> {
    if page_index < 1 {
        return Err(ToolError::invalid("page_index must be at least 1"));
    }
    if page_size < 1 {
        return Err(ToolError::invalid("page_size must be at least 1"));
    }
    Ok(())
}
