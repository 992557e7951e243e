//! # Draft Store
//!
//! Open invoice drafts, keyed by a server-issued UUID.
//!
//! ## Thread Safety
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Draft Store Operations                               │
//! │                                                                         │
//! │  Request                    Store call              Lock held for      │
//! │  ───────                    ──────────              ─────────────      │
//! │                                                                         │
//! │  POST /drafts ────────────► insert() ─────────────► evict idle,        │
//! │                                                     map.insert         │
//! │  POST .../lines ──────────► with_draft_mut() ─────► draft.add_stock    │
//! │  GET /drafts/{id} ────────► with_draft() ─────────► totals snapshot    │
//! │  POST .../commit ─────────► checkout() ───────────► map.remove         │
//! │                               (lock released)                           │
//! │                             db.bills().commit(..).await                 │
//! │                             ok:  complete()   draft gone               │
//! │                             err: drop guard ──────► map.insert (back)  │
//! │                                                                         │
//! │  NOTE: the lock is never held across an .await.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! While a draft is checked out it is invisible: a second commit or an edit
//! of the same draft gets "not found" instead of racing the first commit.
//!
//! Drafts abandoned by their client are dropped once idle for longer than
//! the store's timeout. Eviction runs whenever a new draft is inserted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::debug;
use uuid::Uuid;

use bahi_core::InvoiceDraft;

/// Idle time after which an untouched draft may be evicted.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(8 * 60 * 60);

#[derive(Debug)]
struct Entry {
    draft: InvoiceDraft,
    touched_at: Instant,
}

impl Entry {
    fn new(draft: InvoiceDraft) -> Self {
        Entry {
            draft,
            touched_at: Instant::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DraftStore {
    drafts: Arc<Mutex<HashMap<Uuid, Entry>>>,
    idle_timeout: Duration,
}

impl Default for DraftStore {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_TIMEOUT)
    }
}

impl DraftStore {
    pub fn new(idle_timeout: Duration) -> Self {
        DraftStore {
            drafts: Arc::default(),
            idle_timeout,
        }
    }

    /// Stores `draft` under a fresh ID, first dropping idle drafts.
    pub fn insert(&self, draft: InvoiceDraft) -> Uuid {
        let id = Uuid::new_v4();
        let mut drafts = self.lock();
        evict_idle(&mut drafts, Instant::now(), self.idle_timeout);
        drafts.insert(id, Entry::new(draft));
        id
    }

    /// A copy of the draft.
    pub fn get(&self, id: Uuid) -> Option<InvoiceDraft> {
        self.with_draft(id, InvoiceDraft::clone)
    }

    /// Runs `f` with read access to the draft; `None` if it does not exist.
    pub fn with_draft<F, R>(&self, id: Uuid, f: F) -> Option<R>
    where
        F: FnOnce(&InvoiceDraft) -> R,
    {
        let mut drafts = self.lock();
        drafts.get_mut(&id).map(|entry| {
            entry.touched_at = Instant::now();
            f(&entry.draft)
        })
    }

    /// Runs `f` with write access to the draft; `None` if it does not exist.
    pub fn with_draft_mut<F, R>(&self, id: Uuid, f: F) -> Option<R>
    where
        F: FnOnce(&mut InvoiceDraft) -> R,
    {
        let mut drafts = self.lock();
        drafts.get_mut(&id).map(|entry| {
            entry.touched_at = Instant::now();
            f(&mut entry.draft)
        })
    }

    pub fn remove(&self, id: Uuid) -> Option<InvoiceDraft> {
        self.lock().remove(&id).map(|entry| entry.draft)
    }

    /// Takes the draft out of the store until the returned guard is
    /// completed or dropped.
    pub fn checkout(&self, id: Uuid) -> Option<CheckedOutDraft> {
        let entry = self.lock().remove(&id)?;
        Some(CheckedOutDraft {
            store: self.clone(),
            id,
            draft: entry.draft,
            completed: false,
        })
    }

    /// Drops drafts untouched for longer than the idle timeout as of `now`.
    /// Returns how many were dropped.
    pub fn evict_idle(&self, now: Instant) -> usize {
        evict_idle(&mut self.lock(), now, self.idle_timeout)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Poisoning is ignored: every mutation is a single ledger call.
    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Entry>> {
        self.drafts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn evict_idle(drafts: &mut HashMap<Uuid, Entry>, now: Instant, idle_timeout: Duration) -> usize {
    let before = drafts.len();
    drafts.retain(|_, entry| now.saturating_duration_since(entry.touched_at) < idle_timeout);

    let evicted = before - drafts.len();
    if evicted > 0 {
        debug!(evicted, remaining = drafts.len(), "Evicted idle drafts");
    }
    evicted
}

/// A draft taken out of its store for committing.
///
/// Dropping the guard puts the draft back under the same ID, so any early
/// return or failed commit leaves the draft editable. [`Self::complete`]
/// discards it instead.
#[derive(Debug)]
pub struct CheckedOutDraft {
    store: DraftStore,
    id: Uuid,
    draft: InvoiceDraft,
    completed: bool,
}

impl CheckedOutDraft {
    pub fn draft(&self) -> &InvoiceDraft {
        &self.draft
    }

    /// The draft became a bill; do not put it back.
    pub fn complete(mut self) {
        self.completed = true;
    }
}

impl Drop for CheckedOutDraft {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        self.store
            .lock()
            .insert(self.id, Entry::new(self.draft.clone()));
        debug!(id = %self.id, "Draft returned to store");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bahi_core::types::{BillType, InvoiceMeta};

    fn draft() -> InvoiceDraft {
        InvoiceDraft::new(InvoiceMeta::new("INV-0001", BillType::IntraState), true)
    }

    #[test]
    fn test_insert_mutate_remove() {
        let store = DraftStore::default();
        let id = store.insert(draft());
        assert_eq!(store.len(), 1);

        store
            .with_draft_mut(id, |d| d.meta.reverse_charge = true)
            .unwrap();
        assert!(store.with_draft(id, |d| d.meta.reverse_charge).unwrap());

        assert!(store.remove(id).is_some());
        assert!(store.is_empty());
        assert!(store.with_draft(id, |_| ()).is_none());
    }

    #[test]
    fn test_clones_share_drafts() {
        let store = DraftStore::default();
        let other = store.clone();
        let id = store.insert(draft());
        assert!(other.get(id).is_some());
    }

    #[test]
    fn test_idle_drafts_evicted() {
        let store = DraftStore::new(Duration::from_secs(60));
        store.insert(draft());
        store.insert(draft());

        assert_eq!(store.evict_idle(Instant::now()), 0);
        assert_eq!(store.len(), 2);

        assert_eq!(store.evict_idle(Instant::now() + Duration::from_secs(120)), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn test_insert_drops_expired_drafts() {
        // With no idle allowance every older draft is expired by the next insert.
        let store = DraftStore::new(Duration::ZERO);
        let first = store.insert(draft());
        let second = store.insert(draft());

        assert_eq!(store.len(), 1);
        assert!(store.get(first).is_none());
        assert!(store.get(second).is_some());
    }

    #[test]
    fn test_checkout_hides_draft_until_dropped() {
        let store = DraftStore::default();
        let id = store.insert(draft());

        let checked_out = store.checkout(id).unwrap();
        assert_eq!(checked_out.draft().meta.bill_no, "INV-0001");
        assert!(store.get(id).is_none());
        assert!(store.checkout(id).is_none());

        drop(checked_out);
        assert!(store.get(id).is_some());

        store.checkout(id).unwrap().complete();
        assert!(store.get(id).is_none());
        assert!(store.is_empty());
    }
}
