use crate::cache::CacheKey;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Default)]
struct KeySlot {
    latest: u64,
    pending: usize,
}

/// Hands out per-key sequence numbers so only the newest fetch of a key may
/// write its result.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    slots: Mutex<HashMap<CacheKey, KeySlot>>,
}

/// Proof that a fetch was started. Dropping it (completion, error or abort)
/// ends the fetch's pending state.
#[derive(Debug)]
pub struct Ticket {
    key: CacheKey,
    seq: u64,
    sequencer: Arc<RequestSequencer>,
}

impl RequestSequencer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn issue(self: &Arc<Self>, key: CacheKey) -> Ticket {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = slots.entry(key.clone()).or_default();
        slot.latest += 1;
        slot.pending += 1;
        Ticket {
            key,
            seq: slot.latest,
            sequencer: Arc::clone(self),
        }
    }

    pub fn is_pending(&self, key: &CacheKey) -> bool {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.get(key).is_some_and(|slot| slot.pending > 0)
    }

    /// Sequence number of the newest fetch issued for `key`, 0 if none.
    pub fn latest(&self, key: &CacheKey) -> u64 {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.get(key).map_or(0, |slot| slot.latest)
    }

    /// Advance every key covering `field_id` so fetches already in flight
    /// for it can no longer commit. Returns how many keys were advanced.
    pub fn supersede_field(&self, field_id: i64) -> usize {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let mut advanced = 0;
        for (_, slot) in slots.iter_mut().filter(|(key, _)| key.covers_field(field_id)) {
            slot.latest += 1;
            advanced += 1;
        }
        advanced
    }

    fn release(&self, key: &CacheKey) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = slots.get_mut(key) {
            slot.pending = slot.pending.saturating_sub(1);
        }
    }
}

impl Ticket {
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn is_current(&self) -> bool {
        self.sequencer.latest(&self.key) == self.seq
    }

    /// Run `write` only if no newer fetch of the same key has been issued.
    /// The sequencer stays locked while `write` runs, so a newer fetch cannot
    /// slip in between the check and the write.
    pub fn commit<F: FnOnce()>(&self, write: F) -> bool {
        let slots = self
            .sequencer
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let current = slots.get(&self.key).is_some_and(|slot| slot.latest == self.seq);
        if current {
            write();
        }
        current
    }
}

impl Drop for Ticket {
    fn drop(&mut self) {
        self.sequencer.release(&self.key);
    }
}
