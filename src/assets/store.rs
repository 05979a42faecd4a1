//! Frame Store: cache of one fixed-length image sequence.
//!
//! The cache is keyed by [`SeqKey`] and replaced wholesale on key change:
//! `begin` bumps a generation, and deliveries carrying an older generation
//! are ignored, so a stale in-flight load can never flip the `loaded` flag
//! for the wrong key. `loaded` flips only when all N frames have completed
//! successfully; individually loaded frames stay renderable even when the
//! set as a whole never finishes.

use tracing::{debug, warn};

use crate::assets::source::{FrameDelivery, FrameRequest};
use crate::foundation::core::{FrameImage, FrameNo, SeqKey};

#[derive(Default)]
pub struct FrameStore {
    key: Option<SeqKey>,
    generation: u64,
    total: u32,
    slots: Vec<Option<FrameImage>>,
    loaded_count: u32,
    failed_count: u32,
}

impl FrameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start loading `total` frames for `key`, returning the requests to hand
    /// to a [`crate::assets::source::FrameSource`].
    ///
    /// Re-requesting the key that is already fully loaded is a no-op. Any
    /// other call replaces the cache wholesale and invalidates in-flight
    /// deliveries of the previous generation.
    pub fn begin(&mut self, key: SeqKey, total: u32) -> Vec<FrameRequest> {
        if self.key.as_ref() == Some(&key) && self.total == total && self.loaded() {
            debug!(%key, "frame set already loaded, keeping cache");
            return Vec::new();
        }

        self.generation += 1;
        self.total = total;
        self.slots = vec![None; total as usize];
        self.loaded_count = 0;
        self.failed_count = 0;
        self.key = Some(key.clone());

        (1..=total)
            .map(|frame| FrameRequest {
                key: key.clone(),
                frame,
                generation: self.generation,
            })
            .collect()
    }

    /// Apply one completion. Out-of-order arrival is fine; stale generations
    /// and mismatched keys are dropped.
    pub fn apply(&mut self, delivery: FrameDelivery) {
        if delivery.generation != self.generation || Some(&delivery.key) != self.key.as_ref() {
            debug!(key = %delivery.key, frame = delivery.frame, "dropping stale delivery");
            return;
        }
        if delivery.frame < 1 || delivery.frame > self.total {
            warn!(key = %delivery.key, frame = delivery.frame, "delivery frame out of range");
            return;
        }

        let slot = &mut self.slots[(delivery.frame - 1) as usize];
        if slot.is_some() {
            return;
        }
        match delivery.image {
            Some(img) => {
                *slot = Some(img);
                self.loaded_count += 1;
            }
            None => {
                self.failed_count += 1;
            }
        }
    }

    pub fn key(&self) -> Option<&SeqKey> {
        self.key.as_ref()
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    /// True once all N frames of the current key completed successfully.
    pub fn loaded(&self) -> bool {
        self.total > 0 && self.loaded_count == self.total
    }

    pub fn frame(&self, frame: FrameNo) -> Option<&FrameImage> {
        let idx = frame.get().checked_sub(1)? as usize;
        self.slots.get(idx)?.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_delivery(key: &SeqKey, frame: u32, generation: u64) -> FrameDelivery {
        FrameDelivery {
            key: key.clone(),
            frame,
            generation,
            image: FrameImage::solid(2, 2, [frame as u8, 0, 0, 255]).ok(),
        }
    }

    fn failed_delivery(key: &SeqKey, frame: u32, generation: u64) -> FrameDelivery {
        FrameDelivery {
            key: key.clone(),
            frame,
            generation,
            image: None,
        }
    }

    #[test]
    fn out_of_order_completion_flips_loaded_on_last() {
        let mut store = FrameStore::new();
        let key = SeqKey::card("s", "w");
        let reqs = store.begin(key.clone(), 3);
        assert_eq!(reqs.len(), 3);
        let generation = reqs[0].generation;

        store.apply(ok_delivery(&key, 3, generation));
        store.apply(ok_delivery(&key, 1, generation));
        assert!(!store.loaded());
        store.apply(ok_delivery(&key, 2, generation));
        assert!(store.loaded());
    }

    #[test]
    fn failure_keeps_loaded_false_but_frames_renderable() {
        let mut store = FrameStore::new();
        let key = SeqKey::card("s", "w");
        let generation = store.begin(key.clone(), 2)[0].generation;

        store.apply(ok_delivery(&key, 1, generation));
        store.apply(failed_delivery(&key, 2, generation));

        assert!(!store.loaded());
        assert!(store.frame(FrameNo::clamped(1, 2)).is_some());
        assert!(store.frame(FrameNo::clamped(2, 2)).is_none());
    }

    #[test]
    fn rekey_bumps_generation_and_drops_stale() {
        let mut store = FrameStore::new();
        let old_key = SeqKey::card("s", "old");
        let old_generation = store.begin(old_key.clone(), 1)[0].generation;

        let new_key = SeqKey::card("s", "new");
        let new_generation = store.begin(new_key.clone(), 1)[0].generation;
        assert!(new_generation > old_generation);

        // Stale completion from the old key must not count for the new one.
        store.apply(ok_delivery(&old_key, 1, old_generation));
        assert!(!store.loaded());

        store.apply(ok_delivery(&new_key, 1, new_generation));
        assert!(store.loaded());
    }

    #[test]
    fn rerequesting_loaded_key_is_a_noop() {
        let mut store = FrameStore::new();
        let key = SeqKey::card("s", "w");
        let generation = store.begin(key.clone(), 1)[0].generation;
        store.apply(ok_delivery(&key, 1, generation));
        assert!(store.loaded());

        assert!(store.begin(key, 1).is_empty());
        assert!(store.loaded());
    }

    #[test]
    fn out_of_range_delivery_is_dropped() {
        let mut store = FrameStore::new();
        let key = SeqKey::card("s", "w");
        let generation = store.begin(key.clone(), 2)[0].generation;
        store.apply(ok_delivery(&key, 9, generation));
        assert!(!store.loaded());
    }
}
