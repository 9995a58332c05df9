// Copyright 2017 The Ray Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The object registry: `local_objects` plus the auxiliary tables that
//! don't collapse into the per-id residence tag (`url_refcount`,
//! `pending_restore`, `pending_deletion`, `delete_queue`).
//!
//! Every registered id is in exactly one [`Residence`] variant by
//! construction, since `objects` is keyed by `ObjectId` with one
//! `Residence` per entry — this is how invariant I1 is enforced.

use crate::collaborators::RestoreCallback;
use crate::types::{LocalObjectInfo, ObjectRecord, PendingDeletion, PinnedBuffer, Residence};
use crate::url::ObjectUrl;
use ray_common::ObjectId;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

#[derive(Default)]
pub struct Registry {
    objects: HashMap<ObjectId, ObjectRecord>,
    /// Insertion order of ids currently Pinned; entries for ids that have
    /// since left Pinned are pruned on the next scan.
    pinned_order: VecDeque<ObjectId>,
    pinned_bytes: u64,
    url_refcount: HashMap<String, u64>,
    /// In-flight restores, keyed by id, holding the one caller callback
    /// that actually dispatched the RPC. A duplicate request while an
    /// entry is present is dropped by the caller per dedup semantics —
    /// there is never more than one callback to invoke per id.
    pending_restore: HashMap<ObjectId, RestoreCallback>,
    pending_deletion: HashSet<ObjectId>,
    delete_queue: VecDeque<PendingDeletion>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `pinned_bytes`: the sum of sizes over `pinned ∪ pending_spill`
    /// (I2), a.k.a. "primary bytes".
    pub fn pinned_bytes(&self) -> u64 {
        self.pinned_bytes
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn info(&self, id: &ObjectId) -> Option<&LocalObjectInfo> {
        self.objects.get(id).map(|r| &r.info)
    }

    pub fn is_pinned(&self, id: &ObjectId) -> bool {
        self.objects.get(id).map_or(false, |r| r.residence.is_pinned())
    }

    pub fn is_pending_spill(&self, id: &ObjectId) -> bool {
        self.objects
            .get(id)
            .map_or(false, |r| r.residence.is_pending_spill())
    }

    pub fn is_spilled(&self, id: &ObjectId) -> bool {
        self.objects.get(id).map_or(false, |r| r.residence.is_spilled())
    }

    pub fn spilled_url(&self, id: &ObjectId) -> Option<&ObjectUrl> {
        match self.objects.get(id).map(|r| &r.residence) {
            Some(Residence::Spilled(url)) => Some(url),
            _ => None,
        }
    }

    pub fn has_spilled_objects(&self) -> bool {
        self.objects.values().any(|r| r.residence.is_spilled())
    }

    /// Ids currently Pinned, oldest-pinned first. Used by the spill
    /// planner, which selects in insertion order.
    pub fn pinned_ids_in_order(&mut self) -> Vec<ObjectId> {
        self.pinned_order
            .retain(|id| self.objects.get(id).map_or(false, |r| r.residence.is_pinned()));
        self.pinned_order.iter().cloned().collect()
    }

    /// Install `id` as Pinned with `info` and `buffer`. Returns `true` if
    /// this was a fresh insertion; `false` if `id` was already present in
    /// any residence, in which case `buffer` is dropped and the existing
    /// record is untouched (Pin's duplicate-pin idempotency rule).
    pub fn pin(&mut self, id: ObjectId, info: LocalObjectInfo, buffer: PinnedBuffer) -> bool {
        if self.objects.contains_key(&id) {
            return false;
        }
        self.pinned_bytes += buffer.size();
        self.pinned_order.push_back(id.clone());
        self.objects.insert(
            id,
            ObjectRecord {
                info,
                residence: Residence::Pinned(Arc::new(buffer)),
            },
        );
        true
    }

    /// Move `id` from Pinned to PendingSpill, returning the clone of its
    /// buffer handle to hand to the I/O worker. Panics if `id` isn't
    /// currently Pinned — callers must check eligibility first.
    pub fn begin_spill(&mut self, id: &ObjectId) -> Arc<PinnedBuffer> {
        let record = self.objects.get_mut(id).expect("begin_spill on unknown id");
        let buffer = match &record.residence {
            Residence::Pinned(buffer) => buffer.clone(),
            _ => panic!("begin_spill called on an id that is not Pinned"),
        };
        record.residence = Residence::PendingSpill(buffer.clone());
        buffer
    }

    /// Roll a PendingSpill id back to Pinned, e.g. after a failed spill
    /// RPC.
    pub fn abort_spill(&mut self, id: &ObjectId) {
        let record = self.objects.get_mut(id).expect("abort_spill on unknown id");
        let buffer = match &record.residence {
            Residence::PendingSpill(buffer) => buffer.clone(),
            _ => panic!("abort_spill called on an id that is not PendingSpill"),
        };
        record.residence = Residence::Pinned(buffer);
        if !self.pinned_order.contains(id) {
            self.pinned_order.push_back(id.clone());
        }
    }

    /// Complete a spill: PendingSpill -> Spilled, recording the url and
    /// incrementing its base-url refcount. The registry's buffer handle
    /// is dropped here; the local copy is released once the I/O worker's
    /// clone drops too.
    pub fn complete_spill(&mut self, id: &ObjectId, url: ObjectUrl) {
        let record = self.objects.get_mut(id).expect("complete_spill on unknown id");
        let buffer = match &record.residence {
            Residence::PendingSpill(buffer) => buffer.clone(),
            _ => panic!("complete_spill called on an id that is not PendingSpill"),
        };
        record.residence = Residence::Spilled(url.clone());
        self.pinned_bytes -= buffer.size();
        *self.url_refcount.entry(url.base_url.clone()).or_insert(0) += 1;
    }

    pub fn url_refcount(&self, base_url: &str) -> u64 {
        self.url_refcount.get(base_url).copied().unwrap_or(0)
    }

    /// Decrement `base_url`'s refcount, removing the entry entirely once
    /// it reaches zero (I3: a base-url with zero refcount must not
    /// appear in the table). Returns the refcount after the decrement.
    fn decrement_url_refcount(&mut self, base_url: &str) -> u64 {
        let Some(count) = self.url_refcount.get_mut(base_url) else {
            return 0;
        };
        *count -= 1;
        let remaining = *count;
        if remaining == 0 {
            self.url_refcount.remove(base_url);
        }
        remaining
    }

    pub fn set_freed(&mut self, id: &ObjectId) {
        if let Some(record) = self.objects.get_mut(id) {
            record.info.is_freed = true;
        }
    }

    pub fn is_freed(&self, id: &ObjectId) -> bool {
        self.objects.get(id).map_or(false, |r| r.info.is_freed)
    }

    /// Fully remove `id` from the registry, whatever its residence.
    /// Returns the removed record so callers can inspect what it was
    /// holding (e.g. to decide delete-queue enqueueing).
    pub fn remove(&mut self, id: &ObjectId) -> Option<ObjectRecord> {
        let record = self.objects.remove(id)?;
        match &record.residence {
            Residence::Pinned(buffer) | Residence::PendingSpill(buffer) => {
                self.pinned_bytes -= buffer.size();
            }
            Residence::Spilled(_) => {}
        }
        self.pinned_order.retain(|pinned_id| pinned_id != id);
        Some(record)
    }

    /// Release a Spilled id's url_refcount share (owner eviction path).
    /// Returns the refcount remaining for that base-url after the
    /// decrement, so the caller can decide whether to enqueue a delete.
    pub fn release_spilled_share(&mut self, base_url: &str) -> u64 {
        self.decrement_url_refcount(base_url)
    }

    // --- pending_restore: dedup in-flight restores ---

    /// Registers `id` as restoring and stakes the caller's `callback` to
    /// be invoked on completion. Returns `false` without storing
    /// anything if a restore for `id` is already in flight — the caller
    /// is expected to retry later, per dedup semantics.
    pub fn begin_restore(&mut self, id: ObjectId, callback: RestoreCallback) -> bool {
        if self.pending_restore.contains_key(&id) {
            return false;
        }
        self.pending_restore.insert(id, callback);
        true
    }

    pub fn is_restoring(&self, id: &ObjectId) -> bool {
        self.pending_restore.contains_key(id)
    }

    /// Clears `id`'s in-flight state and hands back its stashed
    /// callback, for the caller to invoke with the final result.
    pub fn end_restore(&mut self, id: &ObjectId) -> Option<RestoreCallback> {
        self.pending_restore.remove(id)
    }

    // --- pending_deletion: buffered owner-eviction notices for ids
    // released while Pinned, so the plasma store's subsequent delete
    // notification is expected and silently absorbed ---

    pub fn mark_pending_deletion(&mut self, id: ObjectId) {
        self.pending_deletion.insert(id);
    }

    pub fn object_pending_deletion(&self, id: &ObjectId) -> bool {
        self.pending_deletion.contains(id)
    }

    // --- delete_queue: base-url deletions awaiting an I/O worker ---

    pub fn enqueue_deletion(&mut self, base_url: String, retries_left: u32) {
        self.delete_queue.push_back(PendingDeletion { base_url, retries_left });
    }

    pub fn pop_deletion_batch(&mut self, max_batch: usize) -> Vec<PendingDeletion> {
        let mut batch = Vec::new();
        for _ in 0..max_batch {
            match self.delete_queue.pop_front() {
                Some(entry) => batch.push(entry),
                None => break,
            }
        }
        batch
    }

    pub fn requeue_deletion(&mut self, entry: PendingDeletion) {
        self.delete_queue.push_front(entry);
    }

    pub fn delete_queue_len(&self) -> usize {
        self.delete_queue.len()
    }
}
