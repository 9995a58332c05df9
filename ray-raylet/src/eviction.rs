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

//! Owner Eviction Path: `ReleaseFreedObject`, reached once an owner's
//! ref count on an id has dropped to zero (reported via the one-shot
//! `WaitForRefRemoved` reply, a pub/sub eviction message, or a
//! subscription failure — all three arrive as the same
//! [`crate::event::ReactorEvent::ObjectEvicted`]).
//!
//! Behavior depends on the id's residence at the moment of eviction:
//!
//! - Pinned: removed outright and queued for a batched
//!   `report_object_freed` via the free flusher.
//! - PendingSpill: too late to cancel the in-flight RPC; only
//!   `is_freed` is set. [`crate::spill_executor`] checks this flag once
//!   the spill completes and synthesizes a second eviction call.
//! - Spilled: removed, its base-url's refcount is released, and a
//!   delete is enqueued once that refcount reaches zero (I3/I6).

use crate::collaborators::{IoWorkerPool, ObjectDirectory, OwnerClientPool, PubSubSubscriber, SpillabilityPredicate};
use crate::manager::LocalObjectManager;
use crate::types::Residence;
use ray_common::ObjectId;

impl<W, O, S, D, P> LocalObjectManager<W, O, S, D, P>
where
    W: IoWorkerPool,
    O: OwnerClientPool,
    S: PubSubSubscriber,
    D: ObjectDirectory,
    P: SpillabilityPredicate,
{
    /// Also reachable directly, for a raylet service handler that wants
    /// to force eviction without going through the pub/sub or
    /// `WaitForRefRemoved` path.
    pub fn release_freed_object(&mut self, id: ObjectId) {
        let Some(info) = self.registry.info(&id) else {
            return;
        };
        let owner = info.owner_address.clone();
        let bytes = info.object_size;
        self.subscriber.unsubscribe(&owner, id.clone());

        if self.registry.is_pending_spill(&id) {
            self.registry.set_freed(&id);
            return;
        }

        if self.registry.is_pinned(&id) {
            self.registry.mark_pending_deletion(id.clone());
            if self.registry.remove(&id).is_some() {
                self.free_flusher.accumulate(id);
            }
            return;
        }

        if let Some(record) = self.registry.remove(&id) {
            if let Residence::Spilled(url) = record.residence {
                self.stats.reduce_spilled_bytes_current(bytes);
                let remaining = self.registry.release_spilled_share(&url.base_url);
                if remaining == 0 {
                    self.registry.enqueue_deletion(url.base_url, self.config.spilled_object_delete_retries);
                }
            }
            self.free_flusher.accumulate(id);
        }
    }
}
