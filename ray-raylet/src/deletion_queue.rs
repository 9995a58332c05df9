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

//! Deletion Queue: `ProcessSpilledObjectsDeleteQueue`.
//!
//! Low-priority cleanup of base-urls whose refcount dropped to zero.
//! Draws one bounded batch per call, fires a single `delete_spilled_objects`
//! RPC for the batch, and on failure re-enqueues each entry with one fewer
//! retry, finally giving up and bumping `num_failed_deletion_requests`
//! once an entry's retries are exhausted.

use crate::collaborators::{
    DeleteCallback, IoWorkerPool, ObjectDirectory, OwnerClientPool, PubSubSubscriber, SpillabilityPredicate,
};
use crate::error::LomResult;
use crate::event::ReactorEvent;
use crate::manager::LocalObjectManager;
use crate::types::PendingDeletion;
use std::sync::atomic::Ordering;

/// Upper bound on how many base-urls one `delete_spilled_objects` RPC
/// covers. Deletion is background cleanup; there's no reason to let one
/// call balloon into an unbounded fan-out RPC.
pub const DELETE_BATCH_MAX: usize = 100;

impl<W, O, S, D, P> LocalObjectManager<W, O, S, D, P>
where
    W: IoWorkerPool,
    O: OwnerClientPool,
    S: PubSubSubscriber,
    D: ObjectDirectory,
    P: SpillabilityPredicate,
{
    pub fn process_spilled_objects_delete_queue(&mut self, max_batch: usize) {
        let batch = self.registry.pop_deletion_batch(max_batch);
        if batch.is_empty() {
            return;
        }

        let base_urls: Vec<String> = batch.iter().map(|entry| entry.base_url.clone()).collect();
        let tx = self.event_tx.clone();
        let callback_batch = batch.clone();
        let callback: DeleteCallback = Box::new(move |result| {
            let _ = tx.send(ReactorEvent::DeleteCompleted {
                batch: callback_batch,
                result,
            });
        });

        self.io_workers.delete_spilled_objects(base_urls, callback);
    }

    pub(crate) fn on_delete_completed(&mut self, batch: Vec<PendingDeletion>, result: LomResult<()>) {
        if result.is_ok() {
            return;
        }
        for entry in batch {
            if entry.retries_left > 0 {
                self.registry.requeue_deletion(PendingDeletion {
                    base_url: entry.base_url,
                    retries_left: entry.retries_left - 1,
                });
            } else {
                self.num_failed_deletion_requests.fetch_add(1, Ordering::SeqCst);
            }
        }
    }
}
