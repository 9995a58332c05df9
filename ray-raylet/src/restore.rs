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

//! Restore Coordinator: `AsyncRestoreSpilledObject`.
//!
//! A restore only ever reads a spilled object's bytes back into the
//! plasma store; it never touches the registry's residence bookkeeping
//! for `id`. The id stays Spilled from this manager's point of view
//! regardless of how many times it gets restored elsewhere, until its
//! owner eventually frees it. The only per-id state here is the
//! `pending_restore` dedup map, so a second concurrent restore request
//! for the same id is dropped — that caller is expected to retry once
//! the first has finished.

use crate::collaborators::{
    IoWorkerPool, ObjectDirectory, OwnerClientPool, PubSubSubscriber, RestoreCallback, SpillabilityPredicate,
};
use crate::error::LomResult;
use crate::event::ReactorEvent;
use crate::manager::LocalObjectManager;
use crate::url::ObjectUrl;
use ray_common::ObjectId;
use std::time::Instant;

impl<W, O, S, D, P> LocalObjectManager<W, O, S, D, P>
where
    W: IoWorkerPool,
    O: OwnerClientPool,
    S: PubSubSubscriber,
    D: ObjectDirectory,
    P: SpillabilityPredicate,
{
    /// Requests that `id`'s `size` bytes be read back from `url` into
    /// the plasma store. A restore already in flight for `id` drops
    /// this call entirely — `callback` is never invoked — per the
    /// dedup contract; the caller is expected to retry.
    pub fn async_restore_spilled_object(&mut self, id: ObjectId, size: u64, url: ObjectUrl, callback: RestoreCallback) {
        if !self.registry.begin_restore(id.clone(), callback) {
            return;
        }
        self.stats.add_pending_restore_bytes(size);

        let tx = self.event_tx.clone();
        let started_at = Instant::now();
        let callback_id = id.clone();
        let reactor_callback: RestoreCallback = Box::new(move |result| {
            let _ = tx.send(ReactorEvent::RestoreCompleted {
                id: callback_id,
                started_at,
                bytes: size,
                result,
            });
        });

        self.io_workers.restore_object(url, id, reactor_callback);
    }

    pub(crate) fn on_restore_completed(&mut self, id: ObjectId, started_at: Instant, bytes: u64, result: LomResult<()>) {
        let elapsed = started_at.elapsed();
        self.stats.sub_pending_restore_bytes(bytes);
        if result.is_ok() {
            self.stats.record_restore_success(bytes, elapsed);
        }

        if let Some(callback) = self.registry.end_restore(&id) {
            callback(result);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::tests_support::{noop_manager, test_buffer, test_owner};
    use crate::url::ObjectUrl;
    use ray_common::ObjectId;

    #[test]
    fn restore_dedups_concurrent_requests_for_the_same_id() {
        let mut manager = noop_manager();
        let id = ObjectId::from_random();
        manager.pin(vec![id.clone()], vec![test_buffer(500)], test_owner(), None);
        manager.registry.begin_spill(&id);
        manager
            .registry
            .complete_spill(&id, ObjectUrl::new("s3://x/f1", 0, 500));

        manager.async_restore_spilled_object(id.clone(), 500, ObjectUrl::new("s3://x/f1", 0, 500), Box::new(|_| {}));
        assert!(manager.registry.is_restoring(&id));

        // A second request for the same id while the first is in
        // flight is dropped outright: no second callback is stored.
        manager.async_restore_spilled_object(
            id.clone(),
            500,
            ObjectUrl::new("s3://x/f1", 0, 500),
            Box::new(|_| panic!("deduped request must never invoke its callback")),
        );
        manager.on_restore_completed(id.clone(), std::time::Instant::now(), 500, Ok(()));
    }

    #[test]
    fn completion_invokes_the_callback_and_never_touches_residence() {
        let mut manager = noop_manager();
        let id = ObjectId::from_random();
        manager.pin(vec![id.clone()], vec![test_buffer(500)], test_owner(), None);
        manager.registry.begin_spill(&id);
        manager
            .registry
            .complete_spill(&id, ObjectUrl::new("s3://x/f1", 0, 500));

        let invoked = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let invoked_clone = invoked.clone();
        manager.async_restore_spilled_object(
            id.clone(),
            500,
            ObjectUrl::new("s3://x/f1", 0, 500),
            Box::new(move |result| {
                assert!(result.is_ok());
                invoked_clone.store(true, std::sync::atomic::Ordering::SeqCst);
            }),
        );
        manager.on_restore_completed(id.clone(), std::time::Instant::now(), 500, Ok(()));
        assert!(!manager.registry.is_restoring(&id));
        assert!(manager.registry.is_spilled(&id), "restore never re-pins");
        assert!(invoked.load(std::sync::atomic::Ordering::SeqCst));
    }
}
