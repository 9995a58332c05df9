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

//! Pin & Subscription Manager.

use crate::collaborators::{IoWorkerPool, ObjectDirectory, OwnerClientPool, PubSubSubscriber, SpillabilityPredicate};
use crate::event::ReactorEvent;
use crate::manager::LocalObjectManager;
use crate::types::{LocalObjectInfo, OwnerAddress, PinnedBuffer};
use ray_common::ObjectId;

impl<W, O, S, D, P> LocalObjectManager<W, O, S, D, P>
where
    W: IoWorkerPool,
    O: OwnerClientPool,
    S: PubSubSubscriber,
    D: ObjectDirectory,
    P: SpillabilityPredicate,
{
    /// Atomically installs each id into `local_objects` as Pinned, takes
    /// ownership of its buffer, opens a pub/sub subscription to the
    /// owner for its eviction channel, and issues a one-shot
    /// `WaitForRefRemoved` RPC. On reply, disconnect, or subscription
    /// failure, `ReleaseFreedObject(id)` runs (via `process_events`).
    ///
    /// Duplicate pins of an already-present id are idempotent: the new
    /// buffer is dropped and no new subscription is opened.
    pub fn pin(
        &mut self,
        ids: Vec<ObjectId>,
        buffers: Vec<PinnedBuffer>,
        owner: OwnerAddress,
        generator_id: Option<ObjectId>,
    ) {
        assert_eq!(ids.len(), buffers.len(), "pin: ids and buffers must pair up");

        for (id, buffer) in ids.into_iter().zip(buffers.into_iter()) {
            let info = LocalObjectInfo::new(owner.clone(), generator_id.clone(), buffer.size());
            let freshly_pinned = self.registry.pin(id.clone(), info, buffer);
            if !freshly_pinned {
                continue;
            }

            let on_message = evicted_event(self.event_tx.clone(), id.clone());
            let on_failure = evicted_event(self.event_tx.clone(), id.clone());
            self.subscriber.subscribe(&owner, id.clone(), on_message, on_failure);

            let on_ref_removed = evicted_event_once(self.event_tx.clone(), id.clone());
            self.owner_clients
                .wait_for_ref_removed(&owner, id, generator_id.clone(), on_ref_removed);
        }
    }
}

fn evicted_event(tx: std::sync::mpsc::Sender<ReactorEvent>, id: ObjectId) -> Box<dyn Fn() + Send> {
    Box::new(move || {
        let _ = tx.send(ReactorEvent::ObjectEvicted { id: id.clone() });
    })
}

fn evicted_event_once(tx: std::sync::mpsc::Sender<ReactorEvent>, id: ObjectId) -> Box<dyn FnOnce() + Send> {
    Box::new(move || {
        let _ = tx.send(ReactorEvent::ObjectEvicted { id });
    })
}
