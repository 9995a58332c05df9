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

//! Spill Executor: dispatches the RPC the planner decided to make, and
//! reconciles the registry once it completes.

use crate::collaborators::{IoWorkerPool, ObjectDirectory, OwnerClientPool, PubSubSubscriber, SpillCallback, SpillabilityPredicate};
use crate::error::LomResult;
use crate::event::ReactorEvent;
use crate::manager::LocalObjectManager;
use crate::types::PinnedBuffer;
use crate::url::ObjectUrl;
use ray_common::ObjectId;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

impl<W, O, S, D, P> LocalObjectManager<W, O, S, D, P>
where
    W: IoWorkerPool,
    O: OwnerClientPool,
    S: PubSubSubscriber,
    D: ObjectDirectory,
    P: SpillabilityPredicate,
{
    /// Moves each id Pinned -> PendingSpill, claims a worker slot, and
    /// issues the fused `SpillObjects` RPC. Kept private: the only entry
    /// points into spilling are the planner's two public methods.
    pub(crate) fn spill_objects_internal(&mut self, ids: Vec<ObjectId>) {
        let buffers: Vec<Arc<PinnedBuffer>> = ids.iter().map(|id| self.registry.begin_spill(id)).collect();
        self.num_active_workers.fetch_add(1, Ordering::SeqCst);

        let tx = self.event_tx.clone();
        let started_at = Instant::now();
        let callback_ids = ids.clone();
        let callback: SpillCallback = Box::new(move |result| {
            let _ = tx.send(ReactorEvent::SpillCompleted {
                ids: callback_ids,
                started_at,
                result,
            });
        });

        self.io_workers.spill_objects(ids, buffers, callback);
    }

    pub(crate) fn on_spill_completed(&mut self, ids: Vec<ObjectId>, started_at: Instant, result: LomResult<Vec<ObjectUrl>>) {
        self.num_active_workers.fetch_sub(1, Ordering::SeqCst);
        let elapsed = started_at.elapsed();

        match result {
            Ok(urls) => {
                for (id, url) in ids.into_iter().zip(urls.into_iter()) {
                    self.finish_one_spilled_object(id, url, elapsed);
                }
            }
            Err(err) => {
                let failed_bytes: u64 = ids
                    .iter()
                    .filter_map(|id| self.registry.info(id).map(|info| info.object_size))
                    .sum();
                for id in &ids {
                    self.registry.abort_spill(id);
                }
                if self.stats.record_spill_failure(failed_bytes) {
                    tracing::error!(
                        failed_bytes,
                        cumulative_failed_spill_bytes = self.stats.cumulative_failed_spill_bytes,
                        "{err}"
                    );
                }
            }
        }

        self.spill_object_up_to_max_throughput();
    }

    fn finish_one_spilled_object(&mut self, id: ObjectId, url: ObjectUrl, elapsed: std::time::Duration) {
        let Some(info) = self.registry.info(&id) else {
            return;
        };
        let bytes = info.object_size;
        let owner = info.owner_address.clone();

        self.registry.complete_spill(&id, url.clone());
        self.stats.record_spill_success(bytes, elapsed);

        if self.registry.is_freed(&id) {
            // I4: freed during the spill window. The URL goes straight to
            // the deletion queue rather than being advertised to the
            // owner or the directory as a live spilled location.
            self.release_freed_object(id);
            return;
        }

        if self.config.is_external_storage_type_fs {
            self.object_directory
                .report_object_spilled(id.clone(), self.local_node_id.clone(), &url);
        }
        self.owner_clients.add_spilled_url(
            &owner,
            id.clone(),
            &url,
            self.local_node_id.clone(),
            Box::new(|_| {}),
        );
    }
}
