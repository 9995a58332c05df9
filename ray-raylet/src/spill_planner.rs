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

//! Spill Planner: decides which pinned objects to spill, and when.

use crate::collaborators::{IoWorkerPool, ObjectDirectory, OwnerClientPool, PubSubSubscriber, SpillabilityPredicate};
use crate::manager::LocalObjectManager;
use ray_common::ObjectId;
use std::sync::atomic::Ordering;

impl<W, O, S, D, P> LocalObjectManager<W, O, S, D, P>
where
    W: IoWorkerPool,
    O: OwnerClientPool,
    S: PubSubSubscriber,
    D: ObjectDirectory,
    P: SpillabilityPredicate,
{
    /// Selects a batch of eligible pinned objects and, if the batch is
    /// worth dispatching, hands it to the spill executor.
    ///
    /// Eligibility, in insertion order: not pending-spill already
    /// (guaranteed, since candidates are drawn from the pinned set),
    /// [`SpillabilityPredicate::is_spillable`], and not freed. Selection
    /// stops once either `min_spilling_size` bytes or
    /// `max_fused_object_count` candidates have been gathered.
    ///
    /// Returns `false` without dispatching anything when there are no
    /// active worker slots left, there is nothing eligible, or the
    /// gathered batch is both under-size and under-count — unless
    /// `spill_at_least_one` is set, in which case a single eligible
    /// object is spilled regardless.
    pub fn try_to_spill_objects(&mut self, spill_at_least_one: bool) -> bool {
        if self.num_active_workers.load(Ordering::SeqCst) >= self.config.max_active_workers {
            return false;
        }

        let candidates = self.select_spill_candidates();
        if candidates.is_empty() {
            return false;
        }

        let total_bytes: u64 = candidates
            .iter()
            .filter_map(|id| self.registry.info(id))
            .map(|info| info.object_size)
            .sum();
        let batch_meets_threshold =
            total_bytes >= self.config.min_spilling_size || candidates.len() >= self.config.max_fused_object_count;

        if !batch_meets_threshold {
            if !spill_at_least_one {
                return false;
            }
            self.spill_objects_internal(vec![candidates[0].clone()]);
            return true;
        }

        self.spill_objects_internal(candidates);
        true
    }

    /// Keeps dispatching spill batches until a round declines to spill
    /// anything, i.e. throughput is saturated or there is nothing left
    /// worth spilling.
    pub fn spill_object_up_to_max_throughput(&mut self) {
        while self.try_to_spill_objects(false) {}
    }

    fn select_spill_candidates(&mut self) -> Vec<ObjectId> {
        let mut candidates = Vec::new();
        let mut total_bytes = 0u64;
        for id in self.registry.pinned_ids_in_order() {
            if self.registry.is_freed(&id) {
                continue;
            }
            if !self.spillable.is_spillable(id.clone()) {
                continue;
            }
            total_bytes += self.registry.info(&id).map(|info| info.object_size).unwrap_or(0);
            candidates.push(id);
            if total_bytes >= self.config.min_spilling_size || candidates.len() >= self.config.max_fused_object_count {
                break;
            }
        }
        candidates
    }
}
