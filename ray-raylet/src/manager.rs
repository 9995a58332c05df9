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

//! The Local Object Manager: ties the registry, stats, and free flusher
//! together with the collaborators injected at construction.
//!
//! All mutating methods take `&mut self` and run on whatever single
//! thread owns the instance — there are no internal locks. The only
//! state shared across threads is obtained through [`handle`], which
//! hands back a small `Clone`-able struct backed by atomics.

use crate::collaborators::{IoWorkerPool, ObjectDirectory, OwnerClientPool, PubSubSubscriber, SpillabilityPredicate};
use crate::config::LocalObjectManagerConfig;
use crate::event::ReactorEvent;
use crate::free_flusher::FreeFlusher;
use crate::registry::Registry;
use crate::stats::Stats;
use crate::types::{LocalObjectManagerHandle, LocalNodeId};
use ray_common::ObjectId;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

pub struct LocalObjectManager<W, O, S, D, P>
where
    W: IoWorkerPool,
    O: OwnerClientPool,
    S: PubSubSubscriber,
    D: ObjectDirectory,
    P: SpillabilityPredicate,
{
    pub(crate) config: LocalObjectManagerConfig,
    pub(crate) local_node_id: LocalNodeId,
    pub(crate) registry: Registry,
    pub(crate) stats: Stats,
    pub(crate) free_flusher: FreeFlusher,
    pub(crate) num_active_workers: Arc<AtomicI64>,
    pub(crate) num_failed_deletion_requests: Arc<AtomicU64>,
    pub(crate) io_workers: W,
    pub(crate) owner_clients: O,
    pub(crate) subscriber: S,
    pub(crate) object_directory: D,
    pub(crate) spillable: P,
    /// Sending half handed to collaborator callbacks; cloned freely,
    /// `Send`, cheap. The manager drains the receiving half itself in
    /// [`Self::process_events`].
    pub(crate) event_tx: Sender<ReactorEvent>,
    pub(crate) event_rx: Receiver<ReactorEvent>,
}

impl<W, O, S, D, P> LocalObjectManager<W, O, S, D, P>
where
    W: IoWorkerPool,
    O: OwnerClientPool,
    S: PubSubSubscriber,
    D: ObjectDirectory,
    P: SpillabilityPredicate,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: LocalObjectManagerConfig,
        local_node_id: LocalNodeId,
        io_workers: W,
        owner_clients: O,
        subscriber: S,
        object_directory: D,
        spillable: P,
        on_objects_freed: Box<dyn Fn(Vec<ObjectId>) + Send + Sync>,
    ) -> Self {
        let free_flusher = FreeFlusher::new(
            config.free_objects_batch_size,
            config.free_objects_period_ms,
            on_objects_freed,
        );
        let (event_tx, event_rx) = mpsc::channel();
        Self {
            stats: Stats::new(config.verbose_spill_logs),
            registry: Registry::new(),
            free_flusher,
            num_active_workers: Arc::new(AtomicI64::new(0)),
            num_failed_deletion_requests: Arc::new(AtomicU64::new(0)),
            config,
            local_node_id,
            io_workers,
            owner_clients,
            subscriber,
            object_directory,
            spillable,
            event_tx,
            event_rx,
        }
    }

    /// Drains every re-entry event posted by collaborator callbacks so
    /// far and dispatches each to its handler. This is the reactor's
    /// "tick": callers invoke it after driving I/O (e.g. after polling
    /// the worker pool), never concurrently with other `&mut self`
    /// calls on this instance.
    pub fn process_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                ReactorEvent::ObjectEvicted { id } => self.release_freed_object(id),
                ReactorEvent::SpillCompleted { ids, started_at, result } => {
                    self.on_spill_completed(ids, started_at, result)
                }
                ReactorEvent::RestoreCompleted {
                    id,
                    started_at,
                    bytes,
                    result,
                } => self.on_restore_completed(id, started_at, bytes, result),
                ReactorEvent::DeleteCompleted { batch, result } => self.on_delete_completed(batch, result),
            }
        }
    }

    /// A cheap, `Clone`-able handle exposing only the two counters the
    /// plasma store thread is allowed to read.
    pub fn handle(&self) -> LocalObjectManagerHandle {
        LocalObjectManagerHandle {
            num_active_workers: self.num_active_workers.clone(),
            num_failed_deletion_requests: self.num_failed_deletion_requests.clone(),
        }
    }

    pub fn is_spilling_in_progress(&self) -> bool {
        self.num_active_workers.load(Ordering::SeqCst) > 0
    }

    pub fn num_failed_deletion_requests(&self) -> u64 {
        self.num_failed_deletion_requests.load(Ordering::SeqCst)
    }

    pub fn get_primary_bytes(&self) -> u64 {
        self.registry.pinned_bytes()
    }

    pub fn has_locally_spilled_objects(&self) -> bool {
        self.config.is_external_storage_type_fs && self.registry.has_spilled_objects()
    }

    pub fn get_local_spilled_object_url(&self, id: ObjectId) -> Option<String> {
        if !self.config.is_external_storage_type_fs {
            return None;
        }
        self.registry.spilled_url(&id).map(|url| url.to_string())
    }

    pub fn object_pending_deletion(&self, id: ObjectId) -> bool {
        self.registry.object_pending_deletion(&id)
    }

    /// Flushes accumulated freed-object ids iff the batch size or the
    /// flush period has been reached. Mirrors `FlushFreeObjects`; driven
    /// by whatever periodic tick the surrounding process uses.
    pub fn flush_free_objects(&mut self) {
        self.free_flusher.flush_free_objects();
    }

    pub fn debug_string(&self) -> String {
        format!(
            "LocalObjectManager:\n\
             - num objects tracked: {}\n\
             - pinned bytes: {}\n\
             - num active workers: {}/{}\n\
             - spilled bytes current: {}\n\
             - spilled objects total: {}\n\
             - restored objects total: {}\n\
             - num failed deletion requests: {}\n\
             - delete queue length: {}\n",
            self.registry.len(),
            self.registry.pinned_bytes(),
            self.num_active_workers.load(Ordering::SeqCst),
            self.config.max_active_workers,
            self.stats.spilled_bytes_current,
            self.stats.spilled_objects_total,
            self.stats.restored_objects_total,
            self.num_failed_deletion_requests.load(Ordering::SeqCst),
            self.registry.delete_queue_len(),
        )
    }

    pub fn fill_object_store_stats(&self) -> crate::types::ObjectStoreStatsReply {
        self.stats.fill(
            self.num_failed_deletion_requests.load(Ordering::SeqCst),
            self.registry.pinned_bytes(),
        )
    }
}
