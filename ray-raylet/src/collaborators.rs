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

//! Trait boundaries to the local object manager's external collaborators:
//! the I/O worker pool, the owner RPC client pool, the pub/sub
//! subscriber, and the object directory. None of these are implemented
//! here — the gRPC transport, the worker process pool, and the
//! subscriber plumbing are all out of scope for this component.

use crate::error::LomResult;
use crate::types::{OwnerAddress, PinnedBuffer};
use crate::url::ObjectUrl;
use ray_common::{NodeId, ObjectId};
use std::sync::Arc;

pub type SpillCallback = Box<dyn FnOnce(LomResult<Vec<ObjectUrl>>) + Send>;
pub type RestoreCallback = Box<dyn FnOnce(LomResult<()>) + Send>;
pub type DeleteCallback = Box<dyn FnOnce(LomResult<()>) + Send>;

/// Acquires I/O workers and issues the three RPCs they perform. A single
/// pool backs both spill and restore traffic, since both draw from the
/// same bounded set of workers.
pub trait IoWorkerPool {
    /// Write `buffers` (one per id, same order) to external storage.
    /// The reply's URLs are in input order and may share a base-url,
    /// indicating the worker fused them into one file. Buffers are
    /// shared handles, not transferred ownership: the registry keeps its
    /// own clone so a failed spill needs no buffer handed back to roll
    /// to Pinned.
    fn spill_objects(&mut self, ids: Vec<ObjectId>, buffers: Vec<Arc<PinnedBuffer>>, callback: SpillCallback);

    /// Restore the bytes at `url` into the plasma store under `id`.
    fn restore_object(&mut self, url: ObjectUrl, id: ObjectId, callback: RestoreCallback);

    /// Delete every spilled file named by `base_urls`. Fan-out is
    /// intentionally a single worker since deletion is low priority.
    fn delete_spilled_objects(&mut self, base_urls: Vec<String>, callback: DeleteCallback);
}

/// Per-owner lazily-opened RPC client pool.
pub trait OwnerClientPool {
    /// One-shot wait for the owner's ref count on `id` to drop to zero.
    /// `on_ref_removed` fires on reply, on a pub/sub-detected
    /// disconnect, or on subscription failure — all three are treated
    /// identically as eviction.
    fn wait_for_ref_removed(
        &mut self,
        owner: &OwnerAddress,
        id: ObjectId,
        generator_id: Option<ObjectId>,
        on_ref_removed: Box<dyn FnOnce() + Send>,
    );

    /// Tell the owner a spilled object's URL, so it can answer future
    /// location queries.
    fn add_spilled_url(
        &mut self,
        owner: &OwnerAddress,
        id: ObjectId,
        url: &ObjectUrl,
        node_id: NodeId,
        callback: Box<dyn FnOnce(LomResult<()>) + Send>,
    );
}

/// Subscribes to an owner's "object evicted" channel for a given id.
pub trait PubSubSubscriber {
    fn subscribe(
        &mut self,
        owner: &OwnerAddress,
        id: ObjectId,
        on_message: Box<dyn Fn() + Send>,
        on_failure: Box<dyn Fn() + Send>,
    );

    fn unsubscribe(&mut self, owner: &OwnerAddress, id: ObjectId);
}

/// Cluster-wide mapping from ObjectIDs to the nodes holding copies.
pub trait ObjectDirectory {
    fn report_object_spilled(&mut self, id: ObjectId, node_id: NodeId, url: &ObjectUrl);
    fn report_object_freed(&mut self, ids: &[ObjectId]);
}

/// Whether an object is safe to spill right now (not referenced by a
/// running local worker).
pub trait SpillabilityPredicate {
    fn is_spillable(&self, id: ObjectId) -> bool;
}
