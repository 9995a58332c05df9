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

//! Core value types shared across the local object manager's components.

use crate::url::ObjectUrl;
use ray_common::{NodeId, ObjectId, WorkerId};
use ray_object_manager::Allocation;
use std::sync::Arc;

/// Sufficient to open an RPC client and a pub/sub subscription to the
/// worker that owns (created) an object.
#[derive(Debug, Clone)]
pub struct OwnerAddress {
    pub worker_id: WorkerId,
    pub ip: String,
    pub port: u16,
    pub pid: u32,
}

/// An opaque, owned handle to an object's bytes in the local plasma
/// store. The local object manager never inspects the contents; it only
/// moves ownership between its residence states and eventually hands it
/// back to an I/O worker or releases it.
#[derive(Debug)]
pub struct PinnedBuffer(pub Allocation);

impl PinnedBuffer {
    pub fn new(allocation: Allocation) -> Self {
        Self(allocation)
    }

    pub fn size(&self) -> u64 {
        self.0.size() as u64
    }
}

/// Per-object bookkeeping record, independent of residence state.
#[derive(Debug, Clone)]
pub struct LocalObjectInfo {
    pub owner_address: OwnerAddress,
    /// Non-nil iff this object was dynamically produced inside a parent
    /// object's execution; the parent owner must then be notified so it
    /// can adopt the child into its ref count.
    pub generator_id: Option<ObjectId>,
    pub object_size: u64,
    /// Owner has confirmed out-of-scope, but physical release may be
    /// pending a concurrent spill.
    pub is_freed: bool,
}

impl LocalObjectInfo {
    pub fn new(owner_address: OwnerAddress, generator_id: Option<ObjectId>, object_size: u64) -> Self {
        Self {
            owner_address,
            generator_id,
            object_size,
            is_freed: false,
        }
    }
}

/// Which of the three residence states an object is currently in. Every
/// registered id is in exactly one of these by construction, since the
/// registry keys a single map by `ObjectId` with one `Residence` value
/// per entry.
///
/// Pinned and PendingSpill both hold an `Arc<PinnedBuffer>` rather than
/// an owned one: while a spill RPC is in flight, the I/O worker pool
/// holds its own clone of the same `Arc` to read the bytes, while the
/// registry keeps its clone so a failed spill can roll straight back to
/// Pinned without the buffer ever having to travel back across the RPC
/// boundary.
#[derive(Debug)]
pub enum Residence {
    Pinned(Arc<PinnedBuffer>),
    PendingSpill(Arc<PinnedBuffer>),
    Spilled(ObjectUrl),
}

impl Residence {
    pub fn is_pinned(&self) -> bool {
        matches!(self, Residence::Pinned(_))
    }

    pub fn is_pending_spill(&self) -> bool {
        matches!(self, Residence::PendingSpill(_))
    }

    pub fn is_spilled(&self) -> bool {
        matches!(self, Residence::Spilled(_))
    }
}

#[derive(Debug)]
pub struct ObjectRecord {
    pub info: LocalObjectInfo,
    pub residence: Residence,
}

/// One base-url awaiting physical deletion, carrying its own retry
/// budget so a failed batch can be re-enqueued independently of others.
#[derive(Debug, Clone)]
pub struct PendingDeletion {
    pub base_url: String,
    pub retries_left: u32,
}

/// A snapshot of the counters `FillObjectStoreStats` copies into a
/// statistics reply. Not a protobuf type since the gRPC transport is out
/// of scope here; callers convert it to whatever wire type they use.
#[derive(Debug, Clone, Default)]
pub struct ObjectStoreStatsReply {
    pub spilled_bytes_current: u64,
    pub spilled_bytes_total: u64,
    pub spilled_objects_total: u64,
    pub restored_bytes_total: u64,
    pub restored_objects_total: u64,
    pub restore_bytes_pending: u64,
    pub spill_time_total_s: f64,
    pub restore_time_total_s: f64,
    pub num_failed_deletion_requests: u64,
    pub pinned_bytes: u64,
}

/// Handle to the narrow set of counters readable from the plasma store's
/// own thread, without locking the rest of the local object manager.
#[derive(Clone)]
pub struct LocalObjectManagerHandle {
    pub(crate) num_active_workers: std::sync::Arc<std::sync::atomic::AtomicI64>,
    pub(crate) num_failed_deletion_requests: std::sync::Arc<std::sync::atomic::AtomicU64>,
}

impl LocalObjectManagerHandle {
    pub fn is_spilling_in_progress(&self) -> bool {
        self.num_active_workers.load(std::sync::atomic::Ordering::SeqCst) > 0
    }

    pub fn num_failed_deletion_requests(&self) -> u64 {
        self.num_failed_deletion_requests
            .load(std::sync::atomic::Ordering::SeqCst)
    }
}

/// `NodeId` of the node the local object manager runs on, used to tag
/// objects it spilled to its own local filesystem.
pub type LocalNodeId = NodeId;
