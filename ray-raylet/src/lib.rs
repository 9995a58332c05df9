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

//! A node-local shared-memory object store's local object manager:
//! pins objects against eviction while their owner holds a reference,
//! spills the coldest of them to external storage under memory
//! pressure, restores them back on demand, and reclaims both memory and
//! external storage once an owner frees them.
//!
//! [`LocalObjectManager`] is the entry point. It is deliberately not
//! `Sync`: every mutating method runs on the single thread that owns the
//! instance. Collaborators (I/O workers, owner RPC clients, pub/sub,
//! the cluster object directory) accept `'static + Send` callbacks that
//! may fire from other threads; rather than reach back into `&mut self`
//! directly, those callbacks post a [`event::ReactorEvent`] that
//! [`LocalObjectManager::process_events`] drains on the owning thread.

mod collaborators;
mod config;
mod deletion_queue;
mod error;
mod event;
mod eviction;
mod free_flusher;
mod manager;
mod pin;
mod registry;
mod restore;
mod spill_executor;
mod spill_planner;
mod stats;
mod types;
mod url;

#[cfg(test)]
mod tests_support;

pub use collaborators::{
    DeleteCallback, IoWorkerPool, ObjectDirectory, OwnerClientPool, PubSubSubscriber, RestoreCallback, SpillCallback,
    SpillabilityPredicate,
};
pub use config::{LocalObjectManagerConfig, DEFAULT_SPILLED_OBJECT_DELETE_RETRIES};
pub use deletion_queue::DELETE_BATCH_MAX;
pub use error::{LomError, LomResult};
pub use manager::LocalObjectManager;
pub use types::{
    LocalNodeId, LocalObjectInfo, LocalObjectManagerHandle, ObjectRecord, ObjectStoreStatsReply, OwnerAddress,
    PendingDeletion, PinnedBuffer, Residence,
};
pub use url::ObjectUrl;
