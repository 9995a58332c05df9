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

//! Shared no-op/fake collaborators for unit tests across this crate's
//! modules. Integration tests under `tests/` bring their own, fuller
//! fakes instead, since they only see this crate's public API.
#![cfg(test)]

use crate::collaborators::{
    DeleteCallback, IoWorkerPool, ObjectDirectory, OwnerClientPool, PubSubSubscriber, RestoreCallback,
    SpillCallback, SpillabilityPredicate,
};
use crate::config::LocalObjectManagerConfig;
use crate::error::LomResult;
use crate::manager::LocalObjectManager;
use crate::types::{OwnerAddress, PinnedBuffer};
use crate::url::ObjectUrl;
use ray_common::{NodeId, ObjectId, RayId, WorkerId};

pub struct NoopIoWorkerPool;
impl IoWorkerPool for NoopIoWorkerPool {
    fn spill_objects(
        &mut self,
        _ids: Vec<ObjectId>,
        _buffers: Vec<std::sync::Arc<PinnedBuffer>>,
        _callback: SpillCallback,
    ) {
    }
    fn restore_object(&mut self, _url: ObjectUrl, _id: ObjectId, _callback: RestoreCallback) {}
    fn delete_spilled_objects(&mut self, _base_urls: Vec<String>, _callback: DeleteCallback) {}
}

pub struct NoopOwnerClientPool;
impl OwnerClientPool for NoopOwnerClientPool {
    fn wait_for_ref_removed(
        &mut self,
        _owner: &OwnerAddress,
        _id: ObjectId,
        _generator_id: Option<ObjectId>,
        _callback: Box<dyn FnOnce() + Send>,
    ) {
    }

    fn add_spilled_url(
        &mut self,
        _owner: &OwnerAddress,
        _id: ObjectId,
        _url: &ObjectUrl,
        _node_id: NodeId,
        _callback: Box<dyn FnOnce(LomResult<()>) + Send>,
    ) {
    }
}

pub struct NoopPubSubSubscriber;
impl PubSubSubscriber for NoopPubSubSubscriber {
    fn subscribe(
        &mut self,
        _owner: &OwnerAddress,
        _id: ObjectId,
        _on_message: Box<dyn Fn() + Send>,
        _on_failure: Box<dyn Fn() + Send>,
    ) {
    }

    fn unsubscribe(&mut self, _owner: &OwnerAddress, _id: ObjectId) {}
}

pub struct NoopObjectDirectory;
impl ObjectDirectory for NoopObjectDirectory {
    fn report_object_spilled(&mut self, _id: ObjectId, _node_id: NodeId, _url: &ObjectUrl) {}
    fn report_object_freed(&mut self, _ids: &[ObjectId]) {}
}

pub struct AlwaysSpillable;
impl SpillabilityPredicate for AlwaysSpillable {
    fn is_spillable(&self, _id: ObjectId) -> bool {
        true
    }
}

pub fn test_owner() -> OwnerAddress {
    OwnerAddress {
        worker_id: WorkerId::from_random(),
        ip: "127.0.0.1".to_string(),
        port: 1234,
        pid: 7,
    }
}

pub fn test_buffer(size: usize) -> PinnedBuffer {
    PinnedBuffer::new(ray_object_manager::Allocation::new(
        std::ptr::null_mut(),
        size,
        -1,
        0,
        0,
        0,
        false,
    ))
}

pub type NoopManager =
    LocalObjectManager<NoopIoWorkerPool, NoopOwnerClientPool, NoopPubSubSubscriber, NoopObjectDirectory, AlwaysSpillable>;

pub fn noop_manager() -> NoopManager {
    manager_with_config(LocalObjectManagerConfig::default())
}

pub fn manager_with_config(config: LocalObjectManagerConfig) -> NoopManager {
    LocalObjectManager::new(
        config,
        NodeId::from_random(),
        NoopIoWorkerPool,
        NoopOwnerClientPool,
        NoopPubSubSubscriber,
        NoopObjectDirectory,
        AlwaysSpillable,
        Box::new(|_ids| {}),
    )
}
