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

//! Fuller fakes for the integration tests: unlike the crate-internal
//! no-op fakes, these record every call and let a test drive completion
//! (success or failure) at a time of its choosing, by handing back a
//! shared handle alongside the collaborator that was actually moved
//! into the manager.

#![allow(dead_code)]

use ray_common::{NodeId, ObjectId, RayId, WorkerId};
use ray_raylet::{
    DeleteCallback, IoWorkerPool, LomResult, ObjectDirectory, ObjectUrl, OwnerAddress, OwnerClientPool, PinnedBuffer,
    PubSubSubscriber, RestoreCallback, SpillCallback, SpillabilityPredicate,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

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

pub fn random_node() -> NodeId {
    NodeId::from_random()
}

/// Handle kept by the test while the matching collaborator struct is
/// moved into the manager. Both sides share the same `Arc<Mutex<_>>>`
/// state, so calls the manager makes are visible here, and callbacks
/// captured here can be invoked to simulate an RPC reply arriving.
#[derive(Clone)]
pub struct IoWorkerHandle {
    pub spill_calls: Arc<Mutex<Vec<(Vec<ObjectId>, Vec<Arc<PinnedBuffer>>)>>>,
    pub spill_callbacks: Arc<Mutex<Vec<SpillCallback>>>,
    pub restore_calls: Arc<Mutex<Vec<(ObjectUrl, ObjectId)>>>,
    pub restore_callbacks: Arc<Mutex<Vec<RestoreCallback>>>,
    pub delete_calls: Arc<Mutex<Vec<Vec<String>>>>,
    pub delete_callbacks: Arc<Mutex<Vec<DeleteCallback>>>,
}

pub struct RecordingIoWorkerPool {
    handle: IoWorkerHandle,
}

pub fn io_worker_pool() -> (RecordingIoWorkerPool, IoWorkerHandle) {
    let handle = IoWorkerHandle {
        spill_calls: Arc::new(Mutex::new(Vec::new())),
        spill_callbacks: Arc::new(Mutex::new(Vec::new())),
        restore_calls: Arc::new(Mutex::new(Vec::new())),
        restore_callbacks: Arc::new(Mutex::new(Vec::new())),
        delete_calls: Arc::new(Mutex::new(Vec::new())),
        delete_callbacks: Arc::new(Mutex::new(Vec::new())),
    };
    (
        RecordingIoWorkerPool {
            handle: handle.clone(),
        },
        handle,
    )
}

impl IoWorkerPool for RecordingIoWorkerPool {
    fn spill_objects(&mut self, ids: Vec<ObjectId>, buffers: Vec<Arc<PinnedBuffer>>, callback: SpillCallback) {
        self.handle.spill_calls.lock().unwrap().push((ids, buffers));
        self.handle.spill_callbacks.lock().unwrap().push(callback);
    }

    fn restore_object(&mut self, url: ObjectUrl, id: ObjectId, callback: RestoreCallback) {
        self.handle.restore_calls.lock().unwrap().push((url, id));
        self.handle.restore_callbacks.lock().unwrap().push(callback);
    }

    fn delete_spilled_objects(&mut self, base_urls: Vec<String>, callback: DeleteCallback) {
        self.handle.delete_calls.lock().unwrap().push(base_urls);
        self.handle.delete_callbacks.lock().unwrap().push(callback);
    }
}

impl IoWorkerHandle {
    pub fn spill_call_count(&self) -> usize {
        self.spill_calls.lock().unwrap().len()
    }

    /// Invokes the oldest not-yet-resolved spill callback.
    pub fn resolve_next_spill(&self, result: LomResult<Vec<ObjectUrl>>) {
        let callback = self.spill_callbacks.lock().unwrap().remove(0);
        callback(result);
    }

    pub fn restore_call_count(&self) -> usize {
        self.restore_calls.lock().unwrap().len()
    }

    pub fn resolve_next_restore(&self, result: LomResult<()>) {
        let callback = self.restore_callbacks.lock().unwrap().remove(0);
        callback(result);
    }

    pub fn delete_call_count(&self) -> usize {
        self.delete_calls.lock().unwrap().len()
    }

    pub fn resolve_next_delete(&self, result: LomResult<()>) {
        let callback = self.delete_callbacks.lock().unwrap().remove(0);
        callback(result);
    }
}

pub struct RecordingOwnerClientPool {
    handle: OwnerClientHandleInner,
}

/// `ref_removed_callbacks` can't derive `Clone` (it holds `FnOnce`
/// trait objects), so the pool and the test-side handle share a single
/// `Arc<Mutex<_>>` instead of two independently-clonable handles.
#[derive(Clone)]
struct OwnerClientHandleInner {
    spilled_urls: Arc<Mutex<Vec<(ObjectId, ObjectUrl, NodeId)>>>,
    ref_removed: Arc<Mutex<Vec<(ObjectId, Box<dyn FnOnce() + Send>)>>>,
}

pub struct OwnerClientTestHandle {
    inner: OwnerClientHandleInner,
}

pub fn owner_client_pool() -> (RecordingOwnerClientPool, OwnerClientTestHandle) {
    let inner = OwnerClientHandleInner {
        spilled_urls: Arc::new(Mutex::new(Vec::new())),
        ref_removed: Arc::new(Mutex::new(Vec::new())),
    };
    (
        RecordingOwnerClientPool { handle: inner.clone() },
        OwnerClientTestHandle { inner },
    )
}

impl OwnerClientPool for RecordingOwnerClientPool {
    fn wait_for_ref_removed(
        &mut self,
        _owner: &OwnerAddress,
        id: ObjectId,
        _generator_id: Option<ObjectId>,
        callback: Box<dyn FnOnce() + Send>,
    ) {
        self.handle.ref_removed.lock().unwrap().push((id, callback));
    }

    fn add_spilled_url(
        &mut self,
        _owner: &OwnerAddress,
        id: ObjectId,
        url: &ObjectUrl,
        node_id: NodeId,
        callback: Box<dyn FnOnce(LomResult<()>) + Send>,
    ) {
        self.handle.spilled_urls.lock().unwrap().push((id, url.clone(), node_id));
        callback(Ok(()));
    }
}

impl OwnerClientTestHandle {
    pub fn spilled_url_count(&self) -> usize {
        self.inner.spilled_urls.lock().unwrap().len()
    }

    pub fn spilled_urls(&self) -> Vec<(ObjectId, ObjectUrl, NodeId)> {
        self.inner.spilled_urls.lock().unwrap().clone()
    }

    /// Fires the ref-removed callback for `id`, simulating the owner
    /// reporting the object out of scope. Panics if no such callback is
    /// pending, since that indicates the test set up its scenario wrong.
    pub fn release(&self, id: &ObjectId) {
        let mut callbacks = self.inner.ref_removed.lock().unwrap();
        let position = callbacks
            .iter()
            .position(|(pending_id, _)| pending_id == id)
            .expect("no pending wait_for_ref_removed for this id");
        let (_, callback) = callbacks.remove(position);
        drop(callbacks);
        callback();
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

#[derive(Clone)]
pub struct ObjectDirectoryHandle {
    pub reported_spilled: Arc<Mutex<Vec<ObjectId>>>,
    pub reported_freed: Arc<Mutex<Vec<ObjectId>>>,
}

pub struct RecordingObjectDirectory {
    handle: ObjectDirectoryHandle,
}

pub fn object_directory() -> (RecordingObjectDirectory, ObjectDirectoryHandle) {
    let handle = ObjectDirectoryHandle {
        reported_spilled: Arc::new(Mutex::new(Vec::new())),
        reported_freed: Arc::new(Mutex::new(Vec::new())),
    };
    (
        RecordingObjectDirectory {
            handle: handle.clone(),
        },
        handle,
    )
}

impl ObjectDirectory for RecordingObjectDirectory {
    fn report_object_spilled(&mut self, id: ObjectId, _node_id: NodeId, _url: &ObjectUrl) {
        self.handle.reported_spilled.lock().unwrap().push(id);
    }

    fn report_object_freed(&mut self, ids: &[ObjectId]) {
        self.handle.reported_freed.lock().unwrap().extend_from_slice(ids);
    }
}

/// Every id is spillable except those explicitly marked busy.
#[derive(Clone, Default)]
pub struct ConfigurableSpillable {
    busy: Arc<Mutex<HashSet<ObjectId>>>,
}

impl ConfigurableSpillable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_busy(&self, id: ObjectId) {
        self.busy.lock().unwrap().insert(id);
    }
}

impl SpillabilityPredicate for ConfigurableSpillable {
    fn is_spillable(&self, id: ObjectId) -> bool {
        !self.busy.lock().unwrap().contains(&id)
    }
}
