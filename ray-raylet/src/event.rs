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

//! Reactor re-entry events.
//!
//! I/O worker and owner RPCs are asynchronous: a collaborator accepts a
//! `'static + Send` callback and may invoke it from any thread, at any
//! later point. Such a callback cannot safely reach back into
//! `&mut LocalObjectManager` directly, so instead it posts an event onto
//! a channel the manager owns the receiving end of. The manager drains
//! that channel on its own thread via `process_events`, matching the
//! design note that callbacks "post a task to the reactor" rather than
//! mutate its tables from a foreign thread.

use crate::error::LomResult;
use crate::types::PendingDeletion;
use crate::url::ObjectUrl;
use ray_common::ObjectId;
use std::time::Instant;

pub enum ReactorEvent {
    ObjectEvicted {
        id: ObjectId,
    },
    SpillCompleted {
        ids: Vec<ObjectId>,
        started_at: Instant,
        result: LomResult<Vec<ObjectUrl>>,
    },
    RestoreCompleted {
        id: ObjectId,
        started_at: Instant,
        bytes: u64,
        result: LomResult<()>,
    },
    DeleteCompleted {
        batch: Vec<PendingDeletion>,
        result: LomResult<()>,
    },
}
