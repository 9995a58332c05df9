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

//! Shared types used across the Ray Rust workspace: the ID types every
//! crate in the workspace keys its tables by.

pub mod id;

pub use id::{
    ActorClassId, ActorId, ClusterId, ConfigId, FunctionId, JobId, LeaseId, NodeId, ObjectId,
    PlacementGroupId, RayId, TaskId, UniqueId, WorkerId,
};
