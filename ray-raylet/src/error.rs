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

//! Error types for the local object manager.

use ray_common::ObjectId;
use thiserror::Error;

/// Failure kinds the local object manager recognizes and responds to.
///
/// Nothing here terminates the process: every variant is either retried
/// or surfaced to a caller-supplied callback, per the component's error
/// handling design.
#[derive(Debug, Error)]
pub enum LomError {
    #[error("spill RPC to I/O worker failed: {0}")]
    SpillWorkerFailure(String),

    #[error("restore RPC to I/O worker failed: {0}")]
    RestoreWorkerFailure(String),

    #[error("delete RPC to I/O worker failed: {0}")]
    DeleteFailure(String),

    #[error("owner unreachable for object {0}")]
    OwnerUnreachable(ObjectId),

    #[error("restore already in flight for object {0}")]
    DuplicateRestore(ObjectId),
}

pub type LomResult<T> = Result<T, LomError>;
