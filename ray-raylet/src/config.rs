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

//! Configuration for the local object manager.

use serde::{Deserialize, Serialize};

/// Default retry budget for a spilled object's base-url delete RPC
/// (matches kDefaultSpilledObjectDeleteRetries).
pub const DEFAULT_SPILLED_OBJECT_DELETE_RETRIES: u32 = 3;

/// Tunables for a [`crate::manager::LocalObjectManager`] instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalObjectManagerConfig {
    /// Minimum cumulative bytes of eligible pinned objects before a spill
    /// batch is dispatched, absent an in-flight-worker exception or a
    /// spill-at-least-one hint.
    pub min_spilling_size: u64,

    /// Maximum number of objects fused into a single spill batch.
    pub max_fused_object_count: usize,

    /// Upper bound on concurrently in-flight spill and restore RPCs
    /// combined (they draw from the same I/O worker pool).
    pub max_active_workers: i64,

    /// Number of freed-object ids to accumulate before flushing.
    pub free_objects_batch_size: usize,

    /// Maximum time to hold freed-object ids before flushing, in
    /// milliseconds.
    pub free_objects_period_ms: u64,

    /// Whether spilled objects live only on this node's local filesystem
    /// (as opposed to a distributed external store any node can read).
    pub is_external_storage_type_fs: bool,

    /// Retry budget for a spilled base-url's delete RPC before it is
    /// abandoned.
    pub spilled_object_delete_retries: u32,

    /// Initial value of the error-log-doubling threshold (recovered from
    /// `RayConfig::instance().verbose_spill_logs()`): a spill failure is
    /// logged once cumulative failed-spill bytes cross this many bytes,
    /// and the threshold doubles each time it fires. Zero disables the
    /// log entirely.
    pub verbose_spill_logs: u64,
}

impl Default for LocalObjectManagerConfig {
    fn default() -> Self {
        Self {
            min_spilling_size: 100 * 1024 * 1024,
            max_fused_object_count: 16,
            max_active_workers: 4,
            free_objects_batch_size: 100,
            free_objects_period_ms: 1000,
            is_external_storage_type_fs: true,
            spilled_object_delete_retries: DEFAULT_SPILLED_OBJECT_DELETE_RETRIES,
            verbose_spill_logs: 100 * 1024 * 1024,
        }
    }
}

impl LocalObjectManagerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide default configuration.
    ///
    /// Real deployments construct their own `LocalObjectManagerConfig`
    /// from cluster settings; this singleton only covers callers that
    /// have no such source (tests, one-off tools).
    pub fn instance() -> &'static LocalObjectManagerConfig {
        static INSTANCE: std::sync::OnceLock<LocalObjectManagerConfig> = std::sync::OnceLock::new();
        INSTANCE.get_or_init(LocalObjectManagerConfig::default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LocalObjectManagerConfig::default();
        assert_eq!(config.spilled_object_delete_retries, 3);
        assert!(config.is_external_storage_type_fs);
    }

    #[test]
    fn test_singleton_instance() {
        let a = LocalObjectManagerConfig::instance();
        let b = LocalObjectManagerConfig::instance();
        assert_eq!(a.max_fused_object_count, b.max_fused_object_count);
    }
}
