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

//! Stats/Introspection: totals and "current" gauges for spill/restore
//! activity, plus the debug-string snapshot.

use crate::types::ObjectStoreStatsReply;
use std::time::Duration;

#[derive(Debug, Default)]
pub struct Stats {
    pub spilled_bytes_current: u64,
    pub spilled_bytes_total: u64,
    pub spilled_objects_total: u64,
    pub spill_time_total: Duration,

    pub restored_bytes_total: u64,
    pub restored_objects_total: u64,
    pub restore_time_total: Duration,
    /// Bytes of restores currently in flight, per §4.5's
    /// `num_bytes_pending_restore` gauge.
    pub restore_bytes_pending: u64,

    /// Cumulative failed-spill bytes since the error-log threshold was
    /// last doubled; compared against `next_spill_error_log_bytes`.
    pub cumulative_failed_spill_bytes: u64,
    /// Anti-log-spam threshold: log iff cumulative failed bytes crosses
    /// it, then double it. Disabled entirely when zero.
    pub next_spill_error_log_bytes: u64,
}

impl Stats {
    pub fn new(initial_error_log_threshold: u64) -> Self {
        Self {
            next_spill_error_log_bytes: initial_error_log_threshold,
            ..Default::default()
        }
    }

    pub fn record_spill_success(&mut self, bytes: u64, elapsed: Duration) {
        self.spilled_bytes_current += bytes;
        self.spilled_bytes_total += bytes;
        self.spilled_objects_total += 1;
        self.spill_time_total += elapsed;
    }

    pub fn record_restore_success(&mut self, bytes: u64, elapsed: Duration) {
        self.restored_bytes_total += bytes;
        self.restored_objects_total += 1;
        self.restore_time_total += elapsed;
    }

    pub fn add_pending_restore_bytes(&mut self, bytes: u64) {
        self.restore_bytes_pending += bytes;
    }

    pub fn sub_pending_restore_bytes(&mut self, bytes: u64) {
        self.restore_bytes_pending = self.restore_bytes_pending.saturating_sub(bytes);
    }

    /// Records a failed-spill batch and returns `true` iff an error
    /// should be logged this time (the error-log-doubling rule).
    pub fn record_spill_failure(&mut self, failed_bytes: u64) -> bool {
        if self.next_spill_error_log_bytes == 0 {
            return false;
        }
        self.cumulative_failed_spill_bytes += failed_bytes;
        if self.cumulative_failed_spill_bytes >= self.next_spill_error_log_bytes {
            self.next_spill_error_log_bytes *= 2;
            true
        } else {
            false
        }
    }

    pub fn reduce_spilled_bytes_current(&mut self, bytes: u64) {
        self.spilled_bytes_current = self.spilled_bytes_current.saturating_sub(bytes);
    }

    pub fn fill(&self, num_failed_deletion_requests: u64, pinned_bytes: u64) -> ObjectStoreStatsReply {
        ObjectStoreStatsReply {
            spilled_bytes_current: self.spilled_bytes_current,
            spilled_bytes_total: self.spilled_bytes_total,
            spilled_objects_total: self.spilled_objects_total,
            restored_bytes_total: self.restored_bytes_total,
            restored_objects_total: self.restored_objects_total,
            restore_bytes_pending: self.restore_bytes_pending,
            spill_time_total_s: self.spill_time_total.as_secs_f64(),
            restore_time_total_s: self.restore_time_total.as_secs_f64(),
            num_failed_deletion_requests,
            pinned_bytes,
        }
    }
}
