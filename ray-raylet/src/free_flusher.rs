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

//! Free Flusher: batches ids whose buffers have been relinquished and
//! reports them to the surrounding raylet as free from remote stores.

use ray_common::ObjectId;
use std::time::{Duration, Instant};

pub struct FreeFlusher {
    pending: Vec<ObjectId>,
    last_flush: Instant,
    batch_size: usize,
    period: Duration,
    on_objects_freed: Box<dyn Fn(Vec<ObjectId>) + Send + Sync>,
}

impl FreeFlusher {
    pub fn new(
        batch_size: usize,
        period_ms: u64,
        on_objects_freed: Box<dyn Fn(Vec<ObjectId>) + Send + Sync>,
    ) -> Self {
        Self {
            pending: Vec::new(),
            last_flush: Instant::now(),
            batch_size,
            period: Duration::from_millis(period_ms),
            on_objects_freed,
        }
    }

    /// Record that LOM has relinquished `id`'s buffer; flushes
    /// immediately if this reaches the batch size.
    pub fn accumulate(&mut self, id: ObjectId) {
        self.pending.push(id);
        self.flush_free_objects();
    }

    /// Flush iff the accumulated count has reached `batch_size` or
    /// `period` has elapsed since the last flush, whichever first.
    pub fn flush_free_objects(&mut self) {
        let count_reached = self.pending.len() >= self.batch_size;
        let period_elapsed = self.last_flush.elapsed() >= self.period;
        if self.pending.is_empty() || !(count_reached || period_elapsed) {
            return;
        }
        let ids = std::mem::take(&mut self.pending);
        (self.on_objects_freed)(ids);
        self.last_flush = Instant::now();
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
