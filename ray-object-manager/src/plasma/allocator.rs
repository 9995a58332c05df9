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

//! Memory allocator for the plasma store.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};

use super::common::{Allocation, PlasmaError, PlasmaResult};

// Re-export mmap_rs for use in PlasmaAllocator
use mmap_rs;

/// Trait for memory allocators.
pub trait Allocator: Send + Sync {
    /// Allocate memory of the given size.
    fn allocate(&self, size: usize) -> PlasmaResult<Allocation>;

    /// Free a previously allocated block.
    fn free(&self, allocation: &Allocation) -> PlasmaResult<()>;

    /// Get available memory.
    fn available(&self) -> usize;

    /// Get total capacity.
    fn capacity(&self) -> usize;
}

/// Statistics for an allocator.
#[derive(Debug, Default)]
pub struct AllocatorStats {
    /// Total bytes allocated.
    pub bytes_allocated: AtomicUsize,
    /// Number of allocations.
    pub num_allocations: AtomicUsize,
    /// Number of frees.
    pub num_frees: AtomicUsize,
    /// Peak bytes allocated.
    pub peak_bytes: AtomicUsize,
}

impl AllocatorStats {
    /// Create new stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an allocation.
    pub fn record_alloc(&self, size: usize) {
        let current = self.bytes_allocated.fetch_add(size, Ordering::SeqCst) + size;
        self.num_allocations.fetch_add(1, Ordering::SeqCst);

        // Update peak if needed
        let mut peak = self.peak_bytes.load(Ordering::SeqCst);
        while current > peak {
            match self.peak_bytes.compare_exchange_weak(
                peak,
                current,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => break,
                Err(p) => peak = p,
            }
        }
    }

    /// Record a free.
    pub fn record_free(&self, size: usize) {
        self.bytes_allocated.fetch_sub(size, Ordering::SeqCst);
        self.num_frees.fetch_add(1, Ordering::SeqCst);
    }
}

/// A simple heap-based allocator for testing.
pub struct HeapAllocator {
    /// Maximum capacity.
    capacity: usize,
    /// Allocator statistics.
    stats: AllocatorStats,
    /// Track allocations for cleanup.
    allocations: Mutex<HashMap<usize, usize>>, // address -> size
    /// Next fake fd.
    next_fd: AtomicI32,
}

impl HeapAllocator {
    /// Create a new heap allocator.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            stats: AllocatorStats::new(),
            allocations: Mutex::new(HashMap::new()),
            next_fd: AtomicI32::new(100),
        }
    }

    /// Get allocator statistics.
    pub fn stats(&self) -> &AllocatorStats {
        &self.stats
    }
}

impl Allocator for HeapAllocator {
    fn allocate(&self, size: usize) -> PlasmaResult<Allocation> {
        if size == 0 {
            return Err(PlasmaError::InvalidRequest(
                "Cannot allocate zero bytes".to_string(),
            ));
        }

        // Check capacity
        let current = self.stats.bytes_allocated.load(Ordering::SeqCst);
        if current + size > self.capacity {
            return Err(PlasmaError::OutOfMemory);
        }

        // Allocate memory
        let layout = std::alloc::Layout::from_size_align(size, 8)
            .map_err(|e| PlasmaError::InvalidRequest(e.to_string()))?;

        let ptr = unsafe { std::alloc::alloc_zeroed(layout) };
        if ptr.is_null() {
            return Err(PlasmaError::OutOfMemory);
        }

        // Track the allocation
        self.allocations.lock().insert(ptr as usize, size);
        self.stats.record_alloc(size);

        let fd = self.next_fd.fetch_add(1, Ordering::SeqCst);

        Ok(Allocation::new(
            ptr,
            size,
            fd,
            0,    // offset
            0,    // device_num (CPU)
            size, // mmap_size
            false,
        ))
    }

    fn free(&self, allocation: &Allocation) -> PlasmaResult<()> {
        let addr = allocation.address() as usize;
        let size = self
            .allocations
            .lock()
            .remove(&addr)
            .ok_or_else(|| PlasmaError::InvalidRequest("Unknown allocation".to_string()))?;

        // Free the memory
        unsafe {
            let layout = std::alloc::Layout::from_size_align_unchecked(size, 8);
            std::alloc::dealloc(allocation.address(), layout);
        }

        self.stats.record_free(size);
        Ok(())
    }

    fn available(&self) -> usize {
        self.capacity
            .saturating_sub(self.stats.bytes_allocated.load(Ordering::SeqCst))
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Drop for HeapAllocator {
    fn drop(&mut self) {
        // Free any remaining allocations
        let allocations: Vec<_> = self.allocations.lock().drain().collect();
        for (addr, size) in allocations {
            unsafe {
                let layout = std::alloc::Layout::from_size_align_unchecked(size, 8);
                std::alloc::dealloc(addr as *mut u8, layout);
            }
        }
    }
}

/// A null allocator that rejects all allocations (for testing).
pub struct NullAllocator;

impl Allocator for NullAllocator {
    fn allocate(&self, _size: usize) -> PlasmaResult<Allocation> {
        Err(PlasmaError::OutOfMemory)
    }

    fn free(&self, _allocation: &Allocation) -> PlasmaResult<()> {
        Err(PlasmaError::InvalidRequest("Null allocator".to_string()))
    }

    fn available(&self) -> usize {
        0
    }

    fn capacity(&self) -> usize {
        0
    }
}

/// Holds an mmap allocation along with its metadata.
/// The mmap field is kept to ensure the memory mapping stays alive.
#[allow(dead_code)]
struct MmapAllocation {
    /// The mmap handle (keeps the mapping alive).
    mmap: mmap_rs::MmapMut,
    /// Size of the allocation.
    size: usize,
    /// Whether this is a fallback allocation.
    is_fallback: bool,
}

/// A PlasmaAllocator that uses mmap for memory allocation.
///
/// Primary allocation uses anonymous mmap (shared memory).
/// Fallback allocation uses file-backed mmap for spilling to disk.
pub struct PlasmaAllocator {
    /// Fallback directory for file-backed allocations.
    fallback_directory: std::path::PathBuf,
    /// Total bytes allocated (primary + fallback).
    total_allocated: AtomicUsize,
    /// Total fallback bytes allocated.
    fallback_allocated: AtomicUsize,
    /// Footprint limit (primary capacity).
    footprint_limit: usize,
    /// Track mmap allocations by address.
    allocations: Mutex<HashMap<usize, MmapAllocation>>,
    /// Next fake fd for tracking.
    next_fd: AtomicI32,
    /// Alignment for allocations.
    alignment: usize,
}

impl PlasmaAllocator {
    /// Alignment for allocations (64 bytes, matching Ray's C++ implementation).
    const DEFAULT_ALIGNMENT: usize = 64;

    /// Reserved bytes for internal bookkeeping.
    const RESERVED_BYTES: usize = 256 * std::mem::size_of::<usize>();

    /// Create a new PlasmaAllocator.
    ///
    /// # Arguments
    /// * `_plasma_directory` - Path to plasma directory (for primary mmap on non-Linux)
    /// * `fallback_directory` - Path to fallback directory for file-backed mmap
    /// * `_hugepage_enabled` - Whether hugepages are enabled
    /// * `footprint_limit` - Maximum primary memory allocation
    pub fn new(
        _plasma_directory: &str,
        fallback_directory: &str,
        _hugepage_enabled: bool,
        footprint_limit: usize,
    ) -> Self {
        Self {
            fallback_directory: std::path::PathBuf::from(fallback_directory),
            total_allocated: AtomicUsize::new(0),
            fallback_allocated: AtomicUsize::new(0),
            footprint_limit,
            allocations: Mutex::new(HashMap::new()),
            next_fd: AtomicI32::new(100),
            alignment: Self::DEFAULT_ALIGNMENT,
        }
    }

    /// Get the footprint limit (primary capacity).
    pub fn get_footprint_limit(&self) -> usize {
        self.footprint_limit
    }

    /// Allocate from primary memory pool (anonymous mmap).
    pub fn allocate(&self, size: usize) -> Option<Allocation> {
        if size == 0 {
            return None;
        }

        // Check capacity (accounting for reserved bytes)
        // Only primary allocations count against the limit, not fallback allocations
        let total = self.total_allocated.load(Ordering::SeqCst);
        let fallback = self.fallback_allocated.load(Ordering::SeqCst);
        let primary_allocated = total.saturating_sub(fallback);
        let usable_limit = self.footprint_limit.saturating_sub(Self::RESERVED_BYTES);
        if primary_allocated + size > usable_limit {
            return None;
        }

        // Round up size to alignment
        let aligned_size = (size + self.alignment - 1) & !(self.alignment - 1);

        // Create anonymous mmap
        let mmap_result = mmap_rs::MmapOptions::new(aligned_size)
            .map_err(|e| PlasmaError::InvalidRequest(e.to_string()))
            .and_then(|opts| {
                opts.map_mut().map_err(|e| PlasmaError::IoError(e.to_string()))
            });

        match mmap_result {
            Ok(mmap) => {
                let ptr = mmap.as_ptr() as *mut u8;
                let fd = self.next_fd.fetch_add(1, Ordering::SeqCst);

                // Store the mmap to keep it alive
                let alloc_entry = MmapAllocation {
                    mmap,
                    size: aligned_size,
                    is_fallback: false,
                };
                self.allocations.lock().insert(ptr as usize, alloc_entry);
                self.total_allocated.fetch_add(size, Ordering::SeqCst);

                Some(Allocation::new(
                    ptr,
                    size,
                    fd,
                    0,            // offset
                    0,            // device_num (CPU)
                    aligned_size, // mmap_size
                    false,        // not fallback
                ))
            }
            Err(_) => None,
        }
    }

    /// Allocate from fallback storage (file-backed mmap).
    pub fn fallback_allocate(&self, size: usize) -> Option<Allocation> {
        if size == 0 {
            return None;
        }

        // Round up size to alignment
        let aligned_size = (size + self.alignment - 1) & !(self.alignment - 1);

        // Create a temporary file for the fallback allocation
        let file = tempfile::tempfile_in(&self.fallback_directory).ok()?;

        // Set the file size
        file.set_len(aligned_size as u64).ok()?;

        // Create file-backed mmap
        let mmap_result = unsafe {
            mmap_rs::MmapOptions::new(aligned_size)
                .ok()?
                .with_file(&file, 0)
                .map_mut()
        };

        match mmap_result {
            Ok(mmap) => {
                let ptr = mmap.as_ptr() as *mut u8;
                let fd = self.next_fd.fetch_add(1, Ordering::SeqCst);

                // Store the mmap to keep it alive
                let alloc_entry = MmapAllocation {
                    mmap,
                    size: aligned_size,
                    is_fallback: true,
                };
                self.allocations.lock().insert(ptr as usize, alloc_entry);
                self.total_allocated.fetch_add(size, Ordering::SeqCst);
                self.fallback_allocated.fetch_add(size, Ordering::SeqCst);

                Some(Allocation::new(
                    ptr,
                    size,
                    fd,
                    0,            // offset
                    0,            // device_num (CPU)
                    aligned_size, // mmap_size
                    true,         // is fallback
                ))
            }
            Err(_) => None,
        }
    }

    /// Free an allocation.
    pub fn free(&self, allocation: Allocation) {
        let addr = allocation.address() as usize;
        let size = allocation.size();

        if let Some(mmap_alloc) = self.allocations.lock().remove(&addr) {
            self.total_allocated.fetch_sub(size, Ordering::SeqCst);
            if mmap_alloc.is_fallback {
                self.fallback_allocated.fetch_sub(size, Ordering::SeqCst);
            }
            // mmap_alloc.mmap is dropped here, unmapping the memory
        }
    }

    /// Get total bytes allocated (primary + fallback).
    pub fn allocated(&self) -> usize {
        self.total_allocated.load(Ordering::SeqCst)
    }

    /// Get total fallback bytes allocated.
    pub fn fallback_allocated(&self) -> usize {
        self.fallback_allocated.load(Ordering::SeqCst)
    }
}
