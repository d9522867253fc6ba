use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Heap usage observed while a closure ran, relative to the live bytes at
/// its start.
#[derive(Clone, Copy, Debug)]
pub struct HeapUsage {
    pub peak_bytes: usize,
    pub retained_bytes: usize,
    pub allocations: usize,
}

impl HeapUsage {
    pub fn peak_kib(&self) -> usize {
        self.peak_bytes / 1024
    }
}

/// Global allocator that tracks live and peak heap bytes.
///
/// Budget tests own one binary each, so only the measured closure allocates
/// while a measurement is in progress.
pub struct BudgetAlloc {
    live: AtomicUsize,
    peak: AtomicUsize,
    allocations: AtomicUsize,
}

impl BudgetAlloc {
    pub const fn new() -> Self {
        Self {
            live: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            allocations: AtomicUsize::new(0),
        }
    }

    pub fn measure<R>(&self, f: impl FnOnce() -> R) -> (R, HeapUsage) {
        let baseline = self.live.load(Ordering::SeqCst);
        self.peak.store(baseline, Ordering::SeqCst);
        let allocations_before = self.allocations.load(Ordering::SeqCst);

        let out = f();

        let usage = HeapUsage {
            peak_bytes: self.peak.load(Ordering::SeqCst).saturating_sub(baseline),
            retained_bytes: self.live.load(Ordering::SeqCst).saturating_sub(baseline),
            allocations: self
                .allocations
                .load(Ordering::SeqCst)
                .saturating_sub(allocations_before),
        };
        (out, usage)
    }

    fn grow(&self, bytes: usize) {
        let live = self.live.fetch_add(bytes, Ordering::SeqCst) + bytes;
        self.peak.fetch_max(live, Ordering::SeqCst);
    }

    fn shrink(&self, bytes: usize) {
        let _ = self
            .live
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |live| {
                Some(live.saturating_sub(bytes))
            });
    }
}

unsafe impl GlobalAlloc for BudgetAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            self.allocations.fetch_add(1, Ordering::SeqCst);
            self.grow(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
        self.shrink(layout.size());
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc_zeroed(layout) };
        if !ptr.is_null() {
            self.allocations.fetch_add(1, Ordering::SeqCst);
            self.grow(layout.size());
        }
        ptr
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = unsafe { System.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            self.allocations.fetch_add(1, Ordering::SeqCst);
            if new_size >= layout.size() {
                self.grow(new_size - layout.size());
            } else {
                self.shrink(layout.size() - new_size);
            }
        }
        new_ptr
    }
}
