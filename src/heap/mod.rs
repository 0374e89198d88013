//! A fixed-heap segregated-fit allocator over a statically-sized arena.
//!
//! The heap is a contiguous arena of `PAGES` pages of 1024 bytes. Each
//! page starts with a 16-byte header whose leading bytes double as a
//! bitmap of used slots, and serves exactly one of two slot classes at
//! a time:
//!
//! * **SMALL**: 16-byte slots for requests of 1 to 15 bytes,
//!   63 slots per page;
//! * **BIG**: 192-byte slots for requests of 16 to 180 bytes,
//!   5 slots per page.
//!
//! Requests of 0 bytes or more than 180 bytes are refused. Allocation
//! picks the lowest-indexed partial page of the matching class and the
//! lowest clear bitmap bit within it; if no such page exists, the
//! lowest-indexed free page is claimed for the class. A page returns to
//! the free pool (and becomes re-eligible for either class) as soon as
//! its last slot is released.
//!
//! There is no hidden global state: the arena and its page table live
//! inside the [`Heap`] value, so independent heaps are just independent
//! values. [`Heap::new`] is `const`, which makes a `static` heap the
//! usual deployment:
//!
//! ```
//! static HEAP: embmem::Heap<64> = embmem::Heap::new();
//!
//! let ptr = HEAP.allocate(13).expect("out of memory");
//! HEAP.release(ptr.as_ptr());
//! ```
//!
//! [`release`](Heap::release) is tolerant: null pointers,
//! pointers outside the arena, pointers into free pages or headers,
//! misaligned pointers and already-free slots are all ignored, so a
//! stray or repeated release never corrupts the arena.

mod page;
mod raw;

pub use page::{MAX_REQUEST, MAX_SMALL_REQUEST, PAGE_SIZE};

use core::ptr::NonNull;

use spin::Mutex;

use raw::RawHeap;

/// A fixed-size heap of `PAGES` pages of [`PAGE_SIZE`] bytes.
///
/// `Heap<64>` is the canonical 64 KiB configuration. The value is
/// self-contained and interior-mutable, so it can be a `static` and be
/// used through shared references; a spinlock serialises access to the
/// page table (single operations are short and bounded, so contention
/// cost is the lock itself).
pub struct Heap<const PAGES: usize> {
    raw: Mutex<RawHeap<PAGES>>,
}

impl<const PAGES: usize> Heap<PAGES> {
    /// Total arena size in bytes.
    pub const SIZE: usize = PAGES * PAGE_SIZE;

    /// Create a heap with every page free.
    ///
    /// This is a `const fn`, so the heap can be created directly in a
    /// `static`. The returned heap is fully initialised; no separate
    /// setup step is required before allocating.
    ///
    /// # Panics
    /// Panics at compile time if `PAGES` is zero.
    #[must_use = "the heap is the backing storage; store it somewhere and allocate from it"]
    pub const fn new() -> Self {
        assert!(PAGES > 0, "a heap needs at least one page");
        Self {
            raw: Mutex::new(RawHeap::new()),
        }
    }

    /// Allocate at least `size` usable bytes.
    ///
    /// Returns `None` if `size` is 0, exceeds the largest slot class
    /// ([`MAX_REQUEST`] bytes) or no slot is available. Failed requests
    /// leave the heap untouched.
    ///
    /// The returned pointer stays valid until it is passed to
    /// [`release`](Self::release) or the heap is [`reset`](Self::reset),
    /// as long as the heap itself is neither moved nor dropped.
    pub fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        let mut raw = self.raw.lock();
        let offset = raw.allocate(size)?;
        // SAFETY: `offset` is within the arena by construction (the raw
        // layer only hands out `page * 1024 + 16 + slot * slot_size`
        // with both indices range-checked), so the add stays inside the
        // same allocated object.
        NonNull::new(unsafe { raw.base_ptr().add(offset) })
    }

    /// Return the slot at `ptr` to its page's free list.
    ///
    /// Pointers that do not name a live slot of this heap (null,
    /// outside the arena, inside a page header, misaligned for the
    /// page's class, or naming an already-free slot) are silently
    /// ignored. Releasing the last slot of a page returns the page to
    /// the free pool and re-zeroes its header.
    ///
    /// Releasing a pointer that is still in use is not detected; the
    /// slot will be handed out again by a later allocation.
    pub fn release(&self, ptr: *mut u8) {
        if ptr.is_null() {
            return;
        }
        let mut raw = self.raw.lock();
        let base = raw.base_ptr() as usize;
        let Some(offset) = (ptr as usize).checked_sub(base) else {
            return;
        };
        // invalid offsets are reported by the raw layer and ignored here
        let _ = raw.release(offset);
    }

    /// Return every page to the free state and zero every page header.
    ///
    /// Equivalent to a freshly created heap; idempotent. All
    /// outstanding allocations are invalidated.
    pub fn reset(&self) {
        self.raw.lock().reset();
    }
}

impl<const PAGES: usize> Default for Heap<PAGES> {
    fn default() -> Self {
        Self::new()
    }
}
