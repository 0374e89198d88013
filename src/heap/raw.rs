//! The raw allocator core.
//!
//! [`RawHeap`] owns the arena and the page table and implements the
//! actual segregated-fit algorithms. It works on *byte
//! offsets* into the arena instead of pointers: that keeps the whole
//! core free of pointer arithmetic (and therefore trivially testable),
//! while the public [`Heap`](super::Heap) wrapper translates between
//! caller pointers and offsets.

use super::page::{
    bit_is_set, clear_bit, first_clear, set_bit, Class, PageEntry, HEADER_SIZE, PAGE_SHIFT,
    PAGE_SIZE,
};

/// An error occurred when releasing an offset.
///
/// The public API swallows these (release of an invalid pointer is a
/// silent no-op by contract), but the raw layer reports them so the
/// behavior stays observable in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreeError {
    /// There is a double-free detected: the slot the offset names is
    /// already free.
    DoubleFreeDetected,
    /// The offset does not name a live slot: outside the arena, inside
    /// a page header, misaligned within its page's class, past the
    /// class's slot range, or within a page that holds no allocations.
    AllocationNotFound,
}

/// The arena backing the heap.
///
/// Kept as its own type so the 16-byte alignment attribute sits on the
/// memory itself: page 0's first slot then starts at `base + 16`, and
/// with slot sizes of 16 and 192 every slot in every page is 16-byte
/// aligned in absolute terms, not just relative to the arena.
#[repr(align(16))]
struct Arena<const PAGES: usize>([[u8; PAGE_SIZE]; PAGES]);

/// The raw fixed-heap allocator over `PAGES` pages of 1024 bytes.
pub struct RawHeap<const PAGES: usize> {
    arena: Arena<PAGES>,
    table: [PageEntry; PAGES],
}

impl<const PAGES: usize> RawHeap<PAGES> {
    /// Create a heap with every page free and every header zeroed.
    pub const fn new() -> Self {
        Self {
            arena: Arena([[0; PAGE_SIZE]; PAGES]),
            table: [PageEntry::FREE; PAGES],
        }
    }

    /// Total size of the arena in bytes.
    pub const fn size() -> usize {
        PAGES * PAGE_SIZE
    }

    /// Base address of the arena, for the pointer translation done by
    /// the public wrapper.
    pub fn base_ptr(&mut self) -> *mut u8 {
        self.arena.0.as_mut_ptr().cast()
    }

    /// Return every page to the free state and zero its header.
    pub fn reset(&mut self) {
        for page in 0..PAGES {
            self.set_free(page);
        }
    }

    fn header(&self, page: usize) -> &[u8] {
        &self.arena.0[page][..HEADER_SIZE]
    }

    fn header_mut(&mut self, page: usize) -> &mut [u8] {
        &mut self.arena.0[page][..HEADER_SIZE]
    }

    fn set_free(&mut self, page: usize) {
        self.table[page] = PageEntry::FREE;
        self.header_mut(page).fill(0);
    }

    /// Byte offset of slot 0 of `page`.
    const fn data_offset(page: usize) -> usize {
        (page << PAGE_SHIFT) + HEADER_SIZE
    }

    /// Allocate `size` bytes, returning the arena offset of the slot.
    ///
    /// Requests of 0 bytes or more than the largest class are refused
    /// without touching any state.
    pub fn allocate(&mut self, size: usize) -> Option<usize> {
        self.allocate_in(Class::of_request(size)?)
    }

    /// The per-class allocation strategy: first fill partial pages of
    /// the class in index order, then claim the lowest-index free page.
    fn allocate_in(&mut self, class: Class) -> Option<usize> {
        for page in 0..PAGES {
            let entry = self.table[page];
            if entry.class == Some(class) && (entry.used as usize) < class.segments() {
                if let Some(slot) = first_clear(self.header(page), class.segments()) {
                    set_bit(self.header_mut(page), slot);
                    self.table[page].used += 1;
                    return Some(Self::data_offset(page) + slot * class.slot_size());
                }
            }
        }
        for page in 0..PAGES {
            if self.table[page].class.is_none() {
                // a free page has an all-zero header, so claiming it is
                // just the type change plus bit 0
                self.table[page] = PageEntry {
                    class: Some(class),
                    used: 1,
                };
                set_bit(self.header_mut(page), 0);
                return Some(Self::data_offset(page));
            }
        }
        None
    }

    /// Release the slot at `offset`.
    ///
    /// Offsets that do not name a live slot are rejected without any
    /// state change. A page whose last slot is released becomes free
    /// again and has its whole header zeroed, making it re-eligible for
    /// either class.
    pub fn release(&mut self, offset: usize) -> Result<(), FreeError> {
        if offset >= Self::size() {
            return Err(FreeError::AllocationNotFound);
        }
        let page = offset >> PAGE_SHIFT;
        let entry = self.table[page];
        if entry.used == 0 {
            return Err(FreeError::AllocationNotFound);
        }
        let Some(class) = entry.class else {
            return Err(FreeError::AllocationNotFound);
        };

        let Some(data_offset) = (offset & (PAGE_SIZE - 1)).checked_sub(HEADER_SIZE) else {
            // points into the page header
            return Err(FreeError::AllocationNotFound);
        };
        if data_offset % class.slot_size() != 0 {
            return Err(FreeError::AllocationNotFound);
        }
        let slot = data_offset / class.slot_size();
        if slot >= class.segments() {
            return Err(FreeError::AllocationNotFound);
        }
        if !bit_is_set(self.header(page), slot) {
            return Err(FreeError::DoubleFreeDetected);
        }

        clear_bit(self.header_mut(page), slot);
        self.table[page].used -= 1;
        if self.table[page].used == 0 {
            self.set_free(page);
        }
        Ok(())
    }
}
