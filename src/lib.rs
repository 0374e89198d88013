//! Deterministic, bounded-memory building blocks for embedded systems.
//!
//! This crate bundles two independently useful primitives that share
//! one philosophy: deterministic operations over statically-sized
//! state, with no dependency on a global allocator:
//!
//! 1. [`Heap`]: a fixed-heap segregated-fit allocator over a
//!    statically-sized arena, organised as 1024-byte pages with
//!    per-page bitmap free lists. Requests up to 15 bytes are served
//!    from 16-byte slots, requests up to 180 bytes from 192-byte
//!    slots; anything else is refused. Release tolerates stray,
//!    repeated, misaligned and foreign pointers, which are ignored
//!    rather than corrupting the arena.
//! 2. Chip drivers for two serial-bus memories:
//!    [`eeprom::Eeprom25lc040a`], a 512-byte EEPROM with a 9-bit
//!    address space and page-buffered writes, and [`nor::W25q128`], a
//!    16 MiB NOR flash with erase-before-program semantics. Both are
//!    byte-exact about the frames they emit and drive the devices'
//!    write-enable and busy-polling state machines for you.
//!
//! The drivers talk to the outside world through the minimal
//! [`bus::Bus`] capability (assert chip select, release it, exchange
//! one byte), so they run unchanged on anything from a bit-banged GPIO
//! bus to a DMA-backed SPI peripheral. For the common case of an
//! [embedded-hal] SPI bus plus a chip-select pin there is
//! [`bus::SpiPair`].
//!
//! # Usage
//! The allocator is self-contained; typically it lives in a `static`:
//!
//! ```
//! static HEAP: embmem::Heap<64> = embmem::Heap::new();
//!
//! let ptr = HEAP.allocate(13).expect("out of memory");
//! // ... use the 13 bytes ...
//! HEAP.release(ptr.as_ptr());
//! ```
//!
//! A driver borrows or owns its bus and hands it back on
//! `release()`:
//!
//! ```no_run
//! use embmem::eeprom::Eeprom25lc040a;
//! # struct MyBus;
//! # impl embmem::bus::Bus for MyBus {
//! #     fn select(&mut self) {}
//! #     fn deselect(&mut self) {}
//! #     fn transfer(&mut self, _byte: u8) -> u8 { 0x02 }
//! # }
//! # let my_bus = MyBus;
//!
//! let mut eeprom = Eeprom25lc040a::new(my_bus);
//! eeprom.write_array(0x0010, b"hello")?;
//!
//! let mut back = [0u8; 5];
//! eeprom.read_array(0x0010, &mut back)?;
//! # Ok::<(), embmem::eeprom::Error>(())
//! ```
//!
//! # What this crate does not do
//! No wear levelling, no write journaling, no recovery from
//! power-loss-interrupted writes, and no timeouts on the busy polls:
//! a device that never reports ready will spin forever. The allocator
//! does not grow, does not defragment, and serves nothing larger than
//! 180 bytes. The `Heap` handle is usable through shared references
//! (a spinlock guards the page table), but the drivers are plain
//! `&mut self` state machines: one bus, one driver, one operation at a
//! time.
//!
//! [embedded-hal]: https://docs.rs/embedded-hal
#![no_std]

#[cfg(test)]
extern crate std;

pub mod bus;
pub mod eeprom;
pub mod heap;
pub mod nor;

pub use heap::{Heap, MAX_REQUEST, MAX_SMALL_REQUEST, PAGE_SIZE};
