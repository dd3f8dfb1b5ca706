// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Register access through a memory-mapped BAR4 window

use crate::Fm10kRw;
use drv_fm10k_regs::WORD_SIZE;

/// Volatile accessor over a BAR4 mapping owned by the caller.
///
/// The mapping is neither created nor torn down here.  This type is not
/// `Send`: the window is shared with hardware and is meant to be driven from
/// one thread.
pub struct Fm10kMmio {
    base: *mut u8,
    len: usize,
}

impl Fm10kMmio {
    /// Wraps an existing mapping.
    ///
    /// # Safety
    /// `base` must point to a live mapping of at least `len` bytes, aligned
    /// to 8 bytes, that stays mapped for the lifetime of this object and is
    /// not accessed through any other Rust reference in the meantime.
    pub unsafe fn new(base: *mut u8, len: usize) -> Self {
        Self { base, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn ptr(&self, word: u32, size: usize) -> *mut u8 {
        let offset = word as usize * WORD_SIZE;
        debug_assert!(offset + size <= self.len);
        self.base.wrapping_add(offset)
    }
}

impl Fm10kRw for Fm10kMmio {
    fn read32(&self, word: u32) -> u32 {
        let p = self.ptr(word, 4) as *const u32;
        // SAFETY: in bounds of the mapping promised by `new`
        unsafe { p.read_volatile() }
    }

    fn write32(&self, word: u32, value: u32) {
        let p = self.ptr(word, 4) as *mut u32;
        // SAFETY: as above
        unsafe { p.write_volatile(value) }
    }

    fn read64(&self, word: u32) -> u64 {
        debug_assert!(word % 2 == 0);
        let p = self.ptr(word, 8) as *const u64;
        // SAFETY: as above; atomic registers sit on even words, and the base
        // is 8-byte aligned
        unsafe { p.read_volatile() }
    }

    fn write64(&self, word: u32, value: u64) {
        debug_assert!(word % 2 == 0);
        let p = self.ptr(word, 8) as *mut u64;
        // SAFETY: as above
        unsafe { p.write_volatile(value) }
    }
}
