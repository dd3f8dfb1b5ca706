// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Register map for the FM10000 family of switch chips.
//!
//! Every register lives in one of a fixed set of functional blocks, each of
//! which has a base address in 32-bit words.  A register is named by its
//! block and an index within that block; arrays of registers add a stride
//! and an element count.  The byte offset within BAR4 is always
//! `(block base + index) * 4`.
//!
//! Registers that the datasheet documents as "Atomicity: 64" are described
//! with [`Reg64`] / [`RegArray64`], so that the accessor layer can refuse to
//! touch them as two independent 32-bit halves.
//!
//! Field layouts are expressed with `bitfield!` types; each one converts to
//! and from its raw storage integer.

#![cfg_attr(not(test), no_std)]

use core::marker::PhantomData;
use static_assertions::const_assert;

pub mod mgmt;
pub mod port;
pub mod sched;

/// Size of the BAR4 register window (64 MiB).
pub const BAR4_SIZE: usize = 0x400_0000;

/// Registers are addressed in units of 32-bit words.
pub const WORD_SIZE: usize = 4;

/// Number of addressable words in BAR4
pub const BAR4_WORDS: u32 = (BAR4_SIZE / WORD_SIZE) as u32;

const_assert!(BAR4_SIZE % WORD_SIZE == 0);

/// Returns the length to map for BAR4, rounded up to a whole number of
/// pages.  `page_size` must be non-zero.
pub const fn bar4_map_len(page_size: usize) -> usize {
    BAR4_SIZE.div_ceil(page_size) * page_size
}

/// Functional blocks of the chip, with their base addresses in words.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Block {
    Mgmt,
    Fibm,
    Epl,
    PortsMgmt,
    PciePf,
    PcieCfg,
    PcieCfgVf,
    PcieVf,
    Te,
    Ffu,
    L2Lookup,
    Arp,
    Glort,
    Parser,
    Handler,
    CmApply,
    PolicerApply,
    TrigApply,
    Lag,
    FfuMap,
    Eacl,
    RxStats,
    PolicerUsage,
    CmUsage,
    HandlerTail,
    L2LookupTcn,
    TrigUsage,
    Mod,
    Sched,
}

impl Block {
    pub const ALL: [Block; 29] = [
        Block::Mgmt,
        Block::Fibm,
        Block::Epl,
        Block::PortsMgmt,
        Block::PciePf,
        Block::PcieCfg,
        Block::PcieCfgVf,
        Block::PcieVf,
        Block::Te,
        Block::Ffu,
        Block::L2Lookup,
        Block::Arp,
        Block::Glort,
        Block::Parser,
        Block::Handler,
        Block::CmApply,
        Block::PolicerApply,
        Block::TrigApply,
        Block::Lag,
        Block::FfuMap,
        Block::Eacl,
        Block::RxStats,
        Block::PolicerUsage,
        Block::CmUsage,
        Block::HandlerTail,
        Block::L2LookupTcn,
        Block::TrigUsage,
        Block::Mod,
        Block::Sched,
    ];

    /// Base address of the block, in words
    pub const fn base(self) -> u32 {
        match self {
            Block::Mgmt => 0x00_0000,
            Block::Fibm => 0x00_8000,
            Block::Epl => 0x0e_0000,
            Block::PortsMgmt => 0x0e_8000,
            Block::PciePf => 0x10_0000,
            Block::PcieCfg => 0x12_0000,
            Block::PcieCfgVf => 0x13_0000,
            Block::PcieVf => 0x20_0000,
            Block::Te => 0xa0_0000,
            Block::Ffu => 0xc0_0000,
            Block::L2Lookup => 0xc8_0000,
            Block::Arp => 0xcc_0000,
            Block::Glort => 0xce_0000,
            Block::Parser => 0xcf_0000,
            Block::Handler => 0xd5_0000,
            Block::CmApply => 0xd4_0000,
            Block::PolicerApply => 0xd6_0000,
            Block::TrigApply => 0xd7_0000,
            Block::Lag => 0xd9_0000,
            Block::FfuMap => 0xda_0000,
            Block::Eacl => 0xdb_0000,
            Block::RxStats => 0xe0_0000,
            Block::PolicerUsage => 0xe4_0000,
            Block::CmUsage => 0xe6_0000,
            Block::HandlerTail => 0xe3_0000,
            Block::L2LookupTcn => 0xe7_0000,
            Block::TrigUsage => 0xe7_8000,
            Block::Mod => 0xe8_0000,
            Block::Sched => 0xf0_0000,
        }
    }
}

/// Absolute word address of `index` within `block`
pub const fn word_addr(block: Block, index: u32) -> u32 {
    block.base() + index
}

/// Access width of a register
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Width {
    Bits32,
    /// Must be accessed with a single 64-bit operation
    Atomic64,
}

impl Width {
    pub const fn words(self) -> u32 {
        match self {
            Width::Bits32 => 1,
            Width::Atomic64 => 2,
        }
    }
}

/// Untyped description of a register or register array, used to validate
/// the map as a whole.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Descriptor {
    pub name: &'static str,
    pub block: Block,
    pub offset: u32,
    pub stride: u32,
    pub count: u32,
    pub width: Width,
}

impl Descriptor {
    /// Word address of the first element
    pub const fn first_word(&self) -> u32 {
        word_addr(self.block, self.offset)
    }

    /// Word address one past the last word touched by the last element
    pub const fn end_word(&self) -> u32 {
        self.first_word()
            + (self.count - 1) * self.stride
            + self.width.words()
    }
}

/// Address of a single 32-bit register whose layout is `T`.
pub struct Reg<T> {
    block: Block,
    index: u32,
    _ty: PhantomData<fn() -> T>,
}

/// Address of a single 64-bit atomic register whose layout is `T`.
pub struct Reg64<T> {
    block: Block,
    index: u32,
    _ty: PhantomData<fn() -> T>,
}

// Derived impls would require `T: Copy`, which the layout types don't need
macro_rules! copy_impls {
    ($($t:ident),*) => {
        $(
            impl<T> Clone for $t<T> {
                fn clone(&self) -> Self {
                    *self
                }
            }
            impl<T> Copy for $t<T> {}
            impl<T> core::fmt::Debug for $t<T> {
                fn fmt(
                    &self,
                    f: &mut core::fmt::Formatter<'_>,
                ) -> core::fmt::Result {
                    write!(f, "{:?}[{:#x}]", self.block, self.index)
                }
            }
            impl<T> PartialEq for $t<T> {
                fn eq(&self, other: &Self) -> bool {
                    self.word() == other.word()
                }
            }
            impl<T> Eq for $t<T> {}
        )*
    };
}
copy_impls!(Reg, Reg64);

impl<T> Reg<T> {
    pub const fn new(block: Block, index: u32) -> Self {
        Self {
            block,
            index,
            _ty: PhantomData,
        }
    }

    /// Absolute word address
    pub const fn word(&self) -> u32 {
        word_addr(self.block, self.index)
    }

    /// Byte offset from the start of BAR4
    pub const fn byte_offset(&self) -> usize {
        self.word() as usize * WORD_SIZE
    }

    pub const fn describe(&self, name: &'static str) -> Descriptor {
        Descriptor {
            name,
            block: self.block,
            offset: self.index,
            stride: 1,
            count: 1,
            width: Width::Bits32,
        }
    }
}

impl<T> Reg64<T> {
    pub const fn new(block: Block, index: u32) -> Self {
        Self {
            block,
            index,
            _ty: PhantomData,
        }
    }

    /// Absolute word address of the low half
    pub const fn word(&self) -> u32 {
        word_addr(self.block, self.index)
    }

    pub const fn byte_offset(&self) -> usize {
        self.word() as usize * WORD_SIZE
    }

    pub const fn describe(&self, name: &'static str) -> Descriptor {
        Descriptor {
            name,
            block: self.block,
            offset: self.index,
            stride: 2,
            count: 1,
            width: Width::Atomic64,
        }
    }
}

/// A one-dimensional array of 32-bit registers.
///
/// Indexing past `len` is a caller bug; it is only caught by a debug
/// assertion.
pub struct RegArray<T> {
    block: Block,
    offset: u32,
    stride: u32,
    len: u32,
    _ty: PhantomData<fn() -> T>,
}

impl<T> RegArray<T> {
    pub const fn new(block: Block, offset: u32, stride: u32, len: u32) -> Self {
        Self {
            block,
            offset,
            stride,
            len,
            _ty: PhantomData,
        }
    }

    pub const fn len(&self) -> u32 {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn at(&self, i: u32) -> Reg<T> {
        debug_assert!(i < self.len);
        Reg::new(self.block, self.offset + i * self.stride)
    }

    pub const fn describe(&self, name: &'static str) -> Descriptor {
        Descriptor {
            name,
            block: self.block,
            offset: self.offset,
            stride: self.stride,
            count: self.len,
            width: Width::Bits32,
        }
    }
}

/// A one-dimensional array of 64-bit atomic registers.
pub struct RegArray64<T> {
    block: Block,
    offset: u32,
    stride: u32,
    len: u32,
    _ty: PhantomData<fn() -> T>,
}

impl<T> RegArray64<T> {
    pub const fn new(block: Block, offset: u32, stride: u32, len: u32) -> Self {
        Self {
            block,
            offset,
            stride,
            len,
            _ty: PhantomData,
        }
    }

    pub const fn len(&self) -> u32 {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn at(&self, i: u32) -> Reg64<T> {
        debug_assert!(i < self.len);
        Reg64::new(self.block, self.offset + i * self.stride)
    }

    pub const fn describe(&self, name: &'static str) -> Descriptor {
        Descriptor {
            name,
            block: self.block,
            offset: self.offset,
            stride: self.stride,
            count: self.len,
            width: Width::Atomic64,
        }
    }
}

/// A two-dimensional array of 32-bit registers, e.g. per-EPL, per-lane.
pub struct RegArray2<T> {
    block: Block,
    offset: u32,
    outer_stride: u32,
    inner_stride: u32,
    outer: u32,
    inner: u32,
    _ty: PhantomData<fn() -> T>,
}

impl<T> RegArray2<T> {
    pub const fn new(
        block: Block,
        offset: u32,
        (outer_stride, outer): (u32, u32),
        (inner_stride, inner): (u32, u32),
    ) -> Self {
        Self {
            block,
            offset,
            outer_stride,
            inner_stride,
            outer,
            inner,
            _ty: PhantomData,
        }
    }

    pub fn at(&self, i: u32, j: u32) -> Reg<T> {
        debug_assert!(i < self.outer && j < self.inner);
        Reg::new(
            self.block,
            self.offset + i * self.outer_stride + j * self.inner_stride,
        )
    }

    /// Describes the last row; rows are assumed to share a layout.
    pub const fn describe(&self, name: &'static str) -> Descriptor {
        Descriptor {
            name,
            block: self.block,
            offset: self.offset + (self.outer - 1) * self.outer_stride,
            stride: self.inner_stride,
            count: self.inner,
            width: Width::Bits32,
        }
    }
}

/// Every register this crate describes, for validation.
pub const MAP: &[Descriptor] = &[
    mgmt::SOFT_RESET.describe("SOFT_RESET"),
    mgmt::FUSE_DATA_0.describe("FUSE_DATA_0"),
    mgmt::BIST_CTRL.describe("BIST_CTRL"),
    mgmt::SCAN_DATA_IN.describe("SCAN_DATA_IN"),
    mgmt::LED_CFG.describe("LED_CFG"),
    mgmt::BSM_SCRATCH.describe("BSM_SCRATCH"),
    mgmt::SOFT_RESET_LOCK.describe("SOFT_RESET_LOCK"),
    mgmt::NVM_VERSION.describe("NVM_VERSION"),
    mgmt::PLL_EPL_CTRL.describe("PLL_EPL_CTRL"),
    mgmt::PLL_EPL_STAT.describe("PLL_EPL_STAT"),
    mgmt::PLL_FABRIC_CTRL.describe("PLL_FABRIC_CTRL"),
    mgmt::PLL_FABRIC_STAT.describe("PLL_FABRIC_STAT"),
    mgmt::PLL_FABRIC_LOCK.describe("PLL_FABRIC_LOCK"),
    port::EPL_CFG_A.describe("EPL_CFG_A"),
    port::AN_CFG.describe("AN_CFG"),
    port::PCIE_CTRL.describe("PCIE_CTRL"),
    port::PCIE_CTRL_EXT.describe("PCIE_CTRL_EXT"),
    port::TE_CFG.describe("TE_CFG"),
    sched::RX_SCHEDULE.describe("SCHED_RX_SCHEDULE"),
    sched::TX_SCHEDULE.describe("SCHED_TX_SCHEDULE"),
    sched::SCHEDULE_CTRL.describe("SCHED_SCHEDULE_CTRL"),
    sched::RXQ_STORAGE_POINTERS.describe("SCHED_RXQ_STORAGE_POINTERS"),
    sched::RXQ_FREELIST_INIT.describe("SCHED_RXQ_FREELIST_INIT"),
    sched::TXQ_TAIL0_PERQ.describe("SCHED_TXQ_TAIL0_PERQ"),
    sched::TXQ_TAIL1_PERQ.describe("SCHED_TXQ_TAIL1_PERQ"),
    sched::TXQ_HEAD_PERQ.describe("SCHED_TXQ_HEAD_PERQ"),
    sched::TXQ_FREELIST_INIT.describe("SCHED_TXQ_FREELIST_INIT"),
];
