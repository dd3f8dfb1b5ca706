// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Packet scheduler registers

use crate::{Block, Reg, RegArray, RegArray64};
use bitfield::bitfield;
use derive_more::{From, Into};

/// Entries in each of the RX and TX polling schedules
pub const SCHEDULE_LEN: u32 = 1024;

/// Multicast RX queues with dedicated storage pointers
pub const RXQ_MCAST_COUNT: u32 = 8;

/// Per-queue TX tables, indexed by `port * 8 + traffic class`
pub const TXQ_PERQ_COUNT: u32 = 384;

bitfield! {
    /// One polling slot of the RX or TX schedule.  Color is always 0.
    #[derive(Copy, Clone, PartialEq, Eq, From, Into)]
    pub struct ScheduleEntry(u32);
    impl Debug;
    pub phys_port, set_phys_port: 7, 0;
    pub port, set_port: 13, 8;
    pub quad, set_quad: 14;
    pub color, set_color: 15;
    pub idle, set_idle: 16;
}
pub const RX_SCHEDULE: RegArray<ScheduleEntry> =
    RegArray::new(Block::Sched, 0x20000, 1, SCHEDULE_LEN);
pub const TX_SCHEDULE: RegArray<ScheduleEntry> =
    RegArray::new(Block::Sched, 0x20400, 1, SCHEDULE_LEN);

bitfield! {
    #[derive(Copy, Clone, PartialEq, Eq, From, Into)]
    pub struct ScheduleCtrl(u32);
    impl Debug;
    pub rx_enable, set_rx_enable: 0;
    pub rx_page, set_rx_page: 1;
    pub rx_max_index, set_rx_max_index: 10, 2;
    pub tx_enable, set_tx_enable: 11;
    pub tx_page, set_tx_page: 12;
    pub tx_max_index, set_tx_max_index: 21, 13;
}
pub const SCHEDULE_CTRL: Reg<ScheduleCtrl> = Reg::new(Block::Sched, 0x20800);

bitfield! {
    #[derive(Copy, Clone, PartialEq, Eq, From, Into)]
    pub struct RxqStoragePointers(u64);
    impl Debug;
    pub head_page, set_head_page: 9, 0;
    pub tail_page, set_tail_page: 19, 10;
    pub head_idx, set_head_idx: 24, 20;
    pub tail_idx, set_tail_idx: 29, 25;
    pub next_page, set_next_page: 39, 30;
}
pub const RXQ_STORAGE_POINTERS: RegArray64<RxqStoragePointers> =
    RegArray64::new(Block::Sched, 0x60400, 2, RXQ_MCAST_COUNT);

/// Each write appends one page index to the RX free list
pub const RXQ_FREELIST_INIT: Reg<u32> = Reg::new(Block::Sched, 0x60410);

pub const TXQ_TAIL0_PERQ: RegArray<u32> =
    RegArray::new(Block::Sched, 0x60600, 1, TXQ_PERQ_COUNT);
pub const TXQ_TAIL1_PERQ: RegArray<u32> =
    RegArray::new(Block::Sched, 0x60800, 1, TXQ_PERQ_COUNT);
pub const TXQ_HEAD_PERQ: RegArray<u32> =
    RegArray::new(Block::Sched, 0x60a00, 1, TXQ_PERQ_COUNT);

/// Each write appends one index to the TX free list
pub const TXQ_FREELIST_INIT: Reg<u32> = Reg::new(Block::Sched, 0x62000);
