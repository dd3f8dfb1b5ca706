// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scheduler resource initialization.
//!
//! The scheduler keeps its free page and queue lists in hardware.  Each
//! list is seeded by writing indices, one at a time and in ascending order,
//! to a push register: write order becomes chain order, and the last write
//! becomes the tail.  This all has to happen while the scheduler is
//! disabled, since it starts consuming the lists as soon as it is enabled.

use crate::{
    config::{validate_ports, PoolConfig, PortMapping},
    error::{BootError, Fm10kError},
    Fm10kRw,
};
use drv_fm10k_regs::sched::{
    ScheduleEntry, RXQ_FREELIST_INIT, RXQ_STORAGE_POINTERS, RX_SCHEDULE,
    SCHEDULE_CTRL, TXQ_FREELIST_INIT, TXQ_HEAD_PERQ, TXQ_TAIL0_PERQ,
    TXQ_TAIL1_PERQ, TX_SCHEDULE,
};
use ringbuf::*;

#[derive(Copy, Clone, PartialEq)]
enum Trace {
    None,
    AlreadyEnabled(u32),
    RxFreeList { first: u32, end: u32 },
    TxFreeList { first: u32, end: u32 },
    Enabled { slots: u32 },
}
ringbuf!(Trace, 8, Trace::None);

/// Packs a port's polling slot word.  Color is always 0.
pub fn schedule_entry(port: &PortMapping) -> ScheduleEntry {
    let mut e = ScheduleEntry::from(0);
    e.set_phys_port(port.physical.into());
    e.set_port(port.logical.into());
    e.set_quad(port.quad);
    e.set_idle(port.idle);
    e
}

/// Seeds the scheduler's free lists and schedule tables, then enables it.
///
/// `pools` and `ports` are checked first, and nothing is written unless
/// they are consistent; in particular, the ports' slots must cover
/// `0..ports.len()` exactly, since the enabled range is `0..ports.len()`.
///
/// Returns the number of schedule slots enabled.
pub fn init(
    rw: &impl Fm10kRw,
    pools: &PoolConfig,
    ports: &[PortMapping],
) -> Result<u32, Fm10kError> {
    pools.validate()?;
    validate_ports(ports)?;

    let ctrl = rw.read(SCHEDULE_CTRL);
    if ctrl.rx_enable() || ctrl.tx_enable() {
        ringbuf_entry!(Trace::AlreadyEnabled(ctrl.into()));
        return Err(BootError::SchedulerEnabled.into());
    }

    // Multicast queues each start as a single self-linked page
    for q in 0..pools.mcast_queues {
        rw.write_atomic_with(RXQ_STORAGE_POINTERS.at(q), |r| {
            let page = u64::from(q);
            r.set_head_page(page);
            r.set_tail_page(page);
            r.set_next_page(page);
        });
    }

    ringbuf_entry!(Trace::RxFreeList {
        first: pools.mcast_queues,
        end: pools.rx_pages,
    });
    for page in pools.mcast_queues..pools.rx_pages {
        rw.write(RXQ_FREELIST_INIT, page);
    }

    let queues = pools.tx_queues();
    for q in 0..queues {
        rw.write(TXQ_HEAD_PERQ.at(q), q);
        rw.write(TXQ_TAIL0_PERQ.at(q), q);
        rw.write(TXQ_TAIL1_PERQ.at(q), q);
    }

    ringbuf_entry!(Trace::TxFreeList {
        first: queues,
        end: pools.tx_pool_size,
    });
    for i in queues..pools.tx_pool_size {
        rw.write(TXQ_FREELIST_INIT, i);
    }

    for port in ports {
        let entry = schedule_entry(port);
        let slot = u32::from(port.slot);
        rw.write(RX_SCHEDULE.at(slot), entry);
        rw.write(TX_SCHEDULE.at(slot), entry);
    }

    let slots = ports.len() as u32;
    let max_index = slots - 1;
    rw.write_with(SCHEDULE_CTRL, |r| {
        r.set_rx_enable(true);
        r.set_rx_max_index(max_index);
        r.set_tx_enable(true);
        r.set_tx_max_index(max_index);
    });
    ringbuf_entry!(Trace::Enabled { slots });
    Ok(slots)
}
