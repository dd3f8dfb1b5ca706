// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Management block registers: resets, fuses, BIST, scan chain, LEDs, boot
//! state machine scratch space and the PLL controls in `PORTS_MGMT`.

use crate::{Block, Reg, Reg64, RegArray};
use bitfield::bitfield;
use derive_more::{From, Into};

bitfield! {
    #[derive(Copy, Clone, PartialEq, Eq, From, Into)]
    pub struct SoftReset(u32);
    impl Debug;
    pub cold_reset, set_cold_reset: 0;
    pub epl_reset, set_epl_reset: 1;
    pub switch_reset, set_switch_reset: 2;
    pub switch_ready, set_switch_ready: 3;
    pub pcie_reset, set_pcie_reset: 12, 4;
    pub pcie_active, set_pcie_active: 21, 13;
}
pub const SOFT_RESET: Reg<SoftReset> = Reg::new(Block::Mgmt, 0x3);

bitfield! {
    /// Fuse word carrying the part number.  Only the SKU field is decoded.
    #[derive(Copy, Clone, PartialEq, Eq, From, Into)]
    pub struct FuseData0(u32);
    impl Debug;
    pub sku, _: 15, 11;
}
pub const FUSE_DATA_0: Reg<FuseData0> = Reg::new(Block::Mgmt, 0xc0e);

bitfield! {
    /// BIST control.  The low word selects which blocks run, the high word
    /// which of them are in memory-clear mode; both halves must change in
    /// a single 64-bit write.
    #[derive(Copy, Clone, PartialEq, Eq, From, Into)]
    pub struct BistCtrl(u64);
    impl Debug;
    pub run, set_run: 15, 0;
    pub mode, set_mode: 47, 32;
}
pub const BIST_CTRL: Reg64<BistCtrl> = Reg64::new(Block::Mgmt, 0xc10);

/// Bit positions shared by the `run` and `mode` fields of [`BistCtrl`]
pub mod bist {
    /// PCIe hosts 0-8 occupy bits 0-8
    pub const PCIE: u64 = 0x1ff;
    pub const EPL: u64 = 1 << 9;
    pub const FABRIC: u64 = 1 << 10;
    pub const TUNNEL: u64 = 1 << 11;
    pub const BSM: u64 = 1 << 12;
    pub const CRM: u64 = 1 << 13;
    pub const FIBM: u64 = 1 << 14;
    pub const SBM: u64 = 1 << 15;
}

bitfield! {
    #[derive(Copy, Clone, PartialEq, Eq, From, Into)]
    pub struct ScanDataIn(u32);
    impl Debug;
    pub scan_data, set_scan_data: 24, 0;
    pub shift_in, set_shift_in: 25;
    pub shift_out, set_shift_out: 26;
    pub update_nodes, set_update_nodes: 27;
    pub inject, set_inject: 28;
    pub drain, set_drain: 29;
    pub passthru, set_passthru: 30;
    pub single, set_single: 31;
}
pub const SCAN_DATA_IN: Reg<ScanDataIn> = Reg::new(Block::Mgmt, 0xc2d);

bitfield! {
    #[derive(Copy, Clone, PartialEq, Eq, From, Into)]
    pub struct LedCfg(u32);
    impl Debug;
    pub led_freq, set_led_freq: 23, 0;
    pub led_enable, set_led_enable: 24;
}
pub const LED_CFG: Reg<LedCfg> = Reg::new(Block::Mgmt, 0xc2b);

/// Boot state machine scratch space, shared with the firmware agent
pub const BSM_SCRATCH: RegArray<u32> =
    RegArray::new(Block::Mgmt, 0x800, 1, 0x400);

bitfield! {
    /// Soft-reset lock word.  Owner codes are free (0), firmware (1) and
    /// software (2); 3 is never written by a well-behaved agent.
    #[derive(Copy, Clone, PartialEq, Eq, From, Into)]
    pub struct SoftResetLock(u32);
    impl Debug;
    pub owner, set_owner: 1, 0;
}
pub const SOFT_RESET_LOCK: Reg<SoftResetLock> =
    Reg::new(Block::Mgmt, 0x800 + 400);

bitfield! {
    #[derive(Copy, Clone, PartialEq, Eq, From, Into)]
    pub struct NvmVersion(u32);
    impl Debug;
    pub version, _: 15, 0;
}
pub const NVM_VERSION: Reg<NvmVersion> = Reg::new(Block::Mgmt, 0x800 + 401);

////////////////////////////////////////////////////////////////////////////////
// PLLs, in the PORTS_MGMT block

bitfield! {
    /// Control word shared by the EPL and fabric PLLs
    #[derive(Copy, Clone, PartialEq, Eq, From, Into)]
    pub struct PllCtrl(u32);
    impl Debug;
    pub nreset, set_nreset: 0;
    pub enable, set_enable: 1;
    pub halt, set_halt: 2;
    pub ref_div, set_ref_div: 8, 3;
    pub fb_div4, set_fb_div4: 9;
    pub fb_div255, set_fb_div255: 17, 10;
    pub out_div, set_out_div: 23, 18;
    pub out_mux_sel, set_out_mux_sel: 26, 24;
}

bitfield! {
    #[derive(Copy, Clone, PartialEq, Eq, From, Into)]
    pub struct PllStat(u32);
    impl Debug;
    pub locked, _: 0;
    // Writing 1 then 0 applies a new output divider
    pub freq_change, set_freq_change: 1;
    pub misc, _: 9, 2;
}

pub const PLL_EPL_CTRL: Reg<PllCtrl> = Reg::new(Block::PortsMgmt, 0x0);
pub const PLL_EPL_STAT: Reg<PllStat> = Reg::new(Block::PortsMgmt, 0x1);
pub const PLL_FABRIC_CTRL: Reg<PllCtrl> = Reg::new(Block::PortsMgmt, 0x2);
pub const PLL_FABRIC_STAT: Reg<PllStat> = Reg::new(Block::PortsMgmt, 0x3);

bitfield! {
    #[derive(Copy, Clone, PartialEq, Eq, From, Into)]
    pub struct PllFabricLock(u32);
    impl Debug;
    pub feature_code, set_feature_code: 3, 0;
    pub freq_sel, set_freq_sel: 7, 4;
}
pub const PLL_FABRIC_LOCK: Reg<PllFabricLock> =
    Reg::new(Block::PortsMgmt, 0x4);
