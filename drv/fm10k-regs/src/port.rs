// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Port-side registers: Ethernet port logic (EPL), the PCIe function and
//! the tunnel engines.

use crate::{Block, Reg, RegArray, RegArray2, RegArray64};
use bitfield::bitfield;
use derive_more::{From, Into};

/// Number of Ethernet port logic blocks
pub const EPL_COUNT: u32 = 9;

/// Lanes per EPL
pub const EPL_LANES: u32 = 4;

/// Number of tunnel engines
pub const TE_COUNT: u32 = 2;

bitfield! {
    #[derive(Copy, Clone, PartialEq, Eq, From, Into)]
    pub struct EplCfgA(u32);
    impl Debug;
    pub speed_up, set_speed_up: 0;
    pub time_out, set_time_out: 6, 1;
    // One bit per lane
    pub active, set_active: 10, 7;
    pub skew_tolerance, set_skew_tolerance: 16, 11;
}
pub const EPL_CFG_A: RegArray<EplCfgA> =
    RegArray::new(Block::Epl, 0x304, 0x400, EPL_COUNT);

bitfield! {
    /// Per-lane auto-negotiation configuration.  Only the enable bit is
    /// driven here.
    #[derive(Copy, Clone, PartialEq, Eq, From, Into)]
    pub struct AnCfg(u32);
    impl Debug;
    pub an_enable, set_an_enable: 0;
}
pub const AN_CFG: RegArray2<AnCfg> = RegArray2::new(
    Block::Epl,
    0x29,
    (0x400, EPL_COUNT),
    (0x80, EPL_LANES),
);

bitfield! {
    #[derive(Copy, Clone, PartialEq, Eq, From, Into)]
    pub struct PcieCtrl(u32);
    impl Debug;
    pub ltssm_enable, set_ltssm_enable: 0;
    pub req_retry_en, set_req_retry_en: 1;
    pub bar4_allowed, set_bar4_allowed: 2;
    pub rx_laneflip_en, set_rx_laneflip_en: 4;
    pub tx_laneflip_en, set_tx_laneflip_en: 5;
}
pub const PCIE_CTRL: Reg<PcieCtrl> = Reg::new(Block::PciePf, 0x0);

bitfield! {
    #[derive(Copy, Clone, PartialEq, Eq, From, Into)]
    pub struct PcieCtrlExt(u32);
    impl Debug;
    pub ns_dis, set_ns_dis: 0;
    pub ro_dis, set_ro_dis: 1;
    pub switch_loopback, set_switch_loopback: 2;
}
pub const PCIE_CTRL_EXT: Reg<PcieCtrlExt> = Reg::new(Block::PciePf, 0x1);

bitfield! {
    /// Tunnel engine configuration.  Bits 63:26 are reserved.
    #[derive(Copy, Clone, PartialEq, Eq, From, Into)]
    pub struct TeCfg(u64);
    impl Debug;
    pub outer_ttl, set_outer_ttl: 7, 0;
    pub outer_tos, set_outer_tos: 15, 8;
    pub derive_outer_tos, set_derive_outer_tos: 16;
    pub not_ip, set_not_ip: 18, 17;
    pub ip_not_tcp_not_udp, set_ip_not_tcp_not_udp: 20, 19;
    pub ip_is_tcp_or_udp, set_ip_is_tcp_or_udp: 22, 21;
    pub verify_decap_csum, set_verify_decap_csum: 23;
    pub update_old_header_csum, set_update_old_header_csum: 24;
    pub switch_loopback_disable, set_switch_loopback_disable: 25;
}
pub const TE_CFG: RegArray64<TeCfg> =
    RegArray64::new(Block::Te, 0x55a02, 0x100000, TE_COUNT);
