// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Starting the switch once the reset/release sequence is done.

use crate::{config::SwitchConfig, error::Fm10kError, sched, Fm10kRw};
use drv_fm10k_regs::{
    mgmt::{LED_CFG, SCAN_DATA_IN, SOFT_RESET},
    port::{
        AN_CFG, EPL_CFG_A, EPL_COUNT, PCIE_CTRL, PCIE_CTRL_EXT, TE_CFG,
        TE_COUNT,
    },
};
use ringbuf::*;

/// All four lanes of an EPL
const ALL_LANES: u32 = 0xf;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SwitchStep {
    DeassertSwitchReset,
    DisableScan,
    DisableSwitchLoopback,
    ActivateEpls,
    DisableTunnelLoopback,
    InitScheduler,
    EnableLeds,
    AssertSwitchReady,
    EnableAutoneg,
    EnableLtssm,
}

#[derive(Copy, Clone, PartialEq)]
enum Trace {
    None,
    Step(SwitchStep),
    Autoneg { epl: u32, lane: u32 },
    Failed(SwitchStep, Fm10kError),
}
ringbuf!(Trace, 32, Trace::None);

fn step(s: SwitchStep) {
    ringbuf_entry!(Trace::Step(s));
}

/// Takes the switch logic out of reset and brings up the ports.
///
/// This must follow a successful reset/release sequence.  `config` is
/// validated before anything is written.  After that, the only step that
/// can fail is scheduler initialization; if it does, the remaining steps
/// are skipped.
pub fn start(
    rw: &impl Fm10kRw,
    config: &SwitchConfig,
) -> Result<(), Fm10kError> {
    config.validate()?;

    step(SwitchStep::DeassertSwitchReset);
    rw.modify(SOFT_RESET, |r| r.set_switch_reset(false));

    step(SwitchStep::DisableScan);
    rw.modify(SCAN_DATA_IN, |r| r.set_passthru(true));

    step(SwitchStep::DisableSwitchLoopback);
    rw.modify(PCIE_CTRL_EXT, |r| r.set_switch_loopback(false));

    step(SwitchStep::ActivateEpls);
    for epl in 0..EPL_COUNT {
        rw.modify(EPL_CFG_A.at(epl), |r| r.set_active(ALL_LANES));
    }

    step(SwitchStep::DisableTunnelLoopback);
    for te in 0..TE_COUNT {
        rw.modify_atomic(TE_CFG.at(te), |r| {
            r.set_switch_loopback_disable(true)
        });
    }

    step(SwitchStep::InitScheduler);
    if let Err(e) = sched::init(rw, &config.pools, &config.ports) {
        ringbuf_entry!(Trace::Failed(SwitchStep::InitScheduler, e));
        return Err(e);
    }

    step(SwitchStep::EnableLeds);
    rw.modify(LED_CFG, |r| r.set_led_enable(true));

    step(SwitchStep::AssertSwitchReady);
    rw.modify(SOFT_RESET, |r| r.set_switch_ready(true));

    step(SwitchStep::EnableAutoneg);
    for p in config.ports.iter().filter(|p| p.autoneg) {
        if let Some((epl, lane)) = p.epl_lane() {
            ringbuf_entry!(Trace::Autoneg { epl, lane });
            rw.modify(AN_CFG.at(epl, lane), |r| r.set_an_enable(true));
        }
    }

    step(SwitchStep::EnableLtssm);
    rw.modify(PCIE_CTRL, |r| r.set_ltssm_enable(true));

    Ok(())
}
