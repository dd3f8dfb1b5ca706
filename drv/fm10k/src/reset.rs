// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The reset/release sequence.
//!
//! This puts the switch and port logic into reset, picks the fabric clock,
//! wipes the on-chip memories and lets the logic back out of reset, taking
//! and dropping the soft-reset lock around the parts the firmware agent must
//! not see half-done.  The steps run in a fixed order; if a lock can't be
//! taken, the sequence stops where it is and nothing is rolled back.

use crate::{
    error::{BootError, LockError},
    lock::{LockMode, Release, SoftResetLock},
    pll::{self, ClockSettings, TargetFrequency, MAX_OUT_DIV},
    time::Timer,
    Fm10kRw,
};
use core::time::Duration;
use drv_fm10k_regs::mgmt::{
    bist, BIST_CTRL, PLL_EPL_CTRL, PLL_EPL_STAT, SOFT_RESET,
};
use ringbuf::*;

/// Wait after clearing `SwitchReady` before touching clocks or resets
const READY_SETTLE: Duration = Duration::from_millis(1);

/// Wait after changing the EPL clock divider
const EPL_CLOCK_SETTLE: Duration = Duration::from_millis(1);

/// How long reset is held before anything else happens
const RESET_SETTLE: Duration = Duration::from_millis(1);

/// Time for the BIST engines to clear every memory
const MEMORY_CLEAR: Duration = Duration::from_micros(800);

/// Memories wiped after reset
const CLEARED_MEMORIES: u64 =
    bist::EPL | bist::FABRIC | bist::TUNNEL | bist::CRM | bist::FIBM;

/// Steps of the sequence, in the order they run
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResetStep {
    AcquireLock,
    ClearReady,
    ReduceEplClock,
    AssertReset,
    ReleaseLock,
    ConfigureClock,
    ReacquireLock,
    ClearMemories,
    DeassertReset,
    RestoreEplClock,
    FinalRelease,
    Done,
}

impl ResetStep {
    pub const fn next(self) -> Self {
        use ResetStep::*;
        match self {
            AcquireLock => ClearReady,
            ClearReady => ReduceEplClock,
            ReduceEplClock => AssertReset,
            AssertReset => ReleaseLock,
            ReleaseLock => ConfigureClock,
            ConfigureClock => ReacquireLock,
            ReacquireLock => ClearMemories,
            ClearMemories => DeassertReset,
            DeassertReset => RestoreEplClock,
            RestoreEplClock => FinalRelease,
            FinalRelease => Done,
            Done => Done,
        }
    }
}

/// Result of a completed sequence
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ResetOutcome {
    pub clock: ClockSettings,
    pub lock_mode: LockMode,
    /// The last release is reported here rather than failing the sequence:
    /// by that point the chip is out of reset either way.
    pub final_release: Result<Release, LockError>,
}

#[derive(Copy, Clone, PartialEq)]
enum Trace {
    None,
    Step(ResetStep),
    Unprotected { step: ResetStep, firmware: u16 },
    EplDivider { saved: u32 },
    FinalReleaseFailed(LockError),
}
ringbuf!(Trace, 32, Trace::None);

pub struct ResetSequence<'a, R, T> {
    rw: &'a R,
    timer: &'a mut T,
    lock: &'a mut SoftResetLock,
    step: Option<ResetStep>,
    mode: LockMode,
    saved_epl_div: u32,
}

impl<'a, R: Fm10kRw, T: Timer> ResetSequence<'a, R, T> {
    pub fn new(
        rw: &'a R,
        timer: &'a mut T,
        lock: &'a mut SoftResetLock,
    ) -> Self {
        Self {
            rw,
            timer,
            lock,
            step: None,
            mode: LockMode::Exclusive,
            saved_epl_div: 0,
        }
    }

    /// The most recent step entered, if any
    pub fn step(&self) -> Option<ResetStep> {
        self.step
    }

    fn enter(&mut self, step: ResetStep) {
        debug_assert_eq!(
            self.step.map_or(ResetStep::AcquireLock, ResetStep::next),
            step
        );
        ringbuf_entry!(Trace::Step(step));
        self.step = Some(step);
    }

    /// Takes the lock for the current step.  Firmware too old to honor the
    /// lock is not an error; the rest of the sequence runs unprotected.
    fn acquire(
        &mut self,
        step: ResetStep,
        timeout: Duration,
    ) -> Result<(), BootError> {
        match self.lock.acquire(self.rw, &mut *self.timer, timeout) {
            Ok(()) => Ok(()),
            Err(LockError::Unsupported { firmware }) => {
                ringbuf_entry!(Trace::Unprotected { step, firmware });
                self.mode = LockMode::Unprotected;
                Ok(())
            }
            Err(error) => Err(BootError::Reset { step, error }),
        }
    }

    /// Pulses the EPL PLL's apply bit so a new divider takes effect
    fn apply_epl_divider(&mut self) {
        self.rw.modify(PLL_EPL_STAT, |r| r.set_freq_change(true));
        self.rw.modify(PLL_EPL_STAT, |r| r.set_freq_change(false));
    }

    pub fn run(
        &mut self,
        target: TargetFrequency,
        timeout: Duration,
    ) -> Result<ResetOutcome, BootError> {
        // Each run walks the whole sequence from the top
        self.step = None;
        self.mode = LockMode::Exclusive;

        self.enter(ResetStep::AcquireLock);
        self.acquire(ResetStep::AcquireLock, timeout)?;

        self.enter(ResetStep::ClearReady);
        self.rw.modify(SOFT_RESET, |r| r.set_switch_ready(false));
        self.timer.sleep(READY_SETTLE);

        // Slow the port logic right down to limit in-rush current
        self.enter(ResetStep::ReduceEplClock);
        self.saved_epl_div = self.rw.read(PLL_EPL_CTRL).out_div();
        ringbuf_entry!(Trace::EplDivider {
            saved: self.saved_epl_div
        });
        self.rw.modify(PLL_EPL_CTRL, |r| r.set_out_div(MAX_OUT_DIV.into()));
        self.apply_epl_divider();
        self.timer.sleep(EPL_CLOCK_SETTLE);

        self.enter(ResetStep::AssertReset);
        self.rw.modify(SOFT_RESET, |r| {
            r.set_switch_reset(true);
            r.set_epl_reset(true);
        });
        self.timer.sleep(RESET_SETTLE);

        self.enter(ResetStep::ReleaseLock);
        if self.mode == LockMode::Exclusive {
            self.lock
                .release(self.rw)
                .map_err(|error| BootError::Reset {
                    step: ResetStep::ReleaseLock,
                    error,
                })?;
        }

        self.enter(ResetStep::ConfigureClock);
        let clock = pll::configure(self.rw, &mut *self.timer, target);

        self.enter(ResetStep::ReacquireLock);
        self.acquire(ResetStep::ReacquireLock, timeout)?;

        self.enter(ResetStep::ClearMemories);
        self.rw.modify_atomic(BIST_CTRL, |r| {
            r.set_run(r.run() | CLEARED_MEMORIES);
            r.set_mode(r.mode() | CLEARED_MEMORIES);
        });
        self.timer.sleep(MEMORY_CLEAR);
        self.rw.modify_atomic(BIST_CTRL, |r| {
            r.set_run(r.run() & !CLEARED_MEMORIES);
            r.set_mode(r.mode() & !CLEARED_MEMORIES);
        });

        self.enter(ResetStep::DeassertReset);
        self.rw.modify(SOFT_RESET, |r| {
            r.set_switch_reset(false);
            r.set_epl_reset(false);
        });

        self.enter(ResetStep::RestoreEplClock);
        let saved = self.saved_epl_div;
        self.rw.modify(PLL_EPL_CTRL, |r| r.set_out_div(saved));
        self.apply_epl_divider();

        self.enter(ResetStep::FinalRelease);
        let final_release = self.lock.release(self.rw);
        if let Err(e) = final_release {
            ringbuf_entry!(Trace::FinalReleaseFailed(e));
        }

        self.enter(ResetStep::Done);
        Ok(ResetOutcome {
            clock,
            lock_mode: self.mode,
            final_release,
        })
    }
}
