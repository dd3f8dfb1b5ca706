// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Client for the soft-reset lock.
//!
//! The lock is a two-bit owner code in a boot state machine scratch
//! register, shared with the firmware agent running on the chip.  There is
//! no compare-and-swap: we wait for the word to read free, write our own
//! code, give the firmware a moment to do the same, and read it back to see
//! who won.
//!
//! The lock word only records "software", not which software client; the
//! [`SoftResetLock`] object remembers that on its own.

use crate::{
    error::LockError,
    time::{RetryPolicy, Timer},
    Fm10kRw,
};
use core::time::Duration;
use drv_fm10k_regs::mgmt::{NVM_VERSION, SOFT_RESET_LOCK};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use ringbuf::*;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive)]
pub enum LockOwner {
    Free = 0,
    Firmware = 1,
    Software = 2,
}

/// Identifies a software client of the lock
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub u8);

/// Successful outcomes of [`SoftResetLock::release`]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Release {
    Released,
    /// Nobody held the lock; nothing was written
    AlreadyFree,
}

/// Whether a sequence ran while holding the lock
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LockMode {
    Exclusive,
    /// Firmware is too old to take part in the protocol, so the sequence ran
    /// without excluding it
    Unprotected,
}

#[derive(Copy, Clone, PartialEq)]
enum Trace {
    None,
    Unsupported { firmware: u16 },
    AlreadyHeld(OwnerId),
    Busy { owner: LockOwner, polls: u32 },
    Timeout { owner: LockOwner, polls: u32 },
    ClaimLost { attempt: u32 },
    Acquired { owner: OwnerId, attempt: u32 },
    Released,
    AlreadyFree,
    UnexpectedOwner(LockOwner),
}
ringbuf!(Trace, 16, Trace::None);

pub struct SoftResetLock {
    holder: Option<OwnerId>,
    owner: OwnerId,
    min_firmware: u16,
    policy: RetryPolicy,
}

impl SoftResetLock {
    /// `owner` is the identity used by [`Self::acquire`]; `min_firmware` is
    /// the oldest firmware that honors the lock.
    pub fn new(owner: OwnerId, min_firmware: u16, policy: RetryPolicy) -> Self {
        Self {
            holder: None,
            owner,
            min_firmware,
            policy,
        }
    }

    /// The client that currently holds the lock through this object, if any
    pub fn holder(&self) -> Option<OwnerId> {
        self.holder
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Reads the lock word without touching it
    pub fn owner(&self, rw: &impl Fm10kRw) -> Result<LockOwner, LockError> {
        let raw = rw.read(SOFT_RESET_LOCK).owner();
        LockOwner::from_u32(raw).ok_or(LockError::Corrupt { raw })
    }

    fn check_firmware(&self, rw: &impl Fm10kRw) -> Result<(), LockError> {
        let firmware = rw.read(NVM_VERSION).version() as u16;
        if firmware < self.min_firmware {
            ringbuf_entry!(Trace::Unsupported { firmware });
            return Err(LockError::Unsupported { firmware });
        }
        Ok(())
    }

    /// Takes the lock on behalf of the default owner
    pub fn acquire(
        &mut self,
        rw: &impl Fm10kRw,
        timer: &mut impl Timer,
        timeout: Duration,
    ) -> Result<(), LockError> {
        self.try_acquire(rw, timer, self.owner, timeout)
    }

    /// Takes the lock for `owner`, waiting up to `timeout` for the firmware
    /// to let go of it.
    ///
    /// If `owner` already holds the lock this returns at once.  If some
    /// other software client holds it, this fails at once with
    /// [`LockError::Conflict`] rather than waiting for a release that may
    /// never come.
    pub fn try_acquire(
        &mut self,
        rw: &impl Fm10kRw,
        timer: &mut impl Timer,
        owner: OwnerId,
        timeout: Duration,
    ) -> Result<(), LockError> {
        self.check_firmware(rw)?;

        if self.owner(rw)? == LockOwner::Software {
            return match self.holder {
                Some(h) if h == owner => {
                    ringbuf_entry!(Trace::AlreadyHeld(owner));
                    Ok(())
                }
                _ => Err(LockError::Conflict),
            };
        }
        // Whatever we thought we held, the hardware says otherwise
        self.holder = None;

        let start = timer.now();
        let mut polls = 0;
        for attempt in 1..=self.policy.claim_attempts {
            loop {
                match self.owner(rw)? {
                    LockOwner::Free => break,
                    LockOwner::Software => return Err(LockError::Conflict),
                    owner => {
                        if timer.now().saturating_sub(start) >= timeout {
                            ringbuf_entry!(Trace::Timeout { owner, polls });
                            return Err(LockError::Timeout { owner });
                        }
                        polls += 1;
                        ringbuf_entry!(Trace::Busy { owner, polls });
                        timer.sleep(self.policy.backoff.delay(polls));
                    }
                }
            }

            rw.modify(SOFT_RESET_LOCK, |r| {
                r.set_owner(LockOwner::Software as u32)
            });
            timer.sleep(self.policy.settle);

            if self.owner(rw)? == LockOwner::Software {
                ringbuf_entry!(Trace::Acquired { owner, attempt });
                self.holder = Some(owner);
                return Ok(());
            }
            ringbuf_entry!(Trace::ClaimLost { attempt });
        }
        Err(LockError::ClaimLost)
    }

    /// Hands the lock back.  Releasing a lock that is already free is
    /// harmless and reported as [`Release::AlreadyFree`].
    pub fn release(
        &mut self,
        rw: &impl Fm10kRw,
    ) -> Result<Release, LockError> {
        self.check_firmware(rw)?;
        match self.owner(rw)? {
            LockOwner::Software => {
                rw.modify(SOFT_RESET_LOCK, |r| {
                    r.set_owner(LockOwner::Free as u32)
                });
                self.holder = None;
                ringbuf_entry!(Trace::Released);
                Ok(Release::Released)
            }
            LockOwner::Free => {
                self.holder = None;
                ringbuf_entry!(Trace::AlreadyFree);
                Ok(Release::AlreadyFree)
            }
            owner => {
                ringbuf_entry!(Trace::UnexpectedOwner(owner));
                Err(LockError::UnexpectedOwner { owner })
            }
        }
    }
}
