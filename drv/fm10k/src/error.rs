// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::lock::LockOwner;
use crate::reset::ResetStep;

/// Top-level error for everything the driver does
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Fm10kError {
    Config(ConfigError),
    Lock(LockError),
    Boot(BootError),
}

/// Problems with caller-supplied configuration, detected before any
/// register is touched.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    NoPorts,
    TooManySlots { count: usize },
    /// Slots must cover `0..N` exactly; this one falls outside it
    SlotOutOfRange { slot: u16 },
    DuplicateSlot { slot: u16 },
    /// A logical port bound to two different physical ports
    DuplicateLogicalPort { logical: u8 },
    LogicalPortOutOfRange { logical: u8 },
    AutonegOnNonEplPort { physical: u8 },
    /// Fewer RX pages than multicast queues (or more than the hardware has)
    RxPoolTooSmall { pages: u32 },
    TxPoolTooSmall { size: u32 },
    McastQueuesOutOfRange { queues: u32 },
    TxQueuesOutOfRange { queues: u32 },
    ZeroFrequency,
    /// The lock client must be allowed at least one claim
    NoClaimAttempts,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LockError {
    /// Firmware predates the soft-reset lock protocol
    Unsupported { firmware: u16 },
    Timeout { owner: LockOwner },
    /// Another software client already holds the lock
    Conflict,
    /// Firmware kept winning the race for the lock word
    ClaimLost,
    UnexpectedOwner { owner: LockOwner },
    Corrupt { raw: u32 },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BootError {
    Reset { step: ResetStep, error: LockError },
    SchedulerEnabled,
}

impl From<ConfigError> for Fm10kError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<LockError> for Fm10kError {
    fn from(e: LockError) -> Self {
        Self::Lock(e)
    }
}

impl From<BootError> for Fm10kError {
    fn from(e: BootError) -> Self {
        Self::Boot(e)
    }
}
