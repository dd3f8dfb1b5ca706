// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bring-up driver for the FM10000 family of switch chips.
//!
//! The chip is driven entirely through its BAR4 register window.  Bringing
//! it from power-on to a state where it forwards traffic involves:
//!
//! - taking the soft-reset lock, which is shared with the on-chip firmware
//!   agent (see [`lock`]);
//! - walking the reset/release sequence (see [`reset`]), which picks a
//!   fabric clock (see [`pll`]) partway through;
//! - seeding the scheduler's free lists and polling schedules (see
//!   [`sched`]);
//! - releasing the switch logic and enabling the ports (see [`switch`]).
//!
//! Everything is written against the [`Fm10kRw`] and [`time::Timer`]
//! traits, so that it can be exercised against fakes.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod config;
pub mod error;
pub mod lock;
pub mod mmio;
pub mod pll;
pub mod reset;
pub mod sched;
pub mod switch;
pub mod time;

use drv_fm10k_regs::{Reg, Reg64};

pub use config::{LockConfig, PoolConfig, PortMapping, SwitchConfig};
pub use drv_fm10k_regs as regs;
pub use error::{BootError, ConfigError, Fm10kError, LockError};
pub use lock::{LockOwner, OwnerId, SoftResetLock};
pub use reset::{ResetOutcome, ResetStep};
pub use time::{RetryPolicy, Timer};

/// This trait abstracts over various ways of talking to an FM10K.
///
/// Addresses are absolute word addresses within BAR4.  Implementations are
/// not expected to bounds-check them; the register map is validated by its
/// own tests.
pub trait Fm10kRw {
    fn read32(&self, word: u32) -> u32;
    fn write32(&self, word: u32, value: u32);

    /// Reads a register documented as 64-bit atomic.  This must be a single
    /// 64-bit load, never two 32-bit loads.
    fn read64(&self, word: u32) -> u64;

    /// Writes a register documented as 64-bit atomic with a single store.
    fn write64(&self, word: u32, value: u64);

    fn read<T>(&self, reg: Reg<T>) -> T
    where
        T: From<u32>,
    {
        self.read32(reg.word()).into()
    }

    fn write<T>(&self, reg: Reg<T>, value: T)
    where
        u32: From<T>,
    {
        self.write32(reg.word(), value.into())
    }

    /// Performs a write operation on the given register, where the value is
    /// calculated by calling f(0).  This is helpful as a way to reduce manual
    /// type information.
    fn write_with<T, F>(&self, reg: Reg<T>, f: F)
    where
        T: From<u32>,
        u32: From<T>,
        F: FnOnce(&mut T),
    {
        let mut data = 0.into();
        f(&mut data);
        self.write(reg, data)
    }

    /// Performs a read-modify-write operation on an FM10K register
    fn modify<T, F>(&self, reg: Reg<T>, f: F)
    where
        T: From<u32>,
        u32: From<T>,
        F: FnOnce(&mut T),
    {
        let mut data = self.read(reg);
        f(&mut data);
        self.write(reg, data)
    }

    fn read_atomic<T>(&self, reg: Reg64<T>) -> T
    where
        T: From<u64>,
    {
        self.read64(reg.word()).into()
    }

    fn write_atomic<T>(&self, reg: Reg64<T>, value: T)
    where
        u64: From<T>,
    {
        self.write64(reg.word(), value.into())
    }

    fn write_atomic_with<T, F>(&self, reg: Reg64<T>, f: F)
    where
        T: From<u64>,
        u64: From<T>,
        F: FnOnce(&mut T),
    {
        let mut data = 0.into();
        f(&mut data);
        self.write_atomic(reg, data)
    }

    /// Read-modify-write of a 64-bit atomic register.  All field updates
    /// happen in memory; the hardware sees one load and one store.
    fn modify_atomic<T, F>(&self, reg: Reg64<T>, f: F)
    where
        T: From<u64>,
        u64: From<T>,
        F: FnOnce(&mut T),
    {
        let mut data = self.read_atomic(reg);
        f(&mut data);
        self.write_atomic(reg, data)
    }
}

impl<R: Fm10kRw + ?Sized> Fm10kRw for &R {
    fn read32(&self, word: u32) -> u32 {
        (**self).read32(word)
    }
    fn write32(&self, word: u32, value: u32) {
        (**self).write32(word, value)
    }
    fn read64(&self, word: u32) -> u64 {
        (**self).read64(word)
    }
    fn write64(&self, word: u32, value: u64) {
        (**self).write64(word, value)
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Top-level state wrapper for an FM10K chip.
pub struct Fm10k<'a, R, T> {
    pub rw: &'a R,
    pub timer: &'a mut T,
    lock: SoftResetLock,
}

impl<R: Fm10kRw, T> Fm10kRw for Fm10k<'_, R, T> {
    fn read32(&self, word: u32) -> u32 {
        self.rw.read32(word)
    }
    fn write32(&self, word: u32, value: u32) {
        self.rw.write32(word, value)
    }
    fn read64(&self, word: u32) -> u64 {
        self.rw.read64(word)
    }
    fn write64(&self, word: u32, value: u64) {
        self.rw.write64(word, value)
    }
}

impl<'a, R: Fm10kRw, T: Timer> Fm10k<'a, R, T> {
    pub fn new(rw: &'a R, timer: &'a mut T, lock: &LockConfig) -> Self {
        Self {
            rw,
            timer,
            lock: SoftResetLock::new(
                lock.owner,
                lock.min_firmware,
                lock.policy(),
            ),
        }
    }

    /// Access to the lock client, e.g. to inspect who holds it
    pub fn lock(&self) -> &SoftResetLock {
        &self.lock
    }

    /// Runs the whole bring-up: checks `config`, resets the chip and picks
    /// its clock, then starts the switch.
    ///
    /// Nothing is written to the chip if `config` is inconsistent.  Any
    /// failure after that point leaves the chip wherever it stopped; the
    /// caller may run the sequence again from the top.
    pub fn bring_up(
        &mut self,
        config: &SwitchConfig,
    ) -> Result<ResetOutcome, Fm10kError> {
        config.validate()?;
        let outcome = self.reset_release(config)?;
        self.start_switch(config)?;
        Ok(outcome)
    }

    /// Runs the reset/release sequence on its own.  `config` is assumed to
    /// have been validated.
    pub fn reset_release(
        &mut self,
        config: &SwitchConfig,
    ) -> Result<ResetOutcome, Fm10kError> {
        let mut seq = reset::ResetSequence::new(
            self.rw,
            &mut *self.timer,
            &mut self.lock,
        );
        Ok(seq.run(config.target_frequency(), config.lock_timeout())?)
    }

    /// Releases the switch logic from reset and enables traffic.  Nothing is
    /// written if `config` is inconsistent.
    pub fn start_switch(
        &mut self,
        config: &SwitchConfig,
    ) -> Result<(), Fm10kError> {
        switch::start(self.rw, config)
    }
}
