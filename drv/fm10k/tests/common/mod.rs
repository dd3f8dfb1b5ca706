// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory stand-ins for the chip and the clock.

#![allow(dead_code)]

use drv_fm10k::{
    regs::{mgmt, Reg, Reg64},
    Fm10kRw, Timer,
};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::time::Duration;

/// A single write, as the chip would have seen it
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Op {
    Write32 { word: u32, value: u32 },
    Write64 { word: u32, value: u64 },
}

pub type Words = BTreeMap<u32, u32>;

/// Called before every read with the word about to be read, so a test can
/// play the part of the firmware agent.
pub type ReadHook = Box<dyn FnMut(u32, &mut Words)>;

/// Register file backed by a map of words.  Unwritten words read as zero.
#[derive(Default)]
pub struct FakeFm10k {
    words: RefCell<Words>,
    log: RefCell<Vec<Op>>,
    hook: RefCell<Option<ReadHook>>,
}

impl FakeFm10k {
    pub fn new() -> Self {
        Self::default()
    }

    /// A chip whose firmware reports `version` in the scratch area
    pub fn with_firmware(version: u16) -> Self {
        let f = Self::new();
        f.set(mgmt::NVM_VERSION.word(), version.into());
        f
    }

    pub fn on_read(&self, hook: impl FnMut(u32, &mut Words) + 'static) {
        *self.hook.borrow_mut() = Some(Box::new(hook));
    }

    /// Sets a word without logging it
    pub fn set(&self, word: u32, value: u32) {
        self.words.borrow_mut().insert(word, value);
    }

    pub fn set_reg<T>(&self, reg: Reg<T>, value: T)
    where
        u32: From<T>,
    {
        self.set(reg.word(), value.into());
    }

    pub fn set_reg64<T>(&self, reg: Reg64<T>, value: T)
    where
        u64: From<T>,
    {
        let v = u64::from(value);
        self.set(reg.word(), v as u32);
        self.set(reg.word() + 1, (v >> 32) as u32);
    }

    /// Reads a word without running the hook
    pub fn get(&self, word: u32) -> u32 {
        self.words.borrow().get(&word).copied().unwrap_or(0)
    }

    pub fn get_reg<T: From<u32>>(&self, reg: Reg<T>) -> T {
        self.get(reg.word()).into()
    }

    pub fn get_reg64<T: From<u64>>(&self, reg: Reg64<T>) -> T {
        let lo = u64::from(self.get(reg.word()));
        let hi = u64::from(self.get(reg.word() + 1));
        (lo | (hi << 32)).into()
    }

    pub fn log(&self) -> Vec<Op> {
        self.log.borrow().clone()
    }

    pub fn clear_log(&self) {
        self.log.borrow_mut().clear();
    }

    /// Values written to `word` with 32-bit stores, in order
    pub fn writes_to(&self, word: u32) -> Vec<u32> {
        self.log
            .borrow()
            .iter()
            .filter_map(|op| match *op {
                Op::Write32 { word: w, value } if w == word => Some(value),
                _ => None,
            })
            .collect()
    }

    /// Values written to `word` with 64-bit stores, in order
    pub fn writes64_to(&self, word: u32) -> Vec<u64> {
        self.log
            .borrow()
            .iter()
            .filter_map(|op| match *op {
                Op::Write64 { word: w, value } if w == word => Some(value),
                _ => None,
            })
            .collect()
    }

    fn run_hook(&self, word: u32) {
        if let Some(hook) = self.hook.borrow_mut().as_mut() {
            hook(word, &mut self.words.borrow_mut());
        }
    }
}

impl Fm10kRw for FakeFm10k {
    fn read32(&self, word: u32) -> u32 {
        self.run_hook(word);
        self.get(word)
    }

    fn write32(&self, word: u32, value: u32) {
        self.log.borrow_mut().push(Op::Write32 { word, value });
        self.set(word, value);
    }

    fn read64(&self, word: u32) -> u64 {
        assert_eq!(word % 2, 0, "misaligned 64-bit read at {word:#x}");
        self.run_hook(word);
        u64::from(self.get(word)) | (u64::from(self.get(word + 1)) << 32)
    }

    fn write64(&self, word: u32, value: u64) {
        assert_eq!(word % 2, 0, "misaligned 64-bit write at {word:#x}");
        self.log.borrow_mut().push(Op::Write64 { word, value });
        self.set(word, value as u32);
        self.set(word + 1, (value >> 32) as u32);
    }
}

/// Clock that only moves when something sleeps
#[derive(Default)]
pub struct FakeTimer {
    now: Duration,
    pub sleeps: Vec<Duration>,
}

impl FakeTimer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Timer for FakeTimer {
    fn now(&self) -> Duration {
        self.now
    }

    fn sleep(&mut self, d: Duration) {
        self.sleeps.push(d);
        self.now += d;
    }
}

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}
