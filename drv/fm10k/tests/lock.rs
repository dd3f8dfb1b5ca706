// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod common;

use common::*;
use drv_fm10k::{
    lock::Release,
    regs::mgmt::SOFT_RESET_LOCK,
    LockError, LockOwner, OwnerId, RetryPolicy, SoftResetLock,
};

const MIN_FIRMWARE: u16 = 0x0102;
const LOCK: u32 = SOFT_RESET_LOCK.word();

fn client() -> SoftResetLock {
    SoftResetLock::new(OwnerId(1), MIN_FIRMWARE, RetryPolicy::default())
}

fn chip() -> FakeFm10k {
    FakeFm10k::with_firmware(MIN_FIRMWARE)
}

#[test]
fn acquire_then_release_returns_to_free() {
    let fm = chip();
    let mut timer = FakeTimer::new();
    let mut lock = client();

    lock.try_acquire(&fm, &mut timer, OwnerId(1), ms(100)).unwrap();
    assert_eq!(lock.owner(&fm), Ok(LockOwner::Software));
    assert_eq!(lock.holder(), Some(OwnerId(1)));
    // One settle delay, no backoff
    assert_eq!(timer.sleeps, [RetryPolicy::default().settle]);

    assert_eq!(lock.release(&fm), Ok(Release::Released));
    assert_eq!(lock.owner(&fm), Ok(LockOwner::Free));
    assert_eq!(lock.holder(), None);
    assert_eq!(fm.writes_to(LOCK), [2, 0]);
}

#[test]
fn release_of_free_lock_is_harmless() {
    let fm = chip();
    let mut lock = client();
    assert_eq!(lock.release(&fm), Ok(Release::AlreadyFree));
    assert_eq!(lock.release(&fm), Ok(Release::AlreadyFree));
    assert_eq!(lock.owner(&fm), Ok(LockOwner::Free));
    assert!(fm.log().is_empty());
}

#[test]
fn second_owner_conflicts_without_waiting() {
    let fm = chip();
    let mut timer = FakeTimer::new();
    let mut lock = client();

    lock.try_acquire(&fm, &mut timer, OwnerId(1), ms(100)).unwrap();
    let sleeps = timer.sleeps.len();

    assert_eq!(
        lock.try_acquire(&fm, &mut timer, OwnerId(2), ms(100)),
        Err(LockError::Conflict)
    );
    assert_eq!(timer.sleeps.len(), sleeps);

    // The holder itself gets straight back in
    lock.try_acquire(&fm, &mut timer, OwnerId(1), ms(100)).unwrap();
    assert_eq!(timer.sleeps.len(), sleeps);
    assert_eq!(fm.writes_to(LOCK), [2]);
}

#[test]
fn other_software_client_conflicts() {
    // Lock word already says "software", but not on our behalf
    let fm = chip();
    fm.set(LOCK, LockOwner::Software as u32);
    let mut timer = FakeTimer::new();
    let mut lock = client();
    assert_eq!(
        lock.acquire(&fm, &mut timer, ms(100)),
        Err(LockError::Conflict)
    );
    assert!(timer.sleeps.is_empty());
}

#[test]
fn zero_timeout_fails_immediately() {
    let fm = chip();
    fm.set(LOCK, LockOwner::Firmware as u32);
    let mut timer = FakeTimer::new();
    let mut lock = client();

    assert_eq!(
        lock.acquire(&fm, &mut timer, ms(0)),
        Err(LockError::Timeout {
            owner: LockOwner::Firmware
        })
    );
    assert!(timer.sleeps.is_empty());
    assert!(fm.log().is_empty());
}

#[test]
fn waits_for_firmware_with_growing_backoff() {
    let fm = chip();
    fm.set(LOCK, LockOwner::Firmware as u32);
    // Firmware lets go on the fourth look at the lock word
    let mut reads = 0;
    fm.on_read(move |word, regs| {
        if word == LOCK {
            reads += 1;
            if reads == 4 {
                regs.insert(LOCK, LockOwner::Free as u32);
            }
        }
    });
    let mut timer = FakeTimer::new();
    let mut lock = client();

    lock.acquire(&fm, &mut timer, ms(100)).unwrap();
    assert_eq!(timer.sleeps, [ms(1), ms(2), ms(1)]);
    assert_eq!(lock.holder(), Some(OwnerId(1)));
}

#[test]
fn times_out_while_firmware_holds_lock() {
    let fm = chip();
    fm.set(LOCK, LockOwner::Firmware as u32);
    let mut timer = FakeTimer::new();
    let mut lock = client();

    assert_eq!(
        lock.acquire(&fm, &mut timer, ms(10)),
        Err(LockError::Timeout {
            owner: LockOwner::Firmware
        })
    );
    // 1 + 2 + 3 + 4 = 10ms, at which point we give up
    assert_eq!(timer.sleeps, [ms(1), ms(2), ms(3), ms(4)]);
    assert_eq!(lock.holder(), None);
}

#[test]
fn gives_up_after_losing_three_claims() {
    let fm = chip();
    // Firmware overwrites every claim, then releases on the next poll
    fm.on_read(|word, regs| {
        if word == LOCK {
            let v = regs.entry(LOCK).or_insert(0);
            *v = match *v {
                2 => 1,
                1 => 0,
                other => other,
            };
        }
    });
    let mut timer = FakeTimer::new();
    let mut lock = client();

    assert_eq!(
        lock.acquire(&fm, &mut timer, ms(100)),
        Err(LockError::ClaimLost)
    );
    assert_eq!(fm.writes_to(LOCK), [2, 2, 2]);
    let settle = RetryPolicy::default().settle;
    assert_eq!(timer.sleeps, [settle, settle, settle]);
    assert_eq!(lock.holder(), None);
}

#[test]
fn old_firmware_is_unsupported() {
    let fm = FakeFm10k::with_firmware(MIN_FIRMWARE - 1);
    let mut timer = FakeTimer::new();
    let mut lock = client();

    let e = LockError::Unsupported {
        firmware: MIN_FIRMWARE - 1,
    };
    assert_eq!(lock.acquire(&fm, &mut timer, ms(100)), Err(e));
    assert_eq!(lock.release(&fm), Err(e));
    assert!(fm.log().is_empty());
    assert!(timer.sleeps.is_empty());
}

#[test]
fn release_refuses_other_owners() {
    let fm = chip();
    let mut lock = client();

    fm.set(LOCK, LockOwner::Firmware as u32);
    assert_eq!(
        lock.release(&fm),
        Err(LockError::UnexpectedOwner {
            owner: LockOwner::Firmware
        })
    );

    fm.set(LOCK, 3);
    assert_eq!(lock.release(&fm), Err(LockError::Corrupt { raw: 3 }));
    assert!(fm.log().is_empty());
}

#[test]
fn rest_of_scratch_word_is_preserved() {
    let fm = chip();
    fm.set(LOCK, 0xab00);
    let mut timer = FakeTimer::new();
    let mut lock = client();

    lock.acquire(&fm, &mut timer, ms(100)).unwrap();
    assert_eq!(fm.get(LOCK), 0xab02);
    lock.release(&fm).unwrap();
    assert_eq!(fm.get(LOCK), 0xab00);
}
