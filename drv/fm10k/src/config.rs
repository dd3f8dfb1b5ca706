// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Caller-supplied configuration.
//!
//! Nothing in here is baked into the chip: the port map in particular
//! varies from board to board.  Everything derives `serde` traits so that it
//! can live in the application's TOML alongside the rest of its config.

use crate::{
    error::ConfigError,
    lock::OwnerId,
    pll::TargetFrequency,
    time::{Backoff, RetryPolicy},
};
use core::time::Duration;
use drv_fm10k_regs::{port::EPL_COUNT, port::EPL_LANES, sched};
use serde::{Deserialize, Serialize};
use static_assertions::const_assert;

/// Usable polling slots: the schedule's max-index fields are 9 bits wide
pub const MAX_SLOTS: usize = 512;
const_assert!(MAX_SLOTS as u32 <= sched::SCHEDULE_LEN);

/// Logical port numbers are 6 bits wide in a schedule entry
pub const MAX_LOGICAL_PORT: u8 = 63;

/// Physical ports below this number belong to an EPL (four lanes each)
pub const EPL_PHYS_PORTS: u8 = (EPL_COUNT * EPL_LANES) as u8;

/// Hardware size of the RX page pool
pub const RX_PAGES_MAX: u32 = 1024;

/// Hardware size of the TX pool
pub const TX_POOL_MAX: u32 = 24 * 1024;
const_assert!(sched::RXQ_MCAST_COUNT <= RX_PAGES_MAX);
const_assert!(sched::TXQ_PERQ_COUNT <= TX_POOL_MAX);

/// One entry in the port map
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMapping {
    /// Polling slot in both the RX and TX schedules
    pub slot: u16,
    pub logical: u8,
    pub physical: u8,
    #[serde(default)]
    pub quad: bool,
    #[serde(default)]
    pub idle: bool,
    /// Enable auto-negotiation on this port's EPL lane
    #[serde(default)]
    pub autoneg: bool,
}

impl PortMapping {
    /// The (EPL, lane) pair carrying this port, if it is an Ethernet port
    pub fn epl_lane(&self) -> Option<(u32, u32)> {
        if self.physical >= EPL_PHYS_PORTS {
            return None;
        }
        let p = u32::from(self.physical);
        Some((p / EPL_LANES, p % EPL_LANES))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Total RX pages; the first `mcast_queues` are reserved
    pub rx_pages: u32,
    pub mcast_queues: u32,
    pub tx_ports: u32,
    pub traffic_classes: u32,
    /// Total TX indices; the first `tx_ports * traffic_classes` are
    /// reserved for queue heads
    pub tx_pool_size: u32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            rx_pages: RX_PAGES_MAX,
            mcast_queues: sched::RXQ_MCAST_COUNT,
            tx_ports: 48,
            traffic_classes: 8,
            tx_pool_size: TX_POOL_MAX,
        }
    }
}

impl PoolConfig {
    /// Number of TX queues, one per port and traffic class
    pub fn tx_queues(&self) -> u32 {
        self.tx_ports.saturating_mul(self.traffic_classes)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mcast_queues > sched::RXQ_MCAST_COUNT {
            return Err(ConfigError::McastQueuesOutOfRange {
                queues: self.mcast_queues,
            });
        }
        if self.rx_pages < self.mcast_queues || self.rx_pages > RX_PAGES_MAX
        {
            return Err(ConfigError::RxPoolTooSmall {
                pages: self.rx_pages,
            });
        }
        let queues = self.tx_queues();
        if queues > sched::TXQ_PERQ_COUNT {
            return Err(ConfigError::TxQueuesOutOfRange { queues });
        }
        if self.tx_pool_size < queues || self.tx_pool_size > TX_POOL_MAX {
            return Err(ConfigError::TxPoolTooSmall {
                size: self.tx_pool_size,
            });
        }
        Ok(())
    }
}

/// Settings for the soft-reset lock client
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    pub owner: OwnerId,
    /// Oldest firmware version that honors the lock
    pub min_firmware: u16,
    pub timeout_ms: u32,
    pub claim_attempts: u32,
    /// Polls of a busy lock wait `n * backoff_step_us` before poll `n + 1`
    pub backoff_step_us: u32,
    pub settle_us: u32,
}

impl Default for LockConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        let step = match policy.backoff {
            Backoff::Linear { step } | Backoff::Constant(step) => step,
        };
        Self {
            owner: OwnerId(0),
            min_firmware: 0,
            timeout_ms: 1000,
            claim_attempts: policy.claim_attempts,
            backoff_step_us: step.as_micros() as u32,
            settle_us: policy.settle.as_micros() as u32,
        }
    }
}

impl LockConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.into())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.claim_attempts == 0 {
            return Err(ConfigError::NoClaimAttempts);
        }
        Ok(())
    }

    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            claim_attempts: self.claim_attempts,
            backoff: Backoff::Linear {
                step: Duration::from_micros(self.backoff_step_us.into()),
            },
            settle: Duration::from_micros(self.settle_us.into()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchConfig {
    pub ports: heapless::Vec<PortMapping, MAX_SLOTS>,
    /// Desired fabric clock; the SKU's rated maximum if absent
    #[serde(default)]
    pub target_mhz: Option<u32>,
    #[serde(default)]
    pub pools: PoolConfig,
    #[serde(default)]
    pub lock: LockConfig,
}

impl SwitchConfig {
    pub fn target_frequency(&self) -> TargetFrequency {
        match self.target_mhz {
            None => TargetFrequency::SkuDefault,
            Some(m) => TargetFrequency::Mhz(m),
        }
    }

    pub fn lock_timeout(&self) -> Duration {
        self.lock.timeout()
    }

    /// Checks the whole configuration.  This touches no hardware, and is
    /// run before anything else by [`Fm10k::bring_up`](crate::Fm10k).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_mhz == Some(0) {
            return Err(ConfigError::ZeroFrequency);
        }
        self.lock.validate()?;
        self.pools.validate()?;
        validate_ports(&self.ports)
    }
}

/// Checks a port map: slots must be exactly `0..ports.len()`, and each
/// logical port in range and bound to a single physical port.
pub fn validate_ports(ports: &[PortMapping]) -> Result<(), ConfigError> {
    if ports.is_empty() {
        return Err(ConfigError::NoPorts);
    }
    if ports.len() > MAX_SLOTS {
        return Err(ConfigError::TooManySlots { count: ports.len() });
    }

    let mut slots = [false; MAX_SLOTS];
    let mut logical = [None; MAX_LOGICAL_PORT as usize + 1];
    for p in ports {
        let s = usize::from(p.slot);
        if s >= ports.len() {
            return Err(ConfigError::SlotOutOfRange { slot: p.slot });
        }
        if core::mem::replace(&mut slots[s], true) {
            return Err(ConfigError::DuplicateSlot { slot: p.slot });
        }

        if p.logical > MAX_LOGICAL_PORT {
            return Err(ConfigError::LogicalPortOutOfRange {
                logical: p.logical,
            });
        }
        // A port may be polled from several slots, but always as the same
        // physical port
        match logical[usize::from(p.logical)].replace(p.physical) {
            Some(phys) if phys != p.physical => {
                return Err(ConfigError::DuplicateLogicalPort {
                    logical: p.logical,
                });
            }
            _ => (),
        }

        if p.autoneg && p.epl_lane().is_none() {
            return Err(ConfigError::AutonegOnNonEplPort {
                physical: p.physical,
            });
        }
    }
    // With N unique slots all below N, every slot in 0..N is covered
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port(slot: u16, logical: u8, physical: u8) -> PortMapping {
        PortMapping {
            slot,
            logical,
            physical,
            quad: false,
            idle: false,
            autoneg: false,
        }
    }

    #[test]
    fn good_map() {
        let ports = [port(1, 0, 0), port(0, 1, 4), port(2, 2, 40)];
        assert_eq!(validate_ports(&ports), Ok(()));
    }

    #[test]
    fn slot_gap() {
        let ports = [port(0, 0, 0), port(2, 1, 4)];
        assert_eq!(
            validate_ports(&ports),
            Err(ConfigError::SlotOutOfRange { slot: 2 })
        );
    }

    #[test]
    fn duplicates() {
        let ports = [port(0, 0, 0), port(0, 1, 4)];
        assert_eq!(
            validate_ports(&ports),
            Err(ConfigError::DuplicateSlot { slot: 0 })
        );
        let ports = [port(0, 5, 0), port(1, 5, 4)];
        assert_eq!(
            validate_ports(&ports),
            Err(ConfigError::DuplicateLogicalPort { logical: 5 })
        );
        // The same port in two slots is fine
        let ports = [port(0, 5, 4), port(1, 5, 4)];
        assert_eq!(validate_ports(&ports), Ok(()));
    }

    #[test]
    fn logical_range_and_autoneg() {
        assert_eq!(
            validate_ports(&[port(0, 64, 0)]),
            Err(ConfigError::LogicalPortOutOfRange { logical: 64 })
        );
        let mut p = port(0, 0, 36);
        p.autoneg = true;
        assert_eq!(
            validate_ports(&[p]),
            Err(ConfigError::AutonegOnNonEplPort { physical: 36 })
        );
        p.physical = 35;
        assert_eq!(validate_ports(&[p]), Ok(()));
        assert_eq!(p.epl_lane(), Some((8, 3)));
    }

    #[test]
    fn empty_and_oversized() {
        assert_eq!(validate_ports(&[]), Err(ConfigError::NoPorts));
        let many = vec![port(0, 0, 0); MAX_SLOTS + 1];
        assert_eq!(
            validate_ports(&many),
            Err(ConfigError::TooManySlots {
                count: MAX_SLOTS + 1
            })
        );
    }

    #[test]
    fn pools() {
        assert_eq!(PoolConfig::default().validate(), Ok(()));
        assert_eq!(PoolConfig::default().tx_queues(), 384);

        let p = PoolConfig {
            mcast_queues: 9,
            ..Default::default()
        };
        assert_eq!(
            p.validate(),
            Err(ConfigError::McastQueuesOutOfRange { queues: 9 })
        );

        let p = PoolConfig {
            rx_pages: 4,
            ..Default::default()
        };
        assert_eq!(
            p.validate(),
            Err(ConfigError::RxPoolTooSmall { pages: 4 })
        );

        let p = PoolConfig {
            tx_ports: 49,
            ..Default::default()
        };
        assert_eq!(
            p.validate(),
            Err(ConfigError::TxQueuesOutOfRange { queues: 392 })
        );

        let p = PoolConfig {
            tx_pool_size: 100,
            ..Default::default()
        };
        assert_eq!(
            p.validate(),
            Err(ConfigError::TxPoolTooSmall { size: 100 })
        );
    }

    #[test]
    fn zero_frequency_rejected() {
        let mut ports = heapless::Vec::new();
        ports.push(port(0, 0, 0)).unwrap();
        let mut cfg = SwitchConfig {
            ports,
            target_mhz: Some(0),
            pools: PoolConfig::default(),
            lock: LockConfig::default(),
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroFrequency));
        cfg.target_mhz = None;
        assert_eq!(cfg.validate(), Ok(()));
        assert_eq!(cfg.target_frequency(), TargetFrequency::SkuDefault);
    }

    #[test]
    fn lock_needs_a_claim_attempt() {
        let mut ports = heapless::Vec::new();
        ports.push(port(0, 0, 0)).unwrap();
        let mut cfg = SwitchConfig {
            ports,
            target_mhz: None,
            pools: PoolConfig::default(),
            lock: LockConfig {
                claim_attempts: 0,
                ..Default::default()
            },
        };
        assert_eq!(cfg.validate(), Err(ConfigError::NoClaimAttempts));
        cfg.lock.claim_attempts = 1;
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn lock_policy_round_trips_defaults() {
        assert_eq!(LockConfig::default().policy(), RetryPolicy::default());
    }
}
