// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use drv_fm10k::{
    config::MAX_SLOTS, pll::TargetFrequency, ConfigError, LockConfig,
    OwnerId, PoolConfig, SwitchConfig,
};
use std::fmt::Write;
use std::time::Duration;

const BOARD: &str = r#"
target_mhz = 500

[pools]
rx_pages = 512
tx_ports = 16

[lock]
owner = 3
min_firmware = 0x0102
timeout_ms = 250

[[ports]]
slot = 0
logical = 1
physical = 0
autoneg = true

[[ports]]
slot = 1
logical = 2
physical = 4
quad = true

[[ports]]
slot = 2
logical = 3
physical = 40
idle = true
"#;

#[test]
fn parse_board_config() {
    let cfg: SwitchConfig = toml::from_str(BOARD).unwrap();
    assert_eq!(cfg.validate(), Ok(()));

    assert_eq!(cfg.target_frequency(), TargetFrequency::Mhz(500));
    assert_eq!(cfg.lock_timeout(), Duration::from_millis(250));

    assert_eq!(cfg.ports.len(), 3);
    let p = &cfg.ports[0];
    assert_eq!((p.slot, p.logical, p.physical), (0, 1, 0));
    assert!(p.autoneg && !p.quad && !p.idle);
    assert!(cfg.ports[1].quad);
    assert!(cfg.ports[2].idle);
    assert_eq!(cfg.ports[2].epl_lane(), None);

    // Fields left out take their defaults
    assert_eq!(
        cfg.pools,
        PoolConfig {
            rx_pages: 512,
            tx_ports: 16,
            ..Default::default()
        }
    );
    assert_eq!(cfg.lock.owner, OwnerId(3));
    assert_eq!(cfg.lock.min_firmware, 0x0102);
    assert_eq!(cfg.lock.claim_attempts, LockConfig::default().claim_attempts);
}

#[test]
fn minimal_config_uses_defaults() {
    let cfg: SwitchConfig = toml::from_str(
        r#"
        ports = [{ slot = 0, logical = 0, physical = 0 }]
        "#,
    )
    .unwrap();
    assert_eq!(cfg.target_frequency(), TargetFrequency::SkuDefault);
    assert_eq!(cfg.pools, PoolConfig::default());
    assert_eq!(cfg.lock, LockConfig::default());
    assert_eq!(cfg.lock_timeout(), Duration::from_secs(1));
    assert_eq!(cfg.validate(), Ok(()));
}

#[test]
fn gap_in_slots_fails_validation() {
    let cfg: SwitchConfig = toml::from_str(
        r#"
        ports = [
            { slot = 0, logical = 0, physical = 0 },
            { slot = 2, logical = 1, physical = 1 },
        ]
        "#,
    )
    .unwrap();
    assert_eq!(
        cfg.validate(),
        Err(ConfigError::SlotOutOfRange { slot: 2 })
    );
}

#[test]
fn bad_pool_fails_validation() {
    let cfg: SwitchConfig = toml::from_str(
        r#"
        ports = [{ slot = 0, logical = 0, physical = 0 }]
        pools = { rx_pages = 4 }
        "#,
    )
    .unwrap();
    assert_eq!(
        cfg.validate(),
        Err(ConfigError::RxPoolTooSmall { pages: 4 })
    );
}

#[test]
fn too_many_ports_is_rejected_when_parsing() {
    let mut doc = String::new();
    for i in 0..=MAX_SLOTS {
        writeln!(
            doc,
            "[[ports]]\nslot = {i}\nlogical = 0\nphysical = 0\n"
        )
        .unwrap();
    }
    assert!(toml::from_str::<SwitchConfig>(&doc).is_err());
}

#[test]
fn ports_are_required() {
    assert!(toml::from_str::<SwitchConfig>("target_mhz = 400").is_err());
}
