// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fabric clock selection.
//!
//! Each SKU has a rated maximum frequency and a set of PLL dividers that
//! produce it from the 50 MHz reference.  On top of that, the feature fuses
//! may restrict software to one of four fixed frequency tiers, in which
//! case the chip's own logic picks the dividers and we only write a tier
//! code.

use crate::{time::Timer, Fm10kRw};
use core::time::Duration;
use drv_fm10k_regs::mgmt::{
    PllCtrl, FUSE_DATA_0, PLL_FABRIC_CTRL, PLL_FABRIC_LOCK,
};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use ringbuf::*;

pub const REF_CLOCK_MHZ: u32 = 50;

/// Largest value that fits in `PllCtrl::out_div`
pub const MAX_OUT_DIV: u8 = 0x3f;

/// `FreqSel` value telling the chip to use the programmed dividers
pub const FREQ_SEL_DIVIDERS: u32 = 0;

/// How long `Nreset` is held low to latch new divider values
const NRESET_HOLD: Duration = Duration::from_nanos(500);

/// Part numbers, by their fuse code
#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive)]
pub enum Sku {
    Fm10840 = 1,
    Fm10420 = 2,
    Fm10064 = 3,
    Fm10036 = 4,
}

impl Sku {
    /// Used when the fuses don't name a part we know.  This is the slowest
    /// part, so its settings are safe on all of them.
    pub const DEFAULT: Sku = Sku::Fm10036;

    pub fn profile(self) -> &'static SkuProfile {
        match self {
            Sku::Fm10840 => &SKU_TABLE[0],
            Sku::Fm10420 => &SKU_TABLE[1],
            Sku::Fm10064 => &SKU_TABLE[2],
            Sku::Fm10036 => &SKU_TABLE[3],
        }
    }
}

/// PLL divider settings.  The output frequency is
/// `50 MHz * fb_div255 * (fb_div4 ? 4 : 1) / (ref_div * out_div)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Dividers {
    pub ref_div: u8,
    pub fb_div4: bool,
    pub fb_div255: u8,
    pub out_div: u8,
}

impl Dividers {
    /// VCO frequency after the reference and feedback dividers
    pub const fn vco_mhz(&self) -> u32 {
        let mul = if self.fb_div4 { 4 } else { 1 };
        REF_CLOCK_MHZ * self.fb_div255 as u32 * mul / self.ref_div as u32
    }

    pub const fn frequency_mhz(&self) -> u32 {
        self.vco_mhz() / self.out_div as u32
    }

    /// Returns a copy with the output divider raised as far as needed to
    /// stay at or below `target_mhz`.  The divider is never lowered below
    /// its rated value, and never raised past [`MAX_OUT_DIV`].
    pub fn limited_to(&self, target_mhz: u32) -> Self {
        if target_mhz >= self.frequency_mhz() {
            return *self;
        }
        let needed = match target_mhz {
            0 => MAX_OUT_DIV as u32,
            t => self.vco_mhz().div_ceil(t),
        };
        Self {
            out_div: needed.clamp(self.out_div as u32, MAX_OUT_DIV as u32)
                as u8,
            ..*self
        }
    }

    /// Packs the divider fields into a PLL control word, leaving the other
    /// fields alone.
    pub fn write_to(&self, r: &mut PllCtrl) {
        r.set_ref_div(self.ref_div.into());
        r.set_fb_div4(self.fb_div4);
        r.set_fb_div255(self.fb_div255.into());
        r.set_out_div(self.out_div.into());
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SkuProfile {
    pub sku: Sku,
    pub dividers: Dividers,
    pub max_mhz: u32,
}

pub static SKU_TABLE: [SkuProfile; 4] = [
    SkuProfile {
        sku: Sku::Fm10840,
        dividers: Dividers {
            ref_div: 1,
            fb_div4: false,
            fb_div255: 56,
            out_div: 4,
        },
        max_mhz: 700,
    },
    SkuProfile {
        sku: Sku::Fm10420,
        dividers: Dividers {
            ref_div: 1,
            fb_div4: false,
            fb_div255: 48,
            out_div: 4,
        },
        max_mhz: 600,
    },
    SkuProfile {
        sku: Sku::Fm10064,
        dividers: Dividers {
            ref_div: 1,
            fb_div4: false,
            fb_div255: 60,
            out_div: 6,
        },
        max_mhz: 500,
    },
    SkuProfile {
        sku: Sku::Fm10036,
        dividers: Dividers {
            ref_div: 2,
            fb_div4: true,
            fb_div255: 24,
            out_div: 6,
        },
        max_mhz: 400,
    },
];

/// Fixed frequencies available when the feature fuses restrict the clock.
/// Declared in ascending order of frequency.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    Mhz300,
    Mhz400,
    Mhz500,
    Mhz600,
}

impl Tier {
    pub const ALL: [Tier; 4] =
        [Tier::Mhz300, Tier::Mhz400, Tier::Mhz500, Tier::Mhz600];

    pub const fn mhz(self) -> u32 {
        match self {
            Tier::Mhz300 => 300,
            Tier::Mhz400 => 400,
            Tier::Mhz500 => 500,
            Tier::Mhz600 => 600,
        }
    }

    /// Code written to `PLL_FABRIC_LOCK.FreqSel` to select this tier
    pub const fn freq_sel(self) -> u32 {
        match self {
            Tier::Mhz300 => 1,
            Tier::Mhz400 => 2,
            Tier::Mhz500 => 3,
            Tier::Mhz600 => 4,
        }
    }
}

/// Decoded `PLL_FABRIC_LOCK.FeatureCode`
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FeatureCode {
    /// Software owns the PLL dividers
    Full,
    /// Software may only pick a tier at or below this one
    Restricted(Tier),
}

impl FeatureCode {
    /// Codes we don't know are treated as the most restrictive tier.
    pub fn from_raw(code: u32) -> Self {
        match code {
            0 => FeatureCode::Full,
            1 => FeatureCode::Restricted(Tier::Mhz600),
            2 => FeatureCode::Restricted(Tier::Mhz500),
            3 => FeatureCode::Restricted(Tier::Mhz400),
            _ => FeatureCode::Restricted(Tier::Mhz300),
        }
    }
}

/// Picks the highest tier that does not exceed the target, the ceiling
/// imposed by the fuses, or the SKU's own maximum.  If even the lowest tier
/// is above all of those, the lowest tier is used.
pub fn select_tier(target_mhz: u32, ceiling: Tier, sku_max_mhz: u32) -> Tier {
    let limit = target_mhz.min(ceiling.mhz()).min(sku_max_mhz);
    Tier::ALL
        .iter()
        .rev()
        .copied()
        .find(|t| t.mhz() <= limit)
        .unwrap_or(Tier::Mhz300)
}

/// Desired fabric clock
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TargetFrequency {
    /// Run at the SKU's rated maximum
    SkuDefault,
    Mhz(u32),
}

impl TargetFrequency {
    pub fn resolve(self, profile: &SkuProfile) -> u32 {
        match self {
            TargetFrequency::SkuDefault => profile.max_mhz,
            TargetFrequency::Mhz(m) => m,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClockMode {
    Dividers(Dividers),
    Tier(Tier),
}

/// What [`configure`] ended up doing
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ClockSettings {
    pub sku: Sku,
    pub mode: ClockMode,
    pub frequency_mhz: u32,
}

#[derive(Copy, Clone, PartialEq)]
enum Trace {
    None,
    UnknownSku,
    UnrecognizedSku(u32),
    Dividers { sku: Sku, out_div: u8 },
    Tier { ceiling: Tier, selected: Tier },
}
ringbuf!(Trace, 8, Trace::None);

/// Reads the SKU from the fuses, falling back to [`Sku::DEFAULT`]
pub fn read_sku(rw: &impl Fm10kRw) -> Sku {
    match rw.read(FUSE_DATA_0).sku() {
        0 => {
            ringbuf_entry!(Trace::UnknownSku);
            Sku::DEFAULT
        }
        code => Sku::from_u32(code).unwrap_or_else(|| {
            ringbuf_entry!(Trace::UnrecognizedSku(code));
            Sku::DEFAULT
        }),
    }
}

/// Configures the fabric PLL for `target`, within whatever limits the
/// fuses impose.
///
/// This must run while the switch is held in reset.
pub fn configure(
    rw: &impl Fm10kRw,
    timer: &mut impl Timer,
    target: TargetFrequency,
) -> ClockSettings {
    let sku = read_sku(rw);
    let profile = sku.profile();
    let target_mhz = target.resolve(profile);

    match FeatureCode::from_raw(rw.read(PLL_FABRIC_LOCK).feature_code()) {
        FeatureCode::Full => {
            let d = profile.dividers.limited_to(target_mhz);
            ringbuf_entry!(Trace::Dividers {
                sku,
                out_div: d.out_div
            });
            rw.modify(PLL_FABRIC_CTRL, |r| d.write_to(r));

            // Nreset is active low; a pulse latches the new dividers
            rw.modify(PLL_FABRIC_CTRL, |r| r.set_nreset(false));
            timer.sleep(NRESET_HOLD);
            rw.modify(PLL_FABRIC_CTRL, |r| r.set_nreset(true));

            rw.modify(PLL_FABRIC_LOCK, |r| {
                r.set_freq_sel(FREQ_SEL_DIVIDERS)
            });
            ClockSettings {
                sku,
                mode: ClockMode::Dividers(d),
                frequency_mhz: d.frequency_mhz(),
            }
        }
        FeatureCode::Restricted(ceiling) => {
            let selected = select_tier(target_mhz, ceiling, profile.max_mhz);
            ringbuf_entry!(Trace::Tier { ceiling, selected });
            rw.modify(PLL_FABRIC_LOCK, |r| {
                r.set_freq_sel(selected.freq_sel())
            });
            ClockSettings {
                sku,
                mode: ClockMode::Tier(selected),
                frequency_mhz: selected.mhz(),
            }
        }
    }
}
