//! One-shot sprite-strip bursts advanced on the virtual clock.

use crate::foundation::core::{Millis, Point};

pub const BURST_FRAMES: u32 = 12;
pub const BURST_FRAME_MS: u64 = 1000 / 24;

/// Logical size the halo strip draws at, centered on the stage.
pub const HALO_SIZE: f64 = 600.0;
/// Logical size of the star burst played on card accept.
pub const STAR_BURST_SIZE: f64 = 300.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BurstKind {
    Halo,
    StarBurst,
}

impl BurstKind {
    /// Effect-strip name under the reserved `effects` style.
    pub fn asset_name(self) -> &'static str {
        match self {
            Self::Halo => "halo",
            Self::StarBurst => "star_burst",
        }
    }

    pub fn logical_size(self) -> f64 {
        match self {
            Self::Halo => HALO_SIZE,
            Self::StarBurst => STAR_BURST_SIZE,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct EffectBurst {
    pub kind: BurstKind,
    pub started_at: Millis,
    pub center: Point,
    pub z: u32,
}

impl EffectBurst {
    /// 1-based frame due at `now`, or `None` once the strip has played out.
    pub fn frame_at(&self, now: Millis) -> Option<u32> {
        let frame = (now.since(self.started_at) / BURST_FRAME_MS) as u32 + 1;
        (frame <= BURST_FRAMES).then_some(frame)
    }

    pub fn finished(&self, now: Millis) -> bool {
        self.frame_at(now).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn burst(at: u64) -> EffectBurst {
        EffectBurst {
            kind: BurstKind::Halo,
            started_at: Millis(at),
            center: Point::new(500.0, 375.0),
            z: 140,
        }
    }

    #[test]
    fn frames_advance_at_strip_rate() {
        let b = burst(1_000);
        assert_eq!(b.frame_at(Millis(1_000)), Some(1));
        assert_eq!(b.frame_at(Millis(1_000 + BURST_FRAME_MS)), Some(2));
        assert_eq!(
            b.frame_at(Millis(1_000 + 11 * BURST_FRAME_MS)),
            Some(BURST_FRAMES)
        );
    }

    #[test]
    fn strip_finishes_after_last_frame() {
        let b = burst(0);
        assert!(!b.finished(Millis(11 * BURST_FRAME_MS)));
        assert!(b.finished(Millis(12 * BURST_FRAME_MS)));
    }

    #[test]
    fn kinds_map_to_asset_names() {
        assert_eq!(BurstKind::Halo.asset_name(), "halo");
        assert_eq!(BurstKind::StarBurst.asset_name(), "star_burst");
        assert!(BurstKind::Halo.logical_size() > BurstKind::StarBurst.logical_size());
    }
}
