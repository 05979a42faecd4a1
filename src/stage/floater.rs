//! Floater entities: rising lantern widgets owned by the stage manager.

use rand::Rng;

use crate::animation::motion::RiseMotion;
use crate::foundation::core::{Millis, Point, STAGE_HEIGHT, STAGE_WIDTH};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FloaterId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepthLayer {
    Far,
    Mid,
    Near,
}

impl DepthLayer {
    pub fn draw(rng: &mut impl Rng) -> Self {
        match rng.random_range(0..3) {
            0 => Self::Far,
            1 => Self::Mid,
            _ => Self::Near,
        }
    }
}

/// Cosmetic tuple fixed for a floater's lifetime: far is smaller, slower and
/// faintly blurred; near is larger, faster and brighter; mid is baseline.
#[derive(Clone, Copy, Debug)]
pub struct DepthProfile {
    pub scale: f64,
    pub blur_px: f64,
    pub brightness: f64,
    pub speed_mult: f64,
    pub z: u32,
}

impl DepthProfile {
    pub fn sample(layer: DepthLayer, rng: &mut impl Rng) -> Self {
        let r: f64 = rng.random();
        match layer {
            DepthLayer::Far => Self {
                scale: 0.6 + r * 0.3,
                blur_px: 0.8,
                brightness: 1.0,
                speed_mult: 1.6,
                z: 5,
            },
            DepthLayer::Mid => Self {
                scale: 1.1 + r * 0.2,
                blur_px: 0.0,
                brightness: 1.0,
                speed_mult: 1.0,
                z: 10,
            },
            DepthLayer::Near => Self {
                scale: 1.5 + r * 0.3,
                blur_px: 0.0,
                brightness: 1.2,
                speed_mult: 0.7,
                z: 20,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisualState {
    Rising,
    Selected,
    Transitioning,
    Released,
}

#[derive(Clone, Debug)]
pub struct Floater {
    pub id: FloaterId,
    pub word: String,
    pub depth: DepthLayer,
    pub profile: DepthProfile,
    pub lane: usize,
    /// Lane center plus jitter, as a stage x-percent.
    pub x_pct: f64,
    pub rise: RiseMotion,
    /// Replenishment due-time; cleared on select or once fired.
    pub replenish_at: Option<Millis>,
    /// Single-assignment guard shared by the scheduled due-time and the
    /// early trigger from select. Replenishment fires at most once.
    pub has_replenished: bool,
    pub visual: VisualState,
    /// Bottom-percent frozen at the moment of selection.
    pub frozen_bottom_pct: Option<f64>,
}

impl Floater {
    pub fn bottom_pct(&self, now: Millis) -> f64 {
        self.frozen_bottom_pct
            .unwrap_or_else(|| self.rise.bottom_at(now))
    }

    /// Center position in stage pixels. Bottom-percent is measured up from
    /// the stage floor.
    pub fn stage_position(&self, now: Millis) -> Point {
        let bottom = self.bottom_pct(now);
        Point::new(
            self.x_pct / 100.0 * STAGE_WIDTH,
            (1.0 - bottom / 100.0) * STAGE_HEIGHT,
        )
    }
}
