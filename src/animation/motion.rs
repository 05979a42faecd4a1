//! Rise and transition timing evaluated on the virtual clock.

use crate::foundation::core::Millis;
use crate::foundation::math::lerp;

/// Bottom-percent where a freshly spawned floater starts.
pub const RISE_START_PCT: f64 = -30.0;
/// Bottom-percent where the rise completes and the floater is destroyed.
pub const RISE_END_PCT: f64 = 120.0;
/// Bottom-percent at which a floater is considered to vacate the visible
/// band; replenishment is scheduled for the projected crossing of this line.
pub const VISIBLE_TOP_PCT: f64 = 100.0;
/// Initial population is pre-seeded inside `[0, RISE_SEED_BAND_PCT)`.
pub const RISE_SEED_BAND_PCT: f64 = 90.0;

/// Select-transition schedule, all offsets from the moment of selection.
pub const FLY_MS: u64 = 800;
pub const HALO_AT_MS: u64 = 600;
pub const OPEN_AT_MS: u64 = 1200;
pub const DESTROY_AT_MS: u64 = 1400;
pub const FADE_MS: u64 = 800;

/// Scale the selected floater flies to: 280 visual px over the 120 px body.
pub const FLY_TARGET_SCALE: f64 = 280.0 / 120.0;
/// Brightness every selected floater normalizes to during the fly.
pub const FLY_BRIGHTNESS: f64 = 1.1;

/// Linear bottom-to-top travel of one floater.
#[derive(Clone, Copy, Debug)]
pub struct RiseMotion {
    pub start_bottom_pct: f64,
    pub started_at: Millis,
    pub duration_ms: u64,
}

impl RiseMotion {
    pub fn bottom_at(&self, now: Millis) -> f64 {
        if self.duration_ms == 0 {
            return RISE_END_PCT;
        }
        let t = now.since(self.started_at) as f64 / self.duration_ms as f64;
        lerp(self.start_bottom_pct, RISE_END_PCT, t)
    }

    pub fn finished(&self, now: Millis) -> bool {
        now.since(self.started_at) >= self.duration_ms
    }

    /// Projected instant the floater crosses [`VISIBLE_TOP_PCT`], or `None`
    /// when it was seeded above the line already.
    pub fn top_crossing_at(&self) -> Option<Millis> {
        let distance_to_top = VISIBLE_TOP_PCT - self.start_bottom_pct;
        if distance_to_top <= 0.0 {
            return None;
        }
        let total = RISE_END_PCT - self.start_bottom_pct;
        let offset = (self.duration_ms as f64 * distance_to_top / total).round() as u64;
        Some(self.started_at.plus(offset))
    }
}
