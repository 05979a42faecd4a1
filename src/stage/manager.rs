//! Floater Lifecycle Manager.
//!
//! Owns every floater, its due-times, the single in-flight select
//! transition, and the active effect bursts. All timing is driven by
//! `advance(now)`; destroying an entity drops its due-times, so a cancelled
//! timer can never fire. Global interactivity is defined as "no transition
//! in flight" and no other path can flip it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::animation::ease::Ease;
use crate::animation::motion::{
    DESTROY_AT_MS, FADE_MS, FLY_BRIGHTNESS, FLY_MS, FLY_TARGET_SCALE, HALO_AT_MS, OPEN_AT_MS,
    RISE_END_PCT, RISE_SEED_BAND_PCT, RISE_START_PCT, RiseMotion,
};
use crate::config::model::ExperienceConfig;
use crate::foundation::core::{Millis, Point, STAGE_HEIGHT, STAGE_WIDTH};
use crate::foundation::math::lerp;
use crate::stage::effects::{BurstKind, EffectBurst};
use crate::stage::floater::{DepthLayer, DepthProfile, Floater, FloaterId, VisualState};
use crate::stage::lanes::{LANES, LaneAllocator};

/// Stacking order of the selected floater while it flies; the halo plays
/// just underneath it.
const SELECTED_Z: u32 = 160;
const HALO_Z: u32 = 140;

/// Signals the manager hands back to the experience from `advance`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageSignal {
    /// Reveal the full-screen obscuring mask (fired at selection).
    ShowMask,
    /// Open the card player for this word.
    OpenPlayer { word: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectOutcome {
    Started,
    Ignored,
}

#[derive(Clone, Debug)]
struct SelectTransition {
    floater: FloaterId,
    word: String,
    started_at: Millis,
    from: Point,
    from_scale: f64,
    from_blur: f64,
    from_brightness: f64,
    halo_spawned: bool,
    opened: bool,
}

/// Per-floater render input sampled at one instant.
#[derive(Clone, Debug)]
pub struct FloaterSprite {
    pub id: FloaterId,
    pub word: String,
    pub pos: Point,
    pub scale: f64,
    pub blur_px: f64,
    pub brightness: f64,
    pub opacity: f64,
    pub z: u32,
}

#[derive(Clone, Debug)]
pub struct EffectSprite {
    pub kind: BurstKind,
    /// 1-based frame of the strip due right now.
    pub frame: u32,
    pub center: Point,
    pub size: f64,
    pub z: u32,
}

#[derive(Clone, Debug, Default)]
pub struct StageSnapshot {
    /// Depth-sorted back to front.
    pub floaters: Vec<FloaterSprite>,
    pub effects: Vec<EffectSprite>,
}

pub struct StageManager {
    words: Vec<String>,
    float_speed_secs: f64,
    target_count: usize,
    rng: StdRng,
    lanes: LaneAllocator,
    floaters: Vec<Floater>,
    next_id: u64,
    last_word: Option<String>,
    transition: Option<SelectTransition>,
    effects: Vec<EffectBurst>,
    pending: Vec<StageSignal>,
}

impl StageManager {
    pub fn new(cfg: &ExperienceConfig) -> Self {
        Self {
            words: cfg.greeting_words.clone(),
            float_speed_secs: cfg.float_speed_secs,
            target_count: cfg.target_count,
            rng: StdRng::seed_from_u64(cfg.seed),
            lanes: LaneAllocator::new(),
            floaters: Vec::new(),
            next_id: 0,
            last_word: None,
            transition: None,
            effects: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Adopt updated host configuration. Takes effect for floaters created
    /// afterwards; callers usually follow with [`StageManager::refresh`].
    pub fn configure(&mut self, cfg: &ExperienceConfig) {
        self.words = cfg.greeting_words.clone();
        self.float_speed_secs = cfg.float_speed_secs;
        self.target_count = cfg.target_count;
    }

    /// True when selection is currently accepted.
    pub fn interactive(&self) -> bool {
        self.transition.is_none()
    }

    pub fn floaters(&self) -> &[Floater] {
        &self.floaters
    }

    pub fn stage_center() -> Point {
        Point::new(STAGE_WIDTH / 2.0, STAGE_HEIGHT / 2.0)
    }

    /// Destroy every floater, the in-flight transition, and all effect
    /// bursts, then create exactly the target population pre-seeded across
    /// the rise band. Entities own their due-times, so nothing from before
    /// this call can ever fire again.
    #[tracing::instrument(skip(self))]
    pub fn refresh(&mut self, words: Vec<String>, now: Millis) {
        self.floaters.clear();
        self.transition = None;
        self.effects.clear();
        self.pending.clear();
        self.lanes.reset();
        self.last_word = None;
        if !words.is_empty() {
            self.words = words;
        }
        if self.words.is_empty() {
            debug!("refresh with no words configured; stage left empty");
            return;
        }

        for i in 0..self.target_count {
            let word = self.words[i % self.words.len()].clone();
            self.create_floater(word, Some(i), now);
        }
    }

    /// Create one floater at the bottom with full rise duration. Without an
    /// explicit word, draws from the configured list excluding the previous
    /// draw while more than one word is configured.
    pub fn spawn_one(&mut self, word: Option<String>, now: Millis) {
        let Some(word) = word.or_else(|| self.draw_word()) else {
            debug!("spawn_one with no words configured; skipping");
            return;
        };
        self.create_floater(word, None, now);
    }

    fn draw_word(&mut self) -> Option<String> {
        if self.words.is_empty() {
            return None;
        }
        let candidates: Vec<&String> = self
            .words
            .iter()
            .filter(|w| Some(*w) != self.last_word.as_ref())
            .collect();
        if candidates.is_empty() {
            // Every entry matches the previous draw; repeating is the only
            // option left.
            return Some(self.words[0].clone());
        }
        let idx = self.rng.random_range(0..candidates.len());
        Some(candidates[idx].clone())
    }

    fn create_floater(&mut self, word: String, initial_index: Option<usize>, now: Millis) {
        let depth = DepthLayer::draw(&mut self.rng);
        let profile = DepthProfile::sample(depth, &mut self.rng);
        let lane = self.lanes.next_lane(&mut self.rng);
        let x_pct = LANES[lane] + (self.rng.random::<f64>() - 0.5) * 10.0;

        let start_bottom_pct = match initial_index {
            Some(i) => {
                // Pre-seed within this floater's share of the band so the
                // initial view is not aligned rows.
                let share = RISE_SEED_BAND_PCT / self.target_count.max(1) as f64;
                i as f64 * share + self.rng.random::<f64>() * share * 0.8
            }
            None => RISE_START_PCT,
        };

        let full_secs =
            self.float_speed_secs * profile.speed_mult * (0.9 + self.rng.random::<f64>() * 0.2);
        let duration_ms = if initial_index.is_some() {
            let remaining = RISE_END_PCT - start_bottom_pct;
            let total = RISE_END_PCT - RISE_START_PCT;
            (full_secs * 1000.0 * remaining / total).round() as u64
        } else {
            (full_secs * 1000.0).round() as u64
        };

        let rise = RiseMotion {
            start_bottom_pct,
            started_at: now,
            duration_ms,
        };
        self.next_id += 1;
        self.last_word = Some(word.clone());
        self.floaters.push(Floater {
            id: FloaterId(self.next_id),
            word,
            depth,
            profile,
            lane,
            x_pct,
            replenish_at: rise.top_crossing_at(),
            rise,
            has_replenished: false,
            visual: VisualState::Rising,
            frozen_bottom_pct: None,
        });
    }

    /// Begin the click-to-reveal transition. Silent no-op when another
    /// transition is in flight or the id is unknown.
    pub fn select(&mut self, id: FloaterId, now: Millis) -> SelectOutcome {
        if self.transition.is_some() {
            debug!(?id, "select ignored: transition in flight");
            return SelectOutcome::Ignored;
        }
        let Some(idx) = self.floaters.iter().position(|f| f.id == id) else {
            debug!(?id, "select ignored: unknown floater");
            return SelectOutcome::Ignored;
        };

        // Early replenishment trigger; shares the single-assignment flag
        // with the scheduled due-time.
        let needs_replacement = !self.floaters[idx].has_replenished;
        if needs_replacement {
            self.floaters[idx].has_replenished = true;
        }

        let f = &mut self.floaters[idx];
        f.frozen_bottom_pct = Some(f.rise.bottom_at(now));
        f.replenish_at = None;
        f.visual = VisualState::Selected;

        let transition = SelectTransition {
            floater: f.id,
            word: f.word.clone(),
            started_at: now,
            from: f.stage_position(now),
            from_scale: f.profile.scale,
            from_blur: f.profile.blur_px,
            from_brightness: f.profile.brightness,
            halo_spawned: false,
            opened: false,
        };
        self.transition = Some(transition);
        self.pending.push(StageSignal::ShowMask);

        if needs_replacement {
            self.spawn_one(None, now);
        }
        SelectOutcome::Started
    }

    /// Start a one-shot effect strip; also used by the experience for the
    /// card-accept star burst.
    pub fn burst(&mut self, kind: BurstKind, center: Point, z: u32, now: Millis) {
        self.effects.push(EffectBurst {
            kind,
            started_at: now,
            center,
            z,
        });
    }

    /// Drive rises, replenishment due-times, the transition schedule, effect
    /// sweeping, and off-top destruction up to `now`.
    pub fn advance(&mut self, now: Millis, out: &mut Vec<StageSignal>) {
        out.append(&mut self.pending);

        // Scheduled replenishment, guarded by the shared flag.
        let mut to_spawn = 0usize;
        for f in &mut self.floaters {
            if f.visual != VisualState::Rising {
                continue;
            }
            if let Some(due) = f.replenish_at {
                if now >= due && !f.has_replenished {
                    f.has_replenished = true;
                    f.replenish_at = None;
                    to_spawn += 1;
                }
            }
        }

        // Unselected floaters vanish once they complete the full traversal.
        self.floaters
            .retain(|f| f.visual != VisualState::Rising || !f.rise.finished(now));

        for _ in 0..to_spawn {
            self.spawn_one(None, now);
        }

        if let Some(mut tr) = self.transition.take() {
            let elapsed = now.since(tr.started_at);

            if !tr.halo_spawned && elapsed >= HALO_AT_MS {
                tr.halo_spawned = true;
                self.effects.push(EffectBurst {
                    kind: BurstKind::Halo,
                    started_at: tr.started_at.plus(HALO_AT_MS),
                    center: Self::stage_center(),
                    z: HALO_Z,
                });
                if let Some(f) = self.floaters.iter_mut().find(|f| f.id == tr.floater) {
                    f.visual = VisualState::Transitioning;
                }
            }

            if !tr.opened && elapsed >= OPEN_AT_MS {
                tr.opened = true;
                out.push(StageSignal::OpenPlayer {
                    word: tr.word.clone(),
                });
            }

            if elapsed >= DESTROY_AT_MS {
                self.floaters.retain(|f| f.id != tr.floater);
                // Dropping the transition re-enables interaction.
            } else {
                self.transition = Some(tr);
            }
        }

        self.effects.retain(|e| !e.finished(now));
    }

    /// Render input at one instant: per-floater position, scale, blur,
    /// brightness, opacity and z, depth-sorted, plus the active effect
    /// frames.
    pub fn sample(&self, now: Millis) -> StageSnapshot {
        let mut floaters: Vec<FloaterSprite> = self
            .floaters
            .iter()
            .map(|f| self.sample_floater(f, now))
            .collect();
        floaters.sort_by_key(|s| (s.z, s.id.0));

        let effects = self
            .effects
            .iter()
            .filter_map(|e| {
                e.frame_at(now).map(|frame| EffectSprite {
                    kind: e.kind,
                    frame,
                    center: e.center,
                    size: e.kind.logical_size(),
                    z: e.z,
                })
            })
            .collect();

        StageSnapshot { floaters, effects }
    }

    fn sample_floater(&self, f: &Floater, now: Millis) -> FloaterSprite {
        let selected = self
            .transition
            .as_ref()
            .filter(|tr| tr.floater == f.id);

        let Some(tr) = selected else {
            return FloaterSprite {
                id: f.id,
                word: f.word.clone(),
                pos: f.stage_position(now),
                scale: f.profile.scale,
                blur_px: f.profile.blur_px,
                brightness: f.profile.brightness,
                opacity: 1.0,
                z: f.profile.z,
            };
        };

        let elapsed = now.since(tr.started_at);
        let t = Ease::OutCubic.apply(elapsed as f64 / FLY_MS as f64);
        let center = Self::stage_center();
        let fade_elapsed = elapsed.saturating_sub(HALO_AT_MS);
        let opacity = 1.0 - (fade_elapsed as f64 / FADE_MS as f64).clamp(0.0, 1.0);

        FloaterSprite {
            id: f.id,
            word: f.word.clone(),
            pos: Point::new(
                lerp(tr.from.x, center.x, t),
                lerp(tr.from.y, center.y, t),
            ),
            scale: lerp(tr.from_scale, FLY_TARGET_SCALE, t),
            blur_px: lerp(tr.from_blur, 0.0, t),
            brightness: lerp(tr.from_brightness, FLY_BRIGHTNESS, t),
            opacity,
            z: SELECTED_Z,
        }
    }
}
