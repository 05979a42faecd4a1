//! Sequence-Frame Player.
//!
//! Plays one fixed-length image sequence out of a [`FrameStore`] on the
//! virtual clock: `Idle -> Preloading -> Ready <-> Playing <-> Paused`,
//! with a drag-scrub overlay that always exits into `Paused`. The current
//! frame is a [`FrameNo`] and every mutation clamps, so an out-of-range
//! index can never reach a render call.

use tracing::debug;

use crate::assets::store::FrameStore;
use crate::config::catalog::ResolvedWord;
use crate::foundation::core::{FrameNo, Millis, SeqKey};
use crate::render::draw::{self, PremulRgba8};
use crate::render::glyphs;
use crate::render::surface::Surface;

/// Number of frames in one card sequence.
pub const CARD_FRAMES: u32 = 16;
/// Playback tick interval.
pub const TICK_MS: u64 = 80;
/// Hold on the final frame before the loop restarts at frame 1.
pub const BREATH_PAUSE_MS: u64 = 500;
/// Frame the sequence opens on, clamped to the set length.
pub const START_FRAME: i64 = 6;
/// Logical pixels of pointer travel per frame step while drag-scrubbing.
pub const DRAG_PX_PER_FRAME: f64 = 10.0;

const LABEL_COLOR: PremulRgba8 = [60, 40, 70, 255];

/// What `open` receives: the selected word plus its catalog metadata.
#[derive(Clone, Debug)]
pub struct CardData {
    pub word: String,
    pub style: String,
    pub resolved: ResolvedWord,
}

impl CardData {
    pub fn seq_key(&self) -> SeqKey {
        SeqKey::card(self.style.clone(), self.word.clone())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerPhase {
    Idle,
    Preloading,
    Ready,
    Playing,
    Paused,
}

#[derive(Clone, Copy, Debug)]
struct DragScrub {
    start_x: f64,
    start_frame: FrameNo,
}

pub struct FramePlayer {
    phase: PlayerPhase,
    card: Option<CardData>,
    total: u32,
    current: FrameNo,
    auto_play: bool,
    next_tick_at: Option<Millis>,
    resume_at: Option<Millis>,
    scrub: Option<DragScrub>,
}

impl Default for FramePlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl FramePlayer {
    pub fn new() -> Self {
        Self {
            phase: PlayerPhase::Idle,
            card: None,
            total: 0,
            current: FrameNo::FIRST,
            auto_play: false,
            next_tick_at: None,
            resume_at: None,
            scrub: None,
        }
    }

    pub fn phase(&self) -> PlayerPhase {
        self.phase
    }

    pub fn current(&self) -> FrameNo {
        self.current
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn card(&self) -> Option<&CardData> {
        self.card.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.phase != PlayerPhase::Idle
    }

    /// Open the card on `data`, starting at the configured opening frame.
    /// When the store already holds the key the player is `Ready` at once
    /// (and playing, if `auto_play`); otherwise it waits in `Preloading`
    /// for [`FramePlayer::frames_ready`].
    #[tracing::instrument(skip(self, data, store), fields(word = %data.word))]
    pub fn open(&mut self, data: CardData, total: u32, auto_play: bool, now: Millis, store: &FrameStore) {
        let key = data.seq_key();
        self.card = Some(data);
        self.total = total;
        self.current = FrameNo::clamped(START_FRAME, total);
        self.auto_play = auto_play;
        self.next_tick_at = None;
        self.resume_at = None;
        self.scrub = None;

        let ready = store.loaded() && store.key() == Some(&key);
        self.phase = if ready {
            PlayerPhase::Ready
        } else {
            PlayerPhase::Preloading
        };
        if ready && auto_play {
            self.play(now, store);
        }
    }

    /// Called by the owner when the store finished loading while the player
    /// sat in `Preloading`.
    pub fn frames_ready(&mut self, now: Millis, store: &FrameStore) {
        if self.phase != PlayerPhase::Preloading {
            return;
        }
        self.phase = PlayerPhase::Ready;
        if self.auto_play {
            self.play(now, store);
        }
    }

    /// Start ticking. No-op unless the player is open, the frames are fully
    /// loaded, and playback is not already running.
    pub fn play(&mut self, now: Millis, store: &FrameStore) {
        match self.phase {
            PlayerPhase::Ready | PlayerPhase::Paused => {}
            _ => {
                debug!(phase = ?self.phase, "play ignored");
                return;
            }
        }
        if !store.loaded() {
            debug!("play ignored: frames not loaded");
            return;
        }
        self.phase = PlayerPhase::Playing;
        self.next_tick_at = Some(now.plus(TICK_MS));
        self.resume_at = None;
    }

    /// Stop ticking and drop a pending loop restart. Idempotent.
    pub fn pause(&mut self) {
        if self.phase == PlayerPhase::Playing {
            self.phase = PlayerPhase::Paused;
        }
        self.next_tick_at = None;
        self.resume_at = None;
    }

    /// Pause and jump to `frame`, clamped into `[1, N]`.
    pub fn scrub_to(&mut self, frame: i64) {
        if !self.is_open() {
            return;
        }
        self.pause();
        self.current = FrameNo::clamped(frame, self.total);
    }

    pub fn begin_drag(&mut self, x: f64) {
        if !self.is_open() {
            return;
        }
        self.pause();
        self.scrub = Some(DragScrub {
            start_x: x,
            start_frame: self.current,
        });
    }

    /// Pointer displacement to frame delta, relative to the frame recorded
    /// at drag start so repeated moves do not drift.
    pub fn drag_to(&mut self, x: f64) {
        let Some(s) = self.scrub else { return };
        let delta = ((x - s.start_x) / DRAG_PX_PER_FRAME) as i64;
        self.current = FrameNo::clamped(i64::from(s.start_frame.get()) + delta, self.total);
    }

    pub fn end_drag(&mut self) {
        if self.scrub.take().is_some() {
            self.pause();
        }
    }

    pub fn is_scrubbing(&self) -> bool {
        self.scrub.is_some()
    }

    /// Drive the playback tick and the breath pause up to `now`. Catches up
    /// over large steps; the wrap decision happens before the increment, so
    /// the frame index never exceeds N.
    pub fn advance(&mut self, now: Millis) {
        if self.phase != PlayerPhase::Playing {
            return;
        }
        loop {
            if let Some(due) = self.resume_at {
                if now < due {
                    break;
                }
                self.resume_at = None;
                self.current = FrameNo::FIRST;
                self.next_tick_at = Some(due.plus(TICK_MS));
            } else if let Some(due) = self.next_tick_at {
                if now < due {
                    break;
                }
                if self.current.get() >= self.total {
                    self.next_tick_at = None;
                    self.resume_at = Some(due.plus(BREATH_PAUSE_MS));
                } else {
                    self.current =
                        FrameNo::clamped(i64::from(self.current.get()) + 1, self.total);
                    self.next_tick_at = Some(due.plus(TICK_MS));
                }
            } else {
                break;
            }
        }
    }

    /// Draw the current frame cover-fit, or the deterministic placeholder
    /// when the frame image is missing.
    pub fn render(&self, surface: &mut Surface, store: &FrameStore) {
        if !self.is_open() {
            return;
        }
        surface.clear();
        if let Some(img) = store.frame(self.current) {
            draw::blit_cover(surface, img);
            return;
        }
        self.render_placeholder(surface, store);
    }

    fn render_placeholder(&self, surface: &mut Surface, store: &FrameStore) {
        let total = self.total.max(1);
        let hue = f64::from(self.current.get()) / f64::from(total) * 360.0;
        draw::fill(surface, draw::hsl_fill_color(hue, 0.7, 0.8));

        let w = f64::from(surface.logical_width());
        let h = f64::from(surface.logical_height());
        let big = (w * 0.08).max(20.0);
        let small = (w * 0.024).max(12.0);

        glyphs::draw_text_centered(
            surface,
            &format!("FRAME {}", self.current.get()),
            w / 2.0,
            h / 2.0,
            big,
            LABEL_COLOR,
        );
        if let Some(card) = &self.card {
            glyphs::draw_text_centered(
                surface,
                &format!("STYLE: {}", card.style.to_ascii_uppercase()),
                w / 2.0,
                h / 2.0 + big,
                small,
                LABEL_COLOR,
            );
        }
        if !store.loaded() {
            glyphs::draw_text_centered(
                surface,
                "(LOADING...)",
                w / 2.0,
                h / 2.0 + big + small * 1.6,
                small,
                LABEL_COLOR,
            );
        }
    }

    /// Back to `Idle`; playback stopped, drag state dropped.
    pub fn close(&mut self) {
        self.phase = PlayerPhase::Idle;
        self.card = None;
        self.total = 0;
        self.current = FrameNo::FIRST;
        self.next_tick_at = None;
        self.resume_at = None;
        self.scrub = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::FrameImage;

    fn loaded_store(total: u32) -> FrameStore {
        let mut store = FrameStore::new();
        let key = SeqKey::card("frosted_blindbox", "burger");
        for req in store.begin(key.clone(), total) {
            store.apply(crate::assets::source::FrameDelivery {
                key: key.clone(),
                frame: req.frame,
                generation: req.generation,
                image: FrameImage::solid(4, 4, [req.frame as u8, 0, 0, 255]).ok(),
            });
        }
        store
    }

    fn card() -> CardData {
        CardData {
            word: "burger".to_string(),
            style: "frosted_blindbox".to_string(),
            resolved: ResolvedWord {
                key: "burger".to_string(),
                text: "汉堡".to_string(),
                pinyin: Some("hàn bǎo".to_string()),
                meaning: "a stacked bun".to_string(),
                ai_prompt: "a glowing burger lantern".to_string(),
                image: "burger.png".to_string(),
            },
        }
    }

    #[test]
    fn open_starts_on_frame_six_and_autoplays() {
        let store = loaded_store(CARD_FRAMES);
        let mut p = FramePlayer::new();
        p.open(card(), CARD_FRAMES, true, Millis(0), &store);

        assert_eq!(p.phase(), PlayerPhase::Playing);
        assert_eq!(p.current().get(), 6);
    }

    #[test]
    fn open_clamps_start_frame_for_short_sets() {
        let store = loaded_store(4);
        let mut p = FramePlayer::new();
        p.open(card(), 4, false, Millis(0), &store);
        assert_eq!(p.current().get(), 4);
    }

    #[test]
    fn playback_advances_monotonically_until_wrap() {
        let store = loaded_store(CARD_FRAMES);
        let mut p = FramePlayer::new();
        p.open(card(), CARD_FRAMES, true, Millis(0), &store);

        let mut last = p.current().get();
        let mut wrapped = false;
        for t in (0..4_000).step_by(20) {
            p.advance(Millis(t));
            let f = p.current().get();
            assert!(f >= 1 && f <= CARD_FRAMES);
            if f < last {
                assert_eq!(f, 1, "wrap must land on frame 1");
                wrapped = true;
            }
            last = f;
        }
        assert!(wrapped);
    }

    #[test]
    fn breath_pause_holds_last_frame_before_restart() {
        let store = loaded_store(3);
        let mut p = FramePlayer::new();
        p.open(card(), 3, false, Millis(0), &store);
        p.scrub_to(2);
        p.play(Millis(0), &store);

        // t=80 advances to 3; the wrap tick at t=160 enters the pause.
        p.advance(Millis(160));
        assert_eq!(p.current().get(), 3);
        p.advance(Millis(160 + BREATH_PAUSE_MS - 1));
        assert_eq!(p.current().get(), 3);
        p.advance(Millis(160 + BREATH_PAUSE_MS));
        assert_eq!(p.current().get(), 1);
        assert_eq!(p.phase(), PlayerPhase::Playing);
    }

    #[test]
    fn play_refuses_unloaded_store() {
        let mut store = FrameStore::new();
        store.begin(SeqKey::card("frosted_blindbox", "burger"), CARD_FRAMES);
        let mut p = FramePlayer::new();
        p.open(card(), CARD_FRAMES, true, Millis(0), &store);

        assert_eq!(p.phase(), PlayerPhase::Preloading);
        p.play(Millis(0), &store);
        assert_ne!(p.phase(), PlayerPhase::Playing);
    }

    #[test]
    fn frames_ready_starts_configured_autoplay() {
        let mut store = FrameStore::new();
        let key = SeqKey::card("frosted_blindbox", "burger");
        let reqs = store.begin(key.clone(), 2);
        let mut p = FramePlayer::new();
        p.open(card(), 2, true, Millis(0), &store);
        assert_eq!(p.phase(), PlayerPhase::Preloading);

        for req in reqs {
            store.apply(crate::assets::source::FrameDelivery {
                key: key.clone(),
                frame: req.frame,
                generation: req.generation,
                image: FrameImage::solid(2, 2, [0, 0, 0, 255]).ok(),
            });
        }
        p.frames_ready(Millis(100), &store);
        assert_eq!(p.phase(), PlayerPhase::Playing);
    }

    #[test]
    fn scrub_to_clamps_and_pauses() {
        let store = loaded_store(CARD_FRAMES);
        let mut p = FramePlayer::new();
        p.open(card(), CARD_FRAMES, true, Millis(0), &store);

        p.scrub_to(99);
        assert_eq!(p.current().get(), CARD_FRAMES);
        assert_eq!(p.phase(), PlayerPhase::Paused);

        p.scrub_to(-7);
        assert_eq!(p.current().get(), 1);
    }

    #[test]
    fn drag_is_relative_to_drag_start_without_drift() {
        let store = loaded_store(CARD_FRAMES);
        let mut p = FramePlayer::new();
        p.open(card(), CARD_FRAMES, false, Millis(0), &store);
        assert_eq!(p.current().get(), 6);

        p.begin_drag(100.0);
        p.drag_to(130.0);
        assert_eq!(p.current().get(), 9);
        // Back and forth returns exactly to the start frame.
        p.drag_to(70.0);
        assert_eq!(p.current().get(), 3);
        p.drag_to(100.0);
        assert_eq!(p.current().get(), 6);

        p.drag_to(10_000.0);
        assert_eq!(p.current().get(), CARD_FRAMES);

        p.end_drag();
        assert_eq!(p.phase(), PlayerPhase::Paused);
        assert!(!p.is_scrubbing());
    }

    #[test]
    fn render_missing_frame_paints_placeholder() {
        let mut store = FrameStore::new();
        store.begin(SeqKey::card("frosted_blindbox", "burger"), CARD_FRAMES);
        let mut p = FramePlayer::new();
        p.open(card(), CARD_FRAMES, false, Millis(0), &store);

        let mut surface = Surface::new();
        surface.resize(320, 240, 1.0);
        p.render(&mut surface, &store);

        // Placeholder background is fully opaque everywhere.
        assert!(surface.data().chunks_exact(4).all(|px| px[3] == 255));
    }

    #[test]
    fn close_resets_everything() {
        let store = loaded_store(CARD_FRAMES);
        let mut p = FramePlayer::new();
        p.open(card(), CARD_FRAMES, true, Millis(0), &store);
        p.close();

        assert_eq!(p.phase(), PlayerPhase::Idle);
        assert!(p.card().is_none());
        p.advance(Millis(10_000));
        assert_eq!(p.current(), FrameNo::FIRST);
    }
}
