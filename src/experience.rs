//! Experience facade: one instance of everything, wired together.
//!
//! Owns the config, the catalog, the frame source, the three frame stores
//! (card, halo, star burst), the stage manager, the player and the overlay,
//! and pumps them in a fixed order on every `advance`. The steady-state
//! path never returns errors; asset failures degrade to placeholders.

use tracing::{debug, warn};

use crate::assets::source::{FrameDelivery, FrameSource};
use crate::assets::store::FrameStore;
use crate::config::catalog::{ResolvedWord, WordCatalog, resolve_or_fallback};
use crate::config::model::{ConfigUpdate, ExperienceConfig};
use crate::events::EventSink;
use crate::foundation::core::{FrameNo, Millis, SeqKey, STAGE_HEIGHT, STAGE_WIDTH};
use crate::player::frame_player::{CARD_FRAMES, CardData, FramePlayer};
use crate::player::overlay::{CardOverlay, OverlayTab};
use crate::render::draw::{self, PremulRgba8};
use crate::render::glyphs;
use crate::render::surface::Surface;
use crate::stage::effects::{BURST_FRAMES, BurstKind};
use crate::stage::floater::FloaterId;
use crate::stage::manager::{EffectSprite, FloaterSprite, SelectOutcome, StageManager, StageSignal};

/// Lantern body size at scale 1, logical pixels.
const LANTERN_W: f64 = 120.0;
const LANTERN_H: f64 = 160.0;
/// Stacking layer of the accept star burst, above the stage content.
const STAR_BURST_Z: u32 = 200;

const MASK_COLOR: PremulRgba8 = [8, 6, 16, 176];

pub struct Experience {
    config: ExperienceConfig,
    catalog: Box<dyn WordCatalog>,
    source: Box<dyn FrameSource>,
    sink: Box<dyn EventSink>,
    manager: StageManager,
    player: FramePlayer,
    overlay: Option<CardOverlay>,
    card_store: FrameStore,
    halo_store: FrameStore,
    star_store: FrameStore,
    mask_visible: bool,
    signals: Vec<StageSignal>,
}

impl Experience {
    pub fn new(
        config: ExperienceConfig,
        catalog: Box<dyn WordCatalog>,
        source: Box<dyn FrameSource>,
        sink: Box<dyn EventSink>,
    ) -> Self {
        let manager = StageManager::new(&config);
        Self {
            config,
            catalog,
            source,
            sink,
            manager,
            player: FramePlayer::new(),
            overlay: None,
            card_store: FrameStore::new(),
            halo_store: FrameStore::new(),
            star_store: FrameStore::new(),
            mask_visible: false,
            signals: Vec::new(),
        }
    }

    pub fn config(&self) -> &ExperienceConfig {
        &self.config
    }

    pub fn manager(&self) -> &StageManager {
        &self.manager
    }

    pub fn player(&self) -> &FramePlayer {
        &self.player
    }

    pub fn overlay(&self) -> Option<&CardOverlay> {
        self.overlay.as_ref()
    }

    pub fn mask_visible(&self) -> bool {
        self.mask_visible
    }

    /// Populate the stage and start preloading the effect strips.
    #[tracing::instrument(skip(self))]
    pub fn start(&mut self, now: Millis) {
        self.manager.refresh(self.config.greeting_words.clone(), now);
        for req in self
            .halo_store
            .begin(SeqKey::effect(BurstKind::Halo.asset_name()), BURST_FRAMES)
        {
            self.source.request(req);
        }
        for req in self.star_store.begin(
            SeqKey::effect(BurstKind::StarBurst.asset_name()),
            BURST_FRAMES,
        ) {
            self.source.request(req);
        }
    }

    /// One cooperative step: source poll, store routing, player readiness,
    /// stage signals, player tick.
    pub fn advance(&mut self, now: Millis) {
        let card_was_loaded = self.card_store.loaded();
        for delivery in self.source.poll() {
            self.route_delivery(delivery);
        }
        if !card_was_loaded && self.card_store.loaded() {
            self.player.frames_ready(now, &self.card_store);
        }

        let mut signals = std::mem::take(&mut self.signals);
        signals.clear();
        self.manager.advance(now, &mut signals);
        for signal in &signals {
            match signal {
                StageSignal::ShowMask => self.mask_visible = true,
                StageSignal::OpenPlayer { word } => self.open_card(word.clone(), now, true),
            }
        }
        self.signals = signals;

        self.player.advance(now);
    }

    fn route_delivery(&mut self, delivery: FrameDelivery) {
        let store = if Some(&delivery.key) == self.card_store.key() {
            &mut self.card_store
        } else if Some(&delivery.key) == self.halo_store.key() {
            &mut self.halo_store
        } else if Some(&delivery.key) == self.star_store.key() {
            &mut self.star_store
        } else {
            debug!(key = %delivery.key, "delivery for unknown key dropped");
            return;
        };
        store.apply(delivery);
    }

    fn open_card(&mut self, word: String, now: Millis, fire_event: bool) {
        let resolved = resolve_or_fallback(self.catalog.as_ref(), &self.config.card_style, &word)
            .unwrap_or_else(|| {
                warn!(%word, "catalog has no entry and no fallback; opening bare card");
                ResolvedWord {
                    key: word.clone(),
                    text: word.clone(),
                    pinyin: None,
                    meaning: String::new(),
                    ai_prompt: String::new(),
                    image: String::new(),
                }
            });

        let key = SeqKey::card(self.config.card_style.clone(), word.clone());
        for req in self.card_store.begin(key, CARD_FRAMES) {
            self.source.request(req);
        }

        self.overlay = Some(CardOverlay::open(&resolved.meaning, &resolved.ai_prompt, now));
        let data = CardData {
            word: word.clone(),
            style: self.config.card_style.clone(),
            resolved,
        };
        self.player.open(
            data,
            CARD_FRAMES,
            self.config.auto_play,
            now,
            &self.card_store,
        );
        if fire_event {
            self.sink.floater_selected(&word, &self.config);
        }
    }

    /// Forward a tap on a floater. Ignored while the card is open or a
    /// transition is in flight.
    pub fn select(&mut self, id: FloaterId, now: Millis) -> SelectOutcome {
        if self.player.is_open() {
            debug!(?id, "select ignored: card open");
            return SelectOutcome::Ignored;
        }
        let outcome = self.manager.select(id, now);
        if outcome == SelectOutcome::Started {
            // The mask goes up at the moment of selection, not on the next
            // pump; a render between the two must already show it.
            self.mask_visible = true;
        }
        outcome
    }

    /// Accept the card: star burst, dismissed event, card closed.
    pub fn accept(&mut self, now: Millis) {
        let Some(overlay) = &self.overlay else { return };
        if !overlay.accept_visible(now) {
            debug!("accept ignored: button not visible yet");
            return;
        }
        self.manager.burst(
            BurstKind::StarBurst,
            StageManager::stage_center(),
            STAR_BURST_Z,
            now,
        );
        self.close_card();
    }

    /// Close the card without accepting.
    pub fn dismiss(&mut self) {
        if self.player.is_open() {
            self.close_card();
        }
    }

    fn close_card(&mut self) {
        self.player.close();
        self.overlay = None;
        self.mask_visible = false;
        self.sink.card_dismissed();
    }

    /// Merge a host config delta. A changed word list or style refreshes the
    /// stage; a changed style also re-keys an open card.
    #[tracing::instrument(skip(self, update))]
    pub fn apply_update(&mut self, update: &ConfigUpdate, now: Millis) {
        let old_words = self.config.greeting_words.clone();
        let old_style = self.config.card_style.clone();
        self.config.apply(update);
        self.manager.configure(&self.config);

        let style_changed = self.config.card_style != old_style;
        if self.config.greeting_words != old_words || style_changed {
            self.manager.refresh(self.config.greeting_words.clone(), now);
        }
        if style_changed && self.player.is_open() {
            if let Some(word) = self.player.card().map(|c| c.word.clone()) {
                self.open_card(word, now, false);
            }
        }
    }

    pub fn switch_tab(&mut self, tab: OverlayTab, now: Millis) {
        if let Some(overlay) = &mut self.overlay {
            overlay.switch_tab(tab, now);
        }
    }

    pub fn play(&mut self, now: Millis) {
        self.player.play(now, &self.card_store);
    }

    pub fn pause(&mut self) {
        self.player.pause();
    }

    pub fn scrub_to(&mut self, frame: i64) {
        self.player.scrub_to(frame);
    }

    pub fn begin_drag(&mut self, x: f64) {
        self.player.begin_drag(x);
    }

    pub fn drag_to(&mut self, x: f64) {
        self.player.drag_to(x);
    }

    pub fn end_drag(&mut self) {
        self.player.end_drag();
    }

    /// Draw the stage: floaters back to front, effect strips, then the mask.
    pub fn render_stage(&self, surface: &mut Surface, now: Millis) {
        surface.clear();
        draw::fill(surface, draw::hsl_fill_color(255.0, 0.45, 0.12));

        let snapshot = self.manager.sample(now);
        let mut sorted: Vec<&EffectSprite> = snapshot.effects.iter().collect();
        sorted.sort_by_key(|e| e.z);

        // Effect layers interleave with floaters by z.
        let mut next_effect = 0;
        for sprite in &snapshot.floaters {
            while next_effect < sorted.len() && sorted[next_effect].z <= sprite.z {
                self.draw_effect(surface, sorted[next_effect]);
                next_effect += 1;
            }
            self.draw_lantern(surface, sprite);
        }
        for &e in &sorted[next_effect..] {
            if e.z < STAR_BURST_Z {
                self.draw_effect(surface, e);
            }
        }

        if self.mask_visible {
            draw::fill_rect(
                surface,
                0.0,
                0.0,
                f64::from(surface.logical_width()),
                f64::from(surface.logical_height()),
                MASK_COLOR,
            );
        }

        // The accept star burst plays above everything, mask included.
        for e in &snapshot.effects {
            if e.z >= STAR_BURST_Z {
                self.draw_effect(surface, e);
            }
        }
    }

    fn draw_lantern(&self, surface: &mut Surface, sprite: &FloaterSprite) {
        if sprite.opacity <= 0.0 {
            return;
        }
        let sx = sprite.pos.x / STAGE_WIDTH * f64::from(surface.logical_width());
        let sy = sprite.pos.y / STAGE_HEIGHT * f64::from(surface.logical_height());
        let w = LANTERN_W * sprite.scale;
        let h = LANTERN_H * sprite.scale;

        let hue = word_hue(&sprite.word);
        let mut color = draw::hsl_fill_color(hue, 0.7, 0.55);
        for c in color.iter_mut().take(3) {
            *c = ((f64::from(*c) * sprite.brightness).round() as u32).min(255) as u8;
        }
        let faded = scale_alpha(color, sprite.opacity);
        draw::fill_rect_blurred(
            surface,
            sx - w / 2.0,
            sy - h / 2.0,
            w,
            h,
            faded,
            sprite.blur_px,
        );
        glyphs::draw_text_centered(
            surface,
            &sprite.word.to_ascii_uppercase(),
            sx,
            sy,
            (14.0 * sprite.scale).max(8.0),
            scale_alpha([250, 245, 230, 255], sprite.opacity),
        );
    }

    fn draw_effect(&self, surface: &mut Surface, sprite: &EffectSprite) {
        let store = match sprite.kind {
            BurstKind::Halo => &self.halo_store,
            BurstKind::StarBurst => &self.star_store,
        };
        let cx = sprite.center.x / STAGE_WIDTH * f64::from(surface.logical_width());
        let cy = sprite.center.y / STAGE_HEIGHT * f64::from(surface.logical_height());

        if let Some(img) = store.frame(FrameNo::clamped(i64::from(sprite.frame), BURST_FRAMES)) {
            let scale = sprite.size / f64::from(img.width.max(1));
            draw::draw_image(surface, img, cx, cy, scale, 1.0, 1.0);
            return;
        }
        // Strip not loaded: pulse a translucent square in its place.
        let t = f64::from(sprite.frame) / f64::from(BURST_FRAMES);
        let side = sprite.size * (0.3 + 0.7 * t);
        let alpha = 1.0 - t;
        draw::fill_rect(
            surface,
            cx - side / 2.0,
            cy - side / 2.0,
            side,
            side,
            scale_alpha([255, 236, 160, 140], alpha),
        );
    }

    /// Draw the open card (frame or placeholder) plus the overlay text.
    pub fn render_card(&self, surface: &mut Surface, now: Millis) {
        if !self.player.is_open() {
            return;
        }
        self.player.render(surface, &self.card_store);

        let Some(overlay) = &self.overlay else { return };
        let w = f64::from(surface.logical_width());
        let h = f64::from(surface.logical_height());
        let small = (w * 0.024).max(12.0);

        glyphs::draw_text_centered(
            surface,
            &overlay.visible_text(now).to_ascii_uppercase(),
            w / 2.0,
            h - small * 4.0,
            small,
            [40, 28, 52, 255],
        );
        if overlay.accept_visible(now) {
            glyphs::draw_text_centered(
                surface,
                "(TAP TO ACCEPT)",
                w / 2.0,
                h - small * 2.0,
                small,
                [40, 28, 52, 255],
            );
        }
    }
}

fn word_hue(word: &str) -> f64 {
    let sum: u32 = word.bytes().map(|b| u32::from(b) * 37).sum();
    f64::from(sum % 360)
}

fn scale_alpha(color: PremulRgba8, opacity: f64) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    let mut out = color;
    for c in out.iter_mut() {
        *c = (f64::from(*c) * opacity).round() as u8;
    }
    out
}
