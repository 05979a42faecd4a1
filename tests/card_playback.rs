//! Playback through the facade: autoplay, loop wrap, scrub, load staleness.

use std::cell::RefCell;
use std::rc::Rc;

use lumicard::{
    ConfigUpdate, Experience, ExperienceConfig, FrameDelivery, FrameRequest, FrameSource,
    Millis, MemoryFrameSource, NullSink, PlayerPhase, SeqKey, StaticCatalog, Surface,
};

/// Memory source shared with the test so holds and releases can be staged
/// while the experience owns its boxed copy.
#[derive(Clone, Default)]
struct SharedSource(Rc<RefCell<MemoryFrameSource>>);

impl FrameSource for SharedSource {
    fn request(&mut self, req: FrameRequest) {
        self.0.borrow_mut().request(req);
    }

    fn poll(&mut self) -> Vec<FrameDelivery> {
        self.0.borrow_mut().poll()
    }
}

fn experience(source: SharedSource) -> Experience {
    let config = ExperienceConfig {
        greeting_words: vec!["burger".to_string()],
        seed: 5,
        ..ExperienceConfig::default()
    };
    Experience::new(
        config,
        Box::new(StaticCatalog::demo()),
        Box::new(source),
        Box::new(NullSink),
    )
}

fn open_card(exp: &mut Experience) -> u64 {
    exp.start(Millis(0));
    let id = exp.manager().floaters()[0].id;
    exp.select(id, Millis(0));
    let mut t = 0;
    while !exp.player().is_open() {
        t += 40;
        assert!(t < 5_000, "card never opened");
        exp.advance(Millis(t));
    }
    t
}

#[test]
fn autoplay_starts_at_frame_six_and_wraps_through_one() {
    let source = SharedSource::default();
    let mut exp = experience(source);
    let opened_at = open_card(&mut exp);

    let mut last = 0u32;
    let mut wrapped = false;
    for t in (opened_at..opened_at + 4_000).step_by(20) {
        exp.advance(Millis(t));
        let f = exp.player().current().get();
        assert!((1..=16).contains(&f), "frame {f} out of range");
        if last != 0 && f < last {
            assert_eq!(f, 1);
            wrapped = true;
        }
        last = f;
    }
    assert!(wrapped, "playback never looped");
}

#[test]
fn scrub_clamps_and_drag_end_stays_paused() {
    let source = SharedSource::default();
    let mut exp = experience(source);
    let opened_at = open_card(&mut exp);
    exp.advance(Millis(opened_at + 40));

    exp.scrub_to(40);
    assert_eq!(exp.player().current().get(), 16);
    assert_eq!(exp.player().phase(), PlayerPhase::Paused);

    exp.begin_drag(200.0);
    exp.drag_to(80.0);
    assert_eq!(exp.player().current().get(), 4);
    exp.end_drag();
    assert_eq!(exp.player().phase(), PlayerPhase::Paused);

    // Playback does not resume on its own after scrubbing.
    exp.advance(Millis(opened_at + 5_000));
    assert_eq!(exp.player().current().get(), 4);
}

#[test]
fn held_load_renders_placeholder_then_recovers() {
    let source = SharedSource::default();
    source.0.borrow_mut().hold();
    let mut exp = experience(source.clone());
    let opened_at = open_card(&mut exp);

    assert_eq!(exp.player().phase(), PlayerPhase::Preloading);
    let mut surface = Surface::new();
    surface.resize(300, 450, 1.0);
    exp.render_card(&mut surface, Millis(opened_at));
    // Placeholder fill is opaque even with zero frames loaded.
    assert!(surface.data().chunks_exact(4).all(|px| px[3] == 255));

    source.0.borrow_mut().release();
    exp.advance(Millis(opened_at + 40));
    assert_eq!(exp.player().phase(), PlayerPhase::Playing);
}

#[test]
fn style_rekey_drops_stale_deliveries() {
    let source = SharedSource::default();
    source.0.borrow_mut().hold();
    let mut exp = experience(source.clone());
    let opened_at = open_card(&mut exp);
    assert_eq!(
        exp.player().card().map(|c| c.style.clone()),
        Some("frosted_blindbox".to_string())
    );

    // Re-key to the new style while the first load is still in flight.
    let update: ConfigUpdate =
        serde_json::from_str(r#"{"card_style": "cyber_mecha"}"#).unwrap();
    exp.apply_update(&update, Millis(opened_at + 10));

    // Both generations of requests flush together; the stale ones must not
    // count toward the new key.
    source.0.borrow_mut().release();
    exp.advance(Millis(opened_at + 50));

    assert_eq!(exp.player().card().unwrap().seq_key(), SeqKey::card("cyber_mecha", "burger"));
    assert_eq!(exp.player().phase(), PlayerPhase::Playing);
}
