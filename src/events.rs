//! Host event boundary.
//!
//! The core reports what happened; how the host reacts (messaging another
//! frame, analytics, navigation) is not its concern.

use crate::config::model::ExperienceConfig;

pub trait EventSink {
    /// A floater was selected and the card player is opening on `word`.
    fn floater_selected(&mut self, word: &str, config: &ExperienceConfig);
    /// The card was accepted or closed.
    fn card_dismissed(&mut self);
}

/// Sink that drops every event; default for tests and the demo binary.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn floater_selected(&mut self, _word: &str, _config: &ExperienceConfig) {}
    fn card_dismissed(&mut self) {}
}
