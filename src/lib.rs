//! lumicard: an animated greeting-card experience core.
//!
//! Floating lantern widgets rise across a stage; selecting one flies it to
//! center, plays a halo burst, and opens a card that loops a short image
//! sequence with scrub and playback controls. The crate is host-driven on a
//! virtual clock: the embedder calls `advance(now)` and renders from
//! snapshots, so everything is deterministic and testable without a display.

#![forbid(unsafe_code)]

pub mod animation;
pub mod assets;
pub mod config;
pub mod events;
pub mod experience;
pub mod foundation;
pub mod player;
pub mod render;
pub mod stage;

pub use assets::source::{DiskFrameSource, FrameDelivery, FrameRequest, FrameSource, MemoryFrameSource};
pub use assets::store::FrameStore;
pub use config::catalog::{ResolvedWord, StaticCatalog, WordCatalog};
pub use config::model::{ConfigUpdate, ExperienceConfig};
pub use events::{EventSink, NullSink};
pub use experience::Experience;
pub use foundation::core::{FrameImage, FrameNo, Millis, Point, SeqKey};
pub use foundation::error::{LumicardError, LumicardResult};
pub use player::{CardData, FramePlayer, OverlayTab, PlayerPhase};
pub use render::surface::Surface;
pub use stage::floater::FloaterId;
pub use stage::manager::{SelectOutcome, StageManager, StageSignal, StageSnapshot};
