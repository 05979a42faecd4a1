pub mod frame_player;
pub mod overlay;

pub use frame_player::{CardData, FramePlayer, PlayerPhase};
pub use overlay::{CardOverlay, OverlayTab, Typewriter};
