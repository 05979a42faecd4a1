use std::sync::Arc;

use crate::foundation::error::{LumicardError, LumicardResult};

pub use kurbo::{Point, Rect, Vec2};

/// Logical stage size in design pixels. Percent-space coordinates used by the
/// stage (lane x-percents, rise bottom-percents) map onto this box.
pub const STAGE_WIDTH: f64 = 1000.0;
pub const STAGE_HEIGHT: f64 = 750.0;

/// A point on the host-supplied virtual clock, in milliseconds.
///
/// The crate never reads wall time; every timer is a `Millis` deadline owned
/// by some entity and checked inside an `advance(now)` call.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Millis(pub u64);

impl Millis {
    pub const ZERO: Millis = Millis(0);

    pub fn plus(self, delta_ms: u64) -> Millis {
        Millis(self.0.saturating_add(delta_ms))
    }

    /// Milliseconds elapsed since `earlier`, saturating at zero.
    pub fn since(self, earlier: Millis) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

/// 1-based frame index into a fixed-length sequence.
///
/// Values are clamped into `[1, total]` at construction, so an out-of-range
/// index cannot reach a render call through the public API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameNo(u32);

impl FrameNo {
    pub const FIRST: FrameNo = FrameNo(1);

    pub fn clamped(raw: i64, total: u32) -> FrameNo {
        let max = i64::from(total.max(1));
        FrameNo(raw.clamp(1, max) as u32)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

/// Cache key of a frame sequence: one card animation or one effect strip.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SeqKey {
    pub style: String,
    pub word: String,
}

/// Reserved style under which effect strips (halo, star burst) live.
pub const EFFECTS_STYLE: &str = "effects";

impl SeqKey {
    pub fn card(style: impl Into<String>, word: impl Into<String>) -> Self {
        Self {
            style: style.into(),
            word: word.into(),
        }
    }

    pub fn effect(kind: impl Into<String>) -> Self {
        Self {
            style: EFFECTS_STYLE.to_string(),
            word: kind.into(),
        }
    }

    pub fn is_effect(&self) -> bool {
        self.style == EFFECTS_STYLE
    }
}

impl std::fmt::Display for SeqKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.style, self.word)
    }
}

/// Decoded raster frame in premultiplied RGBA8 form, cheap to clone.
#[derive(Clone, Debug)]
pub struct FrameImage {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl FrameImage {
    pub fn new(width: u32, height: u32, rgba8_premul: Vec<u8>) -> LumicardResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| LumicardError::validation("frame buffer size overflow"))?;
        if rgba8_premul.len() != expected {
            return Err(LumicardError::validation(
                "FrameImage expects rgba8 data matching width*height*4",
            ));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        })
    }

    /// Uniform fill, mostly useful for tests and the demo binary.
    pub fn solid(width: u32, height: u32, px: [u8; 4]) -> LumicardResult<Self> {
        Self::new(width, height, px.repeat((width as usize) * (height as usize)))
    }
}
