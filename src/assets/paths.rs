//! Templated relative asset paths.
//!
//! The conventions are fixed: card frames live under
//! `sequences/{style}/{word}/v1/{NN}.jpg` (two-digit 1-based index), effect
//! strips under `effects/{kind}/{NN}.png`, tag images under
//! `tags/{style}/{word}.png`. Existence is never validated here; load
//! success/failure is the only signal.

use crate::foundation::core::SeqKey;
use crate::foundation::error::{LumicardError, LumicardResult};

pub fn card_frame_path(style: &str, word: &str, frame: u32) -> String {
    format!("sequences/{style}/{word}/v1/{frame:02}.jpg")
}

pub fn effect_frame_path(kind: &str, frame: u32) -> String {
    format!("effects/{kind}/{frame:02}.png")
}

pub fn lantern_path(style: &str, word: &str) -> String {
    format!("sequences/{style}/{word}/lantern.png")
}

pub fn tag_path(style: &str, word: &str) -> String {
    format!("tags/{style}/{word}.png")
}

/// Path of the `frame`-th image of the sequence `key` addresses.
pub fn seq_frame_path(key: &SeqKey, frame: u32) -> String {
    if key.is_effect() {
        effect_frame_path(&key.word, frame)
    } else {
        card_frame_path(&key.style, &key.word, frame)
    }
}

/// Normalize a relative asset path: `/` separators, no `.` segments, and no
/// absolute paths or parent traversals.
pub fn normalize_rel_path(source: &str) -> LumicardResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(LumicardError::validation("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(LumicardError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(LumicardError::validation("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(LumicardError::validation("asset path must contain a file name"));
    }

    Ok(out.join("/"))
}
