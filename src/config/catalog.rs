//! Word metadata lookup backed by a static JSON document.
//!
//! The document carries base word entries plus per-style prompt overrides;
//! resolution merges the two. The core only queries an injected
//! [`WordCatalog`], it never fetches the document itself.

use std::collections::HashMap;

use anyhow::Context as _;

use crate::foundation::error::{LumicardError, LumicardResult};

/// Word key used when an unknown key must still resolve to something.
pub const FALLBACK_WORD: &str = "burger";

/// Fully resolved metadata for one greeting word under one card style.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedWord {
    pub key: String,
    pub text: String,
    pub pinyin: Option<String>,
    pub meaning: String,
    pub ai_prompt: String,
    pub image: String,
}

pub trait WordCatalog {
    fn resolve(&self, style: &str, key: &str) -> Option<ResolvedWord>;
}

/// Resolve `key`, falling back to the [`FALLBACK_WORD`] entry when unknown.
pub fn resolve_or_fallback(
    catalog: &dyn WordCatalog,
    style: &str,
    key: &str,
) -> Option<ResolvedWord> {
    catalog
        .resolve(style, key)
        .or_else(|| catalog.resolve(style, FALLBACK_WORD))
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
struct CatalogDoc {
    #[serde(default)]
    words: HashMap<String, WordEntry>,
    /// Per-style prompt overrides: style -> word key -> prompt.
    #[serde(default)]
    prompts: HashMap<String, HashMap<String, String>>,
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(default)]
struct WordEntry {
    text: String,
    pinyin: Option<String>,
    meaning: String,
    ai_prompt: String,
    image: String,
}

/// [`WordCatalog`] over a parsed catalog document.
#[derive(Clone, Debug)]
pub struct StaticCatalog {
    doc: CatalogDoc,
}

impl StaticCatalog {
    pub fn from_json(json: &str) -> LumicardResult<Self> {
        let doc: CatalogDoc = serde_json::from_str(json)
            .context("parse catalog document")
            .map_err(LumicardError::from)?;
        Ok(Self { doc })
    }

    pub fn from_file(path: &std::path::Path) -> LumicardResult<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read catalog from '{}'", path.display()))
            .map_err(LumicardError::from)?;
        Self::from_json(&json)
    }

    /// Small built-in catalog used by the demo binary and tests.
    pub fn demo() -> Self {
        let json = r#"{
            "words": {
                "burger": {
                    "text": "一堡口福",
                    "pinyin": "yi bao kou fu",
                    "meaning": "愿你口福满满，顿顿吃好。",
                    "ai_prompt": "a glossy lantern shaped like a burger",
                    "image": "words/burger.png"
                },
                "wealth": {
                    "text": "财富自由",
                    "pinyin": "cai fu zi you",
                    "meaning": "愿你财源广进，富足安乐。",
                    "ai_prompt": "a golden lantern overflowing with coins",
                    "image": "words/wealth.png"
                },
                "snowflake": {
                    "text": "瑞雪呈祥",
                    "meaning": "愿瑞雪带来一整年的好兆头。",
                    "ai_prompt": "a crystal lantern with falling snow",
                    "image": "words/snowflake.png"
                }
            },
            "prompts": {
                "cyber_mecha": {
                    "burger": "a neon mech-plated burger lantern"
                }
            }
        }"#;
        Self::from_json(json).unwrap_or_else(|_| Self {
            doc: CatalogDoc::default(),
        })
    }
}

impl WordCatalog for StaticCatalog {
    fn resolve(&self, style: &str, key: &str) -> Option<ResolvedWord> {
        let entry = self.doc.words.get(key)?;
        let prompt = self
            .doc
            .prompts
            .get(style)
            .and_then(|by_word| by_word.get(key))
            .cloned()
            .unwrap_or_else(|| entry.ai_prompt.clone());

        Some(ResolvedWord {
            key: key.to_string(),
            text: entry.text.clone(),
            pinyin: entry.pinyin.clone(),
            meaning: entry.meaning.clone(),
            ai_prompt: prompt,
            image: entry.image.clone(),
        })
    }
}
