//! Experience configuration as supplied by the host container.
//!
//! Every field is optional on the wire; missing fields fall back to defaults
//! and are never fatal. Host updates arrive as [`ConfigUpdate`] deltas and
//! merge field-wise into the current config.

use serde::Deserialize;

const DEFAULT_FLOAT_SPEED_SECS: f64 = 15.0;
const DEFAULT_TARGET_COUNT: usize = 6;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ExperienceConfig {
    /// Greeting word keys the stage draws floaters from. Accepts either a
    /// JSON list or a single delimited string (host compatibility).
    #[serde(deserialize_with = "de_word_list")]
    pub greeting_words: Vec<String>,
    pub card_style: String,
    pub auto_play: bool,
    /// Base rise duration in seconds; smaller is faster. Non-finite and
    /// non-positive values on the wire fall back to the default.
    #[serde(deserialize_with = "de_float_speed")]
    pub float_speed_secs: f64,
    /// Target concurrent floater population. Zero on the wire falls back to
    /// the default.
    #[serde(deserialize_with = "de_target_count")]
    pub target_count: usize,
    pub recipient: String,
    pub sender: String,
    pub message: String,
    /// Seed for the stage's deterministic rng.
    pub seed: u64,
}

impl Default for ExperienceConfig {
    fn default() -> Self {
        Self {
            greeting_words: vec![
                "burger".to_string(),
                "horse".to_string(),
                "banana".to_string(),
            ],
            card_style: "frosted_blindbox".to_string(),
            auto_play: true,
            float_speed_secs: DEFAULT_FLOAT_SPEED_SECS,
            target_count: DEFAULT_TARGET_COUNT,
            recipient: "妈妈".to_string(),
            sender: "XXX".to_string(),
            message: "亲爱的妈妈，愿你诸事顺遂，活力满满，开心每一天~".to_string(),
            seed: 0,
        }
    }
}

impl ExperienceConfig {
    pub fn apply(&mut self, update: &ConfigUpdate) {
        if let Some(words) = &update.greeting_words {
            if !words.is_empty() {
                self.greeting_words = words.clone();
            }
        }
        if let Some(style) = &update.card_style {
            self.card_style = style.clone();
        }
        if let Some(auto_play) = update.auto_play {
            self.auto_play = auto_play;
        }
        if let Some(speed) = update.float_speed_secs {
            if speed.is_finite() && speed > 0.0 {
                self.float_speed_secs = speed;
            }
        }
        if let Some(count) = update.target_count {
            if count > 0 {
                self.target_count = count;
            }
        }
        if let Some(recipient) = &update.recipient {
            self.recipient = recipient.clone();
        }
        if let Some(sender) = &update.sender {
            self.sender = sender.clone();
        }
        if let Some(message) = &update.message {
            self.message = message.clone();
        }
    }
}

/// Field-wise delta sent by the host; absent fields leave the current value.
#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ConfigUpdate {
    #[serde(deserialize_with = "de_opt_word_list")]
    pub greeting_words: Option<Vec<String>>,
    pub card_style: Option<String>,
    pub auto_play: Option<bool>,
    #[serde(alias = "float_speed")]
    pub float_speed_secs: Option<f64>,
    pub target_count: Option<usize>,
    pub recipient: Option<String>,
    pub sender: Option<String>,
    #[serde(alias = "message_body")]
    pub message: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WordListRepr {
    Many(Vec<String>),
    One(String),
}

impl WordListRepr {
    fn into_words(self) -> Vec<String> {
        match self {
            Self::Many(v) => v
                .into_iter()
                .map(|w| w.trim().to_string())
                .filter(|w| !w.is_empty())
                .collect(),
            Self::One(s) => s
                .split([',', '、'])
                .map(|w| w.trim().to_string())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }
}

fn de_word_list<'de, D>(de: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(WordListRepr::deserialize(de)?.into_words())
}

fn de_opt_word_list<'de, D>(de: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<WordListRepr>::deserialize(de)?.map(WordListRepr::into_words))
}

// Initial construction holds the same line as `apply`: a degenerate value is
// replaced by the default instead of reaching the stage.

fn de_float_speed<'de, D>(de: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let v = f64::deserialize(de)?;
    if v.is_finite() && v > 0.0 {
        Ok(v)
    } else {
        Ok(DEFAULT_FLOAT_SPEED_SECS)
    }
}

fn de_target_count<'de, D>(de: D) -> Result<usize, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let v = usize::deserialize(de)?;
    if v > 0 { Ok(v) } else { Ok(DEFAULT_TARGET_COUNT) }
}
