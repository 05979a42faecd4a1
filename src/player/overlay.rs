//! Card overlay: meaning/prompt tabs with a typewriter text reveal.

use crate::foundation::core::Millis;

/// Reveal speed of the meaning channel.
pub const MEANING_MS_PER_CHAR: u64 = 30;
/// Reveal speed of the AI-prompt channel.
pub const PROMPT_MS_PER_CHAR: u64 = 20;

/// Time-based character reveal. A channel starts once, the first time its
/// tab is shown, and reveals monotonically from there.
#[derive(Clone, Debug)]
pub struct Typewriter {
    chars: Vec<char>,
    ms_per_char: u64,
    started_at: Option<Millis>,
}

impl Typewriter {
    pub fn new(text: &str, ms_per_char: u64) -> Self {
        Self {
            chars: text.chars().collect(),
            ms_per_char: ms_per_char.max(1),
            started_at: None,
        }
    }

    /// Single-start: later calls keep the original epoch.
    pub fn start(&mut self, now: Millis) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    pub fn started(&self) -> bool {
        self.started_at.is_some()
    }

    fn revealed_count(&self, now: Millis) -> usize {
        match self.started_at {
            None => 0,
            Some(at) => {
                let n = (now.since(at) / self.ms_per_char) as usize;
                n.min(self.chars.len())
            }
        }
    }

    pub fn visible_text(&self, now: Millis) -> String {
        self.chars[..self.revealed_count(now)].iter().collect()
    }

    pub fn complete(&self, now: Millis) -> bool {
        self.revealed_count(now) == self.chars.len()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlayTab {
    Meaning,
    Prompt,
}

/// Overlay state for one open card. The meaning channel starts at open;
/// the prompt channel starts the first time its tab is shown. The accept
/// button tracks meaning completion.
#[derive(Clone, Debug)]
pub struct CardOverlay {
    tab: OverlayTab,
    meaning: Typewriter,
    prompt: Typewriter,
}

impl CardOverlay {
    pub fn open(meaning: &str, prompt: &str, now: Millis) -> Self {
        let mut meaning = Typewriter::new(meaning, MEANING_MS_PER_CHAR);
        meaning.start(now);
        Self {
            tab: OverlayTab::Meaning,
            meaning,
            prompt: Typewriter::new(prompt, PROMPT_MS_PER_CHAR),
        }
    }

    pub fn tab(&self) -> OverlayTab {
        self.tab
    }

    pub fn switch_tab(&mut self, tab: OverlayTab, now: Millis) {
        self.tab = tab;
        if tab == OverlayTab::Prompt {
            self.prompt.start(now);
        }
    }

    /// Text revealed so far on the active tab.
    pub fn visible_text(&self, now: Millis) -> String {
        match self.tab {
            OverlayTab::Meaning => self.meaning.visible_text(now),
            OverlayTab::Prompt => self.prompt.visible_text(now),
        }
    }

    pub fn accept_visible(&self, now: Millis) -> bool {
        self.meaning.complete(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typewriter_reveals_at_channel_rate() {
        let mut tw = Typewriter::new("hello", 30);
        assert_eq!(tw.visible_text(Millis(1_000)), "");

        tw.start(Millis(1_000));
        assert_eq!(tw.visible_text(Millis(1_000)), "");
        assert_eq!(tw.visible_text(Millis(1_030)), "h");
        assert_eq!(tw.visible_text(Millis(1_149)), "hell");
        assert_eq!(tw.visible_text(Millis(1_150)), "hello");
        assert!(tw.complete(Millis(1_150)));
        assert_eq!(tw.visible_text(Millis(99_999)), "hello");
    }

    #[test]
    fn restart_keeps_original_epoch() {
        let mut tw = Typewriter::new("ab", 30);
        tw.start(Millis(0));
        tw.start(Millis(5_000));
        assert!(tw.complete(Millis(60)));
    }

    #[test]
    fn multibyte_text_counts_chars_not_bytes() {
        let mut tw = Typewriter::new("汉堡", 30);
        tw.start(Millis(0));
        assert_eq!(tw.visible_text(Millis(30)), "汉");
        assert!(tw.complete(Millis(60)));
    }

    #[test]
    fn prompt_starts_on_first_tab_show() {
        let mut ov = CardOverlay::open("meaning text", "prompt text", Millis(0));
        assert!(!ov.prompt.started());

        ov.switch_tab(OverlayTab::Prompt, Millis(2_000));
        assert!(ov.prompt.started());
        assert_eq!(ov.visible_text(Millis(2_020)), "p");

        // Flipping back and forth must not restart the reveal.
        ov.switch_tab(OverlayTab::Meaning, Millis(3_000));
        ov.switch_tab(OverlayTab::Prompt, Millis(4_000));
        assert!(ov.prompt.complete(Millis(2_000 + 20 * 11)));
    }

    #[test]
    fn accept_appears_when_meaning_completes() {
        let ov = CardOverlay::open("abcd", "p", Millis(100));
        assert!(!ov.accept_visible(Millis(100)));
        assert!(!ov.accept_visible(Millis(100 + 30 * 4 - 1)));
        assert!(ov.accept_visible(Millis(100 + 30 * 4)));
    }
}
