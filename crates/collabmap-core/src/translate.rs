//! Translation seam for affiliations written in a non-Latin script.
//!
//! Machine translation itself lives outside this crate. A translator that
//! fails returns `None` and the text is classified as-is; keywords simply
//! won't match, and the co-author contributes no affiliation.

/// Turns local-script text into English.
pub trait Translator: Send + Sync {
    /// Translate `text`, or return `None` to keep the original.
    fn translate(&self, text: &str) -> Option<String>;
}

/// Leaves every string untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTranslation;

impl Translator for NoTranslation {
    fn translate(&self, _text: &str) -> Option<String> {
        None
    }
}

/// Looks up whole strings in a fixed table, e.g. one prepared offline for
/// the institutions that appear most often.
#[derive(Debug, Clone, Default)]
pub struct GlossaryTranslator {
    entries: Vec<(String, String)>,
}

impl GlossaryTranslator {
    pub fn new(entries: Vec<(String, String)>) -> Self {
        Self { entries }
    }
}

impl Translator for GlossaryTranslator {
    fn translate(&self, text: &str) -> Option<String> {
        let needle = text.trim();
        self.entries
            .iter()
            .find(|(source, _)| source == needle)
            .map(|(_, english)| english.clone())
    }
}

/// Whether `text` holds any non-ASCII letter (CJK, Cyrillic, accented Latin, ...).
pub fn needs_translation(text: &str) -> bool {
    text.chars().any(|c| !c.is_ascii() && c.is_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_non_ascii_letters() {
        assert!(needs_translation("清华大学"));
        assert!(needs_translation("Universität Wien"));
        assert!(!needs_translation("Tsinghua University"));
        assert!(!needs_translation("MIT — CSAIL"));
        assert!(!needs_translation(""));
    }

    #[test]
    fn glossary_lookup() {
        let t = GlossaryTranslator::new(vec![(
            "清华大学".to_string(),
            "Tsinghua University".to_string(),
        )]);
        assert_eq!(t.translate(" 清华大学 ").as_deref(), Some("Tsinghua University"));
        assert_eq!(t.translate("北京大学"), None);
    }

    #[test]
    fn no_translation_keeps_original() {
        assert_eq!(NoTranslation.translate("清华大学"), None);
    }
}
