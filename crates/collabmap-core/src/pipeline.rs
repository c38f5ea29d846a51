use std::sync::Arc;

use crate::classifier::CanonicalAffiliation;
use crate::config::AffiliationConfig;
use crate::translate::{Translator, needs_translation};

/// Raw affiliation → [translate] → tokenize → classify.
///
/// Holds no mutable state; one pipeline can serve any number of threads.
#[derive(Clone, Default)]
pub struct AffiliationPipeline {
    config: AffiliationConfig,
    translator: Option<Arc<dyn Translator>>,
}

impl std::fmt::Debug for AffiliationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AffiliationPipeline")
            .field("config", &self.config)
            .field("translator", &self.translator.as_ref().map(|_| "<set>"))
            .finish()
    }
}

impl AffiliationPipeline {
    pub fn new(config: AffiliationConfig) -> Self {
        Self {
            config,
            translator: None,
        }
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn config(&self) -> &AffiliationConfig {
        &self.config
    }

    /// Canonicalize a single raw affiliation. `None` means no keyword matched,
    /// which is the common case and not an error.
    pub fn canonicalize(&self, raw: &str) -> Option<CanonicalAffiliation> {
        let translated;
        let text = match &self.translator {
            Some(t) if needs_translation(raw) => match t.translate(raw) {
                Some(english) => {
                    translated = english;
                    translated.as_str()
                }
                None => {
                    tracing::debug!(raw, "translation unavailable, classifying original text");
                    raw
                }
            },
            _ => raw,
        };

        let candidates = self.config.tokenizer.tokenize(text);
        self.config.classifier.classify(&candidates)
    }

    /// Canonicalize every entry of one co-author list, keeping presentation
    /// order and dropping entries without a match.
    ///
    /// An absent or empty list gives an empty result.
    pub fn process(&self, raw: Option<&[String]>) -> Vec<CanonicalAffiliation> {
        let Some(raw) = raw else {
            return Vec::new();
        };
        raw.iter().filter_map(|r| self.canonicalize(r)).collect()
    }

    /// Like [`process`](Self::process) but only the tokens.
    pub fn process_tokens(&self, raw: Option<&[String]>) -> Vec<String> {
        self.process(raw)
            .into_iter()
            .map(CanonicalAffiliation::into_token)
            .collect()
    }
}
