use thiserror::Error;

use crate::classifier::{AffiliationClassifier, MatchMode};
use crate::taxonomy::{Category, CategoryKind, KeywordTaxonomy};
use crate::tokenizer::{AffiliationTokenizer, DEFAULT_DELIMITERS};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("category label must not be empty")]
    EmptyCategoryLabel,
    #[error("category {category:?} contains an empty keyword")]
    EmptyKeyword { category: String },
    #[error("category {0:?} is defined more than once")]
    DuplicateCategory(String),
    #[error("no such category: {0:?}")]
    UnknownCategory(String),
    #[error("delimiter set must not be empty")]
    NoDelimiters,
    #[error("delimiter {0:?} must be exactly one character")]
    InvalidDelimiter(String),
}

/// Controls how a list of values is overridden from its defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ListOverride<T> {
    /// Use the built-in defaults.
    #[default]
    Default,
    /// Completely replace the defaults with these values.
    Replace(Vec<T>),
    /// Append these values to the defaults.
    Extend(Vec<T>),
}

impl<T: Clone> ListOverride<T> {
    /// Resolve this override against the given defaults.
    pub fn resolve(&self, defaults: &[T]) -> Vec<T> {
        match self {
            ListOverride::Default => defaults.to_vec(),
            ListOverride::Replace(v) => v.clone(),
            ListOverride::Extend(v) => {
                let mut result = defaults.to_vec();
                result.extend(v.iter().cloned());
                result
            }
        }
    }
}

/// Everything the tokenizer and classifier need, resolved and validated.
///
/// Built once and shared read-only; never stored in a global.
#[derive(Debug, Clone, Default)]
pub struct AffiliationConfig {
    pub(crate) tokenizer: AffiliationTokenizer,
    pub(crate) classifier: AffiliationClassifier,
}

impl AffiliationConfig {
    pub fn tokenizer(&self) -> &AffiliationTokenizer {
        &self.tokenizer
    }

    pub fn classifier(&self) -> &AffiliationClassifier {
        &self.classifier
    }

    pub fn taxonomy(&self) -> &KeywordTaxonomy {
        self.classifier.taxonomy()
    }

    pub fn match_mode(&self) -> MatchMode {
        self.classifier.mode()
    }
}

/// Builder for [`AffiliationConfig`].
///
/// Starts from the default taxonomy unless [`categories`](Self::categories)
/// replaces it. Fails fast with [`ConfigError`] on invalid input.
#[derive(Debug, Clone, Default)]
pub struct AffiliationConfigBuilder {
    delimiters: ListOverride<String>,
    categories: Option<Vec<(String, CategoryKind, Vec<String>)>>,
    keyword_overrides: Vec<(String, ListOverride<String>)>,
    match_mode: Option<MatchMode>,
}

impl AffiliationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Delimiters ──

    pub fn set_delimiters(mut self, delimiters: Vec<String>) -> Self {
        self.delimiters = ListOverride::Replace(delimiters);
        self
    }

    pub fn add_delimiter(mut self, delimiter: String) -> Self {
        match &mut self.delimiters {
            ListOverride::Extend(v) => v.push(delimiter),
            _ => self.delimiters = ListOverride::Extend(vec![delimiter]),
        }
        self
    }

    // ── Taxonomy ──

    /// Replace the default taxonomy. Order is priority.
    pub fn categories(mut self, categories: Vec<(String, CategoryKind, Vec<String>)>) -> Self {
        self.categories = Some(categories);
        self
    }

    /// Replace the keywords of one category.
    pub fn set_keywords(mut self, category: &str, keywords: Vec<String>) -> Self {
        self.keyword_overrides
            .push((category.to_string(), ListOverride::Replace(keywords)));
        self
    }

    /// Append keywords to one category.
    pub fn add_keywords(mut self, category: &str, keywords: Vec<String>) -> Self {
        self.keyword_overrides
            .push((category.to_string(), ListOverride::Extend(keywords)));
        self
    }

    // ── Matching ──

    pub fn match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = Some(mode);
        self
    }

    pub fn build(self) -> Result<AffiliationConfig, ConfigError> {
        let default_delimiters: Vec<String> =
            DEFAULT_DELIMITERS.iter().map(|c| c.to_string()).collect();
        let mut delimiters: Vec<char> = Vec::new();
        for d in self.delimiters.resolve(&default_delimiters) {
            let mut chars = d.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => {
                    if !delimiters.contains(&c) {
                        delimiters.push(c);
                    }
                }
                _ => return Err(ConfigError::InvalidDelimiter(d)),
            }
        }
        if delimiters.is_empty() {
            return Err(ConfigError::NoDelimiters);
        }

        let mut categories: Vec<Category> = match self.categories {
            Some(defs) => defs
                .iter()
                .map(|(label, kind, keywords)| Category::new(label, *kind, keywords))
                .collect::<Result<_, _>>()?,
            None => KeywordTaxonomy::default().categories().to_vec(),
        };

        for (label, over) in &self.keyword_overrides {
            let Some(cat) = categories.iter_mut().find(|c| &c.label == label) else {
                return Err(ConfigError::UnknownCategory(label.clone()));
            };
            let keywords = over.resolve(&cat.keywords);
            *cat = Category::new(label, cat.kind, &keywords)?;
        }

        let taxonomy = KeywordTaxonomy::new(categories)?;
        tracing::debug!(
            delimiters = delimiters.len(),
            categories = taxonomy.categories().len(),
            "built affiliation config"
        );

        Ok(AffiliationConfig {
            tokenizer: AffiliationTokenizer::new(delimiters),
            classifier: AffiliationClassifier::new(taxonomy, self.match_mode.unwrap_or_default()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AffiliationConfigBuilder::new().build().unwrap();
        assert_eq!(config.tokenizer().delimiters(), DEFAULT_DELIMITERS);
        assert_eq!(config.taxonomy(), &KeywordTaxonomy::default());
        assert_eq!(config.match_mode(), MatchMode::Substring);
    }

    #[test]
    fn test_list_override_resolve() {
        let defaults = vec![1, 2];
        assert_eq!(ListOverride::Default.resolve(&defaults), vec![1, 2]);
        assert_eq!(ListOverride::Replace(vec![3]).resolve(&defaults), vec![3]);
        assert_eq!(ListOverride::Extend(vec![3]).resolve(&defaults), vec![1, 2, 3]);
    }

    #[test]
    fn test_replace_delimiters() {
        let config = AffiliationConfigBuilder::new()
            .set_delimiters(vec![",".into(), "|".into()])
            .build()
            .unwrap();
        assert_eq!(config.tokenizer().delimiters(), &[',', '|']);
    }

    #[test]
    fn test_extend_delimiters() {
        let config = AffiliationConfigBuilder::new()
            .add_delimiter("|".into())
            .add_delimiter(":".into())
            .build()
            .unwrap();
        let delims = config.tokenizer().delimiters();
        assert_eq!(&delims[..DEFAULT_DELIMITERS.len()], DEFAULT_DELIMITERS);
        assert!(delims.ends_with(&['|', ':']));
    }

    #[test]
    fn test_invalid_delimiters() {
        let err = AffiliationConfigBuilder::new()
            .set_delimiters(vec![" - ".into()])
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::InvalidDelimiter(" - ".into()));

        let err = AffiliationConfigBuilder::new()
            .set_delimiters(vec![])
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::NoDelimiters);
    }

    #[test]
    fn test_custom_categories_keep_order() {
        let config = AffiliationConfigBuilder::new()
            .categories(vec![
                ("lab".into(), CategoryKind::FixedToken, vec!["deepmind".into()]),
                ("education".into(), CategoryKind::FullName, vec!["College".into()]),
            ])
            .match_mode(MatchMode::WholeWord)
            .build()
            .unwrap();
        let labels: Vec<_> = config
            .taxonomy()
            .categories()
            .iter()
            .map(|c| c.label.as_str())
            .collect();
        assert_eq!(labels, vec!["lab", "education"]);
        assert_eq!(config.taxonomy().categories()[1].keywords, vec!["college"]);
        assert_eq!(config.match_mode(), MatchMode::WholeWord);
    }

    #[test]
    fn test_keyword_overrides() {
        let config = AffiliationConfigBuilder::new()
            .add_keywords("education", vec!["college".into()])
            .set_keywords("company", vec!["openai".into()])
            .build()
            .unwrap();
        let edu = config.taxonomy().category("education").unwrap();
        assert_eq!(edu.keywords.last().unwrap(), "college");
        let company = config.taxonomy().category("company").unwrap();
        assert_eq!(company.keywords, vec!["openai"]);
    }

    #[test]
    fn test_unknown_category_override() {
        let err = AffiliationConfigBuilder::new()
            .add_keywords("hospital", vec!["clinic".into()])
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::UnknownCategory("hospital".into()));
    }
}
