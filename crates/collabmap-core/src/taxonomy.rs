//! Keyword taxonomy used to recognize affiliation types.
//!
//! A taxonomy is an ordered list of categories. Category order is priority:
//! when two categories could match the same candidate, the one listed first
//! wins. Keyword order inside a category is preserved as configured.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// How a matched category turns a candidate into a canonical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    /// Keep the cleaned candidate text (e.g. "tsinghua university").
    FullName,
    /// Emit the matched keyword itself (e.g. "google").
    FixedToken,
}

impl CategoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullName => "full_name",
            Self::FixedToken => "fixed_token",
        }
    }
}

/// One taxonomy category: a label, an output kind and its lowercase keywords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub label: String,
    pub kind: CategoryKind,
    pub keywords: Vec<String>,
}

impl Category {
    /// Build a category, lowercasing and trimming keywords.
    ///
    /// Fails on an empty label or an empty keyword; duplicate keywords keep
    /// their first position.
    pub fn new<S: AsRef<str>>(
        label: &str,
        kind: CategoryKind,
        keywords: &[S],
    ) -> Result<Self, ConfigError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(ConfigError::EmptyCategoryLabel);
        }

        let mut normalized: Vec<String> = Vec::with_capacity(keywords.len());
        for kw in keywords {
            let kw = kw.as_ref().trim().to_lowercase();
            if kw.is_empty() {
                return Err(ConfigError::EmptyKeyword {
                    category: label.to_string(),
                });
            }
            if !normalized.contains(&kw) {
                normalized.push(kw);
            }
        }

        Ok(Self {
            label: label.to_string(),
            kind,
            keywords: normalized,
        })
    }
}

/// Ordered set of categories. Immutable once built; share it by reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordTaxonomy {
    categories: Vec<Category>,
}

/// Generic institution words: the matched candidate keeps its full name.
pub const DEFAULT_EDUCATION_KEYWORDS: &[&str] = &["university", "academy", "institute"];

/// Well-known organizations recorded by their keyword alone.
pub const DEFAULT_ORGANIZATION_KEYWORDS: &[&str] = &[
    "cas",
    "hkust",
    "eth",
    "mit",
    "sustech",
    "tencent",
    "microsoft",
    "google",
    "facebook",
    "amazon",
    "uber",
    "intel",
    "aws",
    "apple",
    "alibaba",
    "baidu",
    "sensetime",
    "face++",
    "huawei",
    "samsung",
    "meituan",
    "jd",
    "didi",
];

impl KeywordTaxonomy {
    /// Build a taxonomy from categories in priority order.
    pub fn new(categories: Vec<Category>) -> Result<Self, ConfigError> {
        for (i, cat) in categories.iter().enumerate() {
            if categories[..i].iter().any(|c| c.label == cat.label) {
                return Err(ConfigError::DuplicateCategory(cat.label.clone()));
            }
        }
        Ok(Self { categories })
    }

    /// An empty taxonomy never matches anything.
    pub fn empty() -> Self {
        Self { categories: vec![] }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, label: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.label == label)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.iter().all(|c| c.keywords.is_empty())
    }
}

impl Default for KeywordTaxonomy {
    /// `education` (full name) ahead of `company` (fixed token).
    fn default() -> Self {
        Self {
            categories: vec![
                Category {
                    label: "education".to_string(),
                    kind: CategoryKind::FullName,
                    keywords: DEFAULT_EDUCATION_KEYWORDS
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                },
                Category {
                    label: "company".to_string(),
                    kind: CategoryKind::FixedToken,
                    keywords: DEFAULT_ORGANIZATION_KEYWORDS
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                },
            ],
        }
    }
}
