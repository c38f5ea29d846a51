use std::fmt;

use serde::{Deserialize, Serialize};

use crate::taxonomy::{CategoryKind, KeywordTaxonomy};

/// How a keyword is compared against a candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Keyword anywhere inside the candidate ("mit" matches "smith").
    #[default]
    Substring,
    /// Keyword bounded by non-alphanumeric characters or string ends.
    WholeWord,
}

impl MatchMode {
    pub fn matches(&self, haystack: &str, keyword: &str) -> bool {
        match self {
            MatchMode::Substring => haystack.contains(keyword),
            MatchMode::WholeWord => haystack.match_indices(keyword).any(|(start, m)| {
                let before = haystack[..start].chars().next_back();
                let after = haystack[start + m.len()..].chars().next();
                !before.is_some_and(char::is_alphanumeric)
                    && !after.is_some_and(char::is_alphanumeric)
            }),
        }
    }
}

/// One co-author's recorded affiliation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanonicalAffiliation {
    /// Cleaned institution name or the matched keyword.
    pub token: String,
    /// Label of the taxonomy category that matched.
    pub category: String,
}

impl CanonicalAffiliation {
    pub fn as_str(&self) -> &str {
        &self.token
    }

    pub fn into_token(self) -> String {
        self.token
    }
}

impl fmt::Display for CanonicalAffiliation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token)
    }
}

/// Scans candidates against a taxonomy and returns the first match.
#[derive(Debug, Clone, Default)]
pub struct AffiliationClassifier {
    taxonomy: KeywordTaxonomy,
    mode: MatchMode,
}

impl AffiliationClassifier {
    pub fn new(taxonomy: KeywordTaxonomy, mode: MatchMode) -> Self {
        Self { taxonomy, mode }
    }

    pub fn taxonomy(&self) -> &KeywordTaxonomy {
        &self.taxonomy
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Return the canonical affiliation for the first (candidate, category,
    /// keyword) triple that matches, scanning in that nesting order.
    ///
    /// Candidates are matched case-insensitively. A full-name result keeps
    /// the candidate's case, so candidates from the tokenizer produce
    /// lowercase names. Empty candidates, and full-name candidates that clean
    /// down to nothing, are skipped.
    pub fn classify<S: AsRef<str>>(&self, candidates: &[S]) -> Option<CanonicalAffiliation> {
        scan(candidates, &self.taxonomy, self.mode)
    }
}

/// Classify with substring matching against `taxonomy`.
pub fn classify<S: AsRef<str>>(
    candidates: &[S],
    taxonomy: &KeywordTaxonomy,
) -> Option<CanonicalAffiliation> {
    scan(candidates, taxonomy, MatchMode::Substring)
}

fn scan<S: AsRef<str>>(
    candidates: &[S],
    taxonomy: &KeywordTaxonomy,
    mode: MatchMode,
) -> Option<CanonicalAffiliation> {
    for candidate in candidates {
        let candidate = candidate.as_ref();
        if candidate.trim().is_empty() {
            continue;
        }
        let haystack = candidate.to_lowercase();

        for category in taxonomy.categories() {
            for keyword in &category.keywords {
                if !mode.matches(&haystack, keyword) {
                    continue;
                }
                let token = match category.kind {
                    CategoryKind::FixedToken => keyword.clone(),
                    CategoryKind::FullName => {
                        let cleaned = clean_full_name(candidate);
                        if cleaned.trim().is_empty() {
                            tracing::trace!(candidate, keyword = %keyword, "match cleaned to nothing");
                            continue;
                        }
                        cleaned
                    }
                };
                return Some(CanonicalAffiliation {
                    token,
                    category: category.label.clone(),
                });
            }
        }
    }
    None
}

/// Clean a matched full-name candidate.
///
/// Steps, in order:
/// 1. Trim surrounding whitespace
/// 2. `" & "` becomes `" and "`
/// 3. Every literal `"at "` is removed, also inside words ("great lakes"
///    becomes "grelakes")
/// 4. Keep only ASCII letters, digits, space, hyphen and apostrophe; tabs,
///    newlines and inner space runs are not normalized
pub fn clean_full_name(candidate: &str) -> String {
    candidate
        .trim()
        .replace(" & ", " and ")
        .replace("at ", "")
        .chars()
        .filter(|&c| c.is_ascii_alphanumeric() || c == ' ' || c == '-' || c == '\'')
        .collect()
}
