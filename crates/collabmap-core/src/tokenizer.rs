/// Delimiters used when no override is configured. Full-width forms show up
/// in affiliations typed with CJK input methods.
pub const DEFAULT_DELIMITERS: &[char] = &[',', '/', ';', '，', '／', '；'];

/// Splits one raw affiliation string into candidate entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffiliationTokenizer {
    delimiters: Vec<char>,
}

impl Default for AffiliationTokenizer {
    fn default() -> Self {
        Self {
            delimiters: DEFAULT_DELIMITERS.to_vec(),
        }
    }
}

impl AffiliationTokenizer {
    pub fn new(delimiters: Vec<char>) -> Self {
        Self { delimiters }
    }

    pub fn delimiters(&self) -> &[char] {
        &self.delimiters
    }

    /// Lowercase `raw`, split it on every delimiter in turn and return the
    /// fragments rightmost first, surrounding whitespace included.
    ///
    /// The enclosing institution usually trails the department or position,
    /// so reversing lets the classifier see it first. A string without any
    /// delimiter comes back as a single candidate, even when it is empty.
    pub fn tokenize(&self, raw: &str) -> Vec<String> {
        let lowered = raw.to_lowercase();
        let mut fragments: Vec<&str> = vec![lowered.as_str()];

        for &delimiter in &self.delimiters {
            fragments = fragments
                .into_iter()
                .flat_map(|f| f.split(delimiter))
                .collect();
        }

        fragments
            .into_iter()
            .rev()
            .map(str::to_string)
            .collect()
    }
}
