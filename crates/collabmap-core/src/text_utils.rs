use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Comparison key for institution names.
///
/// Steps:
/// 1. Unicode NFKD normalization (decomposes accents)
/// 2. Strip to ASCII
/// 3. Keep only letters, space and hyphen
/// 4. Lowercase, collapse whitespace
///
/// "Zhejiang University" and "zhejiang  university." map to the same key,
/// so a canonical token can be compared with the home institution's name.
pub fn institution_key(name: &str) -> String {
    static NON_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z \-]").unwrap());

    let ascii: String = name.nfkd().filter(|c| c.is_ascii()).collect();
    let kept = NON_NAME.replace_all(&ascii, "").to_lowercase();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether `text` contains CJK unified ideographs.
pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(|c| {
        matches!(c,
            '\u{4E00}'..='\u{9FFF}'
            | '\u{3400}'..='\u{4DBF}'
            | '\u{F900}'..='\u{FAFF}'
            | '\u{20000}'..='\u{2A6DF}')
    })
}
