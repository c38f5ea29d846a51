//! Personal-name romanization seam.
//!
//! Search queries need a "given surname" romanized name. Converting
//! ideographic names is left to an external romanizer plugged in through
//! [`NameRomanizer`]; the two built-ins only handle rosters that are already
//! romanized.

use collabmap_core::config_file::NameOrder;

pub trait NameRomanizer: Send + Sync {
    /// Return the searchable "given surname" form, or `None` if this
    /// romanizer can't handle `name`.
    fn romanize(&self, name: &str) -> Option<String>;
}

/// Keeps the name as listed, whitespace normalized.
#[derive(Debug, Clone, Copy, Default)]
pub struct Verbatim;

impl NameRomanizer for Verbatim {
    fn romanize(&self, name: &str) -> Option<String> {
        let words: Vec<&str> = name.split_whitespace().collect();
        if words.is_empty() {
            return None;
        }
        Some(words.join(" "))
    }
}

/// "Zhang San" → "San Zhang".
#[derive(Debug, Clone, Copy, Default)]
pub struct ReverseOrder;

impl NameRomanizer for ReverseOrder {
    fn romanize(&self, name: &str) -> Option<String> {
        let words: Vec<&str> = name.split_whitespace().rev().collect();
        if words.is_empty() {
            return None;
        }
        Some(words.join(" "))
    }
}

pub fn romanizer_for(order: NameOrder) -> Box<dyn NameRomanizer> {
    match order {
        NameOrder::GivenFirst => Box::new(Verbatim),
        NameOrder::SurnameFirst => Box::new(ReverseOrder),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbatim_normalizes_whitespace() {
        assert_eq!(Verbatim.romanize("  San   Zhang ").as_deref(), Some("San Zhang"));
        assert_eq!(Verbatim.romanize("   "), None);
    }

    #[test]
    fn reverse_order() {
        assert_eq!(ReverseOrder.romanize("Zhang San").as_deref(), Some("San Zhang"));
        assert_eq!(
            ReverseOrder.romanize("Ouyang Xiao Ming").as_deref(),
            Some("Ming Xiao Ouyang")
        );
        assert_eq!(ReverseOrder.romanize(""), None);
    }

    #[test]
    fn picks_by_name_order() {
        assert_eq!(
            romanizer_for(NameOrder::SurnameFirst).romanize("Zhang San").as_deref(),
            Some("San Zhang")
        );
        assert_eq!(
            romanizer_for(NameOrder::GivenFirst).romanize("San Zhang").as_deref(),
            Some("San Zhang")
        );
    }
}
