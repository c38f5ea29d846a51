//! Scholar profile discovery and co-author sidebar parsing.

use scraper::{Html, Selector};

use crate::CollectError;
use crate::roster::{parse_selector, select_texts};

const PROFILE_HOST: &str = "scholar.google.com";

/// Search URL for `query` under `prefix` (e.g. `https://www.google.com/search?q=`).
pub fn build_search_url(prefix: &str, query: &str) -> String {
    let query = query.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    format!("{}{}", prefix, urlencoding::encode(&query))
}

/// First link on a search results page that points at a scholar profile.
///
/// Result pages often wrap targets as `/url?q=<target>&sa=...`; those are
/// unwrapped before matching.
pub fn find_profile_link(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let anchors = Selector::parse("a[href]").ok()?;

    document
        .select(&anchors)
        .filter_map(|a| a.value().attr("href"))
        .map(unwrap_redirect)
        .find(|href| href.contains(PROFILE_HOST))
}

fn unwrap_redirect(href: &str) -> String {
    let Some(rest) = href.strip_prefix("/url?q=") else {
        return href.to_string();
    };
    let target = rest.split('&').next().unwrap_or(rest);
    urlencoding::decode(target)
        .map(|t| t.into_owned())
        .unwrap_or_else(|_| target.to_string())
}

/// The first `top_k` co-author affiliation lines of a profile page.
pub fn parse_coauthor_affiliations(
    html: &str,
    selector: &str,
    top_k: usize,
) -> Result<Vec<String>, CollectError> {
    let selector = parse_selector(selector)?;
    Ok(coauthor_affiliations(html, &selector, top_k))
}

/// Same as [`parse_coauthor_affiliations`] with an already parsed selector.
pub(crate) fn coauthor_affiliations(html: &str, selector: &Selector, top_k: usize) -> Vec<String> {
    let mut found = select_texts(html, selector);
    found.truncate(top_k);
    found
}
