use scraper::{Html, Selector};

use crate::{CollectError, Fetcher};

pub(crate) fn parse_selector(selector: &str) -> Result<Selector, CollectError> {
    Selector::parse(selector).map_err(|e| CollectError::Selector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// Text of every element matching `selector`, trimmed, empties dropped,
/// in document order.
pub fn extract_texts(html: &str, selector: &str) -> Result<Vec<String>, CollectError> {
    let selector = parse_selector(selector)?;
    Ok(select_texts(html, &selector))
}

pub(crate) fn select_texts(html: &str, selector: &Selector) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(selector)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Fetch a roster page and pull faculty names out of it, retrying while
/// the selector comes back empty.
pub async fn crawl_roster(
    fetcher: &Fetcher,
    url: &str,
    selector: &str,
) -> Result<Vec<String>, CollectError> {
    let selector = parse_selector(selector)?;
    let names = fetcher
        .fetch_until(url, |body| {
            let names = select_texts(body, &selector);
            (!names.is_empty()).then_some(names)
        })
        .await?;
    tracing::info!(url, count = names.len(), "crawled roster");
    Ok(names)
}

/// Strip title/degree annotations from a roster entry.
///
/// Rosters write "张三（教授）" or "San Zhang (Associate Professor)";
/// everything from the first opening parenthesis, ASCII or full-width, is
/// dropped.
pub fn clean_name(raw: &str) -> String {
    let cut = raw.find(['(', '（']).unwrap_or(raw.len());
    raw[..cut].split_whitespace().collect::<Vec<_>>().join(" ")
}
