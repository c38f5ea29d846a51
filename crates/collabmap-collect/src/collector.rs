use collabmap_core::Connections;
use collabmap_core::config_file::InstitutionSource;
use collabmap_core::text_utils::contains_cjk;
use scraper::Selector;

use crate::roster::{clean_name, crawl_roster, parse_selector};
use crate::scholar::{build_search_url, coauthor_affiliations, find_profile_link};
use crate::{CollectError, CollectOptions, Fetcher, random_between, romanizer_for};

/// Progress events emitted while collecting.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectEvent {
    InstitutionStarted {
        institution: String,
        members: usize,
    },
    MemberCollected {
        institution: String,
        member: String,
        affiliations: usize,
    },
    MemberSkipped {
        institution: String,
        member: String,
        reason: String,
    },
    InstitutionFailed {
        institution: String,
        error: String,
    },
    InstitutionFinished {
        institution: String,
        members: usize,
    },
}

pub struct Collector {
    fetcher: Fetcher,
    options: CollectOptions,
    coauthor_selector: Selector,
}

impl Collector {
    pub fn new(options: CollectOptions) -> Result<Self, CollectError> {
        let fetcher = Fetcher::new(&options)?;
        let coauthor_selector = parse_selector(&options.coauthor_selector)?;
        Ok(Self {
            fetcher,
            options,
            coauthor_selector,
        })
    }

    pub fn options(&self) -> &CollectOptions {
        &self.options
    }

    /// Crawl every source (or only those whose alias is in `aliases`) and
    /// return member → raw co-author affiliations per institution.
    ///
    /// Failures are per institution or per member: a roster that never
    /// loads leaves that institution out, a member whose profile cannot be
    /// found or fetched is reported as skipped and not recorded.
    pub async fn collect<F>(
        &self,
        sources: &[InstitutionSource],
        aliases: Option<&[String]>,
        progress: F,
    ) -> Connections
    where
        F: Fn(CollectEvent),
    {
        let mut connections = Connections::new();

        for source in sources.iter().filter(|s| selected(s, aliases)) {
            let names = match crawl_roster(&self.fetcher, &source.url, &source.selector).await {
                Ok(names) => names,
                Err(e) => {
                    tracing::error!(institution = %source.name, error = %e, "roster crawl failed");
                    progress(CollectEvent::InstitutionFailed {
                        institution: source.name.clone(),
                        error: e.to_string(),
                    });
                    continue;
                }
            };
            progress(CollectEvent::InstitutionStarted {
                institution: source.name.clone(),
                members: names.len(),
            });

            let romanizer = romanizer_for(source.name_order);
            let members = connections.entry(source.name.clone()).or_default();

            for raw in &names {
                let cleaned = clean_name(raw);
                let romanized = romanizer.romanize(&cleaned);
                let member = match romanized {
                    Some(m) if !contains_cjk(&m) => m,
                    _ => {
                        tracing::warn!(institution = %source.name, name = %raw, "no romanized form, skipping");
                        progress(CollectEvent::MemberSkipped {
                            institution: source.name.clone(),
                            member: raw.clone(),
                            reason: "no romanized form".to_string(),
                        });
                        continue;
                    }
                };
                if members.contains_key(&member) {
                    continue;
                }

                match self.member_affiliations(&member, &source.name).await {
                    Some(affiliations) => {
                        progress(CollectEvent::MemberCollected {
                            institution: source.name.clone(),
                            member: member.clone(),
                            affiliations: affiliations.len(),
                        });
                        members.insert(member, affiliations);
                    }
                    None => progress(CollectEvent::MemberSkipped {
                        institution: source.name.clone(),
                        member,
                        reason: "no scholar profile".to_string(),
                    }),
                }

                tokio::time::sleep(random_between(self.options.delay_min, self.options.delay_max))
                    .await;
            }

            progress(CollectEvent::InstitutionFinished {
                institution: source.name.clone(),
                members: members.len(),
            });
        }

        connections
    }

    /// `None` when no profile page could be found or loaded.
    async fn member_affiliations(&self, member: &str, institution: &str) -> Option<Vec<String>> {
        let query = format!("{member} {institution}");
        let results = self.search(&query).await?;
        let Some(profile) = find_profile_link(&results) else {
            tracing::debug!(member, institution, "no scholar profile in results");
            return None;
        };

        match self.fetcher.fetch(&profile).await {
            Ok(html) => Some(coauthor_affiliations(
                &html,
                &self.coauthor_selector,
                self.options.top_k,
            )),
            Err(e) => {
                tracing::warn!(member, url = %profile, error = %e, "profile fetch failed");
                None
            }
        }
    }

    /// Run the query through a random search site, falling back to the
    /// primary (first) one if that fails.
    async fn search(&self, query: &str) -> Option<String> {
        let sites = &self.options.search_urls;
        if sites.is_empty() {
            return None;
        }
        let pick = fastrand::usize(..sites.len());
        let url = build_search_url(&sites[pick], query);

        match self.fetcher.fetch(&url).await {
            Ok(body) => Some(body),
            Err(e) if pick != 0 => {
                tracing::warn!(url = %url, error = %e, "search failed, retrying via primary site");
                let primary = build_search_url(&sites[0], query);
                self.fetcher.fetch(&primary).await.ok()
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "search failed");
                None
            }
        }
    }
}

fn selected(source: &InstitutionSource, aliases: Option<&[String]>) -> bool {
    match aliases {
        None => true,
        Some(list) => list.iter().any(|a| a.eq_ignore_ascii_case(&source.alias)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collabmap_core::config_file::NameOrder;

    fn source(alias: &str) -> InstitutionSource {
        InstitutionSource {
            name: format!("{alias} University"),
            alias: alias.to_string(),
            url: "http://127.0.0.1:1/".to_string(),
            selector: "li".to_string(),
            name_order: NameOrder::GivenFirst,
        }
    }

    #[test]
    fn alias_filter() {
        let zju = source("ZJU");
        assert!(selected(&zju, None));
        assert!(selected(&zju, Some(&["zju".to_string()][..])));
        assert!(!selected(&zju, Some(&["thu".to_string()][..])));
        assert!(!selected(&zju, Some(&[][..])));
    }

    #[test]
    fn bad_coauthor_selector_rejected() {
        let opts = CollectOptions {
            coauthor_selector: "div[[".to_string(),
            ..Default::default()
        };
        assert!(matches!(Collector::new(opts), Err(CollectError::Selector { .. })));
    }
}
