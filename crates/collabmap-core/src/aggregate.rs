//! Frequency tallying of canonical affiliations per home institution.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::Connections;
use crate::pipeline::AffiliationPipeline;

/// One collaborating institution and how often it appeared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstitutionCount {
    pub institution: String,
    pub count: usize,
}

/// Home institution → collaborators, most frequent first.
pub type CountsByInstitution = BTreeMap<String, Vec<InstitutionCount>>;

/// Home institution → member → canonical tokens.
pub type CanonicalConnections = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// Options for [`compute_frequency`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrequencyOptions {
    /// Only the first `top_k` raw entries of each member are considered.
    pub top_k: usize,
    /// Collaborators seen fewer than `min_occur` times are dropped.
    pub min_occur: usize,
}

impl Default for FrequencyOptions {
    fn default() -> Self {
        Self {
            top_k: 10,
            min_occur: 1,
        }
    }
}

/// Canonicalize every member of every institution.
///
/// Institutions are processed on scoped threads; the result is keyed, so
/// scheduling order never shows up in the output.
pub fn canonicalize_connections(
    connections: &Connections,
    pipeline: &AffiliationPipeline,
    top_k: usize,
) -> CanonicalConnections {
    std::thread::scope(|s| {
        let handles: Vec<_> = connections
            .iter()
            .map(|(institution, members)| {
                s.spawn(move || {
                    let canonical: BTreeMap<String, Vec<String>> = members
                        .iter()
                        .map(|(member, raw)| {
                            let capped = &raw[..raw.len().min(top_k)];
                            (member.clone(), pipeline.process_tokens(Some(capped)))
                        })
                        .collect();
                    (institution.clone(), canonical)
                })
            })
            .collect();

        handles
            .into_iter()
            .filter_map(|h| match h.join() {
                Ok(pair) => Some(pair),
                Err(_) => {
                    tracing::error!("canonicalization worker panicked");
                    None
                }
            })
            .collect()
    })
}

/// Count collaborator occurrences per home institution.
///
/// Each canonical token counts once per occurrence. The result is sorted by
/// count descending, then name ascending.
pub fn compute_frequency(
    connections: &Connections,
    pipeline: &AffiliationPipeline,
    options: FrequencyOptions,
) -> CountsByInstitution {
    let canonical = canonicalize_connections(connections, pipeline, options.top_k);
    tally(&canonical, options.min_occur)
}

/// Tally already-canonical connections.
pub fn tally(canonical: &CanonicalConnections, min_occur: usize) -> CountsByInstitution {
    canonical
        .iter()
        .map(|(institution, members)| {
            let mut count: HashMap<&str, usize> = HashMap::new();
            for token in members.values().flatten() {
                *count.entry(token.as_str()).or_default() += 1;
            }

            let mut ranked: Vec<InstitutionCount> = count
                .into_iter()
                .filter(|(_, n)| *n >= min_occur)
                .map(|(name, n)| InstitutionCount {
                    institution: name.to_string(),
                    count: n,
                })
                .collect();
            ranked.sort_by(|a, b| {
                b.count
                    .cmp(&a.count)
                    .then_with(|| a.institution.cmp(&b.institution))
            });

            tracing::debug!(
                institution = %institution,
                collaborators = ranked.len(),
                "tallied collaborators"
            );
            (institution.clone(), ranked)
        })
        .collect()
}
