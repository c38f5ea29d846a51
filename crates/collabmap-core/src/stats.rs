//! Per-institution collaboration statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Connections;
use crate::aggregate::CountsByInstitution;
use crate::text_utils::institution_key;

/// Summary of one home institution's collaborations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstitutionStats {
    /// Members with a scholar profile in the connections file.
    pub total_members: usize,
    /// Members whose profile lists at least one co-author.
    pub members_with_connection: usize,
    /// Collaborator occurrences, duplicates included.
    pub total_connections: usize,
    /// Share of occurrences pointing back at the home institution.
    pub inner_connection_ratio: f64,
    /// Distinct collaborating institutions.
    pub unique_connections: usize,
    /// `total_connections / total_members`
    pub avg_coauthors_per_member: f64,
    /// `total_connections / members_with_connection`
    pub avg_coauthors_per_connected_member: f64,
    /// `unique_connections / members_with_connection`
    pub avg_unique_per_connected_member: f64,
}

pub type StatsByInstitution = BTreeMap<String, InstitutionStats>;

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

/// Compute statistics for every institution present in either input.
///
/// Ratios with a zero denominator are reported as 0.0.
pub fn compute_stats(connections: &Connections, counts: &CountsByInstitution) -> StatsByInstitution {
    let mut stats = StatsByInstitution::new();

    for (institution, members) in connections {
        let entry = stats.entry(institution.clone()).or_default();
        entry.total_members = members.len();
        entry.members_with_connection = members.values().filter(|raw| !raw.is_empty()).count();
    }

    for (institution, collaborators) in counts {
        let entry = stats.entry(institution.clone()).or_default();
        let home = institution_key(institution);

        let mut inner = 0;
        for c in collaborators {
            entry.total_connections += c.count;
            if !home.is_empty() && institution_key(&c.institution) == home {
                inner += c.count;
            }
        }
        entry.unique_connections = collaborators.len();
        entry.inner_connection_ratio = ratio(inner, entry.total_connections);
    }

    for entry in stats.values_mut() {
        entry.avg_coauthors_per_member = ratio(entry.total_connections, entry.total_members);
        entry.avg_coauthors_per_connected_member =
            ratio(entry.total_connections, entry.members_with_connection);
        entry.avg_unique_per_connected_member =
            ratio(entry.unique_connections, entry.members_with_connection);
    }

    stats
}

/// Min-max normalize to [0, 1].
pub fn normalize_unit(values: &[f64]) -> Vec<f64> {
    let (min, max) = bounds(values);
    values
        .iter()
        .map(|v| (v - min) / (max - min + f64::EPSILON))
        .collect()
}

/// Min-max normalize to [-1, 1].
pub fn normalize_signed(values: &[f64]) -> Vec<f64> {
    normalize_unit(values)
        .into_iter()
        .map(|v| 2.0 * v - 1.0)
        .collect()
}

fn bounds(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::InstitutionCount;

    fn count(name: &str, n: usize) -> InstitutionCount {
        InstitutionCount {
            institution: name.to_string(),
            count: n,
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn computes_ratios() {
        let mut connections = Connections::new();
        let mut members = BTreeMap::new();
        members.insert("a".to_string(), vec!["x".to_string(), "y".to_string()]);
        members.insert("b".to_string(), vec!["z".to_string()]);
        members.insert("c".to_string(), vec![]);
        members.insert("d".to_string(), vec![]);
        connections.insert("Nanjing University".to_string(), members);

        let mut counts = CountsByInstitution::new();
        counts.insert(
            "Nanjing University".to_string(),
            vec![count("nanjing university", 3), count("google", 1)],
        );

        let stats = compute_stats(&connections, &counts);
        let s = &stats["Nanjing University"];
        assert_eq!(s.total_members, 4);
        assert_eq!(s.members_with_connection, 2);
        assert_eq!(s.total_connections, 4);
        assert_eq!(s.unique_connections, 2);
        assert!(approx(s.inner_connection_ratio, 0.75));
        assert!(approx(s.avg_coauthors_per_member, 1.0));
        assert!(approx(s.avg_coauthors_per_connected_member, 2.0));
        assert!(approx(s.avg_unique_per_connected_member, 1.0));
    }

    #[test]
    fn zero_denominators_are_zero() {
        let mut connections = Connections::new();
        connections.insert("Empty U".to_string(), BTreeMap::new());
        let mut counts = CountsByInstitution::new();
        counts.insert("Empty U".to_string(), vec![]);

        let stats = compute_stats(&connections, &counts);
        let s = &stats["Empty U"];
        assert_eq!(s.total_connections, 0);
        assert_eq!(s.inner_connection_ratio, 0.0);
        assert_eq!(s.avg_coauthors_per_member, 0.0);
        assert_eq!(s.avg_unique_per_connected_member, 0.0);
    }

    #[test]
    fn institution_only_in_counts() {
        let mut counts = CountsByInstitution::new();
        counts.insert("Fudan University".to_string(), vec![count("fudan university", 2)]);
        let stats = compute_stats(&Connections::new(), &counts);
        let s = &stats["Fudan University"];
        assert_eq!(s.total_members, 0);
        assert!(approx(s.inner_connection_ratio, 1.0));
        assert_eq!(s.avg_coauthors_per_member, 0.0);
    }

    #[test]
    fn normalization() {
        let unit = normalize_unit(&[1.0, 2.0, 3.0]);
        assert!(approx(unit[0], 0.0));
        assert!((unit[2] - 1.0).abs() < 1e-6);
        let signed = normalize_signed(&[1.0, 3.0]);
        assert!(approx(signed[0], -1.0));
        assert!((signed[1] - 1.0).abs() < 1e-6);
        assert!(normalize_unit(&[]).is_empty());
        // constant input stays finite
        assert!(normalize_unit(&[5.0, 5.0]).iter().all(|v| v.is_finite()));
    }
}
