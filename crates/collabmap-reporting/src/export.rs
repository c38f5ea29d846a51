use std::io::Write;
use std::path::Path;

use collabmap_core::stats::normalize_unit;
use collabmap_core::{CountsByInstitution, StatsByInstitution};

use crate::ExportFormat;

/// Write rendered report content to `path`, creating parent directories.
pub fn write_report(content: &str, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create directory: {}", e))?;
    }
    let mut file =
        std::fs::File::create(path).map_err(|e| format!("Failed to create file: {}", e))?;
    file.write_all(content.as_bytes())
        .map_err(|e| format!("Failed to write: {}", e))?;
    tracing::info!(path = %path.display(), "wrote report");
    Ok(())
}

/// Render per-institution statistics.
pub fn export_stats(stats: &StatsByInstitution, format: ExportFormat) -> Result<String, String> {
    match format {
        ExportFormat::Json => to_json(stats),
        ExportFormat::Csv => Ok(stats_csv(stats)),
        ExportFormat::Text => Ok(stats_text(stats)),
    }
}

/// Render collaborator counts.
pub fn export_counts(counts: &CountsByInstitution, format: ExportFormat) -> Result<String, String> {
    match format {
        ExportFormat::Json => to_json(counts),
        ExportFormat::Csv => Ok(counts_csv(counts)),
        ExportFormat::Text => Ok(counts_text(counts)),
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, String> {
    let mut out =
        serde_json::to_string_pretty(value).map_err(|e| format!("Failed to serialize: {}", e))?;
    out.push('\n');
    Ok(out)
}

fn csv_escape(s: &str) -> String {
    if s.contains('"') || s.contains(',') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Relative collaboration activity in [0, 1] across the institutions in
/// `stats`, by co-authors per connected member.
fn activity_scores(stats: &StatsByInstitution) -> Vec<f64> {
    let values: Vec<f64> = stats
        .values()
        .map(|s| s.avg_coauthors_per_connected_member)
        .collect();
    normalize_unit(&values)
}

fn stats_csv(stats: &StatsByInstitution) -> String {
    let mut out = String::from(
        "Institution,TotalMembers,MembersWithConnection,TotalConnections,InnerConnectionRatio,UniqueConnections,AvgCoauthorsPerMember,AvgCoauthorsPerConnectedMember,AvgUniquePerConnectedMember,Activity\n",
    );
    for ((name, s), activity) in stats.iter().zip(activity_scores(stats)) {
        out.push_str(&format!(
            "{},{},{},{},{:.4},{},{:.4},{:.4},{:.4},{:.4}\n",
            csv_escape(name),
            s.total_members,
            s.members_with_connection,
            s.total_connections,
            s.inner_connection_ratio,
            s.unique_connections,
            s.avg_coauthors_per_member,
            s.avg_coauthors_per_connected_member,
            s.avg_unique_per_connected_member,
            activity,
        ));
    }
    out
}

fn stats_text(stats: &StatsByInstitution) -> String {
    let mut out = String::from("Collaboration Statistics\n");
    out.push_str(&"=".repeat(60));
    out.push('\n');

    for ((name, s), activity) in stats.iter().zip(activity_scores(stats)) {
        out.push_str(&format!("\n{}\n", name));
        out.push_str(&"-".repeat(name.chars().count()));
        out.push('\n');
        out.push_str(&format!(
            "  {} members | {} with co-authors | {} connections | {} unique\n",
            s.total_members, s.members_with_connection, s.total_connections, s.unique_connections,
        ));
        out.push_str(&format!(
            "  inner ratio {:.1}% | {:.2} per member | {:.2} per connected member | {:.2} unique per connected member\n",
            s.inner_connection_ratio * 100.0,
            s.avg_coauthors_per_member,
            s.avg_coauthors_per_connected_member,
            s.avg_unique_per_connected_member,
        ));
        out.push_str(&format!("  activity {:.2}\n", activity));
    }
    out
}

fn counts_csv(counts: &CountsByInstitution) -> String {
    let mut out = String::from("Institution,Collaborator,Count\n");
    for (name, collaborators) in counts {
        for c in collaborators {
            out.push_str(&format!(
                "{},{},{}\n",
                csv_escape(name),
                csv_escape(&c.institution),
                c.count
            ));
        }
    }
    out
}

fn counts_text(counts: &CountsByInstitution) -> String {
    let mut out = String::from("Collaborating Institutions\n");
    out.push_str(&"=".repeat(60));
    out.push('\n');

    for (name, collaborators) in counts {
        out.push_str(&format!("\n{}\n", name));
        out.push_str(&"-".repeat(name.chars().count()));
        out.push('\n');
        if collaborators.is_empty() {
            out.push_str("  (none)\n");
        }
        let width = collaborators
            .iter()
            .map(|c| c.count.to_string().len())
            .max()
            .unwrap_or(1);
        for c in collaborators {
            out.push_str(&format!("  {:>width$}  {}\n", c.count, c.institution));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use collabmap_core::{InstitutionCount, InstitutionStats};

    fn sample_stats() -> StatsByInstitution {
        let mut stats = StatsByInstitution::new();
        stats.insert(
            "Zhejiang University".to_string(),
            InstitutionStats {
                total_members: 4,
                members_with_connection: 2,
                total_connections: 6,
                inner_connection_ratio: 0.5,
                unique_connections: 3,
                avg_coauthors_per_member: 1.5,
                avg_coauthors_per_connected_member: 3.0,
                avg_unique_per_connected_member: 1.5,
            },
        );
        stats.insert("Empty, Institute".to_string(), InstitutionStats::default());
        stats
    }

    fn sample_counts() -> CountsByInstitution {
        let mut counts = CountsByInstitution::new();
        counts.insert(
            "zhejiang university".to_string(),
            vec![
                InstitutionCount {
                    institution: "zhejiang university".to_string(),
                    count: 12,
                },
                InstitutionCount {
                    institution: "microsoft".to_string(),
                    count: 3,
                },
            ],
        );
        counts.insert("nobody".to_string(), vec![]);
        counts
    }

    #[test]
    fn test_csv_escape() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_stats_csv() {
        let out = export_stats(&sample_stats(), ExportFormat::Csv).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Institution,TotalMembers,"));
        // BTreeMap order; the name with a comma is quoted
        assert!(lines[1].starts_with("\"Empty, Institute\",0,0,0,0.0000,0,"));
        assert!(lines[1].ends_with(",0.0000"));
        assert_eq!(
            lines[2],
            "Zhejiang University,4,2,6,0.5000,3,1.5000,3.0000,1.5000,1.0000"
        );
    }

    #[test]
    fn test_stats_json_roundtrips() {
        let stats = sample_stats();
        let out = export_stats(&stats, ExportFormat::Json).unwrap();
        let back: StatsByInstitution = serde_json::from_str(&out).unwrap();
        assert_eq!(back, stats);
    }

    #[test]
    fn test_stats_text() {
        let out = export_stats(&sample_stats(), ExportFormat::Text).unwrap();
        assert!(out.starts_with("Collaboration Statistics\n"));
        assert!(out.contains("\nZhejiang University\n-------------------\n"));
        assert!(out.contains("4 members | 2 with co-authors | 6 connections | 3 unique"));
        assert!(out.contains("inner ratio 50.0%"));
    }

    #[test]
    fn test_counts_csv() {
        let out = export_counts(&sample_counts(), ExportFormat::Csv).unwrap();
        assert_eq!(
            out,
            "Institution,Collaborator,Count\n\
             zhejiang university,zhejiang university,12\n\
             zhejiang university,microsoft,3\n"
        );
    }

    #[test]
    fn test_counts_text() {
        let out = export_counts(&sample_counts(), ExportFormat::Text).unwrap();
        assert!(out.contains("\nnobody\n------\n  (none)\n"));
        assert!(out.contains("  12  zhejiang university\n"));
        assert!(out.contains("   3  microsoft\n"));
    }

    #[test]
    fn test_empty_inputs() {
        let stats = StatsByInstitution::new();
        assert_eq!(
            export_stats(&stats, ExportFormat::Csv).unwrap().lines().count(),
            1
        );
        assert_eq!(export_stats(&stats, ExportFormat::Json).unwrap(), "{}\n");
    }

    #[test]
    fn test_write_report_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("stats.csv");
        write_report("a,b\n", &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a,b\n");
    }
}
