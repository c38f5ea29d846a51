use std::io::Write;

use collabmap_collect::CollectEvent;
use collabmap_core::{CanonicalAffiliation, CountsByInstitution};
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print one `classify` result: the canonical token, or `-` when nothing
/// matched.
pub fn print_classification(
    w: &mut dyn Write,
    raw: &str,
    result: Option<&CanonicalAffiliation>,
    verbose: bool,
    color: ColorMode,
) -> std::io::Result<()> {
    let Some(aff) = result else {
        if color.enabled() {
            writeln!(w, "{}", "-".dimmed())?;
        } else {
            writeln!(w, "-")?;
        }
        return Ok(());
    };

    if !verbose {
        return writeln!(w, "{}", aff.token);
    }
    if color.enabled() {
        writeln!(
            w,
            "{}  {}  {}",
            aff.token.green(),
            format!("[{}]", aff.category).cyan(),
            raw.dimmed()
        )
    } else {
        writeln!(w, "{}  [{}]  {}", aff.token, aff.category, raw)
    }
}

/// Line to show above the progress bar for notable collection events.
pub fn describe_event(event: &CollectEvent, color: ColorMode) -> Option<String> {
    match event {
        CollectEvent::InstitutionFailed { institution, error } => {
            let msg = format!("{}: roster unavailable ({})", institution, error);
            Some(if color.enabled() {
                msg.red().to_string()
            } else {
                msg
            })
        }
        CollectEvent::InstitutionFinished {
            institution,
            members,
        } => {
            let msg = format!("{}: {} members collected", institution, members);
            Some(if color.enabled() {
                msg.green().to_string()
            } else {
                msg
            })
        }
        _ => None,
    }
}

/// Print the `top` most frequent collaborators of each institution.
pub fn print_counts_summary(
    w: &mut dyn Write,
    counts: &CountsByInstitution,
    top: usize,
    color: ColorMode,
) -> std::io::Result<()> {
    for (institution, collaborators) in counts {
        let total: usize = collaborators.iter().map(|c| c.count).sum();
        if color.enabled() {
            writeln!(
                w,
                "{} {}",
                institution.bold(),
                format!("({} collaborations, {} institutions)", total, collaborators.len())
                    .dimmed()
            )?;
        } else {
            writeln!(
                w,
                "{} ({} collaborations, {} institutions)",
                institution,
                total,
                collaborators.len()
            )?;
        }
        for c in collaborators.iter().take(top) {
            writeln!(w, "  {:>5}  {}", c.count, c.institution)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use collabmap_core::InstitutionCount;

    fn render(f: impl FnOnce(&mut Vec<u8>) -> std::io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn classification_plain() {
        let aff = CanonicalAffiliation {
            token: "zhejiang university".to_string(),
            category: "education".to_string(),
        };
        let out = render(|w| print_classification(w, "raw", Some(&aff), false, ColorMode(false)));
        assert_eq!(out, "zhejiang university\n");

        let out = render(|w| print_classification(w, "raw", Some(&aff), true, ColorMode(false)));
        assert_eq!(out, "zhejiang university  [education]  raw\n");

        let out = render(|w| print_classification(w, "raw", None, true, ColorMode(false)));
        assert_eq!(out, "-\n");
    }

    #[test]
    fn counts_summary_truncates() {
        let mut counts = CountsByInstitution::new();
        counts.insert(
            "Test University".to_string(),
            vec![
                InstitutionCount {
                    institution: "a".to_string(),
                    count: 3,
                },
                InstitutionCount {
                    institution: "b".to_string(),
                    count: 1,
                },
            ],
        );
        let out = render(|w| print_counts_summary(w, &counts, 1, ColorMode(false)));
        assert_eq!(
            out,
            "Test University (4 collaborations, 2 institutions)\n      3  a\n"
        );
    }

    #[test]
    fn only_notable_events_described() {
        let skipped = CollectEvent::MemberSkipped {
            institution: "T".to_string(),
            member: "x".to_string(),
            reason: "r".to_string(),
        };
        assert_eq!(describe_event(&skipped, ColorMode(false)), None);

        let failed = CollectEvent::InstitutionFailed {
            institution: "T".to_string(),
            error: "HTTP 404".to_string(),
        };
        assert_eq!(
            describe_event(&failed, ColorMode(false)).as_deref(),
            Some("T: roster unavailable (HTTP 404)")
        );
    }
}
