use crate::explanation::types::{Explanation, Severity};
use crate::scorer::GuildScoreResult;

/// Markdown formatter for explanations
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    /// Format a result and its explanations as a markdown report
    pub fn format(result: &GuildScoreResult, explanations: &[Explanation]) -> String {
        let mut md = String::with_capacity(2048);

        match result {
            GuildScoreResult::Veto(report) => {
                md.push_str("# Guild vetoed\n\n");
                md.push_str(&format!("**Reason:** {}\n\n", report.reason));
            }
            GuildScoreResult::Scored(scored) => {
                md.push_str(&format!("# Guild score {:+.3}\n\n", scored.guild_score));
                md.push_str(&format!(
                    "**Risk:** {:.3} | **Benefit:** {:.3} | **Tier:** {} | **Calibration:** {}\n\n",
                    scored.negative_risk,
                    scored.positive_benefit,
                    scored.calibration_tier.label(),
                    scored.calibration_version
                ));
                md.push_str(&format!("Members: {}\n\n", scored.members.join(", ")));
            }
        }

        for severity in [Severity::Critical, Severity::Warning, Severity::Informational] {
            let section: Vec<&Explanation> = explanations.iter().filter(|e| e.severity == severity).collect();
            if section.is_empty() {
                continue;
            }

            md.push_str(&format!("## {} {}\n\n", severity.icon(), heading(severity)));
            for explanation in section {
                match explanation.metric {
                    Some(metric) => md.push_str(&format!(
                        "### {} [{}]\n\n",
                        explanation.title,
                        metric.key().to_uppercase()
                    )),
                    None => md.push_str(&format!("### {}\n\n", explanation.title)),
                }
                md.push_str(&format!("{}\n\n", explanation.rationale));
                if explanation.low_confidence {
                    md.push_str("*Low confidence: limited data for this guild.*\n\n");
                }
            }
        }

        md
    }
}

fn heading(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "Critical",
        Severity::Warning => "Warnings",
        Severity::Informational => "Notes",
    }
}
