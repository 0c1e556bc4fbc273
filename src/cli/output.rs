// Plain-text rendering of discovery results

use std::fmt::Write;

use crate::mcp::{CustomSegmentProposal, Signal, ToolList};
use crate::providers::ProviderOutcome;

pub fn format_coverage(coverage: Option<f64>) -> String {
    coverage
        .map(|c| format!("{:.1}%", c))
        .unwrap_or_else(|| "Unknown".to_string())
}

pub fn format_cpm(cpm: Option<f64>) -> String {
    cpm.map(|c| format!("${:.2}", c))
        .unwrap_or_else(|| "Unknown".to_string())
}

fn format_signal(signal: &Signal) -> String {
    let platforms = if signal.deployments.is_empty() {
        "N/A".to_string()
    } else {
        signal
            .deployments
            .iter()
            .map(|d| d.platform.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        "  {:<40} {:<12} {:<20} {:>8} {:>8}  {}",
        signal.name,
        signal.signal_type.as_deref().unwrap_or("-"),
        signal.data_provider.as_deref().unwrap_or("-"),
        format_coverage(signal.coverage()),
        format_cpm(signal.cpm()),
        platforms
    )
}

fn format_proposal(proposal: &CustomSegmentProposal) -> String {
    let mut out = format!(
        "  * {} (coverage {}, CPM {})",
        proposal.proposed_name,
        format_coverage(proposal.estimated_coverage_percentage),
        format_cpm(proposal.estimated_cpm)
    );
    if let Some(description) = &proposal.description {
        let _ = write!(out, "\n      {}", description);
    }
    if let Some(rationale) = &proposal.creation_rationale {
        let _ = write!(out, "\n      why: {}", rationale);
    }
    out
}

/// Render one block per provider
pub fn render_outcomes(outcomes: &[ProviderOutcome]) -> String {
    let mut out = String::new();

    for outcome in outcomes {
        let _ = writeln!(out, "== {}", outcome.provider);
        match &outcome.result {
            Ok(response) => {
                if let Some(message) = &response.message {
                    let _ = writeln!(out, "  {}", message);
                }
                if response.signals.is_empty() {
                    let _ = writeln!(out, "  No signals found.");
                }
                for signal in &response.signals {
                    let _ = writeln!(out, "{}", format_signal(signal));
                }
                if !response.custom_segment_proposals.is_empty() {
                    let _ = writeln!(out, "  Custom segment proposals:");
                    for proposal in &response.custom_segment_proposals {
                        let _ = writeln!(out, "{}", format_proposal(proposal));
                    }
                }
            }
            Err(e) => {
                let _ = writeln!(out, "  error [{}]: {}", e.kind(), e);
            }
        }
    }

    out
}

pub fn render_tools(tools: &ToolList) -> String {
    let mut out = format!("Found {} tools:\n", tools.tools.len());
    for tool in &tools.tools {
        let _ = writeln!(
            out,
            "  - {}: {}",
            tool.name,
            tool.description.as_deref().unwrap_or("")
        );
    }
    out
}
