//! Live progress view of a running pipeline.

use super::markdown::escape_html;
use crate::state::{RunState, Snapshot, StepStatus};

/// Headline shown while a run is in the given state.
pub fn status_text(state: RunState) -> &'static str {
    match state {
        RunState::AuthoringDirective => "Authoring custom research directive...",
        RunState::Planning => "Generating research plan...",
        RunState::Researching => "Executing research steps...",
        RunState::GeneratingReport => "Synthesizing Knowledge Report...",
        _ => "Starting research...",
    }
}

fn marker(status: StepStatus) -> (&'static str, &'static str) {
    match status {
        StepStatus::Pending => ("pending", "○"),
        StepStatus::InProgress => ("in-progress", "◐"),
        StepStatus::Complete => ("complete", "●"),
    }
}

/// Render the status headline and the step list.
pub fn to_html(snapshot: &Snapshot) -> String {
    let mut html = format!(
        r#"<div class="status">{}</div><ul class="steps">"#,
        status_text(snapshot.state)
    );

    if snapshot.plan.is_empty() && snapshot.state != RunState::AuthoringDirective {
        html.push_str(r#"<li class="waiting">Waiting for research plan...</li>"#);
    }

    for step in &snapshot.plan {
        let (class, symbol) = marker(step.status);
        html.push_str(&format!(
            r#"<li class="step {}"><span class="marker">{}</span>{}</li>"#,
            class,
            symbol,
            escape_html(&step.task)
        ));
    }

    html.push_str("</ul>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ResearchStep;

    #[test]
    fn test_waiting_placeholder() {
        let mut snapshot = Snapshot {
            state: RunState::Planning,
            ..Snapshot::default()
        };
        assert!(to_html(&snapshot).contains("Waiting for research plan..."));

        snapshot.state = RunState::AuthoringDirective;
        let html = to_html(&snapshot);
        assert!(!html.contains("Waiting"));
        assert!(html.contains("Authoring custom research directive..."));
    }

    #[test]
    fn test_step_markers() {
        let snapshot = Snapshot {
            state: RunState::Researching,
            plan: vec![
                ResearchStep {
                    task: "Costs".into(),
                    status: StepStatus::Complete,
                },
                ResearchStep {
                    task: "Incentives <2024>".into(),
                    status: StepStatus::InProgress,
                },
            ],
            ..Snapshot::default()
        };

        let html = to_html(&snapshot);
        assert!(html.contains(
            r#"<li class="step complete"><span class="marker">●</span>Costs</li>"#
        ));
        assert!(html.contains("in-progress"));
        assert!(html.contains("Incentives &lt;2024&gt;"));
        assert!(html.contains("Executing research steps..."));
    }
}
