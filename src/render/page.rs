//! Full HTML pages for the browser UI.

use super::markdown::{self, escape_html};
use super::progress;
use crate::state::{RunState, Snapshot};

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; background: #f8fafc; color: #1e293b; margin: 0; padding: 2rem; }
header { text-align: center; margin-bottom: 2.5rem; }
header h1 { color: #6366f1; margin-bottom: 0.25rem; }
main { max-width: 56rem; margin: 0 auto; }
.card { background: #fff; border-radius: 0.5rem; box-shadow: 0 4px 12px rgba(0,0,0,0.08); padding: 1.5rem; }
label { display: block; font-weight: 500; margin: 1rem 0 0.25rem; }
input, textarea { width: 100%; box-sizing: border-box; padding: 0.75rem; font-size: 1rem; border: 1px solid #cbd5e1; border-radius: 0.375rem; }
textarea { min-height: 100px; }
button, .button { display: inline-block; margin-top: 1rem; padding: 0.6rem 1.2rem; border: 0; border-radius: 0.375rem; background: #4f46e5; color: #fff; font-size: 1rem; cursor: pointer; text-decoration: none; }
.error { color: #b91c1c; background: #fee2e2; border: 1px solid #ef4444; border-radius: 0.375rem; padding: 0.5rem 1rem; margin-top: 1rem; }
.status { font-weight: 600; text-align: center; margin-bottom: 1.5rem; }
.steps { list-style: none; padding: 0; }
.step { background: #f1f5f9; border-radius: 0.375rem; padding: 0.75rem; margin-bottom: 0.75rem; }
.step.complete { color: #64748b; text-decoration: line-through; }
.marker { margin-right: 0.75rem; }
.actions { display: flex; gap: 0.5rem; justify-content: flex-end; }
.actions form { margin: 0; }
.cite { color: #818cf8; font-size: 0.75rem; }
footer { text-align: center; margin-top: 3rem; color: #64748b; font-size: 0.875rem; }
"#;

const COPY_SCRIPT: &str = r#"
function copyReport(button) {
  const text = document.getElementById('report-source').value;
  navigator.clipboard.writeText(text).then(() => {
    button.textContent = 'Copied!';
    setTimeout(() => { button.textContent = 'Copy Markdown'; }, 2000);
  });
}
"#;

fn layout(body: &str, refresh: bool) -> String {
    let refresh = if refresh {
        r#"<meta http-equiv="refresh" content="2">"#
    } else {
        ""
    };
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
{refresh}
<title>Deep Research Assistant</title>
<style>{STYLE}</style>
</head>
<body>
<header>
<h1>Deep Research Assistant</h1>
<p>Author a custom research plan and generate a comprehensive, source-grounded knowledge report.</p>
</header>
<main>
{body}
</main>
<footer><p>Powered by Google Gemini</p></footer>
</body>
</html>
"#
    )
}

/// The input form, with the last error if any.
pub fn form_page(error: Option<&str>) -> String {
    let error = error
        .map(|e| format!(r#"<p class="error">{}</p>"#, escape_html(e)))
        .unwrap_or_default();
    let body = format!(
        r#"<form class="card" method="post" action="/research">
<label for="subject">Subject to Research</label>
<input id="subject" name="subject" type="text" placeholder="e.g., 'Mooka Stores for passive income'" required>
<label for="notes">Special Notes or Considerations (Optional)</label>
<textarea id="notes" name="notes" placeholder="e.g., 'Focus on the founder's background and credibility...' or paste a custom research methodology."></textarea>
<button type="submit">Start Deep Research</button>
</form>
{error}"#
    );
    layout(&body, false)
}

/// Progress of the current run; reloads itself until the run ends.
pub fn progress_page(snapshot: &Snapshot) -> String {
    let body = format!(
        r#"<h2>Researching: {}</h2><div class="card">{}</div>"#,
        escape_html(&snapshot.subject),
        progress::to_html(snapshot)
    );
    layout(&body, true)
}

/// The finished report with download, copy and restart actions.
pub fn report_page(subject: &str, report: &str) -> String {
    let body = format!(
        r#"<div class="card">
<div class="actions">
<a class="button" href="/report.md">Download .md</a>
<button type="button" onclick="copyReport(this)">Copy Markdown</button>
<form method="post" action="/reset"><button type="submit">Start New Research</button></form>
</div>
<h2>Deep Research Report: {}</h2>
<article>{}</article>
<textarea id="report-source" hidden>{}</textarea>
</div>
<script>{COPY_SCRIPT}</script>"#,
        escape_html(subject),
        markdown::to_html(report),
        escape_html(report)
    );
    layout(&body, false)
}

/// Shown when a request collides with a run in flight.
pub fn busy_page(message: &str) -> String {
    let body = format!(
        r#"<div class="card"><p class="error">{}</p><a class="button" href="/">Back to progress</a></div>"#,
        escape_html(message)
    );
    layout(&body, false)
}

/// The page for the current snapshot.
pub fn render(snapshot: &Snapshot) -> String {
    match snapshot.state {
        RunState::Idle => form_page(None),
        RunState::Error => form_page(snapshot.error.as_deref()),
        RunState::Complete => {
            report_page(&snapshot.subject, snapshot.report.as_deref().unwrap_or(""))
        }
        _ => progress_page(snapshot),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_shows_form() {
        let html = render(&Snapshot::default());
        assert!(html.contains(r#"action="/research""#));
        assert!(!html.contains(r#"class="error""#));
    }

    #[test]
    fn test_error_shows_message_on_form() {
        let snapshot = Snapshot {
            state: RunState::Error,
            error: Some("Please enter a research subject.".into()),
            ..Snapshot::default()
        };
        let html = render(&snapshot);
        assert!(html.contains(r#"<p class="error">Please enter a research subject.</p>"#));
    }

    #[test]
    fn test_running_page_refreshes() {
        let snapshot = Snapshot {
            state: RunState::Planning,
            subject: "Tea & Coffee".into(),
            ..Snapshot::default()
        };
        let html = render(&snapshot);
        assert!(html.contains(r#"http-equiv="refresh""#));
        assert!(html.contains("Researching: Tea &amp; Coffee"));
    }

    #[test]
    fn test_report_page_renders_markdown_and_source() {
        let snapshot = Snapshot {
            state: RunState::Complete,
            subject: "Tea".into(),
            report: Some("# Tea Report\n- **cheap**".into()),
            ..Snapshot::default()
        };
        let html = render(&snapshot);
        assert!(html.contains("<h1>Tea Report</h1>"));
        assert!(html.contains("<li><strong>cheap</strong></li>"));
        assert!(html.contains("# Tea Report\n- **cheap**</textarea>"));
        assert!(html.contains(r#"href="/report.md""#));
    }
}
