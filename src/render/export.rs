//! Downloadable Markdown export of the final report.

use crate::error::{Error, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::info;

/// File name used when the subject yields no usable characters.
pub const DEFAULT_REPORT_FILENAME: &str = "deep-research-report.md";

static NON_SLUG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// File name for a subject's report, e.g. `solar-panel-roi-report.md`.
pub fn report_filename(subject: &str) -> String {
    let lowered = subject.to_lowercase();
    let slug = NON_SLUG.replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        DEFAULT_REPORT_FILENAME.to_string()
    } else {
        format!("{}-report.md", slug)
    }
}

/// `Content-Disposition` value offering the report as an attachment.
pub fn content_disposition(subject: &str) -> String {
    format!("attachment; filename=\"{}\"", report_filename(subject))
}

/// Write the report into `dir` under its slugged file name.
///
/// An existing file of the same name is overwritten.
pub fn save_report(dir: &Path, subject: &str, report: &str) -> Result<PathBuf> {
    let path = dir.join(report_filename(subject));
    std::fs::write(&path, report).map_err(|source| Error::Export {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), "Report saved");
    Ok(path)
}
