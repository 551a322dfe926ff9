//! Presentation: pages, progress, Markdown conversion and export.

pub mod export;
pub mod markdown;
pub mod page;
pub mod progress;

pub use export::{report_filename, save_report};
pub use markdown::to_html as markdown_to_html;
