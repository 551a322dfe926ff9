//! Prompt templates for each pipeline stage.
//!
//! Templates are plain text files with `{{name}}` placeholders. They are read
//! once at startup and shared read-only for the lifetime of the process.

use crate::config::Stage;
use crate::error::TemplateError;
use std::path::Path;
use tracing::{debug, warn};

const BUILTIN_DIRECTIVE: &str = include_str!("../prompts/directive.txt");
const BUILTIN_PLAN: &str = include_str!("../prompts/plan.txt");
const BUILTIN_RESEARCH: &str = include_str!("../prompts/research_step.txt");
const BUILTIN_REPORT: &str = include_str!("../prompts/report.txt");

impl Stage {
    /// File name of the stage's template inside the prompts directory.
    pub fn template_file(self) -> &'static str {
        match self {
            Stage::Directive => "directive.txt",
            Stage::Plan => "plan.txt",
            Stage::Research => "research_step.txt",
            Stage::Report => "report.txt",
        }
    }

    /// Placeholders the stage's template is expected to contain.
    pub fn placeholders(self) -> &'static [&'static str] {
        match self {
            Stage::Directive => &["subject", "notes"],
            Stage::Plan => &["authoredDirective"],
            Stage::Research => &["authoredDirective", "mainTopic", "subTopic"],
            Stage::Report => &["topic", "researchData"],
        }
    }
}

/// The four stage templates.
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    directive: String,
    plan: String,
    research: String,
    report: String,
}

impl PromptTemplates {
    /// Create templates from explicit text.
    pub fn new(
        directive: impl Into<String>,
        plan: impl Into<String>,
        research: impl Into<String>,
        report: impl Into<String>,
    ) -> Self {
        Self {
            directive: directive.into(),
            plan: plan.into(),
            research: research.into(),
            report: report.into(),
        }
    }

    /// Templates compiled into the binary.
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_DIRECTIVE,
            BUILTIN_PLAN,
            BUILTIN_RESEARCH,
            BUILTIN_REPORT,
        )
    }

    /// Load all four templates from a directory.
    ///
    /// Fails on the first missing, unreadable or empty file.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, TemplateError> {
        let dir = dir.as_ref();
        let read = |stage: Stage| -> Result<String, TemplateError> {
            let path = dir.join(stage.template_file());
            let text = std::fs::read_to_string(&path).map_err(|source| TemplateError::Read {
                path: path.clone(),
                source,
            })?;
            if text.trim().is_empty() {
                return Err(TemplateError::Empty(path));
            }
            for name in stage.placeholders() {
                if !text.contains(&placeholder(name)) {
                    warn!(
                        template = %path.display(),
                        placeholder = name,
                        "Template is missing a placeholder"
                    );
                }
            }
            debug!(template = %path.display(), bytes = text.len(), "Loaded prompt template");
            Ok(text)
        };

        Ok(Self {
            directive: read(Stage::Directive)?,
            plan: read(Stage::Plan)?,
            research: read(Stage::Research)?,
            report: read(Stage::Report)?,
        })
    }

    /// Raw template text for a stage.
    pub fn template(&self, stage: Stage) -> &str {
        match stage {
            Stage::Directive => &self.directive,
            Stage::Plan => &self.plan,
            Stage::Research => &self.research,
            Stage::Report => &self.report,
        }
    }

    /// Render a stage's template, replacing every `{{name}}` with its value.
    ///
    /// Substitution is sequential, in the order given.
    pub fn render(&self, stage: Stage, vars: &[(&str, &str)]) -> String {
        vars.iter()
            .fold(self.template(stage).to_string(), |text, (name, value)| {
                text.replace(&placeholder(name), value)
            })
    }
}

fn placeholder(name: &str) -> String {
    format!("{{{{{}}}}}", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_templates_have_placeholders() {
        let templates = PromptTemplates::builtin();
        for stage in Stage::ALL {
            for name in stage.placeholders() {
                assert!(
                    templates.template(stage).contains(&placeholder(name)),
                    "{} template lacks {}",
                    stage.name(),
                    name
                );
            }
        }
    }

    #[test]
    fn test_render_replaces_all_occurrences() {
        let templates = PromptTemplates::new("{{subject}} / {{subject}} ({{notes}})", "", "", "");
        let text = templates.render(Stage::Directive, &[("subject", "Tea"), ("notes", "None")]);
        assert_eq!(text, "Tea / Tea (None)");
    }

    #[test]
    fn test_render_leaves_unknown_placeholders() {
        let templates = PromptTemplates::new("", "{{authoredDirective}} {{other}}", "", "");
        let text = templates.render(Stage::Plan, &[("authoredDirective", "D")]);
        assert_eq!(text, "D {{other}}");
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        for stage in Stage::ALL {
            std::fs::write(dir.path().join(stage.template_file()), stage.name()).unwrap();
        }

        let templates = PromptTemplates::load(dir.path()).unwrap();
        assert_eq!(templates.template(Stage::Research), "research");
        assert_eq!(templates.template(Stage::Report), "report");
    }

    #[test]
    fn test_load_fails_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("directive.txt"), "x").unwrap();

        let err = PromptTemplates::load(dir.path()).unwrap_err();
        match err {
            TemplateError::Read { path, .. } => assert!(path.ends_with("plan.txt")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_fails_on_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        for stage in Stage::ALL {
            std::fs::write(dir.path().join(stage.template_file()), "text").unwrap();
        }
        std::fs::write(dir.path().join("report.txt"), "  \n").unwrap();

        assert!(matches!(
            PromptTemplates::load(dir.path()),
            Err(TemplateError::Empty(_))
        ));
    }
}
