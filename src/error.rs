//! Error types for the research pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single round trip to the generation service.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// The service answered with a non-success HTTP status
    #[error("HTTP error {0}")]
    Status(u16),

    /// The request never produced a response
    #[error("Request error: {0}")]
    Transport(String),

    /// The response body could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The response carried no usable text
    #[error("Model returned an empty response")]
    EmptyResponse,

    /// The plan response was not a JSON array of strings
    #[error("Malformed plan: {0}")]
    MalformedPlan(String),
}

/// Failure to load a prompt template.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Failed to read prompt template {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Prompt template {0} is empty")]
    Empty(PathBuf),
}

/// Errors that can end a research run.
///
/// The `Display` text of every run-stage variant is the message shown to the
/// user; the underlying service failure is kept as the error source.
#[derive(Error, Debug)]
pub enum Error {
    /// The subject was empty or whitespace only
    #[error("Please enter a research subject.")]
    InputValidation,

    /// Stage 1 failed
    #[error(
        "Failed to author a custom research directive. The model may have had an issue with the provided subject or notes."
    )]
    Directive(#[source] GenerationError),

    /// Stage 2 failed, including malformed plan output
    #[error("Failed to generate a research plan. The model might be unable to process this topic.")]
    Planning(#[source] GenerationError),

    /// Stage 3 failed on one plan step
    #[error("Failed to conduct research for \"{step}\". The API may be temporarily unavailable.")]
    ResearchStep {
        index: usize,
        step: String,
        #[source]
        source: GenerationError,
    },

    /// Stage 4 failed
    #[error(
        "Failed to synthesize the final knowledge report. The model encountered an issue during generation."
    )]
    Report(#[source] GenerationError),

    /// Another run is still in flight
    #[error("A research run is already in progress.")]
    Busy,

    /// Prompt templates could not be loaded
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The report file could not be written
    #[error("Failed to save report to {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for research operations.
pub type Result<T> = std::result::Result<T, Error>;
