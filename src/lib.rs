//! Deep Research - a multi-stage research pipeline over a generative model
//!
//! A run authors a research directive from a subject and notes, asks the
//! model for a step-by-step plan, researches every step with search
//! grounding, and synthesizes a Markdown report from the findings. The
//! pipeline is strictly sequential and publishes its progress as snapshots
//! that a UI can watch while the run is in flight.
//!
//! # Quick Start
//!
//! ```ignore
//! use deep_research::{
//!     GeminiBackend, GenerationClient, Orchestrator, PromptTemplates, ResearchConfig,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ResearchConfig::from_env()?;
//!     let templates = PromptTemplates::load(&config.prompts_dir)?;
//!     let client = GenerationClient::new(
//!         Arc::new(GeminiBackend::new(&config)),
//!         Arc::new(templates),
//!         config.stages.clone(),
//!     );
//!
//!     let orchestrator = Orchestrator::new(client).verbose(true);
//!     let report = orchestrator.run("Solar panel ROI", "").await?;
//!     println!("{}", report);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
mod error;
pub mod events;
mod orchestrator;
pub mod prompt;
pub mod render;
pub mod server;
pub mod state;

pub use client::{
    Citation, GeminiBackend, GenerateRequest, GenerateResponse, GenerationClient, ModelBackend,
    ResearchFinding,
};
pub use config::{ResearchConfig, Stage, StageOptions, StageSettings};
pub use error::{Error, GenerationError, Result, TemplateError};
pub use events::{ResearchCallbacks, ResearchEvent};
pub use orchestrator::Orchestrator;
pub use prompt::PromptTemplates;
pub use state::{ResearchResult, ResearchStep, RunState, Snapshot, Source, StepStatus};
