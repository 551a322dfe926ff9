//! Run state machine and the observable session snapshot.
//!
//! The orchestrator is the only writer. Every mutation is published through a
//! `tokio::sync::watch` channel, so observers see intermediate stages while a
//! run is still in flight.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::error;

/// Stage of the research run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Idle,
    AuthoringDirective,
    Planning,
    Researching,
    GeneratingReport,
    Complete,
    Error,
}

impl RunState {
    /// Whether `next` is a legal successor of this state.
    ///
    /// Runs only move forward; the one way back is a reset to idle.
    pub fn can_transition_to(self, next: RunState) -> bool {
        use RunState::*;
        match (self, next) {
            (_, Idle) => true,
            (Idle | Complete | Error, AuthoringDirective | Error) => true,
            (AuthoringDirective, Planning)
            | (Planning, Researching)
            | (Researching, GeneratingReport)
            | (GeneratingReport, Complete) => true,
            (AuthoringDirective | Planning | Researching | GeneratingReport, Error) => true,
            _ => false,
        }
    }

    /// True while a stage is executing.
    pub fn is_running(self) -> bool {
        matches!(
            self,
            RunState::AuthoringDirective
                | RunState::Planning
                | RunState::Researching
                | RunState::GeneratingReport
        )
    }
}

/// Progress of a single plan step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    InProgress,
    Complete,
}

/// One step of the research plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchStep {
    pub task: String,
    pub status: StepStatus,
}

/// A grounding citation attached to a research result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub uri: String,
    pub title: String,
}

/// The findings for one plan step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchResult {
    pub task: String,
    pub summary: String,
    pub sources: Vec<Source>,
}

/// Everything the UI needs to render the current run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub state: RunState,
    pub subject: String,
    pub plan: Vec<ResearchStep>,
    pub results: Vec<ResearchResult>,
    pub report: Option<String>,
    pub error: Option<String>,
}

impl Snapshot {
    /// Number of steps marked complete.
    pub fn completed_steps(&self) -> usize {
        self.plan
            .iter()
            .filter(|s| s.status == StepStatus::Complete)
            .count()
    }
}

/// Publisher of run snapshots.
pub(crate) struct Session {
    tx: watch::Sender<Snapshot>,
}

impl Session {
    pub(crate) fn new() -> Self {
        let (tx, _) = watch::channel(Snapshot::default());
        Self { tx }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        self.tx.borrow().clone()
    }

    /// Move to `next`, refusing illegal transitions.
    pub(crate) fn transition(&self, next: RunState) {
        self.tx.send_modify(|snap| {
            if snap.state.can_transition_to(next) {
                snap.state = next;
            } else {
                error!(from = ?snap.state, to = ?next, "Illegal run state transition ignored");
            }
        });
    }

    /// Clear the previous run and enter the authoring stage.
    pub(crate) fn begin(&self, subject: &str) {
        self.tx.send_modify(|snap| {
            *snap = Snapshot {
                subject: subject.to_string(),
                ..Snapshot::default()
            };
        });
        self.transition(RunState::AuthoringDirective);
    }

    pub(crate) fn set_plan(&self, tasks: &[String]) {
        self.tx.send_modify(|snap| {
            snap.plan = tasks
                .iter()
                .map(|task| ResearchStep {
                    task: task.clone(),
                    status: StepStatus::Pending,
                })
                .collect();
        });
    }

    pub(crate) fn mark_step(&self, index: usize, status: StepStatus) {
        self.tx.send_modify(|snap| {
            if let Some(step) = snap.plan.get_mut(index) {
                step.status = status;
            }
        });
    }

    pub(crate) fn push_result(&self, result: ResearchResult) {
        self.tx.send_modify(|snap| snap.results.push(result));
    }

    pub(crate) fn complete(&self, report: &str) {
        self.tx.send_modify(|snap| snap.report = Some(report.to_string()));
        self.transition(RunState::Complete);
    }

    pub(crate) fn fail(&self, message: &str) {
        self.tx.send_modify(|snap| snap.error = Some(message.to_string()));
        self.transition(RunState::Error);
    }

    /// Record a run refused before it started, discarding the previous one.
    pub(crate) fn reject(&self, message: &str) {
        self.tx.send_replace(Snapshot {
            state: RunState::Error,
            error: Some(message.to_string()),
            ..Snapshot::default()
        });
    }

    pub(crate) fn reset(&self) {
        self.tx.send_replace(Snapshot::default());
    }
}
