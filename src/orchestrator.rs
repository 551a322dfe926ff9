//! The research pipeline.
//!
//! A run goes through four stages in strict sequence: author the directive,
//! plan, research every plan step in order, and synthesize the report. The
//! first failure ends the run; nothing is retried or resumed. Progress is
//! published to the session after every step so observers can follow along.

use crate::client::GenerationClient;
use crate::error::{Error, Result};
use crate::events::{ResearchCallbacks, ResearchEvent, logging_callbacks};
use crate::state::{ResearchResult, RunState, Session, Snapshot, StepStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Marks a run as in flight; released on drop.
struct RunGuard {
    flag: Arc<AtomicBool>,
}

impl RunGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::Busy)?;
        Ok(Self { flag: flag.clone() })
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Runs the research pipeline and owns the run state.
///
/// Only one run may be in flight at a time; a second `run`, `spawn` or
/// `reset` while one is executing fails with [`Error::Busy`] and leaves the
/// session untouched.
pub struct Orchestrator {
    client: GenerationClient,
    session: Session,
    callbacks: ResearchCallbacks,
    running: Arc<AtomicBool>,
}

impl Orchestrator {
    /// Create an orchestrator over a generation client.
    pub fn new(client: GenerationClient) -> Self {
        Self {
            client,
            session: Session::new(),
            callbacks: ResearchCallbacks::default(),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    // =========================================================================
    // Builder methods for callbacks
    // =========================================================================

    /// Log progress through `tracing`.
    pub fn verbose(mut self, enabled: bool) -> Self {
        if enabled {
            let captured = self.callbacks.captured_events.take();
            self.callbacks = ResearchCallbacks {
                captured_events: captured,
                ..logging_callbacks()
            };
        }
        self
    }

    /// Set a callback for stage changes.
    pub fn on_stage<F>(mut self, f: F) -> Self
    where
        F: Fn(&ResearchEvent) + Send + Sync + 'static,
    {
        self.callbacks.on_stage = Some(Arc::new(f));
        self
    }

    /// Set a callback for research step progress.
    pub fn on_step<F>(mut self, f: F) -> Self
    where
        F: Fn(&ResearchEvent) + Send + Sync + 'static,
    {
        self.callbacks.on_step = Some(Arc::new(f));
        self
    }

    /// Set a callback for run failures.
    pub fn on_failed<F>(mut self, f: F) -> Self
    where
        F: Fn(&ResearchEvent) + Send + Sync + 'static,
    {
        self.callbacks.on_failed = Some(Arc::new(f));
        self
    }

    /// Set a catch-all callback for any event.
    ///
    /// Replaces the logging callback installed by [`verbose`](Self::verbose).
    pub fn on_event<F>(mut self, f: F) -> Self
    where
        F: Fn(&ResearchEvent) + Send + Sync + 'static,
    {
        self.callbacks.on_event = Some(Arc::new(f));
        self
    }

    /// Record every emitted event for later inspection.
    pub fn capture_events(mut self, enabled: bool) -> Self {
        self.callbacks.captured_events = enabled.then(|| Arc::new(Mutex::new(Vec::new())));
        self
    }

    /// Take the events recorded so far.
    pub fn take_events(&self) -> Vec<ResearchEvent> {
        if let Some(ref events) = self.callbacks.captured_events
            && let Ok(mut events) = events.lock()
        {
            return std::mem::take(&mut *events);
        }
        Vec::new()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Current state of the session.
    pub fn snapshot(&self) -> Snapshot {
        self.session.snapshot()
    }

    /// Watch every snapshot change, including those made mid-run.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.session.subscribe()
    }

    /// Whether a run is in flight.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Return the session to idle, discarding the last run.
    pub fn reset(&self) -> Result<()> {
        let _guard = RunGuard::acquire(&self.running)?;
        self.session.reset();
        Ok(())
    }

    // =========================================================================
    // Running
    // =========================================================================

    /// Run the whole pipeline and return the report.
    pub async fn run(&self, subject: &str, notes: &str) -> Result<String> {
        let _guard = RunGuard::acquire(&self.running)?;
        self.start(subject)?;
        self.execute(subject, notes).await
    }

    /// Start a run on a background task.
    ///
    /// The busy check, subject validation and the switch to the authoring
    /// stage all happen before this returns, so the session never shows the
    /// previous run once a new one is accepted. A validation failure is
    /// reported through the returned handle.
    pub fn spawn(
        self: &Arc<Self>,
        subject: String,
        notes: String,
    ) -> Result<JoinHandle<Result<String>>> {
        let guard = RunGuard::acquire(&self.running)?;
        let started = self.start(&subject);
        let this = Arc::clone(self);
        Ok(tokio::spawn(async move {
            let _guard = guard;
            started?;
            this.execute(&subject, &notes).await
        }))
    }

    fn emit(&self, event: ResearchEvent) {
        self.callbacks.emit(&event);
    }

    fn enter(&self, state: RunState) {
        self.session.transition(state);
        self.emit(ResearchEvent::StageStarted { state });
    }

    /// Validate the subject and publish the start of a new run.
    fn start(&self, subject: &str) -> Result<()> {
        if subject.trim().is_empty() {
            warn!("Rejected research run with an empty subject");
            let err = Error::InputValidation;
            self.session.reject(&err.to_string());
            self.emit(ResearchEvent::Failed {
                message: err.to_string(),
            });
            return Err(err);
        }

        info!(subject, "Starting research run");
        self.session.begin(subject);
        self.emit(ResearchEvent::StageStarted {
            state: RunState::AuthoringDirective,
        });
        Ok(())
    }

    async fn execute(&self, subject: &str, notes: &str) -> Result<String> {
        match self.pipeline(subject, notes).await {
            Ok(report) => {
                self.session.complete(&report);
                self.emit(ResearchEvent::ReportReady {
                    chars: report.chars().count(),
                });
                Ok(report)
            }
            Err(err) => {
                if let Some(cause) = std::error::Error::source(&err) {
                    debug!(%cause, "Underlying generation failure");
                }
                let message = err.to_string();
                self.session.fail(&message);
                self.emit(ResearchEvent::Failed { message });
                Err(err)
            }
        }
    }

    async fn pipeline(&self, subject: &str, notes: &str) -> Result<String> {
        let directive = self
            .client
            .directive(subject, notes)
            .await
            .map_err(Error::Directive)?;

        self.enter(RunState::Planning);
        let plan = self.client.plan(&directive).await.map_err(Error::Planning)?;
        self.session.set_plan(&plan);
        self.emit(ResearchEvent::PlanReady {
            steps: plan.clone(),
        });

        self.enter(RunState::Researching);
        let total = plan.len();
        let mut results: Vec<ResearchResult> = Vec::with_capacity(total);
        for (index, task) in plan.iter().enumerate() {
            self.session.mark_step(index, StepStatus::InProgress);
            self.emit(ResearchEvent::StepStarted {
                index,
                total,
                task: task.clone(),
            });

            let finding = self
                .client
                .research_step(subject, task, &directive)
                .await
                .map_err(|source| Error::ResearchStep {
                    index,
                    step: task.clone(),
                    source,
                })?;

            let result = ResearchResult {
                task: task.clone(),
                summary: finding.summary,
                sources: finding.sources,
            };
            let sources = result.sources.len();
            self.session.push_result(result.clone());
            results.push(result);
            self.session.mark_step(index, StepStatus::Complete);
            self.emit(ResearchEvent::StepCompleted {
                index,
                total,
                sources,
            });
        }

        self.enter(RunState::GeneratingReport);
        self.client
            .report(subject, &results)
            .await
            .map_err(Error::Report)
    }
}
