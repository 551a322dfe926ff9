//! Research events and callbacks for observability.

use crate::state::RunState;
use std::sync::{Arc, Mutex};
use tracing::{error, info};

/// Events emitted while a research run executes.
#[derive(Debug, Clone, PartialEq)]
pub enum ResearchEvent {
    /// A pipeline stage is starting
    StageStarted { state: RunState },
    /// The plan is known
    PlanReady { steps: Vec<String> },
    /// A research step is about to be sent
    StepStarted {
        index: usize,
        total: usize,
        task: String,
    },
    /// A research step produced its result
    StepCompleted {
        index: usize,
        total: usize,
        sources: usize,
    },
    /// The final report is ready
    ReportReady { chars: usize },
    /// The run failed
    Failed { message: String },
}

/// Type alias for event callbacks
pub type EventCallback = Arc<dyn Fn(&ResearchEvent) + Send + Sync>;

/// Storage for research callbacks
#[derive(Default, Clone)]
pub struct ResearchCallbacks {
    pub on_stage: Option<EventCallback>,
    pub on_step: Option<EventCallback>,
    pub on_failed: Option<EventCallback>,
    /// Catch-all callback for any event
    pub on_event: Option<EventCallback>,
    /// Captured events, for tests and embedding
    pub(crate) captured_events: Option<Arc<Mutex<Vec<ResearchEvent>>>>,
}

impl ResearchCallbacks {
    /// Emit an event to the appropriate callback(s)
    pub fn emit(&self, event: &ResearchEvent) {
        if let Some(ref events) = self.captured_events
            && let Ok(mut events) = events.lock()
        {
            events.push(event.clone());
        }

        let specific = match event {
            ResearchEvent::StageStarted { .. } => self.on_stage.as_ref(),
            ResearchEvent::StepStarted { .. } | ResearchEvent::StepCompleted { .. } => {
                self.on_step.as_ref()
            }
            ResearchEvent::Failed { .. } => self.on_failed.as_ref(),
            ResearchEvent::PlanReady { .. } | ResearchEvent::ReportReady { .. } => None,
        };

        if let Some(cb) = specific {
            cb(event);
        }

        if let Some(cb) = &self.on_event {
            cb(event);
        }
    }
}

/// Callbacks that report progress through `tracing`.
pub fn logging_callbacks() -> ResearchCallbacks {
    ResearchCallbacks {
        on_event: Some(Arc::new(|e: &ResearchEvent| match e {
            ResearchEvent::StageStarted { state } => info!(?state, "Stage started"),
            ResearchEvent::PlanReady { steps } => info!(steps = steps.len(), "Research plan ready"),
            ResearchEvent::StepStarted { index, total, task } => {
                let preview: String = task.chars().take(80).collect();
                info!("Step {}/{}: {}", index + 1, total, preview);
            }
            ResearchEvent::StepCompleted {
                index,
                total,
                sources,
            } => info!(sources, "Step {}/{} complete", index + 1, total),
            ResearchEvent::ReportReady { chars } => info!(chars, "Report ready"),
            ResearchEvent::Failed { message } => error!("Research failed: {}", message),
        })),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_emit_reaches_specific_and_catch_all() {
        let specific = Arc::new(AtomicUsize::new(0));
        let all = Arc::new(AtomicUsize::new(0));

        let s = specific.clone();
        let a = all.clone();
        let callbacks = ResearchCallbacks {
            on_step: Some(Arc::new(move |_: &ResearchEvent| {
                s.fetch_add(1, Ordering::SeqCst);
            })),
            on_event: Some(Arc::new(move |_: &ResearchEvent| {
                a.fetch_add(1, Ordering::SeqCst);
            })),
            ..Default::default()
        };

        callbacks.emit(&ResearchEvent::StepCompleted {
            index: 0,
            total: 1,
            sources: 2,
        });
        callbacks.emit(&ResearchEvent::ReportReady { chars: 10 });

        assert_eq!(specific.load(Ordering::SeqCst), 1);
        assert_eq!(all.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_capture() {
        let callbacks = ResearchCallbacks {
            captured_events: Some(Arc::new(Mutex::new(Vec::new()))),
            ..Default::default()
        };
        callbacks.emit(&ResearchEvent::Failed {
            message: "x".into(),
        });

        let events = callbacks.captured_events.unwrap();
        assert_eq!(events.lock().unwrap().len(), 1);
    }
}
