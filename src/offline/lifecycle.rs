//! Lifecycle of an offline cache worker.

use thiserror::Error;

/// Phases a worker goes through between registration and replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerPhase {
    /// Populating its cache namespace.
    Installing,
    /// Installed, waiting to take over from the previous worker.
    Waiting,
    /// Serving requests.
    Active,
    /// Replaced by a newer worker; never serves again.
    Redundant,
}

/// Events driving [`WorkerPhase`] changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerEvent {
    /// The install step finished, whatever it managed to cache.
    InstallCompleted,
    /// Take control of the clients.
    Activate,
    /// A newer worker took over.
    Superseded,
}

/// Error returned when an event does not apply to the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// Phase the worker was in when the event arrived.
    pub from: WorkerPhase,
    /// Rejected event.
    pub event: WorkerEvent,
}

/// Current phase of one worker.
#[derive(Debug, Clone)]
pub struct WorkerLifecycle {
    phase: WorkerPhase,
}

impl Default for WorkerLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerLifecycle {
    /// A freshly registered worker starts installing.
    pub fn new() -> Self {
        Self {
            phase: WorkerPhase::Installing,
        }
    }

    pub fn phase(&self) -> WorkerPhase {
        self.phase
    }

    /// Apply an event, returning the new phase.
    pub fn apply(&mut self, event: WorkerEvent) -> Result<WorkerPhase, InvalidTransition> {
        let next = compute_transition(self.phase, event)?;
        self.phase = next;
        Ok(next)
    }
}

fn compute_transition(
    from: WorkerPhase,
    event: WorkerEvent,
) -> Result<WorkerPhase, InvalidTransition> {
    let next = match (from, event) {
        (WorkerPhase::Installing, WorkerEvent::InstallCompleted) => WorkerPhase::Waiting,
        (WorkerPhase::Waiting, WorkerEvent::Activate) => WorkerPhase::Active,
        (
            WorkerPhase::Installing | WorkerPhase::Waiting | WorkerPhase::Active,
            WorkerEvent::Superseded,
        ) => WorkerPhase::Redundant,
        (from, event) => return Err(InvalidTransition { from, event }),
    };

    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_then_superseded() {
        let mut lifecycle = WorkerLifecycle::new();
        assert_eq!(lifecycle.phase(), WorkerPhase::Installing);
        assert_eq!(
            lifecycle.apply(WorkerEvent::InstallCompleted),
            Ok(WorkerPhase::Waiting)
        );
        assert_eq!(lifecycle.apply(WorkerEvent::Activate), Ok(WorkerPhase::Active));
        assert_eq!(
            lifecycle.apply(WorkerEvent::Superseded),
            Ok(WorkerPhase::Redundant)
        );
    }

    #[test]
    fn rejects_out_of_order_events() {
        let mut lifecycle = WorkerLifecycle::new();
        let err = lifecycle.apply(WorkerEvent::Activate).unwrap_err();
        assert_eq!(err.from, WorkerPhase::Installing);
        assert_eq!(lifecycle.phase(), WorkerPhase::Installing);

        lifecycle.apply(WorkerEvent::Superseded).unwrap();
        assert!(lifecycle.apply(WorkerEvent::InstallCompleted).is_err());
        assert!(lifecycle.apply(WorkerEvent::Superseded).is_err());
    }

    #[test]
    fn error_message_names_phase_and_event() {
        let err = InvalidTransition {
            from: WorkerPhase::Redundant,
            event: WorkerEvent::Activate,
        };
        assert_eq!(
            err.to_string(),
            "invalid transition: Activate cannot be applied while in Redundant"
        );
    }
}
