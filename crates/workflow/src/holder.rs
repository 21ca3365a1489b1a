use ecourts_core::{Error, Field, Result, SessionState, SessionUpdate};
use tracing::debug;

use crate::driver::StepResult;

/// Holds the current session for interactive callers and enforces that
/// only one step is in flight at a time.
#[derive(Debug, Default)]
pub struct SessionHolder {
    current: SessionState,
    in_flight: Option<&'static str>,
}

impl SessionHolder {
    pub fn new(initial: SessionState) -> Self {
        Self {
            current: initial,
            in_flight: None,
        }
    }

    pub fn get(&self) -> &SessionState {
        &self.current
    }

    pub fn update(&mut self, update: SessionUpdate) {
        self.current = std::mem::take(&mut self.current).update(update);
    }

    pub fn reset_downstream_of(&mut self, field: Field) {
        self.current = std::mem::take(&mut self.current).reset_downstream_of(field);
    }

    pub fn replace(&mut self, next: SessionState) {
        self.current = next;
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Marks `step` as running. Fails if another step has not finished.
    pub fn begin(&mut self, step: &'static str) -> Result<()> {
        if let Some(running) = self.in_flight {
            return Err(Error::Busy(format!(
                "'{}' is still running; wait for it before starting '{}'",
                running, step
            )));
        }
        debug!(step, "Step started");
        self.in_flight = Some(step);
        Ok(())
    }

    pub fn finish(&mut self) {
        if let Some(step) = self.in_flight.take() {
            debug!(step, "Step finished");
        }
    }

    /// Stores the step's session, ends the in-flight step and returns its outcome.
    pub fn apply<T>(&mut self, step: StepResult<T>) -> Result<T> {
        let (session, outcome) = step.into_parts();
        self.current = session;
        self.finish();
        outcome
    }
}
