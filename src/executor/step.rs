use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, trace, warn};

use crate::config::Timing;
use crate::surface::{Locator, RemoteSurface, SurfaceError};
use crate::utils::delay;

/// Why a step ended the way it did.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepReason {
    Ok,
    /// The target is marked as not bookable.
    NotAvailable,
    /// The action went through but the expected state never showed up.
    VerificationFailed,
    /// The element never appeared, or retries ran out.
    Timeout,
}

/// Outcome of one interaction with the surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepResult {
    pub succeeded: bool,
    pub reason: StepReason,
    /// Attribute text for read actions (`None` if the attribute is absent).
    pub value: Option<String>,
}

impl StepResult {
    pub fn ok(value: Option<String>) -> Self {
        Self {
            succeeded: true,
            reason: StepReason::Ok,
            value,
        }
    }

    pub fn failed(reason: StepReason) -> Self {
        Self {
            succeeded: false,
            reason,
            value: None,
        }
    }
}

/// What to do with the element once it is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    Click,
    Read { attribute: String },
}

impl StepAction {
    pub fn read(attribute: impl Into<String>) -> Self {
        StepAction::Read {
            attribute: attribute.into(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            StepAction::Click => "click",
            StepAction::Read { .. } => "read",
        }
    }
}

/// Runs single interactions against a [`RemoteSurface`] with bounded retry.
///
/// Each try waits (bounded) for the element, then applies the action. Stale
/// handles and intercepted clicks restart the try; anything else ends the step.
/// The executor never returns an error: exhausted retries and driver faults are
/// reported as a failed [`StepResult`] and the caller decides what to do.
#[derive(Debug, Clone)]
pub struct StepExecutor {
    wait_timeout: Duration,
    max_attempts: u32,
    settle_ms: u64,
    jitter_ms: u64,
}

impl StepExecutor {
    pub fn new(timing: &Timing) -> Self {
        Self {
            wait_timeout: timing.wait_timeout(),
            max_attempts: timing.max_attempts.max(1),
            settle_ms: timing.settle_ms,
            jitter_ms: timing.jitter_ms,
        }
    }

    pub async fn click<S>(&self, surface: &mut S, locator: &Locator) -> StepResult
    where
        S: RemoteSurface + ?Sized,
    {
        self.perform(surface, locator, &StepAction::Click).await
    }

    pub async fn read<S>(&self, surface: &mut S, locator: &Locator, attribute: &str) -> StepResult
    where
        S: RemoteSurface + ?Sized,
    {
        self.perform(surface, locator, &StepAction::read(attribute))
            .await
    }

    /// Wait (bounded) for `locator` to be present without touching it.
    pub async fn wait_for<S>(&self, surface: &mut S, locator: &Locator) -> StepResult
    where
        S: RemoteSurface + ?Sized,
    {
        match surface.wait_until_present(locator, self.wait_timeout).await {
            Ok(_) => StepResult::ok(None),
            Err(err) => {
                debug!(target: "courtbook::step", %locator, error = %err, "wait_for gave up");
                StepResult::failed(StepReason::Timeout)
            }
        }
    }

    pub async fn perform<S>(
        &self,
        surface: &mut S,
        locator: &Locator,
        action: &StepAction,
    ) -> StepResult
    where
        S: RemoteSurface + ?Sized,
    {
        for attempt in 1..=self.max_attempts {
            trace!(target: "courtbook::step", %locator, action = action.name(), attempt, "step");

            let handle = match surface.wait_until_present(locator, self.wait_timeout).await {
                Ok(handle) => handle,
                Err(err) if err.is_transient() => {
                    debug!(target: "courtbook::step", %locator, attempt, error = %err, "Transient fault while waiting; retrying");
                    continue;
                }
                Err(err) => return self.give_up(locator, action, &err),
            };

            let applied = match action {
                StepAction::Click => surface.click(&handle).await.map(|()| None),
                StepAction::Read { attribute } => {
                    surface.read_attribute(&handle, attribute).await
                }
            };

            match applied {
                Ok(value) => {
                    if matches!(action, StepAction::Click) {
                        delay::settle(self.settle_ms, self.jitter_ms).await;
                    }
                    return StepResult::ok(value);
                }
                Err(err) if err.is_transient() => {
                    debug!(target: "courtbook::step", %locator, attempt, error = %err, "Transient fault; retrying");
                }
                Err(err) => return self.give_up(locator, action, &err),
            }
        }

        warn!(
            target: "courtbook::step",
            %locator,
            action = action.name(),
            attempts = self.max_attempts,
            "Retries exhausted"
        );
        StepResult::failed(StepReason::Timeout)
    }

    fn give_up(&self, locator: &Locator, action: &StepAction, err: &SurfaceError) -> StepResult {
        if err.is_absence() {
            debug!(target: "courtbook::step", %locator, action = action.name(), error = %err, "Element not available");
        } else {
            error!(target: "courtbook::step", %locator, action = action.name(), error = %err, "Driver fault");
        }
        StepResult::failed(StepReason::Timeout)
    }
}
