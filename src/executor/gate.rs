use serde::Serialize;
use tracing::{debug, info, warn};

use super::step::{StepExecutor, StepReason, StepResult};
use crate::config::{Selectors, Timing};
use crate::surface::{Locator, RemoteSurface};
use crate::utils::delay;

/// Rendered state of a bookable control, derived from its marker attribute.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotState {
    Unavailable,
    AlreadySelected,
    Selectable,
}

/// Whether the whitespace-separated `marker` carries any of `tokens`, ignoring
/// ASCII case.
pub fn has_marker(marker: &str, tokens: &[String]) -> bool {
    marker
        .split_whitespace()
        .any(|t| tokens.iter().any(|k| k.eq_ignore_ascii_case(t)))
}

/// Marker attribute name and the tokens that classify it.
#[derive(Debug, Clone)]
pub struct MarkerSet {
    attribute: String,
    unavailable: Vec<String>,
    selected: Vec<String>,
}

impl MarkerSet {
    pub fn new(
        attribute: impl Into<String>,
        unavailable: Vec<String>,
        selected: Vec<String>,
    ) -> Self {
        Self {
            attribute: attribute.into(),
            unavailable,
            selected,
        }
    }

    pub fn from_selectors(selectors: &Selectors) -> Self {
        Self::new(
            selectors.marker_attribute.clone(),
            selectors.unavailable_markers.clone(),
            selectors.selected_markers.clone(),
        )
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Unavailable wins over selected; no known token means selectable.
    pub fn classify(&self, marker: Option<&str>) -> SlotState {
        let Some(marker) = marker else {
            return SlotState::Selectable;
        };
        if has_marker(marker, &self.unavailable) {
            SlotState::Unavailable
        } else if has_marker(marker, &self.selected) {
            SlotState::AlreadySelected
        } else {
            SlotState::Selectable
        }
    }
}

/// Checks a control's state before acting on it and verifies the click took.
#[derive(Debug, Clone)]
pub struct AvailabilityGate {
    executor: StepExecutor,
    markers: MarkerSet,
    verify_settle_ms: u64,
    jitter_ms: u64,
}

impl AvailabilityGate {
    pub fn new(executor: StepExecutor, markers: MarkerSet, timing: &Timing) -> Self {
        Self {
            executor,
            markers,
            verify_settle_ms: timing.slot_settle_ms,
            jitter_ms: timing.jitter_ms,
        }
    }

    /// Classify the element behind `locator`.
    ///
    /// An element that cannot be read classifies as `Selectable`.
    pub async fn classify<S>(&self, surface: &mut S, locator: &Locator) -> SlotState
    where
        S: RemoteSurface + ?Sized,
    {
        self.read_state(surface, locator)
            .await
            .unwrap_or(SlotState::Selectable)
    }

    /// `true` once the control is confirmed selected.
    pub async fn attempt_slot<S>(&self, surface: &mut S, locator: &Locator) -> bool
    where
        S: RemoteSurface + ?Sized,
    {
        self.try_slot(surface, locator).await.succeeded
    }

    /// Like [`attempt_slot`](Self::attempt_slot) but keeps the failure reason.
    pub async fn try_slot<S>(&self, surface: &mut S, locator: &Locator) -> StepResult
    where
        S: RemoteSurface + ?Sized,
    {
        let state = match self.read_state(surface, locator).await {
            Ok(state) => state,
            Err(reason) => {
                debug!(target: "courtbook::gate", %locator, ?reason, "Slot not readable");
                return StepResult::failed(reason);
            }
        };

        match state {
            SlotState::Unavailable => {
                info!(target: "courtbook::gate", %locator, "Slot marked unavailable; not clicking");
                StepResult::failed(StepReason::NotAvailable)
            }
            SlotState::AlreadySelected => {
                debug!(target: "courtbook::gate", %locator, "Slot already selected");
                StepResult::ok(None)
            }
            SlotState::Selectable => {
                let click = self.executor.click(surface, locator).await;
                if !click.succeeded {
                    return click;
                }
                delay::settle(self.verify_settle_ms, self.jitter_ms).await;

                match self.read_state(surface, locator).await {
                    Ok(SlotState::AlreadySelected) => StepResult::ok(None),
                    other => {
                        warn!(
                            target: "courtbook::gate",
                            %locator,
                            observed = ?other,
                            "Slot click did not register as selected"
                        );
                        StepResult::failed(StepReason::VerificationFailed)
                    }
                }
            }
        }
    }

    async fn read_state<S>(&self, surface: &mut S, locator: &Locator) -> Result<SlotState, StepReason>
    where
        S: RemoteSurface + ?Sized,
    {
        let read = self
            .executor
            .read(surface, locator, self.markers.attribute())
            .await;
        if read.succeeded {
            Ok(self.markers.classify(read.value.as_deref()))
        } else {
            Err(read.reason)
        }
    }
}
