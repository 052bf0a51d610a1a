use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Wizard progress, in order. A run only ever moves forward.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingState {
    Start,
    DateSelected,
    CategorySelected,
    SlotSelected,
    Stage1Confirmed,
    Stage2Confirmed,
    PaymentMethodSelected,
    Booked,
}

/// Why a run ended in `Aborted`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    NavigationFailed,
    DateUnavailable,
    CategoryUnavailable,
    NoSlotAvailable,
    AdvanceFailed,
    PaymentSelectionFailed,
    SubmitFailed,
}

impl AbortReason {
    /// Resource-level failures that another category might get past.
    pub fn allows_fallback(self) -> bool {
        matches!(
            self,
            AbortReason::CategoryUnavailable | AbortReason::NoSlotAvailable
        )
    }
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AbortReason::NavigationFailed => "booking page could not be opened",
            AbortReason::DateUnavailable => "target date not selectable",
            AbortReason::CategoryUnavailable => "resource category not selectable",
            AbortReason::NoSlotAvailable => "no time slot available",
            AbortReason::AdvanceFailed => "wizard could not be advanced",
            AbortReason::PaymentSelectionFailed => "payment method not selected",
            AbortReason::SubmitFailed => "final submission failed",
        };
        f.write_str(s)
    }
}

/// Result of one orchestrator run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingOutcome {
    pub success: bool,
    pub category_used: String,
    pub slot_used: Option<String>,
    pub failure_stage: Option<AbortReason>,
    /// Last state reached before finishing or aborting.
    pub reached: BookingState,
    /// `false` when the final submission was skipped (dry run) or never reached.
    pub submitted: bool,
}

impl BookingOutcome {
    pub fn allows_fallback(&self) -> bool {
        self.failure_stage.is_some_and(AbortReason::allows_fallback)
    }
}

/// Accumulates progress for one run. Consumed by [`finish`](Self::finish) or
/// [`abort`](Self::abort), so an outcome is produced exactly once.
#[derive(Debug)]
pub struct OutcomeTracker {
    category: String,
    slot: Option<String>,
    state: BookingState,
}

impl OutcomeTracker {
    pub fn start(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            slot: None,
            state: BookingState::Start,
        }
    }

    pub fn advance(&mut self, next: BookingState) {
        debug_assert!(next > self.state, "{:?} -> {:?}", self.state, next);
        debug!(target: "courtbook::orchestrator", from = ?self.state, to = ?next, "transition");
        self.state = next;
    }

    pub fn record_slot(&mut self, slot: impl Into<String>) {
        self.slot = Some(slot.into());
    }

    pub fn finish(self, submitted: bool) -> BookingOutcome {
        BookingOutcome {
            success: self.state == BookingState::Booked,
            category_used: self.category,
            slot_used: self.slot,
            failure_stage: None,
            reached: self.state,
            submitted,
        }
    }

    pub fn abort(self, reason: AbortReason) -> BookingOutcome {
        BookingOutcome {
            success: false,
            category_used: self.category,
            slot_used: self.slot,
            failure_stage: Some(reason),
            reached: self.state,
            submitted: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abort_keeps_progress() {
        let mut t = OutcomeTracker::start("Covered Pickleball");
        t.advance(BookingState::DateSelected);
        t.advance(BookingState::CategorySelected);
        let out = t.abort(AbortReason::NoSlotAvailable);
        assert!(!out.success);
        assert_eq!(out.reached, BookingState::CategorySelected);
        assert_eq!(out.failure_stage, Some(AbortReason::NoSlotAvailable));
        assert!(out.allows_fallback());
    }

    #[test]
    fn test_finish_at_booked_succeeds() {
        let mut t = OutcomeTracker::start("Covered Pickleball");
        t.record_slot("9-10am");
        t.advance(BookingState::Booked);
        let out = t.finish(true);
        assert!(out.success);
        assert!(out.submitted);
        assert_eq!(out.slot_used.as_deref(), Some("9-10am"));
        assert!(!out.allows_fallback());
    }

    #[test]
    fn test_fallback_only_for_resource_failures() {
        assert!(AbortReason::CategoryUnavailable.allows_fallback());
        assert!(AbortReason::NoSlotAvailable.allows_fallback());
        assert!(!AbortReason::DateUnavailable.allows_fallback());
        assert!(!AbortReason::NavigationFailed.allows_fallback());
        assert!(!AbortReason::PaymentSelectionFailed.allows_fallback());
    }

    #[test]
    fn test_states_are_ordered() {
        assert!(BookingState::Start < BookingState::DateSelected);
        assert!(BookingState::Stage2Confirmed < BookingState::PaymentMethodSelected);
        assert!(BookingState::PaymentMethodSelected < BookingState::Booked);
    }
}
