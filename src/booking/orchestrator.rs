use tracing::{debug, error, info, warn};

use super::outcome::{AbortReason, BookingOutcome, BookingState, OutcomeTracker};
use super::request::BookingRequest;
use crate::config::{Config, Selectors, Timing};
use crate::executor::{AvailabilityGate, MarkerSet, StepExecutor, has_marker};
use crate::surface::RemoteSurface;
use crate::utils::{delay, locator};

/// Wizard sections confirmed by the two advance steps (1-based).
const STAGE_SECTIONS: [(BookingState, usize); 2] = [
    (BookingState::Stage1Confirmed, 2),
    (BookingState::Stage2Confirmed, 3),
];

/// Drives one reservation attempt through the wizard for a single category.
///
/// Hard checks (navigation, date, category, slot, payment, submit) abort the run.
/// The wizard section check after each advance is soft: a mismatch is logged and
/// the run continues.
#[derive(Debug, Clone)]
pub struct BookingOrchestrator {
    booking_url: String,
    selectors: Selectors,
    timing: Timing,
    executor: StepExecutor,
    gate: AvailabilityGate,
    dry_run: bool,
}

impl BookingOrchestrator {
    pub fn new(config: &Config, dry_run: bool) -> Self {
        let executor = StepExecutor::new(&config.timing);
        let gate = AvailabilityGate::new(
            executor.clone(),
            MarkerSet::from_selectors(&config.selectors),
            &config.timing,
        );
        Self {
            booking_url: config.site.booking_url.clone(),
            selectors: config.selectors.clone(),
            timing: config.timing.clone(),
            executor,
            gate,
            dry_run,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Run the wizard for `category`. Never substitutes another category; the
    /// caller decides on fallback from the returned outcome.
    pub async fn run<S>(
        &self,
        surface: &mut S,
        request: &BookingRequest,
        category: &str,
    ) -> BookingOutcome
    where
        S: RemoteSurface + ?Sized,
    {
        let mut tracker = OutcomeTracker::start(category);
        info!(
            target: "courtbook::orchestrator",
            date = %request.target_date(),
            %category,
            "Trying to book"
        );

        if let Err(err) = surface.open(&self.booking_url).await {
            error!(target: "courtbook::orchestrator", url = %self.booking_url, error = %err, "Could not open booking page");
            return tracker.abort(AbortReason::NavigationFailed);
        }

        let day = locator(&self.selectors.day, &[("day", request.day_label())]);
        if !self.executor.click(surface, &day).await.succeeded {
            error!(target: "courtbook::orchestrator", day = request.day_label(), "Target date not found on calendar");
            return tracker.abort(AbortReason::DateUnavailable);
        }
        tracker.advance(BookingState::DateSelected);

        let category_loc = locator(&self.selectors.category, &[("category", category)]);
        if !self.executor.click(surface, &category_loc).await.succeeded {
            error!(target: "courtbook::orchestrator", %category, "Resource category not selectable");
            return tracker.abort(AbortReason::CategoryUnavailable);
        }
        tracker.advance(BookingState::CategorySelected);
        delay::settle(self.timing.category_settle_ms, self.timing.jitter_ms).await;

        match self.select_slot(surface, request).await {
            Some(slot) => tracker.record_slot(slot),
            None => {
                error!(
                    target: "courtbook::orchestrator",
                    %category,
                    candidates = ?request.slot_candidates(),
                    "Failed to select time; court may be unavailable"
                );
                return tracker.abort(AbortReason::NoSlotAvailable);
            }
        }
        tracker.advance(BookingState::SlotSelected);

        for (stage, section) in STAGE_SECTIONS {
            if !self.advance_wizard(surface, section).await {
                error!(target: "courtbook::orchestrator", ?stage, "Could not advance the wizard");
                return tracker.abort(AbortReason::AdvanceFailed);
            }
            tracker.advance(stage);
        }

        if !self.select_payment(surface).await {
            error!(target: "courtbook::orchestrator", "Payment method did not become active");
            return tracker.abort(AbortReason::PaymentSelectionFailed);
        }
        tracker.advance(BookingState::PaymentMethodSelected);

        if self.dry_run {
            info!(target: "courtbook::orchestrator", "DRY-RUN skipping final submission");
            tracker.advance(BookingState::Booked);
            return tracker.finish(false);
        }

        let submit = locator(&self.selectors.submit, &[]);
        if !self.executor.click(surface, &submit).await.succeeded {
            error!(target: "courtbook::orchestrator", "Final submission control not clickable");
            return tracker.abort(AbortReason::SubmitFailed);
        }
        delay::settle(self.timing.completion_ms, 0).await;
        tracker.advance(BookingState::Booked);
        info!(target: "courtbook::orchestrator", %category, "Booked court");
        tracker.finish(true)
    }

    /// Try every candidate in order; first confirmed selection wins.
    async fn select_slot<S>(&self, surface: &mut S, request: &BookingRequest) -> Option<String>
    where
        S: RemoteSurface + ?Sized,
    {
        for slot in request.slot_candidates() {
            let loc = locator(&self.selectors.slot, &[("slot", slot.as_str())]);
            let result = self.gate.try_slot(surface, &loc).await;
            if result.succeeded {
                info!(target: "courtbook::orchestrator", %slot, "Time slot selected");
                return Some(slot.clone());
            }
            info!(target: "courtbook::orchestrator", %slot, reason = ?result.reason, "Time slot not taken");
        }
        None
    }

    /// Click the advance control and softly check `section` became active.
    async fn advance_wizard<S>(&self, surface: &mut S, section: usize) -> bool
    where
        S: RemoteSurface + ?Sized,
    {
        let advance = locator(&self.selectors.advance, &[]);
        if !self.executor.click(surface, &advance).await.succeeded {
            return false;
        }
        delay::settle(self.timing.stage_settle_ms, self.timing.jitter_ms).await;

        if !self.section_is_current(surface, section).await {
            warn!(
                target: "courtbook::orchestrator",
                section,
                "Wizard section did not become active; continuing"
            );
        }
        true
    }

    /// `section` is marked active and the one before it no longer is.
    pub(crate) async fn section_is_current<S>(&self, surface: &mut S, section: usize) -> bool
    where
        S: RemoteSurface + ?Sized,
    {
        let current = self.section_active(surface, section).await;
        let previous = match section.checked_sub(1) {
            Some(prev) if prev >= 1 => self.section_active(surface, prev).await,
            _ => Some(false),
        };
        debug!(target: "courtbook::orchestrator", section, ?current, ?previous, "section check");
        current == Some(true) && previous == Some(false)
    }

    async fn section_active<S>(&self, surface: &mut S, section: usize) -> Option<bool>
    where
        S: RemoteSurface + ?Sized,
    {
        let index = section.to_string();
        let loc = locator(&self.selectors.section, &[("index", index.as_str())]);
        let read = self
            .executor
            .read(surface, &loc, &self.selectors.marker_attribute)
            .await;
        if !read.succeeded {
            return None;
        }
        Some(read.value.is_some_and(|marker| {
            has_marker(&marker, std::slice::from_ref(&self.selectors.active_marker))
        }))
    }

    async fn select_payment<S>(&self, surface: &mut S) -> bool
    where
        S: RemoteSurface + ?Sized,
    {
        let option = locator(&self.selectors.payment_option, &[]);
        if !self.executor.click(surface, &option).await.succeeded {
            return false;
        }
        let active = locator(&self.selectors.payment_active, &[]);
        self.executor.wait_for(surface, &active).await.succeeded
    }
}
