use chrono::NaiveDate;
use serde::Serialize;
use tracing::{error, info, warn};

use super::orchestrator::BookingOrchestrator;
use super::outcome::BookingOutcome;
use super::request::{self, BookingRequest};
use crate::config::Config;
use crate::surface::RemoteSurface;

/// Outcomes of one invocation, one per attempt.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    outcomes: Vec<BookingOutcome>,
    orchestrator_runs: u32,
}

impl RunReport {
    pub fn outcomes(&self) -> &[BookingOutcome] {
        &self.outcomes
    }

    pub fn into_outcomes(self) -> Vec<BookingOutcome> {
        self.outcomes
    }

    /// Total orchestrator runs, fallbacks included.
    pub fn orchestrator_runs(&self) -> u32 {
        self.orchestrator_runs
    }

    pub fn successes(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }
}

/// Repeats the booking wizard a bounded number of times.
///
/// Each attempt runs the first category and, when that fails for lack of a
/// category or slot, reruns once with the second. Attempts never affect each
/// other.
pub struct RunController {
    orchestrator: BookingOrchestrator,
    lead_days: u32,
    slot_candidates: Vec<String>,
    today: fn() -> NaiveDate,
}

impl RunController {
    pub fn new(config: &Config, dry_run: bool) -> Self {
        Self {
            orchestrator: BookingOrchestrator::new(config, dry_run),
            lead_days: config.booking.lead_days,
            slot_candidates: config.booking.slot_candidates.clone(),
            today: request::local_today,
        }
    }

    /// Replace the clock used to derive the target date.
    pub fn with_today(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub async fn run<S>(&self, surface: &mut S, categories: &[String], attempts: u32) -> RunReport
    where
        S: RemoteSurface + ?Sized,
    {
        let mut report = RunReport::default();
        let (primary, fallback) = match categories {
            [] => {
                error!(target: "courtbook::controller", "No resource category configured; nothing to book");
                return report;
            }
            [primary] => (primary.as_str(), None),
            [primary, fallback, ..] => (primary.as_str(), Some(fallback.as_str())),
        };

        for attempt in 1..=attempts {
            let request = BookingRequest::with_lead_time(
                (self.today)(),
                self.lead_days,
                categories.to_vec(),
                self.slot_candidates.clone(),
            );
            info!(
                target: "courtbook::controller",
                attempt,
                of = attempts,
                date = %request.target_date(),
                "Starting booking attempt"
            );

            let (outcome, runs) = self
                .run_attempt(surface, &request, primary, fallback)
                .await;
            report.orchestrator_runs += runs;

            if outcome.success {
                info!(
                    target: "courtbook::controller",
                    attempt,
                    category = %outcome.category_used,
                    slot = outcome.slot_used.as_deref().unwrap_or("-"),
                    submitted = outcome.submitted,
                    "Attempt succeeded"
                );
            } else {
                warn!(
                    target: "courtbook::controller",
                    attempt,
                    category = %outcome.category_used,
                    failure = ?outcome.failure_stage,
                    reached = ?outcome.reached,
                    "Attempt failed"
                );
            }
            report.outcomes.push(outcome);
        }

        info!(
            target: "courtbook::controller",
            attempts,
            succeeded = report.successes(),
            runs = report.orchestrator_runs,
            "Run finished"
        );
        report
    }

    /// At most two orchestrator runs: the preferred category, then the fallback.
    async fn run_attempt<S>(
        &self,
        surface: &mut S,
        request: &BookingRequest,
        primary: &str,
        fallback: Option<&str>,
    ) -> (BookingOutcome, u32)
    where
        S: RemoteSurface + ?Sized,
    {
        let outcome = self.orchestrator.run(surface, request, primary).await;
        match fallback {
            Some(fallback) if outcome.allows_fallback() => {
                info!(
                    target: "courtbook::controller",
                    from = %primary,
                    to = %fallback,
                    reason = ?outcome.failure_stage,
                    "Falling back to next category"
                );
                (self.orchestrator.run(surface, request, fallback).await, 2)
            }
            _ => (outcome, 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::orchestrator::tests::{config, happy_page, q};
    use crate::booking::outcome::AbortReason;
    use crate::surface::fake::Effect;

    fn fixed_today() -> NaiveDate {
        // 2026-09-28 + 7 days = 2026-10-05, matching the scripted page
        NaiveDate::from_ymd_opt(2026, 9, 28).unwrap()
    }

    fn categories() -> Vec<String> {
        vec!["Covered Pickleball".into(), "Outdoor Pickleball".into()]
    }

    fn controller() -> RunController {
        RunController::new(&config(), false).with_today(fixed_today)
    }

    #[tokio::test]
    async fn test_one_outcome_per_attempt() {
        let cfg = config();
        let mut surface = happy_page(&cfg, "Covered Pickleball", "ButtonOption basic");
        let report = controller().run(&mut surface, &categories(), 3).await;
        assert_eq!(report.outcomes().len(), 3);
        assert!(report.orchestrator_runs() <= 6);
        // first attempt books; the slot stays selected so later attempts find it selected
        assert!(report.outcomes()[0].success);
        assert_eq!(surface.opened().len(), report.orchestrator_runs() as usize);
    }

    #[tokio::test]
    async fn test_primary_category_failure_falls_back() {
        let cfg = config();
        let mut surface = happy_page(&cfg, "Outdoor Pickleball", "ButtonOption basic");
        let report = controller().run(&mut surface, &categories(), 1).await;

        assert_eq!(report.orchestrator_runs(), 2);
        let outcome = &report.outcomes()[0];
        assert!(outcome.success, "{outcome:?}");
        assert_eq!(outcome.category_used, "Outdoor Pickleball");
        assert_eq!(
            surface.clicks_on(&q(&cfg.selectors.category, &[("category", "Outdoor Pickleball")])),
            1
        );
    }

    #[tokio::test]
    async fn test_no_slot_in_primary_falls_back() {
        let cfg = config();
        let s = &cfg.selectors;
        let slot1 = q(&s.slot, &[("slot", "8-9am")]);
        let slot2 = q(&s.slot, &[("slot", "9-10am")]);
        let outdoor = q(&s.category, &[("category", "Outdoor Pickleball")]);
        // every slot is taken until the outdoor category is shown
        let mut surface = happy_page(&cfg, "Covered Pickleball", "ButtonOption disabled")
            .with_element(&slot2, "ButtonOption disabled")
            .with_element(&outdoor, "ui button")
            .on_click(&outdoor, vec![Effect::set_class(&slot1, "ButtonOption basic")]);
        let report = controller().run(&mut surface, &categories(), 1).await;

        assert_eq!(report.orchestrator_runs(), 2);
        let outcome = &report.outcomes()[0];
        assert!(outcome.success, "{outcome:?}");
        assert_eq!(outcome.category_used, "Outdoor Pickleball");
        assert_eq!(outcome.slot_used.as_deref(), Some("8-9am"));
        assert_eq!(surface.click_attempts_on(&slot1), 1);
        assert_eq!(surface.click_attempts_on(&slot2), 0);
    }

    #[tokio::test]
    async fn test_no_fallback_for_date_failure() {
        let cfg = config();
        let mut surface = happy_page(&cfg, "Covered Pickleball", "ButtonOption basic");
        let controller = RunController::new(&cfg, false)
            .with_today(|| NaiveDate::from_ymd_opt(2026, 9, 1).unwrap());
        let report = controller.run(&mut surface, &categories(), 2).await;

        assert_eq!(report.orchestrator_runs(), 2);
        for outcome in report.outcomes() {
            assert_eq!(outcome.failure_stage, Some(AbortReason::DateUnavailable));
            assert_eq!(outcome.category_used, "Covered Pickleball");
        }
    }

    #[tokio::test]
    async fn test_never_more_than_two_runs_per_attempt() {
        let cfg = config();
        // neither category exists: every attempt fails at CategorySelected
        let mut surface = happy_page(&cfg, "Indoor Tennis", "ButtonOption basic");
        let many = vec![
            "Covered Pickleball".to_string(),
            "Outdoor Pickleball".to_string(),
            "Padel".to_string(),
        ];
        let report = controller().run(&mut surface, &many, 4).await;

        assert_eq!(report.outcomes().len(), 4);
        assert_eq!(report.orchestrator_runs(), 8);
        assert_eq!(report.successes(), 0);
        for outcome in report.outcomes() {
            assert_eq!(outcome.category_used, "Outdoor Pickleball");
            assert_eq!(outcome.failure_stage, Some(AbortReason::CategoryUnavailable));
        }
        let padel = q(&cfg.selectors.category, &[("category", "Padel")]);
        assert_eq!(surface.click_attempts_on(&padel), 0);
    }

    #[tokio::test]
    async fn test_single_category_has_no_fallback() {
        let cfg = config();
        let mut surface = happy_page(&cfg, "Outdoor Pickleball", "ButtonOption basic");
        let report = controller()
            .run(&mut surface, &["Covered Pickleball".to_string()], 1)
            .await;
        assert_eq!(report.orchestrator_runs(), 1);
        assert!(!report.outcomes()[0].success);
    }

    #[tokio::test]
    async fn test_empty_categories_runs_nothing() {
        let cfg = config();
        let mut surface = happy_page(&cfg, "Covered Pickleball", "ButtonOption basic");
        let report = controller().run(&mut surface, &[], 2).await;
        assert!(report.outcomes().is_empty());
        assert!(surface.opened().is_empty());
    }

    #[tokio::test]
    async fn test_zero_attempts() {
        let cfg = config();
        let mut surface = happy_page(&cfg, "Covered Pickleball", "ButtonOption basic");
        let report = controller().run(&mut surface, &categories(), 0).await;
        assert_eq!(report.orchestrator_runs(), 0);
        assert!(report.into_outcomes().is_empty());
    }
}
