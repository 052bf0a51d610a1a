use chrono::{Datelike, Days, Local, NaiveDate};
use serde::Serialize;

/// What one booking attempt is after. Built fresh for every attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingRequest {
    target_date: NaiveDate,
    day_label: String,
    categories: Vec<String>,
    slot_candidates: Vec<String>,
}

impl BookingRequest {
    pub fn new(target_date: NaiveDate, categories: Vec<String>, slot_candidates: Vec<String>) -> Self {
        Self {
            day_label: day_label(target_date),
            target_date,
            categories,
            slot_candidates,
        }
    }

    /// Request for `today + lead_days`.
    pub fn with_lead_time(
        today: NaiveDate,
        lead_days: u32,
        categories: Vec<String>,
        slot_candidates: Vec<String>,
    ) -> Self {
        Self::new(target_date(today, lead_days), categories, slot_candidates)
    }

    pub fn target_date(&self) -> NaiveDate {
        self.target_date
    }

    /// Zero-padded day of month, as shown on the calendar.
    pub fn day_label(&self) -> &str {
        &self.day_label
    }

    /// Resource categories in preference order.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn slot_candidates(&self) -> &[String] {
        &self.slot_candidates
    }
}

/// Two-digit day of month: 5 -> "05", 23 -> "23".
pub fn day_label(date: NaiveDate) -> String {
    format!("{:02}", date.day())
}

pub fn target_date(today: NaiveDate, lead_days: u32) -> NaiveDate {
    today
        .checked_add_days(Days::new(u64::from(lead_days)))
        .unwrap_or(NaiveDate::MAX)
}

/// Today's date in the local timezone.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_label_padding() {
        assert_eq!(day_label(date(2026, 10, 23)), "23");
        assert_eq!(day_label(date(2026, 10, 5)), "05");
    }

    #[test]
    fn test_day_label_always_two_digits() {
        let mut d = date(2024, 1, 1);
        for _ in 0..366 {
            assert_eq!(day_label(d).len(), 2, "{d}");
            d = d.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_lead_time_crosses_month() {
        let req = BookingRequest::with_lead_time(
            date(2026, 10, 28),
            7,
            vec!["Covered Pickleball".into()],
            vec!["8-9am".into()],
        );
        assert_eq!(req.target_date(), date(2026, 11, 4));
        assert_eq!(req.day_label(), "04");
        assert_eq!(req.categories(), ["Covered Pickleball"]);
        assert_eq!(req.slot_candidates(), ["8-9am"]);
    }
}
