use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_valid::Validate;
use std::time::Duration;

/// Root configuration for courtbook.
///
/// Deserialized from a JSON file. Every section has defaults matching the
/// Pickle Social Club deployment, so an empty object `{}` is a valid config.
/// - `site`: where to log in and where the booking wizard lives
/// - `selectors`: XPath templates for every control the wizard exposes
/// - `booking`: what to book and how many attempts per run
/// - `timing`: wait bounds, settle delays and retry bound
/// - `credentials`: environment variables holding the account secrets
/// - `driver`: browser launch options
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate, Default)]
#[serde(default)]
pub struct Config {
    #[validate]
    pub site: SiteConfig,

    #[validate]
    pub selectors: Selectors,

    #[validate]
    pub booking: BookingConfig,

    #[validate]
    pub timing: Timing,

    #[validate]
    pub credentials: CredentialsConfig,

    #[validate]
    pub driver: DriverConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(default)]
pub struct SiteConfig {
    /// Sign-in page.
    #[validate(min_length = 1)]
    pub login_url: String,

    /// Page hosting the reservation wizard.
    #[validate(min_length = 1)]
    pub booking_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            login_url: "https://picklesocialclub.playbypoint.com/users/sign_in".into(),
            booking_url: "https://picklesocialclub.playbypoint.com/book/picklesocialclub".into(),
        }
    }
}

/// XPath templates. Placeholders:
/// - `{{day}}`: zero-padded day of month
/// - `{{category}}`: resource category label
/// - `{{slot}}`: time slot label
/// - `{{index}}`: 1-based wizard section index
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(default)]
pub struct Selectors {
    #[validate(min_length = 1)]
    pub login_email: String,
    #[validate(min_length = 1)]
    pub login_password: String,
    #[validate(min_length = 1)]
    pub login_submit: String,

    /// Calendar entry for the target day.
    #[validate(min_length = 1)]
    pub day: String,
    /// Resource category control.
    #[validate(min_length = 1)]
    pub category: String,
    /// Time slot button.
    #[validate(min_length = 1)]
    pub slot: String,
    /// "Next" control of the currently active wizard section.
    #[validate(min_length = 1)]
    pub advance: String,
    /// Wizard section container by index.
    #[validate(min_length = 1)]
    pub section: String,
    /// Payment method option to pick.
    #[validate(min_length = 1)]
    pub payment_option: String,
    /// Matches the payment option only once it is marked active.
    #[validate(min_length = 1)]
    pub payment_active: String,
    /// Final submission control.
    #[validate(min_length = 1)]
    pub submit: String,

    /// Attribute holding the state markers (usually `class`).
    #[validate(min_length = 1)]
    pub marker_attribute: String,
    /// Tokens meaning a slot cannot be booked.
    pub unavailable_markers: Vec<String>,
    /// Tokens meaning a slot is already selected.
    pub selected_markers: Vec<String>,
    /// Token marking the active wizard section.
    #[validate(min_length = 1)]
    pub active_marker: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            login_email: r#"//input[@id="user_email"]"#.into(),
            login_password: r#"//input[@id="user_password"]"#.into(),
            login_submit: r#"//input[@type="submit"]"#.into(),
            day: r#"//button[div[@class="day_number" and text()="{{day}}"]]"#.into(),
            category: r#"//button[text()="{{category}}"]"#.into(),
            slot: r#"//button[contains(@class, "ButtonOption") and normalize-space(text())="{{slot}}"]"#
                .into(),
            advance: r#"//div[@class="content active"]//button[span[text()=" Next "]]"#.into(),
            section: r#"(//div[contains(concat(" ", normalize-space(@class), " "), " content ")])[{{index}}]"#
                .into(),
            payment_option: r#"//button[contains(@class, "PaymentMethod") and normalize-space(.)="Credit card"]"#
                .into(),
            payment_active: r#"//button[contains(@class, "PaymentMethod") and contains(@class, "active") and normalize-space(.)="Credit card"]"#
                .into(),
            submit: r#"//button[text()="Book"]"#.into(),
            marker_attribute: "class".into(),
            unavailable_markers: vec!["disabled".into(), "unavailable".into()],
            selected_markers: vec!["active".into(), "selected".into(), "primary".into()],
            active_marker: "active".into(),
        }
    }
}

/// What to book.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(default)]
pub struct BookingConfig {
    /// Days between today and the target date.
    #[validate(maximum = 365)]
    pub lead_days: u32,

    /// Resource categories in preference order. Only the first two are ever tried.
    #[validate(min_items = 1)]
    pub categories: Vec<String>,

    /// Acceptable time slots in preference order; any one suffices.
    #[validate(min_items = 1)]
    pub slot_candidates: Vec<String>,

    /// Booking attempts per run.
    #[validate(minimum = 1)]
    #[validate(maximum = 20)]
    pub attempts: u32,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            lead_days: 7,
            categories: vec!["Covered Pickleball".into(), "Outdoor Pickleball".into()],
            slot_candidates: vec!["8-9am".into(), "9-10am".into()],
            attempts: 2,
        }
    }
}

/// Wait bounds and delays, all in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(default)]
pub struct Timing {
    /// Bound for every wait on an element.
    #[validate(minimum = 1)]
    pub wait_timeout_ms: u64,
    /// Pause after every successful click.
    pub settle_ms: u64,
    /// Extra pause after selecting a category, before slots are inspected.
    pub category_settle_ms: u64,
    /// Pause after a slot click, before its state is re-read.
    pub slot_settle_ms: u64,
    /// Pause after advancing the wizard, before the section check.
    pub stage_settle_ms: u64,
    /// Pause after the final submission.
    pub completion_ms: u64,
    /// Pause after the login form is submitted.
    pub login_settle_ms: u64,
    /// Random extra delay in [0, jitter_ms] added to every settle.
    pub jitter_ms: u64,
    /// Total tries per step when the page re-renders under us.
    #[validate(minimum = 1)]
    #[validate(maximum = 10)]
    pub max_attempts: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            wait_timeout_ms: 10_000,
            settle_ms: 500,
            category_settle_ms: 5_000,
            slot_settle_ms: 2_000,
            stage_settle_ms: 5_000,
            completion_ms: 10_000,
            login_settle_ms: 10_000,
            jitter_ms: 0,
            max_attempts: 2,
        }
    }
}

impl Timing {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    /// All delays zeroed; waits stay bounded. Used by tests.
    pub fn immediate() -> Self {
        Self {
            wait_timeout_ms: 1,
            settle_ms: 0,
            category_settle_ms: 0,
            slot_settle_ms: 0,
            stage_settle_ms: 0,
            completion_ms: 0,
            login_settle_ms: 0,
            jitter_ms: 0,
            max_attempts: 2,
        }
    }
}

/// Names of the environment variables carrying the account secrets.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(default)]
pub struct CredentialsConfig {
    #[validate(min_length = 1)]
    pub email_env: String,
    #[validate(min_length = 1)]
    pub password_env: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            email_env: "PSC_EMAIL".into(),
            password_env: "PSC_PASSWORD".into(),
        }
    }
}

/// Browser launch options.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(default)]
pub struct DriverConfig {
    /// Run without a visible window.
    pub headless: bool,
    /// Environment variable that may point at a Chromium executable.
    #[validate(min_length = 1)]
    pub executable_env: String,
    /// Extra command-line switches for the browser.
    pub args: Vec<String>,
    /// Interval between element lookups while waiting.
    #[validate(minimum = 10)]
    pub poll_interval_ms: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            headless: true,
            executable_env: "CHROME_EXECUTABLE_PATH".into(),
            args: vec!["--disable-dev-shm-usage".into()],
            poll_interval_ms: 250,
        }
    }
}
