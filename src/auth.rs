//! Account sign-in.
//!
//! Runs once per invocation, before any booking attempt. Failures here are fatal
//! for the run and are never retried.

use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{CredentialsConfig, Selectors, SiteConfig, Timing};
use crate::surface::{Locator, RemoteSurface, SurfaceError};
use crate::utils::delay;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("environment variable {0} is not set")]
    MissingCredential(String),

    #[error("could not open login page")]
    Navigation(#[source] SurfaceError),

    #[error("login form field '{field}' unavailable")]
    Form {
        field: &'static str,
        #[source]
        source: SurfaceError,
    },
}

/// Bounds for the post-submit form check; one driver round-trip must fit.
const FORM_CHECK_MIN: Duration = Duration::from_millis(500);
const FORM_CHECK_MAX: Duration = Duration::from_secs(3);

/// What the page showed once the login form was submitted.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoginStatus {
    /// The form went away.
    Confirmed,
    /// The form is still on screen, usually because the credentials were rejected.
    FormStillVisible,
}

/// Account identifier and secret.
#[derive(Clone)]
pub struct Credentials {
    account: String,
    secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("account", &self.account)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(account: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            secret: secret.into(),
        }
    }

    /// Read both values from the process environment.
    pub fn from_env(config: &CredentialsConfig) -> Result<Self, AuthError> {
        Self::from_lookup(config, |name| std::env::var(name).ok())
    }

    /// Read both values through `lookup`; empty values count as missing.
    pub fn from_lookup<F>(config: &CredentialsConfig, lookup: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fetch = |name: &str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AuthError::MissingCredential(name.to_string()))
        };
        Ok(Self::new(
            fetch(&config.email_env)?,
            fetch(&config.password_env)?,
        ))
    }

    pub fn account(&self) -> &str {
        &self.account
    }
}

/// Sign in through the login form and wait for the session to settle.
pub async fn authenticate<S>(
    surface: &mut S,
    site: &SiteConfig,
    selectors: &Selectors,
    timing: &Timing,
    credentials: &Credentials,
) -> Result<LoginStatus, AuthError>
where
    S: RemoteSurface + ?Sized,
{
    info!(target: "courtbook::auth", account = %credentials.account, url = %site.login_url, "Logging in");
    surface
        .open(&site.login_url)
        .await
        .map_err(AuthError::Navigation)?;

    let wait = timing.wait_timeout();
    let email = Locator::new(selectors.login_email.as_str());
    let password = Locator::new(selectors.login_password.as_str());
    let submit = Locator::new(selectors.login_submit.as_str());

    fill_field(surface, "email", &email, &credentials.account, wait).await?;
    fill_field(surface, "password", &password, &credentials.secret, wait).await?;

    let button = surface
        .wait_until_present(&submit, wait)
        .await
        .map_err(|source| AuthError::Form {
            field: "submit",
            source,
        })?;
    surface
        .click(&button)
        .await
        .map_err(|source| AuthError::Form {
            field: "submit",
            source,
        })?;

    delay::settle(timing.login_settle_ms, 0).await;

    let check = wait.clamp(FORM_CHECK_MIN, FORM_CHECK_MAX);
    if surface.locate(&email, check).await.is_ok() {
        warn!(target: "courtbook::auth", "Login form still visible after submitting; bookings may fail");
        Ok(LoginStatus::FormStillVisible)
    } else {
        info!(target: "courtbook::auth", "Logged in");
        Ok(LoginStatus::Confirmed)
    }
}

async fn fill_field<S>(
    surface: &mut S,
    field: &'static str,
    locator: &Locator,
    text: &str,
    wait: Duration,
) -> Result<(), AuthError>
where
    S: RemoteSurface + ?Sized,
{
    let handle = surface
        .wait_until_present(locator, wait)
        .await
        .map_err(|source| AuthError::Form { field, source })?;
    surface
        .fill(&handle, text)
        .await
        .map_err(|source| AuthError::Form { field, source })?;
    debug!(target: "courtbook::auth", field, "filled");
    Ok(())
}
