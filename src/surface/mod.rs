/*!
Remote surface contract.

The booking engine never talks to a browser directly. Everything it needs from the
rendered page goes through [`RemoteSurface`]:
- `open`: load a URL
- `locate` / `wait_until_present`: resolve a structural query (XPath) to an element handle
- `read_attribute`: read a rendered attribute from a handle
- `click` / `fill`: interact with a handle

Failures come back as a tagged [`SurfaceError`] so callers can branch on the kind
(transient faults are retried by the step executor, everything else is reported).

`ChromiumSurface` is the production implementation.
*/

pub mod chromium;
#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub use chromium::ChromiumSurface;

/// A structural query (XPath expression) identifying one element on the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator(String);

impl Locator {
    pub fn new(query: impl Into<String>) -> Self {
        Self(query.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Locator {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Locator {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Opaque reference to an element resolved by a surface.
///
/// Handles are only meaningful to the surface that issued them and may go stale
/// when the page re-renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    id: u64,
    locator: Locator,
}

impl ElementHandle {
    pub fn new(id: u64, locator: Locator) -> Self {
        Self { id, locator }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// The query this handle was resolved from.
    pub fn locator(&self) -> &Locator {
        &self.locator
    }
}

/// Driver fault kinds.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("no element matches {0}")]
    NotFound(Locator),

    #[error("element handle for {0} is stale")]
    StaleHandle(Locator),

    #[error("click on {0} was intercepted by another element")]
    Intercepted(Locator),

    #[error("operation on {0} timed out")]
    Timeout(Locator),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("driver error: {0}")]
    Driver(String),
}

impl SurfaceError {
    /// Faults caused by the page re-rendering under us; worth retrying the step.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SurfaceError::StaleHandle(_) | SurfaceError::Intercepted(_)
        )
    }

    /// Faults meaning the element did not show up in time.
    pub fn is_absence(&self) -> bool {
        matches!(self, SurfaceError::NotFound(_) | SurfaceError::Timeout(_))
    }
}

/// Capabilities the booking engine requires from an interactive surface.
///
/// All methods take `&mut self`: one session, one pending action at a time.
#[async_trait]
pub trait RemoteSurface: Send {
    /// Load `url` into the session.
    async fn open(&mut self, url: &str) -> Result<(), SurfaceError>;

    /// Resolve `query` once, failing with `NotFound` if nothing matches within `timeout`.
    async fn locate(
        &mut self,
        query: &Locator,
        timeout: Duration,
    ) -> Result<ElementHandle, SurfaceError>;

    /// Poll for `query` until it is present or `timeout` elapses.
    async fn wait_until_present(
        &mut self,
        query: &Locator,
        timeout: Duration,
    ) -> Result<ElementHandle, SurfaceError>;

    /// Read a rendered attribute. `Ok(None)` when the attribute is absent.
    async fn read_attribute(
        &mut self,
        handle: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, SurfaceError>;

    async fn click(&mut self, handle: &ElementHandle) -> Result<(), SurfaceError>;

    /// Type `text` into an input element.
    async fn fill(&mut self, handle: &ElementHandle, text: &str) -> Result<(), SurfaceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let loc = Locator::new("//button");
        assert!(SurfaceError::StaleHandle(loc.clone()).is_transient());
        assert!(SurfaceError::Intercepted(loc.clone()).is_transient());
        assert!(!SurfaceError::NotFound(loc.clone()).is_transient());
        assert!(SurfaceError::NotFound(loc).is_absence());
        assert!(SurfaceError::Timeout(Locator::new("//a")).is_absence());
        assert!(!SurfaceError::Driver("boom".into()).is_transient());
    }

    #[test]
    fn test_locator_display() {
        let loc: Locator = "//div[@id=\"x\"]".into();
        assert_eq!(loc.to_string(), "//div[@id=\"x\"]");
        let handle = ElementHandle::new(7, loc.clone());
        assert_eq!(handle.id(), 7);
        assert_eq!(handle.locator(), &loc);
    }
}
