use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::{Element, Page};
use futures::StreamExt;
use std::collections::HashMap;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, info, trace, warn};

use super::{ElementHandle, Locator, RemoteSurface, SurfaceError};
use crate::config::DriverConfig;

/// [`RemoteSurface`] backed by a Chromium instance driven over CDP.
///
/// Element handles index into a table of resolved `Element`s. The table is
/// cleared on every navigation, so handles from a previous page come back as
/// stale.
pub struct ChromiumSurface {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    elements: HashMap<u64, Element>,
    next_id: u64,
    poll_interval: Duration,
}

impl ChromiumSurface {
    /// Launch the browser and open a blank page.
    ///
    /// The executable is taken from the environment variable named by
    /// `config.executable_env` when set; otherwise chromiumoxide searches the
    /// usual install locations.
    pub async fn launch(config: &DriverConfig) -> Result<Self> {
        let mut builder = BrowserConfig::builder().no_sandbox();
        if !config.headless {
            builder = builder.with_head();
        }
        if let Ok(path) = std::env::var(&config.executable_env) {
            debug!(target: "courtbook::surface", executable = %path, "Using configured Chromium executable");
            builder = builder.chrome_executable(path);
        }
        for arg in &config.args {
            builder = builder.arg(arg.as_str());
        }
        let browser_config = builder
            .build()
            .map_err(|e| anyhow!("Invalid browser configuration: {e}"))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .context("Failed to launch Chromium")?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    warn!(target: "courtbook::surface", error = %err, "CDP handler stopped");
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .context("Failed to open a browser page")?;
        info!(target: "courtbook::surface", headless = config.headless, "Chromium session ready");

        Ok(Self {
            browser,
            page,
            handler,
            elements: HashMap::new(),
            next_id: 0,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        })
    }

    /// Close the browser and stop the CDP event loop.
    pub async fn shutdown(mut self) -> Result<()> {
        self.browser
            .close()
            .await
            .context("Failed to close Chromium")?;
        let _ = self.browser.wait().await;
        self.handler.abort();
        debug!(target: "courtbook::surface", "Chromium session closed");
        Ok(())
    }

    fn register(&mut self, element: Element, locator: &Locator) -> ElementHandle {
        self.next_id += 1;
        self.elements.insert(self.next_id, element);
        ElementHandle::new(self.next_id, locator.clone())
    }

    fn element(&self, handle: &ElementHandle) -> Result<&Element, SurfaceError> {
        self.elements
            .get(&handle.id())
            .ok_or_else(|| SurfaceError::StaleHandle(handle.locator().clone()))
    }
}

#[async_trait]
impl RemoteSurface for ChromiumSurface {
    async fn open(&mut self, url: &str) -> Result<(), SurfaceError> {
        trace!(target: "courtbook::surface", %url, "open");
        self.elements.clear();
        self.page
            .goto(url)
            .await
            .map_err(|err| SurfaceError::Navigation {
                url: url.to_string(),
                reason: err.to_string(),
            })?;
        Ok(())
    }

    async fn locate(
        &mut self,
        query: &Locator,
        limit: Duration,
    ) -> Result<ElementHandle, SurfaceError> {
        let found = timeout(limit, self.page.find_xpath(query.as_str())).await;
        match found {
            Ok(Ok(element)) => Ok(self.register(element, query)),
            Ok(Err(err)) => Err(map_cdp_error(err, query)),
            Err(_) => Err(SurfaceError::NotFound(query.clone())),
        }
    }

    async fn wait_until_present(
        &mut self,
        query: &Locator,
        limit: Duration,
    ) -> Result<ElementHandle, SurfaceError> {
        let deadline = Instant::now() + limit;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let found = timeout(remaining, self.page.find_xpath(query.as_str())).await;
            match found {
                Ok(Ok(element)) => return Ok(self.register(element, query)),
                Ok(Err(err)) => {
                    let mapped = map_cdp_error(err, query);
                    if !mapped.is_absence() && !mapped.is_transient() {
                        return Err(mapped);
                    }
                }
                Err(_) => {}
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(SurfaceError::NotFound(query.clone()));
            }
            sleep(self.poll_interval.min(remaining)).await;
        }
    }

    async fn read_attribute(
        &mut self,
        handle: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, SurfaceError> {
        let element = self.element(handle)?;
        element
            .attribute(name)
            .await
            .map_err(|err| map_cdp_error(err, handle.locator()))
    }

    async fn click(&mut self, handle: &ElementHandle) -> Result<(), SurfaceError> {
        let element = self.element(handle)?;
        element
            .click()
            .await
            .map(|_| ())
            .map_err(|err| map_cdp_error(err, handle.locator()))
    }

    async fn fill(&mut self, handle: &ElementHandle, text: &str) -> Result<(), SurfaceError> {
        let element = self.element(handle)?;
        element
            .click()
            .await
            .map_err(|err| map_cdp_error(err, handle.locator()))?
            .type_str(text)
            .await
            .map(|_| ())
            .map_err(|err| map_cdp_error(err, handle.locator()))
    }
}

/// Fold CDP errors into the surface fault kinds.
///
/// Chrome reports detached nodes and blocked clicks only through message text,
/// so those two are recognised by substring.
fn map_cdp_error(err: CdpError, locator: &Locator) -> SurfaceError {
    match err {
        CdpError::NotFound => SurfaceError::NotFound(locator.clone()),
        CdpError::Timeout => SurfaceError::Timeout(locator.clone()),
        other => classify_message(&other.to_string(), locator),
    }
}

fn classify_message(message: &str, locator: &Locator) -> SurfaceError {
    let lower = message.to_lowercase();
    if STALE_HINTS.iter().any(|hint| lower.contains(hint)) {
        SurfaceError::StaleHandle(locator.clone())
    } else if INTERCEPT_HINTS.iter().any(|hint| lower.contains(hint)) {
        SurfaceError::Intercepted(locator.clone())
    } else {
        SurfaceError::Driver(message.to_string())
    }
}

const STALE_HINTS: &[&str] = &[
    "no node with given id",
    "could not find node",
    "node is detached",
    "not attached to the page",
    "cannot find context with specified id",
];

const INTERCEPT_HINTS: &[&str] = &[
    "intercept",
    "not clickable at point",
    "scrolling failed",
    "no quads",
];
