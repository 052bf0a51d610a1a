//! Scripted in-memory surface for tests.
//!
//! Elements are keyed by their exact query string. Clicks can be scripted to
//! fail with given faults first, and to apply attribute changes once they go
//! through. Setting an attribute on an unknown query makes that element appear.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::time::{sleep, timeout};

use super::{ElementHandle, Locator, RemoteSurface, SurfaceError};

#[derive(Debug, Clone)]
pub(crate) enum Effect {
    SetAttribute {
        query: String,
        name: String,
        value: String,
    },
    Remove {
        query: String,
    },
}

impl Effect {
    pub(crate) fn set_class(query: &str, class: &str) -> Self {
        Effect::SetAttribute {
            query: query.into(),
            name: "class".into(),
            value: class.into(),
        }
    }

    pub(crate) fn remove(query: &str) -> Self {
        Effect::Remove {
            query: query.into(),
        }
    }
}

#[derive(Debug, Default)]
struct FakeElement {
    attributes: HashMap<String, String>,
    click_faults: VecDeque<SurfaceError>,
    on_click: VecDeque<Vec<Effect>>,
}

#[derive(Debug, Default)]
pub(crate) struct FakeSurface {
    elements: HashMap<String, FakeElement>,
    handles: HashMap<u64, String>,
    next_id: u64,
    clicks: Vec<String>,
    click_attempts: Vec<String>,
    opened: Vec<String>,
    filled: Vec<(String, String)>,
    fail_open: bool,
    locate_latency: Duration,
}

impl FakeSurface {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an element with the given `class` attribute.
    pub(crate) fn with_element(mut self, query: &str, class: &str) -> Self {
        let element = self.elements.entry(query.to_string()).or_default();
        element.attributes.insert("class".into(), class.into());
        self
    }

    /// Faults returned by the next clicks on `query`, in order.
    pub(crate) fn with_click_faults(mut self, query: &str, faults: Vec<SurfaceError>) -> Self {
        self.elements
            .entry(query.to_string())
            .or_default()
            .click_faults
            .extend(faults);
        self
    }

    /// Effects applied by the next successful click on `query`. Each call queues
    /// one batch; successive clicks consume successive batches.
    pub(crate) fn on_click(mut self, query: &str, effects: Vec<Effect>) -> Self {
        self.elements
            .entry(query.to_string())
            .or_default()
            .on_click
            .push_back(effects);
        self
    }

    /// Drop any scripted click effects for `query`; clicks then change nothing.
    pub(crate) fn without_click_effects(mut self, query: &str) -> Self {
        if let Some(element) = self.elements.get_mut(query) {
            element.on_click.clear();
        }
        self
    }

    /// Make every `locate` take `latency`, bounded by the caller's limit.
    pub(crate) fn with_locate_latency(mut self, latency: Duration) -> Self {
        self.locate_latency = latency;
        self
    }

    pub(crate) fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub(crate) fn clicks_on(&self, query: &str) -> usize {
        self.clicks.iter().filter(|q| *q == query).count()
    }

    pub(crate) fn click_attempts_on(&self, query: &str) -> usize {
        self.click_attempts.iter().filter(|q| *q == query).count()
    }

    pub(crate) fn clicks(&self) -> &[String] {
        &self.clicks
    }

    pub(crate) fn opened(&self) -> &[String] {
        &self.opened
    }

    pub(crate) fn filled(&self) -> &[(String, String)] {
        &self.filled
    }

    fn resolve(&mut self, query: &Locator) -> Result<ElementHandle, SurfaceError> {
        if !self.elements.contains_key(query.as_str()) {
            return Err(SurfaceError::NotFound(query.clone()));
        }
        self.next_id += 1;
        self.handles.insert(self.next_id, query.as_str().to_string());
        Ok(ElementHandle::new(self.next_id, query.clone()))
    }

    fn query_of(&self, handle: &ElementHandle) -> Result<String, SurfaceError> {
        self.handles
            .get(&handle.id())
            .filter(|q| self.elements.contains_key(*q))
            .cloned()
            .ok_or_else(|| SurfaceError::StaleHandle(handle.locator().clone()))
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::SetAttribute { query, name, value } => {
                self.elements
                    .entry(query)
                    .or_default()
                    .attributes
                    .insert(name, value);
            }
            Effect::Remove { query } => {
                self.elements.remove(&query);
            }
        }
    }
}

#[async_trait]
impl RemoteSurface for FakeSurface {
    async fn open(&mut self, url: &str) -> Result<(), SurfaceError> {
        self.opened.push(url.to_string());
        if self.fail_open {
            return Err(SurfaceError::Navigation {
                url: url.to_string(),
                reason: "unreachable".into(),
            });
        }
        Ok(())
    }

    async fn locate(
        &mut self,
        query: &Locator,
        limit: Duration,
    ) -> Result<ElementHandle, SurfaceError> {
        if !self.locate_latency.is_zero()
            && timeout(limit, sleep(self.locate_latency)).await.is_err()
        {
            return Err(SurfaceError::NotFound(query.clone()));
        }
        self.resolve(query)
    }

    async fn wait_until_present(
        &mut self,
        query: &Locator,
        _timeout: Duration,
    ) -> Result<ElementHandle, SurfaceError> {
        self.resolve(query)
    }

    async fn read_attribute(
        &mut self,
        handle: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, SurfaceError> {
        let query = self.query_of(handle)?;
        Ok(self
            .elements
            .get(&query)
            .and_then(|e| e.attributes.get(name).cloned()))
    }

    async fn click(&mut self, handle: &ElementHandle) -> Result<(), SurfaceError> {
        self.click_attempts
            .push(handle.locator().as_str().to_string());
        let query = self.query_of(handle)?;
        let effects = {
            let Some(element) = self.elements.get_mut(&query) else {
                return Err(SurfaceError::StaleHandle(handle.locator().clone()));
            };
            if let Some(fault) = element.click_faults.pop_front() {
                return Err(fault);
            }
            element.on_click.pop_front().unwrap_or_default()
        };
        self.clicks.push(query);
        for effect in effects {
            self.apply(effect);
        }
        Ok(())
    }

    async fn fill(&mut self, handle: &ElementHandle, text: &str) -> Result<(), SurfaceError> {
        let query = self.query_of(handle)?;
        self.filled.push((query, text.to_string()));
        Ok(())
    }
}
