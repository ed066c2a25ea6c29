//! Scripted in-memory driver shared by the unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use harvest_core::{Event, LocatorSpec, Resolved};

use crate::driver::Driver;
use crate::error::DriverError;

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Value(Resolved),
    Timeout,
    Interaction,
    Fatal,
}

pub(crate) fn one(value: &str) -> Reply {
    Reply::Value(Resolved::One(value.to_string()))
}

pub(crate) fn many(values: &[&str]) -> Reply {
    Reply::Value(Resolved::Many(
        values.iter().map(|v| (*v).to_string()).collect(),
    ))
}

/// Pages keyed by URL, each a map of selector to reply. Selectors with no
/// reply on the current page miss.
#[derive(Default)]
pub(crate) struct ScriptedDriver {
    pages: HashMap<String, HashMap<String, Reply>>,
    clicks: HashMap<(String, String), String>,
    unreachable: HashSet<String>,
    current: Mutex<String>,
    navigations: Mutex<Vec<String>>,
    resolutions: Mutex<Vec<String>>,
    waits: Mutex<Vec<Duration>>,
}

impl ScriptedDriver {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn page(mut self, url: &str, replies: &[(&str, Reply)]) -> Self {
        let page = self.pages.entry(url.to_string()).or_default();
        for (selector, reply) in replies {
            page.insert((*selector).to_string(), reply.clone());
        }
        self
    }

    pub(crate) fn unreachable(mut self, url: &str) -> Self {
        self.unreachable.insert(url.to_string());
        self
    }

    /// Clicking `selector` on `url` moves the browser to `target`.
    pub(crate) fn click_to(mut self, url: &str, selector: &str, target: &str) -> Self {
        self.clicks
            .insert((url.to_string(), selector.to_string()), target.to_string());
        self
    }

    pub(crate) fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }

    pub(crate) fn resolutions(&self) -> Vec<String> {
        self.resolutions.lock().unwrap().clone()
    }

    pub(crate) fn waits(&self) -> Vec<Duration> {
        self.waits.lock().unwrap().clone()
    }
}

#[async_trait]
impl Driver for ScriptedDriver {
    async fn navigate(&self, url: &str) -> Result<bool, DriverError> {
        self.navigations.lock().unwrap().push(url.to_string());
        if self.unreachable.contains(url) {
            return Ok(false);
        }
        *self.current.lock().unwrap() = url.to_string();
        Ok(true)
    }

    async fn resolve(&self, locator: &LocatorSpec) -> Result<Option<Resolved>, DriverError> {
        self.resolutions
            .lock()
            .unwrap()
            .push(locator.selector.clone());
        let current = self.current.lock().unwrap().clone();
        let reply = self
            .pages
            .get(&current)
            .and_then(|page| page.get(&locator.selector))
            .cloned();

        if locator.event == Some(Event::Click) {
            if let Some(target) = self.clicks.get(&(current, locator.selector.clone())) {
                *self.current.lock().unwrap() = target.clone();
                if reply.is_none() {
                    return Ok(Some(Resolved::One(String::new())));
                }
            }
        }

        match reply {
            None => Ok(None),
            Some(Reply::Value(value)) => Ok(Some(value)),
            Some(Reply::Timeout) => Err(DriverError::Timeout {
                context: format!("find {}", locator.selector),
            }),
            Some(Reply::Interaction) => Err(DriverError::Remote {
                command: "click".to_string(),
                error: "element not interactable".to_string(),
                message: locator.selector.clone(),
            }),
            Some(Reply::Fatal) => Err(DriverError::Session {
                reason: "invalid session id".to_string(),
            }),
        }
    }

    async fn wait(&self, duration: Duration) -> Result<(), DriverError> {
        self.waits.lock().unwrap().push(duration);
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        Ok(self.current.lock().unwrap().clone())
    }
}
