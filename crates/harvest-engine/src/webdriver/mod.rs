//! [`Driver`] over the W3C WebDriver HTTP protocol (geckodriver,
//! chromedriver, Selenium Grid).

mod protocol;
mod retry;

use std::time::Duration;

use async_trait::async_trait;
use harvest_core::{AppConfig, Event, LocatorSpec, Multiplicity, Resolved, WaitCondition};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::time::Instant;

use crate::driver::Driver;
use crate::error::DriverError;

use protocol::{
    classify_error, element_ids, find_elements_body, is_stale, property_text, Envelope,
    NewSession,
};
use retry::retry_with_backoff;

/// Pause between element lookups while waiting for a locator.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone)]
pub struct WebDriverConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    /// Extra attempts after a transport failure. Element interactions are
    /// never retried.
    pub max_retries: u32,
    pub backoff_base_secs: u64,
    /// Sent as `capabilities.alwaysMatch` when a session is created.
    pub capabilities: Value,
}

impl WebDriverConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout_secs: 30,
            max_retries: 2,
            backoff_base_secs: 1,
            capabilities: json!({}),
        }
    }

    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            base_url: config.webdriver_url.clone(),
            request_timeout_secs: config.request_timeout_secs,
            max_retries: config.max_retries,
            backoff_base_secs: config.retry_backoff_base_secs,
            capabilities: json!({}),
        }
    }
}

pub struct WebDriverClient {
    http: Client,
    base_url: String,
    session_id: String,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl WebDriverClient {
    /// Starts a new browser session.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Http`] if the endpoint is unreachable and
    /// [`DriverError::Session`] (or the remote error) if it refuses to
    /// create a session.
    pub async fn connect(config: &WebDriverConfig) -> Result<Self, DriverError> {
        let mut client = Self::with_session(config, String::new())?;
        let url = format!("{}/session", client.base_url);
        let body = json!({ "capabilities": { "alwaysMatch": config.capabilities } });
        let created: NewSession = retry_with_backoff(
            client.max_retries,
            client.backoff_base_secs,
            "new session",
            || client.send(Method::POST, &url, Some(&body), "new session"),
        )
        .await?;
        tracing::info!(
            session = %created.session_id,
            endpoint = %client.base_url,
            "webdriver session started"
        );
        client.session_id = created.session_id;
        Ok(client)
    }

    /// Attaches to an existing session.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Http`] if the HTTP client cannot be built.
    pub fn with_session(
        config: &WebDriverConfig,
        session_id: impl Into<String>,
    ) -> Result<Self, DriverError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session_id: session_id.into(),
            max_retries: config.max_retries,
            backoff_base_secs: config.backoff_base_secs,
        })
    }

    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Ends the session and closes the browser.
    ///
    /// # Errors
    ///
    /// Returns the driver error if the remote end cannot be reached or
    /// rejects the request.
    pub async fn close(self) -> Result<(), DriverError> {
        let url = format!("{}/session/{}", self.base_url, self.session_id);
        self.send::<Value>(Method::DELETE, &url, None, "delete session")
            .await?;
        tracing::info!(session = %self.session_id, "webdriver session closed");
        Ok(())
    }

    fn session_url(&self, suffix: &str) -> String {
        format!("{}/session/{}/{suffix}", self.base_url, self.session_id)
    }

    /// One request, no retries.
    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        command: &str,
    ) -> Result<T, DriverError> {
        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(classify_error(command, status.as_u16(), &text));
        }

        serde_json::from_str::<Envelope<T>>(&text)
            .map(|envelope| envelope.value)
            .map_err(|e| DriverError::Deserialize {
                context: format!("{command} response"),
                source: e,
            })
    }

    /// Session command with transport retries.
    async fn command<T: DeserializeOwned>(
        &self,
        method: Method,
        suffix: &str,
        body: Option<Value>,
        command: &str,
    ) -> Result<T, DriverError> {
        let url = self.session_url(suffix);
        retry_with_backoff(self.max_retries, self.backoff_base_secs, command, || {
            self.send(method.clone(), &url, body.as_ref(), command)
        })
        .await
    }

    async fn find_elements(&self, locator: &LocatorSpec) -> Result<Vec<String>, DriverError> {
        let found: Vec<Value> = self
            .command(
                Method::POST,
                "elements",
                Some(find_elements_body(locator)),
                "find elements",
            )
            .await?;
        Ok(element_ids(&found))
    }

    async fn element_flag(&self, id: &str, flag: &str) -> Result<bool, DriverError> {
        match self
            .command(Method::GET, &format!("element/{id}/{flag}"), None, flag)
            .await
        {
            Err(e) if is_stale(&e) => Ok(false),
            other => other,
        }
    }

    async fn is_ready(&self, id: &str, wait: WaitCondition) -> Result<bool, DriverError> {
        Ok(match wait {
            WaitCondition::Presence => true,
            WaitCondition::Visible => self.element_flag(id, "displayed").await?,
            WaitCondition::Clickable => {
                self.element_flag(id, "displayed").await?
                    && self.element_flag(id, "enabled").await?
            }
        })
    }

    /// Polls until at least one element satisfies the wait condition or the
    /// locator's timeout runs out. A zero timeout looks exactly once.
    async fn wait_for_elements(&self, locator: &LocatorSpec) -> Result<Vec<String>, DriverError> {
        let deadline = Instant::now() + locator.timeout();
        loop {
            let mut ready = Vec::new();
            for id in self.find_elements(locator).await? {
                if self.is_ready(&id, locator.wait).await? {
                    ready.push(id);
                }
            }
            if !ready.is_empty() {
                return Ok(ready);
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(ready);
            }
            tokio::time::sleep(POLL_INTERVAL.min(deadline - now)).await;
        }
    }

    /// Element text, or the named attribute falling back to the property of
    /// the same name. `None` when the element went stale or has no such
    /// attribute.
    async fn read(&self, id: &str, attribute: Option<&str>) -> Result<Option<String>, DriverError> {
        let result = match attribute {
            None => self
                .command::<String>(Method::GET, &format!("element/{id}/text"), None, "text")
                .await
                .map(Some),
            Some(name) => self.read_attribute(id, name).await,
        };
        match result {
            Err(e) if is_stale(&e) => Ok(None),
            other => other,
        }
    }

    async fn read_attribute(&self, id: &str, name: &str) -> Result<Option<String>, DriverError> {
        let attribute: Option<String> = self
            .command(
                Method::GET,
                &format!("element/{id}/attribute/{name}"),
                None,
                "attribute",
            )
            .await?;
        if attribute.is_some() {
            return Ok(attribute);
        }
        let property: Value = self
            .command(
                Method::GET,
                &format!("element/{id}/property/{name}"),
                None,
                "property",
            )
            .await?;
        Ok(property_text(&property))
    }

    /// Interactions are not idempotent and go out exactly once.
    async fn fire(&self, id: &str, event: &Event) -> Result<(), DriverError> {
        let (suffix, body, command) = match event {
            Event::Click => (format!("element/{id}/click"), json!({}), "click"),
            Event::Type(text) => (format!("element/{id}/value"), json!({ "text": text }), "send keys"),
        };
        let url = self.session_url(&suffix);
        self.send::<Value>(Method::POST, &url, Some(&body), command)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Driver for WebDriverClient {
    async fn navigate(&self, url: &str) -> Result<bool, DriverError> {
        match self
            .command::<Value>(Method::POST, "url", Some(json!({ "url": url })), "navigate")
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "navigation failed");
                Ok(false)
            }
        }
    }

    async fn resolve(&self, locator: &LocatorSpec) -> Result<Option<Resolved>, DriverError> {
        let elements = self.wait_for_elements(locator).await?;
        if elements.is_empty() {
            if locator.mandatory {
                tracing::warn!(locator = %locator.label(), "mandatory locator matched nothing");
            } else {
                tracing::debug!(locator = %locator.label(), "locator matched nothing");
            }
            return Ok(None);
        }

        let targets = match locator.if_list {
            Multiplicity::First => &elements[..1],
            Multiplicity::All => &elements[..],
        };

        // Values are read before the event fires; a click may navigate away.
        let mut values = Vec::new();
        if locator.event.is_none() || locator.attribute.is_some() {
            for id in targets {
                if let Some(value) = self.read(id, locator.attribute.as_deref()).await? {
                    values.push(value);
                }
            }
        }

        if let Some(event) = &locator.event {
            for id in targets {
                self.fire(id, event).await?;
            }
            if locator.attribute.is_none() {
                return Ok(Some(Resolved::One(String::new())));
            }
        }

        Ok(match locator.if_list {
            Multiplicity::First => values.into_iter().next().map(Resolved::One),
            Multiplicity::All => (!values.is_empty()).then_some(Resolved::Many(values)),
        })
    }

    async fn wait(&self, duration: Duration) -> Result<(), DriverError> {
        tokio::time::sleep(duration).await;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        self.command(Method::GET, "url", None, "current url").await
    }
}
