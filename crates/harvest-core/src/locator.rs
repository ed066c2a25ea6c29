//! Declarative locator descriptions.
//!
//! A [`LocatorSpec`] says how to find one value on a page and what to do with
//! it. It is loaded from the supplier catalog and never mutated afterwards.
//!
//! ## Serialized shape
//!
//! ```yaml
//! by: XPATH                      # strategy, case-insensitive
//! selector: "//h1"
//! attribute: innerText           # optional; absent means element text
//! event: click()                 # optional; click / type:<text>
//! timeout: 5                     # seconds, default 5
//! timeout_for_event: presence_of_element_located
//! if_list: first                 # first | all
//! mandatory: false
//! locator_description: product title
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default locator timeout in seconds when the catalog omits `timeout`.
pub const DEFAULT_TIMEOUT_SECS: f64 = 5.0;

/// Element lookup strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Strategy {
    Css,
    Xpath,
    Id,
    Name,
    Tag,
    LinkText,
}

impl Strategy {
    /// Canonical serialized name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Css => "css selector",
            Strategy::Xpath => "xpath",
            Strategy::Id => "id",
            Strategy::Name => "name",
            Strategy::Tag => "tag name",
            Strategy::LinkText => "link text",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Strategy {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        let key = raw.trim().to_lowercase().replace(['_', '-'], " ");
        match key.as_str() {
            "css" | "css selector" => Ok(Strategy::Css),
            "xpath" => Ok(Strategy::Xpath),
            "id" => Ok(Strategy::Id),
            "name" => Ok(Strategy::Name),
            "tag" | "tag name" => Ok(Strategy::Tag),
            "link text" => Ok(Strategy::LinkText),
            _ => Err(format!("unknown locator strategy \"{raw}\"")),
        }
    }
}

impl From<Strategy> for String {
    fn from(value: Strategy) -> Self {
        value.as_str().to_string()
    }
}

/// Interaction performed on the matched element(s) before the value is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Event {
    Click,
    /// Send the given keystrokes.
    Type(String),
}

impl TryFrom<String> for Event {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("click") || trimmed.eq_ignore_ascii_case("click()") {
            return Ok(Event::Click);
        }
        if let Some(text) = trimmed.strip_prefix("type:") {
            return Ok(Event::Type(text.to_string()));
        }
        Err(format!(
            "unknown locator event \"{raw}\" (expected click() or type:<text>)"
        ))
    }
}

impl From<Event> for String {
    fn from(value: Event) -> Self {
        match value {
            Event::Click => "click()".to_string(),
            Event::Type(text) => format!("type:{text}"),
        }
    }
}

/// What "found" means while polling for an element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaitCondition {
    #[default]
    #[serde(rename = "presence_of_element_located", alias = "presence")]
    Presence,
    #[serde(rename = "visibility_of_element_located", alias = "visible")]
    Visible,
    #[serde(rename = "element_to_be_clickable", alias = "clickable")]
    Clickable,
}

/// Which matches a locator yields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Multiplicity {
    #[default]
    First,
    All,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocatorSpec {
    pub by: Strategy,
    pub selector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<Event>,
    #[serde(default, rename = "timeout_for_event")]
    pub wait: WaitCondition,
    /// Seconds to keep polling before treating the locator as a miss.
    #[serde(default = "default_timeout")]
    pub timeout: f64,
    #[serde(default)]
    pub if_list: Multiplicity,
    #[serde(default)]
    pub mandatory: bool,
    #[serde(
        default,
        rename = "locator_description",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
}

fn default_timeout() -> f64 {
    DEFAULT_TIMEOUT_SECS
}

impl LocatorSpec {
    /// Builds a locator with default policy (first match, not mandatory,
    /// presence wait, default timeout).
    #[must_use]
    pub fn new(by: Strategy, selector: impl Into<String>) -> Self {
        Self {
            by,
            selector: selector.into(),
            attribute: None,
            event: None,
            wait: WaitCondition::Presence,
            timeout: DEFAULT_TIMEOUT_SECS,
            if_list: Multiplicity::First,
            mandatory: false,
            description: None,
        }
    }

    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::new(Strategy::Css, selector)
    }

    #[must_use]
    pub fn xpath(selector: impl Into<String>) -> Self {
        Self::new(Strategy::Xpath, selector)
    }

    #[must_use]
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    #[must_use]
    pub fn with_event(mut self, event: Event) -> Self {
        self.event = Some(event);
        self
    }

    #[must_use]
    pub fn all(mut self) -> Self {
        self.if_list = Multiplicity::All;
        self
    }

    #[must_use]
    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    #[must_use]
    pub fn with_timeout_secs(mut self, secs: f64) -> Self {
        self.timeout = secs;
        self
    }

    /// Polling budget as a `Duration`. Invalid timeouts (rejected at load
    /// time) collapse to zero.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout).unwrap_or(Duration::ZERO)
    }

    /// Short human label for logs: the description when present, otherwise
    /// `"<by> <selector>"`.
    #[must_use]
    pub fn label(&self) -> String {
        match &self.description {
            Some(d) if !d.trim().is_empty() => d.clone(),
            _ => format!("{} {}", self.by, self.selector),
        }
    }

    /// Structural validation applied when the catalog is loaded.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the selector is blank, the
    /// timeout is negative or not finite, or the attribute name is blank.
    pub fn validate(&self) -> Result<(), String> {
        if self.selector.trim().is_empty() {
            return Err("selector must be non-empty".to_string());
        }
        if !self.timeout.is_finite() || self.timeout < 0.0 {
            return Err(format!(
                "timeout must be a non-negative number of seconds, got {}",
                self.timeout
            ));
        }
        if matches!(&self.attribute, Some(a) if a.trim().is_empty()) {
            return Err("attribute must be non-empty when present".to_string());
        }
        Ok(())
    }
}
