//! Shared event vocabulary passed from instrumentation to providers.

use std::time::SystemTime;

use serde::Serialize;
use serde_json::{Map, Value};

/// Free-form key/value payload attached to events.
pub type Properties = Map<String, Value>;

/// A named occurrence, the unit of analytics recording.
///
/// The timestamp is optional at construction; [`Analytics`](crate::Analytics)
/// stamps it with the recording time when absent.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Event {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<SystemTime>,
}

impl Event {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: None,
            timestamp: None,
        }
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = Some(properties);
        self
    }

    pub fn with_timestamp(mut self, timestamp: SystemTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Look up a single property value.
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.as_ref().and_then(|p| p.get(key))
    }
}

/// A screen or page being shown to the user.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PageViewEvent {
    pub screen_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
}

impl PageViewEvent {
    pub fn new(screen_name: impl Into<String>) -> Self {
        Self {
            screen_name: screen_name.into(),
            properties: None,
        }
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = Some(properties);
        self
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.as_ref().and_then(|p| p.get(key))
    }
}

/// A measured duration, in whole milliseconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TimingEvent {
    pub category: String,
    pub variable: String,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl TimingEvent {
    pub fn new(category: impl Into<String>, variable: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            category: category.into(),
            variable: variable.into(),
            duration_ms,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// The user a backend should associate subsequent events with.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UserIdentity {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traits: Option<Properties>,
}

impl UserIdentity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
            name: None,
            traits: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_traits(mut self, traits: Properties) -> Self {
        self.traits = Some(traits);
        self
    }
}

/// Merge `overlay` into `base`; keys in `overlay` win.
pub(crate) fn merge(base: &mut Properties, overlay: Properties) {
    for (key, value) in overlay {
        base.insert(key, value);
    }
}

/// Convert a duration in fractional milliseconds to whole milliseconds.
pub(crate) fn round_ms(ms: f64) -> u64 {
    if ms.is_finite() && ms > 0.0 {
        ms.round() as u64
    } else {
        0
    }
}
