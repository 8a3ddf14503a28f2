//! Google Analytics (gtag.js) adapter.
//!
//! The provider never talks to the network. It translates calls into gtag
//! commands and pushes them onto the data layer, a channel the host drains
//! into the real `gtag` function or a measurement-protocol transport.

use flume::{Receiver, Sender};
use serde_json::{json, Value};

use crate::error::ProviderError;
use crate::event::{merge, Event, PageViewEvent, Properties, TimingEvent, UserIdentity};
use crate::provider::Provider;

const GTAG_SCRIPT_URL: &str = "https://www.googletagmanager.com/gtag/js";

/// Host capable of loading third-party scripts into the document.
#[cfg_attr(test, mockall::automock)]
pub trait ScriptHost: Send + Sync {
    fn has_script(&self, src: &str) -> bool;

    fn inject_script(&self, src: &str, is_async: bool);
}

/// One `gtag(command, target, params)` call.
#[derive(Clone, Debug, PartialEq)]
pub struct GtagCommand {
    pub command: String,
    pub target: String,
    pub params: Properties,
}

impl GtagCommand {
    fn new(command: &str, target: &str, params: Properties) -> Self {
        Self {
            command: command.to_string(),
            target: target.to_string(),
            params,
        }
    }
}

/// Receiving end of the gtag data layer.
pub struct DataLayer {
    receiver: Receiver<GtagCommand>,
}

impl DataLayer {
    /// Take every command pushed so far without blocking.
    pub fn drain(&self) -> Vec<GtagCommand> {
        self.receiver.try_iter().collect()
    }

    /// Wait for the next command. `None` once the provider is dropped and the
    /// layer is empty.
    pub async fn next(&self) -> Option<GtagCommand> {
        self.receiver.recv_async().await.ok()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

/// Adapter translating analytics calls into gtag commands.
pub struct GoogleAnalyticsProvider {
    measurement_id: String,
    data_layer: Sender<GtagCommand>,
}

impl GoogleAnalyticsProvider {
    /// Load gtag.js for `measurement_id` (once per host) and open the data layer.
    pub fn new(measurement_id: impl Into<String>, host: &dyn ScriptHost) -> (Self, DataLayer) {
        let measurement_id = measurement_id.into();
        let src = Self::script_url(&measurement_id);

        if host.has_script(&src) {
            tracing::debug!(%src, "gtag.js already loaded");
        } else {
            host.inject_script(&src, true);
        }

        let (sender, receiver) = flume::unbounded();
        let provider = Self {
            measurement_id,
            data_layer: sender,
        };
        (provider, DataLayer { receiver })
    }

    pub fn script_url(measurement_id: &str) -> String {
        format!("{GTAG_SCRIPT_URL}?id={measurement_id}")
    }

    pub fn measurement_id(&self) -> &str {
        &self.measurement_id
    }

    fn gtag(&self, command: &str, target: &str, params: Properties) -> Result<(), ProviderError> {
        self.data_layer
            .send(GtagCommand::new(command, target, params))
            .map_err(|_| ProviderError::Disconnected)
    }
}

impl Provider for GoogleAnalyticsProvider {
    fn name(&self) -> &'static str {
        "google_analytics"
    }

    fn track_event(&self, event: &Event) -> Result<(), ProviderError> {
        let params = event.properties.clone().unwrap_or_default();
        self.gtag("event", &event.name, params)
    }

    fn track_page_view(&self, event: &PageViewEvent) -> Result<(), ProviderError> {
        let mut params = Properties::new();
        params.insert("page_title".into(), json!(event.screen_name));
        if let Some(properties) = &event.properties {
            merge(&mut params, properties.clone());
        }
        self.gtag("event", "page_view", params)
    }

    fn track_timing(&self, event: &TimingEvent) -> Result<(), ProviderError> {
        let mut params = Properties::new();
        params.insert("event_category".into(), json!(event.category));
        params.insert("name".into(), json!(event.variable));
        params.insert("value".into(), json!(event.duration_ms));
        if let Some(label) = &event.label {
            params.insert("event_label".into(), json!(label));
        }
        self.gtag("event", "timing_complete", params)
    }

    fn identify(&self, user: &UserIdentity) -> Result<(), ProviderError> {
        let mut params = Properties::new();
        params.insert("user_id".into(), json!(user.user_id));
        if let Some(traits) = &user.traits {
            merge(&mut params, traits.clone());
        }
        self.gtag("set", "user_properties", params)
    }

    fn reset(&self) -> Result<(), ProviderError> {
        let mut params = Properties::new();
        params.insert("user_id".into(), Value::Null);
        self.gtag("set", "user_properties", params)
    }
}
