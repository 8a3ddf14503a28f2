//! Mixpanel adapter over an injected SDK handle.

use serde_json::json;

use crate::error::ProviderError;
use crate::event::{merge, Event, PageViewEvent, Properties, TimingEvent, UserIdentity};
use crate::provider::Provider;

/// Options passed to the SDK on initialization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MixpanelOptions {
    pub debug: bool,
    /// Page views are tracked explicitly, never by the SDK.
    pub track_pageview: bool,
    pub persistence: String,
}

impl Default for MixpanelOptions {
    fn default() -> Self {
        Self {
            debug: cfg!(debug_assertions),
            track_pageview: false,
            persistence: "localStorage".to_string(),
        }
    }
}

/// The subset of the Mixpanel SDK the adapter drives.
///
/// Implementations queue calls for their own transport and return promptly.
#[cfg_attr(test, mockall::automock)]
pub trait MixpanelSdk: Send + Sync {
    fn is_initialized(&self) -> bool;

    fn init(&self, token: &str, options: &MixpanelOptions) -> Result<(), ProviderError>;

    fn track(&self, name: &str, properties: &Properties) -> Result<(), ProviderError>;

    fn identify(&self, user_id: &str) -> Result<(), ProviderError>;

    fn people_set(&self, properties: &Properties) -> Result<(), ProviderError>;

    fn reset(&self) -> Result<(), ProviderError>;
}

/// Adapter translating analytics calls into Mixpanel SDK calls.
pub struct MixpanelProvider<S> {
    sdk: S,
}

impl<S: MixpanelSdk> MixpanelProvider<S> {
    /// Initialize the SDK with `token` unless it already is.
    pub fn new(token: &str, sdk: S) -> Result<Self, ProviderError> {
        Self::with_options(token, sdk, MixpanelOptions::default())
    }

    pub fn with_options(token: &str, sdk: S, options: MixpanelOptions) -> Result<Self, ProviderError> {
        if !sdk.is_initialized() {
            sdk.init(token, &options)?;
        }
        Ok(Self { sdk })
    }

    pub fn sdk(&self) -> &S {
        &self.sdk
    }
}

impl<S: MixpanelSdk> Provider for MixpanelProvider<S> {
    fn name(&self) -> &'static str {
        "mixpanel"
    }

    fn track_event(&self, event: &Event) -> Result<(), ProviderError> {
        let properties = event.properties.clone().unwrap_or_default();
        self.sdk.track(&event.name, &properties)
    }

    fn track_page_view(&self, event: &PageViewEvent) -> Result<(), ProviderError> {
        let mut properties = Properties::new();
        properties.insert("screen_name".into(), json!(event.screen_name));
        if let Some(extra) = &event.properties {
            merge(&mut properties, extra.clone());
        }
        self.sdk.track("Page View", &properties)
    }

    fn track_timing(&self, event: &TimingEvent) -> Result<(), ProviderError> {
        let mut properties = Properties::new();
        properties.insert("category".into(), json!(event.category));
        properties.insert("variable".into(), json!(event.variable));
        properties.insert("duration".into(), json!(event.duration_ms));
        if let Some(label) = &event.label {
            properties.insert("label".into(), json!(label));
        }
        self.sdk.track("Timing", &properties)
    }

    fn identify(&self, user: &UserIdentity) -> Result<(), ProviderError> {
        self.sdk.identify(&user.user_id)?;

        let mut people = Properties::new();
        if let Some(email) = &user.email {
            people.insert("$email".into(), json!(email));
        }
        if let Some(name) = &user.name {
            people.insert("$name".into(), json!(name));
        }
        if let Some(traits) = &user.traits {
            merge(&mut people, traits.clone());
        }
        self.sdk.people_set(&people)
    }

    fn reset(&self) -> Result<(), ProviderError> {
        self.sdk.reset()
    }
}
