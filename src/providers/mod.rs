//! Concrete backend adapters.

pub mod google_analytics;
pub mod mixpanel;

pub use google_analytics::{DataLayer, GoogleAnalyticsProvider, GtagCommand, ScriptHost};
pub use mixpanel::{MixpanelOptions, MixpanelProvider, MixpanelSdk};
