//! Analytics dispatch and component instrumentation for declarative UI runtimes.
//!
//! One [`Analytics`] service fans every event out to any number of backend
//! [`Provider`]s, buffering calls made before the first provider registers.
//! Instrumentation wrappers decorate a [`Component`] and report what happens
//! to it: callback interactions, page views, scroll depth, render timing and
//! form lifecycle.
//!
//! Data flows one way: host → wrapper → [`Analytics`] → [`Provider`] → backend.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use oxide_track::{
//!     Analytics, Callback, Component, EventMapping, EventMappings, InteractionTracked,
//!     TrackingEnv,
//! };
//!
//! struct JobCardProps {
//!     job_id: String,
//!     on_apply: Option<Callback<String>>,
//! }
//!
//! struct JobCard;
//!
//! impl Component<JobCardProps> for JobCard {
//!     fn render(&mut self, props: JobCardProps) {
//!         // A real element would hand the callback to a button
//!         if let Some(on_apply) = &props.on_apply {
//!             on_apply.call(props.job_id.clone());
//!         }
//!     }
//! }
//!
//! let analytics = Arc::new(Analytics::new());
//! let env = TrackingEnv::new(analytics.clone());
//!
//! let mut card = InteractionTracked::new(
//!     JobCard,
//!     EventMappings::new().on(EventMapping::new(
//!         "job_apply_clicked",
//!         |props: &mut JobCardProps| &mut props.on_apply,
//!     )),
//!     &env,
//! );
//!
//! card.render(JobCardProps {
//!     job_id: "42".into(),
//!     on_apply: Some(Callback::new(|_job_id: String| {})),
//! });
//!
//! // No provider registered yet: the click is queued
//! assert_eq!(analytics.pending(), 1);
//! ```

// Module declarations
mod callback;
mod clock;
mod component;
mod config;
mod context;
mod debounce;
mod env;
mod error;
mod event;
mod provider;
mod service;
mod session;

pub mod providers;
pub mod tracking;

// Public re-exports
pub use callback::Callback;
pub use clock::{Clock, MonotonicClock};
pub use component::{Component, HostEvent};
pub use config::{AnalyticsConfig, GoogleAnalyticsConfig, MixpanelConfig};
pub use context::{try_use_analytics, use_analytics, AnalyticsContext, ContextGuard};
pub use debounce::Debouncer;
pub use env::{Location, Navigation, NavigationState, ScrollMetrics, TrackingEnv, Viewport, ViewportState};
pub use error::{AnalyticsError, ConfigError, ProviderError};
pub use event::{Event, PageViewEvent, Properties, TimingEvent, UserIdentity};
pub use provider::Provider;
pub use service::Analytics;
pub use session::{session_id, MemorySessionStore, SessionStore, SESSION_ID_KEY};
pub use tracking::{
    with_full_analytics, EventMapping, EventMappings, FormHandlers, FormTracked, FormTrackingConfig,
    FullAnalyticsConfig, InteractionTracked, PageTracked, PageTrackingConfig, PerformanceConfig,
    PerformanceTracked, RenderPhase, ScrollTracked, ScrollTrackingConfig,
};

// Test utilities (only available with 'testing' feature or during tests)
#[cfg(any(test, feature = "testing"))]
pub use clock::ManualClock;
#[cfg(any(test, feature = "testing"))]
pub use component::TestComponent;
#[cfg(any(test, feature = "testing"))]
pub use provider::{ProviderCall, TestProvider};
