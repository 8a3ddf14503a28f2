//! Instrumentation wrappers emitting through [`Analytics`](crate::Analytics).
//!
//! Every wrapper takes the element it decorates, its configuration and a
//! [`TrackingEnv`](crate::TrackingEnv), and is itself a
//! [`Component`](crate::Component) with the same props contract. Tracking
//! runs after the wrapped element renders and never changes what it renders.

pub mod form;
pub mod full;
pub mod interaction;
pub mod page;
pub mod performance;
pub mod scroll;

pub use form::{FormHandlers, FormTracked, FormTrackingConfig};
pub use full::{with_full_analytics, FullAnalyticsConfig};
pub use interaction::{EventMapping, EventMappings, HandlerBinding, InteractionTracked};
pub use page::{PageTracked, PageTrackingConfig};
pub use performance::{PerformanceConfig, PerformanceTracked, RenderPhase};
pub use scroll::{ScrollTracked, ScrollTrackingConfig};
