//! Composition of the performance, scroll, interaction and page-view wrappers.

use crate::component::Component;
use crate::env::TrackingEnv;
use crate::tracking::interaction::{EventMappings, InteractionTracked};
use crate::tracking::page::{PageTracked, PageTrackingConfig};
use crate::tracking::performance::{PerformanceConfig, PerformanceTracked};
use crate::tracking::scroll::{ScrollTracked, ScrollTrackingConfig};

/// Configuration for [`with_full_analytics`]. Omitted sections skip their wrapper.
pub struct FullAnalyticsConfig<Props> {
    pub page: Option<PageTrackingConfig<Props>>,
    pub events: Option<EventMappings<Props>>,
    pub scroll: Option<ScrollTrackingConfig>,
    pub performance: Option<PerformanceConfig>,
}

impl<Props> Default for FullAnalyticsConfig<Props> {
    fn default() -> Self {
        Self {
            page: None,
            events: None,
            scroll: None,
            performance: None,
        }
    }
}

impl<Props> FullAnalyticsConfig<Props> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, config: PageTrackingConfig<Props>) -> Self {
        self.page = Some(config);
        self
    }

    pub fn events(mut self, mappings: EventMappings<Props>) -> Self {
        self.events = Some(mappings);
        self
    }

    pub fn scroll(mut self, config: ScrollTrackingConfig) -> Self {
        self.scroll = Some(config);
        self
    }

    pub fn performance(mut self, config: PerformanceConfig) -> Self {
        self.performance = Some(config);
        self
    }
}

/// Wrap `component` in every configured tracker.
///
/// Nesting, innermost first: performance, scroll, interaction, page view.
/// Performance therefore times only the element's own render, and the page
/// view sees the props as the host passed them.
pub fn with_full_analytics<Props, C>(
    component: C,
    config: FullAnalyticsConfig<Props>,
    env: &TrackingEnv,
) -> Box<dyn Component<Props>>
where
    Props: 'static,
    C: Component<Props> + 'static,
{
    let mut enhanced: Box<dyn Component<Props>> = Box::new(component);

    if let Some(performance) = config.performance {
        enhanced = Box::new(PerformanceTracked::new(enhanced, performance, env));
    }

    if let Some(scroll) = config.scroll {
        enhanced = Box::new(ScrollTracked::new(enhanced, scroll, env));
    }

    if let Some(events) = config.events {
        enhanced = Box::new(InteractionTracked::new(enhanced, events, env));
    }

    if let Some(page) = config.page {
        enhanced = Box::new(PageTracked::new(enhanced, page, env));
    }

    enhanced
}
