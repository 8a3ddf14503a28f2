//! Host environment the instrumentation wrappers read from.

use std::sync::Arc;

use spin::Mutex;

use crate::clock::{Clock, MonotonicClock};
use crate::service::Analytics;

/// Current route of the host application.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Location {
    pub pathname: String,
    pub search: String,
}

impl Location {
    pub fn new(pathname: impl Into<String>, search: impl Into<String>) -> Self {
        Self {
            pathname: pathname.into(),
            search: search.into(),
        }
    }
}

/// Navigation context attached to page views.
pub trait Navigation: Send + Sync {
    fn location(&self) -> Location;

    /// URL of the previous document, empty when unknown.
    fn referrer(&self) -> String;
}

/// Document scroll geometry, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl ScrollMetrics {
    pub fn new(scroll_top: f64, scroll_height: f64, client_height: f64) -> Self {
        Self {
            scroll_top,
            scroll_height,
            client_height,
        }
    }

    /// Percentage of the scrollable height scrolled past, rounded to 0..=100.
    ///
    /// A page that cannot scroll reports 100.
    pub fn depth_percent(&self) -> u32 {
        let scrollable = self.scroll_height - self.client_height;
        if scrollable <= 0.0 {
            return 100;
        }
        let depth = (self.scroll_top / scrollable * 100.0).round();
        depth.clamp(0.0, 100.0) as u32
    }
}

/// Source of the document's scroll geometry.
pub trait Viewport: Send + Sync {
    fn scroll_metrics(&self) -> ScrollMetrics;
}

/// [`Navigation`] whose state the host pushes in on route changes.
#[derive(Debug, Default)]
pub struct NavigationState {
    inner: Mutex<(Location, String)>,
}

impl NavigationState {
    pub fn new(location: Location, referrer: impl Into<String>) -> Self {
        Self {
            inner: Mutex::new((location, referrer.into())),
        }
    }

    pub fn set_location(&self, location: Location) {
        self.inner.lock().0 = location;
    }

    pub fn set_referrer(&self, referrer: impl Into<String>) {
        self.inner.lock().1 = referrer.into();
    }
}

impl Navigation for NavigationState {
    fn location(&self) -> Location {
        self.inner.lock().0.clone()
    }

    fn referrer(&self) -> String {
        self.inner.lock().1.clone()
    }
}

/// [`Viewport`] whose geometry the host pushes in before signalling a scroll.
#[derive(Debug, Default)]
pub struct ViewportState {
    metrics: Mutex<ScrollMetrics>,
}

impl ViewportState {
    pub fn new(metrics: ScrollMetrics) -> Self {
        Self {
            metrics: Mutex::new(metrics),
        }
    }

    pub fn set(&self, metrics: ScrollMetrics) {
        *self.metrics.lock() = metrics;
    }

    /// Move the scroll position, keeping the document geometry.
    pub fn scroll_to(&self, scroll_top: f64) {
        self.metrics.lock().scroll_top = scroll_top;
    }
}

impl Viewport for ViewportState {
    fn scroll_metrics(&self) -> ScrollMetrics {
        *self.metrics.lock()
    }
}

/// Dependencies injected into every instrumentation wrapper.
///
/// Cheap to clone; all members are shared.
#[derive(Clone)]
pub struct TrackingEnv {
    pub analytics: Arc<Analytics>,
    pub clock: Arc<dyn Clock>,
    pub navigation: Arc<dyn Navigation>,
    pub viewport: Arc<dyn Viewport>,
}

impl TrackingEnv {
    /// Environment with a wall clock, an empty route and a non-scrollable viewport.
    pub fn new(analytics: Arc<Analytics>) -> Self {
        Self {
            analytics,
            clock: Arc::new(MonotonicClock::new()),
            navigation: Arc::new(NavigationState::default()),
            viewport: Arc::new(ViewportState::default()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_navigation(mut self, navigation: Arc<dyn Navigation>) -> Self {
        self.navigation = navigation;
        self
    }

    pub fn with_viewport(mut self, viewport: Arc<dyn Viewport>) -> Self {
        self.viewport = viewport;
        self
    }
}
