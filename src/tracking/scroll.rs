//! Scroll-depth tracking with debounced sampling and per-marker events.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::clock::Clock;
use crate::component::{Component, HostEvent};
use crate::debounce::Debouncer;
use crate::env::{TrackingEnv, Viewport};
use crate::event::{round_ms, Event, Properties, TimingEvent};
use crate::service::Analytics;

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ScrollTrackingConfig {
    pub screen_name: String,
    /// Depth percentages reported once each, in this order.
    #[serde(default = "default_depth_markers")]
    pub depth_markers: Vec<u32>,
    /// Report time spent beyond each reached marker on unmount.
    #[serde(default = "default_true")]
    pub track_time_at_depth: bool,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_depth_markers() -> Vec<u32> {
    vec![25, 50, 75, 100]
}

fn default_true() -> bool {
    true
}

fn default_debounce_ms() -> u64 {
    100
}

impl ScrollTrackingConfig {
    pub fn new(screen_name: impl Into<String>) -> Self {
        Self {
            screen_name: screen_name.into(),
            depth_markers: default_depth_markers(),
            track_time_at_depth: true,
            debounce_ms: default_debounce_ms(),
        }
    }

    pub fn depth_markers(mut self, markers: impl Into<Vec<u32>>) -> Self {
        self.depth_markers = markers.into();
        self
    }

    pub fn track_time_at_depth(mut self, enabled: bool) -> Self {
        self.track_time_at_depth = enabled;
        self
    }

    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }
}

/// Per-mount accumulators; discarded on unmount.
#[derive(Debug, Default)]
struct ScrollSession {
    mounted_at: Duration,
    max_depth: u32,
    reached: Vec<u32>,
    reached_at: Vec<(u32, Duration)>,
}

/// Reports how far the page is scrolled while the element is mounted.
///
/// Scroll signals re-arm a debounce timer; the viewport is sampled when a
/// tick finds the timer due. Each depth marker is reported the first time it
/// is reached. On unmount a session summary is emitted and, when enabled, the
/// time spent beyond each reached marker.
pub struct ScrollTracked<C> {
    inner: C,
    config: ScrollTrackingConfig,
    analytics: Arc<Analytics>,
    clock: Arc<dyn Clock>,
    viewport: Arc<dyn Viewport>,
    debouncer: Debouncer,
    session: Option<ScrollSession>,
}

impl<C> ScrollTracked<C> {
    pub fn new(inner: C, config: ScrollTrackingConfig, env: &TrackingEnv) -> Self {
        let debouncer = Debouncer::new(Duration::from_millis(config.debounce_ms));
        Self {
            inner,
            config,
            analytics: env.analytics.clone(),
            clock: env.clock.clone(),
            viewport: env.viewport.clone(),
            debouncer,
            session: None,
        }
    }

    /// Deepest scroll percentage seen since mount.
    pub fn max_depth(&self) -> Option<u32> {
        self.session.as_ref().map(|session| session.max_depth)
    }

    fn sample(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let now = self.clock.now();
        let depth = self.viewport.scroll_metrics().depth_percent();
        session.max_depth = session.max_depth.max(depth);

        for &marker in &self.config.depth_markers {
            if depth < marker || session.reached.contains(&marker) {
                continue;
            }
            session.reached.push(marker);

            let mut properties = Properties::new();
            properties.insert("screenName".into(), json!(self.config.screen_name));
            properties.insert("depth".into(), json!(marker));
            properties.insert(
                "timeToReach".into(),
                json!(round_ms(now.saturating_sub(session.mounted_at).as_secs_f64() * 1000.0)),
            );
            self.analytics
                .track_event(Event::new("scroll_depth_reached").with_properties(properties));

            if self.config.track_time_at_depth {
                session.reached_at.push((marker, now));
            }
        }
    }

    fn finish(&mut self, session: ScrollSession) {
        let now = self.clock.now();

        let mut properties = Properties::new();
        properties.insert("screenName".into(), json!(self.config.screen_name));
        properties.insert("maxDepthReached".into(), json!(session.max_depth));
        properties.insert("depthsReached".into(), json!(session.reached));
        self.analytics
            .track_event(Event::new("scroll_session_complete").with_properties(properties));

        if self.config.track_time_at_depth {
            for (depth, started) in session.reached_at {
                let elapsed = now.saturating_sub(started);
                self.analytics.track_timing(
                    TimingEvent::new(
                        "Scroll Engagement",
                        format!("time_at_{depth}_percent"),
                        round_ms(elapsed.as_secs_f64() * 1000.0),
                    )
                    .with_label(self.config.screen_name.clone()),
                );
            }
        }
    }
}

impl<C, Props> Component<Props> for ScrollTracked<C>
where
    C: Component<Props>,
{
    fn render(&mut self, props: Props) {
        self.inner.render(props);

        if self.session.is_none() {
            let now = self.clock.now();
            self.session = Some(ScrollSession {
                mounted_at: now,
                ..ScrollSession::default()
            });
            // Sample the initial position once the debounce settles
            self.debouncer.trigger(now);
        }
    }

    fn handle(&mut self, event: HostEvent) {
        if self.session.is_some() {
            let now = self.clock.now();
            match event {
                HostEvent::Scroll => self.debouncer.trigger(now),
                HostEvent::Tick => {
                    if self.debouncer.poll(now) {
                        self.sample();
                    }
                }
            }
        }
        self.inner.handle(event);
    }

    fn unmount(&mut self) {
        if self.debouncer.cancel() {
            tracing::trace!(screen = %self.config.screen_name, "Dropped pending scroll sample on unmount");
        }
        if let Some(session) = self.session.take() {
            self.finish(session);
        }
        self.inner.unmount();
    }
}
