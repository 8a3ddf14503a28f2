//! Render timing and mounted lifetime of an element.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::clock::Clock;
use crate::component::{Component, HostEvent};
use crate::env::TrackingEnv;
use crate::event::{round_ms, Event, Properties, TimingEvent};
use crate::service::Analytics;

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct PerformanceConfig {
    pub component_name: String,
    /// Renders faster than this are not reported. Defaults to one 60fps frame.
    #[serde(default = "default_threshold_ms")]
    pub threshold_ms: u64,
    /// Consider only every Nth render.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_true")]
    pub track_mount: bool,
    #[serde(default = "default_true")]
    pub track_update: bool,
}

fn default_threshold_ms() -> u64 {
    16
}

fn default_sample_rate() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

impl PerformanceConfig {
    pub fn new(component_name: impl Into<String>) -> Self {
        Self {
            component_name: component_name.into(),
            threshold_ms: default_threshold_ms(),
            sample_rate: default_sample_rate(),
            track_mount: true,
            track_update: true,
        }
    }

    pub fn threshold_ms(mut self, ms: u64) -> Self {
        self.threshold_ms = ms;
        self
    }

    pub fn sample_rate(mut self, every: u32) -> Self {
        self.sample_rate = every;
        self
    }

    pub fn track_mount(mut self, enabled: bool) -> Self {
        self.track_mount = enabled;
        self
    }

    pub fn track_update(mut self, enabled: bool) -> Self {
        self.track_update = enabled;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderPhase {
    Mount,
    Update,
}

impl RenderPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            RenderPhase::Mount => "mount",
            RenderPhase::Update => "update",
        }
    }
}

/// Measures every render of the wrapped element and reports slow ones.
///
/// The actual duration is the time spent in the wrapped element's render.
/// The base duration is the cost of the mount render, the element's full
/// un-memoized render cost.
pub struct PerformanceTracked<C> {
    inner: C,
    config: PerformanceConfig,
    analytics: Arc<Analytics>,
    clock: Arc<dyn Clock>,
    render_count: u64,
    mounted_at: Option<Duration>,
    base_duration: Duration,
}

impl<C> PerformanceTracked<C> {
    pub fn new(inner: C, mut config: PerformanceConfig, env: &TrackingEnv) -> Self {
        if config.sample_rate == 0 {
            tracing::warn!(component = %config.component_name, "sample_rate of 0 treated as 1");
            config.sample_rate = 1;
        }
        Self {
            inner,
            config,
            analytics: env.analytics.clone(),
            clock: env.clock.clone(),
            render_count: 0,
            mounted_at: None,
            base_duration: Duration::ZERO,
        }
    }

    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    fn on_render(&mut self, phase: RenderPhase, actual: Duration) {
        self.render_count += 1;

        if self.render_count % u64::from(self.config.sample_rate) != 0 {
            return;
        }

        match phase {
            RenderPhase::Mount if !self.config.track_mount => return,
            RenderPhase::Update if !self.config.track_update => return,
            _ => {}
        }

        let actual_ms = actual.as_secs_f64() * 1000.0;
        if actual_ms < self.config.threshold_ms as f64 {
            return;
        }

        self.analytics.track_timing(
            TimingEvent::new("Component Render", phase.as_str(), round_ms(actual_ms))
                .with_label(self.config.component_name.clone()),
        );

        let mut properties = Properties::new();
        properties.insert("component".into(), json!(self.config.component_name));
        properties.insert("phase".into(), json!(phase.as_str()));
        properties.insert("actualDuration".into(), json!(round_ms(actual_ms)));
        properties.insert(
            "baseDuration".into(),
            json!(round_ms(self.base_duration.as_secs_f64() * 1000.0)),
        );
        properties.insert("renderCount".into(), json!(self.render_count));
        self.analytics
            .track_event(Event::new("slow_render_detected").with_properties(properties));
    }
}

impl<C, Props> Component<Props> for PerformanceTracked<C>
where
    C: Component<Props>,
{
    fn render(&mut self, props: Props) {
        let phase = if self.mounted_at.is_none() {
            RenderPhase::Mount
        } else {
            RenderPhase::Update
        };

        let started = self.clock.now();
        self.inner.render(props);
        let finished = self.clock.now();
        let actual = finished.saturating_sub(started);

        if phase == RenderPhase::Mount {
            self.mounted_at = Some(finished);
            self.base_duration = actual;
        }

        self.on_render(phase, actual);
    }

    fn handle(&mut self, event: HostEvent) {
        self.inner.handle(event);
    }

    fn unmount(&mut self) {
        if let Some(mounted_at) = self.mounted_at.take() {
            let lifetime = self.clock.now().saturating_sub(mounted_at);
            self.analytics.track_timing(
                TimingEvent::new(
                    "Component Lifecycle",
                    "total_lifetime",
                    round_ms(lifetime.as_secs_f64() * 1000.0),
                )
                .with_label(self.config.component_name.clone()),
            );
        }
        self.render_count = 0;
        self.base_duration = Duration::ZERO;
        self.inner.unmount();
    }
}
