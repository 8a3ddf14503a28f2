//! Page-view tracking on mount and on watched prop changes.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::component::{Component, HostEvent};
use crate::env::{Navigation, TrackingEnv};
use crate::event::{merge, PageViewEvent, Properties};
use crate::service::Analytics;

type PropsFn<Props> = Arc<dyn Fn(&Props) -> Properties + Send + Sync>;
type Extractor<Props> = Arc<dyn Fn(&Props) -> Value + Send + Sync>;

pub struct PageTrackingConfig<Props> {
    screen_name: String,
    properties: Option<PropsFn<Props>>,
    track_on_props_change: bool,
    dependencies: Vec<(String, Extractor<Props>)>,
}

impl<Props> PageTrackingConfig<Props> {
    pub fn new(screen_name: impl Into<String>) -> Self {
        Self {
            screen_name: screen_name.into(),
            properties: None,
            track_on_props_change: false,
            dependencies: Vec::new(),
        }
    }

    /// Properties derived from the element's props, included in every page view.
    pub fn properties(mut self, f: impl Fn(&Props) -> Properties + Send + Sync + 'static) -> Self {
        self.properties = Some(Arc::new(f));
        self
    }

    /// Re-emit a revisit page view when a watched prop changes.
    pub fn track_on_props_change(mut self, enabled: bool) -> Self {
        self.track_on_props_change = enabled;
        self
    }

    /// Watch one prop, compared by value across renders.
    pub fn watch(mut self, name: impl Into<String>, f: impl Fn(&Props) -> Value + Send + Sync + 'static) -> Self {
        self.dependencies.push((name.into(), Arc::new(f)));
        self
    }

    pub fn screen_name(&self) -> &str {
        &self.screen_name
    }
}

/// Emits a page view on mount, enriched with the current route and referrer.
pub struct PageTracked<C, Props> {
    inner: C,
    config: PageTrackingConfig<Props>,
    analytics: Arc<Analytics>,
    navigation: Arc<dyn Navigation>,
    has_tracked_mount: bool,
    previous: Vec<Value>,
}

impl<C, Props> PageTracked<C, Props>
where
    C: Component<Props>,
{
    pub fn new(inner: C, config: PageTrackingConfig<Props>, env: &TrackingEnv) -> Self {
        Self {
            inner,
            config,
            analytics: env.analytics.clone(),
            navigation: env.navigation.clone(),
            has_tracked_mount: false,
            previous: Vec::new(),
        }
    }

    fn properties(&self, props: &Props) -> Properties {
        let mut properties = self
            .config
            .properties
            .as_ref()
            .map(|f| f(props))
            .unwrap_or_default();

        let location = self.navigation.location();
        let mut route = Properties::new();
        route.insert("path".into(), json!(location.pathname));
        route.insert("search".into(), json!(location.search));
        route.insert("referrer".into(), json!(self.navigation.referrer()));
        merge(&mut properties, route);

        properties
    }

    fn changed_dependency(&self, current: &[Value]) -> Option<&str> {
        self.config
            .dependencies
            .iter()
            .zip(current.iter().zip(&self.previous))
            .find(|(_, (now, before))| now != before)
            .map(|((name, _), _)| name.as_str())
    }
}

impl<C, Props> Component<Props> for PageTracked<C, Props>
where
    C: Component<Props>,
{
    fn render(&mut self, props: Props) {
        let current: Vec<Value> = self.config.dependencies.iter().map(|(_, f)| f(&props)).collect();

        let is_revisit = if !self.has_tracked_mount {
            Some(false)
        } else if self.config.track_on_props_change {
            self.changed_dependency(&current).map(|name| {
                tracing::trace!(screen = %self.config.screen_name, dependency = name, "Page dependency changed");
                true
            })
        } else {
            None
        };

        let properties = is_revisit.map(|_| self.properties(&props));

        self.inner.render(props);

        if let (Some(is_revisit), Some(mut properties)) = (is_revisit, properties) {
            if is_revisit {
                properties.insert("isRevisit".into(), Value::Bool(true));
            }
            self.analytics.track_page_view(
                PageViewEvent::new(self.config.screen_name.clone()).with_properties(properties),
            );
            self.has_tracked_mount = true;
            self.previous = current;
        }
    }

    fn handle(&mut self, event: HostEvent) {
        self.inner.handle(event);
    }

    fn unmount(&mut self) {
        self.has_tracked_mount = false;
        self.previous.clear();
        self.inner.unmount();
    }
}
