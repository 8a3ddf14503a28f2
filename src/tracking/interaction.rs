//! Interaction tracking: emit an event whenever a callback prop fires.

use std::sync::Arc;

use crate::callback::Callback;
use crate::component::{Component, HostEvent};
use crate::env::TrackingEnv;
use crate::event::{merge, Event, Properties};
use crate::service::Analytics;

type PropsFn<Props> = Arc<dyn Fn(&Props) -> Properties + Send + Sync>;
type ArgsFn<Args> = Arc<dyn Fn(&Args) -> Properties + Send + Sync>;
type Predicate<Args> = Arc<dyn Fn(&Args) -> bool + Send + Sync>;

/// How one callback prop is tracked.
///
/// `handler` selects the callback slot in the props; it is usually a
/// non-capturing closure such as `|props: &mut JobCardProps| &mut props.on_apply`.
pub struct EventMapping<Props, Args, Ret = ()> {
    event_name: Arc<str>,
    handler: fn(&mut Props) -> &mut Option<Callback<Args, Ret>>,
    props_properties: Option<PropsFn<Props>>,
    event_properties: Option<ArgsFn<Args>>,
    should_track: Option<Predicate<Args>>,
}

impl<Props, Args, Ret> EventMapping<Props, Args, Ret> {
    pub fn new(
        event_name: impl Into<String>,
        handler: fn(&mut Props) -> &mut Option<Callback<Args, Ret>>,
    ) -> Self {
        Self {
            event_name: Arc::from(event_name.into()),
            handler,
            props_properties: None,
            event_properties: None,
            should_track: None,
        }
    }

    /// Properties derived from the element's props at render time.
    pub fn props_properties(mut self, f: impl Fn(&Props) -> Properties + Send + Sync + 'static) -> Self {
        self.props_properties = Some(Arc::new(f));
        self
    }

    /// Properties derived from the callback's arguments. Wins over props properties.
    pub fn event_properties(mut self, f: impl Fn(&Args) -> Properties + Send + Sync + 'static) -> Self {
        self.event_properties = Some(Arc::new(f));
        self
    }

    /// Only emit when `f` returns true. The callback is always delegated to.
    pub fn should_track(mut self, f: impl Fn(&Args) -> bool + Send + Sync + 'static) -> Self {
        self.should_track = Some(Arc::new(f));
        self
    }
}

/// Type-erased [`EventMapping`] so mappings with different argument types
/// can live in one list.
pub trait HandlerBinding<Props> {
    /// Replace the mapped callback in `props` with a tracking one.
    fn bind(&self, props: &mut Props, analytics: &Arc<Analytics>);
}

impl<Props, Args, Ret> HandlerBinding<Props> for EventMapping<Props, Args, Ret>
where
    Args: 'static,
    Ret: 'static,
{
    fn bind(&self, props: &mut Props, analytics: &Arc<Analytics>) {
        let props_properties = self.props_properties.as_ref().map(|f| f(props));

        let slot = (self.handler)(props);
        let Some(original) = slot.take() else {
            return;
        };

        let analytics = analytics.clone();
        let event_name = self.event_name.clone();
        let event_properties = self.event_properties.clone();
        let should_track = self.should_track.clone();

        *slot = Some(Callback::new(move |args: Args| {
            let track = should_track.as_ref().map_or(true, |f| f(&args));

            if track {
                let mut properties = props_properties.clone().unwrap_or_default();
                if let Some(f) = &event_properties {
                    merge(&mut properties, f(&args));
                }
                analytics.track_event(Event::new(event_name.as_ref()).with_properties(properties));
            }

            original.call(args)
        }));
    }
}

/// Ordered set of [`EventMapping`]s for one element.
pub struct EventMappings<Props> {
    bindings: Vec<Box<dyn HandlerBinding<Props>>>,
}

impl<Props> Default for EventMappings<Props> {
    fn default() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }
}

impl<Props: 'static> EventMappings<Props> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<Args: 'static, Ret: 'static>(mut self, mapping: EventMapping<Props, Args, Ret>) -> Self {
        self.bindings.push(Box::new(mapping));
        self
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Wraps configured callback props so each call emits an event before
/// delegating to the original callback.
///
/// Callbacks that are absent from the props are left absent.
pub struct InteractionTracked<C, Props> {
    inner: C,
    mappings: EventMappings<Props>,
    analytics: Arc<Analytics>,
}

impl<C, Props> InteractionTracked<C, Props>
where
    C: Component<Props>,
{
    pub fn new(inner: C, mappings: EventMappings<Props>, env: &TrackingEnv) -> Self {
        Self {
            inner,
            mappings,
            analytics: env.analytics.clone(),
        }
    }
}

impl<C, Props> Component<Props> for InteractionTracked<C, Props>
where
    C: Component<Props>,
{
    fn render(&mut self, mut props: Props) {
        for binding in &self.mappings.bindings {
            binding.bind(&mut props, &self.analytics);
        }
        self.inner.render(props);
    }

    fn handle(&mut self, event: HostEvent) {
        self.inner.handle(event);
    }

    fn unmount(&mut self) {
        self.inner.unmount();
    }
}
