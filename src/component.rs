//! Component abstraction the instrumentation wrappers decorate.

#[cfg(any(test, feature = "testing"))]
use std::sync::Arc;
#[cfg(any(test, feature = "testing"))]
use spin::Mutex;

/// Lifecycle signals delivered by the host outside of rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostEvent {
    /// The page scroll position changed.
    Scroll,
    /// A scheduler tick; due timers fire on this signal.
    Tick,
}

/// A UI element: renders props and observes host lifecycle signals.
///
/// Implement this trait to integrate your UI element with the instrumentation
/// wrappers. The first [`render`](Self::render) mounts the element,
/// [`unmount`](Self::unmount) tears it down.
///
/// Wrappers implement `Component` themselves and forward every call to the
/// element they wrap, so they can be nested freely.
///
/// # Example
///
/// ```rust
/// use oxide_track::Component;
///
/// struct Props {
///     title: &'static str,
/// }
///
/// struct Heading;
///
/// impl Component<Props> for Heading {
///     fn render(&mut self, props: Props) {
///         println!("# {}", props.title);
///     }
/// }
/// ```
pub trait Component<Props> {
    /// Render the given props. The first call mounts the element.
    fn render(&mut self, props: Props);

    /// React to a host signal. Default implementation ignores it.
    fn handle(&mut self, _event: HostEvent) {}

    /// Tear down the element. Default implementation does nothing.
    fn unmount(&mut self) {}
}

impl<Props, C: Component<Props> + ?Sized> Component<Props> for Box<C> {
    fn render(&mut self, props: Props) {
        (**self).render(props);
    }

    fn handle(&mut self, event: HostEvent) {
        (**self).handle(event);
    }

    fn unmount(&mut self) {
        (**self).unmount();
    }
}

#[cfg(any(test, feature = "testing"))]
/// Test component that captures all rendered props for assertions.
///
/// Only available with the `testing` feature.
///
/// Clones share the same capture storage: wrap one clone, keep the other to
/// inspect renders, invoke captured callbacks, and check lifecycle calls.
///
/// # Example
///
/// ```rust
/// use oxide_track::{Component, TestComponent};
///
/// let component = TestComponent::<u32>::new();
/// let mut mounted = component.clone();
///
/// mounted.render(7);
/// mounted.unmount();
///
/// assert_eq!(component.count(), 1);
/// assert!(component.is_unmounted());
/// component.with_renders(|renders| assert_eq!(renders[0], 7));
/// ```
pub struct TestComponent<Props> {
    renders: Arc<Mutex<Vec<Props>>>,
    host_events: Arc<Mutex<Vec<HostEvent>>>,
    unmounted: Arc<Mutex<bool>>,
    on_render: Option<Arc<dyn Fn(&Props) + Send + Sync>>,
}

#[cfg(any(test, feature = "testing"))]
impl<Props> Clone for TestComponent<Props> {
    fn clone(&self) -> Self {
        Self {
            renders: self.renders.clone(),
            host_events: self.host_events.clone(),
            unmounted: self.unmounted.clone(),
            on_render: self.on_render.clone(),
        }
    }
}

#[cfg(any(test, feature = "testing"))]
impl<Props> Default for TestComponent<Props> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "testing"))]
impl<Props> TestComponent<Props> {
    pub fn new() -> Self {
        Self {
            renders: Arc::new(Mutex::new(Vec::new())),
            host_events: Arc::new(Mutex::new(Vec::new())),
            unmounted: Arc::new(Mutex::new(false)),
            on_render: None,
        }
    }

    /// Run `f` during every render, before the props are captured.
    ///
    /// Useful to simulate render cost by advancing a [`ManualClock`](crate::ManualClock).
    pub fn on_render(mut self, f: impl Fn(&Props) + Send + Sync + 'static) -> Self {
        self.on_render = Some(Arc::new(f));
        self
    }

    /// Get the number of renders that have occurred.
    pub fn count(&self) -> usize {
        self.renders.lock().len()
    }

    /// Access the captured renders with a closure.
    pub fn with_renders<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Vec<Props>) -> R,
    {
        let renders = self.renders.lock();
        f(&renders)
    }

    /// Host events forwarded to this component.
    pub fn host_events(&self) -> Vec<HostEvent> {
        self.host_events.lock().clone()
    }

    pub fn is_unmounted(&self) -> bool {
        *self.unmounted.lock()
    }
}

#[cfg(any(test, feature = "testing"))]
impl<Props> Component<Props> for TestComponent<Props> {
    fn render(&mut self, props: Props) {
        if let Some(on_render) = &self.on_render {
            on_render(&props);
        }
        self.renders.lock().push(props);
    }

    fn handle(&mut self, event: HostEvent) {
        self.host_events.lock().push(event);
    }

    fn unmount(&mut self) {
        *self.unmounted.lock() = true;
    }
}
