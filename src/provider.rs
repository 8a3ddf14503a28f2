//! Backend adapter abstraction.

use crate::error::ProviderError;
use crate::event::{Event, PageViewEvent, TimingEvent, UserIdentity};

use std::sync::Arc;

#[cfg(any(test, feature = "testing"))]
use spin::Mutex;

/// A translator from the common event vocabulary to one analytics backend.
///
/// Implement this trait to plug a backend into [`Analytics`](crate::Analytics).
/// Calls are fire-and-forget: an adapter hands the translated call to its
/// backend and returns without waiting on network I/O. Adapters know nothing
/// about each other or about the dispatch service.
///
/// # Example
///
/// ```rust
/// use oxide_track::{Event, PageViewEvent, Provider, ProviderError, TimingEvent, UserIdentity};
///
/// struct StdoutProvider;
///
/// impl Provider for StdoutProvider {
///     fn name(&self) -> &'static str { "stdout" }
///
///     fn track_event(&self, event: &Event) -> Result<(), ProviderError> {
///         println!("event {}", event.name);
///         Ok(())
///     }
///
///     fn track_page_view(&self, event: &PageViewEvent) -> Result<(), ProviderError> {
///         println!("page {}", event.screen_name);
///         Ok(())
///     }
///
///     fn track_timing(&self, event: &TimingEvent) -> Result<(), ProviderError> {
///         println!("timing {} {}ms", event.variable, event.duration_ms);
///         Ok(())
///     }
///
///     fn identify(&self, user: &UserIdentity) -> Result<(), ProviderError> {
///         println!("identify {}", user.user_id);
///         Ok(())
///     }
///
///     fn reset(&self) -> Result<(), ProviderError> {
///         Ok(())
///     }
/// }
/// ```
pub trait Provider: Send + Sync {
    /// Short backend name used in diagnostics.
    fn name(&self) -> &'static str;

    fn track_event(&self, event: &Event) -> Result<(), ProviderError>;

    fn track_page_view(&self, event: &PageViewEvent) -> Result<(), ProviderError>;

    fn track_timing(&self, event: &TimingEvent) -> Result<(), ProviderError>;

    fn identify(&self, user: &UserIdentity) -> Result<(), ProviderError>;

    /// Clear any backend-side session/user association.
    fn reset(&self) -> Result<(), ProviderError>;
}

impl<P: Provider + ?Sized> Provider for Arc<P> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn track_event(&self, event: &Event) -> Result<(), ProviderError> {
        (**self).track_event(event)
    }

    fn track_page_view(&self, event: &PageViewEvent) -> Result<(), ProviderError> {
        (**self).track_page_view(event)
    }

    fn track_timing(&self, event: &TimingEvent) -> Result<(), ProviderError> {
        (**self).track_timing(event)
    }

    fn identify(&self, user: &UserIdentity) -> Result<(), ProviderError> {
        (**self).identify(user)
    }

    fn reset(&self) -> Result<(), ProviderError> {
        (**self).reset()
    }
}

#[cfg(any(test, feature = "testing"))]
/// A call received by a [`TestProvider`].
#[derive(Clone, Debug, PartialEq)]
pub enum ProviderCall {
    Event(Event),
    PageView(PageViewEvent),
    Timing(TimingEvent),
    Identify(UserIdentity),
    Reset,
}

#[cfg(any(test, feature = "testing"))]
impl ProviderCall {
    pub fn as_event(&self) -> Option<&Event> {
        match self {
            ProviderCall::Event(event) => Some(event),
            _ => None,
        }
    }

    pub fn as_page_view(&self) -> Option<&PageViewEvent> {
        match self {
            ProviderCall::PageView(event) => Some(event),
            _ => None,
        }
    }

    pub fn as_timing(&self) -> Option<&TimingEvent> {
        match self {
            ProviderCall::Timing(event) => Some(event),
            _ => None,
        }
    }
}

#[cfg(any(test, feature = "testing"))]
/// Provider that captures every call for assertions.
///
/// Only available with the `testing` feature.
///
/// Clones share the same capture storage, so keep one handle for assertions
/// and register another with the service.
pub struct TestProvider {
    name: &'static str,
    calls: Arc<Mutex<Vec<ProviderCall>>>,
    failing: Arc<Mutex<bool>>,
}

#[cfg(any(test, feature = "testing"))]
impl Clone for TestProvider {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            calls: self.calls.clone(),
            failing: self.failing.clone(),
        }
    }
}

#[cfg(any(test, feature = "testing"))]
impl Default for TestProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "testing"))]
impl TestProvider {
    pub fn new() -> Self {
        Self::named("test")
    }

    pub fn named(name: &'static str) -> Self {
        Self {
            name,
            calls: Arc::new(Mutex::new(Vec::new())),
            failing: Arc::new(Mutex::new(false)),
        }
    }

    /// Make every subsequent call return [`ProviderError::Sdk`] without recording it.
    pub fn fail(&self, failing: bool) {
        *self.failing.lock() = failing;
    }

    pub fn count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Access the captured calls with a closure.
    pub fn with_calls<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Vec<ProviderCall>) -> R,
    {
        let calls = self.calls.lock();
        f(&calls)
    }

    /// Names of all captured events, in delivery order.
    pub fn event_names(&self) -> Vec<String> {
        self.with_calls(|calls| {
            calls
                .iter()
                .filter_map(ProviderCall::as_event)
                .map(|event| event.name.clone())
                .collect()
        })
    }

    /// Captured events with the given name.
    pub fn events_named(&self, name: &str) -> Vec<Event> {
        self.with_calls(|calls| {
            calls
                .iter()
                .filter_map(ProviderCall::as_event)
                .filter(|event| event.name == name)
                .cloned()
                .collect()
        })
    }

    pub fn page_views(&self) -> Vec<PageViewEvent> {
        self.with_calls(|calls| calls.iter().filter_map(ProviderCall::as_page_view).cloned().collect())
    }

    pub fn timings(&self) -> Vec<TimingEvent> {
        self.with_calls(|calls| calls.iter().filter_map(ProviderCall::as_timing).cloned().collect())
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: ProviderCall) -> Result<(), ProviderError> {
        if *self.failing.lock() {
            return Err(ProviderError::Sdk(format!("{} configured to fail", self.name)));
        }
        self.calls.lock().push(call);
        Ok(())
    }
}

#[cfg(any(test, feature = "testing"))]
impl Provider for TestProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn track_event(&self, event: &Event) -> Result<(), ProviderError> {
        self.record(ProviderCall::Event(event.clone()))
    }

    fn track_page_view(&self, event: &PageViewEvent) -> Result<(), ProviderError> {
        self.record(ProviderCall::PageView(event.clone()))
    }

    fn track_timing(&self, event: &TimingEvent) -> Result<(), ProviderError> {
        self.record(ProviderCall::Timing(event.clone()))
    }

    fn identify(&self, user: &UserIdentity) -> Result<(), ProviderError> {
        self.record(ProviderCall::Identify(user.clone()))
    }

    fn reset(&self) -> Result<(), ProviderError> {
        self.record(ProviderCall::Reset)
    }
}
