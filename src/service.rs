//! The dispatch service fanning events out to every registered provider.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::SystemTime;

use spin::Mutex;

use crate::config::AnalyticsConfig;
use crate::error::ProviderError;
use crate::event::{Event, PageViewEvent, TimingEvent, UserIdentity};
use crate::provider::Provider;

/// Deferred fan-out recorded before the first provider registered.
///
/// Runs against whatever providers are registered at flush time.
struct Deferred(Box<dyn FnOnce(&Analytics) + Send + 'static>);

impl Deferred {
    fn new(f: impl FnOnce(&Analytics) + Send + 'static) -> Self {
        Self(Box::new(f))
    }

    fn run(self, analytics: &Analytics) {
        (self.0)(analytics);
    }
}

struct State {
    providers: Vec<Arc<dyn Provider>>,
    enabled: bool,
    debug: bool,
    queue: Vec<Deferred>,
    initialized: bool,
    /// Set while the init queue drains; new calls keep queueing behind it.
    flushing: bool,
    shut_down: bool,
}

/// Single point of fan-out from application code to analytics backends.
///
/// Construct one per application, share it by `Arc` and pass it to every
/// instrumentation wrapper through a [`TrackingEnv`](crate::TrackingEnv).
///
/// Calls recorded before any provider is registered are queued and flushed,
/// in recording order, when the first provider registers. After that every
/// call fans out synchronously in registration order. A provider returning an
/// error or panicking is logged and skipped; the service itself never fails.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use oxide_track::{Analytics, Event, Provider, ProviderError};
/// # use oxide_track::{PageViewEvent, TimingEvent, UserIdentity};
/// # struct Backend;
/// # impl Provider for Backend {
/// #     fn name(&self) -> &'static str { "backend" }
/// #     fn track_event(&self, _: &Event) -> Result<(), ProviderError> { Ok(()) }
/// #     fn track_page_view(&self, _: &PageViewEvent) -> Result<(), ProviderError> { Ok(()) }
/// #     fn track_timing(&self, _: &TimingEvent) -> Result<(), ProviderError> { Ok(()) }
/// #     fn identify(&self, _: &UserIdentity) -> Result<(), ProviderError> { Ok(()) }
/// #     fn reset(&self) -> Result<(), ProviderError> { Ok(()) }
/// # }
///
/// let analytics = Arc::new(Analytics::new());
///
/// // Queued: nothing is registered yet
/// analytics.track_event(Event::new("app_opened"));
/// assert_eq!(analytics.pending(), 1);
///
/// // Flushes the queue into the new provider
/// analytics.register_provider(Backend);
/// assert_eq!(analytics.pending(), 0);
/// ```
pub struct Analytics {
    state: Mutex<State>,
}

impl Default for Analytics {
    fn default() -> Self {
        Self::new()
    }
}

impl Analytics {
    /// Create an enabled service with no providers.
    ///
    /// Per-event debug logging is on in debug builds.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                providers: Vec::new(),
                enabled: true,
                debug: cfg!(debug_assertions),
                queue: Vec::new(),
                initialized: false,
                flushing: false,
                shut_down: false,
            }),
        }
    }

    /// Create a service honoring the `enabled` and `debug` settings of `config`.
    pub fn from_config(config: &AnalyticsConfig) -> Self {
        let analytics = Self::new();
        analytics.set_enabled(config.enabled);
        analytics.set_debug(config.debug);
        analytics
    }

    /// Register a backend.
    ///
    /// The first registration marks the service initialized and flushes every
    /// queued call into the registered provider(s) in recording order.
    /// Ignored after [`shutdown`](Self::shutdown).
    pub fn register_provider(&self, provider: impl Provider + 'static) {
        let provider: Arc<dyn Provider> = Arc::new(provider);
        let name = provider.name();

        let flushed = {
            let mut state = self.state.lock();
            if state.shut_down {
                tracing::warn!(provider = name, "Ignoring provider registered after analytics shutdown");
                return;
            }
            state.providers.push(provider);
            if state.initialized {
                None
            } else {
                state.initialized = true;
                state.flushing = true;
                Some(core::mem::take(&mut state.queue))
            }
        };

        tracing::debug!(provider = name, first = flushed.is_some(), "Registered analytics provider");

        if let Some(queued) = flushed {
            self.flush(queued);
        }
    }

    /// Drain the init queue until it stays empty.
    ///
    /// Calls recorded during the drain, from other threads or from providers
    /// re-entering the service, are queued behind the pending ones.
    fn flush(&self, mut batch: Vec<Deferred>) {
        loop {
            for action in batch {
                action.run(self);
            }

            let mut state = self.state.lock();
            if state.queue.is_empty() || state.shut_down {
                state.flushing = false;
                return;
            }
            batch = core::mem::take(&mut state.queue);
            tracing::trace!(queued = batch.len(), "Flushing calls recorded during flush");
        }
    }

    /// Enable or disable event, page view and timing tracking.
    ///
    /// Calls made while disabled are dropped, not queued. `identify` and
    /// `reset` are unaffected.
    pub fn set_enabled(&self, enabled: bool) {
        let mut state = self.state.lock();
        if !state.shut_down {
            state.enabled = enabled;
        }
    }

    /// Toggle per-event debug logging.
    pub fn set_debug(&self, debug: bool) {
        self.state.lock().debug = debug;
    }

    pub fn is_enabled(&self) -> bool {
        self.state.lock().enabled
    }

    /// Whether at least one provider has ever been registered.
    pub fn is_initialized(&self) -> bool {
        self.state.lock().initialized
    }

    pub fn provider_count(&self) -> usize {
        self.state.lock().providers.len()
    }

    /// Number of calls waiting for the first provider.
    pub fn pending(&self) -> usize {
        self.state.lock().queue.len()
    }

    pub fn track_event(&self, event: Event) {
        let Some(debug) = self.tracking_gate() else {
            return;
        };

        let event = Event {
            timestamp: Some(event.timestamp.unwrap_or_else(SystemTime::now)),
            ..event
        };

        if debug {
            tracing::debug!(name = %event.name, properties = ?event.properties, "Analytics event");
        }

        self.execute_or_queue(Deferred::new(move |analytics| {
            analytics.fan_out("track_event", |provider| provider.track_event(&event));
        }));
    }

    pub fn track_page_view(&self, event: PageViewEvent) {
        let Some(debug) = self.tracking_gate() else {
            return;
        };

        if debug {
            tracing::debug!(screen = %event.screen_name, properties = ?event.properties, "Analytics page view");
        }

        self.execute_or_queue(Deferred::new(move |analytics| {
            analytics.fan_out("track_page_view", |provider| provider.track_page_view(&event));
        }));
    }

    pub fn track_timing(&self, event: TimingEvent) {
        let Some(debug) = self.tracking_gate() else {
            return;
        };

        if debug {
            tracing::debug!(
                category = %event.category,
                variable = %event.variable,
                duration_ms = event.duration_ms,
                "Analytics timing"
            );
        }

        self.execute_or_queue(Deferred::new(move |analytics| {
            analytics.fan_out("track_timing", |provider| provider.track_timing(&event));
        }));
    }

    /// Associate subsequent events with a user. Not gated by `enabled`.
    pub fn identify(&self, user: UserIdentity) {
        self.execute_or_queue(Deferred::new(move |analytics| {
            analytics.fan_out("identify", |provider| provider.identify(&user));
        }));
    }

    /// Clear backend-side user association on every registered provider.
    ///
    /// Runs immediately and is never queued.
    pub fn reset(&self) {
        self.fan_out("reset", |provider| provider.reset());
    }

    /// Tear the service down.
    ///
    /// Drops queued calls and registered providers. Every later call is a no-op.
    pub fn shutdown(&self) {
        let (providers, queue) = {
            let mut state = self.state.lock();
            state.shut_down = true;
            state.enabled = false;
            (
                core::mem::take(&mut state.providers),
                core::mem::take(&mut state.queue),
            )
        };

        if !queue.is_empty() {
            tracing::warn!(dropped = queue.len(), "Analytics shut down with queued calls");
        }
        tracing::debug!(providers = providers.len(), "Analytics shut down");
    }

    /// Returns the debug flag when tracking calls should proceed.
    fn tracking_gate(&self) -> Option<bool> {
        let state = self.state.lock();
        state.enabled.then_some(state.debug)
    }

    fn execute_or_queue(&self, action: Deferred) {
        let mut state = self.state.lock();
        if state.shut_down {
            return;
        }
        if state.initialized && !state.flushing {
            drop(state);
            action.run(self);
        } else {
            state.queue.push(action);
            tracing::trace!(pending = state.queue.len(), "Queued analytics call");
        }
    }

    /// Deliver one call to every provider, isolating failures.
    ///
    /// The provider list is snapshotted so providers run without the state lock held.
    fn fan_out<F>(&self, operation: &'static str, call: F)
    where
        F: Fn(&dyn Provider) -> Result<(), ProviderError>,
    {
        let providers = self.state.lock().providers.clone();

        for provider in &providers {
            match panic::catch_unwind(AssertUnwindSafe(|| call(provider.as_ref()))) {
                Ok(Ok(())) => {}
                Ok(Err(error)) => {
                    tracing::error!(
                        provider = provider.name(),
                        operation,
                        %error,
                        "Analytics provider call failed"
                    );
                }
                Err(payload) => {
                    tracing::error!(
                        provider = provider.name(),
                        operation,
                        panic = %panic_message(payload.as_ref()),
                        "Analytics provider panicked"
                    );
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
