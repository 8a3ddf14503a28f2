//! Application-wide analytics context: global properties and session id.
//!
//! A context is entered for the current thread with
//! [`AnalyticsContext::enter`]; code below it reaches the context through
//! [`use_analytics`]. Calling the accessor outside an entered context is a
//! wiring bug and panics.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::{json, Value};
use spin::Mutex;

use crate::error::AnalyticsError;
use crate::event::{merge, Event, PageViewEvent, Properties};
use crate::service::Analytics;
use crate::session::{session_id, SessionStore};

thread_local! {
    static CURRENT: RefCell<Vec<Arc<AnalyticsContext>>> = const { RefCell::new(Vec::new()) };
}

/// Adds global properties and the session id to every event it forwards.
pub struct AnalyticsContext {
    analytics: Arc<Analytics>,
    session_id: String,
    global_properties: Mutex<Properties>,
}

impl AnalyticsContext {
    /// Create a context, reading or creating the session id in `store`.
    pub fn new(analytics: Arc<Analytics>, store: &dyn SessionStore) -> Arc<Self> {
        Arc::new(Self {
            analytics,
            session_id: session_id(store),
            global_properties: Mutex::new(Properties::new()),
        })
    }

    pub fn analytics(&self) -> &Arc<Analytics> {
        &self.analytics
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Set a property included in every event forwarded from now on.
    pub fn set_global_property(&self, key: impl Into<String>, value: Value) {
        self.global_properties.lock().insert(key.into(), value);
    }

    pub fn global_properties(&self) -> Properties {
        self.global_properties.lock().clone()
    }

    pub fn track_event(&self, event: Event) {
        let properties = self.enrich(event.properties.clone());
        self.analytics.track_event(Event {
            properties: Some(properties),
            ..event
        });
    }

    pub fn track_page_view(&self, event: PageViewEvent) {
        let properties = self.enrich(event.properties.clone());
        self.analytics.track_page_view(PageViewEvent {
            properties: Some(properties),
            ..event
        });
    }

    /// Make this context current for the calling thread until the guard drops.
    ///
    /// Scopes nest; dropping a guard removes only its own context, so the
    /// innermost context still entered stays current.
    pub fn enter(self: &Arc<Self>) -> ContextGuard {
        CURRENT.with(|stack| stack.borrow_mut().push(self.clone()));
        ContextGuard {
            context: self.clone(),
            _not_send: PhantomData,
        }
    }

    /// Globals, then the session id, then the event's own properties.
    fn enrich(&self, own: Option<Properties>) -> Properties {
        let mut properties = self.global_properties();
        properties.insert("sessionId".into(), json!(self.session_id));
        if let Some(own) = own {
            merge(&mut properties, own);
        }
        properties
    }
}

/// Keeps an [`AnalyticsContext`] current while alive. Tied to its thread.
#[must_use = "the context is only current while the guard is alive"]
pub struct ContextGuard {
    context: Arc<AnalyticsContext>,
    _not_send: PhantomData<*const ()>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        // Guards may drop out of order; remove this guard's own entry.
        CURRENT.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(index) = stack.iter().rposition(|entered| Arc::ptr_eq(entered, &self.context)) {
                stack.remove(index);
            }
        });
    }
}

/// The innermost entered context, or [`AnalyticsError::MissingContext`].
pub fn try_use_analytics() -> Result<Arc<AnalyticsContext>, AnalyticsError> {
    CURRENT
        .with(|stack| stack.borrow().last().cloned())
        .ok_or(AnalyticsError::MissingContext)
}

/// The innermost entered context.
///
/// # Panics
///
/// Panics if no [`AnalyticsContext`] is entered on this thread.
pub fn use_analytics() -> Arc<AnalyticsContext> {
    match try_use_analytics() {
        Ok(context) => context,
        Err(error) => panic!("use_analytics must be used within an AnalyticsContext: {error}"),
    }
}
