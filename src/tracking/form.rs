//! Form lifecycle tracking: start, field interaction, submit and abandonment.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use spin::Mutex;

use crate::callback::Callback;
use crate::clock::Clock;
use crate::component::{Component, HostEvent};
use crate::env::TrackingEnv;
use crate::event::{round_ms, Event, Properties, TimingEvent};
use crate::service::Analytics;

/// Callback slots a form element exposes to [`FormTracked`].
pub trait FormHandlers {
    fn on_submit(&mut self) -> &mut Option<Callback<Value>>;

    /// Called with `(field_name, value)`.
    fn on_field_change(&mut self) -> &mut Option<Callback<(String, Value)>>;

    fn on_field_focus(&mut self) -> &mut Option<Callback<String>>;

    fn on_field_blur(&mut self) -> &mut Option<Callback<String>>;
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct FormTrackingConfig {
    pub form_name: String,
    #[serde(default = "default_true")]
    pub track_field_interactions: bool,
    #[serde(default = "default_true")]
    pub track_abandonment: bool,
    #[serde(default = "default_true")]
    pub track_completion_time: bool,
    /// Fields whose changes are reported and which completion is measured against.
    #[serde(default)]
    pub tracked_fields: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl FormTrackingConfig {
    pub fn new(form_name: impl Into<String>) -> Self {
        Self {
            form_name: form_name.into(),
            track_field_interactions: true,
            track_abandonment: true,
            track_completion_time: true,
            tracked_fields: Vec::new(),
        }
    }

    pub fn tracked_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tracked_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn track_field_interactions(mut self, enabled: bool) -> Self {
        self.track_field_interactions = enabled;
        self
    }

    pub fn track_abandonment(mut self, enabled: bool) -> Self {
        self.track_abandonment = enabled;
        self
    }

    pub fn track_completion_time(mut self, enabled: bool) -> Self {
        self.track_completion_time = enabled;
        self
    }

    fn is_tracked(&self, field: &str) -> bool {
        self.tracked_fields.iter().any(|tracked| tracked == field)
    }
}

#[derive(Debug, Default)]
struct FormSession {
    started_at: Duration,
    interacted: Vec<String>,
    focused_at: HashMap<String, Duration>,
    submitted: bool,
}

impl FormSession {
    fn started(now: Duration) -> Self {
        Self {
            started_at: now,
            ..Self::default()
        }
    }

    fn interact(&mut self, field: &str) {
        if !self.interacted.iter().any(|seen| seen == field) {
            self.interacted.push(field.to_string());
        }
    }

    /// Interacted fields over tracked fields, rounded to a whole percent.
    ///
    /// Zero when no fields are tracked.
    fn completion_percentage(&self, config: &FormTrackingConfig) -> u64 {
        if config.tracked_fields.is_empty() {
            return 0;
        }
        (self.interacted.len() as f64 / config.tracked_fields.len() as f64 * 100.0).round() as u64
    }
}

/// Shared between the wrapper and the callbacks it installs into props.
struct FormTracker {
    config: FormTrackingConfig,
    analytics: Arc<Analytics>,
    clock: Arc<dyn Clock>,
    session: Mutex<FormSession>,
}

impl FormTracker {
    fn elapsed_ms(&self, since: Duration) -> u64 {
        round_ms(self.clock.now().saturating_sub(since).as_secs_f64() * 1000.0)
    }

    fn emit(&self, name: &str, mut properties: Properties) {
        let mut event_properties = Properties::new();
        event_properties.insert("formName".into(), json!(self.config.form_name));
        event_properties.append(&mut properties);
        self.analytics
            .track_event(Event::new(name).with_properties(event_properties));
    }

    fn submitted(&self) {
        let (completion_ms, fields_completed) = {
            let mut session = self.session.lock();
            session.submitted = true;
            (self.elapsed_ms(session.started_at), session.interacted.len())
        };

        let mut properties = Properties::new();
        properties.insert("completionTimeMs".into(), json!(completion_ms));
        properties.insert("fieldsCompleted".into(), json!(fields_completed));
        self.emit("form_submitted", properties);

        if self.config.track_completion_time {
            self.analytics.track_timing(
                TimingEvent::new("Form Completion", "time_to_submit", completion_ms)
                    .with_label(self.config.form_name.clone()),
            );
        }
    }

    fn focused(&self, field: &str) {
        if !self.config.track_field_interactions {
            return;
        }

        let first_interaction = {
            let mut session = self.session.lock();
            session.focused_at.insert(field.to_string(), self.clock.now());
            !session.interacted.iter().any(|seen| seen == field)
        };

        let mut properties = Properties::new();
        properties.insert("fieldName".into(), json!(field));
        properties.insert("isFirstInteraction".into(), json!(first_interaction));
        self.emit("form_field_focused", properties);
    }

    fn blurred(&self, field: &str) {
        let time_spent_ms = {
            let mut session = self.session.lock();
            session.interact(field);
            session
                .focused_at
                .get(field)
                .map_or(0, |focused| self.elapsed_ms(*focused))
        };

        if self.config.track_field_interactions {
            let mut properties = Properties::new();
            properties.insert("fieldName".into(), json!(field));
            properties.insert("timeSpentMs".into(), json!(time_spent_ms));
            self.emit("form_field_blurred", properties);
        }
    }

    fn changed(&self, field: &str, value: &Value) {
        self.session.lock().interact(field);

        if self.config.track_field_interactions && self.config.is_tracked(field) {
            // Only the shape of the value is reported, never the value
            let mut properties = Properties::new();
            properties.insert("fieldName".into(), json!(field));
            properties.insert("hasValue".into(), json!(is_truthy(value)));
            if let Value::String(text) = value {
                properties.insert("valueLength".into(), json!(text.chars().count()));
            }
            self.emit("form_field_changed", properties);
        }
    }

    fn abandoned(&self) {
        let session = core::mem::take(&mut *self.session.lock());
        if !self.config.track_abandonment || session.submitted {
            return;
        }

        let mut properties = Properties::new();
        properties.insert("timeSpent".into(), json!(self.elapsed_ms(session.started_at)));
        properties.insert("fieldsInteracted".into(), json!(session.interacted));
        properties.insert(
            "completionPercentage".into(),
            json!(session.completion_percentage(&self.config)),
        );
        self.emit("form_abandoned", properties);
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Tracks a form from mount to submit or abandonment.
///
/// Installs its own submit/focus/blur/change callbacks into the props; each
/// records the interaction and then calls the original callback, if any.
pub struct FormTracked<C> {
    inner: C,
    tracker: Arc<FormTracker>,
    mounted: bool,
}

impl<C> FormTracked<C> {
    pub fn new(inner: C, config: FormTrackingConfig, env: &TrackingEnv) -> Self {
        Self {
            inner,
            tracker: Arc::new(FormTracker {
                config,
                analytics: env.analytics.clone(),
                clock: env.clock.clone(),
                session: Mutex::new(FormSession::default()),
            }),
            mounted: false,
        }
    }

    fn install<Props: FormHandlers>(&self, props: &mut Props) {
        let slot = props.on_submit();
        let original = slot.take();
        let tracker = self.tracker.clone();
        *slot = Some(Callback::new(move |data: Value| {
            tracker.submitted();
            if let Some(original) = &original {
                original.call(data);
            }
        }));

        let slot = props.on_field_focus();
        let original = slot.take();
        let tracker = self.tracker.clone();
        *slot = Some(Callback::new(move |field: String| {
            tracker.focused(&field);
            if let Some(original) = &original {
                original.call(field);
            }
        }));

        let slot = props.on_field_blur();
        let original = slot.take();
        let tracker = self.tracker.clone();
        *slot = Some(Callback::new(move |field: String| {
            tracker.blurred(&field);
            if let Some(original) = &original {
                original.call(field);
            }
        }));

        let slot = props.on_field_change();
        let original = slot.take();
        let tracker = self.tracker.clone();
        *slot = Some(Callback::new(move |(field, value): (String, Value)| {
            tracker.changed(&field, &value);
            if let Some(original) = &original {
                original.call((field, value));
            }
        }));
    }
}

impl<C, Props> Component<Props> for FormTracked<C>
where
    C: Component<Props>,
    Props: FormHandlers,
{
    fn render(&mut self, mut props: Props) {
        if !self.mounted {
            *self.tracker.session.lock() = FormSession::started(self.tracker.clock.now());
        }

        self.install(&mut props);
        self.inner.render(props);

        if !self.mounted {
            self.mounted = true;
            self.tracker.emit("form_started", Properties::new());
        }
    }

    fn handle(&mut self, event: HostEvent) {
        self.inner.handle(event);
    }

    fn unmount(&mut self) {
        if self.mounted {
            self.mounted = false;
            self.tracker.abandoned();
        }
        self.inner.unmount();
    }
}
