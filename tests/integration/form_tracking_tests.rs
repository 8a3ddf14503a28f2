use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use oxide_track::{Callback, Component, FormTracked, FormTrackingConfig, TestComponent};
use serde_json::{json, Value};

use super::{given_a_registered_provider, ApplicationFormProps, TrackingTest};

const APPLICATION_FIELDS: [&str; 7] = [
    "fullName",
    "email",
    "phone",
    "resume",
    "coverLetter",
    "linkedin",
    "startDate",
];

type ApplicationForm = FormTracked<TestComponent<ApplicationFormProps>>;

fn given_an_application_form(
    test: &TrackingTest,
    props: ApplicationFormProps,
) -> (ApplicationForm, TestComponent<ApplicationFormProps>) {
    let component = TestComponent::new();
    let mut form = FormTracked::new(
        component.clone(),
        FormTrackingConfig::new("Job Application").tracked_fields(APPLICATION_FIELDS),
        &test.env,
    );
    form.render(props);
    (form, component)
}

fn focus(component: &TestComponent<ApplicationFormProps>, field: &str) {
    component.with_renders(|renders| {
        renders[0].on_field_focus.as_ref().unwrap().call(field.to_string());
    });
}

fn blur(component: &TestComponent<ApplicationFormProps>, field: &str) {
    component.with_renders(|renders| {
        renders[0].on_field_blur.as_ref().unwrap().call(field.to_string());
    });
}

fn change(component: &TestComponent<ApplicationFormProps>, field: &str, value: Value) {
    component.with_renders(|renders| {
        renders[0]
            .on_field_change
            .as_ref()
            .unwrap()
            .call((field.to_string(), value));
    });
}

fn submit(component: &TestComponent<ApplicationFormProps>) {
    component.with_renders(|renders| {
        renders[0].on_submit.as_ref().unwrap().call(json!({ "email": "ada@example.com" }));
    });
}

#[test]
fn given_a_mount_should_emit_form_started_once() {
    let test = given_a_registered_provider();
    let (mut form, _) = given_an_application_form(&test, ApplicationFormProps::default());

    form.render(ApplicationFormProps::default());

    let started = test.provider.events_named("form_started");
    assert_eq!(started.len(), 1);
    assert_eq!(started[0].property("formName"), Some(&json!("Job Application")));
}

#[test]
fn given_missing_handlers_should_still_install_tracking_callbacks() {
    let test = given_a_registered_provider();
    let (_form, component) = given_an_application_form(&test, ApplicationFormProps::default());

    component.with_renders(|renders| {
        assert!(renders[0].on_submit.is_some());
        assert!(renders[0].on_field_change.is_some());
        assert!(renders[0].on_field_focus.is_some());
        assert!(renders[0].on_field_blur.is_some());
    });
}

#[test]
fn given_a_field_visit_should_report_focus_change_and_blur() {
    let test = given_a_registered_provider();
    let (_form, component) = given_an_application_form(&test, ApplicationFormProps::default());

    focus(&component, "email");
    change(&component, "email", json!("ada@example.com"));
    test.clock.advance_ms(1500);
    blur(&component, "email");
    focus(&component, "email");

    let focused = test.provider.events_named("form_field_focused");
    assert_eq!(focused.len(), 2);
    assert_eq!(focused[0].property("fieldName"), Some(&json!("email")));
    assert_eq!(focused[0].property("isFirstInteraction"), Some(&json!(true)));
    assert_eq!(focused[1].property("isFirstInteraction"), Some(&json!(false)));

    let changed = test.provider.events_named("form_field_changed");
    assert_eq!(changed.len(), 1);
    assert_eq!(changed[0].property("hasValue"), Some(&json!(true)));
    assert_eq!(changed[0].property("valueLength"), Some(&json!(15)));
    assert_eq!(changed[0].property("value"), None);

    let blurred = test.provider.events_named("form_field_blurred");
    assert_eq!(blurred[0].property("timeSpentMs"), Some(&json!(1500)));
}

#[test]
fn given_an_untracked_field_when_changed_should_not_report_the_change() {
    let test = given_a_registered_provider();
    let (_form, component) = given_an_application_form(&test, ApplicationFormProps::default());

    change(&component, "newsletter", json!(true));
    change(&component, "phone", json!(""));

    let changed = test.provider.events_named("form_field_changed");
    assert_eq!(changed.len(), 1);
    assert_eq!(changed[0].property("fieldName"), Some(&json!("phone")));
    assert_eq!(changed[0].property("hasValue"), Some(&json!(false)));
}

#[test]
fn given_a_submit_should_report_completion_and_delegate() {
    let test = given_a_registered_provider();
    let submitted = Arc::new(AtomicU32::new(0));

    let counter = submitted.clone();
    let props = ApplicationFormProps {
        on_submit: Some(Callback::new(move |_: Value| {
            counter.fetch_add(1, Ordering::SeqCst);
        })),
        ..ApplicationFormProps::default()
    };
    let (mut form, component) = given_an_application_form(&test, props);

    change(&component, "fullName", json!("Ada Lovelace"));
    change(&component, "email", json!("ada@example.com"));
    test.clock.advance_ms(4000);
    submit(&component);
    form.unmount();

    assert_eq!(submitted.load(Ordering::SeqCst), 1);

    let events = test.provider.events_named("form_submitted");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].property("completionTimeMs"), Some(&json!(4000)));
    assert_eq!(events[0].property("fieldsCompleted"), Some(&json!(2)));

    let timings = test.provider.timings();
    assert_eq!(timings.len(), 1);
    assert_eq!(timings[0].category, "Form Completion");
    assert_eq!(timings[0].variable, "time_to_submit");
    assert_eq!(timings[0].duration_ms, 4000);
    assert_eq!(timings[0].label.as_deref(), Some("Job Application"));

    assert!(test.provider.events_named("form_abandoned").is_empty());
}

#[test]
fn given_two_of_seven_fields_when_unmounted_without_submit_should_report_abandonment() {
    let test = given_a_registered_provider();
    let (mut form, component) = given_an_application_form(&test, ApplicationFormProps::default());

    focus(&component, "fullName");
    change(&component, "fullName", json!("Ada"));
    blur(&component, "fullName");
    change(&component, "email", json!("ada@example.com"));
    test.clock.advance_ms(9000);
    form.unmount();

    let abandoned = test.provider.events_named("form_abandoned");
    assert_eq!(abandoned.len(), 1);
    assert_eq!(abandoned[0].property("completionPercentage"), Some(&json!(29)));
    assert_eq!(abandoned[0].property("fieldsInteracted"), Some(&json!(["fullName", "email"])));
    assert_eq!(abandoned[0].property("timeSpent"), Some(&json!(9000)));
    assert!(component.is_unmounted());
}

#[test]
fn given_abandonment_tracking_off_when_unmounted_should_not_report() {
    let test = given_a_registered_provider();
    let mut form = FormTracked::new(
        TestComponent::<ApplicationFormProps>::new(),
        FormTrackingConfig::new("Job Application").track_abandonment(false),
        &test.env,
    );

    form.render(ApplicationFormProps::default());
    form.unmount();

    assert!(test.provider.events_named("form_abandoned").is_empty());
}

#[test]
fn given_field_interactions_off_should_report_only_lifecycle_events() {
    let test = given_a_registered_provider();
    let component = TestComponent::new();
    let mut form = FormTracked::new(
        component.clone(),
        FormTrackingConfig::new("Job Application")
            .tracked_fields(APPLICATION_FIELDS)
            .track_field_interactions(false),
        &test.env,
    );
    form.render(ApplicationFormProps::default());

    focus(&component, "email");
    change(&component, "email", json!("ada@example.com"));
    blur(&component, "email");
    form.unmount();

    assert_eq!(test.provider.event_names(), vec!["form_started", "form_abandoned"]);
    let abandoned = test.provider.events_named("form_abandoned");
    assert_eq!(abandoned[0].property("completionPercentage"), Some(&json!(14)));
}

#[test]
fn given_an_untracked_field_interaction_when_abandoned_should_count_it_towards_completion() {
    let test = given_a_registered_provider();
    let (mut form, component) = given_an_application_form(&test, ApplicationFormProps::default());

    change(&component, "email", json!("ada@example.com"));
    change(&component, "newsletter", json!(true));
    blur(&component, "referralCode");
    form.unmount();

    let abandoned = test.provider.events_named("form_abandoned");
    assert_eq!(abandoned.len(), 1);
    assert_eq!(
        abandoned[0].property("fieldsInteracted"),
        Some(&json!(["email", "newsletter", "referralCode"]))
    );
    // 3 of 7 tracked fields
    assert_eq!(abandoned[0].property("completionPercentage"), Some(&json!(43)));
}
