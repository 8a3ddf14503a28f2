use std::sync::Arc;

use oxide_track::{
    session_id, try_use_analytics, use_analytics, Analytics, AnalyticsContext, AnalyticsError, Event,
    MemorySessionStore, PageViewEvent, SessionStore, TestProvider, SESSION_ID_KEY,
};
use serde_json::json;

use super::properties;

fn given_a_context() -> (Arc<AnalyticsContext>, TestProvider) {
    let analytics = Arc::new(Analytics::new());
    let provider = TestProvider::new();
    analytics.register_provider(provider.clone());
    (AnalyticsContext::new(analytics, &MemorySessionStore::new()), provider)
}

#[test]
fn given_no_entered_context_should_report_it_missing() {
    assert!(matches!(try_use_analytics(), Err(AnalyticsError::MissingContext)));
}

#[test]
#[should_panic(expected = "use_analytics must be used within an AnalyticsContext")]
fn given_no_entered_context_when_using_analytics_should_panic() {
    let _ = use_analytics();
}

#[test]
fn given_an_entered_context_should_enrich_events_with_globals_and_session() {
    let (context, provider) = given_a_context();
    context.set_global_property("app", json!("jobs-web"));
    context.set_global_property("source", json!("global"));

    let _guard = context.enter();
    use_analytics().track_event(
        Event::new("job_saved").with_properties(properties(&[("source", json!("card"))])),
    );

    let events = provider.events_named("job_saved");
    assert_eq!(events[0].property("app"), Some(&json!("jobs-web")));
    assert_eq!(events[0].property("source"), Some(&json!("card")));
    assert_eq!(events[0].property("sessionId"), Some(&json!(context.session_id())));
}

#[test]
fn given_an_entered_context_should_enrich_page_views() {
    let (context, provider) = given_a_context();
    context.set_global_property("locale", json!("en-GB"));

    let _guard = context.enter();
    use_analytics().track_page_view(PageViewEvent::new("Saved Jobs"));

    let views = provider.page_views();
    assert_eq!(views[0].property("locale"), Some(&json!("en-GB")));
    assert!(views[0].property("sessionId").is_some());
}

#[test]
fn given_nested_contexts_when_inner_guard_drops_should_restore_outer() {
    let (outer, _) = given_a_context();
    let (inner, _) = given_a_context();

    let _outer_guard = outer.enter();
    {
        let _inner_guard = inner.enter();
        assert!(Arc::ptr_eq(&use_analytics(), &inner));
    }
    assert!(Arc::ptr_eq(&use_analytics(), &outer));
}

#[test]
fn given_guards_dropped_out_of_order_should_keep_the_inner_context_current() {
    let (outer, _) = given_a_context();
    let (inner, _) = given_a_context();

    let outer_guard = outer.enter();
    let inner_guard = inner.enter();

    drop(outer_guard);
    assert!(Arc::ptr_eq(&use_analytics(), &inner));

    drop(inner_guard);
    assert!(try_use_analytics().is_err());
}

#[test]
fn given_a_dropped_guard_should_leave_no_context() {
    let (context, _) = given_a_context();

    drop(context.enter());

    assert!(try_use_analytics().is_err());
}

#[test]
fn given_a_shared_session_store_should_reuse_the_session_id() {
    let store = MemorySessionStore::new();
    let analytics = Arc::new(Analytics::new());

    let first = AnalyticsContext::new(analytics.clone(), &store);
    let second = AnalyticsContext::new(analytics, &store);

    assert_eq!(first.session_id(), second.session_id());
    assert_eq!(store.get(SESSION_ID_KEY).as_deref(), Some(first.session_id()));
    assert_eq!(session_id(&store), first.session_id());
}
