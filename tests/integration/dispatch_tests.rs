use std::sync::{Arc, Weak};

use oxide_track::{
    Analytics, AnalyticsConfig, Event, PageViewEvent, Provider, ProviderCall, ProviderError,
    TestProvider, TimingEvent, UserIdentity,
};

struct PanickingProvider;

impl Provider for PanickingProvider {
    fn name(&self) -> &'static str {
        "panicking"
    }

    fn track_event(&self, _event: &Event) -> Result<(), ProviderError> {
        panic!("backend exploded")
    }

    fn track_page_view(&self, _event: &PageViewEvent) -> Result<(), ProviderError> {
        panic!("backend exploded")
    }

    fn track_timing(&self, _event: &TimingEvent) -> Result<(), ProviderError> {
        panic!("backend exploded")
    }

    fn identify(&self, _user: &UserIdentity) -> Result<(), ProviderError> {
        panic!("backend exploded")
    }

    fn reset(&self) -> Result<(), ProviderError> {
        panic!("backend exploded")
    }
}

/// Records through `recorder` and echoes `first` back into the service.
struct EchoingProvider {
    analytics: Weak<Analytics>,
    recorder: TestProvider,
}

impl Provider for EchoingProvider {
    fn name(&self) -> &'static str {
        "echoing"
    }

    fn track_event(&self, event: &Event) -> Result<(), ProviderError> {
        self.recorder.track_event(event)?;
        if event.name == "first" {
            if let Some(analytics) = self.analytics.upgrade() {
                analytics.track_event(Event::new("echo"));
            }
        }
        Ok(())
    }

    fn track_page_view(&self, event: &PageViewEvent) -> Result<(), ProviderError> {
        self.recorder.track_page_view(event)
    }

    fn track_timing(&self, event: &TimingEvent) -> Result<(), ProviderError> {
        self.recorder.track_timing(event)
    }

    fn identify(&self, user: &UserIdentity) -> Result<(), ProviderError> {
        self.recorder.identify(user)
    }

    fn reset(&self) -> Result<(), ProviderError> {
        self.recorder.reset()
    }
}

#[test]
fn given_calls_before_registration_when_first_provider_registers_should_flush_in_order() {
    let analytics = Analytics::new();
    let provider = TestProvider::new();

    analytics.track_event(Event::new("app_opened"));
    analytics.track_page_view(PageViewEvent::new("Home"));
    analytics.identify(UserIdentity::new("u-1"));
    analytics.track_timing(TimingEvent::new("Boot", "first_paint", 120));
    analytics.track_event(Event::new("search_started"));

    assert_eq!(analytics.pending(), 5);
    assert!(!analytics.is_initialized());

    analytics.register_provider(provider.clone());

    assert_eq!(analytics.pending(), 0);
    assert!(analytics.is_initialized());
    provider.with_calls(|calls| {
        assert_eq!(calls.len(), 5);
        assert_eq!(calls[0].as_event().map(|e| e.name.as_str()), Some("app_opened"));
        assert_eq!(calls[1].as_page_view().map(|p| p.screen_name.as_str()), Some("Home"));
        assert!(matches!(&calls[2], ProviderCall::Identify(user) if user.user_id == "u-1"));
        assert_eq!(calls[3].as_timing().map(|t| t.duration_ms), Some(120));
        assert_eq!(calls[4].as_event().map(|e| e.name.as_str()), Some("search_started"));
    });
}

#[test]
fn given_a_provider_tracking_during_the_flush_should_deliver_its_call_after_the_queue() {
    let analytics = Arc::new(Analytics::new());
    let recorder = TestProvider::new();

    analytics.track_event(Event::new("first"));
    analytics.track_event(Event::new("second"));
    analytics.register_provider(EchoingProvider {
        analytics: Arc::downgrade(&analytics),
        recorder: recorder.clone(),
    });

    assert_eq!(recorder.event_names(), vec!["first", "second", "echo"]);
    assert_eq!(analytics.pending(), 0);

    analytics.track_event(Event::new("live"));
    assert_eq!(recorder.event_names(), vec!["first", "second", "echo", "live"]);
}

#[test]
fn given_a_flushed_queue_when_second_provider_registers_should_not_replay() {
    let analytics = Analytics::new();
    let first = TestProvider::named("first");
    let second = TestProvider::named("second");

    analytics.track_event(Event::new("queued"));
    analytics.register_provider(first.clone());
    analytics.register_provider(second.clone());

    assert_eq!(first.event_names(), vec!["queued"]);
    assert_eq!(second.count(), 0);

    analytics.track_event(Event::new("live"));

    assert_eq!(first.event_names(), vec!["queued", "live"]);
    assert_eq!(second.event_names(), vec!["live"]);
}

#[test]
fn given_analytics_disabled_when_tracking_should_neither_deliver_nor_queue() {
    let analytics = Analytics::new();
    let provider = TestProvider::new();
    analytics.set_enabled(false);

    analytics.track_event(Event::new("hidden"));
    analytics.track_page_view(PageViewEvent::new("Hidden"));
    analytics.track_timing(TimingEvent::new("Hidden", "x", 1));

    assert_eq!(analytics.pending(), 0);

    analytics.register_provider(provider.clone());
    analytics.track_event(Event::new("still_hidden"));

    assert_eq!(provider.count(), 0);
}

#[test]
fn given_analytics_disabled_when_identifying_should_still_deliver() {
    let analytics = Analytics::new();
    let provider = TestProvider::new();
    analytics.register_provider(provider.clone());
    analytics.set_enabled(false);

    analytics.identify(UserIdentity::new("u-9"));
    analytics.reset();

    provider.with_calls(|calls| {
        assert_eq!(calls.len(), 2);
        assert!(matches!(&calls[0], ProviderCall::Identify(user) if user.user_id == "u-9"));
        assert_eq!(calls[1], ProviderCall::Reset);
    });
}

#[test]
fn given_re_enabled_analytics_when_tracking_should_deliver_again() {
    let analytics = Analytics::new();
    let provider = TestProvider::new();
    analytics.register_provider(provider.clone());

    analytics.set_enabled(false);
    analytics.track_event(Event::new("dropped"));
    analytics.set_enabled(true);
    analytics.track_event(Event::new("kept"));

    assert_eq!(provider.event_names(), vec!["kept"]);
}

#[test]
fn given_one_failing_provider_of_three_when_tracking_should_reach_the_others() {
    let analytics = Analytics::new();
    let first = TestProvider::named("first");
    let failing = TestProvider::named("failing");
    let last = TestProvider::named("last");
    failing.fail(true);

    analytics.register_provider(first.clone());
    analytics.register_provider(failing.clone());
    analytics.register_provider(last.clone());

    analytics.track_event(Event::new("job_viewed"));

    assert_eq!(first.event_names(), vec!["job_viewed"]);
    assert_eq!(failing.count(), 0);
    assert_eq!(last.event_names(), vec!["job_viewed"]);
}

#[test]
fn given_a_panicking_provider_when_tracking_should_reach_later_providers() {
    let analytics = Analytics::new();
    let survivor = TestProvider::new();

    analytics.register_provider(PanickingProvider);
    analytics.register_provider(survivor.clone());

    analytics.track_event(Event::new("job_viewed"));
    analytics.track_page_view(PageViewEvent::new("Job Details"));
    analytics.track_timing(TimingEvent::new("Render", "mount", 3));
    analytics.identify(UserIdentity::new("u-1"));
    analytics.reset();

    assert_eq!(survivor.count(), 5);
}

#[test]
fn given_reset_before_registration_should_not_be_queued() {
    let analytics = Analytics::new();
    let provider = TestProvider::new();

    analytics.reset();
    assert_eq!(analytics.pending(), 0);

    analytics.register_provider(provider.clone());
    assert_eq!(provider.count(), 0);
}

#[test]
fn given_shutdown_should_drop_queue_and_ignore_later_calls() {
    let analytics = Analytics::new();
    let provider = TestProvider::new();

    analytics.track_event(Event::new("never_sent"));
    analytics.shutdown();

    assert_eq!(analytics.pending(), 0);
    assert!(!analytics.is_enabled());

    analytics.register_provider(provider.clone());
    analytics.identify(UserIdentity::new("u-1"));
    analytics.track_event(Event::new("after_shutdown"));

    assert_eq!(analytics.provider_count(), 0);
    assert_eq!(provider.count(), 0);
}

#[test]
fn given_a_disabled_config_when_building_analytics_should_start_disabled() {
    let config = AnalyticsConfig::from_toml_str("enabled = false").unwrap();
    let analytics = Analytics::from_config(&config);
    let provider = TestProvider::new();
    analytics.register_provider(provider.clone());

    analytics.track_event(Event::new("hidden"));

    assert!(!analytics.is_enabled());
    assert_eq!(provider.count(), 0);
}

#[test]
fn given_analytics_shared_across_threads_when_tracking_should_deliver_every_event() {
    let analytics = Arc::new(Analytics::new());
    let provider = TestProvider::new();
    analytics.register_provider(provider.clone());

    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let analytics = analytics.clone();
            std::thread::spawn(move || {
                for index in 0..25 {
                    analytics.track_event(Event::new(format!("worker_{worker}_{index}")));
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(provider.count(), 100);
}
