//! Loading a feed through the whole pipeline
mod scenarii;

use week_planner::config::{ProxyStrategy, TransportConfig};
use week_planner::ical::{manual, parser, preprocess};
use week_planner::store::MemoryStore;
use week_planner::transport::TransportResolver;
use week_planner::{Error, Provider};

use scenarii::{feed_url, test_provider, Reply, ScriptedFetcher, FEED_URL, FEED_WITH_HTML_DESCRIPTION, HTML_PAGE, SCHOOL_FEED};


#[tokio::test]
async fn test_load_school_feed() {
    let _ = env_logger::builder().is_test(true).try_init();

    let provider = test_provider(SCHOOL_FEED);
    let events = provider.load_unified_data(&feed_url()).await.unwrap();
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|e| e.is_imported()));

    let first = events[0].as_imported().unwrap();
    assert_eq!(first.id(), "0633de27-8c32-42be-bcb8-63bc879c6185");
    assert_eq!(first.teacher(), "J. Doe");
    assert_eq!(first.class(), "5A");
    assert_eq!(first.subject(), "Wiskunde");
    assert_eq!(first.event_type(), "Grote toets");
    assert_eq!(first.location(), "Lokaal 12");
    assert_eq!(week_planner::ical::to_iso_string(first.start()), "2024-01-15T09:30:00.000Z");
    assert!(first.is_deadline());

    // No space after the label
    let second = events[1].as_imported().unwrap();
    assert_eq!(second.subject(), "Frans");
    assert_eq!(second.event_type(), "Huiswerk");

    // No UID: positional id of the manual strategy, and no DTEND
    let third = events[2].as_imported().unwrap();
    assert_eq!(third.id(), "manual-event-3");
    assert_eq!(third.event_type(), "Taak");
}

#[tokio::test]
async fn test_both_strategies_find_every_event() {
    let _ = env_logger::builder().is_test(true).try_init();

    let text = preprocess::preprocess(SCHOOL_FEED).unwrap();
    let manual_events = manual::extract(&text).unwrap();
    let structured_events = parser::extract(&text).unwrap();
    assert_eq!(manual_events.len(), 3);
    assert_eq!(structured_events.len(), 3);
    assert_eq!(structured_events[2].id, "event-2");

    for (m, s) in manual_events.iter().zip(structured_events.iter()) {
        assert_eq!(m.summary, s.summary);
        assert_eq!(m.start, s.start);
    }
}

#[tokio::test]
async fn test_two_loads_are_equal() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut provider = test_provider(SCHOOL_FEED);
    provider.add_task(week_planner::NewTask::with_summary("Revise")).unwrap();

    let first = provider.load_unified_data(&feed_url()).await.unwrap();
    let second = provider.load_unified_data(&feed_url()).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(serde_json::to_string(&first).unwrap(), serde_json::to_string(&second).unwrap());
}

#[tokio::test]
async fn test_html_is_rejected() {
    let _ = env_logger::builder().is_test(true).try_init();

    let provider = test_provider(HTML_PAGE);
    let err = provider.load_unified_data(&feed_url()).await.unwrap_err();
    assert!(matches!(err, Error::Format));
    assert!(err.is_load_failure());
}

#[tokio::test]
async fn test_html_description_is_not_an_html_page() {
    let _ = env_logger::builder().is_test(true).try_init();

    let provider = test_provider(FEED_WITH_HTML_DESCRIPTION);
    let events = provider.load_unified_data(&feed_url()).await.unwrap();
    assert_eq!(events.len(), 1);

    let event = events[0].as_imported().unwrap();
    assert_eq!(event.id(), "html-description-1");
    assert_eq!(event.summary(), "Spreekbeurt");
    assert_eq!(event.subject(), "Nederlands");
    assert_eq!(event.event_type(), "Taak");
}

#[tokio::test]
async fn test_fallback_to_the_second_proxy() {
    let _ = env_logger::builder().is_test(true).try_init();

    let all_origins = ProxyStrategy::AllOrigins.wrap(&feed_url()).unwrap();
    let cors_anywhere = ProxyStrategy::CorsAnywhere.wrap(&feed_url()).unwrap();
    let fetcher = ScriptedFetcher::new()
        .on(FEED_URL, Reply::Fail("blocked by CORS policy"))
        .on(all_origins.as_str(), Reply::Respond(500, "Internal Server Error"))
        .on(cors_anywhere.as_str(), Reply::Respond(200, SCHOOL_FEED));

    let provider = Provider::new(TransportResolver::new(fetcher, TransportConfig::default()), MemoryStore::new());
    let events = provider.load_unified_data(&feed_url()).await.unwrap();
    assert_eq!(events.len(), 3);

    let requested = provider.resolver().fetcher().requested();
    assert_eq!(requested, vec![
        FEED_URL.to_string(),
        all_origins.to_string(),
        cors_anywhere.to_string(),
    ]);
}

#[tokio::test]
async fn test_every_attempt_failed() {
    let _ = env_logger::builder().is_test(true).try_init();

    let fetcher = ScriptedFetcher::new()
        .on(FEED_URL, Reply::Fail("connection refused"))
        .on("https://api.allorigins.win/", Reply::Respond(404, "not found"))
        .on("https://cors-anywhere.herokuapp.com/", Reply::Respond(403, "See /corsdemo"))
        .on("https://corsproxy.io/", Reply::Respond(200, ""));

    let provider = Provider::new(TransportResolver::new(fetcher, TransportConfig::default()), MemoryStore::new());
    match provider.load_unified_data(&feed_url()).await {
        Err(Error::Transport { url, last_error }) => {
            assert_eq!(url, FEED_URL);
            assert!(last_error.contains("Empty response body"));
        },
        other => panic!("Unexpected result {:?}", other),
    }
    assert_eq!(provider.resolver().fetcher().requested().len(), 4);
}
