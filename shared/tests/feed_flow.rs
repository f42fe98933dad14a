use chrono::{DateTime, TimeZone, Utc};
use crux_core::testing::AppTester;
use gist_feed::feed::{GistFile, Owner};
use gist_feed::pagination::{PageKind, PageRequest};
use gist_feed::{
    App, DedupStrategy, Effect, Event, FeedConfig, FetchError, GistId, GistRecord, Model,
};
use indexmap::IndexMap;
use std::num::NonZeroUsize;

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).single().unwrap()
}

fn gist(id: &str, secs: i64) -> GistRecord {
    let mut files = IndexMap::new();
    files.insert(
        format!("{id}.txt"),
        GistFile {
            filename: format!("{id}.txt"),
        },
    );
    GistRecord {
        id: GistId::new(id),
        owner: Some(Owner {
            avatar_url: format!("https://avatars.example.com/{id}"),
        }),
        files,
        updated_at: at(secs),
    }
}

fn page(prefix: &str, newest: i64, len: i64) -> Vec<GistRecord> {
    (0..len)
        .map(|i| gist(&format!("{prefix}{i}"), newest - i))
        .collect()
}

fn has_http(effects: &[Effect]) -> bool {
    effects.iter().any(|e| matches!(e, Effect::Http(_)))
}

fn loaded(model: &Model, request: PageRequest, records: Vec<GistRecord>) -> Event {
    Event::PageLoaded {
        generation: model.generation,
        request,
        result: Ok(records),
    }
}

fn mount_with_first_page(app: &AppTester<App, Effect>, model: &mut Model) {
    let update = app.update(Event::Mounted, model);
    assert!(has_http(&update.effects));
    let request = model.pagination.in_flight().expect("initial request");
    app.update(loaded(model, request, page("a", 0, 30)), model);
}

#[test]
fn mount_then_scroll_merges_overlapping_page() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    assert_eq!(model.pagination.next_page(), 1);

    // 1. Mount issues page 1
    let update = app.update(Event::Mounted, &mut model);
    assert!(has_http(&update.effects));
    assert!(update.effects.iter().any(|e| matches!(e, Effect::Render(_))));
    let request = model.pagination.in_flight().expect("initial request");
    assert_eq!(
        request,
        PageRequest {
            page: 1,
            kind: PageKind::Initial
        }
    );
    assert!(app.view(&model).show_spinner);

    // 2. First page lands
    app.update(loaded(&model, request, page("a", 0, 30)), &mut model);
    assert_eq!(model.feed.len(), 30);
    assert_eq!(model.pagination.next_page(), 2);
    assert!(!app.view(&model).show_spinner);

    // 3. Scrolling near the end asks for page 2
    let update = app.update(
        Event::Scrolled {
            offset: 2_000.0,
            visible_length: 800.0,
            content_length: 3_000.0,
        },
        &mut model,
    );
    assert!(has_http(&update.effects));
    let request = model.pagination.in_flight().expect("second request");
    assert_eq!(
        request,
        PageRequest {
            page: 2,
            kind: PageKind::More
        }
    );
    assert!(app.view(&model).is_loading_more);

    // 4. Page 2 repeats the last five records of page 1
    let mut second: Vec<GistRecord> = model.feed.records()[25..].to_vec();
    second.extend(page("b", -30, 25));
    app.update(loaded(&model, request, second), &mut model);

    assert_eq!(model.feed.len(), 55);
    assert_eq!(model.pagination.next_page(), 3);

    let view = app.view(&model);
    assert_eq!(view.rows.len(), 55);
    assert_eq!(view.rows[0].filename, "a0.txt");
    assert_eq!(view.rows[30].id, "b0");
    assert!(!view.is_loading_more);
}

#[test]
fn scroll_far_from_end_does_not_fetch() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    mount_with_first_page(&app, &mut model);

    let update = app.update(
        Event::Scrolled {
            offset: 0.0,
            visible_length: 800.0,
            content_length: 3_000.0,
        },
        &mut model,
    );
    assert!(!has_http(&update.effects));
    assert!(!model.pagination.is_loading());
}

#[test]
fn second_end_reached_while_loading_is_ignored() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    mount_with_first_page(&app, &mut model);

    let first = app.update(Event::EndReached, &mut model);
    assert!(has_http(&first.effects));

    let second = app.update(Event::EndReached, &mut model);
    assert!(!has_http(&second.effects));
    assert_eq!(model.pagination.in_flight().map(|r| r.page), Some(2));
}

#[test]
fn end_reached_before_first_page_is_ignored() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let update = app.update(Event::EndReached, &mut model);
    assert!(!has_http(&update.effects));

    app.update(Event::Mounted, &mut model);
    let update = app.update(Event::EndReached, &mut model);
    assert!(!has_http(&update.effects));
}

#[test]
fn page_with_nothing_older_appends_nothing() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    mount_with_first_page(&app, &mut model);

    app.update(Event::EndReached, &mut model);
    let request = model.pagination.in_flight().unwrap();
    app.update(loaded(&model, request, page("new", 100, 30)), &mut model);

    assert_eq!(model.feed.len(), 30);
    assert_eq!(model.pagination.next_page(), 3);
}

#[test]
fn failed_fetch_surfaces_error_and_retries() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(Event::Mounted, &mut model);
    let request = model.pagination.in_flight().unwrap();

    app.update(
        Event::PageLoaded {
            generation: model.generation,
            request,
            result: Err(FetchError::Status { status: 503 }),
        },
        &mut model,
    );

    assert_eq!(model.pagination.next_page(), 1);
    assert!(!model.pagination.is_loading());
    let view = app.view(&model);
    let error = view.error.expect("error shown");
    assert!(error.is_retryable);
    assert_eq!(error.error_code, "SERVER_ERROR");
    assert!(!view.show_spinner);

    let update = app.update(Event::RetryRequested, &mut model);
    assert!(has_http(&update.effects));
    assert!(model.active_error.is_none());
    assert_eq!(model.pagination.in_flight(), Some(request));

    app.update(loaded(&model, request, page("a", 0, 3)), &mut model);
    assert_eq!(model.feed.len(), 3);
    assert_eq!(model.pagination.next_page(), 2);
}

#[test]
fn retry_without_failure_does_nothing() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    mount_with_first_page(&app, &mut model);

    let update = app.update(Event::RetryRequested, &mut model);
    assert!(update.effects.is_empty());
}

#[test]
fn network_failure_keeps_feed() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    mount_with_first_page(&app, &mut model);

    app.update(Event::EndReached, &mut model);
    let request = model.pagination.in_flight().unwrap();
    app.update(
        Event::PageLoaded {
            generation: model.generation,
            request,
            result: Err(FetchError::Network("connection reset".into())),
        },
        &mut model,
    );

    assert_eq!(model.feed.len(), 30);
    assert_eq!(model.pagination.next_page(), 2);
    let view = app.view(&model);
    assert_eq!(view.rows.len(), 30);
    assert_eq!(view.error.unwrap().error_code, "NETWORK_ERROR");
}

#[test]
fn late_page_after_unmount_is_dropped() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(Event::Mounted, &mut model);
    let request = model.pagination.in_flight().unwrap();
    let stale_generation = model.generation;

    app.update(Event::Unmounted, &mut model);
    assert!(!model.mounted);

    let update = app.update(
        Event::PageLoaded {
            generation: stale_generation,
            request,
            result: Ok(page("a", 0, 30)),
        },
        &mut model,
    );
    assert!(update.effects.is_empty());
    assert!(model.feed.is_empty());
    assert_eq!(model.pagination.next_page(), 1);

    // Mounting again starts over
    let update = app.update(Event::Mounted, &mut model);
    assert!(has_http(&update.effects));
    assert_eq!(model.pagination.in_flight().map(|r| r.page), Some(1));
}

#[test]
fn mounting_twice_fetches_once() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(Event::Mounted, &mut model);
    let update = app.update(Event::Mounted, &mut model);
    assert!(!has_http(&update.effects));
}

#[test]
fn configure_before_mount_applies_settings() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let config = FeedConfig {
        per_page: 50,
        dedup: DedupStrategy::SeenIds {
            capacity: NonZeroUsize::new(200).unwrap(),
        },
        ..FeedConfig::default()
    };
    let update = app.update(Event::Configure { config }, &mut model);
    assert!(update.effects.iter().any(|e| matches!(e, Effect::Render(_))));
    assert_eq!(model.config.per_page, 50);
    assert!(model.active_error.is_none());

    let update = app.update(Event::Mounted, &mut model);
    let request = update
        .into_effects()
        .find_map(Effect::into_http)
        .expect("initial request");
    assert_eq!(
        request.operation.url,
        "https://api.github.com/gists/public?per_page=50&page=1"
    );

    // Exact dedup drops a repeat even when it is older than the tail
    let request = model.pagination.in_flight().unwrap();
    app.update(loaded(&model, request, page("a", 0, 3)), &mut model);
    app.update(Event::EndReached, &mut model);
    let request = model.pagination.in_flight().unwrap();
    app.update(
        loaded(&model, request, vec![gist("b0", -10), gist("a1", -20)]),
        &mut model,
    );
    assert_eq!(model.feed.len(), 4);
}

#[test]
fn invalid_configuration_is_reported() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let config = FeedConfig {
        api_base_url: "ftp://example.com".into(),
        ..FeedConfig::default()
    };
    app.update(Event::Configure { config }, &mut model);

    assert_eq!(model.config, FeedConfig::default());
    let error = app.view(&model).error.expect("error shown");
    assert_eq!(error.error_code, "INVALID_CONFIG");
    assert!(!error.is_retryable);
    assert!(error.message.contains("ftp"));
}

#[test]
fn configure_while_mounted_is_ignored() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    mount_with_first_page(&app, &mut model);

    let config = FeedConfig {
        per_page: 10,
        ..FeedConfig::default()
    };
    let update = app.update(Event::Configure { config }, &mut model);

    assert!(update.effects.is_empty());
    assert_eq!(model.config.per_page, 30);
    assert_eq!(model.feed.len(), 30);
}
