use std::sync::Arc;

use serde_json::json;

use orca_relay::{CycleError, FeedResolver, FetchError, FetchStage, JSON_API_MEDIA_TYPE};

use crate::helpers::*;

fn three_new_detections() -> serde_json::Value {
    // Newest first, as the source serves them.
    json!([
        source_detection("s3", "Orcasound Lab", "2024-05-01T12:30:00Z", Some("third")),
        source_detection("s2", "North SJC", "2024-05-01T12:20:00Z", None),
        source_detection("s1", "Port Townsend", "2024-05-01T12:10:00Z", Some("first")),
    ])
}

#[tokio::test]
async fn new_detections_are_posted_oldest_first() {
    let fake = Arc::new(
        FakeTransport::new()
            .respond(FEEDS_PATH, 200, standard_feeds())
            .respond(SOURCE_PATH, 200, three_new_detections())
            .respond(DESTINATION_PATH, 200, destination_doc(&[])),
    );

    let report = reconciler(fake.clone()).run_cycle().await.unwrap();
    assert_eq!(report.feeds, 3);
    assert_eq!(report.source_detections, 3);
    assert_eq!(report.submitted, 3);
    assert_eq!(report.attempted(), 3);

    let bodies = fake.posted_bodies();
    let timestamps: Vec<&str> = bodies
        .iter()
        .map(|b| b["data"]["attributes"]["timestamp"].as_str().unwrap())
        .collect();
    assert_eq!(
        timestamps,
        ["2024-05-01T12:10:00Z", "2024-05-01T12:20:00Z", "2024-05-01T12:30:00Z"]
    );

    let feed_ids: Vec<&str> = bodies
        .iter()
        .map(|b| b["data"]["attributes"]["feed_id"].as_str().unwrap())
        .collect();
    assert_eq!(feed_ids, ["feed_pt", "feed_nsjc", "feed_lab"]);
    assert!(bodies[1]["data"]["attributes"]["description"].is_null());
    assert_eq!(bodies[2]["data"]["attributes"]["description"], "third");
}

#[tokio::test]
async fn alias_resolves_to_canonical_feed() {
    let fake = Arc::new(
        FakeTransport::new()
            .respond(FEEDS_PATH, 200, standard_feeds())
            .respond(
                SOURCE_PATH,
                200,
                json!([source_detection("s1", "North SJC", "2024-05-01T12:00:00Z", Some("S calls"))]),
            )
            .respond(DESTINATION_PATH, 200, destination_doc(&[])),
    );

    reconciler(fake.clone()).run_cycle().await.unwrap();

    let bodies = fake.posted_bodies();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["data"]["attributes"]["feed_id"], "feed_nsjc");
}

#[tokio::test]
async fn outbound_write_carries_vendor_headers_and_token() {
    let fake = Arc::new(
        FakeTransport::new()
            .respond(FEEDS_PATH, 200, standard_feeds())
            .respond(
                SOURCE_PATH,
                200,
                json!([source_detection("s1", "Orcasound Lab", "2024-05-01T12:00:00Z", None)]),
            )
            .respond(DESTINATION_PATH, 200, destination_doc(&[])),
    );

    reconciler(fake.clone()).run_cycle().await.unwrap();

    let posts = fake.posts();
    assert_eq!(posts.len(), 1);
    let post = &posts[0];
    assert_eq!(post.content_type, JSON_API_MEDIA_TYPE);
    assert_eq!(post.accept, JSON_API_MEDIA_TYPE);
    assert_eq!(post.bearer_token.as_deref(), Some(API_KEY));
    assert!(post.url.starts_with("https://"));
    assert!(post.url.contains("/api/json/detections?fields"));
    assert_eq!(fake.posted_bodies()[0]["data"]["type"], "detection");
}

#[tokio::test]
async fn detections_already_at_destination_are_not_reposted() {
    let fake = Arc::new(
        FakeTransport::new()
            .respond(FEEDS_PATH, 200, standard_feeds())
            .respond(
                SOURCE_PATH,
                200,
                json!([
                    source_detection("s4", "Orcasound Lab", "2024-05-01T12:40:00Z", Some("new")),
                    source_detection("s3", "Orcasound Lab", "2024-05-01T12:30:00Z", Some("calls")),
                ]),
            )
            // Same instant in a different textual form.
            .respond(
                DESTINATION_PATH,
                200,
                destination_doc(&[("feed_lab", Some("calls"), "2024-05-01T12:30:00.000000Z")]),
            ),
    );

    let report = reconciler(fake.clone()).run_cycle().await.unwrap();
    assert_eq!(report.already_present, 1);
    assert_eq!(report.submitted, 1);

    let bodies = fake.posted_bodies();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["data"]["attributes"]["description"], "new");
}

#[tokio::test]
async fn detections_older_than_destination_are_skipped() {
    let fake = Arc::new(
        FakeTransport::new()
            .respond(FEEDS_PATH, 200, standard_feeds())
            .respond(SOURCE_PATH, 200, three_new_detections())
            .respond(
                DESTINATION_PATH,
                200,
                destination_doc(&[("feed_other", None, "2024-05-01T12:15:00Z")]),
            ),
    );

    let report = reconciler(fake.clone()).run_cycle().await.unwrap();
    assert_eq!(report.superseded, 1);
    assert_eq!(report.submitted, 2);

    let ids: Vec<String> = fake
        .posted_bodies()
        .iter()
        .map(|b| b["data"]["attributes"]["timestamp"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, ["2024-05-01T12:20:00Z", "2024-05-01T12:30:00Z"]);
}

#[tokio::test]
async fn unresolved_locations_are_skipped() {
    let fake = Arc::new(
        FakeTransport::new()
            .respond(FEEDS_PATH, 200, standard_feeds())
            .respond(
                SOURCE_PATH,
                200,
                json!([
                    source_detection("s2", "Orcasound Lab", "2024-05-01T12:20:00Z", None),
                    source_detection("s1", "Bush Point", "2024-05-01T12:10:00Z", None),
                ]),
            )
            .respond(DESTINATION_PATH, 200, destination_doc(&[])),
    );

    let report = reconciler(fake.clone()).run_cycle().await.unwrap();
    assert_eq!(report.unresolved, 1);
    assert_eq!(report.submitted, 1);
    assert_eq!(fake.posts().len(), 1);
}

#[tokio::test]
async fn custom_alias_table_replaces_defaults() {
    let fake = Arc::new(
        FakeTransport::new()
            .respond(FEEDS_PATH, 200, standard_feeds())
            .respond(
                SOURCE_PATH,
                200,
                json!([
                    source_detection("s2", "PT", "2024-05-01T12:20:00Z", None),
                    source_detection("s1", "North SJC", "2024-05-01T12:10:00Z", None),
                ]),
            )
            .respond(DESTINATION_PATH, 200, destination_doc(&[])),
    );

    let report = reconciler(fake.clone())
        .with_resolver(FeedResolver::with_aliases([("PT", "Port Townsend")]))
        .run_cycle()
        .await
        .unwrap();
    assert_eq!(report.unresolved, 1);
    assert_eq!(fake.posted_bodies()[0]["data"]["attributes"]["feed_id"], "feed_pt");
}

#[tokio::test]
async fn rejection_does_not_stop_later_submissions() {
    let fake = Arc::new(
        FakeTransport::new()
            .respond(FEEDS_PATH, 200, standard_feeds())
            .respond(SOURCE_PATH, 200, three_new_detections())
            .respond(DESTINATION_PATH, 200, destination_doc(&[]))
            .post_statuses(&[422]),
    );

    let report = reconciler(fake.clone()).run_cycle().await.unwrap();
    assert_eq!(report.rejected, 1);
    assert_eq!(report.submitted, 2);
    assert_eq!(fake.posts().len(), 3);
}

#[tokio::test]
async fn malformed_source_record_is_skipped_alone() {
    let fake = Arc::new(
        FakeTransport::new()
            .respond(FEEDS_PATH, 200, standard_feeds())
            .respond(
                SOURCE_PATH,
                200,
                json!([
                    source_detection("s2", "Orcasound Lab", "2024-05-01T12:20:00Z", None),
                    { "id": "broken", "location": { "name": "Orcasound Lab" }, "comments": null },
                    source_detection("s1", "Orcasound Lab", "2024-05-01T12:10:00Z", None),
                ]),
            )
            .respond(DESTINATION_PATH, 200, destination_doc(&[])),
    );

    let report = reconciler(fake.clone()).run_cycle().await.unwrap();
    assert_eq!(report.source_detections, 2);
    assert_eq!(report.source_malformed, 1);
    assert_eq!(report.submitted, 2);
}

#[tokio::test]
async fn feeds_top_level_array_aborts_cycle() {
    let fake = Arc::new(
        FakeTransport::new()
            .respond(FEEDS_PATH, 200, json!([{ "id": "feed_lab" }]))
            .respond(SOURCE_PATH, 200, three_new_detections())
            .respond(DESTINATION_PATH, 200, destination_doc(&[])),
    );

    let err = reconciler(fake.clone()).run_cycle().await.unwrap_err();
    assert_eq!(err.stage(), FetchStage::Feeds);
    assert!(matches!(
        err,
        CycleError::Fetch { source: FetchError::Decode(_), .. }
    ));
    assert!(fake.posts().is_empty());
}

#[tokio::test]
async fn destination_fetch_failure_aborts_cycle() {
    let fake = Arc::new(
        FakeTransport::new()
            .respond(FEEDS_PATH, 200, standard_feeds())
            .respond(SOURCE_PATH, 200, three_new_detections())
            .fail(DESTINATION_PATH, "connection reset"),
    );

    let err = reconciler(fake.clone()).run_cycle().await.unwrap_err();
    assert_eq!(err.stage(), FetchStage::DestinationDetections);
    assert!(fake.posts().is_empty());
    assert_eq!(fake.get_count(), 3);
}

#[tokio::test]
async fn source_error_status_aborts_cycle() {
    let fake = Arc::new(
        FakeTransport::new()
            .respond(FEEDS_PATH, 200, standard_feeds())
            .respond(SOURCE_PATH, 503, json!({ "error": "unavailable" }))
            .respond(DESTINATION_PATH, 200, destination_doc(&[])),
    );

    let err = reconciler(fake.clone()).run_cycle().await.unwrap_err();
    assert_eq!(err.stage(), FetchStage::SourceDetections);
    assert!(matches!(
        err,
        CycleError::Fetch { source: FetchError::Status { status: 503, .. }, .. }
    ));
    // Destination detections are never requested once the source read fails.
    assert_eq!(fake.get_count(), 2);
    assert!(fake.posts().is_empty());
}

#[tokio::test]
async fn incomplete_newest_destination_record_still_bounds_the_walk() {
    let fake = Arc::new(
        FakeTransport::new()
            .respond(FEEDS_PATH, 200, standard_feeds())
            .respond(SOURCE_PATH, 200, three_new_detections())
            .respond(
                DESTINATION_PATH,
                200,
                json!({ "data": [{ "attributes": {
                    "timestamp": "2024-05-01T13:00:00Z",
                    "description": "x",
                    "feed_id": null,
                } }] }),
            ),
    );

    let report = reconciler(fake.clone()).run_cycle().await.unwrap();
    assert_eq!(report.destination_detections, 1);
    assert_eq!(report.destination_incomplete, 1);
    assert_eq!(report.destination_malformed, 0);
    assert_eq!(report.superseded, 3);
    assert_eq!(report.submitted, 0);
    assert!(fake.posts().is_empty());
}
