mod common;

use common::{report_page, FakeFetcher, PageFixture};
use lfcircle::{
    create_event_channel, Circle, CircleEvent, LfCircleError, Metric, OutputFormat,
    RenderOptions,
};
use std::time::Duration;

fn readme_circle() -> FakeFetcher {
    FakeFetcher::new()
        .with_report("user1", PageFixture::new(462, 60, 70, 300))
        .with_report("user2", PageFixture::new(2053, 180, 210, 1400))
        .with_report("user3", PageFixture::new(640, 45, 90, 500))
}

fn order(outcome: &lfcircle::CircleOutcome) -> Vec<&str> {
    outcome.ranking.iter().map(|u| u.user.as_str()).collect()
}

#[test_log::test(tokio::test)]
async fn test_users_ordered_by_scrobble_count() {
    let circle = Circle::new(readme_circle());

    let outcome = circle
        .run(&["user1", "user2", "user3"], &RenderOptions::default())
        .await
        .unwrap();

    assert_eq!(order(&outcome), vec!["user2", "user3", "user1"]);
    let ranks: Vec<usize> = outcome.ranking.iter().map(|u| u.scrobbles.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3]);
    assert!(outcome.skipped.is_empty());

    let user2 = outcome.text.find("1. user2").unwrap();
    let user3 = outcome.text.find("2. user3").unwrap();
    let user1 = outcome.text.find("3. user1").unwrap();
    assert!(user2 < user3 && user3 < user1);
}

#[test_log::test(tokio::test)]
async fn test_failed_target_is_skipped_not_fatal() {
    let (events, mut receiver) = create_event_channel();
    let circle = Circle::new(readme_circle()).with_events(events);

    let outcome = circle
        .run(&["user1", "user2", "user3", "user4"], &RenderOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.ranking.len(), 3);
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].user, "user4");
    assert!(outcome.skipped[0].reason.contains("404"));
    assert!(!outcome.text.contains("user4"));

    let mut fetched = 0;
    let mut skipped = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        match event {
            CircleEvent::TargetFetched { total, .. } => {
                assert_eq!(total, 4);
                fetched += 1;
            }
            CircleEvent::TargetSkipped { user, .. } => skipped.push(user),
            CircleEvent::RateLimited { .. } => panic!("no rate limits expected"),
        }
    }
    assert_eq!(fetched, 3);
    assert_eq!(skipped, vec!["user4".to_string()]);
}

#[test_log::test(tokio::test)]
async fn test_unparseable_page_is_skipped() {
    let fetcher = readme_circle().with_page("broken", "<html><body>Maintenance</body></html>");
    let outcome = Circle::new(fetcher)
        .run(&["broken", "user1"], &RenderOptions::default())
        .await
        .unwrap();

    assert_eq!(order(&outcome), vec!["user1"]);
    assert_eq!(outcome.skipped[0].user, "broken");
    assert!(outcome.skipped[0].reason.contains("extract"));
}

#[test_log::test(tokio::test)]
async fn test_single_user_ranks_first_everywhere() {
    let outcome = Circle::new(readme_circle())
        .run(&["user3"], &RenderOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.ranking.len(), 1);
    let only = &outcome.ranking.users()[0];
    for metric in Metric::ALL {
        assert_eq!(only.standing(metric).rank, 1);
    }
    assert!(outcome.text.contains("640 scrobbles (#1)"));
}

#[test_log::test(tokio::test)]
async fn test_all_targets_failing_is_distinct_error() {
    let result = Circle::new(FakeFetcher::new())
        .run(&["ghost1", "ghost2", "ghost1"], &RenderOptions::default())
        .await;

    match result {
        Err(LfCircleError::AllTargetsFailed { attempted }) => assert_eq!(attempted, 2),
        other => panic!("Expected total failure, got: {other:?}"),
    }
}

#[test_log::test(tokio::test)]
async fn test_no_targets_is_configuration_error() {
    let targets: [&str; 0] = [];
    let result = Circle::new(readme_circle())
        .run(&targets, &RenderOptions::default())
        .await;
    assert!(matches!(result, Err(LfCircleError::Configuration(_))));
}

#[test_log::test(tokio::test)]
async fn test_repeated_targets_fetched_once() {
    let circle = Circle::new(readme_circle());
    let outcome = circle
        .run(&["user1", "user2", "user1"], &RenderOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.ranking.len(), 2);
    assert_eq!(circle.fetcher().calls(), vec!["user1", "user2"]);
}

#[test_log::test(tokio::test)]
async fn test_input_order_survives_out_of_order_fetches() {
    // Equal scrobbles, so display order falls back to input order
    let fetcher = FakeFetcher::new()
        .with_report("slow", PageFixture::new(100, 10, 10, 10))
        .with_report("fast", PageFixture::new(100, 10, 10, 10))
        .with_delay("slow", Duration::from_millis(50));

    let collected = Circle::new(fetcher).collect_reports(&["slow", "fast"]).await;
    let users: Vec<&str> = collected.reports.iter().map(|r| r.user.as_str()).collect();
    assert_eq!(users, vec!["slow", "fast"]);
}

#[test_log::test(tokio::test)]
async fn test_listening_time_breaks_scrobble_ties() {
    let fetcher = FakeFetcher::new()
        .with_report("first", PageFixture::new(300, 10, 10, 10).listening(0, 15))
        .with_report("second", PageFixture::new(300, 10, 10, 10).listening(1, 2));

    let outcome = Circle::new(fetcher)
        .run(&["first", "second"], &RenderOptions::default())
        .await
        .unwrap();

    assert_eq!(order(&outcome), vec!["second", "first"]);
    assert!(outcome.text.contains("1. second — Σ26h; 43s/d"));
    assert!(outcome.text.contains("2. first — Σ15h; 43s/d"));
}

#[test_log::test(tokio::test)]
async fn test_header_precedes_first_entry() {
    for format in [OutputFormat::Ascii, OutputFormat::Markdown] {
        let options = RenderOptions {
            header: "the circle, week 42".to_string(),
            format,
            ..Default::default()
        };
        let outcome = Circle::new(readme_circle())
            .run(&["user1", "user2"], &options)
            .await
            .unwrap();

        assert!(outcome.text.starts_with("the circle, week 42\n"), "{format}");
        let first_entry = outcome.text.find("1. ").unwrap();
        assert!(first_entry > "the circle, week 42".len());
    }
}

#[test_log::test(tokio::test)]
async fn test_empty_header_is_omitted() {
    let outcome = Circle::new(readme_circle())
        .run(&["user1"], &RenderOptions::default())
        .await
        .unwrap();

    assert!(outcome.text.starts_with("1. user1"));
    assert!(!outcome.text.contains("---"));
}

#[test_log::test(tokio::test)]
async fn test_inactive_user_still_ranked() {
    let fetcher = readme_circle().with_page(
        "quiet",
        report_page(&PageFixture {
            top: None,
            ..PageFixture::new(0, 0, 0, 0)
        }),
    );

    let outcome = Circle::new(fetcher)
        .run(&["quiet", "user1", "user3"], &RenderOptions::default())
        .await
        .unwrap();

    let quiet = outcome.ranking.iter().find(|u| u.user == "quiet").unwrap();
    assert_eq!(quiet.position, 3);
    assert_eq!(quiet.scrobbles.rank, 3);
    assert!(quiet.artists.top.is_none());
    assert!(outcome.text.contains("   0 scrobbles (#3)\n"));
}
