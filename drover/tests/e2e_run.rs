#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use drover_core::{RunConfig, RunController, TaskConfig};
use drover_http::HttpClient;
use drover_testserver::TestServer;

fn album_mix(base_url: &str) -> RunConfig {
    RunConfig {
        target_base_url: base_url.to_string(),
        tasks: vec![
            TaskConfig {
                name: "list-albums".to_string(),
                weight: 2,
                path: "/albums".to_string(),
                ..TaskConfig::default()
            },
            TaskConfig {
                name: "get-album".to_string(),
                weight: 1,
                path: "/albums/{id}".to_string(),
                id_min: 1,
                id_max: 3,
                ..TaskConfig::default()
            },
            TaskConfig {
                name: "create-album".to_string(),
                weight: 1,
                method: "POST".to_string(),
                path: "/albums".to_string(),
                body: Some(
                    r#"{"id": {id}, "title": "Load Test Album {id}", "artist": "drover"}"#
                        .to_string(),
                ),
                expected_status: 201,
                ..TaskConfig::default()
            },
        ],
        users: 4,
        max_iterations: Some(200),
        request_timeout: Duration::from_secs(5),
        random_seed: Some(42),
        ..RunConfig::default()
    }
}

#[tokio::test]
async fn album_mix_runs_clean_against_live_server() {
    drover_testserver::tracing::init();
    let server = TestServer::start().await.unwrap();

    let controller = RunController::new(
        album_mix(server.base_url()),
        Arc::new(HttpClient::default()),
    )
    .unwrap();
    let report = controller.run().await.unwrap();

    assert_eq!(report.requests_total(), 200);
    assert_eq!(report.failures_total(), 0);
    assert_eq!(report.abandoned_users, 0);
    assert_eq!(server.stats().requests_total(), 200);

    // Weight 2:1:1 over 200 iterations.
    let list = report.snapshot.tasks["list-albums"].count;
    let get = report.snapshot.tasks["get-album"].count;
    let create = report.snapshot.tasks["create-album"].count;
    assert_eq!(list + get + create, 200);
    assert!((70..=130).contains(&list), "list count {list}");
    assert_eq!(server.stats().albums_created(), create);

    for stats in report.snapshot.tasks.values() {
        assert_eq!(stats.success_count + stats.failure_count, stats.count);
        assert!(stats.latency.p99_ms.is_some());
    }

    server.shutdown().await;
}

#[tokio::test]
async fn unexpected_statuses_show_up_as_failures() {
    let server = TestServer::start().await.unwrap();

    let config = RunConfig {
        target_base_url: server.base_url().to_string(),
        tasks: vec![TaskConfig {
            name: "broken".to_string(),
            path: "/status/500".to_string(),
            ..TaskConfig::default()
        }],
        max_iterations: Some(20),
        request_timeout: Duration::from_secs(5),
        random_seed: Some(1),
        ..RunConfig::default()
    };

    let report = RunController::new(config, Arc::new(HttpClient::default()))
        .unwrap()
        .run()
        .await
        .unwrap();

    // Every request failed, yet the run completed normally.
    let broken = &report.snapshot.tasks["broken"];
    assert_eq!(broken.count, 20);
    assert_eq!(broken.failure_count, 20);
    assert_eq!(
        broken.failure_reasons["unexpected status 500 (expected 200)"],
        20
    );

    server.shutdown().await;
}

#[tokio::test]
async fn request_timeouts_are_recorded_as_failures() {
    let server = TestServer::start().await.unwrap();

    let config = RunConfig {
        target_base_url: server.base_url().to_string(),
        tasks: vec![TaskConfig {
            name: "too-slow".to_string(),
            path: "/slow".to_string(),
            ..TaskConfig::default()
        }],
        max_iterations: Some(5),
        // /slow sleeps 50ms; a 10ms budget always fires.
        request_timeout: Duration::from_millis(10),
        random_seed: Some(1),
        ..RunConfig::default()
    };

    let report = RunController::new(config, Arc::new(HttpClient::default()))
        .unwrap()
        .run()
        .await
        .unwrap();

    let slow = &report.snapshot.tasks["too-slow"];
    assert_eq!(slow.count, 5);
    assert_eq!(slow.failure_count, 5);
    assert_eq!(slow.failure_reasons["timeout"], 5);

    server.shutdown().await;
}

#[tokio::test]
async fn get_by_id_only_touches_seeded_ids() {
    let server = TestServer::start().await.unwrap();

    let config = RunConfig {
        target_base_url: server.base_url().to_string(),
        tasks: vec![TaskConfig {
            name: "get-album".to_string(),
            path: "/albums/{id}".to_string(),
            id_min: 1,
            id_max: 3,
            ..TaskConfig::default()
        }],
        max_iterations: Some(50),
        request_timeout: Duration::from_secs(5),
        random_seed: Some(9),
        ..RunConfig::default()
    };

    let report = RunController::new(config, Arc::new(HttpClient::default()))
        .unwrap()
        .run()
        .await
        .unwrap();

    // The id range matches the server's seeded albums, so nothing 404s.
    assert_eq!(report.failures_total(), 0);
    assert_eq!(report.requests_total(), 50);

    server.shutdown().await;
}
