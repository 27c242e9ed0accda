// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTTP backend tests against a mock Marquez service.

mod common;

use std::net::TcpListener;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use common::{blocking, mock_config};
use marquez_client::{
    ClientConfig, ClientError, HttpBackend, MarquezApi, MarquezClient, RunArgs, RunState,
    RunTransition,
};
use serde_json::json;
use wiremock::matchers::{any, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const RUN_ID: &str = "5f2c6a9e-0000-4000-8000-000000000001";

fn namespace_json() -> serde_json::Value {
    json!({"name": "analytics", "owner": "team-a"})
}

fn run_json() -> serde_json::Value {
    json!({
        "runId": RUN_ID,
        "nominalStartTime": "2024-01-01T00:00:00Z",
        "runArgs": {"date": "2024-01-01"},
        "runState": "NEW"
    })
}

async fn mount_namespace(server: &MockServer) {
    Mock::given(method("PUT"))
        .and(path("/api/v1/namespaces/analytics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(namespace_json()))
        .mount(server)
        .await;
}

async fn received(server: &MockServer) -> Vec<Request> {
    server
        .received_requests()
        .await
        .expect("request recording enabled")
}

fn body(request: &Request) -> serde_json::Value {
    request.body_json().expect("request body is JSON")
}

// ============================================================================
// Request shapes
// ============================================================================

#[tokio::test]
async fn test_bind_namespace_request() {
    let server = MockServer::start().await;
    mount_namespace(&server).await;

    let config = mock_config(&server);
    let ns = blocking(move || {
        let mut client = MarquezClient::new(config);
        client.bind_namespace("analytics", Some("team-a"), None)
    })
    .await
    .unwrap();
    assert_eq!(ns.name, "analytics");

    let requests = received(&server).await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method.as_str(), "PUT");
    assert_eq!(requests[0].url.path(), "/api/v1/namespaces/analytics");
    assert_eq!(body(&requests[0]), json!({"owner": "team-a"}));
}

#[tokio::test]
async fn test_register_job_request() {
    let server = MockServer::start().await;
    mount_namespace(&server).await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/namespaces/analytics/jobs/etl_daily"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "etl_daily",
            "namespace": "analytics",
            "location": "git://etl",
            "inputDatasetUrns": ["raw.events"],
            "outputDatasetUrns": ["agg.daily"]
        })))
        .mount(&server)
        .await;

    let config = mock_config(&server);
    let job = blocking(move || {
        let mut client = MarquezClient::new(config);
        client.bind_namespace("analytics", None, None)?;
        client.register_job("etl_daily", "git://etl", &["raw.events"], &["agg.daily"], None)
    })
    .await
    .unwrap();
    assert_eq!(job.output_dataset_urns, vec!["agg.daily"]);

    let requests = received(&server).await;
    assert_eq!(body(&requests[0]), json!({"owner": "default"}));
    assert_eq!(requests[1].method.as_str(), "PUT");
    assert_eq!(
        requests[1].url.path(),
        "/api/v1/namespaces/analytics/jobs/etl_daily"
    );
    assert_eq!(
        body(&requests[1]),
        json!({
            "location": "git://etl",
            "inputDatasetUrns": ["raw.events"],
            "outputDatasetUrns": ["agg.daily"]
        })
    );
}

#[tokio::test]
async fn test_start_run_request() {
    let server = MockServer::start().await;
    mount_namespace(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/namespaces/analytics/jobs/etl_daily/runs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(run_json()))
        .mount(&server)
        .await;

    let config = mock_config(&server);
    let run = blocking(move || {
        let mut client = MarquezClient::new(config);
        client.bind_namespace("analytics", None, None)?;
        let mut args = RunArgs::new();
        args.insert("date".to_string(), "2024-01-01".into());
        client.start_run("etl_daily", args, None, None)
    })
    .await
    .unwrap();

    assert_eq!(run.run_id, RUN_ID);
    assert_eq!(run.run_state, RunState::Created);

    let requests = received(&server).await;
    assert_eq!(requests[1].method.as_str(), "POST");
    assert_eq!(
        requests[1].url.path(),
        "/api/v1/namespaces/analytics/jobs/etl_daily/runs"
    );
    assert_eq!(body(&requests[1]), json!({"runArgs": {"date": "2024-01-01"}}));
}

#[tokio::test]
async fn test_start_run_sends_nominal_window() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/namespaces/analytics/jobs/etl_daily/runs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "runId": RUN_ID,
            "nominalStartTime": "2024-01-01T00:00:00Z",
            "nominalEndTime": "2024-01-02T00:00:00Z",
            "runArgs": {},
            "runState": "NEW"
        })))
        .mount(&server)
        .await;

    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    let config = mock_config(&server);
    let run = blocking(move || {
        MarquezClient::new(config)
            .attach("analytics")
            .start_run("etl_daily", RunArgs::new(), Some(start), Some(end))
    })
    .await
    .unwrap();
    assert_eq!(run.nominal_start_time, Some(start));
    assert_eq!(run.nominal_end_time, Some(end));

    let requests = received(&server).await;
    assert_eq!(requests.len(), 1);
    let sent = body(&requests[0]);
    assert_eq!(sent["runArgs"], json!({}));

    let sent_start = sent["nominalStartTime"].as_str().unwrap();
    let sent_end = sent["nominalEndTime"].as_str().unwrap();
    assert_eq!(
        chrono::DateTime::parse_from_rfc3339(sent_start).unwrap(),
        start
    );
    assert_eq!(chrono::DateTime::parse_from_rfc3339(sent_end).unwrap(), end);
    assert!(sent.get("nominal_start_time").is_none());
}

#[tokio::test]
async fn test_start_run_omits_missing_window() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/namespaces/analytics/jobs/etl_daily/runs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(run_json()))
        .mount(&server)
        .await;

    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let config = mock_config(&server);
    blocking(move || {
        MarquezClient::new(config)
            .attach("analytics")
            .start_run("etl_daily", RunArgs::new(), Some(start), None)
    })
    .await
    .unwrap();

    let sent = body(&received(&server).await[0]);
    assert!(sent.get("nominalStartTime").is_some());
    assert!(sent.get("nominalEndTime").is_none());
}

// ============================================================================
// Runs
// ============================================================================

#[tokio::test]
async fn test_get_run_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/jobs/runs/does-not-exist"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "not found"})))
        .mount(&server)
        .await;

    let config = mock_config(&server);
    let err = blocking(move || HttpBackend::new(&config).get_run("does-not-exist"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::RunNotFound(ref id) if id == "does-not-exist"));
    assert_eq!(
        received(&server).await[0].url.path(),
        "/api/v1/jobs/runs/does-not-exist"
    );
}

#[tokio::test]
async fn test_transition_paths() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(4)
        .mount(&server)
        .await;

    let config = mock_config(&server);
    blocking(move || {
        let backend = HttpBackend::new(&config);
        for transition in RunTransition::ALL {
            backend.transition_run("r1", transition)?;
        }
        Ok::<_, ClientError>(())
    })
    .await
    .unwrap();

    let paths: Vec<(String, String)> = received(&server)
        .await
        .iter()
        .map(|r| (r.method.to_string(), r.url.path().to_string()))
        .collect();
    assert_eq!(
        paths,
        vec![
            ("PUT".to_string(), "/api/v1/jobs/runs/r1/run".to_string()),
            ("PUT".to_string(), "/api/v1/jobs/runs/r1/complete".to_string()),
            ("PUT".to_string(), "/api/v1/jobs/runs/r1/fail".to_string()),
            ("PUT".to_string(), "/api/v1/jobs/runs/r1/abort".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_rejected_transition_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/jobs/runs/r1/complete"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({"error": "run already completed"})),
        )
        .mount(&server)
        .await;

    let config = mock_config(&server);
    let err = blocking(move || {
        HttpBackend::new(&config).transition_run("r1", RunTransition::Completed)
    })
    .await
    .unwrap_err();
    match &err {
        ClientError::Remote { status, message } => {
            assert_eq!(*status, 409);
            assert!(message.contains("run already completed"));
        }
        other => panic!("expected Remote, got {:?}", other),
    }
    assert!(err.is_invalid_transition());
}

#[tokio::test]
async fn test_transition_of_unknown_run_is_remote() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/jobs/runs/missing/run"))
        .respond_with(ResponseTemplate::new(404).set_body_string("run not found"))
        .mount(&server)
        .await;

    let config = mock_config(&server);
    let err = blocking(move || {
        HttpBackend::new(&config).transition_run("missing", RunTransition::Running)
    })
    .await
    .unwrap_err();
    match &err {
        ClientError::Remote { status, message } => {
            assert_eq!(*status, 404);
            assert_eq!(message, "run not found");
        }
        other => panic!("expected Remote, got {:?}", other),
    }
    assert!(!err.is_not_found());
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_server_error_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let config = mock_config(&server);
    let (err, active) = blocking(move || {
        let mut client = MarquezClient::new(config);
        let err = client.bind_namespace("analytics", None, None).unwrap_err();
        let active = client.active_namespace().map(str::to_string);
        (err, active)
    })
    .await;
    assert!(matches!(err, ClientError::Remote { status: 500, ref message } if message == "boom"));
    assert!(matches!(active, Err(ClientError::NotBound)));
}

#[tokio::test]
async fn test_undecodable_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let config = mock_config(&server);
    let err = blocking(move || HttpBackend::new(&config).get_run("r1"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::UnexpectedResponse(_)));
}

#[test]
fn test_connection_refused() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = ClientConfig::new()
        .with_hostname("127.0.0.1")
        .with_port(port)
        .with_request_timeout(Duration::from_secs(2));
    let backend = HttpBackend::new(&config);

    let err = backend.get_run("r1").unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
    assert!(err.is_remote());
}

// ============================================================================
// Datasets and paths
// ============================================================================

#[tokio::test]
async fn test_dataset_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/namespaces/analytics/datasets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"datasets": [
            {"type": "DB_TABLE", "name": "agg.daily", "physicalName": "public.agg_daily", "sourceName": "warehouse"},
            {"type": "STREAM", "name": "raw.events", "schemaLocation": "http://registry/raw.avsc"}
        ]})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/namespaces/analytics/datasets/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = mock_config(&server);
    let (datasets, err) = blocking(move || {
        let backend = HttpBackend::new(&config);
        (
            backend.list_datasets("analytics"),
            backend.get_dataset("analytics", "missing"),
        )
    })
    .await;

    let datasets = datasets.unwrap();
    assert_eq!(datasets.len(), 2);
    assert!(!datasets[0].is_stream());
    assert!(datasets[1].is_stream());
    assert!(matches!(err, Err(ClientError::DatasetNotFound(_))));

    let requests = received(&server).await;
    assert_eq!(requests[0].url.path(), "/api/v1/namespaces/analytics/datasets");
    assert_eq!(
        requests[1].url.path(),
        "/api/v1/namespaces/analytics/datasets/missing"
    );
}

#[tokio::test]
async fn test_path_segments_are_encoded() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "team a"})))
        .mount(&server)
        .await;

    let config = mock_config(&server);
    blocking(move || {
        let mut client = MarquezClient::new(config);
        client.bind_namespace("team a", None, None)
    })
    .await
    .unwrap();

    assert_eq!(
        received(&server).await[0].url.path(),
        "/api/v1/namespaces/team%20a"
    );
}
