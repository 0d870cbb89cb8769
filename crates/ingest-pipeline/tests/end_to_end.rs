//! Full runs through the real HTTP adapters against mock identity, storage,
//! and action runtime endpoints.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use httpmock::prelude::*;
use ingest_core::PipelineStatus;
use ingest_invoker::{ApiKey, OpenWhiskInvoker};
use ingest_pipeline::{DispatchPipeline, DispatchRequest, PipelineError};
use ingest_storage::SwiftObjectStore;
use ingest_telemetry::Metrics;
use ingest_test_support::fixtures::{
    INCOMING_CONTAINER, SAVE_ACTION, sample_credentials, sample_files, swift_listing,
};
use reqwest::Client;
use serde_json::json;
use url::Url;

const SAVE_PATH: &str = "/api/v1/namespaces/_/actions/openchecks/save-check-images";

fn pipeline(server: &MockServer) -> Result<DispatchPipeline> {
    let client = Client::builder().timeout(Duration::from_secs(5)).build()?;
    let store = SwiftObjectStore::with_identity_url(
        client.clone(),
        server.url("/v3/auth/tokens").parse()?,
    )
    .with_storage_root(Url::parse(&server.base_url())?);
    let api_key: ApiKey = "user:secret".parse()?;
    let invoker = OpenWhiskInvoker::new(client, &server.base_url(), api_key)?;
    Ok(DispatchPipeline::new(
        Arc::new(store),
        Arc::new(invoker),
        Metrics::new()?,
    ))
}

fn mock_auth(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(POST).path("/v3/auth/tokens");
        then.status(201)
            .header("X-Subject-Token", "tok-e2e")
            .json_body(json!({"token": {}}));
    })
}

#[tokio::test]
async fn single_file_is_listed_and_dispatched() -> Result<()> {
    let server = MockServer::start_async().await;
    let files = sample_files(1);
    let auth = mock_auth(&server);
    let listing = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/AUTH_p1/incoming")
            .header("x-auth-token", "tok-e2e")
            .header("accept", "application/json");
        then.status(200).json_body(swift_listing(&files));
    });
    let invoke = server.mock(|when, then| {
        when.method(POST)
            .path(SAVE_PATH)
            .query_param("blocking", "false")
            .json_body(json!({
                "fileName": "chk1.png",
                "contentType": "image/png",
                "lastModified": files[0].last_modified
            }));
        then.status(202).json_body(json!({"activationId": "a-1"}));
    });

    let request = DispatchRequest::new(sample_credentials(), INCOMING_CONTAINER, SAVE_ACTION);
    let report = pipeline(&server)?.run(&request).await;

    auth.assert();
    listing.assert();
    invoke.assert();
    assert!(report.result.is_success(), "{:?}", report.result);
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].outcome.activation_id(), Some("a-1"));
    Ok(())
}

#[tokio::test]
async fn empty_container_succeeds_without_invoking() -> Result<()> {
    let server = MockServer::start_async().await;
    mock_auth(&server);
    server.mock(|when, then| {
        when.method(GET).path("/v1/AUTH_p1/incoming");
        then.status(204);
    });

    let request = DispatchRequest::new(sample_credentials(), INCOMING_CONTAINER, SAVE_ACTION);
    let report = pipeline(&server)?.run(&request).await;

    assert!(report.result.is_success());
    assert_eq!(report.files_listed, 0);
    assert!(report.records.is_empty());
    Ok(())
}

#[tokio::test]
async fn rejected_credentials_fail_before_listing() -> Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/v3/auth/tokens");
        then.status(401).body("unauthorized");
    });

    let request = DispatchRequest::new(sample_credentials(), INCOMING_CONTAINER, SAVE_ACTION);
    let report = pipeline(&server)?.run(&request).await;

    assert_eq!(report.result.status, PipelineStatus::Failure);
    assert!(matches!(report.error, Some(PipelineError::Auth { .. })));
    assert_eq!(report.files_listed, 0);
    assert!(report.records.is_empty());
    Ok(())
}

#[tokio::test]
async fn runtime_rejection_fails_the_run() -> Result<()> {
    let server = MockServer::start_async().await;
    let files = sample_files(2);
    mock_auth(&server);
    server.mock(|when, then| {
        when.method(GET).path("/v1/AUTH_p1/incoming");
        then.status(200).json_body(swift_listing(&files));
    });
    server.mock(|when, then| {
        when.method(POST)
            .path(SAVE_PATH)
            .json_body(json!({
                "fileName": "chk1.png",
                "contentType": "image/png",
                "lastModified": files[0].last_modified
            }));
        then.status(202).json_body(json!({"activationId": "a-1"}));
    });
    server.mock(|when, then| {
        when.method(POST)
            .path(SAVE_PATH)
            .json_body(json!({
                "fileName": "chk2.png",
                "contentType": "image/png",
                "lastModified": files[1].last_modified
            }));
        then.status(502).json_body(json!({"error": "action container crashed"}));
    });

    let request = DispatchRequest::new(sample_credentials(), INCOMING_CONTAINER, SAVE_ACTION);
    let report = pipeline(&server)?.run(&request).await;

    assert_eq!(report.result.status, PipelineStatus::Failure);
    assert_eq!(report.activations(), 1);
    let details = report.result.details.unwrap_or_default();
    assert!(details.contains("chk2.png"), "{details}");
    assert!(details.contains("502"), "{details}");
    Ok(())
}
