//! Keystone-authenticated Swift client implementing [`ObjectStore`].

use async_trait::async_trait;
use ingest_core::{
    Credentials, FileDescriptor, ObjectStore, Region, ResponseError, Session, StorageError,
    StorageResult, project_base_url,
};
use reqwest::header::ACCEPT;
use reqwest::{Client, Response, StatusCode};
use serde_json::{Value, json};
use tracing::{debug, info};
use url::Url;

/// Keystone v3 token endpoint used when no override is configured.
pub const DEFAULT_IDENTITY_URL: &str = "https://identity.open.softlayer.com/v3/auth/tokens";
/// Response header carrying the issued token.
pub const HEADER_SUBJECT_TOKEN: &str = "x-subject-token";
/// Request header presenting the token to Swift.
pub const HEADER_AUTH_TOKEN: &str = "x-auth-token";

/// Swift object store reached through a shared HTTP client.
///
/// The client is built once per run by the caller, so timeouts and request
/// identifiers apply uniformly to both storage calls.
#[derive(Clone, Debug)]
pub struct SwiftObjectStore {
    client: Client,
    identity_url: Url,
    storage_root: Option<Url>,
}

impl SwiftObjectStore {
    /// Store that authenticates against [`DEFAULT_IDENTITY_URL`].
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Configuration`] if the default endpoint fails
    /// to parse.
    pub fn new(client: Client) -> StorageResult<Self> {
        let identity_url = DEFAULT_IDENTITY_URL.parse().map_err(|_| {
            StorageError::configuration(
                "identity_url",
                "invalid_url",
                Some(DEFAULT_IDENTITY_URL.to_string()),
            )
        })?;
        Ok(Self::with_identity_url(client, identity_url))
    }

    /// Store that authenticates against a specific identity endpoint.
    #[must_use]
    pub const fn with_identity_url(client: Client, identity_url: Url) -> Self {
        Self {
            client,
            identity_url,
            storage_root: None,
        }
    }

    /// Route storage requests to `root` instead of the region's fixed host.
    ///
    /// The region is still validated so configuration errors surface the same
    /// way regardless of the override.
    #[must_use]
    pub fn with_storage_root(mut self, root: Url) -> Self {
        self.storage_root = Some(root);
        self
    }

    /// Identity endpoint this store authenticates against.
    #[must_use]
    pub const fn identity_url(&self) -> &Url {
        &self.identity_url
    }

    fn base_url(&self, region: Region, project_id: &str) -> StorageResult<Url> {
        match &self.storage_root {
            Some(root) => project_base_url(root, project_id),
            None => region.base_url(project_id),
        }
    }
}

#[async_trait]
impl ObjectStore for SwiftObjectStore {
    async fn authenticate(&self, credentials: &Credentials) -> StorageResult<Session> {
        let region = credentials.region()?;
        let base_url = self.base_url(region, &credentials.project_id)?;
        ensure_present("user_id", &credentials.user_id)?;
        ensure_present("password", &credentials.password)?;

        let url = self.identity_url.to_string();
        debug!(region = %region, identity_url = %url, "requesting storage token");

        let response = self
            .client
            .post(self.identity_url.clone())
            .json(&token_request_body(credentials))
            .send()
            .await
            .map_err(|err| StorageError::auth(url.clone(), err))?;

        if !response.status().is_success() {
            return Err(StorageError::auth(url, status_error(response).await));
        }

        let token = response
            .headers()
            .get(HEADER_SUBJECT_TOKEN)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                StorageError::auth(
                    url.clone(),
                    ResponseError::MissingHeader {
                        name: HEADER_SUBJECT_TOKEN,
                    },
                )
            })?;

        info!(region = %region, base_url = %base_url, "storage session established");
        Ok(Session::new(base_url, token))
    }

    async fn list_files(
        &self,
        session: &Session,
        container: &str,
    ) -> StorageResult<Vec<FileDescriptor>> {
        let url = container_url(session, container)?;
        debug!(container, url = %url, "listing container");

        let response = self
            .client
            .get(url)
            .header(HEADER_AUTH_TOKEN, session.auth_token())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| StorageError::list(container, err))?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(StorageError::list(container, status_error(response).await));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| StorageError::list(container, err))?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let files = serde_json::from_slice::<Vec<FileDescriptor>>(&body).map_err(|source| {
            StorageError::list(container, ResponseError::MalformedBody { source })
        })?;
        info!(container, count = files.len(), "container listed");
        Ok(files)
    }
}

fn ensure_present(field: &'static str, value: &str) -> StorageResult<()> {
    if value.trim().is_empty() {
        return Err(StorageError::configuration(field, "missing", None));
    }
    Ok(())
}

fn container_url(session: &Session, container: &str) -> StorageResult<Url> {
    let trimmed = container.trim();
    if trimmed.is_empty() {
        return Err(StorageError::configuration("container", "empty", None));
    }
    if trimmed.contains(['/', '?', '#']) {
        return Err(StorageError::configuration(
            "container",
            "invalid_characters",
            Some(trimmed.to_string()),
        ));
    }
    session.base_url().join(trimmed).map_err(|_| {
        StorageError::configuration(
            "container",
            "invalid_characters",
            Some(trimmed.to_string()),
        )
    })
}

/// Keystone v3 password authentication scoped to the credential's project.
fn token_request_body(credentials: &Credentials) -> Value {
    json!({
        "auth": {
            "identity": {
                "methods": ["password"],
                "password": {
                    "user": {
                        "id": credentials.user_id,
                        "password": credentials.password
                    }
                }
            },
            "scope": {
                "project": {
                    "id": credentials.project_id
                }
            }
        }
    })
}

async fn status_error(response: Response) -> ResponseError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .ok()
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty());
    ResponseError::Status { status, body }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow};
    use httpmock::prelude::*;
    use std::error::Error as _;

    fn store_for(server: &MockServer) -> Result<SwiftObjectStore> {
        let identity_url = server.url("/v3/auth/tokens").parse()?;
        let root = server.base_url().parse()?;
        Ok(SwiftObjectStore::with_identity_url(Client::new(), identity_url)
            .with_storage_root(root))
    }

    fn credentials() -> Credentials {
        Credentials::new("dallas", "p1", "user-1", "secret")
    }

    fn session_for(server: &MockServer) -> Result<Session> {
        let root: Url = server.base_url().parse()?;
        Ok(Session::new(project_base_url(&root, "p1")?, "tok-1"))
    }

    #[test]
    fn default_store_targets_public_identity_endpoint() -> Result<()> {
        let store = SwiftObjectStore::new(Client::new())?;
        assert_eq!(store.identity_url().as_str(), DEFAULT_IDENTITY_URL);
        Ok(())
    }

    #[tokio::test]
    async fn authenticate_posts_password_scope_and_reads_subject_token() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path("/v3/auth/tokens").json_body(json!({
                "auth": {
                    "identity": {
                        "methods": ["password"],
                        "password": {"user": {"id": "user-1", "password": "secret"}}
                    },
                    "scope": {"project": {"id": "p1"}}
                }
            }));
            then.status(201)
                .header("X-Subject-Token", "tok-1")
                .json_body(json!({"token": {}}));
        });

        let session = store_for(&server)?.authenticate(&credentials()).await?;

        mock.assert();
        assert_eq!(session.auth_token(), "tok-1");
        assert_eq!(
            session.base_url().as_str(),
            format!("{}/v1/AUTH_p1/", server.base_url())
        );
        Ok(())
    }

    #[tokio::test]
    async fn authenticate_without_override_uses_region_host() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/v3/auth/tokens");
            then.status(201).header("X-Subject-Token", "tok-1");
        });
        let identity_url = server.url("/v3/auth/tokens").parse()?;
        let store = SwiftObjectStore::with_identity_url(Client::new(), identity_url);

        let session = store
            .authenticate(&Credentials::new("london", "p9", "user-1", "secret"))
            .await?;

        assert_eq!(
            session.base_url().as_str(),
            "https://lon.objectstorage.open.softlayer.com/v1/AUTH_p9/"
        );
        Ok(())
    }

    #[tokio::test]
    async fn authenticate_rejects_unknown_region_before_any_request() -> Result<()> {
        // Nothing listens on the discard port: any request would surface as `Auth`.
        let store = SwiftObjectStore::with_identity_url(
            Client::new(),
            "http://127.0.0.1:9/v3/auth/tokens".parse()?,
        );

        let err = store
            .authenticate(&Credentials::new("frankfurt", "p1", "user-1", "secret"))
            .await
            .err()
            .ok_or_else(|| anyhow!("unknown region must fail"))?;

        assert!(matches!(
            err,
            StorageError::Configuration {
                field: "region",
                reason: "unsupported_region",
                ..
            }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn authenticate_rejects_blank_password_before_any_request() -> Result<()> {
        let store = SwiftObjectStore::with_identity_url(
            Client::new(),
            "http://127.0.0.1:9/v3/auth/tokens".parse()?,
        );

        let result = store
            .authenticate(&Credentials::new("dallas", "p1", "user-1", "  "))
            .await;

        assert!(matches!(
            result,
            Err(StorageError::Configuration {
                field: "password",
                ..
            })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn authenticate_maps_rejected_credentials_to_auth_error() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/v3/auth/tokens");
            then.status(401).body("The request you have made requires authentication.");
        });

        let err = store_for(&server)?
            .authenticate(&credentials())
            .await
            .err()
            .ok_or_else(|| anyhow!("401 must fail"))?;

        assert_eq!(err.kind(), "auth");
        let cause = err.source().map(ToString::to_string);
        assert_eq!(cause.as_deref(), Some("unexpected HTTP status 401"));
        Ok(())
    }

    #[tokio::test]
    async fn authenticate_requires_subject_token_header() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/v3/auth/tokens");
            then.status(201).json_body(json!({"token": {}}));
        });

        let err = store_for(&server)?
            .authenticate(&credentials())
            .await
            .err()
            .ok_or_else(|| anyhow!("missing header must fail"))?;

        assert_eq!(err.kind(), "auth");
        let cause = err.source().map(ToString::to_string);
        assert_eq!(
            cause.as_deref(),
            Some("response header 'x-subject-token' missing or invalid")
        );
        Ok(())
    }

    #[tokio::test]
    async fn authenticate_maps_transport_failure_to_auth_error() -> Result<()> {
        let store = SwiftObjectStore::with_identity_url(
            Client::new(),
            "http://127.0.0.1:9/v3/auth/tokens".parse()?,
        );

        let result = store.authenticate(&credentials()).await;

        assert!(matches!(result, Err(StorageError::Auth { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn list_files_sends_token_and_decodes_entries() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/v1/AUTH_p1/incoming")
                .header(HEADER_AUTH_TOKEN, "tok-1")
                .header("accept", "application/json");
            then.status(200).json_body(json!([
                {
                    "name": "chk1.png",
                    "content_type": "image/png",
                    "last_modified": "t1",
                    "bytes": 10,
                    "hash": "h1"
                },
                {
                    "name": "chk2.jpg",
                    "content_type": "image/jpeg",
                    "last_modified": "t2",
                    "bytes": 20,
                    "hash": "h2"
                }
            ]));
        });

        let files = store_for(&server)?
            .list_files(&session_for(&server)?, "incoming")
            .await?;

        mock.assert();
        assert_eq!(
            files,
            vec![
                FileDescriptor::new("chk1.png", "image/png", "t1"),
                FileDescriptor::new("chk2.jpg", "image/jpeg", "t2"),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn list_files_treats_empty_container_as_success() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/v1/AUTH_p1/empty-array");
            then.status(200).json_body(json!([]));
        });
        server.mock(|when, then| {
            when.method(GET).path("/v1/AUTH_p1/no-content");
            then.status(204);
        });
        let store = store_for(&server)?;
        let session = session_for(&server)?;

        assert!(store.list_files(&session, "empty-array").await?.is_empty());
        assert!(store.list_files(&session, "no-content").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn list_files_maps_status_and_body_failures_to_list_error() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/v1/AUTH_p1/forbidden");
            then.status(403).body("forbidden");
        });
        server.mock(|when, then| {
            when.method(GET).path("/v1/AUTH_p1/garbled");
            then.status(200).body("{not json");
        });
        server.mock(|when, then| {
            when.method(GET).path("/v1/AUTH_p1/partial");
            then.status(200).json_body(json!([{"name": "only-name"}]));
        });
        let store = store_for(&server)?;
        let session = session_for(&server)?;

        for container in ["forbidden", "garbled", "partial"] {
            let err = store
                .list_files(&session, container)
                .await
                .err()
                .ok_or_else(|| anyhow!("{container} must fail"))?;
            assert!(
                matches!(&err, StorageError::List { container: name, .. } if name == container),
                "unexpected error for {container}: {err:?}"
            );
        }
        Ok(())
    }

    #[tokio::test]
    async fn list_files_rejects_unusable_container_names() -> Result<()> {
        let server = MockServer::start_async().await;
        let store = store_for(&server)?;
        let session = session_for(&server)?;

        for container in ["", "   ", "a/b"] {
            let result = store.list_files(&session, container).await;
            assert!(
                matches!(
                    result,
                    Err(StorageError::Configuration {
                        field: "container",
                        ..
                    })
                ),
                "{container:?} should be rejected"
            );
        }
        Ok(())
    }
}
