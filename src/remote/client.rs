//! HTTP client for the platform's snapshot API
//!
//! Blocking requests with a bounded timeout and bearer authentication.

use std::path::Path;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use super::SnapshotApi;
use crate::config::BackupConfig;
use crate::error::{BackupError, BackupResult};
use crate::models::{ResourceSelection, Snapshot, SnapshotId};
use crate::storage::copy_atomic;

/// User-Agent string for all HTTP requests
pub const USER_AGENT: &str = concat!("coveo-backup/", env!("CARGO_PKG_VERSION"));

/// Longest slice of an error body carried into error messages
const MAX_ERROR_BODY: usize = 300;

/// Snapshot API client for one organization
pub struct PlatformClient {
    http: Client,
    base_url: Url,
    organization_id: String,
    api_key: String,
    include_children: bool,
}

#[derive(Deserialize)]
struct CreatedSnapshot {
    id: String,
}

impl PlatformClient {
    /// Create a client for `organization_id` rooted at `base_url`
    /// (e.g. `https://platform-eu.cloud.coveo.com/rest`)
    pub fn new(
        base_url: &str,
        organization_id: &str,
        api_key: &str,
        timeout: Duration,
    ) -> BackupResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| BackupError::Config(format!("Invalid platform URL '{}': {}", base_url, e)))?;

        if base_url.cannot_be_a_base() {
            return Err(BackupError::Config(format!(
                "Invalid platform URL '{}'",
                base_url
            )));
        }

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| BackupError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            organization_id: organization_id.to_string(),
            api_key: api_key.to_string(),
            include_children: true,
        })
    }

    /// Create a client from the run configuration
    pub fn from_config(config: &BackupConfig) -> BackupResult<Self> {
        let mut client = Self::new(
            &config.settings.platform_url,
            &config.organization_id,
            config.api_key.expose(),
            config.settings.request_timeout(),
        )?;
        client.include_children = config.settings.include_children_resources;
        Ok(client)
    }

    /// `<base>/organizations/<org>/snapshots[/<extra>...]`
    fn snapshots_url(&self, extra: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["organizations", self.organization_id.as_str(), "snapshots"])
                .extend(extra);
        }
        url
    }

    fn send(
        &self,
        operation: &'static str,
        request: reqwest::blocking::RequestBuilder,
    ) -> BackupResult<Response> {
        let response = request
            .bearer_auth(&self.api_key)
            .send()
            .map_err(|e| BackupError::remote(operation, describe_transport_error(&e)))?;

        check_status(operation, response)
    }
}

impl SnapshotApi for PlatformClient {
    fn create(&self, name: &str, resources: &ResourceSelection) -> BackupResult<SnapshotId> {
        let url = self.snapshots_url(&[]);
        let body = json!({
            "resourcesToExport": resources,
            "developerNotes": format!("Snapshot - {}", name),
            "includeChildrenResources": self.include_children,
        });

        debug!(%url, "Creating snapshot");
        let response = self.send("create", self.http.post(url).json(&body))?;

        let created: CreatedSnapshot = response
            .json()
            .map_err(|e| BackupError::remote("create", format!("Malformed response: {}", e)))?;

        if created.id.trim().is_empty() {
            return Err(BackupError::remote("create", "Response carried an empty id"));
        }

        Ok(SnapshotId::new(created.id))
    }

    fn fetch_status(&self, id: &SnapshotId) -> BackupResult<Snapshot> {
        let url = self.snapshots_url(&[id.as_str()]);
        let response = self.send("status", self.http.get(url))?;

        let mut snapshot: Snapshot = response
            .json()
            .map_err(|e| BackupError::remote("status", format!("Malformed response: {}", e)))?;
        if snapshot.id.is_empty() {
            snapshot.id = id.clone();
        }
        Ok(snapshot)
    }

    fn export_content(&self, id: &SnapshotId, destination: &Path) -> BackupResult<u64> {
        let url = self.snapshots_url(&[id.as_str(), "content"]);

        let mut response = self
            .send("export", self.http.get(url))
            .map_err(|e| BackupError::Export(e.to_string()))?;

        let written = copy_atomic(destination, &mut response).map_err(|e| {
            BackupError::Export(format!(
                "Download of snapshot {} interrupted: {}",
                id, e
            ))
        })?;

        info!(snapshot_id = %id, bytes = written, path = %destination.display(), "Downloaded snapshot content");
        Ok(written)
    }

    fn delete(&self, id: &SnapshotId) -> BackupResult<()> {
        let url = self.snapshots_url(&[id.as_str()]);
        self.send("delete", self.http.delete(url))?;
        Ok(())
    }
}

/// Turn a non-success response into an error carrying status and body
fn check_status(operation: &'static str, response: Response) -> BackupResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    let body = body.trim();
    let message = if body.is_empty() {
        format!("HTTP {}", status)
    } else {
        let snippet: String = body.chars().take(MAX_ERROR_BODY).collect();
        format!("HTTP {}: {}", status, snippet)
    };

    Err(BackupError::remote(operation, message))
}

fn describe_transport_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("request timed out: {}", err)
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ResourceCategory, SnapshotStatus};
    use crate::remote::PollPolicy;
    use crate::storage::partial_path;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ORG: &str = "myorg";
    const KEY: &str = "xx-test-key";

    fn client(server: &MockServer) -> PlatformClient {
        // Blocking reqwest clients cannot be built inside an async runtime
        let base = format!("{}/rest", server.uri());
        std::thread::spawn(move || {
            PlatformClient::new(&base, ORG, KEY, Duration::from_secs(5)).unwrap()
        })
        .join()
        .unwrap()
    }

    /// Blocking reqwest must not run on the async test runtime's threads
    async fn blocking<T, F>(f: F) -> T
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        tokio::task::spawn_blocking(f).await.unwrap()
    }

    #[test]
    fn test_snapshot_urls() {
        let client = PlatformClient::new(
            "https://platform-eu.cloud.coveo.com/rest/",
            "my org",
            KEY,
            Duration::from_secs(1),
        )
        .unwrap();

        assert_eq!(
            client.snapshots_url(&[]).as_str(),
            "https://platform-eu.cloud.coveo.com/rest/organizations/my%20org/snapshots"
        );
        assert_eq!(
            client.snapshots_url(&["s1", "content"]).as_str(),
            "https://platform-eu.cloud.coveo.com/rest/organizations/my%20org/snapshots/s1/content"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = PlatformClient::new("not a url", ORG, KEY, Duration::from_secs(1))
            .err()
            .unwrap();
        assert!(err.is_config());
    }

    #[tokio::test]
    async fn test_create_sends_selection_and_returns_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/organizations/myorg/snapshots"))
            .and(header("authorization", "Bearer xx-test-key"))
            .and(body_partial_json(json!({
                "resourcesToExport": {"FIELD": ["*"], "SOURCE": ["*"]},
                "developerNotes": "Snapshot - snapshot_20250101_120000",
                "includeChildrenResources": true
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "snap-1"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let id = blocking(move || {
            let selection = ResourceSelection::from_categories([
                ResourceCategory::Field,
                ResourceCategory::Source,
            ]);
            client.create("snapshot_20250101_120000", &selection)
        })
        .await
        .unwrap();

        assert_eq!(id.as_str(), "snap-1");
    }

    #[tokio::test]
    async fn test_create_without_id_is_remote_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "PENDING"})))
            .mount(&server)
            .await;

        let client = client(&server);
        let err = blocking(move || client.create("s", &ResourceSelection::all()))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BackupError::RemoteRequest {
                operation: "create",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_create_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
            .mount(&server)
            .await;

        let client = client(&server);
        let err = blocking(move || client.create("s", &ResourceSelection::all()))
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("401"));
        assert!(message.contains("invalid token"));
    }

    #[tokio::test]
    async fn test_poll_until_completed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/organizations/myorg/snapshots/snap-1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": "snap-1", "status": "IN_PROGRESS"})),
            )
            .up_to_n_times(2)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/organizations/myorg/snapshots/snap-1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": "snap-1", "status": "COMPLETED"})),
            )
            .mount(&server)
            .await;

        let client = client(&server);
        let snapshot = blocking(move || {
            client.await_ready(
                &SnapshotId::from("snap-1"),
                &PollPolicy::new(Duration::from_millis(10), 5),
            )
        })
        .await
        .unwrap();

        assert_eq!(snapshot.status, SnapshotStatus::Completed);
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_status_without_id_keeps_polling() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/organizations/myorg/snapshots/snap-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "PENDING"})))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/organizations/myorg/snapshots/snap-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "COMPLETED"})))
            .mount(&server)
            .await;

        let client = client(&server);
        let snapshot = blocking(move || {
            client.await_ready(
                &SnapshotId::from("snap-1"),
                &PollPolicy::new(Duration::from_millis(10), 5),
            )
        })
        .await
        .unwrap();

        assert_eq!(snapshot.id.as_str(), "snap-1");
        assert_eq!(snapshot.status, SnapshotStatus::Completed);
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_export_writes_bytes() {
        let server = MockServer::start().await;
        let payload = b"PK\x03\x04 archive payload".to_vec();
        Mock::given(method("GET"))
            .and(path("/rest/organizations/myorg/snapshots/snap-1/content"))
            .and(header("authorization", "Bearer xx-test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone()))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("pending").join("snapshot.zip");
        let client = client(&server);
        let target = dest.clone();
        let written = blocking(move || client.export_content(&SnapshotId::from("snap-1"), &target))
            .await
            .unwrap();

        assert_eq!(written as usize, payload.len());
        assert_eq!(std::fs::read(&dest).unwrap(), payload);
        assert!(!partial_path(&dest).exists());
    }

    #[tokio::test]
    async fn test_export_failure_leaves_no_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("snapshot.zip");
        let client = client(&server);
        let target = dest.clone();
        let err = blocking(move || client.export_content(&SnapshotId::from("snap-1"), &target))
            .await
            .unwrap_err();

        assert!(matches!(err, BackupError::Export(_)));
        assert!(!dest.exists());
        assert!(!partial_path(&dest).exists());
    }

    #[tokio::test]
    async fn test_delete() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/rest/organizations/myorg/snapshots/snap-1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        blocking(move || client.delete(&SnapshotId::from("snap-1")))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_not_found_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client(&server);
        let result = blocking(move || client.delete(&SnapshotId::from("gone"))).await;
        assert!(result.is_err());
    }
}
