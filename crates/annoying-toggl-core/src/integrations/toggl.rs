//! Toggl Track integration -- typed client over the v9 REST API.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use chrono::Utc;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::models::{EntryUpdate, NewTimeEntry, TimeEntry, Workspace};
use super::traits::{CallObserver, TimeTracker};
use crate::error::{ConfigError, RemoteError};

pub const DEFAULT_BASE_URL: &str = "https://api.track.toggl.com/api/v9";

/// Password half of the Basic credential when authenticating with an API token.
const TOKEN_PASSWORD: &str = "api_token";

pub struct TogglClient {
    base_url: String,
    auth_header: String,
    http_client: Client,
    on_call: Option<CallObserver>,
}

impl TogglClient {
    /// Client against the public Toggl endpoint.
    pub fn new(api_token: &str) -> Result<Self, ConfigError> {
        Self::with_base_url(api_token, DEFAULT_BASE_URL, Duration::from_secs(30))
    }

    /// Client against an explicit base URL (self-hosted proxy, tests).
    pub fn with_base_url(
        api_token: &str,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        if api_token.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "api_token".into(),
                message: "token is empty".into(),
            });
        }
        Url::parse(base_url).map_err(|e| ConfigError::InvalidValue {
            key: "api.base_url".into(),
            message: e.to_string(),
        })?;

        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                key: "api.timeout_secs".into(),
                message: e.to_string(),
            })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_header: basic_auth_header(api_token),
            http_client,
            on_call: None,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        if let Some(observer) = &self.on_call {
            observer();
        }
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "toggl request");
        self.http_client
            .request(method, url)
            .header("Authorization", &self.auth_header)
            .header("Content-Type", "application/json")
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, RemoteError> {
        let body = checked_body(builder.send().await?).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// `Basic base64(<token>:api_token)`.
pub fn basic_auth_header(api_token: &str) -> String {
    let credentials = format!("{api_token}:{TOKEN_PASSWORD}");
    format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode(credentials)
    )
}

async fn checked_body(resp: Response) -> Result<String, RemoteError> {
    let status = resp.status();
    let text = resp.text().await?;
    if status.is_success() {
        Ok(text)
    } else {
        Err(RemoteError::Status {
            status: status.as_u16(),
            body: text,
        })
    }
}

#[async_trait]
impl TimeTracker for TogglClient {
    async fn current_entry(&self) -> Result<Option<TimeEntry>, RemoteError> {
        let resp = self
            .request(Method::GET, "/me/time_entries/current")
            .send()
            .await?;
        let body = checked_body(resp).await?;
        if body.trim().is_empty() {
            debug!("no current timer");
            return Ok(None);
        }
        // `null` decodes to `None`.
        let entry: Option<TimeEntry> = serde_json::from_str(&body)?;
        Ok(entry)
    }

    async fn workspaces(&self) -> Result<Vec<Workspace>, RemoteError> {
        let workspaces: Vec<Workspace> = self.send(self.request(Method::GET, "/workspaces")).await?;
        debug!(count = workspaces.len(), "fetched workspaces");
        Ok(workspaces)
    }

    async fn recent_entries(&self) -> Result<Vec<TimeEntry>, RemoteError> {
        let entries: Vec<TimeEntry> = self
            .send(self.request(Method::GET, "/me/time_entries"))
            .await?;
        debug!(count = entries.len(), "fetched recent entries");
        Ok(entries)
    }

    async fn start_entry(
        &self,
        description: &str,
        workspace_id: i64,
    ) -> Result<TimeEntry, RemoteError> {
        let body = NewTimeEntry::running(description, workspace_id, Utc::now());
        let path = format!("/workspaces/{workspace_id}/time_entries");
        self.send(self.request(Method::POST, &path).json(&body)).await
    }

    async fn stop_entry(&self, entry_id: i64, workspace_id: i64) -> Result<TimeEntry, RemoteError> {
        let path = format!("/workspaces/{workspace_id}/time_entries/{entry_id}/stop");
        self.send(self.request(Method::PATCH, &path)).await
    }

    async fn update_entry(
        &self,
        entry_id: i64,
        workspace_id: i64,
        description: &str,
    ) -> Result<TimeEntry, RemoteError> {
        let path = format!("/workspaces/{workspace_id}/time_entries/{entry_id}");
        self.send(
            self.request(Method::PUT, &path)
                .json(&EntryUpdate { description }),
        )
        .await
    }

    fn set_call_observer(&mut self, observer: CallObserver) {
        self.on_call = Some(observer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const ENTRY_JSON: &str = r#"{"id":42,"wid":7,"pid":null,"billable":false,
        "start":"2024-03-01T09:00:00+00:00","duration":-1,
        "description":"Writing docs","at":"2024-03-01T09:00:05+00:00"}"#;

    fn client(server: &Server) -> TogglClient {
        TogglClient::with_base_url("tok123", &server.url(), Duration::from_secs(5)).unwrap()
    }

    fn counted(client: &mut TogglClient) -> Arc<AtomicUsize> {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        client.set_call_observer(Arc::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        calls
    }

    #[test]
    fn auth_header_encodes_token_and_literal_password() {
        // base64("tok123:api_token")
        assert_eq!(basic_auth_header("tok123"), "Basic dG9rMTIzOmFwaV90b2tlbg==");
    }

    #[test]
    fn rejects_empty_token_and_bad_url() {
        assert!(TogglClient::new("  ").is_err());
        assert!(TogglClient::with_base_url("t", "not a url", Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn current_entry_parses_running_entry() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/me/time_entries/current")
            .match_header("authorization", basic_auth_header("tok123").as_str())
            .with_status(200)
            .with_body(ENTRY_JSON)
            .create_async()
            .await;

        let entry = client(&server).current_entry().await.unwrap().unwrap();
        assert_eq!(entry.id, 42);
        assert_eq!(entry.description, "Writing docs");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn current_entry_null_is_none() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/me/time_entries/current")
            .with_status(200)
            .with_body("null")
            .create_async()
            .await;

        assert!(client(&server).current_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn malformed_body_is_decode_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/me/time_entries/current")
            .with_status(200)
            .with_body("{\"id\": \"oops\"")
            .create_async()
            .await;

        let err = client(&server).current_entry().await.unwrap_err();
        assert!(matches!(err, RemoteError::Decode(_)));
    }

    #[tokio::test]
    async fn non_success_status_is_status_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/workspaces")
            .with_status(403)
            .with_body("Incorrect username and/or password")
            .create_async()
            .await;

        let err = client(&server).workspaces().await.unwrap_err();
        match err {
            RemoteError::Status { status, body } => {
                assert_eq!(status, 403);
                assert!(body.contains("Incorrect"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn workspaces_keep_service_order() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/workspaces")
            .with_status(200)
            .with_body(r#"[{"id":7,"name":"Personal"},{"id":9,"name":"Work"}]"#)
            .create_async()
            .await;

        let ws = client(&server).workspaces().await.unwrap();
        assert_eq!(ws.len(), 2);
        assert_eq!(ws[0].id, 7);
    }

    #[tokio::test]
    async fn start_entry_posts_running_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/workspaces/7/time_entries")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "description": "Writing docs",
                "workspace_id": 7,
                "duration": -1,
                "stop": null,
            })))
            .with_status(200)
            .with_body(ENTRY_JSON)
            .create_async()
            .await;

        let entry = client(&server).start_entry("Writing docs", 7).await.unwrap();
        assert_eq!(entry.id, 42);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn stop_and_update_hit_entry_paths() {
        let mut server = Server::new_async().await;
        let stop = server
            .mock("PATCH", "/workspaces/7/time_entries/42/stop")
            .with_status(200)
            .with_body(ENTRY_JSON)
            .create_async()
            .await;
        let update = server
            .mock("PUT", "/workspaces/7/time_entries/42")
            .match_body(Matcher::Json(serde_json::json!({"description": "Renamed"})))
            .with_status(200)
            .with_body(ENTRY_JSON)
            .create_async()
            .await;

        let c = client(&server);
        c.stop_entry(42, 7).await.unwrap();
        c.update_entry(42, 7, "Renamed").await.unwrap();
        stop.assert_async().await;
        update.assert_async().await;
    }

    #[tokio::test]
    async fn observer_fires_once_per_call_even_on_failure() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/me/time_entries")
            .with_status(500)
            .create_async()
            .await;
        server
            .mock("GET", "/me/time_entries/current")
            .with_status(200)
            .with_body("null")
            .create_async()
            .await;

        let mut c = client(&server);
        let calls = counted(&mut c);
        assert!(c.recent_entries().await.is_err());
        assert!(c.current_entry().await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
