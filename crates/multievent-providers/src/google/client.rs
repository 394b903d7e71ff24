//! Google Calendar API v3 client.

use std::sync::Arc;

use multievent_core::EventResource;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::auth::{Credential, TokenSource};
use crate::error::{ProviderError, ProviderResult};
use crate::provider::{
    BoxFuture, CalendarApi, CalendarListOptions, CalendarListResult, InsertedEvent,
};

use super::config::GoogleConfig;

const PROVIDER: &str = "google";

/// Authenticated Calendar API client.
///
/// Every request carries the current bearer credential. When the API answers
/// 401, the credential is removed from the token source exactly once, a
/// fresh one is fetched silently to replace it, and the call still fails
/// with the 401. Nothing is retried.
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
    base_url: String,
    credential: RwLock<Credential>,
    token_source: Arc<dyn TokenSource>,
}

impl GoogleCalendarClient {
    pub fn new(
        config: &GoogleConfig,
        credential: Credential,
        token_source: Arc<dyn TokenSource>,
    ) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| ProviderError::internal("failed to create HTTP client").with_source(e))?;

        Ok(Self::with_http_client(
            http_client,
            &config.api_base_url,
            credential,
            token_source,
        ))
    }

    pub(crate) fn with_http_client(
        http_client: reqwest::Client,
        base_url: &str,
        credential: Credential,
        token_source: Arc<dyn TokenSource>,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credential: RwLock::new(credential),
            token_source,
        }
    }

    /// The credential the next request will use.
    pub async fn credential(&self) -> Credential {
        self.credential.read().await.clone()
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&EventResource>,
    ) -> ProviderResult<T> {
        let credential = self.credential().await;
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);

        let mut request = self
            .http_client
            .request(method, &url)
            .bearer_auth(credential.as_str());
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            let message = if e.is_timeout() {
                "request timed out".to_string()
            } else if e.is_connect() {
                format!("connection failed: {}", e)
            } else {
                format!("request failed: {}", e)
            };
            ProviderError::network(message).with_provider(PROVIDER).with_source(e)
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            ProviderError::network("failed to read response")
                .with_provider(PROVIDER)
                .with_source(e)
        })?;

        if status == StatusCode::UNAUTHORIZED {
            self.handle_unauthorized(&credential).await;
        }

        if !status.is_success() {
            let message = extract_error_message(&text);
            return Err(ProviderError::api(status.as_u16(), message).with_provider(PROVIDER));
        }

        serde_json::from_str(&text).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse response: {}", e))
                .with_provider(PROVIDER)
        })
    }

    /// Drops the rejected credential and installs a fresh one, if one can
    /// be had without prompting.
    async fn handle_unauthorized(&self, rejected: &Credential) {
        warn!("credential rejected by Google, discarding it");
        if let Err(e) = self.token_source.remove_cached_token(rejected).await {
            warn!("failed to remove rejected token: {}", e);
        }

        match self.token_source.get_token(false).await {
            Ok(fresh) => {
                let mut current = self.credential.write().await;
                // A concurrent call may already have replaced it.
                if *current == *rejected {
                    *current = fresh;
                    debug!("installed fresh credential");
                }
            }
            Err(e) => debug!("no credential available silently: {}", e),
        }
    }
}

/// Pulls a human-readable message out of an error body.
///
/// Looks for a top-level `message`, then Google's `error.message`. Any
/// other body, empty ones included, is returned as received.
pub fn extract_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let message = value
            .get("message")
            .and_then(|m| m.as_str())
            .or_else(|| value.pointer("/error/message").and_then(|m| m.as_str()));
        if let Some(message) = message {
            return message.to_string();
        }
    }

    body.to_string()
}

impl CalendarApi for GoogleCalendarClient {
    fn list(
        &self,
        options: CalendarListOptions,
    ) -> BoxFuture<'_, ProviderResult<CalendarListResult>> {
        Box::pin(async move {
            self.request(
                Method::GET,
                "/users/me/calendarList",
                &options.query_pairs(),
                None,
            )
            .await
        })
    }

    fn insert_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event: &'a EventResource,
    ) -> BoxFuture<'a, ProviderResult<InsertedEvent>> {
        Box::pin(async move {
            let path = format!("/calendars/{}/events", urlencoding::encode(calendar_id));
            self.request(Method::POST, &path, &[], Some(event)).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use chrono::{FixedOffset, TimeZone};
    use multievent_core::EventDraft;
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// A request as the test server saw it.
    #[derive(Debug)]
    struct Recorded {
        request_line: String,
        /// Header lines, lowercased.
        headers: Vec<String>,
        body: String,
    }

    impl Recorded {
        fn has_header(&self, line: &str) -> bool {
            self.headers.iter().any(|h| h == line)
        }
    }

    /// Serves `responses` in order, one connection each.
    async fn serve(responses: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<Recorded>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/calendar/v3", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let mut recorded = Vec::new();
            for (status, body) in responses {
                let (stream, _) = listener.accept().await.unwrap();
                let mut reader = BufReader::new(stream);

                let mut request_line = String::new();
                reader.read_line(&mut request_line).await.unwrap();

                let mut headers = Vec::new();
                let mut content_length = 0usize;
                loop {
                    let mut line = String::new();
                    reader.read_line(&mut line).await.unwrap();
                    let line = line.trim_end().to_lowercase();
                    if line.is_empty() {
                        break;
                    }
                    if let Some(len) = line.strip_prefix("content-length: ") {
                        content_length = len.parse().unwrap();
                    }
                    headers.push(line);
                }

                let mut body_bytes = vec![0u8; content_length];
                reader.read_exact(&mut body_bytes).await.unwrap();

                let response = format!(
                    "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let stream = reader.get_mut();
                stream.write_all(response.as_bytes()).await.unwrap();
                stream.shutdown().await.unwrap();

                recorded.push(Recorded {
                    request_line: request_line.trim_end().to_string(),
                    headers,
                    body: String::from_utf8(body_bytes).unwrap(),
                });
            }
            recorded
        });

        (base_url, handle)
    }

    /// Token source that records removals and hands out `next` silently.
    struct RecordingSource {
        removed: Mutex<Vec<String>>,
        silent_calls: Mutex<usize>,
        next: Option<&'static str>,
    }

    impl RecordingSource {
        fn new(next: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                removed: Mutex::new(Vec::new()),
                silent_calls: Mutex::new(0),
                next,
            })
        }
    }

    impl TokenSource for RecordingSource {
        fn get_token(&self, interactive: bool) -> BoxFuture<'_, ProviderResult<Credential>> {
            assert!(!interactive, "client must never prompt");
            *self.silent_calls.lock().unwrap() += 1;
            let result = self
                .next
                .map(Credential::new)
                .ok_or_else(|| ProviderError::authentication("not signed in"));
            Box::pin(async move { result })
        }

        fn remove_cached_token<'a>(
            &'a self,
            token: &'a Credential,
        ) -> BoxFuture<'a, ProviderResult<()>> {
            self.removed.lock().unwrap().push(token.as_str().to_string());
            Box::pin(async { Ok(()) })
        }
    }

    fn client(base_url: &str, source: Arc<RecordingSource>) -> GoogleCalendarClient {
        let http_client = reqwest::Client::builder().no_proxy().build().unwrap();
        GoogleCalendarClient::with_http_client(
            http_client,
            base_url,
            Credential::new("tok-1"),
            source,
        )
    }

    fn standup() -> EventResource {
        let tz = FixedOffset::east_opt(3600).unwrap();
        EventDraft {
            title: "Standup".to_string(),
            start: tz.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
            duration: chrono::Duration::minutes(90),
            reminder_override_minutes: Some(10),
        }
        .to_resource()
    }

    #[tokio::test]
    async fn list_sends_bearer_and_query() {
        let (base_url, server) = serve(vec![(
            200,
            r#"{"items":[{"id":"primary@example.com","summary":"Me","accessRole":"owner"}],"nextPageToken":"p2"}"#,
        )])
        .await;
        let client = client(&base_url, RecordingSource::new(None));

        let page = client.list(CalendarListOptions::writable()).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].summary, "Me");
        assert_eq!(page.next_page_token.as_deref(), Some("p2"));

        let requests = server.await.unwrap();
        assert_eq!(
            requests[0].request_line,
            "GET /calendar/v3/users/me/calendarList?minAccessRole=writer&showDeleted=false HTTP/1.1"
        );
        assert!(requests[0].has_header("authorization: bearer tok-1"));
    }

    #[tokio::test]
    async fn insert_posts_event_json() {
        let (base_url, server) = serve(vec![(
            200,
            r#"{"id":"evt1","status":"confirmed","summary":"Standup"}"#,
        )])
        .await;
        let client = client(&base_url, RecordingSource::new(None));

        let inserted = client
            .insert_event("team@group.calendar.google.com", &standup())
            .await
            .unwrap();
        assert_eq!(inserted.id, "evt1");

        let requests = server.await.unwrap();
        assert_eq!(
            requests[0].request_line,
            "POST /calendar/v3/calendars/team%40group.calendar.google.com/events HTTP/1.1"
        );
        assert!(requests[0].has_header("content-type: application/json"));

        let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(body["summary"], "Standup");
        assert_eq!(body["start"]["dateTime"], "2024-01-01T09:00:00+01:00");
        assert_eq!(body["end"]["dateTime"], "2024-01-01T10:30:00+01:00");
        assert_eq!(body["reminders"]["useDefault"], false);
        assert_eq!(body["reminders"]["overrides"][0]["method"], "popup");
        assert_eq!(body["reminders"]["overrides"][0]["minutes"], 10);
    }

    #[tokio::test]
    async fn unauthorized_removes_token_once_and_replaces_it() {
        let (base_url, server) = serve(vec![
            (
                401,
                r#"{"error":{"code":401,"message":"Invalid Credentials","status":"UNAUTHENTICATED"}}"#,
            ),
            (200, r#"{"items":[]}"#),
        ])
        .await;
        let source = RecordingSource::new(Some("tok-2"));
        let client = client(&base_url, source.clone());

        let err = client.list(CalendarListOptions::writable()).await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert!(err.is_unauthorized());
        assert_eq!(err.message(), "Invalid Credentials");

        assert_eq!(*source.removed.lock().unwrap(), vec!["tok-1".to_string()]);
        assert_eq!(*source.silent_calls.lock().unwrap(), 1);
        assert_eq!(client.credential().await.as_str(), "tok-2");

        // The next call goes out with the replacement.
        client.list(CalendarListOptions::writable()).await.unwrap();
        let requests = server.await.unwrap();
        assert!(requests[0].has_header("authorization: bearer tok-1"));
        assert!(requests[1].has_header("authorization: bearer tok-2"));
        assert_eq!(source.removed.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unauthorized_without_fresh_token_keeps_old() {
        let (base_url, _server) = serve(vec![(401, "")]).await;
        let source = RecordingSource::new(None);
        let client = client(&base_url, source.clone());

        let err = client
            .insert_event("primary", &standup())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.message(), "");
        assert_eq!(source.removed.lock().unwrap().len(), 1);
        assert_eq!(client.credential().await.as_str(), "tok-1");
    }

    #[tokio::test]
    async fn server_error_reports_message_field() {
        let (base_url, _server) = serve(vec![(500, r#"{"message":"backend unavailable"}"#)]).await;
        let source = RecordingSource::new(None);
        let client = client(&base_url, source.clone());

        let err = client.list(CalendarListOptions::writable()).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.message(), "backend unavailable");
        assert_eq!(err.provider(), Some("google"));
        assert!(source.removed.lock().unwrap().is_empty());
        assert_eq!(*source.silent_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn malformed_success_body_is_invalid_response() {
        let (base_url, _server) = serve(vec![(200, "not json")]).await;
        let client = client(&base_url, RecordingSource::new(None));

        let err = client
            .insert_event("primary", &standup())
            .await
            .unwrap_err();
        assert_eq!(err.code(), crate::error::ProviderErrorCode::InvalidResponse);
        assert!(err.status().is_none());
    }

    #[tokio::test]
    async fn connection_refused_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client(&format!("http://{}", addr), RecordingSource::new(None));
        let err = client.list(CalendarListOptions::writable()).await.unwrap_err();
        assert_eq!(err.code(), crate::error::ProviderErrorCode::NetworkError);
        assert!(err.status().is_none());
    }

    #[tokio::test]
    async fn plain_text_error_body_kept_verbatim() {
        let (base_url, _server) = serve(vec![(503, "  Service Unavailable\n")]).await;
        let client = client(&base_url, RecordingSource::new(None));

        let err = client.list(CalendarListOptions::writable()).await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.message(), "  Service Unavailable\n");
    }

    #[test]
    fn error_message_extraction() {
        assert_eq!(extract_error_message(r#"{"message":"top level"}"#), "top level");
        assert_eq!(
            extract_error_message(r#"{"error":{"code":403,"message":"Forbidden"}}"#),
            "Forbidden"
        );
        assert_eq!(
            extract_error_message("Service Unavailable\n"),
            "Service Unavailable\n"
        );
        assert_eq!(
            extract_error_message(r#"{"error":"invalid_grant"}"#),
            r#"{"error":"invalid_grant"}"#
        );
        assert_eq!(extract_error_message(""), "");
    }
}
