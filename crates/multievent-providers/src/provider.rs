//! The calendar API abstraction.
//!
//! [`CalendarApi`] is the seam between the batch submission logic and the
//! HTTP client. The Google implementation lives in [`crate::google`]; tests
//! substitute in-memory fakes.

use std::future::Future;
use std::pin::Pin;

use multievent_core::EventResource;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ProviderResult;

/// A boxed future for async trait methods.
///
/// Boxed futures keep the traits object-safe so they can be used as
/// `&dyn CalendarApi` / `Arc<dyn TokenSource>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The caller's access level on a calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccessRole {
    FreeBusyReader,
    Reader,
    Writer,
    Owner,
}

impl AccessRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FreeBusyReader => "freeBusyReader",
            Self::Reader => "reader",
            Self::Writer => "writer",
            Self::Owner => "owner",
        }
    }
}

/// Query options for the calendar list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalendarListOptions {
    /// Only return calendars where the user has at least this role.
    pub min_access_role: Option<AccessRole>,
    /// Include deleted calendar list entries.
    pub show_deleted: bool,
    /// Continuation token from a previous page.
    pub page_token: Option<String>,
}

impl CalendarListOptions {
    /// Options selecting the calendars events can be added to.
    pub fn writable() -> Self {
        Self {
            min_access_role: Some(AccessRole::Writer),
            show_deleted: false,
            page_token: None,
        }
    }

    /// Builder method to request a specific page.
    pub fn with_page_token(mut self, token: impl Into<String>) -> Self {
        self.page_token = Some(token.into());
        self
    }

    /// Returns the query string parameters for these options.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(role) = self.min_access_role {
            pairs.push(("minAccessRole", role.as_str().to_string()));
        }
        pairs.push(("showDeleted", self.show_deleted.to_string()));
        if let Some(ref token) = self.page_token {
            pairs.push(("pageToken", token.clone()));
        }
        pairs
    }
}

/// A calendar from the calendar list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarListEntry {
    pub id: String,
    /// The calendar name.
    #[serde(default)]
    pub summary: String,
    pub description: Option<String>,
    #[serde(default)]
    pub primary: bool,
    pub time_zone: Option<String>,
    pub access_role: Option<AccessRole>,
    pub background_color: Option<String>,
    pub foreground_color: Option<String>,
}

impl CalendarListEntry {
    /// Creates an entry with the given id and name.
    pub fn new(id: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            summary: summary.into(),
            description: None,
            primary: false,
            time_zone: None,
            access_role: None,
            background_color: None,
            foreground_color: None,
        }
    }
}

/// One page of the calendar list.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarListResult {
    #[serde(default)]
    pub items: Vec<CalendarListEntry>,
    pub next_page_token: Option<String>,
}

/// The event returned by a successful insert.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertedEvent {
    pub id: String,
    pub html_link: Option<String>,
    pub summary: Option<String>,
    pub status: Option<String>,
}

/// Authenticated access to a calendar service.
///
/// Implementations attach credentials to every call and never retry on
/// their own; a failed call is reported once to the caller.
pub trait CalendarApi: Send + Sync {
    /// Returns one page of the user's calendar list.
    fn list(&self, options: CalendarListOptions) -> BoxFuture<'_, ProviderResult<CalendarListResult>>;

    /// Creates an event on the given calendar.
    fn insert_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event: &'a EventResource,
    ) -> BoxFuture<'a, ProviderResult<InsertedEvent>>;
}

/// Fetches every page of the calendar list.
///
/// Stops at the first failing page and returns its error.
pub async fn list_all_calendars(
    api: &dyn CalendarApi,
    options: CalendarListOptions,
) -> ProviderResult<Vec<CalendarListEntry>> {
    let mut calendars = Vec::new();
    let mut options = options;

    loop {
        let page = api.list(options.clone()).await?;
        calendars.extend(page.items);

        match page.next_page_token {
            Some(token) => options = options.with_page_token(token),
            None => break,
        }
    }

    debug!("listed {} calendars", calendars.len());
    Ok(calendars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::error::ProviderError;

    /// Serves canned calendar list pages, recording the options it saw.
    struct PagedApi {
        pages: Mutex<Vec<ProviderResult<CalendarListResult>>>,
        seen: Mutex<Vec<CalendarListOptions>>,
    }

    impl CalendarApi for PagedApi {
        fn list(
            &self,
            options: CalendarListOptions,
        ) -> BoxFuture<'_, ProviderResult<CalendarListResult>> {
            self.seen.lock().unwrap().push(options);
            let page = self.pages.lock().unwrap().remove(0);
            Box::pin(async move { page })
        }

        fn insert_event<'a>(
            &'a self,
            _calendar_id: &'a str,
            _event: &'a EventResource,
        ) -> BoxFuture<'a, ProviderResult<InsertedEvent>> {
            Box::pin(async { Err(ProviderError::internal("not used")) })
        }
    }

    fn page(ids: &[&str], next: Option<&str>) -> ProviderResult<CalendarListResult> {
        Ok(CalendarListResult {
            items: ids.iter().map(|id| CalendarListEntry::new(*id, *id)).collect(),
            next_page_token: next.map(String::from),
        })
    }

    #[test]
    fn writable_query() {
        let pairs = CalendarListOptions::writable().query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("minAccessRole", "writer".to_string()),
                ("showDeleted", "false".to_string()),
            ]
        );
    }

    #[test]
    fn page_token_in_query() {
        let pairs = CalendarListOptions::writable()
            .with_page_token("abc")
            .query_pairs();
        assert!(pairs.contains(&("pageToken", "abc".to_string())));
    }

    #[test]
    fn parse_calendar_list() {
        let json = r#"{
            "kind": "calendar#calendarList",
            "items": [
                {
                    "id": "primary@example.com",
                    "summary": "My Calendar",
                    "primary": true,
                    "accessRole": "owner",
                    "timeZone": "Europe/Paris"
                },
                {
                    "id": "team@group.calendar.google.com",
                    "summary": "Team",
                    "accessRole": "writer"
                }
            ]
        }"#;

        let result: CalendarListResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.items.len(), 2);
        assert!(result.items[0].primary);
        assert_eq!(result.items[0].access_role, Some(AccessRole::Owner));
        assert_eq!(result.items[1].access_role, Some(AccessRole::Writer));
        assert!(result.next_page_token.is_none());
    }

    #[test]
    fn parse_inserted_event() {
        let json = r#"{
            "kind": "calendar#event",
            "id": "abc123",
            "status": "confirmed",
            "htmlLink": "https://www.google.com/calendar/event?eid=abc123",
            "summary": "Standup",
            "start": {"dateTime": "2024-01-01T09:00:00Z"}
        }"#;

        let event: InsertedEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.id, "abc123");
        assert_eq!(event.summary.as_deref(), Some("Standup"));
    }

    #[tokio::test]
    async fn list_all_follows_pages() {
        let api = PagedApi {
            pages: Mutex::new(vec![page(&["a", "b"], Some("p2")), page(&["c"], None)]),
            seen: Mutex::new(Vec::new()),
        };

        let calendars = list_all_calendars(&api, CalendarListOptions::writable())
            .await
            .unwrap();

        let ids: Vec<_> = calendars.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        let seen = api.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].page_token.is_none());
        assert_eq!(seen[1].page_token.as_deref(), Some("p2"));
        assert_eq!(seen[1].min_access_role, Some(AccessRole::Writer));
    }

    #[tokio::test]
    async fn list_all_stops_on_error() {
        let api = PagedApi {
            pages: Mutex::new(vec![
                page(&["a"], Some("p2")),
                Err(ProviderError::api(500, "backend error")),
            ]),
            seen: Mutex::new(Vec::new()),
        };

        let err = list_all_calendars(&api, CalendarListOptions::writable())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
    }
}
