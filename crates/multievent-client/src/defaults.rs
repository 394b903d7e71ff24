//! Per-calendar default field values and the last-used calendar.
//!
//! Store failures are logged and otherwise ignored: losing a default is
//! never worth failing a command over.

use std::collections::BTreeMap;
use std::sync::Arc;

use multievent_core::{EventForm, FormField};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::store::KeyValueStore;

/// Store key of the defaults map.
pub const DEFAULTS_KEY: &str = "defaults";
/// Store key of the last calendar an event batch was created on.
pub const LAST_CALENDAR_KEY: &str = "lastUpdatedCalendarId";

/// Field name to value, for one calendar.
pub type FieldDefaults = BTreeMap<String, String>;
/// Calendar id to that calendar's defaults.
pub type DefaultsMap = BTreeMap<String, FieldDefaults>;

/// In-memory copy of the defaults map, written back on every save.
pub struct CalendarDefaults {
    store: Arc<dyn KeyValueStore>,
    map: DefaultsMap,
}

impl CalendarDefaults {
    /// Reads the defaults map from `store`. A missing or unreadable map
    /// starts empty.
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let map = match store.get(&[DEFAULTS_KEY]).await {
            Ok(mut entries) => match entries.remove(DEFAULTS_KEY) {
                Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                    warn!("ignoring malformed calendar defaults: {}", e);
                    DefaultsMap::new()
                }),
                None => DefaultsMap::new(),
            },
            Err(e) => {
                warn!("failed to read calendar defaults: {}", e);
                DefaultsMap::new()
            }
        };
        debug!("loaded defaults for {} calendars", map.len());
        Self { store, map }
    }

    /// Drops calendars that are no longer listed and returns how many were
    /// dropped.
    ///
    /// Only the in-memory map changes; the store catches up on the next save.
    pub fn retain_calendars<'a>(&mut self, calendar_ids: impl IntoIterator<Item = &'a str>) -> usize {
        let listed: Vec<&str> = calendar_ids.into_iter().collect();
        let before = self.map.len();
        self.map.retain(|id, _| listed.contains(&id.as_str()));
        let pruned = before - self.map.len();
        if pruned > 0 {
            debug!("pruned defaults of {} calendars", pruned);
        }
        pruned
    }

    /// Returns the defaults of `calendar_id`, empty if there are none.
    pub fn load_defaults(&self, calendar_id: &str) -> FieldDefaults {
        self.map.get(calendar_id).cloned().unwrap_or_default()
    }

    pub fn get(&self, calendar_id: &str, field: FormField) -> Option<&str> {
        self.map
            .get(calendar_id)
            .and_then(|fields| fields.get(field.as_str()))
            .map(String::as_str)
    }

    pub fn map(&self) -> &DefaultsMap {
        &self.map
    }

    /// Stores `value.trim()` as the default of `field` and writes the whole
    /// map to the store.
    pub async fn save_default(&mut self, calendar_id: &str, field: FormField, value: &str) {
        self.map
            .entry(calendar_id.to_string())
            .or_default()
            .insert(field.as_str().to_string(), value.trim().to_string());
        self.persist().await;
    }

    /// Writes the whole in-memory map to the store.
    pub async fn persist(&self) {
        let value = match serde_json::to_value(&self.map) {
            Ok(value) => value,
            Err(e) => {
                warn!("failed to encode calendar defaults: {}", e);
                return;
            }
        };
        let mut entries = Map::new();
        entries.insert(DEFAULTS_KEY.to_string(), value);
        if let Err(e) = self.store.set(entries).await {
            warn!("failed to save calendar defaults: {}", e);
        }
    }

    /// Fills the title, duration and reminder the user left empty from the
    /// defaults of `calendar_id`.
    pub fn fill_form(&self, calendar_id: &str, mut form: EventForm) -> EventForm {
        let fill = |current: &mut String, field: FormField| {
            if current.trim().is_empty()
                && let Some(value) = self.get(calendar_id, field)
            {
                *current = value.to_string();
            }
        };
        fill(&mut form.title, FormField::Title);
        fill(&mut form.duration, FormField::Duration);
        fill(&mut form.reminder, FormField::Reminder);
        form
    }
}

/// Returns the calendar the last batch was created on, if recorded.
pub async fn last_calendar(store: &dyn KeyValueStore) -> Option<String> {
    match store.get(&[LAST_CALENDAR_KEY]).await {
        Ok(mut entries) => match entries.remove(LAST_CALENDAR_KEY) {
            Some(Value::String(id)) if !id.is_empty() => Some(id),
            _ => None,
        },
        Err(e) => {
            warn!("failed to read last-used calendar: {}", e);
            None
        }
    }
}

pub async fn set_last_calendar(store: &dyn KeyValueStore, calendar_id: &str) {
    let mut entries = Map::new();
    entries.insert(
        LAST_CALENDAR_KEY.to_string(),
        Value::String(calendar_id.to_string()),
    );
    if let Err(e) = store.set(entries).await {
        warn!("failed to save last-used calendar: {}", e);
    }
}
