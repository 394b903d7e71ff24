//! `multievent defaults`: inspect and edit per-calendar defaults.

use std::sync::Arc;

use multievent_core::{FormField, parse_duration, parse_reminder};

use crate::commands::add::choose_calendar;
use crate::defaults::CalendarDefaults;
use crate::error::{ClientError, ClientResult};
use crate::output::{OutputMode, render_defaults};
use crate::store::KeyValueStore;

/// Renders the defaults of `calendar`, or of the calendar `add` would use.
pub async fn show(
    store: Arc<dyn KeyValueStore>,
    calendar: Option<&str>,
    mode: OutputMode,
) -> ClientResult<String> {
    let calendar_id = choose_calendar(calendar, store.as_ref()).await;
    let defaults = CalendarDefaults::load(store).await;
    render_defaults(&calendar_id, &defaults.load_defaults(&calendar_id), mode)
}

/// Stores one default. Durations and reminders must parse; an empty value
/// clears the default.
pub async fn set(
    store: Arc<dyn KeyValueStore>,
    calendar: &str,
    field: &str,
    value: &str,
) -> ClientResult<String> {
    let field = FormField::parse(field).ok_or_else(|| {
        ClientError::Config(format!(
            "unknown field '{}': expected title, duration or reminder",
            field
        ))
    })?;

    if !value.trim().is_empty() {
        match field {
            FormField::Duration => {
                parse_duration(value)?;
            }
            FormField::Reminder => {
                parse_reminder(value)?;
            }
            FormField::Title => {}
        }
    }

    let mut defaults = CalendarDefaults::load(store).await;
    defaults.save_default(calendar, field, value).await;
    Ok(format!("{} = {} for {}", field, value.trim(), calendar))
}
