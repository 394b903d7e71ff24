//! Expansion of raw form values into one draft per start time.

use chrono::TimeZone;
use tracing::debug;

use crate::error::{ValidationError, ValidationResult};
use crate::event::EventDraft;
use crate::time::{parse_duration, parse_start_time, split_start_times};

/// Raw values of the add-event form.
///
/// Fields hold exactly what the user entered; nothing is validated until
/// [`EventForm::expand`] is called.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventForm {
    /// Event title (may be empty).
    pub title: String,
    /// Start times. Each entry may itself be a `;`/`,` delimited list.
    pub start_times: Vec<String>,
    /// Duration in `HH:mm`; `00:00` creates all-day events.
    pub duration: String,
    /// Reminder override in minutes; empty keeps the calendar defaults.
    pub reminder: String,
}

impl EventForm {
    /// Creates an empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Builder method to add a start time (or a delimited list of them).
    pub fn with_start_time(mut self, start: impl Into<String>) -> Self {
        self.start_times.push(start.into());
        self
    }

    /// Builder method to set the duration.
    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = duration.into();
        self
    }

    /// Builder method to set the reminder override.
    pub fn with_reminder(mut self, reminder: impl Into<String>) -> Self {
        self.reminder = reminder.into();
        self
    }

    /// Returns the individual start-time strings, in entry order.
    pub fn start_time_items(&self) -> Vec<String> {
        self.start_times
            .iter()
            .flat_map(|s| split_start_times(s))
            .collect()
    }

    /// Validates the form and expands it into one draft per start time.
    ///
    /// Checks run in this order: empty duration, empty start-time list,
    /// duration syntax, reminder, then each start time. Naive start times
    /// are interpreted in `tz`.
    pub fn expand<Tz: TimeZone>(&self, tz: &Tz) -> ValidationResult<Vec<EventDraft>> {
        if self.duration.trim().is_empty() {
            return Err(ValidationError::MissingDuration);
        }

        let items = self.start_time_items();
        if items.is_empty() {
            return Err(ValidationError::MissingStartTimes);
        }

        let duration = parse_duration(&self.duration)?;
        let reminder = parse_reminder(&self.reminder)?;

        let drafts = items
            .iter()
            .map(|item| {
                Ok(EventDraft {
                    title: self.title.clone(),
                    start: parse_start_time(item, tz)?,
                    duration,
                    reminder_override_minutes: reminder,
                })
            })
            .collect::<ValidationResult<Vec<_>>>()?;

        debug!(
            count = drafts.len(),
            all_day = duration.is_zero(),
            "expanded event form"
        );
        Ok(drafts)
    }
}

/// Parses the optional reminder override.
///
/// An empty (or whitespace-only) value means "use calendar defaults".
pub fn parse_reminder(input: &str) -> ValidationResult<Option<u32>> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    input
        .parse::<u32>()
        .map(Some)
        .map_err(|_| ValidationError::InvalidReminder(input.to_string()))
}
