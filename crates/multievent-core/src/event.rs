//! Event types sent to the calendar service.
//!
//! - [`EventDraft`]: one event to create, derived from the form values
//! - [`EventResource`]: the JSON payload for the `events.insert` endpoint
//! - [`EventTime`]: start/end of an event, either a date or a date-time
//! - [`Reminders`]: calendar-default reminders or an explicit override list

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, SecondsFormat};
use serde::{Serialize, Serializer};

/// Start or end of an event in the provider's wire format.
///
/// Serializes as `{"date": "YYYY-MM-DD"}` for all-day events and as
/// `{"dateTime": "<RFC 3339>"}` for timed events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EventTime {
    /// A calendar date without time of day.
    Date(NaiveDate),
    /// A specific instant, keeping the offset it was entered with.
    #[serde(serialize_with = "serialize_rfc3339")]
    DateTime(DateTime<FixedOffset>),
}

impl EventTime {
    /// Returns `true` if this is a date-only value.
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::Date(_))
    }

    /// Returns the calendar date of this value.
    pub fn date(&self) -> NaiveDate {
        match self {
            Self::Date(d) => *d,
            Self::DateTime(dt) => dt.date_naive(),
        }
    }
}

fn serialize_rfc3339<S: Serializer>(
    dt: &DateTime<FixedOffset>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Secs, false))
}

/// How a reminder is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderMethod {
    Popup,
}

/// A single reminder replacing the calendar defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderOverride {
    pub method: ReminderMethod,
    /// Minutes before the event start.
    pub minutes: u32,
}

/// The reminders block of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminders {
    /// Whether the calendar's default reminders apply.
    pub use_default: bool,
    /// Explicit reminders, only present when `use_default` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overrides: Option<Vec<ReminderOverride>>,
}

impl Reminders {
    /// Uses the calendar's default reminder policy.
    pub fn calendar_default() -> Self {
        Self {
            use_default: true,
            overrides: None,
        }
    }

    /// Replaces the defaults with exactly one popup `minutes` before start.
    pub fn popup(minutes: u32) -> Self {
        Self {
            use_default: false,
            overrides: Some(vec![ReminderOverride {
                method: ReminderMethod::Popup,
                minutes,
            }]),
        }
    }

    /// Builds the reminders block for an optional override.
    pub fn from_override(minutes: Option<u32>) -> Self {
        minutes.map_or_else(Self::calendar_default, Self::popup)
    }
}

/// The JSON payload describing one calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventResource {
    pub summary: String,
    pub start: EventTime,
    pub end: EventTime,
    pub reminders: Reminders,
}

impl EventResource {
    /// Returns `true` if the event is represented by dates only.
    pub fn is_all_day(&self) -> bool {
        self.start.is_all_day()
    }
}

/// One event to create, before conversion to the wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    pub title: String,
    pub start: DateTime<FixedOffset>,
    /// Zero means an all-day event.
    pub duration: Duration,
    pub reminder_override_minutes: Option<u32>,
}

impl EventDraft {
    /// Returns `true` if this draft produces an all-day event.
    pub fn is_all_day(&self) -> bool {
        self.duration.is_zero()
    }

    /// Returns the end instant (`start + duration`).
    pub fn end(&self) -> DateTime<FixedOffset> {
        self.start + self.duration
    }

    /// Converts the draft to its wire representation.
    ///
    /// All-day events use the start's calendar date for both start and end.
    pub fn to_resource(&self) -> EventResource {
        let (start, end) = if self.is_all_day() {
            let date = self.start.date_naive();
            (EventTime::Date(date), EventTime::Date(date))
        } else {
            (EventTime::DateTime(self.start), EventTime::DateTime(self.end()))
        };

        EventResource {
            summary: self.title.clone(),
            start,
            end,
            reminders: Reminders::from_override(self.reminder_override_minutes),
        }
    }
}

/// Names of the form fields that can carry per-calendar defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Title,
    Duration,
    Reminder,
}

impl FormField {
    /// All fields, in form order.
    pub const ALL: [FormField; 3] = [Self::Title, Self::Duration, Self::Reminder];

    /// Returns the storage key for this field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "event-title",
            Self::Duration => "event-duration",
            Self::Reminder => "event-notification",
        }
    }

    /// Looks a field up by storage key or short name.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "event-title" | "title" => Some(Self::Title),
            "event-duration" | "duration" => Some(Self::Duration),
            "event-notification" | "reminder" | "notification" => Some(Self::Reminder),
            _ => None,
        }
    }
}

impl std::fmt::Display for FormField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 1, h, m, 0)
            .unwrap()
    }

    fn draft(duration: Duration, reminder: Option<u32>) -> EventDraft {
        EventDraft {
            title: "Standup".to_string(),
            start: at(9, 0),
            duration,
            reminder_override_minutes: reminder,
        }
    }

    #[test]
    fn timed_resource_json() {
        let resource = draft(Duration::minutes(90), None).to_resource();
        insta::assert_json_snapshot!(resource, @r#"
        {
          "summary": "Standup",
          "start": {
            "dateTime": "2024-01-01T09:00:00+00:00"
          },
          "end": {
            "dateTime": "2024-01-01T10:30:00+00:00"
          },
          "reminders": {
            "useDefault": true
          }
        }
        "#);
    }

    #[test]
    fn all_day_resource_json() {
        let resource = draft(Duration::zero(), Some(10)).to_resource();
        insta::assert_json_snapshot!(resource, @r#"
        {
          "summary": "Standup",
          "start": {
            "date": "2024-01-01"
          },
          "end": {
            "date": "2024-01-01"
          },
          "reminders": {
            "useDefault": false,
            "overrides": [
              {
                "method": "popup",
                "minutes": 10
              }
            ]
          }
        }
        "#);
    }

    #[test]
    fn all_day_iff_zero_duration() {
        assert!(draft(Duration::zero(), None).to_resource().is_all_day());
        assert!(!draft(Duration::seconds(1), None).to_resource().is_all_day());
    }

    #[test]
    fn end_crosses_midnight() {
        let mut d = draft(Duration::hours(2), None);
        d.start = at(23, 0);
        let resource = d.to_resource();
        assert_eq!(resource.end.date(), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn all_day_uses_local_date_of_start() {
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        let d = EventDraft {
            title: "Late".to_string(),
            start: tz.with_ymd_and_hms(2024, 1, 1, 23, 30, 0).unwrap(),
            duration: Duration::zero(),
            reminder_override_minutes: None,
        };
        let resource = d.to_resource();
        let expected = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(resource.start, EventTime::Date(expected));
        assert_eq!(resource.end, EventTime::Date(expected));
    }

    #[test]
    fn reminders_from_override() {
        let r = Reminders::from_override(Some(15));
        assert!(!r.use_default);
        assert_eq!(r.overrides.as_ref().map(Vec::len), Some(1));
        assert_eq!(r.overrides.unwrap()[0].minutes, 15);

        let r = Reminders::from_override(None);
        assert!(r.use_default);
        assert!(r.overrides.is_none());
        let json = serde_json::to_value(&r).unwrap();
        assert!(json.get("overrides").is_none());
    }

    #[test]
    fn form_field_names() {
        for field in FormField::ALL {
            assert_eq!(FormField::parse(field.as_str()), Some(field));
        }
        assert_eq!(FormField::parse("reminder"), Some(FormField::Reminder));
        assert_eq!(FormField::parse("colour"), None);
    }
}
