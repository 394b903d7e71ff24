//! Core types: time parsing, event resources, batch expansion

pub mod batch;
pub mod error;
pub mod event;
pub mod time;
pub mod tracing;

pub use batch::{EventForm, parse_reminder};
pub use error::{ValidationError, ValidationResult};
pub use event::{EventDraft, EventResource, EventTime, FormField, ReminderMethod, ReminderOverride, Reminders};
pub use time::{parse_duration, parse_start_time, split_start_times};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
