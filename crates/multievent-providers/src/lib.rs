//! Calendar access for multievent.
//!
//! - [`CalendarApi`] lists calendars and inserts events; [`google`] holds the
//!   Google Calendar implementation.
//! - [`TokenSource`] hands out bearer [`Credential`]s and takes back ones the
//!   server rejected.
//! - [`submit_batch`] sends a batch of drafts one at a time and stops at the
//!   first failure.
//!
//! ```ignore
//! let report = submit_batch(&client, "primary", &drafts).await;
//! if let Some(failure) = report.failure {
//!     eprintln!("event {} failed: {}", failure.index + 1, failure.error);
//! }
//! ```

pub mod auth;
pub mod batch;
pub mod error;
#[cfg(feature = "google")]
pub mod google;
pub mod provider;

pub use auth::{Credential, TokenSource, acquire_credential};
pub use batch::{BatchFailure, BatchReport, submit_batch};
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use provider::{
    AccessRole, BoxFuture, CalendarApi, CalendarListEntry, CalendarListOptions,
    CalendarListResult, InsertedEvent, list_all_calendars,
};
