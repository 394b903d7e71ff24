//! Sequential submission of an event batch.
//!
//! Drafts are submitted one at a time, in order, each request awaited before
//! the next is issued. The first failure ends the batch: events created
//! before it stay created (there is no rollback) and the remaining drafts are
//! not sent.

use chrono::{DateTime, FixedOffset};
use multievent_core::EventDraft;
use tracing::{debug, info, warn};

use crate::error::ProviderError;
use crate::provider::{CalendarApi, InsertedEvent};

/// The draft that stopped a batch, and why.
#[derive(Debug)]
pub struct BatchFailure {
    /// Position of the failing draft in the batch.
    pub index: usize,
    pub start: DateTime<FixedOffset>,
    pub error: ProviderError,
}

/// Outcome of submitting a batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Events created, in submission order.
    pub created: Vec<InsertedEvent>,
    pub failure: Option<BatchFailure>,
    /// Drafts never sent because an earlier one failed.
    pub skipped: usize,
}

impl BatchReport {
    /// Returns true if every draft was created.
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    /// Number of drafts in the batch.
    pub fn total(&self) -> usize {
        self.created.len() + usize::from(self.failure.is_some()) + self.skipped
    }
}

/// Submits `drafts` to `calendar_id`, one after another.
pub async fn submit_batch(
    api: &dyn CalendarApi,
    calendar_id: &str,
    drafts: &[EventDraft],
) -> BatchReport {
    let mut report = BatchReport::default();

    for (index, draft) in drafts.iter().enumerate() {
        let resource = draft.to_resource();
        debug!(index, start = %draft.start, all_day = resource.is_all_day(), "inserting event");

        match api.insert_event(calendar_id, &resource).await {
            Ok(event) => {
                debug!(index, id = %event.id, "event created");
                report.created.push(event);
            }
            Err(error) => {
                warn!(index, "event creation failed: {}", error);
                report.skipped = drafts.len() - index - 1;
                report.failure = Some(BatchFailure {
                    index,
                    start: draft.start,
                    error,
                });
                break;
            }
        }
    }

    info!(
        calendar = calendar_id,
        created = report.created.len(),
        skipped = report.skipped,
        "batch finished"
    );
    report
}
