//! `multievent add`: create one event per start time.
//!
//! The form is filled from the calendar's defaults and validated in full
//! before the first request is sent.

use std::sync::Arc;

use chrono::TimeZone;
use multievent_core::{EventDraft, EventForm, FormField};
use multievent_providers::{BatchReport, CalendarApi, submit_batch};
use tracing::{debug, info, warn};

use crate::cli::AddArgs;
use crate::commands::calendars::refresh;
use crate::defaults::{CalendarDefaults, last_calendar, set_last_calendar};
use crate::error::ClientResult;
use crate::store::KeyValueStore;

/// Calendar used when none is given and none was used before.
pub const FALLBACK_CALENDAR: &str = "primary";

/// A validated batch, ready to submit.
pub struct PreparedBatch {
    pub calendar_id: String,
    pub drafts: Vec<EventDraft>,
    defaults: CalendarDefaults,
}

/// Picks the target calendar: `requested`, then the last one used, then
/// [`FALLBACK_CALENDAR`].
pub async fn choose_calendar(requested: Option<&str>, store: &dyn KeyValueStore) -> String {
    if let Some(id) = requested.map(str::trim).filter(|id| !id.is_empty()) {
        return id.to_string();
    }
    last_calendar(store)
        .await
        .unwrap_or_else(|| FALLBACK_CALENDAR.to_string())
}

/// Builds the form from the arguments, filling the fields that were not
/// given from the calendar's defaults.
///
/// A field given as an empty string stays empty, so `--reminder ""` keeps
/// the calendar's own reminders for this batch.
pub fn build_form(args: &AddArgs, defaults: &CalendarDefaults, calendar_id: &str) -> EventForm {
    let mut form = defaults.fill_form(
        calendar_id,
        EventForm {
            start_times: args.starts.clone(),
            ..EventForm::default()
        },
    );
    if let Some(ref title) = args.title {
        form.title = title.clone();
    }
    if let Some(ref duration) = args.duration {
        form.duration = duration.clone();
    }
    if let Some(ref reminder) = args.reminder {
        form.reminder = reminder.clone();
    }
    form
}

/// Resolves the calendar and expands the form into drafts.
///
/// Naive start times are read in `tz`. Nothing is sent and nothing is
/// stored when validation fails.
pub async fn prepare<Tz: TimeZone>(
    args: &AddArgs,
    store: Arc<dyn KeyValueStore>,
    tz: &Tz,
) -> ClientResult<PreparedBatch> {
    let calendar_id = choose_calendar(args.calendar.as_deref(), store.as_ref()).await;
    let defaults = CalendarDefaults::load(store).await;

    let form = build_form(args, &defaults, &calendar_id);
    let drafts = form.expand(tz)?;
    debug!(calendar = %calendar_id, count = drafts.len(), "batch prepared");

    Ok(PreparedBatch {
        calendar_id,
        drafts,
        defaults,
    })
}

/// Submits a prepared batch.
///
/// With `save_defaults`, the calendar list is refreshed so defaults of
/// deleted calendars are dropped, then the title, duration and reminder given
/// on the command line are remembered for the calendar. The calendar becomes
/// the last-used one only when every event was created.
pub async fn submit(
    api: &dyn CalendarApi,
    store: &dyn KeyValueStore,
    mut batch: PreparedBatch,
    args: &AddArgs,
) -> BatchReport {
    if args.save_defaults {
        if let Err(e) = refresh(api, &mut batch.defaults, Some(batch.calendar_id.as_str())).await {
            warn!("could not refresh the calendar list, keeping all defaults: {}", e);
        }

        let given = [
            (FormField::Title, args.title.as_deref()),
            (FormField::Duration, args.duration.as_deref()),
            (FormField::Reminder, args.reminder.as_deref()),
        ];
        for (field, value) in given {
            if let Some(value) = value {
                batch
                    .defaults
                    .save_default(&batch.calendar_id, field, value)
                    .await;
            }
        }
    }

    let report = submit_batch(api, &batch.calendar_id, &batch.drafts).await;
    if report.is_complete() {
        set_last_calendar(store, &batch.calendar_id).await;
        info!(calendar = %batch.calendar_id, "last-used calendar updated");
    }
    report
}

/// Turns an incomplete report into the command's error.
pub fn check_report(report: &BatchReport) -> ClientResult<()> {
    match report.failure.as_ref() {
        None => Ok(()),
        Some(failure) => Err(crate::error::ClientError::Submission(format!(
            "event {} of {} failed; {} created, {} not sent",
            failure.index + 1,
            report.total(),
            report.created.len(),
            report.skipped
        ))),
    }
}

/// Runs `multievent add` against Google Calendar.
#[cfg(feature = "google")]
pub async fn run(
    config: &crate::config::ClientConfig,
    args: &AddArgs,
    mode: crate::output::OutputMode,
) -> ClientResult<()> {
    let store: Arc<dyn KeyValueStore> = crate::session::open_store(config);
    let batch = prepare(args, store.clone(), &chrono::Local).await?;
    let calendar_id = batch.calendar_id.clone();

    let client = crate::session::connect(config, true).await?;
    let report = submit(&client, store.as_ref(), batch, args).await;

    println!(
        "{}",
        crate::output::render_report(&calendar_id, &report, mode)?
    );
    check_report(&report)
}
