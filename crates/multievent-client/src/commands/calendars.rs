//! `multievent calendars`: list the calendars events can be added to.

use std::sync::Arc;

use multievent_providers::{
    CalendarApi, CalendarListEntry, CalendarListOptions, list_all_calendars,
};
use tracing::debug;

use crate::commands::add::FALLBACK_CALENDAR;
use crate::defaults::{CalendarDefaults, last_calendar};
use crate::error::ClientResult;
use crate::output::{OutputMode, render_calendars};
use crate::store::KeyValueStore;

/// Fetches the writable calendars and drops the defaults of calendars no
/// longer listed from `defaults`. Returns the calendars and how many
/// calendars' defaults were dropped.
///
/// [`FALLBACK_CALENDAR`] and `keep` are never dropped: `primary` is an alias
/// the list never contains.
pub async fn refresh(
    api: &dyn CalendarApi,
    defaults: &mut CalendarDefaults,
    keep: Option<&str>,
) -> ClientResult<(Vec<CalendarListEntry>, usize)> {
    let calendars = list_all_calendars(api, CalendarListOptions::writable()).await?;
    let pruned = defaults.retain_calendars(
        calendars
            .iter()
            .map(|c| c.id.as_str())
            .chain([FALLBACK_CALENDAR])
            .chain(keep),
    );
    debug!(listed = calendars.len(), pruned, "calendar list refreshed");
    Ok((calendars, pruned))
}

/// Fetches the writable calendars and renders them.
///
/// Defaults of calendars missing from the list are deleted from the store.
pub async fn list(
    api: &dyn CalendarApi,
    store: Arc<dyn KeyValueStore>,
    mode: OutputMode,
) -> ClientResult<String> {
    let mut defaults = CalendarDefaults::load(store.clone()).await;
    let (calendars, pruned) = refresh(api, &mut defaults, None).await?;
    if pruned > 0 {
        defaults.persist().await;
    }

    let last_used = last_calendar(store.as_ref()).await;
    render_calendars(&calendars, last_used.as_deref(), mode)
}

#[cfg(feature = "google")]
pub async fn run(config: &crate::config::ClientConfig, mode: OutputMode) -> ClientResult<()> {
    let store: Arc<dyn KeyValueStore> = crate::session::open_store(config);
    let client = crate::session::connect(config, true).await?;
    println!("{}", list(&client, store, mode).await?);
    Ok(())
}
