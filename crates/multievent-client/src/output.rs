//! Rendering of command results as text or JSON.

use std::fmt::Write as _;

use multievent_providers::{BatchReport, CalendarListEntry};
use serde::Serialize;

use crate::defaults::FieldDefaults;
use crate::error::ClientResult;

/// How command results are printed on stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    #[default]
    Text,
    Json,
}

fn to_json<T: Serialize>(value: &T) -> ClientResult<String> {
    Ok(serde_json::to_string_pretty(value).map_err(std::io::Error::from)?)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CalendarRow<'a> {
    id: &'a str,
    summary: &'a str,
    primary: bool,
    access_role: Option<&'static str>,
    last_used: bool,
}

/// Lists calendars, marking the one `last_used` names.
pub fn render_calendars(
    calendars: &[CalendarListEntry],
    last_used: Option<&str>,
    mode: OutputMode,
) -> ClientResult<String> {
    let rows: Vec<CalendarRow<'_>> = calendars
        .iter()
        .map(|c| CalendarRow {
            id: &c.id,
            summary: &c.summary,
            primary: c.primary,
            access_role: c.access_role.map(|r| r.as_str()),
            last_used: last_used == Some(c.id.as_str()),
        })
        .collect();

    if mode == OutputMode::Json {
        return to_json(&rows);
    }

    if rows.is_empty() {
        return Ok("No writable calendars.".to_string());
    }

    let mut out = String::new();
    for row in &rows {
        let marker = if row.last_used { '*' } else { ' ' };
        let name = if row.summary.is_empty() { row.id } else { row.summary };
        let _ = write!(out, "{} {}", marker, name);
        if row.primary {
            out.push_str(" [primary]");
        }
        let _ = writeln!(out, "\n    {}", row.id);
    }
    Ok(out.trim_end().to_string())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatedRow<'a> {
    id: &'a str,
    html_link: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FailureRow {
    /// One-based position in the batch.
    position: usize,
    start: String,
    status: Option<u16>,
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportRow<'a> {
    calendar_id: &'a str,
    total: usize,
    created: Vec<CreatedRow<'a>>,
    failure: Option<FailureRow>,
    skipped: usize,
}

/// Summarizes a submitted batch.
pub fn render_report(
    calendar_id: &str,
    report: &BatchReport,
    mode: OutputMode,
) -> ClientResult<String> {
    let row = ReportRow {
        calendar_id,
        total: report.total(),
        created: report
            .created
            .iter()
            .map(|e| CreatedRow {
                id: &e.id,
                html_link: e.html_link.as_deref(),
            })
            .collect(),
        failure: report.failure.as_ref().map(|f| FailureRow {
            position: f.index + 1,
            start: f.start.to_rfc3339(),
            status: f.error.status(),
            message: f.error.message().to_string(),
        }),
        skipped: report.skipped,
    };

    if mode == OutputMode::Json {
        return to_json(&row);
    }

    let mut out = format!(
        "Created {} of {} event{} on {}.",
        row.created.len(),
        row.total,
        if row.total == 1 { "" } else { "s" },
        calendar_id
    );
    for created in &row.created {
        if let Some(link) = created.html_link {
            let _ = write!(out, "\n  {}", link);
        }
    }
    if let Some(failure) = report.failure.as_ref() {
        let _ = write!(
            out,
            "\nEvent {} ({}) failed: {}",
            failure.index + 1,
            failure.start.format("%Y-%m-%d %H:%M"),
            failure.error.message()
        );
        if report.skipped > 0 {
            let _ = write!(out, "\n{} not sent.", report.skipped);
        }
    }
    Ok(out)
}

/// Shows the defaults of one calendar.
pub fn render_defaults(
    calendar_id: &str,
    defaults: &FieldDefaults,
    mode: OutputMode,
) -> ClientResult<String> {
    if mode == OutputMode::Json {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Row<'a> {
            calendar_id: &'a str,
            defaults: &'a FieldDefaults,
        }
        return to_json(&Row {
            calendar_id,
            defaults,
        });
    }

    if defaults.is_empty() {
        return Ok(format!("No defaults for {}.", calendar_id));
    }
    let mut out = format!("{}:", calendar_id);
    for (field, value) in defaults {
        let _ = write!(out, "\n  {} = {}", field, value);
    }
    Ok(out)
}
