//! Render model for a report payload
//!
//! Shared by the page overlay and the CLI text table so both agree on
//! headers, row order and the empty case.

use std::fmt;

use omnitime_core_types::ReportPayload;
use serde::Serialize;

use crate::format::format_minutes;

pub const USER_HEADER: &str = "User";
pub const TIME_HEADER: &str = "Time Spent";
pub const TOTAL_LABEL: &str = "Total";
pub const EMPTY_MESSAGE: &str = "No time tracking entries found.";

/// One rendered entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub user: String,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportView {
    /// No entries and a zero total
    Empty,

    /// Entries in input order plus the total
    Table {
        user_header: String,
        rows: Vec<ReportRow>,
        total: String,
    },
}

impl ReportView {
    pub fn from_payload(payload: &ReportPayload) -> Self {
        if payload.is_empty() {
            return ReportView::Empty;
        }

        // Aggregate-only data gets a blank user column header.
        let user_header = if payload.tracked_time.is_empty() {
            String::new()
        } else {
            USER_HEADER.to_string()
        };
        let rows = payload
            .tracked_time
            .iter()
            .map(|entry| ReportRow {
                user: entry.user.clone(),
                time: format_minutes(entry.time_spent),
            })
            .collect();

        ReportView::Table {
            user_header,
            rows,
            total: format_minutes(payload.total_sum),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ReportView::Empty)
    }
}

impl From<&ReportPayload> for ReportView {
    fn from(payload: &ReportPayload) -> Self {
        ReportView::from_payload(payload)
    }
}

/// Plain two-column table, or the empty message.
impl fmt::Display for ReportView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ReportView::Table {
            user_header,
            rows,
            total,
        } = self
        else {
            return f.write_str(EMPTY_MESSAGE);
        };

        let width = rows
            .iter()
            .map(|row| row.user.chars().count())
            .chain([user_header.chars().count(), TOTAL_LABEL.len()])
            .max()
            .unwrap_or(0);
        let time_width = rows
            .iter()
            .map(|row| row.time.len())
            .chain([TIME_HEADER.len(), total.len()])
            .max()
            .unwrap_or(0);

        writeln!(f, "{user_header:<width$}  {TIME_HEADER}")?;
        writeln!(f, "{}  {}", "-".repeat(width), "-".repeat(time_width))?;
        for row in rows {
            writeln!(f, "{:<width$}  {}", row.user, row.time)?;
        }
        writeln!(f, "{}  {}", "-".repeat(width), "-".repeat(time_width))?;
        write!(f, "{TOTAL_LABEL:<width$}  {total}")
    }
}
