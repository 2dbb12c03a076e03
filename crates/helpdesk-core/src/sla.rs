//! Derived timing metrics. Computed at read time, never stored.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::Ticket;

/// SLA and time-in-status figures for one ticket at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TicketTiming {
    pub sla_target_minutes: u32,
    /// `(closed_at or now) - created_at`, clamped at zero.
    pub elapsed_minutes: f64,
    /// Only open tickets can breach.
    pub sla_breached: bool,
    /// `(closed_at or now) - status_updated_at`, clamped at zero.
    pub status_elapsed_minutes: f64,
}

impl TicketTiming {
    pub fn compute(ticket: &Ticket, now: DateTime<Utc>) -> Self {
        let end = ticket.closed_at.unwrap_or(now);
        let sla_target_minutes = ticket.priority.sla_target_minutes();
        let elapsed_minutes = minutes_between(ticket.created_at, end);
        let status_elapsed_minutes = minutes_between(ticket.status_updated_at, end);
        let sla_breached =
            elapsed_minutes > f64::from(sla_target_minutes) && !ticket.status.is_terminal();

        Self {
            sla_target_minutes,
            elapsed_minutes,
            sla_breached,
            status_elapsed_minutes,
        }
    }
}

fn minutes_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let secs = (end - start).num_milliseconds() as f64 / 1000.0;
    (secs / 60.0).max(0.0)
}
