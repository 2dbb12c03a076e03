//! Ticket state machine.
//!
//! ```text
//! NEW ──► IN_PROGRESS ──► CLOSED | AUTO_CLOSED
//!  └──────────────────────► AUTO_CLOSED   (first-contact auto-resolution)
//! ```
//!
//! Every transition here keeps `closed_at` set exactly when the status is
//! terminal and stamps `updated_at`.

use chrono::{DateTime, Utc};

use crate::{Priority, Ticket, TicketStatus, ValidationError};

/// Operator-supplied status change with optional field overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusOverride {
    pub status: TicketStatus,
    pub priority: Option<Priority>,
    pub request_type: Option<String>,
    pub automation_disabled: Option<bool>,
}

impl StatusOverride {
    pub fn new(status: TicketStatus) -> Self {
        Self {
            status,
            priority: None,
            request_type: None,
            automation_disabled: None,
        }
    }

    /// Build an override from raw operator input, rejecting unknown codes.
    pub fn parse(
        status: &str,
        priority: Option<&str>,
        request_type: Option<String>,
        automation_disabled: Option<bool>,
    ) -> Result<Self, ValidationError> {
        let status = status.parse::<TicketStatus>()?;
        let priority = priority.map(str::parse::<Priority>).transpose()?;
        Ok(Self {
            status,
            priority,
            request_type,
            automation_disabled,
        })
    }
}

/// Whether `closed_at` agrees with the status.
pub fn closed_at_consistent(ticket: &Ticket) -> bool {
    ticket.closed_at.is_some() == ticket.status.is_terminal()
}

/// Move a ticket into IN_PROGRESS on a customer follow-up.
///
/// Only the first transition stamps `status_updated_at`; repeated calls
/// while already in progress leave it alone. A follow-up on a terminal
/// ticket reopens it and clears `closed_at`. Returns whether the status
/// changed.
pub fn begin_progress(ticket: &mut Ticket, now: DateTime<Utc>) -> bool {
    ticket.updated_at = now;
    if ticket.status == TicketStatus::InProgress {
        return false;
    }
    if ticket.status.is_terminal() {
        ticket.closed_at = None;
        ticket.auto_closed_by_automation = false;
    }
    ticket.status = TicketStatus::InProgress;
    ticket.status_updated_at = now;
    true
}

/// Close a ticket on behalf of automation.
pub fn auto_close(ticket: &mut Ticket, now: DateTime<Utc>) {
    ticket.status = TicketStatus::AutoClosed;
    ticket.auto_closed_by_automation = true;
    ticket.closed_at = Some(now);
    ticket.status_updated_at = now;
    ticket.updated_at = now;
}

/// Close a ticket because the customer confirmed the automated answer helped.
pub fn confirm_resolved(ticket: &mut Ticket, now: DateTime<Utc>) {
    ticket.status = TicketStatus::Closed;
    ticket.auto_closed_by_automation = true;
    ticket.closed_at = Some(now);
    ticket.status_updated_at = now;
    ticket.updated_at = now;
}

/// Apply a manual operator override.
///
/// Moving into a terminal status stamps `closed_at` unless the ticket was
/// already terminal, in which case the original close time is kept. Moving
/// into an open status clears it. Any status other than AUTO_CLOSED drops
/// the automation-closed flag.
pub fn apply_override(ticket: &mut Ticket, change: &StatusOverride, now: DateTime<Utc>) {
    let previous = ticket.status;
    ticket.status = change.status;

    if change.status.is_terminal() {
        if !previous.is_terminal() || ticket.closed_at.is_none() {
            ticket.closed_at = Some(now);
        }
    } else {
        ticket.closed_at = None;
    }

    if change.status != previous {
        ticket.status_updated_at = now;
    }

    if change.status != TicketStatus::AutoClosed {
        ticket.auto_closed_by_automation = false;
    }

    if let Some(priority) = change.priority {
        ticket.priority = priority;
    }
    if let Some(request_type) = &change.request_type {
        ticket.request_type = Some(request_type.clone());
    }
    if let Some(disabled) = change.automation_disabled {
        ticket.automation_disabled = disabled;
    }
    ticket.updated_at = now;
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{Channel, CustomerIdentity};
    use chrono::{Duration, TimeZone};

    pub(crate) fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
    }

    pub(crate) fn sample_ticket(status: TicketStatus) -> Ticket {
        Ticket {
            id: 1,
            subject: "Нет связи".into(),
            description: "Не работает интернет".into(),
            channel: Channel::Portal,
            language: "ru".into(),
            customer: CustomerIdentity::default(),
            request_type: Some("problem".into()),
            category_code: Some("INTERNET_HOME".into()),
            priority: Priority::P2,
            status,
            department_id: Some(1),
            auto_closed_by_automation: false,
            automation_disabled: false,
            created_at: t0(),
            updated_at: t0(),
            status_updated_at: t0(),
            closed_at: status.is_terminal().then(t0),
        }
    }

    #[test]
    fn first_progress_transition_stamps_status_time() {
        let mut ticket = sample_ticket(TicketStatus::New);
        let later = t0() + Duration::minutes(5);
        assert!(begin_progress(&mut ticket, later));
        assert_eq!(ticket.status, TicketStatus::InProgress);
        assert_eq!(ticket.status_updated_at, later);
    }

    #[test]
    fn repeated_progress_keeps_status_time() {
        let mut ticket = sample_ticket(TicketStatus::New);
        let first = t0() + Duration::minutes(5);
        let second = t0() + Duration::minutes(9);
        begin_progress(&mut ticket, first);
        assert!(!begin_progress(&mut ticket, second));
        assert_eq!(ticket.status_updated_at, first);
        assert_eq!(ticket.updated_at, second);
    }

    #[test]
    fn progress_on_terminal_ticket_reopens() {
        let mut ticket = sample_ticket(TicketStatus::AutoClosed);
        ticket.auto_closed_by_automation = true;
        begin_progress(&mut ticket, t0() + Duration::hours(1));
        assert_eq!(ticket.status, TicketStatus::InProgress);
        assert!(ticket.closed_at.is_none());
        assert!(!ticket.auto_closed_by_automation);
        assert!(closed_at_consistent(&ticket));
    }

    #[test]
    fn auto_close_sets_matching_timestamps() {
        let mut ticket = sample_ticket(TicketStatus::New);
        let now = t0() + Duration::seconds(3);
        auto_close(&mut ticket, now);
        assert_eq!(ticket.status, TicketStatus::AutoClosed);
        assert!(ticket.auto_closed_by_automation);
        assert_eq!(ticket.closed_at, Some(ticket.status_updated_at));
    }

    #[test]
    fn confirm_resolved_closes_with_flag() {
        let mut ticket = sample_ticket(TicketStatus::InProgress);
        confirm_resolved(&mut ticket, t0() + Duration::minutes(2));
        assert_eq!(ticket.status, TicketStatus::Closed);
        assert!(ticket.auto_closed_by_automation);
        assert!(closed_at_consistent(&ticket));
    }

    #[test]
    fn override_to_open_status_clears_closed_at() {
        let mut ticket = sample_ticket(TicketStatus::Closed);
        let now = t0() + Duration::minutes(30);
        apply_override(&mut ticket, &StatusOverride::new(TicketStatus::InProgress), now);
        assert!(ticket.closed_at.is_none());
        assert_eq!(ticket.status_updated_at, now);
    }

    #[test]
    fn override_between_terminal_statuses_keeps_close_time() {
        let mut ticket = sample_ticket(TicketStatus::Closed);
        let now = t0() + Duration::minutes(30);
        apply_override(&mut ticket, &StatusOverride::new(TicketStatus::AutoClosed), now);
        assert_eq!(ticket.closed_at, Some(t0()));
        assert_eq!(ticket.status_updated_at, now);
    }

    #[test]
    fn override_to_closed_drops_automation_flag() {
        let mut ticket = sample_ticket(TicketStatus::New);
        ticket.auto_closed_by_automation = true;
        apply_override(&mut ticket, &StatusOverride::new(TicketStatus::Closed), t0());
        assert!(!ticket.auto_closed_by_automation);
        assert!(closed_at_consistent(&ticket));
    }

    #[test]
    fn override_same_open_status_keeps_status_time() {
        let mut ticket = sample_ticket(TicketStatus::New);
        apply_override(
            &mut ticket,
            &StatusOverride::new(TicketStatus::New),
            t0() + Duration::minutes(1),
        );
        assert_eq!(ticket.status_updated_at, t0());
    }

    #[test]
    fn override_applies_field_changes() {
        let mut ticket = sample_ticket(TicketStatus::New);
        let change = StatusOverride::parse("in_progress", Some("P1"), Some("question".into()), Some(true))
            .unwrap();
        apply_override(&mut ticket, &change, t0());
        assert_eq!(ticket.priority, Priority::P1);
        assert_eq!(ticket.request_type.as_deref(), Some("question"));
        assert!(ticket.automation_disabled);
    }

    #[test]
    fn parse_rejects_unknown_status() {
        let err = StatusOverride::parse("escalated", None, None, None).unwrap_err();
        assert_eq!(err, ValidationError::UnknownStatus("escalated".into()));
    }
}
