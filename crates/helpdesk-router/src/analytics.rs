//! Read-side rollups over tickets, transcripts and the model-call log.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use helpdesk_core::{AuthorKind, Priority, RequestKind, TicketStatus, TicketTiming};
use helpdesk_store::{StoreError, TicketFilter, TicketStore};
use serde::Serialize;

use crate::{EngineError, RoutingEngine};

/// Snapshot of the whole help desk at `generated_at`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub total_tickets: u64,
    /// Created since the start of the current UTC day.
    pub created_today: u64,
    pub by_status: BTreeMap<String, u64>,
    /// Request types with legacy synonyms folded together.
    pub by_request_type: BTreeMap<String, u64>,
    pub by_priority: BTreeMap<String, u64>,
    pub auto_closed_percent: f64,
    /// Mean creation-to-close time of AUTO_CLOSED tickets; absent when none
    /// have both timestamps.
    pub avg_auto_resolution_seconds: Option<f64>,
    /// `1 - corrected / total` over classification records, as a fraction.
    pub classification_accuracy: Option<f64>,
    /// Closed by automation or customer confirmation with no agent message.
    pub confirmed_without_agent: u64,
    pub open_within_sla: u64,
    pub open_breaching_sla: u64,
    pub generated_at: DateTime<Utc>,
}

pub fn compute(store: &dyn TicketStore, now: DateTime<Utc>) -> Result<Overview, StoreError> {
    let tickets = store.list_tickets(&TicketFilter::default())?;
    let with_agent = store.ticket_ids_with_author(AuthorKind::Agent)?;
    let stats = store.classification_stats()?;
    let day_start = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|d| d.and_utc())
        .unwrap_or(now);

    let mut by_status: BTreeMap<String, u64> = TicketStatus::ALL
        .iter()
        .map(|s| (s.as_str().to_string(), 0))
        .collect();
    let mut by_request_type: BTreeMap<String, u64> = RequestKind::ALL
        .iter()
        .map(|k| (k.as_str().to_string(), 0))
        .collect();
    let mut by_priority: BTreeMap<String, u64> = Priority::ALL
        .iter()
        .map(|p| (p.as_str().to_string(), 0))
        .collect();

    let mut created_today = 0;
    let mut auto_closed = 0u64;
    let mut resolution_total = 0.0;
    let mut resolution_count = 0u64;
    let mut confirmed_without_agent = 0;
    let mut open_within_sla = 0;
    let mut open_breaching_sla = 0;

    for ticket in &tickets {
        *by_status.entry(ticket.status.as_str().to_string()).or_default() += 1;
        let kind = RequestKind::fold(ticket.request_type.as_deref());
        *by_request_type.entry(kind.as_str().to_string()).or_default() += 1;
        *by_priority.entry(ticket.priority.as_str().to_string()).or_default() += 1;

        if ticket.created_at >= day_start {
            created_today += 1;
        }

        if ticket.status == TicketStatus::AutoClosed {
            auto_closed += 1;
            if let Some(closed_at) = ticket.closed_at {
                let delta = (closed_at - ticket.created_at).num_milliseconds() as f64 / 1000.0;
                if delta >= 0.0 {
                    resolution_total += delta;
                    resolution_count += 1;
                }
            }
        }

        if ticket.auto_closed_by_automation
            && ticket.status.is_terminal()
            && !with_agent.contains(&ticket.id)
        {
            confirmed_without_agent += 1;
        }

        if !ticket.status.is_terminal() {
            if TicketTiming::compute(ticket, now).sla_breached {
                open_breaching_sla += 1;
            } else {
                open_within_sla += 1;
            }
        }
    }

    let total_tickets = tickets.len() as u64;
    let auto_closed_percent = if total_tickets == 0 {
        0.0
    } else {
        auto_closed as f64 * 100.0 / total_tickets as f64
    };
    let avg_auto_resolution_seconds =
        (resolution_count > 0).then(|| resolution_total / resolution_count as f64);
    let classification_accuracy =
        (stats.total > 0).then(|| 1.0 - stats.corrected as f64 / stats.total as f64);

    Ok(Overview {
        total_tickets,
        created_today,
        by_status,
        by_request_type,
        by_priority,
        auto_closed_percent,
        avg_auto_resolution_seconds,
        classification_accuracy,
        confirmed_without_agent,
        open_within_sla,
        open_breaching_sla,
        generated_at: now,
    })
}

impl RoutingEngine {
    pub fn overview(&self, now: DateTime<Utc>) -> Result<Overview, EngineError> {
        Ok(compute(self.store.as_ref(), now)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::t0;
    use chrono::Duration;
    use helpdesk_core::{
        AuthorKind, CallKind, Channel, CustomerIdentity, NewMessage, NewModelRecord, NewTicket,
    };
    use helpdesk_store::MemoryStore;

    fn draft(status: TicketStatus, request_type: &str, created_at: DateTime<Utc>) -> NewTicket {
        NewTicket {
            subject: "s".into(),
            description: "d".into(),
            channel: Channel::Portal,
            language: "ru".into(),
            customer: CustomerIdentity::default(),
            request_type: Some(request_type.into()),
            category_code: Some("GENERAL".into()),
            priority: Priority::P2,
            status,
            department_id: None,
            auto_closed_by_automation: status == TicketStatus::AutoClosed,
            automation_disabled: false,
            created_at,
            status_updated_at: created_at,
            closed_at: status.is_terminal().then_some(created_at + Duration::seconds(40)),
        }
    }

    fn classification_record() -> NewModelRecord {
        NewModelRecord {
            model_name: "stub".into(),
            kind: CallKind::Classification,
            request_payload: "{}".into(),
            response_payload: "{}".into(),
            confidence: Some(0.9),
            created_at: t0(),
        }
    }

    #[test]
    fn empty_store_yields_zeroes() {
        let store = MemoryStore::new();
        let overview = compute(&store, t0()).unwrap();
        assert_eq!(overview.total_tickets, 0);
        assert_eq!(overview.auto_closed_percent, 0.0);
        assert!(overview.avg_auto_resolution_seconds.is_none());
        assert!(overview.classification_accuracy.is_none());
        assert_eq!(overview.by_status["auto_closed"], 0);
        assert_eq!(overview.by_priority.len(), 4);
    }

    #[test]
    fn synonyms_share_a_bucket() {
        let store = MemoryStore::new();
        store
            .insert_ticket(draft(TicketStatus::New, "difficulty", t0()), vec![], vec![])
            .unwrap();
        store
            .insert_ticket(draft(TicketStatus::New, "problem", t0()), vec![], vec![])
            .unwrap();
        store
            .insert_ticket(draft(TicketStatus::New, "job", t0()), vec![], vec![])
            .unwrap();

        let overview = compute(&store, t0()).unwrap();
        assert_eq!(overview.by_request_type["problem"], 2);
        assert_eq!(overview.by_request_type["career"], 1);
    }

    #[test]
    fn auto_closure_rates_and_agent_free_confirmations() {
        let store = MemoryStore::new();
        store
            .insert_ticket(
                draft(TicketStatus::AutoClosed, "question", t0()),
                vec![],
                vec![classification_record()],
            )
            .unwrap();
        let handled = store
            .insert_ticket(
                draft(TicketStatus::AutoClosed, "question", t0()),
                vec![NewMessage::new(AuthorKind::Agent, "Готово", "ru", t0())],
                vec![classification_record()],
            )
            .unwrap();
        store
            .insert_ticket(draft(TicketStatus::New, "question", t0()), vec![], vec![])
            .unwrap();
        store
            .insert_ticket(draft(TicketStatus::Closed, "question", t0()), vec![], vec![])
            .unwrap();
        store
            .mark_latest_corrected(handled.id, CallKind::Classification)
            .unwrap();

        let overview = compute(&store, t0() + Duration::minutes(10)).unwrap();
        assert_eq!(overview.total_tickets, 4);
        assert_eq!(overview.auto_closed_percent, 50.0);
        assert_eq!(overview.avg_auto_resolution_seconds, Some(40.0));
        assert_eq!(overview.classification_accuracy, Some(0.5));
        assert_eq!(overview.confirmed_without_agent, 1);
    }

    #[test]
    fn negative_resolution_time_is_ignored() {
        let store = MemoryStore::new();
        let mut skewed = draft(TicketStatus::AutoClosed, "question", t0());
        skewed.closed_at = Some(t0() - Duration::seconds(5));
        store.insert_ticket(skewed, vec![], vec![]).unwrap();

        let overview = compute(&store, t0()).unwrap();
        assert_eq!(overview.auto_closed_percent, 100.0);
        assert!(overview.avg_auto_resolution_seconds.is_none());
    }

    #[test]
    fn created_today_and_sla_buckets() {
        let store = MemoryStore::new();
        let now = t0() + Duration::hours(3);
        store
            .insert_ticket(draft(TicketStatus::New, "problem", t0()), vec![], vec![])
            .unwrap();
        store
            .insert_ticket(
                draft(TicketStatus::InProgress, "problem", now - Duration::minutes(5)),
                vec![],
                vec![],
            )
            .unwrap();
        store
            .insert_ticket(
                draft(TicketStatus::New, "problem", t0() - Duration::days(1)),
                vec![],
                vec![],
            )
            .unwrap();

        let overview = compute(&store, now).unwrap();
        assert_eq!(overview.created_today, 2);
        assert_eq!(overview.open_breaching_sla, 2);
        assert_eq!(overview.open_within_sla, 1);
        assert_eq!(overview.generated_at, now);
    }
}
