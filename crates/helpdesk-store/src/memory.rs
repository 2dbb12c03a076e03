//! In-memory backend.
//!
//! All state sits behind one mutex. A unit of work is staged on copies and
//! validated before anything is written, so a failed unit leaves no trace.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use helpdesk_core::{
    AuthorKind, CallKind, Department, FaqEntry, Message, ModelRecord, NewFaqEntry, NewMessage,
    NewModelRecord, NewTicket, Ticket, TicketId,
};

use crate::store::{ClassificationStats, Mutation, TicketFilter, TicketStore, check_ticket};
use crate::StoreError;

#[derive(Default)]
struct State {
    tickets: BTreeMap<TicketId, Ticket>,
    messages: Vec<Message>,
    departments: Vec<Department>,
    faq: Vec<FaqEntry>,
    records: Vec<ModelRecord>,
    next_ticket: i64,
    next_message: i64,
    next_department: i64,
    next_faq: i64,
    next_record: i64,
}

fn bump(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

impl State {
    fn transcript(&self, ticket_id: TicketId) -> Vec<Message> {
        let mut out: Vec<Message> = self
            .messages
            .iter()
            .filter(|m| m.ticket_id == ticket_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        out
    }

    fn append(&mut self, ticket_id: TicketId, messages: Vec<NewMessage>, records: Vec<NewModelRecord>) {
        for m in messages {
            let id = bump(&mut self.next_message);
            self.messages.push(Message {
                id,
                ticket_id,
                author: m.author,
                body: m.body,
                language: m.language,
                created_at: m.created_at,
            });
        }
        for r in records {
            let id = bump(&mut self.next_record);
            self.records.push(record_from(id, Some(ticket_id), r));
        }
    }
}

fn record_from(id: i64, ticket_id: Option<TicketId>, r: NewModelRecord) -> ModelRecord {
    ModelRecord {
        id,
        ticket_id,
        model_name: r.model_name,
        kind: r.kind,
        request_payload: r.request_payload,
        response_payload: r.response_payload,
        confidence: r.confidence,
        was_corrected: false,
        created_at: r.created_at,
    }
}

/// Ephemeral store for tests and single-process tooling.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl TicketStore for MemoryStore {
    fn get_or_create_department(&self, code: &str) -> Result<Department, StoreError> {
        let mut state = self.lock()?;
        if let Some(existing) = state.departments.iter().find(|d| d.code == code) {
            return Ok(existing.clone());
        }
        let department = Department {
            id: bump(&mut state.next_department),
            code: code.to_string(),
            name: code.to_string(),
        };
        state.departments.push(department.clone());
        Ok(department)
    }

    fn department(&self, id: i64) -> Result<Option<Department>, StoreError> {
        let state = self.lock()?;
        Ok(state.departments.iter().find(|d| d.id == id).cloned())
    }

    fn rename_department(&self, code: &str, name: &str) -> Result<Department, StoreError> {
        let mut state = self.lock()?;
        let department = state
            .departments
            .iter_mut()
            .find(|d| d.code == code)
            .ok_or_else(|| StoreError::DepartmentNotFound(code.to_string()))?;
        department.name = name.to_string();
        Ok(department.clone())
    }

    fn insert_ticket(
        &self,
        draft: NewTicket,
        messages: Vec<NewMessage>,
        records: Vec<NewModelRecord>,
    ) -> Result<Ticket, StoreError> {
        let mut state = self.lock()?;
        let id = state.next_ticket + 1;
        let ticket = draft.into_ticket(id);
        check_ticket(&ticket)?;

        state.next_ticket = id;
        state.tickets.insert(id, ticket.clone());
        state.append(id, messages, records);
        Ok(ticket)
    }

    fn update_ticket(
        &self,
        id: TicketId,
        mutation: Mutation<'_>,
    ) -> Result<Option<Ticket>, StoreError> {
        let mut state = self.lock()?;
        let mut ticket = state
            .tickets
            .get(&id)
            .cloned()
            .ok_or(StoreError::TicketNotFound(id))?;
        let transcript = state.transcript(id);

        let Some(changes) = mutation(&mut ticket, &transcript) else {
            return Ok(None);
        };
        ticket.id = id;
        check_ticket(&ticket)?;

        state.tickets.insert(id, ticket.clone());
        state.append(id, changes.messages, changes.records);
        Ok(Some(ticket))
    }

    fn ticket(&self, id: TicketId) -> Result<Option<Ticket>, StoreError> {
        Ok(self.lock()?.tickets.get(&id).cloned())
    }

    fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, StoreError> {
        let state = self.lock()?;
        let mut out: Vec<Ticket> = state
            .tickets
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(out)
    }

    fn messages(&self, ticket_id: TicketId) -> Result<Vec<Message>, StoreError> {
        Ok(self.lock()?.transcript(ticket_id))
    }

    fn ticket_ids_with_author(&self, author: AuthorKind) -> Result<HashSet<TicketId>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .messages
            .iter()
            .filter(|m| m.author == author)
            .map(|m| m.ticket_id)
            .collect())
    }

    fn append_model_record(
        &self,
        ticket_id: Option<TicketId>,
        record: NewModelRecord,
    ) -> Result<ModelRecord, StoreError> {
        let mut state = self.lock()?;
        if let Some(id) = ticket_id
            && !state.tickets.contains_key(&id)
        {
            return Err(StoreError::TicketNotFound(id));
        }
        let id = bump(&mut state.next_record);
        let stored = record_from(id, ticket_id, record);
        state.records.push(stored.clone());
        Ok(stored)
    }

    fn model_records(&self, ticket_id: TicketId) -> Result<Vec<ModelRecord>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .records
            .iter()
            .filter(|r| r.ticket_id == Some(ticket_id))
            .cloned()
            .collect())
    }

    fn mark_latest_corrected(&self, ticket_id: TicketId, kind: CallKind) -> Result<bool, StoreError> {
        let mut state = self.lock()?;
        let latest = state
            .records
            .iter_mut()
            .filter(|r| r.ticket_id == Some(ticket_id) && r.kind == kind)
            .max_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        match latest {
            Some(record) => {
                record.was_corrected = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn classification_stats(&self) -> Result<ClassificationStats, StoreError> {
        let state = self.lock()?;
        let mut stats = ClassificationStats::default();
        for r in state.records.iter().filter(|r| r.kind == CallKind::Classification) {
            stats.total += 1;
            if r.was_corrected {
                stats.corrected += 1;
            }
        }
        Ok(stats)
    }

    fn add_faq(&self, entry: NewFaqEntry) -> Result<FaqEntry, StoreError> {
        let mut state = self.lock()?;
        let faq = FaqEntry {
            id: bump(&mut state.next_faq),
            question: entry.question,
            answer: entry.answer,
            language: entry.language,
            category_code: entry.category_code,
            auto_resolvable: entry.auto_resolvable,
        };
        state.faq.push(faq.clone());
        Ok(faq)
    }

    fn list_faq(&self, language: Option<&str>) -> Result<Vec<FaqEntry>, StoreError> {
        let state = self.lock()?;
        let mut out: Vec<FaqEntry> = state
            .faq
            .iter()
            .filter(|f| language.is_none_or(|l| f.language == l))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(out)
    }

    fn delete_faq(&self, id: i64) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        let before = state.faq.len();
        state.faq.retain(|f| f.id != id);
        if state.faq.len() == before {
            return Err(StoreError::FaqNotFound(id));
        }
        Ok(())
    }
}
