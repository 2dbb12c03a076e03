//! DuckDB backend.
//!
//! Timestamps are stored as BIGINT microseconds since the epoch and enums as
//! their string codes. Every unit of work runs in one DuckDB transaction on a
//! connection guarded by a mutex.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use duckdb::{Connection, Row, Transaction, params, params_from_iter};
use helpdesk_core::{
    AuthorKind, CallKind, CustomerIdentity, Department, FaqEntry, Message, ModelRecord,
    NewFaqEntry, NewMessage, NewModelRecord, NewTicket, Ticket, TicketId,
};
use tracing::{debug, info};

use crate::store::{ClassificationStats, Mutation, TicketFilter, TicketStore, check_ticket};
use crate::StoreError;

const SCHEMA: &str = "
CREATE SEQUENCE IF NOT EXISTS department_seq START 1;
CREATE SEQUENCE IF NOT EXISTS ticket_seq START 1;
CREATE SEQUENCE IF NOT EXISTS message_seq START 1;
CREATE SEQUENCE IF NOT EXISTS faq_seq START 1;
CREATE SEQUENCE IF NOT EXISTS model_record_seq START 1;

CREATE TABLE IF NOT EXISTS departments (
    id BIGINT PRIMARY KEY DEFAULT nextval('department_seq'),
    code VARCHAR NOT NULL UNIQUE,
    name VARCHAR NOT NULL
);

CREATE TABLE IF NOT EXISTS tickets (
    id BIGINT PRIMARY KEY DEFAULT nextval('ticket_seq'),
    subject VARCHAR NOT NULL,
    description VARCHAR NOT NULL,
    channel VARCHAR NOT NULL,
    language VARCHAR NOT NULL,
    customer_email VARCHAR,
    customer_username VARCHAR,
    customer_external_id VARCHAR,
    request_type VARCHAR,
    category_code VARCHAR,
    priority VARCHAR NOT NULL,
    status VARCHAR NOT NULL,
    department_id BIGINT,
    auto_closed_by_automation BOOLEAN NOT NULL,
    automation_disabled BOOLEAN NOT NULL,
    created_at BIGINT NOT NULL,
    updated_at BIGINT NOT NULL,
    status_updated_at BIGINT NOT NULL,
    closed_at BIGINT
);

CREATE TABLE IF NOT EXISTS messages (
    id BIGINT PRIMARY KEY DEFAULT nextval('message_seq'),
    ticket_id BIGINT NOT NULL,
    author VARCHAR NOT NULL,
    body VARCHAR NOT NULL,
    language VARCHAR NOT NULL,
    created_at BIGINT NOT NULL
);

CREATE TABLE IF NOT EXISTS faq_entries (
    id BIGINT PRIMARY KEY DEFAULT nextval('faq_seq'),
    question VARCHAR NOT NULL,
    answer VARCHAR NOT NULL,
    language VARCHAR NOT NULL,
    category_code VARCHAR,
    auto_resolvable BOOLEAN NOT NULL
);

CREATE TABLE IF NOT EXISTS model_records (
    id BIGINT PRIMARY KEY DEFAULT nextval('model_record_seq'),
    ticket_id BIGINT,
    model_name VARCHAR NOT NULL,
    kind VARCHAR NOT NULL,
    request_payload VARCHAR NOT NULL,
    response_payload VARCHAR NOT NULL,
    confidence DOUBLE,
    was_corrected BOOLEAN NOT NULL DEFAULT false,
    created_at BIGINT NOT NULL
);
";

const TICKET_COLUMNS: &str = "id, subject, description, channel, language, customer_email, \
     customer_username, customer_external_id, request_type, category_code, priority, status, \
     department_id, auto_closed_by_automation, automation_disabled, created_at, updated_at, \
     status_updated_at, closed_at";

const MESSAGE_COLUMNS: &str = "id, ticket_id, author, body, language, created_at";

const RECORD_COLUMNS: &str = "id, ticket_id, model_name, kind, request_payload, \
     response_payload, confidence, was_corrected, created_at";

const FAQ_COLUMNS: &str = "id, question, answer, language, category_code, auto_resolvable";

// ── Row conversion ──

/// Turn "no rows" into `None`.
fn optional<T>(result: duckdb::Result<T>) -> Result<Option<T>, StoreError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn micros(at: DateTime<Utc>) -> i64 {
    at.timestamp_micros()
}

fn from_micros(value: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_micros(value)
        .ok_or_else(|| StoreError::Corrupt(format!("timestamp out of range: {value}")))
}

/// A `tickets` row as DuckDB hands it back, before enum parsing.
struct TicketRow {
    id: i64,
    subject: String,
    description: String,
    channel: String,
    language: String,
    customer_email: Option<String>,
    customer_username: Option<String>,
    customer_external_id: Option<String>,
    request_type: Option<String>,
    category_code: Option<String>,
    priority: String,
    status: String,
    department_id: Option<i64>,
    auto_closed_by_automation: bool,
    automation_disabled: bool,
    created_at: i64,
    updated_at: i64,
    status_updated_at: i64,
    closed_at: Option<i64>,
}

impl TicketRow {
    fn read(row: &Row<'_>) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            subject: row.get(1)?,
            description: row.get(2)?,
            channel: row.get(3)?,
            language: row.get(4)?,
            customer_email: row.get(5)?,
            customer_username: row.get(6)?,
            customer_external_id: row.get(7)?,
            request_type: row.get(8)?,
            category_code: row.get(9)?,
            priority: row.get(10)?,
            status: row.get(11)?,
            department_id: row.get(12)?,
            auto_closed_by_automation: row.get(13)?,
            automation_disabled: row.get(14)?,
            created_at: row.get(15)?,
            updated_at: row.get(16)?,
            status_updated_at: row.get(17)?,
            closed_at: row.get(18)?,
        })
    }
}

impl TryFrom<TicketRow> for Ticket {
    type Error = StoreError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        Ok(Ticket {
            id: row.id,
            subject: row.subject,
            description: row.description,
            channel: row.channel.parse()?,
            language: row.language,
            customer: CustomerIdentity {
                email: row.customer_email,
                username: row.customer_username,
                external_user_id: row.customer_external_id,
            },
            request_type: row.request_type,
            category_code: row.category_code,
            priority: row.priority.parse()?,
            status: row.status.parse()?,
            department_id: row.department_id,
            auto_closed_by_automation: row.auto_closed_by_automation,
            automation_disabled: row.automation_disabled,
            created_at: from_micros(row.created_at)?,
            updated_at: from_micros(row.updated_at)?,
            status_updated_at: from_micros(row.status_updated_at)?,
            closed_at: row.closed_at.map(from_micros).transpose()?,
        })
    }
}

fn read_message(row: &Row<'_>) -> duckdb::Result<(i64, i64, String, String, String, i64)> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn message_from(raw: (i64, i64, String, String, String, i64)) -> Result<Message, StoreError> {
    let (id, ticket_id, author, body, language, created_at) = raw;
    Ok(Message {
        id,
        ticket_id,
        author: author.parse()?,
        body,
        language,
        created_at: from_micros(created_at)?,
    })
}

struct RecordRow {
    id: i64,
    ticket_id: Option<i64>,
    model_name: String,
    kind: String,
    request_payload: String,
    response_payload: String,
    confidence: Option<f64>,
    was_corrected: bool,
    created_at: i64,
}

impl RecordRow {
    fn read(row: &Row<'_>) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            ticket_id: row.get(1)?,
            model_name: row.get(2)?,
            kind: row.get(3)?,
            request_payload: row.get(4)?,
            response_payload: row.get(5)?,
            confidence: row.get(6)?,
            was_corrected: row.get(7)?,
            created_at: row.get(8)?,
        })
    }
}

impl TryFrom<RecordRow> for ModelRecord {
    type Error = StoreError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        Ok(ModelRecord {
            id: row.id,
            ticket_id: row.ticket_id,
            model_name: row.model_name,
            kind: row.kind.parse()?,
            request_payload: row.request_payload,
            response_payload: row.response_payload,
            confidence: row.confidence,
            was_corrected: row.was_corrected,
            created_at: from_micros(row.created_at)?,
        })
    }
}

fn read_faq(row: &Row<'_>) -> duckdb::Result<FaqEntry> {
    Ok(FaqEntry {
        id: row.get(0)?,
        question: row.get(1)?,
        answer: row.get(2)?,
        language: row.get(3)?,
        category_code: row.get(4)?,
        auto_resolvable: row.get(5)?,
    })
}

fn read_department(row: &Row<'_>) -> duckdb::Result<Department> {
    Ok(Department {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
    })
}

// ── Transaction helpers ──

fn load_ticket(tx: &Transaction<'_>, id: TicketId) -> Result<Option<Ticket>, StoreError> {
    let sql = format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = ?");
    let row = optional(tx.query_row(&sql, [id], TicketRow::read))?;
    row.map(Ticket::try_from).transpose()
}

fn load_transcript(conn: &Connection, ticket_id: TicketId) -> Result<Vec<Message>, StoreError> {
    let sql = format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages WHERE ticket_id = ? ORDER BY created_at, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([ticket_id], read_message)?;
    rows.map(|r| message_from(r?)).collect()
}

fn insert_messages(
    tx: &Transaction<'_>,
    ticket_id: TicketId,
    messages: &[NewMessage],
) -> Result<(), StoreError> {
    for m in messages {
        tx.execute(
            "INSERT INTO messages (ticket_id, author, body, language, created_at) \
             VALUES (?, ?, ?, ?, ?)",
            params![
                ticket_id,
                m.author.as_str(),
                m.body,
                m.language,
                micros(m.created_at)
            ],
        )?;
    }
    Ok(())
}

fn insert_record(
    tx: &Transaction<'_>,
    ticket_id: Option<TicketId>,
    record: &NewModelRecord,
) -> Result<i64, StoreError> {
    let id = tx.query_row(
        "INSERT INTO model_records \
         (ticket_id, model_name, kind, request_payload, response_payload, confidence, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id",
        params![
            ticket_id,
            record.model_name,
            record.kind.as_str(),
            record.request_payload,
            record.response_payload,
            record.confidence,
            micros(record.created_at)
        ],
        |row| row.get(0),
    )?;
    Ok(id)
}

fn write_ticket(tx: &Transaction<'_>, t: &Ticket) -> Result<(), StoreError> {
    tx.execute(
        "UPDATE tickets SET subject = ?, description = ?, channel = ?, language = ?, \
         customer_email = ?, customer_username = ?, customer_external_id = ?, \
         request_type = ?, category_code = ?, priority = ?, status = ?, department_id = ?, \
         auto_closed_by_automation = ?, automation_disabled = ?, updated_at = ?, \
         status_updated_at = ?, closed_at = ? WHERE id = ?",
        params![
            t.subject,
            t.description,
            t.channel.as_str(),
            t.language,
            t.customer.email,
            t.customer.username,
            t.customer.external_user_id,
            t.request_type,
            t.category_code,
            t.priority.as_str(),
            t.status.as_str(),
            t.department_id,
            t.auto_closed_by_automation,
            t.automation_disabled,
            micros(t.updated_at),
            micros(t.status_updated_at),
            t.closed_at.map(micros),
            t.id
        ],
    )?;
    Ok(())
}

// ── Store ──

/// DuckDB-backed ticket store.
///
/// [`open`](Self::open) gives an in-memory database for tests and one-off
/// runs, [`open_persistent`](Self::open_persistent) a file that survives
/// restarts. The schema is created on open if missing.
pub struct DuckStore {
    conn: Mutex<Connection>,
}

impl DuckStore {
    /// Open an in-memory DuckDB database.
    pub fn open() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    /// Open or create a persistent DuckDB database at the given path.
    pub fn open_persistent(path: &Path) -> Result<Self, StoreError> {
        let store = Self::init(Connection::open(path)?)?;
        info!(path = %path.display(), "opened ticket database");
        Ok(store)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Number of tickets stored.
    pub fn ticket_count(&self) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT count(*) FROM tickets", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn find_department(conn: &Connection, code: &str) -> Result<Option<Department>, StoreError> {
        optional(conn.query_row(
            "SELECT id, code, name FROM departments WHERE code = ?",
            [code],
            read_department,
        ))
    }
}

impl TicketStore for DuckStore {
    fn get_or_create_department(&self, code: &str) -> Result<Department, StoreError> {
        let conn = self.lock()?;
        if let Some(existing) = Self::find_department(&conn, code)? {
            return Ok(existing);
        }
        let inserted = conn.query_row(
            "INSERT INTO departments (code, name) VALUES (?, ?) RETURNING id, code, name",
            [code, code],
            read_department,
        );
        match inserted {
            Ok(department) => {
                info!(code, "created department");
                Ok(department)
            }
            // Another writer won the race on the unique code.
            Err(err) => Self::find_department(&conn, code)?.ok_or(StoreError::DuckDb(err)),
        }
    }

    fn department(&self, id: i64) -> Result<Option<Department>, StoreError> {
        let conn = self.lock()?;
        optional(conn.query_row(
            "SELECT id, code, name FROM departments WHERE id = ?",
            [id],
            read_department,
        ))
    }

    fn rename_department(&self, code: &str, name: &str) -> Result<Department, StoreError> {
        let conn = self.lock()?;
        optional(conn.query_row(
            "UPDATE departments SET name = ? WHERE code = ? RETURNING id, code, name",
            [name, code],
            read_department,
        ))?
        .ok_or_else(|| StoreError::DepartmentNotFound(code.to_string()))
    }

    fn insert_ticket(
        &self,
        draft: NewTicket,
        messages: Vec<NewMessage>,
        records: Vec<NewModelRecord>,
    ) -> Result<Ticket, StoreError> {
        // Validate before touching the database; the id is not part of the check.
        let probe = draft.clone().into_ticket(0);
        check_ticket(&probe)?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let id: i64 = tx.query_row(
            "INSERT INTO tickets (subject, description, channel, language, customer_email, \
             customer_username, customer_external_id, request_type, category_code, priority, \
             status, department_id, auto_closed_by_automation, automation_disabled, created_at, \
             updated_at, status_updated_at, closed_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
            params![
                draft.subject,
                draft.description,
                draft.channel.as_str(),
                draft.language,
                draft.customer.email,
                draft.customer.username,
                draft.customer.external_user_id,
                draft.request_type,
                draft.category_code,
                draft.priority.as_str(),
                draft.status.as_str(),
                draft.department_id,
                draft.auto_closed_by_automation,
                draft.automation_disabled,
                micros(draft.created_at),
                micros(draft.created_at),
                micros(draft.status_updated_at),
                draft.closed_at.map(micros)
            ],
            |row| row.get(0),
        )?;
        insert_messages(&tx, id, &messages)?;
        for record in &records {
            insert_record(&tx, Some(id), record)?;
        }
        tx.commit()?;

        debug!(id, messages = messages.len(), records = records.len(), "inserted ticket");
        Ok(draft.into_ticket(id))
    }

    fn update_ticket(
        &self,
        id: TicketId,
        mutation: Mutation<'_>,
    ) -> Result<Option<Ticket>, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut ticket = load_ticket(&tx, id)?.ok_or(StoreError::TicketNotFound(id))?;
        let transcript = load_transcript(&tx, id)?;

        // Dropping `tx` without commit rolls back.
        let Some(changes) = mutation(&mut ticket, &transcript) else {
            return Ok(None);
        };
        ticket.id = id;
        check_ticket(&ticket)?;

        write_ticket(&tx, &ticket)?;
        insert_messages(&tx, id, &changes.messages)?;
        for record in &changes.records {
            insert_record(&tx, Some(id), record)?;
        }
        tx.commit()?;

        debug!(id, status = %ticket.status, "updated ticket");
        Ok(Some(ticket))
    }

    fn ticket(&self, id: TicketId) -> Result<Option<Ticket>, StoreError> {
        let conn = self.lock()?;
        let sql = format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = ?");
        let row = optional(conn.query_row(&sql, [id], TicketRow::read))?;
        row.map(Ticket::try_from).transpose()
    }

    fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, StoreError> {
        let mut clauses = Vec::new();
        let mut values: Vec<&str> = Vec::new();
        if let Some(status) = filter.status {
            clauses.push("status = ?");
            values.push(status.as_str());
        }
        if let Some(channel) = filter.channel {
            clauses.push("channel = ?");
            values.push(channel.as_str());
        }
        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT {TICKET_COLUMNS} FROM tickets {where_clause} ORDER BY created_at DESC, id DESC"
        );

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), TicketRow::read)?;
        rows.map(|r| Ticket::try_from(r?)).collect()
    }

    fn messages(&self, ticket_id: TicketId) -> Result<Vec<Message>, StoreError> {
        let conn = self.lock()?;
        load_transcript(&conn, ticket_id)
    }

    fn ticket_ids_with_author(&self, author: AuthorKind) -> Result<HashSet<TicketId>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT DISTINCT ticket_id FROM messages WHERE author = ?")?;
        let rows = stmt.query_map([author.as_str()], |row| row.get::<_, i64>(0))?;
        Ok(rows.collect::<Result<HashSet<_>, _>>()?)
    }

    fn append_model_record(
        &self,
        ticket_id: Option<TicketId>,
        record: NewModelRecord,
    ) -> Result<ModelRecord, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        if let Some(id) = ticket_id
            && load_ticket(&tx, id)?.is_none()
        {
            return Err(StoreError::TicketNotFound(id));
        }
        let id = insert_record(&tx, ticket_id, &record)?;
        tx.commit()?;

        Ok(ModelRecord {
            id,
            ticket_id,
            model_name: record.model_name,
            kind: record.kind,
            request_payload: record.request_payload,
            response_payload: record.response_payload,
            confidence: record.confidence,
            was_corrected: false,
            created_at: record.created_at,
        })
    }

    fn model_records(&self, ticket_id: TicketId) -> Result<Vec<ModelRecord>, StoreError> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM model_records WHERE ticket_id = ? ORDER BY created_at, id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([ticket_id], RecordRow::read)?;
        rows.map(|r| ModelRecord::try_from(r?)).collect()
    }

    fn mark_latest_corrected(&self, ticket_id: TicketId, kind: CallKind) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE model_records SET was_corrected = true WHERE id = ( \
                 SELECT id FROM model_records WHERE ticket_id = ? AND kind = ? \
                 ORDER BY created_at DESC, id DESC LIMIT 1)",
            params![ticket_id, kind.as_str()],
        )?;
        Ok(updated > 0)
    }

    fn classification_stats(&self) -> Result<ClassificationStats, StoreError> {
        let conn = self.lock()?;
        let (total, corrected): (i64, i64) = conn.query_row(
            "SELECT count(*), count(*) FILTER (WHERE was_corrected) \
             FROM model_records WHERE kind = ?",
            [CallKind::Classification.as_str()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(ClassificationStats {
            total: total.max(0) as u64,
            corrected: corrected.max(0) as u64,
        })
    }

    fn add_faq(&self, entry: NewFaqEntry) -> Result<FaqEntry, StoreError> {
        let conn = self.lock()?;
        let sql = format!(
            "INSERT INTO faq_entries (question, answer, language, category_code, auto_resolvable) \
             VALUES (?, ?, ?, ?, ?) RETURNING {FAQ_COLUMNS}"
        );
        let faq = conn.query_row(
            &sql,
            params![
                entry.question,
                entry.answer,
                entry.language,
                entry.category_code,
                entry.auto_resolvable
            ],
            read_faq,
        )?;
        info!(id = faq.id, language = %faq.language, "added FAQ entry");
        Ok(faq)
    }

    fn list_faq(&self, language: Option<&str>) -> Result<Vec<FaqEntry>, StoreError> {
        let conn = self.lock()?;
        let (sql, values): (String, Vec<&str>) = match language {
            Some(lang) => (
                format!("SELECT {FAQ_COLUMNS} FROM faq_entries WHERE language = ? ORDER BY id DESC"),
                vec![lang],
            ),
            None => (
                format!("SELECT {FAQ_COLUMNS} FROM faq_entries ORDER BY id DESC"),
                Vec::new(),
            ),
        };
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), read_faq)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn delete_faq(&self, id: i64) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM faq_entries WHERE id = ?", [id])?;
        if deleted == 0 {
            return Err(StoreError::FaqNotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Changes;
    use chrono::{Duration, TimeZone};
    use helpdesk_core::{Channel, Priority, TicketStatus};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).unwrap()
    }

    fn draft(status: TicketStatus) -> NewTicket {
        NewTicket {
            subject: "Нет интернета".into(),
            description: "Пропал интернет дома".into(),
            channel: Channel::Portal,
            language: "ru".into(),
            customer: CustomerIdentity {
                email: Some("user@example.com".into()),
                username: None,
                external_user_id: Some("42".into()),
            },
            request_type: Some("problem".into()),
            category_code: Some("INTERNET_HOME".into()),
            priority: Priority::P2,
            status,
            department_id: Some(1),
            auto_closed_by_automation: false,
            automation_disabled: false,
            created_at: t0(),
            status_updated_at: t0(),
            closed_at: status.is_terminal().then(t0),
        }
    }

    fn record(kind: CallKind) -> NewModelRecord {
        NewModelRecord {
            model_name: "deepseek-chat".into(),
            kind,
            request_payload: "{\"text\":\"x\"}".into(),
            response_payload: "{}".into(),
            confidence: Some(0.85),
            created_at: t0(),
        }
    }

    #[test]
    fn ticket_roundtrips_through_rows() {
        let store = DuckStore::open().unwrap();
        let inserted = store
            .insert_ticket(
                draft(TicketStatus::New),
                vec![NewMessage::new(AuthorKind::Customer, "Пропал интернет дома", "ru", t0())],
                vec![record(CallKind::Classification)],
            )
            .unwrap();
        let loaded = store.ticket(inserted.id).unwrap().unwrap();
        assert_eq!(loaded, inserted);
        assert_eq!(store.messages(inserted.id).unwrap().len(), 1);
        assert_eq!(store.model_records(inserted.id).unwrap().len(), 1);
    }

    #[test]
    fn department_is_created_once() {
        let store = DuckStore::open().unwrap();
        let a = store.get_or_create_department("tv_support").unwrap();
        let b = store.get_or_create_department("tv_support").unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(store.department(a.id).unwrap().unwrap().name, "tv_support");

        let renamed = store.rename_department("tv_support", "TV desk").unwrap();
        assert_eq!(renamed.name, "TV desk");
        assert!(matches!(
            store.rename_department("missing", "x"),
            Err(StoreError::DepartmentNotFound(_))
        ));
    }

    #[test]
    fn update_commits_ticket_and_rows_together() {
        let store = DuckStore::open().unwrap();
        let ticket = store.insert_ticket(draft(TicketStatus::New), vec![], vec![]).unwrap();

        let later = t0() + Duration::minutes(3);
        let updated = store
            .update_ticket(
                ticket.id,
                Box::new(move |t: &mut Ticket, _: &[Message]| {
                    helpdesk_core::lifecycle::auto_close(t, later);
                    Some(
                        Changes::none()
                            .with_message(NewMessage::new(AuthorKind::Automation, "ответ", "ru", later))
                            .with_record(record(CallKind::Answer)),
                    )
                }),
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, TicketStatus::AutoClosed);

        let loaded = store.ticket(ticket.id).unwrap().unwrap();
        assert_eq!(loaded.closed_at, Some(later));
        assert!(loaded.auto_closed_by_automation);
        assert_eq!(store.messages(ticket.id).unwrap().len(), 1);
    }

    #[test]
    fn rejected_update_rolls_back() {
        let store = DuckStore::open().unwrap();
        let ticket = store.insert_ticket(draft(TicketStatus::New), vec![], vec![]).unwrap();

        let result = store.update_ticket(
            ticket.id,
            Box::new(|t: &mut Ticket, _: &[Message]| {
                t.status = TicketStatus::Closed;
                Some(Changes::none().with_message(NewMessage::new(
                    AuthorKind::Agent,
                    "lost",
                    "ru",
                    t0(),
                )))
            }),
        );
        assert!(matches!(result, Err(StoreError::Inconsistent { .. })));
        assert_eq!(store.ticket(ticket.id).unwrap().unwrap().status, TicketStatus::New);
        assert!(store.messages(ticket.id).unwrap().is_empty());
    }

    #[test]
    fn list_filters_by_status_and_channel() {
        let store = DuckStore::open().unwrap();
        store.insert_ticket(draft(TicketStatus::New), vec![], vec![]).unwrap();
        let mut email = draft(TicketStatus::Closed);
        email.channel = Channel::Email;
        email.created_at = t0() + Duration::minutes(1);
        store.insert_ticket(email, vec![], vec![]).unwrap();

        let all = store.list_tickets(&TicketFilter::default()).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].channel, Channel::Email);

        let open_portal = store
            .list_tickets(&TicketFilter {
                status: Some(TicketStatus::New),
                channel: Some(Channel::Portal),
            })
            .unwrap();
        assert_eq!(open_portal.len(), 1);
    }

    #[test]
    fn author_index_and_corrections() {
        let store = DuckStore::open().unwrap();
        let ticket = store
            .insert_ticket(
                draft(TicketStatus::New),
                vec![NewMessage::new(AuthorKind::Automation, "ответ", "ru", t0())],
                vec![record(CallKind::Classification)],
            )
            .unwrap();
        let with_automation = store.ticket_ids_with_author(AuthorKind::Automation).unwrap();
        assert!(with_automation.contains(&ticket.id));
        assert!(store.ticket_ids_with_author(AuthorKind::Agent).unwrap().is_empty());

        assert!(store.mark_latest_corrected(ticket.id, CallKind::Classification).unwrap());
        let stats = store.classification_stats().unwrap();
        assert_eq!(stats, ClassificationStats { total: 1, corrected: 1 });
    }

    #[test]
    fn faq_crud() {
        let store = DuckStore::open().unwrap();
        let entry = store
            .add_faq(NewFaqEntry {
                question: "Как оплатить?".into(),
                answer: "Через приложение".into(),
                language: "ru".into(),
                category_code: Some("BILLING_TARIFF".into()),
                auto_resolvable: true,
            })
            .unwrap();
        assert_eq!(store.list_faq(Some("ru")).unwrap(), vec![entry.clone()]);
        assert!(store.list_faq(Some("kk")).unwrap().is_empty());
        store.delete_faq(entry.id).unwrap();
        assert!(matches!(store.delete_faq(entry.id), Err(StoreError::FaqNotFound(_))));
    }

    // ── Persistent storage tests ──

    #[test]
    fn persistent_store_survives_reopen() {
        let tmp = tempfile::TempDir::new().unwrap();
        let db_path = tmp.path().join("helpdesk.duckdb");

        let store = DuckStore::open_persistent(&db_path).unwrap();
        let ticket = store.insert_ticket(draft(TicketStatus::New), vec![], vec![]).unwrap();
        drop(store);

        let store = DuckStore::open_persistent(&db_path).unwrap();
        assert_eq!(store.ticket_count().unwrap(), 1);
        assert_eq!(store.ticket(ticket.id).unwrap().unwrap().subject, "Нет интернета");
    }
}
