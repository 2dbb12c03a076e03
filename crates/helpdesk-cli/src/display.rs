//! Terminal rendering for tickets, listings, FAQ entries and the overview.
//!
//! Tickets print as a vertical card grouped into sections; empty fields and
//! empty sections are skipped.

use chrono::{DateTime, Utc};
use helpdesk_core::{FaqEntry, Ticket};
use helpdesk_router::{ListedTicket, Overview, TicketView};

const MAX_BODY_CHARS: usize = 400;
const LIST_SUBJECT_CHARS: usize = 40;

type Row = (&'static str, Option<String>);

// ── Public API ──

/// One-line result of a mutating command, followed by the automated reply.
pub fn print_outcome(ticket: &Ticket, reply: Option<&str>) {
    println!(
        "Ticket #{} [{}] {} {}",
        ticket.id,
        ticket.status,
        ticket.priority,
        ticket.category_code.as_deref().unwrap_or("-")
    );
    if let Some(reply) = reply {
        println!();
        println!("{reply}");
    }
}

pub fn print_ticket_card(view: &TicketView) {
    let ticket = &view.ticket;
    println!("=== #{} ===", ticket.id);
    println!("{}", ticket.subject);
    println!();

    print_section(
        "Routing",
        &[
            ("channel", Some(ticket.channel.to_string())),
            ("language", Some(ticket.language.clone())),
            ("request_type", ticket.request_type.clone()),
            ("category", ticket.category_code.clone()),
            ("priority", Some(ticket.priority.to_string())),
            (
                "department",
                view.department
                    .as_ref()
                    .map(|d| format!("{} ({})", d.name, d.code)),
            ),
        ],
    );
    print_section(
        "Customer",
        &[
            ("email", ticket.customer.email.clone()),
            ("username", ticket.customer.username.clone()),
            ("external_user_id", ticket.customer.external_user_id.clone()),
        ],
    );
    print_section(
        "Status",
        &[
            ("status", Some(ticket.status.to_string())),
            ("auto_closed_by_automation", Some(yes_no(ticket.auto_closed_by_automation))),
            ("automation_disabled", Some(yes_no(ticket.automation_disabled))),
        ],
    );
    let timing = &view.timing;
    print_section(
        "Timing",
        &[
            ("sla_target_minutes", Some(timing.sla_target_minutes.to_string())),
            ("elapsed_minutes", Some(format!("{:.1}", timing.elapsed_minutes))),
            ("sla_breached", Some(yes_no(timing.sla_breached))),
            ("status_elapsed_minutes", Some(format!("{:.1}", timing.status_elapsed_minutes))),
        ],
    );
    print_section(
        "Timestamps",
        &[
            ("created_at", Some(stamp(ticket.created_at))),
            ("updated_at", Some(stamp(ticket.updated_at))),
            ("status_updated_at", Some(stamp(ticket.status_updated_at))),
            ("closed_at", ticket.closed_at.map(stamp)),
        ],
    );

    println!("Transcript ({})", view.messages.len());
    if view.messages.is_empty() {
        println!("  {}", clip(&ticket.description, MAX_BODY_CHARS));
    }
    for message in &view.messages {
        println!(
            "  [{}] {} ({})",
            stamp(message.created_at),
            message.author,
            message.language
        );
        for line in clip(&message.body, MAX_BODY_CHARS).lines() {
            println!("    {line}");
        }
    }
}

pub fn print_ticket_table(listed: &[ListedTicket]) {
    if listed.is_empty() {
        eprintln!("No tickets.");
        return;
    }
    println!(
        "{:>6}  {:<12} {:<9} {:<3} {:<18} {:<4} {}",
        "id", "status", "channel", "pri", "category", "sla", "subject"
    );
    for item in listed {
        let t = &item.ticket;
        println!(
            "{:>6}  {:<12} {:<9} {:<3} {:<18} {:<4} {}",
            t.id,
            t.status.as_str(),
            t.channel.as_str(),
            t.priority.as_str(),
            t.category_code.as_deref().unwrap_or("-"),
            if item.timing.sla_breached { "!" } else { "ok" },
            clip(&t.subject, LIST_SUBJECT_CHARS)
        );
    }
}

pub fn print_faq(entries: &[FaqEntry]) {
    if entries.is_empty() {
        eprintln!("No FAQ entries.");
        return;
    }
    for entry in entries {
        println!(
            "#{} [{}] {}{}",
            entry.id,
            entry.language,
            entry.category_code.as_deref().unwrap_or("any"),
            if entry.auto_resolvable { "" } else { " (manual)" }
        );
        println!("  Q: {}", entry.question);
        println!("  A: {}", clip(&entry.answer, MAX_BODY_CHARS));
    }
}

pub fn print_overview(overview: &Overview) {
    println!("=== Help desk overview ===");
    println!("{}", stamp(overview.generated_at));
    println!();

    print_section(
        "Volume",
        &[
            ("total_tickets", Some(overview.total_tickets.to_string())),
            ("created_today", Some(overview.created_today.to_string())),
            ("open_within_sla", Some(overview.open_within_sla.to_string())),
            ("open_breaching_sla", Some(overview.open_breaching_sla.to_string())),
        ],
    );
    print_section(
        "Automation",
        &[
            ("auto_closed_percent", Some(format!("{:.1}", overview.auto_closed_percent))),
            (
                "avg_auto_resolution_s",
                overview.avg_auto_resolution_seconds.map(|s| format!("{s:.1}")),
            ),
            (
                "classification_accuracy",
                overview
                    .classification_accuracy
                    .map(|a| format!("{:.1}%", a * 100.0)),
            ),
            ("confirmed_without_agent", Some(overview.confirmed_without_agent.to_string())),
        ],
    );
    print_counts("By status", &overview.by_status);
    print_counts("By request type", &overview.by_request_type);
    print_counts("By priority", &overview.by_priority);
}

// ── Section rendering ──

fn print_section(header: &str, rows: &[Row]) {
    if rows.iter().all(|(_, value)| value.is_none()) {
        return;
    }
    println!("{header}");
    for (label, value) in rows {
        if let Some(value) = value {
            println!("  {:<26} {}", label, value);
        }
    }
    println!();
}

fn print_counts(header: &str, counts: &std::collections::BTreeMap<String, u64>) {
    println!("{header}");
    for (key, count) in counts {
        println!("  {:<26} {}", key, count);
    }
    println!();
}

fn yes_no(flag: bool) -> String {
    if flag { "yes" } else { "no" }.to_string()
}

fn stamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Truncate on a char boundary, marking the cut with `…`.
fn clip(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}
