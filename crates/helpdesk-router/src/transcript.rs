use helpdesk_core::{Message, Ticket};

/// Conversation as plain text for summaries and suggestions.
///
/// One line per message, `author (YYYY-MM-DD HH:MM): body`. A ticket without
/// messages falls back to its description.
pub fn render(ticket: &Ticket, messages: &[Message]) -> String {
    if messages.is_empty() {
        return ticket.description.clone();
    }
    messages
        .iter()
        .map(|m| {
            format!(
                "{} ({}): {}",
                m.author,
                m.created_at.format("%Y-%m-%d %H:%M"),
                m.body
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
