//! Subcommand handlers.

use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use helpdesk_channels::sessions::{menu_label, ui_language};
use helpdesk_channels::handle_inbound_mail;
use helpdesk_core::{CustomerIdentity, NewFaqEntry, StatusOverride};
use helpdesk_router::{ExternalTicket, Inbound, Placeholder, RoutingEngine};
use helpdesk_store::TicketFilter;

use crate::display;
use crate::{Commands, DepartmentCommands, FaqCommands};

pub(crate) async fn run(engine: &RoutingEngine, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Create {
            subject,
            body,
            channel,
            language,
            email,
            username,
            user_id,
            request_type,
        } => {
            let outcome = engine
                .create_from_inbound(Inbound {
                    subject,
                    description: body,
                    channel,
                    language,
                    customer: CustomerIdentity {
                        email,
                        username,
                        external_user_id: user_id,
                    },
                    request_type,
                })
                .await
                .context("creating ticket")?;
            display::print_outcome(&outcome.ticket, outcome.reply.as_deref());
        }

        Commands::Continue { id, text, language } => {
            let outcome = engine
                .continue_conversation(id, &text, language.as_deref())
                .await
                .with_context(|| format!("continuing ticket {id}"))?;
            display::print_outcome(&outcome.ticket, outcome.reply.as_deref());
        }

        Commands::External {
            subject,
            body,
            category,
            department,
            priority,
            status,
            channel,
            language,
            email,
            request_type,
        } => {
            let ticket = engine
                .create_from_external(ExternalTicket {
                    subject,
                    description: body,
                    channel,
                    language,
                    customer: CustomerIdentity {
                        email,
                        ..CustomerIdentity::default()
                    },
                    request_type,
                    category_code: category,
                    priority,
                    status,
                    department_code: department,
                })
                .context("storing external ticket")?;
            display::print_outcome(&ticket, None);
        }

        Commands::Placeholder {
            chat_id,
            request_type,
            username,
            language,
        } => {
            let ticket = engine.create_placeholder(Placeholder {
                subject: menu_label(&request_type).to_string(),
                chat_user_id: chat_id,
                username,
                language: ui_language(language.as_deref()),
                request_type: Some(request_type),
            })?;
            display::print_outcome(&ticket, None);
        }

        Commands::Status {
            id,
            status,
            priority,
            request_type,
            automation_disabled,
        } => {
            let change = StatusOverride::parse(
                &status,
                priority.as_deref(),
                request_type,
                automation_disabled,
            )?;
            let ticket = engine.override_status(id, &change)?;
            display::print_outcome(&ticket, None);
        }

        Commands::Confirm { id } => {
            let ticket = engine.confirm_resolved(id)?;
            display::print_outcome(&ticket, None);
        }

        Commands::Show { id } => {
            let view = engine.view(id, Utc::now())?;
            display::print_ticket_card(&view);
        }

        Commands::List { status, channel } => {
            let listed = engine.list(&TicketFilter { status, channel }, Utc::now())?;
            display::print_ticket_table(&listed);
        }

        Commands::Reply { id, body, language } => {
            let reply = engine.post_agent_reply(id, &body, language.as_deref())?;
            if let Some(delivery) = reply.delivery {
                delivery.await.context("waiting for chat delivery")?;
            }
            display::print_outcome(&reply.ticket, None);
        }

        Commands::Summary { id } => {
            let summary = engine.summarize(id).await?;
            println!("{summary}");
        }

        Commands::Suggest { id } => {
            let suggestions = engine.suggest_replies(id).await?;
            if suggestions.is_empty() {
                eprintln!("No suggestions available.");
            }
            for (i, text) in suggestions.iter().enumerate() {
                println!("{}. {text}", i + 1);
            }
        }

        Commands::Misclassified { id } => {
            if engine.flag_misclassified(id)? {
                println!("Ticket {id}: latest classification marked as corrected.");
            } else {
                println!("Ticket {id} has no classification record.");
            }
        }

        Commands::Analytics { json } => {
            let overview = engine.overview(Utc::now())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&overview)?);
            } else {
                display::print_overview(&overview);
            }
        }

        Commands::Faq { action } => match action {
            FaqCommands::Add {
                question,
                answer,
                language,
                category,
                manual,
            } => {
                let entry = engine.store().add_faq(NewFaqEntry {
                    question,
                    answer,
                    language,
                    category_code: category,
                    auto_resolvable: !manual,
                })?;
                println!("Added FAQ entry {}.", entry.id);
            }
            FaqCommands::List { language } => {
                let entries = engine.store().list_faq(language.as_deref())?;
                display::print_faq(&entries);
            }
            FaqCommands::Remove { id } => {
                engine.store().delete_faq(id)?;
                println!("Removed FAQ entry {id}.");
            }
        },

        Commands::Department { action } => match action {
            DepartmentCommands::Rename { code, name } => {
                let department = engine.store().rename_department(&code, &name)?;
                println!("{} -> {}", department.code, department.name);
            }
        },

        Commands::Mail {
            from,
            subject,
            body,
            own_address,
        } => {
            let reply = handle_inbound_mail(engine, &own_address, &from, &subject, &body)
                .await
                .context("routing inbound mail")?;
            match reply {
                Some(mail) => {
                    println!("To:      {}", mail.to);
                    println!("Subject: {}", mail.subject);
                    println!();
                    println!("{}", mail.body);
                }
                None => eprintln!("No automated reply."),
            }
        }

        Commands::Sweep {
            channel,
            idle_minutes,
        } => {
            let idle = idle_minutes
                .map(|m| Duration::from_secs(m * 60))
                .unwrap_or(engine.config().idle_after);
            let closed = engine.close_idle_tickets(channel, idle, Utc::now())?;
            println!("Auto-closed {} idle ticket(s).", closed.len());
            for id in closed {
                println!("  #{id}");
            }
        }
    }
    Ok(())
}
