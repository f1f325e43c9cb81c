use super::formatter::CliFormatter;
use super::{Cli, ClientAction, Commands, ConfigAction, EntryAction, InvoiceAction};
use crate::db::resolve_database_path;
use crate::models::{ClientUpdate, Config, InvoiceStatus};
use crate::services::{ClientService, InvoiceService, TimesheetService};
use crate::utils::config::{load_config, save_config};
use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, Utc};
use std::path::PathBuf;

pub async fn handle_command(cli: Cli) -> Result<()> {
    let config = load_config()?;
    let db_path = resolve_database_path(&config)?;

    match cli.command {
        Commands::Client { action } => handle_client_action(action, db_path, cli.json).await,

        Commands::Grid { week } => {
            let date = match week {
                Some(s) => parse_date(&s)?,
                None => Utc::now().date_naive(),
            };
            let grid = TimesheetService::new(db_path).get_weekly_grid(date).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&grid)?);
            } else {
                CliFormatter::print_grid(&grid);
            }
            Ok(())
        }

        Commands::Entry { action } => handle_entry_action(action, db_path, cli.json).await,

        Commands::Invoice { action } => {
            handle_invoice_action(action, db_path, &config, cli.json).await
        }

        Commands::Config { action } => handle_config_action(action, config),
    }
}

async fn handle_client_action(action: ClientAction, db_path: PathBuf, json: bool) -> Result<()> {
    let service = ClientService::new(db_path);

    match action {
        ClientAction::Create {
            name,
            rate,
            terms,
            contact,
            email,
            phone,
            address,
        } => {
            let client = service
                .create_client(name, rate, terms, contact, email, phone, address)
                .await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&client)?);
            } else {
                CliFormatter::print_success(&format!(
                    "Created client '{}' (id {})",
                    client.name,
                    client.id.unwrap_or_default()
                ));
            }
            Ok(())
        }

        ClientAction::List { all } => {
            let clients = service.list_clients(all).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&clients)?);
            } else if clients.is_empty() {
                CliFormatter::print_empty_state("No clients yet");
            } else {
                CliFormatter::print_section_header("Clients");
                for client in &clients {
                    CliFormatter::print_client_row(client);
                }
            }
            Ok(())
        }

        ClientAction::Show { id } => {
            let client = service.get_client(id).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&client)?);
            } else {
                CliFormatter::print_section_header(&client.name);
                CliFormatter::print_field(
                    "Rate",
                    &format!("${:.2}/hr", client.default_rate),
                    Some("green"),
                );
                CliFormatter::print_field("Terms", &format!("net {}", client.payment_terms), None);
                if let Some(contact) = &client.contact_name {
                    CliFormatter::print_field("Contact", contact, None);
                }
                if let Some(email) = &client.contact_email {
                    CliFormatter::print_field("Email", email, None);
                }
            }
            Ok(())
        }

        ClientAction::Update {
            id,
            name,
            rate,
            terms,
        } => {
            let update = ClientUpdate {
                name,
                default_rate: rate,
                payment_terms: terms,
                ..ClientUpdate::default()
            };
            if service.update_client(id, update).await? {
                CliFormatter::print_success(&format!("Updated client {}", id));
            } else {
                CliFormatter::print_empty_state("Nothing to update");
            }
            Ok(())
        }

        ClientAction::Deactivate { id } => {
            service.deactivate_client(id).await?;
            CliFormatter::print_success(&format!("Deactivated client {}", id));
            Ok(())
        }

        ClientAction::AddDept {
            client_id,
            name,
            rate,
        } => {
            let dept = service.create_department(client_id, name, rate).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&dept)?);
            } else {
                CliFormatter::print_success(&format!(
                    "Created department '{}' (id {})",
                    dept.name,
                    dept.id.unwrap_or_default()
                ));
            }
            Ok(())
        }

        ClientAction::Depts { client_id, all } => {
            let client = service.get_client(client_id).await?;
            let departments = service.list_departments(client_id, all).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&departments)?);
            } else if departments.is_empty() {
                CliFormatter::print_empty_state("No departments");
            } else {
                CliFormatter::print_section_header(&format!("{} departments", client.name));
                for dept in &departments {
                    CliFormatter::print_department_row(dept, client.default_rate);
                }
            }
            Ok(())
        }

        ClientAction::DeactivateDept { id } => {
            service.deactivate_department(id).await?;
            CliFormatter::print_success(&format!("Deactivated department {}", id));
            Ok(())
        }
    }
}

async fn handle_entry_action(action: EntryAction, db_path: PathBuf, json: bool) -> Result<()> {
    let service = TimesheetService::new(db_path);

    match action {
        EntryAction::Save {
            client_id,
            date,
            hours,
            dept,
            rate,
            notes,
        } => {
            let date = parse_date(&date)?;
            let day_of_week = date.weekday().number_from_monday() as u8;

            let entry_id = service
                .save_entry(
                    client_id,
                    dept,
                    date,
                    day_of_week,
                    hours,
                    rate.unwrap_or(0.0),
                    notes,
                )
                .await?;

            match entry_id {
                Some(id) => {
                    CliFormatter::print_success(&format!("Saved {:.1}h (entry {})", hours, id))
                }
                None => CliFormatter::print_success("Cleared entry"),
            }
            Ok(())
        }

        EntryAction::Delete { id } => {
            service.delete_entry(id).await?;
            CliFormatter::print_success(&format!("Deleted entry {}", id));
            Ok(())
        }

        EntryAction::Day { client_id, date } => {
            let date = parse_date(&date)?;
            let day_of_week = date.weekday().number_from_monday() as u8;
            let entries = service.get_day_entries(client_id, date, day_of_week).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                CliFormatter::print_section_header(&format!("Entries for {}", date));
                CliFormatter::print_day_entries(&entries);
            }
            Ok(())
        }
    }
}

async fn handle_invoice_action(
    action: InvoiceAction,
    db_path: PathBuf,
    config: &Config,
    json: bool,
) -> Result<()> {
    let service =
        InvoiceService::new(db_path).with_number_prefix(config.invoice_prefix.clone());
    let currency = &config.currency_symbol;

    match action {
        InvoiceAction::Unbilled {
            client_id,
            from,
            to,
        } => {
            let summary = service
                .get_unbilled_grouped(client_id, parse_date(&from)?, parse_date(&to)?)
                .await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                CliFormatter::print_section_header(&format!("Unbilled {} to {}", from, to));
                CliFormatter::print_unbilled(&summary, currency);
            }
            Ok(())
        }

        InvoiceAction::Create {
            client_id,
            from,
            to,
            date,
            notes,
        } => {
            let invoice_date = match date {
                Some(s) => parse_date(&s)?,
                None => Utc::now().date_naive(),
            };
            let invoice = service
                .create_invoice_from_unbilled(
                    client_id,
                    invoice_date,
                    parse_date(&from)?,
                    parse_date(&to)?,
                    notes,
                )
                .await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&invoice)?);
            } else {
                CliFormatter::print_invoice(&invoice, currency);
            }
            Ok(())
        }

        InvoiceAction::Show { id } => {
            let invoice = service.get_invoice(id).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&invoice)?);
            } else {
                CliFormatter::print_invoice(&invoice, currency);
            }
            Ok(())
        }

        InvoiceAction::List { client } => {
            let invoices = service.list_invoices(client).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&invoices)?);
            } else if invoices.is_empty() {
                CliFormatter::print_empty_state("No invoices");
            } else {
                CliFormatter::print_section_header("Invoices");
                for invoice in &invoices {
                    CliFormatter::print_invoice_row(invoice, currency);
                }
            }
            Ok(())
        }

        InvoiceAction::Status { id, status } => {
            let status: InvoiceStatus = status.parse()?;
            service.update_status(id, status).await?;
            CliFormatter::print_success(&format!("Invoice {} is now {}", id, status));
            Ok(())
        }

        InvoiceAction::SetPdf { id, path } => {
            service.update_pdf_path(id, path).await?;
            CliFormatter::print_success(&format!("Recorded PDF path for invoice {}", id));
            Ok(())
        }

        InvoiceAction::Notes { id, notes } => {
            service.update_notes(id, notes).await?;
            CliFormatter::print_success(&format!("Updated notes on invoice {}", id));
            Ok(())
        }

        InvoiceAction::Delete { id } => {
            service.delete_invoice(id).await?;
            CliFormatter::print_success(&format!(
                "Deleted invoice {}, entries released for billing",
                id
            ));
            Ok(())
        }
    }
}

fn handle_config_action(action: ConfigAction, mut config: Config) -> Result<()> {
    match action {
        ConfigAction::Show => {
            CliFormatter::print_section_header("Configuration");
            CliFormatter::print_field(
                "data_dir",
                &config
                    .data_dir
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(default)".to_string()),
                None,
            );
            CliFormatter::print_field(
                "payment_terms",
                &config.default_payment_terms.to_string(),
                None,
            );
            CliFormatter::print_field("currency", &config.currency_symbol, None);
            CliFormatter::print_field("prefix", &config.invoice_prefix, None);
            CliFormatter::print_field("log_level", &config.log_level, None);
            Ok(())
        }

        ConfigAction::Set { key, value } => {
            match key.as_str() {
                "data_dir" => config.data_dir = Some(PathBuf::from(&value)),
                "default_payment_terms" => {
                    config.default_payment_terms =
                        value.parse().context("Payment terms must be a number")?
                }
                "currency_symbol" => config.currency_symbol = value.clone(),
                "invoice_prefix" => config.invoice_prefix = value.clone(),
                "log_level" => config.log_level = value.clone(),
                _ => return Err(anyhow::anyhow!("Unknown configuration key '{}'", key)),
            }
            save_config(&config)?;
            CliFormatter::print_success(&format!("Set {} = {}", key, value));
            Ok(())
        }

        ConfigAction::Get { key } => {
            let value = match key.as_str() {
                "data_dir" => config
                    .data_dir
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
                "default_payment_terms" => config.default_payment_terms.to_string(),
                "currency_symbol" => config.currency_symbol,
                "invoice_prefix" => config.invoice_prefix,
                "log_level" => config.log_level,
                _ => return Err(anyhow::anyhow!("Unknown configuration key '{}'", key)),
            };
            println!("{}", value);
            Ok(())
        }
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}
