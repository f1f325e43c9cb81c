use crate::models::{
    Client, DayEntry, Department, Invoice, InvoiceStatus, UnbilledSummary, WeeklyGrid,
};
use crate::utils::dates::week_dates;

pub struct CliFormatter;

const DAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

impl CliFormatter {
    pub fn print_section_header(title: &str) {
        println!("\n{}", ansi_color("cyan", title, true));
        println!("{}", "─".repeat(title.len()).dimmed());
    }

    pub fn print_field(label: &str, value: &str, color: Option<&str>) {
        let colored_value = match color {
            Some(c) => ansi_color(c, value, false),
            None => value.to_string(),
        };
        println!("  {:<14} {}", format!("{}:", label).dimmed(), colored_value);
    }

    pub fn print_empty_state(message: &str) {
        println!("\n  {}", message.dimmed());
    }

    pub fn print_error(message: &str) {
        println!(
            "  {} {}",
            ansi_color("red", "✗", true),
            ansi_color("red", message, false)
        );
    }

    pub fn print_success(message: &str) {
        println!(
            "  {} {}",
            ansi_color("green", "✓", true),
            ansi_color("green", message, false)
        );
    }

    pub fn print_client_row(client: &Client) {
        let (symbol, color) = if client.active {
            ("●", "green")
        } else {
            ("○", "gray")
        };
        println!(
            "  {} {:>4}  {:<30} {:>10}/hr  net {}",
            ansi_color(color, symbol, false),
            client.id.unwrap_or_default(),
            ansi_color("yellow", &truncate_string(&client.name, 30), false),
            format!("${:.2}", client.default_rate),
            client.payment_terms
        );
    }

    pub fn print_department_row(dept: &Department, client_rate: f64) {
        let (symbol, color) = if dept.is_active {
            ("●", "green")
        } else {
            ("○", "gray")
        };
        let rate = dept.billing_rate.unwrap_or(client_rate);
        println!(
            "  {} {:>4}  {:<30} {:>10}/hr",
            ansi_color(color, symbol, false),
            dept.id.unwrap_or_default(),
            ansi_color("yellow", &truncate_string(&dept.name, 30), false),
            format!("${:.2}", rate)
        );
    }

    /// The weekly grid as one table per client, one row per department.
    pub fn print_grid(grid: &WeeklyGrid) {
        let dates = week_dates(grid.week_start);
        Self::print_section_header(&format!(
            "Week of {} to {}",
            dates[0],
            dates[6]
        ));

        if grid.clients.is_empty() {
            Self::print_empty_state("No active clients");
            return;
        }

        for client in &grid.clients {
            println!(
                "\n  {} ({:.1}h)",
                ansi_color("yellow", &client.client_name, true),
                client.total_hours()
            );
            print!("    {:<22}", "");
            for label in DAY_LABELS {
                print!("{:>7}", label);
            }
            println!("{:>9}{:>12}", "Total", "Amount");

            for dept in &client.departments {
                print!(
                    "    {:<22}",
                    truncate_string(&dept.department_name, 22)
                );
                for day in 1..=7u8 {
                    let cell = &dept.days[&day];
                    if cell.hours > 0.0 {
                        print!("{:>7}", format!("{:.1}", cell.hours));
                    } else {
                        print!("{:>7}", "·".dimmed());
                    }
                }
                println!(
                    "{:>9}{:>12}",
                    ansi_color("green", &format!("{:.1}", dept.total_hours()), false),
                    ansi_color("green", &format!("${:.2}", dept.total_amount()), false)
                );
            }
        }
    }

    pub fn print_day_entries(entries: &[DayEntry]) {
        if entries.is_empty() {
            Self::print_empty_state("No entries for this day");
            return;
        }
        for entry in entries {
            println!(
                "  {:>4}  {:<25} {:>6}h @ {:>8}  {}",
                entry.entry_id,
                ansi_color("yellow", &truncate_string(&entry.department_name, 25), false),
                format!("{:.1}", entry.hours_worked),
                format!("${:.2}", entry.resolved_rate),
                entry.notes.dimmed()
            );
        }
    }

    pub fn print_unbilled(summary: &UnbilledSummary, currency: &str) {
        if summary.groups.is_empty() {
            Self::print_empty_state("No unbilled time in this range");
            return;
        }

        for group in &summary.groups {
            println!(
                "  {:<25} {:>7}h  {}",
                ansi_color("yellow", &truncate_string(&group.department_name, 25), false),
                format!("{:.1}", group.total_hours),
                ansi_color(
                    "green",
                    &format!("{}{:.2}", currency, group.total_amount),
                    false
                )
            );
        }
        println!(
            "\n  {:<25} {:>7}h  {}",
            "Total".to_string(),
            format!("{:.1}", summary.total_hours),
            ansi_color(
                "green",
                &format!("{}{:.2}", currency, summary.total_amount),
                true
            )
        );
    }

    pub fn print_invoice(invoice: &Invoice, currency: &str) {
        Self::print_section_header(&invoice.invoice_number);
        Self::print_field("Client", &invoice.client_name, Some("yellow"));
        Self::print_field("Date", &invoice.invoice_date.to_string(), None);
        Self::print_field("Due", &invoice.due_date.to_string(), None);
        Self::print_field(
            "Status",
            &invoice.status.to_string(),
            Some(status_color(invoice.status)),
        );
        if let Some(notes) = &invoice.notes {
            Self::print_field("Notes", notes, None);
        }
        if let Some(pdf) = &invoice.pdf_path {
            Self::print_field("PDF", pdf, None);
        }

        if !invoice.line_items.is_empty() {
            println!();
            for item in &invoice.line_items {
                println!(
                    "  {:<35} {:>6}h @ {:>8}  {}",
                    truncate_string(&item.line_description, 35),
                    format!("{:.1}", item.total_hours),
                    format!("{}{:.2}", currency, item.hourly_rate),
                    ansi_color("green", &format!("{}{:.2}", currency, item.amount), false)
                );
            }
        }

        println!(
            "\n  {:<35} {:>6}h           {}",
            "Total".to_string(),
            format!("{:.1}", invoice.total_hours),
            ansi_color(
                "green",
                &format!("{}{:.2}", currency, invoice.total_amount),
                true
            )
        );
    }

    pub fn print_invoice_row(invoice: &Invoice, currency: &str) {
        println!(
            "  {:>4}  {:<15} {:<25} {:<12} {:>10}  {}",
            invoice.id.unwrap_or_default(),
            ansi_color("yellow", &invoice.invoice_number, false),
            truncate_string(&invoice.client_name, 25),
            invoice.invoice_date.to_string(),
            format!("{}{:.2}", currency, invoice.total_amount),
            ansi_color(
                status_color(invoice.status),
                &invoice.status.to_string(),
                false
            )
        );
    }
}

fn status_color(status: InvoiceStatus) -> &'static str {
    match status {
        InvoiceStatus::Draft => "white",
        InvoiceStatus::Sent => "cyan",
        InvoiceStatus::Paid => "green",
        InvoiceStatus::Overdue => "red",
        InvoiceStatus::Cancelled => "gray",
    }
}

// Helper functions
pub fn ansi_color(color: &str, text: &str, bold: bool) -> String {
    let color_code = match color {
        "red" => "31",
        "green" => "32",
        "yellow" => "33",
        "blue" => "34",
        "magenta" => "35",
        "cyan" => "36",
        "white" => "37",
        "gray" => "90",
        _ => "37", // default to white
    };

    if bold {
        format!("\x1b[1;{}m{}\x1b[0m", color_code, text)
    } else {
        format!("\x1b[{}m{}\x1b[0m", color_code, text)
    }
}

pub trait StringFormat {
    fn dimmed(&self) -> String;
}

impl StringFormat for str {
    fn dimmed(&self) -> String {
        format!("\x1b[2m{}\x1b[0m", self)
    }
}

pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}
