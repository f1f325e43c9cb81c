use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "timebill")]
#[command(about = "Weekly timesheet and invoicing CLI")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, help = "Emit machine-readable JSON instead of tables", global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Client and department management")]
    Client {
        #[command(subcommand)]
        action: ClientAction,
    },

    #[command(about = "Show the weekly timesheet grid")]
    Grid {
        #[arg(long, help = "Any date inside the week (YYYY-MM-DD), defaults to today")]
        week: Option<String>,
    },

    #[command(about = "Time entry management")]
    Entry {
        #[command(subcommand)]
        action: EntryAction,
    },

    #[command(about = "Invoice management")]
    Invoice {
        #[command(subcommand)]
        action: InvoiceAction,
    },

    #[command(about = "Configuration management")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ClientAction {
    #[command(about = "Create a new client")]
    Create {
        #[arg(help = "Client name")]
        name: String,

        #[arg(long, help = "Default hourly rate")]
        rate: f64,

        #[arg(long, help = "Payment terms in days")]
        terms: Option<i64>,

        #[arg(long, help = "Contact name")]
        contact: Option<String>,

        #[arg(long, help = "Contact email")]
        email: Option<String>,

        #[arg(long, help = "Contact phone")]
        phone: Option<String>,

        #[arg(long, help = "Billing address")]
        address: Option<String>,
    },

    #[command(about = "List clients")]
    List {
        #[arg(long, help = "Include deactivated clients")]
        all: bool,
    },

    #[command(about = "Show one client")]
    Show {
        #[arg(help = "Client ID")]
        id: i64,
    },

    #[command(about = "Update client fields")]
    Update {
        #[arg(help = "Client ID")]
        id: i64,

        #[arg(long, help = "New name")]
        name: Option<String>,

        #[arg(long, help = "New default hourly rate")]
        rate: Option<f64>,

        #[arg(long, help = "New payment terms in days")]
        terms: Option<i64>,
    },

    #[command(about = "Deactivate a client (history stays addressable)")]
    Deactivate {
        #[arg(help = "Client ID")]
        id: i64,
    },

    #[command(about = "Add a department to a client")]
    AddDept {
        #[arg(help = "Client ID")]
        client_id: i64,

        #[arg(help = "Department name")]
        name: String,

        #[arg(long, help = "Department billing rate (defaults to client rate)")]
        rate: Option<f64>,
    },

    #[command(about = "List a client's departments")]
    Depts {
        #[arg(help = "Client ID")]
        client_id: i64,

        #[arg(long, help = "Include deactivated departments")]
        all: bool,
    },

    #[command(about = "Deactivate a department")]
    DeactivateDept {
        #[arg(help = "Department ID")]
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum EntryAction {
    #[command(about = "Save hours for one client/department/day cell")]
    Save {
        #[arg(help = "Client ID")]
        client_id: i64,

        #[arg(help = "Date the work happened (YYYY-MM-DD)")]
        date: String,

        #[arg(help = "Hours worked (0 clears the cell)")]
        hours: f64,

        #[arg(long, help = "Department ID (omit for General)")]
        dept: Option<i64>,

        #[arg(long, help = "Entry-level rate override")]
        rate: Option<f64>,

        #[arg(long, help = "Notes")]
        notes: Option<String>,
    },

    #[command(about = "Delete a time entry")]
    Delete {
        #[arg(help = "Entry ID")]
        id: i64,
    },

    #[command(about = "Department breakdown for one client/day")]
    Day {
        #[arg(help = "Client ID")]
        client_id: i64,

        #[arg(help = "Date (YYYY-MM-DD)")]
        date: String,
    },
}

#[derive(Subcommand)]
pub enum InvoiceAction {
    #[command(about = "Show unbilled hours for a client, grouped by department")]
    Unbilled {
        #[arg(help = "Client ID")]
        client_id: i64,

        #[arg(long, help = "Start date (YYYY-MM-DD)")]
        from: String,

        #[arg(long, help = "End date (YYYY-MM-DD)")]
        to: String,
    },

    #[command(about = "Invoice all unbilled time in a date range")]
    Create {
        #[arg(help = "Client ID")]
        client_id: i64,

        #[arg(long, help = "Start date (YYYY-MM-DD)")]
        from: String,

        #[arg(long, help = "End date (YYYY-MM-DD)")]
        to: String,

        #[arg(long, help = "Invoice date (YYYY-MM-DD), defaults to today")]
        date: Option<String>,

        #[arg(long, help = "Invoice notes")]
        notes: Option<String>,
    },

    #[command(about = "Show one invoice with its line items")]
    Show {
        #[arg(help = "Invoice ID")]
        id: i64,
    },

    #[command(about = "List invoices, newest first")]
    List {
        #[arg(long, help = "Filter by client ID")]
        client: Option<i64>,
    },

    #[command(about = "Set invoice status")]
    Status {
        #[arg(help = "Invoice ID")]
        id: i64,

        #[arg(help = "New status (Draft, Sent, Paid, Overdue, Cancelled)")]
        status: String,
    },

    #[command(about = "Record where the rendered PDF lives")]
    SetPdf {
        #[arg(help = "Invoice ID")]
        id: i64,

        #[arg(help = "PDF path")]
        path: String,
    },

    #[command(about = "Update invoice notes")]
    Notes {
        #[arg(help = "Invoice ID")]
        id: i64,

        #[arg(help = "New notes (omit to clear)")]
        notes: Option<String>,
    },

    #[command(about = "Delete an invoice and release its time entries")]
    Delete {
        #[arg(help = "Invoice ID")]
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    #[command(about = "Show current configuration")]
    Show,

    #[command(about = "Set configuration value")]
    Set {
        #[arg(help = "Configuration key")]
        key: String,

        #[arg(help = "Configuration value")]
        value: String,
    },

    #[command(about = "Get configuration value")]
    Get {
        #[arg(help = "Configuration key")]
        key: String,
    },
}
