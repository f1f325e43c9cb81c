pub mod client;
pub mod config;
pub mod department;
pub mod invoice;
pub mod rates;
pub mod time_entry;
pub mod timesheet;

pub use client::{Client, ClientUpdate};
pub use config::Config;
pub use department::{Department, DepartmentUpdate};
pub use invoice::{
    Invoice, InvoiceLineItem, InvoiceStatus, LineItemSpec, UnbilledGroup, UnbilledSummary,
};
pub use rates::resolve_rate;
pub use time_entry::{DayEntry, TimeEntry};
pub use timesheet::{ClientWeek, DayCell, DeptWeek, WeeklyGrid};
