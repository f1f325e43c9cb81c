pub mod client_service;
pub mod invoice_service;
pub mod timesheet_service;

pub use client_service::ClientService;
pub use invoice_service::InvoiceService;
pub use timesheet_service::TimesheetService;
