use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Overdue,
    Cancelled,
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvoiceStatus::Draft => write!(f, "Draft"),
            InvoiceStatus::Sent => write!(f, "Sent"),
            InvoiceStatus::Paid => write!(f, "Paid"),
            InvoiceStatus::Overdue => write!(f, "Overdue"),
            InvoiceStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(InvoiceStatus::Draft),
            "sent" => Ok(InvoiceStatus::Sent),
            "paid" => Ok(InvoiceStatus::Paid),
            "overdue" => Ok(InvoiceStatus::Overdue),
            "cancelled" => Ok(InvoiceStatus::Cancelled),
            _ => Err(anyhow::anyhow!(
                "Invalid invoice status '{}'. Must be one of: Draft, Sent, Paid, Overdue, Cancelled",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Option<i64>,
    pub client_id: i64,
    pub client_name: String,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub total_hours: f64,
    pub total_amount: f64,
    pub status: InvoiceStatus,
    pub notes: Option<String>,
    pub pdf_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub line_items: Vec<InvoiceLineItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLineItem {
    pub id: Option<i64>,
    pub invoice_id: i64,
    pub department_id: Option<i64>,
    pub line_description: String,
    pub billing_category: String,
    pub total_hours: f64,
    pub hourly_rate: f64,
    pub amount: f64,
}

/// Caller-supplied description of one line item for invoice creation. The
/// listed entry ids are claimed by the created line item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemSpec {
    pub department_id: Option<i64>,
    pub description: String,
    pub billing_category: String,
    pub total_hours: f64,
    pub hourly_rate: f64,
    pub entry_ids: Vec<i64>,
}

impl LineItemSpec {
    pub fn amount(&self) -> f64 {
        self.total_hours * self.hourly_rate
    }
}

/// One department bucket of unbilled time. `billing_rate` is the group's
/// nominal rate for display; amounts are summed from each entry's own
/// resolved rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnbilledGroup {
    pub department_id: Option<i64>,
    pub department_name: String,
    pub billing_rate: f64,
    pub total_hours: f64,
    pub total_amount: f64,
    pub entry_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnbilledSummary {
    pub total_hours: f64,
    pub total_amount: f64,
    pub groups: Vec<UnbilledGroup>,
}
