use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: Option<i64>,
    pub name: String,
    pub default_rate: f64,
    pub payment_terms: i64,
    pub active: bool,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub billing_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Client {
    pub fn new(name: String, default_rate: f64) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            name,
            default_rate,
            payment_terms: 30,
            active: true,
            contact_name: None,
            contact_email: None,
            contact_phone: None,
            billing_address: None,
            created_at: now,
            modified_at: now,
        }
    }

    pub fn with_payment_terms(mut self, payment_terms: i64) -> Self {
        self.payment_terms = payment_terms;
        self
    }

    pub fn with_contact(
        mut self,
        name: Option<String>,
        email: Option<String>,
        phone: Option<String>,
    ) -> Self {
        self.contact_name = name;
        self.contact_email = email;
        self.contact_phone = phone;
        self
    }

    pub fn with_billing_address(mut self, billing_address: Option<String>) -> Self {
        self.billing_address = billing_address;
        self
    }
}

/// Partial update: only supplied fields change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientUpdate {
    pub name: Option<String>,
    pub default_rate: Option<f64>,
    pub payment_terms: Option<i64>,
    pub active: Option<bool>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub billing_address: Option<String>,
}

impl ClientUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.default_rate.is_none()
            && self.payment_terms.is_none()
            && self.active.is_none()
            && self.contact_name.is_none()
            && self.contact_email.is_none()
            && self.contact_phone.is_none()
            && self.billing_address.is_none()
    }
}
