use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Optional billing sub-entity of a client. A department may carry its own
/// billing rate; entries without one fall back to the client default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub id: Option<i64>,
    pub client_id: i64,
    pub name: String,
    pub billing_rate: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Department {
    pub fn new(client_id: i64, name: String) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            client_id,
            name,
            billing_rate: None,
            is_active: true,
            created_at: now,
            modified_at: now,
        }
    }

    pub fn with_billing_rate(mut self, billing_rate: Option<f64>) -> Self {
        self.billing_rate = billing_rate;
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DepartmentUpdate {
    pub name: Option<String>,
    pub billing_rate: Option<f64>,
    pub is_active: Option<bool>,
}

impl DepartmentUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.billing_rate.is_none() && self.is_active.is_none()
    }
}
