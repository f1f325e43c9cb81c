use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One cell of the weekly grid. Absent days are filled in with zero hours
/// and the resolved default rate so callers never special-case empty cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayCell {
    pub hours: f64,
    pub rate: f64,
    pub entry_id: Option<i64>,
    pub notes: String,
}

impl DayCell {
    pub fn empty(rate: f64) -> Self {
        Self {
            hours: 0.0,
            rate,
            entry_id: None,
            notes: String::new(),
        }
    }
}

/// A department row within a client's week: all seven days present, keyed
/// 1 (Monday) through 7 (Sunday).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeptWeek {
    pub department_id: Option<i64>,
    pub department_name: String,
    pub billing_rate: f64,
    pub days: BTreeMap<u8, DayCell>,
}

impl DeptWeek {
    pub fn new(department_id: Option<i64>, department_name: String, billing_rate: f64) -> Self {
        let days = (1..=7u8).map(|d| (d, DayCell::empty(billing_rate))).collect();
        Self {
            department_id,
            department_name,
            billing_rate,
            days,
        }
    }

    pub fn total_hours(&self) -> f64 {
        self.days.values().map(|c| c.hours).sum()
    }

    pub fn total_amount(&self) -> f64 {
        self.days.values().map(|c| c.hours * c.rate).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientWeek {
    pub client_id: i64,
    pub client_name: String,
    pub default_rate: f64,
    pub departments: Vec<DeptWeek>,
}

impl ClientWeek {
    pub fn total_hours(&self) -> f64 {
        self.departments.iter().map(|d| d.total_hours()).sum()
    }
}

/// The full weekly projection: every active client crossed with its active
/// departments (plus the synthetic "General" bucket) and all seven days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyGrid {
    pub week_start: chrono::NaiveDate,
    pub clients: Vec<ClientWeek>,
}
