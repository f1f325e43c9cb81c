use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One recorded unit of work: a (client, department, week, day) slot with
/// hours and the rate captured at entry time. `rate_used == 0` means the
/// entry carries no override and billing falls back to the department or
/// client rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: Option<i64>,
    pub client_id: i64,
    pub department_id: Option<i64>,
    pub week_start_date: NaiveDate,
    pub day_of_week: u8,
    pub hours_worked: f64,
    pub rate_used: f64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TimeEntry {
    pub fn new(
        client_id: i64,
        department_id: Option<i64>,
        week_start_date: NaiveDate,
        day_of_week: u8,
        hours_worked: f64,
        rate_used: f64,
    ) -> Self {
        Self {
            id: None,
            client_id,
            department_id,
            week_start_date,
            day_of_week,
            hours_worked,
            rate_used,
            notes: None,
            created_at: Utc::now(),
        }
    }

    /// Calendar date of the entry: week anchor plus day offset (Monday = 1).
    pub fn entry_date(&self) -> NaiveDate {
        self.week_start_date + Duration::days(self.day_of_week as i64 - 1)
    }

    /// The entry's own rate counts as an override only when positive.
    pub fn rate_override(&self) -> Option<f64> {
        (self.rate_used > 0.0).then_some(self.rate_used)
    }
}

/// A single day's entry joined with its department name and resolved rate,
/// as shown in the per-cell breakdown of the timesheet grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayEntry {
    pub entry_id: i64,
    pub department_id: Option<i64>,
    pub department_name: String,
    pub hours_worked: f64,
    pub resolved_rate: f64,
    pub notes: String,
}
