use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::PathBuf;

use crate::db::queries::TimeEntryQueries;
use crate::db::Database;
use crate::error::DomainError;
use crate::models::{DayEntry, WeeklyGrid};
use crate::utils::dates::week_start_of;
use crate::utils::validation::{
    validate_day_of_week, validate_entry_rate, validate_hours, validate_id, validate_notes,
};

/// Weekly timesheet operations: the grid projection and per-cell saves.
#[derive(Clone)]
pub struct TimesheetService {
    db_path: PathBuf,
}

impl TimesheetService {
    pub fn new(db_path: PathBuf) -> Self {
        Self { db_path }
    }

    /// Complete grid for the week containing `date` (normalized to Monday).
    pub async fn get_weekly_grid(&self, date: NaiveDate) -> Result<WeeklyGrid> {
        let week_start = week_start_of(date);

        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || -> Result<WeeklyGrid> {
            let db = Database::new(&db_path)?;
            TimeEntryQueries::weekly_grid(&db.connection, week_start)
        })
        .await?
    }

    /// Upsert one cell. Returns the entry id, or None when the save cleared
    /// the cell (hours == 0).
    pub async fn save_entry(
        &self,
        client_id: i64,
        department_id: Option<i64>,
        date: NaiveDate,
        day_of_week: u8,
        hours: f64,
        rate: f64,
        notes: Option<String>,
    ) -> Result<Option<i64>> {
        let validated_client = validate_id("client_id", client_id)?;
        if let Some(dept) = department_id {
            validate_id("department_id", dept)?;
        }
        let validated_day = validate_day_of_week(day_of_week)?;
        let validated_hours = validate_hours(hours).context("Invalid hours")?;
        let validated_rate = validate_entry_rate(rate).context("Invalid rate")?;
        let validated_notes = match notes {
            Some(n) => {
                let trimmed = validate_notes(&n).context("Invalid notes")?;
                (!trimmed.is_empty()).then_some(trimmed)
            }
            None => None,
        };

        let week_start = week_start_of(date);

        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || -> Result<Option<i64>> {
            let db = Database::new(&db_path)?;
            TimeEntryQueries::save_entry(
                &db.connection,
                validated_client,
                department_id,
                week_start,
                validated_day,
                validated_hours,
                validated_rate,
                validated_notes,
            )
        })
        .await?
    }

    /// Hard delete of an unbilled entry. Entries claimed by an invoice are
    /// frozen and refuse deletion.
    pub async fn delete_entry(&self, entry_id: i64) -> Result<bool> {
        let validated_id = validate_id("entry_id", entry_id)?;

        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || -> Result<bool> {
            let db = Database::new(&db_path)?;
            let deleted = TimeEntryQueries::delete(&db.connection, validated_id)?;
            if !deleted {
                return Err(DomainError::not_found("TimeEntry", validated_id).into());
            }
            Ok(deleted)
        })
        .await?
    }

    /// Department-level breakdown for one client/day cell.
    pub async fn get_day_entries(
        &self,
        client_id: i64,
        date: NaiveDate,
        day_of_week: u8,
    ) -> Result<Vec<DayEntry>> {
        let validated_client = validate_id("client_id", client_id)?;
        let validated_day = validate_day_of_week(day_of_week)?;
        let week_start = week_start_of(date);

        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<DayEntry>> {
            let db = Database::new(&db_path)?;
            TimeEntryQueries::day_entries(&db.connection, validated_client, week_start, validated_day)
        })
        .await?
    }
}
