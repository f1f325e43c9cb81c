use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::DomainError;
use crate::models::{
    resolve_rate, Client, ClientUpdate, ClientWeek, DayCell, DayEntry, Department,
    DepartmentUpdate, DeptWeek, TimeEntry, WeeklyGrid,
};

const CLIENT_COLUMNS: &str = "id, name, default_rate, payment_terms, active, contact_name, \
                              contact_email, contact_phone, billing_address, created_at, modified_at";

fn row_to_client(row: &Row) -> rusqlite::Result<Client> {
    Ok(Client {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        default_rate: row.get(2)?,
        payment_terms: row.get(3)?,
        active: row.get(4)?,
        contact_name: row.get(5)?,
        contact_email: row.get(6)?,
        contact_phone: row.get(7)?,
        billing_address: row.get(8)?,
        created_at: row.get(9)?,
        modified_at: row.get(10)?,
    })
}

pub struct ClientQueries;

impl ClientQueries {
    pub fn create(conn: &Connection, client: &Client) -> Result<i64> {
        let mut stmt = conn.prepare(
            "INSERT INTO clients (name, default_rate, payment_terms, active,
                                  contact_name, contact_email, contact_phone, billing_address)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;

        stmt.execute(params![
            client.name,
            client.default_rate,
            client.payment_terms,
            client.active,
            client.contact_name,
            client.contact_email,
            client.contact_phone,
            client.billing_address
        ])?;

        Ok(conn.last_insert_rowid())
    }

    pub fn list(conn: &Connection, active_only: bool) -> Result<Vec<Client>> {
        let sql = if active_only {
            format!(
                "SELECT {} FROM clients WHERE active = 1 ORDER BY name",
                CLIENT_COLUMNS
            )
        } else {
            format!("SELECT {} FROM clients ORDER BY name", CLIENT_COLUMNS)
        };

        let mut stmt = conn.prepare(&sql)?;
        let clients = stmt
            .query_map([], row_to_client)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(clients)
    }

    pub fn find_by_id(conn: &Connection, client_id: i64) -> Result<Option<Client>> {
        let sql = format!("SELECT {} FROM clients WHERE id = ?1", CLIENT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;

        let client = stmt.query_row([client_id], row_to_client).optional()?;

        Ok(client)
    }

    /// Field-by-field partial update; returns false when the update struct
    /// carries no fields or the client does not exist.
    pub fn update(conn: &Connection, client_id: i64, update: &ClientUpdate) -> Result<bool> {
        let mut updates = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(name) = &update.name {
            updates.push("name = ?");
            params.push(Box::new(name.clone()));
        }

        if let Some(rate) = update.default_rate {
            updates.push("default_rate = ?");
            params.push(Box::new(rate));
        }

        if let Some(terms) = update.payment_terms {
            updates.push("payment_terms = ?");
            params.push(Box::new(terms));
        }

        if let Some(active) = update.active {
            updates.push("active = ?");
            params.push(Box::new(active));
        }

        if let Some(contact_name) = &update.contact_name {
            updates.push("contact_name = ?");
            params.push(Box::new(contact_name.clone()));
        }

        if let Some(contact_email) = &update.contact_email {
            updates.push("contact_email = ?");
            params.push(Box::new(contact_email.clone()));
        }

        if let Some(contact_phone) = &update.contact_phone {
            updates.push("contact_phone = ?");
            params.push(Box::new(contact_phone.clone()));
        }

        if let Some(billing_address) = &update.billing_address {
            updates.push("billing_address = ?");
            params.push(Box::new(billing_address.clone()));
        }

        if updates.is_empty() {
            return Ok(false);
        }

        updates.push("modified_at = CURRENT_TIMESTAMP");
        params.push(Box::new(client_id));

        let sql = format!("UPDATE clients SET {} WHERE id = ?", updates.join(", "));
        let mut stmt = conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let changes = stmt.execute(&param_refs[..])?;

        Ok(changes > 0)
    }

    /// Soft delete: the client disappears from new timesheet grids but its
    /// history stays addressable.
    pub fn deactivate(conn: &Connection, client_id: i64) -> Result<bool> {
        let changes = conn.execute(
            "UPDATE clients SET active = 0, modified_at = CURRENT_TIMESTAMP WHERE id = ?1",
            [client_id],
        )?;
        Ok(changes > 0)
    }
}

fn row_to_department(row: &Row) -> rusqlite::Result<Department> {
    Ok(Department {
        id: Some(row.get(0)?),
        client_id: row.get(1)?,
        name: row.get(2)?,
        billing_rate: row.get(3)?,
        is_active: row.get(4)?,
        created_at: row.get(5)?,
        modified_at: row.get(6)?,
    })
}

pub struct DepartmentQueries;

impl DepartmentQueries {
    pub fn create(conn: &Connection, department: &Department) -> Result<i64> {
        let mut stmt = conn.prepare(
            "INSERT INTO departments (client_id, name, billing_rate, is_active)
             VALUES (?1, ?2, ?3, ?4)",
        )?;

        stmt.execute(params![
            department.client_id,
            department.name,
            department.billing_rate,
            department.is_active
        ])?;

        Ok(conn.last_insert_rowid())
    }

    pub fn list_for_client(
        conn: &Connection,
        client_id: i64,
        active_only: bool,
    ) -> Result<Vec<Department>> {
        let sql = if active_only {
            "SELECT id, client_id, name, billing_rate, is_active, created_at, modified_at
             FROM departments WHERE client_id = ?1 AND is_active = 1 ORDER BY name"
        } else {
            "SELECT id, client_id, name, billing_rate, is_active, created_at, modified_at
             FROM departments WHERE client_id = ?1 ORDER BY name"
        };

        let mut stmt = conn.prepare(sql)?;
        let departments = stmt
            .query_map([client_id], row_to_department)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(departments)
    }

    pub fn find_by_id(conn: &Connection, department_id: i64) -> Result<Option<Department>> {
        let mut stmt = conn.prepare(
            "SELECT id, client_id, name, billing_rate, is_active, created_at, modified_at
             FROM departments WHERE id = ?1",
        )?;

        let department = stmt
            .query_row([department_id], row_to_department)
            .optional()?;

        Ok(department)
    }

    pub fn update(
        conn: &Connection,
        department_id: i64,
        update: &DepartmentUpdate,
    ) -> Result<bool> {
        let mut updates = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(name) = &update.name {
            updates.push("name = ?");
            params.push(Box::new(name.clone()));
        }

        if let Some(rate) = update.billing_rate {
            updates.push("billing_rate = ?");
            params.push(Box::new(rate));
        }

        if let Some(is_active) = update.is_active {
            updates.push("is_active = ?");
            params.push(Box::new(is_active));
        }

        if updates.is_empty() {
            return Ok(false);
        }

        updates.push("modified_at = CURRENT_TIMESTAMP");
        params.push(Box::new(department_id));

        let sql = format!("UPDATE departments SET {} WHERE id = ?", updates.join(", "));
        let mut stmt = conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let changes = stmt.execute(&param_refs[..])?;

        Ok(changes > 0)
    }

    pub fn deactivate(conn: &Connection, department_id: i64) -> Result<bool> {
        let changes = conn.execute(
            "UPDATE departments SET is_active = 0, modified_at = CURRENT_TIMESTAMP WHERE id = ?1",
            [department_id],
        )?;
        Ok(changes > 0)
    }
}

const ENTRY_COLUMNS: &str =
    "id, client_id, department_id, week_start_date, day_of_week, hours_worked, rate_used, notes, created_at";

fn row_to_entry(row: &Row) -> rusqlite::Result<TimeEntry> {
    Ok(TimeEntry {
        id: Some(row.get(0)?),
        client_id: row.get(1)?,
        department_id: row.get(2)?,
        week_start_date: row.get(3)?,
        day_of_week: row.get(4)?,
        hours_worked: row.get(5)?,
        rate_used: row.get(6)?,
        notes: row.get(7)?,
        created_at: row.get(8)?,
    })
}

pub struct TimeEntryQueries;

impl TimeEntryQueries {
    pub fn find_by_id(conn: &Connection, entry_id: i64) -> Result<Option<TimeEntry>> {
        let sql = format!("SELECT {} FROM time_entries WHERE id = ?1", ENTRY_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;

        let entry = stmt.query_row([entry_id], row_to_entry).optional()?;

        Ok(entry)
    }

    pub fn find_by_slot(
        conn: &Connection,
        client_id: i64,
        department_id: Option<i64>,
        week_start: NaiveDate,
        day_of_week: u8,
    ) -> Result<Option<TimeEntry>> {
        let sql = format!(
            "SELECT {} FROM time_entries
             WHERE client_id = ?1 AND department_id IS ?2
               AND week_start_date = ?3 AND day_of_week = ?4",
            ENTRY_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let entry = stmt
            .query_row(
                params![client_id, department_id, week_start, day_of_week],
                row_to_entry,
            )
            .optional()?;

        Ok(entry)
    }

    /// True once the entry has been claimed by an invoice line item. Claimed
    /// entries are immutable history.
    pub fn is_claimed(conn: &Connection, entry_id: i64) -> Result<bool> {
        let claimed: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM line_item_entries WHERE time_entry_id = ?1)",
            [entry_id],
            |row| row.get(0),
        )?;
        Ok(claimed)
    }

    /// Upsert keyed on the (client, department, week, day) slot.
    /// hours > 0 inserts or updates; hours == 0 deletes an existing row
    /// (returns None) and is a no-op when the slot is empty. The whole
    /// operation runs in one transaction.
    pub fn save_entry(
        conn: &Connection,
        client_id: i64,
        department_id: Option<i64>,
        week_start: NaiveDate,
        day_of_week: u8,
        hours: f64,
        rate: f64,
        notes: Option<String>,
    ) -> Result<Option<i64>> {
        let tx = conn.unchecked_transaction()?;

        let existing = Self::find_by_slot(&tx, client_id, department_id, week_start, day_of_week)?;

        let entry_id = match existing {
            Some(entry) => {
                let id = entry.id.unwrap_or_default();
                if Self::is_claimed(&tx, id)? {
                    return Err(DomainError::AlreadyBilled { entry_ids: vec![id] }.into());
                }

                if hours > 0.0 {
                    tx.execute(
                        "UPDATE time_entries SET hours_worked = ?1, rate_used = ?2, notes = ?3
                         WHERE id = ?4",
                        params![hours, rate, notes, id],
                    )?;
                    Some(id)
                } else {
                    // Saving zero hours clears the cell
                    tx.execute("DELETE FROM time_entries WHERE id = ?1", [id])?;
                    None
                }
            }
            None => {
                if hours > 0.0 {
                    tx.execute(
                        "INSERT INTO time_entries
                         (client_id, department_id, week_start_date, day_of_week,
                          hours_worked, rate_used, notes)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                        params![client_id, department_id, week_start, day_of_week, hours, rate, notes],
                    )?;
                    Some(tx.last_insert_rowid())
                } else {
                    None
                }
            }
        };

        tx.commit()?;
        log::debug!(
            "Saved slot client={} dept={:?} week={} day={} -> entry {:?}",
            client_id,
            department_id,
            week_start,
            day_of_week,
            entry_id
        );

        Ok(entry_id)
    }

    pub fn delete(conn: &Connection, entry_id: i64) -> Result<bool> {
        if Self::is_claimed(conn, entry_id)? {
            return Err(DomainError::AlreadyBilled {
                entry_ids: vec![entry_id],
            }
            .into());
        }

        let changes = conn.execute("DELETE FROM time_entries WHERE id = ?1", [entry_id])?;
        Ok(changes > 0)
    }

    /// All entries anchored at the given week, across clients.
    pub fn list_for_week(conn: &Connection, week_start: NaiveDate) -> Result<Vec<TimeEntry>> {
        let sql = format!(
            "SELECT {} FROM time_entries WHERE week_start_date = ?1
             ORDER BY client_id, day_of_week",
            ENTRY_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let entries = stmt
            .query_map([week_start], row_to_entry)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Per-cell breakdown for one client/day: each entry with its department
    /// name and the rate that would actually bill.
    pub fn day_entries(
        conn: &Connection,
        client_id: i64,
        week_start: NaiveDate,
        day_of_week: u8,
    ) -> Result<Vec<DayEntry>> {
        let mut stmt = conn.prepare(
            "SELECT t.id, t.department_id, IFNULL(d.name, 'General') AS department_name,
                    t.hours_worked, t.rate_used, t.notes, d.billing_rate, c.default_rate
             FROM time_entries AS t
             JOIN clients AS c ON t.client_id = c.id
             LEFT JOIN departments AS d ON t.department_id = d.id
             WHERE t.client_id = ?1 AND t.week_start_date = ?2 AND t.day_of_week = ?3
             ORDER BY IFNULL(d.name, 'General')",
        )?;

        let entries = stmt
            .query_map(params![client_id, week_start, day_of_week], |row| {
                let rate_used: f64 = row.get(4)?;
                let dept_rate: Option<f64> = row.get(6)?;
                let client_default: f64 = row.get(7)?;
                Ok(DayEntry {
                    entry_id: row.get(0)?,
                    department_id: row.get(1)?,
                    department_name: row.get(2)?,
                    hours_worked: row.get(3)?,
                    resolved_rate: resolve_rate(
                        (rate_used > 0.0).then_some(rate_used),
                        dept_rate,
                        client_default,
                    ),
                    notes: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Weekly projection: every active client crossed with its active
    /// departments plus the "General" bucket, all seven days filled. Absent
    /// cells carry zero hours at the resolved default rate.
    pub fn weekly_grid(conn: &Connection, week_start: NaiveDate) -> Result<WeeklyGrid> {
        let clients = ClientQueries::list(conn, true)?;
        let entries = Self::list_for_week(conn, week_start)?;

        let mut grid_clients = Vec::with_capacity(clients.len());

        for client in clients {
            let client_id = client.id.unwrap_or_default();
            let departments = DepartmentQueries::list_for_client(conn, client_id, true)?;

            let mut dept_weeks = vec![DeptWeek::new(
                None,
                "General".to_string(),
                client.default_rate,
            )];
            for dept in &departments {
                dept_weeks.push(DeptWeek::new(
                    dept.id,
                    dept.name.clone(),
                    resolve_rate(None, dept.billing_rate, client.default_rate),
                ));
            }

            for entry in entries.iter().filter(|e| e.client_id == client_id) {
                // Entries for departments deactivated since the week was
                // recorded still need a row in the grid.
                if !dept_weeks.iter().any(|w| w.department_id == entry.department_id) {
                    let dept = DepartmentQueries::find_by_id(
                        conn,
                        entry.department_id.unwrap_or_default(),
                    )?;
                    let (name, rate) = match dept {
                        Some(d) => (
                            d.name.clone(),
                            resolve_rate(None, d.billing_rate, client.default_rate),
                        ),
                        None => ("General".to_string(), client.default_rate),
                    };
                    dept_weeks.push(DeptWeek::new(entry.department_id, name, rate));
                }

                let week = dept_weeks
                    .iter_mut()
                    .find(|w| w.department_id == entry.department_id)
                    .expect("department row was just ensured");

                // The row's billing_rate already folds in the department and
                // client fallbacks, so only the entry override remains.
                week.days.insert(
                    entry.day_of_week,
                    DayCell {
                        hours: entry.hours_worked,
                        rate: entry.rate_override().unwrap_or(week.billing_rate),
                        entry_id: entry.id,
                        notes: entry.notes.clone().unwrap_or_default(),
                    },
                );
            }

            grid_clients.push(ClientWeek {
                client_id,
                client_name: client.name,
                default_rate: client.default_rate,
                departments: dept_weeks,
            });
        }

        Ok(WeeklyGrid {
            week_start,
            clients: grid_clients,
        })
    }
}
