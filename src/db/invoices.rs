use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::DomainError;
use crate::models::{
    Invoice, InvoiceLineItem, InvoiceStatus, LineItemSpec, UnbilledGroup, UnbilledSummary,
};

const INVOICE_COLUMNS: &str = "i.id, i.client_id, c.name, i.invoice_number, i.invoice_date, \
                               i.due_date, i.total_hours, i.total_amount, i.status, i.notes, \
                               i.pdf_path, i.created_at, i.modified_at";

fn row_to_invoice(row: &Row) -> rusqlite::Result<Invoice> {
    let status: String = row.get(8)?;
    Ok(Invoice {
        id: Some(row.get(0)?),
        client_id: row.get(1)?,
        client_name: row.get(2)?,
        invoice_number: row.get(3)?,
        invoice_date: row.get(4)?,
        due_date: row.get(5)?,
        total_hours: row.get(6)?,
        total_amount: row.get(7)?,
        status: status.parse().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                8,
                rusqlite::types::Type::Text,
                format!("{}", e).into(),
            )
        })?,
        notes: row.get(9)?,
        pdf_path: row.get(10)?,
        created_at: row.get(11)?,
        modified_at: row.get(12)?,
        line_items: Vec::new(),
    })
}

fn is_unique_violation(err: &rusqlite::Error, column: &str) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, Some(msg)) => {
            e.code == rusqlite::ErrorCode::ConstraintViolation && msg.contains(column)
        }
        _ => false,
    }
}

pub struct InvoiceQueries;

impl InvoiceQueries {
    /// Unbilled time for a client in an inclusive calendar-date range,
    /// grouped by department. An entry's calendar date is its week anchor
    /// plus the day offset; entries already claimed by a line item are
    /// excluded. Amounts are summed at each entry's own resolved rate.
    pub fn unbilled_grouped(
        conn: &Connection,
        client_id: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<UnbilledSummary> {
        let mut stmt = conn.prepare(
            "SELECT
                 t.department_id,
                 IFNULL(d.name, 'General') AS department_name,
                 IFNULL(d.billing_rate, c.default_rate) AS billing_rate,
                 SUM(t.hours_worked) AS total_hours,
                 SUM(t.hours_worked * (CASE
                     WHEN t.rate_used > 0 THEN t.rate_used
                     WHEN d.billing_rate > 0 THEN d.billing_rate
                     ELSE c.default_rate
                 END)) AS total_amount,
                 GROUP_CONCAT(t.id) AS entry_ids
             FROM time_entries AS t
             JOIN clients AS c ON t.client_id = c.id
             LEFT JOIN departments AS d ON t.department_id = d.id
             WHERE t.client_id = ?1
               AND date(t.week_start_date, '+' || (t.day_of_week - 1) || ' days') >= ?2
               AND date(t.week_start_date, '+' || (t.day_of_week - 1) || ' days') <= ?3
               AND t.id NOT IN (SELECT time_entry_id FROM line_item_entries)
             GROUP BY t.department_id, d.name, d.billing_rate, c.default_rate
             ORDER BY IFNULL(d.name, 'General')",
        )?;

        let groups = stmt
            .query_map(params![client_id, start_date, end_date], |row| {
                let ids: Option<String> = row.get(5)?;
                Ok(UnbilledGroup {
                    department_id: row.get(0)?,
                    department_name: row.get(1)?,
                    billing_rate: row.get(2)?,
                    total_hours: row.get(3)?,
                    total_amount: row.get(4)?,
                    entry_ids: ids
                        .unwrap_or_default()
                        .split(',')
                        .filter_map(|s| s.parse().ok())
                        .collect(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let total_hours = groups.iter().map(|g| g.total_hours).sum();
        let total_amount = groups.iter().map(|g| g.total_amount).sum();

        log::debug!(
            "Unbilled for client {}: {} groups, {} hours",
            client_id,
            groups.len(),
            total_hours
        );

        Ok(UnbilledSummary {
            total_hours,
            total_amount,
            groups,
        })
    }

    /// First free number of the form PREFIX-<year>-NNNN, probing 0001..0999.
    /// Exhaustion is a reportable operational error, not a wraparound.
    pub fn allocate_invoice_number(conn: &Connection, prefix: &str, year: i32) -> Result<String> {
        for attempt in 1..1000 {
            let candidate = format!("{}-{}-{:04}", prefix, year, attempt);
            let taken: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM invoices WHERE invoice_number = ?1)",
                [&candidate],
                |row| row.get(0),
            )?;
            if !taken {
                return Ok(candidate);
            }
        }

        Err(DomainError::AllocationExhausted { year }.into())
    }

    /// Create an invoice header, its line items, and the time-entry claims
    /// as one transaction. Rolls back entirely on any failure, so an entry
    /// can never be half-claimed and an invoice never lacks its items.
    pub fn create(
        conn: &Connection,
        client_id: i64,
        invoice_date: NaiveDate,
        specs: &[LineItemSpec],
        notes: Option<String>,
        number_prefix: &str,
    ) -> Result<i64> {
        if specs.is_empty() {
            return Err(crate::utils::validation::ValidationError::EmptyInvoice.into());
        }

        let tx = conn.unchecked_transaction()?;

        // Payment terms read fresh at creation time
        let payment_terms: i64 = tx
            .query_row(
                "SELECT payment_terms FROM clients WHERE id = ?1",
                [client_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(DomainError::NotFound {
                entity: "Client",
                id: client_id,
            })?;

        let requested: Vec<i64> = specs.iter().flat_map(|s| s.entry_ids.clone()).collect();

        // Fail fast with a typed error before touching the claim table; the
        // UNIQUE constraint below is the final guarantee under races.
        let already_billed = Self::claimed_among(&tx, &requested)?;
        if !already_billed.is_empty() {
            return Err(DomainError::AlreadyBilled {
                entry_ids: already_billed,
            }
            .into());
        }

        let total_hours: f64 = specs.iter().map(|s| s.total_hours).sum();
        let total_amount: f64 = specs.iter().map(|s| s.amount()).sum();
        let due_date = invoice_date + Duration::days(payment_terms);

        let mut invoice_number =
            Self::allocate_invoice_number(&tx, number_prefix, year_of(invoice_date))?;

        let insert_header = |number: &str| {
            tx.execute(
                "INSERT INTO invoices
                 (client_id, invoice_number, invoice_date, due_date, total_hours, total_amount,
                  status, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'Draft', ?7)",
                params![client_id, number, invoice_date, due_date, total_hours, total_amount, notes],
            )
        };

        if let Err(err) = insert_header(&invoice_number) {
            // Another writer took the number between probe and insert.
            // Retry once with the next free candidate; the UNIQUE constraint
            // stays the guarantee if that loses too.
            if is_unique_violation(&err, "invoice_number") {
                invoice_number =
                    Self::allocate_invoice_number(&tx, number_prefix, year_of(invoice_date))?;
                insert_header(&invoice_number)?;
            } else {
                return Err(err.into());
            }
        }

        let invoice_id = tx.last_insert_rowid();

        for spec in specs {
            tx.execute(
                "INSERT INTO invoice_line_items
                 (invoice_id, department_id, line_description, billing_category,
                  total_hours, hourly_rate, amount)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    invoice_id,
                    spec.department_id,
                    spec.description,
                    spec.billing_category,
                    spec.total_hours,
                    spec.hourly_rate,
                    spec.amount()
                ],
            )?;
            let line_item_id = tx.last_insert_rowid();

            for &entry_id in &spec.entry_ids {
                // hours_included snapshots the entry's recorded hours at
                // claim time
                let changes = tx
                    .execute(
                        "INSERT INTO line_item_entries (line_item_id, time_entry_id, hours_included)
                         SELECT ?1, ?2, hours_worked FROM time_entries WHERE id = ?2",
                        params![line_item_id, entry_id],
                    )
                    .map_err(|err| {
                        if is_unique_violation(&err, "time_entry_id") {
                            anyhow::Error::from(DomainError::AlreadyBilled {
                                entry_ids: vec![entry_id],
                            })
                        } else {
                            err.into()
                        }
                    })?;

                if changes == 0 {
                    return Err(DomainError::NotFound {
                        entity: "TimeEntry",
                        id: entry_id,
                    }
                    .into());
                }
            }
        }

        tx.commit().context("Failed to commit invoice creation")?;

        log::info!(
            "Invoice {} created for client {} with {} line items",
            invoice_number,
            client_id,
            specs.len()
        );

        Ok(invoice_id)
    }

    fn claimed_among(conn: &Connection, entry_ids: &[i64]) -> Result<Vec<i64>> {
        if entry_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; entry_ids.len()].join(",");
        let sql = format!(
            "SELECT time_entry_id FROM line_item_entries WHERE time_entry_id IN ({})",
            placeholders
        );

        let mut stmt = conn.prepare(&sql)?;
        let params: Vec<&dyn rusqlite::ToSql> =
            entry_ids.iter().map(|id| id as &dyn rusqlite::ToSql).collect();

        let claimed = stmt
            .query_map(&params[..], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(claimed)
    }

    pub fn find_by_id(conn: &Connection, invoice_id: i64) -> Result<Option<Invoice>> {
        let sql = format!(
            "SELECT {} FROM invoices AS i JOIN clients AS c ON i.client_id = c.id
             WHERE i.id = ?1",
            INVOICE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let invoice = stmt.query_row([invoice_id], row_to_invoice).optional()?;

        let Some(mut invoice) = invoice else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT id, invoice_id, department_id, line_description, billing_category,
                    total_hours, hourly_rate, amount
             FROM invoice_line_items WHERE invoice_id = ?1 ORDER BY id",
        )?;

        invoice.line_items = stmt
            .query_map([invoice_id], |row| {
                Ok(InvoiceLineItem {
                    id: Some(row.get(0)?),
                    invoice_id: row.get(1)?,
                    department_id: row.get(2)?,
                    line_description: row.get(3)?,
                    billing_category: row.get(4)?,
                    total_hours: row.get(5)?,
                    hourly_rate: row.get(6)?,
                    amount: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(invoice))
    }

    /// Invoice headers, newest first, optionally for one client. Line items
    /// are not loaded here; use find_by_id for the full document.
    pub fn list(conn: &Connection, client_id: Option<i64>) -> Result<Vec<Invoice>> {
        let base = format!(
            "SELECT {} FROM invoices AS i JOIN clients AS c ON i.client_id = c.id",
            INVOICE_COLUMNS
        );

        let invoices = match client_id {
            Some(id) => {
                let sql = format!("{} WHERE i.client_id = ?1 ORDER BY i.invoice_date DESC", base);
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map([id], row_to_invoice)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let sql = format!("{} ORDER BY i.invoice_date DESC", base);
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map([], row_to_invoice)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };

        Ok(invoices)
    }

    /// Unguarded status setter: any of the five states may follow any other.
    pub fn update_status(conn: &Connection, invoice_id: i64, status: InvoiceStatus) -> Result<bool> {
        let changes = conn.execute(
            "UPDATE invoices SET status = ?1, modified_at = CURRENT_TIMESTAMP WHERE id = ?2",
            params![status.to_string(), invoice_id],
        )?;
        Ok(changes > 0)
    }

    pub fn update_pdf_path(conn: &Connection, invoice_id: i64, pdf_path: &str) -> Result<bool> {
        let changes = conn.execute(
            "UPDATE invoices SET pdf_path = ?1, modified_at = CURRENT_TIMESTAMP WHERE id = ?2",
            params![pdf_path, invoice_id],
        )?;
        Ok(changes > 0)
    }

    pub fn update_notes(conn: &Connection, invoice_id: i64, notes: Option<String>) -> Result<bool> {
        let changes = conn.execute(
            "UPDATE invoices SET notes = ?1, modified_at = CURRENT_TIMESTAMP WHERE id = ?2",
            params![notes, invoice_id],
        )?;
        Ok(changes > 0)
    }

    /// Remove the invoice, its line items, and the claim rows in one
    /// transaction. Foreign-key cascades release every claimed time entry
    /// back to the unbilled pool; there is no separate release step a caller
    /// could skip.
    pub fn delete(conn: &Connection, invoice_id: i64) -> Result<bool> {
        let tx = conn.unchecked_transaction()?;
        let changes = tx.execute("DELETE FROM invoices WHERE id = ?1", [invoice_id])?;
        tx.commit()?;

        if changes > 0 {
            log::info!("Invoice {} deleted, claimed entries released", invoice_id);
        }

        Ok(changes > 0)
    }
}

fn year_of(date: NaiveDate) -> i32 {
    use chrono::Datelike;
    date.year()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[test]
    fn allocation_reports_exhaustion_for_a_full_year() {
        let db = Database::in_memory().unwrap();
        let conn = &db.connection;

        conn.execute(
            "INSERT INTO clients (name, default_rate) VALUES ('Acme', 100.0)",
            [],
        )
        .unwrap();

        // Occupy every number the probe will try for 2024
        for seq in 1..1000 {
            conn.execute(
                "INSERT INTO invoices
                 (client_id, invoice_number, invoice_date, due_date)
                 VALUES (1, ?1, '2024-01-01', '2024-01-31')",
                [format!("INV-2024-{:04}", seq)],
            )
            .unwrap();
        }

        let err = InvoiceQueries::allocate_invoice_number(conn, "INV", 2024).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DomainError>(),
            Some(&DomainError::AllocationExhausted { year: 2024 })
        );

        // Other years are unaffected
        assert_eq!(
            InvoiceQueries::allocate_invoice_number(conn, "INV", 2025).unwrap(),
            "INV-2025-0001"
        );
    }
}
