use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::PathBuf;

use crate::db::invoices::InvoiceQueries;
use crate::db::queries::ClientQueries;
use crate::db::Database;
use crate::error::DomainError;
use crate::models::{Invoice, InvoiceStatus, LineItemSpec, UnbilledSummary};
use crate::utils::validation::{
    validate_date_range, validate_hours, validate_id, validate_notes, validate_rate,
    ValidationError,
};

/// Invoice lifecycle: unbilled aggregation, creation, retrieval, status,
/// deletion. All multi-row writes happen inside one transaction in the
/// query layer.
#[derive(Clone)]
pub struct InvoiceService {
    db_path: PathBuf,
    number_prefix: String,
}

impl InvoiceService {
    pub fn new(db_path: PathBuf) -> Self {
        Self {
            db_path,
            number_prefix: "INV".to_string(),
        }
    }

    /// Override the invoice number prefix (config `invoice_prefix`).
    pub fn with_number_prefix(mut self, prefix: String) -> Self {
        self.number_prefix = prefix;
        self
    }

    /// Unbilled hours for a client in an inclusive date range, grouped by
    /// department.
    pub async fn get_unbilled_grouped(
        &self,
        client_id: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<UnbilledSummary> {
        let validated_client = validate_id("client_id", client_id)?;
        let (start, end) = validate_date_range(start_date, end_date)?;

        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || -> Result<UnbilledSummary> {
            let db = Database::new(&db_path)?;

            if ClientQueries::find_by_id(&db.connection, validated_client)?.is_none() {
                return Err(DomainError::not_found("Client", validated_client).into());
            }

            InvoiceQueries::unbilled_grouped(&db.connection, validated_client, start, end)
        })
        .await?
    }

    /// Create an invoice from explicit line item specs. Each referenced time
    /// entry is claimed exactly once, atomically with the header and items.
    pub async fn create_invoice(
        &self,
        client_id: i64,
        invoice_date: NaiveDate,
        specs: Vec<LineItemSpec>,
        notes: Option<String>,
    ) -> Result<Invoice> {
        let validated_client = validate_id("client_id", client_id)?;

        if specs.is_empty() {
            return Err(ValidationError::EmptyInvoice.into());
        }
        for spec in &specs {
            validate_hours(spec.total_hours).context("Invalid line item hours")?;
            validate_rate(spec.hourly_rate).context("Invalid line item rate")?;
            if spec.description.trim().is_empty() {
                return Err(ValidationError::InvalidString {
                    reason: "Line description cannot be empty".to_string(),
                }
                .into());
            }
            for &entry_id in &spec.entry_ids {
                validate_id("entry_id", entry_id)?;
            }
        }
        let validated_notes = match notes {
            Some(n) => {
                let trimmed = validate_notes(&n)?;
                (!trimmed.is_empty()).then_some(trimmed)
            }
            None => None,
        };

        let db_path = self.db_path.clone();
        let number_prefix = self.number_prefix.clone();
        tokio::task::spawn_blocking(move || -> Result<Invoice> {
            let db = Database::new(&db_path)?;
            let invoice_id = InvoiceQueries::create(
                &db.connection,
                validated_client,
                invoice_date,
                &specs,
                validated_notes,
                &number_prefix,
            )?;

            InvoiceQueries::find_by_id(&db.connection, invoice_id)?
                .ok_or_else(|| DomainError::not_found("Invoice", invoice_id).into())
        })
        .await?
    }

    /// Convenience path used by the CLI: build one line item per unbilled
    /// department group in the range and invoice all of it.
    pub async fn create_invoice_from_unbilled(
        &self,
        client_id: i64,
        invoice_date: NaiveDate,
        start_date: NaiveDate,
        end_date: NaiveDate,
        notes: Option<String>,
    ) -> Result<Invoice> {
        let unbilled = self
            .get_unbilled_grouped(client_id, start_date, end_date)
            .await?;

        if unbilled.groups.is_empty() {
            return Err(ValidationError::EmptyInvoice.into());
        }

        let specs = unbilled
            .groups
            .into_iter()
            .map(|group| LineItemSpec {
                department_id: group.department_id,
                description: format!(
                    "{}: {} to {}",
                    group.department_name, start_date, end_date
                ),
                billing_category: group.department_name,
                total_hours: group.total_hours,
                // Effective rate so the stored amount matches the unbilled sum
                hourly_rate: if group.total_hours > 0.0 {
                    group.total_amount / group.total_hours
                } else {
                    group.billing_rate
                },
                entry_ids: group.entry_ids,
            })
            .collect();

        self.create_invoice(client_id, invoice_date, specs, notes)
            .await
    }

    pub async fn get_invoice(&self, invoice_id: i64) -> Result<Invoice> {
        let validated_id = validate_id("invoice_id", invoice_id)?;

        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || -> Result<Invoice> {
            let db = Database::new(&db_path)?;
            InvoiceQueries::find_by_id(&db.connection, validated_id)?
                .ok_or_else(|| DomainError::not_found("Invoice", validated_id).into())
        })
        .await?
    }

    pub async fn list_invoices(&self, client_id: Option<i64>) -> Result<Vec<Invoice>> {
        if let Some(id) = client_id {
            validate_id("client_id", id)?;
        }

        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<Invoice>> {
            let db = Database::new(&db_path)?;
            InvoiceQueries::list(&db.connection, client_id)
        })
        .await?
    }

    pub async fn update_status(&self, invoice_id: i64, status: InvoiceStatus) -> Result<bool> {
        let validated_id = validate_id("invoice_id", invoice_id)?;

        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || -> Result<bool> {
            let db = Database::new(&db_path)?;
            let updated = InvoiceQueries::update_status(&db.connection, validated_id, status)?;
            if !updated {
                return Err(DomainError::not_found("Invoice", validated_id).into());
            }
            log::info!("Invoice {} status set to {}", validated_id, status);
            Ok(updated)
        })
        .await?
    }

    pub async fn update_pdf_path(&self, invoice_id: i64, pdf_path: String) -> Result<bool> {
        let validated_id = validate_id("invoice_id", invoice_id)?;

        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || -> Result<bool> {
            let db = Database::new(&db_path)?;
            let updated = InvoiceQueries::update_pdf_path(&db.connection, validated_id, &pdf_path)?;
            if !updated {
                return Err(DomainError::not_found("Invoice", validated_id).into());
            }
            Ok(updated)
        })
        .await?
    }

    pub async fn update_notes(&self, invoice_id: i64, notes: Option<String>) -> Result<bool> {
        let validated_id = validate_id("invoice_id", invoice_id)?;
        let validated_notes = match notes {
            Some(n) => Some(validate_notes(&n)?),
            None => None,
        };

        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || -> Result<bool> {
            let db = Database::new(&db_path)?;
            let updated = InvoiceQueries::update_notes(&db.connection, validated_id, validated_notes)?;
            if !updated {
                return Err(DomainError::not_found("Invoice", validated_id).into());
            }
            Ok(updated)
        })
        .await?
    }

    /// Delete the invoice and release its claimed entries back to the
    /// unbilled pool, atomically.
    pub async fn delete_invoice(&self, invoice_id: i64) -> Result<bool> {
        let validated_id = validate_id("invoice_id", invoice_id)?;

        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || -> Result<bool> {
            let db = Database::new(&db_path)?;
            let deleted = InvoiceQueries::delete(&db.connection, validated_id)?;
            if !deleted {
                return Err(DomainError::not_found("Invoice", validated_id).into());
            }
            Ok(deleted)
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{ClientService, TimesheetService};
    use crate::test_utils::TestContext;

    struct Fixture {
        _ctx: TestContext,
        clients: ClientService,
        timesheet: TimesheetService,
        invoices: InvoiceService,
        client_id: i64,
    }

    async fn setup() -> Fixture {
        let ctx = TestContext::new().unwrap();
        let clients = ClientService::new(ctx.db_path.clone());
        let timesheet = TimesheetService::new(ctx.db_path.clone());
        let invoices = InvoiceService::new(ctx.db_path.clone());

        let client = clients
            .create_client("Acme".to_string(), 100.0, Some(30), None, None, None, None)
            .await
            .unwrap();
        let client_id = client.id.unwrap();

        Fixture {
            _ctx: ctx,
            clients,
            timesheet,
            invoices,
            client_id,
        }
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn week_end() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 7).unwrap()
    }

    #[tokio::test]
    async fn unbilled_rejects_inverted_range() {
        let f = setup().await;
        assert!(f
            .invoices
            .get_unbilled_grouped(f.client_id, week_end(), monday())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn unbilled_groups_by_department_with_per_entry_rates() {
        let f = setup().await;

        let dept = f
            .clients
            .create_department(f.client_id, "Engineering".to_string(), Some(75.0))
            .await
            .unwrap();

        // General at client default, engineering at department rate, plus an
        // entry-level override inside engineering
        f.timesheet
            .save_entry(f.client_id, None, monday(), 1, 8.0, 0.0, None)
            .await
            .unwrap();
        f.timesheet
            .save_entry(f.client_id, dept.id, monday(), 2, 4.0, 0.0, None)
            .await
            .unwrap();
        f.timesheet
            .save_entry(f.client_id, dept.id, monday(), 3, 2.0, 90.0, None)
            .await
            .unwrap();

        let unbilled = f
            .invoices
            .get_unbilled_grouped(f.client_id, monday(), week_end())
            .await
            .unwrap();

        assert_eq!(unbilled.total_hours, 14.0);
        // 8*100 + 4*75 + 2*90 = 1280
        assert_eq!(unbilled.total_amount, 1280.0);
        assert_eq!(unbilled.groups.len(), 2);

        // Ordered by department name: Engineering before General
        assert_eq!(unbilled.groups[0].department_name, "Engineering");
        assert_eq!(unbilled.groups[0].total_hours, 6.0);
        assert_eq!(unbilled.groups[0].total_amount, 480.0);
        assert_eq!(unbilled.groups[0].entry_ids.len(), 2);

        assert_eq!(unbilled.groups[1].department_name, "General");
        assert_eq!(unbilled.groups[1].total_hours, 8.0);
        assert_eq!(unbilled.groups[1].billing_rate, 100.0);
    }

    #[tokio::test]
    async fn date_range_is_calendar_based_and_inclusive() {
        let f = setup().await;

        // Day 7 of the week anchored 2024-01-01 falls on 2024-01-07
        f.timesheet
            .save_entry(f.client_id, None, monday(), 7, 3.0, 0.0, None)
            .await
            .unwrap();

        let inside = f
            .invoices
            .get_unbilled_grouped(f.client_id, week_end(), week_end())
            .await
            .unwrap();
        assert_eq!(inside.total_hours, 3.0);

        let before = f
            .invoices
            .get_unbilled_grouped(
                f.client_id,
                monday(),
                NaiveDate::from_ymd_opt(2024, 1, 6).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(before.total_hours, 0.0);
    }

    #[tokio::test]
    async fn invoice_lifecycle_scenarios() {
        let f = setup().await;

        // Scenario A: one 8-hour entry at 100/hr
        let entry_id = f
            .timesheet
            .save_entry(f.client_id, None, monday(), 1, 8.0, 100.0, None)
            .await
            .unwrap()
            .unwrap();

        let unbilled = f
            .invoices
            .get_unbilled_grouped(f.client_id, monday(), week_end())
            .await
            .unwrap();
        assert_eq!(unbilled.total_hours, 8.0);
        assert_eq!(unbilled.total_amount, 800.0);
        assert_eq!(unbilled.groups.len(), 1);
        assert_eq!(unbilled.groups[0].department_name, "General");

        // Scenario B: invoice the week
        let spec = LineItemSpec {
            department_id: None,
            description: "Week 1".to_string(),
            billing_category: "General".to_string(),
            total_hours: 8.0,
            hourly_rate: 100.0,
            entry_ids: vec![entry_id],
        };
        let invoice = f
            .invoices
            .create_invoice(
                f.client_id,
                NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
                vec![spec.clone()],
                None,
            )
            .await
            .unwrap();

        assert_eq!(invoice.invoice_number, "INV-2024-0001");
        assert_eq!(invoice.due_date, NaiveDate::from_ymd_opt(2024, 2, 7).unwrap());
        assert_eq!(invoice.status, InvoiceStatus::Draft);
        assert_eq!(invoice.total_hours, 8.0);
        assert_eq!(invoice.total_amount, 800.0);
        assert_eq!(invoice.line_items.len(), 1);
        assert_eq!(invoice.line_items[0].amount, 800.0);

        let after = f
            .invoices
            .get_unbilled_grouped(f.client_id, monday(), week_end())
            .await
            .unwrap();
        assert_eq!(after.total_hours, 0.0);
        assert!(after.groups.is_empty());

        // Scenario C: claiming the same entry again fails with a typed error
        let conflict = f
            .invoices
            .create_invoice(
                f.client_id,
                NaiveDate::from_ymd_opt(2024, 1, 9).unwrap(),
                vec![spec],
                None,
            )
            .await
            .unwrap_err();
        assert_eq!(
            conflict.downcast_ref::<DomainError>(),
            Some(&DomainError::AlreadyBilled {
                entry_ids: vec![entry_id]
            })
        );

        // Scenario D: deleting the invoice releases the entry
        f.invoices
            .delete_invoice(invoice.id.unwrap())
            .await
            .unwrap();
        let released = f
            .invoices
            .get_unbilled_grouped(f.client_id, monday(), week_end())
            .await
            .unwrap();
        assert_eq!(released.total_hours, 8.0);
    }

    #[tokio::test]
    async fn invoice_numbers_increment_within_a_year() {
        let f = setup().await;

        for day in 1..=3u8 {
            let entry = f
                .timesheet
                .save_entry(f.client_id, None, monday(), day, 8.0, 100.0, None)
                .await
                .unwrap()
                .unwrap();
            let invoice = f
                .invoices
                .create_invoice(
                    f.client_id,
                    NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
                    vec![LineItemSpec {
                        department_id: None,
                        description: format!("Day {}", day),
                        billing_category: "General".to_string(),
                        total_hours: 8.0,
                        hourly_rate: 100.0,
                        entry_ids: vec![entry],
                    }],
                    None,
                )
                .await
                .unwrap();
            assert_eq!(invoice.invoice_number, format!("INV-2024-{:04}", day));
        }
    }

    #[tokio::test]
    async fn empty_invoice_and_missing_client_are_rejected() {
        let f = setup().await;

        let empty = f
            .invoices
            .create_invoice(f.client_id, monday(), vec![], None)
            .await
            .unwrap_err();
        assert!(empty.downcast_ref::<ValidationError>().is_some());

        let missing = f
            .invoices
            .create_invoice(
                9999,
                monday(),
                vec![LineItemSpec {
                    department_id: None,
                    description: "Week".to_string(),
                    billing_category: "General".to_string(),
                    total_hours: 1.0,
                    hourly_rate: 100.0,
                    entry_ids: vec![],
                }],
                None,
            )
            .await
            .unwrap_err();
        assert_eq!(
            missing.downcast_ref::<DomainError>(),
            Some(&DomainError::not_found("Client", 9999))
        );
    }

    #[tokio::test]
    async fn claimed_entries_are_frozen_until_release() {
        let f = setup().await;

        let entry_id = f
            .timesheet
            .save_entry(f.client_id, None, monday(), 1, 8.0, 100.0, None)
            .await
            .unwrap()
            .unwrap();
        let invoice = f
            .invoices
            .create_invoice_from_unbilled(
                f.client_id,
                NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
                monday(),
                week_end(),
                None,
            )
            .await
            .unwrap();

        // Editing or deleting a claimed entry fails with the claim conflict
        let edit = f
            .timesheet
            .save_entry(f.client_id, None, monday(), 1, 4.0, 100.0, None)
            .await
            .unwrap_err();
        assert_eq!(
            edit.downcast_ref::<DomainError>(),
            Some(&DomainError::AlreadyBilled {
                entry_ids: vec![entry_id]
            })
        );
        assert!(f.timesheet.delete_entry(entry_id).await.is_err());

        // Deleting the invoice unfreezes the slot
        f.invoices
            .delete_invoice(invoice.id.unwrap())
            .await
            .unwrap();
        assert!(f
            .timesheet
            .save_entry(f.client_id, None, monday(), 1, 4.0, 100.0, None)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn status_updates_are_unguarded_setters() {
        let f = setup().await;

        let entry = f
            .timesheet
            .save_entry(f.client_id, None, monday(), 1, 8.0, 100.0, None)
            .await
            .unwrap()
            .unwrap();
        let invoice = f
            .invoices
            .create_invoice(
                f.client_id,
                monday(),
                vec![LineItemSpec {
                    department_id: None,
                    description: "Week".to_string(),
                    billing_category: "General".to_string(),
                    total_hours: 8.0,
                    hourly_rate: 100.0,
                    entry_ids: vec![entry],
                }],
                None,
            )
            .await
            .unwrap();
        let id = invoice.id.unwrap();

        // Any status may follow any other
        for status in [
            InvoiceStatus::Sent,
            InvoiceStatus::Paid,
            InvoiceStatus::Draft,
            InvoiceStatus::Overdue,
            InvoiceStatus::Cancelled,
        ] {
            f.invoices.update_status(id, status).await.unwrap();
            assert_eq!(f.invoices.get_invoice(id).await.unwrap().status, status);
        }
    }

    #[tokio::test]
    async fn list_invoices_orders_by_date_descending() {
        let f = setup().await;

        for (day, date) in [(1u8, 10u32), (2, 20), (3, 15)] {
            let entry = f
                .timesheet
                .save_entry(f.client_id, None, monday(), day, 8.0, 100.0, None)
                .await
                .unwrap()
                .unwrap();
            f.invoices
                .create_invoice(
                    f.client_id,
                    NaiveDate::from_ymd_opt(2024, 1, date).unwrap(),
                    vec![LineItemSpec {
                        department_id: None,
                        description: format!("Day {}", day),
                        billing_category: "General".to_string(),
                        total_hours: 8.0,
                        hourly_rate: 100.0,
                        entry_ids: vec![entry],
                    }],
                    None,
                )
                .await
                .unwrap();
        }

        let invoices = f.invoices.list_invoices(Some(f.client_id)).await.unwrap();
        let dates: Vec<u32> = invoices
            .iter()
            .map(|i| chrono::Datelike::day(&i.invoice_date))
            .collect();
        assert_eq!(dates, vec![20, 15, 10]);
    }
}
