use chrono::NaiveDate;
use timebill_cli::db::invoices::InvoiceQueries;
use timebill_cli::db::queries::{ClientQueries, DepartmentQueries, TimeEntryQueries};
use timebill_cli::error::DomainError;
use timebill_cli::models::{Client, Department, InvoiceStatus, LineItemSpec};
use timebill_cli::test_utils::with_test_db_async;

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn week_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 7).unwrap()
}

fn spec_for(entry_id: i64, hours: f64, rate: f64) -> LineItemSpec {
    LineItemSpec {
        department_id: None,
        description: "Services rendered".to_string(),
        billing_category: "General".to_string(),
        total_hours: hours,
        hourly_rate: rate,
        entry_ids: vec![entry_id],
    }
}

#[tokio::test]
async fn test_full_billing_cycle() {
    with_test_db_async(|ctx| async move {
        let conn = ctx.connection();

        // Client at $100/hr, net 30
        let client = Client::new("Acme".to_string(), 100.0);
        let client_id = ClientQueries::create(conn, &client)?;

        // 8 hours on Monday 2024-01-01
        let entry_id = TimeEntryQueries::save_entry(
            conn, client_id, None, monday(), 1, 8.0, 100.0, None,
        )?
        .expect("entry should be created");

        // The week shows the entry
        let grid = TimeEntryQueries::weekly_grid(conn, monday())?;
        assert_eq!(grid.clients.len(), 1);
        assert_eq!(grid.clients[0].departments[0].days[&1].hours, 8.0);

        // Unbilled aggregation sees 8h / $800 under General
        let unbilled = InvoiceQueries::unbilled_grouped(conn, client_id, monday(), week_end())?;
        assert_eq!(unbilled.total_hours, 8.0);
        assert_eq!(unbilled.total_amount, 800.0);
        assert_eq!(unbilled.groups.len(), 1);
        assert_eq!(unbilled.groups[0].department_name, "General");
        assert_eq!(unbilled.groups[0].entry_ids, vec![entry_id]);

        // Invoice it
        let invoice_id = InvoiceQueries::create(
            conn,
            client_id,
            NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
            &[spec_for(entry_id, 8.0, 100.0)],
            None,
            "INV",
        )?;

        let invoice = InvoiceQueries::find_by_id(conn, invoice_id)?.unwrap();
        assert_eq!(invoice.invoice_number, "INV-2024-0001");
        assert_eq!(invoice.status, InvoiceStatus::Draft);
        assert_eq!(invoice.total_amount, 800.0);
        // Net 30 from the invoice date
        assert_eq!(invoice.due_date, NaiveDate::from_ymd_opt(2024, 2, 7).unwrap());
        assert_eq!(invoice.line_items.len(), 1);
        assert_eq!(invoice.line_items[0].amount, 800.0);

        // The entry left the unbilled pool
        let after = InvoiceQueries::unbilled_grouped(conn, client_id, monday(), week_end())?;
        assert_eq!(after.total_hours, 0.0);
        assert!(after.groups.is_empty());

        // Deleting the invoice puts it back
        assert!(InvoiceQueries::delete(conn, invoice_id)?);
        let released = InvoiceQueries::unbilled_grouped(conn, client_id, monday(), week_end())?;
        assert_eq!(released.total_hours, 8.0);

        Ok(())
    })
    .await;
}

#[tokio::test]
async fn test_each_entry_billable_exactly_once() {
    with_test_db_async(|ctx| async move {
        let conn = ctx.connection();

        let client_id = ClientQueries::create(conn, &Client::new("Acme".to_string(), 100.0))?;
        let entry_id = TimeEntryQueries::save_entry(
            conn, client_id, None, monday(), 1, 8.0, 100.0, None,
        )?
        .unwrap();

        let first = InvoiceQueries::create(
            conn,
            client_id,
            monday(),
            &[spec_for(entry_id, 8.0, 100.0)],
            None,
            "INV",
        );
        assert!(first.is_ok());

        // A second claim of the same entry fails and leaves no trace
        let second = InvoiceQueries::create(
            conn,
            client_id,
            monday(),
            &[spec_for(entry_id, 8.0, 100.0)],
            None,
            "INV",
        );
        let err = second.unwrap_err();
        assert_eq!(
            err.downcast_ref::<DomainError>(),
            Some(&DomainError::AlreadyBilled {
                entry_ids: vec![entry_id]
            })
        );

        // The failed attempt did not burn an invoice number or leave a header
        let invoices = InvoiceQueries::list(conn, Some(client_id))?;
        assert_eq!(invoices.len(), 1);
        assert_eq!(invoices[0].invoice_number, "INV-2024-0001");

        Ok(())
    })
    .await;
}

#[tokio::test]
async fn test_claimed_entries_are_frozen() {
    with_test_db_async(|ctx| async move {
        let conn = ctx.connection();

        let client_id = ClientQueries::create(conn, &Client::new("Acme".to_string(), 100.0))?;
        let entry_id = TimeEntryQueries::save_entry(
            conn, client_id, None, monday(), 1, 8.0, 100.0, None,
        )?
        .unwrap();

        let invoice_id = InvoiceQueries::create(
            conn,
            client_id,
            monday(),
            &[spec_for(entry_id, 8.0, 100.0)],
            None,
            "INV",
        )?;

        // Saving over the claimed slot fails, as does deleting the entry
        let overwrite =
            TimeEntryQueries::save_entry(conn, client_id, None, monday(), 1, 4.0, 100.0, None);
        assert!(overwrite.is_err());
        assert!(TimeEntryQueries::delete(conn, entry_id).is_err());

        // The recorded hours survive untouched
        let entry = TimeEntryQueries::find_by_id(conn, entry_id)?.unwrap();
        assert_eq!(entry.hours_worked, 8.0);

        // After release the slot is editable again
        InvoiceQueries::delete(conn, invoice_id)?;
        assert!(
            TimeEntryQueries::save_entry(conn, client_id, None, monday(), 1, 4.0, 100.0, None)
                .is_ok()
        );

        Ok(())
    })
    .await;
}

#[tokio::test]
async fn test_rate_precedence_in_unbilled_amounts() {
    with_test_db_async(|ctx| async move {
        let conn = ctx.connection();

        let client_id = ClientQueries::create(conn, &Client::new("Acme".to_string(), 100.0))?;
        let dept = Department::new(client_id, "Engineering".to_string())
            .with_billing_rate(Some(75.0));
        let dept_id = DepartmentQueries::create(conn, &dept)?;

        // General at the client default
        TimeEntryQueries::save_entry(conn, client_id, None, monday(), 1, 8.0, 0.0, None)?;
        // Department rate applies without an override
        TimeEntryQueries::save_entry(conn, client_id, Some(dept_id), monday(), 2, 4.0, 0.0, None)?;
        // Entry override beats the department rate
        TimeEntryQueries::save_entry(conn, client_id, Some(dept_id), monday(), 3, 2.0, 90.0, None)?;

        let unbilled = InvoiceQueries::unbilled_grouped(conn, client_id, monday(), week_end())?;
        assert_eq!(unbilled.total_hours, 14.0);
        assert_eq!(unbilled.total_amount, 8.0 * 100.0 + 4.0 * 75.0 + 2.0 * 90.0);

        Ok(())
    })
    .await;
}

#[tokio::test]
async fn test_invoice_numbers_restart_per_year() {
    with_test_db_async(|ctx| async move {
        let conn = ctx.connection();

        let client_id = ClientQueries::create(conn, &Client::new("Acme".to_string(), 100.0))?;

        let e1 = TimeEntryQueries::save_entry(conn, client_id, None, monday(), 1, 8.0, 100.0, None)?
            .unwrap();
        let inv_2024 = InvoiceQueries::create(
            conn,
            client_id,
            NaiveDate::from_ymd_opt(2024, 12, 30).unwrap(),
            &[spec_for(e1, 8.0, 100.0)],
            None,
            "INV",
        )?;
        assert_eq!(
            InvoiceQueries::find_by_id(conn, inv_2024)?.unwrap().invoice_number,
            "INV-2024-0001"
        );

        // The first 2025 invoice starts over at 0001
        let e2 = TimeEntryQueries::save_entry(conn, client_id, None, monday(), 2, 4.0, 100.0, None)?
            .unwrap();
        let inv_2025 = InvoiceQueries::create(
            conn,
            client_id,
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            &[spec_for(e2, 4.0, 100.0)],
            None,
            "INV",
        )?;
        assert_eq!(
            InvoiceQueries::find_by_id(conn, inv_2025)?.unwrap().invoice_number,
            "INV-2025-0001"
        );

        Ok(())
    })
    .await;
}

#[tokio::test]
async fn test_invoicing_missing_entries_rolls_back() {
    with_test_db_async(|ctx| async move {
        let conn = ctx.connection();

        let client_id = ClientQueries::create(conn, &Client::new("Acme".to_string(), 100.0))?;

        // Reference an entry id that does not exist
        let result = InvoiceQueries::create(
            conn,
            client_id,
            monday(),
            &[spec_for(4242, 8.0, 100.0)],
            None,
            "INV",
        );
        assert_eq!(
            result.unwrap_err().downcast_ref::<DomainError>(),
            Some(&DomainError::not_found("TimeEntry", 4242))
        );

        // No header survived the rollback
        assert!(InvoiceQueries::list(conn, Some(client_id))?.is_empty());

        Ok(())
    })
    .await;
}

#[tokio::test]
async fn test_status_and_metadata_updates() {
    with_test_db_async(|ctx| async move {
        let conn = ctx.connection();

        let client_id = ClientQueries::create(conn, &Client::new("Acme".to_string(), 100.0))?;
        let entry_id = TimeEntryQueries::save_entry(
            conn, client_id, None, monday(), 1, 8.0, 100.0, None,
        )?
        .unwrap();
        let invoice_id = InvoiceQueries::create(
            conn,
            client_id,
            monday(),
            &[spec_for(entry_id, 8.0, 100.0)],
            None,
            "INV",
        )?;

        assert!(InvoiceQueries::update_status(conn, invoice_id, InvoiceStatus::Sent)?);
        assert!(InvoiceQueries::update_pdf_path(conn, invoice_id, "/tmp/inv.pdf")?);
        assert!(InvoiceQueries::update_notes(
            conn,
            invoice_id,
            Some("Sent by mail".to_string())
        )?);

        let invoice = InvoiceQueries::find_by_id(conn, invoice_id)?.unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Sent);
        assert_eq!(invoice.pdf_path.as_deref(), Some("/tmp/inv.pdf"));
        assert_eq!(invoice.notes.as_deref(), Some("Sent by mail"));

        // Unknown ids report nothing to update
        assert!(!InvoiceQueries::update_status(conn, 9999, InvoiceStatus::Paid)?);

        Ok(())
    })
    .await;
}

#[tokio::test]
async fn test_deactivated_client_departments_keep_history() {
    with_test_db_async(|ctx| async move {
        let conn = ctx.connection();

        let client_id = ClientQueries::create(conn, &Client::new("Acme".to_string(), 100.0))?;
        let entry_id = TimeEntryQueries::save_entry(
            conn, client_id, None, monday(), 1, 8.0, 100.0, None,
        )?
        .unwrap();

        ClientQueries::deactivate(conn, client_id)?;

        // Gone from the grid of active clients
        let grid = TimeEntryQueries::weekly_grid(conn, monday())?;
        assert!(grid.clients.is_empty());

        // But the entry itself is still there and still billable
        assert!(TimeEntryQueries::find_by_id(conn, entry_id)?.is_some());
        let unbilled = InvoiceQueries::unbilled_grouped(conn, client_id, monday(), week_end())?;
        assert_eq!(unbilled.total_hours, 8.0);

        Ok(())
    })
    .await;
}
