use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::db::queries::{ClientQueries, DepartmentQueries};
use crate::db::Database;
use crate::error::DomainError;
use crate::models::{Client, ClientUpdate, Department, DepartmentUpdate};
use crate::utils::validation::{
    validate_client_name, validate_department_name, validate_id, validate_payment_terms,
    validate_rate,
};

/// Client and department directory operations. Holds the database path
/// explicitly; every call opens a scoped connection in a blocking task.
#[derive(Clone)]
pub struct ClientService {
    db_path: PathBuf,
}

impl ClientService {
    pub fn new(db_path: PathBuf) -> Self {
        Self { db_path }
    }

    pub async fn create_client(
        &self,
        name: String,
        default_rate: f64,
        payment_terms: Option<i64>,
        contact_name: Option<String>,
        contact_email: Option<String>,
        contact_phone: Option<String>,
        billing_address: Option<String>,
    ) -> Result<Client> {
        let validated_name = validate_client_name(&name).context("Invalid client name")?;
        let validated_rate = validate_rate(default_rate).context("Invalid default rate")?;
        let validated_terms =
            validate_payment_terms(payment_terms.unwrap_or(30)).context("Invalid payment terms")?;

        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || -> Result<Client> {
            let db = Database::new(&db_path)?;

            let mut client = Client::new(validated_name, validated_rate)
                .with_payment_terms(validated_terms)
                .with_contact(contact_name, contact_email, contact_phone)
                .with_billing_address(billing_address);

            let client_id = ClientQueries::create(&db.connection, &client)?;
            client.id = Some(client_id);

            log::info!("Created client '{}' ({})", client.name, client_id);
            Ok(client)
        })
        .await?
    }

    pub async fn list_clients(&self, include_inactive: bool) -> Result<Vec<Client>> {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<Client>> {
            let db = Database::new(&db_path)?;
            ClientQueries::list(&db.connection, !include_inactive)
        })
        .await?
    }

    pub async fn get_client(&self, client_id: i64) -> Result<Client> {
        let validated_id = validate_id("client_id", client_id)?;

        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || -> Result<Client> {
            let db = Database::new(&db_path)?;
            ClientQueries::find_by_id(&db.connection, validated_id)?
                .ok_or_else(|| DomainError::not_found("Client", validated_id).into())
        })
        .await?
    }

    pub async fn update_client(&self, client_id: i64, update: ClientUpdate) -> Result<bool> {
        let validated_id = validate_id("client_id", client_id)?;

        // Re-validate supplied fields against entity invariants
        if let Some(name) = &update.name {
            validate_client_name(name).context("Invalid client name")?;
        }
        if let Some(rate) = update.default_rate {
            validate_rate(rate).context("Invalid default rate")?;
        }
        if let Some(terms) = update.payment_terms {
            validate_payment_terms(terms).context("Invalid payment terms")?;
        }

        if update.is_empty() {
            return Ok(false);
        }

        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || -> Result<bool> {
            let db = Database::new(&db_path)?;
            let updated = ClientQueries::update(&db.connection, validated_id, &update)?;
            if !updated {
                return Err(DomainError::not_found("Client", validated_id).into());
            }
            Ok(updated)
        })
        .await?
    }

    /// Soft delete. Historical entries and invoices stay addressable.
    pub async fn deactivate_client(&self, client_id: i64) -> Result<bool> {
        let validated_id = validate_id("client_id", client_id)?;

        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || -> Result<bool> {
            let db = Database::new(&db_path)?;
            let deactivated = ClientQueries::deactivate(&db.connection, validated_id)?;
            if !deactivated {
                return Err(DomainError::not_found("Client", validated_id).into());
            }
            Ok(deactivated)
        })
        .await?
    }

    pub async fn create_department(
        &self,
        client_id: i64,
        name: String,
        billing_rate: Option<f64>,
    ) -> Result<Department> {
        let validated_client = validate_id("client_id", client_id)?;
        let validated_name = validate_department_name(&name).context("Invalid department name")?;
        if let Some(rate) = billing_rate {
            validate_rate(rate).context("Invalid billing rate")?;
        }

        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || -> Result<Department> {
            let db = Database::new(&db_path)?;

            if ClientQueries::find_by_id(&db.connection, validated_client)?.is_none() {
                return Err(DomainError::not_found("Client", validated_client).into());
            }

            let mut department =
                Department::new(validated_client, validated_name).with_billing_rate(billing_rate);
            let department_id = DepartmentQueries::create(&db.connection, &department)?;
            department.id = Some(department_id);

            log::info!(
                "Created department '{}' ({}) for client {}",
                department.name,
                department_id,
                validated_client
            );
            Ok(department)
        })
        .await?
    }

    pub async fn list_departments(
        &self,
        client_id: i64,
        include_inactive: bool,
    ) -> Result<Vec<Department>> {
        let validated_client = validate_id("client_id", client_id)?;

        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<Department>> {
            let db = Database::new(&db_path)?;
            DepartmentQueries::list_for_client(&db.connection, validated_client, !include_inactive)
        })
        .await?
    }

    pub async fn update_department(
        &self,
        department_id: i64,
        update: DepartmentUpdate,
    ) -> Result<bool> {
        let validated_id = validate_id("department_id", department_id)?;

        if let Some(name) = &update.name {
            validate_department_name(name).context("Invalid department name")?;
        }
        if let Some(rate) = update.billing_rate {
            validate_rate(rate).context("Invalid billing rate")?;
        }

        if update.is_empty() {
            return Ok(false);
        }

        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || -> Result<bool> {
            let db = Database::new(&db_path)?;
            let updated = DepartmentQueries::update(&db.connection, validated_id, &update)?;
            if !updated {
                return Err(DomainError::not_found("Department", validated_id).into());
            }
            Ok(updated)
        })
        .await?
    }

    pub async fn deactivate_department(&self, department_id: i64) -> Result<bool> {
        let validated_id = validate_id("department_id", department_id)?;

        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || -> Result<bool> {
            let db = Database::new(&db_path)?;
            let deactivated = DepartmentQueries::deactivate(&db.connection, validated_id)?;
            if !deactivated {
                return Err(DomainError::not_found("Department", validated_id).into());
            }
            Ok(deactivated)
        })
        .await?
    }
}
