use std::sync::Arc;

use tracing::{info, instrument};

use crate::auth::password::{hash_password, validate_new_password, verify_password};
use crate::config::BootstrapAdmin;
use crate::error::{AppError, AppResult};
use crate::model::attendance::SessionKind;
use crate::model::employee::{EmployeeProfile, NewEmployee};
use crate::model::role::Role;
use crate::notifier::{Notifier, StoreChange};
use crate::store::ProfileStore;
use crate::utils::clock::Clock;
use crate::utils::report_cache::ReportCache;

#[derive(Clone)]
pub struct RosterService {
    profiles: Arc<dyn ProfileStore>,
    notifier: Notifier,
    reports: ReportCache,
    clock: Arc<dyn Clock>,
}

impl RosterService {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        notifier: Notifier,
        reports: ReportCache,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            profiles,
            notifier,
            reports,
            clock,
        }
    }

    pub async fn list(&self) -> AppResult<Vec<EmployeeProfile>> {
        self.profiles.list_profiles().await
    }

    pub async fn find(&self, username: &str) -> AppResult<EmployeeProfile> {
        self.profiles
            .find_credentials(username)
            .await?
            .map(|c| c.profile)
            .ok_or_else(|| AppError::NotFound("Employee".to_string()))
    }

    #[instrument(name = "roster_create", skip(self, employee), fields(username = %employee.username))]
    pub async fn create(&self, employee: NewEmployee) -> AppResult<EmployeeProfile> {
        let employee = NewEmployee {
            username: employee.username.trim().to_lowercase(),
            display_name: employee.display_name.trim().to_string(),
            ..employee
        };
        if employee.username.is_empty() || employee.display_name.is_empty() {
            return Err(AppError::validation(
                "Username and display name must not be empty",
            ));
        }
        if employee.capabilities.is_empty() {
            return Err(AppError::validation(
                "At least one session kind is required",
            ));
        }
        validate_new_password(&employee.password)?;

        let hash = hash_password(&employee.password)?;
        let profile = self
            .profiles
            .create_profile(&employee, &hash, self.clock.now_millis())
            .await?;

        info!(employee_id = profile.id, "Employee created");
        self.reports.invalidate_all();
        self.notifier.publish(StoreChange::RosterChanged);
        Ok(profile)
    }

    /// Seeds the configured admin unless that username already exists.
    pub async fn ensure_admin(&self, admin: &BootstrapAdmin) -> AppResult<()> {
        if self.profiles.find_credentials(&admin.username).await?.is_some() {
            return Ok(());
        }
        self.create(NewEmployee {
            username: admin.username.clone(),
            display_name: admin.display_name.clone(),
            password: admin.password.clone(),
            role: Role::Admin,
            capabilities: [SessionKind::General, SessionKind::Live].into_iter().collect(),
        })
        .await?;
        info!(username = %admin.username, "Bootstrap admin created");
        Ok(())
    }

    #[instrument(name = "change_password", skip(self, current, new))]
    pub async fn change_password(&self, username: &str, current: &str, new: &str) -> AppResult<()> {
        let credentials = self
            .profiles
            .find_credentials(username)
            .await?
            .ok_or_else(|| AppError::NotFound("Employee".to_string()))?;
        verify_password(current, &credentials.password_hash)
            .map_err(|_| AppError::InvalidCredentials)?;
        validate_new_password(new)?;

        let hash = hash_password(new)?;
        self.profiles
            .update_password(username, &hash, self.clock.now_millis())
            .await?;
        info!("Password changed");
        Ok(())
    }
}
