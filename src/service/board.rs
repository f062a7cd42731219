//! Announcement board and the admin audit trail.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::error::{AppError, AppResult};
use crate::model::admin_log::{AdminLog, NewAdminLog};
use crate::model::announcement::Announcement;
use crate::notifier::{Notifier, StoreChange};
use crate::store::SettingsStore;
use crate::utils::clock::Clock;

pub const ADMIN_LOG_LIMIT: u32 = 100;

#[derive(Clone)]
pub struct BoardService {
    settings: Arc<dyn SettingsStore>,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
}

impl BoardService {
    pub fn new(settings: Arc<dyn SettingsStore>, notifier: Notifier, clock: Arc<dyn Clock>) -> Self {
        Self {
            settings,
            notifier,
            clock,
        }
    }

    pub async fn announcement(&self) -> AppResult<Option<Announcement>> {
        self.settings.announcement().await
    }

    #[instrument(name = "announcement_update", skip(self, text))]
    pub async fn update_announcement(&self, admin_name: &str, text: &str) -> AppResult<Announcement> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::validation("Announcement text must not be empty"));
        }

        let now = self.clock.now_millis();
        let announcement = self
            .settings
            .put_announcement(Announcement {
                text: text.to_string(),
                updated_by: admin_name.to_string(),
                updated_at: now,
            })
            .await?;

        let entry = NewAdminLog {
            admin: admin_name.to_string(),
            action: "Updated the announcement".to_string(),
            occurred_at: now,
        };
        if let Err(e) = self.settings.append_admin_log(entry).await {
            warn!(error = %e, "Failed to write admin log");
        }

        info!("Announcement updated");
        self.notifier.publish(StoreChange::AnnouncementUpdated);
        Ok(announcement)
    }

    /// Newest first, at most `limit` (capped at [`ADMIN_LOG_LIMIT`]).
    pub async fn admin_logs(&self, limit: Option<u32>) -> AppResult<Vec<AdminLog>> {
        let limit = limit.unwrap_or(ADMIN_LOG_LIMIT).clamp(1, ADMIN_LOG_LIMIT);
        self.settings.list_admin_logs(limit).await
    }
}
