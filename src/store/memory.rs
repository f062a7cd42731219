//! Process-local store used for development runs and tests.

use async_trait::async_trait;
use chrono::FixedOffset;
use tokio::sync::RwLock;

use super::{
    DUPLICATE_ACTION, EventStore, ProfileStore, SettingsStore, USERNAME_TAKEN, apply_patch,
    event_dedupe_key,
};
use crate::error::{AppError, AppResult};
use crate::model::admin_log::{AdminLog, NewAdminLog};
use crate::model::announcement::Announcement;
use crate::model::attendance::{AttendanceEvent, EventPatch, NewAttendanceEvent, TimeWindow};
use crate::model::employee::{Credentials, EmployeeProfile, NewEmployee};

#[derive(Default)]
struct Inner {
    events: Vec<AttendanceEvent>,
    next_event_id: u64,
    credentials: Vec<Credentials>,
    next_profile_id: u64,
    announcement: Option<Announcement>,
    admin_logs: Vec<AdminLog>,
    next_log_id: u64,
}

impl Inner {
    fn has_duplicate(&self, candidate: &AttendanceEvent, offset: &FixedOffset) -> bool {
        let Some(key) = event_dedupe_key(candidate, offset) else {
            return false;
        };
        self.events.iter().any(|existing| {
            existing.id != candidate.id && event_dedupe_key(existing, offset).as_ref() == Some(&key)
        })
    }
}

pub struct MemoryStore {
    offset: FixedOffset,
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new(offset: FixedOffset) -> Self {
        Self {
            offset,
            inner: RwLock::new(Inner::default()),
        }
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn list_events(&self, window: Option<TimeWindow>) -> AppResult<Vec<AttendanceEvent>> {
        let inner = self.inner.read().await;
        let mut events: Vec<AttendanceEvent> = inner
            .events
            .iter()
            .filter(|e| window.is_none_or(|w| w.contains(e.occurred_at)))
            .cloned()
            .collect();
        events.sort_by_key(|e| (e.occurred_at, e.id));
        Ok(events)
    }

    async fn get_event(&self, id: u64) -> AppResult<Option<AttendanceEvent>> {
        let inner = self.inner.read().await;
        Ok(inner.events.iter().find(|e| e.id == id).cloned())
    }

    async fn append_event(&self, event: NewAttendanceEvent) -> AppResult<AttendanceEvent> {
        // Check and insert under one write guard.
        let mut inner = self.inner.write().await;
        let event = event.into_event(inner.next_event_id + 1);
        if inner.has_duplicate(&event, &self.offset) {
            return Err(AppError::validation(DUPLICATE_ACTION));
        }
        inner.next_event_id = event.id;
        inner.events.push(event.clone());
        Ok(event)
    }

    async fn update_event(&self, id: u64, patch: EventPatch) -> AppResult<AttendanceEvent> {
        let mut inner = self.inner.write().await;
        let position = inner
            .events
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| AppError::NotFound("Attendance log".to_string()))?;

        let mut updated = inner.events[position].clone();
        apply_patch(&mut updated, patch, &self.offset)?;
        if inner.has_duplicate(&updated, &self.offset) {
            return Err(AppError::validation(DUPLICATE_ACTION));
        }
        inner.events[position] = updated.clone();
        Ok(updated)
    }

    async fn delete_event(&self, id: u64) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        let before = inner.events.len();
        inner.events.retain(|e| e.id != id);
        if inner.events.len() == before {
            return Err(AppError::NotFound("Attendance log".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn find_credentials(&self, username: &str) -> AppResult<Option<Credentials>> {
        let inner = self.inner.read().await;
        Ok(inner
            .credentials
            .iter()
            .find(|c| c.profile.username.eq_ignore_ascii_case(username))
            .cloned())
    }

    async fn list_profiles(&self) -> AppResult<Vec<EmployeeProfile>> {
        let inner = self.inner.read().await;
        Ok(inner.credentials.iter().map(|c| c.profile.clone()).collect())
    }

    async fn create_profile(
        &self,
        employee: &NewEmployee,
        password_hash: &str,
        created_at: i64,
    ) -> AppResult<EmployeeProfile> {
        let mut inner = self.inner.write().await;
        let taken = inner.credentials.iter().any(|c| {
            c.profile.username.eq_ignore_ascii_case(&employee.username)
                || c.profile.display_name == employee.display_name
        });
        if taken {
            return Err(AppError::validation(USERNAME_TAKEN));
        }

        inner.next_profile_id += 1;
        let profile = EmployeeProfile {
            id: inner.next_profile_id,
            username: employee.username.clone(),
            display_name: employee.display_name.clone(),
            role: employee.role,
            capabilities: employee.capabilities.clone(),
        };
        inner.credentials.push(Credentials {
            profile: profile.clone(),
            password_hash: password_hash.to_string(),
            last_updated: created_at,
        });
        Ok(profile)
    }

    async fn update_password(
        &self,
        username: &str,
        password_hash: &str,
        updated_at: i64,
    ) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        let record = inner
            .credentials
            .iter_mut()
            .find(|c| c.profile.username.eq_ignore_ascii_case(username))
            .ok_or_else(|| AppError::NotFound("Employee".to_string()))?;
        record.password_hash = password_hash.to_string();
        record.last_updated = updated_at;
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn announcement(&self) -> AppResult<Option<Announcement>> {
        Ok(self.inner.read().await.announcement.clone())
    }

    async fn put_announcement(&self, announcement: Announcement) -> AppResult<Announcement> {
        self.inner.write().await.announcement = Some(announcement.clone());
        Ok(announcement)
    }

    async fn append_admin_log(&self, entry: NewAdminLog) -> AppResult<AdminLog> {
        let mut inner = self.inner.write().await;
        inner.next_log_id += 1;
        let log = AdminLog {
            id: inner.next_log_id,
            admin: entry.admin,
            action: entry.action,
            occurred_at: entry.occurred_at,
        };
        inner.admin_logs.push(log.clone());
        Ok(log)
    }

    async fn list_admin_logs(&self, limit: u32) -> AppResult<Vec<AdminLog>> {
        let inner = self.inner.read().await;
        let mut logs = inner.admin_logs.clone();
        logs.sort_by(|a, b| (b.occurred_at, b.id).cmp(&(a.occurred_at, a.id)));
        logs.truncate(limit as usize);
        Ok(logs)
    }
}
