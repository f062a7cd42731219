//! Write path for attendance events.

use std::sync::Arc;

use chrono::{FixedOffset, NaiveTime};
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::engine::calendar::{day_window, local_date, local_time, month_index_of};
use crate::error::{AppError, AppResult};
use crate::model::admin_log::NewAdminLog;
use crate::model::attendance::{
    AttendanceAction, AttendanceEvent, EventPatch, NewAttendanceEvent, SessionKind, TimeWindow,
};
use crate::model::employee::EmployeeProfile;
use crate::notifier::{Notifier, StoreChange};
use crate::store::{DUPLICATE_ACTION, EventStore, ProfileStore, SettingsStore};
use crate::utils::clock::Clock;
use crate::utils::report_cache::ReportCache;

#[derive(Debug, Clone, Copy)]
pub struct AttendancePolicy {
    pub offset: FixedOffset,
    pub clock_in_opens: NaiveTime,
    pub clock_in_closes: NaiveTime,
}

impl AttendancePolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            offset: config.utc_offset,
            clock_in_opens: config.clock_in_opens,
            clock_in_closes: config.clock_in_closes,
        }
    }

    /// Rules that need nothing but the request itself.
    pub fn check(
        &self,
        profile: &EmployeeProfile,
        kind: SessionKind,
        action: AttendanceAction,
        note: Option<&str>,
        now_millis: i64,
    ) -> AppResult<()> {
        if !profile.can_attend(kind) {
            return Err(AppError::validation(format!(
                "{} is not registered for {kind} sessions",
                profile.display_name
            )));
        }

        if action.requires_note() && note.is_none() {
            return Err(AppError::validation(
                "A reason is required for leave and sick requests",
            ));
        }

        if kind == SessionKind::General
            && action == AttendanceAction::ClockIn
            && !profile.role.is_admin()
        {
            let time = local_time(now_millis, &self.offset)
                .ok_or_else(|| AppError::Internal("clock out of range".to_string()))?;
            if time < self.clock_in_opens || time >= self.clock_in_closes {
                return Err(AppError::validation(format!(
                    "Clock-in is open from {} to {}",
                    self.clock_in_opens.format("%H:%M"),
                    self.clock_in_closes.format("%H:%M")
                )));
            }
        }

        Ok(())
    }
}

/// Same-day rules, checked against what the employee already recorded today
/// for this session kind. The store enforces the duplicate rule again on
/// insert.
pub fn check_against_today(todays: &[AttendanceEvent], action: AttendanceAction) -> AppResult<()> {
    if action.is_once_per_day() && todays.iter().any(|e| e.action == action) {
        return Err(AppError::validation(DUPLICATE_ACTION));
    }
    if action == AttendanceAction::ClockOut
        && !todays.iter().any(|e| e.action == AttendanceAction::ClockIn)
    {
        return Err(AppError::validation("Clock in before clocking out"));
    }
    Ok(())
}

fn normalize_note(note: Option<String>) -> Option<String> {
    note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

#[derive(Clone)]
pub struct AttendanceService {
    events: Arc<dyn EventStore>,
    profiles: Arc<dyn ProfileStore>,
    settings: Arc<dyn SettingsStore>,
    notifier: Notifier,
    reports: ReportCache,
    clock: Arc<dyn Clock>,
    policy: AttendancePolicy,
}

impl AttendanceService {
    pub fn new(
        events: Arc<dyn EventStore>,
        profiles: Arc<dyn ProfileStore>,
        settings: Arc<dyn SettingsStore>,
        notifier: Notifier,
        reports: ReportCache,
        clock: Arc<dyn Clock>,
        policy: AttendancePolicy,
    ) -> Self {
        Self {
            events,
            profiles,
            settings,
            notifier,
            reports,
            clock,
            policy,
        }
    }

    /// Records an action for `username` at the current time.
    #[instrument(name = "attendance_record", skip(self, note), fields(%kind, %action))]
    pub async fn record(
        &self,
        username: &str,
        kind: SessionKind,
        action: AttendanceAction,
        note: Option<String>,
    ) -> AppResult<AttendanceEvent> {
        let profile = self
            .profiles
            .find_credentials(username)
            .await?
            .map(|c| c.profile)
            .ok_or_else(|| AppError::NotFound("Employee".to_string()))?;

        let now = self.clock.now_millis();
        let note = normalize_note(note);
        self.policy.check(&profile, kind, action, note.as_deref(), now)?;

        let offset = self.policy.offset;
        let today = local_date(now, &offset)
            .and_then(|d| day_window(d, &offset))
            .ok_or_else(|| AppError::Internal("clock out of range".to_string()))?;
        let todays: Vec<AttendanceEvent> = self
            .events
            .list_events(Some(today))
            .await?
            .into_iter()
            .filter(|e| e.employee_name == profile.display_name && e.session_kind == kind)
            .collect();
        check_against_today(&todays, action)?;

        let month_index = month_index_of(now, &offset)
            .ok_or_else(|| AppError::Internal("clock out of range".to_string()))?;
        let event = self
            .events
            .append_event(NewAttendanceEvent {
                employee_name: profile.display_name.clone(),
                session_kind: kind,
                action,
                note,
                occurred_at: now,
                month_index,
            })
            .await?;

        info!(event_id = event.id, employee = %event.employee_name, "Attendance recorded");
        self.reports.invalidate_all();
        self.notifier
            .publish(StoreChange::EventAppended { id: event.id });
        Ok(event)
    }

    /// Oldest first, optionally narrowed to one employee.
    pub async fn list(
        &self,
        window: Option<TimeWindow>,
        employee_name: Option<&str>,
    ) -> AppResult<Vec<AttendanceEvent>> {
        let events = self.events.list_events(window).await?;
        Ok(match employee_name {
            Some(name) => events.into_iter().filter(|e| e.employee_name == name).collect(),
            None => events,
        })
    }

    #[instrument(name = "attendance_edit", skip(self, patch))]
    pub async fn edit(
        &self,
        admin_name: &str,
        id: u64,
        patch: EventPatch,
    ) -> AppResult<AttendanceEvent> {
        if patch.is_empty() {
            return Err(AppError::validation("No fields provided for update"));
        }
        let updated = self.events.update_event(id, patch).await?;

        info!(event_id = id, "Attendance log edited");
        self.admin_log(
            admin_name,
            format!(
                "Edited log #{id} of {} ({} {})",
                updated.employee_name, updated.session_kind, updated.action
            ),
        )
        .await;
        self.reports.invalidate_all();
        self.notifier.publish(StoreChange::EventUpdated { id });
        Ok(updated)
    }

    #[instrument(name = "attendance_delete", skip(self))]
    pub async fn delete(&self, admin_name: &str, id: u64) -> AppResult<()> {
        let existing = self
            .events
            .get_event(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Attendance log".to_string()))?;
        self.events.delete_event(id).await?;

        info!(event_id = id, "Attendance log deleted");
        self.admin_log(
            admin_name,
            format!(
                "Deleted log #{id} of {} ({} {})",
                existing.employee_name, existing.session_kind, existing.action
            ),
        )
        .await;
        self.reports.invalidate_all();
        self.notifier.publish(StoreChange::EventDeleted { id });
        Ok(())
    }

    /// The mutation already happened, so a failed audit write only warns.
    async fn admin_log(&self, admin_name: &str, action: String) {
        let entry = NewAdminLog {
            admin: admin_name.to_string(),
            action,
            occurred_at: self.clock.now_millis(),
        };
        if let Err(e) = self.settings.append_admin_log(entry).await {
            warn!(error = %e, "Failed to write admin log");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{at, event, profile, wib};
    use crate::model::attendance::AttendanceAction::{ClockIn, ClockOut, LeaveRequest};
    use crate::model::attendance::SessionKind::{General, Live};
    use crate::model::employee::NewEmployee;
    use crate::model::role::Role;
    use crate::store::MemoryStore;
    use crate::utils::clock::FixedClock;
    use rstest::rstest;
    use std::collections::BTreeSet;

    fn policy() -> AttendancePolicy {
        AttendancePolicy {
            offset: wib(),
            clock_in_opens: NaiveTime::from_hms_opt(5, 0, 0).unwrap(),
            clock_in_closes: NaiveTime::from_hms_opt(21, 0, 0).unwrap(),
        }
    }

    #[rstest]
    #[case(Role::Staff, "04:59", false)]
    #[case(Role::Staff, "05:00", true)]
    #[case(Role::Staff, "21:00", false)]
    #[case(Role::Admin, "23:30", true)]
    fn general_clock_in_window(#[case] role: Role, #[case] hhmm: &str, #[case] allowed: bool) {
        let mut who = profile(1, "Dina");
        who.role = role;
        let result = policy().check(&who, General, ClockIn, None, at(14, hhmm));
        assert_eq!(result.is_ok(), allowed);
    }

    #[test]
    fn live_clock_in_ignores_window() {
        assert!(policy().check(&profile(1, "Dina"), Live, ClockIn, None, at(14, "23:00")).is_ok());
    }

    #[test]
    fn capability_is_required() {
        let mut who = profile(1, "Dina");
        who.capabilities = BTreeSet::from([General]);
        let err = policy().check(&who, Live, ClockIn, None, at(14, "10:00")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn leave_needs_a_reason() {
        let who = profile(1, "Dina");
        assert!(policy().check(&who, General, LeaveRequest, None, at(14, "10:00")).is_err());
        assert!(
            policy()
                .check(&who, General, LeaveRequest, Some("acara keluarga"), at(14, "10:00"))
                .is_ok()
        );
    }

    #[test]
    fn same_day_rules() {
        let clock_in = event(1, "Dina", General, ClockIn, at(14, "08:00"));
        assert!(check_against_today(&[], ClockOut).is_err());
        assert!(check_against_today(&[], ClockIn).is_ok());
        assert!(check_against_today(&[clock_in.clone()], ClockIn).is_err());
        assert!(check_against_today(&[clock_in], ClockOut).is_ok());
    }

    struct Harness {
        service: AttendanceService,
        store: Arc<MemoryStore>,
        clock: Arc<FixedClock>,
    }

    async fn harness() -> Harness {
        let store = Arc::new(MemoryStore::new(wib()));
        let employee = NewEmployee {
            username: "dina".into(),
            display_name: "Dina".into(),
            password: String::new(),
            role: Role::Staff,
            capabilities: BTreeSet::from([General, Live]),
        };
        store.create_profile(&employee, "hash", 0).await.unwrap();
        let clock = Arc::new(FixedClock::at(at(14, "08:00")));
        let service = AttendanceService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            Notifier::new(16),
            ReportCache::default(),
            clock.clone(),
            policy(),
        );
        Harness { service, store, clock }
    }

    #[tokio::test]
    async fn records_with_derived_month_and_publishes() {
        let h = harness().await;
        let mut changes = h.service.notifier.receiver();

        let recorded = h.service.record("dina", General, ClockIn, Some("  ".into())).await.unwrap();
        assert_eq!(recorded.employee_name, "Dina");
        assert_eq!(recorded.month_index, 9);
        assert_eq!(recorded.occurred_at, at(14, "08:00"));
        assert!(recorded.note.is_none());
        assert_eq!(
            changes.recv().await.ok(),
            Some(StoreChange::EventAppended { id: recorded.id })
        );
    }

    #[tokio::test]
    async fn rejects_duplicate_and_orphan_clock_out() {
        let h = harness().await;
        assert!(h.service.record("dina", Live, ClockOut, None).await.is_err());

        h.service.record("dina", Live, ClockIn, None).await.unwrap();
        h.clock.set(at(14, "09:00"));
        let err = h.service.record("dina", Live, ClockIn, None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        h.clock.set(at(14, "12:00"));
        h.service.record("dina", Live, ClockOut, None).await.unwrap();
        assert_eq!(h.store.list_events(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn admin_edit_and_delete_are_logged() {
        let h = harness().await;
        let recorded = h.service.record("dina", General, ClockIn, None).await.unwrap();

        let patch = EventPatch {
            occurred_at: Some(at(14, "07:30")),
            ..EventPatch::default()
        };
        let edited = h.service.edit("Admin", recorded.id, patch).await.unwrap();
        assert!(edited.is_edited);

        h.service.delete("Admin", recorded.id).await.unwrap();
        assert!(h.store.list_events(None).await.unwrap().is_empty());

        let logs = h.store.list_admin_logs(10).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert!(logs.iter().all(|l| l.admin == "Admin"));
        assert!(matches!(
            h.service.delete("Admin", recorded.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn empty_patch_is_rejected() {
        let h = harness().await;
        let err = h.service.edit("Admin", 1, EventPatch::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn list_narrows_to_employee() {
        let h = harness().await;
        h.store
            .append_event(NewAttendanceEvent {
                employee_name: "Rudi".into(),
                session_kind: General,
                action: ClockIn,
                note: None,
                occurred_at: at(13, "08:00"),
                month_index: 9,
            })
            .await
            .unwrap();
        h.service.record("dina", General, ClockIn, None).await.unwrap();
        assert_eq!(h.service.list(None, None).await.unwrap().len(), 2);
        assert_eq!(h.service.list(None, Some("Dina")).await.unwrap().len(), 1);
    }
}
