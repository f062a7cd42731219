use std::sync::Arc;

use chrono::FixedOffset;

use crate::auth::identity::{CredentialResolver, IdentityResolver};
use crate::config::Config;
use crate::notifier::{Notifier, Subscription};
use crate::service::{AttendancePolicy, AttendanceService, BoardService, ReportService, RosterService};
use crate::store::{EventStore, ProfileStore, SettingsStore};
use crate::utils::clock::Clock;
use crate::utils::report_cache::ReportCache;

const NOTIFIER_CAPACITY: usize = 256;

/// Shared by every worker through `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub attendance: AttendanceService,
    pub reports: ReportService,
    pub roster: RosterService,
    pub board: BoardService,
    pub identity: Arc<dyn IdentityResolver>,
    pub notifier: Notifier,
    pub offset: FixedOffset,
}

impl AppState {
    pub fn from_store<S>(store: Arc<S>, clock: Arc<dyn Clock>, config: &Config) -> Self
    where
        S: EventStore + ProfileStore + SettingsStore + 'static,
    {
        let events: Arc<dyn EventStore> = store.clone();
        let profiles: Arc<dyn ProfileStore> = store.clone();
        let settings: Arc<dyn SettingsStore> = store;
        let notifier = Notifier::new(NOTIFIER_CAPACITY);
        let cache = ReportCache::default();

        Self {
            attendance: AttendanceService::new(
                events.clone(),
                profiles.clone(),
                settings.clone(),
                notifier.clone(),
                cache.clone(),
                clock.clone(),
                AttendancePolicy::from_config(config),
            ),
            reports: ReportService::new(
                events,
                profiles.clone(),
                cache.clone(),
                clock.clone(),
                config.utc_offset,
                config.live_hourly_rate,
            ),
            roster: RosterService::new(profiles.clone(), notifier.clone(), cache, clock.clone()),
            board: BoardService::new(settings, notifier.clone(), clock),
            identity: Arc::new(CredentialResolver::new(profiles)),
            notifier,
            offset: config.utc_offset,
        }
    }

    /// Drops cached reports on every store change. The write paths already
    /// clear the cache before publishing; this catches changes made by other
    /// publishers. Keep the handle alive for as long as the state serves
    /// requests.
    pub fn watch_store(&self) -> Subscription {
        let reports = self.reports.clone();
        self.notifier.subscribe(move |_| reports.invalidate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{at, wib};
    use crate::model::attendance::{AttendanceAction, NewAttendanceEvent, SessionKind};
    use crate::model::employee::NewEmployee;
    use crate::model::role::Role;
    use crate::notifier::StoreChange;
    use crate::store::MemoryStore;
    use crate::utils::clock::FixedClock;
    use std::collections::{BTreeSet, HashMap};
    use std::time::Duration;

    async fn state_with(store: Arc<MemoryStore>) -> AppState {
        let vars = HashMap::from([("JWT_SECRET", "test-secret"), ("UTC_OFFSET", "+07:00")]);
        let config = Config::from_lookup(|key: &str| vars.get(key).map(|v| v.to_string())).unwrap();
        let state = AppState::from_store(store, Arc::new(FixedClock::at(at(14, "08:00"))), &config);
        state
            .roster
            .create(NewEmployee {
                username: "dina".into(),
                display_name: "Dina".into(),
                password: "rahasia123".into(),
                role: Role::Staff,
                capabilities: BTreeSet::from([SessionKind::General]),
            })
            .await
            .unwrap();
        state
    }

    #[tokio::test]
    async fn report_is_fresh_right_after_a_write() {
        let state = state_with(Arc::new(MemoryStore::new(wib()))).await;
        let _watch = state.watch_store();
        let period = state.reports.current_period().unwrap();
        assert_eq!(state.reports.monthly(period).await.unwrap()["Dina"].present_days, 0);

        state
            .attendance
            .record("dina", SessionKind::General, AttendanceAction::ClockIn, None)
            .await
            .unwrap();
        assert_eq!(state.reports.monthly(period).await.unwrap()["Dina"].present_days, 1);
    }

    #[tokio::test]
    async fn new_employees_appear_in_the_next_report() {
        let state = state_with(Arc::new(MemoryStore::new(wib()))).await;
        let period = state.reports.current_period().unwrap();
        assert_eq!(state.reports.monthly(period).await.unwrap().len(), 1);

        state
            .roster
            .create(NewEmployee {
                username: "rudi".into(),
                display_name: "Rudi".into(),
                password: "rahasia123".into(),
                role: Role::Staff,
                capabilities: BTreeSet::from([SessionKind::Live]),
            })
            .await
            .unwrap();
        assert!(state.reports.monthly(period).await.unwrap().contains_key("Rudi"));
    }

    #[tokio::test]
    async fn watched_store_drops_reports_on_outside_changes() {
        let store = Arc::new(MemoryStore::new(wib()));
        let state = state_with(store.clone()).await;
        let _watch = state.watch_store();
        let period = state.reports.current_period().unwrap();
        let stale = state.reports.monthly(period).await.unwrap();

        // Written behind the services' back, then announced.
        store
            .append_event(NewAttendanceEvent {
                employee_name: "Dina".into(),
                session_kind: SessionKind::General,
                action: AttendanceAction::ClockIn,
                note: None,
                occurred_at: at(14, "07:00"),
                month_index: 9,
            })
            .await
            .unwrap();
        state.notifier.publish(StoreChange::Resync);

        let mut present = 0;
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let report = state.reports.monthly(period).await.unwrap();
            if !Arc::ptr_eq(&report, &stale) {
                present = report["Dina"].present_days;
                break;
            }
        }
        assert_eq!(present, 1);
    }
}
