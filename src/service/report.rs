//! Read path: monthly and daily reports over the event store.

use std::sync::Arc;

use chrono::{Datelike, FixedOffset, NaiveDate};
use tracing::debug;

use crate::engine::calendar::{local_date, month_window};
use crate::engine::{AggregationContext, aggregate_month, daily_summaries};
use crate::error::{AppError, AppResult};
use crate::model::attendance::TimeWindow;
use crate::model::summary::DailySummary;
use crate::store::{EventStore, ProfileStore};
use crate::utils::clock::Clock;
use crate::utils::report_cache::{MonthlyReport, ReportCache, ReportKey};

/// A calendar month; `month_index` is 0-based like the stored events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub year: i32,
    pub month_index: u32,
}

impl Period {
    /// From a 1-based month as written by people.
    pub fn from_calendar(year: i32, month: u32) -> AppResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(AppError::validation("month must be between 1 and 12"));
        }
        Ok(Self {
            year,
            month_index: month - 1,
        })
    }
}

#[derive(Clone)]
pub struct ReportService {
    events: Arc<dyn EventStore>,
    profiles: Arc<dyn ProfileStore>,
    cache: ReportCache,
    clock: Arc<dyn Clock>,
    offset: FixedOffset,
    hourly_rate: f64,
}

impl ReportService {
    pub fn new(
        events: Arc<dyn EventStore>,
        profiles: Arc<dyn ProfileStore>,
        cache: ReportCache,
        clock: Arc<dyn Clock>,
        offset: FixedOffset,
        hourly_rate: f64,
    ) -> Self {
        Self {
            events,
            profiles,
            cache,
            clock,
            offset,
            hourly_rate,
        }
    }

    pub fn today(&self) -> AppResult<NaiveDate> {
        local_date(self.clock.now_millis(), &self.offset)
            .ok_or_else(|| AppError::Internal("clock out of range".to_string()))
    }

    pub fn current_period(&self) -> AppResult<Period> {
        let today = self.today()?;
        Ok(Period {
            year: today.year(),
            month_index: today.month0(),
        })
    }

    /// Every roster member's summary for `period`, keyed by display name.
    pub async fn monthly(&self, period: Period) -> AppResult<MonthlyReport> {
        let today = self.today()?;
        let key = ReportKey {
            year: period.year,
            month_index: period.month_index,
            today,
        };
        if let Some(report) = self.cache.get(&key).await {
            debug!(?key, "Monthly report served from cache");
            return Ok(report);
        }

        let generation = self.cache.generation();
        let window = self.window(period)?;
        let (events, roster) = futures::try_join!(
            self.events.list_events(Some(window)),
            self.profiles.list_profiles()
        )?;

        let ctx = AggregationContext::new(today, self.offset).with_hourly_rate(self.hourly_rate);
        let report: MonthlyReport =
            Arc::new(aggregate_month(&events, period.month_index, &roster, &ctx));
        if !self.cache.insert_if_current(key, report.clone(), generation).await {
            debug!(?key, "Store changed during aggregation, report not cached");
        }
        Ok(report)
    }

    pub async fn daily(&self, period: Period, employee_name: &str) -> AppResult<Vec<DailySummary>> {
        let window = self.window(period)?;
        let events = self.events.list_events(Some(window)).await?;
        Ok(daily_summaries(
            &events,
            employee_name,
            period.month_index,
            &self.offset,
        ))
    }

    pub fn invalidate(&self) {
        self.cache.invalidate_all();
    }

    fn window(&self, period: Period) -> AppResult<TimeWindow> {
        month_window(period.year, period.month_index, &self.offset)
            .ok_or_else(|| AppError::validation("Unsupported year or month"))
    }
}
