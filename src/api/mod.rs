pub mod admin;
pub mod announcement;
pub mod attendance;
pub mod employee;
pub mod stream;
pub mod summary;


use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::AppResult;
use crate::model::attendance::SessionKind;
use crate::service::Period;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PeriodQuery {
    /// Calendar month 1-12, defaults to the current month
    pub month: Option<u32>,
    /// Defaults to the current year
    pub year: Option<i32>,
    /// Display name; staff may only pass their own
    pub employee: Option<String>,
    /// Only logs of this session kind
    pub session: Option<SessionKind>,
}

impl PeriodQuery {
    pub fn period(&self, state: &AppState) -> AppResult<Period> {
        let current = state.reports.current_period()?;
        Period::from_calendar(
            self.year.unwrap_or(current.year),
            self.month.unwrap_or(current.month_index + 1),
        )
    }
}
