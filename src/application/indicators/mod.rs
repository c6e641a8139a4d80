// Built-in dashboard indicators
pub mod issue_backlog;
pub mod resolved_issues;
pub mod team_gantt;
pub mod user_workload;

use crate::application::data_provider::PluginDataProvider;
use crate::application::gantt_service::Period;
use crate::application::plugin::{PluginError, PluginRegistry};
use chrono::{Datelike, Days, NaiveDate};
use serde_json::{Map, Value};

pub const ATTR_DATE_RANGE: &str = "dateRange";
pub const ATTR_GRAPH_ONLY: &str = "isGraphOnly";

pub fn builtin_registry() -> PluginRegistry {
    let mut registry = PluginRegistry::new();
    registry.register(&team_gantt::DESCRIPTOR, team_gantt::TeamGantt::create);
    registry.register(&issue_backlog::DESCRIPTOR, issue_backlog::IssueBacklog::create);
    registry.register(&resolved_issues::DESCRIPTOR, resolved_issues::ResolvedIssues::create);
    registry.register(&user_workload::DESCRIPTOR, user_workload::UserWorkload::create);
    registry
}

/// Period an indicator reports on, relative to the dashboard's period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateRange {
    #[default]
    DefaultRange,
    CurrentWeek,
    CurrentMonth,
    NoDateLimit,
}

impl DateRange {
    pub fn from_attributes(attributes: &Map<String, Value>) -> Result<Self, PluginError> {
        let Some(value) = attributes.get(ATTR_DATE_RANGE) else {
            return Ok(Self::default());
        };
        match value.as_str() {
            Some("defaultRange") => Ok(DateRange::DefaultRange),
            Some("currentWeek") => Ok(DateRange::CurrentWeek),
            Some("currentMonth") => Ok(DateRange::CurrentMonth),
            Some("noDateLimit") => Ok(DateRange::NoDateLimit),
            _ => Err(PluginError::invalid(
                ATTR_DATE_RANGE,
                format!("unsupported value {}", value),
            )),
        }
    }

    /// `None` means no limit.
    pub fn period(&self, provider: &PluginDataProvider) -> Result<Option<Period>, PluginError> {
        self.bounds(provider.period, provider.reference_date)
    }

    /// Range relative to the dashboard `period` and `reference` day.
    pub fn bounds(
        &self,
        period: Period,
        reference: NaiveDate,
    ) -> Result<Option<Period>, PluginError> {
        let bounds = match self {
            DateRange::DefaultRange => return Ok(Some(period)),
            DateRange::NoDateLimit => return Ok(None),
            DateRange::CurrentWeek => {
                let monday = reference
                    .checked_sub_days(Days::new(reference.weekday().num_days_from_monday() as u64));
                let sunday = monday.and_then(|m| m.checked_add_days(Days::new(6)));
                monday.zip(sunday)
            }
            DateRange::CurrentMonth => {
                let first = reference.with_day(1);
                let last = first.and_then(last_day_of_month);
                first.zip(last)
            }
        };

        let (start, end) = bounds.ok_or_else(|| {
            PluginError::Execution(format!("no {:?} around {}", self, reference))
        })?;
        Period::resolve(Some(start), Some(end), reference)
            .map(Some)
            .map_err(|e| PluginError::Execution(e.to_string()))
    }

    pub fn label(&self) -> &'static str {
        match self {
            DateRange::DefaultRange => "selected period",
            DateRange::CurrentWeek => "current week",
            DateRange::CurrentMonth => "current month",
            DateRange::NoDateLimit => "no date limit",
        }
    }
}

fn last_day_of_month(first: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)?.pred_opt()
}

/// Accepts JSON booleans as well as "true"/"false"/"1"/"0" strings.
pub fn bool_attribute(
    attributes: &Map<String, Value>,
    name: &str,
    default: bool,
) -> Result<bool, PluginError> {
    match attributes.get(name) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::String(s)) => match s.as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(PluginError::invalid(name, format!("expected a boolean, got {}", s))),
        },
        Some(other) => Err(PluginError::invalid(
            name,
            format!("expected a boolean, got {}", other),
        )),
    }
}
