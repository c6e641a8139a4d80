// Working calendar used for completion forecasts
use chrono::{Datelike, Days, NaiveDate, Weekday};
use std::collections::HashSet;

/// Forecasts never look further ahead than this.
const MAX_HORIZON_DAYS: u64 = 3650;
const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct WorkCalendar {
    non_working_days: Vec<Weekday>,
    holidays: HashSet<NaiveDate>,
}

/// Result of a completion forecast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrivalEstimate {
    pub date: NaiveDate,
    /// Working days of effort scheduled from the reference date, this issue included.
    pub available_time: f64,
}

impl Default for WorkCalendar {
    fn default() -> Self {
        Self::new(vec![Weekday::Sat, Weekday::Sun], Vec::new())
    }
}

impl WorkCalendar {
    pub fn new(non_working_days: Vec<Weekday>, holidays: Vec<NaiveDate>) -> Self {
        Self {
            non_working_days,
            holidays: holidays.into_iter().collect(),
        }
    }

    pub fn has_working_days(&self) -> bool {
        [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ]
        .iter()
        .any(|d| !self.non_working_days.contains(d))
    }

    /// Capacity in days a single person has on `day`.
    pub fn capacity_on(&self, day: NaiveDate) -> f64 {
        if self.non_working_days.contains(&day.weekday()) || self.holidays.contains(&day) {
            0.0
        } else {
            1.0
        }
    }

    /// Estimate when `remaining` days of effort end, given that `available_time`
    /// days are already scheduled starting at `reference`.
    ///
    /// The returned counter never decreases, so feeding it back for the next
    /// issue pushes that issue's completion date behind this one.
    pub fn estimate_arrival(
        &self,
        reference: NaiveDate,
        available_time: f64,
        remaining: f64,
    ) -> ArrivalEstimate {
        let target = available_time + remaining.max(0.0);
        if target <= EPSILON {
            return ArrivalEstimate {
                date: reference,
                available_time: target,
            };
        }

        let mut cumulative = 0.0;
        let mut day = reference;
        for _ in 0..MAX_HORIZON_DAYS {
            cumulative += self.capacity_on(day);
            if cumulative + EPSILON >= target {
                return ArrivalEstimate {
                    date: day,
                    available_time: target,
                };
            }
            match day.checked_add_days(Days::new(1)) {
                Some(next) => day = next,
                None => break,
            }
        }

        tracing::warn!(
            "Forecast of {:.2} days from {} goes past the calendar horizon, capped at {}",
            target,
            reference,
            day
        );
        ArrivalEstimate {
            date: day,
            available_time: target,
        }
    }
}
