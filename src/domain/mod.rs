// Domain layer - Pure value types and date logic
pub mod calendar;
pub mod dashboard;
pub mod gantt;
pub mod issue;
pub mod status;
pub mod team;
