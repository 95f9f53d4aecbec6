pub mod allotment;
pub mod broadcaster;
pub mod dedup;
pub mod lifecycle;
pub mod lunch;
pub mod membership;
pub mod metrics;
pub mod reconcile;
pub mod timesheet;
