pub mod adjustment;
pub mod advance;
pub mod attendance;
pub mod calendar;
pub mod geo;
pub mod money;
pub mod payroll;
pub mod penalty;
