//! sqlx persistence. Functions taking an `Executor` work on the pool or on a
//! transaction; those taking `&mut MySqlConnection` issue several statements
//! and expect to run inside the caller's transaction.

pub mod adjustment;
pub mod advance;
pub mod attendance;
pub mod holiday;
pub mod location;
pub mod payroll;
pub mod penalty_rule;
pub mod vault;
pub mod worker;
