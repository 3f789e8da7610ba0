use std::env;
use std::str::FromStr;

use anyhow::{Context, anyhow};
use chrono::Weekday;
use dotenvy::dotenv;
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,

    // Rate limiting
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    pub payroll: PayrollConfig,
}

/// Company-wide payroll settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PayrollConfig {
    /// Divisor for the daily rate, independent of the month's length.
    pub days_per_month: Decimal,
    pub paid_leave_days_per_month: u32,
    pub perfect_attendance_bonus: Decimal,
    /// Days that never count as implicit absences.
    pub rest_days: Vec<Weekday>,
}

impl Default for PayrollConfig {
    fn default() -> Self {
        Self {
            days_per_month: Decimal::from(30),
            paid_leave_days_per_month: 2,
            perfect_attendance_bonus: Decimal::ZERO,
            rest_days: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();

        let payroll = PayrollConfig {
            days_per_month: parse_or("PAYROLL_DAYS_PER_MONTH", Decimal::from(30))?,
            paid_leave_days_per_month: parse_or("PAID_LEAVE_DAYS_PER_MONTH", 2)?,
            perfect_attendance_bonus: parse_or("PERFECT_ATTENDANCE_BONUS", Decimal::ZERO)?,
            rest_days: parse_rest_days(&env::var("WEEKLY_REST_DAYS").unwrap_or_default())?,
        };
        if payroll.days_per_month <= Decimal::ZERO {
            return Err(anyhow!("PAYROLL_DAYS_PER_MONTH must be positive"));
        }

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            rate_protected_per_min: parse_or("RATE_PROTECTED_PER_MIN", 1000)?,
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            payroll,
        })
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}

/// Comma separated weekday names, e.g. `fri` or `fri,sat`.
pub fn parse_rest_days(raw: &str) -> anyhow::Result<Vec<Weekday>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<Weekday>()
                .map_err(|_| anyhow!("unknown weekday in WEEKLY_REST_DAYS: {s:?}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_days_parse_loosely() {
        assert_eq!(parse_rest_days("").unwrap(), vec![]);
        assert_eq!(parse_rest_days("fri").unwrap(), vec![Weekday::Fri]);
        assert_eq!(parse_rest_days(" Fri , saturday").unwrap(), vec![Weekday::Fri, Weekday::Sat]);
        assert!(parse_rest_days("fri,funday").is_err());
    }

    #[test]
    fn payroll_defaults() {
        let cfg = PayrollConfig::default();
        assert_eq!(cfg.days_per_month, Decimal::from(30));
        assert_eq!(cfg.paid_leave_days_per_month, 2);
        assert!(cfg.rest_days.is_empty());
    }
}
