use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::{DeployflowError, Result};

/// Parses a cron expression.
///
/// Five-field expressions (`min hour day month weekday`) fire at second zero;
/// six and seven field expressions are passed through with their seconds field.
pub fn parse_cron(expr: &str) -> Result<::cron::Schedule> {
    let expr = expr.trim();
    let normalized = match expr.split_whitespace().count() {
        5 => format!("0 {}", expr),
        _ => expr.to_string(),
    };
    ::cron::Schedule::from_str(&normalized).map_err(|e| DeployflowError::InvalidArgument(format!("invalid cron expression '{}': {}", expr, e)))
}

/// The first fire time strictly after `after`.
pub fn next_fire(
    schedule: &::cron::Schedule,
    after: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    schedule.after(&after).next()
}
