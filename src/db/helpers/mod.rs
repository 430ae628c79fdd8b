use std::{cmp::Ordering, convert::TryFrom};

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;

use crate::models::Reading;

pub fn to_i64(value: usize) -> Result<i64> {
    i64::try_from(value).map_err(|_| anyhow!("value {value} exceeds SQLite INTEGER range"))
}

/// Day keys are fixed-width ISO dates so lexical order is chronological.
pub fn validate_day(day: &str) -> Result<()> {
    if day.len() != 10 {
        bail!("invalid day key '{day}', expected YYYY-MM-DD");
    }
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map(|_| ())
        .with_context(|| format!("invalid day key '{day}', expected YYYY-MM-DD"))
}

pub fn validate_entry_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        bail!("entry key must not be empty");
    }
    if key.contains('/') {
        bail!("entry key '{key}' must not contain '/'");
    }
    Ok(())
}

/// Integer value of a key written as up to ten digits (leading zeros and a
/// `-` allowed) that fits in 32 bits.
fn integer_key(key: &str) -> Option<i64> {
    let digits = key.strip_prefix('-').unwrap_or(key);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.trim_start_matches('0').len() > 10 {
        return None;
    }
    let value: i64 = key.parse().ok()?;
    (i64::from(i32::MIN)..=i64::from(i32::MAX))
        .contains(&value)
        .then_some(value)
}

/// Child order of the realtime store: integer keys first in numeric order
/// (shorter spelling first on ties), then every other key lexically.
pub fn compare_entry_keys(a: &str, b: &str) -> Ordering {
    match (integer_key(a), integer_key(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.len().cmp(&b.len())),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

pub fn parse_payload(payload: &str, day: &str, key: &str) -> Result<Reading> {
    serde_json::from_str(payload)
        .with_context(|| format!("failed to parse record env_logs/{day}/{key}"))
}
