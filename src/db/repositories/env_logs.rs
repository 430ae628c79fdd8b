use anyhow::{bail, Context, Result};
use chrono::Utc;
use log::warn;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use crate::db::{
    connection::Database,
    helpers::{compare_entry_keys, parse_payload, to_i64, validate_day, validate_entry_key},
    models::{DayGroup, ImportSummary, LogEntry, StoreChange},
};
use crate::models::Reading;

/// Root collection of the sensor gateway's export.
pub const ENV_LOGS_ROOT: &str = "env_logs";

struct PendingDay {
    day: String,
    entries: Vec<(String, String)>,
}

fn ensure_day(conn: &Connection, day: &str, now: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO log_days (day, created_at) VALUES (?1, ?2)
         ON CONFLICT(day) DO NOTHING",
        params![day, now],
    )
    .with_context(|| format!("failed to register day {day}"))?;
    Ok(())
}

fn upsert_entry(conn: &Connection, day: &str, key: &str, payload: &str, now: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO log_entries (day, entry_key, payload, written_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(day, entry_key) DO UPDATE SET
             payload = excluded.payload,
             written_at = excluded.written_at",
        params![day, key, payload, now],
    )
    .with_context(|| format!("failed to write env_logs/{day}/{key}"))?;
    Ok(())
}

fn load_entries(conn: &Connection, day: &str) -> Result<Vec<LogEntry>> {
    let mut stmt = conn.prepare(
        "SELECT entry_key, payload FROM log_entries WHERE day = ?1",
    )?;
    let mut rows = stmt.query(params![day])?;

    let mut entries = Vec::new();
    while let Some(row) = rows.next()? {
        let key: String = row.get(0)?;
        let payload: String = row.get(1)?;
        let reading = parse_payload(&payload, day, &key)?;
        entries.push(LogEntry { key, reading });
    }
    entries.sort_by(|a, b| compare_entry_keys(&a.key, &b.key));
    Ok(entries)
}

/// Accepts the gateway export either wrapped (`{"env_logs": {...}}`) or bare
/// (`{"2024-01-01": {"key": {...}}}`). Unusable records are counted, not fatal.
fn plan_import(snapshot: &Value) -> Result<(Vec<PendingDay>, usize)> {
    let root = match snapshot.get(ENV_LOGS_ROOT) {
        Some(inner) => inner,
        None => snapshot,
    };
    let Some(days) = root.as_object() else {
        bail!("expected an object of day groups under '{ENV_LOGS_ROOT}'");
    };

    let mut planned = Vec::with_capacity(days.len());
    let mut skipped = 0usize;

    for (day, group) in days {
        if let Err(err) = validate_day(day) {
            warn!("Skipping group '{day}': {err}");
            skipped += group.as_object().map(|g| g.len()).unwrap_or(1);
            continue;
        }

        let mut entries = Vec::new();
        match group.as_object() {
            Some(records) => {
                for (key, record) in records {
                    if validate_entry_key(key).is_err() {
                        skipped += 1;
                        continue;
                    }
                    match serde_json::from_value::<Reading>(record.clone()) {
                        Ok(reading) => entries.push((key.clone(), serde_json::to_string(&reading)?)),
                        Err(err) => {
                            warn!("Skipping record {ENV_LOGS_ROOT}/{day}/{key}: {err}");
                            skipped += 1;
                        }
                    }
                }
            }
            None if group.is_null() => {}
            None => {
                warn!("Skipping group '{day}': not an object");
                skipped += 1;
                continue;
            }
        }

        planned.push(PendingDay {
            day: day.clone(),
            entries,
        });
    }

    Ok((planned, skipped))
}

impl Database {
    /// Write one record at `env_logs/{day}/{key}`, replacing any existing one.
    pub async fn put_reading(&self, day: &str, key: &str, reading: &Reading) -> Result<()> {
        validate_day(day)?;
        validate_entry_key(key)?;

        let day = day.to_string();
        let key = key.to_string();
        let payload = serde_json::to_string(reading).context("failed to serialize reading")?;

        let (day, key) = self
            .execute(move |conn| {
                let now = Utc::now().to_rfc3339();
                let tx = conn.transaction()?;
                ensure_day(&tx, &day, &now)?;
                upsert_entry(&tx, &day, &key, &payload, &now)?;
                tx.commit().context("failed to commit reading")?;
                Ok((day, key))
            })
            .await?;

        self.publish(StoreChange::Written { day, key });
        Ok(())
    }

    /// Merge a gateway export into the store in one transaction.
    pub async fn import_snapshot(&self, snapshot: &Value) -> Result<ImportSummary> {
        let (planned, skipped) = plan_import(snapshot)?;

        let mut summary = self
            .execute(move |conn| {
                let now = Utc::now().to_rfc3339();
                let tx = conn.transaction()?;
                let mut summary = ImportSummary::default();
                for pending in &planned {
                    ensure_day(&tx, &pending.day, &now)?;
                    for (key, payload) in &pending.entries {
                        upsert_entry(&tx, &pending.day, key, payload, &now)?;
                        summary.entries += 1;
                    }
                    summary.days += 1;
                }
                tx.commit().context("failed to commit import")?;
                Ok(summary)
            })
            .await?;
        summary.skipped = skipped;

        if summary.days > 0 {
            self.publish(StoreChange::Imported {
                days: summary.days,
                entries: summary.entries,
            });
        }
        Ok(summary)
    }

    /// All day keys, oldest first.
    pub async fn list_days(&self) -> Result<Vec<String>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare("SELECT day FROM log_days ORDER BY day ASC")?;
            let days = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(days)
        })
        .await
    }

    /// Records of `env_logs/{day}` in store key order; `None` when the day is
    /// unknown.
    pub async fn get_day(&self, day: &str) -> Result<Option<Vec<LogEntry>>> {
        let day = day.to_string();
        self.execute(move |conn| {
            let exists = conn
                .query_row(
                    "SELECT 1 FROM log_days WHERE day = ?1",
                    params![day],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            if !exists {
                return Ok(None);
            }
            load_entries(conn, &day).map(Some)
        })
        .await
    }

    /// The newest `limit` day groups, returned oldest first.
    pub async fn last_day_groups(&self, limit: usize) -> Result<Vec<DayGroup>> {
        let limit = to_i64(limit)?;
        self.execute(move |conn| {
            let mut stmt = conn.prepare("SELECT day FROM log_days ORDER BY day DESC LIMIT ?1")?;
            let mut days = stmt
                .query_map(params![limit], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            days.reverse();

            let mut groups = Vec::with_capacity(days.len());
            for day in days {
                let entries = load_entries(conn, &day)?;
                groups.push(DayGroup { day, entries });
            }
            Ok(groups)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn reading(pc: f64) -> Reading {
        Reading {
            pc0_1: Some(pc),
            ..Reading::default()
        }
    }

    #[tokio::test]
    async fn import_then_read_back_day() {
        let db = Database::in_memory().unwrap();
        let snapshot = json!({
            "env_logs": {
                "2024-01-01": {
                    "b": { "Pc0_1": 200, "timestamp": 1704067260000i64 },
                    "a": { "Pc0_1": 100, "timestamp": 1704067200000i64 }
                },
                "2024-01-02": {
                    "a": { "Pc0_1": 300 }
                }
            }
        });

        let summary = db.import_snapshot(&snapshot).await.unwrap();
        assert_eq!(summary.days, 2);
        assert_eq!(summary.entries, 3);
        assert_eq!(summary.skipped, 0);

        let entries = db.get_day("2024-01-01").await.unwrap().unwrap();
        let keys: Vec<_> = entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(entries[1].reading.pc0_1, Some(200.0));

        assert_eq!(
            db.list_days().await.unwrap(),
            vec!["2024-01-01".to_string(), "2024-01-02".to_string()]
        );
    }

    #[tokio::test]
    async fn unknown_day_is_none_and_empty_day_is_some() {
        let db = Database::in_memory().unwrap();
        db.import_snapshot(&json!({ "2024-03-01": {} })).await.unwrap();

        assert!(db.get_day("2024-03-02").await.unwrap().is_none());
        assert_eq!(db.get_day("2024-03-01").await.unwrap(), Some(Vec::new()));
    }

    #[tokio::test]
    async fn bad_records_are_skipped() {
        let db = Database::in_memory().unwrap();
        let summary = db
            .import_snapshot(&json!({
                "not-a-date": { "k": { "Pc0_1": 1 } },
                "2024-01-01": {
                    "ok": { "Pc0_1": 5 },
                    "bad": { "Pc0_1": "lots" }
                }
            }))
            .await
            .unwrap();
        assert_eq!(summary.entries, 1);
        assert_eq!(summary.skipped, 2);
    }

    #[tokio::test]
    async fn float_timestamps_survive_import() {
        let db = Database::in_memory().unwrap();
        let summary = db
            .import_snapshot(&json!({
                "2024-01-01": {
                    "a": { "timestamp": 1704067200123.5, "Pc0_1": 20000 },
                    "b": { "timestamp": 1704067200000.0, "Pc0_1": 30000 }
                }
            }))
            .await
            .unwrap();
        assert_eq!(summary.entries, 2);
        assert_eq!(summary.skipped, 0);

        let entries = db.get_day("2024-01-01").await.unwrap().unwrap();
        let values: Vec<_> = entries.iter().map(|e| e.reading.pc0_1).collect();
        assert_eq!(values, vec![Some(20000.0), Some(30000.0)]);
        assert_eq!(
            entries[0].reading.timestamp,
            Some(crate::models::Timestamp::FractionalMillis(1_704_067_200_123.5))
        );
    }

    #[tokio::test]
    async fn counter_keys_load_in_numeric_order() {
        let db = Database::in_memory().unwrap();
        for n in [1, 2, 9, 10, 11] {
            db.put_reading("2024-01-01", &n.to_string(), &reading(n as f64))
                .await
                .unwrap();
        }
        db.put_reading("2024-01-01", "-Nzz", &reading(99.0)).await.unwrap();

        let entries = db.get_day("2024-01-01").await.unwrap().unwrap();
        let keys: Vec<_> = entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["1", "2", "9", "10", "11", "-Nzz"]);

        let groups = db.last_day_groups(1).await.unwrap();
        let flat = crate::ingest::flatten(&groups);
        assert_eq!(flat.iter().rev().nth(1).and_then(|r| r.pc0_1), Some(11.0));
    }

    #[tokio::test]
    async fn last_day_groups_keeps_newest_days() {
        let db = Database::in_memory().unwrap();
        for day in 1..=12 {
            let date = format!("2024-01-{day:02}");
            db.put_reading(&date, "k", &reading(day as f64)).await.unwrap();
        }

        let groups = db.last_day_groups(10).await.unwrap();
        assert_eq!(groups.len(), 10);
        assert_eq!(groups.first().unwrap().day, "2024-01-03");
        assert_eq!(groups.last().unwrap().day, "2024-01-12");
        assert_eq!(groups.last().unwrap().entries[0].reading.pc0_1, Some(12.0));
    }

    #[tokio::test]
    async fn writes_publish_changes() {
        let db = Database::in_memory().unwrap();
        let mut changes = db.subscribe();

        db.put_reading("2024-01-01", "k1", &reading(1.0)).await.unwrap();
        assert_eq!(
            changes.recv().await.unwrap(),
            StoreChange::Written {
                day: "2024-01-01".into(),
                key: "k1".into()
            }
        );
    }

    #[tokio::test]
    async fn put_rejects_malformed_keys() {
        let db = Database::in_memory().unwrap();
        assert!(db.put_reading("01/01/2024", "k", &reading(1.0)).await.is_err());
        assert!(db.put_reading("2024-01-01", "", &reading(1.0)).await.is_err());
    }

    #[tokio::test]
    async fn rewriting_a_key_replaces_the_record() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("store.sqlite3")).unwrap();
        db.put_reading("2024-01-01", "k", &reading(1.0)).await.unwrap();
        db.put_reading("2024-01-01", "k", &reading(2.0)).await.unwrap();

        let entries = db.get_day("2024-01-01").await.unwrap().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].reading.pc0_1, Some(2.0));
    }
}
