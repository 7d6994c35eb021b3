//! SQLite audit store.
//!
//! Implements [`AuditStore`] on two append-only tables:
//!
//! ```text
//! readings(id, timestamp, temperature, humidity, setpoint, ac_status)
//! alarms(id, timestamp, message)
//! ```
//!
//! One connection behind a mutex serialises writers; every statement runs
//! in autocommit mode so a row is durable when the call returns.  Rows are
//! ordered by their AUTOINCREMENT id, never by timestamp.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use log::{info, warn};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, params};

use crate::alarm::AlarmEvent;
use crate::app::ports::AuditStore;
use crate::app::state::{Reading, format_timestamp};
use crate::error::StoreError;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS readings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp TEXT NOT NULL,
        temperature REAL,
        humidity REAL,
        setpoint REAL,
        ac_status INTEGER
    );

    CREATE TABLE IF NOT EXISTS alarms (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp TEXT NOT NULL,
        message TEXT NOT NULL
    );
"#;

pub struct SqliteStore {
    conn: Mutex<Option<Connection>>,
}

impl SqliteStore {
    /// Open or create the database file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=FULL;")?;
        info!("STORE | opened {}", path.as_ref().display());
        Self::init(conn)
    }

    /// Private in-memory database (tests, or when the file cannot be opened).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        info!("STORE | in-memory backend");
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(Some(conn)),
        })
    }

    /// Close the connection.  Later calls fail with [`StoreError::Closed`].
    pub fn close(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?.take();
        match conn {
            Some(conn) => {
                conn.close().map_err(|(_, e)| StoreError::Sqlite(e))?;
                info!("STORE | closed");
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> Result<T, StoreError> {
        let guard = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let conn = guard.as_ref().ok_or(StoreError::Closed)?;
        Ok(f(conn)?)
    }

    /// Row count of the readings table.
    pub fn reading_count(&self) -> Result<u64, StoreError> {
        self.with_conn(|c| {
            c.query_row("SELECT COUNT(*) FROM readings", [], |row| row.get::<_, i64>(0))
                .map(|n| n as u64)
        })
    }

    /// Highest alarm sequence id, if any alarm was ever written.
    pub fn last_alarm_id(&self) -> Result<Option<i64>, StoreError> {
        self.with_conn(|c| {
            c.query_row("SELECT id FROM alarms ORDER BY id DESC LIMIT 1", [], |row| row.get(0))
                .optional()
        })
    }
}

fn parse_timestamp(col: usize, text: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(col, Type::Text, Box::new(e)))
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

impl AuditStore for SqliteStore {
    fn append_reading(&self, reading: &Reading) -> Result<i64, StoreError> {
        self.with_conn(|c| {
            c.execute(
                "INSERT INTO readings (timestamp, temperature, humidity, setpoint, ac_status)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    format_timestamp(reading.timestamp),
                    reading.temperature,
                    reading.humidity,
                    reading.setpoint,
                    i64::from(reading.actuator_on),
                ],
            )?;
            Ok(c.last_insert_rowid())
        })
    }

    fn append_alarm(&self, message: &str, at: DateTime<Utc>) -> Result<i64, StoreError> {
        self.with_conn(|c| {
            c.execute(
                "INSERT INTO alarms (timestamp, message) VALUES (?1, ?2)",
                params![format_timestamp(at), message],
            )?;
            Ok(c.last_insert_rowid())
        })
    }

    fn recent_readings(&self, limit: usize) -> Result<Vec<Reading>, StoreError> {
        self.with_conn(|c| {
            let mut stmt = c.prepare(
                "SELECT timestamp, temperature, humidity, setpoint, ac_status
                 FROM readings ORDER BY id DESC LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![sql_limit(limit)], |row| {
                let ts: String = row.get(0)?;
                Ok(Reading {
                    timestamp: parse_timestamp(0, &ts)?,
                    temperature: row.get(1)?,
                    humidity: row.get(2)?,
                    setpoint: row.get(3)?,
                    actuator_on: row.get::<_, Option<i64>>(4)?.unwrap_or(0) != 0,
                })
            })?;
            rows.collect()
        })
    }

    fn recent_alarms(&self, limit: usize) -> Result<Vec<AlarmEvent>, StoreError> {
        self.with_conn(|c| {
            let mut stmt =
                c.prepare("SELECT id, timestamp, message FROM alarms ORDER BY id DESC LIMIT ?1")?;
            let rows = stmt.query_map(params![sql_limit(limit)], |row| {
                let ts: String = row.get(1)?;
                Ok(AlarmEvent {
                    sequence_id: Some(row.get(0)?),
                    timestamp: parse_timestamp(1, &ts)?,
                    message: row.get(2)?,
                })
            })?;
            rows.collect()
        })
    }
}

impl Drop for SqliteStore {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("STORE | close on drop failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn reading(temp: f64, on: bool) -> Reading {
        Reading {
            timestamp: Utc::now(),
            temperature: Some(temp),
            humidity: None,
            setpoint: Some(22.0),
            actuator_on: on,
        }
    }

    #[test]
    fn readings_most_recent_first() {
        let store = SqliteStore::open_in_memory().unwrap();
        for t in [20.0, 21.0, 22.0] {
            store.append_reading(&reading(t, false)).unwrap();
        }
        let recent = store.recent_readings(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].temperature, Some(22.0));
        assert_eq!(recent[1].temperature, Some(21.0));
        assert_eq!(recent[0].humidity, None);
        assert_eq!(store.reading_count().unwrap(), 3);
    }

    #[test]
    fn alarm_ids_increase_with_insertion_not_time() {
        let store = SqliteStore::open_in_memory().unwrap();
        let later = Utc::now();
        let earlier = later - chrono::Duration::seconds(30);
        let a = store.append_alarm("first", later).unwrap();
        let b = store.append_alarm("second", earlier).unwrap();
        assert!(b > a);

        let recent = store.recent_alarms(10).unwrap();
        assert_eq!(recent[0].message, "second");
        assert_eq!(recent[0].sequence_id, Some(b));
        assert_eq!(recent[1].message, "first");
        assert_eq!(store.last_alarm_id().unwrap(), Some(b));
    }

    #[test]
    fn roundtrips_actuator_flag_and_timestamp() {
        let store = SqliteStore::open_in_memory().unwrap();
        let r = reading(30.0, true);
        store.append_reading(&r).unwrap();
        let back = &store.recent_readings(1).unwrap()[0];
        assert!(back.actuator_on);
        assert_eq!(format_timestamp(back.timestamp), format_timestamp(r.timestamp));
    }

    #[test]
    fn concurrent_writers_get_unique_ids() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let handles: Vec<_> = (0..4)
            .map(|w| {
                let store = store.clone();
                std::thread::spawn(move || {
                    (0..25)
                        .map(|i| store.append_alarm(&format!("w{w}-{i}"), Utc::now()).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<i64> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 100);
        assert_eq!(store.recent_alarms(1000).unwrap().len(), 100);
    }

    #[test]
    fn closed_store_rejects_writes() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.close().unwrap();
        assert!(matches!(
            store.append_alarm("late", Utc::now()),
            Err(StoreError::Closed)
        ));
        // Idempotent.
        assert!(store.close().is_ok());
    }

    #[test]
    fn empty_store_has_no_last_alarm() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.last_alarm_id().unwrap(), None);
        assert!(store.recent_readings(5).unwrap().is_empty());
    }
}
