use crate::records::{CrewAttendance, EquipmentUsage, ProductionRecord, VesselOperation};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use thiserror::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Refusals raised by the store itself (as opposed to SQLite failures)
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("operation {id} is locked: edits are allowed for {lock_hours}h after creation")]
    EditLocked { id: String, lock_hours: i64 },

    #[error("invalid record: {0}")]
    Invalid(#[from] crate::error::CoreError),
}

/// Event for audit trail (every insert and edit is an event)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    pub fn new(
        event_type: &str,
        entity_type: &str,
        entity_id: &str,
        data: serde_json::Value,
        actor: &str,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }
}

/// Content hash for duplicate detection on re-import
fn content_hash(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(parts.join("|"));
    format!("{:x}", hasher.finalize())
}

/// Imported rows dedupe on their source line plus content, so re-running
/// an import is a no-op. Directly entered rows dedupe on identity only:
/// two loads with the same tonnage on the same day are both real.
pub fn production_hash(rec: &ProductionRecord) -> String {
    match &rec.source {
        Some(source) => content_hash(&[
            source,
            &rec.date.format(DATE_FORMAT).to_string(),
            &rec.vessel,
            &rec.hold,
            &rec.location,
            &rec.tons.to_string(),
        ]),
        None => content_hash(&["entry", &rec.id]),
    }
}

pub fn equipment_hash(usage: &EquipmentUsage) -> String {
    content_hash(&[
        &usage.date.format(DATE_FORMAT).to_string(),
        &usage.equipment_tag,
        &usage.start_time,
        &usage.end_time,
    ])
}

pub fn open_database(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database dir {:?}", parent))?;
        }
    }
    let conn = Connection::open(path).with_context(|| format!("Failed to open database {:?}", path))?;
    setup_database(&conn)?;
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS production (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            record_uuid TEXT UNIQUE NOT NULL,
            idempotency_hash TEXT UNIQUE NOT NULL,
            date TEXT NOT NULL,
            vessel TEXT NOT NULL,
            hold TEXT NOT NULL,
            location TEXT NOT NULL,
            tons REAL NOT NULL,
            source TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS equipment_usage (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            record_uuid TEXT UNIQUE NOT NULL,
            idempotency_hash TEXT UNIQUE NOT NULL,
            date TEXT NOT NULL,
            equipment_tag TEXT NOT NULL,
            location TEXT NOT NULL,
            start_time TEXT NOT NULL,
            end_time TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS operations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            record_uuid TEXT UNIQUE NOT NULL,
            date TEXT NOT NULL,
            vessel TEXT NOT NULL,
            berth TEXT NOT NULL,
            work_front TEXT NOT NULL,
            supervisor TEXT NOT NULL,
            start_time TEXT NOT NULL,
            end_time TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS crew_attendance (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            record_uuid TEXT UNIQUE NOT NULL,
            date TEXT NOT NULL,
            work_front TEXT NOT NULL,
            worker TEXT NOT NULL,
            present INTEGER NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_production_date ON production(date);
        CREATE INDEX IF NOT EXISTS idx_production_vessel ON production(vessel);
        CREATE INDEX IF NOT EXISTS idx_equipment_date ON equipment_usage(date);
        CREATE INDEX IF NOT EXISTS idx_operations_date ON operations(date);
        CREATE INDEX IF NOT EXISTS idx_attendance_date ON crew_attendance(date);
        CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id);",
    )?;

    // Stores created before import sources were tracked
    if !has_column(conn, "production", "source")? {
        conn.execute("ALTER TABLE production ADD COLUMN source TEXT", [])?;
        tracing::info!("added production.source column");
    }

    Ok(())
}

fn has_column(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names.iter().any(|n| n == column))
}

// ============================================================================
// ROW PARSING
// ============================================================================

fn date_column(row: &Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn timestamp_column(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

// ============================================================================
// PRODUCTION
// ============================================================================

/// Insert production rows, skipping ones already imported. Returns inserted count.
///
/// The batch is all-or-nothing: every row is validated up front and the
/// inserts share one transaction.
pub fn insert_production(conn: &Connection, records: &[ProductionRecord], actor: &str) -> Result<usize> {
    for rec in records {
        rec.validate().map_err(StoreError::from)?;
    }

    let tx = conn.unchecked_transaction()?;
    let mut inserted = 0;
    let mut duplicates = 0;

    for rec in records {
        let hash = production_hash(rec);

        let result = tx.execute(
            "INSERT INTO production (
                record_uuid, idempotency_hash, date, vessel, hold, location, tons, source, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                rec.id,
                hash,
                rec.date.format(DATE_FORMAT).to_string(),
                rec.vessel,
                rec.hold,
                rec.location,
                rec.tons,
                rec.source,
                rec.created_at.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => {
                inserted += 1;

                let event = Event::new(
                    "production_added",
                    "production",
                    &rec.id,
                    serde_json::json!({
                        "vessel": rec.vessel,
                        "hold": rec.hold,
                        "tons": rec.tons,
                    }),
                    actor,
                );
                insert_event(&tx, &event)?;
            }
            Err(e) if is_constraint_violation(&e) => {
                duplicates += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    tx.commit()?;
    tracing::info!(inserted, duplicates, "production rows stored");
    if duplicates > 0 {
        tracing::warn!(duplicates, "skipped production rows already in the store");
    }

    Ok(inserted)
}

/// Production between two dates, inclusive, oldest first
pub fn get_production_between(
    conn: &Connection,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<ProductionRecord>> {
    let mut stmt = conn.prepare(
        "SELECT record_uuid, date, vessel, hold, location, tons, source, created_at
         FROM production
         WHERE date BETWEEN ?1 AND ?2
         ORDER BY date ASC, id ASC",
    )?;

    let records = stmt
        .query_map(
            params![from.format(DATE_FORMAT).to_string(), to.format(DATE_FORMAT).to_string()],
            |row| {
                Ok(ProductionRecord {
                    id: row.get(0)?,
                    date: date_column(row, 1)?,
                    vessel: row.get(2)?,
                    hold: row.get(3)?,
                    location: row.get(4)?,
                    tons: row.get(5)?,
                    source: row.get(6)?,
                    created_at: timestamp_column(row, 7)?,
                })
            },
        )?
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(rows = records.len(), %from, %to, "production query");
    Ok(records)
}

pub fn count_production(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM production", [], |row| row.get(0))?;
    Ok(count)
}

/// Distinct vessel names with production, sorted
pub fn get_vessels(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT DISTINCT vessel FROM production ORDER BY vessel")?;
    let vessels = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(vessels)
}

// ============================================================================
// EQUIPMENT USAGE
// ============================================================================

/// All-or-nothing, like `insert_production`
pub fn insert_equipment_usage(conn: &Connection, usage: &[EquipmentUsage], actor: &str) -> Result<usize> {
    for u in usage {
        u.validate().map_err(StoreError::from)?;
    }

    let tx = conn.unchecked_transaction()?;
    let mut inserted = 0;
    let mut duplicates = 0;

    for u in usage {
        let result = tx.execute(
            "INSERT INTO equipment_usage (
                record_uuid, idempotency_hash, date, equipment_tag, location,
                start_time, end_time, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                u.id,
                equipment_hash(u),
                u.date.format(DATE_FORMAT).to_string(),
                u.equipment_tag,
                u.location,
                u.start_time,
                u.end_time,
                u.created_at.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => {
                inserted += 1;
                let event = Event::new(
                    "equipment_usage_added",
                    "equipment_usage",
                    &u.id,
                    serde_json::json!({
                        "equipment_tag": u.equipment_tag,
                        "start_time": u.start_time,
                        "end_time": u.end_time,
                    }),
                    actor,
                );
                insert_event(&tx, &event)?;
            }
            Err(e) if is_constraint_violation(&e) => duplicates += 1,
            Err(e) => return Err(e.into()),
        }
    }

    tx.commit()?;
    tracing::info!(inserted, duplicates, "equipment usage rows stored");
    Ok(inserted)
}

pub fn get_equipment_usage_between(
    conn: &Connection,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<EquipmentUsage>> {
    let mut stmt = conn.prepare(
        "SELECT record_uuid, date, equipment_tag, location, start_time, end_time, created_at
         FROM equipment_usage
         WHERE date BETWEEN ?1 AND ?2
         ORDER BY date ASC, id ASC",
    )?;

    let usage = stmt
        .query_map(
            params![from.format(DATE_FORMAT).to_string(), to.format(DATE_FORMAT).to_string()],
            |row| {
                Ok(EquipmentUsage {
                    id: row.get(0)?,
                    date: date_column(row, 1)?,
                    equipment_tag: row.get(2)?,
                    location: row.get(3)?,
                    start_time: row.get(4)?,
                    end_time: row.get(5)?,
                    created_at: timestamp_column(row, 6)?,
                })
            },
        )?
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(rows = usage.len(), %from, %to, "equipment usage query");
    Ok(usage)
}

// ============================================================================
// OPERATIONS
// ============================================================================

/// Start and end times are stored zero-padded so they sort by clock time
pub fn insert_operation(conn: &Connection, op: &VesselOperation, actor: &str) -> Result<()> {
    op.validate().map_err(StoreError::from)?;
    let op = &op.normalized().map_err(StoreError::from)?;

    conn.execute(
        "INSERT INTO operations (
            record_uuid, date, vessel, berth, work_front, supervisor,
            start_time, end_time, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            op.id,
            op.date.format(DATE_FORMAT).to_string(),
            op.vessel,
            op.berth,
            op.work_front,
            op.supervisor,
            op.start_time,
            op.end_time,
            op.created_at.to_rfc3339(),
        ],
    )?;

    let event = Event::new(
        "operation_added",
        "operation",
        &op.id,
        serde_json::to_value(op)?,
        actor,
    );
    insert_event(conn, &event)?;

    tracing::info!(id = %op.id, vessel = %op.vessel, "operation recorded");
    Ok(())
}

fn operation_from_row(row: &Row) -> rusqlite::Result<VesselOperation> {
    Ok(VesselOperation {
        id: row.get(0)?,
        date: date_column(row, 1)?,
        vessel: row.get(2)?,
        berth: row.get(3)?,
        work_front: row.get(4)?,
        supervisor: row.get(5)?,
        start_time: row.get(6)?,
        end_time: row.get(7)?,
        created_at: timestamp_column(row, 8)?,
    })
}

const OPERATION_COLUMNS: &str =
    "record_uuid, date, vessel, berth, work_front, supervisor, start_time, end_time, created_at";

pub fn get_operation(conn: &Connection, id: &str) -> Result<VesselOperation> {
    let sql = format!("SELECT {} FROM operations WHERE record_uuid = ?1", OPERATION_COLUMNS);
    match conn.query_row(&sql, [id], operation_from_row) {
        Ok(op) => Ok(op),
        Err(rusqlite::Error::QueryReturnedNoRows) => Err(StoreError::NotFound {
            entity: "operation".to_string(),
            id: id.to_string(),
        }
        .into()),
        Err(e) => Err(e.into()),
    }
}

pub fn get_operations_on(conn: &Connection, date: NaiveDate) -> Result<Vec<VesselOperation>> {
    let sql = format!(
        "SELECT {} FROM operations WHERE date = ?1 ORDER BY start_time ASC, id ASC",
        OPERATION_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let ops = stmt
        .query_map([date.format(DATE_FORMAT).to_string()], operation_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ops)
}

/// Overwrite an operation's values while its edit window is open
///
/// The creation timestamp and identity of the stored row are kept.
pub fn update_operation(
    conn: &Connection,
    op: &VesselOperation,
    now: DateTime<Utc>,
    lock_hours: i64,
    actor: &str,
) -> Result<()> {
    op.validate().map_err(StoreError::from)?;
    let op = &op.normalized().map_err(StoreError::from)?;
    let stored = get_operation(conn, &op.id)?;

    if !stored.is_editable_at(now, lock_hours) {
        tracing::warn!(id = %op.id, "edit refused, operation locked");
        return Err(StoreError::EditLocked {
            id: op.id.clone(),
            lock_hours,
        }
        .into());
    }

    conn.execute(
        "UPDATE operations
         SET date = ?1, vessel = ?2, berth = ?3, work_front = ?4, supervisor = ?5,
             start_time = ?6, end_time = ?7
         WHERE record_uuid = ?8",
        params![
            op.date.format(DATE_FORMAT).to_string(),
            op.vessel,
            op.berth,
            op.work_front,
            op.supervisor,
            op.start_time,
            op.end_time,
            op.id,
        ],
    )?;

    let event = Event::new(
        "operation_updated",
        "operation",
        &op.id,
        serde_json::json!({
            "before": serde_json::to_value(&stored)?,
            "after": serde_json::to_value(op)?,
        }),
        actor,
    );
    insert_event(conn, &event)?;

    tracing::info!(id = %op.id, "operation updated");
    Ok(())
}

// ============================================================================
// CREW ATTENDANCE
// ============================================================================

pub fn insert_attendance(conn: &Connection, records: &[CrewAttendance], actor: &str) -> Result<usize> {
    let Some(first) = records.first() else {
        return Ok(0);
    };

    let tx = conn.unchecked_transaction()?;
    for rec in records {
        tx.execute(
            "INSERT INTO crew_attendance (record_uuid, date, work_front, worker, present, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                rec.id,
                rec.date.format(DATE_FORMAT).to_string(),
                rec.work_front,
                rec.worker,
                rec.present,
                rec.created_at.to_rfc3339(),
            ],
        )?;
    }

    let event = Event::new(
        "attendance_recorded",
        "crew_attendance",
        &first.date.format(DATE_FORMAT).to_string(),
        serde_json::json!({ "count": records.len() }),
        actor,
    );
    insert_event(&tx, &event)?;
    tx.commit()?;

    tracing::info!(rows = records.len(), "crew attendance stored");
    Ok(records.len())
}

pub fn get_attendance_on(conn: &Connection, date: NaiveDate) -> Result<Vec<CrewAttendance>> {
    let mut stmt = conn.prepare(
        "SELECT record_uuid, date, work_front, worker, present, created_at
         FROM crew_attendance
         WHERE date = ?1
         ORDER BY work_front ASC, worker ASC",
    )?;

    let records = stmt
        .query_map([date.format(DATE_FORMAT).to_string()], |row| {
            Ok(CrewAttendance {
                id: row.get(0)?,
                date: date_column(row, 1)?,
                work_front: row.get(2)?,
                worker: row.get(3)?,
                present: row.get(4)?,
                created_at: timestamp_column(row, 5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(records)
}

// ============================================================================
// EVENTS
// ============================================================================

/// Insert event into audit trail
pub fn insert_event(conn: &Connection, event: &Event) -> Result<()> {
    let data_json = serde_json::to_string(&event.data)?;

    conn.execute(
        "INSERT INTO events (
            event_id, timestamp, event_type, entity_type, entity_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339(),
            event.event_type,
            event.entity_type,
            event.entity_id,
            data_json,
            event.actor,
        ],
    )?;

    Ok(())
}

/// Get events for a specific entity, newest first
pub fn get_events_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY timestamp DESC, id DESC",
    )?;

    let events = stmt
        .query_map(params![entity_type, entity_id], |row| {
            let data_json: String = row.get(5)?;

            Ok(Event {
                event_id: row.get(0)?,
                timestamp: timestamp_column(row, 1)?,
                event_type: row.get(2)?,
                entity_type: row.get(3)?,
                entity_id: row.get(4)?,
                data: serde_json::from_str(&data_json).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e))
                })?,
                actor: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

// ============================================================================
// CSV IMPORT
// ============================================================================

/// Load production rows from a CSV with columns date,vessel,hold,location,tons
pub fn load_production_csv(csv_path: &Path) -> Result<Vec<ProductionRecord>> {
    let mut rdr = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open CSV file {:?}", csv_path))?;

    let file_name = csv_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| csv_path.display().to_string());

    let mut records = Vec::new();
    for (line, result) in rdr.deserialize().enumerate() {
        let record: ProductionRecord =
            result.with_context(|| format!("Failed to read production row {}", line + 2))?;
        let record = record.with_source(format!("{}:{}", file_name, line + 2));
        record
            .validate()
            .with_context(|| format!("Invalid production row {}", line + 2))?;
        records.push(record);
    }

    Ok(records)
}

/// Load equipment usage from a CSV with columns date,equipment_tag,location,start_time,end_time
pub fn load_equipment_csv(csv_path: &Path) -> Result<Vec<EquipmentUsage>> {
    let mut rdr = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open CSV file {:?}", csv_path))?;

    let mut usage = Vec::new();
    for (line, result) in rdr.deserialize().enumerate() {
        let u: EquipmentUsage =
            result.with_context(|| format!("Failed to read equipment row {}", line + 2))?;
        u.validate()
            .with_context(|| format!("Invalid equipment row {}", line + 2))?;
        usage.push(u);
    }

    Ok(usage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::io::Write;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn test_db() -> Connection {
        crate::logging::init_test();
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    fn operation(created_at: DateTime<Utc>) -> VesselOperation {
        VesselOperation {
            id: "op-42".to_string(),
            date: date(3),
            vessel: "Aurora".to_string(),
            berth: "Berth 2".to_string(),
            work_front: "Front A".to_string(),
            supervisor: "L. Prado".to_string(),
            start_time: "07:00".to_string(),
            end_time: "19:00".to_string(),
            created_at,
        }
    }

    fn total_tons(conn: &Connection) -> f64 {
        conn.query_row("SELECT COALESCE(SUM(tons), 0) FROM production", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_idempotency_import_twice() {
        let conn = test_db();

        let records = vec![
            ProductionRecord::new(date(1), "Aurora", "Hold 1", "Berth 1", 120.5)
                .with_source("loads.csv:2"),
            ProductionRecord::new(date(1), "Aurora", "Hold 2", "Berth 1", 80.0)
                .with_source("loads.csv:3"),
            ProductionRecord::new(date(2), "Ocean Star", "Hold 1", "Berth 2", 42.0)
                .with_source("loads.csv:4"),
        ];

        let first = insert_production(&conn, &records, "test").unwrap();

        // Same file lines parsed again get new identities: still duplicates
        let again: Vec<ProductionRecord> = records
            .iter()
            .map(|r| {
                ProductionRecord::new(r.date, &r.vessel, &r.hold, &r.location, r.tons)
                    .with_source(r.source.clone().unwrap())
            })
            .collect();
        let second = insert_production(&conn, &again, "test").unwrap();

        assert_eq!(first, 3);
        assert_eq!(second, 0);
        assert_eq!(count_production(&conn).unwrap(), 3);
    }

    #[test]
    fn test_identical_loads_both_counted() {
        let conn = test_db();

        let loads = vec![
            ProductionRecord::new(date(1), "Aurora", "Hold 1", "Berth 1", 30.0),
            ProductionRecord::new(date(1), "Aurora", "Hold 1", "Berth 1", 30.0),
        ];

        assert_eq!(insert_production(&conn, &loads, "test").unwrap(), 2);
        assert_eq!(total_tons(&conn), 60.0);

        // Retrying the same entries is still a no-op
        assert_eq!(insert_production(&conn, &loads, "test").unwrap(), 0);
        assert_eq!(total_tons(&conn), 60.0);
    }

    #[test]
    fn test_same_content_on_different_lines_kept() {
        let conn = test_db();

        let rows = vec![
            ProductionRecord::new(date(1), "Aurora", "Hold 1", "Berth 1", 30.0)
                .with_source("loads.csv:2"),
            ProductionRecord::new(date(1), "Aurora", "Hold 1", "Berth 1", 30.0)
                .with_source("loads.csv:3"),
        ];

        assert_eq!(insert_production(&conn, &rows, "test").unwrap(), 2);
        let stored = get_production_between(&conn, date(1), date(1)).unwrap();
        assert_eq!(stored[1].source.as_deref(), Some("loads.csv:3"));
    }

    #[test]
    fn test_bad_row_leaves_batch_unwritten() {
        let conn = test_db();

        let batch = vec![
            ProductionRecord::new(date(1), "Aurora", "Hold 1", "Berth 1", 30.0),
            ProductionRecord::new(date(1), "Aurora", "Hold 2", "Berth 1", f64::NAN),
        ];

        assert!(insert_production(&conn, &batch, "test").is_err());
        assert_eq!(count_production(&conn).unwrap(), 0);
        assert!(get_events_for_entity(&conn, "production", &batch[0].id)
            .unwrap()
            .is_empty());

        // Fixing the bad row and retrying stores both
        let mut fixed = batch.clone();
        fixed[1].tons = 12.0;
        assert_eq!(insert_production(&conn, &fixed, "test").unwrap(), 2);
    }

    #[test]
    fn test_bad_equipment_row_leaves_batch_unwritten() {
        let conn = test_db();

        let batch = vec![
            EquipmentUsage::new(date(1), "EMP-01", "Yard", "07:00", "13:00"),
            EquipmentUsage::new(date(1), "EMP-02", "Yard", "7h", "13:00"),
        ];

        assert!(insert_equipment_usage(&conn, &batch, "test").is_err());
        assert!(get_equipment_usage_between(&conn, date(1), date(1)).unwrap().is_empty());
    }

    #[test]
    fn test_production_range_query() {
        let conn = test_db();
        let records = vec![
            ProductionRecord::new(date(3), "Aurora", "Hold 1", "Berth 1", 1.0),
            ProductionRecord::new(date(1), "Aurora", "Hold 1", "Berth 1", 2.0),
            ProductionRecord::new(date(9), "Aurora", "Hold 1", "Berth 1", 3.0),
        ];
        insert_production(&conn, &records, "test").unwrap();

        let rows = get_production_between(&conn, date(1), date(3)).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, date(1));
        assert_eq!(rows[1].tons, 1.0);
        assert_eq!(rows[1].id, records[0].id);
        assert_eq!(get_vessels(&conn).unwrap(), vec!["Aurora"]);
    }

    #[test]
    fn test_invalid_production_rejected() {
        let conn = test_db();
        let bad = vec![ProductionRecord::new(date(1), "Aurora", "Hold 1", "Berth 1", f64::NAN)];
        assert!(insert_production(&conn, &bad, "test").is_err());
        assert_eq!(count_production(&conn).unwrap(), 0);
    }

    #[test]
    fn test_equipment_round_trip() {
        let conn = test_db();
        let usage = vec![
            EquipmentUsage::new(date(1), "EMP-01", "Yard", "22:00", "02:00"),
            EquipmentUsage::new(date(1), "EMP-01", "Yard", "22:00", "02:00"),
        ];

        assert_eq!(insert_equipment_usage(&conn, &usage, "test").unwrap(), 1);

        let rows = get_equipment_usage_between(&conn, date(1), date(1)).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].hours().unwrap(), 4.0);
    }

    #[test]
    fn test_equipment_bad_time_rejected() {
        let conn = test_db();
        let usage = vec![EquipmentUsage::new(date(1), "EMP-01", "Yard", "25:00", "02:00")];
        let err = insert_equipment_usage(&conn, &usage, "test").unwrap_err();
        assert!(err.to_string().contains("invalid time format"));
    }

    #[test]
    fn test_update_within_edit_window() {
        let conn = test_db();
        let created = Utc::now();
        insert_operation(&conn, &operation(created), "supervisor").unwrap();

        let mut edited = operation(created);
        edited.end_time = "18:00".to_string();
        update_operation(&conn, &edited, created + Duration::hours(2), 24, "supervisor").unwrap();

        let stored = get_operation(&conn, "op-42").unwrap();
        assert_eq!(stored.end_time, "18:00");
        assert_eq!(stored.hours().unwrap(), 11.0);

        let events = get_events_for_entity(&conn, "operation", "op-42").unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, "operation_updated");
    }

    #[test]
    fn test_update_after_edit_window_refused() {
        let conn = test_db();
        let created = Utc::now() - Duration::hours(30);
        insert_operation(&conn, &operation(created), "supervisor").unwrap();

        let mut edited = operation(created);
        edited.supervisor = "Someone else".to_string();
        let err = update_operation(&conn, &edited, Utc::now(), 24, "supervisor").unwrap_err();

        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::EditLocked { .. })
        ));
        assert_eq!(get_operation(&conn, "op-42").unwrap().supervisor, "L. Prado");
    }

    #[test]
    fn test_missing_operation() {
        let conn = test_db();
        let err = get_operation(&conn, "nope").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_operations_and_attendance_by_day() {
        let conn = test_db();
        insert_operation(&conn, &operation(Utc::now()), "supervisor").unwrap();
        insert_attendance(
            &conn,
            &[
                CrewAttendance::new(date(3), "Front A", "Bia", true),
                CrewAttendance::new(date(3), "Front A", "Ana", false),
                CrewAttendance::new(date(4), "Front A", "Ana", true),
            ],
            "supervisor",
        )
        .unwrap();

        assert_eq!(get_operations_on(&conn, date(3)).unwrap().len(), 1);
        assert!(get_operations_on(&conn, date(4)).unwrap().is_empty());

        let attendance = get_attendance_on(&conn, date(3)).unwrap();
        assert_eq!(attendance.len(), 2);
        assert_eq!(attendance[0].worker, "Ana");
        assert!(!attendance[0].present);
    }

    #[test]
    fn test_event_log() {
        let conn = test_db();

        let event = Event::new(
            "test_event",
            "production",
            "test_id_123",
            serde_json::json!({"test": "data"}),
            "test_actor",
        );
        insert_event(&conn, &event).unwrap();

        let events = get_events_for_entity(&conn, "production", "test_id_123").unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "test_event");
        assert_eq!(events[0].data["test"], "data");
    }

    #[test]
    fn test_load_production_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "date,vessel,hold,location,tons").unwrap();
        writeln!(file, "2024-06-01,Aurora,Hold 1,Berth 1,120.5").unwrap();
        writeln!(file, "2024-06-02,Ocean Star,Hold 3,Yard,7").unwrap();

        let records = load_production_csv(file.path()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, date(1));
        assert_eq!(records[1].tons, 7.0);
        assert!(!records[0].id.is_empty());
        assert_ne!(records[0].id, records[1].id);

        let name = file.path().file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(records[1].source, Some(format!("{}:3", name)));

        // Loading the same file again yields the same sources, so nothing new is stored
        let conn = test_db();
        assert_eq!(insert_production(&conn, &records, "test").unwrap(), 2);
        let reloaded = load_production_csv(file.path()).unwrap();
        assert_eq!(insert_production(&conn, &reloaded, "test").unwrap(), 0);
    }

    #[test]
    fn test_load_production_csv_bad_number() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "date,vessel,hold,location,tons").unwrap();
        writeln!(file, "2024-06-01,Aurora,Hold 1,Berth 1,lots").unwrap();

        let err = load_production_csv(file.path()).unwrap_err();
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn test_load_equipment_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "date,equipment_tag,location,start_time,end_time").unwrap();
        writeln!(file, "2024-06-01,GUI-02,Berth 1,23:00,01:00").unwrap();

        let usage = load_equipment_csv(file.path()).unwrap();
        assert_eq!(usage[0].hours().unwrap(), 2.0);

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        writeln!(bad, "date,equipment_tag,location,start_time,end_time").unwrap();
        writeln!(bad, "2024-06-01,GUI-02,Berth 1,11pm,01:00").unwrap();
        assert!(load_equipment_csv(bad.path()).is_err());
    }

    #[test]
    fn test_operations_stored_in_clock_order() {
        let conn = test_db();

        let mut late = operation(Utc::now());
        late.id = "op-late".to_string();
        late.start_time = "19:00".to_string();
        let mut early = operation(Utc::now());
        early.id = "op-early".to_string();
        early.start_time = "7:00".to_string();

        insert_operation(&conn, &late, "supervisor").unwrap();
        insert_operation(&conn, &early, "supervisor").unwrap();

        let ops = get_operations_on(&conn, date(3)).unwrap();
        let starts: Vec<&str> = ops.iter().map(|o| o.start_time.as_str()).collect();
        assert_eq!(starts, vec!["07:00", "19:00"]);
    }

    #[test]
    fn test_empty_attendance_writes_nothing() {
        let conn = test_db();

        assert_eq!(insert_attendance(&conn, &[], "supervisor").unwrap(), 0);

        let events: i64 = conn
            .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))
            .unwrap();
        assert_eq!(events, 0);
    }

    #[test]
    fn test_setup_adds_source_column_to_old_store() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE production (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                record_uuid TEXT UNIQUE NOT NULL,
                idempotency_hash TEXT UNIQUE NOT NULL,
                date TEXT NOT NULL,
                vessel TEXT NOT NULL,
                hold TEXT NOT NULL,
                location TEXT NOT NULL,
                tons REAL NOT NULL,
                created_at TEXT NOT NULL
            );",
        )
        .unwrap();

        setup_database(&conn).unwrap();
        setup_database(&conn).unwrap();

        assert!(has_column(&conn, "production", "source").unwrap());
        let rec = ProductionRecord::new(date(1), "Aurora", "Hold 1", "Berth 1", 3.0);
        assert_eq!(insert_production(&conn, &[rec], "test").unwrap(), 1);
    }
}
