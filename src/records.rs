// 🚢 Port records - the rows supervisors enter during a shift
//
// These are persisted by the store (`db.rs`) and handed to the core as
// plain slices. The core never mutates them.

use crate::error::{CoreError, CoreResult};
use crate::interval::{ClockTime, TimeRecord};
use crate::ledger::equipment_type;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// Helper functions for serde defaults
fn default_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn default_now() -> DateTime<Utc> {
    Utc::now()
}

/// Calendar day as used for report keys ("2024-01-31")
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

// ============================================================================
// PRODUCTION
// ============================================================================

/// Tonnage moved out of one hold (porão) of one vessel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionRecord {
    #[serde(default = "default_uuid")]
    pub id: String,
    pub date: NaiveDate,
    pub vessel: String,
    pub hold: String,
    pub location: String,
    pub tons: f64,
    /// Where the row was imported from ("loads.csv:14"); None for direct entry
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default = "default_now")]
    pub created_at: DateTime<Utc>,
}

impl ProductionRecord {
    pub fn new(date: NaiveDate, vessel: &str, hold: &str, location: &str, tons: f64) -> Self {
        ProductionRecord {
            id: default_uuid(),
            date,
            vessel: vessel.to_string(),
            hold: hold.to_string(),
            location: location.to_string(),
            tons,
            source: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn day_key(&self) -> String {
        day_key(self.date)
    }

    /// Tonnage, rejected when it is not a finite number
    pub fn checked_tons(&self) -> CoreResult<f64> {
        if self.tons.is_finite() {
            Ok(self.tons)
        } else {
            Err(CoreError::invalid_input(
                "tons",
                format!("non-finite tonnage on {} / {}", self.vessel, self.hold),
            ))
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.vessel.trim().is_empty() {
            return Err(CoreError::invalid_input("vessel", "vessel name is empty"));
        }
        self.checked_tons()?;
        Ok(())
    }
}

// ============================================================================
// EQUIPMENT USAGE
// ============================================================================

/// One piece of equipment used over one interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentUsage {
    #[serde(default = "default_uuid")]
    pub id: String,
    pub date: NaiveDate,
    pub equipment_tag: String,
    pub location: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default = "default_now")]
    pub created_at: DateTime<Utc>,
}

impl EquipmentUsage {
    pub fn new(date: NaiveDate, equipment_tag: &str, location: &str, start: &str, end: &str) -> Self {
        EquipmentUsage {
            id: default_uuid(),
            date,
            equipment_tag: equipment_tag.to_string(),
            location: location.to_string(),
            start_time: start.to_string(),
            end_time: end.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn interval(&self) -> TimeRecord {
        TimeRecord::new(&self.start_time, &self.end_time)
    }

    pub fn hours(&self) -> CoreResult<f64> {
        self.interval().hours()
    }

    pub fn equipment_type(&self) -> CoreResult<String> {
        equipment_type(&self.equipment_tag)
    }

    pub fn validate(&self) -> CoreResult<()> {
        self.interval().validate()?;
        self.equipment_type()?;
        Ok(())
    }
}

// ============================================================================
// VESSEL OPERATION
// ============================================================================

/// A recorded shift on a vessel by one work front (frente de serviço)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselOperation {
    #[serde(default = "default_uuid")]
    pub id: String,
    pub date: NaiveDate,
    pub vessel: String,
    pub berth: String,
    pub work_front: String,
    pub supervisor: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default = "default_now")]
    pub created_at: DateTime<Utc>,
}

impl VesselOperation {
    pub fn shift(&self) -> TimeRecord {
        TimeRecord::new(&self.start_time, &self.end_time)
    }

    pub fn hours(&self) -> CoreResult<f64> {
        self.shift().hours()
    }

    /// Records stay editable for `lock_hours` after creation
    pub fn is_editable_at(&self, now: DateTime<Utc>, lock_hours: i64) -> bool {
        now - self.created_at < Duration::hours(lock_hours)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.vessel.trim().is_empty() {
            return Err(CoreError::invalid_input("vessel", "vessel name is empty"));
        }
        self.shift().validate()
    }

    /// Copy with start/end rewritten as zero-padded "HH:MM"
    pub fn normalized(&self) -> CoreResult<Self> {
        let start: ClockTime = self.start_time.parse()?;
        let end: ClockTime = self.end_time.parse()?;
        Ok(VesselOperation {
            start_time: start.to_string(),
            end_time: end.to_string(),
            ..self.clone()
        })
    }
}

// ============================================================================
// CREW ATTENDANCE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewAttendance {
    #[serde(default = "default_uuid")]
    pub id: String,
    pub date: NaiveDate,
    pub work_front: String,
    pub worker: String,
    pub present: bool,
    #[serde(default = "default_now")]
    pub created_at: DateTime<Utc>,
}

impl CrewAttendance {
    pub fn new(date: NaiveDate, work_front: &str, worker: &str, present: bool) -> Self {
        CrewAttendance {
            id: default_uuid(),
            date,
            work_front: work_front.to_string(),
            worker: worker.to_string(),
            present,
            created_at: Utc::now(),
        }
    }
}
