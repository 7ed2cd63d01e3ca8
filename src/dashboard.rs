// 🖥️ Dashboard & RDO - wires stored rows through the calculation core
//
// Filters are explicit parameters. Rows come in already fetched from the
// store; every view is recomputed from them on each call.

use crate::chart::{to_absolute, to_percentages, ChartSeries};
use crate::config::AppConfig;
use crate::error::CoreResult;
use crate::interval::ClockTime;
use crate::ledger::{group_sum, ledger_rows, AggregatedGroup, LedgerRow};
use crate::numeric::percent_of;
use crate::records::{CrewAttendance, EquipmentUsage, ProductionRecord, VesselOperation};
use crate::report::{by_day, by_vessel, production_day_rows, DailyReport, VesselReport};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ============================================================================
// FILTER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardFilter {
    pub from: NaiveDate,
    pub to: NaiveDate,
    #[serde(default)]
    pub vessel: Option<String>,
}

impl DashboardFilter {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        DashboardFilter {
            from,
            to,
            vessel: None,
        }
    }

    pub fn with_vessel(mut self, vessel: &str) -> Self {
        self.vessel = Some(vessel.to_string());
        self
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    pub fn matches(&self, record: &ProductionRecord) -> bool {
        self.contains(record.date)
            && self
                .vessel
                .as_deref()
                .map_or(true, |v| record.vessel == v)
    }
}

// ============================================================================
// GROUPINGS
// ============================================================================

/// Tonnage per known location, in config order
pub fn location_groups<S: AsRef<str>>(
    production: &[ProductionRecord],
    locations: &[S],
) -> CoreResult<Vec<AggregatedGroup>> {
    let rows = ledger_rows(production, |r| Ok(r.location.clone()), |r| r.checked_tons())?;
    Ok(group_sum(&rows, locations))
}

/// Equipment hours per equipment type (tag prefix), in config order
pub fn equipment_hour_groups<S: AsRef<str>>(
    usage: &[EquipmentUsage],
    types: &[S],
) -> CoreResult<Vec<AggregatedGroup>> {
    let rows = ledger_rows(usage, |u| u.equipment_type(), |u| u.hours())?;
    Ok(group_sum(&rows, types))
}

/// Group by every key present, sorted by key
fn group_sum_sorted(rows: &[LedgerRow]) -> Vec<AggregatedGroup> {
    let keys: BTreeSet<&str> = rows.iter().map(|r| r.group_key.as_str()).collect();
    let keys: Vec<&str> = keys.into_iter().collect();
    group_sum(rows, &keys)
}

// ============================================================================
// DASHBOARD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub filter: DashboardFilter,
    /// Share of tonnage per location (percent)
    pub location_share: ChartSeries,
    /// Tonnage per location
    pub location_tons: ChartSeries,
    /// Hours of use per equipment type
    pub equipment_hours: ChartSeries,
    pub production_by_day: DailyReport,
    pub vessels: Vec<VesselReport>,
}

impl Dashboard {
    pub fn build(
        filter: DashboardFilter,
        production: &[ProductionRecord],
        usage: &[EquipmentUsage],
        config: &AppConfig,
    ) -> CoreResult<Self> {
        let production: Vec<ProductionRecord> =
            production.iter().filter(|r| filter.matches(r)).cloned().collect();
        let usage: Vec<EquipmentUsage> =
            usage.iter().filter(|u| filter.contains(u.date)).cloned().collect();

        let locations = location_groups(&production, &config.locations)?;
        let equipment = equipment_hour_groups(&usage, &config.equipment_types)?;

        tracing::debug!(
            production = production.len(),
            usage = usage.len(),
            "dashboard rows after filter"
        );

        Ok(Dashboard {
            location_share: to_percentages(&locations),
            location_tons: to_absolute(&locations),
            equipment_hours: to_absolute(&equipment),
            production_by_day: by_day(&production_day_rows(&production)?),
            vessels: by_vessel(&production)?,
            filter,
        })
    }
}

// ============================================================================
// RDO - DAILY OPERATIONS REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationLine {
    pub vessel: String,
    pub berth: String,
    pub work_front: String,
    pub supervisor: String,
    pub start_time: String,
    pub end_time: String,
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceLine {
    pub work_front: String,
    pub present: usize,
    pub total: usize,
    pub rate_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyOperationsReport {
    pub date: NaiveDate,
    pub operations: Vec<OperationLine>,
    pub total_shift_hours: f64,
    pub equipment_hours: Vec<AggregatedGroup>,
    pub tons_by_vessel: Vec<AggregatedGroup>,
    /// Keyed "vessel / hold"
    pub tons_by_hold: Vec<AggregatedGroup>,
    pub total_tons: f64,
    pub attendance: Vec<AttendanceLine>,
}

impl DailyOperationsReport {
    /// Build the RDO for `date`; rows from other days are ignored
    pub fn build(
        date: NaiveDate,
        operations: &[VesselOperation],
        usage: &[EquipmentUsage],
        production: &[ProductionRecord],
        attendance: &[CrewAttendance],
        config: &AppConfig,
    ) -> CoreResult<Self> {
        let mut keyed = Vec::new();
        for op in operations.iter().filter(|op| op.date == date) {
            let start: ClockTime = op.start_time.parse()?;
            keyed.push((start, OperationLine {
                vessel: op.vessel.clone(),
                berth: op.berth.clone(),
                work_front: op.work_front.clone(),
                supervisor: op.supervisor.clone(),
                start_time: op.start_time.clone(),
                end_time: op.end_time.clone(),
                hours: op.hours()?,
            }));
        }
        keyed.sort_by(|(a_start, a), (b_start, b)| {
            (a.vessel.as_str(), a_start).cmp(&(b.vessel.as_str(), b_start))
        });
        let lines: Vec<OperationLine> = keyed.into_iter().map(|(_, line)| line).collect();
        let total_shift_hours: f64 = lines.iter().map(|l| l.hours).sum();

        let usage: Vec<EquipmentUsage> = usage.iter().filter(|u| u.date == date).cloned().collect();
        let equipment_hours = equipment_hour_groups(&usage, &config.equipment_types)?;

        let production: Vec<ProductionRecord> =
            production.iter().filter(|r| r.date == date).cloned().collect();
        let vessel_rows = ledger_rows(&production, |r| Ok(r.vessel.clone()), |r| r.checked_tons())?;
        let hold_rows = ledger_rows(
            &production,
            |r| Ok(format!("{} / {}", r.vessel, r.hold)),
            |r| r.checked_tons(),
        )?;
        let total_tons: f64 = vessel_rows.iter().map(|r| r.amount).sum();

        Ok(DailyOperationsReport {
            date,
            operations: lines,
            total_shift_hours,
            equipment_hours,
            tons_by_vessel: group_sum_sorted(&vessel_rows),
            tons_by_hold: group_sum_sorted(&hold_rows),
            total_tons,
            attendance: attendance_by_front(attendance.iter().filter(|a| a.date == date)),
        })
    }
}

/// Present/total per work front, sorted by front name
fn attendance_by_front<'a>(records: impl Iterator<Item = &'a CrewAttendance>) -> Vec<AttendanceLine> {
    let mut counts: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for record in records {
        let entry = counts.entry(record.work_front.as_str()).or_insert((0, 0));
        if record.present {
            entry.0 += 1;
        }
        entry.1 += 1;
    }

    counts
        .into_iter()
        .map(|(front, (present, total))| AttendanceLine {
            work_front: front.to_string(),
            present,
            total,
            rate_percent: percent_of(present as f64, total as f64),
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn config() -> AppConfig {
        AppConfig {
            locations: vec!["Berth 1".to_string(), "Berth 2".to_string(), "Yard".to_string()],
            equipment_types: vec!["EMP".to_string(), "GUI".to_string()],
            ..AppConfig::default()
        }
    }

    fn production() -> Vec<ProductionRecord> {
        vec![
            ProductionRecord::new(date(1), "Aurora", "Hold 1", "Berth 1", 30.0),
            ProductionRecord::new(date(1), "Aurora", "Hold 2", "Berth 2", 50.0),
            ProductionRecord::new(date(2), "Ocean Star", "Hold 1", "Berth 2", 20.0),
            ProductionRecord::new(date(2), "Ocean Star", "Hold 1", "Anchorage", 999.0),
            ProductionRecord::new(date(9), "Aurora", "Hold 1", "Berth 1", 70.0),
        ]
    }

    fn usage() -> Vec<EquipmentUsage> {
        vec![
            EquipmentUsage::new(date(1), "EMP-01", "Yard", "07:00", "13:00"),
            EquipmentUsage::new(date(1), "GUI-02", "Berth 1", "23:00", "01:00"),
            EquipmentUsage::new(date(2), "emp-07", "Yard", "08:00", "08:30"),
            EquipmentUsage::new(date(2), "PC-01", "Yard", "08:00", "09:00"),
        ]
    }

    fn operation(d: NaiveDate, vessel: &str, start: &str, end: &str) -> VesselOperation {
        VesselOperation {
            id: uuid::Uuid::new_v4().to_string(),
            date: d,
            vessel: vessel.to_string(),
            berth: "Berth 1".to_string(),
            work_front: "Front A".to_string(),
            supervisor: "M. Souza".to_string(),
            start_time: start.to_string(),
            end_time: end.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_filter_matches() {
        let filter = DashboardFilter::new(date(1), date(2));
        assert!(filter.contains(date(1)));
        assert!(filter.contains(date(2)));
        assert!(!filter.contains(date(3)));

        let filter = filter.with_vessel("Aurora");
        let recs = production();
        assert!(filter.matches(&recs[0]));
        assert!(!filter.matches(&recs[2]));
        assert!(!filter.matches(&recs[4]));
    }

    #[test]
    fn test_dashboard_build() {
        let filter = DashboardFilter::new(date(1), date(2));
        let dash = Dashboard::build(filter, &production(), &usage(), &config()).unwrap();

        // Anchorage is not a known location; day 9 is outside the range
        assert_eq!(dash.location_tons.labels, vec!["Berth 1", "Berth 2", "Yard"]);
        assert_eq!(dash.location_tons.values, vec![30.0, 70.0, 0.0]);
        assert_eq!(dash.location_share.values, vec![30.0, 70.0, 0.0]);

        // PC is not a configured type
        assert_eq!(dash.equipment_hours.labels, vec!["EMP", "GUI"]);
        assert_eq!(dash.equipment_hours.values, vec![6.5, 2.0]);

        assert_eq!(dash.production_by_day.days.len(), 2);
        assert_eq!(dash.production_by_day.grand_total, 1099.0);
        assert_eq!(dash.vessels.len(), 2);
    }

    #[test]
    fn test_dashboard_vessel_filter() {
        let filter = DashboardFilter::new(date(1), date(30)).with_vessel("Aurora");
        let dash = Dashboard::build(filter, &production(), &[], &config()).unwrap();

        assert_eq!(dash.vessels.len(), 1);
        assert_eq!(dash.production_by_day.grand_total, 150.0);
        assert_eq!(dash.equipment_hours.values, vec![0.0, 0.0]);
    }

    #[test]
    fn test_dashboard_empty_range() {
        let filter = DashboardFilter::new(date(20), date(21));
        let dash = Dashboard::build(filter, &production(), &usage(), &config()).unwrap();

        assert_eq!(dash.location_share.values, vec![0.0, 0.0, 0.0]);
        assert!(dash.production_by_day.is_empty());
        assert!(dash.vessels.is_empty());
    }

    #[test]
    fn test_dashboard_rejects_bad_time() {
        let bad = vec![EquipmentUsage::new(date(1), "EMP-01", "Yard", "7h", "13:00")];
        let filter = DashboardFilter::new(date(1), date(2));
        assert!(Dashboard::build(filter, &[], &bad, &config()).is_err());
    }

    #[test]
    fn test_rdo() {
        let operations = vec![
            operation(date(1), "Ocean Star", "07:00", "19:00"),
            operation(date(1), "Aurora", "19:00", "07:00"),
            operation(date(2), "Aurora", "07:00", "19:00"),
        ];
        let attendance = vec![
            CrewAttendance::new(date(1), "Front A", "João", true),
            CrewAttendance::new(date(1), "Front A", "Ana", false),
            CrewAttendance::new(date(1), "Front B", "Caio", true),
            CrewAttendance::new(date(2), "Front B", "Caio", false),
        ];

        let rdo = DailyOperationsReport::build(
            date(1),
            &operations,
            &usage(),
            &production(),
            &attendance,
            &config(),
        )
        .unwrap();

        assert_eq!(rdo.operations.len(), 2);
        assert_eq!(rdo.operations[0].vessel, "Aurora");
        assert_eq!(rdo.total_shift_hours, 24.0);

        assert_eq!(rdo.equipment_hours[0].total, 6.0);
        assert_eq!(rdo.equipment_hours[1].total, 2.0);

        assert_eq!(rdo.tons_by_vessel.len(), 1);
        assert_eq!(rdo.tons_by_vessel[0].total, 80.0);
        assert_eq!(rdo.tons_by_hold[0].key, "Aurora / Hold 1");
        assert_eq!(rdo.tons_by_hold[1].total, 50.0);
        assert_eq!(rdo.total_tons, 80.0);

        assert_eq!(rdo.attendance.len(), 2);
        assert_eq!(rdo.attendance[0].rate_percent, 50.0);
        assert_eq!(rdo.attendance[1].rate_percent, 100.0);
    }

    #[test]
    fn test_rdo_empty_day() {
        let rdo = DailyOperationsReport::build(date(15), &[], &[], &[], &[], &config()).unwrap();

        assert!(rdo.operations.is_empty());
        assert_eq!(rdo.total_shift_hours, 0.0);
        assert_eq!(rdo.equipment_hours.len(), 2);
        assert_eq!(rdo.total_tons, 0.0);
        assert!(rdo.attendance.is_empty());
    }

    #[test]
    fn test_rdo_orders_by_clock_time() {
        let operations = vec![
            operation(date(1), "Aurora", "19:00", "23:00"),
            operation(date(1), "Aurora", "7:00", "11:00"),
            operation(date(1), "Aurora", "10:30", "12:00"),
        ];

        let rdo =
            DailyOperationsReport::build(date(1), &operations, &[], &[], &[], &config()).unwrap();

        let starts: Vec<&str> = rdo.operations.iter().map(|l| l.start_time.as_str()).collect();
        assert_eq!(starts, vec!["7:00", "10:30", "19:00"]);
    }
}
