// 🧾 Report Projector - day-by-day production totals
//
// Display values are rounded to 3 decimals. Grand total, running total,
// max day and bar widths are all computed from the unrounded day sums so
// rounding error never compounds across days.

use crate::error::CoreResult;
use crate::ledger::{ledger_rows, LedgerRow};
use crate::numeric::{percent_of, round_to};
use crate::records::ProductionRecord;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;

pub const REPORT_DECIMALS: u32 = 3;

// ============================================================================
// DAILY REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayTotal {
    pub day: String,
    /// Day total, rounded for display
    pub total: f64,
    /// Total up to and including this day, rounded for display
    pub running_total: f64,
    /// Bar width relative to the largest day (0-100)
    pub width_percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    pub days: Vec<DayTotal>,
    /// Unrounded sum of every day
    pub grand_total: f64,
    /// Largest unrounded single-day total
    pub max_day: f64,
}

impl DailyReport {
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn day(&self, day: &str) -> Option<&DayTotal> {
        self.days.iter().find(|d| d.day == day)
    }
}

/// Group rows by day key (ISO date), ascending
///
/// Example:
/// ```
/// use port_ops::{by_day, LedgerRow};
///
/// let rows = vec![
///     LedgerRow::new("2024-01-02", 5.0).unwrap(),
///     LedgerRow::new("2024-01-01", 1.2345).unwrap(),
///     LedgerRow::new("2024-01-01", 0.1).unwrap(),
/// ];
/// let report = by_day(&rows);
///
/// assert_eq!(report.days[0].day, "2024-01-01");
/// assert_eq!(report.days[0].total, 1.335);
/// assert_eq!(report.max_day, 5.0);
/// ```
pub fn by_day(rows: &[LedgerRow]) -> DailyReport {
    let mut sums: BTreeMap<&str, f64> = BTreeMap::new();
    for row in rows {
        *sums.entry(row.group_key.as_str()).or_insert(0.0) += row.amount;
    }

    let grand_total: f64 = sums.values().sum();
    let max_day = sums.values().copied().fold(0.0, f64::max);

    let mut running = 0.0;
    let days = sums
        .into_iter()
        .map(|(day, total)| {
            running += total;
            DayTotal {
                day: day.to_string(),
                total: round_to(total, REPORT_DECIMALS),
                running_total: round_to(running, REPORT_DECIMALS),
                width_percent: percent_of(total, max_day),
            }
        })
        .collect();

    DailyReport {
        days,
        grand_total,
        max_day,
    }
}

// ============================================================================
// PER-VESSEL REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselReport {
    pub vessel: String,
    pub report: DailyReport,
}

/// Tonnage rows keyed by day
pub fn production_day_rows(records: &[ProductionRecord]) -> CoreResult<Vec<LedgerRow>> {
    ledger_rows(records, |r| Ok(r.day_key()), |r| r.checked_tons())
}

/// Per-day production sub-totals for every vessel, vessels sorted by name
pub fn by_vessel(records: &[ProductionRecord]) -> CoreResult<Vec<VesselReport>> {
    let mut per_vessel: BTreeMap<&str, Vec<LedgerRow>> = BTreeMap::new();
    for record in records {
        per_vessel
            .entry(record.vessel.as_str())
            .or_default()
            .push(LedgerRow::new(record.day_key(), record.checked_tons()?)?);
    }

    Ok(per_vessel
        .into_iter()
        .map(|(vessel, rows)| VesselReport {
            vessel: vessel.to_string(),
            report: by_day(&rows),
        })
        .collect())
}

// ============================================================================
// CSV EXPORT
// ============================================================================

#[derive(Serialize)]
struct DayTotalCsvRow<'a> {
    #[serde(rename = "Day")]
    day: &'a str,
    #[serde(rename = "Total")]
    total: String,
    #[serde(rename = "Running_Total")]
    running_total: String,
    #[serde(rename = "Width_Percent")]
    width_percent: String,
}

/// Write a daily report as CSV, ending with a grand-total line
pub fn write_daily_report_csv<W: Write>(report: &DailyReport, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    for day in &report.days {
        wtr.serialize(DayTotalCsvRow {
            day: &day.day,
            total: format!("{:.3}", day.total),
            running_total: format!("{:.3}", day.running_total),
            width_percent: format!("{:.1}", day.width_percent),
        })
        .context("Failed to write report row")?;
    }

    wtr.serialize(DayTotalCsvRow {
        day: "TOTAL",
        total: format!("{:.3}", report.grand_total),
        running_total: format!("{:.3}", report.grand_total),
        width_percent: String::new(),
    })
    .context("Failed to write report total")?;

    wtr.flush().context("Failed to flush report CSV")?;
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
