// Port Operations Dashboard - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod error;
pub mod numeric;
pub mod interval;   // Elapsed hours between HH:MM times
pub mod ledger;     // Group-and-sum aggregator
pub mod chart;      // Chart-ready series
pub mod report;     // Day-by-day production reports
pub mod records;    // Stored port records
pub mod dashboard;  // Dashboard views + RDO
pub mod db;
pub mod config;
pub mod logging;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use error::{CoreError, CoreResult};
pub use numeric::{percent_of, round_to, safe_ratio};
pub use interval::{hours_between, ClockTime, TimeRecord};
pub use ledger::{equipment_type, group_sum, ledger_rows, AggregatedGroup, LedgerRow};
pub use chart::{to_absolute, to_percentages, ChartSeries};
pub use report::{
    by_day, by_vessel, production_day_rows, write_daily_report_csv,
    DailyReport, DayTotal, VesselReport,
};
pub use records::{CrewAttendance, EquipmentUsage, ProductionRecord, VesselOperation};
pub use dashboard::{
    Dashboard, DashboardFilter, DailyOperationsReport,
    AttendanceLine, OperationLine,
};
pub use db::{
    Event, StoreError,
    open_database, setup_database,
    insert_production, insert_equipment_usage, insert_operation, update_operation,
    insert_attendance, insert_event,
    get_production_between, get_equipment_usage_between, get_operation,
    get_operations_on, get_attendance_on, get_events_for_entity, get_vessels,
    count_production, load_production_csv, load_equipment_csv,
};
pub use config::AppConfig;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
