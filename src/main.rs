// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::path::PathBuf;

// Use library instead of local modules
use port_ops::{
    by_day, count_production, get_attendance_on, get_equipment_usage_between, get_operations_on,
    get_production_between, insert_equipment_usage, insert_production, load_equipment_csv,
    load_production_csv, logging, open_database, production_day_rows, write_daily_report_csv,
    AppConfig, DailyOperationsReport, Dashboard, DashboardFilter,
};

#[derive(Parser)]
#[command(name = "port-ops", version, about = "Port operations dashboard")]
struct Cli {
    /// Config file (default: <config dir>/port-ops/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Import production tonnage (date,vessel,hold,location,tons)
    ImportProduction { csv: PathBuf },

    /// Import equipment usage (date,equipment_tag,location,start_time,end_time)
    ImportEquipment { csv: PathBuf },

    /// Print production by day for a date range
    Report {
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
        #[arg(long)]
        vessel: Option<String>,
        /// Also write the report as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Print the daily operations report (RDO)
    Rdo {
        #[arg(long)]
        date: NaiveDate,
    },

    /// Open the terminal dashboard (default)
    Ui {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();
    let config = AppConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Some(Command::ImportProduction { csv }) => run_import_production(&config, csv),
        Some(Command::ImportEquipment { csv }) => run_import_equipment(&config, csv),
        Some(Command::Report { from, to, vessel, csv }) => run_report(&config, from, to, vessel, csv),
        Some(Command::Rdo { date }) => run_rdo(&config, date),
        Some(Command::Ui { from, to }) => run_ui_mode(&config, from, to),
        None => run_ui_mode(&config, None, None),
    }
}

fn run_import_production(config: &AppConfig, csv: PathBuf) -> Result<()> {
    println!("🗄️  Production import - CSV → SQLite");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    println!("\n📂 Loading {}...", csv.display());
    let records = load_production_csv(&csv)?;
    println!("✓ Loaded {} production rows", records.len());

    let conn = open_database(&config.database_path)?;
    let inserted = insert_production(&conn, &records, "csv_importer")?;
    let count = count_production(&conn)?;

    println!("✓ Inserted: {}", inserted);
    println!("✓ Skipped duplicates: {}", records.len() - inserted);
    println!("✓ Store now holds {} production rows", count);

    Ok(())
}

fn run_import_equipment(config: &AppConfig, csv: PathBuf) -> Result<()> {
    println!("🗄️  Equipment import - CSV → SQLite");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let usage = load_equipment_csv(&csv)?;
    println!("✓ Loaded {} equipment rows", usage.len());

    let conn = open_database(&config.database_path)?;
    let inserted = insert_equipment_usage(&conn, &usage, "csv_importer")?;

    println!("✓ Inserted: {}", inserted);
    println!("✓ Skipped duplicates: {}", usage.len() - inserted);

    Ok(())
}

fn run_report(
    config: &AppConfig,
    from: NaiveDate,
    to: NaiveDate,
    vessel: Option<String>,
    csv: Option<PathBuf>,
) -> Result<()> {
    let conn = open_database(&config.database_path)?;
    let production: Vec<_> = get_production_between(&conn, from, to)?
        .into_iter()
        .filter(|r| vessel.as_deref().map_or(true, |v| r.vessel == v))
        .collect();

    let report = by_day(&production_day_rows(&production)?);
    let decimals = config.display_decimals;

    println!(
        "📊 Production {} → {}{}",
        from,
        to,
        vessel.as_deref().map(|v| format!(" ({})", v)).unwrap_or_default()
    );
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for day in &report.days {
        let bar = "█".repeat((day.width_percent / 5.0).round() as usize);
        println!(
            "{}  {:>12.*}  {:>12.*}  {}",
            day.day, decimals, day.total, decimals, day.running_total, bar
        );
    }
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Total: {:.*} t", decimals, report.grand_total);

    if let Some(path) = csv {
        let file = File::create(&path).with_context(|| format!("Failed to create {:?}", path))?;
        write_daily_report_csv(&report, file)?;
        println!("✓ Report written to {}", path.display());
    }

    Ok(())
}

fn run_rdo(config: &AppConfig, date: NaiveDate) -> Result<()> {
    let conn = open_database(&config.database_path)?;

    let rdo = DailyOperationsReport::build(
        date,
        &get_operations_on(&conn, date)?,
        &get_equipment_usage_between(&conn, date, date)?,
        &get_production_between(&conn, date, date)?,
        &get_attendance_on(&conn, date)?,
        config,
    )?;

    println!("📋 RDO - {}", rdo.date);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    println!("\nOperations ({:.2} h):", rdo.total_shift_hours);
    for op in &rdo.operations {
        println!(
            "  {} @ {} [{}] {}-{} {:.2} h ({})",
            op.vessel, op.berth, op.work_front, op.start_time, op.end_time, op.hours, op.supervisor
        );
    }

    println!("\nEquipment hours:");
    for group in &rdo.equipment_hours {
        println!("  {:<8} {:>8.2} h", group.key, group.total);
    }

    println!("\nProduction ({:.*} t):", config.display_decimals, rdo.total_tons);
    for group in &rdo.tons_by_hold {
        println!("  {:<30} {:>12.*} t", group.key, config.display_decimals, group.total);
    }

    println!("\nAttendance:");
    for line in &rdo.attendance {
        println!(
            "  {:<20} {}/{} ({:.0}%)",
            line.work_front, line.present, line.total, line.rate_percent
        );
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn default_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> (NaiveDate, NaiveDate) {
    let to = to.unwrap_or_else(|| Local::now().date_naive());
    let from = from.unwrap_or(to - Duration::days(30));
    (from, to)
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &AppConfig, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<()> {
    let (from, to) = default_range(from, to);

    if !config.database_path.exists() {
        eprintln!("❌ Database not found at {:?}", config.database_path);
        eprintln!("   Run: port-ops import-production <file.csv>");
        eprintln!("   to import production rows first.");
        std::process::exit(1);
    }

    let conn = open_database(&config.database_path)?;

    println!("📊 Loading {} → {}...", from, to);
    let production = get_production_between(&conn, from, to)?;
    let usage = get_equipment_usage_between(&conn, from, to)?;
    let dashboard = Dashboard::build(DashboardFilter::new(from, to), &production, &usage, config)?;

    let mut app = ui::App::new(dashboard);
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &AppConfig, _from: Option<NaiveDate>, _to: Option<NaiveDate>) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use web UI: cargo run --bin port-ops-server --features server");
    std::process::exit(1);
}
