//! BDD tests for a full classification run.
//!
//! These tests drive the runner the way the CLI does:
//! - Bars CSV in, classified records out
//! - Records persisted and read back
//! - Manifest written with counts and fingerprint
//! - Distribution reports built from the persisted records

use chrono::{FixedOffset, NaiveDate};
use daytype_core::data::{read_bars, SessionStore};
use daytype_core::{DayType, IbSize};
use daytype_runner::{
    distributions, load_manifest, load_records, run_classification, save_manifest, save_records,
    save_reports, RunConfig, RunManifest,
};

const BARS_CSV: &str = "\
symbol,timestamp,open,high,low,close,volume
NIFTY_50,2024-03-04 09:15,22000,22040,21990,22030,1000
NIFTY_50,2024-03-04 09:45,22030,22050,22010,22045,800
NIFTY_50,2024-03-04 12:00,22045,22250,22040,22240,900
NIFTY_50,2024-03-04 15:15,22240,22260,22230,22255,700
NIFTY_50,2024-03-05 13:00,22250,22260,22200,22210,500
NIFTY_BANK,2024-03-04T03:45:00Z,47000,47100,46900,47050,
NIFTY_BANK,2024-03-04T06:30:00Z,47050,47200,46800,47010,
NIFTY_BANK,2024-03-04T09:45:00Z,47010,47020,46990,47005,
";

fn ist() -> FixedOffset {
    FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap()
}

fn source() -> SessionStore {
    read_bars(BARS_CSV.as_bytes(), "bars.csv", ist()).expect("bars should parse")
}

#[test]
fn bdd_scenario_classify_a_bars_file() {
    // GIVEN a bars file with two indices and the default NSE config
    let store = source();
    let config = RunConfig::default();

    // WHEN the run classifies every session
    let run = run_classification(&store, &config).expect("run should succeed");

    // THEN each full session gets a record, sorted by (index, date)
    assert_eq!(run.records.len(), 2);
    assert_eq!(run.records[0].index, "NIFTY_50");
    assert_eq!(run.records[1].index, "NIFTY_BANK");

    // AND the NIFTY_50 breakout that closes at the high is a Trend Day
    // (IB 21990-22050, day 21990-22260, close 22255)
    let nifty = &run.records[0];
    assert_eq!(nifty.day_type, DayType::Trend);
    assert_eq!(nifty.day_range, 270.0);
    assert_eq!(nifty.ib_size, IbSize::Small);

    // AND the NIFTY_BANK session, whose UTC timestamps map to 09:15/12:00/15:15 IST,
    // extends both ways and closes near the middle
    assert_eq!(run.records[1].day_type, DayType::NeutralCenter);

    // AND the afternoon-only day is counted as skipped, not recorded
    assert_eq!(run.stats["NIFTY_50"].skipped, 1);
    assert_eq!(run.skipped(), 1);
}

#[test]
fn bdd_scenario_restrict_run_to_one_index_and_date() {
    // GIVEN a config selecting NIFTY_50 on 5 March only
    let config = RunConfig::from_toml(
        r#"
        [run]
        indices = ["NIFTY_50"]
        start_date = "2024-03-05"
        end_date = "2024-03-05"
        parallel = false
        "#,
    )
    .unwrap();

    // WHEN the run executes
    let run = run_classification(&source(), &config).unwrap();

    // THEN nothing is classified and the one session in range is skipped
    assert!(run.is_empty());
    assert_eq!(run.stats.len(), 1);
    assert_eq!(run.stats["NIFTY_50"].sessions, 1);
    assert_eq!(run.stats["NIFTY_50"].skipped, 1);
}

#[test]
fn bdd_scenario_persist_records_and_manifest() {
    // GIVEN a completed run
    let config = RunConfig::default();
    let run = run_classification(&source(), &config).unwrap();
    let temp_dir = tempfile::tempdir().unwrap();
    let run_date = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();

    // WHEN records and manifest are saved
    let records_path = save_records(&run.records, temp_dir.path(), run_date).unwrap();
    let file_name = records_path.file_name().unwrap().to_string_lossy().to_string();
    let manifest = RunManifest::new(&run, config.fingerprint().unwrap(), "bars.csv", file_name);
    let manifest_path = save_manifest(&manifest, temp_dir.path()).unwrap();

    // THEN the records file is named after the run date and reads back identically
    assert!(records_path.ends_with("mp_daytype_stats_2024-03-06.csv"));
    assert_eq!(load_records(&records_path).unwrap(), run.records);

    // AND the manifest carries the counts, skip total and date span
    let loaded = load_manifest(&manifest_path).unwrap();
    assert_eq!(loaded, manifest);
    assert_eq!(loaded.record_count, 2);
    assert_eq!(loaded.skipped_count, 1);
    assert_eq!(loaded.first_date, NaiveDate::from_ymd_opt(2024, 3, 4));
    assert_eq!(loaded.config_fingerprint, config.fingerprint().unwrap());
}

#[test]
fn bdd_scenario_build_reports_from_persisted_records() {
    // GIVEN records persisted by an earlier run
    let run = run_classification(&source(), &RunConfig::default()).unwrap();
    let temp_dir = tempfile::tempdir().unwrap();
    let run_date = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
    let records_path = save_records(&run.records, temp_dir.path(), run_date).unwrap();

    // WHEN reports are generated from the file
    let records = load_records(&records_path).unwrap();
    let report_dir = temp_dir.path().join("reports");
    let written = save_reports(&distributions(&records), &report_dir).unwrap();

    // THEN two pivots per index plus the Markdown report exist
    assert_eq!(written.len(), 5);
    for name in [
        "NIFTY_50_year_daytype.csv",
        "NIFTY_50_month_daytype.csv",
        "NIFTY_BANK_year_daytype.csv",
        "NIFTY_BANK_month_daytype.csv",
        "daytype_report.md",
    ] {
        assert!(report_dir.join(name).exists(), "{name} missing");
    }

    // AND the March row of the NIFTY_50 month pivot is 100% Trend
    let month = std::fs::read_to_string(report_dir.join("NIFTY_50_month_daytype.csv")).unwrap();
    assert_eq!(month.lines().nth(3), Some("3,0.0,0.0,0.0,0.0,0.0,100.0,1"));
}

#[test]
fn bdd_scenario_invalid_config_stops_the_run() {
    // GIVEN a config whose IB ends after the session closes
    let config = RunConfig::from_toml("[session]\nclose = \"10:00\"\n").unwrap();

    // WHEN the run starts
    let result = run_classification(&source(), &config);

    // THEN it fails before classifying anything
    assert!(result.is_err());
}
