use std::fs;
use std::path::Path;

use chrono::NaiveDate;

use odds_snapshots::client::OddsApiClient;
use odds_snapshots::config::ApiConfig;
use odds_snapshots::historical::{run_historical, HistoricalRun, HistoricalSummary, SnapshotTime};
use odds_snapshots::timestamp::UtcHour;

fn config(base_url: &str, root: &Path) -> ApiConfig {
    ApiConfig {
        api_key: "test-key".to_string(),
        base_url: base_url.to_string(),
        bookmakers: None,
        sports: vec!["icehockey_nhl".to_string()],
        live_output_dir: root.join("data"),
        historical_output_dir: root.join("odds-data").join("historical"),
    }
}

fn run(config: &ApiConfig, start: (i32, u32, u32), end: (i32, u32, u32)) -> HistoricalRun {
    HistoricalRun {
        sport: "icehockey_nhl".to_string(),
        start: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
        end: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
        snapshot_time: SnapshotTime::new(UtcHour::default(), 0).unwrap(),
        label: None,
        output_dir: config.historical_output_dir.clone(),
    }
}

#[test]
fn days_already_on_disk_make_no_requests() {
    let dir = tempfile::tempdir().unwrap();
    // Nothing listens here; any request would fail the day
    let config = config("http://127.0.0.1:9", dir.path());
    let client = OddsApiClient::new(&config).unwrap();
    let run = run(&config, (2024, 1, 5), (2024, 1, 6));

    fs::create_dir_all(&run.output_dir).unwrap();
    fs::write(run.output_dir.join("odds_2024-01-05.csv"), "date\r\n").unwrap();
    fs::write(dir.path().join("odds-data").join("odds_2024-01-06.csv"), "date\r\n").unwrap();

    let summary = tokio_test::block_on(run_historical(&client, &run)).unwrap();
    assert_eq!(
        summary,
        HistoricalSummary {
            total_days: 2,
            days_skipped: 2,
            ..Default::default()
        }
    );
}

#[test]
fn unreachable_api_fails_each_day_without_stopping() {
    let dir = tempfile::tempdir().unwrap();
    let config = config("http://127.0.0.1:9", dir.path());
    let client = OddsApiClient::new(&config).unwrap();
    let run = run(&config, (2024, 1, 5), (2024, 1, 6));

    let summary = tokio_test::block_on(run_historical(&client, &run)).unwrap();
    assert_eq!(summary.total_days, 2);
    assert_eq!(summary.days_failed, 2);
    assert_eq!(summary.rows_written, 0);
    assert!(!run.output_dir.join("odds_2024-01-05.csv").exists());
}

#[test]
fn reversed_range_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let config = config("http://127.0.0.1:9", dir.path());
    let client = OddsApiClient::new(&config).unwrap();
    let run = run(&config, (2024, 1, 6), (2024, 1, 5));

    let summary = tokio_test::block_on(run_historical(&client, &run)).unwrap();
    assert_eq!(summary, HistoricalSummary::default());
}
