//! End-to-end tests for the analysis pipeline
//!
//! Loads a generated rental CSV, runs the full analysis and checks the
//! files written for downstream plotting.

use std::fs;

use bikecast_core::data::{CsvSpec, DailySeries};
use bikecast_core::utils::testing::white_noise;
use bikecast_forecast::{Analysis, AnalysisConfig};
use chrono::{Duration, NaiveDate};

fn rental_csv(days: usize) -> String {
    let start = NaiveDate::from_ymd_opt(2011, 1, 1).unwrap();
    let noise = white_noise(days, 731);
    let mut out = String::from("instant,dteday,season,cnt\n");
    for i in 0..days {
        let t = i as f64;
        let mut count = 1500.0
            + 6.0 * t
            + 200.0 * (t * 2.0 * std::f64::consts::PI / 7.0).sin()
            + 150.0 * (t * 2.0 * std::f64::consts::PI / 30.0).cos()
            + 40.0 * noise[i];
        if i == 100 {
            count = 22.0;
        }
        let date = start + Duration::days(i as i64);
        if i == 50 {
            // a day missing from the export
            continue;
        }
        out.push_str(&format!(
            "{},{},1,{}\n",
            i + 1,
            date.format("%Y-%m-%d"),
            count.round()
        ));
    }
    out
}

fn config() -> AnalysisConfig {
    AnalysisConfig::from_toml_str(
        r#"
        horizon = 14
        holdout = 20
        seasonal_refit = false

        [manual_order]
        p = 1
        d = 1
        q = 7

        [auto]
        max_models = 15
        "#,
    )
    .unwrap()
}

#[test]
fn e2e_full_analysis_writes_outputs() {
    let series =
        DailySeries::from_csv_reader(rental_csv(300).as_bytes(), &CsvSpec::default()).unwrap();
    assert_eq!(series.len(), 300);
    assert_eq!(series.missing_count(), 1);

    let report = Analysis::new(config()).run(&series).unwrap();

    let day = |i: i64| NaiveDate::from_ymd_opt(2011, 1, 1).unwrap() + Duration::days(i);
    assert_eq!(report.cleaning.missing, vec![day(50)]);
    assert!(report.cleaning.outliers.contains(&day(100)));
    assert_eq!(report.decomposition.period, 30);
    assert_eq!(report.decomposition.length, 294);
    assert_eq!(report.decomposition.detected_period, Some(7));

    let manual = report.manual_model.as_ref().unwrap();
    assert_eq!(manual.spec.order.q, 7);
    assert_eq!(manual.summary.ma.len(), 7);
    assert_eq!(report.forecast.label, "manual");
    assert_eq!(report.forecast.rows.len(), 14);
    assert_eq!(report.forecast.rows[0].date, day(297));

    let holdout = report.holdout.as_ref().unwrap();
    assert_eq!(holdout.train_len, 274);
    assert!(holdout.accuracy.mape < 15.0);
    assert_eq!(holdout.baseline.forecast.len(), 20);
    assert!(holdout.baseline.accuracy.mape.is_finite());

    let dir = tempfile::tempdir().unwrap();
    report.write_to_dir(dir.path()).unwrap();

    let annotated = fs::read_to_string(dir.path().join("annotated.csv")).unwrap();
    assert_eq!(annotated.lines().count(), 301);
    let forecast = fs::read_to_string(dir.path().join("forecast.csv")).unwrap();
    assert!(forecast.starts_with("date,mean,se,lo80,hi80,lo95,hi95"));
    assert_eq!(forecast.lines().count(), 15);

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("report.json")).unwrap())
            .unwrap();
    assert_eq!(json["observations"], 300);
    assert_eq!(json["manual_model"]["label"], "manual");
    assert!(json.get("rows").is_none());
}

#[test]
fn e2e_seasonal_refit() {
    let series =
        DailySeries::from_csv_reader(rental_csv(240).as_bytes(), &CsvSpec::default()).unwrap();
    let mut config = config();
    config.manual_order = None;
    config.holdout = 0;
    config.seasonal_refit = true;
    config.auto.max_models = 8;

    let report = Analysis::new(config).run(&series).unwrap();
    let seasonal = report.seasonal_model.as_ref().unwrap();
    assert_eq!(seasonal.spec.seasonal.map(|s| s.period), Some(30));
    assert_eq!(report.seasonal_forecast.as_ref().unwrap().rows.len(), 14);
    assert!(report.holdout.is_none());
}

#[test]
fn e2e_too_short_series_fails() {
    let series =
        DailySeries::from_csv_reader(rental_csv(40).as_bytes(), &CsvSpec::default()).unwrap();
    assert!(Analysis::new(config()).run(&series).is_err());
}
