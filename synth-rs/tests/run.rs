use std::fs;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use synthcase::{
    CalendarAdjustment, CaseRecord, DiseaseTable, Environment, Error, SimulationRequest,
    Simulator,
};

const ASSUMPTIONS: &str = r#"
[[diagnosis]]
key = "Upper Respiratory Tract Infection (J00–J06)"
baseline_daily_cases = 0.2
seasonal_weights = [1.3, 1.1, 0.8, 0.8, 1.0, 1.2, 1.0, 0.7, 0.8, 0.9, 1.0, 1.2]
minimum_one = true
linear_trend = { base_year = 2015, rate = 0.07, first_year = 2015, last_year = 2024 }

[[diagnosis]]
key = "Influenza (J09–J11)"
baseline_daily_cases = 0.2
seasonal_weights = [0.5, 0.5, 0.7, 0.8, 1.0, 1.3, 1.0, 0.7, 1.1, 0.9, 0.6, 0.5]
linear_trend = { base_year = 2015, rate = 0.0, first_year = 2015, last_year = 2024 }

[feasts]
2020 = ["2020-05-24", "2020-07-31"]
"#;

#[derive(Debug, Deserialize)]
struct Input {
    location: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

fn run(ctx: &Environment<Input>) -> Result<Vec<CaseRecord>, Error> {
    let input = ctx.input.as_ref().unwrap();
    let table = DiseaseTable::from_path(ctx.file("assumptions")?)?;
    let request =
        SimulationRequest::new(&input.location, input.start_date, input.end_date, ctx.seed)?;
    let calendar = CalendarAdjustment::with_feasts(table.feasts().clone());
    let records = Simulator::new(&table, calendar).simulate(&request)?;
    ctx.write_records("cases.csv", &records)?;
    Ok(records)
}

fn environment(dir: &std::path::Path, start: &str, end: &str) -> Environment<Input> {
    let assumptions = dir.join("assumptions.toml");
    fs::write(&assumptions, ASSUMPTIONS).unwrap();
    Environment::from_json(json!({
        "input": {
            "seed": 42,
            "location": "Accra",
            "start_date": start,
            "end_date": end
        },
        "model": {
            "files": { "assumptions": assumptions.to_str().unwrap() }
        },
        "output": {
            "profile": {
                "default": {
                    "spec": "filesystem",
                    "dir": dir.join("output").to_str().unwrap()
                }
            }
        }
    }))
    .with_input_type::<Input>()
    .unwrap()
}

#[test]
fn test_full_run() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = environment(dir.path(), "2020-01-01", "2020-12-31");
    let records = run(&ctx).unwrap();
    assert_eq!(records.len(), 366 * 2);

    let mut reader = csv::Reader::from_path(dir.path().join("output/cases.csv")).unwrap();
    let written: Vec<CaseRecord> = reader.deserialize().collect::<Result<_, _>>().unwrap();
    assert_eq!(written, records);

    let mut influenza_zeros = 0;
    for pair in written.chunks(2) {
        assert_eq!(pair[0].date(), pair[1].date());
        assert!(pair[0].count() >= 1);
        if pair[1].count() == 0 {
            influenza_zeros += 1;
        }
    }
    // a mean of at most 0.26 leaves most days at zero
    assert!(influenza_zeros > 200);

    // same seed, same output
    let again = run(&ctx).unwrap();
    assert_eq!(again, records);
}

#[test]
fn test_reversed_range_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = environment(dir.path(), "2020-02-01", "2020-01-01");
    assert!(matches!(run(&ctx), Err(Error::InvalidDateRange { .. })));
    assert!(!dir.path().join("output").exists());
}

#[test]
fn test_uncovered_year_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = environment(dir.path(), "2024-12-01", "2025-01-31");
    assert!(matches!(run(&ctx), Err(Error::MissingTrendYear { year: 2025, .. })));
    assert!(!dir.path().join("output").exists());
}
