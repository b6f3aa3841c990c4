//! Period totals and previews of simulated records.

use std::collections::BTreeMap;

use chrono::Datelike;
use serde::Serialize;

use crate::output::CaseRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyTotal {
    pub diagnosis: String,
    pub year: i32,
    pub month: u32,
    pub cases: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearlyTotal {
    pub diagnosis: String,
    pub year: i32,
    pub cases: u64,
}

/// Cases of `diagnosis` summed per calendar month, chronologically.
pub fn monthly_totals(records: &[CaseRecord], diagnosis: &str) -> Vec<MonthlyTotal> {
    let mut totals: BTreeMap<(i32, u32), u64> = BTreeMap::new();
    for record in records.iter().filter(|r| r.diagnosis() == diagnosis) {
        let date = record.date();
        *totals.entry((date.year(), date.month())).or_default() += record.count();
    }
    totals
        .into_iter()
        .map(|((year, month), cases)| MonthlyTotal {
            diagnosis: diagnosis.to_string(),
            year,
            month,
            cases,
        })
        .collect()
}

/// Cases of `diagnosis` summed per calendar year, chronologically.
pub fn yearly_totals(records: &[CaseRecord], diagnosis: &str) -> Vec<YearlyTotal> {
    let mut totals: BTreeMap<i32, u64> = BTreeMap::new();
    for record in records.iter().filter(|r| r.diagnosis() == diagnosis) {
        *totals.entry(record.date().year()).or_default() += record.count();
    }
    totals
        .into_iter()
        .map(|(year, cases)| YearlyTotal {
            diagnosis: diagnosis.to_string(),
            year,
            cases,
        })
        .collect()
}

/// The first `n` records.
pub fn preview(records: &[CaseRecord], n: usize) -> &[CaseRecord] {
    &records[..n.min(records.len())]
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn record(year: i32, month: u32, day: u32, diagnosis: &str, count: u64) -> CaseRecord {
        CaseRecord::new(
            NaiveDate::from_ymd_opt(year, month, day).unwrap(),
            "Accra",
            diagnosis,
            count,
        )
    }

    fn records() -> Vec<CaseRecord> {
        vec![
            record(2023, 12, 30, "Asthma (J45)", 4),
            record(2023, 12, 30, "Influenza (J09–J11)", 2),
            record(2023, 12, 31, "Asthma (J45)", 6),
            record(2024, 1, 1, "Asthma (J45)", 1),
            record(2024, 2, 1, "Asthma (J45)", 3),
            record(2024, 2, 1, "Influenza (J09–J11)", 9),
        ]
    }

    #[test]
    fn test_monthly_totals() {
        let totals = monthly_totals(&records(), "Asthma (J45)");
        let flat: Vec<_> = totals.iter().map(|t| (t.year, t.month, t.cases)).collect();
        assert_eq!(flat, vec![(2023, 12, 10), (2024, 1, 1), (2024, 2, 3)]);
        assert!(monthly_totals(&records(), "Pneumonia (J12–J18)").is_empty());
    }

    #[test]
    fn test_yearly_totals() {
        let totals = yearly_totals(&records(), "Influenza (J09–J11)");
        assert_eq!(
            totals,
            vec![
                YearlyTotal {
                    diagnosis: "Influenza (J09–J11)".to_string(),
                    year: 2023,
                    cases: 2
                },
                YearlyTotal {
                    diagnosis: "Influenza (J09–J11)".to_string(),
                    year: 2024,
                    cases: 9
                },
            ]
        );
    }

    #[test]
    fn test_preview() {
        let records = records();
        assert_eq!(preview(&records, 2).len(), 2);
        assert_eq!(preview(&records, 100).len(), records.len());
        assert!(preview(&[], 5).is_empty());
    }
}
