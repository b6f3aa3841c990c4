use std::collections::BTreeMap;
use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;

use indexmap::IndexMap;
use log::{debug, info};
use serde::Deserialize;

use crate::calendar::FeastTable;
use crate::error::Error;

pub const MONTHS: usize = 12;

/// Baseline rate, monthly seasonality and yearly trend of one diagnosis.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnosis {
    key: String,
    baseline: f64,
    seasonal_weights: [f64; MONTHS],
    trend: BTreeMap<i32, f64>,
    minimum_one: bool,
}

fn check_value(key: &str, field: impl FnOnce() -> String, value: f64) -> Result<(), Error> {
    if !value.is_finite() {
        return Err(Error::NonFiniteParameter {
            key: key.to_string(),
            field: field(),
        });
    }
    if value < 0.0 {
        return Err(Error::NegativeParameter {
            key: key.to_string(),
            field: field(),
            value,
        });
    }
    Ok(())
}

impl Diagnosis {
    /// Validates and builds a diagnosis. `seasonal_weights[0]` is January.
    pub fn new(
        key: impl Into<String>,
        baseline: f64,
        seasonal_weights: &[f64],
        trend: BTreeMap<i32, f64>,
    ) -> Result<Self, Error> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(Error::EmptyDiagnosisKey);
        }
        check_value(&key, || "baseline".to_string(), baseline)?;

        let seasonal_weights: [f64; MONTHS] =
            seasonal_weights
                .try_into()
                .map_err(|_| Error::SeasonalWeightCount {
                    key: key.clone(),
                    got: seasonal_weights.len(),
                })?;
        for (month, weight) in seasonal_weights.iter().enumerate() {
            check_value(
                &key,
                || format!("seasonal weight for month {}", month + 1),
                *weight,
            )?;
        }
        for (year, factor) in &trend {
            check_value(&key, || format!("trend factor for {year}"), *factor)?;
        }

        Ok(Self {
            key,
            baseline,
            seasonal_weights,
            trend,
            minimum_one: false,
        })
    }

    /// Places the diagnosis in the minimum-count set: a sampled zero is
    /// reported as one.
    pub fn with_minimum_one(mut self, minimum_one: bool) -> Self {
        self.minimum_one = minimum_one;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn baseline(&self) -> f64 {
        self.baseline
    }

    pub fn seasonal_weight(&self, month_index: usize) -> Result<f64, Error> {
        self.seasonal_weights
            .get(month_index)
            .copied()
            .ok_or(Error::InvalidMonthIndex(month_index))
    }

    pub fn trend(&self, year: i32) -> Result<f64, Error> {
        self.trend
            .get(&year)
            .copied()
            .ok_or_else(|| Error::MissingTrendYear {
                key: self.key.clone(),
                year,
            })
    }

    pub fn minimum_one(&self) -> bool {
        self.minimum_one
    }
}

/// Free-text description of an assumptions file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Metadata {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

/// Trend growing by `rate` per year from `base_year`, defined for
/// `first_year..=last_year`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinearTrend {
    pub base_year: i32,
    pub rate: f64,
    pub first_year: i32,
    pub last_year: i32,
}

impl LinearTrend {
    /// Longest span of years a linear trend may cover.
    pub const MAX_YEARS: i64 = 1000;

    /// Factor for every year of the trend's range, on behalf of diagnosis `key`.
    pub fn factors(&self, key: &str) -> Result<BTreeMap<i32, f64>, Error> {
        let span = i64::from(self.last_year) - i64::from(self.first_year);
        if !(0..Self::MAX_YEARS).contains(&span) {
            return Err(Error::InvalidTrendRange {
                key: key.to_string(),
                first_year: self.first_year,
                last_year: self.last_year,
            });
        }
        let base_year = f64::from(self.base_year);
        Ok((self.first_year..=self.last_year)
            .map(|year| (year, 1.0 + self.rate * (f64::from(year) - base_year)))
            .collect())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AssumptionsToml {
    #[serde(default)]
    metadata: Metadata,
    #[serde(default)]
    diagnosis: Vec<DiagnosisToml>,
    #[serde(default)]
    feasts: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DiagnosisToml {
    key: String,
    baseline_daily_cases: f64,
    seasonal_weights: Vec<f64>,
    #[serde(default)]
    minimum_one: bool,
    #[serde(default)]
    linear_trend: Option<LinearTrend>,
    #[serde(default)]
    trend_factors: BTreeMap<String, f64>,
}

impl DiagnosisToml {
    fn into_diagnosis(self) -> Result<Diagnosis, Error> {
        let mut trend = BTreeMap::new();
        if let Some(linear) = self.linear_trend {
            trend = linear.factors(&self.key)?;
        }
        for (year, factor) in &self.trend_factors {
            let parsed: i32 = year.trim().parse().map_err(|_| Error::InvalidTrendYear {
                key: self.key.clone(),
                year: year.clone(),
            })?;
            trend.insert(parsed, *factor);
        }
        Ok(
            Diagnosis::new(
                self.key,
                self.baseline_daily_cases,
                &self.seasonal_weights,
                trend,
            )?
            .with_minimum_one(self.minimum_one),
        )
    }
}

/// Immutable per-diagnosis parameters, enumerated in insertion order.
#[derive(Debug, Clone, Default)]
pub struct DiseaseTable {
    diagnoses: IndexMap<String, Diagnosis>,
    metadata: Metadata,
    feasts: FeastTable,
}

impl DiseaseTable {
    pub fn new(diagnoses: impl IntoIterator<Item = Diagnosis>) -> Result<Self, Error> {
        let mut table = IndexMap::new();
        for diagnosis in diagnoses {
            let key = diagnosis.key.clone();
            if table.insert(key.clone(), diagnosis).is_some() {
                return Err(Error::DuplicateDiagnosis(key));
            }
        }
        Ok(Self {
            diagnoses: table,
            ..Self::default()
        })
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, Error> {
        let parsed: AssumptionsToml = toml::from_str(raw)?;
        let diagnoses = parsed
            .diagnosis
            .into_iter()
            .map(DiagnosisToml::into_diagnosis)
            .collect::<Result<Vec<_>, _>>()?;
        let mut table = Self::new(diagnoses)?;
        table.metadata = parsed.metadata;
        table.feasts = FeastTable::from_raw(&parsed.feasts)?;
        Ok(table)
    }

    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let table = Self::from_toml_str(&fs::read_to_string(path)?)?;
        info!(
            "loaded {} diagnoses from {}",
            table.len(),
            path.display()
        );
        if let Some(description) = &table.metadata.description {
            debug!("assumptions: {description}");
        }
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.diagnoses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnoses.is_empty()
    }

    pub fn diagnoses(&self) -> impl Iterator<Item = &Diagnosis> {
        self.diagnoses.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.diagnoses.keys().map(String::as_str)
    }

    pub fn get(&self, key: &str) -> Result<&Diagnosis, Error> {
        self.diagnoses
            .get(key)
            .ok_or_else(|| Error::UnknownDiagnosis(key.to_string()))
    }

    pub fn baseline(&self, key: &str) -> Result<f64, Error> {
        Ok(self.get(key)?.baseline())
    }

    pub fn seasonal_weight(&self, key: &str, month_index: usize) -> Result<f64, Error> {
        self.get(key)?.seasonal_weight(month_index)
    }

    pub fn trend(&self, key: &str, year: i32) -> Result<f64, Error> {
        self.get(key)?.trend(year)
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn feasts(&self) -> &FeastTable {
        &self.feasts
    }

    /// Fails on the first diagnosis lacking a trend factor for one of `years`.
    pub fn check_coverage(&self, years: RangeInclusive<i32>) -> Result<(), Error> {
        for diagnosis in self.diagnoses() {
            for year in years.clone() {
                diagnosis.trend(year)?;
            }
        }
        Ok(())
    }
}
