use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate};
use log::{debug, info, trace};
use rand::{Rng, SeedableRng, distr::Distribution, rngs::StdRng};
use rand_distr::{Poisson, PoissonError};

use crate::{
    calendar::{CalendarAdjustment, FeastCalendar, NoFeasts},
    error::Error,
    output::{CaseRecord, RecordSink},
    parameters::{Diagnosis, DiseaseTable},
};

/// Location, inclusive date range and seed of one simulation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationRequest {
    location: String,
    start: NaiveDate,
    end: NaiveDate,
    seed: u64,
}

impl SimulationRequest {
    pub fn new(
        location: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
        seed: u64,
    ) -> Result<Self, Error> {
        if start > end {
            return Err(Error::InvalidDateRange { start, end });
        }
        Ok(Self {
            location: location.into(),
            start,
            end,
            seed,
        })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Every date from start to end, ascending.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |date| *date <= end)
    }

    pub fn num_days(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    pub fn years(&self) -> RangeInclusive<i32> {
        self.start.year()..=self.end.year()
    }
}

fn sample_poisson<R: Rng + ?Sized>(mean: f64, rng: &mut R) -> Result<u64, PoissonError> {
    // Poisson requires non-zero rate
    if mean == 0.0 {
        return Ok(0);
    }
    Ok(Poisson::new(mean)?.sample(rng) as u64)
}

/// Turns a parameter table and calendar into daily case counts.
pub struct Simulator<'a, F = NoFeasts> {
    table: &'a DiseaseTable,
    calendar: CalendarAdjustment<F>,
}

impl<'a, F: FeastCalendar> Simulator<'a, F> {
    pub fn new(table: &'a DiseaseTable, calendar: CalendarAdjustment<F>) -> Self {
        Self { table, calendar }
    }

    pub fn calendar(&self) -> &CalendarAdjustment<F> {
        &self.calendar
    }

    /// Poisson mean of `diagnosis` on `date`, given that date's calendar factor.
    pub fn mean(
        &self,
        diagnosis: &Diagnosis,
        date: NaiveDate,
        day_factor: f64,
    ) -> Result<f64, Error> {
        let seasonal = diagnosis.seasonal_weight(date.month0() as usize)?;
        let trend = diagnosis.trend(date.year())?;
        Ok((diagnosis.baseline() * seasonal * trend * day_factor).max(0.0))
    }

    pub fn simulate(&self, request: &SimulationRequest) -> Result<Vec<CaseRecord>, Error> {
        let mut records = Vec::with_capacity(request.num_days() * self.table.len());
        self.simulate_into(request, &mut records)?;
        Ok(records)
    }

    /// Runs `request` with a generator seeded from the request's seed.
    pub fn simulate_into(
        &self,
        request: &SimulationRequest,
        sink: &mut impl RecordSink,
    ) -> Result<(), Error> {
        let mut rng = StdRng::seed_from_u64(request.seed());
        self.simulate_with_rng(request, &mut rng, sink)
    }

    /// Checks that every month of `request` has samplable means before any
    /// draw. Calendar factors never exceed 1, so a month's undiscounted mean
    /// bounds its daily means.
    fn check_means(&self, request: &SimulationRequest) -> Result<(), Error> {
        let mut checked = None;
        for date in request.days() {
            let month = (date.year(), date.month0());
            if checked == Some(month) {
                continue;
            }
            checked = Some(month);
            for diagnosis in self.table.diagnoses() {
                let mean = self.mean(diagnosis, date, 1.0)?;
                if mean > 0.0 && Poisson::new(mean).is_err() {
                    return Err(Error::MeanOutOfRange {
                        key: diagnosis.key().to_string(),
                        year: date.year(),
                        mean,
                    });
                }
            }
        }
        Ok(())
    }

    /// Runs `request` drawing from `rng`. Records reach `sink` by date, then
    /// in table order. Configuration errors surface before the first record.
    pub fn simulate_with_rng<R: Rng + ?Sized>(
        &self,
        request: &SimulationRequest,
        rng: &mut R,
        sink: &mut impl RecordSink,
    ) -> Result<(), Error> {
        self.table.check_coverage(request.years())?;
        self.check_means(request)?;
        info!(
            "simulating {} diagnoses in {} from {} to {} (seed {})",
            self.table.len(),
            request.location(),
            request.start(),
            request.end(),
            request.seed()
        );

        for date in request.days() {
            let day_factor = self.calendar.factor(date);
            debug!("{date}: calendar factor {day_factor}");
            for diagnosis in self.table.diagnoses() {
                let mean = self.mean(diagnosis, date, day_factor)?;
                let mut count = sample_poisson(mean, rng).map_err(|_| Error::InvalidMean {
                    key: diagnosis.key().to_string(),
                    date,
                    mean,
                })?;
                if diagnosis.minimum_one() && count < 1 {
                    count = 1;
                }
                trace!("{date} {}: mean {mean}, count {count}", diagnosis.key());
                sink.accept(CaseRecord::new(
                    date,
                    request.location(),
                    diagnosis.key(),
                    count,
                ))?;
            }
        }

        info!(
            "simulated {} records",
            request.num_days() * self.table.len()
        );
        Ok(())
    }
}
