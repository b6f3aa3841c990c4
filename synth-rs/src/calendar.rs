//! Weekday, weekend and public-holiday adjustment of expected daily counts.
//!
//! Saturdays scale counts by 0.9 and Sundays by 0.7. Each matching holiday
//! rule halves the factor again, so a holiday on a weekend compounds with the
//! weekend reduction. Holidays observed:
//!
//! - New Year's Day (January 1)
//! - Constitution Day (January 7, from 2019 on)
//! - Independence Day (March 6)
//! - Labour Day (May 1)
//! - Memorial Day (September 21)
//! - Christmas and Boxing Day (December 25, 26)
//! - Good Friday and Easter Monday
//! - Farmers' Day (first Friday of December)
//! - religious moving feasts supplied through a [`FeastCalendar`]

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::error::Error;

const SATURDAY_FACTOR: f64 = 0.9;
const SUNDAY_FACTOR: f64 = 0.7;
const HOLIDAY_FACTOR: f64 = 0.5;

/// (month, day) of holidays observed on the same date every year.
const FIXED_HOLIDAYS: [(u32, u32); 6] = [(1, 1), (3, 6), (5, 1), (9, 21), (12, 25), (12, 26)];

const CONSTITUTION_DAY: (u32, u32) = (1, 7);
const CONSTITUTION_DAY_SINCE: i32 = 2019;

/// Source of moving-feast dates (Eid al-Fitr, Eid al-Adha).
///
/// An unknown year is not an error: implementations report no feast and the
/// date is treated as an ordinary day.
pub trait FeastCalendar {
    fn observes(&self, date: NaiveDate) -> bool;
}

/// Feast lookup that never observes a feast.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFeasts;

impl FeastCalendar for NoFeasts {
    fn observes(&self, _date: NaiveDate) -> bool {
        false
    }
}

/// Feast dates listed explicitly per year.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeastTable {
    dates: BTreeMap<i32, Vec<NaiveDate>>,
}

impl FeastTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, date: NaiveDate) {
        let dates = self.dates.entry(date.year()).or_default();
        if !dates.contains(&date) {
            dates.push(date);
            dates.sort();
        }
    }

    /// Builds a table from year keys mapped to ISO `YYYY-MM-DD` strings, as
    /// found in the `[feasts]` section of an assumptions file. Every date
    /// must fall in the year it is listed under.
    pub fn from_raw(raw: &BTreeMap<String, Vec<String>>) -> Result<Self, Error> {
        let mut table = Self::new();
        for (year, dates) in raw {
            let invalid = |date: &str| Error::InvalidFeastDate {
                year: year.clone(),
                date: date.to_string(),
            };
            let parsed_year: i32 = year
                .trim()
                .parse()
                .map_err(|_| Error::InvalidFeastYear(year.clone()))?;
            for date in dates {
                let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                    .map_err(|_| invalid(date.as_str()))?;
                if parsed.year() != parsed_year {
                    return Err(invalid(date.as_str()));
                }
                table.insert(parsed);
            }
        }
        Ok(table)
    }

    /// Feast dates of `year`, ascending; empty for a year not listed.
    pub fn feast_dates(&self, year: i32) -> &[NaiveDate] {
        self.dates.get(&year).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

impl FeastCalendar for FeastTable {
    fn observes(&self, date: NaiveDate) -> bool {
        self.feast_dates(date.year()).binary_search(&date).is_ok()
    }
}

/// Easter Sunday of `year` by the anonymous Gregorian computus.
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year.rem_euclid(19);
    let b = year.div_euclid(100);
    let c = year.rem_euclid(100);
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15).rem_euclid(30);
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k).rem_euclid(7);
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

pub fn good_friday(year: i32) -> Option<NaiveDate> {
    easter_sunday(year)?.checked_sub_days(Days::new(2))
}

pub fn easter_monday(year: i32) -> Option<NaiveDate> {
    easter_sunday(year)?.succ_opt()
}

/// Farmers' Day, the first Friday of December.
pub fn farmers_day(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, 12, Weekday::Fri, 1)
}

/// Maps a date to its multiplicative calendar factor in (0, 1].
#[derive(Debug, Clone, Default)]
pub struct CalendarAdjustment<F = NoFeasts> {
    feasts: F,
}

impl CalendarAdjustment<NoFeasts> {
    pub fn new() -> Self {
        Self { feasts: NoFeasts }
    }
}

impl<F: FeastCalendar> CalendarAdjustment<F> {
    pub fn with_feasts(feasts: F) -> Self {
        Self { feasts }
    }

    pub fn feasts(&self) -> &F {
        &self.feasts
    }

    pub fn factor(&self, date: NaiveDate) -> f64 {
        let mut factor = match date.weekday() {
            Weekday::Sat => SATURDAY_FACTOR,
            Weekday::Sun => SUNDAY_FACTOR,
            _ => 1.0,
        };

        let year = date.year();
        let month_day = (date.month(), date.day());
        if FIXED_HOLIDAYS.contains(&month_day) {
            factor *= HOLIDAY_FACTOR;
        }
        if year >= CONSTITUTION_DAY_SINCE && month_day == CONSTITUTION_DAY {
            factor *= HOLIDAY_FACTOR;
        }
        if good_friday(year) == Some(date) || easter_monday(year) == Some(date) {
            factor *= HOLIDAY_FACTOR;
        }
        if farmers_day(year) == Some(date) {
            factor *= HOLIDAY_FACTOR;
        }
        if self.feasts.observes(date) {
            factor *= HOLIDAY_FACTOR;
        }
        factor
    }
}
