//! Error type for the synthcase crate.

use chrono::NaiveDate;

/// Error type for all fallible operations in the synthcase crate.
///
/// Configuration errors are raised when a parameter table is built or when a
/// request needs a value the table does not cover. Nothing is ever defaulted.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a diagnosis does not carry exactly twelve seasonal weights.
    #[error("diagnosis {key:?} has {got} seasonal weights (expected 12)")]
    SeasonalWeightCount { key: String, got: usize },

    /// Returned when a baseline, seasonal weight or trend factor is negative.
    #[error("diagnosis {key:?} has negative {field}: {value}")]
    NegativeParameter {
        key: String,
        field: String,
        value: f64,
    },

    /// Returned when a baseline, seasonal weight or trend factor is NaN or infinite.
    #[error("diagnosis {key:?} has non-finite {field}")]
    NonFiniteParameter { key: String, field: String },

    /// Returned when a request needs a trend factor for a year the table lacks.
    #[error("diagnosis {key:?} has no trend factor for {year}")]
    MissingTrendYear { key: String, year: i32 },

    /// Returned when a trend factor key cannot be read as a year.
    #[error("diagnosis {key:?} has invalid trend year {year:?}")]
    InvalidTrendYear { key: String, year: String },

    /// Returned when a linear trend spans an empty range of years.
    #[error("diagnosis {key:?} has linear trend from {first_year} to {last_year}")]
    InvalidTrendRange {
        key: String,
        first_year: i32,
        last_year: i32,
    },

    /// Returned when two diagnoses share a key.
    #[error("duplicate diagnosis {0:?}")]
    DuplicateDiagnosis(String),

    /// Returned when a diagnosis key is empty.
    #[error("diagnosis key must not be empty")]
    EmptyDiagnosisKey,

    /// Returned when a lookup names a diagnosis the table does not hold.
    #[error("unknown diagnosis {0:?}")]
    UnknownDiagnosis(String),

    /// Returned when a month index is outside 0..=11.
    #[error("invalid month index: {0} (must be 0..=11)")]
    InvalidMonthIndex(usize),

    /// Returned when a feast table entry is not a valid date of its year.
    #[error("invalid feast date {date:?} for {year:?}")]
    InvalidFeastDate { year: String, date: String },

    /// Returned when a feast table key cannot be read as a year.
    #[error("invalid feast year {0:?}")]
    InvalidFeastYear(String),

    /// Returned when a simulation request starts after it ends.
    #[error("start date {start} is after end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    /// Returned before sampling when a diagnosis can reach a mean too large to
    /// sample over the requested years.
    #[error("diagnosis {key:?} reaches mean {mean} in {year}")]
    MeanOutOfRange { key: String, year: i32, mean: f64 },

    /// Returned when a Poisson mean cannot be sampled.
    #[error("cannot sample {key:?} on {date} with mean {mean}")]
    InvalidMean {
        key: String,
        date: NaiveDate,
        mean: f64,
    },

    /// Returned when the run document names no file under the given key.
    #[error("no model file named {0:?}")]
    MissingFile(String),

    /// Returned when stdin carries no run document.
    #[error("no input on stdin")]
    EmptyInput,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}
