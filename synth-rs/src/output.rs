use std::io::Write;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// One simulated count for a (date, diagnosis) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRecord {
    date: NaiveDate,
    location: String,
    diagnosis: String,
    count: u64,
}

impl CaseRecord {
    pub fn new(
        date: NaiveDate,
        location: impl Into<String>,
        diagnosis: impl Into<String>,
        count: u64,
    ) -> CaseRecord {
        CaseRecord {
            date,
            location: location.into(),
            diagnosis: diagnosis.into(),
            count,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// The date as `YYYY-MM-DD`.
    pub fn date_string(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn diagnosis(&self) -> &str {
        &self.diagnosis
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

/// Receives records in the order they are produced.
pub trait RecordSink {
    fn accept(&mut self, record: CaseRecord) -> Result<(), Error>;
}

impl RecordSink for Vec<CaseRecord> {
    fn accept(&mut self, record: CaseRecord) -> Result<(), Error> {
        self.push(record);
        Ok(())
    }
}

/// Streams serializable rows as CSV, header first.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvSink<W> {
    pub fn new(inner: W) -> CsvSink<W> {
        CsvSink {
            writer: csv::Writer::from_writer(inner),
        }
    }

    pub fn write<T: Serialize>(&mut self, row: &T) -> Result<(), Error> {
        self.writer.serialize(row)?;
        Ok(())
    }

    /// Flushes buffered rows and hands back the underlying writer.
    pub fn finish(self) -> Result<W, Error> {
        self.writer
            .into_inner()
            .map_err(|e| Error::Io(e.into_error()))
    }
}

impl<W: Write> RecordSink for CsvSink<W> {
    fn accept(&mut self, record: CaseRecord) -> Result<(), Error> {
        self.write(&record)
    }
}
