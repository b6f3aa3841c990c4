pub mod calendar;
pub mod error;
pub mod output;
pub mod parameters;
pub mod simulate;
pub mod summary;

use std::collections::HashMap;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use calendar::{CalendarAdjustment, FeastCalendar, FeastTable, NoFeasts};
pub use error::Error;
pub use output::{CaseRecord, CsvSink, RecordSink};
pub use parameters::{Diagnosis, DiseaseTable};
pub use simulate::{SimulationRequest, Simulator};

/// A model run as described by the JSON document handed to the model:
/// typed `input`, the seed, named model `files` and the `output` target.
pub struct Environment<I = ()> {
    input_json: serde_json::Map<String, Value>,
    pub input: Option<I>,
    pub seed: u64,
    pub files: HashMap<String, PathBuf>,
    output: Value,
}

impl Environment {
    pub fn from_json(data: Value) -> Self {
        let mut input_json = data
            .get("input")
            .and_then(|v| v.as_object())
            .cloned()
            .unwrap_or_default();

        let seed = input_json
            .remove("seed")
            .and_then(|v| v.as_u64())
            .unwrap_or(0);

        let files = data
            .get("model")
            .and_then(|m| m.get("files"))
            .and_then(|f| f.as_object())
            .map(|obj| {
                obj.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), PathBuf::from(s))))
                    .collect()
            })
            .unwrap_or_default();

        let output = data.get("output").cloned().unwrap_or(Value::Null);

        Self {
            input_json,
            input: None,
            seed,
            files,
            output,
        }
    }

    pub fn from_reader(mut reader: impl Read) -> Result<Self, Error> {
        let mut raw = String::new();
        reader.read_to_string(&mut raw)?;
        if raw.trim().is_empty() {
            return Err(Error::EmptyInput);
        }
        let data: Value = serde_json::from_str(&raw)?;
        Ok(Self::from_json(data))
    }

    pub fn from_stdin() -> Result<Self, Error> {
        Self::from_reader(io::stdin().lock())
    }

    pub fn with_input_type<I: DeserializeOwned>(self) -> Result<Environment<I>, Error> {
        let input_value = Value::Object(self.input_json.clone());
        let input = serde_json::from_value(input_value)?;
        Ok(Environment {
            input_json: self.input_json,
            input: Some(input),
            seed: self.seed,
            files: self.files,
            output: self.output,
        })
    }
}

impl<I: DeserializeOwned> Environment<I> {
    pub fn load() -> Result<Self, Error> {
        Environment::from_stdin()?.with_input_type::<I>()
    }
}

impl<I> Environment<I> {
    pub fn input_json(&self) -> &serde_json::Map<String, Value> {
        &self.input_json
    }

    pub fn file(&self, name: &str) -> Result<&Path, Error> {
        self.files
            .get(name)
            .map(PathBuf::as_path)
            .ok_or_else(|| Error::MissingFile(name.to_string()))
    }

    pub fn output_dir(&self) -> Option<PathBuf> {
        let output = &self.output;

        // Check flat output
        if output.get("spec").and_then(|v| v.as_str()) == Some("filesystem") {
            if let Some(dir) = output.get("dir").and_then(|v| v.as_str()) {
                return Some(PathBuf::from(dir));
            }
            return None;
        }

        // Check profiled output, resolving the default profile
        if let Some(profiles) = output.get("profile").and_then(|v| v.as_object()) {
            let selected = profiles
                .get("default")
                .or_else(|| profiles.values().next());
            if let Some(profile) = selected
                && profile.get("spec").and_then(|v| v.as_str()) == Some("filesystem")
                && let Some(dir) = profile.get("dir").and_then(|v| v.as_str())
            {
                return Some(PathBuf::from(dir));
            }
        }

        None
    }

    /// Writes `rows` as CSV to `filename` in the output directory, or to
    /// stdout when the run has no filesystem output.
    pub fn write_records<T: Serialize>(&self, filename: &str, rows: &[T]) -> Result<(), Error> {
        if let Some(dir) = self.output_dir() {
            fs::create_dir_all(&dir)?;
            let file = fs::File::create(dir.join(filename))?;
            write_rows(CsvSink::new(file), rows)
        } else {
            write_rows(CsvSink::new(io::stdout()), rows)
        }
    }
}

fn write_rows<W: Write, T: Serialize>(mut sink: CsvSink<W>, rows: &[T]) -> Result<(), Error> {
    for row in rows {
        sink.write(row)?;
    }
    sink.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn test_from_json_basic() {
        let data = json!({
            "input": {
                "seed": 42,
                "location": "Accra"
            },
            "model": {
                "files": {
                    "assumptions": "/tmp/assumptions.toml"
                }
            },
            "output": {
                "spec": "filesystem",
                "dir": "/tmp/output"
            }
        });
        let ctx = Environment::from_json(data);
        assert_eq!(ctx.seed, 42);
        assert_eq!(
            ctx.input_json().get("location").unwrap().as_str().unwrap(),
            "Accra"
        );
        assert!(!ctx.input_json().contains_key("seed"));
        assert_eq!(
            ctx.file("assumptions").unwrap(),
            Path::new("/tmp/assumptions.toml")
        );
        assert!(matches!(ctx.file("feasts"), Err(Error::MissingFile(_))));
        assert_eq!(ctx.output_dir(), Some(PathBuf::from("/tmp/output")));
    }

    #[test]
    fn test_with_input_type() {
        #[derive(Deserialize, Debug, PartialEq)]
        struct Input {
            location: String,
        }
        let data = json!({
            "input": {
                "seed": 42,
                "location": "Tamale"
            }
        });
        let ctx = Environment::from_json(data)
            .with_input_type::<Input>()
            .unwrap();
        assert_eq!(
            ctx.input,
            Some(Input {
                location: "Tamale".to_string()
            })
        );
        assert_eq!(ctx.seed, 42);

        let data = json!({ "input": { "seed": 1 } });
        assert!(matches!(
            Environment::from_json(data).with_input_type::<Input>(),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_from_reader() {
        let ctx = Environment::from_reader(r#"{"input": {"seed": 9}}"#.as_bytes()).unwrap();
        assert_eq!(ctx.seed, 9);
        assert!(matches!(
            Environment::from_reader("  \n".as_bytes()),
            Err(Error::EmptyInput)
        ));
        assert!(matches!(
            Environment::from_reader("{".as_bytes()),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_output_dir_falls_back_to_first_profile() {
        let data = json!({
            "output": {
                "profile": {
                    "archive": { "spec": "filesystem", "dir": "/srv/archive" },
                    "scratch": { "spec": "filesystem", "dir": "/tmp/scratch" }
                }
            }
        });
        let ctx = Environment::from_json(data);
        assert_eq!(ctx.output_dir(), Some(PathBuf::from("/srv/archive")));

        let data = json!({
            "output": {
                "profile": { "default": { "spec": "stdout" } }
            }
        });
        assert_eq!(Environment::from_json(data).output_dir(), None);
    }

    #[test]
    fn test_filesystem_output_needs_dir() {
        let data = json!({ "output": { "spec": "filesystem" } });
        assert_eq!(Environment::from_json(data).output_dir(), None);

        let data = json!({ "output": { "spec": "filesystem", "dir": 7 } });
        assert_eq!(Environment::from_json(data).output_dir(), None);
    }

    #[test]
    fn test_bare_document_runs_on_seed_zero() {
        let ctx = Environment::from_json(json!({ "input": { "seed": -3 } }));
        assert_eq!(ctx.seed, 0);
        assert!(matches!(
            ctx.file("assumptions"),
            Err(Error::MissingFile(name)) if name == "assumptions"
        ));

        let ctx = Environment::from_json(json!({
            "model": { "files": { "assumptions": 12, "feasts": "feasts.toml" } }
        }));
        assert_eq!(ctx.files.len(), 1);
        assert_eq!(ctx.file("feasts").unwrap(), Path::new("feasts.toml"));
        assert_eq!(ctx.output_dir(), None);
    }

    #[test]
    fn test_write_records() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested");
        let data = json!({
            "output": {
                "spec": "filesystem",
                "dir": out.to_str().unwrap()
            }
        });
        let ctx = Environment::from_json(data);
        let date = chrono::NaiveDate::from_ymd_opt(2020, 3, 6).unwrap();
        ctx.write_records("cases.csv", &[CaseRecord::new(date, "Accra", "Asthma (J45)", 12)])
            .unwrap();
        let written = fs::read_to_string(out.join("cases.csv")).unwrap();
        assert_eq!(
            written,
            "date,location,diagnosis,count\n2020-03-06,Accra,Asthma (J45),12\n"
        );
    }
}
