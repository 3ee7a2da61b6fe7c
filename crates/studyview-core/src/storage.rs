//! Storage layer: `study.yaml` metadata plus a `trials.parquet` table per study.
//!
//! ```text
//! <base>/<study>/study.yaml
//! <base>/<study>/trials.parquet
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::arrow_writer::ArrowWriter;
use parquet::file::properties::WriterProperties;
use tracing::debug;

use crate::date_util;
use crate::error::{Result, StudyviewError};
use crate::models::{Study, StudyMeta, StudySummary, Trial, TrialState};

const STUDY_FILE: &str = "study.yaml";
const TRIALS_FILE: &str = "trials.parquet";

const VALUE_PREFIX: &str = "value_";
const PARAM_PREFIX: &str = "param_";
const USER_ATTR_PREFIX: &str = "user_attr_";

// ─── Directory helpers ────────────────────────────────────────────────────────

pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)?;
    Ok(())
}

/// Names of all directories under `base_dir` holding a `study.yaml`, sorted.
pub fn list_studies(base_dir: &Path) -> Result<Vec<String>> {
    if !base_dir.exists() {
        return Ok(vec![]);
    }
    let mut names = vec![];
    for entry in fs::read_dir(base_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() && entry.path().join(STUDY_FILE).exists() {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

fn study_dir(base_dir: &Path, name: &str) -> Result<std::path::PathBuf> {
    // Reject names that would escape the base directory.
    if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(StudyviewError::StudyNotFound(name.to_string()));
    }
    Ok(base_dir.join(name))
}

// ─── YAML metadata I/O ───────────────────────────────────────────────────────

pub fn save_study_meta(base_dir: &Path, meta: &StudyMeta) -> Result<()> {
    let dir = study_dir(base_dir, &meta.name)?;
    ensure_dir(&dir)?;
    let content = serde_yaml::to_string(meta)?;
    fs::write(dir.join(STUDY_FILE), content)?;
    Ok(())
}

pub fn load_study_meta(base_dir: &Path, name: &str) -> Result<StudyMeta> {
    let path = study_dir(base_dir, name)?.join(STUDY_FILE);
    if !path.exists() {
        return Err(StudyviewError::StudyNotFound(name.to_string()));
    }
    let content = fs::read_to_string(&path)?;
    Ok(serde_yaml::from_str(&content)?)
}

// ─── Study-level helpers ─────────────────────────────────────────────────────

pub fn load_study(base_dir: &Path, name: &str) -> Result<Study> {
    let meta = load_study_meta(base_dir, name)?;
    let trials = read_trials(&study_dir(base_dir, name)?.join(TRIALS_FILE))?;
    debug!(study = %name, trials = trials.len(), "Loaded study");
    Ok(Study { meta, trials })
}

pub fn save_study(base_dir: &Path, study: &Study) -> Result<()> {
    save_study_meta(base_dir, &study.meta)?;
    write_trials(&study_dir(base_dir, study.name())?.join(TRIALS_FILE), &study.trials)
}

pub fn summarize_study(base_dir: &Path, name: &str) -> Result<StudySummary> {
    let study = load_study(base_dir, name)?;
    Ok(StudySummary {
        name: study.meta.name.clone(),
        directions: study.meta.directions.clone(),
        n_trials: study.trials.len(),
        created_at: date_util::format_date_local(&study.meta.created_at),
    })
}

// ─── Parquet trial I/O ───────────────────────────────────────────────────────

/// Read all trials from a Parquet file. A missing file means no trials yet.
pub fn read_trials(path: &Path) -> Result<Vec<Trial>> {
    if !path.exists() {
        return Ok(vec![]);
    }
    let file = fs::File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let mut trials = vec![];
    for batch in reader {
        trials.extend(record_batch_to_trials(&batch?)?);
    }
    Ok(trials)
}

/// Overwrite `path` with the given trials.
///
/// `values: Some(vec![])` has no columns to fill and reads back as `None`.
/// Trial numbers above `i64::MAX` are rejected.
pub fn write_trials(path: &Path, trials: &[Trial]) -> Result<()> {
    let batch = trials_to_record_batch(trials)?;
    let file = fs::File::create(path)?;
    let props = WriterProperties::builder()
        .set_compression(parquet::basic::Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn timestamp_field(name: &str) -> Field {
    Field::new(
        name,
        DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
        true,
    )
}

fn timestamp_array(values: Vec<Option<i64>>) -> ArrayRef {
    Arc::new(TimestampMicrosecondArray::from(values).with_timezone_opt(Some("UTC".to_string())))
}

/// Union of keys across trials, in sorted order.
fn collect_keys<'a, F>(trials: &'a [Trial], keys_of: F) -> Vec<String>
where
    F: Fn(&'a Trial) -> &'a BTreeMap<String, f64>,
{
    let mut keys: Vec<String> = trials
        .iter()
        .flat_map(|t| keys_of(t).keys().cloned())
        .collect();
    keys.sort();
    keys.dedup();
    keys
}

fn trials_to_record_batch(trials: &[Trial]) -> Result<RecordBatch> {
    let n_values = trials
        .iter()
        .filter_map(|t| t.values.as_ref().map(Vec::len))
        .max()
        .unwrap_or(0);
    let param_keys = collect_keys(trials, |t| &t.params);
    let attr_keys = collect_keys(trials, |t| &t.user_attrs);

    let mut fields = vec![
        Field::new("number", DataType::Int64, false),
        Field::new("state", DataType::Utf8, false),
        timestamp_field("datetime_start"),
        timestamp_field("datetime_complete"),
    ];
    let numbers = trials
        .iter()
        .map(|t| {
            i64::try_from(t.number)
                .map_err(|_| StudyviewError::Other(format!("trial number {} is out of range", t.number)))
        })
        .collect::<Result<Vec<i64>>>()?;
    let mut arrays: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(numbers)),
        Arc::new(StringArray::from(
            trials.iter().map(|t| t.state.to_string()).collect::<Vec<_>>(),
        )),
        timestamp_array(
            trials
                .iter()
                .map(|t| t.datetime_start.map(|d| d.timestamp_micros()))
                .collect(),
        ),
        timestamp_array(
            trials
                .iter()
                .map(|t| t.datetime_complete.map(|d| d.timestamp_micros()))
                .collect(),
        ),
    ];

    for i in 0..n_values {
        let vals: Vec<Option<f64>> = trials
            .iter()
            .map(|t| t.values.as_ref().and_then(|v| v.get(i)).copied())
            .collect();
        fields.push(Field::new(format!("{}{}", VALUE_PREFIX, i), DataType::Float64, true));
        arrays.push(Arc::new(Float64Array::from(vals)));
    }
    for key in &param_keys {
        let vals: Vec<Option<f64>> = trials.iter().map(|t| t.params.get(key).copied()).collect();
        fields.push(Field::new(format!("{}{}", PARAM_PREFIX, key), DataType::Float64, true));
        arrays.push(Arc::new(Float64Array::from(vals)));
    }
    for key in &attr_keys {
        let vals: Vec<Option<f64>> = trials
            .iter()
            .map(|t| t.user_attrs.get(key).copied())
            .collect();
        fields.push(Field::new(format!("{}{}", USER_ATTR_PREFIX, key), DataType::Float64, true));
        arrays.push(Arc::new(Float64Array::from(vals)));
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}

fn column<'a, A: 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a A> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<A>())
        .ok_or_else(|| StudyviewError::Other(format!("trials table has no valid '{}' column", name)))
}

fn read_timestamp(arr: &TimestampMicrosecondArray, row: usize) -> Option<DateTime<Utc>> {
    if arr.is_null(row) {
        None
    } else {
        DateTime::<Utc>::from_timestamp_micros(arr.value(row))
    }
}

fn record_batch_to_trials(batch: &RecordBatch) -> Result<Vec<Trial>> {
    let numbers = column::<Int64Array>(batch, "number")?;
    let states = column::<StringArray>(batch, "state")?;
    let starts = column::<TimestampMicrosecondArray>(batch, "datetime_start")?;
    let completes = column::<TimestampMicrosecondArray>(batch, "datetime_complete")?;

    // Value columns are positional; sort by index so value_10 follows value_9.
    let mut value_cols: Vec<(usize, &Float64Array)> = vec![];
    let mut param_cols: Vec<(String, &Float64Array)> = vec![];
    let mut attr_cols: Vec<(String, &Float64Array)> = vec![];
    for (idx, field) in batch.schema_ref().fields().iter().enumerate() {
        let Some(arr) = batch.column(idx).as_any().downcast_ref::<Float64Array>() else {
            continue;
        };
        let name = field.name();
        if let Some(i) = name.strip_prefix(VALUE_PREFIX).and_then(|s| s.parse::<usize>().ok()) {
            value_cols.push((i, arr));
        } else if let Some(key) = name.strip_prefix(PARAM_PREFIX) {
            param_cols.push((key.to_string(), arr));
        } else if let Some(key) = name.strip_prefix(USER_ATTR_PREFIX) {
            attr_cols.push((key.to_string(), arr));
        }
    }
    value_cols.sort_by_key(|(i, _)| *i);

    let mut trials = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        let state: TrialState = states.value(row).parse().map_err(StudyviewError::Other)?;
        let number = u64::try_from(numbers.value(row)).map_err(|_| {
            StudyviewError::Other(format!("negative trial number {}", numbers.value(row)))
        })?;
        let mut trial = Trial::new(number, state);
        trial.datetime_start = read_timestamp(starts, row);
        trial.datetime_complete = read_timestamp(completes, row);

        let values: Vec<f64> = value_cols
            .iter()
            .take_while(|(_, arr)| !arr.is_null(row))
            .map(|(_, arr)| arr.value(row))
            .collect();
        if !values.is_empty() {
            trial.values = Some(values);
        }
        for (key, arr) in &param_cols {
            if !arr.is_null(row) {
                trial.params.insert(key.clone(), arr.value(row));
            }
        }
        for (key, arr) in &attr_cols {
            if !arr.is_null(row) {
                trial.user_attrs.insert(key.clone(), arr.value(row));
            }
        }
        trials.push(trial);
    }
    Ok(trials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StudyDirection;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_study_name_cannot_escape_base() {
        let tmp = TempDir::new().unwrap();
        for name in ["", "..", "a/b", "a\\b"] {
            assert!(matches!(
                load_study(tmp.path(), name),
                Err(StudyviewError::StudyNotFound(_))
            ));
        }
    }

    #[test]
    fn test_trials_keep_fields() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(TRIALS_FILE);
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let mut done = Trial::complete(0, vec![0.25, 3.0])
            .with_param("lr", 0.01)
            .with_user_attr("memory", 512.0);
        done.datetime_start = Some(start);
        let running = Trial::new(1, TrialState::Running).with_param("lr", 0.1);

        write_trials(&path, &[done.clone(), running.clone()]).unwrap();
        let read = read_trials(&path).unwrap();
        assert_eq!(read, vec![done, running]);
    }

    #[test]
    fn test_many_objectives_keep_order() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(TRIALS_FILE);
        let values: Vec<f64> = (0..12).map(|i| i as f64).collect();
        write_trials(&path, &[Trial::complete(0, values.clone())]).unwrap();
        assert_eq!(read_trials(&path).unwrap()[0].values, Some(values));
    }

    #[test]
    fn test_empty_values_collapse_to_none() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(TRIALS_FILE);
        let imported: Trial =
            serde_json::from_str(r#"{"number": 0, "state": "COMPLETE", "values": []}"#).unwrap();
        write_trials(&path, &[imported.clone()]).unwrap();
        assert_eq!(read_trials(&path).unwrap(), vec![imported]);

        write_trials(&path, &[Trial::complete(1, vec![])]).unwrap();
        assert_eq!(read_trials(&path).unwrap()[0].values, None);
    }

    #[test]
    fn test_trial_number_beyond_i64_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(TRIALS_FILE);
        let err = write_trials(&path, &[Trial::new(u64::MAX, TrialState::Running)]).unwrap_err();
        assert!(matches!(err, StudyviewError::Other(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_negative_trial_number_is_rejected() {
        let schema = Schema::new(vec![
            Field::new("number", DataType::Int64, false),
            Field::new("state", DataType::Utf8, false),
            timestamp_field("datetime_start"),
            timestamp_field("datetime_complete"),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(Int64Array::from(vec![-1])),
                Arc::new(StringArray::from(vec!["COMPLETE"])),
                timestamp_array(vec![None]),
                timestamp_array(vec![None]),
            ],
        )
        .unwrap();
        let err = record_batch_to_trials(&batch).unwrap_err();
        assert!(matches!(err, StudyviewError::Other(msg) if msg.contains("-1")));
    }

    #[test]
    fn test_list_only_study_dirs() {
        let tmp = TempDir::new().unwrap();
        save_study_meta(tmp.path(), &StudyMeta::new("b", vec![StudyDirection::Minimize])).unwrap();
        save_study_meta(tmp.path(), &StudyMeta::new("a", vec![StudyDirection::Maximize])).unwrap();
        fs::create_dir(tmp.path().join("not_a_study")).unwrap();
        assert_eq!(list_studies(tmp.path()).unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_missing_trials_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        save_study_meta(tmp.path(), &StudyMeta::new("s", vec![StudyDirection::Minimize])).unwrap();
        let study = load_study(tmp.path(), "s").unwrap();
        assert!(study.trials.is_empty());
    }
}
