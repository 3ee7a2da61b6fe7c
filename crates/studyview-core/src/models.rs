//! Data models for studyview.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Optimization direction of one objective.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StudyDirection {
    Minimize,
    Maximize,
}

impl std::fmt::Display for StudyDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StudyDirection::Minimize => write!(f, "minimize"),
            StudyDirection::Maximize => write!(f, "maximize"),
        }
    }
}

/// Lifecycle state of a trial.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrialState {
    Running,
    Complete,
    Pruned,
    Fail,
    Waiting,
}

impl std::fmt::Display for TrialState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrialState::Running => write!(f, "RUNNING"),
            TrialState::Complete => write!(f, "COMPLETE"),
            TrialState::Pruned => write!(f, "PRUNED"),
            TrialState::Fail => write!(f, "FAIL"),
            TrialState::Waiting => write!(f, "WAITING"),
        }
    }
}

impl std::str::FromStr for TrialState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RUNNING" => Ok(TrialState::Running),
            "COMPLETE" => Ok(TrialState::Complete),
            "PRUNED" => Ok(TrialState::Pruned),
            "FAIL" => Ok(TrialState::Fail),
            "WAITING" => Ok(TrialState::Waiting),
            other => Err(format!("unknown trial state '{}'", other)),
        }
    }
}

/// A single evaluated configuration within a study.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trial {
    pub number: u64,
    pub state: TrialState,
    /// One value per objective; absent until the trial completes.
    ///
    /// An empty list reads as `None`, which is also how the trials table
    /// stores it.
    #[serde(default, deserialize_with = "non_empty_values")]
    pub values: Option<Vec<f64>>,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
    #[serde(default)]
    pub user_attrs: BTreeMap<String, f64>,
    #[serde(default)]
    pub datetime_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub datetime_complete: Option<DateTime<Utc>>,
}

fn non_empty_values<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<f64>>::deserialize(deserializer)?;
    Ok(values.filter(|v| !v.is_empty()))
}

impl Trial {
    pub fn new(number: u64, state: TrialState) -> Self {
        Self {
            number,
            state,
            values: None,
            params: BTreeMap::new(),
            user_attrs: BTreeMap::new(),
            datetime_start: None,
            datetime_complete: None,
        }
    }

    /// A completed trial carrying the given objective values.
    pub fn complete(number: u64, values: Vec<f64>) -> Self {
        Self {
            values: Some(values),
            ..Self::new(number, TrialState::Complete)
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: f64) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    pub fn with_user_attr(mut self, name: impl Into<String>, value: f64) -> Self {
        self.user_attrs.insert(name.into(), value);
        self
    }
}

/// Metadata stored in `study.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudyMeta {
    pub name: String,
    pub directions: Vec<StudyDirection>,
    #[serde(default)]
    pub objective_names: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Default for StudyMeta {
    fn default() -> Self {
        Self {
            name: String::new(),
            directions: vec![StudyDirection::Minimize],
            objective_names: vec![],
            created_at: Utc::now(),
        }
    }
}

impl StudyMeta {
    pub fn new(name: impl Into<String>, directions: Vec<StudyDirection>) -> Self {
        Self {
            name: name.into(),
            directions,
            ..Default::default()
        }
    }

    pub fn with_objective_names(mut self, names: Vec<String>) -> Self {
        self.objective_names = names;
        self
    }
}

/// A study together with all of its trials.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Study {
    #[serde(flatten)]
    pub meta: StudyMeta,
    #[serde(default)]
    pub trials: Vec<Trial>,
}

impl Study {
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn is_multi_objective(&self) -> bool {
        self.meta.directions.len() > 1
    }
}

/// Listing entry returned by the studies endpoint and the `list` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudySummary {
    pub name: String,
    pub directions: Vec<StudyDirection>,
    pub n_trials: usize,
    pub created_at: String,
}
