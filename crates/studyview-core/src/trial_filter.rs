//! Selecting trials and extracting the values plotted for them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StudyviewError};
use crate::models::{Study, Trial, TrialState};

/// A numeric dimension of a trial that can be plotted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "key", rename_all = "snake_case")]
pub enum Target {
    Objective(usize),
    #[serde(rename = "params")]
    Param(String),
    UserAttr(String),
}

impl Default for Target {
    fn default() -> Self {
        Target::Objective(0)
    }
}

impl Target {
    /// Stable `kind:key` form used in query strings and selectors.
    pub fn identifier(&self) -> String {
        match self {
            Target::Objective(i) => format!("objective:{}", i),
            Target::Param(name) => format!("params:{}", name),
            Target::UserAttr(name) => format!("user_attr:{}", name),
        }
    }

    pub fn from_identifier(id: &str) -> Result<Self> {
        let (kind, key) = id
            .split_once(':')
            .ok_or_else(|| StudyviewError::InvalidTarget(id.to_string()))?;
        if key.is_empty() {
            return Err(StudyviewError::InvalidTarget(id.to_string()));
        }
        match kind {
            "objective" => key
                .parse::<usize>()
                .map(Target::Objective)
                .map_err(|_| StudyviewError::InvalidTarget(id.to_string())),
            "params" => Ok(Target::Param(key.to_string())),
            "user_attr" => Ok(Target::UserAttr(key.to_string())),
            _ => Err(StudyviewError::InvalidTarget(id.to_string())),
        }
    }

    /// Human-readable axis/selector label.
    pub fn to_label(&self, objective_names: &[String]) -> String {
        match self {
            Target::Objective(i) => objective_names
                .get(*i)
                .cloned()
                .unwrap_or_else(|| format!("Objective {}", i)),
            Target::Param(name) => format!("Param {}", name),
            Target::UserAttr(name) => format!("User Attribute {}", name),
        }
    }

    /// The value of this target for `trial`, if the trial has one.
    pub fn value_of(&self, trial: &Trial) -> Option<f64> {
        match self {
            Target::Objective(i) => trial.values.as_ref().and_then(|v| v.get(*i)).copied(),
            Target::Param(name) => trial.params.get(name).copied(),
            Target::UserAttr(name) => trial.user_attrs.get(name).copied(),
        }
    }

    /// Whether `study` can provide this target at all.
    pub fn is_valid_for(&self, study: &Study) -> bool {
        match self {
            Target::Objective(i) => *i < study.meta.directions.len(),
            _ => true,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identifier())
    }
}

impl FromStr for Target {
    type Err = StudyviewError;

    fn from_str(s: &str) -> Result<Self> {
        Target::from_identifier(s)
    }
}

/// One objective target per study direction.
pub fn objective_targets(study: &Study) -> Vec<Target> {
    (0..study.meta.directions.len())
        .map(Target::Objective)
        .collect()
}

/// Trials that finished (optionally including pruned ones) and carry a
/// value for every requested target.
pub fn filter_trials<'a>(
    trials: &'a [Trial],
    targets: &[Target],
    include_pruned: bool,
) -> Vec<&'a Trial> {
    trials
        .iter()
        .filter(|t| {
            t.state == TrialState::Complete || (include_pruned && t.state == TrialState::Pruned)
        })
        .filter(|t| targets.iter().all(|target| target.value_of(t).is_some()))
        .collect()
}

/// The sample set of `target` over `trials`; trials without a value are skipped.
pub fn target_values<'a, I>(trials: I, target: &Target) -> Vec<f64>
where
    I: IntoIterator<Item = &'a Trial>,
{
    trials
        .into_iter()
        .filter_map(|t| target.value_of(t))
        .collect()
}

/// Filtered samples of `target` for a whole study.
pub fn study_samples(study: &Study, target: &Target) -> Vec<f64> {
    let filtered = filter_trials(&study.trials, std::slice::from_ref(target), false);
    target_values(filtered, target)
}
