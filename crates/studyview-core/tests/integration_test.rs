//! Integration tests for studyview-core.

use chrono::{TimeZone, Utc};
use studyview_core::{
    edf, edf_for_studies, storage, trial_filter, Study, StudyDirection, StudyMeta, StudyviewError,
    Target, Trial, TrialState, NUM_STEP,
};
use tempfile::TempDir;

fn make_study(name: &str, values: &[f64]) -> Study {
    let mut trials: Vec<Trial> = values
        .iter()
        .enumerate()
        .map(|(i, v)| Trial::complete(i as u64, vec![*v]).with_param("x", *v * 2.0))
        .collect();
    trials.push(Trial::new(values.len() as u64, TrialState::Fail));
    Study {
        meta: StudyMeta::new(name, vec![StudyDirection::Minimize]),
        trials,
    }
}

#[test]
fn test_save_and_load_study() {
    let tmp = TempDir::new().unwrap();
    let mut study = make_study("quadratic", &[3.0, 1.0, 2.0]);
    study.meta.created_at = Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap();
    storage::save_study(tmp.path(), &study).unwrap();

    let loaded = storage::load_study(tmp.path(), "quadratic").unwrap();
    assert_eq!(loaded, study);

    let summary = storage::summarize_study(tmp.path(), "quadratic").unwrap();
    assert_eq!(summary.n_trials, 4);
}

#[test]
fn test_missing_study() {
    let tmp = TempDir::new().unwrap();
    let err = storage::load_study(tmp.path(), "nope").unwrap_err();
    assert!(matches!(err, StudyviewError::StudyNotFound(name) if name == "nope"));
}

#[test]
fn test_edf_from_stored_trials() {
    let tmp = TempDir::new().unwrap();
    storage::save_study(tmp.path(), &make_study("s", &[1.0, 2.0, 3.0, 4.0, 5.0])).unwrap();
    let study = storage::load_study(tmp.path(), "s").unwrap();

    let samples = trial_filter::study_samples(&study, &Target::Objective(0));
    assert_eq!(samples, vec![1.0, 2.0, 3.0, 4.0, 5.0]);

    let curve = edf::build(&samples);
    assert_eq!(curve.len(), NUM_STEP);
    assert_eq!(curve.points()[0].y, 0.2);
    assert_eq!(curve.points()[NUM_STEP - 1].y, 1.0);
}

#[test]
fn test_edf_for_studies_keeps_empty_study() {
    let studies = vec![make_study("A", &[1.0, 2.0, 3.0]), make_study("B", &[])];
    let curves = edf_for_studies(&studies, &Target::Objective(0));
    assert_eq!(curves.len(), 2);
    assert_eq!(curves[0].label, "A");
    assert_eq!(curves[0].curve.len(), NUM_STEP);
    assert_eq!(curves[1].label, "B");
    assert!(curves[1].curve.is_empty());
}

#[test]
fn test_edf_on_param_target() {
    let studies = vec![make_study("A", &[1.0, 4.0])];
    let curves = edf_for_studies(&studies, &Target::Param("x".into()));
    let pts = curves[0].curve.points();
    assert_eq!(pts[0].x, 2.0);
    assert_eq!(pts[0].y, 0.5);
}

#[test]
fn test_study_json_dump_parses() {
    let json = r#"{
        "name": "imported",
        "directions": ["minimize", "maximize"],
        "objective_names": ["loss", "accuracy"],
        "created_at": "2024-01-01T00:00:00Z",
        "trials": [
            {"number": 0, "state": "COMPLETE", "values": [0.3, 0.9], "params": {"lr": 0.01}},
            {"number": 1, "state": "PRUNED"}
        ]
    }"#;
    let study: Study = serde_json::from_str(json).unwrap();
    assert!(study.is_multi_objective());
    assert_eq!(study.trials[0].values, Some(vec![0.3, 0.9]));
    assert_eq!(study.trials[1].state, TrialState::Pruned);
    assert_eq!(
        Target::Objective(1).to_label(&study.meta.objective_names),
        "accuracy"
    );
}
