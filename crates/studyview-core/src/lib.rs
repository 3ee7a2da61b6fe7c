//! studyview-core: EDF curves, study models and storage for studyview.
//!
//! The computational heart is [`edf`]: a pure, stateless derivation of
//! empirical distribution curves from trial values. Everything else feeds it
//! samples ([`trial_filter`], [`storage`]) or describes its output for a
//! renderer ([`chart`]).

pub mod chart;
pub mod date_util;
pub mod edf;
pub mod error;
pub mod models;
pub mod storage;
pub mod trial_filter;

pub use chart::ThemeMode;
pub use edf::{EdfCurve, EdfPoint, NamedEdfCurve, NUM_STEP};
pub use error::{Result, StudyviewError};
pub use models::{Study, StudyDirection, StudyMeta, StudySummary, Trial, TrialState};
pub use trial_filter::Target;

/// EDF curves for several studies on a shared target, one per study in order.
pub fn edf_for_studies(studies: &[Study], target: &Target) -> Vec<NamedEdfCurve> {
    edf::build_multi(
        studies
            .iter()
            .map(|s| (s.name().to_string(), trial_filter::study_samples(s, target))),
    )
}
