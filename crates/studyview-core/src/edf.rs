//! Empirical distribution function (EDF) curves.
//!
//! A curve evaluates the fraction of samples `<= x` at [`NUM_STEP`] boundaries
//! spaced uniformly from the sample minimum to the sample maximum. Curves are
//! derived data: every call recomputes from the given samples.
//!
//! Each series in [`build_multi`] is scaled on its own min/max; there is no
//! shared grid across series.

use serde::{Deserialize, Serialize};

/// Number of boundaries evaluated per curve.
pub const NUM_STEP: usize = 100;

/// One evaluated boundary of an EDF curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdfPoint {
    pub x: f64,
    /// Cumulative probability in `[0, 1]`.
    pub y: f64,
}

/// A stepwise approximation of the cumulative distribution of a sample set.
///
/// Holds exactly [`NUM_STEP`] points, or none when built from no samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdfCurve {
    points: Vec<EdfPoint>,
}

impl EdfCurve {
    pub fn points(&self) -> &[EdfPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn xs(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.x).collect()
    }

    pub fn ys(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.y).collect()
    }
}

/// A curve tagged with the label of the series it was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedEdfCurve {
    pub label: String,
    pub curve: EdfCurve,
}

/// Build the EDF curve of `samples`.
///
/// Empty input yields an empty curve. When every sample is equal the step
/// is zero and all points sit at `(min, 1.0)`.
///
/// A NaN sample makes `min` and `max` NaN, so every boundary is NaN and
/// every cumulative probability is `0.0`.
///
/// Boundaries are `min + step * i` exactly. Rounding can leave the last
/// boundary one ulp below `max`, in which case the maximum sample is not
/// counted and the last `y` is below `1.0`.
pub fn build(samples: &[f64]) -> EdfCurve {
    if samples.is_empty() {
        return EdfCurve::default();
    }

    let (min, max) = bounds(samples);
    let step = (max - min) / (NUM_STEP - 1) as f64;
    let n = samples.len() as f64;

    // NaN never satisfies `v <= boundary`, so it only contributes to `n`.
    let mut sorted: Vec<f64> = samples.iter().copied().filter(|v| !v.is_nan()).collect();
    sorted.sort_by(f64::total_cmp);

    let points = (0..NUM_STEP)
        .map(|i| {
            let boundary = min + step * i as f64;
            let count = sorted.partition_point(|&v| v <= boundary);
            EdfPoint {
                x: boundary,
                y: count as f64 / n,
            }
        })
        .collect();

    EdfCurve { points }
}

/// Build one curve per `(label, samples)` series, preserving input order.
///
/// Series with no samples keep their slot with an empty curve.
pub fn build_multi<L, S, I>(series: I) -> Vec<NamedEdfCurve>
where
    I: IntoIterator<Item = (L, S)>,
    L: Into<String>,
    S: AsRef<[f64]>,
{
    series
        .into_iter()
        .map(|(label, samples)| NamedEdfCurve {
            label: label.into(),
            curve: build(samples.as_ref()),
        })
        .collect()
}

fn bounds(samples: &[f64]) -> (f64, f64) {
    samples
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            if v.is_nan() || lo.is_nan() {
                (f64::NAN, f64::NAN)
            } else {
                (lo.min(v), hi.max(v))
            }
        })
}
