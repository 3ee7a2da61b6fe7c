//! Plotly figure descriptions for EDF curves.
//!
//! The server hands these JSON figures to the browser as-is; rendering is
//! left entirely to plotly.js.

use plotly::common::{Mode, Title};
use plotly::layout::themes::BuiltinTheme;
use plotly::layout::{Axis, Layout, Margin};
use plotly::{Plot, Scatter};
use serde::{Deserialize, Serialize};

use crate::edf::{EdfCurve, NamedEdfCurve};

/// Color scheme requested by the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl std::str::FromStr for ThemeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(ThemeMode::Light),
            "dark" => Ok(ThemeMode::Dark),
            other => Err(format!("unknown theme mode '{}'", other)),
        }
    }
}

const X_AXIS_TITLE: &str = "Objective Value";
const Y_AXIS_TITLE: &str = "Cumulative Probability";

fn base_layout(mode: ThemeMode) -> Layout {
    let layout = Layout::new();
    match mode {
        ThemeMode::Dark => layout.template(BuiltinTheme::PlotlyDark.build()),
        ThemeMode::Light => layout,
    }
}

fn edf_layout(mode: ThemeMode) -> Layout {
    base_layout(mode)
        .x_axis(Axis::new().title(Title::with_text(X_AXIS_TITLE)))
        .y_axis(Axis::new().title(Title::with_text(Y_AXIS_TITLE)))
        .margin(Margin::new().left(50).top(0).right(50).bottom(50))
}

/// Figure for a single study's curve. An empty curve yields a figure without
/// traces.
pub fn edf_plot(curve: &EdfCurve, mode: ThemeMode) -> Plot {
    let mut plot = Plot::new();
    if curve.is_empty() {
        plot.set_layout(base_layout(mode));
        return plot;
    }
    plot.add_trace(Scatter::new(curve.xs(), curve.ys()).mode(Mode::Lines));
    plot.set_layout(edf_layout(mode));
    plot
}

/// Figure comparing several studies, one named trace per curve in order.
///
/// Series with empty curves keep their (empty) trace so legends stay aligned
/// with the requested studies.
pub fn edf_multi_plot(curves: &[NamedEdfCurve], mode: ThemeMode) -> Plot {
    let mut plot = Plot::new();
    if curves.is_empty() {
        plot.set_layout(base_layout(mode));
        return plot;
    }
    for named in curves {
        plot.add_trace(
            Scatter::new(named.curve.xs(), named.curve.ys())
                .mode(Mode::Lines)
                .name(&named.label),
        );
    }
    plot.set_layout(edf_layout(mode));
    plot
}

/// Serialize a figure into the JSON object accepted by `Plotly.react`.
pub fn to_json_value(plot: &Plot) -> crate::error::Result<serde_json::Value> {
    Ok(serde_json::from_str(&plot.to_json())?)
}
