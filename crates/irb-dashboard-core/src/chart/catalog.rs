//! The six standard validation charts.

use super::{BarFill, ChartDefinition, ChartKind, SeriesDef, ThresholdLine};
use crate::compose::LayoutOptions;
use crate::metrics::tables;

const PREDICTED_COLOR: &str = "#3498db";
const REALIZED_COLOR: &str = "#e67e22";

pub fn auc_by_segment(layout: &LayoutOptions) -> ChartDefinition {
    ChartDefinition {
        id: "pd-auc".into(),
        title: "PD Model Discrimination (AUC) by Segment".into(),
        table: tables::AUC_BY_SEGMENT.into(),
        kind: ChartKind::Bar {
            category: "segment".into(),
            value: "auc".into(),
            fill: BarFill::Status {
                column: "status".into(),
            },
            label_decimals: Some(4),
            thresholds: vec![
                ThresholdLine {
                    y: layout.auc_target,
                    color: "green".into(),
                    label: format!("Target ({:.2})", layout.auc_target),
                },
                ThresholdLine {
                    y: layout.auc_minimum,
                    color: "orange".into(),
                    label: format!("Minimum ({:.2})", layout.auc_minimum),
                },
            ],
        },
        x_title: None,
        y_title: Some("AUC".into()),
        y_range: Some((0.0, 1.0)),
        height: layout.chart_height,
    }
}

pub fn calibration_curve(layout: &LayoutOptions) -> ChartDefinition {
    ChartDefinition {
        id: "pd-calibration".into(),
        title: "PD Calibration Curve".into(),
        table: tables::CALIBRATION_BY_DECILE.into(),
        kind: ChartKind::Calibration {
            x: "predicted_pd".into(),
            y: "observed_dr".into(),
            name: "Observed DR".into(),
            color: "#1f77b4".into(),
            reference_name: "Perfect Calibration".into(),
            reference_color: "gray".into(),
            reference_upper: layout.calibration_upper,
        },
        x_title: Some("Predicted PD (%)".into()),
        y_title: Some("Observed Default Rate (%)".into()),
        y_range: None,
        height: layout.chart_height,
    }
}

fn comparison(
    id: &str,
    title: &str,
    table: &str,
    metric: &str,
    layout: &LayoutOptions,
) -> ChartDefinition {
    ChartDefinition {
        id: id.into(),
        title: title.into(),
        table: table.into(),
        kind: ChartKind::GroupedBar {
            category: "segment".into(),
            series: vec![
                SeriesDef {
                    column: "predicted".into(),
                    name: format!("Predicted {metric}"),
                    color: PREDICTED_COLOR.into(),
                },
                SeriesDef {
                    column: "realized".into(),
                    name: format!("Realized {metric}"),
                    color: REALIZED_COLOR.into(),
                },
            ],
        },
        x_title: None,
        y_title: Some(format!("{metric} (%)")),
        y_range: None,
        height: layout.chart_height,
    }
}

pub fn lgd_comparison(layout: &LayoutOptions) -> ChartDefinition {
    comparison(
        "lgd-comparison",
        "LGD: Predicted vs Realized by Segment (%)",
        tables::LGD_BY_SEGMENT,
        "LGD",
        layout,
    )
}

pub fn ccf_comparison(layout: &LayoutOptions) -> ChartDefinition {
    comparison(
        "ccf-comparison",
        "CCF: Predicted vs Realized by Segment (%)",
        tables::CCF_BY_SEGMENT,
        "CCF",
        layout,
    )
}

pub fn lgd_stress(layout: &LayoutOptions) -> ChartDefinition {
    ChartDefinition {
        id: "lgd-stress".into(),
        title: "LGD Downturn Stress Test (%)".into(),
        table: tables::LGD_STRESS.into(),
        kind: ChartKind::BarWithBaseline {
            category: "scenario".into(),
            value: "stressed_lgd".into(),
            name: "Stressed LGD".into(),
            palette: ["#2ecc71", "#f39c12", "#e74c3c", "#c0392b"]
                .map(String::from)
                .to_vec(),
            baseline: "model_lgd".into(),
            baseline_name: "Model LGD".into(),
            baseline_color: "black".into(),
        },
        x_title: None,
        y_title: Some("LGD (%)".into()),
        y_range: None,
        height: layout.chart_height,
    }
}

pub fn override_impact(layout: &LayoutOptions) -> ChartDefinition {
    ChartDefinition {
        id: "override-impact".into(),
        title: "Override Impact on Default Rates".into(),
        table: tables::OVERRIDE_IMPACT.into(),
        kind: ChartKind::Bar {
            category: "group".into(),
            value: "default_rate".into(),
            fill: BarFill::Palette {
                colors: vec![PREDICTED_COLOR.into(), "#e74c3c".into()],
            },
            label_decimals: Some(2),
            thresholds: Vec::new(),
        },
        x_title: None,
        y_title: Some("Default Rate (%)".into()),
        y_range: None,
        height: layout.override_chart_height,
    }
}

/// Every standard chart, in page order.
pub fn all(layout: &LayoutOptions) -> Vec<ChartDefinition> {
    vec![
        auc_by_segment(layout),
        calibration_curve(layout),
        lgd_comparison(layout),
        lgd_stress(layout),
        ccf_comparison(layout),
        override_impact(layout),
    ]
}
