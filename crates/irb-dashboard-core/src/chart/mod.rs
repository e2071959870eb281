use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{instrument, trace};

use crate::metrics::{MetricTable, SchemaError, Status};

pub mod catalog;
pub mod svg;

/// Colour policy shared by charts and the findings table.
///
/// Both maps must carry every status a store references; a missing entry is a
/// [`SchemaError::UnmappedStatus`], never a fallback colour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StylePolicy {
    /// Solid colour for bars, KPI values and badges.
    pub status_colors: BTreeMap<Status, String>,
    /// Light tint used as findings-table row background.
    pub row_tints: BTreeMap<Status, String>,
}

impl Default for StylePolicy {
    fn default() -> Self {
        Self {
            status_colors: BTreeMap::from([
                (Status::Green, "#27ae60".to_string()),
                (Status::Amber, "#f39c12".to_string()),
                (Status::Red, "#e74c3c".to_string()),
            ]),
            row_tints: BTreeMap::from([
                (Status::Green, "#d5f5e3".to_string()),
                (Status::Amber, "#fdebd0".to_string()),
                (Status::Red, "#fadbd8".to_string()),
            ]),
        }
    }
}

impl StylePolicy {
    pub fn status_color(&self, status: Status) -> Result<&str, SchemaError> {
        self.status_colors
            .get(&status)
            .map(String::as_str)
            .ok_or(SchemaError::UnmappedStatus {
                status,
                mapping: "status_colors",
            })
    }

    pub fn row_tint(&self, status: Status) -> Result<&str, SchemaError> {
        self.row_tints
            .get(&status)
            .map(String::as_str)
            .ok_or(SchemaError::UnmappedStatus {
                status,
                mapping: "row_tints",
            })
    }

    /// Fail on the first status missing from either mapping.
    pub fn ensure_mapped(
        &self,
        statuses: impl IntoIterator<Item = Status>,
    ) -> Result<(), SchemaError> {
        for status in statuses {
            self.status_color(status)?;
            self.row_tint(status)?;
        }
        Ok(())
    }
}

/// Dashed horizontal reference line drawn across the plot area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdLine {
    pub y: f64,
    pub color: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BarFill {
    /// Colour each bar by the row's status.
    Status { column: String },
    /// Cycle through fixed colours in row order.
    Palette { colors: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesDef {
    pub column: String,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartKind {
    Bar {
        category: String,
        value: String,
        fill: BarFill,
        /// Decimal places for value labels above each bar.
        label_decimals: Option<usize>,
        thresholds: Vec<ThresholdLine>,
    },
    GroupedBar {
        category: String,
        series: Vec<SeriesDef>,
    },
    Calibration {
        x: String,
        y: String,
        name: String,
        color: String,
        reference_name: String,
        reference_color: String,
        /// The reference diagonal runs from (0, 0) to (upper, upper).
        reference_upper: f64,
    },
    BarWithBaseline {
        category: String,
        value: String,
        name: String,
        palette: Vec<String>,
        baseline: String,
        baseline_name: String,
        baseline_color: String,
    },
}

/// What to draw from which table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDefinition {
    pub id: String,
    pub title: String,
    pub table: String,
    pub kind: ChartKind,
    pub x_title: Option<String>,
    pub y_title: Option<String>,
    pub y_range: Option<(f64, f64)>,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "scale", content = "values", rename_all = "snake_case")]
pub enum XValues {
    Categories(Vec<String>),
    Numbers(Vec<f64>),
}

impl XValues {
    pub fn len(&self) -> usize {
        match self {
            XValues::Categories(values) => values.len(),
            XValues::Numbers(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceMode {
    Bar,
    Lines,
    LinesMarkers,
}

/// One data series of a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    pub name: Option<String>,
    pub mode: TraceMode,
    pub x: XValues,
    pub y: Vec<f64>,
    /// One colour per point, or a single colour for the whole series.
    pub colors: Vec<String>,
    pub dashed: bool,
    /// Text shown above each point; empty when the series is unlabeled.
    pub labels: Vec<String>,
}

impl Trace {
    pub fn color_at(&self, idx: usize) -> &str {
        match self.colors.len() {
            0 => "#7f8c8d",
            1 => &self.colors[0],
            n => &self.colors[idx % n],
        }
    }
}

/// Fully resolved description of one visual.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub id: String,
    pub title: String,
    pub x_title: Option<String>,
    pub y_title: Option<String>,
    pub y_range: Option<(f64, f64)>,
    pub height: u32,
    pub traces: Vec<Trace>,
    pub thresholds: Vec<ThresholdLine>,
}

impl ChartSpec {
    pub fn bar_count(&self) -> usize {
        self.traces
            .iter()
            .filter(|t| t.mode == TraceMode::Bar)
            .map(|t| t.y.len())
            .sum()
    }
}

/// Map a table onto a chart specification. Pure: equal inputs give equal specs.
#[instrument(level = "debug", skip_all, fields(chart = %definition.id, table = %table.name()))]
pub fn build_chart(
    table: &MetricTable,
    definition: &ChartDefinition,
    style: &StylePolicy,
) -> Result<ChartSpec, SchemaError> {
    if definition.table != table.name() {
        return Err(SchemaError::WrongTable {
            chart: definition.id.clone(),
            expected: definition.table.clone(),
            actual: table.name().to_string(),
        });
    }

    let mut thresholds = Vec::new();
    let traces = match &definition.kind {
        ChartKind::Bar {
            category,
            value,
            fill,
            label_decimals,
            thresholds: lines,
        } => {
            let values = table.float(value)?.to_vec();
            let colors = match fill {
                BarFill::Status { column } => table
                    .status(column)?
                    .iter()
                    .map(|status| style.status_color(*status).map(str::to_string))
                    .collect::<Result<Vec<_>, _>>()?,
                BarFill::Palette { colors } => colors.clone(),
            };
            let labels = label_decimals
                .map(|decimals| {
                    values
                        .iter()
                        .map(|v| format!("{v:.decimals$}"))
                        .collect()
                })
                .unwrap_or_default();
            thresholds = lines.clone();
            vec![Trace {
                name: None,
                mode: TraceMode::Bar,
                x: XValues::Categories(table.text(category)?.to_vec()),
                y: values,
                colors,
                dashed: false,
                labels,
            }]
        }
        ChartKind::GroupedBar { category, series } => {
            let categories = table.text(category)?;
            series
                .iter()
                .map(|s| {
                    Ok(Trace {
                        name: Some(s.name.clone()),
                        mode: TraceMode::Bar,
                        x: XValues::Categories(categories.to_vec()),
                        y: table.float(&s.column)?.to_vec(),
                        colors: vec![s.color.clone()],
                        dashed: false,
                        labels: Vec::new(),
                    })
                })
                .collect::<Result<Vec<_>, SchemaError>>()?
        }
        ChartKind::Calibration {
            x,
            y,
            name,
            color,
            reference_name,
            reference_color,
            reference_upper,
        } => vec![
            Trace {
                name: Some(name.clone()),
                mode: TraceMode::LinesMarkers,
                x: XValues::Numbers(table.float(x)?.to_vec()),
                y: table.float(y)?.to_vec(),
                colors: vec![color.clone()],
                dashed: false,
                labels: Vec::new(),
            },
            Trace {
                name: Some(reference_name.clone()),
                mode: TraceMode::Lines,
                x: XValues::Numbers(vec![0.0, *reference_upper]),
                y: vec![0.0, *reference_upper],
                colors: vec![reference_color.clone()],
                dashed: true,
                labels: Vec::new(),
            },
        ],
        ChartKind::BarWithBaseline {
            category,
            value,
            name,
            palette,
            baseline,
            baseline_name,
            baseline_color,
        } => {
            let categories = table.text(category)?;
            vec![
                Trace {
                    name: Some(name.clone()),
                    mode: TraceMode::Bar,
                    x: XValues::Categories(categories.to_vec()),
                    y: table.float(value)?.to_vec(),
                    colors: palette.clone(),
                    dashed: false,
                    labels: Vec::new(),
                },
                Trace {
                    name: Some(baseline_name.clone()),
                    mode: TraceMode::LinesMarkers,
                    x: XValues::Categories(categories.to_vec()),
                    y: table.float(baseline)?.to_vec(),
                    colors: vec![baseline_color.clone()],
                    dashed: true,
                    labels: Vec::new(),
                },
            ]
        }
    };
    trace!(traces = traces.len(), "chart built");

    Ok(ChartSpec {
        id: definition.id.clone(),
        title: definition.title.clone(),
        x_title: definition.x_title.clone(),
        y_title: definition.y_title.clone(),
        y_range: definition.y_range,
        height: definition.height,
        traces,
        thresholds,
    })
}
