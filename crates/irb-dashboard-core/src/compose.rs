use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::chart::{build_chart, catalog, ChartDefinition, ChartSpec, StylePolicy};
use crate::markup::group_thousands;
use crate::metrics::{tables, FindingsLog, MetricsStore, SchemaError, Status, OVERALL_SEGMENT};

/// Presentation knobs that differ between dashboard variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    pub charts_per_row: u8,
    pub chart_height: u32,
    pub override_chart_height: u32,
    /// Upper end of the perfect-calibration diagonal, in percent.
    pub calibration_upper: f64,
    pub auc_target: f64,
    pub auc_minimum: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            charts_per_row: 2,
            chart_height: 450,
            override_chart_height: 400,
            calibration_upper: 5.0,
            auc_target: 0.70,
            auc_minimum: 0.60,
        }
    }
}

impl LayoutOptions {
    pub fn validate(&self) -> Result<(), SchemaError> {
        let invalid = |reason: String| Err(SchemaError::InvalidLayout { reason });
        if !(1..=3).contains(&self.charts_per_row) {
            return invalid(format!(
                "charts_per_row must be within 1..=3 (got {})",
                self.charts_per_row
            ));
        }
        if self.chart_height < 200 || self.override_chart_height < 200 {
            return invalid("chart heights must be at least 200px".to_string());
        }
        if !(self.calibration_upper > 0.0) {
            return invalid(format!(
                "calibration_upper must be positive (got {})",
                self.calibration_upper
            ));
        }
        if self.auc_minimum > self.auc_target {
            return invalid(format!(
                "auc_minimum {} exceeds auc_target {}",
                self.auc_minimum, self.auc_target
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportHeader {
    pub title: String,
    pub subtitle: String,
    /// Accounts, defaults, default rate and period on one line.
    pub summary: String,
}

/// Headline figure with its RAG badge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiCard {
    pub label: String,
    pub value: String,
    pub badge: String,
    pub status: Status,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSection {
    pub title: String,
    pub accent: String,
    pub charts: Vec<ChartSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FindingRow {
    pub id: String,
    pub module: String,
    pub test: String,
    pub severity: u8,
    pub status: Status,
    pub description: String,
    /// Row background, from the same status mapping as the charts.
    pub tint: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FindingsTable {
    pub title: String,
    pub accent: String,
    pub columns: Vec<String>,
    pub rows: Vec<FindingRow>,
}

/// The composed dashboard: header, KPI strip, chart sections, findings, footer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportPage {
    pub header: ReportHeader,
    pub kpis: Vec<KpiCard>,
    pub sections: Vec<ChartSection>,
    pub findings: FindingsTable,
    pub footer: String,
    pub charts_per_row: u8,
}

struct SectionPlan {
    title: &'static str,
    accent: &'static str,
    charts: Vec<ChartDefinition>,
}

fn section_plan(layout: &LayoutOptions) -> Vec<SectionPlan> {
    vec![
        SectionPlan {
            title: "PD Model Validation",
            accent: "#3498db",
            charts: vec![
                catalog::auc_by_segment(layout),
                catalog::calibration_curve(layout),
            ],
        },
        SectionPlan {
            title: "LGD Model Validation",
            accent: "#e67e22",
            charts: vec![catalog::lgd_comparison(layout), catalog::lgd_stress(layout)],
        },
        SectionPlan {
            title: "EAD/CCF & Override Analysis",
            accent: "#27ae60",
            charts: vec![
                catalog::ccf_comparison(layout),
                catalog::override_impact(layout),
            ],
        },
    ]
}

const FINDINGS_COLUMNS: [&str; 6] = ["ID", "Module", "Test", "Severity", "RAG", "Finding"];

/// Assemble the page. Pure assembly: the only arithmetic is the KPI headline derivation.
#[instrument(level = "debug", skip_all, fields(findings = findings.len()))]
pub fn compose(
    store: &MetricsStore,
    findings: &FindingsLog,
    layout: &LayoutOptions,
    style: &StylePolicy,
) -> Result<ReportPage, SchemaError> {
    layout.validate()?;
    style.ensure_mapped(store.statuses())?;
    style.ensure_mapped(findings.iter().map(|f| f.status))?;

    let portfolio = store.portfolio();
    let header = ReportHeader {
        title: portfolio.title.clone(),
        subtitle: portfolio.subtitle.clone(),
        summary: format!(
            "{} Accounts | {} Defaults | {:.2}% Default Rate | {}",
            group_thousands(portfolio.total_accounts),
            group_thousands(portfolio.total_defaults),
            portfolio.default_rate_pct(),
            portfolio.as_of
        ),
    };

    let sections = section_plan(layout)
        .into_iter()
        .map(|plan| {
            let charts = plan
                .charts
                .iter()
                .map(|definition| build_chart(store.table(&definition.table)?, definition, style))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ChartSection {
                title: plan.title.to_string(),
                accent: plan.accent.to_string(),
                charts,
            })
        })
        .collect::<Result<Vec<_>, SchemaError>>()?;

    let rows = findings
        .iter()
        .map(|finding| {
            Ok(FindingRow {
                id: finding.id.clone(),
                module: finding.module.clone(),
                test: finding.test.clone(),
                severity: finding.severity,
                status: finding.status,
                description: finding.description.clone(),
                tint: style.row_tint(finding.status)?.to_string(),
            })
        })
        .collect::<Result<Vec<_>, SchemaError>>()?;

    let page = ReportPage {
        header,
        kpis: derive_kpis(store, findings, style)?,
        sections,
        findings: FindingsTable {
            title: "Validation Findings Log".to_string(),
            accent: "#e74c3c".to_string(),
            columns: FINDINGS_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows,
        },
        footer: portfolio.footer.clone(),
        charts_per_row: layout.charts_per_row,
    };
    debug!(
        sections = page.sections.len(),
        kpis = page.kpis.len(),
        "report composed"
    );
    Ok(page)
}

fn card(
    label: &str,
    value: String,
    status: Status,
    style: &StylePolicy,
) -> Result<KpiCard, SchemaError> {
    Ok(KpiCard {
        label: label.to_string(),
        value,
        badge: status.to_string(),
        status,
        color: style.status_color(status)?.to_string(),
    })
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Headline KPI cards, derived from the tables wherever the tables carry the figure.
pub fn derive_kpis(
    store: &MetricsStore,
    findings: &FindingsLog,
    style: &StylePolicy,
) -> Result<Vec<KpiCard>, SchemaError> {
    let portfolio = store.portfolio();

    let auc = store.table(tables::AUC_BY_SEGMENT)?;
    let overall = auc
        .find_row("segment", OVERALL_SEGMENT)?
        .ok_or_else(|| SchemaError::MissingRow {
            table: auc.name().to_string(),
            key: OVERALL_SEGMENT.to_string(),
        })?;
    let overall_status = auc.status("status")?[overall];

    let calibration = store.table(tables::CALIBRATION_BY_DECILE)?;
    if calibration.row_count() == 0 {
        return Err(SchemaError::MissingRow {
            table: calibration.name().to_string(),
            key: "decile".to_string(),
        });
    }
    let calibration_bias =
        mean(calibration.float("observed_dr")?) - mean(calibration.float("predicted_pd")?);

    let stress = store.table(tables::LGD_STRESS)?;
    let (Some(stressed), Some(model)) = (
        stress.float("stressed_lgd")?.first(),
        stress.float("model_lgd")?.first(),
    ) else {
        return Err(SchemaError::MissingRow {
            table: stress.name().to_string(),
            key: "base scenario".to_string(),
        });
    };
    let lgd_bias = stressed - model;

    let mut cards = vec![
        card(
            "Overall AUC",
            format!("{:.4}", auc.float("auc")?[overall]),
            overall_status,
            style,
        )?,
        card(
            "Gini",
            format!("{:.4}", auc.float("gini")?[overall]),
            overall_status,
            style,
        )?,
        card(
            "Calibration Bias",
            format!("{calibration_bias:.2}%"),
            portfolio.calibration_status,
            style,
        )?,
        card(
            "LGD Bias",
            format!("{lgd_bias:.2}%"),
            portfolio.lgd_status,
            style,
        )?,
        card(
            "EAD Ratio",
            format!("{:.3}", portfolio.ead_ratio),
            portfolio.ead_status,
            style,
        )?,
    ];

    let worst = findings
        .iter()
        .map(|f| f.status)
        .max()
        .unwrap_or(Status::Green);
    let counts: Vec<String> = [Status::Red, Status::Amber, Status::Green]
        .into_iter()
        .map(|status| (status, findings.count(status)))
        .filter(|(_, count)| *count > 0)
        .map(|(status, count)| format!("{count} {status}"))
        .collect();
    cards.push(KpiCard {
        label: "Findings".to_string(),
        value: format!("{} Total", findings.len()),
        badge: if counts.is_empty() {
            "None".to_string()
        } else {
            counts.join(" | ")
        },
        status: worst,
        color: style.status_color(worst)?.to_string(),
    });
    Ok(cards)
}
