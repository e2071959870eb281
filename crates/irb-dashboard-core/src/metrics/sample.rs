//! Built-in February 2026 validation results.
//!
//! Served when no metrics document is configured. The same figures ship as
//! `metrics/feb2026.yaml` at the workspace root.

use super::{
    AucRow, CalibrationRow, ComparisonRow, Finding, MetricsDocument, MetricsStore, OverrideRow,
    PortfolioSummary, Status, StressRow,
};

pub fn february_2026() -> MetricsDocument {
    MetricsDocument {
        portfolio: PortfolioSummary {
            title: "IRB Credit Model Validation Dashboard".into(),
            subtitle: "PD / LGD / EAD-CCF | CRR & EBA GL/2017/16".into(),
            as_of: "Feb 2026".into(),
            total_accounts: 10_000,
            total_defaults: 211,
            ead_ratio: 1.013,
            calibration_status: Status::Green,
            lgd_status: Status::Green,
            ead_status: Status::Green,
            footer: "IRB Credit Model Validation Toolkit".into(),
        },
        auc_by_segment: vec![
            auc("OVERALL", 0.6176, 0.2352, Status::Amber),
            auc("CORPORATE", 0.6140, 0.2280, Status::Amber),
            auc("SME", 0.5920, 0.1841, Status::Red),
            auc("RETAIL", 0.6234, 0.2467, Status::Amber),
        ],
        calibration_by_decile: [
            (0.682, 1.600),
            (0.900, 0.900),
            (1.074, 1.100),
            (1.242, 1.400),
            (1.419, 1.500),
            (1.612, 2.600),
            (1.842, 2.100),
            (2.146, 3.200),
            (2.588, 2.700),
            (3.707, 4.000),
        ]
        .into_iter()
        .enumerate()
        .map(|(decile, (predicted_pd, observed_dr))| CalibrationRow {
            decile: decile as i64,
            predicted_pd,
            observed_dr,
        })
        .collect(),
        lgd_by_segment: vec![
            comparison("CORPORATE", 48.18, 50.93, 2.75),
            comparison("RETAIL", 48.40, 52.06, 3.66),
            comparison("SME", 49.59, 53.48, 3.89),
        ],
        lgd_stress: vec![
            stress("Base Case", 52.19, 48.77),
            stress("10% Haircut", 56.97, 48.77),
            stress("20% Haircut", 61.75, 48.77),
            stress("30% Severe", 66.53, 48.77),
        ],
        ccf_by_segment: vec![
            comparison("CORPORATE", 35.98, 36.65, 0.67),
            comparison("RETAIL", 37.16, 39.89, 2.73),
            comparison("SME", 36.84, 41.34, 4.50),
        ],
        override_impact: vec![
            OverrideRow {
                group: "Not Overridden".into(),
                accounts: 8990,
                defaults: 186,
                default_rate: 2.07,
                avg_pd: 1.72,
            },
            OverrideRow {
                group: "Overridden".into(),
                accounts: 1010,
                defaults: 25,
                default_rate: 2.48,
                avg_pd: 1.71,
            },
        ],
        findings: vec![
            finding(
                "F001",
                "DATA_QUALITY",
                "Missing - LGD",
                2,
                Status::Red,
                "predicted_lgd 97.9% missing (expected for non-defaults)",
            ),
            finding(
                "F002",
                "DATA_QUALITY",
                "Missing - Recovery",
                2,
                Status::Red,
                "recovery_months 97.9% missing (expected for non-defaults)",
            ),
            finding(
                "F003",
                "DATA_QUALITY",
                "Missing - Realized LGD",
                2,
                Status::Red,
                "realized_lgd 97.9% missing (expected for non-defaults)",
            ),
            finding(
                "F004",
                "PD",
                "Overall AUC",
                3,
                Status::Amber,
                "AUC=0.6176 below 0.70 target",
            ),
            finding(
                "F005",
                "PD",
                "SME Segment AUC",
                2,
                Status::Red,
                "SME segment AUC=0.5920 below minimum threshold",
            ),
        ],
    }
}

impl MetricsStore {
    /// Store built from [`february_2026`].
    pub fn sample() -> Self {
        match Self::from_document(february_2026()) {
            Ok(store) => store,
            Err(err) => unreachable!("built-in sample violates schema: {err}"),
        }
    }
}

fn auc(segment: &str, auc: f64, gini: f64, status: Status) -> AucRow {
    AucRow {
        segment: segment.into(),
        auc,
        gini,
        status,
    }
}

fn comparison(segment: &str, predicted: f64, realized: f64, bias: f64) -> ComparisonRow {
    ComparisonRow {
        segment: segment.into(),
        predicted,
        realized,
        bias,
    }
}

fn stress(scenario: &str, stressed_lgd: f64, model_lgd: f64) -> StressRow {
    StressRow {
        scenario: scenario.into(),
        stressed_lgd,
        model_lgd,
    }
}

fn finding(
    id: &str,
    module: &str,
    test: &str,
    severity: u8,
    status: Status,
    description: &str,
) -> Finding {
    Finding {
        id: id.into(),
        module: module.into(),
        test: test.into(),
        severity,
        status,
        description: description.into(),
    }
}
