use std::{
    collections::{BTreeMap, HashSet},
    fmt,
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod file_repository;
pub mod sample;

/// Names of the tables every metrics store carries.
pub mod tables {
    pub const AUC_BY_SEGMENT: &str = "auc_by_segment";
    pub const CALIBRATION_BY_DECILE: &str = "calibration_by_decile";
    pub const LGD_BY_SEGMENT: &str = "lgd_by_segment";
    pub const LGD_STRESS: &str = "lgd_stress";
    pub const CCF_BY_SEGMENT: &str = "ccf_by_segment";
    pub const OVERRIDE_IMPACT: &str = "override_impact";
}

/// Segment label of the portfolio-wide row in the AUC table.
pub const OVERALL_SEGMENT: &str = "OVERALL";

const BIAS_TOLERANCE: f64 = 0.01;

/// Red/Amber/Green classification attached to metrics and findings.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum Status {
    Green,
    Amber,
    Red,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Green, Status::Amber, Status::Red];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Green => "GREEN",
            Status::Amber => "AMBER",
            Status::Red => "RED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GREEN" => Ok(Status::Green),
            "AMBER" => Ok(Status::Amber),
            "RED" => Ok(Status::Red),
            _ => Err(SchemaError::UnknownStatus {
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Status {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Value type carried by a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Text,
    Float,
    Integer,
    Status,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ColumnKind::Text => "text",
            ColumnKind::Float => "float",
            ColumnKind::Integer => "integer",
            ColumnKind::Status => "status",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum ColumnValues {
    Text(Vec<String>),
    Float(Vec<f64>),
    Integer(Vec<i64>),
    Status(Vec<Status>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Text(values) => values.len(),
            ColumnValues::Float(values) => values.len(),
            ColumnValues::Integer(values) => values.len(),
            ColumnValues::Status(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnValues::Text(_) => ColumnKind::Text,
            ColumnValues::Float(_) => ColumnKind::Float,
            ColumnValues::Integer(_) => ColumnKind::Integer,
            ColumnValues::Status(_) => ColumnKind::Status,
        }
    }
}

/// A named, typed column of a [`MetricTable`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    #[serde(flatten)]
    pub values: ColumnValues,
}

impl Column {
    pub fn text<S: Into<String>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            name: name.into(),
            values: ColumnValues::Text(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn float(name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            name: name.into(),
            values: ColumnValues::Float(values.into_iter().collect()),
        }
    }

    pub fn integer(name: impl Into<String>, values: impl IntoIterator<Item = i64>) -> Self {
        Self {
            name: name.into(),
            values: ColumnValues::Integer(values.into_iter().collect()),
        }
    }

    pub fn status(name: impl Into<String>, values: impl IntoIterator<Item = Status>) -> Self {
        Self {
            name: name.into(),
            values: ColumnValues::Status(values.into_iter().collect()),
        }
    }
}

/// Named, ordered rows sharing a fixed set of typed columns. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricTable {
    name: String,
    rows: usize,
    columns: Vec<Column>,
}

impl MetricTable {
    /// Construct a table, rejecting empty schemas, duplicate columns and ragged columns.
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Result<Self, SchemaError> {
        let name = name.into();
        let Some(first) = columns.first() else {
            return Err(SchemaError::EmptyTable { table: name });
        };
        let rows = first.values.len();
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(SchemaError::DuplicateColumn {
                    table: name,
                    column: column.name.clone(),
                });
            }
            if column.values.len() != rows {
                return Err(SchemaError::LengthMismatch {
                    table: name,
                    column: column.name.clone(),
                    expected: rows,
                    actual: column.values.len(),
                });
            }
        }
        Ok(Self {
            name,
            rows,
            columns,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn column(&self, column: &str) -> Result<&ColumnValues, SchemaError> {
        self.columns
            .iter()
            .find(|c| c.name == column)
            .map(|c| &c.values)
            .ok_or_else(|| SchemaError::MissingColumn {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }

    fn type_mismatch(&self, column: &str, expected: ColumnKind, actual: ColumnKind) -> SchemaError {
        SchemaError::ColumnType {
            table: self.name.clone(),
            column: column.to_string(),
            expected,
            actual,
        }
    }

    pub fn text(&self, column: &str) -> Result<&[String], SchemaError> {
        match self.column(column)? {
            ColumnValues::Text(values) => Ok(values),
            other => Err(self.type_mismatch(column, ColumnKind::Text, other.kind())),
        }
    }

    pub fn float(&self, column: &str) -> Result<&[f64], SchemaError> {
        match self.column(column)? {
            ColumnValues::Float(values) => Ok(values),
            other => Err(self.type_mismatch(column, ColumnKind::Float, other.kind())),
        }
    }

    pub fn integer(&self, column: &str) -> Result<&[i64], SchemaError> {
        match self.column(column)? {
            ColumnValues::Integer(values) => Ok(values),
            other => Err(self.type_mismatch(column, ColumnKind::Integer, other.kind())),
        }
    }

    pub fn status(&self, column: &str) -> Result<&[Status], SchemaError> {
        match self.column(column)? {
            ColumnValues::Status(values) => Ok(values),
            other => Err(self.type_mismatch(column, ColumnKind::Status, other.kind())),
        }
    }

    /// Every status value held by any status column, in column then row order.
    pub fn statuses(&self) -> impl Iterator<Item = Status> + '_ {
        self.columns
            .iter()
            .filter_map(|c| match &c.values {
                ColumnValues::Status(values) => Some(values.iter().copied()),
                _ => None,
            })
            .flatten()
    }

    /// Index of the first row whose text column equals `key`.
    pub fn find_row(&self, column: &str, key: &str) -> Result<Option<usize>, SchemaError> {
        Ok(self.text(column)?.iter().position(|value| value == key))
    }
}

/// A single entry in the validation findings log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub id: String,
    pub module: String,
    pub test: String,
    /// 1 (most severe) to 5.
    pub severity: u8,
    pub status: Status,
    pub description: String,
}

impl Finding {
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.id.trim().is_empty() {
            return Err(SchemaError::BlankFindingId);
        }
        if !(1..=5).contains(&self.severity) {
            return Err(SchemaError::InvalidSeverity {
                finding_id: self.id.clone(),
                severity: self.severity,
            });
        }
        Ok(())
    }
}

/// Ordered findings, unique by identifier.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Finding>", into = "Vec<Finding>")]
pub struct FindingsLog {
    findings: Vec<Finding>,
}

impl FindingsLog {
    pub fn new(findings: Vec<Finding>) -> Result<Self, SchemaError> {
        let mut seen = HashSet::new();
        for finding in &findings {
            finding.validate()?;
            if !seen.insert(finding.id.as_str()) {
                return Err(SchemaError::DuplicateFinding {
                    finding_id: finding.id.clone(),
                });
            }
        }
        Ok(Self { findings })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Finding> {
        self.findings.iter()
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn count(&self, status: Status) -> usize {
        self.findings.iter().filter(|f| f.status == status).count()
    }

    pub fn get(&self, id: &str) -> Option<&Finding> {
        self.findings.iter().find(|f| f.id == id)
    }
}

impl TryFrom<Vec<Finding>> for FindingsLog {
    type Error = SchemaError;

    fn try_from(findings: Vec<Finding>) -> Result<Self, Self::Error> {
        Self::new(findings)
    }
}

impl From<FindingsLog> for Vec<Finding> {
    fn from(log: FindingsLog) -> Self {
        log.findings
    }
}

impl<'a> IntoIterator for &'a FindingsLog {
    type Item = &'a Finding;
    type IntoIter = std::slice::Iter<'a, Finding>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Portfolio-level facts shown in the banner and KPI strip that no table carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub title: String,
    pub subtitle: String,
    /// Reporting period label, e.g. `Feb 2026`.
    pub as_of: String,
    pub total_accounts: u64,
    pub total_defaults: u64,
    pub ead_ratio: f64,
    pub calibration_status: Status,
    pub lgd_status: Status,
    pub ead_status: Status,
    #[serde(default = "default_footer")]
    pub footer: String,
}

fn default_footer() -> String {
    "IRB Credit Model Validation Toolkit".to_string()
}

impl PortfolioSummary {
    /// Observed default rate in percent.
    pub fn default_rate_pct(&self) -> f64 {
        if self.total_accounts == 0 {
            return 0.0;
        }
        self.total_defaults as f64 / self.total_accounts as f64 * 100.0
    }

    pub fn statuses(&self) -> [Status; 3] {
        [self.calibration_status, self.lgd_status, self.ead_status]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AucRow {
    pub segment: String,
    pub auc: f64,
    pub gini: f64,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRow {
    pub decile: i64,
    pub predicted_pd: f64,
    pub observed_dr: f64,
}

/// Predicted vs. realized comparison used by both the LGD and CCF tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub segment: String,
    pub predicted: f64,
    pub realized: f64,
    pub bias: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressRow {
    pub scenario: String,
    pub stressed_lgd: f64,
    pub model_lgd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideRow {
    pub group: String,
    pub accounts: i64,
    pub defaults: i64,
    pub default_rate: f64,
    pub avg_pd: f64,
}

/// Row-oriented document form of a metrics store, as read from YAML or JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsDocument {
    pub portfolio: PortfolioSummary,
    pub auc_by_segment: Vec<AucRow>,
    pub calibration_by_decile: Vec<CalibrationRow>,
    pub lgd_by_segment: Vec<ComparisonRow>,
    pub lgd_stress: Vec<StressRow>,
    pub ccf_by_segment: Vec<ComparisonRow>,
    pub override_impact: Vec<OverrideRow>,
    pub findings: Vec<Finding>,
}

/// Immutable set of validation tables plus the findings log and portfolio summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsStore {
    portfolio: PortfolioSummary,
    tables: BTreeMap<String, MetricTable>,
    findings: FindingsLog,
}

impl MetricsStore {
    /// Build the store from its document form and check cross-table consistency.
    pub fn from_document(doc: MetricsDocument) -> Result<Self, SchemaError> {
        let MetricsDocument {
            portfolio,
            auc_by_segment,
            calibration_by_decile,
            lgd_by_segment,
            lgd_stress,
            ccf_by_segment,
            override_impact,
            findings,
        } = doc;

        let built = vec![
            MetricTable::new(
                tables::AUC_BY_SEGMENT,
                vec![
                    Column::text("segment", auc_by_segment.iter().map(|r| r.segment.clone())),
                    Column::float("auc", auc_by_segment.iter().map(|r| r.auc)),
                    Column::float("gini", auc_by_segment.iter().map(|r| r.gini)),
                    Column::status("status", auc_by_segment.iter().map(|r| r.status)),
                ],
            )?,
            MetricTable::new(
                tables::CALIBRATION_BY_DECILE,
                vec![
                    Column::integer("decile", calibration_by_decile.iter().map(|r| r.decile)),
                    Column::float(
                        "predicted_pd",
                        calibration_by_decile.iter().map(|r| r.predicted_pd),
                    ),
                    Column::float(
                        "observed_dr",
                        calibration_by_decile.iter().map(|r| r.observed_dr),
                    ),
                ],
            )?,
            comparison_table(tables::LGD_BY_SEGMENT, &lgd_by_segment)?,
            MetricTable::new(
                tables::LGD_STRESS,
                vec![
                    Column::text("scenario", lgd_stress.iter().map(|r| r.scenario.clone())),
                    Column::float("stressed_lgd", lgd_stress.iter().map(|r| r.stressed_lgd)),
                    Column::float("model_lgd", lgd_stress.iter().map(|r| r.model_lgd)),
                ],
            )?,
            comparison_table(tables::CCF_BY_SEGMENT, &ccf_by_segment)?,
            MetricTable::new(
                tables::OVERRIDE_IMPACT,
                vec![
                    Column::text("group", override_impact.iter().map(|r| r.group.clone())),
                    Column::integer("accounts", override_impact.iter().map(|r| r.accounts)),
                    Column::integer("defaults", override_impact.iter().map(|r| r.defaults)),
                    Column::float(
                        "default_rate",
                        override_impact.iter().map(|r| r.default_rate),
                    ),
                    Column::float("avg_pd", override_impact.iter().map(|r| r.avg_pd)),
                ],
            )?,
        ];

        let store = Self {
            portfolio,
            tables: built
                .into_iter()
                .map(|table| (table.name().to_string(), table))
                .collect(),
            findings: FindingsLog::new(findings)?,
        };
        store.validate()?;
        Ok(store)
    }

    fn validate(&self) -> Result<(), SchemaError> {
        if self.portfolio.total_accounts == 0 {
            return Err(SchemaError::EmptyPortfolio);
        }
        if !self.portfolio.ead_ratio.is_finite() {
            return Err(SchemaError::NonFinite {
                table: "portfolio".to_string(),
                column: "ead_ratio".to_string(),
                row: 0,
            });
        }
        for table in self.tables() {
            check_finite(table)?;
        }

        let overrides = self.table(tables::OVERRIDE_IMPACT)?;
        check_total(overrides, "accounts", self.portfolio.total_accounts)?;
        check_total(overrides, "defaults", self.portfolio.total_defaults)?;

        let auc = self.table(tables::AUC_BY_SEGMENT)?;
        if auc.find_row("segment", OVERALL_SEGMENT)?.is_none() {
            return Err(SchemaError::MissingRow {
                table: auc.name().to_string(),
                key: OVERALL_SEGMENT.to_string(),
            });
        }

        for name in [tables::LGD_BY_SEGMENT, tables::CCF_BY_SEGMENT] {
            check_bias(self.table(name)?)?;
        }

        if self.table(tables::LGD_STRESS)?.row_count() == 0 {
            return Err(SchemaError::MissingRow {
                table: tables::LGD_STRESS.to_string(),
                key: "base scenario".to_string(),
            });
        }
        Ok(())
    }

    pub fn portfolio(&self) -> &PortfolioSummary {
        &self.portfolio
    }

    pub fn findings(&self) -> &FindingsLog {
        &self.findings
    }

    pub fn table(&self, name: &str) -> Result<&MetricTable, SchemaError> {
        self.tables
            .get(name)
            .ok_or_else(|| SchemaError::MissingTable {
                table: name.to_string(),
            })
    }

    pub fn tables(&self) -> impl Iterator<Item = &MetricTable> {
        self.tables.values()
    }

    /// Every status referenced by tables, findings and the portfolio summary.
    pub fn statuses(&self) -> Vec<Status> {
        let mut statuses: Vec<Status> = self.tables().flat_map(MetricTable::statuses).collect();
        statuses.extend(self.findings.iter().map(|f| f.status));
        statuses.extend(self.portfolio.statuses());
        statuses
    }
}

fn comparison_table(name: &str, rows: &[ComparisonRow]) -> Result<MetricTable, SchemaError> {
    MetricTable::new(
        name,
        vec![
            Column::text("segment", rows.iter().map(|r| r.segment.clone())),
            Column::float("predicted", rows.iter().map(|r| r.predicted)),
            Column::float("realized", rows.iter().map(|r| r.realized)),
            Column::float("bias", rows.iter().map(|r| r.bias)),
        ],
    )
}

fn check_total(table: &MetricTable, column: &str, expected: u64) -> Result<(), SchemaError> {
    let actual: i64 = table.integer(column)?.iter().sum();
    if actual < 0 || actual as u64 != expected {
        return Err(SchemaError::TotalsMismatch {
            table: table.name().to_string(),
            column: column.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

fn check_finite(table: &MetricTable) -> Result<(), SchemaError> {
    for column in table.columns() {
        let ColumnValues::Float(values) = &column.values else {
            continue;
        };
        if let Some(row) = values.iter().position(|v| !v.is_finite()) {
            return Err(SchemaError::NonFinite {
                table: table.name().to_string(),
                column: column.name.clone(),
                row,
            });
        }
    }
    Ok(())
}

fn check_bias(table: &MetricTable) -> Result<(), SchemaError> {
    let segments = table.text("segment")?;
    let predicted = table.float("predicted")?;
    let realized = table.float("realized")?;
    let bias = table.float("bias")?;
    for (idx, segment) in segments.iter().enumerate() {
        let expected = realized[idx] - predicted[idx];
        if (expected - bias[idx]).abs() > BIAS_TOLERANCE {
            return Err(SchemaError::BiasMismatch {
                table: table.name().to_string(),
                segment: segment.clone(),
                expected,
                actual: bias[idx],
            });
        }
    }
    Ok(())
}

/// Construction-time schema violations. All are fatal: the page is never served.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchemaError {
    #[error("unknown status `{value}` (expected GREEN, AMBER or RED)")]
    UnknownStatus { value: String },
    #[error("status {status} has no entry in the `{mapping}` colour mapping")]
    UnmappedStatus { status: Status, mapping: &'static str },
    #[error("table `{table}` must declare at least one column")]
    EmptyTable { table: String },
    #[error("table `{table}` declares column `{column}` more than once")]
    DuplicateColumn { table: String, column: String },
    #[error("table `{table}` column `{column}` has {actual} rows (expected {expected})")]
    LengthMismatch {
        table: String,
        column: String,
        expected: usize,
        actual: usize,
    },
    #[error("metrics store has no table `{table}`")]
    MissingTable { table: String },
    #[error("table `{table}` has no column `{column}`")]
    MissingColumn { table: String, column: String },
    #[error("table `{table}` column `{column}` is {actual}, expected {expected}")]
    ColumnType {
        table: String,
        column: String,
        expected: ColumnKind,
        actual: ColumnKind,
    },
    #[error("table `{table}` has no `{key}` row")]
    MissingRow { table: String, key: String },
    #[error("chart `{chart}` reads table `{expected}` but was given `{actual}`")]
    WrongTable {
        chart: String,
        expected: String,
        actual: String,
    },
    #[error("table `{table}` column `{column}` sums to {actual}, portfolio states {expected}")]
    TotalsMismatch {
        table: String,
        column: String,
        expected: u64,
        actual: i64,
    },
    #[error("table `{table}` segment `{segment}` bias {actual} != realized - predicted ({expected:.2})")]
    BiasMismatch {
        table: String,
        segment: String,
        expected: f64,
        actual: f64,
    },
    #[error("table `{table}` column `{column}` row {row} is not a finite number")]
    NonFinite {
        table: String,
        column: String,
        row: usize,
    },
    #[error("portfolio must contain at least one account")]
    EmptyPortfolio,
    #[error("finding id must not be blank")]
    BlankFindingId,
    #[error("finding `{finding_id}` appears more than once in the findings log")]
    DuplicateFinding { finding_id: String },
    #[error("finding `{finding_id}` severity must be within 1..=5 (got {severity})")]
    InvalidSeverity { finding_id: String, severity: u8 },
    #[error("invalid layout: {reason}")]
    InvalidLayout { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn finding(id: &str, status: Status) -> Finding {
        Finding {
            id: id.into(),
            module: "PD".into(),
            test: "Overall AUC".into(),
            severity: 3,
            status,
            description: "example".into(),
        }
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("amber".parse::<Status>().unwrap(), Status::Amber);
        assert_eq!(" Red ".parse::<Status>().unwrap(), Status::Red);
        let err = "BLUE".parse::<Status>().expect_err("unknown status");
        assert!(matches!(err, SchemaError::UnknownStatus { value } if value == "BLUE"));
    }

    #[test]
    fn status_serializes_uppercase() {
        let value = serde_json::to_value(Status::Amber).unwrap();
        assert_eq!(value, serde_json::json!("AMBER"));
        let parsed: Status = serde_json::from_str("\"green\"").unwrap();
        assert_eq!(parsed, Status::Green);
    }

    #[test]
    fn table_rejects_ragged_columns() {
        let err = MetricTable::new(
            "auc",
            vec![
                Column::text("segment", ["OVERALL", "SME"]),
                Column::float("auc", [0.61]),
            ],
        )
        .expect_err("ragged table should fail");
        assert!(matches!(
            err,
            SchemaError::LengthMismatch { column, expected: 2, actual: 1, .. } if column == "auc"
        ));
    }

    #[test]
    fn table_rejects_duplicate_and_empty_schemas() {
        assert!(matches!(
            MetricTable::new("empty", Vec::new()),
            Err(SchemaError::EmptyTable { .. })
        ));
        assert!(matches!(
            MetricTable::new(
                "dup",
                vec![Column::float("auc", [0.6]), Column::float("auc", [0.7])]
            ),
            Err(SchemaError::DuplicateColumn { column, .. }) if column == "auc"
        ));
    }

    #[test]
    fn typed_accessors_report_missing_and_mistyped_columns() {
        let table = MetricTable::new(
            "auc",
            vec![
                Column::text("segment", ["OVERALL"]),
                Column::float("auc", [0.6176]),
            ],
        )
        .unwrap();
        assert_eq!(table.float("auc").unwrap(), &[0.6176]);
        assert!(matches!(
            table.status("rag"),
            Err(SchemaError::MissingColumn { column, .. }) if column == "rag"
        ));
        assert!(matches!(
            table.integer("auc"),
            Err(SchemaError::ColumnType {
                expected: ColumnKind::Integer,
                actual: ColumnKind::Float,
                ..
            })
        ));
    }

    #[test]
    fn findings_log_rejects_duplicate_ids() {
        let err = FindingsLog::new(vec![
            finding("F001", Status::Red),
            finding("F001", Status::Amber),
        ])
        .expect_err("duplicate ids should fail");
        assert!(matches!(
            err,
            SchemaError::DuplicateFinding { finding_id } if finding_id == "F001"
        ));
    }

    #[test]
    fn findings_log_rejects_out_of_range_severity() {
        let mut bad = finding("F009", Status::Green);
        bad.severity = 0;
        assert!(matches!(
            FindingsLog::new(vec![bad]),
            Err(SchemaError::InvalidSeverity { severity: 0, .. })
        ));
    }

    #[test]
    fn findings_log_rejects_blank_ids() {
        assert_eq!(
            FindingsLog::new(vec![finding("  ", Status::Amber)]),
            Err(SchemaError::BlankFindingId)
        );
    }

    #[test]
    fn non_finite_metrics_are_rejected() {
        let mut doc = sample::february_2026();
        doc.auc_by_segment[0].auc = f64::NAN;
        assert_eq!(
            MetricsStore::from_document(doc),
            Err(SchemaError::NonFinite {
                table: tables::AUC_BY_SEGMENT.to_string(),
                column: "auc".to_string(),
                row: 0,
            })
        );

        let mut doc = sample::february_2026();
        doc.lgd_stress[1].stressed_lgd = f64::INFINITY;
        assert!(matches!(
            MetricsStore::from_document(doc),
            Err(SchemaError::NonFinite { table, column, row: 1 })
                if table == tables::LGD_STRESS && column == "stressed_lgd"
        ));

        let mut doc = sample::february_2026();
        doc.portfolio.ead_ratio = f64::NEG_INFINITY;
        assert!(matches!(
            MetricsStore::from_document(doc),
            Err(SchemaError::NonFinite { column, .. }) if column == "ead_ratio"
        ));
    }

    #[test]
    fn findings_log_deserializes_through_validation() {
        let raw = r#"[
            {"id": "F001", "module": "PD", "test": "t", "severity": 2, "status": "RED", "description": "d"},
            {"id": "F001", "module": "PD", "test": "t", "severity": 2, "status": "RED", "description": "d"}
        ]"#;
        let err = serde_json::from_str::<FindingsLog>(raw).expect_err("duplicates rejected");
        assert!(err.to_string().contains("F001"));
    }

    #[test]
    fn sample_store_holds_every_table() {
        let store = MetricsStore::sample();
        for name in [
            tables::AUC_BY_SEGMENT,
            tables::CALIBRATION_BY_DECILE,
            tables::LGD_BY_SEGMENT,
            tables::LGD_STRESS,
            tables::CCF_BY_SEGMENT,
            tables::OVERRIDE_IMPACT,
        ] {
            assert!(store.table(name).is_ok(), "missing table {name}");
        }
        assert_eq!(store.table(tables::AUC_BY_SEGMENT).unwrap().row_count(), 4);
        assert_eq!(store.findings().len(), 5);
    }

    #[test]
    fn override_breakdown_sums_to_portfolio_totals() {
        let store = MetricsStore::sample();
        let overrides = store.table(tables::OVERRIDE_IMPACT).unwrap();
        let accounts: i64 = overrides.integer("accounts").unwrap().iter().sum();
        let defaults: i64 = overrides.integer("defaults").unwrap().iter().sum();
        assert_eq!(accounts as u64, store.portfolio().total_accounts);
        assert_eq!(defaults as u64, store.portfolio().total_defaults);
    }

    #[test]
    fn totals_mismatch_is_rejected() {
        let mut doc = sample::february_2026();
        doc.override_impact[1].accounts += 1;
        let err = MetricsStore::from_document(doc).expect_err("totals must agree");
        assert!(matches!(
            err,
            SchemaError::TotalsMismatch { column, expected: 10_000, actual: 10_001, .. }
                if column == "accounts"
        ));
    }

    #[test]
    fn missing_overall_row_is_rejected() {
        let mut doc = sample::february_2026();
        doc.auc_by_segment.retain(|row| row.segment != OVERALL_SEGMENT);
        assert!(matches!(
            MetricsStore::from_document(doc),
            Err(SchemaError::MissingRow { key, .. }) if key == OVERALL_SEGMENT
        ));
    }

    #[test]
    fn bias_column_must_match_realized_minus_predicted() {
        let mut doc = sample::february_2026();
        doc.ccf_by_segment[2].bias = 1.0;
        assert!(matches!(
            MetricsStore::from_document(doc),
            Err(SchemaError::BiasMismatch { segment, .. }) if segment == "SME"
        ));
    }

    #[test]
    fn bias_tolerance_is_one_hundredth() {
        let mut doc = sample::february_2026();
        doc.lgd_by_segment[0].bias = 2.755;
        assert!(MetricsStore::from_document(doc).is_ok());

        let mut doc = sample::february_2026();
        doc.lgd_by_segment[0].bias = 2.77;
        assert!(matches!(
            MetricsStore::from_document(doc),
            Err(SchemaError::BiasMismatch { segment, .. }) if segment == "CORPORATE"
        ));
    }

    #[test]
    fn default_rate_is_derived_from_totals() {
        let store = MetricsStore::sample();
        assert!((store.portfolio().default_rate_pct() - 2.11).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn tables_accept_only_uniform_lengths(
            lens in proptest::collection::vec(0usize..6, 1..5)
        ) {
            let columns: Vec<Column> = lens
                .iter()
                .enumerate()
                .map(|(idx, len)| Column::float(format!("c{idx}"), vec![1.0; *len]))
                .collect();
            let uniform = lens.iter().all(|len| *len == lens[0]);
            let result = MetricTable::new("generated", columns);
            prop_assert_eq!(result.is_ok(), uniform);
            if let Ok(table) = result {
                prop_assert_eq!(table.row_count(), lens[0]);
            }
        }
    }
}
