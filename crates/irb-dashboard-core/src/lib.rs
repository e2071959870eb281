pub mod chart;
pub mod compose;
pub mod markup;
pub mod metrics;
pub mod report;
pub mod server;

pub use chart::{build_chart, ChartDefinition, ChartKind, ChartSpec, StylePolicy};
pub use compose::{compose, KpiCard, LayoutOptions, ReportPage};
pub use metrics::{
    file_repository::{FileMetricsRepository, MetricsRepository, SampleMetricsRepository},
    Finding, FindingsLog, MetricTable, MetricsDocument, MetricsStore, SchemaError, Status,
};
pub use report::{render_report, OutputFormat};
pub use server::{DashboardState, ServeMode, PLACEHOLDER_MESSAGE};
