mod config;

use std::{
    fs,
    net::IpAddr,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::{ColoredString, Colorize};
use irb_dashboard_core::{
    compose, render_report,
    server::{self, dashboard_router, placeholder_router},
    DashboardState, FileMetricsRepository, MetricsRepository, MetricsStore, OutputFormat,
    ReportPage, SampleMetricsRepository, ServeMode, Status,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::DashboardConfig;

#[derive(Parser, Debug)]
#[command(
    name = "irb-dashboard",
    author,
    version,
    about = "IRB credit model validation dashboard"
)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Metrics document (.yaml or .json); defaults to the built-in sample
    #[arg(long, value_name = "FILE", global = true)]
    metrics: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the dashboard over HTTP
    Serve {
        #[arg(long)]
        host: Option<IpAddr>,
        /// Listen port (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
        /// Serve the static placeholder message instead of the dashboard
        #[arg(long)]
        placeholder: bool,
    },
    /// Render the dashboard once and write it out
    Render {
        #[arg(long, value_enum, default_value_t = FormatArg::Html)]
        format: FormatArg,
        /// Destination file; stdout when omitted
        #[arg(long, short, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Validate a metrics document and summarise its KPIs and findings
    Validate {
        /// Emit the findings log as JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Html,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Html => OutputFormat::Html,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let mut settings = DashboardConfig::load(cli.config.as_deref())?;
    if let Some(metrics) = cli.metrics {
        settings.metrics = Some(metrics);
    }

    let command = cli.command.unwrap_or(Commands::Serve {
        host: None,
        port: None,
        placeholder: false,
    });
    match command {
        Commands::Serve {
            host,
            port,
            placeholder,
        } => {
            if let Some(host) = host {
                settings.server.host = host;
            }
            if let Some(port) = port {
                settings.server.port = port;
            }
            if placeholder {
                settings.server.mode = ServeMode::Placeholder;
            }
            serve(&settings).await?
        }
        Commands::Render { format, output } => render(&settings, format.into(), output.as_deref())?,
        Commands::Validate { json } => validate(&settings, json)?,
    }
    Ok(())
}

fn load_store(settings: &DashboardConfig) -> Result<MetricsStore> {
    match &settings.metrics {
        Some(path) => FileMetricsRepository::new(path).load_store(),
        None => SampleMetricsRepository.load_store(),
    }
}

fn build_page(settings: &DashboardConfig, store: &MetricsStore) -> Result<ReportPage> {
    compose(store, store.findings(), &settings.layout, &settings.style)
        .context("failed to compose dashboard")
}

async fn serve(settings: &DashboardConfig) -> Result<()> {
    let router = match settings.server.mode {
        ServeMode::Dashboard => {
            let store = load_store(settings)?;
            let page = build_page(settings, &store)?;
            dashboard_router(DashboardState::from_page(&page)?)
        }
        ServeMode::Placeholder => placeholder_router(),
    };
    info!(mode = ?settings.server.mode, "dashboard built");
    server::serve(settings.server.addr(), router).await
}

fn render(settings: &DashboardConfig, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    let store = load_store(settings)?;
    let page = build_page(settings, &store)?;
    let document = render_report(&page, format)?;
    match output {
        Some(path) => {
            fs::write(path, &document)
                .with_context(|| format!("failed to write dashboard to {}", path.display()))?;
            info!(path = %path.display(), bytes = document.len(), "dashboard written");
        }
        None => print!("{document}"),
    }
    Ok(())
}

fn validate(settings: &DashboardConfig, json: bool) -> Result<()> {
    let store = load_store(settings)?;
    let page = build_page(settings, &store)?;
    if json {
        println!("{}", serde_json::to_string_pretty(store.findings())?);
        return Ok(());
    }

    let source = settings
        .metrics
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "built-in sample".to_string());
    println!("{} validated ({})", source, page.header.summary);
    for kpi in &page.kpis {
        println!(
            "  {label:<17} {value:>8}  {badge}",
            label = kpi.label,
            value = kpi.value,
            badge = kpi.badge
        );
    }
    println!("{} finding(s)", store.findings().len());
    for finding in store.findings() {
        println!(
            "- {id:<6} [{status}] severity {severity} {module} / {test} :: {desc}",
            id = finding.id,
            status = paint(finding.status),
            severity = finding.severity,
            module = finding.module,
            test = finding.test,
            desc = finding.description
        );
    }
    Ok(())
}

fn paint(status: Status) -> ColoredString {
    match status {
        Status::Green => status.as_str().green(),
        Status::Amber => status.as_str().yellow(),
        Status::Red => status.as_str().red(),
    }
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tokio=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
