use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::chart::svg::render_svg;
use crate::compose::{ChartSection, FindingsTable, KpiCard, ReportHeader, ReportPage};
use crate::markup::escape;

/// Output formats supported by the report renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Html,
    Json,
}

/// Produce a document string from a composed `ReportPage` using the desired format.
pub fn render_report(page: &ReportPage, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Html => render_html(page),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(page)?),
    }
}

fn render_html(page: &ReportPage) -> anyhow::Result<String> {
    let mut out = String::new();
    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, r#"<html lang="en">"#)?;
    writeln!(out, "<head>")?;
    writeln!(out, r#"<meta charset="utf-8">"#)?;
    writeln!(
        out,
        r#"<meta name="viewport" content="width=device-width, initial-scale=1">"#
    )?;
    writeln!(out, "<title>{}</title>", escape(&page.header.title))?;
    writeln!(out, "<style>{}</style>", STYLESHEET)?;
    writeln!(out, "</head>")?;
    writeln!(out, "<body>")?;

    render_header(&mut out, &page.header)?;
    render_kpis(&mut out, &page.kpis)?;
    for section in &page.sections {
        render_section(&mut out, section, page.charts_per_row)?;
    }
    render_findings(&mut out, &page.findings)?;

    writeln!(
        out,
        r#"<footer><hr><p>{}</p></footer>"#,
        escape(&page.footer)
    )?;
    writeln!(out, "</body>")?;
    writeln!(out, "</html>")?;
    Ok(out)
}

fn render_header(out: &mut String, header: &ReportHeader) -> anyhow::Result<()> {
    writeln!(out, r#"<header class="banner">"#)?;
    writeln!(out, "<h1>{}</h1>", escape(&header.title))?;
    writeln!(out, r#"<p class="subtitle">{}</p>"#, escape(&header.subtitle))?;
    writeln!(out, r#"<p class="summary">{}</p>"#, escape(&header.summary))?;
    writeln!(out, "</header>")?;
    Ok(())
}

fn render_kpis(out: &mut String, kpis: &[KpiCard]) -> anyhow::Result<()> {
    writeln!(out, r#"<section class="kpi-strip">"#)?;
    for kpi in kpis {
        writeln!(
            out,
            r#"<div class="kpi-card" data-status="{status}"><p class="kpi-label">{label}</p><h2 class="kpi-value" style="color: {color}">{value}</h2><span class="badge" style="background-color: {color}">{badge}</span></div>"#,
            status = kpi.status,
            label = escape(&kpi.label),
            color = escape(&kpi.color),
            value = escape(&kpi.value),
            badge = escape(&kpi.badge),
        )?;
    }
    writeln!(out, "</section>")?;
    Ok(())
}

fn render_section(out: &mut String, section: &ChartSection, per_row: u8) -> anyhow::Result<()> {
    writeln!(
        out,
        r#"<h2 class="section-title" style="border-bottom-color: {}">{}</h2>"#,
        escape(&section.accent),
        escape(&section.title)
    )?;
    writeln!(
        out,
        r#"<div class="chart-row" style="grid-template-columns: repeat({per_row}, minmax(0, 1fr))">"#
    )?;
    for chart in &section.charts {
        writeln!(out, r#"<figure class="chart-card">{}</figure>"#, render_svg(chart)?)?;
    }
    writeln!(out, "</div>")?;
    Ok(())
}

fn render_findings(out: &mut String, table: &FindingsTable) -> anyhow::Result<()> {
    writeln!(
        out,
        r#"<h2 class="section-title" style="border-bottom-color: {}">{}</h2>"#,
        escape(&table.accent),
        escape(&table.title)
    )?;
    writeln!(out, r#"<div class="findings"><table>"#)?;
    write!(out, "<thead><tr>")?;
    for column in &table.columns {
        write!(out, "<th>{}</th>", escape(column))?;
    }
    writeln!(out, "</tr></thead>")?;
    writeln!(out, "<tbody>")?;
    if table.rows.is_empty() {
        writeln!(
            out,
            r#"<tr class="empty"><td colspan="{}">No findings recorded.</td></tr>"#,
            table.columns.len()
        )?;
    }
    for row in &table.rows {
        writeln!(
            out,
            r#"<tr class="finding" data-status="{status}" style="background-color: {tint}"><td>{id}</td><td>{module}</td><td>{test}</td><td>{severity}</td><td>{status}</td><td>{description}</td></tr>"#,
            status = row.status,
            tint = escape(&row.tint),
            id = escape(&row.id),
            module = escape(&row.module),
            test = escape(&row.test),
            severity = row.severity,
            description = escape(&row.description),
        )?;
    }
    writeln!(out, "</tbody></table></div>")?;
    Ok(())
}

const STYLESHEET: &str = r#"
* { box-sizing: border-box; }
body { margin: 0; background-color: #ecf0f1; font-family: "Segoe UI", sans-serif; color: #2c3e50; }
.banner { background-color: #2c3e50; padding: 25px; }
.banner h1 { color: white; margin: 0; }
.banner .subtitle { color: #bdc3c7; margin: 5px 0; }
.banner .summary { color: #95a5a6; font-size: 13px; margin: 0; }
.kpi-strip { display: flex; flex-wrap: wrap; justify-content: center; gap: 1%; padding: 15px 0; }
.kpi-card { width: 15%; min-width: 140px; text-align: center; padding: 15px; background-color: white; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
.kpi-label { color: #7f8c8d; font-size: 13px; margin: 0; font-weight: bold; }
.kpi-value { margin: 5px 0; font-size: 32px; }
.badge { color: white; padding: 3px 10px; border-radius: 4px; font-size: 11px; }
.section-title { padding: 10px 20px; color: #2c3e50; border-bottom: 2px solid; }
.chart-row { display: grid; gap: 2%; padding: 1%; }
.chart-card { margin: 0; background-color: white; border-radius: 8px; padding: 8px; }
.chart { width: 100%; height: auto; font-size: 12px; }
.chart .chart-title { font-size: 16px; font-weight: bold; fill: #2c3e50; }
.chart .tick, .chart .legend { fill: #7f8c8d; }
.chart .value-label { fill: #2c3e50; font-size: 11px; }
.chart .axis-title { fill: #2c3e50; }
.findings { padding: 10px 20px; }
.findings table { width: 100%; border-collapse: collapse; background-color: white; }
.findings th { background-color: #2c3e50; color: white; font-weight: bold; }
.findings th, .findings td { text-align: left; padding: 10px; font-size: 13px; }
footer p { text-align: center; color: #95a5a6; padding: 10px; }
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::StylePolicy;
    use crate::compose::{compose, LayoutOptions};
    use crate::metrics::MetricsStore;

    fn sample_page() -> ReportPage {
        let store = MetricsStore::sample();
        compose(
            &store,
            store.findings(),
            &LayoutOptions::default(),
            &StylePolicy::default(),
        )
        .unwrap()
    }

    #[test]
    fn html_report_contains_every_section_in_order() {
        let html = render_report(&sample_page(), OutputFormat::Html).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        let positions: Vec<usize> = [
            "IRB Credit Model Validation Dashboard",
            r#"class="kpi-strip""#,
            "PD Model Validation",
            "LGD Model Validation",
            "EAD/CCF &amp; Override Analysis",
            "Validation Findings Log",
            "<footer>",
        ]
        .iter()
        .map(|needle| html.find(needle).unwrap_or_else(|| panic!("missing {needle}")))
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{positions:?}");
        assert_eq!(html.matches(r#"<svg class="chart""#).count(), 6);
        assert_eq!(html.matches(r#"class="kpi-card""#).count(), 6);
    }

    #[test]
    fn finding_rows_carry_status_backgrounds() {
        let html = render_report(&sample_page(), OutputFormat::Html).unwrap();
        assert_eq!(
            html.matches(r#"data-status="RED" style="background-color: #fadbd8""#)
                .count(),
            4
        );
        assert_eq!(
            html.matches(r#"data-status="AMBER" style="background-color: #fdebd0""#)
                .count(),
            1
        );
        assert!(html.contains("predicted_lgd 97.9% missing (expected for non-defaults)"));
    }

    #[test]
    fn html_rendering_is_deterministic() {
        let first = render_report(&sample_page(), OutputFormat::Html).unwrap();
        let second = render_report(&sample_page(), OutputFormat::Html).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn json_report_serializes() {
        let page = sample_page();
        let output = render_report(&page, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["kpis"][0]["value"], serde_json::json!("0.6176"));
        assert_eq!(value["sections"].as_array().unwrap().len(), 3);
        assert_eq!(value["findings"]["rows"][3]["status"], serde_json::json!("AMBER"));
    }
}
