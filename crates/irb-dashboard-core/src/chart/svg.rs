//! Inline SVG rendering of chart specifications.
//!
//! Output is self-contained (no scripts, no external assets) and byte-stable
//! for equal inputs, so composed pages can be compared directly.

use std::fmt::{self, Write};

use super::{ChartSpec, Trace, TraceMode, XValues};
use crate::markup::escape;

const WIDTH: f64 = 640.0;
const MARGIN_LEFT: f64 = 64.0;
const MARGIN_RIGHT: f64 = 24.0;
const MARGIN_TOP: f64 = 72.0;
const MARGIN_BOTTOM: f64 = 64.0;
const Y_TICKS: usize = 5;
const BAND_PADDING: f64 = 0.1;
const MARKER_RADIUS: f64 = 5.0;

struct Frame {
    left: f64,
    right: f64,
    top: f64,
    bottom: f64,
    y_lo: f64,
    y_hi: f64,
}

impl Frame {
    fn y(&self, value: f64) -> f64 {
        let span = self.y_hi - self.y_lo;
        self.bottom - (value - self.y_lo) / span * (self.bottom - self.top)
    }

    fn width(&self) -> f64 {
        self.right - self.left
    }
}

enum XScale<'a> {
    Band { categories: &'a [String], step: f64 },
    Linear { lo: f64, hi: f64 },
}

impl XScale<'_> {
    fn position(&self, frame: &Frame, x: &XValues, idx: usize) -> f64 {
        match (self, x) {
            (XScale::Band { step, .. }, _) => frame.left + step * (idx as f64 + 0.5),
            (XScale::Linear { lo, hi }, XValues::Numbers(values)) => {
                frame.left + (values[idx] - lo) / (hi - lo) * frame.width()
            }
            (XScale::Linear { .. }, XValues::Categories(_)) => frame.left,
        }
    }
}

/// Render a chart as an `<svg>` element sized to its container's width.
pub fn render_svg(spec: &ChartSpec) -> Result<String, fmt::Error> {
    let height = f64::from(spec.height);
    let (y_lo, y_hi) = y_bounds(spec);
    let frame = Frame {
        left: MARGIN_LEFT,
        right: WIDTH - MARGIN_RIGHT,
        top: MARGIN_TOP,
        bottom: height - MARGIN_BOTTOM,
        y_lo,
        y_hi,
    };
    let scale = x_scale(spec, &frame);

    let mut out = String::new();
    write!(
        out,
        r#"<svg class="chart" id="{id}" viewBox="0 0 {w} {h}" preserveAspectRatio="xMidYMid meet" role="img" aria-label="{title}" xmlns="http://www.w3.org/2000/svg">"#,
        id = escape(&spec.id),
        w = WIDTH,
        h = spec.height,
        title = escape(&spec.title),
    )?;
    write!(
        out,
        r#"<text class="chart-title" x="{x}" y="28">{title}</text>"#,
        x = MARGIN_LEFT,
        title = escape(&spec.title)
    )?;

    render_y_axis(&mut out, spec, &frame)?;
    render_x_axis(&mut out, spec, &frame, &scale)?;
    render_bars(&mut out, spec, &frame, &scale)?;
    for trace in spec.traces.iter().filter(|t| t.mode != TraceMode::Bar) {
        render_line(&mut out, trace, &frame, &scale)?;
    }
    for line in &spec.thresholds {
        let y = frame.y(line.y);
        write!(
            out,
            r#"<line class="threshold" x1="{x1:.1}" y1="{y:.1}" x2="{x2:.1}" y2="{y:.1}" stroke="{color}" stroke-dasharray="6 4"/>"#,
            x1 = frame.left,
            x2 = frame.right,
            color = escape(&line.color),
        )?;
        write!(
            out,
            r#"<text class="threshold-label" x="{x:.1}" y="{y:.1}" text-anchor="end" fill="{color}">{label}</text>"#,
            x = frame.right - 4.0,
            y = y - 4.0,
            color = escape(&line.color),
            label = escape(&line.label),
        )?;
    }
    render_legend(&mut out, spec)?;
    out.push_str("</svg>");
    Ok(out)
}

/// Explicit or automatic y range, falling back to `[0, 1]` when degenerate.
fn y_bounds(spec: &ChartSpec) -> (f64, f64) {
    let (lo, hi) = spec.y_range.unwrap_or_else(|| auto_range(spec));
    if lo.is_finite() && hi.is_finite() && lo < hi {
        (lo, hi)
    } else {
        (0.0, 1.0)
    }
}

fn auto_range(spec: &ChartSpec) -> (f64, f64) {
    let values = spec
        .traces
        .iter()
        .flat_map(|t| t.y.iter().copied())
        .chain(spec.thresholds.iter().map(|t| t.y))
        .filter(|v| v.is_finite());
    let (lo, hi) = values.fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    nice_bounds(lo, hi * 1.1)
}

fn nice_bounds(lo: f64, hi: f64) -> (f64, f64) {
    if hi <= lo {
        return (lo, lo + 1.0);
    }
    let step = nice_step((hi - lo) / Y_TICKS as f64);
    ((lo / step).floor() * step, (hi / step).ceil() * step)
}

fn nice_step(raw: f64) -> f64 {
    let magnitude = 10_f64.powf(raw.log10().floor());
    let fraction = raw / magnitude;
    let nice = if fraction <= 1.0 {
        1.0
    } else if fraction <= 2.0 {
        2.0
    } else if fraction <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

fn x_scale<'a>(spec: &'a ChartSpec, frame: &Frame) -> XScale<'a> {
    let categories = spec.traces.iter().find_map(|t| match &t.x {
        XValues::Categories(values) => Some(values.as_slice()),
        XValues::Numbers(_) => None,
    });
    match categories {
        Some(categories) => XScale::Band {
            categories,
            step: frame.width() / categories.len().max(1) as f64,
        },
        None => {
            let hi = spec
                .traces
                .iter()
                .filter_map(|t| match &t.x {
                    XValues::Numbers(values) => Some(values.iter().copied()),
                    XValues::Categories(_) => None,
                })
                .flatten()
                .fold(0.0_f64, f64::max);
            let (lo, hi) = nice_bounds(0.0, hi);
            XScale::Linear { lo, hi }
        }
    }
}

fn render_y_axis(out: &mut String, spec: &ChartSpec, frame: &Frame) -> fmt::Result {
    let step = (frame.y_hi - frame.y_lo) / Y_TICKS as f64;
    for tick in 0..=Y_TICKS {
        let value = frame.y_lo + step * tick as f64;
        let y = frame.y(value);
        write!(
            out,
            r##"<line class="grid" x1="{x1:.1}" y1="{y:.1}" x2="{x2:.1}" y2="{y:.1}" stroke="#ecf0f1"/>"##,
            x1 = frame.left,
            x2 = frame.right,
        )?;
        write!(
            out,
            r#"<text class="tick" x="{x:.1}" y="{y:.1}" text-anchor="end">{label}</text>"#,
            x = frame.left - 8.0,
            y = y + 4.0,
            label = format_tick(value),
        )?;
    }
    if let Some(title) = &spec.y_title {
        let mid = (frame.top + frame.bottom) / 2.0;
        write!(
            out,
            r#"<text class="axis-title" x="16" y="{mid:.1}" transform="rotate(-90 16 {mid:.1})" text-anchor="middle">{title}</text>"#,
            title = escape(title),
        )?;
    }
    Ok(())
}

fn render_x_axis(
    out: &mut String,
    spec: &ChartSpec,
    frame: &Frame,
    scale: &XScale<'_>,
) -> fmt::Result {
    write!(
        out,
        r##"<line class="axis" x1="{x1:.1}" y1="{y:.1}" x2="{x2:.1}" y2="{y:.1}" stroke="#7f8c8d"/>"##,
        x1 = frame.left,
        x2 = frame.right,
        y = frame.bottom,
    )?;
    match scale {
        XScale::Band { categories, step } => {
            for (idx, category) in categories.iter().enumerate() {
                write!(
                    out,
                    r#"<text class="tick" x="{x:.1}" y="{y:.1}" text-anchor="middle">{label}</text>"#,
                    x = frame.left + step * (idx as f64 + 0.5),
                    y = frame.bottom + 18.0,
                    label = escape(category),
                )?;
            }
        }
        XScale::Linear { lo, hi } => {
            let step = (hi - lo) / Y_TICKS as f64;
            for tick in 0..=Y_TICKS {
                let value = lo + step * tick as f64;
                write!(
                    out,
                    r#"<text class="tick" x="{x:.1}" y="{y:.1}" text-anchor="middle">{label}</text>"#,
                    x = frame.left + (value - lo) / (hi - lo) * frame.width(),
                    y = frame.bottom + 18.0,
                    label = format_tick(value),
                )?;
            }
        }
    }
    if let Some(title) = &spec.x_title {
        write!(
            out,
            r#"<text class="axis-title" x="{x:.1}" y="{y:.1}" text-anchor="middle">{title}</text>"#,
            x = (frame.left + frame.right) / 2.0,
            y = frame.bottom + 44.0,
            title = escape(title),
        )?;
    }
    Ok(())
}

fn render_bars(
    out: &mut String,
    spec: &ChartSpec,
    frame: &Frame,
    scale: &XScale<'_>,
) -> fmt::Result {
    let XScale::Band { step, .. } = scale else {
        return Ok(());
    };
    let bars: Vec<&Trace> = spec
        .traces
        .iter()
        .filter(|t| t.mode == TraceMode::Bar)
        .collect();
    if bars.is_empty() {
        return Ok(());
    }
    let inner = step * (1.0 - 2.0 * BAND_PADDING);
    let width = inner / bars.len() as f64;
    let zero = frame.y(0.0_f64.clamp(frame.y_lo, frame.y_hi));
    for (series, trace) in bars.iter().enumerate() {
        for (idx, value) in trace.y.iter().enumerate() {
            let x = frame.left + step * (idx as f64 + BAND_PADDING) + width * series as f64;
            let y = frame.y(*value);
            let (top, bar_height) = if y < zero { (y, zero - y) } else { (zero, y - zero) };
            write!(
                out,
                r#"<rect class="bar" x="{x:.1}" y="{top:.1}" width="{width:.1}" height="{bar_height:.1}" fill="{color}"><title>{title}</title></rect>"#,
                color = escape(trace.color_at(idx)),
                title = escape(&format!("{}: {}", category_label(trace, idx), value)),
            )?;
            if let Some(label) = trace.labels.get(idx) {
                write!(
                    out,
                    r#"<text class="value-label" x="{x:.1}" y="{y:.1}" text-anchor="middle">{label}</text>"#,
                    x = x + width / 2.0,
                    y = top - 6.0,
                    label = escape(label),
                )?;
            }
        }
    }
    Ok(())
}

fn render_line(out: &mut String, trace: &Trace, frame: &Frame, scale: &XScale<'_>) -> fmt::Result {
    let points: Vec<(f64, f64)> = (0..trace.y.len().min(trace.x.len()))
        .map(|idx| (scale.position(frame, &trace.x, idx), frame.y(trace.y[idx])))
        .collect();
    let path = points
        .iter()
        .map(|(x, y)| format!("{x:.1},{y:.1}"))
        .collect::<Vec<_>>()
        .join(" ");
    let (class, dash) = if trace.dashed {
        ("series-line dashed", r#" stroke-dasharray="8 5""#)
    } else {
        ("series-line", "")
    };
    write!(
        out,
        r#"<polyline class="{class}" points="{path}" fill="none" stroke="{color}" stroke-width="2"{dash}/>"#,
        color = escape(trace.color_at(0)),
    )?;
    if trace.mode == TraceMode::LinesMarkers {
        for (idx, (x, y)) in points.iter().enumerate() {
            write!(
                out,
                r#"<circle class="marker" cx="{x:.1}" cy="{y:.1}" r="{MARKER_RADIUS}" fill="{color}"/>"#,
                color = escape(trace.color_at(idx)),
            )?;
        }
    }
    Ok(())
}

fn render_legend(out: &mut String, spec: &ChartSpec) -> fmt::Result {
    let named: Vec<(&str, &Trace)> = spec
        .traces
        .iter()
        .filter_map(|t| t.name.as_deref().map(|name| (name, t)))
        .collect();
    if named.len() < 2 {
        return Ok(());
    }
    let mut x = MARGIN_LEFT;
    for (name, trace) in named {
        write!(
            out,
            r#"<rect class="legend-swatch" x="{x:.1}" y="44" width="12" height="12" fill="{color}"/><text class="legend" x="{tx:.1}" y="54">{name}</text>"#,
            color = escape(trace.color_at(0)),
            tx = x + 16.0,
            name = escape(name),
        )?;
        x += 24.0 + name.chars().count() as f64 * 7.0;
    }
    Ok(())
}

fn category_label(trace: &Trace, idx: usize) -> String {
    match &trace.x {
        XValues::Categories(values) => values.get(idx).cloned().unwrap_or_default(),
        XValues::Numbers(values) => values.get(idx).map(|v| v.to_string()).unwrap_or_default(),
    }
}

fn format_tick(value: f64) -> String {
    let rounded = format!("{value:.2}");
    rounded
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{build_chart, catalog, StylePolicy};
    use crate::compose::LayoutOptions;
    use crate::metrics::MetricsStore;

    fn render(definition: crate::chart::ChartDefinition) -> String {
        let store = MetricsStore::sample();
        let spec = build_chart(
            store.table(&definition.table).unwrap(),
            &definition,
            &StylePolicy::default(),
        )
        .unwrap();
        render_svg(&spec).unwrap()
    }

    #[test]
    fn auc_svg_draws_four_status_coloured_bars_and_two_thresholds() {
        let svg = render(catalog::auc_by_segment(&LayoutOptions::default()));
        assert_eq!(svg.matches(r#"class="bar""#).count(), 4);
        assert_eq!(svg.matches(r##"fill="#e74c3c""##).count(), 1);
        assert_eq!(svg.matches(r##"fill="#f39c12""##).count(), 3);
        assert_eq!(svg.matches(r#"class="threshold""#).count(), 2);
        assert!(svg.contains("Target (0.70)"));
        assert!(svg.contains("Minimum (0.60)"));
        assert!(svg.contains(">0.6176<"));
    }

    #[test]
    fn calibration_svg_draws_ten_markers_and_dashed_reference() {
        let svg = render(catalog::calibration_curve(&LayoutOptions::default()));
        assert_eq!(svg.matches(r#"class="marker""#).count(), 10);
        assert_eq!(svg.matches(r#"class="series-line dashed""#).count(), 1);
        assert!(svg.contains("Perfect Calibration"));
    }

    #[test]
    fn grouped_svg_places_two_bars_per_category() {
        let svg = render(catalog::ccf_comparison(&LayoutOptions::default()));
        assert_eq!(svg.matches(r#"class="bar""#).count(), 6);
        assert_eq!(svg.matches(r#"class="legend""#).count(), 2);
    }

    #[test]
    fn nice_bounds_round_outward() {
        assert_eq!(nice_bounds(0.0, 73.18), (0.0, 80.0));
        assert_eq!(nice_bounds(0.0, 0.0), (0.0, 1.0));
        assert_eq!(format_tick(0.60), "0.6");
        assert_eq!(format_tick(20.0), "20");
    }

    #[test]
    fn degenerate_ranges_fall_back_to_unit_interval() {
        let store = MetricsStore::sample();
        let definition = catalog::lgd_stress(&LayoutOptions::default());
        let mut spec = build_chart(
            store.table(&definition.table).unwrap(),
            &definition,
            &StylePolicy::default(),
        )
        .unwrap();

        spec.y_range = Some((1.0, 1.0));
        assert_eq!(y_bounds(&spec), (0.0, 1.0));
        spec.y_range = Some((f64::NAN, 10.0));
        assert_eq!(y_bounds(&spec), (0.0, 1.0));

        spec.y_range = None;
        spec.traces[0].y[1] = f64::INFINITY;
        let (lo, hi) = y_bounds(&spec);
        assert!(lo.is_finite() && hi.is_finite() && lo < hi);
        let svg = render_svg(&spec).unwrap();
        assert_eq!(svg.matches(r#"class="bar""#).count(), 4);
    }

    #[test]
    fn text_is_escaped() {
        let store = MetricsStore::sample();
        let mut definition = catalog::lgd_stress(&LayoutOptions::default());
        definition.title = "Stress <A&B>".into();
        let spec = build_chart(
            store.table(&definition.table).unwrap(),
            &definition,
            &StylePolicy::default(),
        )
        .unwrap();
        let svg = render_svg(&spec).unwrap();
        assert!(svg.contains("Stress &lt;A&amp;B&gt;"));
        assert!(!svg.contains("<A&B>"));
    }
}
