//! # Trajectory Chart
//!
//! Draws both minimum-pressure tracks (longitude index on x, latitude index on the left
//! y-axis) and the pressure difference on an independently scaled secondary axis on the
//! right. The chart is produced as SVG; PNG output rasterises the same SVG with resvg.

use crate::config::{AnalysisConfig, ChartFormat};
use crate::difference::DifferenceSeries;
use crate::error::{Result, TrackError};
use crate::series::Series;
use log::debug;
use std::fs;
use std::path::Path;

const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 75.0;
const MARGIN_TOP: f64 = 45.0;
const MARGIN_BOTTOM: f64 = 55.0;
const TICK_COUNT: usize = 6;

/// Linear map from data values to pixels
#[derive(Debug, Clone, Copy, PartialEq)]
struct Axis {
    /// Data value drawn at `pixel_start`
    from: f64,
    /// Data value drawn at `pixel_end`
    to: f64,
    pixel_start: f64,
    pixel_end: f64,
}

impl Axis {
    fn map(&self, value: f64) -> f64 {
        let fraction = (value - self.from) / (self.to - self.from);
        self.pixel_start + fraction * (self.pixel_end - self.pixel_start)
    }

    fn ticks(&self) -> Vec<f64> {
        nice_ticks(self.from.min(self.to), self.from.max(self.to), TICK_COUNT)
    }
}

/// Data range padded by 5% on each side. A flat range is widened by one unit on each
/// side and an empty one becomes `(0, 1)`.
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let Some((lo, hi)) = values
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    else {
        return (0.0, 1.0);
    };
    if hi - lo < f64::EPSILON {
        return (lo - 1.0, hi + 1.0);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

/// Round tick positions covering `[lo, hi]`
fn nice_ticks(lo: f64, hi: f64, count: usize) -> Vec<f64> {
    let span = hi - lo;
    if span <= 0.0 || !span.is_finite() || count == 0 {
        return vec![lo];
    }
    let raw = span / count as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let step = [1.0, 2.0, 2.5, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= raw)
        .unwrap_or(10.0 * magnitude);

    let mut ticks = Vec::new();
    let mut tick = (lo / step).ceil() * step;
    while tick <= hi + step * 1e-9 {
        // Avoid printing -0
        ticks.push(if tick.abs() < step * 1e-9 { 0.0 } else { tick });
        tick += step;
    }
    ticks
}

fn tick_label(value: f64, ticks: &[f64]) -> String {
    let step = match ticks {
        [a, b, ..] => (b - a).abs(),
        _ => 1.0,
    };
    let decimals = if step >= 1.0 {
        0
    } else {
        (-step.log10()).ceil() as usize
    };
    format!("{:.*}", decimals, value)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn polyline(points: &[(f64, f64)], x: &Axis, y: &Axis, color: &str) -> String {
    let coords: Vec<String> = points
        .iter()
        .filter(|(px, py)| px.is_finite() && py.is_finite())
        .map(|&(px, py)| format!("{:.2},{:.2}", x.map(px), y.map(py)))
        .collect();
    format!(
        "<polyline points=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.5\" clip-path=\"url(#plot-area)\"/>\n",
        coords.join(" "),
        escape(color)
    )
}

/// Builds the SVG document for two tracks and their difference.
pub fn render_svg(
    config: &AnalysisConfig,
    a: &Series,
    b: &Series,
    diff: &DifferenceSeries,
) -> String {
    let chart = &config.chart;
    let width = chart.width as f64;
    let height = chart.height as f64;
    let left = MARGIN_LEFT;
    let right = width - MARGIN_RIGHT;
    let top = MARGIN_TOP;
    let bottom = height - MARGIN_BOTTOM;

    let track_a = a.trajectory();
    let track_b = b.trajectory();
    let curve = diff.curve();

    let (x_lo, x_hi) = padded_range(
        track_a
            .iter()
            .chain(&track_b)
            .chain(&curve)
            .map(|(col, _)| *col),
    );
    let (y_lo, y_hi) = padded_range(track_a.iter().chain(&track_b).map(|(_, row)| *row));
    let (d_bottom, d_top) = chart
        .diff_axis
        .unwrap_or_else(|| padded_range(curve.iter().map(|(_, v)| *v)));

    let x = Axis {
        from: x_lo,
        to: x_hi,
        pixel_start: left,
        pixel_end: right,
    };
    let y = Axis {
        from: y_lo,
        to: y_hi,
        pixel_start: bottom,
        pixel_end: top,
    };
    let y2 = Axis {
        from: d_bottom,
        to: d_top,
        pixel_start: bottom,
        pixel_end: top,
    };

    let diff_color = escape(&chart.diff_color);
    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" font-family=\"sans-serif\" font-size=\"12\">\n",
        w = chart.width,
        h = chart.height
    ));
    svg.push_str("<rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
    svg.push_str(&format!(
        "<defs><clipPath id=\"plot-area\"><rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\"/></clipPath></defs>\n",
        left,
        top,
        right - left,
        bottom - top
    ));
    svg.push_str(&format!(
        "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" font-size=\"15\">{}</text>\n",
        width / 2.0,
        top - 15.0,
        escape(&chart.title)
    ));

    // Frame
    svg.push_str(&format!(
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"none\" stroke=\"black\"/>\n",
        left,
        top,
        right - left,
        bottom - top
    ));

    // Bottom axis
    let x_ticks = x.ticks();
    for &t in &x_ticks {
        let px = x.map(t);
        svg.push_str(&format!(
            "<line x1=\"{px:.2}\" y1=\"{bottom:.2}\" x2=\"{px:.2}\" y2=\"{:.2}\" stroke=\"black\"/><text x=\"{px:.2}\" y=\"{:.2}\" text-anchor=\"middle\">{}</text>\n",
            bottom + 5.0,
            bottom + 18.0,
            tick_label(t, &x_ticks)
        ));
    }
    svg.push_str(&format!(
        "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\">{}</text>\n",
        (left + right) / 2.0,
        height - 15.0,
        escape(&chart.x_label)
    ));

    // Left axis
    let y_ticks = y.ticks();
    for &t in &y_ticks {
        let py = y.map(t);
        svg.push_str(&format!(
            "<line x1=\"{:.2}\" y1=\"{py:.2}\" x2=\"{left:.2}\" y2=\"{py:.2}\" stroke=\"black\"/><text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"end\">{}</text>\n",
            left - 5.0,
            left - 8.0,
            py + 4.0,
            tick_label(t, &y_ticks)
        ));
    }
    svg.push_str(&format!(
        "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" transform=\"rotate(-90 {:.2} {:.2})\">{}</text>\n",
        20.0,
        (top + bottom) / 2.0,
        20.0,
        (top + bottom) / 2.0,
        escape(&chart.y_label)
    ));

    // Right axis
    let d_ticks = y2.ticks();
    for &t in &d_ticks {
        let py = y2.map(t);
        svg.push_str(&format!(
            "<line x1=\"{right:.2}\" y1=\"{py:.2}\" x2=\"{:.2}\" y2=\"{py:.2}\" stroke=\"black\"/><text x=\"{:.2}\" y=\"{:.2}\" fill=\"{diff_color}\">{}</text>\n",
            right + 5.0,
            right + 8.0,
            py + 4.0,
            tick_label(t, &d_ticks)
        ));
    }
    let diff_label = format!("{} SLP - {} SLP", config.dataset_b.label, config.dataset_a.label);
    let label_x = width - 15.0;
    svg.push_str(&format!(
        "<text x=\"{label_x:.2}\" y=\"{:.2}\" text-anchor=\"middle\" fill=\"{diff_color}\" transform=\"rotate(90 {label_x:.2} {:.2})\">{}</text>\n",
        (top + bottom) / 2.0,
        (top + bottom) / 2.0,
        escape(&diff_label)
    ));

    svg.push_str(&polyline(&track_a, &x, &y, &config.dataset_a.color));
    svg.push_str(&polyline(&track_b, &x, &y, &config.dataset_b.color));
    svg.push_str(&polyline(&curve, &x, &y2, &chart.diff_color));

    // Legend, upper left
    for (i, dataset) in [&config.dataset_a, &config.dataset_b].iter().enumerate() {
        let ly = top + 18.0 + i as f64 * 18.0;
        svg.push_str(&format!(
            "<line x1=\"{:.2}\" y1=\"{ly:.2}\" x2=\"{:.2}\" y2=\"{ly:.2}\" stroke=\"{}\" stroke-width=\"1.5\"/><text x=\"{:.2}\" y=\"{:.2}\">{}</text>\n",
            left + 10.0,
            left + 35.0,
            escape(&dataset.color),
            left + 42.0,
            ly + 4.0,
            escape(&dataset.label)
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

/// Renders the chart to `config.chart.output` as SVG or PNG.
pub fn write_chart(
    config: &AnalysisConfig,
    a: &Series,
    b: &Series,
    diff: &DifferenceSeries,
) -> Result<()> {
    let output = &config.chart.output;
    let format = ChartFormat::from_path(output)?;
    let svg = render_svg(config, a, b, diff);

    match format {
        ChartFormat::Svg => fs::write(output, svg)?,
        ChartFormat::Png => rasterize(&svg, config.chart.width, config.chart.height, output)?,
    }
    debug!("Chart written to {}", output.display());
    Ok(())
}

fn rasterize(svg: &str, width: u32, height: u32, output: &Path) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt)
        .map_err(|e| TrackError::Render(format!("invalid chart SVG: {}", e)))?;
    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| {
            TrackError::Render(format!("cannot allocate {}x{} image", width, height))
        })?;
    pixmap.fill(tiny_skia::Color::WHITE);
    resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());
    pixmap
        .save_png(output)
        .map_err(|e| TrackError::Render(format!("cannot write {}: {}", output.display(), e)))
}
