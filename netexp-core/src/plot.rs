//! Summary plot rendering.
//!
//! Three plots per trial: an overlay of density-normalized activity
//! histograms, a latency scatter and a congestion scatter. Binning and
//! point mapping are plain functions of the artifact arrays, so a given
//! [`ArtifactSet`](crate::ArtifactSet) always produces the same plot
//! content.

use std::path::Path;

use plotters::prelude::*;

use crate::artifact::ArtifactSet;
use crate::error::{Error, Result};
use crate::{ACTIVITY_PLOT_FILE, CONGESTION_PLOT_FILE, LATENCY_PLOT_FILE};

/// Bin count used for each activity histogram series.
pub const ACTIVITY_BIN_COUNT: usize = 400;

/// Raster tier every plot is saved at, dots per inch.
pub const RENDER_DPI: u32 = 600;
/// Composition tier the congestion figure historically used for
/// on-screen work. Saving always happens at [`RENDER_DPI`], which makes
/// the saved raster identical for all three plots; the constant is kept
/// as the record of that asymmetry.
pub const SCREEN_DPI: u32 = 150;

/// Pixel size of a 6.4 x 4.8 inch figure at the given tier.
pub fn canvas_size(dpi: u32) -> (u32, u32) {
    (dpi * 32 / 5, dpi * 24 / 5)
}

const MARGIN: i32 = 40;
const X_LABEL_AREA: i32 = 220;
const Y_LABEL_AREA: i32 = 300;
const TICK_FONT: (&str, i32) = ("sans-serif", 56);
const AXIS_FONT: (&str, i32) = ("sans-serif", 72);
const LEGEND_FONT: (&str, i32) = ("sans-serif", 64);

const SERIES_COLORS: [RGBColor; 3] = [BLUE, RED, GREEN];

/// One series binned for a density histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityBins {
    pub start: f64,
    pub bin_width: f64,
    pub densities: Vec<f64>,
}

impl DensityBins {
    pub fn end(&self) -> f64 {
        self.start + self.bin_width * self.densities.len() as f64
    }

    pub fn max_density(&self) -> f64 {
        self.densities.iter().copied().fold(0.0, f64::max)
    }
}

/// Bins a sample series into a density-normalized histogram over the
/// series' own value range. Densities integrate to one over the range.
/// Empty input has no range and yields `None`; a zero-width range
/// widens to a unit window around the single value.
pub fn density_bins(samples: &[i64], bin_count: usize) -> Option<DensityBins> {
    if samples.is_empty() || bin_count == 0 {
        return None;
    }
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &sample in samples {
        let v = sample as f64;
        min = min.min(v);
        max = max.max(v);
    }
    if max - min <= 0.0 {
        min -= 0.5;
        max += 0.5;
    }
    let bin_width = (max - min) / bin_count as f64;
    let mut counts = vec![0_u64; bin_count];
    for &sample in samples {
        let mut idx = ((sample as f64 - min) / bin_width) as usize;
        // the maximum sample lands on the closing edge, counted in the
        // last bin
        if idx >= bin_count {
            idx = bin_count - 1;
        }
        counts[idx] += 1;
    }
    let norm = samples.len() as f64 * bin_width;
    Some(DensityBins {
        start: min,
        bin_width,
        densities: counts.into_iter().map(|c| c as f64 / norm).collect(),
    })
}

/// Renders all three plots into the workspace, with the fixed output
/// names. Every plotting resource is dropped again before this returns,
/// keeping peak memory flat across trials.
pub fn render_all(artifacts: &ArtifactSet, dir: &Path) -> Result<()> {
    render_activity_histogram(artifacts, &dir.join(ACTIVITY_PLOT_FILE))?;
    render_scatter(
        &artifacts.latency,
        "latency",
        &dir.join(LATENCY_PLOT_FILE),
        LATENCY_PLOT_FILE,
    )?;
    render_scatter(
        &artifacts.congestion,
        "congestion",
        &dir.join(CONGESTION_PLOT_FILE),
        CONGESTION_PLOT_FILE,
    )?;
    debug!("rendered plots into {}", dir.display());
    Ok(())
}

/// Overlay of the three activity series as semi-transparent density
/// histograms with a legend in the upper right.
pub fn render_activity_histogram(artifacts: &ArtifactSet, path: &Path) -> Result<()> {
    let series: [(&str, &[i64]); 3] = [
        ("broadcast activity", &artifacts.broadcast_activity),
        ("dispatch activity", &artifacts.dispatch_activity),
        ("discard activity", &artifacts.discard_activity),
    ];
    let binned: Vec<(&str, Option<DensityBins>)> = series
        .iter()
        .map(|(label, samples)| (*label, density_bins(samples, ACTIVITY_BIN_COUNT)))
        .collect();

    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_max = 0.0_f64;
    for bins in binned.iter().filter_map(|(_, b)| b.as_ref()) {
        x_min = x_min.min(bins.start);
        x_max = x_max.max(bins.end());
        y_max = y_max.max(bins.max_density());
    }
    if !x_min.is_finite() || !x_max.is_finite() {
        x_min = 0.0;
        x_max = 1.0;
    }
    if y_max <= 0.0 {
        y_max = 1.0;
    }

    let root = BitMapBackend::new(path, canvas_size(RENDER_DPI)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| render_error(ACTIVITY_PLOT_FILE, e))?;

    let mut chart = ChartBuilder::on(&root)
        .margin(MARGIN)
        .x_label_area_size(X_LABEL_AREA)
        .y_label_area_size(Y_LABEL_AREA)
        .build_cartesian_2d(x_min..x_max, 0.0_f64..(y_max * 1.1))
        .map_err(|e| render_error(ACTIVITY_PLOT_FILE, e))?;

    chart
        .configure_mesh()
        .x_desc("activities density histogram")
        .label_style(TICK_FONT)
        .axis_desc_style(AXIS_FONT)
        .draw()
        .map_err(|e| render_error(ACTIVITY_PLOT_FILE, e))?;

    for (i, (label, bins)) in binned.iter().enumerate() {
        let color = SERIES_COLORS[i];
        let bars: Vec<Rectangle<(f64, f64)>> = match bins {
            Some(bins) => bins
                .densities
                .iter()
                .enumerate()
                .map(|(j, &density)| {
                    let x0 = bins.start + j as f64 * bins.bin_width;
                    let x1 = x0 + bins.bin_width;
                    Rectangle::new([(x0, 0.0), (x1, density)], color.mix(0.5).filled())
                })
                .collect(),
            // an empty series draws nothing but keeps its legend entry
            None => Vec::new(),
        };
        chart
            .draw_series(bars)
            .map_err(|e| render_error(ACTIVITY_PLOT_FILE, e))?
            .label(*label)
            .legend(move |(x, y)| {
                Rectangle::new([(x, y - 10), (x + 20, y + 10)], color.mix(0.5).filled())
            });
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .label_font(LEGEND_FONT)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(|e| render_error(ACTIVITY_PLOT_FILE, e))?;

    root.present()
        .map_err(|e| render_error(ACTIVITY_PLOT_FILE, e))?;
    Ok(())
}

/// Time-series scatter with minimal point markers, for dense series.
fn render_scatter(points: &[(i64, i64)], y_desc: &str, path: &Path, name: &str) -> Result<()> {
    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for &(x, y) in points {
        x_min = x_min.min(x as f64);
        x_max = x_max.max(x as f64);
        y_min = y_min.min(y as f64);
        y_max = y_max.max(y as f64);
    }
    if !x_min.is_finite() {
        x_min = 0.0;
        x_max = 1.0;
        y_min = 0.0;
        y_max = 1.0;
    }
    let x_pad = pad(x_min, x_max);
    let y_pad = pad(y_min, y_max);

    let root = BitMapBackend::new(path, canvas_size(RENDER_DPI)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| render_error(name, e))?;

    let mut chart = ChartBuilder::on(&root)
        .margin(MARGIN)
        .x_label_area_size(X_LABEL_AREA)
        .y_label_area_size(Y_LABEL_AREA)
        .build_cartesian_2d(
            (x_min - x_pad)..(x_max + x_pad),
            (y_min - y_pad)..(y_max + y_pad),
        )
        .map_err(|e| render_error(name, e))?;

    chart
        .configure_mesh()
        .x_desc("time")
        .y_desc(y_desc)
        .label_style(TICK_FONT)
        .axis_desc_style(AXIS_FONT)
        .draw()
        .map_err(|e| render_error(name, e))?;

    chart
        .draw_series(
            points
                .iter()
                .map(|&(x, y)| Circle::new((x as f64, y as f64), 1, BLUE.filled())),
        )
        .map_err(|e| render_error(name, e))?;

    root.present().map_err(|e| render_error(name, e))?;
    Ok(())
}

/// Five percent range padding around scatter data.
fn pad(min: f64, max: f64) -> f64 {
    let span = max - min;
    if span <= 0.0 {
        0.5
    } else {
        span * 0.05
    }
}

fn render_error<E: std::fmt::Display>(name: &str, e: E) -> Error {
    Error::PlotRender {
        name: name.to_string(),
        reason: e.to_string(),
    }
}

#[test]
fn density_bins_integrate_to_one() {
    let samples: Vec<i64> = (0..1000).map(|i| (i * 7) % 313).collect();
    let bins = density_bins(&samples, ACTIVITY_BIN_COUNT).unwrap();
    let integral: f64 = bins.densities.iter().map(|d| d * bins.bin_width).sum();
    assert!((integral - 1.0).abs() < 1e-9);
}

#[test]
fn density_bins_are_deterministic() {
    let samples = vec![100_i64, 200, 100, 150, 175];
    let first = density_bins(&samples, ACTIVITY_BIN_COUNT).unwrap();
    let second = density_bins(&samples, ACTIVITY_BIN_COUNT).unwrap();
    assert_eq!(first, second);
}

#[test]
fn density_bins_empty_series() {
    assert!(density_bins(&[], ACTIVITY_BIN_COUNT).is_none());
}

#[test]
fn density_bins_single_value_widens_range() {
    let bins = density_bins(&[300], ACTIVITY_BIN_COUNT).unwrap();
    assert!((bins.start - 299.5).abs() < 1e-9);
    assert!((bins.end() - 300.5).abs() < 1e-9);
    let integral: f64 = bins.densities.iter().map(|d| d * bins.bin_width).sum();
    assert!((integral - 1.0).abs() < 1e-9);
}

#[test]
fn canvas_matches_tiers() {
    assert_eq!(canvas_size(RENDER_DPI), (3840, 2880));
    assert_eq!(canvas_size(SCREEN_DPI), (960, 720));
}
