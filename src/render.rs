//! Raster output for slice fields, spherical-harmonic maps and radial profiles.
//!
//! One grid sample becomes one pixel. Grid row 0 holds the most negative `v`,
//! so rows are flipped to put +v at the top of the image.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use ndarray::{Array1, Array2, Ix2};
use once_cell::sync::Lazy;

use crate::error::OrbitalError;
use crate::modes::{ModeData, RenderMode};
use crate::scale::{check_scale, Scale};

const PANEL_GAP: u32 = 8;
const COLORBAR_GAP: u32 = 6;
const COLORBAR_WIDTH: u32 = 16;
const NODAL_COLOR: Rgb<u8> = Rgb([168, 168, 168]);
const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
const CURVE_COLOR: Rgb<u8> = Rgb([31, 78, 121]);

/// Line mode draws this many levels between LINE_LEVEL_FLOOR * peak and peak.
const LINE_LEVELS: usize = 8;
const LINE_LEVEL_FLOOR: f64 = 0.12;
/// Negative levels of signed fields are dashed with this period in pixels.
const DASH_PERIOD: usize = 6;

/// Evenly spaced color anchors, linearly interpolated.
pub struct Colormap {
    stops: &'static [[u8; 3]],
    reversed: bool,
}

impl Colormap {
    /// Color at `t` in [0, 1]; out-of-range values are clamped.
    pub fn sample(&self, t: f64) -> Rgb<u8> {
        let t = if t.is_nan() { 0.5 } else { t.clamp(0.0, 1.0) };
        let t = if self.reversed { 1.0 - t } else { t };
        let last = self.stops.len() - 1;
        let pos = t * last as f64;
        let lo = (pos.floor() as usize).min(last);
        let hi = (lo + 1).min(last);
        let frac = pos - lo as f64;

        let mut rgb = [0u8; 3];
        for (c, out) in rgb.iter_mut().enumerate() {
            let a = self.stops[lo][c] as f64;
            let b = self.stops[hi][c] as f64;
            *out = (a + (b - a) * frac).round() as u8;
        }
        Rgb(rgb)
    }
}

static COLORMAP_STOPS: Lazy<HashMap<&'static str, &'static [[u8; 3]]>> = Lazy::new(|| {
    let mut maps: HashMap<&'static str, &'static [[u8; 3]]> = HashMap::new();
    maps.insert(
        "RdYlBu",
        &[
            [165, 0, 38],
            [215, 48, 39],
            [244, 109, 67],
            [253, 174, 97],
            [254, 224, 144],
            [255, 255, 191],
            [224, 243, 248],
            [171, 217, 233],
            [116, 173, 209],
            [69, 117, 180],
            [49, 54, 149],
        ],
    );
    maps.insert(
        "RdBu",
        &[
            [103, 0, 31],
            [178, 24, 43],
            [214, 96, 77],
            [244, 165, 130],
            [253, 219, 199],
            [247, 247, 247],
            [209, 229, 240],
            [146, 197, 222],
            [67, 147, 195],
            [33, 102, 172],
            [5, 48, 97],
        ],
    );
    maps.insert(
        "coolwarm",
        &[
            [59, 76, 192],
            [98, 130, 234],
            [141, 176, 254],
            [184, 208, 249],
            [221, 221, 221],
            [245, 196, 173],
            [244, 154, 123],
            [222, 96, 77],
            [180, 4, 38],
        ],
    );
    maps.insert(
        "YlOrRd",
        &[
            [255, 255, 204],
            [255, 237, 160],
            [254, 217, 118],
            [254, 178, 76],
            [253, 141, 60],
            [252, 78, 42],
            [227, 26, 28],
            [189, 0, 38],
            [128, 0, 38],
        ],
    );
    maps.insert(
        "viridis",
        &[
            [68, 1, 84],
            [72, 40, 120],
            [62, 74, 137],
            [49, 104, 142],
            [38, 130, 142],
            [31, 158, 137],
            [53, 183, 121],
            [109, 205, 89],
            [180, 222, 44],
            [253, 231, 37],
        ],
    );
    maps.insert(
        "magma",
        &[
            [0, 0, 4],
            [28, 16, 68],
            [79, 18, 123],
            [129, 37, 129],
            [181, 54, 122],
            [229, 80, 100],
            [251, 135, 97],
            [254, 194, 135],
            [252, 253, 191],
        ],
    );
    maps
});

/// Look up a colormap by name; a `_r` suffix reverses it.
pub fn colormap(name: &str) -> Result<Colormap, OrbitalError> {
    let (base, reversed) = match name.strip_suffix("_r") {
        Some(base) => (base, true),
        None => (name, false),
    };
    COLORMAP_STOPS
        .get(base)
        .map(|&stops| Colormap { stops, reversed })
        .ok_or_else(|| OrbitalError::UnknownColormap(name.to_string()))
}

/// Colormap name, scale and decorations for a heatmap.
///
/// With `line_mode` set the field is drawn as level contours on a blank
/// background instead of being filled; `scale` is still validated but the
/// contour colors use a linear norm.
#[derive(Debug, Clone, Copy)]
pub struct FieldStyle<'a> {
    pub cmap: &'a str,
    pub scale: Scale,
    pub colorbar: bool,
    pub line_mode: bool,
}

/// Maps field values to [0, 1] colormap positions.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Norm {
    /// Non-negative data drawn from the upper half of the map.
    Density { vmax: f64 },
    DensityLog { log_min: f64, log_max: f64 },
    Signed { vlim: f64 },
    SignedSymlog { linthresh: f64, span: f64 },
}

impl Norm {
    fn for_density<'a>(values: impl Iterator<Item = &'a f64> + Clone, scale: Scale) -> Self {
        let vmax = values.clone().copied().filter(|v| !v.is_nan()).fold(0.0, f64::max);
        if scale == Scale::Log && vmax > 0.0 {
            let min_positive = values
                .copied()
                .filter(|&v| v > 0.0)
                .fold(f64::INFINITY, f64::min);
            let vmin = min_positive.max(vmax * 1e-7);
            return Norm::DensityLog {
                log_min: vmin.log10(),
                log_max: vmax.log10(),
            };
        }
        Norm::Density {
            vmax: if vmax > 0.0 { vmax } else { 1.0 },
        }
    }

    fn for_signed(vlim: f64, scale: Scale) -> Self {
        let vlim = if vlim > 0.0 { vlim } else { 1.0 };
        match scale {
            Scale::Symlog => {
                let linthresh = (vlim * 1e-3).max(1e-16);
                Norm::SignedSymlog {
                    linthresh,
                    span: symlog(vlim, linthresh),
                }
            }
            _ => Norm::Signed { vlim },
        }
    }

    fn position(&self, v: f64) -> f64 {
        match *self {
            Norm::Density { vmax } => 0.5 + 0.5 * (v / vmax),
            Norm::DensityLog { log_min, log_max } => {
                if log_max <= log_min {
                    return 1.0;
                }
                let t = (v.max(10f64.powf(log_min)).log10() - log_min) / (log_max - log_min);
                0.5 + 0.5 * t
            }
            Norm::Signed { vlim } => 0.5 + 0.5 * (v / vlim),
            Norm::SignedSymlog { linthresh, span } => 0.5 + 0.5 * symlog(v, linthresh) / span,
        }
    }
}

/// Linear inside +/-linthresh, logarithmic outside.
fn symlog(v: f64, linthresh: f64) -> f64 {
    let a = v.abs();
    let mag = if a <= linthresh {
        a / linthresh
    } else {
        1.0 + (a / linthresh).log10()
    };
    mag.copysign(v)
}

fn peak_abs<'a>(values: impl Iterator<Item = &'a f64>) -> f64 {
    values.filter(|v| !v.is_nan()).fold(0.0, |acc, v| acc.max(v.abs()))
}

/// Render the output of the mode evaluator; real/imag pairs become two panels
/// sharing one color limit.
pub fn render_mode_data(
    data: &ModeData<Ix2>,
    mode: RenderMode,
    style: FieldStyle,
) -> Result<RgbImage, OrbitalError> {
    check_scale(mode, style.scale)?;
    let cmap = colormap(style.cmap)?;

    let norm_scale = if style.line_mode {
        Scale::Linear
    } else {
        style.scale
    };

    let (panels, norm, peak): (Vec<(&Array2<f64>, bool)>, Norm, f64) = match data {
        ModeData::Scalar(field) if mode == RenderMode::Density => {
            let vmax = field.iter().copied().filter(|v| !v.is_nan()).fold(0.0, f64::max);
            (vec![(field, false)], Norm::for_density(field.iter(), norm_scale), vmax)
        }
        ModeData::Scalar(field) => {
            let vlim = peak_abs(field.iter());
            (vec![(field, true)], Norm::for_signed(vlim, norm_scale), vlim)
        }
        ModeData::RealImag { real, imag } => {
            let vlim = peak_abs(real.iter()).max(peak_abs(imag.iter()));
            (
                vec![(real, true), (imag, true)],
                Norm::for_signed(vlim, norm_scale),
                vlim,
            )
        }
    };

    let levels = style.line_mode.then(|| contour_levels(peak));
    Ok(compose(&panels, &norm, &cmap, style.colorbar, levels.as_deref()))
}

/// `LINE_LEVELS` evenly spaced levels from `LINE_LEVEL_FLOOR * peak` to `peak`.
fn contour_levels(peak: f64) -> Vec<f64> {
    let peak = if peak > 0.0 { peak } else { 1.0 };
    let lo = LINE_LEVEL_FLOOR * peak;
    let step = (peak - lo) / (LINE_LEVELS - 1) as f64;
    (0..LINE_LEVELS).map(|k| lo + step * k as f64).collect()
}

fn compose(
    panels: &[(&Array2<f64>, bool)],
    norm: &Norm,
    cmap: &Colormap,
    colorbar: bool,
    levels: Option<&[f64]>,
) -> RgbImage {
    let (rows, cols) = panels[0].0.dim();
    let (rows, cols) = (rows as u32, cols as u32);
    let count = panels.len() as u32;
    let bar = if colorbar {
        COLORBAR_GAP + COLORBAR_WIDTH
    } else {
        0
    };
    let width = count * cols + (count - 1) * PANEL_GAP + bar;
    let mut image = RgbImage::from_pixel(width, rows, BACKGROUND);

    for (k, (field, signed)) in panels.iter().enumerate() {
        let x0 = k as u32 * (cols + PANEL_GAP);
        match levels {
            Some(levels) => paint_contours(&mut image, x0, field, *signed, levels, norm, cmap),
            None => paint_field(&mut image, x0, field, *signed, norm, cmap),
        }
    }

    if colorbar {
        let x0 = width - COLORBAR_WIDTH;
        let lower = match norm {
            Norm::Density { .. } | Norm::DensityLog { .. } => 0.5,
            _ => 0.0,
        };
        for y in 0..rows {
            let t = 1.0 - y as f64 / (rows.max(2) - 1) as f64;
            let color = cmap.sample(lower + (1.0 - lower) * t);
            for x in x0..width {
                image.put_pixel(x, y, color);
            }
        }
    }

    image
}

fn paint_field(
    image: &mut RgbImage,
    x0: u32,
    field: &Array2<f64>,
    signed: bool,
    norm: &Norm,
    cmap: &Colormap,
) {
    let (rows, cols) = field.dim();
    for i in 0..rows {
        let y = (rows - 1 - i) as u32;
        for j in 0..cols {
            let v = field[[i, j]];
            let nodal = signed
                && ((j + 1 < cols && v * field[[i, j + 1]] < 0.0)
                    || (i + 1 < rows && v * field[[i + 1, j]] < 0.0));
            let color = if nodal {
                NODAL_COLOR
            } else {
                cmap.sample(norm.position(v))
            };
            image.put_pixel(x0 + j as u32, y, color);
        }
    }
}

/// True when the level lies between `v` and its right or lower neighbour.
fn crosses(field: &Array2<f64>, i: usize, j: usize, level: f64) -> bool {
    let (rows, cols) = field.dim();
    let above = field[[i, j]] >= level;
    (j + 1 < cols && (field[[i, j + 1]] >= level) != above)
        || (i + 1 < rows && (field[[i + 1, j]] >= level) != above)
}

fn paint_contours(
    image: &mut RgbImage,
    x0: u32,
    field: &Array2<f64>,
    signed: bool,
    levels: &[f64],
    norm: &Norm,
    cmap: &Colormap,
) {
    let (rows, cols) = field.dim();
    for i in 0..rows {
        let y = (rows - 1 - i) as u32;
        let dashed_on = |j: usize| (i + j) % DASH_PERIOD < DASH_PERIOD / 2;
        for j in 0..cols {
            let v = field[[i, j]];
            let nodal = signed
                && ((j + 1 < cols && v * field[[i, j + 1]] < 0.0)
                    || (i + 1 < rows && v * field[[i + 1, j]] < 0.0));

            let color = if nodal {
                Some(NODAL_COLOR)
            } else {
                levels.iter().find_map(|&level| {
                    if crosses(field, i, j, level) {
                        Some(cmap.sample(norm.position(level)))
                    } else if signed && dashed_on(j) && crosses(field, i, j, -level) {
                        Some(cmap.sample(norm.position(-level)))
                    } else {
                        None
                    }
                })
            };
            if let Some(color) = color {
                image.put_pixel(x0 + j as u32, y, color);
            }
        }
    }
}

/// Line plot of P(r) = r^2 |R|^2 against r / a0.
pub fn render_radial_distribution(
    r_a0: &Array1<f64>,
    prob: &Array1<f64>,
    width: u32,
    height: u32,
) -> Result<RgbImage, OrbitalError> {
    if r_a0.len() != prob.len() || r_a0.len() < 2 {
        return Err(OrbitalError::Render(
            "radial profile needs at least two matching samples".to_string(),
        ));
    }
    let margin = 40u32;
    if width <= 2 * margin || height <= 2 * margin {
        return Err(OrbitalError::Render(format!(
            "canvas {width}x{height} is too small"
        )));
    }

    let mut image = RgbImage::from_pixel(width, height, BACKGROUND);
    let plot_w = (width - 2 * margin) as f64;
    let plot_h = (height - 2 * margin) as f64;
    let bottom = (height - margin) as f64;

    for x in margin..=width - margin {
        image.put_pixel(x, height - margin, AXIS_COLOR);
    }
    for y in margin..=height - margin {
        image.put_pixel(margin, y, AXIS_COLOR);
    }

    let r_min = r_a0[0];
    let r_span = (r_a0[r_a0.len() - 1] - r_min).max(f64::MIN_POSITIVE);
    let p_max = peak_abs(prob.iter());
    let p_max = if p_max > 0.0 { p_max } else { 1.0 };

    let to_pixel = |r: f64, p: f64| {
        let x = margin as f64 + (r - r_min) / r_span * plot_w;
        let y = bottom - p / p_max * plot_h;
        (x, y)
    };

    for k in 1..r_a0.len() {
        let (x0, y0) = to_pixel(r_a0[k - 1], prob[k - 1]);
        let (x1, y1) = to_pixel(r_a0[k], prob[k]);
        let steps = ((x1 - x0).abs().max((y1 - y0).abs()).ceil() as usize).max(1);
        for s in 0..=steps {
            let t = s as f64 / steps as f64;
            let x = (x0 + (x1 - x0) * t).round();
            let y = (y0 + (y1 - y0) * t).round();
            if x >= 0.0 && y >= 0.0 && (x as u32) < width && (y as u32) < height {
                image.put_pixel(x as u32, y as u32, CURVE_COLOR);
            }
        }
    }

    Ok(image)
}

pub fn save_png(image: &RgbImage, path: &Path) -> Result<(), OrbitalError> {
    image
        .save(path)
        .map_err(|e| OrbitalError::Render(format!("{}: {e}", path.display())))
}

pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, OrbitalError> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image.clone())
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .map_err(|e| OrbitalError::Render(e.to_string()))?;
    Ok(bytes)
}
