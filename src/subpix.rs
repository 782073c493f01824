//! Canny-style edge tracing with sub-pixel localization.
//!
//! Coordinate convention: pixel centers, so integer `(x, y)` is the center of
//! pixel `(x, y)`.
//!
//! Gradient magnitudes come from an unnormalized 3x3 Sobel operator, the same
//! scale `imageproc::edges::canny` thresholds against, so hysteresis
//! thresholds mean the same thing for both backends.
//!
//! When a domain region is given, pixels outside it are never edge
//! candidates and hysteresis cannot grow through them. Smoothing and gradients
//! still read the full image so values near the domain border are not
//! distorted.

use image::{GrayImage, Luma};
use imageproc::point::Point;
use log::debug;

use crate::border::mirror_index;
use crate::contours::{Contour, retain_by_length_in_place};
use crate::region::Region;

/// 4-neighbors first so chains prefer straight steps over diagonal ones.
const NEIGHBORS: [(i64, i64); 8] = [
    (1, 0),
    (0, 1),
    (-1, 0),
    (0, -1),
    (1, 1),
    (-1, 1),
    (-1, -1),
    (1, -1),
];

#[derive(Debug, Clone, PartialEq)]
pub struct Edgel {
    pub p: Point<f32>,
    pub idx: (u32, u32),
    pub strength: f32,
}

/// Hysteresis output of one tracer run.
#[derive(Debug, Clone)]
pub struct EdgeTrace {
    width: u32,
    height: u32,
    keep: Vec<bool>,
    positions: Vec<Point<f32>>,
    strength: Vec<f32>,
}

impl EdgeTrace {
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of pixels that survived hysteresis.
    pub fn len(&self) -> usize {
        self.keep.iter().filter(|&&k| k).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.keep.iter().any(|&k| k)
    }

    /// Surviving edge pixels in row-major order.
    pub fn edgels(&self) -> Vec<Edgel> {
        let w = self.width as usize;
        self.keep
            .iter()
            .enumerate()
            .filter(|&(_, &k)| k)
            .map(|(i, _)| Edgel {
                p: self.positions[i],
                idx: ((i % w) as u32, (i / w) as u32),
                strength: self.strength[i],
            })
            .collect()
    }

    /// Binary edge raster: 255 on surviving pixels, 0 elsewhere.
    pub fn edge_map(&self) -> GrayImage {
        let w = self.width as usize;
        GrayImage::from_fn(self.width, self.height, |x, y| {
            if self.keep[y as usize * w + x as usize] {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }

    /// Links surviving pixels into ordered 8-connected chains.
    ///
    /// Each chain is grown in both directions from its first pixel in
    /// row-major order. A chain whose ends touch is closed. Pixels where
    /// several chains meet end up in exactly one of them.
    pub fn link(&self) -> Vec<Contour> {
        let (w, h) = (self.width as i64, self.height as i64);
        let n = self.keep.len();
        let mut visited = vec![false; n];

        let next_unvisited = |idx: usize, visited: &[bool]| -> Option<usize> {
            let (x, y) = ((idx as i64) % w, (idx as i64) / w);
            NEIGHBORS.iter().find_map(|&(dx, dy)| {
                let (nx, ny) = (x + dx, y + dy);
                if nx < 0 || ny < 0 || nx >= w || ny >= h {
                    return None;
                }
                let nidx = (ny * w + nx) as usize;
                (self.keep[nidx] && !visited[nidx]).then_some(nidx)
            })
        };

        let mut contours = Vec::new();
        for start in 0..n {
            if !self.keep[start] || visited[start] {
                continue;
            }
            visited[start] = true;

            let mut forward = Vec::new();
            let mut cur = start;
            while let Some(next) = next_unvisited(cur, &visited) {
                visited[next] = true;
                forward.push(next);
                cur = next;
            }

            let mut backward = Vec::new();
            cur = start;
            while let Some(next) = next_unvisited(cur, &visited) {
                visited[next] = true;
                backward.push(next);
                cur = next;
            }

            let chain: Vec<usize> = backward
                .into_iter()
                .rev()
                .chain(std::iter::once(start))
                .chain(forward)
                .collect();

            let closed = chain.len() > 4 && {
                let (a, b) = (chain[0] as i64, chain[chain.len() - 1] as i64);
                ((a % w) - (b % w)).abs() <= 1 && ((a / w) - (b / w)).abs() <= 1
            };

            let points = chain.iter().map(|&i| self.positions[i]).collect();
            contours.push(Contour::new(points, closed));
        }

        contours
    }
}

/// How the two Sobel responses combine into a gradient magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GradientNorm {
    /// `|gx| + |gy|`, the classic Canny default.
    L1,
    /// `sqrt(gx² + gy²)`.
    #[default]
    L2,
}

impl GradientNorm {
    fn magnitude(self, gx: f32, gy: f32) -> f32 {
        match self {
            GradientNorm::L1 => gx.abs() + gy.abs(),
            GradientNorm::L2 => gx.hypot(gy),
        }
    }
}

/// Canny-style sub-pixel edge tracer.
#[derive(Debug, Clone, PartialEq)]
pub struct SubPixelEdgeTracer {
    /// Gaussian pre-smoothing scale; `0.0` disables smoothing.
    pub sigma: f32,
    /// Magnitude the thresholds are compared against.
    pub norm: GradientNorm,
    /// Inclusive contour length range kept by [`SubPixelEdgeTracer::trace`].
    pub length_range: Option<(f64, f64)>,
}

impl SubPixelEdgeTracer {
    pub fn new(sigma: f32) -> Self {
        Self {
            sigma,
            norm: GradientNorm::default(),
            length_range: None,
        }
    }

    pub fn with_norm(mut self, norm: GradientNorm) -> Self {
        self.norm = norm;
        self
    }

    pub fn with_length_range(mut self, min: f64, max: f64) -> Self {
        self.length_range = Some((min, max));
        self
    }

    /// Runs smoothing, gradients, non-maximum suppression, hysteresis and
    /// sub-pixel refinement.
    ///
    /// An inverted threshold pair is swapped rather than rejected.
    pub fn detect(
        &self,
        image: &GrayImage,
        domain: Option<&Region>,
        low: f32,
        high: f32,
    ) -> EdgeTrace {
        let (width, height) = image.dimensions();
        let (w, h) = (width as usize, height as usize);
        let n = w * h;

        let mut trace = EdgeTrace {
            width,
            height,
            keep: vec![false; n],
            positions: vec![Point::new(0.0, 0.0); n],
            strength: vec![0.0; n],
        };
        if n == 0 {
            return trace;
        }

        let src: Vec<f32> = image.as_raw().iter().map(|&v| v as f32).collect();
        let smoothed = gaussian_smooth(&src, w, h, self.sigma);
        let (gx, gy, mag) = sobel(&smoothed, w, h, self.norm);
        let nms = non_max_suppression(&gx, &gy, &mag, w, h, domain);

        let (mut low, mut high) = (low, high);
        if high < low {
            std::mem::swap(&mut low, &mut high);
        }
        trace.keep = hysteresis(&nms, w, h, low, high);

        for idx in 0..n {
            if !trace.keep[idx] {
                continue;
            }
            let (x, y) = (idx % w, idx / w);
            trace.strength[idx] = mag[idx];
            trace.positions[idx] = refine(&mag, &gx, &gy, w, h, x, y);
        }

        debug!(
            "tracer sigma {} thresholds [{low}, {high}]: {} edge pixels",
            self.sigma,
            trace.len()
        );
        trace
    }

    /// Detects and links edges into contours, applying the length range if
    /// one is configured.
    pub fn trace(
        &self,
        image: &GrayImage,
        domain: Option<&Region>,
        low: f32,
        high: f32,
    ) -> Vec<Contour> {
        let mut contours = self.detect(image, domain, low, high).link();
        let linked = contours.len();
        if let Some((min, max)) = self.length_range {
            retain_by_length_in_place(&mut contours, min, max);
        }
        debug!("linked {linked} contours, kept {}", contours.len());
        contours
    }
}

impl Default for SubPixelEdgeTracer {
    fn default() -> Self {
        Self::new(crate::config::TRACER_SIGMA)
    }
}

fn gaussian_smooth(src: &[f32], w: usize, h: usize, sigma: f32) -> Vec<f32> {
    if sigma <= 0.0 {
        return src.to_vec();
    }

    let radius = (3.0 * sigma).ceil().max(1.0) as isize;
    let denom = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (-radius..=radius)
        .map(|i| (-((i * i) as f32) / denom).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= sum);

    let mut tmp = vec![0.0f32; w * h];
    for y in 0..h {
        let row = &src[y * w..(y + 1) * w];
        for x in 0..w {
            let mut acc = 0.0;
            for (k, &kv) in kernel.iter().enumerate() {
                let sx = mirror_index(x as isize + k as isize - radius, w);
                acc += kv * row[sx];
            }
            tmp[y * w + x] = acc;
        }
    }

    let mut out = vec![0.0f32; w * h];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (k, &kv) in kernel.iter().enumerate() {
                let sy = mirror_index(y as isize + k as isize - radius, h);
                acc += kv * tmp[sy * w + x];
            }
            out[y * w + x] = acc;
        }
    }
    out
}

fn sobel(src: &[f32], w: usize, h: usize, norm: GradientNorm) -> (Vec<f32>, Vec<f32>, Vec<f32>) {
    let mut gx = vec![0.0f32; w * h];
    let mut gy = vec![0.0f32; w * h];
    let mut mag = vec![0.0f32; w * h];

    for y in 0..h {
        let ym1 = mirror_index(y as isize - 1, h);
        let yp1 = mirror_index(y as isize + 1, h);
        for x in 0..w {
            let xm1 = mirror_index(x as isize - 1, w);
            let xp1 = mirror_index(x as isize + 1, w);

            let p00 = src[ym1 * w + xm1];
            let p01 = src[ym1 * w + x];
            let p02 = src[ym1 * w + xp1];
            let p10 = src[y * w + xm1];
            let p12 = src[y * w + xp1];
            let p20 = src[yp1 * w + xm1];
            let p21 = src[yp1 * w + x];
            let p22 = src[yp1 * w + xp1];

            let gxx = (p02 + 2.0 * p12 + p22) - (p00 + 2.0 * p10 + p20);
            let gyy = (p20 + 2.0 * p21 + p22) - (p00 + 2.0 * p01 + p02);

            let idx = y * w + x;
            gx[idx] = gxx;
            gy[idx] = gyy;
            mag[idx] = norm.magnitude(gxx, gyy);
        }
    }

    (gx, gy, mag)
}

/// Keeps local maxima along the quantized gradient direction.
///
/// The comparison is strict towards the lower-index neighbor and non-strict
/// towards the other, so two equal maxima straddling a symmetric step leave
/// exactly one survivor.
fn non_max_suppression(
    gx: &[f32],
    gy: &[f32],
    mag: &[f32],
    w: usize,
    h: usize,
    domain: Option<&Region>,
) -> Vec<f32> {
    let mut nms = vec![0.0f32; w * h];
    if w < 3 || h < 3 {
        return nms;
    }

    const TAN22_5: f32 = 0.414_213_57;
    const TAN67_5: f32 = 2.414_213_7;

    for y in 1..(h - 1) {
        for x in 1..(w - 1) {
            if let Some(domain) = domain
                && !domain.contains(x as i64, y as i64)
            {
                continue;
            }

            let idx = y * w + x;
            let m = mag[idx];
            if m <= 0.0 {
                continue;
            }

            let (gxx, gyy) = (gx[idx], gy[idx]);
            let (ax, ay) = (gxx.abs(), gyy.abs());

            let (i1, i2) = if ay <= ax * TAN22_5 {
                (idx - 1, idx + 1)
            } else if ay >= ax * TAN67_5 {
                (idx - w, idx + w)
            } else if gxx * gyy > 0.0 {
                (idx - w - 1, idx + w + 1)
            } else {
                (idx - w + 1, idx + w - 1)
            };

            if m > mag[i1] && m >= mag[i2] {
                nms[idx] = m;
            }
        }
    }

    nms
}

fn hysteresis(nms: &[f32], w: usize, h: usize, low: f32, high: f32) -> Vec<bool> {
    let n = w * h;
    let mut keep = vec![false; n];
    let mut stack = Vec::new();

    for (idx, &v) in nms.iter().enumerate() {
        if v > 0.0 && v >= high {
            keep[idx] = true;
            stack.push(idx);
        }
    }

    while let Some(idx) = stack.pop() {
        let (x, y) = (idx % w, idx / w);
        let (y0, y1) = (y.saturating_sub(1), (y + 1).min(h - 1));
        let (x0, x1) = (x.saturating_sub(1), (x + 1).min(w - 1));

        for ny in y0..=y1 {
            for nx in x0..=x1 {
                let nidx = ny * w + nx;
                if !keep[nidx] && nms[nidx] > 0.0 && nms[nidx] >= low {
                    keep[nidx] = true;
                    stack.push(nidx);
                }
            }
        }
    }

    keep
}

/// Parabolic fit of the gradient magnitude along the gradient normal.
fn refine(
    mag: &[f32],
    gx: &[f32],
    gy: &[f32],
    w: usize,
    h: usize,
    x: usize,
    y: usize,
) -> Point<f32> {
    let idx = y * w + x;
    let (xf, yf) = (x as f32, y as f32);
    // Unit normal regardless of the magnitude norm.
    let len = gx[idx].hypot(gy[idx]);
    if len <= 1e-12 {
        return Point::new(xf, yf);
    }

    let (nx, ny) = (gx[idx] / len, gy[idx] / len);
    let s0 = mag[idx];
    let sp = sample_bilinear(mag, w, h, xf + nx, yf + ny);
    let sm = sample_bilinear(mag, w, h, xf - nx, yf - ny);

    let denom = sm - 2.0 * s0 + sp;
    let mut t = 0.0f32;
    if denom.abs() > 1e-12 {
        let tt = 0.5 * (sm - sp) / denom;
        if tt.is_finite() {
            t = tt.clamp(-1.0, 1.0);
        }
    }

    Point::new(xf + t * nx, yf + t * ny)
}

fn sample_bilinear(data: &[f32], w: usize, h: usize, x: f32, y: f32) -> f32 {
    let x = x.clamp(0.0, (w - 1) as f32);
    let y = y.clamp(0.0, (h - 1) as f32);
    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let (dx, dy) = (x - x0 as f32, y - y0 as f32);

    let p00 = data[y0 * w + x0];
    let p10 = data[y0 * w + x1];
    let p01 = data[y1 * w + x0];
    let p11 = data[y1 * w + x1];

    p00 * (1.0 - dx) * (1.0 - dy) + p10 * dx * (1.0 - dy) + p01 * (1.0 - dx) * dy + p11 * dx * dy
}
