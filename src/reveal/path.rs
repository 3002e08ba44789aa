use crate::config::RevealParams;
use crate::foundation::core::{Canvas, Point, Vec2};
use crate::foundation::error::{ReelError, ReelResult};

/// Weight of arc length in the progress key. Keeps the key strictly increasing where the swept
/// area stalls (before the front enters the canvas and after it leaves).
const ARC_WEIGHT: f64 = 0.05;

/// One dense sample of the zig-zag polyline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathSample {
    pub point: Point,
    /// Progress value at which the stroke reaches this sample, strictly increasing along the path.
    pub key: f64,
}

/// Deterministic back-and-forth diagonal stroke over a canvas.
///
/// The stroke advances monotonically along the sweep axis `d = (cos a, sin a)` while zig-zagging
/// along the normal. Progress `p` is keyed to the canvas area already behind the stroke front, so
/// equal `p` steps reveal roughly equal area. A pixel counts as covered at `p` when it lies within
/// `brush_radius` of the stroke drawn so far, or behind the front (projection onto `d` at
/// most `u(P(p)) - brush_radius`). The stroke starts and ends one radius beyond the canvas, so
/// everything is covered at `p = 1`.
#[derive(Clone, Debug)]
pub struct RevealPath {
    canvas: Canvas,
    dir: Vec2,
    brush_radius: f64,
    samples: Vec<PathSample>,
}

impl RevealPath {
    #[tracing::instrument(level = "debug", skip(params), fields(w = canvas.width, h = canvas.height))]
    pub fn generate(canvas: Canvas, params: &RevealParams) -> ReelResult<Self> {
        if canvas.width == 0 || canvas.height == 0 {
            return Err(ReelError::render("reveal path needs a non-empty canvas"));
        }
        if params.segments == 0 {
            return Err(ReelError::render("reveal path needs at least one segment"));
        }
        if !(params.brush_radius.is_finite() && params.brush_radius > 0.0) {
            return Err(ReelError::render("reveal brush radius must be > 0"));
        }
        if !(params.amplitude.is_finite() && params.angle_deg.is_finite()) {
            return Err(ReelError::render("reveal amplitude and angle must be finite"));
        }

        let a = params.angle_deg.to_radians();
        let dir = Vec2::new(a.cos(), a.sin());
        let normal = Vec2::new(-a.sin(), a.cos());
        let r = params.brush_radius;

        let corners = canvas_corners(canvas);
        let (dmin, dmax) = project_range(&corners, dir);
        let (nmin, nmax) = project_range(&corners, normal);
        let vc = 0.5 * (nmin + nmax);

        let u0 = dmin - r;
        let u1 = dmax + r;
        let segs = params.segments as usize;
        let vertex = |k: usize| -> Point {
            let u = u0 + (u1 - u0) * (k as f64) / (segs as f64);
            let side = if k % 2 == 0 { -1.0 } else { 1.0 };
            let v = vc + side * params.amplitude;
            (dir * u + normal * v).to_point()
        };

        let spacing = (r * 0.25).max(0.5);
        let mut points = vec![vertex(0)];
        for k in 0..segs {
            let (p0, p1) = (vertex(k), vertex(k + 1));
            let len = (p1 - p0).hypot();
            let steps = ((len / spacing).ceil() as usize).max(8);
            for s in 1..=steps {
                let t = s as f64 / steps as f64;
                points.push(p0.lerp(p1, t));
            }
        }

        let mut arc = Vec::with_capacity(points.len());
        let mut acc = 0.0;
        arc.push(0.0);
        for w in points.windows(2) {
            acc += (w[1] - w[0]).hypot();
            arc.push(acc);
        }
        let total_arc = acc.max(f64::EPSILON);
        let area = canvas.width as f64 * canvas.height as f64;

        let mut samples: Vec<PathSample> = points
            .iter()
            .zip(&arc)
            .map(|(&pt, &s)| {
                let front = pt.to_vec2().dot(dir) - r;
                let swept = area_behind(&corners, dir, front) / area;
                PathSample {
                    point: pt,
                    key: (swept + ARC_WEIGHT * s / total_arc) / (1.0 + ARC_WEIGHT),
                }
            })
            .collect();
        if let Some(first) = samples.first_mut() {
            first.key = 0.0;
        }
        if let Some(last) = samples.last_mut() {
            last.key = 1.0;
        }

        Ok(Self {
            canvas,
            dir,
            brush_radius: r,
            samples,
        })
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn brush_radius(&self) -> f64 {
        self.brush_radius
    }

    /// Unit sweep direction.
    pub fn sweep_dir(&self) -> Vec2 {
        self.dir
    }

    pub fn samples(&self) -> &[PathSample] {
        &self.samples
    }

    /// Index `i` of the sample segment `[i, i + 1]` containing `p`, plus the fraction along it.
    fn locate(&self, p: f64) -> (usize, f64) {
        let p = p.clamp(0.0, 1.0);
        let last = self.samples.len() - 1;
        let hi = self.samples.partition_point(|s| s.key <= p);
        if hi == 0 {
            return (0, 0.0);
        }
        if hi > last {
            return (last.saturating_sub(1), 1.0);
        }
        let i = hi - 1;
        let (k0, k1) = (self.samples[i].key, self.samples[i + 1].key);
        (i, ((p - k0) / (k1 - k0)).clamp(0.0, 1.0))
    }

    /// Stroke position at progress `p`.
    pub fn point_at(&self, p: f64) -> Point {
        if self.samples.len() == 1 {
            return self.samples[0].point;
        }
        let (i, f) = self.locate(p);
        self.samples[i].point.lerp(self.samples[i + 1].point, f)
    }

    /// Unit direction of travel at progress `p`.
    pub fn tangent_at(&self, p: f64) -> Vec2 {
        if self.samples.len() < 2 {
            return self.dir;
        }
        let (i, _) = self.locate(p);
        let d = self.samples[i + 1].point - self.samples[i].point;
        let len = d.hypot();
        if len > 0.0 { d / len } else { self.dir }
    }

    /// Number of leading samples reached at progress `p`.
    pub fn reached(&self, p: f64) -> usize {
        self.samples.partition_point(|s| s.key <= p.clamp(0.0, 1.0))
    }

    /// Position of the covered half-plane boundary along the sweep axis at `p`.
    pub fn front_at(&self, p: f64) -> f64 {
        self.point_at(p).to_vec2().dot(self.dir) - self.brush_radius
    }

    /// Stroke pieces drawn by progress `p`: every fully reached sample segment, then the partial
    /// piece from the last reached sample to the current head.
    pub fn stroke_segments(&self, p: f64) -> impl Iterator<Item = (Point, Point)> + '_ {
        let reached = self.reached(p).max(1);
        let head = self.point_at(p);
        self.samples[..reached]
            .windows(2)
            .map(|w| (w[0].point, w[1].point))
            .chain(std::iter::once((self.samples[reached - 1].point, head)))
    }

    /// `true` if canvas point `(x, y)` is revealed at progress `p`.
    pub fn covers(&self, p: f64, x: f64, y: f64) -> bool {
        let q = Point::new(x, y);
        if q.to_vec2().dot(self.dir) <= self.front_at(p) {
            return true;
        }
        let r2 = self.brush_radius * self.brush_radius;
        self.stroke_segments(p)
            .any(|(a, b)| segment_dist2(q, a, b) <= r2)
    }

    /// Fraction of pixel centers on a `step`-spaced grid that are covered at `p`.
    pub fn coverage_fraction(&self, p: f64, step: u32) -> f64 {
        let step = step.max(1);
        let mut hit = 0u64;
        let mut total = 0u64;
        for y in (0..self.canvas.height).step_by(step as usize) {
            for x in (0..self.canvas.width).step_by(step as usize) {
                total += 1;
                if self.covers(p, f64::from(x) + 0.5, f64::from(y) + 0.5) {
                    hit += 1;
                }
            }
        }
        hit as f64 / total.max(1) as f64
    }
}

/// Squared distance from `q` to the segment `[a, b]`.
pub(crate) fn segment_dist2(q: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len2 = ab.hypot2();
    let t = if len2 > 0.0 {
        ((q - a).dot(ab) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (q - (a + ab * t)).hypot2()
}

fn canvas_corners(canvas: Canvas) -> [Vec2; 4] {
    let (w, h) = (f64::from(canvas.width), f64::from(canvas.height));
    [
        Vec2::new(0.0, 0.0),
        Vec2::new(w, 0.0),
        Vec2::new(w, h),
        Vec2::new(0.0, h),
    ]
}

fn project_range(corners: &[Vec2; 4], axis: Vec2) -> (f64, f64) {
    corners
        .iter()
        .map(|c| c.dot(axis))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        })
}

/// Area of the canvas rectangle on the `dot(q, dir) <= front` side.
fn area_behind(corners: &[Vec2; 4], dir: Vec2, front: f64) -> f64 {
    let mut clipped: Vec<Vec2> = Vec::with_capacity(8);
    for i in 0..corners.len() {
        let a = corners[i];
        let b = corners[(i + 1) % corners.len()];
        let (da, db) = (a.dot(dir) - front, b.dot(dir) - front);
        if da <= 0.0 {
            clipped.push(a);
        }
        if (da <= 0.0) != (db <= 0.0) {
            let t = da / (da - db);
            clipped.push(a + (b - a) * t);
        }
    }
    if clipped.len() < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for i in 0..clipped.len() {
        let a = clipped[i];
        let b = clipped[(i + 1) % clipped.len()];
        twice += a.x * b.y - b.x * a.y;
    }
    twice.abs() * 0.5
}

#[cfg(test)]
#[path = "../../tests/unit/reveal/path.rs"]
mod tests;
