use crate::foundation::core::Point;
use crate::reveal::path::{RevealPath, segment_dist2};

/// Accumulated reveal state for one scene: one byte per pixel, `255` once revealed.
///
/// Revealed pixels never re-hide. Progress only moves forward; asking for an earlier `p` is a
/// no-op.
#[derive(Clone, Debug)]
pub struct RevealMask {
    width: u32,
    height: u32,
    data: Vec<u8>,
    progress: f64,
    /// Full sample segments already stamped.
    stamped: usize,
    revealed: usize,
}

impl RevealMask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize],
            progress: 0.0,
            stamped: 0,
            revealed: 0,
        }
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Reveal everything `path` covers at `p`.
    pub fn advance_to(&mut self, path: &RevealPath, p: f64) {
        let p = p.clamp(0.0, 1.0);
        if p < self.progress {
            return;
        }
        self.progress = p;

        let r = path.brush_radius();
        let reached = path.reached(p).max(1);
        let samples = path.samples();
        let full_end = reached - 1;
        for j in self.stamped..full_end {
            self.stamp_segment(samples[j].point, samples[j + 1].point, r);
        }
        self.stamped = self.stamped.max(full_end);
        self.stamp_segment(samples[reached - 1].point, path.point_at(p), r);
        self.fill_behind(path, path.front_at(p));
    }

    fn stamp_segment(&mut self, a: Point, b: Point, r: f64) {
        let r2 = r * r;
        let (w, h) = (f64::from(self.width), f64::from(self.height));
        let x0 = (a.x.min(b.x) - r - 0.5).floor().clamp(0.0, w) as u32;
        let x1 = (a.x.max(b.x) + r + 0.5).ceil().clamp(0.0, w) as u32;
        let y0 = (a.y.min(b.y) - r - 0.5).floor().clamp(0.0, h) as u32;
        let y1 = (a.y.max(b.y) + r + 0.5).ceil().clamp(0.0, h) as u32;
        for y in y0..y1 {
            let row = y as usize * self.width as usize;
            for x in x0..x1 {
                let i = row + x as usize;
                if self.data[i] != 0 {
                    continue;
                }
                let q = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                if segment_dist2(q, a, b) <= r2 {
                    self.data[i] = 255;
                    self.revealed += 1;
                }
            }
        }
    }

    fn fill_behind(&mut self, path: &RevealPath, front: f64) {
        let dir = path.sweep_dir();
        for y in 0..self.height {
            let cy = f64::from(y) + 0.5;
            let row = y as usize * self.width as usize;
            for x in 0..self.width {
                let i = row + x as usize;
                if self.data[i] == 0 && (f64::from(x) + 0.5) * dir.x + cy * dir.y <= front {
                    self.data[i] = 255;
                    self.revealed += 1;
                }
            }
        }
    }

    pub fn revealed(&self, x: u32, y: u32) -> bool {
        self.data[y as usize * self.width as usize + x as usize] != 0
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed
    }

    pub fn is_complete(&self) -> bool {
        self.revealed == self.data.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
#[path = "../../tests/unit/reveal/mask.rs"]
mod tests;
