use std::path::Path;
use std::sync::Arc;

use crate::captions::track::CaptionTrack;
use crate::config::CaptionStyle;
use crate::foundation::core::{Canvas, FrameRGBA};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::over_premul_opaque;

/// Average advance of one glyph relative to the font size, used for line wrapping.
const GLYPH_ADVANCE: f64 = 0.55;
const LINE_HEIGHT: f64 = 1.25;

/// One caption block rasterized as premultiplied RGBA, positioned at `top` on the canvas.
#[derive(Clone, Debug, PartialEq)]
struct CaptionRaster {
    top: u32,
    height: u32,
    data: Vec<u8>,
}

/// Renders caption text into frames at a fixed screen position.
///
/// Rasters are cached per visible text; consecutive frames showing the same text reuse the
/// previous raster.
pub struct CaptionOverlay {
    canvas: Canvas,
    style: CaptionStyle,
    font_size: f64,
    opts: usvg::Options<'static>,
    cached: Option<(String, Option<CaptionRaster>)>,
}

impl std::fmt::Debug for CaptionOverlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptionOverlay")
            .field("canvas", &self.canvas)
            .field("font_size", &self.font_size)
            .finish_non_exhaustive()
    }
}

impl CaptionOverlay {
    pub fn new(canvas: Canvas, style: &CaptionStyle) -> Self {
        let fontdb = build_caption_fontdb(style.font_dir.as_deref());
        let opts = usvg::Options {
            fontdb,
            font_resolver: caption_font_resolver(),
            ..Default::default()
        };
        Self {
            canvas,
            style: style.clone(),
            font_size: (f64::from(canvas.height) * style.font_size_ratio).max(8.0),
            opts,
            cached: None,
        }
    }

    /// Burn the caption visible at absolute time `t` into `frame`.
    #[tracing::instrument(level = "trace", skip(self, frame, track))]
    pub fn apply(&mut self, frame: &mut FrameRGBA, track: &CaptionTrack, t: f64) -> ReelResult<()> {
        if frame.canvas() != self.canvas {
            return Err(ReelError::render(format!(
                "caption frame is {}x{}, overlay expects {}x{}",
                frame.width, frame.height, self.canvas.width, self.canvas.height
            )));
        }
        let text = track.visible_text(t, self.style.mode);
        if text.trim().is_empty() {
            return Ok(());
        }
        let hit = matches!(&self.cached, Some((cached, _)) if cached == text);
        if !hit {
            let raster = self.rasterize(text, track)?;
            self.cached = Some((text.to_string(), raster));
        }
        if let Some((_, Some(raster))) = &self.cached {
            blend_raster(frame, raster);
        }
        Ok(())
    }

    /// Wrap `text` to the usable width and keep the last `max_lines` lines.
    pub fn layout_lines(&self, text: &str) -> Vec<String> {
        let usable = f64::from(self.canvas.width) * self.style.max_width_ratio;
        let max_chars = ((usable / (self.font_size * GLYPH_ADVANCE)).floor() as usize).max(1);

        let mut lines: Vec<String> = Vec::new();
        let mut line = String::new();
        for word in text.split_whitespace() {
            let line_len = line.chars().count();
            let word_len = word.chars().count();
            if line_len > 0 && line_len + 1 + word_len > max_chars {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        if !line.is_empty() {
            lines.push(line);
        }
        let keep = self.style.max_lines.max(1);
        if lines.len() > keep {
            lines.drain(..lines.len() - keep);
        }
        lines
    }

    /// SVG document for one caption block of `lines`.
    pub fn build_svg(&self, lines: &[String], track: &CaptionTrack) -> String {
        let w = self.canvas.width;
        let h = self.block_height(lines.len());
        let fs = self.font_size;
        let stroke_w = (fs * 0.08).max(1.0);
        let cx = f64::from(w) * 0.5;

        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
        );
        for (i, line) in lines.iter().enumerate() {
            let baseline = fs * (1.0 + LINE_HEIGHT * i as f64);
            svg.push_str(&format!(
                r#"<text x="{cx:.1}" y="{baseline:.1}" text-anchor="middle" font-family="{}" font-size="{fs:.1}" font-weight="bold" fill="{}" stroke="{}" stroke-width="{stroke_w:.2}" paint-order="stroke">"#,
                escape_xml(&self.style.font_family),
                escape_xml(&self.style.color),
                escape_xml(&self.style.stroke_color),
            ));
            let highlight = track
                .highlight_color()
                .unwrap_or(&self.style.highlight_color);
            for (j, word) in line.split(' ').enumerate() {
                let sep = if j == 0 { "" } else { " " };
                if track.is_highlighted(word) {
                    svg.push_str(&format!(
                        r#"{sep}<tspan fill="{}">{}</tspan>"#,
                        escape_xml(highlight),
                        escape_xml(word)
                    ));
                } else {
                    svg.push_str(sep);
                    svg.push_str(&escape_xml(word));
                }
            }
            svg.push_str("</text>");
        }
        svg.push_str("</svg>");
        svg
    }

    fn block_height(&self, lines: usize) -> u32 {
        let lines = lines.max(1) as f64;
        let h = self.font_size * (LINE_HEIGHT * (lines - 1.0) + 1.0) + self.font_size * 0.5;
        (h.ceil() as u32).clamp(1, self.canvas.height)
    }

    fn rasterize(&self, text: &str, track: &CaptionTrack) -> ReelResult<Option<CaptionRaster>> {
        let lines = self.layout_lines(text);
        if lines.is_empty() {
            return Ok(None);
        }
        let svg = self.build_svg(&lines, track);
        let tree = usvg::Tree::from_str(&svg, &self.opts)
            .map_err(|e| ReelError::render(format!("caption svg: {e}")))?;

        let height = self.block_height(lines.len());
        let mut pixmap = resvg::tiny_skia::Pixmap::new(self.canvas.width, height)
            .ok_or_else(|| ReelError::render("failed to allocate caption pixmap"))?;
        resvg::render(&tree, resvg::tiny_skia::Transform::identity(), &mut pixmap.as_mut());

        let center = f64::from(self.canvas.height) * self.style.y_ratio;
        let top = (center - f64::from(height) * 0.5)
            .round()
            .clamp(0.0, f64::from(self.canvas.height - height)) as u32;
        Ok(Some(CaptionRaster {
            top,
            height,
            data: pixmap.data().to_vec(),
        }))
    }
}

fn blend_raster(frame: &mut FrameRGBA, raster: &CaptionRaster) {
    let row_bytes = frame.width as usize * 4;
    let start = raster.top as usize * row_bytes;
    let end = start + raster.height as usize * row_bytes;
    for (d, s) in frame.data[start..end]
        .chunks_exact_mut(4)
        .zip(raster.data.chunks_exact(4))
    {
        let out = over_premul_opaque([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&out);
    }
}

pub(crate) fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn build_caption_fontdb(extra_dir: Option<&Path>) -> Arc<usvg::fontdb::Database> {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    if let Some(dir) = extra_dir {
        load_fonts_from_dir(&mut db, dir);
    }
    Arc::new(db)
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        tracing::warn!(dir = %dir.display(), "caption font directory is not readable");
        return;
    };
    for entry in rd.flatten() {
        let path = entry.path();
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if path.is_file() && matches!(ext.as_str(), "ttf" | "otf" | "ttc") {
            let _ = db.load_font_file(&path);
        }
    }
}

/// Generic families first, then any face at all, so captions render on minimal systems.
fn caption_font_resolver() -> usvg::FontResolver<'static> {
    use usvg::FontResolver;

    FontResolver {
        select_font: Box::new(|font, fontdb| {
            let mut families = Vec::<usvg::fontdb::Family<'_>>::new();
            for family in font.families() {
                families.push(match family {
                    usvg::FontFamily::Serif => usvg::fontdb::Family::Serif,
                    usvg::FontFamily::SansSerif => usvg::fontdb::Family::SansSerif,
                    usvg::FontFamily::Cursive => usvg::fontdb::Family::Cursive,
                    usvg::FontFamily::Fantasy => usvg::fontdb::Family::Fantasy,
                    usvg::FontFamily::Monospace => usvg::fontdb::Family::Monospace,
                    usvg::FontFamily::Named(s) => usvg::fontdb::Family::Name(s),
                });
            }
            families.push(usvg::fontdb::Family::SansSerif);

            let query = usvg::fontdb::Query {
                families: &families,
                weight: usvg::fontdb::Weight(font.weight()),
                ..Default::default()
            };
            if let Some(id) = fontdb.query(&query) {
                return Some(id);
            }
            fontdb.faces().next().map(|f| f.id)
        }),
        select_fallback: FontResolver::default_fallback_selector(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/captions/overlay.rs"]
mod tests;
