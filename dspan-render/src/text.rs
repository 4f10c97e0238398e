use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use ab_glyph::{Font, FontVec, Glyph, PxScale, ScaleFont, point};
use anyhow::{Context, Result, anyhow};
use tiny_skia::{Pixmap, PremultipliedColorU8};

pub fn load_font(path: &Path) -> Result<FontVec> {
    let bytes = std::fs::read(path).with_context(|| format!("reading font {}", path.display()))?;
    FontVec::try_from_vec(bytes).map_err(|e| anyhow!("parsing font {}: {e}", path.display()))
}

/// Rasterised labels keyed by text, pixel size and colour.
pub struct TextCache {
    font: FontVec,
    map: HashMap<(String, u32, [u8; 4]), Arc<Pixmap>>,
}

impl TextCache {
    pub fn new(font: FontVec) -> Self {
        Self {
            font,
            map: HashMap::new(),
        }
    }

    pub fn get_or_render(&mut self, text: &str, size_px: f32, color: [u8; 4]) -> Option<Arc<Pixmap>> {
        let key = (text.to_owned(), size_px.round() as u32, color);
        if let Some(p) = self.map.get(&key) {
            return Some(Arc::clone(p));
        }
        let pm = Arc::new(render_text_pixmap(text, size_px, &self.font, color)?);
        self.map.insert(key, Arc::clone(&pm));
        Some(pm)
    }

    /// Renders without caching, for text that changes keystroke by keystroke.
    pub fn render_uncached(&self, text: &str, size_px: f32, color: [u8; 4]) -> Option<Pixmap> {
        render_text_pixmap(text, size_px, &self.font, color)
    }

    /// Advance width of `text` laid out on one line.
    pub fn measure(&self, text: &str, size_px: f32) -> f32 {
        let sf = self.font.as_scaled(PxScale::from(size_px));
        let mut width = 0.0;
        let mut prev = None;
        for ch in text.chars() {
            let id = self.font.glyph_id(ch);
            if let Some(p) = prev {
                width += sf.kern(p, id);
            }
            width += sf.h_advance(id);
            prev = Some(id);
        }
        width
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Renders one line of text into a tight transparent pixmap. Returns `None`
/// for text without visible glyphs.
pub fn render_text_pixmap(
    text: &str,
    font_size: f32,
    font: &FontVec,
    color: [u8; 4],
) -> Option<Pixmap> {
    let scale = PxScale::from(font_size);
    let sf = font.as_scaled(scale);

    // Lay out on a baseline at the ascent.
    let mut pen_x = 0.0f32;
    let mut glyphs = Vec::<Glyph>::new();
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = glyphs.last() {
            pen_x += sf.kern(prev.id, id);
        }
        glyphs.push(Glyph {
            id,
            scale,
            position: point(pen_x, sf.ascent()),
        });
        pen_x += sf.h_advance(id);
    }

    let outlines: Vec<_> = glyphs
        .into_iter()
        .filter_map(|g| font.outline_glyph(g))
        .collect();
    if outlines.is_empty() {
        return None;
    }

    let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
    let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
    for out in &outlines {
        let b = out.px_bounds();
        min_x = min_x.min(b.min.x);
        min_y = min_y.min(b.min.y);
        max_x = max_x.max(b.max.x);
        max_y = max_y.max(b.max.y);
    }

    let w = (max_x.ceil() - min_x.floor()).max(1.0) as u32;
    let h = (max_y.ceil() - min_y.floor()).max(1.0) as u32;
    let mut pm = Pixmap::new(w, h)?;
    let stride = pm.width() as usize;
    let dst = pm.pixels_mut();

    for out in &outlines {
        let b = out.px_bounds();
        out.draw(|x, y, cov| {
            if cov <= f32::EPSILON {
                return;
            }
            let ix = (x as f32 + b.min.x - min_x).floor() as i32;
            let iy = (y as f32 + b.min.y - min_y).floor() as i32;
            if ix < 0 || iy < 0 || ix >= w as i32 || iy >= h as i32 {
                return;
            }
            let i = iy as usize * stride + ix as usize;

            // Premultiplied source over the existing pixel.
            let a = (cov * color[3] as f32 / 255.0).clamp(0.0, 1.0);
            let sa = (a * 255.0) as u8;
            let inv = 1.0 - a;
            let bg = dst[i];
            let mix = |c: u8, b: u8| ((c as f32 * a) as u8).saturating_add((b as f32 * inv) as u8);
            let r = mix(color[0], bg.red());
            let g = mix(color[1], bg.green());
            let bl = mix(color[2], bg.blue());
            let al = sa.saturating_add((bg.alpha() as f32 * inv) as u8);
            if let Some(px) = PremultipliedColorU8::from_rgba(r.min(al), g.min(al), bl.min(al), al) {
                dst[i] = px;
            }
        });
    }

    Some(pm)
}
