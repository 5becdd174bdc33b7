//! Widget geometry and hit-testing, independent of the GL context.
//!
//! All coordinates are UI space: pixels relative to the window center, +y
//! up. Widget rectangles extend `margin` past their position on the left
//! and bottom edges, which is where both the quads and the hit areas come
//! from.

use glam::{Vec2, Vec4};

use crate::font::GlyphAtlas;
use crate::types::Vertex;

use super::Anchor;

/// Index order for a quad built by [`rect_quad`]: two triangles.
pub const QUAD_INDICES: [u32; 6] = [0, 1, 3, 1, 2, 3];

/// Index order for a quad outline drawn as a line loop.
pub const OUTLINE_INDICES: [u32; 4] = [0, 1, 2, 3];

/// Extra hit area a slider has past its margin on every side.
pub const SLIDER_GRAB_PADDING: f32 = 5.0;

/// Shift `pos` left so an element of `size` sits on `anchor`.
#[must_use]
pub fn anchored(pos: Vec2, size: Vec2, anchor: Anchor) -> Vec2 {
    Vec2::new(pos.x - anchor.offset(size.x), pos.y)
}

/// Whether `cursor` is strictly inside the widget at `pos` (already
/// anchored) grown by `margin` on every side.
#[must_use]
pub fn hovering(cursor: Vec2, pos: Vec2, size: Vec2, margin: f32) -> bool {
    cursor.x > pos.x - margin
        && cursor.x < pos.x + margin + size.x
        && cursor.y > pos.y - margin
        && cursor.y < pos.y + margin + size.y
}

/// Result of one frame of slider interaction.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SliderUpdate {
    /// The slider's value, within `[min, max]` if it was dragged.
    pub value: f32,
    /// How much of the track is filled, in `[0, 1]`.
    pub fill: f32,
}

/// Compute a slider's value and fill fraction.
///
/// While `dragging`, the cursor's position along the track (which starts
/// `margin` left of `pos_x` and is `width + margin` long) sets the value,
/// clamped to `[min, max]`. Otherwise the value is kept and only the fill is
/// derived from it.
#[must_use]
#[allow(clippy::too_many_arguments, clippy::float_cmp)]
pub fn slider_update(
    value: f32,
    min: f32,
    max: f32,
    cursor_x: f32,
    pos_x: f32,
    width: f32,
    margin: f32,
    dragging: bool,
) -> SliderUpdate {
    let range = max - min;
    let mut fraction = if range == 0.0 { 0.0 } else { (value - min) / range };
    let mut value = value;
    if dragging {
        fraction = (cursor_x - (pos_x - margin)) / (width + margin);
        value = (min + fraction * range).clamp(min.min(max), min.max(max));
    }
    SliderUpdate {
        value,
        fill: fraction.clamp(0.0, 1.0),
    }
}

/// The four corners of a widget rectangle, starting top-left and going
/// counter-clockwise.
#[must_use]
pub fn rect_quad(pos: Vec2, size: Vec2, margin: f32, color: Vec4) -> [Vertex; 4] {
    let (left, bottom) = (pos.x - margin, pos.y - margin);
    let (right, top) = (pos.x + size.x, pos.y + size.y);
    [
        Vertex::colored(left, top, color),
        Vertex::colored(left, bottom, color),
        Vertex::colored(right, bottom, color),
        Vertex::colored(right, top, color),
    ]
}

/// The filled part of a slider track, `filled` units wide from its left
/// edge.
#[must_use]
pub fn fill_quad(pos: Vec2, size: Vec2, margin: f32, filled: f32, color: Vec4) -> [Vertex; 4] {
    let right = pos.x - margin + filled;
    let mut quad = rect_quad(pos, size, margin, color);
    quad[2].position[0] = right;
    quad[3].position[0] = right;
    quad
}

/// Where a widget's label goes, and how it is aligned there.
#[must_use]
pub fn label_origin(pos: Vec2, size: Vec2, anchor: Anchor) -> Vec2 {
    Vec2::new(pos.x + anchor.offset(size.x), pos.y)
}

/// Total advance of `text` at `scale`. Characters without a glyph entry
/// count as zero.
#[must_use]
pub fn text_width(atlas: &GlyphAtlas, text: &str, scale: f32) -> f32 {
    text.chars()
        .filter_map(|c| atlas.glyph(c))
        .map(|g| g.xadvance * scale)
        .sum()
}

/// Quads for every visible glyph of `text`, anchored at `pos`.
///
/// Spaces and zero-area glyphs only advance the pen. Characters outside the
/// glyph table are skipped without advancing.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn layout_text(
    atlas: &GlyphAtlas,
    text: &str,
    pos: Vec2,
    scale: f32,
    anchor: Anchor,
    color: Vec4,
) -> Vec<[Vertex; 4]> {
    let mut pen = Vec2::new(pos.x - anchor.offset(text_width(atlas, text, scale)), pos.y);
    let (atlas_w, atlas_h) = (atlas.width.max(1) as f32, atlas.height.max(1) as f32);

    let mut quads = Vec::with_capacity(text.len());
    for c in text.chars() {
        let Some(glyph) = atlas.glyph(c) else {
            continue;
        };
        let advance = glyph.xadvance * scale;
        let (gw, gh) = (glyph.width() as f32, glyph.height() as f32);
        let (w, h) = (gw * scale, gh * scale);
        if c == ' ' || w <= 0.0 || h <= 0.0 {
            pen.x += advance;
            continue;
        }

        let x = pen.x + glyph.xoff * scale;
        let y = pen.y - (glyph.yoff + gh) * scale;
        let (u0, v0) = (glyph.x0 as f32 / atlas_w, glyph.y0 as f32 / atlas_h);
        let (u1, v1) = (glyph.x1 as f32 / atlas_w, glyph.y1 as f32 / atlas_h);

        let corner = |px: f32, py: f32, u: f32, v: f32| Vertex {
            position: [px, py, 0.0],
            uv: [u, v],
            color: color.to_array(),
            normal: [0.0; 3],
        };
        quads.push([
            corner(x, y + h, u0, v0),
            corner(x, y, u0, v1),
            corner(x + w, y, u1, v1),
            corner(x + w, y + h, u1, v0),
        ]);
        pen.x += advance;
    }
    quads
}
