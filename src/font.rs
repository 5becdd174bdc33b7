//! Bitmap fonts: a single-channel glyph atlas plus per-glyph metrics.
//!
//! Rasterization is delegated to a [`GlyphAtlasProvider`]. The default
//! provider uses `fontdue` to render printable ASCII at a fixed pixel height
//! and packs the glyphs into rows.

use std::path::Path;

use fontdue::FontSettings;

use crate::error::ResourceError;
use crate::fs;
use crate::texture::Texture;
use crate::types::TextureParams;

/// Number of entries in a glyph table. The table is indexed by ASCII code.
pub const GLYPH_TABLE_SIZE: usize = 128;

/// First character code rasterized into an atlas.
pub const FIRST_GLYPH: u8 = 32;

/// Last character code rasterized into an atlas.
pub const LAST_GLYPH: u8 = 127;

/// Pixel height glyphs are rasterized at.
pub const PIXEL_HEIGHT: f32 = 24.0;

/// Where one glyph sits in the atlas and how to place it on a line.
///
/// Atlas coordinates are in pixels with `y` pointing down. `yoff` is the
/// distance from the baseline to the top of the glyph, also `y`-down, so it is
/// negative for glyphs that rise above the baseline.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct GlyphMetrics {
    /// Left edge in the atlas.
    pub x0: u32,
    /// Top edge in the atlas.
    pub y0: u32,
    /// Right edge in the atlas, exclusive.
    pub x1: u32,
    /// Bottom edge in the atlas, exclusive.
    pub y1: u32,
    /// Horizontal offset from the pen to the glyph's left edge.
    pub xoff: f32,
    /// Offset from the baseline to the glyph's top edge.
    pub yoff: f32,
    /// How far the pen moves after this glyph.
    pub xadvance: f32,
}

impl GlyphMetrics {
    /// Width in atlas pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }

    /// Height in atlas pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.y1.saturating_sub(self.y0)
    }
}

/// A rasterized glyph atlas: coverage bitmap and glyph table.
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphAtlas {
    /// Atlas width in pixels.
    pub width: u32,
    /// Atlas height in pixels.
    pub height: u32,
    /// One coverage byte per pixel, row by row. Emptied once uploaded.
    pub pixels: Vec<u8>,
    glyphs: [GlyphMetrics; GLYPH_TABLE_SIZE],
}

impl GlyphAtlas {
    /// A blank atlas with an all-zero glyph table.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
            glyphs: [GlyphMetrics::default(); GLYPH_TABLE_SIZE],
        }
    }

    /// Metrics for `c`, or `None` if `c` is outside the table.
    #[must_use]
    pub fn glyph(&self, c: char) -> Option<&GlyphMetrics> {
        self.glyphs.get(usize::try_from(u32::from(c)).ok()?)
    }

    /// Replace the metrics for ASCII `code`. Codes past the table are
    /// ignored.
    pub fn set_glyph(&mut self, code: u8, metrics: GlyphMetrics) {
        if let Some(slot) = self.glyphs.get_mut(usize::from(code)) {
            *slot = metrics;
        }
    }
}

/// Rasterizes a font file into a [`GlyphAtlas`].
pub trait GlyphAtlasProvider {
    /// Render glyphs [`FIRST_GLYPH`]`..=`[`LAST_GLYPH`] of `font_data` into
    /// an atlas of `width` x `height` pixels.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Font`] if the data is not a usable font or
    /// the glyphs do not fit.
    fn rasterize(&self, font_data: &[u8], width: u32, height: u32)
        -> Result<GlyphAtlas, ResourceError>;
}

/// [`GlyphAtlasProvider`] built on `fontdue`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FontdueAtlasProvider {
    /// Rasterization size in pixels.
    pub pixel_height: f32,
    /// Empty pixels kept around every glyph.
    pub padding: u32,
}

impl Default for FontdueAtlasProvider {
    fn default() -> Self {
        Self {
            pixel_height: PIXEL_HEIGHT,
            padding: 1,
        }
    }
}

impl GlyphAtlasProvider for FontdueAtlasProvider {
    fn rasterize(
        &self,
        font_data: &[u8],
        width: u32,
        height: u32,
    ) -> Result<GlyphAtlas, ResourceError> {
        let font = fontdue::Font::from_bytes(font_data, FontSettings::default())
            .map_err(|e| ResourceError::Font(e.to_string()))?;

        let rendered: Vec<_> = (FIRST_GLYPH..=LAST_GLYPH)
            .map(|code| (code, font.rasterize(char::from(code), self.pixel_height)))
            .collect();

        let sizes: Vec<[u32; 2]> = rendered
            .iter()
            .map(|(_, (metrics, _))| {
                [
                    u32::try_from(metrics.width).unwrap_or(u32::MAX),
                    u32::try_from(metrics.height).unwrap_or(u32::MAX),
                ]
            })
            .collect();
        let origins = pack_rows(&sizes, width, height, self.padding).ok_or_else(|| {
            ResourceError::Font(format!(
                "glyphs at {}px do not fit a {width}x{height} atlas",
                self.pixel_height
            ))
        })?;

        let mut atlas = GlyphAtlas::new(width, height);
        for (((code, (metrics, bitmap)), [w, h]), [x, y]) in
            rendered.iter().zip(&sizes).zip(&origins)
        {
            blit(&mut atlas, bitmap, [*x, *y], *w);
            #[allow(clippy::cast_precision_loss)]
            atlas.set_glyph(
                *code,
                GlyphMetrics {
                    x0: *x,
                    y0: *y,
                    x1: x + w,
                    y1: y + h,
                    xoff: metrics.xmin as f32,
                    yoff: -(metrics.ymin as f32 + *h as f32),
                    xadvance: metrics.advance_width,
                },
            );
        }
        Ok(atlas)
    }
}

/// Place rectangles left to right in rows, starting a new row when the
/// current one is full. Returns the top-left corner of each rectangle, or
/// `None` if they run out of vertical space.
pub(crate) fn pack_rows(
    sizes: &[[u32; 2]],
    width: u32,
    height: u32,
    padding: u32,
) -> Option<Vec<[u32; 2]>> {
    let mut origins = Vec::with_capacity(sizes.len());
    let (mut x, mut y, mut row_height) = (padding, padding, 0);
    for &[w, h] in sizes {
        if x + w + padding > width {
            x = padding;
            y += row_height + padding;
            row_height = 0;
        }
        if x + w + padding > width || y + h + padding > height {
            return None;
        }
        origins.push([x, y]);
        x += w + padding;
        row_height = row_height.max(h);
    }
    Some(origins)
}

fn blit(atlas: &mut GlyphAtlas, bitmap: &[u8], [x, y]: [u32; 2], width: u32) {
    if width == 0 {
        return;
    }
    let stride = atlas.width as usize;
    for (row, src) in bitmap.chunks_exact(width as usize).enumerate() {
        let start = (y as usize + row) * stride + x as usize;
        atlas.pixels[start..start + src.len()].copy_from_slice(src);
    }
}

/// Font files tried by [`Font::load_default`], in order.
#[must_use]
pub fn default_font_paths() -> &'static [&'static str] {
    if cfg!(target_os = "windows") {
        &["C:/Windows/Fonts/Arialbd.ttf", "C:/Windows/Fonts/arial.ttf"]
    } else if cfg!(target_os = "macos") {
        &[
            "/System/Library/Fonts/Supplemental/Arial.ttf",
            "/Library/Fonts/Arial.ttf",
        ]
    } else {
        &[
            "/usr/share/fonts/Adwaita/AdwaitaSans-Regular.ttf",
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        ]
    }
}

/// A glyph atlas uploaded as a single-channel texture.
#[derive(Clone, Debug, PartialEq)]
pub struct Font {
    texture: Texture,
    atlas: GlyphAtlas,
}

impl Font {
    /// Rasterize `font_data` through `provider` and upload the atlas.
    ///
    /// # Safety
    ///
    /// Requires a valid, current OpenGL context.
    ///
    /// # Errors
    ///
    /// Returns the provider's error, or any error from
    /// [`Texture::create`].
    pub unsafe fn create(
        gl: &glow::Context,
        font_data: &[u8],
        width: u32,
        height: u32,
        params: TextureParams,
        provider: &dyn GlyphAtlasProvider,
    ) -> Result<Self, ResourceError> {
        let mut atlas = provider
            .rasterize(font_data, width, height)
            .inspect_err(|e| log::error!("Failed to create font info: {e}"))?;
        let pixels = std::mem::take(&mut atlas.pixels);

        let texture = unsafe { Texture::create(gl, Some(&pixels), width, height, 1, params)? };
        Ok(Self { texture, atlas })
    }

    /// Read a font file and [`create`](Self::create) a font from it.
    ///
    /// # Safety
    ///
    /// Requires a valid, current OpenGL context.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Io`] if the file cannot be read (logged), or
    /// any error from [`create`](Self::create).
    pub unsafe fn load(
        gl: &glow::Context,
        path: &Path,
        width: u32,
        height: u32,
        params: TextureParams,
        provider: &dyn GlyphAtlasProvider,
    ) -> Result<Self, ResourceError> {
        let data = fs::read_entire_bytes(path).map_err(|source| {
            log::error!("Failed to open font file\nPath: {}: {source}", path.display());
            ResourceError::Io {
                path: path.to_path_buf(),
                source,
            }
        })?;
        unsafe { Self::create(gl, &data, width, height, params, provider) }
    }

    /// Load the first usable font from [`default_font_paths`] into a
    /// 1024x1024 atlas.
    ///
    /// # Safety
    ///
    /// Requires a valid, current OpenGL context.
    ///
    /// # Errors
    ///
    /// Returns the error of the last path tried, or [`ResourceError::Font`]
    /// if there are no candidate paths.
    pub unsafe fn load_default(
        gl: &glow::Context,
        provider: &dyn GlyphAtlasProvider,
    ) -> Result<Self, ResourceError> {
        let mut last = ResourceError::Font("no default font paths for this platform".into());
        for path in default_font_paths() {
            match unsafe {
                Self::load(gl, Path::new(path), 1024, 1024, TextureParams::default(), provider)
            } {
                Ok(font) => {
                    log::debug!("loaded default font {path}");
                    return Ok(font);
                }
                Err(e) => last = e,
            }
        }
        Err(last)
    }

    /// The atlas texture.
    #[must_use]
    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    /// Glyph metrics and atlas size. The pixel data has been moved to the
    /// GPU, so `pixels` is empty.
    #[must_use]
    pub fn atlas(&self) -> &GlyphAtlas {
        &self.atlas
    }

    /// Delete the atlas texture.
    ///
    /// # Safety
    ///
    /// Requires the context the font was created with to be current.
    pub unsafe fn delete(&mut self, gl: &glow::Context) {
        unsafe { self.texture.delete(gl) };
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn glyph_table_is_indexed_by_ascii_code() {
        let mut atlas = GlyphAtlas::new(16, 16);
        let metrics = GlyphMetrics {
            x1: 4,
            y1: 6,
            xadvance: 5.0,
            ..GlyphMetrics::default()
        };
        atlas.set_glyph(b'A', metrics);
        assert_eq!(atlas.glyph('A'), Some(&metrics));
        assert_eq!(atlas.glyph('B'), Some(&GlyphMetrics::default()));
        assert_eq!(atlas.glyph('\u{e9}'), None);
        assert_eq!(atlas.pixels.len(), 256);
        assert_eq!((metrics.width(), metrics.height()), (4, 6));
    }

    #[test]
    fn rows_wrap_when_full() {
        let sizes = [[4, 2], [4, 3], [4, 1], [2, 2]];
        let origins = pack_rows(&sizes, 11, 20, 1).unwrap();
        assert_eq!(origins, [[1, 1], [6, 1], [1, 5], [6, 5]]);
    }

    #[test]
    fn packing_fails_when_out_of_space() {
        assert!(pack_rows(&[[8, 8], [8, 8]], 10, 10, 1).is_none());
        assert!(pack_rows(&[[12, 1]], 10, 10, 0).is_none());
        assert_eq!(pack_rows(&[], 1, 1, 0).unwrap(), Vec::<[u32; 2]>::new());
    }

    #[test]
    fn blit_copies_rows_at_origin() {
        let mut atlas = GlyphAtlas::new(4, 3);
        blit(&mut atlas, &[1, 2, 3, 4], [1, 1], 2);
        assert_eq!(atlas.pixels, [0, 0, 0, 0, 0, 1, 2, 0, 0, 3, 4, 0]);
    }

    #[test]
    fn invalid_font_data_is_rejected() {
        let err = FontdueAtlasProvider::default()
            .rasterize(b"definitely not a font", 64, 64)
            .unwrap_err();
        assert!(matches!(err, ResourceError::Font(_)));
    }

    #[test]
    fn default_paths_exist_for_this_platform() {
        assert!(!default_font_paths().is_empty());
    }
}
