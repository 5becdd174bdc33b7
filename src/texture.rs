//! 2D textures.

use glow::{HasContext, PixelUnpackData};
use std::path::Path;

use crate::error::ResourceError;
use crate::import::ImageDecoder;
use crate::render::gl_size;
use crate::types::TextureParams;

/// GL pixel format chosen from a channel count.
///
/// 1, 2, 3 and 4 channels map to red, red-green, RGB and RGBA. Every other
/// count falls back to RGBA.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// One channel.
    Red,
    /// Two channels.
    RedGreen,
    /// Three channels.
    Rgb,
    /// Four channels.
    Rgba,
}

impl PixelFormat {
    /// Pick the format for `channels` components per pixel.
    #[must_use]
    pub fn from_channels(channels: u32) -> Self {
        match channels {
            1 => Self::Red,
            2 => Self::RedGreen,
            3 => Self::Rgb,
            _ => Self::Rgba,
        }
    }

    /// The GL enum, used for both the internal and the client format.
    #[must_use]
    pub fn gl(self) -> u32 {
        match self {
            Self::Red => glow::RED,
            Self::RedGreen => glow::RG,
            Self::Rgb => glow::RGB,
            Self::Rgba => glow::RGBA,
        }
    }

    /// Bytes per pixel for 8-bit components.
    #[must_use]
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Red => 1,
            Self::RedGreen => 2,
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }
}

/// A GPU texture and the parameters it was created with.
///
/// Values are only handed out by successful [`create`](Self::create) or
/// [`load`](Self::load) calls. [`delete`](Self::delete) resets the value, so
/// deleting twice is a no-op.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Texture {
    raw: Option<glow::Texture>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Bytes per pixel the texture was created with.
    pub channels: u32,
    /// Sampling parameters applied at creation.
    pub params: TextureParams,
}

impl Texture {
    /// Upload `pixels` as a new 2D texture.
    ///
    /// Leaves no texture bound on return.
    ///
    /// # Safety
    ///
    /// Requires a valid, current OpenGL context.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::MissingPixels`] when `pixels` is `None`,
    /// [`ResourceError::PixelDataTooShort`] or
    /// [`ResourceError::InvalidDimensions`] for malformed input, and
    /// [`ResourceError::Gl`] if the driver refuses the texture. Input errors
    /// are logged as warnings.
    pub unsafe fn create(
        gl: &glow::Context,
        pixels: Option<&[u8]>,
        width: u32,
        height: u32,
        channels: u32,
        params: TextureParams,
    ) -> Result<Self, ResourceError> {
        let format = PixelFormat::from_channels(channels);
        let pixels = validate_pixels(pixels, width, height, format).inspect_err(|e| {
            log::warn!("{e}");
        })?;

        let raw = unsafe {
            let raw = gl.create_texture()?;
            gl.bind_texture(glow::TEXTURE_2D, Some(raw));
            set_unpack_alignment(gl, UPLOAD_ALIGNMENT);

            #[expect(clippy::cast_possible_wrap)]
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                format.gl() as i32,
                gl_size(width),
                gl_size(height),
                0,
                format.gl(),
                glow::UNSIGNED_BYTE,
                PixelUnpackData::Slice(Some(pixels)),
            );
            set_unpack_alignment(gl, DEFAULT_ALIGNMENT);

            apply_params(gl, params);
            if params.generate_mipmaps {
                gl.generate_mipmap(glow::TEXTURE_2D);
            }

            gl.bind_texture(glow::TEXTURE_2D, None);
            raw
        };

        Ok(Self {
            raw: Some(raw),
            width,
            height,
            channels,
            params,
        })
    }

    /// Decode an image file and upload it.
    ///
    /// Images are flipped vertically on decode, since texture coordinates
    /// start at the bottom-left.
    ///
    /// # Safety
    ///
    /// Requires a valid, current OpenGL context.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Decode`] if the decoder fails (logged as a
    /// warning), or any error from [`create`](Self::create).
    pub unsafe fn load(
        gl: &glow::Context,
        decoder: &dyn ImageDecoder,
        path: &Path,
        params: TextureParams,
    ) -> Result<Self, ResourceError> {
        let image = decoder.decode(path, true).map_err(|source| {
            log::warn!("Failed to load texture\nPath: {}: {source}", path.display());
            ResourceError::Decode {
                path: path.to_path_buf(),
                source,
            }
        })?;

        unsafe {
            Self::create(
                gl,
                Some(&image.pixels),
                image.width,
                image.height,
                image.channels,
                params,
            )
        }
    }

    /// Wrap a texture object created elsewhere (e.g. a framebuffer
    /// attachment).
    pub(crate) fn from_raw(
        raw: glow::Texture,
        width: u32,
        height: u32,
        channels: u32,
        params: TextureParams,
    ) -> Self {
        Self {
            raw: Some(raw),
            width,
            height,
            channels,
            params,
        }
    }

    /// The GL texture name, or `None` after [`delete`](Self::delete).
    #[must_use]
    pub fn raw(&self) -> Option<glow::Texture> {
        self.raw
    }

    /// Whether this texture still owns a GL object.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.raw.is_some()
    }

    /// Release the GL object and reset this value.
    ///
    /// # Safety
    ///
    /// Requires the context the texture was created with to be current.
    pub unsafe fn delete(&mut self, gl: &glow::Context) {
        if let Some(raw) = self.raw.take() {
            unsafe { gl.delete_texture(raw) };
            *self = Self::default();
        }
    }

    /// Bind this texture to texture unit `slot`.
    ///
    /// # Safety
    ///
    /// Requires the context the texture was created with to be current.
    /// `slot` must be below the driver's texture unit limit.
    pub unsafe fn bind(&self, gl: &glow::Context, slot: u32) {
        unsafe {
            gl.active_texture(glow::TEXTURE0 + slot);
            gl.bind_texture(glow::TEXTURE_2D, self.raw);
        }
    }

    /// Unbind whatever texture is bound to unit `slot`.
    ///
    /// # Safety
    ///
    /// Requires a valid, current OpenGL context.
    pub unsafe fn unbind(gl: &glow::Context, slot: u32) {
        unsafe {
            gl.active_texture(glow::TEXTURE0 + slot);
            gl.bind_texture(glow::TEXTURE_2D, None);
        }
    }
}

/// Row alignment used for uploads. Decoded images have tightly packed rows.
const UPLOAD_ALIGNMENT: u32 = 1;

/// GL's initial unpack alignment, restored after every upload.
const DEFAULT_ALIGNMENT: u32 = 4;

/// Bytes GL reads for a `width` x `height` image whose rows start on
/// `alignment`-byte boundaries. The last row is not padded.
fn unpack_len(width: u32, height: u32, format: PixelFormat, alignment: u32) -> usize {
    if width == 0 || height == 0 {
        return 0;
    }
    let row = width as usize * format.bytes_per_pixel();
    let pitch = row.next_multiple_of(alignment.max(1) as usize);
    pitch * (height as usize - 1) + row
}

/// Set the row alignment GL assumes when reading client pixel data.
///
/// [`Texture::create`] switches to tightly packed rows for its own upload
/// and restores the default of 4 afterwards.
///
/// # Safety
///
/// Requires a valid, current OpenGL context.
pub unsafe fn set_unpack_alignment(gl: &glow::Context, alignment: u32) {
    unsafe { gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, gl_size(alignment)) };
}

/// Apply filter and wrap parameters to the texture bound at `TEXTURE_2D`.
// GL constant values are small enough that the cast is always safe.
#[expect(clippy::cast_possible_wrap)]
pub(crate) unsafe fn apply_params(gl: &glow::Context, params: TextureParams) {
    unsafe {
        gl.tex_parameter_i32(
            glow::TEXTURE_2D,
            glow::TEXTURE_MIN_FILTER,
            params.min_filter.gl() as i32,
        );
        gl.tex_parameter_i32(
            glow::TEXTURE_2D,
            glow::TEXTURE_MAG_FILTER,
            params.mag_filter.gl() as i32,
        );
        gl.tex_parameter_i32(
            glow::TEXTURE_2D,
            glow::TEXTURE_WRAP_S,
            params.wrap_s.gl() as i32,
        );
        gl.tex_parameter_i32(
            glow::TEXTURE_2D,
            glow::TEXTURE_WRAP_T,
            params.wrap_t.gl() as i32,
        );
    }
}

/// Check pixel data against the requested size before any GL call.
fn validate_pixels(
    pixels: Option<&[u8]>,
    width: u32,
    height: u32,
    format: PixelFormat,
) -> Result<&[u8], ResourceError> {
    let pixels = pixels.ok_or(ResourceError::MissingPixels)?;
    if width == 0 || height == 0 || i32::try_from(width.max(height)).is_err() {
        return Err(ResourceError::InvalidDimensions { width, height });
    }
    let expected = unpack_len(width, height, format, UPLOAD_ALIGNMENT);
    if pixels.len() < expected {
        return Err(ResourceError::PixelDataTooShort {
            expected,
            actual: pixels.len(),
        });
    }
    Ok(pixels)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, glow::RED)]
    #[case(2, glow::RG)]
    #[case(3, glow::RGB)]
    #[case(4, glow::RGBA)]
    #[case(0, glow::RGBA)]
    #[case(5, glow::RGBA)]
    fn channel_count_selects_format(#[case] channels: u32, #[case] expected: u32) {
        assert_eq!(PixelFormat::from_channels(channels).gl(), expected);
    }

    #[test]
    fn five_channels_behave_like_four() {
        assert_eq!(PixelFormat::from_channels(5), PixelFormat::from_channels(4));
        assert_eq!(PixelFormat::from_channels(5).bytes_per_pixel(), 4);
    }

    #[test]
    fn missing_pixels_are_rejected() {
        assert!(matches!(
            validate_pixels(None, 1, 1, PixelFormat::Rgba),
            Err(ResourceError::MissingPixels)
        ));
    }

    #[test]
    fn short_pixel_data_is_rejected() {
        let data = [0u8; 11];
        assert!(matches!(
            validate_pixels(Some(&data), 2, 2, PixelFormat::Rgb),
            Err(ResourceError::PixelDataTooShort {
                expected: 12,
                actual: 11,
            })
        ));
        assert!(validate_pixels(Some(&data), 2, 2, PixelFormat::RedGreen).is_ok());
    }

    #[rstest]
    #[case(3, 3, PixelFormat::Rgb, 4, 33)]
    #[case(3, 3, PixelFormat::Rgb, 1, 27)]
    #[case(5, 2, PixelFormat::Red, 4, 13)]
    #[case(4, 4, PixelFormat::Rgba, 4, 64)]
    #[case(0, 4, PixelFormat::Rgba, 4, 0)]
    fn unpack_len_follows_row_alignment(
        #[case] width: u32,
        #[case] height: u32,
        #[case] format: PixelFormat,
        #[case] alignment: u32,
        #[case] expected: usize,
    ) {
        assert_eq!(unpack_len(width, height, format, alignment), expected);
    }

    #[test]
    fn odd_width_rgb_upload_stays_inside_the_buffer() {
        // A decoded 3x3 RGB image is 27 tightly packed bytes.
        let data = [0u8; 27];
        let accepted = validate_pixels(Some(&data), 3, 3, PixelFormat::Rgb).unwrap();
        assert!(unpack_len(3, 3, PixelFormat::Rgb, UPLOAD_ALIGNMENT) <= accepted.len());
        assert!(matches!(
            validate_pixels(Some(&data[..26]), 3, 3, PixelFormat::Rgb),
            Err(ResourceError::PixelDataTooShort {
                expected: 27,
                actual: 26,
            })
        ));
    }

    #[test]
    fn zero_sized_texture_is_rejected() {
        assert!(matches!(
            validate_pixels(Some(&[]), 0, 4, PixelFormat::Red),
            Err(ResourceError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn default_texture_is_invalid() {
        let texture = Texture::default();
        assert!(!texture.is_valid());
        assert_eq!(texture.raw(), None);
    }
}
