//! Off-screen render targets with a single texture attachment.

use glow::{HasContext, PixelUnpackData};

use crate::error::ResourceError;
use crate::render::{gl_size, Renderer};
use crate::texture::{apply_params, Texture};
use crate::types::TextureParams;

/// What the framebuffer's one attachment stores.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum FramebufferKind {
    /// RGBA8 color.
    #[default]
    Color,
    /// Depth values.
    Depth,
    /// 8-bit stencil.
    Stencil,
}

/// GL enums describing one attachment.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AttachmentFormat {
    /// Internal format of the attachment texture.
    pub internal_format: u32,
    /// Pixel format of the attachment texture.
    pub format: u32,
    /// Attachment point on the framebuffer.
    pub attachment: u32,
}

impl FramebufferKind {
    /// Texture formats and attachment point for this kind.
    #[must_use]
    pub fn attachment(self) -> AttachmentFormat {
        let (internal_format, format, attachment) = match self {
            Self::Color => (glow::RGBA8, glow::RGBA, glow::COLOR_ATTACHMENT0),
            Self::Depth => (
                glow::DEPTH_COMPONENT,
                glow::DEPTH_COMPONENT,
                glow::DEPTH_ATTACHMENT,
            ),
            Self::Stencil => (
                glow::STENCIL_INDEX8,
                glow::STENCIL_INDEX,
                glow::STENCIL_ATTACHMENT,
            ),
        };
        AttachmentFormat {
            internal_format,
            format,
            attachment,
        }
    }

    fn channels(self) -> u32 {
        match self {
            Self::Color => 4,
            Self::Depth | Self::Stencil => 1,
        }
    }
}

/// A framebuffer object with exactly one texture attachment.
#[derive(Debug)]
pub struct Framebuffer {
    fbo: glow::Framebuffer,
    texture: Texture,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// What the attachment stores.
    pub kind: FramebufferKind,
}

impl Framebuffer {
    /// Create a framebuffer and its attachment texture.
    ///
    /// Leaves the default framebuffer bound on return, whether or not
    /// creation succeeded.
    ///
    /// # Safety
    ///
    /// Requires a valid, current OpenGL context.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidDimensions`] for a zero or oversized
    /// size, and [`ResourceError::IncompleteFramebuffer`] if the driver
    /// rejects the attachment. In the latter case the framebuffer and its
    /// texture are deleted before returning. Both are logged.
    pub unsafe fn create(
        gl: &glow::Context,
        width: u32,
        height: u32,
        params: TextureParams,
        kind: FramebufferKind,
    ) -> Result<Self, ResourceError> {
        validate_dimensions(width, height).inspect_err(|e| log::error!("{e}"))?;
        let format = kind.attachment();

        unsafe {
            let fbo = gl.create_framebuffer()?;
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fbo));

            let raw = match gl.create_texture() {
                Ok(raw) => raw,
                Err(e) => {
                    gl.bind_framebuffer(glow::FRAMEBUFFER, None);
                    gl.delete_framebuffer(fbo);
                    return Err(e.into());
                }
            };
            gl.bind_texture(glow::TEXTURE_2D, Some(raw));

            #[expect(clippy::cast_possible_wrap)]
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                format.internal_format as i32,
                gl_size(width),
                gl_size(height),
                0,
                format.format,
                glow::FLOAT,
                PixelUnpackData::Slice(None),
            );
            apply_params(gl, params);
            gl.bind_texture(glow::TEXTURE_2D, None);

            gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                format.attachment,
                glow::TEXTURE_2D,
                Some(raw),
                0,
            );

            let framebuffer = Self {
                fbo,
                texture: Texture::from_raw(raw, width, height, kind.channels(), params),
                width,
                height,
                kind,
            };

            let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);

            if let Err(err) = check_complete(status) {
                log::error!("{err}");
                framebuffer.delete(gl);
                return Err(err);
            }

            Ok(framebuffer)
        }
    }

    /// The GL framebuffer name.
    #[must_use]
    pub fn raw(&self) -> glow::Framebuffer {
        self.fbo
    }

    /// The attachment texture, for sampling after rendering.
    #[must_use]
    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    /// Render into this framebuffer and set the viewport to its size.
    ///
    /// # Safety
    ///
    /// Requires the context the framebuffer was created with to be current.
    pub unsafe fn bind(&self, gl: &glow::Context) {
        unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(self.fbo));
            gl.viewport(0, 0, gl_size(self.width), gl_size(self.height));
        }
    }

    /// Render into the window again, restoring the viewport to the window
    /// size last recorded by the renderer.
    ///
    /// # Safety
    ///
    /// Requires the renderer's context to be current.
    pub unsafe fn unbind(renderer: &Renderer) {
        let [width, height] = renderer.surface_size();
        let gl = renderer.gl();
        unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            gl.viewport(0, 0, gl_size(width), gl_size(height));
        }
    }

    /// Delete the framebuffer and its attachment texture.
    ///
    /// # Safety
    ///
    /// Requires the context the framebuffer was created with to be current.
    pub unsafe fn delete(mut self, gl: &glow::Context) {
        unsafe {
            gl.delete_framebuffer(self.fbo);
            self.texture.delete(gl);
        }
    }
}

fn validate_dimensions(width: u32, height: u32) -> Result<(), ResourceError> {
    if width == 0 || height == 0 || i32::try_from(width.max(height)).is_err() {
        return Err(ResourceError::InvalidDimensions { width, height });
    }
    Ok(())
}

/// Map a `glCheckFramebufferStatus` result to success or the error that
/// makes `create` delete what it built.
fn check_complete(status: u32) -> Result<(), ResourceError> {
    if status == glow::FRAMEBUFFER_COMPLETE {
        Ok(())
    } else {
        Err(ResourceError::IncompleteFramebuffer { status })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(FramebufferKind::Color, glow::RGBA8, glow::RGBA, glow::COLOR_ATTACHMENT0)]
    #[case(
        FramebufferKind::Depth,
        glow::DEPTH_COMPONENT,
        glow::DEPTH_COMPONENT,
        glow::DEPTH_ATTACHMENT
    )]
    #[case(
        FramebufferKind::Stencil,
        glow::STENCIL_INDEX8,
        glow::STENCIL_INDEX,
        glow::STENCIL_ATTACHMENT
    )]
    fn kind_selects_attachment_format(
        #[case] kind: FramebufferKind,
        #[case] internal_format: u32,
        #[case] format: u32,
        #[case] attachment: u32,
    ) {
        assert_eq!(
            kind.attachment(),
            AttachmentFormat {
                internal_format,
                format,
                attachment,
            }
        );
    }

    #[rstest]
    #[case(0, 0)]
    #[case(0, 256)]
    #[case(256, 0)]
    #[case(u32::MAX, 16)]
    fn unusable_sizes_are_rejected_before_any_gl_call(#[case] width: u32, #[case] height: u32) {
        assert!(matches!(
            validate_dimensions(width, height),
            Err(ResourceError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn ordinary_sizes_are_accepted() {
        validate_dimensions(1024, 768).unwrap();
        validate_dimensions(1, 1).unwrap();
    }

    #[test]
    fn complete_status_is_accepted() {
        check_complete(glow::FRAMEBUFFER_COMPLETE).unwrap();
    }

    #[rstest]
    #[case(glow::FRAMEBUFFER_INCOMPLETE_ATTACHMENT)]
    #[case(glow::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT)]
    #[case(glow::FRAMEBUFFER_UNSUPPORTED)]
    #[case(0)]
    fn incomplete_status_is_reported_with_its_code(#[case] status: u32) {
        let err = check_complete(status).unwrap_err();
        assert!(matches!(err, ResourceError::IncompleteFramebuffer { status: s } if s == status));
    }
}
