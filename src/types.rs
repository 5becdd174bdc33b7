//! Plain data types shared by the rendering core.
//!
//! Nothing here touches the GL context; the GL-facing modules translate these
//! values into `glow` constants at the last moment.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3, Vec4};

/// The one vertex format every mesh uses.
///
/// Interleaved as position, texture coordinate, color, normal. The attribute
/// locations bound by [`Renderer`](crate::Renderer) follow the same order.
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Vertex {
    /// Model-space position.
    pub position: [f32; 3],
    /// Texture coordinate, origin at the bottom left.
    pub uv: [f32; 2],
    /// Linear RGBA.
    pub color: [f32; 4],
    /// Surface normal.
    pub normal: [f32; 3],
}

impl Vertex {
    /// Byte offset of [`uv`](Self::uv) inside the vertex.
    pub const UV_OFFSET: i32 = 12;
    /// Byte offset of [`color`](Self::color) inside the vertex.
    pub const COLOR_OFFSET: i32 = 20;
    /// Byte offset of [`normal`](Self::normal) inside the vertex.
    pub const NORMAL_OFFSET: i32 = 36;
    /// Size of one vertex in bytes.
    pub const STRIDE: i32 = 48;

    /// Build a vertex from `glam` vectors.
    #[must_use]
    pub fn new(position: Vec3, uv: Vec2, color: Vec4, normal: Vec3) -> Self {
        Self {
            position: position.to_array(),
            uv: uv.to_array(),
            color: color.to_array(),
            normal: normal.to_array(),
        }
    }

    /// A flat-colored vertex with no texture coordinate or normal, as used by
    /// the UI quads.
    #[must_use]
    pub fn colored(x: f32, y: f32, color: Vec4) -> Self {
        Self {
            position: [x, y, 0.0],
            color: color.to_array(),
            ..Self::default()
        }
    }
}

/// Primitive assembly rule for a mesh draw.
///
/// `None` is the default and resolves to triangles at draw time.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Topology {
    /// Unset. Drawn as triangles.
    #[default]
    None = 0,
    /// `GL_POINTS`.
    Points,
    /// `GL_LINES`.
    Lines,
    /// `GL_LINE_LOOP`.
    LineLoop,
    /// `GL_LINE_STRIP`.
    LineStrip,
    /// `GL_TRIANGLES`.
    Triangles,
    /// `GL_TRIANGLE_STRIP`.
    TriangleStrip,
    /// `GL_TRIANGLE_FAN`.
    TriangleFan,
}

impl Topology {
    /// The GL primitive mode for this topology.
    ///
    /// `None` maps to `TRIANGLES`; every other variant maps onto the GL enum
    /// by offset from `POINTS`, which lines up because both enumerations list
    /// the primitives in the same order.
    #[must_use]
    pub fn gl_mode(self) -> u32 {
        match self {
            Self::None => glow::TRIANGLES,
            mode => glow::POINTS + (mode as u32 - Self::Points as u32),
        }
    }
}

/// Texture sampling filter.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TextureFilter {
    /// Nearest texel.
    #[default]
    Nearest,
    /// Bilinear.
    Linear,
}

impl TextureFilter {
    pub(crate) fn gl(self) -> u32 {
        match self {
            Self::Nearest => glow::NEAREST,
            Self::Linear => glow::LINEAR,
        }
    }
}

/// Texture coordinate wrapping.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TextureWrap {
    /// Tile the texture.
    #[default]
    Repeat,
    /// Clamp to the edge texel.
    ClampToEdge,
    /// Tile, mirroring every other repeat.
    MirroredRepeat,
}

impl TextureWrap {
    pub(crate) fn gl(self) -> u32 {
        match self {
            Self::Repeat => glow::REPEAT,
            Self::ClampToEdge => glow::CLAMP_TO_EDGE,
            Self::MirroredRepeat => glow::MIRRORED_REPEAT,
        }
    }
}

/// Sampling parameters applied when a texture is created.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TextureParams {
    /// Filter when minified.
    pub min_filter: TextureFilter,
    /// Filter when magnified.
    pub mag_filter: TextureFilter,
    /// Horizontal wrap.
    pub wrap_s: TextureWrap,
    /// Vertical wrap.
    pub wrap_t: TextureWrap,
    /// Build a full mipmap chain after upload.
    pub generate_mipmaps: bool,
}

impl TextureParams {
    /// Linear filtering, clamped edges, no mipmaps.
    #[must_use]
    pub fn linear_clamped() -> Self {
        Self {
            min_filter: TextureFilter::Linear,
            mag_filter: TextureFilter::Linear,
            wrap_s: TextureWrap::ClampToEdge,
            wrap_t: TextureWrap::ClampToEdge,
            generate_mipmaps: false,
        }
    }
}

/// The four global rasterizer toggles.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderState {
    /// Depth testing.
    pub depth_testing: bool,
    /// Alpha blending.
    pub blending: bool,
    /// Back-face culling.
    pub face_culling: bool,
    /// Draw polygons as outlines.
    pub wireframe: bool,
}

impl RenderState {
    /// The fixed state the UI layer draws with.
    pub const UI: Self = Self {
        depth_testing: false,
        blending: true,
        face_culling: true,
        wireframe: false,
    };
}

/// Running draw totals, accumulated while a statistics sink is registered.
///
/// Vertex and index totals count each mesh's *allocated* capacity, not the
/// number of elements written before the draw.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderStatistics {
    /// Draw calls issued.
    pub draw_calls: u32,
    /// Summed vertex capacity of drawn meshes.
    pub vertices: u32,
    /// Summed index capacity of drawn meshes.
    pub indices: u32,
}

impl RenderStatistics {
    /// Account for one draw of `instances` copies of a mesh with the given
    /// capacities.
    pub fn record(&mut self, vertices: u32, indices: u32, instances: u32) {
        self.draw_calls = self.draw_calls.wrapping_add(1);
        self.vertices = self
            .vertices
            .wrapping_add(vertices.wrapping_mul(instances));
        self.indices = self.indices.wrapping_add(indices.wrapping_mul(instances));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn vertex_layout_matches_attribute_offsets() {
        assert_eq!(std::mem::size_of::<Vertex>(), Vertex::STRIDE as usize);
        assert_eq!(std::mem::offset_of!(Vertex, uv), Vertex::UV_OFFSET as usize);
        assert_eq!(
            std::mem::offset_of!(Vertex, color),
            Vertex::COLOR_OFFSET as usize
        );
        assert_eq!(
            std::mem::offset_of!(Vertex, normal),
            Vertex::NORMAL_OFFSET as usize
        );
    }

    #[rstest]
    #[case(Topology::None, glow::TRIANGLES)]
    #[case(Topology::Points, glow::POINTS)]
    #[case(Topology::Lines, glow::LINES)]
    #[case(Topology::LineLoop, glow::LINE_LOOP)]
    #[case(Topology::LineStrip, glow::LINE_STRIP)]
    #[case(Topology::Triangles, glow::TRIANGLES)]
    #[case(Topology::TriangleStrip, glow::TRIANGLE_STRIP)]
    #[case(Topology::TriangleFan, glow::TRIANGLE_FAN)]
    fn topology_resolves_to_gl_mode(#[case] topology: Topology, #[case] expected: u32) {
        assert_eq!(topology.gl_mode(), expected);
    }

    #[test]
    fn default_texture_params_are_nearest_repeat() {
        let params = TextureParams::default();
        assert_eq!(params.min_filter.gl(), glow::NEAREST);
        assert_eq!(params.mag_filter.gl(), glow::NEAREST);
        assert_eq!(params.wrap_s.gl(), glow::REPEAT);
        assert_eq!(params.wrap_t.gl(), glow::REPEAT);
        assert!(!params.generate_mipmaps);
    }

    #[test]
    fn statistics_scale_with_instances() {
        let mut stats = RenderStatistics::default();
        stats.record(4, 6, 1);
        stats.record(4, 6, 10);
        assert_eq!(
            stats,
            RenderStatistics {
                draw_calls: 2,
                vertices: 44,
                indices: 66,
            }
        );
    }
}
