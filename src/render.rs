//! The render system: owns the shared streaming buffers, the rasterizer
//! toggles and the statistics sink, and issues every mesh draw call.

use glam::Vec3;
use glow::HasContext;
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use crate::error::{MeshBuffer, RenderError};
use crate::mesh::Mesh;
use crate::types::{RenderState, RenderStatistics, Topology, Vertex};

/// A caller-owned statistics accumulator.
///
/// Register it with [`Renderer::statistics_monitor`]; every draw call adds to
/// it until [`Renderer::statistics_stop`] is called. The renderer only holds a
/// second reference and never replaces the cell.
pub type StatisticsSink = Rc<Cell<RenderStatistics>>;

/// Capacities of the shared streaming buffers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RenderConfig {
    /// Maximum number of vertices a single draw may upload.
    pub max_vertices: u32,
    /// Maximum number of indices a single draw may upload.
    pub max_indices: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_vertices: 4096,
            max_indices: 4096,
        }
    }
}

impl RenderConfig {
    /// Verify that `mesh`'s written ranges fit in the streaming buffers.
    ///
    /// `draw_vertices` uses the index cursor as its vertex count, so the index
    /// cursor is also checked against the vertex capacity when
    /// `index_cursor_is_vertex_count` is set.
    fn check(&self, mesh: &Mesh, index_cursor_is_vertex_count: bool) -> Result<(), RenderError> {
        if mesh.curr_vertex() > self.max_vertices {
            return Err(RenderError::StreamOverflow {
                buffer: MeshBuffer::Vertices,
                written: mesh.curr_vertex(),
                capacity: self.max_vertices,
            });
        }
        let (buffer, capacity) = if index_cursor_is_vertex_count {
            (MeshBuffer::Vertices, self.max_vertices)
        } else {
            (MeshBuffer::Indices, self.max_indices)
        };
        if mesh.curr_index() > capacity {
            return Err(RenderError::StreamOverflow {
                buffer,
                written: mesh.curr_index(),
                capacity,
            });
        }
        Ok(())
    }
}

/// Convert a `u32` to `i32` for GL API calls.
///
/// # Panics
///
/// Panics if `value > i32::MAX`. Streaming capacities and viewport sizes are
/// far below that.
pub(crate) fn gl_size(value: u32) -> i32 {
    i32::try_from(value).expect("dimension exceeds i32::MAX")
}

/// The render system.
///
/// One `Renderer` exists per GL context. It creates the vertex array and the
/// two streaming buffers once, and every [`Mesh`] draw re-uploads only the
/// mesh's written range into them. Because the buffers are shared, the data
/// of exactly one mesh is valid on the GPU between an upload and its draw.
///
/// # Example
///
/// ```no_run
/// # use anvil_engine::{Mesh, RenderConfig, Renderer, Vertex};
/// # use std::sync::Arc;
/// # fn example(gl: Arc<glow::Context>) -> Result<(), Box<dyn std::error::Error>> {
/// let mut renderer = unsafe { Renderer::new(gl, RenderConfig::default(), [1280, 720]) }?;
///
/// let mut quad = Mesh::new(4, 6);
/// quad.push_vertices(&[Vertex::default(); 4])?;
/// quad.push_indices(&[0, 1, 3, 1, 2, 3])?;
///
/// unsafe {
///     renderer.clear(glam::Vec3::splat(0.1));
///     renderer.draw(&quad)?;
///     renderer.destroy();
/// }
/// # Ok(())
/// # }
/// ```
pub struct Renderer {
    /// The OpenGL context, shared with whoever owns the window surface.
    gl: Arc<glow::Context>,

    config: RenderConfig,

    /// Vertex array describing the interleaved [`Vertex`] layout.
    vao: glow::VertexArray,
    /// Streaming vertex buffer, sized to `config.max_vertices`.
    vbo: glow::Buffer,
    /// Streaming index buffer, sized to `config.max_indices`.
    ebo: glow::Buffer,

    /// Last applied rasterizer toggles.
    state: RenderState,
    /// Registered statistics accumulator, if any.
    statistics: Option<StatisticsSink>,
    /// Size of the default framebuffer, restored when a framebuffer is unbound.
    surface_size: [u32; 2],
}

impl Renderer {
    /// Create the render system.
    ///
    /// Allocates the vertex array and both streaming buffers at their full
    /// capacity, describes the vertex layout, and sets the blend function to
    /// straight (non-premultiplied) alpha.
    ///
    /// # Safety
    ///
    /// The `gl` context must be current and valid. The caller must call
    /// [`destroy`](Self::destroy) before the context is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Gl`] if the driver cannot create the buffers.
    pub unsafe fn new(
        gl: Arc<glow::Context>,
        config: RenderConfig,
        surface_size: [u32; 2],
    ) -> Result<Self, RenderError> {
        let vertex_bytes = gl_size(config.max_vertices) * Vertex::STRIDE;
        let index_bytes = gl_size(config.max_indices) * 4;

        let (vao, vbo, ebo) = unsafe {
            let vao = gl.create_vertex_array()?;
            let vbo = gl.create_buffer()?;
            let ebo = gl.create_buffer()?;

            gl.bind_vertex_array(Some(vao));

            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_size(glow::ARRAY_BUFFER, vertex_bytes, glow::DYNAMIC_DRAW);

            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ebo));
            gl.buffer_data_size(glow::ELEMENT_ARRAY_BUFFER, index_bytes, glow::DYNAMIC_DRAW);

            let attributes = [
                (3, 0),
                (2, Vertex::UV_OFFSET),
                (4, Vertex::COLOR_OFFSET),
                (3, Vertex::NORMAL_OFFSET),
            ];
            for (location, (size, offset)) in (0u32..).zip(attributes) {
                gl.vertex_attrib_pointer_f32(location, size, glow::FLOAT, false, Vertex::STRIDE, offset);
                gl.enable_vertex_attrib_array(location);
            }

            gl.bind_vertex_array(None);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);

            gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);

            (vao, vbo, ebo)
        };

        log::debug!(
            "render system initialized: {} vertices, {} indices streaming capacity",
            config.max_vertices,
            config.max_indices
        );

        Ok(Self {
            gl,
            config,
            vao,
            vbo,
            ebo,
            state: RenderState::default(),
            statistics: None,
            surface_size,
        })
    }

    /// The GL context this renderer draws with.
    #[must_use]
    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    /// A shared handle to the GL context.
    #[must_use]
    pub fn gl_arc(&self) -> Arc<glow::Context> {
        Arc::clone(&self.gl)
    }

    /// Streaming buffer capacities.
    #[must_use]
    pub fn config(&self) -> RenderConfig {
        self.config
    }

    /// Record the current window size. Unbinding a framebuffer restores the
    /// viewport to this size.
    pub fn set_surface_size(&mut self, size: [u32; 2]) {
        self.surface_size = size;
    }

    /// The last recorded window size.
    #[must_use]
    pub fn surface_size(&self) -> [u32; 2] {
        self.surface_size
    }

    /// Clear color, depth and stencil, and zero the registered statistics.
    ///
    /// # Safety
    ///
    /// Requires the context passed to [`new`](Self::new) to be current.
    pub unsafe fn clear(&self, color: Vec3) {
        unsafe {
            self.gl.clear_color(color.x, color.y, color.z, 1.0);
            self.gl.clear(
                glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT | glow::STENCIL_BUFFER_BIT,
            );
        }
        if let Some(sink) = &self.statistics {
            sink.set(RenderStatistics::default());
        }
    }

    /// Apply all four rasterizer toggles. No diffing against the previous
    /// state is done.
    ///
    /// # Safety
    ///
    /// Requires the context passed to [`new`](Self::new) to be current.
    pub unsafe fn set_state(&mut self, state: RenderState) {
        let gl = &self.gl;
        unsafe {
            toggle(gl, glow::DEPTH_TEST, state.depth_testing);
            toggle(gl, glow::BLEND, state.blending);
            toggle(gl, glow::CULL_FACE, state.face_culling);
            gl.polygon_mode(
                glow::FRONT_AND_BACK,
                if state.wireframe { glow::LINE } else { glow::FILL },
            );
        }
        self.state = state;
    }

    /// The last state passed to [`set_state`](Self::set_state).
    #[must_use]
    pub fn state(&self) -> RenderState {
        self.state
    }

    /// Start accumulating draw statistics into `sink`.
    pub fn statistics_monitor(&mut self, sink: StatisticsSink) {
        self.statistics = Some(sink);
    }

    /// Stop accumulating statistics. The sink keeps its last value.
    pub fn statistics_stop(&mut self) {
        self.statistics = None;
    }

    /// Set the rasterized width of lines.
    ///
    /// # Safety
    ///
    /// Requires the context passed to [`new`](Self::new) to be current.
    pub unsafe fn set_line_width(&self, width: f32) {
        unsafe { self.gl.line_width(width) };
    }

    /// Upload the mesh's written range and issue an indexed draw with its
    /// topology.
    ///
    /// # Safety
    ///
    /// Requires the context passed to [`new`](Self::new) to be current, with
    /// a shader bound.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::StreamOverflow`] if the written range does not
    /// fit the streaming buffers. Nothing is drawn in that case.
    pub unsafe fn draw(&self, mesh: &Mesh) -> Result<(), RenderError> {
        self.config.check(mesh, false)?;
        unsafe {
            self.upload(mesh, true);
            self.gl.draw_elements(
                mesh.mode.gl_mode(),
                gl_size(mesh.curr_index()),
                glow::UNSIGNED_INT,
                0,
            );
            self.gl.bind_vertex_array(None);
        }
        self.record(mesh.vertex_count(), mesh.index_count(), 1);
        Ok(())
    }

    /// Like [`draw`](Self::draw), but draws `count` instances.
    ///
    /// Instanced draws always use triangle topology, whatever the mesh's
    /// mode says.
    ///
    /// # Safety
    ///
    /// Requires the context passed to [`new`](Self::new) to be current, with
    /// a shader bound.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::StreamOverflow`] if the written range does not
    /// fit the streaming buffers.
    pub unsafe fn draw_instanced(&self, mesh: &Mesh, count: u32) -> Result<(), RenderError> {
        self.config.check(mesh, false)?;
        unsafe {
            self.upload(mesh, true);
            self.gl.draw_elements_instanced(
                Topology::Triangles.gl_mode(),
                gl_size(mesh.curr_index()),
                glow::UNSIGNED_INT,
                0,
                gl_size(count),
            );
            self.gl.bind_vertex_array(None);
        }
        self.record(mesh.vertex_count(), mesh.index_count(), count);
        Ok(())
    }

    /// Upload only the vertex range and issue a non-indexed draw.
    ///
    /// The number of vertices drawn is the mesh's *index* cursor, so callers
    /// push placeholder indices (or bump the cursor with
    /// [`Mesh::push_indices`]) to select how many vertices are drawn.
    ///
    /// # Safety
    ///
    /// Requires the context passed to [`new`](Self::new) to be current, with
    /// a shader bound.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::StreamOverflow`] if the vertex range or the
    /// draw count exceeds the vertex streaming capacity.
    pub unsafe fn draw_vertices(&self, mesh: &Mesh) -> Result<(), RenderError> {
        self.config.check(mesh, true)?;
        unsafe {
            self.upload(mesh, false);
            self.gl
                .draw_arrays(mesh.mode.gl_mode(), 0, gl_size(mesh.curr_index()));
            self.gl.bind_vertex_array(None);
        }
        self.record(mesh.vertex_count(), mesh.vertex_count(), 1);
        Ok(())
    }

    /// Bind the vertex array and stream the mesh's written ranges into the
    /// shared buffers. Leaves the vertex array bound.
    unsafe fn upload(&self, mesh: &Mesh, with_indices: bool) {
        let gl = &self.gl;
        unsafe {
            gl.bind_vertex_array(Some(self.vao));

            gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.vbo));
            gl.buffer_sub_data_u8_slice(
                glow::ARRAY_BUFFER,
                0,
                bytemuck::cast_slice(mesh.vertices()),
            );

            if with_indices {
                gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(self.ebo));
                gl.buffer_sub_data_u8_slice(
                    glow::ELEMENT_ARRAY_BUFFER,
                    0,
                    bytemuck::cast_slice(mesh.indices()),
                );
            }
        }
    }

    fn record(&self, vertices: u32, indices: u32, instances: u32) {
        record_into(self.statistics.as_ref(), vertices, indices, instances);
    }

    /// Release the vertex array and streaming buffers.
    ///
    /// # Safety
    ///
    /// Must be called with the same GL context that was used to create the
    /// renderer, and must be called exactly once.
    pub unsafe fn destroy(&self) {
        let gl = &self.gl;
        unsafe {
            gl.delete_vertex_array(self.vao);
            gl.delete_buffer(self.vbo);
            gl.delete_buffer(self.ebo);
        }
    }
}

/// Add one draw to `sink`, if a sink is registered.
fn record_into(sink: Option<&StatisticsSink>, vertices: u32, indices: u32, instances: u32) {
    if let Some(sink) = sink {
        let mut stats = sink.get();
        stats.record(vertices, indices, instances);
        sink.set(stats);
    }
}

unsafe fn toggle(gl: &glow::Context, capability: u32, enabled: bool) {
    unsafe {
        if enabled {
            gl.enable(capability);
        } else {
            gl.disable(capability);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn written_mesh(vertices: u32, indices: u32) -> Mesh {
        let mut mesh = Mesh::new(vertices, indices);
        mesh.push_vertices(&vec![Vertex::default(); vertices as usize])
            .unwrap();
        mesh.push_indices(&vec![0; indices as usize]).unwrap();
        mesh
    }

    #[test]
    fn stream_check_accepts_exact_capacity() {
        let config = RenderConfig {
            max_vertices: 4,
            max_indices: 6,
        };
        assert!(config.check(&written_mesh(4, 6), false).is_ok());
    }

    #[test]
    fn stream_check_rejects_vertex_overflow() {
        let config = RenderConfig {
            max_vertices: 3,
            max_indices: 6,
        };
        let err = config.check(&written_mesh(4, 6), false).unwrap_err();
        assert!(matches!(
            err,
            RenderError::StreamOverflow {
                buffer: MeshBuffer::Vertices,
                written: 4,
                capacity: 3,
            }
        ));
    }

    #[test]
    fn stream_check_rejects_index_overflow() {
        let config = RenderConfig {
            max_vertices: 8,
            max_indices: 5,
        };
        assert!(matches!(
            config.check(&written_mesh(4, 6), false),
            Err(RenderError::StreamOverflow {
                buffer: MeshBuffer::Indices,
                ..
            })
        ));
    }

    #[test]
    fn vertex_draw_count_is_checked_against_vertex_capacity() {
        let config = RenderConfig {
            max_vertices: 4,
            max_indices: 4096,
        };
        // 6 "indices" means 6 vertices drawn, which exceeds the vertex stream.
        assert!(config.check(&written_mesh(4, 6), true).is_err());
        assert!(config.check(&written_mesh(4, 6), false).is_ok());
    }

    #[test]
    fn unwritten_capacity_is_not_uploaded_but_is_counted() {
        // A 100/300 mesh with only a quad written still fits a tiny stream...
        let mut mesh = Mesh::new(100, 300);
        mesh.push_vertices(&[Vertex::default(); 4]).unwrap();
        mesh.push_indices(&[0, 1, 3, 1, 2, 3]).unwrap();
        let config = RenderConfig {
            max_vertices: 4,
            max_indices: 6,
        };
        assert!(config.check(&mesh, false).is_ok());

        // ...while statistics report the allocated capacity.
        let sink: StatisticsSink = Rc::default();
        record_into(Some(&sink), mesh.vertex_count(), mesh.index_count(), 1);
        assert_eq!(
            sink.get(),
            RenderStatistics {
                draw_calls: 1,
                vertices: 100,
                indices: 300,
            }
        );
    }

    #[test]
    fn statistics_skip_without_sink() {
        let sink: StatisticsSink = Rc::default();
        record_into(None, 4, 6, 1);
        assert_eq!(sink.get(), RenderStatistics::default());
    }

    #[test]
    fn instanced_statistics_multiply_by_count() {
        let sink: StatisticsSink = Rc::default();
        record_into(Some(&sink), 4, 6, 3);
        record_into(Some(&sink), 4, 4, 1);
        assert_eq!(
            sink.get(),
            RenderStatistics {
                draw_calls: 2,
                vertices: 16,
                indices: 22,
            }
        );
    }
}
