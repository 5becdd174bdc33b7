//! Fill and stroke tessellation of 2D shapes via lyon.
//!
//! Shapes are tessellated into indexed triangles and appended to a
//! [`Mesh`] after whatever it already holds, so several shapes can share a
//! single draw call. A shape that does not fit leaves the mesh untouched.

use glam::{Vec2, Vec4};
use lyon::math::point;
use lyon::path::Path as LyonPath;
use lyon::tessellation::{
    BuffersBuilder, FillOptions, FillRule, FillTessellator, FillVertex, StrokeOptions,
    StrokeTessellator, StrokeVertex, VertexBuffers,
};

use crate::error::{MeshBuffer, MeshError, TessellateError};
use crate::mesh::Mesh;
use crate::types::{Topology, Vertex};

/// Curve flattening tolerance, in UI units.
pub const TOLERANCE: f32 = 0.01;

type Geometry = VertexBuffers<Vertex, u32>;

/// Builds an outline from lines and curves, then fills or strokes it.
///
/// Starting a new sub-path with [`move_to`](Self::move_to) ends the previous
/// one without closing it.
pub struct PathBuilder {
    builder: lyon::path::path::Builder,
    open: bool,
}

impl Default for PathBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PathBuilder {
    /// An empty path.
    #[must_use]
    pub fn new() -> Self {
        Self {
            builder: LyonPath::builder(),
            open: false,
        }
    }

    /// Start a new sub-path at `at`, ending any open one.
    pub fn move_to(&mut self, at: Vec2) -> &mut Self {
        if self.open {
            self.builder.end(false);
        }
        self.builder.begin(point(at.x, at.y));
        self.open = true;
        self
    }

    /// Without a current sub-path this starts one at `to`.
    pub fn line_to(&mut self, to: Vec2) -> &mut Self {
        if !self.open {
            return self.move_to(to);
        }
        self.builder.line_to(point(to.x, to.y));
        self
    }

    /// Quadratic Bézier to `to`. Without a current sub-path this starts one at `ctrl`.
    pub fn quad_to(&mut self, ctrl: Vec2, to: Vec2) -> &mut Self {
        self.ensure_open(ctrl);
        self.builder
            .quadratic_bezier_to(point(ctrl.x, ctrl.y), point(to.x, to.y));
        self
    }

    /// Cubic Bézier to `to`. Without a current sub-path this starts one at `ctrl1`.
    pub fn curve_to(&mut self, ctrl1: Vec2, ctrl2: Vec2, to: Vec2) -> &mut Self {
        self.ensure_open(ctrl1);
        self.builder.cubic_bezier_to(
            point(ctrl1.x, ctrl1.y),
            point(ctrl2.x, ctrl2.y),
            point(to.x, to.y),
        );
        self
    }

    /// Close the current sub-path back to its start.
    pub fn close(&mut self) -> &mut Self {
        if self.open {
            self.builder.close();
            self.open = false;
        }
        self
    }

    /// Fill the outline (non-zero rule) into `mesh`.
    ///
    /// # Errors
    ///
    /// See [`fill_polygon`].
    pub fn fill(self, mesh: &mut Mesh, color: Vec4) -> Result<(), TessellateError> {
        let path = self.build();
        let mut geometry = Geometry::new();
        FillTessellator::new()
            .tessellate_path(
                &path,
                &fill_options(),
                &mut BuffersBuilder::new(&mut geometry, |vertex: FillVertex| {
                    let p = vertex.position();
                    Vertex::colored(p.x, p.y, color)
                }),
            )
            .map_err(|e| TessellateError::Tessellation(format!("{e:?}")))?;
        append(mesh, &geometry)
    }

    /// Stroke the outline with lines `width` units wide into `mesh`.
    ///
    /// # Errors
    ///
    /// See [`fill_polygon`].
    pub fn stroke(self, mesh: &mut Mesh, width: f32, color: Vec4) -> Result<(), TessellateError> {
        let path = self.build();
        let mut geometry = Geometry::new();
        StrokeTessellator::new()
            .tessellate_path(
                &path,
                &StrokeOptions::tolerance(TOLERANCE).with_line_width(width),
                &mut BuffersBuilder::new(&mut geometry, |vertex: StrokeVertex| {
                    let p = vertex.position();
                    Vertex::colored(p.x, p.y, color)
                }),
            )
            .map_err(|e| TessellateError::Tessellation(format!("{e:?}")))?;
        append(mesh, &geometry)
    }

    fn ensure_open(&mut self, at: Vec2) {
        if !self.open {
            self.move_to(at);
        }
    }

    fn build(mut self) -> LyonPath {
        if self.open {
            self.builder.end(false);
        }
        self.builder.build()
    }
}

fn fill_options() -> FillOptions {
    FillOptions::tolerance(TOLERANCE).with_fill_rule(FillRule::NonZero)
}

/// Fill the closed polygon through `points`.
///
/// # Errors
///
/// Returns [`TessellateError::Mesh`] if the triangles do not fit the mesh,
/// or [`TessellateError::Tessellation`] if lyon rejects the shape.
pub fn fill_polygon(mesh: &mut Mesh, points: &[Vec2], color: Vec4) -> Result<(), TessellateError> {
    let Some((first, rest)) = points.split_first() else {
        return Ok(());
    };
    let mut path = PathBuilder::new();
    path.move_to(*first);
    for p in rest {
        path.line_to(*p);
    }
    path.close();
    path.fill(mesh, color)
}

/// Fill a circle.
///
/// # Errors
///
/// See [`fill_polygon`].
pub fn fill_circle(
    mesh: &mut Mesh,
    center: Vec2,
    radius: f32,
    color: Vec4,
) -> Result<(), TessellateError> {
    let mut geometry = Geometry::new();
    FillTessellator::new()
        .tessellate_circle(
            point(center.x, center.y),
            radius,
            &fill_options(),
            &mut BuffersBuilder::new(&mut geometry, |vertex: FillVertex| {
                let p = vertex.position();
                Vertex::colored(p.x, p.y, color)
            }),
        )
        .map_err(|e| TessellateError::Tessellation(format!("{e:?}")))?;
    append(mesh, &geometry)
}

/// Stroke the line through `points`, optionally closing it.
///
/// # Errors
///
/// See [`fill_polygon`].
pub fn stroke_polyline(
    mesh: &mut Mesh,
    points: &[Vec2],
    width: f32,
    closed: bool,
    color: Vec4,
) -> Result<(), TessellateError> {
    let Some((first, rest)) = points.split_first() else {
        return Ok(());
    };
    let mut path = PathBuilder::new();
    path.move_to(*first);
    for p in rest {
        path.line_to(*p);
    }
    if closed {
        path.close();
    }
    path.stroke(mesh, width, color)
}

/// Append tessellated geometry after the mesh's current contents, as
/// triangles. Checks both capacities before writing anything.
fn append(mesh: &mut Mesh, geometry: &Geometry) -> Result<(), TessellateError> {
    let base = mesh.curr_vertex();
    check_room(MeshBuffer::Vertices, base, geometry.vertices.len(), mesh.vertex_count())?;
    check_room(
        MeshBuffer::Indices,
        mesh.curr_index(),
        geometry.indices.len(),
        mesh.index_count(),
    )?;

    let indices: Vec<u32> = geometry.indices.iter().map(|i| i + base).collect();
    mesh.push_vertices(&geometry.vertices)?;
    mesh.push_indices(&indices)?;
    if mesh.mode == Topology::None {
        mesh.mode = Topology::Triangles;
    }
    Ok(())
}

fn check_room(buffer: MeshBuffer, cursor: u32, count: usize, capacity: u32) -> Result<(), MeshError> {
    let requested = u64::from(cursor) + count as u64;
    if requested > u64::from(capacity) {
        return Err(MeshError::CapacityExceeded {
            buffer,
            capacity,
            requested,
        });
    }
    Ok(())
}
