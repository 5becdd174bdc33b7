//! Client-side mesh staging arrays.
//!
//! A [`Mesh`] owns two fixed-capacity arrays and a write cursor for each. It
//! never owns GPU objects: drawing uploads the written range into the shared
//! streaming buffers held by [`Renderer`](crate::Renderer).

use std::path::Path;

use crate::error::{ImportError, MeshBuffer, MeshError};
use crate::import::{MeshImporter, RawMesh};
use crate::types::{Topology, Vertex};

/// A fixed-capacity vertex/index staging area.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    curr_vertex: u32,
    curr_index: u32,
    /// Primitive topology used when the mesh is drawn.
    pub mode: Topology,
}

impl Mesh {
    /// Allocate a mesh with room for `vertex_count` vertices and
    /// `index_count` indices. Does not touch the GPU.
    #[must_use]
    pub fn new(vertex_count: u32, index_count: u32) -> Self {
        Self {
            vertices: vec![Vertex::default(); vertex_count as usize],
            indices: vec![0; index_count as usize],
            curr_vertex: 0,
            curr_index: 0,
            mode: Topology::None,
        }
    }

    /// Build a mesh sized exactly to `raw` and fill it.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::CapacityExceeded`] if either array has more than
    /// `u32::MAX` elements.
    pub fn from_raw(raw: &RawMesh) -> Result<Self, MeshError> {
        let vertex_count = capacity_of(MeshBuffer::Vertices, raw.vertices.len())?;
        let index_count = capacity_of(MeshBuffer::Indices, raw.indices.len())?;
        let mut mesh = Self::new(vertex_count, index_count);
        mesh.push_vertices(&raw.vertices)?;
        mesh.push_indices(&raw.indices)?;
        Ok(mesh)
    }

    /// Import the first mesh of a scene file through `importer`.
    ///
    /// Import failures are logged and returned; callers that would rather
    /// draw nothing can use `unwrap_or_default()`.
    ///
    /// # Errors
    ///
    /// Returns whatever the importer reports for a missing, incomplete or
    /// empty scene.
    pub fn load(importer: &dyn MeshImporter, path: &Path) -> Result<Self, ImportError> {
        let result = importer
            .import(path)
            .and_then(|raw| Self::from_raw(&raw).map_err(ImportError::from));
        if let Err(e) = &result {
            log::error!("Failed to load mesh\nPath: {}: {e}", path.display());
        }
        result
    }

    /// Reset both write cursors. Capacity is unchanged.
    pub fn clear(&mut self) {
        self.curr_vertex = 0;
        self.curr_index = 0;
    }

    /// Append one vertex.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::CapacityExceeded`] if the vertex array is full.
    pub fn push_vertex(&mut self, vertex: Vertex) -> Result<(), MeshError> {
        self.push_vertices(std::slice::from_ref(&vertex))
    }

    /// Append one index.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::CapacityExceeded`] if the index array is full.
    pub fn push_index(&mut self, index: u32) -> Result<(), MeshError> {
        self.push_indices(std::slice::from_ref(&index))
    }

    /// Append a batch of vertices. Nothing is written unless the whole batch
    /// fits.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::CapacityExceeded`] if the batch does not fit.
    pub fn push_vertices(&mut self, vertices: &[Vertex]) -> Result<(), MeshError> {
        let end = reserve(
            MeshBuffer::Vertices,
            self.curr_vertex,
            vertices.len(),
            self.vertices.len(),
        )?;
        self.vertices[self.curr_vertex as usize..end as usize].copy_from_slice(vertices);
        self.curr_vertex = end;
        Ok(())
    }

    /// Append a batch of indices. Nothing is written unless the whole batch
    /// fits.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::CapacityExceeded`] if the batch does not fit.
    pub fn push_indices(&mut self, indices: &[u32]) -> Result<(), MeshError> {
        let end = reserve(
            MeshBuffer::Indices,
            self.curr_index,
            indices.len(),
            self.indices.len(),
        )?;
        self.indices[self.curr_index as usize..end as usize].copy_from_slice(indices);
        self.curr_index = end;
        Ok(())
    }

    /// Allocated vertex capacity.
    #[must_use]
    pub fn vertex_count(&self) -> u32 {
        len_u32(self.vertices.len())
    }

    /// Allocated index capacity.
    #[must_use]
    pub fn index_count(&self) -> u32 {
        len_u32(self.indices.len())
    }

    /// Number of vertices written since the last [`clear`](Self::clear).
    #[must_use]
    pub fn curr_vertex(&self) -> u32 {
        self.curr_vertex
    }

    /// Number of indices written since the last [`clear`](Self::clear).
    #[must_use]
    pub fn curr_index(&self) -> u32 {
        self.curr_index
    }

    /// The written vertices.
    #[must_use]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices[..self.curr_vertex as usize]
    }

    /// The written indices.
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices[..self.curr_index as usize]
    }
}

/// Check that `count` more elements fit after `cursor` and return the new
/// cursor.
fn reserve(
    buffer: MeshBuffer,
    cursor: u32,
    count: usize,
    capacity: usize,
) -> Result<u32, MeshError> {
    let requested = u64::from(cursor) + count as u64;
    if requested > capacity as u64 {
        return Err(MeshError::CapacityExceeded {
            buffer,
            capacity: len_u32(capacity),
            requested,
        });
    }
    // requested <= capacity, and capacity came from a u32
    Ok(len_u32(requested as usize))
}

fn capacity_of(buffer: MeshBuffer, len: usize) -> Result<u32, MeshError> {
    u32::try_from(len).map_err(|_| MeshError::CapacityExceeded {
        buffer,
        capacity: u32::MAX,
        requested: len as u64,
    })
}

/// Lengths of mesh arrays are always created from a `u32`.
#[allow(clippy::cast_possible_truncation)]
fn len_u32(len: usize) -> u32 {
    len as u32
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn vertex(i: u32) -> Vertex {
        #[allow(clippy::cast_precision_loss)]
        let f = i as f32;
        Vertex {
            position: [f, f + 0.5, -f],
            ..Vertex::default()
        }
    }

    #[test]
    fn cursor_tracks_cumulative_pushes() {
        let mut mesh = Mesh::new(16, 4);
        mesh.push_vertex(vertex(0)).unwrap();
        let batch: Vec<Vertex> = (1..6).map(vertex).collect();
        mesh.push_vertices(&batch).unwrap();
        mesh.push_vertex(vertex(6)).unwrap();

        assert_eq!(mesh.curr_vertex(), 7);
        let expected: Vec<Vertex> = (0..7).map(vertex).collect();
        assert_eq!(mesh.vertices(), expected.as_slice());
    }

    #[test]
    fn filling_to_exact_capacity_is_allowed() {
        let mut mesh = Mesh::new(4, 6);
        mesh.push_vertices(&[vertex(0); 4]).unwrap();
        mesh.push_indices(&[0, 1, 3, 1, 2, 3]).unwrap();
        assert_eq!(mesh.curr_vertex(), 4);
        assert_eq!(mesh.curr_index(), 6);
    }

    #[test]
    fn overflowing_vertex_push_fails_without_writing() {
        let mut mesh = Mesh::new(3, 0);
        mesh.push_vertices(&[vertex(1), vertex(2)]).unwrap();

        let err = mesh.push_vertices(&[vertex(9), vertex(9)]).unwrap_err();
        assert_eq!(
            err,
            MeshError::CapacityExceeded {
                buffer: MeshBuffer::Vertices,
                capacity: 3,
                requested: 4,
            }
        );
        assert_eq!(mesh.curr_vertex(), 2);
        assert_eq!(mesh.vertices(), &[vertex(1), vertex(2)]);
    }

    #[test]
    fn overflowing_single_index_push_fails() {
        let mut mesh = Mesh::new(0, 1);
        mesh.push_index(7).unwrap();
        assert!(matches!(
            mesh.push_index(8),
            Err(MeshError::CapacityExceeded {
                buffer: MeshBuffer::Indices,
                ..
            })
        ));
        assert_eq!(mesh.indices(), &[7]);
    }

    #[test]
    fn clear_matches_fresh_mesh() {
        let mut mesh = Mesh::new(8, 12);
        mesh.push_vertices(&[vertex(1); 5]).unwrap();
        mesh.push_indices(&[1; 9]).unwrap();
        mesh.clear();

        let fresh = Mesh::new(8, 12);
        assert_eq!(mesh.curr_vertex(), fresh.curr_vertex());
        assert_eq!(mesh.curr_index(), fresh.curr_index());
        assert_eq!(mesh.vertex_count(), fresh.vertex_count());
        assert_eq!(mesh.index_count(), fresh.index_count());

        mesh.clear();
        assert_eq!(mesh.curr_vertex(), 0);
        assert!(mesh.vertices().is_empty());
    }

    #[test]
    fn from_raw_sizes_to_contents() {
        let raw = RawMesh {
            vertices: vec![vertex(0), vertex(1), vertex(2)],
            indices: vec![0, 1, 2],
        };
        let mesh = Mesh::from_raw(&raw).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.curr_vertex(), 3);
        assert_eq!(mesh.indices(), &[0, 1, 2]);
        assert_eq!(mesh.mode, Topology::None);
    }
}
