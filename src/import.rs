//! Image and mesh import.
//!
//! Decoding files is delegated to two small traits so that resource
//! creation can be driven by any backend. [`ImageCrateDecoder`] covers the
//! formats enabled on the `image` dependency; [`GltfImporter`] (feature
//! `gltf`) reads the first mesh of a glTF scene and post-processes it into
//! an indexed triangle list.

use std::collections::HashMap;
use std::path::Path;

use glam::Vec3;
use image::DynamicImage;

use crate::error::ImportError;
use crate::types::Vertex;

/// Raw pixels produced by an [`ImageDecoder`].
///
/// Rows are tightly packed, `channels` bytes per pixel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecodedImage {
    /// Pixel bytes, row by row.
    pub pixels: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Bytes per pixel, 1 to 4.
    pub channels: u32,
}

/// Turns an image file into raw 8-bit pixels.
pub trait ImageDecoder {
    /// Decode `path`. With `flip_vertically`, the first row of the result is
    /// the bottom row of the image, as GL texture uploads expect.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::Image`] if the file is missing or not a
    /// supported image.
    fn decode(&self, path: &Path, flip_vertically: bool) -> Result<DecodedImage, ImportError>;
}

/// [`ImageDecoder`] backed by the `image` crate.
///
/// Grayscale, grayscale-alpha, RGB and RGBA 8-bit images keep their channel
/// count; everything else is converted to RGBA.
#[derive(Copy, Clone, Debug, Default)]
pub struct ImageCrateDecoder;

impl ImageCrateDecoder {
    /// Decode an image already in memory.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::Image`] if the bytes are not a supported image.
    pub fn decode_memory(
        &self,
        bytes: &[u8],
        flip_vertically: bool,
    ) -> Result<DecodedImage, ImportError> {
        let image = image::load_from_memory(bytes)?;
        Ok(into_decoded(image, flip_vertically))
    }
}

impl ImageDecoder for ImageCrateDecoder {
    fn decode(&self, path: &Path, flip_vertically: bool) -> Result<DecodedImage, ImportError> {
        let image = image::open(path)?;
        Ok(into_decoded(image, flip_vertically))
    }
}

fn into_decoded(image: DynamicImage, flip_vertically: bool) -> DecodedImage {
    let image = if flip_vertically { image.flipv() } else { image };
    let (width, height) = (image.width(), image.height());
    let (pixels, channels) = match image {
        DynamicImage::ImageLuma8(buf) => (buf.into_raw(), 1),
        DynamicImage::ImageLumaA8(buf) => (buf.into_raw(), 2),
        DynamicImage::ImageRgb8(buf) => (buf.into_raw(), 3),
        DynamicImage::ImageRgba8(buf) => (buf.into_raw(), 4),
        other => (other.to_rgba8().into_raw(), 4),
    };
    DecodedImage {
        pixels,
        width,
        height,
        channels,
    }
}

/// Vertex and index arrays of one imported mesh.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawMesh {
    /// Vertex array.
    pub vertices: Vec<Vertex>,
    /// Triangle list indices into `vertices`.
    pub indices: Vec<u32>,
}

/// Turns a 3D scene file into a single indexed triangle list.
///
/// Implementations triangulate, generate normals where the file has none,
/// flip texture coordinates so `v = 0` is the bottom row, and merge
/// identical vertices. Only the first mesh of the scene is returned.
pub trait MeshImporter {
    /// Import the first mesh of `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError`] if the file cannot be read, has no mesh, or
    /// lacks required data.
    fn import(&self, path: &Path) -> Result<RawMesh, ImportError>;
}

/// How a primitive's indices form triangles.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Assembly {
    List,
    Strip,
    Fan,
}

/// Expand strip or fan indices into a plain triangle list.
///
/// Strips alternate winding so every triangle keeps the orientation of the
/// first one.
pub(crate) fn triangulate(assembly: Assembly, indices: &[u32]) -> Vec<u32> {
    match assembly {
        Assembly::List => indices[..indices.len() - indices.len() % 3].to_vec(),
        Assembly::Strip => indices
            .windows(3)
            .enumerate()
            .flat_map(|(i, w)| {
                if i % 2 == 0 {
                    [w[0], w[1], w[2]]
                } else {
                    [w[1], w[0], w[2]]
                }
            })
            .collect(),
        Assembly::Fan => match indices.split_first() {
            Some((&center, rest)) => rest
                .windows(2)
                .flat_map(|w| [center, w[0], w[1]])
                .collect(),
            None => Vec::new(),
        },
    }
}

/// Give every triangle its own three vertices with the face normal.
///
/// Degenerate triangles get a zero normal.
pub(crate) fn flat_normals(vertices: &[Vertex], indices: &[u32]) -> RawMesh {
    let mut out = RawMesh {
        vertices: Vec::with_capacity(indices.len()),
        indices: Vec::with_capacity(indices.len()),
    };
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| vertices[i as usize]);
        let [pa, pb, pc] = [a, b, c].map(|v| Vec3::from(v.position));
        let normal = (pb - pa).cross(pc - pa).normalize_or_zero().to_array();
        for mut vertex in [a, b, c] {
            vertex.normal = normal;
            let next = u32::try_from(out.vertices.len()).unwrap_or(u32::MAX);
            out.indices.push(next);
            out.vertices.push(vertex);
        }
    }
    out
}

/// Collapse bitwise-identical vertices and remap the indices.
///
/// First occurrences keep their relative order.
pub(crate) fn merge_identical(vertices: &[Vertex], indices: &[u32]) -> RawMesh {
    let mut seen: HashMap<[u32; 12], u32> = HashMap::with_capacity(vertices.len());
    let mut remap = Vec::with_capacity(vertices.len());
    let mut merged = Vec::new();
    for vertex in vertices {
        let key: [u32; 12] = bytemuck::cast(*vertex);
        let slot = *seen.entry(key).or_insert_with(|| {
            merged.push(*vertex);
            u32::try_from(merged.len() - 1).unwrap_or(u32::MAX)
        });
        remap.push(slot);
    }
    RawMesh {
        vertices: merged,
        indices: indices.iter().map(|&i| remap[i as usize]).collect(),
    }
}

/// Flip a texture coordinate so that `v = 0` addresses the bottom row.
pub(crate) fn flip_uv([u, v]: [f32; 2]) -> [f32; 2] {
    [u, 1.0 - v]
}

#[cfg(feature = "gltf")]
pub use gltf_importer::GltfImporter;

#[cfg(feature = "gltf")]
mod gltf_importer {
    use std::path::Path;

    use gltf::mesh::Mode;

    use super::{flat_normals, flip_uv, merge_identical, triangulate, Assembly, MeshImporter, RawMesh};
    use crate::error::ImportError;
    use crate::types::Vertex;

    /// [`MeshImporter`] for `.gltf` and `.glb` files.
    ///
    /// Reads the first primitive of the first mesh: positions, normals, the
    /// first texture coordinate set and the first color set (white when
    /// absent).
    #[derive(Copy, Clone, Debug, Default)]
    pub struct GltfImporter;

    impl MeshImporter for GltfImporter {
        fn import(&self, path: &Path) -> Result<RawMesh, ImportError> {
            let (document, buffers, _images) = gltf::import(path)?;
            let mesh = document.meshes().next().ok_or(ImportError::EmptyScene)?;
            let primitive = mesh.primitives().next().ok_or(ImportError::EmptyScene)?;

            let assembly = match primitive.mode() {
                Mode::Triangles => Assembly::List,
                Mode::TriangleStrip => Assembly::Strip,
                Mode::TriangleFan => Assembly::Fan,
                other => return Err(ImportError::Unsupported(format!("{other:?} primitive"))),
            };

            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));

            let positions: Vec<[f32; 3]> = reader
                .read_positions()
                .ok_or_else(|| ImportError::Incomplete("primitive has no positions".into()))?
                .collect();
            let count = positions.len();

            let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(Iterator::collect);
            let uvs: Vec<[f32; 2]> = reader
                .read_tex_coords(0)
                .map(|t| t.into_f32().map(flip_uv).collect())
                .unwrap_or_else(|| vec![[0.0; 2]; count]);
            let colors: Vec<[f32; 4]> = reader
                .read_colors(0)
                .map(|c| c.into_rgba_f32().collect())
                .unwrap_or_else(|| vec![[1.0; 4]; count]);

            let vertices: Vec<Vertex> = (0..count)
                .map(|i| Vertex {
                    position: positions[i],
                    uv: uvs.get(i).copied().unwrap_or_default(),
                    color: colors.get(i).copied().unwrap_or([1.0; 4]),
                    normal: normals
                        .as_ref()
                        .and_then(|n| n.get(i).copied())
                        .unwrap_or_default(),
                })
                .collect();

            let indices: Vec<u32> = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..u32::try_from(count).unwrap_or(u32::MAX)).collect(),
            };
            if let Some(&bad) = indices.iter().find(|&&i| i as usize >= count) {
                return Err(ImportError::Incomplete(format!(
                    "index {bad} out of range for {count} vertices"
                )));
            }
            let indices = triangulate(assembly, &indices);

            let raw = if normals.is_some() {
                merge_identical(&vertices, &indices)
            } else {
                let flat = flat_normals(&vertices, &indices);
                merge_identical(&flat.vertices, &flat.indices)
            };
            log::debug!(
                "imported {}: {} vertices, {} indices",
                path.display(),
                raw.vertices.len(),
                raw.indices.len()
            );
            Ok(raw)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn at(x: f32, y: f32) -> Vertex {
        Vertex {
            position: [x, y, 0.0],
            ..Vertex::default()
        }
    }

    #[rstest]
    #[case(Assembly::List, &[0, 1, 2, 3, 4], &[0, 1, 2])]
    #[case(Assembly::Strip, &[0, 1, 2, 3], &[0, 1, 2, 2, 1, 3])]
    #[case(Assembly::Fan, &[0, 1, 2, 3], &[0, 1, 2, 0, 2, 3])]
    #[case(Assembly::Strip, &[0, 1], &[])]
    #[case(Assembly::Fan, &[], &[])]
    fn assembly_expands_to_triangle_list(
        #[case] assembly: Assembly,
        #[case] input: &[u32],
        #[case] expected: &[u32],
    ) {
        assert_eq!(triangulate(assembly, input), expected);
    }

    #[test]
    fn flat_normals_face_the_winding() {
        let vertices = [at(0.0, 0.0), at(1.0, 0.0), at(0.0, 1.0)];
        let raw = flat_normals(&vertices, &[0, 1, 2]);
        assert_eq!(raw.indices, [0, 1, 2]);
        assert!(raw.vertices.iter().all(|v| v.normal == [0.0, 0.0, 1.0]));

        let degenerate = flat_normals(&[at(0.0, 0.0); 3], &[0, 1, 2]);
        assert!(degenerate.vertices.iter().all(|v| v.normal == [0.0; 3]));
    }

    #[test]
    fn identical_vertices_are_merged() {
        // Two triangles of a quad, unwelded.
        let quad = [
            at(0.0, 0.0),
            at(1.0, 0.0),
            at(1.0, 1.0),
            at(0.0, 0.0),
            at(1.0, 1.0),
            at(0.0, 1.0),
        ];
        let raw = merge_identical(&quad, &[0, 1, 2, 3, 4, 5]);
        assert_eq!(raw.vertices.len(), 4);
        assert_eq!(raw.indices, [0, 1, 2, 0, 2, 3]);
        assert_eq!(raw.vertices[3], at(0.0, 1.0));
    }

    #[test]
    fn vertices_differing_only_in_attributes_stay_apart() {
        let mut colored = at(0.0, 0.0);
        colored.color = [1.0; 4];
        let raw = merge_identical(&[at(0.0, 0.0), colored], &[0, 1]);
        assert_eq!(raw.vertices.len(), 2);
        assert_eq!(raw.indices, [0, 1]);
    }

    #[test]
    fn uv_flip_mirrors_v() {
        assert_eq!(flip_uv([0.25, 0.0]), [0.25, 1.0]);
        assert_eq!(flip_uv([0.5, 0.75]), [0.5, 0.25]);
    }

    #[test]
    fn decoder_keeps_channels_and_flips_rows() {
        let mut image = image::RgbImage::new(1, 2);
        image.put_pixel(0, 0, image::Rgb([255, 0, 0]));
        image.put_pixel(0, 1, image::Rgb([0, 0, 255]));
        let file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        image.save(file.path()).unwrap();

        let decoder = ImageCrateDecoder;
        let upright = decoder.decode(file.path(), false).unwrap();
        let flipped = decoder.decode(file.path(), true).unwrap();

        assert_eq!((upright.width, upright.height, upright.channels), (1, 2, 3));
        assert_eq!(upright.pixels, [255, 0, 0, 0, 0, 255]);
        assert_eq!(flipped.pixels, [0, 0, 255, 255, 0, 0]);
    }

    #[test]
    fn decoding_garbage_fails() {
        let err = ImageCrateDecoder.decode_memory(b"not an image", false).unwrap_err();
        assert!(matches!(err, ImportError::Image(_)));
        assert!(ImageCrateDecoder
            .decode(Path::new("/nonexistent/anvil.png"), true)
            .is_err());
    }
}
