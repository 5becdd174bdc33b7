//! Error types for the engine.
//!
//! Resource creation failures are recoverable: they are logged where they
//! happen and handed back to the caller, who decides whether to continue.

use std::path::PathBuf;

use thiserror::Error;

use crate::audio::SoundHandle;

/// Which half of a mesh a capacity error refers to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MeshBuffer {
    /// The vertex array.
    Vertices,
    /// The index array.
    Indices,
}

impl std::fmt::Display for MeshBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Vertices => "vertex",
            Self::Indices => "index",
        })
    }
}

/// Errors raised while writing into a [`Mesh`](crate::Mesh).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    /// A push would write past the end of the mesh's fixed-size array.
    #[error("{buffer} capacity exceeded: {requested} requested, capacity is {capacity}")]
    CapacityExceeded {
        buffer: MeshBuffer,
        capacity: u32,
        requested: u64,
    },
}

/// Errors raised by draw calls and render-system setup.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The GL driver refused to create an object.
    #[error("GL object creation failed: {0}")]
    Gl(String),
    /// A mesh wrote more data than the shared streaming buffers can hold.
    #[error("{buffer} stream overflow: mesh wrote {written}, streaming buffer holds {capacity}")]
    StreamOverflow {
        buffer: MeshBuffer,
        written: u32,
        capacity: u32,
    },
    /// Geometry built for a draw did not fit its mesh.
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// Errors raised while creating or loading GPU resources.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// Texture creation was called without pixel data.
    #[error("texture data cannot be empty")]
    MissingPixels,
    /// The pixel buffer is smaller than `width * height * channels`.
    #[error("texture data too short: expected {expected} bytes, got {actual}")]
    PixelDataTooShort { expected: usize, actual: usize },
    /// Width or height was zero or does not fit the GL size type.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    /// The framebuffer failed its completeness check.
    #[error("framebuffer is not complete (status {status:#06x})")]
    IncompleteFramebuffer { status: u32 },
    /// An image could not be decoded.
    #[error("failed to load texture {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: ImportError,
    },
    /// A file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A font could not be rasterized into an atlas.
    #[error("failed to create font: {0}")]
    Font(String),
    /// The GL driver refused to create an object.
    #[error("GL object creation failed: {0}")]
    Gl(String),
}

/// Errors raised by the image and mesh import collaborators.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The image crate could not decode the file.
    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),
    /// The glTF file could not be parsed.
    #[cfg(feature = "gltf")]
    #[error("glTF import error: {0}")]
    Gltf(#[from] gltf::Error),
    /// The scene loaded but has nothing to draw.
    #[error("scene contains no meshes")]
    EmptyScene,
    /// The scene is missing data the importer needs.
    #[error("incomplete scene: {0}")]
    Incomplete(String),
    /// No importer is compiled in for this file type.
    #[error("unsupported file type: {0}")]
    Unsupported(String),
    /// The imported mesh did not fit its destination.
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// Errors raised while tessellating 2D shapes into a mesh.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TessellateError {
    /// lyon rejected the geometry.
    #[error("tessellation failed: {0}")]
    Tessellation(String),
    /// The tessellated shape did not fit the mesh. Nothing was written.
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// Errors raised while bringing up a window and its GL context.
///
/// All of these mean there is no render surface to draw into.
#[derive(Debug, Error)]
pub enum WindowError {
    /// The platform event loop could not be created.
    #[error("failed to create event loop: {0}")]
    EventLoop(String),
    /// The OS window could not be created.
    #[error("failed to create window: {0}")]
    Window(String),
    /// No GL config matches the requested template.
    #[error("no suitable GL config: {0}")]
    Config(String),
    /// The GL context could not be created or made current.
    #[error("failed to create GL context: {0}")]
    Context(String),
    /// The window surface could not be created, resized or swapped.
    #[error("failed to create GL surface: {0}")]
    Surface(String),
}

/// Errors raised by an [`AudioSystem`](crate::audio::AudioSystem).
#[derive(Debug, Error)]
pub enum AudioError {
    /// A sound was loaded before the system was initialized.
    #[error("audio system is not initialized")]
    NotInitialized,
    /// A sound file could not be read or decoded.
    #[error("failed to load sound {path}: {reason}")]
    Load { path: PathBuf, reason: String },
    /// The handle was deleted or never issued.
    #[error("unknown sound handle {0:?}")]
    UnknownSound(SoundHandle),
}

impl From<String> for RenderError {
    fn from(message: String) -> Self {
        Self::Gl(message)
    }
}

impl From<String> for ResourceError {
    fn from(message: String) -> Self {
        Self::Gl(message)
    }
}

/// Errors raised while starting the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Opening the window failed.
    #[error(transparent)]
    Window(#[from] WindowError),
    /// Render system setup failed.
    #[error(transparent)]
    Render(#[from] RenderError),
    /// A built-in GPU resource failed.
    #[error(transparent)]
    Resource(#[from] ResourceError),
}
