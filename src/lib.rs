//! A lightweight OpenGL engine built on [glow].
//!
//! The core is a [`Renderer`] that streams [`Mesh`] data through one shared
//! vertex/index buffer pair, tracks rasterizer toggles as a [`RenderState`],
//! and can report per-draw [`RenderStatistics`]. Around it sit GPU resources
//! ([`Texture`], [`Shader`], [`Framebuffer`]), an immediate-mode [`ui`] with
//! text, buttons and sliders, double-buffered [`input`], and loaders for
//! images, fonts and meshes.
//!
//! Platform services are traits so they can be swapped or scripted:
//! [`window::WindowBackend`], [`audio::AudioSystem`],
//! [`font::GlyphAtlasProvider`], [`import::ImageDecoder`] and
//! [`import::MeshImporter`]. [`engine::Engine`] ties a window backend to
//! input, rendering and UI in a per-frame loop.
//!
//! # Features
//!
//! - **`gltf`** (default): [`import::GltfImporter`] for `.gltf`/`.glb`
//!   meshes.
//! - **`desktop`**: `platform::DesktopWindow`, a winit window with a glutin
//!   OpenGL 3.3 core context.
//!
//! # Safety
//!
//! Everything that issues GL calls is `unsafe` and requires the context it
//! was created with to be current on the calling thread. GPU resources are
//! released explicitly with their `delete`/`destroy` methods before the
//! context goes away.
//!
//! [glow]: https://docs.rs/glow

mod framebuffer;
mod mesh;
mod render;
mod shaders;
mod texture;
mod types;

pub mod audio;
pub mod engine;
pub mod error;
pub mod font;
pub mod fs;
pub mod import;
pub mod input;
pub mod logging;
pub mod math;
pub mod message;
pub mod tessellate;
pub mod ui;
pub mod window;

#[cfg(feature = "desktop")]
pub mod platform;

pub use error::{
    AudioError, EngineError, ImportError, MeshBuffer, MeshError, RenderError, ResourceError,
    TessellateError, WindowError,
};
pub use framebuffer::{AttachmentFormat, Framebuffer, FramebufferKind};
pub use mesh::Mesh;
pub use render::{RenderConfig, Renderer, StatisticsSink};
pub use shaders::{Shader, FRAGMENT_PREFIX, UI_RECT_SRC, UI_TEXT_SRC, VERTEX_PREFIX};
pub use texture::{set_unpack_alignment, PixelFormat, Texture};
pub use types::{
    RenderState, RenderStatistics, TextureFilter, TextureParams, TextureWrap, Topology, Vertex,
};
