//! GLSL shader programs and the built-in UI shader sources.
//!
//! Every shader is a single source string holding both stages. The stage is
//! selected at compile time by a preprocessor definition prepended to the
//! source, so a shader file looks like:
//!
//! ```glsl
//! #ifdef VERTEX_SHADER
//! // vertex stage
//! #else
//! // fragment stage
//! #endif
//! ```
//!
//! Sources must not carry their own `#version` line; the stage prefix
//! supplies `#version 330 core`.

use glam::{Mat4, Vec2, Vec3, Vec4};
use glow::HasContext;
use std::path::Path;

use crate::error::ResourceError;
use crate::fs;

/// Prepended to the source when compiling the vertex stage.
pub const VERTEX_PREFIX: &str = "#version 330 core\n#define VERTEX_SHADER 1\n";

/// Prepended to the source when compiling the fragment stage.
pub const FRAGMENT_PREFIX: &str = "#version 330 core\n#define FRAGMENT_SHADER 1\n";

/// Shader for UI glyph quads.
///
/// Samples the red channel of a single-channel glyph atlas and uses it as
/// coverage for the vertex color.
///
/// # Uniforms
///
/// | Name         | Type        | Description                         |
/// |--------------|-------------|-------------------------------------|
/// | `projection` | `mat4`      | Screen-space orthographic projection |
/// | `offset`     | `vec2`      | Extra translation applied to glyphs  |
/// | `texture0`   | `sampler2D` | Glyph atlas                          |
pub const UI_TEXT_SRC: &str = r"#ifdef VERTEX_SHADER

layout (location = 0) in vec3 position;
layout (location = 1) in vec2 uv0;
layout (location = 2) in vec4 color0;
layout (location = 3) in vec3 normal0;

uniform mat4 projection;
uniform vec2 offset;

out vec2 uv;
out vec4 color;

void main() {
    gl_Position = projection * vec4(position + vec3(offset, 0.0), 1.0);
    uv = uv0;
    color = color0;
}

#else

uniform sampler2D texture0;

in vec2 uv;
in vec4 color;

out vec4 frag_color;

void main() {
    frag_color = vec4(texture(texture0, uv).r) * color;
}

#endif
";

/// Shader for flat-colored UI quads and outlines.
///
/// # Uniforms
///
/// | Name         | Type   | Description                          |
/// |--------------|--------|--------------------------------------|
/// | `projection` | `mat4` | Screen-space orthographic projection |
pub const UI_RECT_SRC: &str = r"#ifdef VERTEX_SHADER

layout (location = 0) in vec3 position;
layout (location = 1) in vec2 uv0;
layout (location = 2) in vec4 color0;
layout (location = 3) in vec3 normal0;

uniform mat4 projection;

out vec4 color;

void main() {
    gl_Position = projection * vec4(position, 1.0);
    color = color0;
}

#else

in vec4 color;

out vec4 frag_color;

void main() {
    frag_color = color;
}

#endif
";

/// The two programmable stages a shader source is compiled for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Stage {
    Vertex,
    Fragment,
}

impl Stage {
    fn gl(self) -> u32 {
        match self {
            Self::Vertex => glow::VERTEX_SHADER,
            Self::Fragment => glow::FRAGMENT_SHADER,
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            Self::Vertex => VERTEX_PREFIX,
            Self::Fragment => FRAGMENT_PREFIX,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        }
    }
}

/// The full text compiled for one stage.
fn stage_source(stage: Stage, source: &str) -> String {
    let prefix = stage.prefix();
    let mut full = String::with_capacity(prefix.len() + source.len());
    full.push_str(prefix);
    full.push_str(source);
    full
}

/// A linked GPU program.
///
/// Compile and link failures do not prevent construction: the driver's log
/// is written at error level and the program handle is returned anyway.
/// Check [`is_linked`](Self::is_linked) if that matters to the caller.
#[derive(Debug, PartialEq)]
pub struct Shader {
    program: glow::Program,
    linked: bool,
}

impl Shader {
    /// Compile `source` once per stage and link the result.
    ///
    /// # Safety
    ///
    /// Requires a valid, current OpenGL context.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Gl`] only if the driver cannot allocate the
    /// program or shader objects. Compile and link errors are logged, not
    /// returned.
    pub unsafe fn create(gl: &glow::Context, source: &str) -> Result<Self, ResourceError> {
        let program = unsafe { gl.create_program() }?;

        let vs = match unsafe { compile_stage(gl, Stage::Vertex, source) } {
            Ok(vs) => vs,
            Err(e) => {
                unsafe { gl.delete_program(program) };
                return Err(e.into());
            }
        };
        let fs = match unsafe { compile_stage(gl, Stage::Fragment, source) } {
            Ok(fs) => fs,
            Err(e) => {
                unsafe {
                    gl.delete_shader(vs);
                    gl.delete_program(program);
                }
                return Err(e.into());
            }
        };

        let linked = unsafe {
            gl.attach_shader(program, vs);
            gl.attach_shader(program, fs);
            gl.link_program(program);

            let linked = report_link(gl.get_program_link_status(program), || {
                gl.get_program_info_log(program)
            });

            gl.detach_shader(program, vs);
            gl.detach_shader(program, fs);
            gl.delete_shader(vs);
            gl.delete_shader(fs);
            linked
        };

        Ok(Self { program, linked })
    }

    /// Read a shader file and compile it.
    ///
    /// # Safety
    ///
    /// Requires a valid, current OpenGL context.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Io`] if the file cannot be read (logged as an
    /// error), or any error from [`create`](Self::create).
    pub unsafe fn load(gl: &glow::Context, path: &Path) -> Result<Self, ResourceError> {
        let source = fs::read_entire_file(path).map_err(|source| {
            log::error!("Failed to read shader\nPath: {}: {source}", path.display());
            ResourceError::Io {
                path: path.to_path_buf(),
                source,
            }
        })?;
        unsafe { Self::create(gl, &source) }
    }

    /// The GL program name.
    #[must_use]
    pub fn raw(&self) -> glow::Program {
        self.program
    }

    /// Whether the program linked successfully.
    #[must_use]
    pub fn is_linked(&self) -> bool {
        self.linked
    }

    /// Make this the active program.
    ///
    /// # Safety
    ///
    /// Requires the context the shader was created with to be current.
    pub unsafe fn bind(&self, gl: &glow::Context) {
        unsafe { gl.use_program(Some(self.program)) };
    }

    /// Deactivate whatever program is active.
    ///
    /// # Safety
    ///
    /// Requires a valid, current OpenGL context.
    pub unsafe fn unbind(gl: &glow::Context) {
        unsafe { gl.use_program(None) };
    }

    /// Delete the program.
    ///
    /// # Safety
    ///
    /// Requires the context the shader was created with to be current.
    pub unsafe fn delete(self, gl: &glow::Context) {
        unsafe { gl.delete_program(self.program) };
    }

    // Uniform setters look the location up by name on every call. They write
    // to the *active* program, so the shader must be bound first. Unknown
    // names resolve to no location and the write is silently dropped.

    unsafe fn location(&self, gl: &glow::Context, name: &str) -> Option<glow::UniformLocation> {
        unsafe { gl.get_uniform_location(self.program, name) }
    }

    /// Set a `mat4` uniform.
    ///
    /// # Safety
    ///
    /// Requires this shader to be bound on the current context.
    pub unsafe fn set_matrix(&self, gl: &glow::Context, name: &str, matrix: &Mat4) {
        let location = unsafe { self.location(gl, name) };
        write_uniform(location, |l| unsafe {
            gl.uniform_matrix_4_f32_slice(Some(l), false, &matrix.to_cols_array());
        });
    }

    /// Point a `sampler2D` uniform at texture unit `slot`.
    ///
    /// # Safety
    ///
    /// Requires this shader to be bound on the current context.
    #[expect(clippy::cast_possible_wrap)]
    pub unsafe fn set_texture(&self, gl: &glow::Context, name: &str, slot: u32) {
        let location = unsafe { self.location(gl, name) };
        write_uniform(location, |l| unsafe { gl.uniform_1_i32(Some(l), slot as i32) });
    }

    /// Set a `float` uniform.
    ///
    /// # Safety
    ///
    /// Requires this shader to be bound on the current context.
    pub unsafe fn set_float(&self, gl: &glow::Context, name: &str, value: f32) {
        let location = unsafe { self.location(gl, name) };
        write_uniform(location, |l| unsafe { gl.uniform_1_f32(Some(l), value) });
    }

    /// Set a `vec2` uniform.
    ///
    /// # Safety
    ///
    /// Requires this shader to be bound on the current context.
    pub unsafe fn set_vec2(&self, gl: &glow::Context, name: &str, value: Vec2) {
        let location = unsafe { self.location(gl, name) };
        write_uniform(location, |l| unsafe { gl.uniform_2_f32(Some(l), value.x, value.y) });
    }

    /// Set a `vec3` uniform.
    ///
    /// # Safety
    ///
    /// Requires this shader to be bound on the current context.
    pub unsafe fn set_vec3(&self, gl: &glow::Context, name: &str, value: Vec3) {
        let location = unsafe { self.location(gl, name) };
        write_uniform(location, |l| unsafe {
            gl.uniform_3_f32(Some(l), value.x, value.y, value.z);
        });
    }

    /// Set a `vec4` uniform.
    ///
    /// # Safety
    ///
    /// Requires this shader to be bound on the current context.
    pub unsafe fn set_vec4(&self, gl: &glow::Context, name: &str, value: Vec4) {
        let location = unsafe { self.location(gl, name) };
        write_uniform(location, |l| unsafe {
            gl.uniform_4_f32(Some(l), value.x, value.y, value.z, value.w);
        });
    }
}

/// Log the driver's info log when linking failed. Returns `linked`.
fn report_link(linked: bool, info_log: impl FnOnce() -> String) -> bool {
    if !linked {
        log::error!("Program link error: {}", info_log());
    }
    linked
}

/// Run `write` only when the uniform exists. Returns whether it ran.
fn write_uniform<L>(location: Option<L>, write: impl FnOnce(&L)) -> bool {
    match location {
        Some(location) => {
            write(&location);
            true
        }
        None => false,
    }
}

/// Compile one stage of `source`.
///
/// A failed compile is logged and the shader object is still returned; the
/// link step will then fail and be logged too.
///
/// # Safety
///
/// Requires a valid, current OpenGL context.
unsafe fn compile_stage(
    gl: &glow::Context,
    stage: Stage,
    source: &str,
) -> Result<glow::Shader, String> {
    unsafe {
        let shader = gl.create_shader(stage.gl())?;
        gl.shader_source(shader, &stage_source(stage, source));
        gl.compile_shader(shader);

        if !gl.get_shader_compile_status(shader) {
            log::error!(
                "{} shader compile error: {}",
                stage.name(),
                gl.get_shader_info_log(shader)
            );
        }

        Ok(shader)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn stage_source_starts_with_version_and_define() {
        let vs = stage_source(Stage::Vertex, "void main() {}");
        assert!(vs.starts_with("#version 330 core\n#define VERTEX_SHADER 1\n"));
        assert!(vs.ends_with("void main() {}"));

        let fs = stage_source(Stage::Fragment, "void main() {}");
        assert!(fs.starts_with("#version 330 core\n#define FRAGMENT_SHADER 1\n"));
    }

    #[test]
    fn stage_enums_match_gl() {
        assert_eq!(Stage::Vertex.gl(), glow::VERTEX_SHADER);
        assert_eq!(Stage::Fragment.gl(), glow::FRAGMENT_SHADER);
    }

    #[test]
    fn builtin_sources_use_stage_switch() {
        for src in [UI_TEXT_SRC, UI_RECT_SRC] {
            assert!(src.starts_with("#ifdef VERTEX_SHADER"));
            assert!(src.contains("#else"));
            assert!(src.trim_end().ends_with("#endif"));
            // The prefix supplies the version directive.
            assert!(!src.contains("#version"));
        }
    }

    #[test]
    fn builtin_sources_declare_vertex_layout() {
        for src in [UI_TEXT_SRC, UI_RECT_SRC] {
            for (location, name) in ["position", "uv0", "color0", "normal0"].iter().enumerate() {
                assert!(
                    src.contains(&format!("layout (location = {location}) in")),
                    "missing location {location} ({name})"
                );
                assert!(src.contains(name));
            }
        }
    }

    #[test]
    fn failed_link_reads_the_info_log_and_stays_unlinked() {
        let mut log_read = false;
        let linked = report_link(false, || {
            log_read = true;
            "undefined symbol".to_string()
        });
        assert!(!linked);
        assert!(log_read);
    }

    #[test]
    fn successful_link_skips_the_info_log() {
        assert!(report_link(true, || panic!("info log read after a clean link")));
    }

    #[test]
    fn missing_uniform_skips_the_write() {
        let mut writes = Vec::new();
        assert!(!write_uniform(None::<u32>, |l| writes.push(*l)));
        assert!(write_uniform(Some(7_u32), |l| writes.push(*l)));
        assert_eq!(writes, [7]);
    }
}
