//! Immediate-mode widgets drawn with the render core.
//!
//! Widgets keep no state between frames: each call hit-tests against the
//! event record pushed with [`Ui::event_push`] and the caller's
//! [`InputContext`], then draws itself through the shared streaming buffers.
//! Every widget switches the renderer to [`RenderState::UI`] and restores the
//! caller's state before returning.

mod layout;
mod style;

use std::rc::Rc;

use glam::{Mat4, Vec2};

use crate::error::{RenderError, ResourceError};
use crate::font::{Font, GlyphAtlasProvider};
use crate::input::{InputContext, MouseButton};
use crate::math::ortho;
use crate::mesh::Mesh;
use crate::render::Renderer;
use crate::shaders::{Shader, UI_RECT_SRC, UI_TEXT_SRC};
use crate::types::{RenderState, Topology, Vertex};
use crate::window::EventRecord;

pub use layout::{
    anchored, fill_quad, hovering, label_origin, layout_text, rect_quad, slider_update,
    text_width, SliderUpdate, OUTLINE_INDICES, QUAD_INDICES, SLIDER_GRAB_PADDING,
};
pub use style::{Anchor, UiStyle};

/// Projection mapping UI space (pixels, origin at the window center, +y up)
/// to clip space.
///
/// Half-sizes are whole pixels, so an odd dimension drops its last column
/// or row and UI geometry stays on pixel boundaries.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn ui_projection(width: u32, height: u32) -> Mat4 {
    let (half_w, half_h) = ((width / 2) as f32, (height / 2) as f32);
    ortho(-half_w, half_w, -half_h, half_h, -1.0, 1.0)
}

/// The widget context: UI shaders, one quad-sized mesh, the current style
/// and the latest event record.
#[derive(Debug)]
pub struct Ui {
    style: UiStyle,
    text_shader: Shader,
    rect_shader: Shader,
    mesh: Mesh,
    projection: Mat4,
    record: EventRecord,
}

impl Ui {
    /// Compile the UI shaders and load the first available system font.
    ///
    /// A missing font is logged and leaves [`text`](Self::text) a no-op.
    ///
    /// # Safety
    ///
    /// Requires a valid, current OpenGL context. The caller must call
    /// [`destroy`](Self::destroy) before the context is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Gl`] if the driver cannot create the shader
    /// programs.
    pub unsafe fn new(
        gl: &glow::Context,
        provider: &dyn GlyphAtlasProvider,
    ) -> Result<Self, ResourceError> {
        let font = match unsafe { Font::load_default(gl, provider) } {
            Ok(font) => Some(Rc::new(font)),
            Err(e) => {
                log::warn!("no UI font available, text is disabled: {e}");
                None
            }
        };
        unsafe {
            Self::with_style(
                gl,
                UiStyle {
                    font,
                    ..UiStyle::default()
                },
            )
        }
    }

    /// Create the context with a caller-provided style.
    ///
    /// # Safety
    ///
    /// Same as [`new`](Self::new).
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub unsafe fn with_style(gl: &glow::Context, style: UiStyle) -> Result<Self, ResourceError> {
        let text_shader = unsafe { Shader::create(gl, UI_TEXT_SRC)? };
        let rect_shader = match unsafe { Shader::create(gl, UI_RECT_SRC) } {
            Ok(shader) => shader,
            Err(e) => {
                unsafe { text_shader.delete(gl) };
                return Err(e);
            }
        };
        Ok(Self {
            style,
            text_shader,
            rect_shader,
            mesh: Mesh::new(4, 6),
            projection: Mat4::IDENTITY,
            record: EventRecord::default(),
        })
    }

    /// Take this frame's window size and cursor, and rebuild the projection.
    pub fn event_push(&mut self, record: &EventRecord) {
        self.record = *record;
        self.projection = ui_projection(record.width, record.height);
    }

    /// Current UI projection.
    #[must_use]
    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// The cursor in UI space.
    #[must_use]
    pub fn cursor(&self) -> Vec2 {
        self.record.cursor_centered()
    }

    /// The style widgets are drawn with.
    #[must_use]
    pub fn style(&self) -> &UiStyle {
        &self.style
    }

    /// Replace the style. Takes effect with the next widget.
    pub fn set_style(&mut self, style: UiStyle) {
        self.style = style;
    }

    /// Draw `text` with its baseline at `pos`, aligned by `anchor`.
    ///
    /// Empty strings and a missing font draw nothing.
    ///
    /// # Safety
    ///
    /// Requires the renderer's context to be current.
    ///
    /// # Errors
    ///
    /// Returns any error from [`Renderer::draw`].
    pub unsafe fn text(
        &mut self,
        renderer: &mut Renderer,
        text: &str,
        pos: Vec2,
        scale: f32,
        anchor: Anchor,
    ) -> Result<(), RenderError> {
        if text.is_empty() {
            return Ok(());
        }
        unsafe {
            with_ui_state(renderer, |renderer| {
                self.draw_text(renderer, text, pos, scale, anchor)
            })
        }
    }

    /// A clickable box with an optional label.
    ///
    /// Returns `true` on the frame the left button goes down while the
    /// cursor is over the box.
    ///
    /// # Safety
    ///
    /// Requires the renderer's context to be current.
    ///
    /// # Errors
    ///
    /// Returns any error from [`Renderer::draw`].
    #[allow(clippy::too_many_arguments)]
    pub unsafe fn button(
        &mut self,
        renderer: &mut Renderer,
        input: &InputContext,
        label: Option<&str>,
        pos: Vec2,
        size: Vec2,
        button_anchor: Anchor,
        text_anchor: Anchor,
    ) -> Result<bool, RenderError> {
        let margin = self.style.margin;
        let pos = anchored(pos, size, button_anchor);
        let hover = hovering(self.cursor(), pos, size, margin);
        let fill = if hover {
            self.style.hover_color
        } else {
            self.style.fill_color
        };

        unsafe {
            with_ui_state(renderer, |renderer| {
                self.draw_panel(renderer, &rect_quad(pos, size, margin, fill))?;
                self.draw_outline(renderer, pos, size)?;
                self.draw_label(renderer, label, pos, size, text_anchor)
            })?;
        }
        Ok(input.mouse_button_pressed(MouseButton::Left) && hover)
    }

    /// A horizontal slider editing `value` within `[min, max]`.
    ///
    /// While the left button is held over the slider (with a few extra units
    /// of grab area), the cursor position sets `value`. Returns `true` while
    /// it is being dragged.
    ///
    /// # Safety
    ///
    /// Requires the renderer's context to be current.
    ///
    /// # Errors
    ///
    /// Returns any error from [`Renderer::draw`]. `value` is updated either
    /// way.
    #[allow(clippy::too_many_arguments)]
    pub unsafe fn slider(
        &mut self,
        renderer: &mut Renderer,
        input: &InputContext,
        label: Option<&str>,
        pos: Vec2,
        size: Vec2,
        value: &mut f32,
        min: f32,
        max: f32,
        slider_anchor: Anchor,
        text_anchor: Anchor,
    ) -> Result<bool, RenderError> {
        let margin = self.style.margin;
        let pos = anchored(pos, size, slider_anchor);
        let cursor = self.cursor();
        let hover = hovering(cursor, pos, size, margin + SLIDER_GRAB_PADDING);
        let dragging = input.mouse_button_down(MouseButton::Left) && hover;

        let update = slider_update(*value, min, max, cursor.x, pos.x, size.x, margin, dragging);
        *value = update.value;

        let (fill_color, hover_color) = (self.style.fill_color, self.style.hover_color);
        let filled = update.fill * (size.x + margin);
        unsafe {
            with_ui_state(renderer, |renderer| {
                self.draw_panel(renderer, &rect_quad(pos, size, margin, fill_color))?;
                self.draw_panel(renderer, &fill_quad(pos, size, margin, filled, hover_color))?;
                self.draw_outline(renderer, pos, size)?;
                self.draw_label(renderer, label, pos, size, text_anchor)
            })?;
        }
        Ok(dragging)
    }

    /// Delete the shaders. The font is deleted too unless the style shares it
    /// elsewhere.
    ///
    /// # Safety
    ///
    /// Requires the context the UI was created with to be current.
    pub unsafe fn destroy(self, gl: &glow::Context) {
        unsafe {
            self.text_shader.delete(gl);
            self.rect_shader.delete(gl);
        }
        if let Some(font) = self.style.font {
            if let Ok(mut font) = Rc::try_unwrap(font) {
                unsafe { font.delete(gl) };
            }
        }
    }

    unsafe fn draw_panel(
        &mut self,
        renderer: &Renderer,
        quad: &[Vertex; 4],
    ) -> Result<(), RenderError> {
        let gl = renderer.gl();
        unsafe {
            self.rect_shader.bind(gl);
            self.rect_shader.set_matrix(gl, "projection", &self.projection);
        }
        self.mesh.clear();
        self.mesh.push_vertices(quad)?;
        self.mesh.push_indices(&QUAD_INDICES)?;
        unsafe { renderer.draw(&self.mesh) }
    }

    unsafe fn draw_outline(
        &mut self,
        renderer: &Renderer,
        pos: Vec2,
        size: Vec2,
    ) -> Result<(), RenderError> {
        let quad = rect_quad(pos, size, self.style.margin, self.style.outline_color);
        self.mesh.clear();
        self.mesh.push_vertices(&quad)?;
        self.mesh.push_indices(&OUTLINE_INDICES)?;
        self.mesh.mode = Topology::LineLoop;
        let result = unsafe { renderer.draw(&self.mesh) };
        self.mesh.mode = Topology::None;
        result
    }

    unsafe fn draw_label(
        &mut self,
        renderer: &Renderer,
        label: Option<&str>,
        pos: Vec2,
        size: Vec2,
        anchor: Anchor,
    ) -> Result<(), RenderError> {
        match label {
            Some(text) if !text.is_empty() => unsafe {
                self.draw_text(renderer, text, label_origin(pos, size, anchor), 1.0, anchor)
            },
            _ => Ok(()),
        }
    }

    unsafe fn draw_text(
        &mut self,
        renderer: &Renderer,
        text: &str,
        pos: Vec2,
        scale: f32,
        anchor: Anchor,
    ) -> Result<(), RenderError> {
        let Some(font) = self.style.font.clone() else {
            return Ok(());
        };
        let quads = layout_text(font.atlas(), text, pos, scale, anchor, self.style.text_color);

        let gl = renderer.gl();
        unsafe {
            self.text_shader.bind(gl);
            font.texture().bind(gl, 0);
            self.text_shader.set_texture(gl, "texture0", 0);
            self.text_shader.set_matrix(gl, "projection", &self.projection);
        }
        for quad in &quads {
            self.mesh.clear();
            self.mesh.push_vertices(quad)?;
            self.mesh.push_indices(&QUAD_INDICES)?;
            unsafe { renderer.draw(&self.mesh)? };
        }
        Ok(())
    }
}

/// Run `draw` with the UI render state, then restore the previous state
/// whether or not drawing succeeded.
unsafe fn with_ui_state<T>(
    renderer: &mut Renderer,
    draw: impl FnOnce(&Renderer) -> Result<T, RenderError>,
) -> Result<T, RenderError> {
    let previous = renderer.state();
    unsafe { renderer.set_state(RenderState::UI) };
    let result = draw(renderer);
    unsafe { renderer.set_state(previous) };
    result
}
