//! The per-frame loop tying a window to input, rendering and UI.
//!
//! ```ignore
//! let mut engine = unsafe { Engine::new(window, RenderConfig::default(), &provider)? };
//! while engine.begin_frame() {
//!     let frame = engine.frame();
//!     // draw with frame.renderer and frame.ui
//!     engine.end_frame()?;
//! }
//! unsafe { engine.shutdown() };
//! ```

use crate::error::{EngineError, WindowError};
use crate::font::GlyphAtlasProvider;
use crate::input::InputContext;
use crate::render::{RenderConfig, Renderer};
use crate::ui::Ui;
use crate::window::{EventRecord, WindowBackend};

/// Owns the window and everything that draws into it.
///
/// An engine built with [`headless`](Self::headless) pulls events and swaps
/// but has no renderer or UI.
pub struct Engine<W: WindowBackend = Box<dyn WindowBackend>> {
    window: W,
    input: InputContext,
    record: EventRecord,
    renderer: Option<Renderer>,
    ui: Option<Ui>,
}

/// Mutable borrows of the engine's parts for drawing one frame.
pub struct Frame<'a> {
    /// `None` for a headless engine.
    pub renderer: Option<&'a mut Renderer>,
    /// `None` for a headless engine.
    pub ui: Option<&'a mut Ui>,
    /// Input snapshot for this frame.
    pub input: &'a InputContext,
    /// Window state after this frame's events.
    pub record: &'a EventRecord,
}

impl<W: WindowBackend> Engine<W> {
    /// Wrap a window without touching GL.
    pub fn headless(window: W) -> Self {
        let [width, height] = window.size();
        Self {
            window,
            input: InputContext::new(),
            record: EventRecord::with_size(width, height),
            renderer: None,
            ui: None,
        }
    }

    /// Create the renderer and UI on the window's GL context.
    ///
    /// # Safety
    ///
    /// The window's context must be current on this thread. The caller must
    /// call [`shutdown`](Self::shutdown) before the window is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::Context`] if the window has no GL context, or
    /// the error from creating the renderer or the UI.
    pub unsafe fn new(
        window: W,
        config: RenderConfig,
        provider: &dyn GlyphAtlasProvider,
    ) -> Result<Self, EngineError> {
        let gl = window
            .gl()
            .ok_or_else(|| WindowError::Context("window has no GL context".into()))?;
        let mut engine = Self::headless(window);

        let renderer = unsafe { Renderer::new(gl, config, engine.window.size())? };
        let mut ui = match unsafe { Ui::new(renderer.gl(), provider) } {
            Ok(ui) => ui,
            Err(e) => {
                unsafe { renderer.destroy() };
                return Err(e.into());
            }
        };
        ui.event_push(&engine.record);

        engine.renderer = Some(renderer);
        engine.ui = Some(ui);
        log::info!("engine started");
        Ok(engine)
    }

    /// Pull this frame's events and propagate the window size.
    ///
    /// Returns `false` once the window has been asked to close.
    pub fn begin_frame(&mut self) -> bool {
        self.window.pull_events(&mut self.record, &mut self.input);
        if let Some(renderer) = &mut self.renderer {
            renderer.set_surface_size([self.record.width, self.record.height]);
        }
        if let Some(ui) = &mut self.ui {
            ui.event_push(&self.record);
        }
        !self.record.should_quit
    }

    /// Present the frame.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if the swap fails.
    pub fn end_frame(&mut self) -> Result<(), WindowError> {
        self.window.swap_buffers()
    }

    /// Borrow everything a frame draws with at once.
    pub fn frame(&mut self) -> Frame<'_> {
        Frame {
            renderer: self.renderer.as_mut(),
            ui: self.ui.as_mut(),
            input: &self.input,
            record: &self.record,
        }
    }

    /// The input snapshot.
    pub fn input(&self) -> &InputContext {
        &self.input
    }

    /// Window state accumulated so far.
    pub fn record(&self) -> &EventRecord {
        &self.record
    }

    /// The renderer, unless headless.
    pub fn renderer(&self) -> Option<&Renderer> {
        self.renderer.as_ref()
    }

    /// The renderer, unless headless.
    pub fn renderer_mut(&mut self) -> Option<&mut Renderer> {
        self.renderer.as_mut()
    }

    /// The UI context, unless headless.
    pub fn ui_mut(&mut self) -> Option<&mut Ui> {
        self.ui.as_mut()
    }

    /// The window backend.
    pub fn window(&self) -> &W {
        &self.window
    }

    /// The window backend.
    pub fn window_mut(&mut self) -> &mut W {
        &mut self.window
    }

    /// Release GL resources and hand the window back.
    ///
    /// # Safety
    ///
    /// The window's context must still be current on this thread.
    pub unsafe fn shutdown(mut self) -> W {
        if let Some(renderer) = self.renderer.take() {
            if let Some(ui) = self.ui.take() {
                unsafe { ui.destroy(renderer.gl()) };
            }
            unsafe { renderer.destroy() };
        }
        log::info!("engine shut down");
        self.window
    }
}
