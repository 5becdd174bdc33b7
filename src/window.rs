//! The window system seen by the engine.
//!
//! A [`WindowBackend`] owns one OS window and its GL context. Each frame the
//! engine calls [`WindowBackend::pull_events`], which advances the input
//! snapshot and folds every pending OS event into an [`EventRecord`]. The
//! desktop implementation lives in [`platform`](crate::platform) behind the
//! `desktop` feature; [`ScriptedWindow`] replays queued events without any
//! OS window.

use std::collections::VecDeque;
use std::sync::Arc;

use bitflags::bitflags;
use glam::Vec2;

use crate::error::WindowError;
use crate::input::{InputContext, InputEvent};

bitflags! {
    /// Window creation options. Flags combine freely.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct WindowFlags: u32 {
        /// Center the window on the primary monitor, ignoring `x`/`y`.
        const CENTERED = 1 << 0;
        /// Borderless fullscreen on the current monitor.
        const FULLSCREEN = 1 << 1;
        /// Let the user resize the window.
        const RESIZABLE = 1 << 2;
        /// Start minimized.
        const MINIMIZED = 1 << 3;
        /// Start maximized.
        const MAXIMIZED = 1 << 4;
    }
}

impl Default for WindowFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// Parameters for opening a window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    /// Window title.
    pub title: String,
    /// Inner width in pixels.
    pub width: u32,
    /// Inner height in pixels.
    pub height: u32,
    /// Position of the left edge, unless centered.
    pub x: i32,
    /// Position of the top edge, unless centered.
    pub y: i32,
    /// Creation options.
    pub flags: WindowFlags,
    /// Synchronize buffer swaps with the display refresh.
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "anvil".to_string(),
            width: 1280,
            height: 720,
            x: 0,
            y: 0,
            flags: WindowFlags::CENTERED,
            vsync: false,
        }
    }
}

/// Window state accumulated from OS events.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EventRecord {
    /// Set once the user asks to close the window. Never cleared.
    pub should_quit: bool,
    /// Current inner width in pixels.
    pub width: u32,
    /// Current inner height in pixels.
    pub height: u32,
    /// Current left edge.
    pub x: i32,
    /// Current top edge.
    pub y: i32,
    /// Cursor position in `[-1, 1]` on both axes, with +y pointing up.
    pub cursor: Vec2,
}

impl EventRecord {
    /// A record for a window of the given size with the cursor at the
    /// center.
    #[must_use]
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// The cursor in pixels relative to the window center, +y up.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn cursor_centered(&self) -> Vec2 {
        self.cursor * Vec2::new(self.width as f32 / 2.0, self.height as f32 / 2.0)
    }

    /// Fold one OS event into this record and the input snapshot.
    pub fn apply(&mut self, event: PlatformEvent, input: &mut InputContext) {
        match event {
            PlatformEvent::CloseRequested => self.should_quit = true,
            PlatformEvent::Resized { width, height } => {
                self.width = width;
                self.height = height;
            }
            PlatformEvent::Moved { x, y } => {
                self.x = x;
                self.y = y;
            }
            PlatformEvent::CursorMoved { x, y } => {
                self.cursor = normalize_cursor(x, y, self.width, self.height);
            }
            PlatformEvent::Input(event) => input.apply(event),
        }
    }
}

/// Map a pixel position (origin top-left, +y down) to `[-1, 1]` with +y up.
///
/// A zero-sized window maps everything to the center.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn normalize_cursor(x: f32, y: f32, width: u32, height: u32) -> Vec2 {
    if width == 0 || height == 0 {
        return Vec2::ZERO;
    }
    Vec2::new(
        x / width as f32 * 2.0 - 1.0,
        y / height as f32 * -2.0 + 1.0,
    )
}

/// An OS event, already translated out of the platform's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlatformEvent {
    /// The user asked to close the window.
    CloseRequested,
    /// New inner size in pixels.
    Resized { width: u32, height: u32 },
    /// New position of the top-left corner.
    Moved { x: i32, y: i32 },
    /// Cursor position in window pixels, origin top-left.
    CursorMoved { x: f32, y: f32 },
    /// A key or mouse button transition.
    Input(InputEvent),
}

/// One window with a GL context.
///
/// Creating a backend opens the window; dropping it closes the window and
/// destroys the context.
pub trait WindowBackend {
    /// Present the back buffer.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::Surface`] if the swap fails.
    fn swap_buffers(&mut self) -> Result<(), WindowError>;

    /// Turn vertical sync on or off.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::Context`] if the driver refuses the change.
    fn set_vsync(&mut self, enabled: bool) -> Result<(), WindowError>;

    /// Advance `input` by one frame, then drain every pending OS event into
    /// `record` and `input`. Never blocks.
    fn pull_events(&mut self, record: &mut EventRecord, input: &mut InputContext);

    /// The window's GL context, if it has one.
    fn gl(&self) -> Option<Arc<glow::Context>>;

    /// Current drawable size in pixels.
    fn size(&self) -> [u32; 2];
}

impl<W: WindowBackend + ?Sized> WindowBackend for Box<W> {
    fn swap_buffers(&mut self) -> Result<(), WindowError> {
        (**self).swap_buffers()
    }

    fn set_vsync(&mut self, enabled: bool) -> Result<(), WindowError> {
        (**self).set_vsync(enabled)
    }

    fn pull_events(&mut self, record: &mut EventRecord, input: &mut InputContext) {
        (**self).pull_events(record, input);
    }

    fn gl(&self) -> Option<Arc<glow::Context>> {
        (**self).gl()
    }

    fn size(&self) -> [u32; 2] {
        (**self).size()
    }
}

/// A headless backend that replays scripted frames of events.
///
/// Each call to [`pull_events`](WindowBackend::pull_events) consumes one
/// queued frame. Once the script runs out, frames are empty.
#[derive(Debug, Default)]
pub struct ScriptedWindow {
    config: WindowConfig,
    frames: VecDeque<Vec<PlatformEvent>>,
    size: [u32; 2],
    swaps: u64,
    vsync: bool,
}

impl ScriptedWindow {
    /// A window that delivers no events until frames are queued.
    #[must_use]
    pub fn new(config: WindowConfig) -> Self {
        log::debug!(
            "scripted window \"{}\" {}x{}",
            config.title,
            config.width,
            config.height
        );
        Self {
            size: [config.width, config.height],
            vsync: config.vsync,
            config,
            frames: VecDeque::new(),
            swaps: 0,
        }
    }

    /// Queue the events delivered by one future pull.
    pub fn push_frame(&mut self, events: impl IntoIterator<Item = PlatformEvent>) {
        self.frames.push_back(events.into_iter().collect());
    }

    /// Number of frames still queued.
    #[must_use]
    pub fn pending_frames(&self) -> usize {
        self.frames.len()
    }

    /// Number of completed buffer swaps.
    #[must_use]
    pub fn swaps(&self) -> u64 {
        self.swaps
    }

    /// Whether vsync was last requested.
    #[must_use]
    pub fn vsync(&self) -> bool {
        self.vsync
    }

    /// The configuration the window was created with.
    #[must_use]
    pub fn config(&self) -> &WindowConfig {
        &self.config
    }
}

impl WindowBackend for ScriptedWindow {
    fn swap_buffers(&mut self) -> Result<(), WindowError> {
        self.swaps += 1;
        Ok(())
    }

    fn set_vsync(&mut self, enabled: bool) -> Result<(), WindowError> {
        self.vsync = enabled;
        Ok(())
    }

    fn pull_events(&mut self, record: &mut EventRecord, input: &mut InputContext) {
        input.advance();
        for event in self.frames.pop_front().unwrap_or_default() {
            if let PlatformEvent::Resized { width, height } = event {
                self.size = [width, height];
            }
            record.apply(event, input);
        }
    }

    fn gl(&self) -> Option<Arc<glow::Context>> {
        None
    }

    fn size(&self) -> [u32; 2] {
        self.size
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::input::{Key, MouseButton};

    #[test]
    fn cursor_is_normalized_with_y_up() {
        assert_eq!(normalize_cursor(0.0, 0.0, 800, 600), Vec2::new(-1.0, 1.0));
        assert_eq!(normalize_cursor(400.0, 300.0, 800, 600), Vec2::ZERO);
        assert_eq!(normalize_cursor(800.0, 600.0, 800, 600), Vec2::new(1.0, -1.0));
        assert_eq!(normalize_cursor(10.0, 10.0, 0, 600), Vec2::ZERO);
    }

    #[test]
    fn centered_cursor_scales_by_half_size() {
        let record = EventRecord {
            width: 800,
            height: 600,
            cursor: Vec2::new(0.5, -0.5),
            ..EventRecord::default()
        };
        assert_eq!(record.cursor_centered(), Vec2::new(200.0, -150.0));
    }

    #[test]
    fn flags_combine() {
        let flags = WindowFlags::CENTERED | WindowFlags::RESIZABLE;
        assert!(flags.contains(WindowFlags::RESIZABLE));
        assert!(!flags.contains(WindowFlags::FULLSCREEN));
        assert_eq!(flags.bits(), 0b101);
    }

    #[test]
    fn scripted_frames_are_consumed_in_order() {
        let mut window = ScriptedWindow::new(WindowConfig::default());
        window.push_frame([
            PlatformEvent::Resized {
                width: 640,
                height: 480,
            },
            PlatformEvent::CursorMoved { x: 320.0, y: 0.0 },
            PlatformEvent::Input(InputEvent::Key {
                key: Key::Escape,
                down: true,
            }),
        ]);
        window.push_frame([PlatformEvent::CloseRequested]);

        let mut record = EventRecord::with_size(1280, 720);
        let mut input = InputContext::new();

        window.pull_events(&mut record, &mut input);
        assert_eq!((record.width, record.height), (640, 480));
        assert_eq!(window.size(), [640, 480]);
        assert_eq!(record.cursor, Vec2::new(0.0, 1.0));
        assert!(input.key_pressed(Key::Escape));
        assert!(!record.should_quit);

        window.pull_events(&mut record, &mut input);
        assert!(record.should_quit);
        assert!(input.key_down(Key::Escape));
        assert!(!input.key_pressed(Key::Escape));

        // An exhausted script still advances input.
        window.pull_events(&mut record, &mut input);
        assert!(record.should_quit);
        assert_eq!(window.pending_frames(), 0);
        assert!(input.mouse_button_up(MouseButton::Left));
    }

    #[test]
    fn swap_and_vsync_are_recorded() {
        let mut window = ScriptedWindow::new(WindowConfig::default());
        window.swap_buffers().unwrap();
        window.swap_buffers().unwrap();
        window.set_vsync(true).unwrap();
        assert_eq!(window.swaps(), 2);
        assert!(window.vsync());
        assert!(window.gl().is_none());
    }
}
