//! Desktop window backend: `winit` for the window and events, `glutin` for
//! the OpenGL 3.3 core context.
//!
//! Events are pumped on demand rather than by handing control to the event
//! loop, so the engine keeps its own frame loop.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use glutin::config::{Config, ConfigTemplateBuilder, GlConfig};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, GlProfile, NotCurrentGlContext, PossiblyCurrentContext,
    Version,
};
use glutin::display::{GetGlDisplay, GlDisplay};
use glutin::surface::{GlSurface, Surface, SwapInterval, WindowSurface};
use glutin_winit::{DisplayBuilder, GlWindow};
use raw_window_handle::HasWindowHandle;
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, MouseButton as WinitMouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Fullscreen, Window, WindowAttributes, WindowId};

use crate::error::WindowError;
use crate::input::{InputContext, InputEvent, Key, MouseButton};
use crate::window::{EventRecord, PlatformEvent, WindowBackend, WindowConfig, WindowFlags};

/// A native window with a current OpenGL context.
///
/// Fields drop top to bottom, so the context goes before the window it
/// renders into.
pub struct DesktopWindow {
    gl: Arc<glow::Context>,
    surface: Surface<WindowSurface>,
    context: PossiblyCurrentContext,
    window: Window,
    event_loop: EventLoop<()>,
}

impl DesktopWindow {
    /// Open a window, create a GL 3.3 core context for it and make the
    /// context current.
    ///
    /// # Errors
    ///
    /// Returns a [`WindowError`] naming the step that failed. Without a
    /// window and context there is nothing to render into, so callers should
    /// treat this as fatal.
    pub fn create(config: &WindowConfig) -> Result<Self, WindowError> {
        let event_loop = EventLoop::new().map_err(|e| WindowError::EventLoop(e.to_string()))?;

        let template = ConfigTemplateBuilder::new()
            .with_depth_size(24)
            .with_stencil_size(8);
        let (window, gl_config) = DisplayBuilder::new()
            .with_window_attributes(Some(window_attributes(config)))
            .build(&event_loop, template, pick_config)
            .map_err(|e| WindowError::Config(e.to_string()))?;
        let window =
            window.ok_or_else(|| WindowError::Window("display builder returned no window".into()))?;

        let raw_handle = window
            .window_handle()
            .map_err(|e| WindowError::Window(e.to_string()))?
            .as_raw();
        let display = gl_config.display();
        let context_attributes = ContextAttributesBuilder::new()
            .with_profile(GlProfile::Core)
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .build(Some(raw_handle));
        let not_current = unsafe { display.create_context(&gl_config, &context_attributes) }
            .map_err(|e| WindowError::Context(e.to_string()))?;

        let surface_attributes = window
            .build_surface_attributes(Default::default())
            .map_err(|e| WindowError::Surface(e.to_string()))?;
        let surface = unsafe { display.create_window_surface(&gl_config, &surface_attributes) }
            .map_err(|e| WindowError::Surface(e.to_string()))?;
        let context = not_current
            .make_current(&surface)
            .map_err(|e| WindowError::Context(e.to_string()))?;

        let gl = unsafe {
            glow::Context::from_loader_function_cstr(|name| display.get_proc_address(name))
        };

        if config.flags.contains(WindowFlags::CENTERED) {
            center(&window);
        }
        if config.flags.contains(WindowFlags::MINIMIZED) {
            window.set_minimized(true);
        }

        let mut this = Self {
            gl: Arc::new(gl),
            surface,
            context,
            window,
            event_loop,
        };
        this.set_vsync(config.vsync)?;

        log::info!(
            "opened window \"{}\" ({}x{}, {} samples)",
            config.title,
            config.width,
            config.height,
            gl_config.num_samples()
        );
        Ok(this)
    }

    /// The underlying `winit` window.
    #[must_use]
    pub fn window(&self) -> &Window {
        &self.window
    }
}

impl WindowBackend for DesktopWindow {
    fn swap_buffers(&mut self) -> Result<(), WindowError> {
        self.surface
            .swap_buffers(&self.context)
            .map_err(|e| WindowError::Surface(e.to_string()))
    }

    fn set_vsync(&mut self, enabled: bool) -> Result<(), WindowError> {
        let interval = if enabled {
            SwapInterval::Wait(NonZeroU32::MIN)
        } else {
            SwapInterval::DontWait
        };
        self.surface
            .set_swap_interval(&self.context, interval)
            .map_err(|e| WindowError::Context(e.to_string()))
    }

    fn pull_events(&mut self, record: &mut EventRecord, input: &mut InputContext) {
        input.advance();

        let mut collector = Collector::default();
        let status = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut collector);
        if let PumpStatus::Exit(code) = status {
            log::debug!("event loop exited with code {code}");
            record.should_quit = true;
        }

        for event in collector.events {
            if let PlatformEvent::Resized { width, height } = event {
                if let (Some(w), Some(h)) = (NonZeroU32::new(width), NonZeroU32::new(height)) {
                    self.surface.resize(&self.context, w, h);
                }
            }
            record.apply(event, input);
        }
    }

    fn gl(&self) -> Option<Arc<glow::Context>> {
        Some(Arc::clone(&self.gl))
    }

    fn size(&self) -> [u32; 2] {
        let size = self.window.inner_size();
        [size.width, size.height]
    }
}

/// Buffers translated window events for one pump.
#[derive(Default)]
struct Collector {
    events: Vec<PlatformEvent>,
}

impl ApplicationHandler for Collector {
    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {}

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Some(event) = translate_window_event(&event) {
            self.events.push(event);
        }
    }
}

fn window_attributes(config: &WindowConfig) -> WindowAttributes {
    let flags = config.flags;
    let mut attributes = Window::default_attributes()
        .with_title(config.title.clone())
        .with_inner_size(PhysicalSize::new(config.width, config.height))
        .with_resizable(flags.contains(WindowFlags::RESIZABLE))
        .with_maximized(flags.contains(WindowFlags::MAXIMIZED));
    if flags.contains(WindowFlags::FULLSCREEN) {
        attributes = attributes.with_fullscreen(Some(Fullscreen::Borderless(None)));
    }
    if !flags.contains(WindowFlags::CENTERED) {
        attributes = attributes.with_position(PhysicalPosition::new(config.x, config.y));
    }
    attributes
}

/// Prefer the config with the most samples.
fn pick_config(configs: Box<dyn Iterator<Item = Config> + '_>) -> Config {
    // `find_configs` fails with `BadConfig` on every backend before an empty
    // list reaches the picker, and the picker has to return a config.
    most_samples(configs, |c: &Config| c.num_samples())
        .expect("glutin never offers an empty config list")
}

/// The first item with the highest sample count.
fn most_samples<T>(items: impl Iterator<Item = T>, samples: impl Fn(&T) -> u8) -> Option<T> {
    items.reduce(|best, c| if samples(&c) > samples(&best) { c } else { best })
}

fn center(window: &Window) {
    let Some(monitor) = window.current_monitor() else {
        return;
    };
    let screen = monitor.size();
    let outer = window.outer_size();
    let x = (i64::from(screen.width) - i64::from(outer.width)) / 2;
    let y = (i64::from(screen.height) - i64::from(outer.height)) / 2;
    let origin = monitor.position();
    #[allow(clippy::cast_possible_truncation)]
    window.set_outer_position(PhysicalPosition::new(
        origin.x + x as i32,
        origin.y + y as i32,
    ));
}

/// Translate the window events the engine cares about.
#[allow(clippy::cast_possible_truncation)]
fn translate_window_event(event: &WindowEvent) -> Option<PlatformEvent> {
    match event {
        WindowEvent::CloseRequested => Some(PlatformEvent::CloseRequested),
        WindowEvent::Resized(size) => Some(PlatformEvent::Resized {
            width: size.width,
            height: size.height,
        }),
        WindowEvent::Moved(pos) => Some(PlatformEvent::Moved { x: pos.x, y: pos.y }),
        WindowEvent::CursorMoved { position, .. } => Some(PlatformEvent::CursorMoved {
            x: position.x as f32,
            y: position.y as f32,
        }),
        WindowEvent::Focused(false) => Some(PlatformEvent::Input(InputEvent::FocusLost)),
        WindowEvent::MouseInput { state, button, .. } => {
            let button = map_mouse_button(*button)?;
            Some(PlatformEvent::Input(InputEvent::MouseButton {
                button,
                down: *state == ElementState::Pressed,
            }))
        }
        WindowEvent::KeyboardInput { event, .. } => {
            let key = map_key(event.physical_key)?;
            Some(PlatformEvent::Input(InputEvent::Key {
                key,
                down: event.state == ElementState::Pressed,
            }))
        }
        _ => None,
    }
}

fn map_mouse_button(button: WinitMouseButton) -> Option<MouseButton> {
    match button {
        WinitMouseButton::Left => Some(MouseButton::Left),
        WinitMouseButton::Middle => Some(MouseButton::Middle),
        WinitMouseButton::Right => Some(MouseButton::Right),
        _ => None,
    }
}

#[rustfmt::skip]
fn map_key(physical: PhysicalKey) -> Option<Key> {
    let PhysicalKey::Code(code) = physical else {
        return None;
    };
    let key = match code {
        KeyCode::Escape => Key::Escape,
        KeyCode::Enter | KeyCode::NumpadEnter => Key::Enter,
        KeyCode::Tab => Key::Tab,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Space => Key::Space,

        KeyCode::Insert => Key::Insert,
        KeyCode::Delete => Key::Delete,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,

        KeyCode::ArrowUp => Key::ArrowUp,
        KeyCode::ArrowDown => Key::ArrowDown,
        KeyCode::ArrowLeft => Key::ArrowLeft,
        KeyCode::ArrowRight => Key::ArrowRight,

        KeyCode::ShiftLeft | KeyCode::ShiftRight => Key::Shift,
        KeyCode::ControlLeft | KeyCode::ControlRight => Key::Control,
        KeyCode::AltLeft | KeyCode::AltRight => Key::Alt,
        KeyCode::SuperLeft | KeyCode::SuperRight => Key::Meta,

        KeyCode::KeyA => Key::A, KeyCode::KeyB => Key::B, KeyCode::KeyC => Key::C,
        KeyCode::KeyD => Key::D, KeyCode::KeyE => Key::E, KeyCode::KeyF => Key::F,
        KeyCode::KeyG => Key::G, KeyCode::KeyH => Key::H, KeyCode::KeyI => Key::I,
        KeyCode::KeyJ => Key::J, KeyCode::KeyK => Key::K, KeyCode::KeyL => Key::L,
        KeyCode::KeyM => Key::M, KeyCode::KeyN => Key::N, KeyCode::KeyO => Key::O,
        KeyCode::KeyP => Key::P, KeyCode::KeyQ => Key::Q, KeyCode::KeyR => Key::R,
        KeyCode::KeyS => Key::S, KeyCode::KeyT => Key::T, KeyCode::KeyU => Key::U,
        KeyCode::KeyV => Key::V, KeyCode::KeyW => Key::W, KeyCode::KeyX => Key::X,
        KeyCode::KeyY => Key::Y, KeyCode::KeyZ => Key::Z,

        KeyCode::Digit0 => Key::Digit0, KeyCode::Digit1 => Key::Digit1,
        KeyCode::Digit2 => Key::Digit2, KeyCode::Digit3 => Key::Digit3,
        KeyCode::Digit4 => Key::Digit4, KeyCode::Digit5 => Key::Digit5,
        KeyCode::Digit6 => Key::Digit6, KeyCode::Digit7 => Key::Digit7,
        KeyCode::Digit8 => Key::Digit8, KeyCode::Digit9 => Key::Digit9,

        KeyCode::F1 => Key::F1, KeyCode::F2 => Key::F2, KeyCode::F3 => Key::F3,
        KeyCode::F4 => Key::F4, KeyCode::F5 => Key::F5, KeyCode::F6 => Key::F6,
        KeyCode::F7 => Key::F7, KeyCode::F8 => Key::F8, KeyCode::F9 => Key::F9,
        KeyCode::F10 => Key::F10, KeyCode::F11 => Key::F11, KeyCode::F12 => Key::F12,

        _ => return None,
    };
    Some(key)
}
