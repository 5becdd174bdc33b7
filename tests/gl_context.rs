//! Needs a display and a GL 3.3 driver. Run with
//! `cargo test --features desktop -- --ignored`.
#![cfg(feature = "desktop")]
#![allow(clippy::unwrap_used)]

use anvil_engine::platform::DesktopWindow;
use anvil_engine::window::{WindowBackend, WindowConfig};
use anvil_engine::{Framebuffer, FramebufferKind, Shader, TextureParams};

fn window() -> DesktopWindow {
    DesktopWindow::create(&WindowConfig {
        width: 64,
        height: 64,
        ..WindowConfig::default()
    })
    .unwrap()
}

#[test]
#[ignore = "opens a window"]
fn broken_shader_is_returned_unlinked_and_ignores_uniforms() {
    let window = window();
    let gl = window.gl().unwrap();
    unsafe {
        let shader = Shader::create(&gl, "this is not glsl").unwrap();
        assert!(!shader.is_linked());
        shader.bind(&gl);
        shader.set_float(&gl, "missing", 1.0);
        Shader::unbind(&gl);
        shader.delete(&gl);
    }
}

#[test]
#[ignore = "opens a window"]
fn color_framebuffer_is_complete() {
    let window = window();
    let gl = window.gl().unwrap();
    unsafe {
        let framebuffer =
            Framebuffer::create(&gl, 32, 16, TextureParams::default(), FramebufferKind::Color)
                .unwrap();
        assert_eq!((framebuffer.width, framebuffer.height), (32, 16));
        framebuffer.delete(&gl);
    }
}
