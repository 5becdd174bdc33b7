#![allow(clippy::unwrap_used)]

use anvil_engine::engine::Engine;
use anvil_engine::input::{InputEvent, MouseButton};
use anvil_engine::ui::{anchored, hovering, slider_update, Anchor, UiStyle, SLIDER_GRAB_PADDING};
use anvil_engine::window::{PlatformEvent, ScriptedWindow, WindowConfig};
use glam::Vec2;
use rstest::rstest;

fn window() -> ScriptedWindow {
    ScriptedWindow::new(WindowConfig {
        width: 800,
        height: 600,
        ..WindowConfig::default()
    })
}

fn click_at(x: f32, y: f32) -> [PlatformEvent; 2] {
    [
        PlatformEvent::CursorMoved { x, y },
        PlatformEvent::Input(InputEvent::MouseButton {
            button: MouseButton::Left,
            down: true,
        }),
    ]
}

#[test]
fn click_in_window_center_presses_centered_button() {
    let mut window = window();
    window.push_frame(click_at(400.0, 300.0));
    window.push_frame([]);
    let mut engine = Engine::headless(window);
    let margin = UiStyle::default().margin;
    let size = Vec2::new(100.0, 30.0);
    let pos = anchored(Vec2::ZERO, size, Anchor::Center);

    assert!(engine.begin_frame());
    let frame = engine.frame();
    let cursor = frame.record.cursor_centered();
    let pressed = frame.input.mouse_button_pressed(MouseButton::Left);
    assert!(pressed && hovering(cursor, pos, size, margin));
    engine.end_frame().unwrap();

    // held, not pressed again
    assert!(engine.begin_frame());
    assert!(!engine.input().mouse_button_pressed(MouseButton::Left));
    assert!(engine.input().mouse_button_down(MouseButton::Left));
    assert_eq!(engine.window().swaps(), 1);
}

#[rstest]
#[case::past_the_end(510.0, 1.0)]
#[case::before_the_start(286.0, 0.0)]
#[case::middle(400.0, 110.0 / 210.0)]
fn dragging_a_slider_clamps_to_its_range(#[case] pixel_x: f32, #[case] expected: f32) {
    let mut window = window();
    window.push_frame(click_at(pixel_x, 400.0));
    let mut engine = Engine::headless(window);
    assert!(engine.begin_frame());

    let margin = UiStyle::default().margin;
    let pos = Vec2::new(-100.0, -100.0);
    let size = Vec2::new(200.0, 20.0);
    let cursor = engine.record().cursor_centered();
    let grabbing = engine.input().mouse_button_down(MouseButton::Left)
        && hovering(cursor, pos, size, margin + SLIDER_GRAB_PADDING);
    assert!(grabbing);

    let update = slider_update(0.5, 0.0, 1.0, cursor.x, pos.x, size.x, margin, grabbing);
    assert!((update.value - expected).abs() < 1e-4, "{update:?}");
}

#[test]
fn slider_ignores_clicks_outside_its_grab_area() {
    let mut window = window();
    window.push_frame(click_at(700.0, 400.0));
    let mut engine = Engine::headless(window);
    assert!(engine.begin_frame());

    let cursor = engine.record().cursor_centered();
    let pos = Vec2::new(-100.0, -100.0);
    let size = Vec2::new(200.0, 20.0);
    let margin = UiStyle::default().margin;
    let grabbing = hovering(cursor, pos, size, margin + SLIDER_GRAB_PADDING);
    assert!(!grabbing);

    let update = slider_update(0.25, 0.0, 1.0, cursor.x, pos.x, size.x, margin, grabbing);
    assert_eq!(update.value, 0.25);
    assert_eq!(update.fill, 0.25);
}

#[test]
fn resize_moves_the_centered_cursor() {
    let mut window = window();
    window.push_frame([
        PlatformEvent::Resized {
            width: 200,
            height: 100,
        },
        PlatformEvent::CursorMoved { x: 200.0, y: 0.0 },
    ]);
    let mut engine = Engine::headless(window);
    assert!(engine.begin_frame());
    assert_eq!(engine.record().cursor_centered(), Vec2::new(100.0, 50.0));
}
