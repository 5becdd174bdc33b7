use std::rc::Rc;

use glam::Vec4;

use crate::font::Font;

/// Horizontal alignment of a widget or label relative to its position.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// The position is the left edge.
    #[default]
    Left,
    /// The position is the horizontal center.
    Center,
    /// The position is the right edge.
    Right,
}

impl Anchor {
    /// How far to shift an element of `width` left so that it sits on its
    /// anchor.
    #[must_use]
    pub fn offset(self, width: f32) -> f32 {
        match self {
            Self::Left => 0.0,
            Self::Center => width * 0.5,
            Self::Right => width,
        }
    }
}

/// Colors, spacing and font shared by every widget.
///
/// Without a font, text is not drawn but widgets keep working.
#[derive(Clone, Debug, PartialEq)]
pub struct UiStyle {
    /// Font for labels, shared with whoever loaded it.
    pub font: Option<Rc<Font>>,
    /// Label color.
    pub text_color: Vec4,
    /// Fill of an idle button and of a slider track.
    pub fill_color: Vec4,
    /// Fill of a hovered button and of a slider's filled portion.
    pub hover_color: Vec4,
    /// Widget border color.
    pub outline_color: Vec4,
    /// Extra space around a widget's content, also widening its hit area.
    pub margin: f32,
}

impl Default for UiStyle {
    fn default() -> Self {
        Self {
            font: None,
            text_color: Vec4::new(1.0, 1.0, 1.0, 1.0),
            fill_color: Vec4::new(0.2, 0.2, 0.2, 1.0),
            hover_color: Vec4::new(0.2, 0.2, 0.4, 1.0),
            outline_color: Vec4::new(1.0, 1.0, 1.0, 1.0),
            margin: 10.0,
        }
    }
}
