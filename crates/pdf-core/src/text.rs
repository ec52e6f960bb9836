//! Text operators and line wrapping

use crate::document::Color;
use crate::font::StandardFont;
use crate::Align;
use std::io::Write;

/// Font, size and fill color for a run of text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font: StandardFont,
    pub size: f32,
    pub color: Color,
}

impl TextStyle {
    pub fn new(font: StandardFont, size: f32) -> Self {
        Self {
            font,
            size,
            color: Color::black(),
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn width_of(&self, text: &str) -> f64 {
        self.font.text_width_points(text, self.size)
    }
}

/// Horizontal shift from the anchor to the start of a run `width` wide
fn anchor_shift(width: f64, align: Align) -> f64 {
    match align {
        Align::Left => 0.0,
        Align::Center => width / -2.0,
        Align::Right => -width,
    }
}

/// Content-stream operators for one line of text
///
/// `x` is the anchor the run is aligned to and `baseline` is in PDF space
/// (from the bottom of the page).
pub fn text_operators(text: &str, x: f64, baseline: f64, align: Align, style: &TextStyle) -> Vec<u8> {
    let start = x + anchor_shift(style.width_of(text), align);
    let Color { r, g, b } = style.color;

    let mut out = Vec::with_capacity(64 + text.len() * 2);
    // Writing into a Vec cannot fail
    let _ = write!(
        out,
        "BT\n{r} {g} {b} rg\n/{} {} Tf\n{start} {baseline} Td\n{} Tj\nET\n",
        style.font.resource_name(),
        style.size,
        style.font.encode_text_hex(text),
    );
    out
}

/// Split text into lines that fit within `max_width`
///
/// Breaks on whitespace; explicit newlines always start a new line. A single
/// word wider than the box is broken between characters. `measure` returns
/// the width of a string in the same unit as `max_width`.
pub fn wrap_to_width<F>(text: &str, max_width: f64, measure: F) -> Vec<String>
where
    F: Fn(&str) -> f64,
{
    if max_width <= 0.0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current_line = String::new();

        for word in paragraph.split_whitespace() {
            let candidate = if current_line.is_empty() {
                word.to_string()
            } else {
                format!("{current_line} {word}")
            };

            if measure(&candidate) <= max_width {
                current_line = candidate;
                continue;
            }

            if !current_line.is_empty() {
                lines.push(std::mem::take(&mut current_line));
            }

            if measure(word) <= max_width {
                current_line = word.to_string();
            } else {
                // Hard-break an over-long word
                for c in word.chars() {
                    let mut next = current_line.clone();
                    next.push(c);
                    if measure(&next) > max_width && !current_line.is_empty() {
                        lines.push(std::mem::take(&mut current_line));
                        current_line.push(c);
                    } else {
                        current_line = next;
                    }
                }
            }
        }

        lines.push(current_line);
    }

    lines
}
