//! Vector drawing operators

use crate::document::Color;

/// Stroke parameters for lines and rectangle outlines
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Color,
    pub width: f64,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: Color::black(),
            width: 1.0,
        }
    }
}

fn stroke_state(style: &StrokeStyle) -> String {
    format!(
        "{} {} {} RG\n{} w\n",
        style.color.r, style.color.g, style.color.b, style.width
    )
}

/// Operators for a straight line between two points in PDF space
pub fn generate_line_operators(x1: f64, y1: f64, x2: f64, y2: f64, style: &StrokeStyle) -> Vec<u8> {
    let mut ops = String::from("q\n");
    ops.push_str(&stroke_state(style));
    ops.push_str(&format!("{x1} {y1} m\n{x2} {y2} l\nS\nQ\n"));
    ops.into_bytes()
}

/// Operators for a rectangle outline; (x, y) is the lower-left corner
pub fn generate_rect_operators(x: f64, y: f64, width: f64, height: f64, style: &StrokeStyle) -> Vec<u8> {
    let mut ops = String::from("q\n");
    ops.push_str(&stroke_state(style));
    ops.push_str(&format!("{x} {y} {width} {height} re\nS\nQ\n"));
    ops.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_line_operators() {
        let style = StrokeStyle {
            color: Color::black(),
            width: 0.75,
        };
        let ops = String::from_utf8(generate_line_operators(40.0, 700.0, 555.0, 700.0, &style)).unwrap();
        assert_eq!(ops, "q\n0 0 0 RG\n0.75 w\n40 700 m\n555 700 l\nS\nQ\n");
    }

    #[test]
    fn test_rect_operators() {
        let ops = String::from_utf8(generate_rect_operators(10.0, 20.0, 30.0, 40.0, &StrokeStyle::default())).unwrap();
        assert!(ops.contains("10 20 30 40 re"));
        assert!(ops.contains("1 w"));
        assert!(ops.starts_with("q\n"));
        assert!(ops.ends_with("S\nQ\n"));
    }
}
