//! Standard (base-14) fonts and their metrics
//!
//! Every conforming PDF reader ships Helvetica, so documents built with these
//! faces need no embedded font program. Widths come from the Adobe AFM files
//! and are expressed in 1/1000 em.

use lopdf::{Dictionary, Object};

/// AFM advance widths for Helvetica, codes 32..=126
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, //
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, //
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, //
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, //
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, //
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// AFM advance widths for Helvetica-Bold, codes 32..=126
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, //
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, //
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, //
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, //
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, //
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Width used for codes outside the printable ASCII table
const DEFAULT_WIDTH: u16 = 556;

/// Byte substituted for characters WinAnsiEncoding cannot represent
const REPLACEMENT: u8 = b'?';

/// A standard font face available without embedding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum StandardFont {
    #[default]
    Helvetica,
    HelveticaBold,
}

impl StandardFont {
    /// PostScript name used as /BaseFont
    pub fn base_font(self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
        }
    }

    /// Page resource name used in content streams (e.g. "F1")
    pub fn resource_name(self) -> &'static str {
        match self {
            StandardFont::Helvetica => "F1",
            StandardFont::HelveticaBold => "F2",
        }
    }

    pub fn ascender(self) -> i16 {
        718
    }

    pub fn descender(self) -> i16 {
        -207
    }

    /// Line gap derived from the font bounding box
    pub fn line_gap(self) -> i16 {
        match self {
            StandardFont::Helvetica => 231,
            StandardFont::HelveticaBold => 265,
        }
    }

    /// Distance between consecutive baselines at the given size
    pub fn line_height(self, font_size: f32) -> f64 {
        let units = self.ascender() as f64 - self.descender() as f64 + self.line_gap() as f64;
        units / 1000.0 * font_size as f64
    }

    /// Distance from the top of a line box to its baseline
    pub fn baseline_offset(self, font_size: f32) -> f64 {
        let units = self.ascender() as f64 + self.line_gap() as f64 / 2.0;
        units / 1000.0 * font_size as f64
    }

    /// Advance width of a single encoded byte in font units
    fn byte_width(self, byte: u8) -> u16 {
        let table = match self {
            StandardFont::Helvetica => &HELVETICA_WIDTHS,
            StandardFont::HelveticaBold => &HELVETICA_BOLD_WIDTHS,
        };
        match byte {
            32..=126 => table[(byte - 32) as usize],
            _ => DEFAULT_WIDTH,
        }
    }

    /// Calculate text width in font units
    pub fn text_width(self, text: &str) -> u32 {
        encode_win_ansi(text)
            .into_iter()
            .map(|b| self.byte_width(b) as u32)
            .sum()
    }

    /// Calculate text width in points for a given font size
    pub fn text_width_points(self, text: &str, font_size: f32) -> f64 {
        self.text_width(text) as f64 / 1000.0 * font_size as f64
    }

    /// Encode text as a hex string for the PDF Tj operator
    pub fn encode_text_hex(self, text: &str) -> String {
        let hex: String = encode_win_ansi(text)
            .into_iter()
            .map(|b| format!("{b:02X}"))
            .collect();
        format!("<{hex}>")
    }

    /// Font dictionary for the page resources
    pub fn to_pdf_object(self) -> Dictionary {
        Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(self.base_font().as_bytes().to_vec())),
            ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
        ])
    }
}

/// Map text onto WinAnsiEncoding bytes
///
/// Latin-1 printable characters map to themselves; a handful of common
/// typographic characters map into the 0x80-0x9F block. Everything else
/// becomes `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7E}' | '\u{A0}'..='\u{FF}' => c as u8,
            '\u{20AC}' => 0x80,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\t' => b' ',
            _ => REPLACEMENT,
        })
        .collect()
}
