//! PDF document builder
//!
//! Positions passed to drawing methods are in points measured from the
//! top-left corner of the page, the way layout code thinks about a page.
//! They are converted to PDF's bottom-left origin when operators are emitted.

use crate::font::StandardFont;
use crate::graphics::{generate_line_operators, generate_rect_operators, StrokeStyle};
use crate::image::{
    calculate_scaled_dimensions, generate_image_operators, ImageScaleMode, ImageXObject,
};
use crate::text::{text_operators, wrap_to_width, TextStyle};
use crate::{Align, PdfError, Result};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::{Hash, Hasher};

/// RGB Color (values 0.0 - 1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Create color from RGB values (0-255)
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// Parse "#RRGGBB" or "RRGGBB"
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::from_rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }

    pub fn white() -> Self {
        Self::rgb(1.0, 1.0, 1.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// Page dimensions in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    /// ISO A4, 210 x 297 mm
    pub const A4: PageSize = PageSize {
        width: 595.28,
        height: 841.89,
    };
}

impl Default for PageSize {
    fn default() -> Self {
        Self::A4
    }
}

/// Content and resources accumulated for one page
#[derive(Debug, Default)]
struct PageBuffer {
    content: Vec<u8>,
    fonts: BTreeSet<StandardFont>,
    /// Resource name -> image XObject
    images: BTreeMap<String, ObjectId>,
}

/// An embedded image, shared by every page that draws it
#[derive(Debug, Clone)]
struct EmbeddedImage {
    id: ObjectId,
    resource_name: String,
    width: u32,
    height: u32,
}

/// A document built page by page
///
/// Drawing calls only append operators to per-page buffers; the page tree,
/// fonts and resource dictionaries are assembled when the document is
/// serialized.
pub struct PdfDocument {
    inner: Document,
    page_size: PageSize,
    pages: Vec<PageBuffer>,
    font: StandardFont,
    font_size: f32,
    fill_color: Color,
    stroke: StrokeStyle,
    /// Image data hash -> embedded object
    embedded_images: HashMap<u64, EmbeddedImage>,
}

impl PdfDocument {
    /// Create an empty document; call [`add_page`](Self::add_page) before drawing
    pub fn new(page_size: PageSize) -> Self {
        Self {
            inner: Document::with_version("1.5"),
            page_size,
            pages: Vec::new(),
            font: StandardFont::Helvetica,
            font_size: 12.0,
            fill_color: Color::black(),
            stroke: StrokeStyle::default(),
            embedded_images: HashMap::new(),
        }
    }

    /// Append a blank page and return its 1-indexed number
    pub fn add_page(&mut self) -> usize {
        self.pages.push(PageBuffer::default());
        self.pages.len()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn set_font(&mut self, font: StandardFont, size: f32) {
        self.font = font;
        self.font_size = size;
    }

    /// Color used for text
    pub fn set_fill_color(&mut self, color: Color) {
        self.fill_color = color;
    }

    pub fn fill_color(&self) -> Color {
        self.fill_color
    }

    pub fn set_line_width(&mut self, width: f64) {
        self.stroke.width = width;
    }

    /// Width of `text` in points with the current font
    pub fn text_width(&self, text: &str) -> f64 {
        self.font.text_width_points(text, self.font_size)
    }

    /// Baseline-to-baseline distance with the current font
    pub fn line_height(&self) -> f64 {
        self.font.line_height(self.font_size)
    }

    /// Wrap `text` into lines no wider than `max_width` points
    pub fn wrap_text(&self, text: &str, max_width: f64) -> Vec<String> {
        wrap_to_width(text, max_width, |s| self.text_width(s))
    }

    /// Height a [`text_box`](Self::text_box) of this width would occupy
    pub fn height_of_string(&self, text: &str, width: f64) -> f64 {
        self.wrap_text(text, width).len() as f64 * self.line_height()
    }

    fn page_mut(&mut self, page: usize) -> Result<&mut PageBuffer> {
        let count = self.pages.len();
        if page == 0 || page > count {
            return Err(PdfError::InvalidPage(page, count));
        }
        Ok(&mut self.pages[page - 1])
    }

    /// Draw a single line of text with its line box top at `y`
    ///
    /// `align` positions the text relative to `x`: left edge, center or
    /// right edge.
    pub fn insert_text(&mut self, text: &str, page: usize, x: f64, y: f64, align: Align) -> Result<()> {
        let font = self.font;
        let font_size = self.font_size;
        let baseline = self.page_size.height - y - font.baseline_offset(font_size);

        let style = TextStyle::new(font, font_size).with_color(self.fill_color);
        let operators = text_operators(text, x, baseline, align, &style);

        let buffer = self.page_mut(page)?;
        buffer.fonts.insert(font);
        buffer.content.extend_from_slice(&operators);
        Ok(())
    }

    /// Draw wrapped text inside a box of the given width
    ///
    /// Each line is aligned within the box. Returns the height consumed.
    pub fn text_box(
        &mut self,
        text: &str,
        page: usize,
        x: f64,
        y: f64,
        width: f64,
        align: Align,
    ) -> Result<f64> {
        let anchor = match align {
            Align::Left => x,
            Align::Center => x + width / 2.0,
            Align::Right => x + width,
        };
        let line_height = self.line_height();
        let lines = self.wrap_text(text, width);
        for (i, line) in lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            self.insert_text(line, page, anchor, y + i as f64 * line_height, align)?;
        }
        Ok(lines.len() as f64 * line_height)
    }

    /// Stroke a line with the current stroke color and width
    pub fn draw_line(&mut self, page: usize, x1: f64, y1: f64, x2: f64, y2: f64) -> Result<()> {
        let h = self.page_size.height;
        let operators = generate_line_operators(x1, h - y1, x2, h - y2, &self.stroke);
        self.page_mut(page)?.content.extend_from_slice(&operators);
        Ok(())
    }

    /// Stroke a rectangle outline whose top-left corner is (x, y)
    pub fn stroke_rect(&mut self, page: usize, x: f64, y: f64, width: f64, height: f64) -> Result<()> {
        let bottom = self.page_size.height - y - height;
        let operators = generate_rect_operators(x, bottom, width, height, &self.stroke);
        self.page_mut(page)?.content.extend_from_slice(&operators);
        Ok(())
    }

    /// Place a JPEG or PNG image inside the box at (x, y)
    ///
    /// Identical image data is embedded once and shared. Returns the drawn
    /// size in points.
    #[allow(clippy::too_many_arguments)]
    pub fn insert_image(
        &mut self,
        data: &[u8],
        page: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        mode: ImageScaleMode,
    ) -> Result<(f64, f64)> {
        // Validate the page before embedding anything
        self.page_mut(page)?;
        let image = self.embed_image(data)?;

        let (draw_w, draw_h) =
            calculate_scaled_dimensions(image.width, image.height, width, height, mode);
        let (dx, dy) = match mode {
            ImageScaleMode::FitCenter => ((width - draw_w) / 2.0, (height - draw_h) / 2.0),
            _ => (0.0, 0.0),
        };
        let bottom = self.page_size.height - (y + dy) - draw_h;
        let operators = generate_image_operators(&image.resource_name, x + dx, bottom, draw_w, draw_h);

        let buffer = self.page_mut(page)?;
        buffer.images.insert(image.resource_name, image.id);
        buffer.content.extend_from_slice(&operators);
        Ok((draw_w, draw_h))
    }

    fn embed_image(&mut self, data: &[u8]) -> Result<EmbeddedImage> {
        let mut hasher = DefaultHasher::new();
        data.hash(&mut hasher);
        let key = hasher.finish();

        if let Some(existing) = self.embedded_images.get(&key) {
            return Ok(existing.clone());
        }

        let xobject = ImageXObject::from_bytes(data)?;
        let id = self.inner.add_object(xobject.to_pdf_stream());
        let embedded = EmbeddedImage {
            id,
            resource_name: format!("Im{}", self.embedded_images.len() + 1),
            width: xobject.width,
            height: xobject.height,
        };
        self.embedded_images.insert(key, embedded.clone());
        Ok(embedded)
    }

    /// Assemble the page tree and serialize the document
    pub fn into_bytes(mut self) -> Result<Vec<u8>> {
        self.finish()?;
        let mut buffer = Vec::new();
        self.inner
            .save_to(&mut buffer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;
        Ok(buffer)
    }

    fn finish(&mut self) -> Result<()> {
        if self.pages.is_empty() {
            self.add_page();
        }

        let used_fonts: BTreeSet<StandardFont> = self
            .pages
            .iter()
            .flat_map(|p| p.fonts.iter().copied())
            .collect();
        let font_ids: BTreeMap<StandardFont, ObjectId> = used_fonts
            .into_iter()
            .map(|font| (font, self.inner.add_object(font.to_pdf_object())))
            .collect();

        let pages_id = self.inner.new_object_id();
        let media_box = vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(self.page_size.width as _),
            Object::Real(self.page_size.height as _),
        ];

        let mut kids = Vec::with_capacity(self.pages.len());
        for buffer in std::mem::take(&mut self.pages) {
            let mut content = Stream::new(Dictionary::new(), buffer.content);
            // Leave the stream uncompressed if deflate fails
            let _ = content.compress();
            let content_id = self.inner.add_object(content);

            let mut resources = Dictionary::new();
            if !buffer.fonts.is_empty() {
                let fonts: Dictionary = buffer
                    .fonts
                    .iter()
                    .filter_map(|font| {
                        font_ids
                            .get(font)
                            .map(|id| (font.resource_name(), Object::Reference(*id)))
                    })
                    .collect();
                resources.set("Font", fonts);
            }
            if !buffer.images.is_empty() {
                let images: Dictionary = buffer
                    .images
                    .iter()
                    .map(|(name, id)| (name.as_str(), Object::Reference(*id)))
                    .collect();
                resources.set("XObject", images);
            }

            let page_id = self.inner.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => media_box.clone(),
                "Contents" => content_id,
                "Resources" => resources,
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        self.inner.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = self.inner.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        self.inner.trailer.set("Root", catalog_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn content_of(doc: &PdfDocument, page: usize) -> String {
        String::from_utf8(doc.pages[page - 1].content.clone()).unwrap()
    }

    #[test]
    fn test_color_from_hex() {
        assert_eq!(Color::from_hex("#555555"), Some(Color::from_rgb(0x55, 0x55, 0x55)));
        assert_eq!(Color::from_hex("ffffff"), Some(Color::white()));
        assert_eq!(Color::from_hex("#12345"), None);
        assert_eq!(Color::from_hex("#GG0000"), None);
    }

    #[test]
    fn test_add_page_numbers() {
        let mut doc = PdfDocument::new(PageSize::A4);
        assert_eq!(doc.add_page(), 1);
        assert_eq!(doc.add_page(), 2);
        assert_eq!(doc.page_count(), 2);
    }

    #[test]
    fn test_insert_text_invalid_page() {
        let mut doc = PdfDocument::new(PageSize::A4);
        doc.add_page();
        let err = doc.insert_text("x", 2, 0.0, 0.0, Align::Left).unwrap_err();
        assert!(matches!(err, PdfError::InvalidPage(2, 1)));
    }

    #[test]
    fn test_insert_text_flips_y() {
        let mut doc = PdfDocument::new(PageSize { width: 200.0, height: 100.0 });
        let page = doc.add_page();
        doc.set_font(StandardFont::Helvetica, 10.0);
        doc.insert_text("AB", page, 5.0, 0.0, Align::Left).unwrap();

        let baseline = 100.0 - StandardFont::Helvetica.baseline_offset(10.0);
        let ops = content_of(&doc, page);
        assert!(ops.contains(&format!("5 {baseline} Td")));
        assert!(ops.contains("/F1 10 Tf"));
        assert!(ops.contains("<4142> Tj"));
    }

    #[test]
    fn test_text_box_wraps_and_reports_height() {
        let mut doc = PdfDocument::new(PageSize::A4);
        let page = doc.add_page();
        doc.set_font(StandardFont::Helvetica, 10.0);
        let text = "Engineering Mathematics and Numerical Methods";
        let width = doc.text_width("Engineering Mathematics") + 1.0;

        let used = doc.text_box(text, page, 40.0, 100.0, width, Align::Left).unwrap();
        let lines = doc.wrap_text(text, width);

        assert!(lines.len() > 1);
        assert_eq!(used, lines.len() as f64 * doc.line_height());
        assert_eq!(used, doc.height_of_string(text, width));
        assert_eq!(content_of(&doc, page).matches("Tj").count(), lines.len());
    }

    #[test]
    fn test_text_box_center_anchor() {
        let mut doc = PdfDocument::new(PageSize::A4);
        let page = doc.add_page();
        doc.set_font(StandardFont::HelveticaBold, 10.0);
        doc.text_box("A", page, 100.0, 0.0, 60.0, Align::Center).unwrap();

        let x = 130.0 - doc.text_width("A") / 2.0;
        assert!(content_of(&doc, page).contains(&format!("{x} ")));
    }

    #[test]
    fn test_draw_line_uses_stroke_state() {
        let mut doc = PdfDocument::new(PageSize { width: 100.0, height: 100.0 });
        let page = doc.add_page();
        doc.set_line_width(0.75);
        doc.draw_line(page, 10.0, 20.0, 90.0, 20.0).unwrap();
        let ops = content_of(&doc, page);
        assert!(ops.contains("0.75 w"));
        assert!(ops.contains("10 80 m\n90 80 l"));
    }

    #[test]
    fn test_stroke_rect_bottom_left() {
        let mut doc = PdfDocument::new(PageSize { width: 100.0, height: 100.0 });
        let page = doc.add_page();
        doc.stroke_rect(page, 10.0, 10.0, 30.0, 20.0).unwrap();
        assert!(content_of(&doc, page).contains("10 70 30 20 re"));
    }

    #[test]
    fn test_empty_document_gets_a_page() {
        let doc = PdfDocument::new(PageSize::A4);
        let bytes = doc.into_bytes().unwrap();
        let parsed = Document::load_mem(&bytes).unwrap();
        assert_eq!(parsed.get_pages().len(), 1);
    }

    #[test]
    fn test_fonts_registered_per_page() {
        let mut doc = PdfDocument::new(PageSize::A4);
        let first = doc.add_page();
        let second = doc.add_page();
        doc.set_font(StandardFont::HelveticaBold, 12.0);
        doc.insert_text("Bold", first, 0.0, 0.0, Align::Left).unwrap();
        doc.set_font(StandardFont::Helvetica, 12.0);
        doc.insert_text("Regular", second, 0.0, 0.0, Align::Left).unwrap();

        let parsed = Document::load_mem(&doc.into_bytes().unwrap()).unwrap();
        let pages = parsed.get_pages();
        let fonts_of = |n: u32| {
            parsed
                .get_dictionary(pages[&n])
                .and_then(|page| page.get(b"Resources"))
                .and_then(Object::as_dict)
                .and_then(|res| res.get(b"Font"))
                .and_then(Object::as_dict)
                .unwrap()
                .clone()
        };
        assert!(fonts_of(1).has(b"F2"));
        assert!(!fonts_of(1).has(b"F1"));
        assert!(fonts_of(2).has(b"F1"));
    }
}
