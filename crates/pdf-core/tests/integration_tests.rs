//! Integration tests for pdf-core
//!
//! Documents are serialized and parsed back with lopdf to check what a
//! reader would actually see.

use lopdf::{Document, Object};
use pdf_core::{Align, ImageScaleMode, PageSize, PdfDocument, PdfError, StandardFont};
use pretty_assertions::assert_eq;
use std::io::Cursor;

fn png_fixture(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 30, 30]));
    let mut out = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

fn jpeg_fixture() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(16, 8, image::Rgb([0, 90, 160]));
    let mut out = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Jpeg)
        .unwrap();
    out
}

/// Decompressed content stream of a 1-indexed page
fn page_content(doc: &Document, page: u32) -> String {
    let page_id = doc.get_pages()[&page];
    String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).into_owned()
}

fn page_resources(doc: &Document, page: u32) -> lopdf::Dictionary {
    let page_id = doc.get_pages()[&page];
    doc.get_dictionary(page_id)
        .and_then(|p| p.get(b"Resources"))
        .and_then(Object::as_dict)
        .unwrap()
        .clone()
}

#[test]
fn test_output_is_pdf() {
    let mut doc = PdfDocument::new(PageSize::A4);
    let page = doc.add_page();
    doc.insert_text("Hello", page, 40.0, 40.0, Align::Left).unwrap();

    let bytes = doc.into_bytes().unwrap();
    assert!(bytes.starts_with(b"%PDF-1.5"));
    assert!(Document::load_mem(&bytes).is_ok());
}

#[test]
fn test_page_count_and_media_box() {
    let mut doc = PdfDocument::new(PageSize::A4);
    doc.add_page();
    doc.add_page();
    doc.add_page();

    let parsed = Document::load_mem(&doc.into_bytes().unwrap()).unwrap();
    let pages = parsed.get_pages();
    assert_eq!(pages.len(), 3);

    let media_box = parsed
        .get_dictionary(pages[&1])
        .and_then(|p| p.get(b"MediaBox"))
        .and_then(Object::as_array)
        .unwrap()
        .iter()
        .map(|o| o.as_float().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(media_box.len(), 4);
    assert!((media_box[2] - 595.28).abs() < 0.01);
    assert!((media_box[3] - 841.89).abs() < 0.01);
}

#[test]
fn test_text_lands_on_requested_page() {
    let mut doc = PdfDocument::new(PageSize::A4);
    let first = doc.add_page();
    let second = doc.add_page();
    doc.set_font(StandardFont::HelveticaBold, 16.0);
    doc.insert_text("AB", first, 40.0, 40.0, Align::Left).unwrap();
    doc.set_font(StandardFont::Helvetica, 10.0);
    doc.insert_text("CD", second, 40.0, 40.0, Align::Left).unwrap();

    let parsed = Document::load_mem(&doc.into_bytes().unwrap()).unwrap();
    let one = page_content(&parsed, 1);
    let two = page_content(&parsed, 2);

    assert!(one.contains("<4142> Tj"));
    assert!(one.contains("/F2 16 Tf"));
    assert!(!one.contains("<4344>"));
    assert!(two.contains("<4344> Tj"));
    assert!(two.contains("/F1 10 Tf"));
}

#[test]
fn test_fonts_are_standard_type1() {
    let mut doc = PdfDocument::new(PageSize::A4);
    let page = doc.add_page();
    doc.insert_text("x", page, 0.0, 0.0, Align::Left).unwrap();

    let parsed = Document::load_mem(&doc.into_bytes().unwrap()).unwrap();
    let fonts = page_resources(&parsed, 1);
    let font_ref = fonts
        .get(b"Font")
        .and_then(Object::as_dict)
        .and_then(|f| f.get(b"F1"))
        .and_then(Object::as_reference)
        .unwrap();
    let font = parsed.get_dictionary(font_ref).unwrap();

    assert_eq!(font.get(b"Subtype").unwrap().as_name().unwrap(), b"Type1");
    assert_eq!(font.get(b"BaseFont").unwrap().as_name().unwrap(), b"Helvetica");
    assert!(font.get(b"FontFile2").is_err());
}

#[test]
fn test_insert_text_invalid_page() {
    let mut doc = PdfDocument::new(PageSize::A4);
    doc.add_page();

    let result = doc.insert_text("Hello", 5, 10.0, 10.0, Align::Left);
    match result {
        Err(PdfError::InvalidPage(page, total)) => {
            assert_eq!(page, 5);
            assert_eq!(total, 1);
        }
        other => panic!("expected InvalidPage, got {other:?}"),
    }
}

#[test]
fn test_same_image_embedded_once() {
    let logo = png_fixture(20, 10);
    let mut doc = PdfDocument::new(PageSize::A4);
    let first = doc.add_page();
    let second = doc.add_page();
    doc.insert_image(&logo, first, 40.0, 40.0, 75.0, 75.0, ImageScaleMode::FitBox)
        .unwrap();
    doc.insert_image(&logo, second, 40.0, 40.0, 75.0, 75.0, ImageScaleMode::FitBox)
        .unwrap();

    let parsed = Document::load_mem(&doc.into_bytes().unwrap()).unwrap();
    let images = parsed
        .objects
        .values()
        .filter(|o| {
            o.as_stream()
                .ok()
                .and_then(|s| s.dict.get(b"Subtype").ok())
                .and_then(|t| t.as_name().ok())
                == Some(b"Image".as_slice())
        })
        .count();
    assert_eq!(images, 1);

    for page in [1, 2] {
        let xobjects = page_resources(&parsed, page);
        assert!(xobjects
            .get(b"XObject")
            .and_then(Object::as_dict)
            .unwrap()
            .has(b"Im1"));
        assert!(page_content(&parsed, page).contains("/Im1 Do"));
    }
}

#[test]
fn test_fit_box_returns_drawn_size() {
    let mut doc = PdfDocument::new(PageSize::A4);
    let page = doc.add_page();
    let (w, h) = doc
        .insert_image(&png_fixture(40, 10), page, 0.0, 0.0, 80.0, 40.0, ImageScaleMode::FitBox)
        .unwrap();
    assert_eq!((w, h), (80.0, 20.0));
}

#[test]
fn test_fit_center_offsets_inside_box() {
    let mut doc = PdfDocument::new(PageSize { width: 200.0, height: 200.0 });
    let page = doc.add_page();
    doc.insert_image(&png_fixture(10, 10), page, 0.0, 0.0, 100.0, 40.0, ImageScaleMode::FitCenter)
        .unwrap();

    let parsed = Document::load_mem(&doc.into_bytes().unwrap()).unwrap();
    // 40x40 square centered in a 100x40 box at the top of a 200pt page
    assert!(page_content(&parsed, 1).contains("40 0 0 40 30 160 cm"));
}

#[test]
fn test_jpeg_image() {
    let mut doc = PdfDocument::new(PageSize::A4);
    let page = doc.add_page();
    let (w, h) = doc
        .insert_image(&jpeg_fixture(), page, 0.0, 0.0, 32.0, 32.0, ImageScaleMode::Stretch)
        .unwrap();
    assert_eq!((w, h), (32.0, 32.0));
    assert!(doc.into_bytes().is_ok());
}

#[test]
fn test_invalid_image_data() {
    let mut doc = PdfDocument::new(PageSize::A4);
    let page = doc.add_page();
    let result = doc.insert_image(b"not an image", page, 0.0, 0.0, 10.0, 10.0, ImageScaleMode::FitBox);
    assert!(matches!(result, Err(PdfError::ImageError(_))));
}

#[test]
fn test_fill_color_applies_to_text() {
    let mut doc = PdfDocument::new(PageSize::A4);
    let page = doc.add_page();
    doc.set_fill_color(pdf_core::Color::from_rgb(0x55, 0x55, 0x55));
    doc.insert_text("Generated", page, 0.0, 0.0, Align::Right).unwrap();

    let parsed = Document::load_mem(&doc.into_bytes().unwrap()).unwrap();
    let grey = 0x55 as f32 / 255.0;
    assert!(page_content(&parsed, 1).contains(&format!("{grey} {grey} {grey} rg")));
}
